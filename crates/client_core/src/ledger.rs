use std::collections::HashSet;

use shared::{
    domain::{QuoteId, UserId},
    protocol::VoteRecord,
};

/// Session-scoped record of which quotes each user has voted on.
///
/// This is an optimistic cache for suppressing duplicate vote intents, not a
/// security boundary; the remote vote endpoint stays the enforcement point
/// of last resort. Entries arrive through two paths that express the same
/// guarantee: session-load seeding from vote records and live updates after
/// a confirmed vote.
#[derive(Debug, Default)]
pub struct VoteLedger {
    entries: HashSet<(UserId, QuoteId)>,
}

impl VoteLedger {
    pub fn has_voted(&self, user: UserId, quote: QuoteId) -> bool {
        self.entries.contains(&(user, quote))
    }

    /// Idempotent; returns true when the entry is new.
    pub fn record_vote(&mut self, user: UserId, quote: QuoteId) -> bool {
        self.entries.insert((user, quote))
    }

    /// Session-load entry point: scans one quote's vote records for the
    /// current user.
    pub fn seed_from_records(&mut self, quote: QuoteId, records: &[VoteRecord], current_user: UserId) {
        if records
            .iter()
            .any(|record| record.user_id == current_user && record.quote_id == quote)
        {
            self.entries.insert((current_user, quote));
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
