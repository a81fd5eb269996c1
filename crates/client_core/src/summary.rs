//! Dashboard aggregates derived from the catalog.

use shared::{domain::UserId, protocol::Quote};

use crate::view::{self, SortKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardSummary {
    pub total_quotes: usize,
    pub total_votes: u64,
    /// Quotes created by the current user; zero when no user is signed in.
    pub authored_by_user: usize,
}

pub fn summarize(quotes: &[Quote], current_user: Option<UserId>) -> BoardSummary {
    let total_votes = quotes.iter().map(|quote| u64::from(quote.votes)).sum();
    let authored_by_user = current_user
        .map(|user| {
            quotes
                .iter()
                .filter(|quote| quote.created_by == Some(user))
                .count()
        })
        .unwrap_or(0);
    BoardSummary {
        total_quotes: quotes.len(),
        total_votes,
        authored_by_user,
    }
}

/// Highest-voted quotes first, at most `limit` of them.
pub fn top_voted(quotes: &[Quote], limit: usize) -> Vec<Quote> {
    sorted_prefix(quotes, SortKey::Votes, limit)
}

/// Most recently created quotes first, at most `limit` of them.
pub fn most_recent(quotes: &[Quote], limit: usize) -> Vec<Quote> {
    sorted_prefix(quotes, SortKey::Date, limit)
}

fn sorted_prefix(quotes: &[Quote], key: SortKey, limit: usize) -> Vec<Quote> {
    let mut ordered: Vec<&Quote> = quotes.iter().collect();
    ordered.sort_by(|a, b| view::compare(a, b, key).reverse());
    ordered.into_iter().take(limit).cloned().collect()
}
