use shared::{domain::QuoteId, protocol::Quote};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("quote {0} is already in the catalog")]
    DuplicateId(QuoteId),
    #[error("quote {0} is not in the catalog")]
    UnknownQuote(QuoteId),
}

/// The full known set of quotes for the current session, unique by id.
/// Populated once per session load and mutated incrementally afterwards.
#[derive(Debug, Default)]
pub struct QuoteCatalog {
    quotes: Vec<Quote>,
}

impl QuoteCatalog {
    /// Replaces the catalog with a fresh snapshot. Duplicate ids keep the
    /// first occurrence; the dropped ids are returned so the caller can
    /// report the anomaly.
    pub fn load_all(&mut self, snapshot: Vec<Quote>) -> Vec<QuoteId> {
        self.quotes.clear();
        let mut dropped = Vec::new();
        for quote in snapshot {
            if self.contains(quote.id) {
                dropped.push(quote.id);
            } else {
                self.quotes.push(quote);
            }
        }
        dropped
    }

    /// Adds a newly created quote at the most-recent position.
    pub fn insert(&mut self, quote: Quote) -> Result<(), CatalogError> {
        if self.contains(quote.id) {
            return Err(CatalogError::DuplicateId(quote.id));
        }
        self.quotes.insert(0, quote);
        Ok(())
    }

    /// Applies the canonical object returned by a confirmed edit. Only text
    /// and author change; the vote count is never rewound from a response.
    /// Returns false when the id is unknown to the catalog.
    pub fn replace(&mut self, canonical: Quote) -> bool {
        match self.quotes.iter_mut().find(|q| q.id == canonical.id) {
            Some(existing) => {
                existing.text = canonical.text;
                existing.author = canonical.author;
                true
            }
            None => false,
        }
    }

    /// Increments a quote's vote count by exactly one. Must only be called
    /// after the quote service confirmed the vote.
    pub fn apply_vote_increment(&mut self, id: QuoteId) -> Result<u32, CatalogError> {
        let quote = self
            .quotes
            .iter_mut()
            .find(|q| q.id == id)
            .ok_or(CatalogError::UnknownQuote(id))?;
        quote.votes = quote.votes.saturating_add(1);
        Ok(quote.votes)
    }

    pub fn get(&self, id: QuoteId) -> Option<&Quote> {
        self.quotes.iter().find(|q| q.id == id)
    }

    pub fn contains(&self, id: QuoteId) -> bool {
        self.quotes.iter().any(|q| q.id == id)
    }

    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(id: i64, text: &str, votes: u32) -> Quote {
        Quote {
            id: QuoteId(id),
            text: text.to_string(),
            author: String::new(),
            votes,
            created_at: "2024-01-01T00:00:00Z".parse().expect("timestamp"),
            created_by: None,
        }
    }

    #[test]
    fn insert_rejects_duplicate_id_and_leaves_catalog_unchanged() {
        let mut catalog = QuoteCatalog::default();
        catalog.insert(quote(1, "first", 0)).expect("insert");

        let err = catalog.insert(quote(1, "imposter", 9)).expect_err("duplicate");
        assert_eq!(err, CatalogError::DuplicateId(QuoteId(1)));
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(QuoteId(1)).expect("quote").text, "first");
    }

    #[test]
    fn insert_places_new_quote_first() {
        let mut catalog = QuoteCatalog::default();
        catalog.load_all(vec![quote(1, "old", 0), quote(2, "older", 0)]);
        catalog.insert(quote(3, "new", 0)).expect("insert");

        assert_eq!(catalog.quotes()[0].id, QuoteId(3));
    }

    #[test]
    fn replace_updates_text_and_author_but_not_votes() {
        let mut catalog = QuoteCatalog::default();
        catalog.load_all(vec![quote(1, "before", 4)]);

        let mut canonical = quote(1, "after", 0);
        canonical.author = "someone".to_string();
        assert!(catalog.replace(canonical));

        let stored = catalog.get(QuoteId(1)).expect("quote");
        assert_eq!(stored.text, "after");
        assert_eq!(stored.author, "someone");
        assert_eq!(stored.votes, 4);
    }

    #[test]
    fn replace_of_unknown_id_is_a_noop() {
        let mut catalog = QuoteCatalog::default();
        catalog.load_all(vec![quote(1, "only", 0)]);

        assert!(!catalog.replace(quote(2, "ghost", 0)));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn vote_increment_adds_exactly_one() {
        let mut catalog = QuoteCatalog::default();
        catalog.load_all(vec![quote(1, "q", 5)]);

        assert_eq!(catalog.apply_vote_increment(QuoteId(1)).expect("votes"), 6);
        assert_eq!(
            catalog.apply_vote_increment(QuoteId(2)),
            Err(CatalogError::UnknownQuote(QuoteId(2)))
        );
    }

    #[test]
    fn load_all_keeps_first_occurrence_of_duplicate_ids() {
        let mut catalog = QuoteCatalog::default();
        let dropped = catalog.load_all(vec![quote(1, "kept", 0), quote(1, "dropped", 0)]);

        assert_eq!(dropped, vec![QuoteId(1)]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(QuoteId(1)).expect("quote").text, "kept");
    }
}
