//! Projection of the catalog into the visible, ordered, bounded slice:
//! case-insensitive substring filter, stable sort, cursor truncation.

use std::cmp::Ordering;
use std::collections::HashSet;

use shared::{domain::QuoteId, protocol::Quote};

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Votes,
    Author,
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// View inputs owned by the controller: search term, sort, and the
/// visible-count cursor. The cursor only ever grows, except for an explicit
/// reset back to the page-size floor.
#[derive(Debug, Clone)]
pub struct ViewState {
    search_term: String,
    sort_key: SortKey,
    direction: SortDirection,
    visible_count: usize,
    page_size: usize,
}

impl ViewState {
    pub fn new(page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            search_term: String::new(),
            sort_key: SortKey::Votes,
            direction: SortDirection::Descending,
            visible_count: page_size,
            page_size,
        }
    }

    /// Back to session-start defaults: empty search, votes descending,
    /// cursor at the floor.
    pub fn reset(&mut self) {
        *self = Self::new(self.page_size);
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
    }

    pub fn sort(&self) -> (SortKey, SortDirection) {
        (self.sort_key, self.direction)
    }

    pub fn set_sort(&mut self, key: SortKey, direction: SortDirection) {
        self.sort_key = key;
        self.direction = direction;
    }

    pub fn visible_count(&self) -> usize {
        self.visible_count
    }

    pub fn load_more(&mut self) {
        self.visible_count = self.visible_count.saturating_add(self.page_size);
    }

    pub fn reset_cursor(&mut self) {
        self.visible_count = self.page_size;
    }
}

fn matches(quote: &Quote, lowered_term: &str) -> bool {
    lowered_term.is_empty()
        || quote.text.to_lowercase().contains(lowered_term)
        || quote.author.to_lowercase().contains(lowered_term)
}

pub fn filter<'a>(quotes: &'a [Quote], term: &str) -> Vec<&'a Quote> {
    let lowered = term.to_lowercase();
    quotes.iter().filter(|quote| matches(quote, &lowered)).collect()
}

/// Membership of the filtered set, used to decide cursor resets.
pub fn filtered_ids(quotes: &[Quote], term: &str) -> HashSet<QuoteId> {
    filter(quotes, term).into_iter().map(|quote| quote.id).collect()
}

pub fn compare(a: &Quote, b: &Quote, key: SortKey) -> Ordering {
    match key {
        SortKey::Votes => a.votes.cmp(&b.votes),
        SortKey::Author => a.author.cmp(&b.author),
        SortKey::Date => a.created_at.cmp(&b.created_at),
    }
}

/// Filter, stable-sort, and truncate to the visible cursor. Ties keep their
/// relative catalog order in either direction.
pub fn project(quotes: &[Quote], view: &ViewState) -> Vec<Quote> {
    let mut selected = filter(quotes, &view.search_term);
    selected.sort_by(|a, b| {
        let ordering = compare(a, b, view.sort_key);
        match view.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
    selected
        .into_iter()
        .take(view.visible_count)
        .cloned()
        .collect()
}
