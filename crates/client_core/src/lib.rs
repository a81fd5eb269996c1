use std::{collections::HashMap, sync::Arc};

use anyhow::anyhow;
use async_trait::async_trait;
use shared::{
    domain::{QuoteId, UserId},
    error::ApiError,
    protocol::{CreateQuoteRequest, Quote, UpdateQuoteRequest, VoteRecord},
};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub mod catalog;
pub mod http;
pub mod ledger;
pub mod summary;
pub mod view;

pub use catalog::{CatalogError, QuoteCatalog};
pub use http::HttpQuoteService;
pub use ledger::VoteLedger;
pub use summary::BoardSummary;
pub use view::{SortDirection, SortKey, ViewState, DEFAULT_PAGE_SIZE};

/// Remote quote service as observed by the client: a plain request/response
/// contract, wire format out of scope.
#[async_trait]
pub trait QuoteService: Send + Sync {
    async fn list_quotes(&self) -> Result<Vec<Quote>, ServiceError>;
    async fn vote_records(&self, quote_id: QuoteId) -> Result<Vec<VoteRecord>, ServiceError>;
    async fn create_quote(&self, request: &CreateQuoteRequest) -> Result<Quote, ServiceError>;
    async fn update_quote(
        &self,
        quote_id: QuoteId,
        request: &UpdateQuoteRequest,
    ) -> Result<Quote, ServiceError>;
    async fn submit_vote(&self, quote_id: QuoteId) -> Result<(), ServiceError>;
}

pub struct MissingQuoteService;

#[async_trait]
impl QuoteService for MissingQuoteService {
    async fn list_quotes(&self) -> Result<Vec<Quote>, ServiceError> {
        Err(ServiceError::Unavailable(anyhow!(
            "quote service is not configured"
        )))
    }

    async fn vote_records(&self, quote_id: QuoteId) -> Result<Vec<VoteRecord>, ServiceError> {
        Err(ServiceError::Unavailable(anyhow!(
            "quote service is not configured; cannot fetch vote records for quote {}",
            quote_id.0
        )))
    }

    async fn create_quote(&self, _request: &CreateQuoteRequest) -> Result<Quote, ServiceError> {
        Err(ServiceError::Unavailable(anyhow!(
            "quote service is not configured"
        )))
    }

    async fn update_quote(
        &self,
        quote_id: QuoteId,
        _request: &UpdateQuoteRequest,
    ) -> Result<Quote, ServiceError> {
        Err(ServiceError::Unavailable(anyhow!(
            "quote service is not configured; cannot update quote {}",
            quote_id.0
        )))
    }

    async fn submit_vote(&self, quote_id: QuoteId) -> Result<(), ServiceError> {
        Err(ServiceError::Unavailable(anyhow!(
            "quote service is not configured; cannot vote on quote {}",
            quote_id.0
        )))
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    /// The service could not be reached or the exchange failed below the
    /// application level. Nothing was applied.
    #[error("quote service unreachable: {0}")]
    Unavailable(#[from] anyhow::Error),
    /// The service explicitly declined the operation. The reason is opaque
    /// to the client; `detail` is surfaced verbatim when present.
    #[error("quote service rejected the request: {}", .detail.as_ref().map(|d| d.to_string()).unwrap_or_else(|| "no detail".to_string()))]
    Rejected { detail: Option<ApiError> },
}

#[derive(Debug, Error)]
pub enum IntentError {
    #[error("no signed-in user for this session")]
    NoCurrentUser,
    #[error("quote {0} was not created by the current user")]
    NotQuoteOwner(QuoteId),
    #[error("quote {0} is not in the catalog")]
    UnknownQuote(QuoteId),
    #[error("quote text must not be empty")]
    EmptyQuoteText,
    #[error("no draft is open")]
    NoDraft,
    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Resolution of a vote intent. Duplicate and overlapping intents resolve as
/// dropped no-ops rather than errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    Confirmed { votes: u32 },
    AlreadyVoted,
    VoteInFlight,
    /// The confirmation arrived after the originating session was torn down.
    Discarded,
}

/// In-progress add or edit input, preserved verbatim across failed
/// submissions so the user never loses what they typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuoteDraft {
    pub text: String,
    pub author: String,
    pub editing: Option<QuoteId>,
}

#[derive(Debug, Clone)]
pub enum ClientEvent {
    BoardLoaded { quote_count: usize },
    ViewChanged,
    QuoteCreated { quote: Quote },
    QuoteUpdated { quote: Quote },
    VoteConfirmed { quote_id: QuoteId, votes: u32 },
    VoteRejected { quote_id: QuoteId, reason: String },
    Error(String),
}

struct BoardState {
    current_user: Option<UserId>,
    catalog: QuoteCatalog,
    ledger: VoteLedger,
    view: ViewState,
    draft: Option<QuoteDraft>,
    inflight_votes: HashMap<QuoteId, Uuid>,
}

/// Orchestrates user intents over the catalog, ledger, and view. All state
/// lives behind one mutex; remote calls are awaited with the lock released,
/// so independent intents interleave while per-quote vote submissions stay
/// serialized through the in-flight ticket map.
pub struct QuoteBoardClient {
    service: Arc<dyn QuoteService>,
    inner: Mutex<BoardState>,
    events: broadcast::Sender<ClientEvent>,
}

impl QuoteBoardClient {
    pub fn new(service: Arc<dyn QuoteService>) -> Arc<Self> {
        Self::with_page_size(service, view::DEFAULT_PAGE_SIZE)
    }

    /// A client with no reachable service; every remote intent reports
    /// `ServiceError::Unavailable`.
    pub fn disconnected() -> Arc<Self> {
        Self::new(Arc::new(MissingQuoteService))
    }

    pub fn with_page_size(service: Arc<dyn QuoteService>, page_size: usize) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            service,
            inner: Mutex::new(BoardState {
                current_user: None,
                catalog: QuoteCatalog::default(),
                ledger: VoteLedger::default(),
                view: ViewState::new(page_size),
                draft: None,
                inflight_votes: HashMap::new(),
            }),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    /// Loads the full catalog snapshot and seeds the vote ledger for the
    /// given user. Resets the view to its defaults and drops any draft or
    /// in-flight vote tickets from a previous session.
    pub async fn start_session(&self, current_user: Option<UserId>) -> Result<(), IntentError> {
        let quotes = self.service.list_quotes().await?;

        let mut ledger = VoteLedger::default();
        if let Some(user) = current_user {
            for quote in &quotes {
                match self.service.vote_records(quote.id).await {
                    Ok(records) => ledger.seed_from_records(quote.id, &records, user),
                    Err(err) => {
                        // Fail-open on read: the remote endpoint still
                        // rejects duplicate votes.
                        warn!(
                            quote_id = quote.id.0,
                            "board: vote record fetch failed, treating as not voted: {err}"
                        );
                    }
                }
            }
        }

        let quote_count = quotes.len();
        {
            let mut state = self.inner.lock().await;
            state.current_user = current_user;
            for id in state.catalog.load_all(quotes) {
                error!(
                    quote_id = id.0,
                    "board: duplicate quote id in snapshot, kept first occurrence"
                );
            }
            state.ledger = ledger;
            state.view.reset();
            state.draft = None;
            state.inflight_votes.clear();
        }

        info!(quote_count, "board: session loaded");
        let _ = self.events.send(ClientEvent::BoardLoaded { quote_count });
        Ok(())
    }

    pub async fn current_user(&self) -> Option<UserId> {
        self.inner.lock().await.current_user
    }

    /// Whether the current user has already voted on the quote, for
    /// suppressing the vote affordance upstream.
    pub async fn has_voted(&self, quote_id: QuoteId) -> bool {
        let state = self.inner.lock().await;
        match state.current_user {
            Some(user) => state.ledger.has_voted(user, quote_id),
            None => false,
        }
    }

    /// Updates the search term. The cursor resets to its floor only when the
    /// change actually alters filtered set membership, never on a plain
    /// recomputation.
    pub async fn set_search_term(&self, term: &str) {
        {
            let mut state = self.inner.lock().await;
            if state.view.search_term() == term {
                return;
            }
            let before = view::filtered_ids(state.catalog.quotes(), state.view.search_term());
            let after = view::filtered_ids(state.catalog.quotes(), term);
            state.view.set_search_term(term);
            if before != after {
                debug!("view: search membership changed, cursor reset");
                state.view.reset_cursor();
            }
        }
        let _ = self.events.send(ClientEvent::ViewChanged);
    }

    /// Changes the sort key/direction. Never touches the cursor.
    pub async fn set_sort(&self, key: SortKey, direction: SortDirection) {
        {
            let mut state = self.inner.lock().await;
            state.view.set_sort(key, direction);
        }
        let _ = self.events.send(ClientEvent::ViewChanged);
    }

    pub async fn load_more(&self) {
        {
            let mut state = self.inner.lock().await;
            state.view.load_more();
        }
        let _ = self.events.send(ClientEvent::ViewChanged);
    }

    /// The filtered, sorted, truncated slice for rendering.
    pub async fn visible_quotes(&self) -> Vec<Quote> {
        let state = self.inner.lock().await;
        view::project(state.catalog.quotes(), &state.view)
    }

    /// How many quotes match the current search before truncation.
    pub async fn matching_count(&self) -> usize {
        let state = self.inner.lock().await;
        view::filter(state.catalog.quotes(), state.view.search_term()).len()
    }

    pub async fn summary(&self) -> BoardSummary {
        let state = self.inner.lock().await;
        summary::summarize(state.catalog.quotes(), state.current_user)
    }

    pub async fn top_voted(&self, limit: usize) -> Vec<Quote> {
        let state = self.inner.lock().await;
        summary::top_voted(state.catalog.quotes(), limit)
    }

    pub async fn most_recent(&self, limit: usize) -> Vec<Quote> {
        let state = self.inner.lock().await;
        summary::most_recent(state.catalog.quotes(), limit)
    }

    /// Submits a vote for the current user. The ledger guard makes repeated
    /// intents no-ops; an intent for a quote whose submission is still in
    /// flight is dropped rather than queued. The catalog and ledger mutate
    /// only after the service confirms, increment before ledger entry, so an
    /// interrupted confirmation is retried safely through the guard.
    pub async fn vote(&self, quote_id: QuoteId) -> Result<VoteOutcome, IntentError> {
        let ticket = Uuid::new_v4();
        let user = {
            let mut state = self.inner.lock().await;
            let user = state.current_user.ok_or(IntentError::NoCurrentUser)?;
            if !state.catalog.contains(quote_id) {
                return Err(IntentError::UnknownQuote(quote_id));
            }
            if state.ledger.has_voted(user, quote_id) {
                debug!(quote_id = quote_id.0, "vote: already voted, intent dropped");
                return Ok(VoteOutcome::AlreadyVoted);
            }
            if state.inflight_votes.contains_key(&quote_id) {
                debug!(
                    quote_id = quote_id.0,
                    "vote: submission already in flight, intent dropped"
                );
                return Ok(VoteOutcome::VoteInFlight);
            }
            state.inflight_votes.insert(quote_id, ticket);
            user
        };

        info!(quote_id = quote_id.0, request_id = %ticket, "vote: submitting");
        let result = self.service.submit_vote(quote_id).await;

        let mut state = self.inner.lock().await;
        let ours = state.inflight_votes.get(&quote_id) == Some(&ticket);
        if ours {
            state.inflight_votes.remove(&quote_id);
        }

        if !ours {
            drop(state);
            debug!(quote_id = quote_id.0, request_id = %ticket, "vote: stale result discarded");
            return Ok(VoteOutcome::Discarded);
        }

        match result {
            Ok(()) => {
                let votes = match state.catalog.apply_vote_increment(quote_id) {
                    Ok(votes) => votes,
                    Err(err) => {
                        state.ledger.record_vote(user, quote_id);
                        drop(state);
                        error!(
                            quote_id = quote_id.0,
                            "vote: confirmed remotely but catalog increment failed: {err}"
                        );
                        let _ = self.events.send(ClientEvent::Error(format!(
                            "vote bookkeeping failed for quote {}: {err}",
                            quote_id.0
                        )));
                        return Ok(VoteOutcome::Discarded);
                    }
                };
                state.ledger.record_vote(user, quote_id);
                drop(state);
                info!(quote_id = quote_id.0, votes, "vote: confirmed");
                let _ = self
                    .events
                    .send(ClientEvent::VoteConfirmed { quote_id, votes });
                Ok(VoteOutcome::Confirmed { votes })
            }
            Err(err) => {
                drop(state);
                warn!(quote_id = quote_id.0, "vote: not applied: {err}");
                let _ = self.events.send(ClientEvent::VoteRejected {
                    quote_id,
                    reason: err.to_string(),
                });
                Err(err.into())
            }
        }
    }

    /// Opens a blank draft for a new quote.
    pub async fn open_draft(&self) {
        let mut state = self.inner.lock().await;
        state.draft = Some(QuoteDraft::default());
    }

    /// Opens an edit draft prefilled from the catalog. Refused locally,
    /// without a remote call, unless the current user created the quote; the
    /// service performs the authoritative check on submission.
    pub async fn open_edit_draft(&self, quote_id: QuoteId) -> Result<(), IntentError> {
        let mut state = self.inner.lock().await;
        let user = state.current_user.ok_or(IntentError::NoCurrentUser)?;
        let (text, author) = {
            let quote = state
                .catalog
                .get(quote_id)
                .ok_or(IntentError::UnknownQuote(quote_id))?;
            if quote.created_by != Some(user) {
                return Err(IntentError::NotQuoteOwner(quote_id));
            }
            (quote.text.clone(), quote.author.clone())
        };
        state.draft = Some(QuoteDraft {
            text,
            author,
            editing: Some(quote_id),
        });
        Ok(())
    }

    pub async fn update_draft(&self, text: &str, author: &str) -> Result<(), IntentError> {
        let mut state = self.inner.lock().await;
        let draft = state.draft.as_mut().ok_or(IntentError::NoDraft)?;
        draft.text = text.to_string();
        draft.author = author.to_string();
        Ok(())
    }

    pub async fn draft(&self) -> Option<QuoteDraft> {
        self.inner.lock().await.draft.clone()
    }

    pub async fn discard_draft(&self) {
        self.inner.lock().await.draft = None;
    }

    /// Submits the open draft as a create or an edit. On success the
    /// service's canonical object is applied to the catalog and the draft
    /// cleared; on failure the draft is preserved unmodified.
    pub async fn submit_draft(&self) -> Result<Quote, IntentError> {
        let draft = {
            let state = self.inner.lock().await;
            state.draft.clone().ok_or(IntentError::NoDraft)?
        };
        if draft.text.trim().is_empty() {
            return Err(IntentError::EmptyQuoteText);
        }
        match draft.editing {
            Some(quote_id) => self.submit_edit(quote_id, &draft).await,
            None => self.submit_create(&draft).await,
        }
    }

    async fn submit_create(&self, draft: &QuoteDraft) -> Result<Quote, IntentError> {
        let request = CreateQuoteRequest {
            text: draft.text.clone(),
            author: draft.author.clone(),
        };
        let created = match self.service.create_quote(&request).await {
            Ok(quote) => quote,
            Err(err) => {
                warn!("board: create failed, draft preserved: {err}");
                let _ = self
                    .events
                    .send(ClientEvent::Error(format!("quote was not created: {err}")));
                return Err(err.into());
            }
        };

        {
            let mut state = self.inner.lock().await;
            if let Err(err) = state.catalog.insert(created.clone()) {
                error!(quote_id = created.id.0, "board: create response ignored: {err}");
            }
            state.draft = None;
        }

        info!(quote_id = created.id.0, "board: quote created");
        let _ = self.events.send(ClientEvent::QuoteCreated {
            quote: created.clone(),
        });
        Ok(created)
    }

    async fn submit_edit(&self, quote_id: QuoteId, draft: &QuoteDraft) -> Result<Quote, IntentError> {
        {
            let state = self.inner.lock().await;
            let user = state.current_user.ok_or(IntentError::NoCurrentUser)?;
            let quote = state
                .catalog
                .get(quote_id)
                .ok_or(IntentError::UnknownQuote(quote_id))?;
            if quote.created_by != Some(user) {
                return Err(IntentError::NotQuoteOwner(quote_id));
            }
        }

        let request = UpdateQuoteRequest {
            text: Some(draft.text.clone()),
            author: Some(draft.author.clone()),
        };
        let updated = match self.service.update_quote(quote_id, &request).await {
            Ok(quote) => quote,
            Err(err) => {
                warn!(
                    quote_id = quote_id.0,
                    "board: update failed, draft preserved: {err}"
                );
                let _ = self
                    .events
                    .send(ClientEvent::Error(format!("quote was not updated: {err}")));
                return Err(err.into());
            }
        };

        {
            let mut state = self.inner.lock().await;
            if !state.catalog.replace(updated.clone()) {
                error!(
                    quote_id = updated.id.0,
                    "board: update response references an unknown quote, ignored"
                );
            }
            state.draft = None;
        }

        info!(quote_id = updated.id.0, "board: quote updated");
        let _ = self.events.send(ClientEvent::QuoteUpdated {
            quote: updated.clone(),
        });
        Ok(updated)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
