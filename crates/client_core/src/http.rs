//! HTTP adapter for the quote service.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use shared::{
    domain::QuoteId,
    error::{ApiError, ErrorCode},
    protocol::{CreateQuoteRequest, Quote, QuotesResponse, UpdateQuoteRequest, VoteRecord},
};
use url::Url;

use crate::{QuoteService, ServiceError};

/// Quote service client over its HTTP API. The service emits both
/// `{"data": ...}` envelopes and direct bodies depending on the endpoint, so
/// every response is parsed envelope-tolerantly.
pub struct HttpQuoteService {
    http: Client,
    base_url: String,
}

impl HttpQuoteService {
    pub fn new(base_url: &str) -> Result<Self, ServiceError> {
        let parsed = Url::parse(base_url).map_err(|err| {
            ServiceError::Unavailable(anyhow::anyhow!(
                "invalid quote service url '{base_url}': {err}"
            ))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ServiceError::Unavailable(anyhow::anyhow!(
                "quote service url must be http or https, got '{base_url}'"
            )));
        }
        Ok(Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Direct(T),
}

impl<T> Envelope<T> {
    fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Direct(value) => value,
        }
    }
}

/// The list endpoint answers either `{"quotes": [...]}` or a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QuoteListBody {
    Named(QuotesResponse),
    Bare(Vec<Quote>),
}

impl QuoteListBody {
    fn into_quotes(self) -> Vec<Quote> {
        match self {
            QuoteListBody::Named(response) => response.quotes,
            QuoteListBody::Bare(quotes) => quotes,
        }
    }
}

fn transport(err: reqwest::Error) -> ServiceError {
    ServiceError::Unavailable(err.into())
}

fn rejection(status: StatusCode, detail: Option<ApiError>) -> ServiceError {
    let detail = detail.or_else(|| {
        let code = match status {
            StatusCode::UNAUTHORIZED => ErrorCode::Unauthorized,
            StatusCode::FORBIDDEN => ErrorCode::Forbidden,
            StatusCode::NOT_FOUND => ErrorCode::NotFound,
            StatusCode::CONFLICT => ErrorCode::Conflict,
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ErrorCode::Validation,
            _ => ErrorCode::Internal,
        };
        Some(ApiError::new(code, status.to_string()))
    });
    ServiceError::Rejected { detail }
}

async fn rejection_from(response: Response) -> ServiceError {
    let status = response.status();
    let detail = response
        .json::<Envelope<ApiError>>()
        .await
        .ok()
        .map(Envelope::into_inner);
    rejection(status, detail)
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ServiceError> {
    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        return Err(rejection_from(response).await);
    }
    let body: Envelope<T> = response.json().await.map_err(transport)?;
    Ok(body.into_inner())
}

#[async_trait]
impl QuoteService for HttpQuoteService {
    async fn list_quotes(&self) -> Result<Vec<Quote>, ServiceError> {
        let response = self
            .http
            .get(format!("{}/quotes", self.base_url))
            .send()
            .await
            .map_err(transport)?;
        let body: QuoteListBody = read_json(response).await?;
        Ok(body.into_quotes())
    }

    async fn vote_records(&self, quote_id: QuoteId) -> Result<Vec<VoteRecord>, ServiceError> {
        let response = self
            .http
            .get(format!("{}/quotes/{}/votes", self.base_url, quote_id.0))
            .send()
            .await
            .map_err(transport)?;
        read_json(response).await
    }

    async fn create_quote(&self, request: &CreateQuoteRequest) -> Result<Quote, ServiceError> {
        let response = self
            .http
            .post(format!("{}/quotes", self.base_url))
            .json(request)
            .send()
            .await
            .map_err(transport)?;
        read_json(response).await
    }

    async fn update_quote(
        &self,
        quote_id: QuoteId,
        request: &UpdateQuoteRequest,
    ) -> Result<Quote, ServiceError> {
        let response = self
            .http
            .put(format!("{}/quotes/{}", self.base_url, quote_id.0))
            .json(request)
            .send()
            .await
            .map_err(transport)?;
        read_json(response).await
    }

    async fn submit_vote(&self, quote_id: QuoteId) -> Result<(), ServiceError> {
        let response = self
            .http
            .post(format!("{}/quotes/{}/vote", self.base_url, quote_id.0))
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(rejection_from(response).await);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;
