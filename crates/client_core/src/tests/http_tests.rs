use super::*;
use std::sync::Arc;

use axum::{
    http::StatusCode as HttpStatus,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::json;
use tokio::{net::TcpListener, sync::Mutex};

fn quote_json(id: i64, text: &str, votes: u32) -> serde_json::Value {
    json!({
        "id": id,
        "text": text,
        "author": "anon",
        "votes": votes,
        "created_at": "2024-01-01T00:00:00Z",
    })
}

async fn spawn_service(app: Router) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn list_quotes_unwraps_envelope_and_named_collection() {
    let app = Router::new().route(
        "/quotes",
        get(|| async { Json(json!({"data": {"quotes": [quote_json(1, "enveloped", 3)]}})) }),
    );
    let base = spawn_service(app).await;
    let service = HttpQuoteService::new(&base).expect("service");

    let quotes = service.list_quotes().await.expect("list");
    assert_eq!(quotes.len(), 1);
    assert_eq!(quotes[0].id, QuoteId(1));
    assert_eq!(quotes[0].text, "enveloped");
    assert_eq!(quotes[0].votes, 3);
}

#[tokio::test]
async fn list_quotes_accepts_a_bare_array_body() {
    let app = Router::new().route(
        "/quotes",
        get(|| async { Json(json!([quote_json(2, "bare", 0), quote_json(3, "also bare", 1)])) }),
    );
    let base = spawn_service(app).await;
    let service = HttpQuoteService::new(&base).expect("service");

    let quotes = service.list_quotes().await.expect("list");
    assert_eq!(
        quotes.iter().map(|q| q.id.0).collect::<Vec<_>>(),
        vec![2, 3]
    );
}

#[tokio::test]
async fn vote_records_parse_a_direct_array() {
    let app = Router::new().route(
        "/quotes/:id/votes",
        get(|| async {
            Json(json!([{
                "id": 1,
                "quote_id": 5,
                "user_id": 7,
                "created_at": "2024-01-01T00:00:00Z",
            }]))
        }),
    );
    let base = spawn_service(app).await;
    let service = HttpQuoteService::new(&base).expect("service");

    let records = service.vote_records(QuoteId(5)).await.expect("records");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].quote_id, QuoteId(5));
    assert_eq!(records[0].user_id.0, 7);
}

#[tokio::test]
async fn submit_vote_succeeds_on_no_content() {
    let app = Router::new().route("/quotes/:id/vote", post(|| async { HttpStatus::NO_CONTENT }));
    let base = spawn_service(app).await;
    let service = HttpQuoteService::new(&base).expect("service");

    service.submit_vote(QuoteId(1)).await.expect("vote");
}

#[tokio::test]
async fn submit_vote_maps_a_conflict_to_rejected_with_detail() {
    let app = Router::new().route(
        "/quotes/:id/vote",
        post(|| async {
            (
                HttpStatus::CONFLICT,
                Json(json!({"code": "conflict", "message": "duplicate vote"})),
            )
        }),
    );
    let base = spawn_service(app).await;
    let service = HttpQuoteService::new(&base).expect("service");

    let err = service.submit_vote(QuoteId(9)).await.expect_err("conflict");
    match err {
        ServiceError::Rejected { detail: Some(detail) } => {
            assert_eq!(detail.code, ErrorCode::Conflict);
            assert_eq!(detail.message, "duplicate vote");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn rejection_without_a_body_synthesizes_detail_from_the_status() {
    let app = Router::new().route(
        "/quotes/:id/vote",
        post(|| async { HttpStatus::FORBIDDEN }),
    );
    let base = spawn_service(app).await;
    let service = HttpQuoteService::new(&base).expect("service");

    let err = service.submit_vote(QuoteId(9)).await.expect_err("forbidden");
    match err {
        ServiceError::Rejected { detail: Some(detail) } => {
            assert_eq!(detail.code, ErrorCode::Forbidden);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn create_quote_posts_the_draft_and_parses_the_enveloped_response() {
    let captured: Arc<Mutex<Option<CreateQuoteRequest>>> = Arc::new(Mutex::new(None));
    let capture = captured.clone();
    let app = Router::new().route(
        "/quotes",
        post(move |Json(request): Json<CreateQuoteRequest>| {
            let capture = capture.clone();
            async move {
                *capture.lock().await = Some(request);
                Json(json!({"data": quote_json(42, "X", 0)}))
            }
        }),
    );
    let base = spawn_service(app).await;
    let service = HttpQuoteService::new(&base).expect("service");

    let created = service
        .create_quote(&CreateQuoteRequest {
            text: "X".to_string(),
            author: "Y".to_string(),
        })
        .await
        .expect("create");
    assert_eq!(created.id, QuoteId(42));

    let request = captured.lock().await.clone().expect("captured request");
    assert_eq!(request.text, "X");
    assert_eq!(request.author, "Y");
}

#[tokio::test]
async fn update_quote_puts_only_the_provided_fields() {
    let captured: Arc<Mutex<Option<UpdateQuoteRequest>>> = Arc::new(Mutex::new(None));
    let capture = captured.clone();
    let app = Router::new().route(
        "/quotes/:id",
        put(move |Json(request): Json<UpdateQuoteRequest>| {
            let capture = capture.clone();
            async move {
                *capture.lock().await = Some(request);
                Json(json!({"data": quote_json(7, "updated", 1)}))
            }
        }),
    );
    let base = spawn_service(app).await;
    let service = HttpQuoteService::new(&base).expect("service");

    let updated = service
        .update_quote(
            QuoteId(7),
            &UpdateQuoteRequest {
                text: Some("updated".to_string()),
                author: None,
            },
        )
        .await
        .expect("update");
    assert_eq!(updated.text, "updated");

    let request = captured.lock().await.clone().expect("captured request");
    assert_eq!(request.text.as_deref(), Some("updated"));
    assert_eq!(request.author, None);
}

#[tokio::test]
async fn unreachable_service_maps_to_unavailable() {
    let service = HttpQuoteService::new("http://127.0.0.1:9").expect("service");

    let err = service.list_quotes().await.expect_err("unreachable");
    assert!(matches!(err, ServiceError::Unavailable(_)));
}

#[test]
fn construction_rejects_non_http_urls() {
    assert!(HttpQuoteService::new("ftp://example.com").is_err());
    assert!(HttpQuoteService::new("not a url").is_err());
    assert!(HttpQuoteService::new("http://127.0.0.1:8080/").is_ok());
}
