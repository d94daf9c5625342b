//! Integration tests for `HttpStudyApi` against an in-process axum server
//! bound to an ephemeral port.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::RawQuery;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use remote::{ApiError, CredentialProvider, HttpStudyApi, SharedCredential, StudyApi};
use study_core::model::{CardId, DeckId, QualityGrade, SessionId};

//
// ─── HARNESS ───────────────────────────────────────────────────────────────────
//

/// Serve the router on an ephemeral port and return the base URL.
async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Credential provider that counts invalidation signals and optionally
/// installs a fallback token when invalidated.
struct CountingCredential {
    inner: SharedCredential,
    invalidations: AtomicUsize,
    fallback: Option<String>,
}

impl CountingCredential {
    fn new(token: &str, fallback: Option<&str>) -> Self {
        Self {
            inner: SharedCredential::new(token),
            invalidations: AtomicUsize::new(0),
            fallback: fallback.map(str::to_string),
        }
    }

    fn invalidation_count(&self) -> usize {
        self.invalidations.load(Ordering::SeqCst)
    }
}

impl CredentialProvider for CountingCredential {
    fn credential(&self) -> Option<String> {
        self.inner.credential()
    }

    fn invalidate(&self) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
        self.inner.invalidate();
        if let Some(fallback) = &self.fallback {
            self.inner.set(fallback.clone());
        }
    }
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

//
// ─── CLASSIFICATION ────────────────────────────────────────────────────────────
//

#[tokio::test]
async fn start_session_decodes_enveloped_payload() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let seen = attempts.clone();
    let router = Router::new().route(
        "/decks/{deck}/start",
        post(move |headers: HeaderMap| {
            seen.fetch_add(1, Ordering::SeqCst);
            async move {
                assert_eq!(bearer(&headers).as_deref(), Some("tok"));
                Json(json!({
                    "success": true,
                    "data": {
                        "sessionId": "s1", "deckId": "d1",
                        "totalCards": 10, "newCards": 7, "reviewCards": 3
                    }
                }))
            }
        }),
    );
    let base = serve(router).await;

    let api = HttpStudyApi::new(&base, Arc::new(SharedCredential::new("tok"))).unwrap();
    let opened = api.start_session(&DeckId::from("d1")).await.unwrap();

    assert_eq!(opened.session_id, SessionId::from("s1"));
    assert_eq!(opened.total_cards, 10);
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn non_2xx_maps_to_server_error_without_retry() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let seen = attempts.clone();
    let router = Router::new().route(
        "/study/session/{sid}/stats",
        get(move || {
            seen.fetch_add(1, Ordering::SeqCst);
            async { StatusCode::SERVICE_UNAVAILABLE }
        }),
    );
    let base = serve(router).await;

    let api = HttpStudyApi::new(&base, Arc::new(SharedCredential::new("tok"))).unwrap();
    let err = api.session_stats(&SessionId::from("s1")).await.unwrap_err();

    assert!(matches!(err, ApiError::Server { status: 503 }));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn decode_failure_carries_raw_body() {
    let router = Router::new().route(
        "/decks/{deck}/start",
        post(|| async { Json(json!({ "totalCards": 5 })) }),
    );
    let base = serve(router).await;

    let api = HttpStudyApi::new(&base, Arc::new(SharedCredential::new("tok"))).unwrap();
    let err = api.start_session(&DeckId::from("d1")).await.unwrap_err();

    match err {
        ApiError::Decode { body, .. } => assert!(body.contains("totalCards")),
        other => panic!("expected decode failure, got {other:?}"),
    }
}

//
// ─── REAUTHENTICATION POLICY ───────────────────────────────────────────────────
//

#[tokio::test]
async fn two_401s_are_terminal_with_exactly_one_invalidation() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let seen = attempts.clone();
    let router = Router::new().route(
        "/study/session/{sid}/next",
        get(move || {
            seen.fetch_add(1, Ordering::SeqCst);
            async { StatusCode::UNAUTHORIZED }
        }),
    );
    let base = serve(router).await;

    let auth = Arc::new(CountingCredential::new("stale", None));
    let api = HttpStudyApi::new(&base, auth.clone()).unwrap();
    let err = api
        .next_card(&SessionId::from("s1"), &DeckId::from("d1"), false)
        .await
        .unwrap_err();

    assert!(err.is_authorization());
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    assert_eq!(auth.invalidation_count(), 1);
}

#[tokio::test]
async fn retry_succeeds_when_invalidation_installs_fresh_credential() {
    let router = Router::new().route(
        "/study/session/{sid}/next",
        get(move |headers: HeaderMap| async move {
            if bearer(&headers).as_deref() == Some("fresh") {
                Json(json!({
                    "cardIndex": "0",
                    "card": { "fields": { "Word": "huis", "Definition": "house" } }
                }))
                .into_response()
            } else {
                StatusCode::UNAUTHORIZED.into_response()
            }
        }),
    );
    let base = serve(router).await;

    let auth = Arc::new(CountingCredential::new("stale", Some("fresh")));
    let api = HttpStudyApi::new(&base, auth.clone()).unwrap();
    let next = api
        .next_card(&SessionId::from("s1"), &DeckId::from("d1"), false)
        .await
        .unwrap();

    assert_eq!(next.card.unwrap().id, CardId::from("0"));
    assert_eq!(auth.invalidation_count(), 1);
}

//
// ─── WIRE SHAPE ────────────────────────────────────────────────────────────────
//

#[tokio::test]
async fn submit_answer_posts_card_index_and_quality() {
    let router = Router::new().route(
        "/study/session/{sid}/answer",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(body["cardIndex"], "3");
            assert_eq!(body["quality"], 4);
            Json(json!({ "stats": { "cardsReviewed": 1, "correctResponses": 1, "incorrectResponses": 0 } }))
        }),
    );
    let base = serve(router).await;

    let api = HttpStudyApi::new(&base, Arc::new(SharedCredential::new("tok"))).unwrap();
    let ack = api
        .submit_answer(
            &SessionId::from("s1"),
            &CardId::from("3"),
            QualityGrade::new(4),
        )
        .await
        .unwrap();

    let stats = ack.stats.unwrap();
    assert_eq!(stats.cards_reviewed, 1);
    assert_eq!(stats.correct_responses, 1);
}

#[tokio::test]
async fn force_update_adds_query_parameter() {
    let router = Router::new().route(
        "/study/session/{sid}/next",
        get(|RawQuery(query): RawQuery| async move {
            assert_eq!(query.as_deref(), Some("forceUpdate=true"));
            Json(json!({ "progress": { "current": 10, "total": 10 } }))
        }),
    );
    let base = serve(router).await;

    let api = HttpStudyApi::new(&base, Arc::new(SharedCredential::new("tok"))).unwrap();
    let next = api
        .next_card(&SessionId::from("s1"), &DeckId::from("d1"), true)
        .await
        .unwrap();

    assert!(next.card.is_none());
}
