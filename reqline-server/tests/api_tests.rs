//! Integration tests for reqline-server API endpoints
//!
//! Tests cover:
//! - Health endpoint (no auth required)
//! - Untipped submission (direct queue write, no pending entry)
//! - Tip session validation and the claim-and-commit redirect flow
//! - Dashboard auth gating, list/sort/archive
//! - Live feed broadcasts

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use tower::util::ServiceExt; // for `oneshot` method

use reqline_common::config::ServiceConfig;
use reqline_common::db::create_schema;
use reqline_server::{api, build_router, AppState};

/// Test helper: in-memory database + app state (no payment service)
async fn setup() -> (axum::Router, AppState) {
    // Single connection: each pooled connection to sqlite::memory: would
    // otherwise get its own database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    create_schema(&pool).await.unwrap();

    let config = ServiceConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        payment_intent_url: None,
        search_proxy_url: None,
        dj_email: None,
        dj_password: None,
    };
    let state = AppState::new(pool, &config).unwrap();
    (build_router(state.clone()), state)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn with_token(mut request: Request<Body>, token: &str) -> Request<Body> {
    request.headers_mut().insert(
        axum::http::header::AUTHORIZATION,
        format!("Bearer {}", token).parse().unwrap(),
    );
    request
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

/// Test helper: sign the DJ in and return a session token
async fn login(app: &axum::Router, state: &AppState) -> String {
    api::auth::ensure_dj_credential(&state.db, "dj@example.com", "spin-it")
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/login",
            json!({"email": "dj@example.com", "password": "spin-it"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    body["token"].as_str().unwrap().to_string()
}

// =============================================================================
// Health Endpoint
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_no_auth_required() {
    let (app, _state) = setup().await;

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "reqline-server");
    assert!(body["version"].is_string());
}

// =============================================================================
// Untipped Submission
// =============================================================================

#[tokio::test]
async fn test_untipped_submit_writes_exactly_one_request() {
    let (app, state) = setup().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/requests",
            json!({"type": "link", "content": "https://youtu.be/abc", "tip": 0}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let rows: Vec<(String, i64, String)> =
        sqlx::query_as("SELECT id, tip, status FROM requests")
            .fetch_all(&state.db)
            .await
            .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].1, 0);
    assert_eq!(rows[0].2, "pending");

    // The untipped path never touches the pending store
    let pending_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pending_requests")
        .fetch_one(&state.db)
        .await
        .unwrap();
    assert_eq!(pending_count.0, 0);
}

#[tokio::test]
async fn test_tipped_submit_rejected_on_direct_endpoint() {
    let (app, _state) = setup().await;

    let response = app
        .oneshot(post_json(
            "/api/requests",
            json!({"type": "link", "content": "https://youtu.be/abc", "tip": 10}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_empty_content_rejected() {
    let (app, _state) = setup().await;

    let response = app
        .oneshot(post_json(
            "/api/requests",
            json!({"type": "link", "content": "   ", "tip": 0}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Tip Sessions
// =============================================================================

#[tokio::test]
async fn test_tip_session_rejects_out_of_range_amounts() {
    let (app, state) = setup().await;

    for tip in [0, -5, 1000] {
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/tips/session",
                json!({"type": "link", "content": "https://youtu.be/x", "tip": tip}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "tip={}", tip);
    }

    // Validation happens before the pending store is touched
    let pending_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pending_requests")
        .fetch_one(&state.db)
        .await
        .unwrap();
    assert_eq!(pending_count.0, 0);
}

#[tokio::test]
async fn test_tip_session_without_payment_service_keeps_pending_record() {
    let (app, state) = setup().await;

    // No payment service configured: initiation fails after the pending
    // record is stored, leaving it claimable
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/tips/session",
            json!({
                "type": "search",
                "content": "https://music.example/track/7",
                "title": "Song - Artist",
                "tip": 10,
                "request_id": "tab-1"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let pending: (i64,) =
        sqlx::query_as("SELECT tip FROM pending_requests WHERE request_id = 'tab-1'")
            .fetch_one(&state.db)
            .await
            .unwrap();
    assert_eq!(pending.0, 10);
}

// =============================================================================
// Payment Redirect (claim-and-commit)
// =============================================================================

/// Seed a pending record through the session endpoint, then drive the
/// redirect flow end to end.
async fn seed_pending(app: &axum::Router, request_id: &str, tip: i64) {
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/tips/session",
            json!({
                "type": "link",
                "content": "https://youtu.be/tipped",
                "tip": tip,
                "request_id": request_id
            }),
        ))
        .await
        .unwrap();
    // 503: payment service unconfigured in tests; the pending record stays
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_succeeded_redirect_commits_once_and_replay_is_noop() {
    let (app, state) = setup().await;
    seed_pending(&app, "pay-1", 10).await;

    let uri = "/payment/complete?redirect_status=succeeded&requestId=pay-1";
    let response = app.clone().oneshot(get(uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["outcome"], "success");

    // Exactly one committed request with the claimed tip; pending entry gone
    let rows: Vec<(i64,)> = sqlx::query_as("SELECT tip FROM requests")
        .fetch_all(&state.db)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].0, 10);
    let pending_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pending_requests")
        .fetch_one(&state.db)
        .await
        .unwrap();
    assert_eq!(pending_count.0, 0);

    // Replaying the same redirect is success-equivalent, not a second write
    let response = app.clone().oneshot(get(uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["outcome"], "already_processed");

    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM requests")
        .fetch_one(&state.db)
        .await
        .unwrap();
    assert_eq!(count.0, 1);
}

#[tokio::test]
async fn test_failed_redirect_leaves_pending_untouched() {
    let (app, state) = setup().await;
    seed_pending(&app, "pay-2", 5).await;

    let response = app
        .clone()
        .oneshot(get("/payment/complete?redirect_status=failed&requestId=pay-2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["outcome"], "failed");

    let pending_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pending_requests")
        .fetch_one(&state.db)
        .await
        .unwrap();
    assert_eq!(pending_count.0, 1);
    let request_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM requests")
        .fetch_one(&state.db)
        .await
        .unwrap();
    assert_eq!(request_count.0, 0);
}

#[tokio::test]
async fn test_succeeded_redirect_without_request_id_is_bad_request() {
    let (app, _state) = setup().await;

    let response = app
        .oneshot(get("/payment/complete?redirect_status=succeeded"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_commit_failure_after_claim_is_server_error() {
    let (app, state) = setup().await;
    seed_pending(&app, "pay-3", 15).await;

    // Break the commit target; the claim itself still goes through
    sqlx::query("DROP TABLE requests")
        .execute(&state.db)
        .await
        .unwrap();

    let response = app
        .oneshot(get("/payment/complete?redirect_status=succeeded&requestId=pay-3"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["outcome"], "error");

    // The claim already consumed the pending record
    let pending_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pending_requests")
        .fetch_one(&state.db)
        .await
        .unwrap();
    assert_eq!(pending_count.0, 0);
}

#[tokio::test]
async fn test_unrecognized_redirect_status_is_unknown() {
    let (app, _state) = setup().await;

    let response = app
        .oneshot(get("/payment/complete?redirect_status=processing&requestId=x"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["outcome"], "unknown");
}

// =============================================================================
// Dashboard (auth, list, sort, archive)
// =============================================================================

#[tokio::test]
async fn test_dashboard_requires_auth() {
    let (app, _state) = setup().await;

    let response = app.clone().oneshot(get("/api/queue")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(with_token(get("/api/queue"), "forged-token"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let (app, state) = setup().await;
    api::auth::ensure_dj_credential(&state.db, "dj@example.com", "spin-it")
        .await
        .unwrap();

    let response = app
        .oneshot(post_json(
            "/api/auth/login",
            json!({"email": "dj@example.com", "password": "wrong"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_dashboard_list_sort_and_archive() {
    let (app, state) = setup().await;
    let token = login(&app, &state).await;

    // Two untipped submissions, one tipped via the redirect flow
    for content in ["https://youtu.be/first", "https://youtu.be/second"] {
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/requests",
                json!({"type": "link", "content": content, "tip": 0}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }
    seed_pending(&app, "big-tip", 50).await;
    app.clone()
        .oneshot(get("/payment/complete?redirect_status=succeeded&requestId=big-tip"))
        .await
        .unwrap();

    // Sort by tip: the tipped request leads
    let response = app
        .clone()
        .oneshot(with_token(get("/api/queue?sort=tip"), &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 3);
    assert_eq!(list[0]["tip"], 50);

    // Archive the tipped one; it disappears from every view
    let archived_id = list[0]["id"].as_str().unwrap().to_string();
    let response = app
        .clone()
        .oneshot(with_token(
            post_json(&format!("/api/queue/{}/archive", archived_id), json!({})),
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(with_token(get("/api/queue"), &token))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert!(list.iter().all(|r| r["id"] != archived_id.as_str()));
}

#[tokio::test]
async fn test_archive_unknown_id_is_not_found() {
    let (app, state) = setup().await;
    let token = login(&app, &state).await;

    let response = app
        .oneshot(with_token(
            post_json("/api/queue/nope/archive", json!({})),
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_logout_revokes_session() {
    let (app, state) = setup().await;
    let token = login(&app, &state).await;

    let response = app
        .clone()
        .oneshot(with_token(post_json("/api/auth/logout", json!({})), &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(with_token(get("/api/queue"), &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Live Feed
// =============================================================================

#[tokio::test]
async fn test_submission_broadcasts_queue_snapshot() {
    let (app, state) = setup().await;
    let mut rx = state.broadcaster.subscribe();

    let response = app
        .oneshot(post_json(
            "/api/requests",
            json!({"type": "link", "content": "https://youtu.be/live", "tip": 0}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let event = rx.recv().await.unwrap();
    assert_eq!(event.event, "queue_changed");
    let data = serde_json::to_value(&event.data).unwrap();
    assert_eq!(data["count"], 1);
    assert_eq!(data["requests"][0]["type"], "link");
}

// =============================================================================
// Bookings
// =============================================================================

#[tokio::test]
async fn test_booking_inquiry_created() {
    let (app, state) = setup().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/bookings",
            json!({
                "name": "Alex",
                "phone": "555-0100",
                "contact_preference": "text",
                "date": "2026-09-12",
                "event_type": "wedding"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let row: (String, String) = sqlx::query_as("SELECT name, status FROM bookings")
        .fetch_one(&state.db)
        .await
        .unwrap();
    assert_eq!(row.0, "Alex");
    assert_eq!(row.1, "new");
}

#[tokio::test]
async fn test_booking_requires_name_and_phone() {
    let (app, _state) = setup().await;

    let response = app
        .oneshot(post_json("/api/bookings", json!({"name": "", "phone": "555"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
