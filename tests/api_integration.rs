//! Integration tests for the HTTP API

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use kanagi::core::{create_router, router, sweep, AppState, FusionReasoner};
use kanagi::ReasonerConfig;

fn test_reasoner() -> Arc<FusionReasoner> {
    Arc::new(FusionReasoner::new(ReasonerConfig::default()).unwrap())
}

fn create_test_router() -> Router {
    create_router(test_reasoner())
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, json)
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_router();
    let (status, json) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], kanagi::VERSION);
    assert_eq!(json["sessions_active"], 0);
}

#[tokio::test]
async fn test_reason_generates_session_id() {
    let app = create_test_router();
    let (status, json) = send(
        &app,
        "POST",
        "/kanagi/reason",
        Some(r#"{"input": "The fire will rise and burn bright"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["session_id"].as_str().unwrap().starts_with("kanagi_"));
    assert_eq!(json["trace"]["form"], "LINE");
    assert_eq!(json["trace"]["provisional"], true);
    assert_eq!(json["trace"]["spiral"]["depth"], 1);
    assert!(json["trace"]["loop"].is_object());
}

#[tokio::test]
async fn test_reason_requires_input() {
    let app = create_test_router();

    for body in [r#"{"input": ""}"#, r#"{"input": "   "}"#, r#"{}"#] {
        let (status, json) = send(&app, "POST", "/kanagi/reason", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "KANAGI_INPUT_REQUIRED");
    }
}

#[tokio::test]
async fn test_session_lifecycle() {
    let app = create_test_router();
    let turn = r#"{"input": "calm water", "session_id": "life"}"#;

    send(&app, "POST", "/kanagi/reason", Some(turn)).await;
    let (_, json) = send(
        &app,
        "POST",
        "/kanagi/reason",
        Some(r#"{"input": "a rising flame", "session_id": "life"}"#),
    )
    .await;
    assert_eq!(json["session_id"], "life");
    assert_eq!(json["trace"]["meta"]["spiral_depth"], 1);

    let (status, json) = send(&app, "GET", "/kanagi/session/life", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["session_id"], "life");
    assert_eq!(json["spiral"]["depth"], 2);

    let (_, json) = send(&app, "GET", "/health", None).await;
    assert_eq!(json["sessions_active"], 1);

    let (status, json) = send(&app, "DELETE", "/kanagi/session/life", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["evicted"], true);

    let (status, _) = send(&app, "GET", "/kanagi/session/life", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_session() {
    let app = create_test_router();

    let (status, _) = send(&app, "GET", "/kanagi/session/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, json) = send(&app, "DELETE", "/kanagi/session/missing", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["evicted"], false);
}

#[tokio::test]
async fn test_fusion_is_sessionless() {
    let app = create_test_router();
    let (status, json) = send(
        &app,
        "POST",
        "/kanagi/fusion",
        Some(r#"{"input": "火は昇る、しかし水は降る"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["output"].as_str().unwrap().starts_with("Observed"));
    assert!(!json["unresolved"].as_array().unwrap().is_empty());
    assert_eq!(json["trace"]["meta"]["spiral_depth"], 0);
    assert!(json["trace"].get("fermentation").is_none());

    let (_, health) = send(&app, "GET", "/health", None).await;
    assert_eq!(health["sessions_active"], 0);
}

#[tokio::test]
async fn test_fusion_requires_input() {
    let app = create_test_router();
    let (status, json) = send(&app, "POST", "/kanagi/fusion", Some(r#"{"input": ""}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "KANAGI_INPUT_REQUIRED");
}

#[tokio::test]
async fn test_reason_broadcasts_to_live_subscribers() {
    let state = AppState::new(test_reasoner());
    let mut rx = state.subscribe("live").await;
    let app = router(state.clone());

    send(
        &app,
        "POST",
        "/kanagi/reason",
        Some(r#"{"input": "calm water", "session_id": "live"}"#),
    )
    .await;

    let trace = rx.try_recv().unwrap();
    assert_eq!(trace.spiral.depth, 1);

    // other sessions are not broadcast on this channel
    send(
        &app,
        "POST",
        "/kanagi/reason",
        Some(r#"{"input": "calm water", "session_id": "elsewhere"}"#),
    )
    .await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_live_channel_closes_with_last_subscriber() {
    let state = AppState::new(test_reasoner());
    let first = state.subscribe("live").await;
    let second = state.subscribe("live").await;
    assert_eq!(state.channel_count().await, 1);

    drop(first);
    assert!(!state.release_channel("live").await);
    assert_eq!(state.channel_count().await, 1);

    drop(second);
    assert!(state.release_channel("live").await);
    assert_eq!(state.channel_count().await, 0);
}

#[tokio::test]
async fn test_sweep_closes_orphaned_channels() {
    let state = AppState::new(test_reasoner());
    for id in ["a", "b", "c"] {
        drop(state.subscribe(id).await);
    }
    let _kept = state.subscribe("kept").await;
    assert_eq!(state.channel_count().await, 4);

    sweep(&state).await;
    assert_eq!(state.channel_count().await, 1);
    assert!(state.updates.read().await.contains_key("kept"));
}

#[tokio::test]
async fn test_rejected_upgrade_opens_no_channel() {
    let state = AppState::new(test_reasoner());
    let app = router(state.clone());

    // plain GET without upgrade headers never reaches the handler
    let (status, _) = send(&app, "GET", "/kanagi/ws/never", None).await;
    assert!(status.is_client_error());
    assert_eq!(state.channel_count().await, 0);
}

#[tokio::test]
async fn test_delete_closes_live_channel() {
    let state = AppState::new(test_reasoner());
    let app = router(state.clone());
    let _rx = state.subscribe("gone").await;

    send(&app, "DELETE", "/kanagi/session/gone", None).await;
    assert_eq!(state.channel_count().await, 0);
}
