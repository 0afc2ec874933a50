//! Router-level tests

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use phantomshield_core::{ConfigStore, Engine, EngineConfig, MemorySink};

use crate::config::Config;
use crate::{create_router, AppState};

const ADMIN: &str = "test-admin-token";

fn test_config(admin_token: Option<&str>) -> Config {
    Config {
        port: 0,
        admin_token: admin_token.map(String::from),
        engine_config_path: None,
        watch_config: false,
        data_dir: PathBuf::from("."),
        sink_kind: "memory".to_string(),
        sweep_interval_secs: 60,
        environment: "test".to_string(),
    }
}

fn app_with_store(store: ConfigStore, admin_token: Option<&str>) -> Router {
    let engine = Arc::new(Engine::new(Arc::new(store), Arc::new(MemorySink::new())));
    create_router(AppState {
        engine,
        config: test_config(admin_token),
    })
}

fn app() -> Router {
    app_with_store(ConfigStore::new(EngineConfig::default()).unwrap(), Some(ADMIN))
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn admin_get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn admin_post(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

fn evaluate(session: &str, route: &str) -> Request<Body> {
    post_json(
        "/api/v1/evaluate",
        json!({ "session_id": session, "subject": "alice", "route": route, "method": "GET" }),
    )
}

#[tokio::test]
async fn test_health() {
    let app = app();
    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["config_generation"], 1);
}

#[tokio::test]
async fn test_normal_request_goes_to_real() {
    let app = app();
    let (status, body) = send(&app, evaluate("s-normal", "/api/dashboard")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["verdict"], "REAL");
    assert_eq!(body["upstream"], "real");
    assert_eq!(body["canary"], false);
    assert_eq!(body["degraded"], false);
}

#[tokio::test]
async fn test_canary_request_goes_to_decoy_with_durable_record() {
    let app = app();
    let (status, body) = send(&app, evaluate("s-canary", "/api/v1/export")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["verdict"], "DECOY");
    assert_eq!(body["upstream"], "decoy");
    assert_eq!(body["canary"], true);
    assert_eq!(body["forensic"]["status"], "durable");

    let (status, body) = send(&app, admin_get("/api/v1/forensics?session_id=s-canary", ADMIN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["records"][0]["verdict"], "DECOY");
    assert_eq!(body["records"][0]["canary"], true);
}

#[tokio::test]
async fn test_malformed_route_is_degraded_not_rejected() {
    let app = app();
    let (status, body) = send(&app, evaluate("s-bad", "no-slash")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["degraded"], true);
}

#[tokio::test]
async fn test_empty_session_id_is_bad_request() {
    let app = app();
    let (status, body) = send(&app, evaluate("", "/api/dashboard")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn test_session_view() {
    let app = app();
    let (status, _) = send(&app, admin_get("/api/v1/sessions/nobody", ADMIN)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    send(&app, evaluate("s-view", "/api/profile")).await;
    let (status, body) = send(&app, admin_get("/api/v1/sessions/s-view", ADMIN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "REAL");
    assert_eq!(body["evaluations"], 1);
    assert_eq!(body["contained"], false);
}

#[tokio::test]
async fn test_ended_decoy_session_stays_contained() {
    let app = app();
    send(&app, evaluate("s-end", "/api/v1/admin")).await;

    let (status, body) = send(&app, admin_post("/api/v1/sessions/s-end/end", ADMIN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ended"], true);
    assert_eq!(body["contained"], true);

    let (_, body) = send(&app, evaluate("s-end", "/api/dashboard")).await;
    assert_eq!(body["verdict"], "DECOY");
    assert_eq!(body["upstream"], "decoy");
}

#[tokio::test]
async fn test_ending_unknown_session() {
    let app = app();
    let (status, body) = send(&app, admin_post("/api/v1/sessions/ghost/end", ADMIN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ended"], false);
    assert_eq!(body["contained"], false);
}

#[tokio::test]
async fn test_admin_routes_require_token() {
    let app = app();
    let (status, body) = send(&app, get("/api/v1/status")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], 401);

    let (status, _) = send(&app, admin_get("/api/v1/status", "wrong")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, admin_get("/api/v1/status", ADMIN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sink"], "memory");
    assert_eq!(body["stats"]["evaluations"], 0);
}

#[tokio::test]
async fn test_session_routes_require_token() {
    let app = app();
    send(&app, evaluate("s-hidden", "/api/v1/export")).await;

    let (status, _) = send(&app, get("/api/v1/sessions/s-hidden")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = post_json("/api/v1/sessions/s-hidden/end", json!({}));
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Still live and contained: the unauthenticated end did nothing.
    let (status, body) = send(&app, admin_get("/api/v1/sessions/s-hidden", ADMIN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["evaluations"], 1);
    assert_eq!(body["contained"], true);
}

#[tokio::test]
async fn test_future_timestamp_is_clamped() {
    let app = app();
    let req = post_json(
        "/api/v1/evaluate",
        json!({
            "session_id": "s-skew",
            "subject": "alice",
            "route": "/api/profile",
            "method": "GET",
            "timestamp": "2099-01-01T00:00:00Z"
        }),
    );
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["degraded"], true);

    let (_, body) = send(&app, admin_get("/api/v1/sessions/s-skew", ADMIN)).await;
    let last: chrono::DateTime<chrono::Utc> = body["last_evaluated"].as_str().unwrap().parse().unwrap();
    assert!(last < chrono::Utc::now() + chrono::Duration::minutes(6));
}

#[tokio::test]
async fn test_admin_routes_disabled_without_token() {
    let app = app_with_store(ConfigStore::new(EngineConfig::default()).unwrap(), None);
    let (status, _) = send(&app, admin_get("/api/v1/status", ADMIN)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_forensics_rejects_inverted_range() {
    let app = app();
    let uri = "/api/v1/forensics?from=2026-01-15T10:00:00Z&to=2026-01-15T09:00:00Z";
    let (status, _) = send(&app, admin_get(uri, ADMIN)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_timeline() {
    let app = app();
    let (status, _) = send(&app, admin_get("/api/v1/forensics/s-none/timeline", ADMIN)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    send(&app, evaluate("s-timeline", "/api/v1/roles")).await;
    let (status, body) = send(&app, admin_get("/api/v1/forensics/s-timeline/timeline", ADMIN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["record_count"], 1);
    assert_eq!(body["canary_hits"], 1);
    assert_eq!(body["last_verdict"], "DECOY");
}

#[tokio::test]
async fn test_reload_without_config_file_conflicts() {
    let app = app();
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/config/reload")
        .header(header::AUTHORIZATION, format!("Bearer {}", ADMIN))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_reload_from_file_and_rejection_keeps_generation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("engine.json");
    std::fs::write(&path, "{}").unwrap();

    let app = app_with_store(ConfigStore::from_file(&path).unwrap(), Some(ADMIN));
    let reload = || {
        Request::builder()
            .method(Method::POST)
            .uri("/api/v1/config/reload")
            .header(header::AUTHORIZATION, format!("Bearer {}", ADMIN))
            .body(Body::empty())
            .unwrap()
    };

    let (status, body) = send(&app, reload()).await;
    assert_eq!(status, StatusCode::OK);
    let generation = body["generation"].as_u64().unwrap();
    assert!(generation > 1);

    std::fs::write(&path, r#"{"risk":{"monitor_threshold":0.9,"decoy_threshold":0.5}}"#).unwrap();
    let (status, _) = send(&app, reload()).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, body) = send(&app, get("/health")).await;
    assert_eq!(body["config_generation"], generation);
}
