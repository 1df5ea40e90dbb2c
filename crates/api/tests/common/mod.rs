#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use courier_api::config::ServerConfig;
use courier_api::router::build_app_router;
use courier_api::state::AppState;
use courier_core::lifecycle::ClaimMode;
use courier_db::store::MemoryJobStore;
use courier_queue::{QueueConfig, QueueContext};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

/// Server config with a short request timeout; the port is never bound.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        request_timeout_secs: 30,
    }
}

/// Queue settings with fast polling so waits resolve quickly.
pub fn test_queue_config() -> QueueConfig {
    QueueConfig {
        dispatch_interval: Duration::from_millis(10),
        wait_poll_interval: Duration::from_millis(5),
        default_wait_timeout: Duration::from_millis(200),
        claim_mode: ClaimMode::Enforced,
        shutdown_grace: Duration::from_millis(200),
        ..Default::default()
    }
}

pub struct TestApp {
    pub router: Router,
    pub queue: QueueContext,
    pub store: Arc<MemoryJobStore>,
}

/// Build the full application router over an in-memory job store.
///
/// Uses the same middleware stack as the binary.
pub fn build_test_app() -> TestApp {
    let store = Arc::new(MemoryJobStore::new());
    let queue = QueueContext::new(store.clone(), test_queue_config());
    let router = build_app_router(AppState::new(queue.clone(), test_config()));
    TestApp {
        router,
        queue,
        store,
    }
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn post_empty(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
