//! Shared helpers for proxy and client integration tests

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::{json, Value};
use std::time::Duration;
use tower::ServiceExt;

use video_gen_proxy::{app_state::AppState, routes, services::replicate::ReplicateClient};

pub const TEST_TOKEN: &str = "r8_test_token";
pub const TEST_VERSION: &str = "stability-ai/stable-video-diffusion:test";

/// An address nothing listens on.
pub const UNREACHABLE: &str = "http://127.0.0.1:1";

/// Build proxy state pointing at a fake upstream. `token: None` simulates a
/// deployment without credentials.
pub fn test_state(upstream: &str, token: Option<&str>, verify_credentials: bool) -> AppState {
    let replicate = token.map(|t| {
        ReplicateClient::new(upstream, t, TEST_VERSION, Duration::from_secs(5))
            .expect("Failed to build Replicate client")
    });
    // Never installed globally, so every test gets its own recorder.
    let metrics = PrometheusBuilder::new().build_recorder().handle();
    AppState::new(replicate, verify_credentials, metrics)
}

pub fn test_router(upstream: &str, token: Option<&str>, verify_credentials: bool) -> Router {
    routes::router(test_state(upstream, token, verify_credentials), "does-not-exist")
}

/// Send one request through the router and decode the JSON body.
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.expect("Router failed");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn generation_form() -> Value {
    json!({
        "width": 1024,
        "height": 576,
        "duration": 30,
        "description": "Team lifting the trophy in the rain"
    })
}

/// A prediction body shaped like the real API's.
pub fn prediction_json(id: &str, status: &str, output: Option<&str>) -> Value {
    json!({
        "id": id,
        "model": "stability-ai/stable-video-diffusion",
        "version": TEST_VERSION,
        "status": status,
        "output": output,
        "error": null,
        "urls": {
            "get": format!("https://api.replicate.com/v1/predictions/{id}"),
            "cancel": format!("https://api.replicate.com/v1/predictions/{id}/cancel")
        }
    })
}
