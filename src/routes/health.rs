use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::app_state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub api_key_present: bool,
    pub checked_at: DateTime<Utc>,
}

/// GET /health — liveness plus whether the proxy can forward at all.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        api_key_present: state.api_key_present(),
        checked_at: Utc::now(),
    })
}
