pub mod generate;
pub mod health;
pub mod metrics;
pub mod status;

use axum::response::Html;
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Build the full proxy router. Paths not matched by a route are served from
/// `static_dir`.
pub fn router(state: AppState, static_dir: &str) -> Router {
    Router::new()
        // Browser client (embedded at compile time)
        .route("/", get(|| async { Html(INDEX_HTML) }))
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::prometheus_metrics))
        .route("/api/generate-video", post(generate::generate_video))
        .route("/api/check-status/{id}", get(status::check_status))
        .fallback_service(ServeDir::new(static_dir))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(1024 * 1024)) // 1 MB limit
}
