use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::EnvFilter;

use video_gen_proxy::{app_state::AppState, config::AppConfig, routes};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing video-gen-proxy server");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");

    // Register application metrics
    metrics::describe_counter!(
        "predictions_submitted_total",
        "Total predictions accepted by the inference API"
    );
    metrics::describe_counter!(
        "prediction_status_checks_total",
        "Total prediction status checks relayed"
    );
    metrics::describe_counter!(
        "upstream_errors_total",
        "Failed upstream calls, by failure kind"
    );
    metrics::describe_histogram!(
        "upstream_request_seconds",
        "Latency of calls to the inference API"
    );

    let state = AppState::from_config(&config, prometheus_handle)
        .expect("Failed to initialize Replicate client");

    let bind_addr = config.listen_addr();
    let app = routes::router(state, &config.static_dir);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!(
        bind_addr = %bind_addr,
        api_key_present = config.api_token().is_some(),
        model_version = %config.model_version,
        static_dir = %config.static_dir,
        "Proxy server listening"
    );
    if config.api_token().is_none() {
        tracing::warn!("No API token configured; generation requests will be rejected");
    }

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
