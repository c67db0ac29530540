use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::replicate::{ReplicateClient, UpstreamError};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    /// `None` when no API token is configured.
    pub replicate: Option<Arc<ReplicateClient>>,
    pub verify_credentials_on_submit: bool,
    pub metrics: PrometheusHandle,
}

impl AppState {
    pub fn new(
        replicate: Option<ReplicateClient>,
        verify_credentials_on_submit: bool,
        metrics: PrometheusHandle,
    ) -> Self {
        Self {
            replicate: replicate.map(Arc::new),
            verify_credentials_on_submit,
            metrics,
        }
    }

    pub fn from_config(config: &AppConfig, metrics: PrometheusHandle) -> Result<Self, UpstreamError> {
        let replicate = config
            .api_token()
            .map(|token| {
                ReplicateClient::new(
                    &config.replicate_api_base,
                    token,
                    &config.model_version,
                    config.request_timeout(),
                )
            })
            .transpose()?;

        Ok(Self::new(
            replicate,
            config.verify_credentials_on_submit,
            metrics,
        ))
    }

    pub fn api_key_present(&self) -> bool {
        self.replicate.is_some()
    }
}
