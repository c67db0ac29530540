use serde::Deserialize;
use std::time::Duration;

use crate::models::prediction::DEFAULT_MODEL_VERSION;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3001").
    #[serde(default)]
    pub bind_addr: Option<String>,

    /// Legacy port setting, used when `BIND_ADDR` is not set.
    #[serde(default)]
    pub port: Option<u16>,

    /// Replicate API token. The proxy starts without one but refuses to forward.
    #[serde(default)]
    pub replicate_api_token: Option<String>,

    /// Older name for the token, read when `REPLICATE_API_TOKEN` is unset.
    #[serde(default)]
    pub next_public_ai_api_key: Option<String>,

    /// Base URL of the predictions API
    #[serde(default = "default_api_base")]
    pub replicate_api_base: String,

    /// Model version sent with every prediction
    #[serde(default = "default_model_version")]
    pub model_version: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Probe `GET /models` before each submission to report bad keys early.
    #[serde(default = "default_true")]
    pub verify_credentials_on_submit: bool,

    /// Directory holding the built web client, served for unmatched paths.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

fn default_api_base() -> String {
    "https://api.replicate.com/v1".to_string()
}

fn default_model_version() -> String {
    DEFAULT_MODEL_VERSION.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_static_dir() -> String {
    "out".to_string()
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        // .env.local takes precedence; dotenvy never overrides variables already set.
        dotenvy::from_filename(".env.local").ok();
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Address the server listens on.
    pub fn listen_addr(&self) -> String {
        match (&self.bind_addr, self.port) {
            (Some(addr), _) => addr.clone(),
            (None, Some(port)) => format!("0.0.0.0:{port}"),
            (None, None) => "0.0.0.0:3001".to_string(),
        }
    }

    /// The API token, treating an empty value as absent.
    pub fn api_token(&self) -> Option<&str> {
        [&self.replicate_api_token, &self.next_public_ai_api_key]
            .into_iter()
            .filter_map(|token| token.as_deref())
            .find(|token| !token.trim().is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
