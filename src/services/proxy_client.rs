use reqwest::{Client, StatusCode};

use crate::models::generation::GenerationRequest;
use crate::models::prediction::Prediction;
use crate::services::replicate::error_message;

pub const DEFAULT_PROXY_URL: &str = "http://localhost:3001/api";

/// HTTP client for the local proxy, used by the command-line generator.
#[derive(Clone)]
pub struct ProxyClient {
    http: Client,
    base_url: String,
}

impl ProxyClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// POST /generate-video
    pub async fn generate_video(
        &self,
        request: &GenerationRequest,
    ) -> Result<Prediction, ClientError> {
        tracing::debug!(base_url = %self.base_url, "Sending request to proxy");

        let response = self
            .http
            .post(format!("{}/generate-video", self.base_url))
            .json(request)
            .send()
            .await
            .map_err(ClientError::from_reqwest)?;

        read_prediction(response).await
    }

    /// GET /check-status/{id}
    pub async fn check_status(&self, id: &str) -> Result<Prediction, ClientError> {
        let response = self
            .http
            .get(format!("{}/check-status/{}", self.base_url, id))
            .send()
            .await
            .map_err(ClientError::from_reqwest)?;

        read_prediction(response).await
    }
}

async fn read_prediction(response: reqwest::Response) -> Result<Prediction, ClientError> {
    let status = response.status();
    let body = response.bytes().await.map_err(ClientError::from_reqwest)?;

    if !status.is_success() {
        return Err(ClientError::Api {
            status,
            message: error_message(status, &body),
        });
    }

    serde_json::from_slice(&body)
        .map_err(|e| ClientError::Request(format!("unexpected response body: {e}")))
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("API error: {message}")]
    Api { status: StatusCode, message: String },

    #[error("Network error: No response from server. Please check your internet connection.")]
    NoResponse(#[source] reqwest::Error),

    #[error("Request error: {0}")]
    Request(String),
}

impl ClientError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_builder() {
            Self::Request(err.to_string())
        } else if err.is_timeout() || err.is_connect() || err.is_request() {
            Self::NoResponse(err)
        } else {
            Self::Request(err.to_string())
        }
    }
}
