use std::time::{Duration, Instant};

use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;

use crate::models::generation::GenerationRequest;
use crate::models::prediction::PredictionRequest;

/// Client for the Replicate predictions API.
pub struct ReplicateClient {
    http: Client,
    base_url: String,
    api_token: String,
    model_version: String,
}

impl ReplicateClient {
    pub fn new(
        base_url: &str,
        api_token: &str,
        model_version: &str,
        timeout: Duration,
    ) -> Result<Self, UpstreamError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UpstreamError::Request(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: clean_token(api_token),
            model_version: model_version.to_string(),
        })
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header(AUTHORIZATION, format!("Token {}", self.api_token))
    }

    /// Cheap authenticated call used to tell a bad key apart from a bad request.
    pub async fn verify_credentials(&self) -> Result<(), UpstreamError> {
        let url = format!("{}/models", self.base_url);
        self.execute("verify_credentials", self.http.get(&url))
            .await
            .map(|_| ())
    }

    /// Submit a generation job. The upstream JSON is returned untouched.
    pub async fn create_prediction(
        &self,
        request: &GenerationRequest,
    ) -> Result<Value, UpstreamError> {
        let url = format!("{}/predictions", self.base_url);
        let body = PredictionRequest::with_random_seed(&self.model_version, request);

        tracing::debug!(
            version = %body.version,
            width = body.input.width,
            height = body.input.height,
            seed = body.input.seed,
            "Sending prediction request upstream"
        );

        self.execute("create_prediction", self.http.post(&url).json(&body))
            .await
    }

    /// Fetch the current state of a prediction.
    pub async fn get_prediction(&self, id: &str) -> Result<Value, UpstreamError> {
        let url = format!("{}/predictions/{}", self.base_url, id);
        self.execute("get_prediction", self.http.get(&url)).await
    }

    async fn execute(
        &self,
        operation: &'static str,
        builder: RequestBuilder,
    ) -> Result<Value, UpstreamError> {
        let started = Instant::now();
        let result = match self.authorized(builder).send().await {
            Ok(response) => read_json(response).await,
            Err(e) => Err(UpstreamError::from_reqwest(e)),
        };
        record(operation, started, &result);
        result
    }
}

async fn read_json(response: reqwest::Response) -> Result<Value, UpstreamError> {
    let status = response.status();
    let body = response.bytes().await.map_err(UpstreamError::from_reqwest)?;

    if !status.is_success() {
        return Err(UpstreamError::api(status, &body));
    }

    serde_json::from_slice(&body)
        .map_err(|e| UpstreamError::Request(format!("invalid JSON in upstream response: {e}")))
}

fn record<T>(operation: &'static str, started: Instant, result: &Result<T, UpstreamError>) {
    metrics::histogram!("upstream_request_seconds", "operation" => operation)
        .record(started.elapsed().as_secs_f64());

    if let Err(e) = result {
        metrics::counter!("upstream_errors_total", "kind" => e.kind()).increment(1);
        tracing::warn!(operation, error = %e, kind = e.kind(), "Upstream request failed");
    }
}

/// Env files often carry the token in quotes.
pub fn clean_token(token: &str) -> String {
    token.trim().replace(['"', '\''], "")
}

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// The API answered with a non-success status.
    #[error("API error: {message}")]
    Api { status: StatusCode, message: String },

    /// The request went out but nothing came back.
    #[error("No response from server: {0}")]
    NoResponse(#[source] reqwest::Error),

    /// The request could not be built, or the reply could not be read.
    #[error("Request error: {0}")]
    Request(String),
}

impl UpstreamError {
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_builder() {
            Self::Request(err.to_string())
        } else if err.is_timeout() || err.is_connect() || err.is_request() {
            Self::NoResponse(err)
        } else {
            Self::Request(err.to_string())
        }
    }

    /// Build an `Api` error, preferring the message the API put in its body.
    pub fn api(status: StatusCode, body: &[u8]) -> Self {
        Self::Api {
            status,
            message: error_message(status, body),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Api { .. } => "api",
            Self::NoResponse(_) => "no_response",
            Self::Request(_) => "request",
        }
    }
}

/// Pull a human-readable message out of an error body: `error`, then `detail`,
/// then a generic description of the status.
pub fn error_message(status: StatusCode, body: &[u8]) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|json| {
            ["error", "detail"].iter().find_map(|key| match json.get(*key) {
                Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
                _ => None,
            })
        })
        .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()))
}
