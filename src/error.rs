//! Proxy error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::models::generation::FormError;
use crate::services::replicate::UpstreamError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("API key is missing")]
    MissingApiKey,

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Failed to connect to Replicate API")]
    UpstreamUnreachable,

    #[error("{0}")]
    Form(#[from] FormError),

    #[error("Invalid prediction id")]
    InvalidPredictionId,

    /// Failure while submitting a prediction.
    #[error("{}", upstream_message(.0, SUBMIT_NO_RESPONSE))]
    Submit(#[source] UpstreamError),

    /// Failure while checking a prediction's status.
    #[error("{}", upstream_message(.0, STATUS_NO_RESPONSE))]
    Status(#[source] UpstreamError),
}

const SUBMIT_NO_RESPONSE: &str =
    "Network error: No response from server. Please check your internet connection and API key.";
const STATUS_NO_RESPONSE: &str = "Network error: No response from server.";

fn upstream_message(err: &UpstreamError, no_response: &str) -> String {
    match err {
        UpstreamError::NoResponse(_) => no_response.to_string(),
        other => other.to_string(),
    }
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidApiKey => StatusCode::UNAUTHORIZED,
            ApiError::Form(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InvalidPredictionId => StatusCode::BAD_REQUEST,
            ApiError::Submit(UpstreamError::Api { status, .. })
            | ApiError::Status(UpstreamError::Api { status, .. }) => *status,
            ApiError::MissingApiKey
            | ApiError::UpstreamUnreachable
            | ApiError::Submit(_)
            | ApiError::Status(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        } else {
            tracing::warn!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let body = ErrorResponse {
            error: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::MissingApiKey.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::InvalidApiKey.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::Form(FormError::MissingFields).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::Submit(UpstreamError::Request("bad url".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_upstream_status_is_relayed() {
        let err = ApiError::Status(UpstreamError::api(
            StatusCode::NOT_FOUND,
            br#"{"detail":"Not found."}"#,
        ));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "API error: Not found.");
    }

    #[test]
    fn test_request_error_message() {
        let err = ApiError::Submit(UpstreamError::Request("builder error".into()));
        assert_eq!(err.to_string(), "Request error: builder error");
    }
}
