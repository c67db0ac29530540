use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

use crate::app_state::AppState;
use crate::error::{ApiError, ApiResult};
use crate::models::generation::GenerationForm;
use crate::services::replicate::UpstreamError;

/// POST /api/generate-video — forward a generation form to the inference API.
pub async fn generate_video(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Value>> {
    let replicate = state.replicate.as_ref().ok_or(ApiError::MissingApiKey)?;

    if state.verify_credentials_on_submit {
        tracing::debug!("Testing connection to Replicate API");
        match replicate.verify_credentials().await {
            Ok(()) => tracing::debug!("Connected to Replicate API"),
            Err(UpstreamError::Api { status, .. }) if status == StatusCode::UNAUTHORIZED => {
                return Err(ApiError::InvalidApiKey);
            }
            Err(_) => return Err(ApiError::UpstreamUnreachable),
        }
    }

    let request = GenerationForm::parse(&body)?;

    tracing::info!(
        width = request.width,
        height = request.height,
        duration = request.duration,
        description = %request.description,
        "Received generation request"
    );

    let prediction = replicate
        .create_prediction(&request)
        .await
        .map_err(ApiError::Submit)?;

    metrics::counter!("predictions_submitted_total").increment(1);
    let prediction_id = prediction.get("id").and_then(Value::as_str).unwrap_or_default();
    let status = prediction.get("status").and_then(Value::as_str).unwrap_or_default();
    tracing::info!(prediction_id, status, "Prediction created");

    Ok(Json(prediction))
}
