use axum::extract::{Path, State};
use axum::Json;
use serde_json::Value;

use crate::app_state::AppState;
use crate::error::{ApiError, ApiResult};
use crate::models::prediction::is_valid_prediction_id;

/// GET /api/check-status/{id} — relay the current state of a prediction.
pub async fn check_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let replicate = state.replicate.as_ref().ok_or(ApiError::MissingApiKey)?;

    if !is_valid_prediction_id(&id) {
        return Err(ApiError::InvalidPredictionId);
    }

    tracing::debug!(prediction_id = %id, "Checking prediction status");
    metrics::counter!("prediction_status_checks_total").increment(1);

    let prediction = replicate
        .get_prediction(&id)
        .await
        .map_err(ApiError::Status)?;

    let status = prediction.get("status").and_then(Value::as_str).unwrap_or_default();
    tracing::info!(prediction_id = %id, status, "Prediction status");

    Ok(Json(prediction))
}
