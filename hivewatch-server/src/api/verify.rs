//! Image verification endpoint
//!
//! Runs the classify-then-decide pipeline on a submitted image. A
//! negative verdict is a normal 200 response carrying the rejection
//! rationale; only missing input (400) and model unavailability (503)
//! are errors.

use axum::{extract::State, routing::post, Json, Router};
use hivewatch_common::api::{VerifyRequest, VerifyResponse};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::{decision, uploads, AppState};

/// Ranked predictions echoed back per verdict, for transparency
const ECHOED_PREDICTIONS: usize = 3;

/// POST /api/verify-image
pub async fn verify_image(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> ApiResult<Json<VerifyResponse>> {
    if request.image_data.trim().is_empty() {
        return Err(ApiError::BadRequest("No image data provided".to_string()));
    }

    let image = uploads::decode_data_url(&request.image_data)?;
    let predictions = state.model.classify(&image).await?;
    let verdict = decision::decide(&state.config.verification, &predictions);

    info!(
        source = ?request.source,
        accepted = verdict.is_honeybee,
        confidence = verdict.confidence,
        "verification complete"
    );

    Ok(Json(VerifyResponse {
        is_honeybee: verdict.is_honeybee,
        confidence: verdict.confidence,
        labels: verdict.labels,
        predictions: predictions.into_iter().take(ECHOED_PREDICTIONS).collect(),
        message: "Analysis complete".to_string(),
    }))
}

pub fn verify_routes() -> Router<AppState> {
    Router::new().route("/api/verify-image", post(verify_image))
}
