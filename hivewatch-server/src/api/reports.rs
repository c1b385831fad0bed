//! Report listing and creation
//!
//! Reports arrive as multipart form data: an `image` part that is
//! either an uploaded file or a base64 camera capture, plus text
//! fields. The whole payload is validated before anything is stored.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use hivewatch_common::models::{Gps, LocationType, NewReport, Report, UserRole};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// GET /api/reports
///
/// All reports, newest first, from whichever backend is reachable.
pub async fn list_reports(State(state): State<AppState>) -> ApiResult<Json<Vec<Report>>> {
    Ok(Json(state.reports.list_all().await?))
}

/// POST /api/reports
///
/// Accepts the submission only after client-side verification; the
/// image lands on disk first so the stored report references a served
/// path.
pub async fn create_report(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Report>)> {
    let mut image: Option<String> = None;
    let mut gps: Option<Gps> = None;
    let mut location_type: Option<LocationType> = None;
    let mut user_role: Option<UserRole> = None;
    let mut address: Option<String> = None;
    let mut phone_number: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed form data: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                if let Some(filename) = field.file_name().map(str::to_string) {
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::BadRequest(format!("Unreadable image: {}", e)))?;
                    image = Some(state.uploads.save_upload(Some(&filename), &bytes)?);
                } else {
                    let text = read_text(field).await?;
                    if text.starts_with("data:image") {
                        image = Some(state.uploads.save_capture(&text)?);
                    }
                }
            }
            "gps" => {
                let text = read_text(field).await?;
                gps = Some(serde_json::from_str(&text).map_err(|e| {
                    ApiError::BadRequest(format!("Invalid gps payload: {}", e))
                })?);
            }
            "locationType" => {
                location_type = Some(read_text(field).await?.parse().map_err(ApiError::from)?);
            }
            "userRole" => {
                user_role = Some(read_text(field).await?.parse().map_err(ApiError::from)?);
            }
            "address" => {
                address = Some(read_text(field).await?).filter(|s| !s.trim().is_empty());
            }
            "phoneNumber" => {
                phone_number = Some(read_text(field).await?).filter(|s| !s.trim().is_empty());
            }
            _ => {}
        }
    }

    let report = NewReport {
        image: image.ok_or_else(|| ApiError::BadRequest("No image provided".to_string()))?,
        gps: gps.ok_or_else(|| ApiError::BadRequest("Missing gps coordinates".to_string()))?,
        location_type: location_type
            .ok_or_else(|| ApiError::BadRequest("Missing location type".to_string()))?,
        user_role: user_role
            .ok_or_else(|| ApiError::BadRequest("Missing user role".to_string()))?,
        address,
        phone_number,
    };

    let stored = state.reports.save(report).await?;
    info!(id = %stored.id, location = %stored.location_type, "report stored");
    Ok((StatusCode::CREATED, Json(stored)))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> ApiResult<String> {
    field
        .text()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed form field: {}", e)))
}

pub fn report_routes() -> Router<AppState> {
    Router::new().route("/api/reports", get(list_reports).post(create_report))
}
