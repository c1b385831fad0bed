//! Safety guidance endpoint

use axum::{extract::Query, routing::get, Json, Router};
use hivewatch_common::guidance::{self, SafetyGuidance};
use hivewatch_common::models::{LocationType, UserRole};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuidanceQuery {
    pub location_type: String,
    pub user_role: String,
}

/// GET /api/guidance?locationType&userRole
///
/// Do/don't lists for a sighting; used by clients after a positive
/// verification.
pub async fn get_guidance(Query(query): Query<GuidanceQuery>) -> ApiResult<Json<SafetyGuidance>> {
    let location: LocationType = query.location_type.parse().map_err(ApiError::from)?;
    let role: UserRole = query.user_role.parse().map_err(ApiError::from)?;
    Ok(Json(guidance::for_sighting(location, role)))
}

pub fn guidance_routes() -> Router<AppState> {
    Router::new().route("/api/guidance", get(get_guidance))
}
