//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use hivewatch_common::api::HealthResponse;

use crate::AppState;

/// GET /api/health
///
/// Liveness plus the lazy model-load flag, so the field client can
/// tell "server down" from "model still warming up".
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);

    Json(HealthResponse {
        status: "ok".to_string(),
        module: "hivewatch-server".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime.num_seconds().max(0) as u64,
        model_loaded: state.model.is_loaded(),
        timestamp: Utc::now(),
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/api/health", get(health_check))
}
