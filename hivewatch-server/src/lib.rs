//! hivewatch-server library interface
//!
//! Exposes the router and state for integration testing.

pub mod api;
pub mod classify;
pub mod config;
pub mod decision;
pub mod error;
pub mod store;
pub mod uploads;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::classify::LabelModel;
use crate::config::ServerConfig;
use crate::store::{ContactStore, ReportStore};
use crate::uploads::UploadStore;

/// Base64 camera frames are large; match the deployed clients
const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Application state shared across handlers
///
/// No cross-request mutable state lives here; the model handle does
/// its own lazy-init synchronization internally.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub model: Arc<dyn LabelModel>,
    pub reports: Arc<dyn ReportStore>,
    pub contacts: Arc<dyn ContactStore>,
    pub uploads: Arc<UploadStore>,
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        model: Arc<dyn LabelModel>,
        reports: Arc<dyn ReportStore>,
        contacts: Arc<dyn ContactStore>,
        uploads: UploadStore,
    ) -> Self {
        Self {
            config: Arc::new(config),
            model,
            reports,
            contacts,
            uploads: Arc::new(uploads),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let uploads_dir = state.uploads.root().to_path_buf();

    Router::new()
        .merge(api::health_routes())
        .merge(api::verify_routes())
        .merge(api::report_routes())
        .merge(api::contact_routes())
        .merge(api::guidance_routes())
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
