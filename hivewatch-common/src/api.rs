//! API request/response types shared by the server and field client
//!
//! This API speaks camelCase JSON to match the deployed mobile
//! clients.

use crate::models::Prediction;
use serde::{Deserialize, Serialize};

/// Where a submitted image came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageOrigin {
    Camera,
    Upload,
}

/// POST /api/verify-image request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    /// Base64 data URL (`data:image/...;base64,...`) or bare base64
    pub image_data: String,
    #[serde(default)]
    pub source: Option<ImageOrigin>,
}

/// POST /api/verify-image response
///
/// Ephemeral per attempt; an accept feeds the subsequent report, a
/// reject is discarded when the user retries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub is_honeybee: bool,
    /// 0-100
    pub confidence: u8,
    /// Human-readable rationale lines
    pub labels: Vec<String>,
    /// Top ranked classifier predictions, for transparency
    pub predictions: Vec<Prediction>,
    pub message: String,
}

/// GET /api/health response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// "ok" when the service is up
    pub status: String,
    pub module: String,
    pub version: String,
    pub uptime_seconds: u64,
    /// Whether the label model has finished its lazy load
    pub model_loaded: bool,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error body shape returned by the server on failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}
