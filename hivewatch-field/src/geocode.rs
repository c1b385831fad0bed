//! Reverse geocoding adapter
//!
//! Best-effort address lookup for display and city-based contact
//! matching. Never on the critical path: a failure leaves the address
//! empty and the submission proceeds.

use hivewatch_common::models::Gps;
use hivewatch_common::{Error, Result};
use serde::Deserialize;
use tracing::warn;

const NOMINATIM_BASE_URL: &str = "https://nominatim.openstreetmap.org";
const USER_AGENT: &str = "HiveWatch Conservation App/0.1";

pub struct ReverseGeocoder {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    display_name: Option<String>,
}

impl ReverseGeocoder {
    pub fn new() -> Self {
        Self::with_base_url(NOMINATIM_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        ReverseGeocoder {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Display address for a coordinate, or None when the lookup
    /// fails for any reason.
    pub async fn lookup(&self, gps: &Gps) -> Option<String> {
        match self.try_lookup(gps).await {
            Ok(name) => name,
            Err(e) => {
                warn!("Reverse geocoding failed: {}", e);
                None
            }
        }
    }

    async fn try_lookup(&self, gps: &Gps) -> Result<Option<String>> {
        let url = format!(
            "{}/reverse?lat={}&lon={}&format=json&addressdetails=1",
            self.base_url, gps.lat, gps.long
        );
        let response = self
            .http
            .get(&url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(Error::Network(format!(
                "Geocoder returned {}",
                response.status()
            )));
        }
        let body: NominatimResponse = response
            .json()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        Ok(body.display_name)
    }
}

impl Default for ReverseGeocoder {
    fn default() -> Self {
        Self::new()
    }
}
