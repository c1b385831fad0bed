//! HTTP gateway to the hivewatch server
//!
//! The submission workflow talks to the server through the
//! `ReportGateway` trait so tests can drive the state machine without
//! a network. `ApiClient` is the real implementation.

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use hivewatch_common::api::{ErrorBody, HealthResponse, VerifyRequest, VerifyResponse};
use hivewatch_common::models::{EmergencyContact, Gps, Report};
use hivewatch_common::{Error, Result};
use reqwest::StatusCode;

use crate::capture::ImageSource;
use crate::workflow::SubmissionDraft;

/// Server operations the workflow depends on
#[async_trait]
pub trait ReportGateway: Send + Sync {
    /// Run the classify-then-decide pipeline on the draft's image
    async fn verify(&self, draft: &SubmissionDraft) -> Result<VerifyResponse>;

    /// Persist an accepted draft
    async fn store(&self, draft: &SubmissionDraft) -> Result<Report>;

    /// Regional emergency contact for the sighting
    async fn emergency_contact(&self, gps: &Gps, city: Option<&str>)
        -> Result<EmergencyContact>;
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        ApiClient {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Liveness and model-load state
    pub async fn health(&self) -> Result<HealthResponse> {
        let response = self
            .http
            .get(format!("{}/api/health", self.base_url))
            .send()
            .await
            .map_err(|e| self.request_err(e))?;
        response
            .json()
            .await
            .map_err(|e| Error::Network(e.to_string()))
    }

    fn request_err(&self, e: reqwest::Error) -> Error {
        if e.is_connect() || e.is_timeout() {
            Error::Network(format!(
                "Cannot reach server at {} ({}). Ensure the backend is running.",
                self.base_url, e
            ))
        } else {
            Error::Network(e.to_string())
        }
    }

    async fn error_from(response: reqwest::Response) -> Error {
        let status = response.status();
        let message = response
            .json::<ErrorBody>()
            .await
            .map(|body| body.error.message)
            .unwrap_or_else(|_| format!("Server error: {}", status));
        match status {
            StatusCode::SERVICE_UNAVAILABLE => Error::Unavailable(message),
            StatusCode::BAD_REQUEST => Error::Validation(message),
            StatusCode::NOT_FOUND => Error::NotFound(message),
            _ => Error::Internal(message),
        }
    }
}

/// Encode image bytes as the data URL the verify endpoint expects
fn data_url(image: &ImageSource) -> Result<String> {
    let mime = match image {
        ImageSource::File(path) => match path.extension().and_then(|e| e.to_str()) {
            Some("png") => "image/png",
            _ => "image/jpeg",
        },
        ImageSource::Frame(_) => "image/jpeg",
    };
    Ok(format!(
        "data:{};base64,{}",
        mime,
        general_purpose::STANDARD.encode(image.bytes()?)
    ))
}

#[async_trait]
impl ReportGateway for ApiClient {
    async fn verify(&self, draft: &SubmissionDraft) -> Result<VerifyResponse> {
        let image = draft
            .image
            .as_ref()
            .ok_or_else(|| Error::Validation("An image is required".to_string()))?;
        let request = VerifyRequest {
            image_data: data_url(image)?,
            source: Some(draft.origin()),
        };

        let response = self
            .http
            .post(format!("{}/api/verify-image", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| self.request_err(e))?;
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        response
            .json()
            .await
            .map_err(|e| Error::Network(e.to_string()))
    }

    async fn store(&self, draft: &SubmissionDraft) -> Result<Report> {
        let image = draft
            .image
            .as_ref()
            .ok_or_else(|| Error::Validation("An image is required".to_string()))?;
        let gps = serde_json::to_string(&draft.gps)
            .map_err(|e| Error::Internal(format!("GPS serialization failed: {}", e)))?;
        let location = draft
            .location_type
            .ok_or_else(|| Error::Validation("Select where the colony was found".to_string()))?;

        let mut form = reqwest::multipart::Form::new()
            .text("gps", gps)
            .text("locationType", location.to_string())
            .text("userRole", draft.user_role.to_string());
        if let Some(address) = &draft.address {
            form = form.text("address", address.clone());
        }
        if let Some(phone) = &draft.phone_number {
            form = form.text("phoneNumber", phone.clone());
        }
        form = match image {
            ImageSource::File(_) => {
                let part = reqwest::multipart::Part::bytes(image.bytes()?)
                    .file_name(image.file_name().unwrap_or_else(|| "colony.jpg".to_string()))
                    .mime_str("image/jpeg")
                    .map_err(|e| Error::Internal(format!("Invalid upload part: {}", e)))?;
                form.part("image", part)
            }
            ImageSource::Frame(_) => form.text("image", data_url(image)?),
        };

        let response = self
            .http
            .post(format!("{}/api/reports", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| match self.request_err(e) {
                // Unreachable server during storage is still a
                // storage failure for the workflow; keep the
                // diagnostic text.
                Error::Network(msg) => Error::Storage(msg),
                other => other,
            })?;
        if !response.status().is_success() {
            let message = match Self::error_from(response).await {
                Error::Validation(msg) => return Err(Error::Validation(msg)),
                other => other.to_string(),
            };
            return Err(Error::Storage(message));
        }
        response
            .json()
            .await
            .map_err(|e| Error::Storage(format!("Malformed store response: {}", e)))
    }

    async fn emergency_contact(
        &self,
        gps: &Gps,
        city: Option<&str>,
    ) -> Result<EmergencyContact> {
        let mut request = self
            .http
            .get(format!("{}/api/emergency-contacts", self.base_url))
            .query(&[("lat", gps.lat.to_string()), ("long", gps.long.to_string())]);
        if let Some(city) = city {
            request = request.query(&[("city", city)]);
        }
        let response = request.send().await.map_err(|e| self.request_err(e))?;
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        response
            .json()
            .await
            .map_err(|e| Error::Network(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hivewatch_common::models::LocationType;
    use std::path::PathBuf;

    #[test]
    fn data_url_carries_mime_and_payload() {
        let url = data_url(&ImageSource::Frame(vec![0xFF, 0xD8])).unwrap();
        assert!(url.starts_with("data:image/jpeg;base64,"));
    }

    #[tokio::test]
    async fn unreachable_server_names_the_address() {
        let client = ApiClient::new("http://127.0.0.1:1");
        let mut draft = SubmissionDraft::new(Gps {
            lat: 12.9716,
            long: 77.5946,
        });
        draft.image = Some(ImageSource::Frame(vec![0xFF, 0xD8]));
        draft.location_type = Some(LocationType::Farm);

        let err = client.verify(&draft).await.unwrap_err();
        match err {
            Error::Network(message) => {
                assert!(message.contains("http://127.0.0.1:1"));
                assert!(message.contains("backend is running"));
            }
            other => panic!("expected network error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn missing_file_surfaces_as_validation() {
        let client = ApiClient::new("http://127.0.0.1:1");
        let mut draft = SubmissionDraft::new(Gps {
            lat: 0.0,
            long: 0.0,
        });
        draft.image = Some(ImageSource::File(PathBuf::from("/nonexistent/colony.jpg")));
        draft.location_type = Some(LocationType::Farm);

        let err = client.verify(&draft).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
