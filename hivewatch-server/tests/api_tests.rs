//! HTTP API integration tests
//!
//! Drives the router directly with a stub label model and the file
//! store, so no model weights or database are needed.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use base64::{engine::general_purpose, Engine as _};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use hivewatch_common::models::Prediction;
use hivewatch_common::{Error, Result};
use hivewatch_server::classify::LabelModel;
use hivewatch_server::config::ServerConfig;
use hivewatch_server::store::FileStore;
use hivewatch_server::uploads::UploadStore;
use hivewatch_server::{build_router, AppState};

/// Stub model returning canned predictions
struct StubModel {
    predictions: Vec<Prediction>,
}

#[async_trait]
impl LabelModel for StubModel {
    async fn classify(&self, _image: &[u8]) -> Result<Vec<Prediction>> {
        Ok(self.predictions.clone())
    }

    fn is_loaded(&self) -> bool {
        true
    }
}

/// Stub model that never loads
struct DownModel;

#[async_trait]
impl LabelModel for DownModel {
    async fn classify(&self, _image: &[u8]) -> Result<Vec<Prediction>> {
        Err(Error::Unavailable("Model file not found".to_string()))
    }

    fn is_loaded(&self) -> bool {
        false
    }
}

fn preds(items: &[(&str, f32)]) -> Vec<Prediction> {
    items
        .iter()
        .map(|(label, probability)| Prediction {
            label: label.to_string(),
            probability: *probability,
        })
        .collect()
}

fn test_app(dir: &TempDir, model: Arc<dyn LabelModel>) -> axum::Router {
    let store = Arc::new(FileStore::new(
        dir.path().join("reports.json"),
        dir.path().join("contacts.json"),
    ));
    let uploads = UploadStore::new(dir.path().join("uploads")).unwrap();
    let state = AppState::new(
        ServerConfig::default(),
        model,
        store.clone(),
        store,
        uploads,
    );
    build_router(state)
}

fn sample_data_url() -> String {
    // Payload only needs to be valid base64; the stub ignores content
    format!(
        "data:image/jpeg;base64,{}",
        general_purpose::STANDARD.encode([0xFFu8, 0xD8, 0xFF, 0xE0])
    )
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn verify_request(image_data: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/verify-image")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::json!({ "imageData": image_data, "source": "camera" }).to_string(),
        ))
        .unwrap()
}

#[tokio::test]
async fn health_reports_model_state() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir, Arc::new(DownModel));

    let response = app
        .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "hivewatch-server");
    assert_eq!(body["modelLoaded"], false);
}

#[tokio::test]
async fn verify_accepts_honeycomb_at_floor() {
    let dir = TempDir::new().unwrap();
    let app = test_app(
        &dir,
        Arc::new(StubModel {
            predictions: preds(&[("honeycomb", 0.40), ("ant", 0.10)]),
        }),
    );

    let response = app.oneshot(verify_request(&sample_data_url())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["isHoneybee"], true);
    assert_eq!(body["confidence"], 95);
    assert_eq!(body["predictions"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn verify_rejects_phone_with_rationale() {
    let dir = TempDir::new().unwrap();
    let app = test_app(
        &dir,
        Arc::new(StubModel {
            predictions: preds(&[("cellular telephone", 0.80)]),
        }),
    );

    let response = app.oneshot(verify_request(&sample_data_url())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["isHoneybee"], false);
    assert_eq!(body["confidence"], 0);
    let labels = body["labels"].as_array().unwrap();
    assert!(labels
        .iter()
        .any(|l| l.as_str().unwrap().contains("cellular telephone")));
}

#[tokio::test]
async fn verify_missing_image_is_400() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir, Arc::new(DownModel));

    let response = app.oneshot(verify_request("")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn verify_without_model_is_503() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir, Arc::new(DownModel));

    let response = app.oneshot(verify_request(&sample_data_url())).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");
}

fn multipart_report(boundary: &str, include_image: bool) -> Vec<u8> {
    let mut body = Vec::new();
    let mut text_field = |name: &str, value: &str| {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    };
    text_field("gps", r#"{"lat":12.9716,"long":77.5946}"#);
    text_field("locationType", "Farm");
    text_field("userRole", "Farmer");
    text_field("address", "GKVK Campus, Bengaluru");
    text_field("phoneNumber", "+91 98765 43210");
    if include_image {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"colony.jpg\"\r\nContent-Type: image/jpeg\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(&[0xFF, 0xD8, 0xFF, 0xE0]);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

fn report_request(boundary: &str, include_image: bool) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/reports")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(multipart_report(boundary, include_image)))
        .unwrap()
}

#[tokio::test]
async fn report_round_trip_is_newest_first() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir, Arc::new(DownModel));

    let first = app
        .clone()
        .oneshot(report_request("hive-boundary", true))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);
    let first = json_body(first).await;
    assert_eq!(first["locationType"], "Farm");
    assert!(first["image"]
        .as_str()
        .unwrap()
        .starts_with("/uploads/user_uploads/"));

    let second = app
        .clone()
        .oneshot(report_request("hive-boundary", true))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CREATED);
    let second = json_body(second).await;

    let listing = app
        .oneshot(Request::get("/api/reports").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(listing.status(), StatusCode::OK);
    let listing = json_body(listing).await;
    let reports = listing.as_array().unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0]["id"], second["id"]);
    assert_eq!(reports[1]["id"], first["id"]);
}

#[tokio::test]
async fn report_without_image_is_400() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir, Arc::new(DownModel));

    let response = app
        .oneshot(report_request("hive-boundary", false))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn contact_lookup_always_returns_a_contact() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir, Arc::new(DownModel));

    let response = app
        .clone()
        .oneshot(
            Request::get("/api/emergency-contacts?lat=12.9&long=77.5&city=Bengaluru")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["contactName"], "National Bee Emergency Helpline");

    // Identical payload on repeat lookups
    let repeat = app
        .oneshot(
            Request::get("/api/emergency-contacts")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let repeat = json_body(repeat).await;
    assert_eq!(body, repeat);
}

#[tokio::test]
async fn contact_crud_over_http() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir, Arc::new(DownModel));

    let created = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/emergency-contacts")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "region": "Karnataka",
                        "contactName": "District Officer",
                        "phoneNumber": "+91 91234 56789",
                        "designation": "Bee Response",
                        "city": "Bengaluru"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);
    let created = json_body(created).await;
    let id = created["id"].as_str().unwrap().to_string();

    // City lookup now finds the stored contact
    let lookup = app
        .clone()
        .oneshot(
            Request::get("/api/emergency-contacts?city=Bengaluru")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let lookup = json_body(lookup).await;
    assert_eq!(lookup["id"].as_str().unwrap(), id);

    let deleted = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/emergency-contacts/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::OK);

    let missing = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/emergency-contacts/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn contact_create_missing_field_is_400() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir, Arc::new(DownModel));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/emergency-contacts")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "region": "",
                        "contactName": "Officer",
                        "phoneNumber": "+91 91234 56789",
                        "designation": "Bee Response"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn guidance_endpoint_maps_location_and_role() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir, Arc::new(DownModel));

    let response = app
        .clone()
        .oneshot(
            Request::get("/api/guidance?locationType=Farm&userRole=Farmer")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(!body["dos"].as_array().unwrap().is_empty());
    assert!(!body["donts"].as_array().unwrap().is_empty());

    let bad = app
        .oneshot(
            Request::get("/api/guidance?locationType=Rooftop&userRole=Farmer")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
}
