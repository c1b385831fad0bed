//! Emergency contact lookup and admin CRUD

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use hivewatch_common::models::{ContactInput, EmergencyContact};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::store;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    #[allow(dead_code)]
    pub lat: Option<f64>,
    #[allow(dead_code)]
    pub long: Option<f64>,
    pub city: Option<String>,
}

/// GET /api/emergency-contacts?lat&long&city
///
/// City match, then any contact, then the national default. Always
/// 200 with exactly one contact; a reporter standing in front of a
/// hive never gets an empty response, even when the directory is
/// broken.
pub async fn lookup_contact(
    State(state): State<AppState>,
    Query(query): Query<LookupQuery>,
) -> Json<EmergencyContact> {
    let contact = match store::lookup_contact(state.contacts.as_ref(), query.city.as_deref()).await
    {
        Ok(contact) => contact,
        Err(e) => {
            warn!("Contact lookup failed ({}), serving national default", e);
            EmergencyContact::national_default()
        }
    };
    Json(contact)
}

/// GET /api/emergency-contacts/all
pub async fn list_contacts(State(state): State<AppState>) -> ApiResult<Json<Vec<EmergencyContact>>> {
    Ok(Json(state.contacts.list_all().await?))
}

/// POST /api/emergency-contacts
pub async fn create_contact(
    State(state): State<AppState>,
    Json(input): Json<ContactInput>,
) -> ApiResult<(StatusCode, Json<EmergencyContact>)> {
    validate(&input)?;
    let contact = state.contacts.create(input).await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

/// PUT /api/emergency-contacts/:id
pub async fn update_contact(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ContactInput>,
) -> ApiResult<Json<EmergencyContact>> {
    validate(&input)?;
    Ok(Json(state.contacts.update(id, input).await?))
}

/// DELETE /api/emergency-contacts/:id
pub async fn delete_contact(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    state.contacts.delete(id).await?;
    Ok(Json(json!({ "message": "Contact deleted successfully" })))
}

fn validate(input: &ContactInput) -> ApiResult<()> {
    for (field, value) in [
        ("region", &input.region),
        ("contactName", &input.contact_name),
        ("phoneNumber", &input.phone_number),
        ("designation", &input.designation),
    ] {
        if value.trim().is_empty() {
            return Err(ApiError::BadRequest(format!("Missing required field: {}", field)));
        }
    }
    Ok(())
}

pub fn contact_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/emergency-contacts",
            get(lookup_contact).post(create_contact),
        )
        .route("/api/emergency-contacts/all", get(list_contacts))
        .route(
            "/api/emergency-contacts/:id",
            axum::routing::put(update_contact).delete(delete_contact),
        )
}
