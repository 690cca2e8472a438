use axum::{
    Extension, Json,
    extract::{Path, State},
};
use chrono::Utc;
use serde_json::{Value, json};
use uuid::Uuid;

use alive_core::CoreError;
use alive_core::contacts;
use alive_types::api::{Claims, ContactListResponse, ContactRequest, ContactResponse};

use crate::error::ApiResult;
use crate::extract::JsonBody;
use crate::state::AppState;

pub async fn list_contacts(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<ContactListResponse>> {
    let contacts = contacts::list_contacts(&state.store, claims.sub).await?;
    Ok(Json(ContactListResponse {
        success: true,
        contacts,
    }))
}

pub async fn add_contact(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    JsonBody(req): JsonBody<ContactRequest>,
) -> ApiResult<Json<ContactResponse>> {
    let contact = contacts::add_contact(&state.store, claims.sub, req, Utc::now()).await?;
    Ok(Json(ContactResponse {
        success: true,
        contact,
    }))
}

pub async fn update_contact(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(contact_id): Path<String>,
    JsonBody(req): JsonBody<ContactRequest>,
) -> ApiResult<Json<ContactResponse>> {
    let contact_id = parse_contact_id(&contact_id)?;
    let contact = contacts::update_contact(&state.store, claims.sub, contact_id, req).await?;
    Ok(Json(ContactResponse {
        success: true,
        contact,
    }))
}

pub async fn delete_contact(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(contact_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let contact_id = parse_contact_id(&contact_id)?;
    contacts::delete_contact(&state.store, claims.sub, contact_id).await?;
    Ok(Json(json!({ "success": true })))
}

/// A malformed id can't name one of the caller's contacts.
fn parse_contact_id(raw: &str) -> Result<Uuid, CoreError> {
    raw.parse()
        .map_err(|_| CoreError::NotFoundOrForbidden("contact does not exist or is not yours".into()))
}
