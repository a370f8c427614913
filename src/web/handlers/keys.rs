// API key management handlers.
//
// POST /api/keys                    — create a key (full key shown once)
// GET  /api/keys                    — list key metadata, never the keys
// PUT  /api/keys/{key_id}/activate  — re-enable a key
// PUT  /api/keys/{key_id}/deactivate — disable a key
//
// Creating the first key requires the master key (see auth.rs); after that,
// any active key can manage keys.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::info;

use crate::web::{api_error, auth, AppState};

#[derive(Deserialize)]
pub struct ApiKeyCreate {
    pub owner_name: String,
    pub owner_email: Option<String>,
    pub description: Option<String>,
}

/// POST /api/keys — issue a new API key.
pub async fn create_api_key(
    State(state): State<AppState>,
    Json(payload): Json<ApiKeyCreate>,
) -> Response {
    if payload.owner_name.trim().is_empty() {
        return api_error(StatusCode::UNPROCESSABLE_ENTITY, "owner_name is required");
    }

    let api_key = auth::generate_api_key();
    let key_id = auth::generate_key_id();
    let key_hash = auth::hash_api_key(&api_key);

    if let Err(e) = state
        .db
        .insert_api_key(
            &key_id,
            &key_hash,
            payload.owner_name.trim(),
            payload.owner_email.as_deref(),
            payload.description.as_deref(),
        )
        .await
    {
        tracing::error!(error = %e, "Failed to store API key");
        return api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create key");
    }

    info!(key_id = %key_id, owner = %payload.owner_name, "API key created");

    // The only time the full key is ever returned.
    Json(serde_json::json!({
        "key_id": key_id,
        "api_key": api_key,
        "owner_name": payload.owner_name.trim(),
    }))
    .into_response()
}

/// GET /api/keys — list all keys (metadata only).
pub async fn list_api_keys(State(state): State<AppState>) -> Response {
    match state.db.list_api_keys().await {
        Ok(keys) => Json(keys).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to list API keys");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to list keys")
        }
    }
}

/// PUT /api/keys/{key_id}/activate
pub async fn activate_key(State(state): State<AppState>, Path(key_id): Path<String>) -> Response {
    set_active(state, key_id, true).await
}

/// PUT /api/keys/{key_id}/deactivate
pub async fn deactivate_key(State(state): State<AppState>, Path(key_id): Path<String>) -> Response {
    set_active(state, key_id, false).await
}

async fn set_active(state: AppState, key_id: String, active: bool) -> Response {
    match state.db.set_api_key_active(&key_id, active).await {
        Ok(true) => {
            let verb = if active { "activated" } else { "deactivated" };
            Json(serde_json::json!({
                "message": format!("API key {key_id} {verb} successfully")
            }))
            .into_response()
        }
        Ok(false) => api_error(StatusCode::NOT_FOUND, "API key not found"),
        Err(e) => {
            tracing::error!(error = %e, key_id = %key_id, "Failed to update API key");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to update key")
        }
    }
}
