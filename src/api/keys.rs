use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::keys::{IssuedKey, KeyValidation};
use crate::middleware::api_key::api_key_from;
use crate::middleware::ApiKeyInfo;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateKeyRequest {
    pub duration: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateKeyRequest {
    pub api_key: String,
}

/// POST /api/v1/keys: issue a new ephemeral key
pub async fn generate_key(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<GenerateKeyRequest>,
) -> Result<(StatusCode, Json<IssuedKey>), AppError> {
    let issued = state
        .keys
        .issue_for(&payload.duration, payload.description)?;
    Ok((StatusCode::CREATED, Json(issued)))
}

/// POST /api/v1/keys/validate: check a key without consuming it
pub async fn validate_key(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ValidateKeyRequest>,
) -> Json<KeyValidation> {
    Json(state.keys.validate(&payload.api_key))
}

/// DELETE /api/v1/keys: revoke the key sent in `x-api-key`
pub async fn revoke_key(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let raw = api_key_from(&headers).ok_or(AppError::MissingApiKey)?;
    if state.keys.revoke(raw) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::KeyNotFound)
    }
}

/// GET /api/v1/keys/me: gated; echoes what the gate attached
pub async fn current_key(info: ApiKeyInfo) -> Json<ApiKeyInfo> {
    Json(info)
}
