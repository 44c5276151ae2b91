use std::sync::Arc;

use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::Json;

use crate::auth::{AuthResponse, LoginInput, RefreshInput, RegisterInput, TokenStatus};
use crate::errors::AppError;
use crate::AppState;

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(input): Json<LoginInput>,
) -> Result<Json<AuthResponse>, AppError> {
    Ok(Json(state.auth.login(&input).await?))
}

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(input): Json<RegisterInput>,
) -> Result<Json<AuthResponse>, AppError> {
    Ok(Json(state.auth.register(&input).await?))
}

/// POST /api/v1/auth/refresh
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(input): Json<RefreshInput>,
) -> Result<Json<AuthResponse>, AppError> {
    Ok(Json(state.auth.refresh(&input.refresh_token).await?))
}

/// GET /api/v1/auth/validate: checks the `Authorization: Bearer` token
pub async fn validate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<TokenStatus>, AppError> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AppError::TokenValidationFailed)?;

    Ok(Json(state.auth.validate_token(token).await?))
}
