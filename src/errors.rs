use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::keys::KeyError;

pub const MISSING_API_KEY_MESSAGE: &str = "API key required. Send it in the x-api-key header.";
pub const INVALID_API_KEY_MESSAGE: &str = "API key invalid or expired. Generate a new one.";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid duration: {0}")]
    InvalidDuration(String),

    #[error("missing api key")]
    MissingApiKey,

    #[error("invalid api key")]
    InvalidApiKey,

    #[error("api key not found")]
    KeyNotFound,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("auth service rejected request ({status}): {message}")]
    AuthRejected { status: StatusCode, message: String },

    #[error("service unavailable")]
    ServiceUnavailable,

    #[error("token refresh failed")]
    RefreshFailed,

    #[error("token validation failed")]
    TokenValidationFailed,

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<KeyError> for AppError {
    fn from(e: KeyError) -> Self {
        match e {
            KeyError::InvalidDuration(value) => AppError::InvalidDuration(value),
            other => AppError::Internal(other.into()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, code, msg) = match &self {
            AppError::InvalidDuration(value) => (
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                "invalid_duration",
                format!(
                    "invalid duration '{}': expected one of 1h, 24h, 7d, 30d",
                    value
                ),
            ),
            AppError::MissingApiKey => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "missing_api_key",
                MISSING_API_KEY_MESSAGE.to_string(),
            ),
            AppError::InvalidApiKey => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "invalid_api_key",
                INVALID_API_KEY_MESSAGE.to_string(),
            ),
            AppError::KeyNotFound => (
                StatusCode::NOT_FOUND,
                "not_found_error",
                "key_not_found",
                "api key not found or already expired".to_string(),
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "invalid_credentials",
                "Invalid credentials".to_string(),
            ),
            AppError::Validation(reason) => (
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                "validation_failed",
                reason.clone(),
            ),
            AppError::AuthRejected { status, message } => (
                *status,
                "authentication_error",
                "auth_rejected",
                message.clone(),
            ),
            AppError::ServiceUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "upstream_error",
                "service_unavailable",
                "Service unavailable".to_string(),
            ),
            AppError::RefreshFailed => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "refresh_failed",
                "Token refresh failed".to_string(),
            ),
            AppError::TokenValidationFailed => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "token_validation_failed",
                "Token validation failed".to_string(),
            ),
            AppError::Upstream(e) => (
                StatusCode::BAD_GATEWAY,
                "upstream_error",
                "upstream_failed",
                e.clone(),
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal_server_error",
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "message": msg,
                "type": error_type,
                "code": code,
            }
        }));

        (status, body).into_response()
    }
}
