//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain_cases::CaseError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    /// Set when the same request may succeed later
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub retryable: bool,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", "Unauthorized".to_string()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            ApiError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", msg.clone()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg.clone()),
            ApiError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg.clone()),
        };

        if status.is_server_error() {
            error!(status = status.as_u16(), message = %message, "Request failed");
        }

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            retryable: matches!(self, ApiError::ServiceUnavailable(_) | ApiError::Conflict(_)),
        };

        (status, Json(body)).into_response()
    }
}

impl From<CaseError> for ApiError {
    fn from(err: CaseError) -> Self {
        let message = err.to_string();
        match err {
            CaseError::NotFound(_) => ApiError::NotFound(message),
            CaseError::Validation(_) => ApiError::Validation(message),
            CaseError::Forbidden { .. } => ApiError::Forbidden(message),
            CaseError::InvalidTransition { .. }
            | CaseError::StoreWriteConflict(_)
            | CaseError::DuplicateLot(_) => ApiError::Conflict(message),
            CaseError::ExternalServiceUnavailable(_) => ApiError::ServiceUnavailable(message),
            CaseError::Storage(_) => ApiError::Internal(message),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<infra_store::StoreError> for ApiError {
    fn from(err: infra_store::StoreError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
