//! Error types for spmd

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use spm_bindings::BindingError;
use spm_lifecycle::LifecycleError;
use spm_storage::StorageError;
use spm_types::LifecycleStatus;
use thiserror::Error;

/// Daemon-level errors
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Binding error: {0}")]
    Binding(#[from] BindingError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// API-specific errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid transition for version {version_id}: {from} -> {to}")]
    InvalidTransition {
        version_id: String,
        from: LifecycleStatus,
        to: LifecycleStatus,
    },

    #[error("Validation error on `{field}`: {message}")]
    Validation { field: String, message: String },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        ApiError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, details) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", None),
            ApiError::InvalidTransition { from, to, .. } => (
                StatusCode::BAD_REQUEST,
                "INVALID_TRANSITION",
                Some(serde_json::json!({ "current": from, "attempted": to })),
            ),
            ApiError::Validation { field, .. } => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                Some(serde_json::json!({ "field": field })),
            ),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN", None),
            ApiError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE", None),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT", None),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", None),
        };

        if status.is_server_error() {
            tracing::warn!(error = %self, "request failed");
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::NotFound(msg) => ApiError::NotFound(msg),
            LifecycleError::InvalidTransition {
                version_id,
                from,
                to,
            } => ApiError::InvalidTransition {
                version_id: version_id.to_string(),
                from,
                to,
            },
            LifecycleError::Validation { field, message } => ApiError::Validation { field, message },
            LifecycleError::Conflict(msg) => ApiError::Conflict(msg),
            LifecycleError::Unavailable(msg) => ApiError::Unavailable(msg),
            LifecycleError::Storage(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<BindingError> for ApiError {
    fn from(err: BindingError) -> Self {
        match err {
            BindingError::MappedNotImplemented(_) => ApiError::Forbidden(err.to_string()),
            BindingError::Config(_) | BindingError::Unavailable(_) => {
                ApiError::Unavailable(err.to_string())
            }
            BindingError::Storage(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(msg) => ApiError::NotFound(msg),
            StorageError::Conflict(msg) | StorageError::InvariantViolation(msg) => {
                ApiError::Conflict(msg)
            }
            StorageError::InvalidInput(msg) => ApiError::validation("input", msg),
            StorageError::Unavailable(msg) => ApiError::Unavailable(msg),
            StorageError::Serialization(msg) | StorageError::Backend(msg) => {
                ApiError::Internal(msg)
            }
        }
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type alias for daemon operations
pub type DaemonResult<T> = Result<T, DaemonError>;

#[cfg(test)]
mod tests {
    use super::*;
    use spm_bindings::Entity;
    use spm_types::VersionId;

    #[test]
    fn test_api_error_status_codes() {
        let cases = [
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (
                ApiError::from(LifecycleError::InvalidTransition {
                    version_id: VersionId::generate(),
                    from: LifecycleStatus::Archived,
                    to: LifecycleStatus::Archived,
                }),
                StatusCode::BAD_REQUEST,
            ),
            (ApiError::validation("reason", "empty"), StatusCode::BAD_REQUEST),
            (
                ApiError::from(BindingError::MappedNotImplemented(Entity::Policy)),
                StatusCode::FORBIDDEN,
            ),
            (
                ApiError::from(StorageError::Unavailable("db down".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ApiError::from(StorageError::InvariantViolation("lost race".into())),
                StatusCode::CONFLICT,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
