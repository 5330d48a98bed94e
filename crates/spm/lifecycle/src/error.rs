//! Lifecycle error types

use spm_storage::StorageError;
use spm_types::{LifecycleStatus, VersionId};
use thiserror::Error;

/// Lifecycle engine errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid transition for version {version_id}: {from} -> {to}")]
    InvalidTransition {
        version_id: VersionId,
        from: LifecycleStatus,
        to: LifecycleStatus,
    },

    #[error("Validation failed for `{field}`: {message}")]
    Validation { field: String, message: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl LifecycleError {
    pub(crate) fn validation(field: &str, message: impl Into<String>) -> Self {
        LifecycleError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn version_not_found(version_id: &VersionId) -> Self {
        LifecycleError::NotFound(format!("document version {version_id}"))
    }
}

impl From<StorageError> for LifecycleError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(msg) => LifecycleError::NotFound(msg),
            StorageError::Conflict(msg) | StorageError::InvariantViolation(msg) => {
                LifecycleError::Conflict(msg)
            }
            StorageError::InvalidInput(msg) => LifecycleError::Validation {
                field: "input".to_string(),
                message: msg,
            },
            StorageError::Unavailable(msg) => LifecycleError::Unavailable(msg),
            StorageError::Serialization(msg) | StorageError::Backend(msg) => {
                LifecycleError::Storage(msg)
            }
        }
    }
}

/// Result type for lifecycle operations
pub type Result<T> = std::result::Result<T, LifecycleError>;
