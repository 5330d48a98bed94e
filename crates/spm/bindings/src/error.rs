use crate::config::Entity;
use spm_storage::StorageError;
use thiserror::Error;

/// Registry and binding configuration errors
#[derive(Debug, Error)]
pub enum BindingError {
    #[error("invalid binding configuration: {0}")]
    Config(String),

    /// `mapped` was selected for an entity that has no mapped provider.
    #[error("mapped binding for {0} is not implemented")]
    MappedNotImplemented(Entity),

    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<StorageError> for BindingError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Unavailable(msg) => BindingError::Unavailable(msg),
            StorageError::InvalidInput(msg) => BindingError::Config(msg),
            other => BindingError::Storage(other.to_string()),
        }
    }
}

pub type BindingResult<T> = Result<T, BindingError>;
