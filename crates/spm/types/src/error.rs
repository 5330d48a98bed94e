use thiserror::Error;

/// Parse errors for domain enums and version numbers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    #[error("unknown lifecycle status `{0}`")]
    UnknownStatus(String),

    #[error("unknown change type `{0}`")]
    UnknownChangeType(String),

    #[error("invalid version number: {0}")]
    InvalidVersion(String),
}
