//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent invalid names and unreadable engine responses.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid libref '{0}': expected 1-8 characters (letters, digits, underscore), not starting with a digit")]
    InvalidLibref(String),

    #[error("invalid dataset name '{0}': expected [libref.]table")]
    InvalidDatasetName(String),

    #[error("malformed engine response: {message}")]
    MalformedResponse { message: String },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
