//! Application-level errors (wraps domain and session errors)

use thiserror::Error;

use crate::application::validate::ValidationError;
use crate::domain::DomainError;
use crate::infrastructure::SessionError;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("{0}")]
    Session(#[from] SessionError),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("config error: {message}")]
    Config { message: String },

    #[error("dataset {0} not found")]
    DatasetNotFound(String),

    #[error("submission worker panicked")]
    WorkerPanicked,

    #[error("{context}: {source}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
