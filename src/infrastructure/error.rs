//! Infrastructure-level errors

use std::io;

use thiserror::Error;

use crate::application::ApplicationError;

/// Infrastructure errors wrap application errors and add I/O-level concerns.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl InfraError {
    /// Create an I/O error with context.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Result type for infrastructure layer operations.
pub type InfraResult<T> = Result<T, InfraError>;

/// Failures of the engine session.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The session cannot be started with the current settings.
    #[error("session configuration error: {message}")]
    Config { message: String },

    /// The engine process could not be reached or went away.
    #[error("session connection error: {0}")]
    Connection(#[source] io::Error),

    /// The engine answered with something that could not be understood.
    #[error("session protocol error: {message}")]
    Protocol { message: String },
}

impl SessionError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Engine exited before answering.
    pub fn disconnected() -> Self {
        Self::Connection(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "engine process exited",
        ))
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }
}

impl From<crate::domain::DomainError> for SessionError {
    fn from(e: crate::domain::DomainError) -> Self {
        Self::Protocol {
            message: e.to_string(),
        }
    }
}
