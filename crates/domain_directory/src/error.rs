//! Directory domain errors

use thiserror::Error;

use core_kernel::{CoreError, PortError};

/// Errors that can occur in the directory domain
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Invalid input
    #[error("{0}")]
    Validation(String),

    /// The caller may not perform the operation
    #[error("{0}")]
    Forbidden(String),

    /// Storage failure or missing/duplicate record reported by the store
    #[error(transparent)]
    Port(#[from] PortError),
}

impl DirectoryError {
    pub fn invalid(message: impl Into<String>) -> Self {
        DirectoryError::Validation(message.into())
    }
}

impl From<CoreError> for DirectoryError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::Forbidden(msg) => DirectoryError::Forbidden(msg),
            CoreError::Validation(msg) | CoreError::InvalidStateTransition(msg) => {
                DirectoryError::Validation(msg)
            }
            CoreError::NotFound(msg) => DirectoryError::Port(PortError::not_found("Record", msg)),
            other => DirectoryError::Validation(other.to_string()),
        }
    }
}
