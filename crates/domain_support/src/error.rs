//! Support domain errors

use thiserror::Error;

use core_kernel::{CoreError, PortError};

/// Errors that can occur in the support domain
#[derive(Debug, Error)]
pub enum SupportError {
    /// Invalid input, including status moves missing from the transition table
    #[error("{0}")]
    Validation(String),

    /// The caller may not perform the operation
    #[error("{0}")]
    Forbidden(String),

    /// Storage failure or missing/duplicate record reported by the store
    #[error(transparent)]
    Port(#[from] PortError),
}

impl SupportError {
    pub fn invalid(message: impl Into<String>) -> Self {
        SupportError::Validation(message.into())
    }
}

impl From<CoreError> for SupportError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::Forbidden(msg) => SupportError::Forbidden(msg),
            CoreError::Validation(msg) | CoreError::InvalidStateTransition(msg) => {
                SupportError::Validation(msg)
            }
            CoreError::NotFound(msg) => SupportError::Port(PortError::not_found("Record", msg)),
            other => SupportError::Validation(other.to_string()),
        }
    }
}
