//! Payroll domain errors

use thiserror::Error;

use core_kernel::{CoreError, PortError};

/// Errors that can occur in the payroll domain
#[derive(Debug, Error)]
pub enum PayrollError {
    /// Invalid input
    #[error("{0}")]
    Validation(String),

    /// A payroll already exists for the employee and period
    #[error("Payroll already exists for this employee and pay period")]
    DuplicatePeriod,

    /// The payroll is not in a status that allows the operation
    #[error("{0}")]
    InvalidState(String),

    /// The caller may not perform the operation
    #[error("{0}")]
    Forbidden(String),

    /// Storage failure or missing/duplicate record reported by the store
    #[error(transparent)]
    Port(#[from] PortError),
}

impl PayrollError {
    pub fn invalid(message: impl Into<String>) -> Self {
        PayrollError::Validation(message.into())
    }
}

impl From<CoreError> for PayrollError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::Forbidden(msg) => PayrollError::Forbidden(msg),
            CoreError::Validation(msg) => PayrollError::Validation(msg),
            CoreError::InvalidStateTransition(msg) => PayrollError::InvalidState(msg),
            CoreError::NotFound(msg) => PayrollError::Port(PortError::not_found("Record", msg)),
            other => PayrollError::Validation(other.to_string()),
        }
    }
}

impl From<PayrollError> for PortError {
    fn from(error: PayrollError) -> Self {
        match error {
            PayrollError::Port(inner) => inner,
            PayrollError::DuplicatePeriod => PortError::conflict(error.to_string()),
            other => PortError::validation(other.to_string()),
        }
    }
}
