//! Inventory domain errors

use thiserror::Error;

use core_kernel::{CoreError, PortError};

/// Errors that can occur in the inventory domain
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Invalid input
    #[error("{0}")]
    Validation(String),

    /// The transfer workflow does not allow the step
    #[error("{0}")]
    InvalidTransition(String),

    /// The item is deactivated
    #[error("Inventory item {0} is inactive")]
    InactiveItem(String),

    /// The caller may not perform the operation
    #[error("{0}")]
    Forbidden(String),

    /// Storage failure or missing/duplicate record reported by the store
    #[error(transparent)]
    Port(#[from] PortError),
}

impl InventoryError {
    pub fn invalid(message: impl Into<String>) -> Self {
        InventoryError::Validation(message.into())
    }
}

impl From<CoreError> for InventoryError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::Forbidden(msg) => InventoryError::Forbidden(msg),
            CoreError::Validation(msg) => InventoryError::Validation(msg),
            CoreError::InvalidStateTransition(msg) => InventoryError::InvalidTransition(msg),
            CoreError::NotFound(msg) => InventoryError::Port(PortError::not_found("Record", msg)),
            other => InventoryError::Validation(other.to_string()),
        }
    }
}

impl From<InventoryError> for PortError {
    fn from(error: InventoryError) -> Self {
        match error {
            InventoryError::Port(inner) => inner,
            other => PortError::validation(other.to_string()),
        }
    }
}
