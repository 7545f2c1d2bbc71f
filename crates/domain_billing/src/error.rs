//! Billing domain errors

use thiserror::Error;

use core_kernel::{CoreError, PortError};

/// Errors that can occur in the billing domain
#[derive(Debug, Error)]
pub enum BillingError {
    /// Invalid input
    #[error("{0}")]
    Validation(String),

    /// The payment would take the amount paid above the document total
    #[error("Payment amount exceeds remaining balance of {remaining}")]
    PaymentExceedsBalance {
        /// Remaining balance, already formatted in the branch currency
        remaining: String,
    },

    /// The document is not in a status that allows the operation
    #[error("{0}")]
    InvalidState(String),

    /// The posting targets an account of another branch
    #[error("Account {account} does not belong to branch {branch}")]
    AccountBranchMismatch {
        account: String,
        branch: String,
    },

    /// Payments received cannot be booked because the branch has no cash account
    #[error("No cash account (ASSET, Current Asset, name containing \"cash\") configured for branch {branch}")]
    MissingCashAccount {
        branch: String,
    },

    /// The caller may not perform the operation
    #[error("{0}")]
    Forbidden(String),

    /// Storage failure or missing/duplicate record reported by the store
    #[error(transparent)]
    Port(#[from] PortError),
}

impl BillingError {
    /// Creates a Validation error with a message
    pub fn invalid(message: impl Into<String>) -> Self {
        BillingError::Validation(message.into())
    }

    /// Returns true for configuration problems rather than caller mistakes
    pub fn is_configuration(&self) -> bool {
        matches!(self, BillingError::MissingCashAccount { .. })
    }
}

impl From<CoreError> for BillingError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::Forbidden(msg) => BillingError::Forbidden(msg),
            CoreError::Validation(msg) => BillingError::Validation(msg),
            CoreError::InvalidStateTransition(msg) => BillingError::InvalidState(msg),
            CoreError::NotFound(msg) => BillingError::Port(PortError::not_found("Record", msg)),
            other => BillingError::Validation(other.to_string()),
        }
    }
}
