//! Booking domain errors

use thiserror::Error;

use core_kernel::{CoreError, PortError, TemporalError};

/// Errors that can occur in the booking domain
#[derive(Debug, Error)]
pub enum BookingError {
    /// Invalid input
    #[error("{0}")]
    Validation(String),

    #[error("Booking start time must be in the future")]
    StartNotInFuture,

    #[error("Customer account is locked")]
    CustomerLocked,

    /// Daily cap on booked minutes per customer
    #[error("Daily booking limit of {limit} exceeded")]
    DailyLimitExceeded {
        /// Human readable limit, e.g. `2 hours`
        limit: String,
    },

    /// Monthly package allowance
    #[error("Monthly booking limit of {limit} exceeded")]
    MonthlyLimitExceeded {
        limit: String,
    },

    #[error("Time slot not available")]
    SlotUnavailable,

    /// The booking is not in a status that allows the operation
    #[error("{0}")]
    InvalidState(String),

    /// The caller may not perform the operation
    #[error("{0}")]
    Forbidden(String),

    /// Storage failure or missing/duplicate record reported by the store
    #[error(transparent)]
    Port(#[from] PortError),
}

impl BookingError {
    pub fn invalid(message: impl Into<String>) -> Self {
        BookingError::Validation(message.into())
    }

    /// Returns true for rejections by the quota guard
    pub fn is_quota_rejection(&self) -> bool {
        matches!(
            self,
            BookingError::DailyLimitExceeded { .. }
                | BookingError::MonthlyLimitExceeded { .. }
                | BookingError::SlotUnavailable
        )
    }
}

impl From<CoreError> for BookingError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::Forbidden(msg) => BookingError::Forbidden(msg),
            CoreError::Validation(msg) => BookingError::Validation(msg),
            CoreError::InvalidStateTransition(msg) => BookingError::InvalidState(msg),
            CoreError::NotFound(msg) => BookingError::Port(PortError::not_found("Record", msg)),
            other => BookingError::Validation(other.to_string()),
        }
    }
}

impl From<TemporalError> for BookingError {
    fn from(error: TemporalError) -> Self {
        BookingError::Validation(error.to_string())
    }
}

impl From<BookingError> for PortError {
    fn from(error: BookingError) -> Self {
        match error {
            BookingError::Port(inner) => inner,
            other => PortError::validation(other.to_string()),
        }
    }
}
