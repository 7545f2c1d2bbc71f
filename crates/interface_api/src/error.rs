//! API error handling
//!
//! Every domain error converts into [`ApiError`], which renders as
//! `{"success": false, "error": <code>, "message": <text>}`.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use core_kernel::{CoreError, PortError, TemporalError};
use domain_billing::BillingError;
use domain_booking::BookingError;
use domain_directory::DirectoryError;
use domain_inventory::InventoryError;
use domain_payroll::PayrollError;
use domain_support::SupportError;

use crate::auth::AuthError;

const INTERNAL_MESSAGE: &str = "An internal error occurred";

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Input or business-rule rejection
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Configuration(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::Conflict(_) => "conflict",
            ApiError::Validation(_) => "validation_error",
            ApiError::Configuration(_) => "configuration_error",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::Configuration(detail) | ApiError::Internal(detail) => {
                error!(error = %detail, code = self.code(), "Request failed");
                INTERNAL_MESSAGE.to_string()
            }
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::Conflict(msg)
            | ApiError::Validation(msg) => msg.clone(),
        };

        let body = ErrorResponse {
            success: false,
            error: self.code().to_string(),
            message,
        };

        (self.status(), Json(body)).into_response()
    }
}

// ============================================================================
// Kernel errors
// ============================================================================

impl From<PortError> for ApiError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound { entity_type, .. } => {
                ApiError::NotFound(format!("{} not found", entity_type))
            }
            PortError::Validation { message, .. } => ApiError::Validation(message),
            PortError::Conflict { message } => ApiError::Conflict(message),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) | CoreError::InvalidStateTransition(msg) => {
                ApiError::Validation(msg)
            }
            CoreError::NotFound(msg) => ApiError::NotFound(msg),
            CoreError::Forbidden(msg) => ApiError::Forbidden(msg),
            CoreError::Configuration(msg) => ApiError::Configuration(msg),
            CoreError::Money(e) => ApiError::Validation(e.to_string()),
            CoreError::Temporal(e) => ApiError::Validation(e.to_string()),
        }
    }
}

impl From<TemporalError> for ApiError {
    fn from(err: TemporalError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::from(CoreError::from(err))
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Unauthorized(err.to_string())
    }
}

// ============================================================================
// Domain errors
// ============================================================================

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::Forbidden(msg) => ApiError::Forbidden(msg),
            DirectoryError::Port(port) => port.into(),
            other => ApiError::Validation(other.to_string()),
        }
    }
}

impl From<BillingError> for ApiError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::Forbidden(msg) => ApiError::Forbidden(msg),
            BillingError::Port(port) => port.into(),
            other if other.is_configuration() => ApiError::Configuration(other.to_string()),
            other => ApiError::Validation(other.to_string()),
        }
    }
}

impl From<PayrollError> for ApiError {
    fn from(err: PayrollError) -> Self {
        match err {
            PayrollError::Forbidden(msg) => ApiError::Forbidden(msg),
            PayrollError::Port(port) => port.into(),
            PayrollError::DuplicatePeriod => {
                ApiError::Conflict(PayrollError::DuplicatePeriod.to_string())
            }
            other => ApiError::Validation(other.to_string()),
        }
    }
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Forbidden(msg) => ApiError::Forbidden(msg),
            BookingError::Port(port) => port.into(),
            other => ApiError::Validation(other.to_string()),
        }
    }
}

impl From<InventoryError> for ApiError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::Forbidden(msg) => ApiError::Forbidden(msg),
            InventoryError::Port(port) => port.into(),
            other => ApiError::Validation(other.to_string()),
        }
    }
}

impl From<SupportError> for ApiError {
    fn from(err: SupportError) -> Self {
        match err {
            SupportError::Forbidden(msg) => ApiError::Forbidden(msg),
            SupportError::Port(port) => port.into(),
            other => ApiError::Validation(other.to_string()),
        }
    }
}

// ============================================================================
// Extractor rejections
// ============================================================================

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Missing required fields: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_errors_map_to_status() {
        let not_found: ApiError = PortError::not_found("Invoice", "x").into();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        assert!(matches!(not_found, ApiError::NotFound(ref m) if m == "Invoice not found"));

        let conflict: ApiError = PortError::conflict("SKU A-1 already exists").into();
        assert_eq!(conflict.status(), StatusCode::CONFLICT);

        let internal: ApiError = PortError::Internal {
            message: "pool closed".to_string(),
            source: None,
        }
        .into();
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_business_rules_are_bad_requests() {
        let err: ApiError = BookingError::SlotUnavailable.into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "validation_error");

        let err: ApiError = BillingError::PaymentExceedsBalance {
            remaining: "$110.00".to_string(),
        }
        .into();
        assert!(matches!(err, ApiError::Validation(ref m) if m.contains("exceeds remaining balance of $110.00")));
    }

    #[test]
    fn test_missing_cash_account_is_configuration_error() {
        let err: ApiError = BillingError::MissingCashAccount {
            branch: "Downtown".to_string(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "configuration_error");
    }

    #[test]
    fn test_duplicate_payroll_is_conflict() {
        let err: ApiError = PayrollError::DuplicatePeriod.into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_forbidden_passes_message_through() {
        let err: ApiError = CoreError::forbidden("role MANAGER is required, caller has STAFF").into();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert!(err.to_string().contains("MANAGER"));
    }
}
