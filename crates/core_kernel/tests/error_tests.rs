//! Tests for core_kernel error types

use core_kernel::error::CoreError;
use core_kernel::money::MoneyError;
use core_kernel::ports::PortError;
use core_kernel::temporal::TemporalError;

#[test]
fn test_core_error_validation() {
    let error = CoreError::validation("Invalid input");

    match error {
        CoreError::Validation(msg) => assert_eq!(msg, "Invalid input"),
        _ => panic!("Expected Validation error"),
    }
}

#[test]
fn test_core_error_invalid_state() {
    let error = CoreError::invalid_state("Cannot transition from PAID to DRAFT");

    match error {
        CoreError::InvalidStateTransition(msg) => assert!(msg.contains("Cannot transition")),
        _ => panic!("Expected InvalidStateTransition error"),
    }
}

#[test]
fn test_core_error_not_found() {
    let error = CoreError::not_found("Booking not found");

    match error {
        CoreError::NotFound(msg) => assert_eq!(msg, "Booking not found"),
        _ => panic!("Expected NotFound error"),
    }
}

#[test]
fn test_core_error_forbidden() {
    let error = CoreError::forbidden("role MANAGER is required");
    assert!(error.to_string().starts_with("Forbidden"));
}

#[test]
fn test_core_error_from_money_error() {
    let money_error = MoneyError::UnknownCurrency("XYZ".to_string());
    let core_error: CoreError = money_error.into();

    assert!(matches!(core_error, CoreError::Money(_)));
}

#[test]
fn test_core_error_from_temporal_error() {
    let temporal_error = TemporalError::InvalidTime("25:00".to_string());
    let core_error: CoreError = temporal_error.into();

    assert!(matches!(core_error, CoreError::Temporal(_)));
    assert!(core_error.to_string().contains("25:00"));
}

#[test]
fn test_core_error_display() {
    let error = CoreError::validation("Test error");
    let display = format!("{}", error);

    assert!(display.contains("Validation error"));
}

#[test]
fn test_port_error_helpers() {
    let error = PortError::validation_field("must be positive", "amount");
    match error {
        PortError::Validation { message, field } => {
            assert_eq!(message, "must be positive");
            assert_eq!(field.as_deref(), Some("amount"));
        }
        _ => panic!("Expected Validation error"),
    }

    assert!(PortError::connection("pool closed").is_transient());
    assert!(!PortError::internal("boom").is_transient());
}

#[test]
fn test_core_error_from_validation_errors() {
    use validator::Validate;

    #[derive(Validate)]
    struct Input {
        #[validate(email(message = "must be a valid email"))]
        email: String,
        #[validate(length(min = 1, message = "must not be empty"))]
        name: String,
    }

    let input = Input {
        email: "nope".to_string(),
        name: String::new(),
    };
    let error: CoreError = input.validate().unwrap_err().into();

    match error {
        CoreError::Validation(msg) => {
            assert_eq!(msg, "email: must be a valid email; name: must not be empty");
        }
        _ => panic!("Expected Validation error"),
    }
}
