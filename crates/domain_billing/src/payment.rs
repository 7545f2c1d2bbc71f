//! Payment recording

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use core_kernel::{CoreError, DocumentId, PaymentId, UserId};

/// Payment method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Card,
    Cheque,
    Online,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::BankTransfer => "BANK_TRANSFER",
            PaymentMethod::Card => "CARD",
            PaymentMethod::Cheque => "CHEQUE",
            PaymentMethod::Online => "ONLINE",
            PaymentMethod::Other => "OTHER",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CASH" => Ok(PaymentMethod::Cash),
            "BANK_TRANSFER" => Ok(PaymentMethod::BankTransfer),
            "CARD" => Ok(PaymentMethod::Card),
            "CHEQUE" => Ok(PaymentMethod::Cheque),
            "ONLINE" => Ok(PaymentMethod::Online),
            "OTHER" => Ok(PaymentMethod::Other),
            other => Err(CoreError::validation(format!("Unknown payment method: {}", other))),
        }
    }
}

/// An immutable payment against an invoice or bill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    /// Unique identifier
    pub id: PaymentId,
    /// Invoice or bill being paid
    pub document_id: DocumentId,
    /// Payment amount
    pub amount: Decimal,
    /// Payment method
    pub method: PaymentMethod,
    /// External reference (bank ref, cheque number)
    pub reference: Option<String>,
    /// When the money was received or sent
    pub paid_at: DateTime<Utc>,
    pub recorded_by: UserId,
    pub created_at: DateTime<Utc>,
}

/// Input for recording a payment
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecordPayment {
    pub amount: Decimal,
    pub method: PaymentMethod,
    #[validate(length(max = 100, message = "must be at most 100 characters"))]
    pub reference: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl Payment {
    /// Creates a new payment
    ///
    /// # Arguments
    ///
    /// * `document_id` - Document being paid
    /// * `input` - Amount, method and reference
    /// * `recorded_by` - Who recorded the payment
    pub fn new(document_id: DocumentId, input: RecordPayment, recorded_by: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: PaymentId::new_v7(),
            document_id,
            amount: input.amount,
            method: input.method,
            reference: input.reference,
            paid_at: input.paid_at.unwrap_or(now),
            recorded_by,
            created_at: now,
        }
    }
}

/// Sum of the payments recorded so far
pub fn total_paid<'a>(payments: impl IntoIterator<Item = &'a Payment>) -> Decimal {
    payments.into_iter().map(|p| p.amount).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_method_round_trip() {
        let json = serde_json::to_string(&PaymentMethod::BankTransfer).unwrap();
        assert_eq!(json, "\"BANK_TRANSFER\"");
        assert_eq!("CHEQUE".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cheque);
    }

    #[test]
    fn test_total_paid() {
        let document_id = DocumentId::new();
        let payment = |amount| {
            Payment::new(
                document_id,
                RecordPayment {
                    amount,
                    method: PaymentMethod::Cash,
                    reference: None,
                    paid_at: None,
                },
                UserId::new(),
            )
        };
        let payments = vec![payment(dec!(40)), payment(dec!(60.50))];
        assert_eq!(total_paid(&payments), dec!(100.50));
    }
}
