//! Invoices and bills
//!
//! Both are `BillingDocument`s distinguished by `kind`: invoices bill a
//! customer, bills record what the branch owes a vendor. Totals are derived
//! from the line items when the document is composed and never edited
//! afterwards.
//!
//! # Status lifecycle
//!
//! ```text
//! DRAFT ──issue──▶ PENDING ──pay──▶ PARTIAL ──pay──▶ PAID
//!   │                 │  └───────────pay (full)──────▶ PAID
//!   └──────cancel─────┴──▶ CANCELLED   (no payments recorded)
//! ```
//!
//! A DRAFT document may also take payments directly.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use core_kernel::{
    round_money, BranchId, CoreError, Currency, CustomerId, DocumentId, LineItemId, Rate,
    UserId, VendorId,
};

use crate::error::BillingError;
use crate::numbering::NumberSeries;

/// Invoice or bill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentKind {
    Invoice,
    Bill,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Invoice => "INVOICE",
            DocumentKind::Bill => "BILL",
        }
    }

    /// Number series the document draws from
    pub fn series(&self) -> NumberSeries {
        match self {
            DocumentKind::Invoice => NumberSeries::Invoice,
            DocumentKind::Bill => NumberSeries::Bill,
        }
    }

    /// Label used in messages
    pub fn label(&self) -> &'static str {
        match self {
            DocumentKind::Invoice => "Invoice",
            DocumentKind::Bill => "Bill",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INVOICE" => Ok(DocumentKind::Invoice),
            "BILL" => Ok(DocumentKind::Bill),
            other => Err(CoreError::validation(format!("Unknown document kind: {}", other))),
        }
    }
}

/// Document status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    /// Being drafted
    Draft,
    /// Issued, nothing paid yet
    Pending,
    /// Some but not all of the total paid
    Partial,
    /// Fully paid
    Paid,
    /// Voided before any payment
    Cancelled,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Draft => "DRAFT",
            DocumentStatus::Pending => "PENDING",
            DocumentStatus::Partial => "PARTIAL",
            DocumentStatus::Paid => "PAID",
            DocumentStatus::Cancelled => "CANCELLED",
        }
    }

    /// Status implied by the amount paid so far
    pub fn for_payment(paid: Decimal, total: Decimal) -> Self {
        if paid >= total {
            DocumentStatus::Paid
        } else {
            DocumentStatus::Partial
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(DocumentStatus::Draft),
            "PENDING" => Ok(DocumentStatus::Pending),
            "PARTIAL" => Ok(DocumentStatus::Partial),
            "PAID" => Ok(DocumentStatus::Paid),
            "CANCELLED" => Ok(DocumentStatus::Cancelled),
            other => Err(CoreError::validation(format!("Unknown document status: {}", other))),
        }
    }
}

/// Who the document is with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Counterparty {
    #[serde(rename = "customerId")]
    Customer(CustomerId),
    #[serde(rename = "vendorId")]
    Vendor(VendorId),
}

impl Counterparty {
    /// The document kind this counterparty belongs on
    pub fn kind(&self) -> DocumentKind {
        match self {
            Counterparty::Customer(_) => DocumentKind::Invoice,
            Counterparty::Vendor(_) => DocumentKind::Bill,
        }
    }

    pub fn as_uuid(&self) -> uuid::Uuid {
        match self {
            Counterparty::Customer(id) => *id.as_uuid(),
            Counterparty::Vendor(id) => *id.as_uuid(),
        }
    }
}

/// A line on an invoice or bill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: LineItemId,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    /// quantity × unitPrice
    pub amount: Decimal,
}

/// Input for one line item
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LineItemInput {
    #[validate(length(min = 1, max = 500, message = "must be 1-500 characters"))]
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

impl LineItemInput {
    fn into_line_item(self) -> Result<LineItem, BillingError> {
        if self.quantity <= Decimal::ZERO {
            return Err(BillingError::invalid("Item quantity must be greater than zero"));
        }
        if self.unit_price.is_sign_negative() {
            return Err(BillingError::invalid("Item unit price cannot be negative"));
        }
        Ok(LineItem {
            id: LineItemId::new_v7(),
            amount: self.quantity * self.unit_price,
            description: self.description.trim().to_string(),
            quantity: self.quantity,
            unit_price: self.unit_price,
        })
    }
}

/// Derived amounts of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTotals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

impl DocumentTotals {
    /// Subtotal of the items, tax at `rate` rounded to cents, and their sum
    pub fn compute(items: &[LineItem], rate: Rate) -> Self {
        let subtotal: Decimal = items.iter().map(|i| i.amount).sum();
        let tax_amount = rate.apply(subtotal);
        Self {
            subtotal,
            tax_amount,
            total: subtotal + tax_amount,
        }
    }
}

/// Input for composing a document
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDraft {
    #[serde(flatten)]
    pub counterparty: Counterparty,
    pub branch_id: BranchId,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    #[validate(nested)]
    pub items: Vec<LineItemInput>,
    /// Percentage, 0 to 100
    pub tax_rate: Option<Decimal>,
    pub notes: Option<String>,
}

/// An invoice or bill with its line items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingDocument {
    pub id: DocumentId,
    pub kind: DocumentKind,
    /// Assigned by the store on insert, e.g. `INV-000001`
    pub number: String,
    #[serde(flatten)]
    pub counterparty: Counterparty,
    pub branch_id: BranchId,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub items: Vec<LineItem>,
    pub subtotal: Decimal,
    /// Percentage, 0 to 100
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    pub amount_paid: Decimal,
    pub status: DocumentStatus,
    pub notes: Option<String>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BillingDocument {
    /// Builds an unnumbered DRAFT document from a draft
    ///
    /// # Errors
    ///
    /// - `Validation` if there are no items, an item is invalid, the tax
    ///   rate is outside 0..=100 or the due date precedes the issue date
    pub fn compose(draft: DocumentDraft, created_by: UserId) -> Result<Self, BillingError> {
        if draft.items.is_empty() {
            return Err(BillingError::invalid("Missing required fields"));
        }
        if draft.due_date < draft.issue_date {
            return Err(BillingError::invalid("Due date cannot be before issue date"));
        }
        let tax_percentage = draft.tax_rate.unwrap_or(Decimal::ZERO);
        let rate = Rate::checked_percentage(tax_percentage)
            .map_err(|_| BillingError::invalid("Tax rate must be between 0 and 100"))?;

        let items = draft
            .items
            .into_iter()
            .map(LineItemInput::into_line_item)
            .collect::<Result<Vec<_>, _>>()?;
        let totals = DocumentTotals::compute(&items, rate);
        let now = Utc::now();

        Ok(Self {
            id: DocumentId::new_v7(),
            kind: draft.counterparty.kind(),
            number: String::new(),
            counterparty: draft.counterparty,
            branch_id: draft.branch_id,
            issue_date: draft.issue_date,
            due_date: draft.due_date,
            items,
            subtotal: totals.subtotal,
            tax_rate: tax_percentage,
            tax_amount: totals.tax_amount,
            total: totals.total,
            amount_paid: Decimal::ZERO,
            status: DocumentStatus::Draft,
            notes: draft.notes,
            created_by,
            created_at: now,
            updated_at: now,
        })
    }

    /// Returns the balance still owed
    pub fn remaining(&self) -> Decimal {
        self.total - self.amount_paid
    }

    /// Checks that a payment of `amount` can be taken
    ///
    /// `currency` formats the remaining balance in the rejection message.
    pub fn check_payment(&self, amount: Decimal, currency: Currency) -> Result<(), BillingError> {
        if amount <= Decimal::ZERO {
            return Err(BillingError::invalid("Payment amount must be greater than zero"));
        }
        if self.status == DocumentStatus::Cancelled {
            return Err(BillingError::InvalidState(format!(
                "{} {} is cancelled",
                self.kind.label(),
                self.number
            )));
        }
        if self.amount_paid + amount > self.total {
            return Err(BillingError::PaymentExceedsBalance {
                remaining: currency.format(round_money(self.remaining())),
            });
        }
        Ok(())
    }

    /// Applies a payment, moving the status to PARTIAL or PAID
    pub fn apply_payment(&mut self, amount: Decimal, currency: Currency) -> Result<(), BillingError> {
        self.check_payment(amount, currency)?;
        self.amount_paid += amount;
        self.status = DocumentStatus::for_payment(self.amount_paid, self.total);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// DRAFT → PENDING
    pub fn issue(&mut self) -> Result<(), BillingError> {
        if self.status != DocumentStatus::Draft {
            return Err(BillingError::InvalidState(format!(
                "Only draft documents can be issued, {} is {}",
                self.number, self.status
            )));
        }
        self.status = DocumentStatus::Pending;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// DRAFT or PENDING without payments → CANCELLED
    pub fn cancel(&mut self) -> Result<(), BillingError> {
        let cancellable = matches!(self.status, DocumentStatus::Draft | DocumentStatus::Pending);
        if !cancellable || self.amount_paid > Decimal::ZERO {
            return Err(BillingError::InvalidState(format!(
                "{} {} cannot be cancelled while {}",
                self.kind.label(),
                self.number,
                self.status
            )));
        }
        self.status = DocumentStatus::Cancelled;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Status changes other than payments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentAction {
    Issue,
    Cancel,
}

impl DocumentAction {
    pub fn apply(&self, document: &mut BillingDocument) -> Result<(), BillingError> {
        match self {
            DocumentAction::Issue => document.issue(),
            DocumentAction::Cancel => document.cancel(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn draft(items: Vec<(Decimal, Decimal)>, tax_rate: Option<Decimal>) -> DocumentDraft {
        DocumentDraft {
            counterparty: Counterparty::Customer(CustomerId::new()),
            branch_id: BranchId::new(),
            issue_date: date(1),
            due_date: date(31),
            items: items
                .into_iter()
                .map(|(quantity, unit_price)| LineItemInput {
                    description: "Hot desk".to_string(),
                    quantity,
                    unit_price,
                })
                .collect(),
            tax_rate,
            notes: None,
        }
    }

    #[test]
    fn test_compose_computes_totals() {
        let doc = BillingDocument::compose(draft(vec![(dec!(2), dec!(50))], Some(dec!(10))), UserId::new())
            .unwrap();

        assert_eq!(doc.kind, DocumentKind::Invoice);
        assert_eq!(doc.subtotal, dec!(100));
        assert_eq!(doc.tax_amount, dec!(10));
        assert_eq!(doc.total, dec!(110));
        assert_eq!(doc.status, DocumentStatus::Draft);
    }

    #[test]
    fn test_empty_items_rejected() {
        let result = BillingDocument::compose(draft(vec![], None), UserId::new());
        assert!(matches!(result, Err(BillingError::Validation(msg)) if msg == "Missing required fields"));
    }

    #[test]
    fn test_bad_items_and_rates_rejected() {
        assert!(BillingDocument::compose(draft(vec![(dec!(0), dec!(5))], None), UserId::new()).is_err());
        assert!(BillingDocument::compose(draft(vec![(dec!(1), dec!(-5))], None), UserId::new()).is_err());
        assert!(BillingDocument::compose(draft(vec![(dec!(1), dec!(5))], Some(dec!(101))), UserId::new()).is_err());

        let mut backwards = draft(vec![(dec!(1), dec!(5))], None);
        backwards.due_date = date(1);
        backwards.issue_date = date(2);
        assert!(BillingDocument::compose(backwards, UserId::new()).is_err());
    }

    #[test]
    fn test_payment_exceeding_balance_names_remaining() {
        let doc = BillingDocument::compose(draft(vec![(dec!(2), dec!(50))], Some(dec!(10))), UserId::new())
            .unwrap();
        let err = doc.check_payment(dec!(150), Currency::USD).unwrap_err();
        assert_eq!(err.to_string(), "Payment amount exceeds remaining balance of $110.00");
    }

    #[test]
    fn test_partial_then_paid() {
        let mut doc = BillingDocument::compose(draft(vec![(dec!(1), dec!(100))], None), UserId::new())
            .unwrap();
        doc.issue().unwrap();

        doc.apply_payment(dec!(40), Currency::USD).unwrap();
        assert_eq!(doc.status, DocumentStatus::Partial);
        assert_eq!(doc.remaining(), dec!(60));

        doc.apply_payment(dec!(60), Currency::USD).unwrap();
        assert_eq!(doc.status, DocumentStatus::Paid);

        assert!(matches!(
            doc.apply_payment(dec!(0.01), Currency::USD),
            Err(BillingError::PaymentExceedsBalance { .. })
        ));
    }

    #[test]
    fn test_cancel_rules() {
        let mut doc = BillingDocument::compose(draft(vec![(dec!(1), dec!(100))], None), UserId::new())
            .unwrap();
        doc.apply_payment(dec!(10), Currency::USD).unwrap();
        assert!(doc.cancel().is_err());

        let mut fresh = BillingDocument::compose(draft(vec![(dec!(1), dec!(100))], None), UserId::new())
            .unwrap();
        fresh.issue().unwrap();
        fresh.cancel().unwrap();
        assert_eq!(fresh.status, DocumentStatus::Cancelled);
        assert!(fresh.issue().is_err());
        assert!(matches!(
            fresh.check_payment(dec!(1), Currency::USD),
            Err(BillingError::InvalidState(_))
        ));
    }

    #[test]
    fn test_counterparty_flattens_into_document_json() {
        let doc = BillingDocument::compose(draft(vec![(dec!(1), dec!(1))], None), UserId::new()).unwrap();
        let value = serde_json::to_value(&doc).unwrap();
        assert!(value.get("customerId").is_some());
        assert!(value.get("vendorId").is_none());
        assert_eq!(value["status"], "DRAFT");
    }
}
