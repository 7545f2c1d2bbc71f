//! Ledger transaction types
//!
//! A transaction is a single immutable posting against one account. The
//! store assigns its `TXN-` number and applies its balance effect in the
//! same atomic unit as the insert.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use core_kernel::{AccountId, BranchId, CoreError, TransactionId, UserId};

/// Side of a posting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryType {
    Debit,
    Credit,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Debit => "DEBIT",
            EntryType::Credit => "CREDIT",
        }
    }

    /// Balance change caused by posting `amount` on this side
    pub fn signed(&self, amount: Decimal) -> Decimal {
        match self {
            EntryType::Debit => amount,
            EntryType::Credit => -amount,
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEBIT" => Ok(EntryType::Debit),
            "CREDIT" => Ok(EntryType::Credit),
            other => Err(CoreError::validation(format!("Unknown transaction type: {}", other))),
        }
    }
}

/// A posting that has not been numbered or stored yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Posting {
    pub account_id: AccountId,
    pub branch_id: BranchId,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    /// Always positive
    pub amount: Decimal,
    pub category: String,
    pub description: String,
    pub reference: Option<String>,
    pub transaction_date: NaiveDate,
    pub created_by: UserId,
}

impl Posting {
    /// Creates a new debit posting
    pub fn debit(
        account_id: AccountId,
        branch_id: BranchId,
        amount: Decimal,
        created_by: UserId,
    ) -> Self {
        Self::new(account_id, branch_id, EntryType::Debit, amount, created_by)
    }

    /// Creates a new credit posting
    pub fn credit(
        account_id: AccountId,
        branch_id: BranchId,
        amount: Decimal,
        created_by: UserId,
    ) -> Self {
        Self::new(account_id, branch_id, EntryType::Credit, amount, created_by)
    }

    fn new(
        account_id: AccountId,
        branch_id: BranchId,
        entry_type: EntryType,
        amount: Decimal,
        created_by: UserId,
    ) -> Self {
        Self {
            account_id,
            branch_id,
            entry_type,
            amount,
            category: String::new(),
            description: String::new(),
            reference: None,
            transaction_date: Utc::now().date_naive(),
            created_by,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn dated(mut self, date: NaiveDate) -> Self {
        self.transaction_date = date;
        self
    }

    /// Balance change this posting causes
    pub fn delta(&self) -> Decimal {
        self.entry_type.signed(self.amount)
    }

    /// Turns the posting into a stored transaction with its number
    pub fn into_transaction(self, number: String) -> Transaction {
        Transaction {
            id: TransactionId::new_v7(),
            number,
            entry_type: self.entry_type,
            amount: self.amount,
            account_id: self.account_id,
            branch_id: self.branch_id,
            category: self.category,
            description: self.description,
            reference: self.reference,
            transaction_date: self.transaction_date,
            created_by: self.created_by,
            created_at: Utc::now(),
        }
    }
}

/// An immutable ledger posting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    /// Human-facing number, e.g. `TXN-000042`
    pub number: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub amount: Decimal,
    pub account_id: AccountId,
    pub branch_id: BranchId,
    pub category: String,
    pub description: String,
    pub reference: Option<String>,
    pub transaction_date: NaiveDate,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Balance change this transaction caused
    pub fn delta(&self) -> Decimal {
        self.entry_type.signed(self.amount)
    }
}

/// Input for posting a manual transaction
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PostTransaction {
    pub branch_id: BranchId,
    pub account_id: AccountId,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub amount: Decimal,
    #[validate(length(min = 1, max = 500, message = "must be 1-500 characters"))]
    pub description: String,
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub category: String,
    pub reference: Option<String>,
    pub transaction_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_signed_amounts() {
        assert_eq!(EntryType::Debit.signed(dec!(110)), dec!(110));
        assert_eq!(EntryType::Credit.signed(dec!(110)), dec!(-110));
    }

    #[test]
    fn test_posting_builder() {
        let posting = Posting::debit(AccountId::new(), BranchId::new(), dec!(25), UserId::new())
            .with_category("Invoice Payment")
            .with_description("Payment for INV-000001")
            .with_reference("INV-000001");

        assert_eq!(posting.delta(), dec!(25));
        let txn = posting.into_transaction("TXN-000001".to_string());
        assert_eq!(txn.number, "TXN-000001");
        assert_eq!(txn.reference.as_deref(), Some("INV-000001"));
    }

    #[test]
    fn test_entry_type_json() {
        assert_eq!(serde_json::to_string(&EntryType::Credit).unwrap(), "\"CREDIT\"");
        assert!("debit".parse::<EntryType>().is_err());
    }
}
