//! Billing Domain - Ledger, Invoices, Bills and Payments
//!
//! This crate keeps the books of a coworking branch:
//!
//! - **Chart of accounts**: per-branch accounts with a running balance
//! - **Ledger**: single-sided DEBIT/CREDIT postings. A DEBIT adds to the
//!   account balance and a CREDIT subtracts from it; every posting gets a
//!   sequential `TXN-000001` style number
//! - **Invoices** (to customers) and **bills** (from vendors): line items,
//!   tax rounded to cents, sequential numbers and a status that follows
//!   the amount paid
//! - **Payments**: recorded against a document, never above what is still
//!   owed. Invoice payments are posted as a DEBIT to the branch cash
//!   account in the same atomic operation
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_billing::{BillingService, DocumentKind, RecordPayment};
//!
//! let recorded = service
//!     .record_payment(&actor, DocumentKind::Invoice, invoice.id, payment)
//!     .await?;
//! assert_eq!(recorded.document.status, DocumentStatus::Partial);
//! ```

pub mod account;
pub mod transaction;
pub mod numbering;
pub mod document;
pub mod payment;
pub mod ledger;
pub mod ports;
pub mod service;
pub mod error;

pub use account::{Account, AccountType, CoworkingChartOfAccounts, NewAccount};
pub use transaction::{EntryType, Posting, PostTransaction, Transaction};
pub use numbering::NumberSeries;
pub use document::{
    BillingDocument, Counterparty, DocumentAction, DocumentDraft, DocumentKind, DocumentStatus,
    DocumentTotals, LineItem, LineItemInput,
};
pub use payment::{Payment, PaymentMethod, RecordPayment};
pub use ledger::{Ledger, PostingTotals, Reconciliation, TrialBalance, TrialBalanceEntry};
pub use ports::{AccountQuery, BillingPort, DocumentQuery, RecordedPayment, TransactionQuery};
#[cfg(any(test, feature = "memory"))]
pub use ports::memory::MemoryBillingPort;
pub use service::{BillingService, BillingSettings, INVOICE_PAYMENT_CATEGORY};
pub use error::BillingError;
