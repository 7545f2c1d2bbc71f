//! Billing Domain Ports
//!
//! `BillingPort` is what the billing domain needs from its data source.
//! Every method that writes more than one record is a single call the
//! adapter must apply atomically:
//!
//! - `post_transaction`: number allocation, insert and balance update
//! - `create_document`: number allocation, header and items
//! - `record_payment`: document lock, balance check, payment insert,
//!   status update and the optional cash posting
//!
//! The in-memory adapter holds one write guard for the whole call; the
//! PostgreSQL adapter in `infra_db` uses one SQL transaction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use core_kernel::{
    AccountId, BranchId, Currency, DateRange, DocumentId, DomainPort, HealthCheckable, Page,
    PageRequest, PortError, TransactionId,
};

use crate::account::{Account, AccountType};
use crate::document::{BillingDocument, Counterparty, DocumentAction, DocumentKind, DocumentStatus};
use crate::error::BillingError;
use crate::ledger::PostingTotals;
use crate::payment::Payment;
use crate::transaction::{EntryType, Posting, Transaction};

/// Filters for listing accounts
#[derive(Debug, Clone, Default)]
pub struct AccountQuery {
    pub branch_id: Option<BranchId>,
    pub account_type: Option<AccountType>,
    /// Case-insensitive exact match
    pub category: Option<String>,
}

impl AccountQuery {
    pub fn matches(&self, account: &Account) -> bool {
        self.branch_id.map_or(true, |b| account.branch_id == b)
            && self.account_type.map_or(true, |t| account.account_type == t)
            && self
                .category
                .as_ref()
                .map_or(true, |c| account.category.eq_ignore_ascii_case(c))
    }
}

/// Filters for listing transactions
#[derive(Debug, Clone, Default)]
pub struct TransactionQuery {
    pub branch_id: Option<BranchId>,
    pub account_id: Option<AccountId>,
    pub entry_type: Option<EntryType>,
    pub category: Option<String>,
    /// Inclusive range on the transaction date
    pub dates: Option<DateRange>,
}

impl TransactionQuery {
    pub fn matches(&self, txn: &Transaction) -> bool {
        self.branch_id.map_or(true, |b| txn.branch_id == b)
            && self.account_id.map_or(true, |a| txn.account_id == a)
            && self.entry_type.map_or(true, |t| txn.entry_type == t)
            && self
                .category
                .as_ref()
                .map_or(true, |c| txn.category.eq_ignore_ascii_case(c))
            && self.dates.map_or(true, |r| r.contains(txn.transaction_date))
    }
}

/// Filters for listing invoices or bills
#[derive(Debug, Clone)]
pub struct DocumentQuery {
    pub kind: DocumentKind,
    pub branch_id: Option<BranchId>,
    pub counterparty: Option<Counterparty>,
    pub status: Option<DocumentStatus>,
    /// Inclusive range on the issue date
    pub issued: Option<DateRange>,
}

impl DocumentQuery {
    pub fn new(kind: DocumentKind) -> Self {
        Self {
            kind,
            branch_id: None,
            counterparty: None,
            status: None,
            issued: None,
        }
    }

    pub fn matches(&self, doc: &BillingDocument) -> bool {
        doc.kind == self.kind
            && self.branch_id.map_or(true, |b| doc.branch_id == b)
            && self.counterparty.map_or(true, |c| doc.counterparty == c)
            && self.status.map_or(true, |s| doc.status == s)
            && self.issued.map_or(true, |r| r.contains(doc.issue_date))
    }
}

/// Everything written by a successful payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedPayment {
    pub payment: Payment,
    pub document: BillingDocument,
    /// Cash posting, when one was made
    pub transaction: Option<Transaction>,
}

/// Document rules broken inside an atomic store call surface as validation
/// errors carrying the domain message.
impl From<BillingError> for PortError {
    fn from(error: BillingError) -> Self {
        match error {
            BillingError::Port(inner) => inner,
            other => PortError::validation(other.to_string()),
        }
    }
}

/// The port trait for billing operations
#[async_trait]
pub trait BillingPort: DomainPort + HealthCheckable {
    // ========================================================================
    // Chart of accounts
    // ========================================================================

    /// Inserts an account; a duplicate code within the branch is a `Conflict`
    async fn insert_account(&self, account: Account) -> Result<Account, PortError>;

    async fn get_account(&self, id: AccountId) -> Result<Account, PortError>;

    async fn list_accounts(
        &self,
        query: &AccountQuery,
        page: PageRequest,
    ) -> Result<Page<Account>, PortError>;

    /// All accounts of a branch, unpaged
    async fn branch_accounts(&self, branch_id: BranchId) -> Result<Vec<Account>, PortError>;

    // ========================================================================
    // Ledger
    // ========================================================================

    /// Numbers and stores a posting and applies its balance effect
    async fn post_transaction(&self, posting: Posting) -> Result<Transaction, PortError>;

    async fn get_transaction(&self, id: TransactionId) -> Result<Transaction, PortError>;

    async fn list_transactions(
        &self,
        query: &TransactionQuery,
        page: PageRequest,
    ) -> Result<Page<Transaction>, PortError>;

    /// Every posting against an account, oldest first
    async fn account_transactions(&self, account_id: AccountId) -> Result<Vec<Transaction>, PortError>;

    /// Σ DEBIT / Σ CREDIT per account of a branch
    async fn posting_totals(&self, branch_id: BranchId) -> Result<Vec<PostingTotals>, PortError>;

    // ========================================================================
    // Invoices and bills
    // ========================================================================

    /// Assigns the next number of the document's series and stores it with its items
    async fn create_document(&self, document: BillingDocument) -> Result<BillingDocument, PortError>;

    /// Fetches a document; a document of the other kind is `NotFound`
    async fn get_document(&self, kind: DocumentKind, id: DocumentId) -> Result<BillingDocument, PortError>;

    async fn list_documents(
        &self,
        query: &DocumentQuery,
        page: PageRequest,
    ) -> Result<Page<BillingDocument>, PortError>;

    /// Applies an issue or cancel under a document lock
    async fn transition_document(
        &self,
        kind: DocumentKind,
        id: DocumentId,
        action: DocumentAction,
    ) -> Result<BillingDocument, PortError>;

    /// Records a payment against `payment.document_id`
    ///
    /// Under the document lock: re-checks the remaining balance, inserts the
    /// payment, updates amount paid and status, and posts `cash_posting` if
    /// given. Nothing is written when any step fails. A payment that no
    /// longer fits fails with `BillingError::PaymentExceedsBalance`.
    async fn record_payment(
        &self,
        kind: DocumentKind,
        payment: Payment,
        cash_posting: Option<Posting>,
        currency: Currency,
    ) -> Result<RecordedPayment, BillingError>;

    /// Payments of a document, oldest first
    async fn list_payments(&self, document_id: DocumentId) -> Result<Vec<Payment>, PortError>;
}

/// In-memory implementation for tests and the `memory` storage mode
#[cfg(any(test, feature = "memory"))]
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use core_kernel::HealthCheckResult;

    use crate::ledger::Ledger;

    #[derive(Debug, Default)]
    struct BillingState {
        ledger: Ledger,
        documents: HashMap<DocumentId, BillingDocument>,
        payments: Vec<Payment>,
        last_invoice: i64,
        last_bill: i64,
    }

    /// In-memory billing store
    #[derive(Debug, Default, Clone)]
    pub struct MemoryBillingPort {
        state: Arc<RwLock<BillingState>>,
    }

    impl MemoryBillingPort {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl DomainPort for MemoryBillingPort {}

    #[async_trait]
    impl HealthCheckable for MemoryBillingPort {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("memory-billing")
        }
    }

    fn find_document(
        state: &BillingState,
        kind: DocumentKind,
        id: DocumentId,
    ) -> Result<BillingDocument, PortError> {
        state
            .documents
            .get(&id)
            .filter(|d| d.kind == kind)
            .cloned()
            .ok_or_else(|| PortError::not_found(kind.label(), id))
    }

    #[async_trait]
    impl BillingPort for MemoryBillingPort {
        async fn insert_account(&self, account: Account) -> Result<Account, PortError> {
            self.state.write().await.ledger.add_account(account)
        }

        async fn get_account(&self, id: AccountId) -> Result<Account, PortError> {
            self.state
                .read()
                .await
                .ledger
                .get_account(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Account", id))
        }

        async fn list_accounts(
            &self,
            query: &AccountQuery,
            page: PageRequest,
        ) -> Result<Page<Account>, PortError> {
            let state = self.state.read().await;
            let mut accounts: Vec<Account> = state
                .ledger
                .accounts()
                .filter(|a| query.matches(a))
                .cloned()
                .collect();
            accounts.sort_by(|a, b| a.code.cmp(&b.code));
            Ok(page.slice(&accounts))
        }

        async fn branch_accounts(&self, branch_id: BranchId) -> Result<Vec<Account>, PortError> {
            let state = self.state.read().await;
            let mut accounts: Vec<Account> = state
                .ledger
                .accounts()
                .filter(|a| a.branch_id == branch_id)
                .cloned()
                .collect();
            accounts.sort_by(|a, b| a.code.cmp(&b.code));
            Ok(accounts)
        }

        async fn post_transaction(&self, posting: Posting) -> Result<Transaction, PortError> {
            self.state.write().await.ledger.post(posting)
        }

        async fn get_transaction(&self, id: TransactionId) -> Result<Transaction, PortError> {
            self.state
                .read()
                .await
                .ledger
                .transactions()
                .iter()
                .find(|t| t.id == id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Transaction", id))
        }

        async fn list_transactions(
            &self,
            query: &TransactionQuery,
            page: PageRequest,
        ) -> Result<Page<Transaction>, PortError> {
            let state = self.state.read().await;
            let mut transactions: Vec<Transaction> = state
                .ledger
                .transactions()
                .iter()
                .filter(|t| query.matches(t))
                .cloned()
                .collect();
            transactions.reverse();
            Ok(page.slice(&transactions))
        }

        async fn account_transactions(&self, account_id: AccountId) -> Result<Vec<Transaction>, PortError> {
            let state = self.state.read().await;
            Ok(state
                .ledger
                .transactions()
                .iter()
                .filter(|t| t.account_id == account_id)
                .cloned()
                .collect())
        }

        async fn posting_totals(&self, branch_id: BranchId) -> Result<Vec<PostingTotals>, PortError> {
            Ok(self.state.read().await.ledger.posting_totals(branch_id))
        }

        async fn create_document(&self, mut document: BillingDocument) -> Result<BillingDocument, PortError> {
            let mut state = self.state.write().await;
            let next = match document.kind {
                DocumentKind::Invoice => {
                    state.last_invoice += 1;
                    state.last_invoice
                }
                DocumentKind::Bill => {
                    state.last_bill += 1;
                    state.last_bill
                }
            };
            document.number = document.kind.series().format(next);
            state.documents.insert(document.id, document.clone());
            Ok(document)
        }

        async fn get_document(&self, kind: DocumentKind, id: DocumentId) -> Result<BillingDocument, PortError> {
            find_document(&*self.state.read().await, kind, id)
        }

        async fn list_documents(
            &self,
            query: &DocumentQuery,
            page: PageRequest,
        ) -> Result<Page<BillingDocument>, PortError> {
            let state = self.state.read().await;
            let mut documents: Vec<BillingDocument> = state
                .documents
                .values()
                .filter(|d| query.matches(d))
                .cloned()
                .collect();
            documents.sort_by(|a, b| b.number.cmp(&a.number));
            Ok(page.slice(&documents))
        }

        async fn transition_document(
            &self,
            kind: DocumentKind,
            id: DocumentId,
            action: DocumentAction,
        ) -> Result<BillingDocument, PortError> {
            let mut state = self.state.write().await;
            let mut document = find_document(&state, kind, id)?;
            action.apply(&mut document)?;
            state.documents.insert(id, document.clone());
            Ok(document)
        }

        async fn record_payment(
            &self,
            kind: DocumentKind,
            payment: Payment,
            cash_posting: Option<Posting>,
            currency: Currency,
        ) -> Result<RecordedPayment, BillingError> {
            let mut state = self.state.write().await;
            let mut document = find_document(&state, kind, payment.document_id)?;
            document.apply_payment(payment.amount, currency)?;

            let transaction = match cash_posting {
                Some(posting) => Some(state.ledger.post(posting)?),
                None => None,
            };
            state.documents.insert(document.id, document.clone());
            state.payments.push(payment.clone());

            Ok(RecordedPayment {
                payment,
                document,
                transaction,
            })
        }

        async fn list_payments(&self, document_id: DocumentId) -> Result<Vec<Payment>, PortError> {
            let state = self.state.read().await;
            Ok(state
                .payments
                .iter()
                .filter(|p| p.document_id == document_id)
                .cloned()
                .collect())
        }
    }
}
