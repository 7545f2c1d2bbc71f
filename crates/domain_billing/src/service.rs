//! Billing service
//!
//! Orchestrates the chart of accounts, manual postings, invoices, bills and
//! payments on top of `BillingPort`, resolving branches and counterparties
//! through the directory.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use validator::Validate;

use core_kernel::{
    AccountId, Actor, BranchId, CoreError, Currency, DocumentId, Page, PageRequest, PortError,
    Role, TransactionId,
};
use domain_directory::DirectoryPort;

use crate::account::{find_cash_account, Account, CoworkingChartOfAccounts, NewAccount};
use crate::document::{BillingDocument, Counterparty, DocumentAction, DocumentDraft, DocumentKind};
use crate::error::BillingError;
use crate::ledger::{Reconciliation, TrialBalance};
use crate::payment::{Payment, RecordPayment};
use crate::ports::{AccountQuery, BillingPort, DocumentQuery, RecordedPayment, TransactionQuery};
use crate::transaction::{Posting, PostTransaction, Transaction};

/// Category recorded on postings made for received invoice payments
pub const INVOICE_PAYMENT_CATEGORY: &str = "Invoice Payment";

/// Settings that shape billing behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingSettings {
    /// Currency used in user-facing amounts
    pub currency: Currency,
    /// Reject invoice payments when the branch has no cash account
    /// instead of skipping the ledger posting
    pub require_cash_account: bool,
}

impl Default for BillingSettings {
    fn default() -> Self {
        Self {
            currency: Currency::USD,
            require_cash_account: true,
        }
    }
}

/// Minimum role for working with documents of a kind
fn required_role(kind: DocumentKind) -> Role {
    match kind {
        DocumentKind::Invoice => Role::Staff,
        DocumentKind::Bill => Role::Manager,
    }
}

/// Application service for the ledger and billing documents
#[derive(Clone)]
pub struct BillingService {
    port: Arc<dyn BillingPort>,
    directory: Arc<dyn DirectoryPort>,
    settings: BillingSettings,
}

impl BillingService {
    pub fn new(
        port: Arc<dyn BillingPort>,
        directory: Arc<dyn DirectoryPort>,
        settings: BillingSettings,
    ) -> Self {
        Self {
            port,
            directory,
            settings,
        }
    }

    pub fn settings(&self) -> BillingSettings {
        self.settings
    }

    // ========================================================================
    // Chart of accounts
    // ========================================================================

    #[instrument(skip(self, actor, input), fields(branch_id = %input.branch_id, code = %input.code))]
    pub async fn create_account(&self, actor: &Actor, input: NewAccount) -> Result<Account, BillingError> {
        actor.require(Role::Manager)?;
        input.validate().map_err(CoreError::from)?;
        actor.ensure_branch(input.branch_id)?;
        self.directory.get_branch(input.branch_id).await?;

        if let Some(parent_id) = input.parent_id {
            let parent = self.port.get_account(parent_id).await?;
            if parent.branch_id != input.branch_id {
                return Err(BillingError::invalid("Parent account belongs to another branch"));
            }
        }

        let account = self.port.insert_account(input.into_account()).await?;
        info!(account_id = %account.id, code = %account.code, "Account created");
        Ok(account)
    }

    pub async fn get_account(&self, actor: &Actor, id: AccountId) -> Result<Account, BillingError> {
        actor.require(Role::Manager)?;
        let account = self.port.get_account(id).await?;
        actor.ensure_branch(account.branch_id)?;
        Ok(account)
    }

    pub async fn list_accounts(
        &self,
        actor: &Actor,
        mut query: AccountQuery,
        page: PageRequest,
    ) -> Result<Page<Account>, BillingError> {
        actor.require(Role::Manager)?;
        query.branch_id = actor.scope_branch(query.branch_id);
        Ok(self.port.list_accounts(&query, page).await?)
    }

    /// Creates the standard coworking chart for a branch
    ///
    /// Codes the branch already uses are left untouched, so seeding twice is harmless.
    #[instrument(skip(self, actor), fields(branch_id = %branch_id))]
    pub async fn seed_chart_of_accounts(
        &self,
        actor: &Actor,
        branch_id: BranchId,
    ) -> Result<Vec<Account>, BillingError> {
        actor.require(Role::Manager)?;
        actor.ensure_branch(branch_id)?;
        self.directory.get_branch(branch_id).await?;

        let mut created = Vec::new();
        for account in CoworkingChartOfAccounts::create_standard_accounts(branch_id) {
            match self.port.insert_account(account).await {
                Ok(account) => created.push(account),
                Err(PortError::Conflict { .. }) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        info!(branch_id = %branch_id, created = created.len(), "Chart of accounts seeded");
        Ok(created)
    }

    /// Debit and credit totals per account of a branch
    pub async fn trial_balance(
        &self,
        actor: &Actor,
        branch_id: Option<BranchId>,
    ) -> Result<TrialBalance, BillingError> {
        actor.require(Role::Manager)?;
        let branch_id = actor
            .scope_branch(branch_id)
            .ok_or_else(|| BillingError::invalid("branchId is required"))?;

        let accounts = self.port.branch_accounts(branch_id).await?;
        let totals = self.port.posting_totals(branch_id).await?;
        let report = TrialBalance::build(branch_id, &accounts, &totals);
        if !report.is_balanced {
            info!(
                branch_id = %branch_id,
                debits = %report.total_debits,
                credits = %report.total_credits,
                "Trial balance does not balance"
            );
        }
        Ok(report)
    }

    /// Compares an account's stored balance with the fold of its postings
    pub async fn reconcile_account(
        &self,
        actor: &Actor,
        id: AccountId,
    ) -> Result<Reconciliation, BillingError> {
        let account = self.get_account(actor, id).await?;
        let transactions = self.port.account_transactions(id).await?;
        let result = Reconciliation::check(&account, &transactions);
        if !result.is_consistent {
            warn!(account_id = %id, drift = %result.drift, "Account balance drifted from its postings");
        }
        Ok(result)
    }

    // ========================================================================
    // Ledger
    // ========================================================================

    /// Posts a manual DEBIT or CREDIT against one account
    #[instrument(skip(self, actor, input), fields(account_id = %input.account_id, entry_type = %input.entry_type))]
    pub async fn post_transaction(
        &self,
        actor: &Actor,
        input: PostTransaction,
    ) -> Result<Transaction, BillingError> {
        actor.require(Role::Manager)?;
        input.validate().map_err(CoreError::from)?;
        if input.amount <= Decimal::ZERO {
            return Err(BillingError::invalid("Amount must be greater than zero"));
        }
        actor.ensure_branch(input.branch_id)?;

        let account = self.port.get_account(input.account_id).await?;
        if account.branch_id != input.branch_id {
            return Err(BillingError::AccountBranchMismatch {
                account: account.code,
                branch: input.branch_id.to_string(),
            });
        }
        if !account.is_active {
            return Err(BillingError::invalid(format!("Account {} is inactive", account.code)));
        }

        let mut posting = Posting {
            account_id: input.account_id,
            branch_id: input.branch_id,
            entry_type: input.entry_type,
            amount: input.amount,
            category: input.category.trim().to_string(),
            description: input.description.trim().to_string(),
            reference: input.reference,
            transaction_date: chrono::Utc::now().date_naive(),
            created_by: actor.user_id,
        };
        if let Some(date) = input.transaction_date {
            posting = posting.dated(date);
        }

        let transaction = self.port.post_transaction(posting).await?;
        info!(
            transaction_id = %transaction.id,
            number = %transaction.number,
            amount = %transaction.amount,
            "Transaction posted"
        );
        Ok(transaction)
    }

    pub async fn get_transaction(&self, actor: &Actor, id: TransactionId) -> Result<Transaction, BillingError> {
        actor.require(Role::Manager)?;
        let transaction = self.port.get_transaction(id).await?;
        actor.ensure_branch(transaction.branch_id)?;
        Ok(transaction)
    }

    pub async fn list_transactions(
        &self,
        actor: &Actor,
        mut query: TransactionQuery,
        page: PageRequest,
    ) -> Result<Page<Transaction>, BillingError> {
        actor.require(Role::Manager)?;
        query.branch_id = actor.scope_branch(query.branch_id);
        Ok(self.port.list_transactions(&query, page).await?)
    }

    // ========================================================================
    // Invoices and bills
    // ========================================================================

    /// Composes and stores a DRAFT invoice or bill
    ///
    /// The document kind follows the counterparty: customers get invoices,
    /// vendors get bills.
    #[instrument(skip(self, actor, draft), fields(branch_id = %draft.branch_id))]
    pub async fn create_document(
        &self,
        actor: &Actor,
        draft: DocumentDraft,
    ) -> Result<BillingDocument, BillingError> {
        let kind = draft.counterparty.kind();
        actor.require(required_role(kind))?;
        draft.validate().map_err(CoreError::from)?;
        actor.ensure_branch(draft.branch_id)?;

        self.directory.get_branch(draft.branch_id).await?;
        match draft.counterparty {
            Counterparty::Customer(id) => {
                self.directory.get_customer(id).await?;
            }
            Counterparty::Vendor(id) => {
                self.directory.get_vendor(id).await?;
            }
        }

        let document = BillingDocument::compose(draft, actor.user_id)?;
        let document = self.port.create_document(document).await?;
        info!(
            document_id = %document.id,
            number = %document.number,
            total = %document.total,
            "{} created",
            kind.label()
        );
        Ok(document)
    }

    /// Fetches a document; customers may read their own invoices
    pub async fn get_document(
        &self,
        actor: &Actor,
        kind: DocumentKind,
        id: DocumentId,
    ) -> Result<BillingDocument, BillingError> {
        let document = self.port.get_document(kind, id).await?;
        self.authorize_read(actor, &document)?;
        Ok(document)
    }

    pub async fn list_documents(
        &self,
        actor: &Actor,
        mut query: DocumentQuery,
        page: PageRequest,
    ) -> Result<Page<BillingDocument>, BillingError> {
        if actor.role == Role::Customer && query.kind == DocumentKind::Invoice {
            let customer_id = actor
                .customer_id
                .ok_or_else(|| BillingError::Forbidden("No customer account linked".to_string()))?;
            query.counterparty = Some(Counterparty::Customer(customer_id));
        } else {
            actor.require(required_role(query.kind))?;
        }
        query.branch_id = actor.scope_branch(query.branch_id);
        Ok(self.port.list_documents(&query, page).await?)
    }

    #[instrument(skip(self, actor), fields(kind = %kind, document_id = %id))]
    pub async fn issue_document(
        &self,
        actor: &Actor,
        kind: DocumentKind,
        id: DocumentId,
    ) -> Result<BillingDocument, BillingError> {
        self.transition(actor, kind, id, DocumentAction::Issue).await
    }

    #[instrument(skip(self, actor), fields(kind = %kind, document_id = %id))]
    pub async fn cancel_document(
        &self,
        actor: &Actor,
        kind: DocumentKind,
        id: DocumentId,
    ) -> Result<BillingDocument, BillingError> {
        self.transition(actor, kind, id, DocumentAction::Cancel).await
    }

    async fn transition(
        &self,
        actor: &Actor,
        kind: DocumentKind,
        id: DocumentId,
        action: DocumentAction,
    ) -> Result<BillingDocument, BillingError> {
        actor.require(required_role(kind))?;
        let current = self.port.get_document(kind, id).await?;
        actor.ensure_branch(current.branch_id)?;

        let mut preview = current.clone();
        if let Err(e) = action.apply(&mut preview) {
            warn!(document_id = %id, error = %e, "Document transition rejected");
            return Err(e);
        }

        let document = self.port.transition_document(kind, id, action).await?;
        info!(document_id = %id, number = %document.number, status = %document.status, "Document status changed");
        Ok(document)
    }

    /// Records a payment against an invoice or bill
    ///
    /// Invoice payments are also posted as a DEBIT to the branch cash
    /// account in the same atomic store call.
    ///
    /// # Errors
    ///
    /// - `PaymentExceedsBalance` if the amount is more than what is still owed
    /// - `MissingCashAccount` for invoices when the branch has no cash account
    ///   and `require_cash_account` is set
    #[instrument(skip(self, actor, input), fields(kind = %kind, document_id = %id, amount = %input.amount))]
    pub async fn record_payment(
        &self,
        actor: &Actor,
        kind: DocumentKind,
        id: DocumentId,
        input: RecordPayment,
    ) -> Result<RecordedPayment, BillingError> {
        actor.require(required_role(kind))?;
        input.validate().map_err(CoreError::from)?;

        let document = self.port.get_document(kind, id).await?;
        actor.ensure_branch(document.branch_id)?;

        if let Err(e) = document.check_payment(input.amount, self.settings.currency) {
            warn!(document_id = %id, number = %document.number, error = %e, "Payment rejected");
            return Err(e);
        }

        let payment = Payment::new(id, input, actor.user_id);
        let cash_posting = match kind {
            DocumentKind::Invoice => self.cash_posting(&document, &payment).await?,
            DocumentKind::Bill => None,
        };

        let recorded = self
            .port
            .record_payment(kind, payment, cash_posting, self.settings.currency)
            .await?;
        info!(
            payment_id = %recorded.payment.id,
            number = %recorded.document.number,
            status = %recorded.document.status,
            posted = recorded.transaction.is_some(),
            "Payment recorded"
        );
        Ok(recorded)
    }

    /// Builds the cash DEBIT for an invoice payment
    async fn cash_posting(
        &self,
        document: &BillingDocument,
        payment: &Payment,
    ) -> Result<Option<Posting>, BillingError> {
        let accounts = self.port.branch_accounts(document.branch_id).await?;
        match find_cash_account(&accounts) {
            Some(cash) => Ok(Some(
                Posting::debit(cash.id, document.branch_id, payment.amount, payment.recorded_by)
                    .with_category(INVOICE_PAYMENT_CATEGORY)
                    .with_description(format!("Payment received for {}", document.number))
                    .with_reference(document.number.clone())
                    .dated(payment.paid_at.date_naive()),
            )),
            None if self.settings.require_cash_account => {
                error!(branch_id = %document.branch_id, "No cash account configured, payment refused");
                Err(BillingError::MissingCashAccount {
                    branch: document.branch_id.to_string(),
                })
            }
            None => {
                warn!(
                    branch_id = %document.branch_id,
                    number = %document.number,
                    "No cash account configured, ledger posting skipped"
                );
                Ok(None)
            }
        }
    }

    pub async fn list_payments(
        &self,
        actor: &Actor,
        kind: DocumentKind,
        id: DocumentId,
    ) -> Result<Vec<Payment>, BillingError> {
        let document = self.get_document(actor, kind, id).await?;
        Ok(self.port.list_payments(document.id).await?)
    }

    fn authorize_read(&self, actor: &Actor, document: &BillingDocument) -> Result<(), BillingError> {
        if actor.role == Role::Customer {
            let own = matches!(
                (document.counterparty, actor.customer_id),
                (Counterparty::Customer(owner), Some(me)) if owner == me
            );
            if !own {
                return Err(BillingError::Forbidden(
                    "Customers may only view their own invoices".to_string(),
                ));
            }
            return Ok(());
        }
        actor.require(required_role(document.kind))?;
        actor.ensure_branch(document.branch_id)?;
        Ok(())
    }
}
