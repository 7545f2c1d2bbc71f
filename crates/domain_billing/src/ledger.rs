//! Ledger bookkeeping
//!
//! Every posting touches exactly one account: a DEBIT adds its amount to the
//! account balance and a CREDIT subtracts it, whatever the account type.
//! Nothing forces debits and credits to pair up, so the trial balance reports
//! whether a branch's books happen to balance instead of guaranteeing it.
//!
//! # Invariants
//!
//! - Balances start at zero and change only through postings
//! - A posting's effect is applied once, together with its insert
//! - Replaying an account's postings reproduces its stored balance

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use core_kernel::{AccountId, BranchId, PortError};

use crate::account::{Account, AccountType};
use crate::numbering::NumberSeries;
use crate::transaction::{EntryType, Posting, Transaction};

/// In-process book of accounts and postings
///
/// Backs the in-memory billing store; the PostgreSQL adapter keeps the same
/// rules in SQL.
#[derive(Debug, Default)]
pub struct Ledger {
    /// Chart of accounts
    accounts: HashMap<AccountId, Account>,
    /// Postings in insertion order
    transactions: Vec<Transaction>,
    /// Last issued transaction number
    last_number: i64,
}

impl Ledger {
    /// Creates an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an account to the chart of accounts
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the branch already has an account with the code
    pub fn add_account(&mut self, account: Account) -> Result<Account, PortError> {
        let duplicate = self
            .accounts
            .values()
            .any(|a| a.branch_id == account.branch_id && a.code == account.code);
        if duplicate {
            return Err(PortError::conflict(format!(
                "Account code {} already exists for this branch",
                account.code
            )));
        }
        self.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    /// Gets an account by ID
    pub fn get_account(&self, id: &AccountId) -> Option<&Account> {
        self.accounts.get(id)
    }

    /// Gets the current balance of an account
    pub fn get_balance(&self, id: &AccountId) -> Option<Decimal> {
        self.accounts.get(id).map(|a| a.balance)
    }

    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Numbers and records a posting, adjusting the account balance
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account does not exist
    pub fn post(&mut self, posting: Posting) -> Result<Transaction, PortError> {
        let account = self
            .accounts
            .get_mut(&posting.account_id)
            .ok_or_else(|| PortError::not_found("Account", posting.account_id))?;

        account.balance += posting.delta();
        account.updated_at = chrono::Utc::now();

        self.last_number += 1;
        let transaction = posting.into_transaction(NumberSeries::Transaction.format(self.last_number));
        self.transactions.push(transaction.clone());
        Ok(transaction)
    }

    /// Posting totals per account of a branch
    pub fn posting_totals(&self, branch_id: BranchId) -> Vec<PostingTotals> {
        let mut totals: HashMap<AccountId, PostingTotals> = HashMap::new();
        for txn in self.transactions.iter().filter(|t| t.branch_id == branch_id) {
            totals
                .entry(txn.account_id)
                .or_insert_with(|| PostingTotals::empty(txn.account_id))
                .add(txn.entry_type, txn.amount);
        }
        totals.into_values().collect()
    }
}

/// Σ DEBIT and Σ CREDIT posted to one account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostingTotals {
    pub account_id: AccountId,
    pub debits: Decimal,
    pub credits: Decimal,
}

impl PostingTotals {
    pub fn empty(account_id: AccountId) -> Self {
        Self {
            account_id,
            debits: Decimal::ZERO,
            credits: Decimal::ZERO,
        }
    }

    pub fn add(&mut self, entry_type: EntryType, amount: Decimal) {
        match entry_type {
            EntryType::Debit => self.debits += amount,
            EntryType::Credit => self.credits += amount,
        }
    }
}

/// Folds postings into the balance they produce from a zero opening balance
pub fn replay<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Decimal {
    transactions.into_iter().map(Transaction::delta).sum()
}

/// Result of checking an account's stored balance against its postings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    pub account_id: AccountId,
    pub stored_balance: Decimal,
    pub computed_balance: Decimal,
    /// stored − computed
    pub drift: Decimal,
    pub posting_count: usize,
    pub is_consistent: bool,
}

impl Reconciliation {
    pub fn check(account: &Account, transactions: &[Transaction]) -> Self {
        let computed_balance = replay(transactions.iter().filter(|t| t.account_id == account.id));
        let drift = account.balance - computed_balance;
        Self {
            account_id: account.id,
            stored_balance: account.balance,
            computed_balance,
            drift,
            posting_count: transactions.iter().filter(|t| t.account_id == account.id).count(),
            is_consistent: drift.is_zero(),
        }
    }
}

/// Trial balance report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialBalance {
    pub branch_id: BranchId,
    /// Individual account entries, by account code
    pub entries: Vec<TrialBalanceEntry>,
    /// Σ DEBIT postings
    pub total_debits: Decimal,
    /// Σ CREDIT postings
    pub total_credits: Decimal,
    /// Whether debits and credits match
    pub is_balanced: bool,
}

/// A single entry in the trial balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialBalanceEntry {
    pub account_id: AccountId,
    pub code: String,
    pub account_name: String,
    pub account_type: AccountType,
    pub debits: Decimal,
    pub credits: Decimal,
    pub balance: Decimal,
}

impl TrialBalance {
    /// Generates a trial balance report from a branch's accounts and posting totals
    ///
    /// Accounts with neither postings nor a balance are left out.
    pub fn build(branch_id: BranchId, accounts: &[Account], totals: &[PostingTotals]) -> Self {
        let by_account: HashMap<AccountId, &PostingTotals> =
            totals.iter().map(|t| (t.account_id, t)).collect();

        let mut entries: Vec<TrialBalanceEntry> = accounts
            .iter()
            .filter(|a| a.branch_id == branch_id)
            .filter_map(|account| {
                let posted = by_account
                    .get(&account.id)
                    .copied()
                    .copied()
                    .unwrap_or_else(|| PostingTotals::empty(account.id));
                if posted.debits.is_zero() && posted.credits.is_zero() && account.balance.is_zero() {
                    return None;
                }
                Some(TrialBalanceEntry {
                    account_id: account.id,
                    code: account.code.clone(),
                    account_name: account.name.clone(),
                    account_type: account.account_type,
                    debits: posted.debits,
                    credits: posted.credits,
                    balance: account.balance,
                })
            })
            .collect();
        entries.sort_by(|a, b| a.code.cmp(&b.code));

        let total_debits: Decimal = entries.iter().map(|e| e.debits).sum();
        let total_credits: Decimal = entries.iter().map(|e| e.credits).sum();

        Self {
            branch_id,
            entries,
            total_debits,
            total_credits,
            is_balanced: total_debits == total_credits,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::CoworkingChartOfAccounts;
    use core_kernel::UserId;
    use rust_decimal_macros::dec;

    fn setup_ledger() -> (Ledger, BranchId) {
        let branch = BranchId::new();
        let mut ledger = Ledger::new();
        for account in CoworkingChartOfAccounts::create_standard_accounts(branch) {
            ledger.add_account(account).unwrap();
        }
        (ledger, branch)
    }

    fn account_by_code(ledger: &Ledger, code: &str) -> AccountId {
        ledger.accounts().find(|a| a.code == code).unwrap().id
    }

    #[test]
    fn test_debit_and_credit_move_balance() {
        let (mut ledger, branch) = setup_ledger();
        let cash = account_by_code(&ledger, "1000");

        ledger.post(Posting::debit(cash, branch, dec!(110), UserId::new())).unwrap();
        assert_eq!(ledger.get_balance(&cash), Some(dec!(110)));

        ledger.post(Posting::credit(cash, branch, dec!(30), UserId::new())).unwrap();
        assert_eq!(ledger.get_balance(&cash), Some(dec!(80)));
    }

    #[test]
    fn test_numbers_are_sequential() {
        let (mut ledger, branch) = setup_ledger();
        let cash = account_by_code(&ledger, "1000");

        let first = ledger.post(Posting::debit(cash, branch, dec!(1), UserId::new())).unwrap();
        let second = ledger.post(Posting::debit(cash, branch, dec!(1), UserId::new())).unwrap();
        assert_eq!(first.number, "TXN-000001");
        assert_eq!(second.number, "TXN-000002");
    }

    #[test]
    fn test_unknown_account() {
        let (mut ledger, branch) = setup_ledger();
        let result = ledger.post(Posting::debit(AccountId::new(), branch, dec!(1), UserId::new()));
        assert!(matches!(result, Err(PortError::NotFound { .. })));
    }

    #[test]
    fn test_duplicate_code_per_branch() {
        let (mut ledger, branch) = setup_ledger();
        let dup = Account::new(branch, "1000", "Another Cash", AccountType::Asset);
        assert!(matches!(ledger.add_account(dup), Err(PortError::Conflict { .. })));

        let other_branch = Account::new(BranchId::new(), "1000", "Cash", AccountType::Asset);
        assert!(ledger.add_account(other_branch).is_ok());
    }

    #[test]
    fn test_single_sided_postings_unbalance_trial_balance() {
        let (mut ledger, branch) = setup_ledger();
        let cash = account_by_code(&ledger, "1000");
        let revenue = account_by_code(&ledger, "4000");

        ledger.post(Posting::debit(cash, branch, dec!(110), UserId::new())).unwrap();
        let accounts: Vec<Account> = ledger.accounts().cloned().collect();
        let report = TrialBalance::build(branch, &accounts, &ledger.posting_totals(branch));
        assert!(!report.is_balanced);
        assert_eq!(report.entries.len(), 1);

        ledger.post(Posting::credit(revenue, branch, dec!(110), UserId::new())).unwrap();
        let accounts: Vec<Account> = ledger.accounts().cloned().collect();
        let report = TrialBalance::build(branch, &accounts, &ledger.posting_totals(branch));
        assert!(report.is_balanced);
        assert_eq!(report.total_debits, dec!(110));
        assert_eq!(report.entries[0].code, "1000");
        assert_eq!(report.entries[1].balance, dec!(-110));
    }

    #[test]
    fn test_reconciliation_detects_drift() {
        let (mut ledger, branch) = setup_ledger();
        let cash = account_by_code(&ledger, "1000");
        ledger.post(Posting::debit(cash, branch, dec!(50), UserId::new())).unwrap();

        let mut account = ledger.get_account(&cash).unwrap().clone();
        let ok = Reconciliation::check(&account, ledger.transactions());
        assert!(ok.is_consistent);
        assert_eq!(ok.posting_count, 1);

        account.balance += dec!(5);
        let drifted = Reconciliation::check(&account, ledger.transactions());
        assert!(!drifted.is_consistent);
        assert_eq!(drifted.drift, dec!(5));
    }
}
