//! Account types for the chart of accounts
//!
//! Each branch keeps its own chart. Accounts carry a running signed balance
//! that postings adjust (see `ledger`).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use core_kernel::{AccountId, BranchId, CoreError};

/// Category label that marks an asset account as current
pub const CURRENT_ASSET: &str = "Current Asset";

/// Types of accounts in the chart of accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    /// Asset accounts (debit normal balance)
    Asset,
    /// Liability accounts (credit normal balance)
    Liability,
    /// Equity accounts (credit normal balance)
    Equity,
    /// Revenue accounts (credit normal balance)
    Revenue,
    /// Expense accounts (debit normal balance)
    Expense,
}

impl AccountType {
    /// Returns true if this account type has a debit normal balance
    pub fn is_debit_normal(&self) -> bool {
        matches!(self, AccountType::Asset | AccountType::Expense)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Asset => "ASSET",
            AccountType::Liability => "LIABILITY",
            AccountType::Equity => "EQUITY",
            AccountType::Revenue => "REVENUE",
            AccountType::Expense => "EXPENSE",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ASSET" => Ok(AccountType::Asset),
            "LIABILITY" => Ok(AccountType::Liability),
            "EQUITY" => Ok(AccountType::Equity),
            "REVENUE" => Ok(AccountType::Revenue),
            "EXPENSE" => Ok(AccountType::Expense),
            other => Err(CoreError::validation(format!("Unknown account type: {}", other))),
        }
    }
}

/// An account in the chart of accounts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Unique identifier
    pub id: AccountId,
    /// Owning branch
    pub branch_id: BranchId,
    /// Account code (e.g., "1000"), unique within the branch
    pub code: String,
    /// Account name
    pub name: String,
    /// Account type
    #[serde(rename = "type")]
    pub account_type: AccountType,
    /// Free-text reporting category (e.g., "Current Asset")
    pub category: String,
    /// Running balance: debits add, credits subtract
    pub balance: Decimal,
    /// Parent account ID (for hierarchical charts)
    pub parent_id: Option<AccountId>,
    /// Description
    pub description: Option<String>,
    /// Whether account is active
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Creates a new account with a zero opening balance
    ///
    /// # Arguments
    ///
    /// * `branch_id` - Owning branch
    /// * `code` - Account code
    /// * `name` - Account name
    /// * `account_type` - Type of account
    pub fn new(
        branch_id: BranchId,
        code: impl Into<String>,
        name: impl Into<String>,
        account_type: AccountType,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: AccountId::new_v7(),
            branch_id,
            code: code.into(),
            name: name.into(),
            account_type,
            category: String::new(),
            balance: Decimal::ZERO,
            parent_id: None,
            description: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the account category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Sets the parent account
    pub fn with_parent(mut self, parent_id: AccountId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Sets the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Whether payments received should be posted to this account
    ///
    /// Matches an active ASSET account in the "Current Asset" category whose
    /// name mentions cash, ignoring case.
    pub fn is_cash_account(&self) -> bool {
        self.is_active
            && self.account_type == AccountType::Asset
            && self.category.trim().eq_ignore_ascii_case(CURRENT_ASSET)
            && self.name.to_lowercase().contains("cash")
    }
}

/// Picks the branch cash account, preferring the lowest account code
pub fn find_cash_account<'a>(accounts: impl IntoIterator<Item = &'a Account>) -> Option<&'a Account> {
    accounts
        .into_iter()
        .filter(|a| a.is_cash_account())
        .min_by(|a, b| a.code.cmp(&b.code))
}

/// Input for creating an account
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub branch_id: BranchId,
    #[validate(length(min = 1, max = 20, message = "must be 1-20 characters"))]
    pub code: String,
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    #[validate(length(max = 100, message = "must be at most 100 characters"))]
    #[serde(default)]
    pub category: String,
    pub parent_id: Option<AccountId>,
    pub description: Option<String>,
}

impl NewAccount {
    pub fn into_account(self) -> Account {
        let mut account = Account::new(
            self.branch_id,
            self.code.trim(),
            self.name.trim(),
            self.account_type,
        )
        .with_category(self.category.trim());
        account.parent_id = self.parent_id;
        account.description = self.description;
        account
    }
}

/// Standard chart of accounts for a coworking branch
pub struct CoworkingChartOfAccounts;

impl CoworkingChartOfAccounts {
    /// Creates the standard accounts for a branch
    pub fn create_standard_accounts(branch_id: BranchId) -> Vec<Account> {
        let account = |code: &str, name: &str, account_type: AccountType, category: &str| {
            Account::new(branch_id, code, name, account_type).with_category(category)
        };

        vec![
            // Assets
            account("1000", "Cash on Hand", AccountType::Asset, CURRENT_ASSET),
            account("1010", "Bank Account", AccountType::Asset, CURRENT_ASSET),
            account("1100", "Accounts Receivable", AccountType::Asset, CURRENT_ASSET),
            account("1200", "Security Deposits Held", AccountType::Asset, CURRENT_ASSET),
            account("1500", "Furniture and Fixtures", AccountType::Asset, "Fixed Asset"),
            account("1510", "Office Equipment", AccountType::Asset, "Fixed Asset"),

            // Liabilities
            account("2000", "Accounts Payable", AccountType::Liability, "Current Liability"),
            account("2100", "Customer Deposits", AccountType::Liability, "Current Liability"),
            account("2200", "Sales Tax Payable", AccountType::Liability, "Current Liability"),
            account("2300", "Salaries Payable", AccountType::Liability, "Current Liability"),

            // Equity
            account("3000", "Owner's Equity", AccountType::Equity, "Equity"),
            account("3100", "Retained Earnings", AccountType::Equity, "Equity"),

            // Revenue
            account("4000", "Membership Revenue", AccountType::Revenue, "Operating Revenue"),
            account("4100", "Meeting Room Revenue", AccountType::Revenue, "Operating Revenue"),
            account("4200", "Virtual Office Revenue", AccountType::Revenue, "Operating Revenue"),
            account("4900", "Other Income", AccountType::Revenue, "Other Revenue"),

            // Expenses
            account("5000", "Rent Expense", AccountType::Expense, "Operating Expense"),
            account("5100", "Salaries and Wages", AccountType::Expense, "Operating Expense"),
            account("5200", "Utilities", AccountType::Expense, "Operating Expense"),
            account("5300", "Cleaning and Maintenance", AccountType::Expense, "Operating Expense"),
            account("5400", "Office Supplies", AccountType::Expense, "Operating Expense"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_chart_has_one_cash_account() {
        let accounts = CoworkingChartOfAccounts::create_standard_accounts(BranchId::new());
        let cash = find_cash_account(&accounts).unwrap();
        assert_eq!(cash.name, "Cash on Hand");
        assert_eq!(accounts.iter().filter(|a| a.is_cash_account()).count(), 1);
    }

    #[test]
    fn test_cash_heuristic_is_case_insensitive() {
        let account = Account::new(BranchId::new(), "1001", "PETTY CASH", AccountType::Asset)
            .with_category("current asset");
        assert!(account.is_cash_account());

        let wrong_category = Account::new(BranchId::new(), "1002", "Cash", AccountType::Asset)
            .with_category("Fixed Asset");
        assert!(!wrong_category.is_cash_account());

        let wrong_type = Account::new(BranchId::new(), "2001", "Cash Advances", AccountType::Liability)
            .with_category(CURRENT_ASSET);
        assert!(!wrong_type.is_cash_account());
    }

    #[test]
    fn test_lowest_code_wins() {
        let branch = BranchId::new();
        let accounts = vec![
            Account::new(branch, "1020", "Cash Drawer", AccountType::Asset).with_category(CURRENT_ASSET),
            Account::new(branch, "1005", "Cash Safe", AccountType::Asset).with_category(CURRENT_ASSET),
        ];
        assert_eq!(find_cash_account(&accounts).unwrap().code, "1005");
    }

    #[test]
    fn test_account_type_json() {
        let json = serde_json::to_string(&AccountType::Revenue).unwrap();
        assert_eq!(json, "\"REVENUE\"");
        assert_eq!("EXPENSE".parse::<AccountType>().unwrap(), AccountType::Expense);
    }
}
