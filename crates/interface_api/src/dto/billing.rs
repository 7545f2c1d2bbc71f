//! Ledger and billing DTOs

use chrono::NaiveDate;
use serde::Deserialize;

use core_kernel::{AccountId, BranchId, CustomerId, VendorId};
use domain_billing::{
    AccountQuery, AccountType, Counterparty, DocumentKind, DocumentQuery, DocumentStatus,
    EntryType, TransactionQuery,
};

use super::date_range;
use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountFilter {
    pub branch_id: Option<BranchId>,
    #[serde(rename = "type")]
    pub account_type: Option<AccountType>,
    pub category: Option<String>,
}

impl From<AccountFilter> for AccountQuery {
    fn from(filter: AccountFilter) -> Self {
        AccountQuery {
            branch_id: filter.branch_id,
            account_type: filter.account_type,
            category: filter.category,
        }
    }
}

/// Body of `POST /accounts/seed`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedAccountsRequest {
    pub branch_id: BranchId,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchFilter {
    pub branch_id: Option<BranchId>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilter {
    pub branch_id: Option<BranchId>,
    pub account_id: Option<AccountId>,
    #[serde(rename = "type")]
    pub entry_type: Option<EntryType>,
    pub category: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl TransactionFilter {
    pub fn into_query(self) -> Result<TransactionQuery, ApiError> {
        Ok(TransactionQuery {
            dates: date_range(self.start_date, self.end_date)?,
            branch_id: self.branch_id,
            account_id: self.account_id,
            entry_type: self.entry_type,
            category: self.category,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentFilter {
    pub branch_id: Option<BranchId>,
    /// Honoured on invoices
    pub customer_id: Option<CustomerId>,
    /// Honoured on bills
    pub vendor_id: Option<VendorId>,
    pub status: Option<DocumentStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl DocumentFilter {
    pub fn into_query(self, kind: DocumentKind) -> Result<DocumentQuery, ApiError> {
        let counterparty = match kind {
            DocumentKind::Invoice => self.customer_id.map(Counterparty::Customer),
            DocumentKind::Bill => self.vendor_id.map(Counterparty::Vendor),
        };
        Ok(DocumentQuery {
            kind,
            branch_id: self.branch_id,
            counterparty,
            status: self.status,
            issued: date_range(self.start_date, self.end_date)?,
        })
    }
}

/// The field a document of `kind` must name its counterparty with
pub fn counterparty_field(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::Invoice => "customerId",
        DocumentKind::Bill => "vendorId",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_filter_uses_the_matching_counterparty() {
        let customer = CustomerId::new();
        let filter = DocumentFilter {
            customer_id: Some(customer),
            vendor_id: Some(VendorId::new()),
            ..DocumentFilter::default()
        };
        let query = filter.into_query(DocumentKind::Invoice).unwrap();
        assert_eq!(query.counterparty, Some(Counterparty::Customer(customer)));
        assert_eq!(query.kind, DocumentKind::Invoice);
    }

    #[test]
    fn test_transaction_filter_parses_from_query_string() {
        let filter: TransactionFilter =
            serde_json::from_str(r#"{"type":"DEBIT","startDate":"2024-06-01"}"#).unwrap();
        let query = filter.into_query().unwrap();
        assert_eq!(query.entry_type, Some(EntryType::Debit));
        assert!(query.dates.is_some());
    }
}
