//! Customer accounts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use core_kernel::{BranchId, CoreError, CustomerId, PackageId};

/// Account status of a customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomerStatus {
    Active,
    /// Blocked from booking, typically for unpaid invoices
    Locked,
    Inactive,
}

impl CustomerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerStatus::Active => "ACTIVE",
            CustomerStatus::Locked => "LOCKED",
            CustomerStatus::Inactive => "INACTIVE",
        }
    }
}

impl fmt::Display for CustomerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CustomerStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(CustomerStatus::Active),
            "LOCKED" => Ok(CustomerStatus::Locked),
            "INACTIVE" => Ok(CustomerStatus::Inactive),
            other => Err(CoreError::validation(format!("Unknown customer status: {}", other))),
        }
    }
}

/// A coworking member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: CustomerId,
    pub branch_id: BranchId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub status: CustomerStatus,
    /// Membership package driving the monthly booking allowance
    pub package_id: Option<PackageId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    pub fn create(input: NewCustomer) -> Self {
        let now = Utc::now();
        Self {
            id: CustomerId::new_v7(),
            branch_id: input.branch_id,
            name: input.name.trim().to_string(),
            email: input.email.trim().to_lowercase(),
            phone: input.phone,
            company: input.company,
            status: CustomerStatus::Active,
            package_id: input.package_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.status == CustomerStatus::Locked
    }
}

/// Input for registering a customer
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
    pub branch_id: BranchId,
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub name: String,
    #[validate(email(message = "must be a valid email"))]
    pub email: String,
    #[validate(length(max = 40, message = "must be at most 40 characters"))]
    pub phone: Option<String>,
    pub company: Option<String>,
    pub package_id: Option<PackageId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_customer_is_active_with_normalized_email() {
        let customer = Customer::create(NewCustomer {
            branch_id: BranchId::new(),
            name: "Ada Lovelace".to_string(),
            email: "Ada@Example.COM ".to_string(),
            phone: None,
            company: None,
            package_id: None,
        });
        assert_eq!(customer.email, "ada@example.com");
        assert_eq!(customer.status, CustomerStatus::Active);
        assert!(!customer.is_locked());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [CustomerStatus::Active, CustomerStatus::Locked, CustomerStatus::Inactive] {
            assert_eq!(status.as_str().parse::<CustomerStatus>().unwrap(), status);
        }
        assert!("Locked".parse::<CustomerStatus>().is_err());
    }
}
