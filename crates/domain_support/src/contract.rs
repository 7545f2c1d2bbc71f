//! Membership contracts

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use core_kernel::{BranchId, ContractId, CoreError, CustomerId, Role, UserId};

use crate::error::SupportError;
use crate::workflow::{Transition, Workflow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractStatus {
    Draft,
    Active,
    Expired,
    Terminated,
}

impl ContractStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::Draft => "DRAFT",
            ContractStatus::Active => "ACTIVE",
            ContractStatus::Expired => "EXPIRED",
            ContractStatus::Terminated => "TERMINATED",
        }
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContractStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(ContractStatus::Draft),
            "ACTIVE" => Ok(ContractStatus::Active),
            "EXPIRED" => Ok(ContractStatus::Expired),
            "TERMINATED" => Ok(ContractStatus::Terminated),
            other => Err(CoreError::validation(format!("Unknown contract status: {}", other))),
        }
    }
}

const CONTRACT_TRANSITIONS: &[Transition<ContractStatus>] = &[
    Transition::new(ContractStatus::Draft, ContractStatus::Active, Role::TeamLead),
    Transition::new(ContractStatus::Draft, ContractStatus::Terminated, Role::TeamLead),
    Transition::new(ContractStatus::Active, ContractStatus::Expired, Role::TeamLead),
    Transition::new(ContractStatus::Active, ContractStatus::Terminated, Role::Manager),
];

impl Workflow for ContractStatus {
    fn transitions() -> &'static [Transition<Self>] {
        CONTRACT_TRANSITIONS
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: ContractId,
    pub branch_id: BranchId,
    pub customer_id: CustomerId,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub monthly_fee: Decimal,
    /// Reference to the signed document held outside the portal
    pub document_ref: Option<String>,
    pub status: ContractStatus,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewContract {
    pub branch_id: BranchId,
    pub customer_id: CustomerId,
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub monthly_fee: Decimal,
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub document_ref: Option<String>,
}

impl Contract {
    pub fn draft(input: NewContract, created_by: UserId) -> Result<Self, SupportError> {
        if input.end_date < input.start_date {
            return Err(SupportError::invalid("End date cannot be before start date"));
        }
        if input.monthly_fee.is_sign_negative() {
            return Err(SupportError::invalid("Monthly fee cannot be negative"));
        }
        let now = Utc::now();
        Ok(Self {
            id: ContractId::new_v7(),
            branch_id: input.branch_id,
            customer_id: input.customer_id,
            title: input.title.trim().to_string(),
            start_date: input.start_date,
            end_date: input.end_date,
            monthly_fee: input.monthly_fee,
            document_ref: input.document_ref,
            status: ContractStatus::Draft,
            created_by,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn set_status(&mut self, status: ContractStatus, at: DateTime<Utc>) {
        self.status = status;
        self.updated_at = at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_dates_checked() {
        let input = NewContract {
            branch_id: BranchId::new(),
            customer_id: CustomerId::new(),
            title: "Dedicated desk".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            monthly_fee: dec!(450),
            document_ref: None,
        };
        assert!(Contract::draft(input, UserId::new()).is_err());
    }

    #[test]
    fn test_terminating_active_needs_manager() {
        assert_eq!(
            ContractStatus::min_role(ContractStatus::Active, ContractStatus::Terminated),
            Some(Role::Manager)
        );
        assert_eq!(
            ContractStatus::min_role(ContractStatus::Expired, ContractStatus::Active),
            None
        );
    }
}
