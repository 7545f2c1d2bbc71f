//! Membership packages
//!
//! A package grants a monthly allowance of meeting room hours to the
//! customers it is assigned to.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::PackageId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub id: PackageId,
    pub name: String,
    /// Meeting room hours included per calendar month
    pub monthly_hours: u32,
    pub price: Decimal,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewPackage {
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub name: String,
    #[validate(range(max = 744, message = "cannot exceed the hours in a month"))]
    pub monthly_hours: u32,
    pub price: Decimal,
    pub description: Option<String>,
}

impl Package {
    pub fn create(input: NewPackage) -> Self {
        Self {
            id: PackageId::new_v7(),
            name: input.name.trim().to_string(),
            monthly_hours: input.monthly_hours,
            price: input.price,
            description: input.description,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn monthly_minutes(&self) -> i64 {
        i64::from(self.monthly_hours) * 60
    }
}
