//! Suppliers that send bills

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{BranchId, VendorId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    pub id: VendorId,
    pub branch_id: BranchId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewVendor {
    pub branch_id: BranchId,
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub name: String,
    #[validate(email(message = "must be a valid email"))]
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl Vendor {
    pub fn create(input: NewVendor) -> Self {
        Self {
            id: VendorId::new_v7(),
            branch_id: input.branch_id,
            name: input.name.trim().to_string(),
            email: input.email.map(|e| e.trim().to_lowercase()),
            phone: input.phone,
            created_at: Utc::now(),
        }
    }
}
