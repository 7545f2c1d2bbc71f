//! Staff members

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{BranchId, EmployeeId, Role};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: EmployeeId,
    pub branch_id: BranchId,
    pub name: String,
    pub email: String,
    /// Portal role granted to the employee's login
    pub role: Role,
    pub position: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewEmployee {
    pub branch_id: BranchId,
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub name: String,
    #[validate(email(message = "must be a valid email"))]
    pub email: String,
    pub role: Role,
    pub position: Option<String>,
}

impl Employee {
    pub fn create(input: NewEmployee) -> Self {
        Self {
            id: EmployeeId::new_v7(),
            branch_id: input.branch_id,
            name: input.name.trim().to_string(),
            email: input.email.trim().to_lowercase(),
            role: input.role,
            position: input.position,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}
