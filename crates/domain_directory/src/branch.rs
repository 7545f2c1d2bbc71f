//! Branch locations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{BranchId, Timezone};

/// A coworking location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub id: BranchId,
    /// Short unique code, e.g. `SG-01`
    pub code: String,
    pub name: String,
    /// Wall-clock zone used to interpret booking dates and times
    pub timezone: Timezone,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a branch
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewBranch {
    #[validate(length(min = 1, max = 20, message = "must be 1-20 characters"))]
    pub code: String,
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub name: String,
    #[serde(default)]
    pub timezone: Timezone,
    pub address: Option<String>,
}

impl Branch {
    pub fn create(input: NewBranch) -> Self {
        Self {
            id: BranchId::new_v7(),
            code: input.code.trim().to_uppercase(),
            name: input.name.trim().to_string(),
            timezone: input.timezone,
            address: input.address,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_is_normalized() {
        let branch = Branch::create(NewBranch {
            code: " sg-01 ".to_string(),
            name: "Marina".to_string(),
            timezone: "Asia/Singapore".parse().unwrap(),
            address: None,
        });
        assert_eq!(branch.code, "SG-01");
        assert!(branch.is_active);
        assert_eq!(branch.timezone.name(), "Asia/Singapore");
    }

    #[test]
    fn test_timezone_defaults_to_utc() {
        let input: NewBranch = serde_json::from_str(r#"{"code":"HQ","name":"Head Office"}"#).unwrap();
        assert_eq!(input.timezone.name(), "UTC");
    }
}
