//! Roles and the acting identity passed into domain services

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::identifiers::{BranchId, CustomerId, UserId};

/// Portal roles, ordered from least to most privileged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Customer,
    Staff,
    TeamLead,
    Manager,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "CUSTOMER",
            Role::Staff => "STAFF",
            Role::TeamLead => "TEAM_LEAD",
            Role::Manager => "MANAGER",
            Role::Admin => "ADMIN",
        }
    }

    /// Returns true if this role is at least as privileged as `required`
    pub fn at_least(&self, required: Role) -> bool {
        *self >= required
    }

    /// Returns true for any staff-side role
    pub fn is_staff(&self) -> bool {
        self.at_least(Role::Staff)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CUSTOMER" => Ok(Role::Customer),
            "STAFF" => Ok(Role::Staff),
            "TEAM_LEAD" => Ok(Role::TeamLead),
            "MANAGER" => Ok(Role::Manager),
            "ADMIN" => Ok(Role::Admin),
            other => Err(CoreError::validation(format!("Unknown role: {}", other))),
        }
    }
}

/// The authenticated caller of a domain operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,
    /// Home branch; admins may act without one
    pub branch_id: Option<BranchId>,
    /// Set for customer logins
    pub customer_id: Option<CustomerId>,
}

impl Actor {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self {
            user_id,
            role,
            branch_id: None,
            customer_id: None,
        }
    }

    pub fn in_branch(mut self, branch_id: BranchId) -> Self {
        self.branch_id = Some(branch_id);
        self
    }

    pub fn as_customer(mut self, customer_id: CustomerId) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    /// Fails with `Forbidden` unless the actor holds at least `required`
    pub fn require(&self, required: Role) -> Result<(), CoreError> {
        if self.role.at_least(required) {
            Ok(())
        } else {
            Err(CoreError::Forbidden(format!(
                "role {} is required, caller has {}",
                required, self.role
            )))
        }
    }

    /// Admins see every branch; everyone else is pinned to their own
    pub fn can_access_branch(&self, branch_id: BranchId) -> bool {
        self.role == Role::Admin || self.branch_id == Some(branch_id)
    }

    /// Fails with `Forbidden` unless the actor may act on records of `branch_id`
    pub fn ensure_branch(&self, branch_id: BranchId) -> Result<(), CoreError> {
        if self.can_access_branch(branch_id) {
            Ok(())
        } else {
            Err(CoreError::Forbidden(format!(
                "Branch {} is outside your scope",
                branch_id
            )))
        }
    }

    /// Branch filter to apply to list queries
    ///
    /// Admins keep whatever filter they asked for; others always get their own branch.
    pub fn scope_branch(&self, requested: Option<BranchId>) -> Option<BranchId> {
        if self.role == Role::Admin {
            requested
        } else {
            self.branch_id
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ordering() {
        assert!(Role::Admin.at_least(Role::Manager));
        assert!(Role::TeamLead.at_least(Role::Staff));
        assert!(!Role::Customer.at_least(Role::Staff));
        assert!(!Role::Customer.is_staff());
    }

    #[test]
    fn test_role_serde() {
        let json = serde_json::to_string(&Role::TeamLead).unwrap();
        assert_eq!(json, "\"TEAM_LEAD\"");
        assert_eq!("MANAGER".parse::<Role>().unwrap(), Role::Manager);
    }

    #[test]
    fn test_branch_scoping() {
        let branch = BranchId::new();
        let other = BranchId::new();
        let manager = Actor::new(UserId::new(), Role::Manager).in_branch(branch);
        let admin = Actor::new(UserId::new(), Role::Admin);

        assert!(manager.can_access_branch(branch));
        assert!(!manager.can_access_branch(other));
        assert_eq!(manager.scope_branch(Some(other)), Some(branch));
        assert_eq!(admin.scope_branch(Some(other)), Some(other));
        assert!(admin.can_access_branch(other));
        assert!(matches!(manager.ensure_branch(other), Err(CoreError::Forbidden(_))));
    }

    #[test]
    fn test_require() {
        let staff = Actor::new(UserId::new(), Role::Staff);
        assert!(staff.require(Role::Staff).is_ok());
        assert!(matches!(staff.require(Role::Manager), Err(CoreError::Forbidden(_))));
    }
}
