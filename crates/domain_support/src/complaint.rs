//! Customer complaints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use core_kernel::{BranchId, ComplaintId, CoreError, CustomerId, Role, UserId};

use crate::workflow::{Transition, Workflow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
            Priority::Urgent => "URGENT",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(Priority::Low),
            "MEDIUM" => Ok(Priority::Medium),
            "HIGH" => Ok(Priority::High),
            "URGENT" => Ok(Priority::Urgent),
            other => Err(CoreError::validation(format!("Unknown priority: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplaintStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl ComplaintStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintStatus::Open => "OPEN",
            ComplaintStatus::InProgress => "IN_PROGRESS",
            ComplaintStatus::Resolved => "RESOLVED",
            ComplaintStatus::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplaintStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(ComplaintStatus::Open),
            "IN_PROGRESS" => Ok(ComplaintStatus::InProgress),
            "RESOLVED" => Ok(ComplaintStatus::Resolved),
            "CLOSED" => Ok(ComplaintStatus::Closed),
            other => Err(CoreError::validation(format!("Unknown complaint status: {}", other))),
        }
    }
}

const COMPLAINT_TRANSITIONS: &[Transition<ComplaintStatus>] = &[
    Transition::new(ComplaintStatus::Open, ComplaintStatus::InProgress, Role::Staff),
    Transition::new(ComplaintStatus::Open, ComplaintStatus::Resolved, Role::Staff),
    Transition::new(ComplaintStatus::InProgress, ComplaintStatus::Resolved, Role::Staff),
    Transition::new(ComplaintStatus::Resolved, ComplaintStatus::InProgress, Role::Staff),
    // The complainant may close once resolved
    Transition::new(ComplaintStatus::Resolved, ComplaintStatus::Closed, Role::Customer),
    Transition::new(ComplaintStatus::Open, ComplaintStatus::Closed, Role::TeamLead),
];

impl Workflow for ComplaintStatus {
    fn transitions() -> &'static [Transition<Self>] {
        COMPLAINT_TRANSITIONS
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Complaint {
    pub id: ComplaintId,
    pub branch_id: BranchId,
    pub customer_id: CustomerId,
    pub subject: String,
    pub description: String,
    pub category: Option<String>,
    pub priority: Priority,
    pub status: ComplaintStatus,
    pub assigned_to: Option<UserId>,
    pub resolution: Option<String>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewComplaint {
    pub branch_id: BranchId,
    /// Defaults to the caller's own customer record for customer logins
    pub customer_id: Option<CustomerId>,
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub subject: String,
    #[validate(length(min = 1, max = 5000, message = "must be 1-5000 characters"))]
    pub description: String,
    pub category: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    pub assigned_to: Option<UserId>,
}

impl Complaint {
    pub fn open(input: NewComplaint, customer_id: CustomerId, created_by: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: ComplaintId::new_v7(),
            branch_id: input.branch_id,
            customer_id,
            subject: input.subject.trim().to_string(),
            description: input.description,
            category: input.category,
            priority: input.priority,
            status: ComplaintStatus::Open,
            assigned_to: input.assigned_to,
            resolution: None,
            created_by,
            created_at: now,
            updated_at: now,
            resolved_at: None,
        }
    }

    pub fn set_status(&mut self, status: ComplaintStatus, note: Option<String>, at: DateTime<Utc>) {
        match status {
            ComplaintStatus::Resolved => {
                self.resolved_at = Some(at);
                if note.is_some() {
                    self.resolution = note;
                }
            }
            ComplaintStatus::InProgress => self.resolved_at = None,
            _ => {}
        }
        self.status = status;
        self.updated_at = at;
    }
}
