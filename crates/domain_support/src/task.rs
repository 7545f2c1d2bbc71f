//! Staff tasks

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use core_kernel::{BranchId, CoreError, Role, TaskId, UserId};

use crate::complaint::Priority;
use crate::workflow::{Transition, Workflow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "TODO",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Done => "DONE",
            TaskStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TODO" => Ok(TaskStatus::Todo),
            "IN_PROGRESS" => Ok(TaskStatus::InProgress),
            "DONE" => Ok(TaskStatus::Done),
            "CANCELLED" => Ok(TaskStatus::Cancelled),
            other => Err(CoreError::validation(format!("Unknown task status: {}", other))),
        }
    }
}

const TASK_TRANSITIONS: &[Transition<TaskStatus>] = &[
    Transition::new(TaskStatus::Todo, TaskStatus::InProgress, Role::Staff),
    Transition::new(TaskStatus::Todo, TaskStatus::Done, Role::Staff),
    Transition::new(TaskStatus::InProgress, TaskStatus::Done, Role::Staff),
    Transition::new(TaskStatus::InProgress, TaskStatus::Todo, Role::Staff),
    Transition::new(TaskStatus::Todo, TaskStatus::Cancelled, Role::TeamLead),
    Transition::new(TaskStatus::InProgress, TaskStatus::Cancelled, Role::TeamLead),
];

impl Workflow for TaskStatus {
    fn transitions() -> &'static [Transition<Self>] {
        TASK_TRANSITIONS
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub branch_id: BranchId,
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: Option<UserId>,
    pub created_by: UserId,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub branch_id: BranchId,
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: Option<UserId>,
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Priority,
}

impl Task {
    pub fn create(input: NewTask, created_by: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: TaskId::new_v7(),
            branch_id: input.branch_id,
            title: input.title.trim().to_string(),
            description: input.description,
            assigned_to: input.assigned_to,
            created_by,
            due_date: input.due_date,
            priority: input.priority,
            status: TaskStatus::Todo,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn set_status(&mut self, status: TaskStatus, at: DateTime<Utc>) {
        self.completed_at = (status == TaskStatus::Done).then_some(at);
        self.status = status;
        self.updated_at = at;
    }

    /// Past its due date and still open
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        matches!(self.status, TaskStatus::Todo | TaskStatus::InProgress)
            && self.due_date.is_some_and(|due| due < today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_needs_team_lead() {
        assert_eq!(
            TaskStatus::min_role(TaskStatus::Todo, TaskStatus::Cancelled),
            Some(Role::TeamLead)
        );
        assert_eq!(TaskStatus::min_role(TaskStatus::Done, TaskStatus::Todo), None);
        assert_eq!(TaskStatus::min_role(TaskStatus::Cancelled, TaskStatus::Todo), None);
    }

    #[test]
    fn test_overdue() {
        let mut task = Task::create(
            NewTask {
                branch_id: BranchId::new(),
                title: "Restock pantry".to_string(),
                description: None,
                assigned_to: None,
                due_date: NaiveDate::from_ymd_opt(2024, 5, 1),
                priority: Priority::Low,
            },
            UserId::new(),
        );
        let today = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        assert!(task.is_overdue(today));

        task.set_status(TaskStatus::Done, Utc::now());
        assert!(!task.is_overdue(today));
        assert!(task.completed_at.is_some());
    }
}
