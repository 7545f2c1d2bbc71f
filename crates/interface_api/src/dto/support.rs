//! Complaint, task, contract and notification DTOs

use serde::Deserialize;

use core_kernel::{BranchId, CustomerId, UserId};
use domain_support::{
    ComplaintQuery, ComplaintStatus, ContractQuery, ContractStatus, Priority, TaskQuery, TaskStatus,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintFilter {
    pub branch_id: Option<BranchId>,
    pub customer_id: Option<CustomerId>,
    pub status: Option<ComplaintStatus>,
    pub priority: Option<Priority>,
    pub assigned_to: Option<UserId>,
}

impl From<ComplaintFilter> for ComplaintQuery {
    fn from(filter: ComplaintFilter) -> Self {
        ComplaintQuery {
            branch_id: filter.branch_id,
            customer_id: filter.customer_id,
            status: filter.status,
            priority: filter.priority,
            assigned_to: filter.assigned_to,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFilter {
    pub branch_id: Option<BranchId>,
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<UserId>,
}

impl From<TaskFilter> for TaskQuery {
    fn from(filter: TaskFilter) -> Self {
        TaskQuery {
            branch_id: filter.branch_id,
            status: filter.status,
            assigned_to: filter.assigned_to,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractFilter {
    pub branch_id: Option<BranchId>,
    pub customer_id: Option<CustomerId>,
    pub status: Option<ContractStatus>,
}

impl From<ContractFilter> for ContractQuery {
    fn from(filter: ContractFilter) -> Self {
        ContractQuery {
            branch_id: filter.branch_id,
            customer_id: filter.customer_id,
            status: filter.status,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationFilter {
    #[serde(default)]
    pub unread_only: bool,
}
