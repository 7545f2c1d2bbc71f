//! Support Domain Ports
//!
//! Status updates are compare-and-set: the store only saves a record whose
//! stored status still equals the status the caller read, and reports a
//! `PortError::Conflict` otherwise.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use core_kernel::{
    BranchId, ComplaintId, ContractId, CustomerId, DomainPort, HealthCheckable, NotificationId,
    Page, PageRequest, PortError, TaskId, UserId,
};

use crate::complaint::{Complaint, ComplaintStatus, Priority};
use crate::contract::{Contract, ContractStatus};
use crate::notification::Notification;
use crate::task::{Task, TaskStatus};

/// Filters for listing complaints
#[derive(Debug, Clone, Default)]
pub struct ComplaintQuery {
    pub branch_id: Option<BranchId>,
    pub customer_id: Option<CustomerId>,
    pub status: Option<ComplaintStatus>,
    pub priority: Option<Priority>,
    pub assigned_to: Option<UserId>,
}

impl ComplaintQuery {
    pub fn matches(&self, complaint: &Complaint) -> bool {
        self.branch_id.map_or(true, |b| complaint.branch_id == b)
            && self.customer_id.map_or(true, |c| complaint.customer_id == c)
            && self.status.map_or(true, |s| complaint.status == s)
            && self.priority.map_or(true, |p| complaint.priority == p)
            && self.assigned_to.map_or(true, |u| complaint.assigned_to == Some(u))
    }
}

/// Filters for listing tasks
#[derive(Debug, Clone, Default)]
pub struct TaskQuery {
    pub branch_id: Option<BranchId>,
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<UserId>,
}

impl TaskQuery {
    pub fn matches(&self, task: &Task) -> bool {
        self.branch_id.map_or(true, |b| task.branch_id == b)
            && self.status.map_or(true, |s| task.status == s)
            && self.assigned_to.map_or(true, |u| task.assigned_to == Some(u))
    }
}

/// Filters for listing contracts
#[derive(Debug, Clone, Default)]
pub struct ContractQuery {
    pub branch_id: Option<BranchId>,
    pub customer_id: Option<CustomerId>,
    pub status: Option<ContractStatus>,
}

impl ContractQuery {
    pub fn matches(&self, contract: &Contract) -> bool {
        self.branch_id.map_or(true, |b| contract.branch_id == b)
            && self.customer_id.map_or(true, |c| contract.customer_id == c)
            && self.status.map_or(true, |s| contract.status == s)
    }
}

/// Filters for listing notifications; always bound to one recipient
#[derive(Debug, Clone)]
pub struct NotificationQuery {
    pub recipient_id: UserId,
    pub unread_only: bool,
}

impl NotificationQuery {
    pub fn for_recipient(recipient_id: UserId) -> Self {
        Self {
            recipient_id,
            unread_only: false,
        }
    }

    pub fn matches(&self, notification: &Notification) -> bool {
        notification.recipient_id == self.recipient_id && (!self.unread_only || !notification.is_read)
    }
}

#[async_trait]
pub trait SupportPort: DomainPort + HealthCheckable {
    async fn insert_complaint(&self, complaint: Complaint) -> Result<Complaint, PortError>;

    async fn get_complaint(&self, id: ComplaintId) -> Result<Complaint, PortError>;

    async fn list_complaints(
        &self,
        query: &ComplaintQuery,
        page: PageRequest,
    ) -> Result<Page<Complaint>, PortError>;

    /// Saves `complaint` if the stored status is still `expected`
    async fn update_complaint(
        &self,
        complaint: Complaint,
        expected: ComplaintStatus,
    ) -> Result<Complaint, PortError>;

    async fn insert_task(&self, task: Task) -> Result<Task, PortError>;

    async fn get_task(&self, id: TaskId) -> Result<Task, PortError>;

    async fn list_tasks(&self, query: &TaskQuery, page: PageRequest) -> Result<Page<Task>, PortError>;

    /// Saves `task` if the stored status is still `expected`
    async fn update_task(&self, task: Task, expected: TaskStatus) -> Result<Task, PortError>;

    async fn insert_contract(&self, contract: Contract) -> Result<Contract, PortError>;

    async fn get_contract(&self, id: ContractId) -> Result<Contract, PortError>;

    async fn list_contracts(
        &self,
        query: &ContractQuery,
        page: PageRequest,
    ) -> Result<Page<Contract>, PortError>;

    /// Saves `contract` if the stored status is still `expected`
    async fn update_contract(
        &self,
        contract: Contract,
        expected: ContractStatus,
    ) -> Result<Contract, PortError>;

    async fn insert_notification(&self, notification: Notification) -> Result<Notification, PortError>;

    async fn get_notification(&self, id: NotificationId) -> Result<Notification, PortError>;

    async fn list_notifications(
        &self,
        query: &NotificationQuery,
        page: PageRequest,
    ) -> Result<Page<Notification>, PortError>;

    /// Marks read; a notification already read keeps its first `read_at`
    async fn mark_notification_read(
        &self,
        id: NotificationId,
        at: DateTime<Utc>,
    ) -> Result<Notification, PortError>;
}

/// Conflict reported when a compare-and-set update finds another status
pub fn stale_update(entity: &str, id: impl std::fmt::Display) -> PortError {
    PortError::conflict(format!("{} {} was modified concurrently", entity, id))
}

/// In-memory implementation for tests and the `memory` storage mode
#[cfg(any(test, feature = "memory"))]
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use core_kernel::HealthCheckResult;

    #[derive(Debug, Default)]
    struct SupportState {
        complaints: HashMap<ComplaintId, Complaint>,
        tasks: HashMap<TaskId, Task>,
        contracts: HashMap<ContractId, Contract>,
        notifications: HashMap<NotificationId, Notification>,
    }

    /// In-memory support store
    #[derive(Debug, Default, Clone)]
    pub struct MemorySupportPort {
        state: Arc<RwLock<SupportState>>,
    }

    impl MemorySupportPort {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl DomainPort for MemorySupportPort {}

    #[async_trait]
    impl HealthCheckable for MemorySupportPort {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("memory-support")
        }
    }

    #[async_trait]
    impl SupportPort for MemorySupportPort {
        async fn insert_complaint(&self, complaint: Complaint) -> Result<Complaint, PortError> {
            let mut state = self.state.write().await;
            state.complaints.insert(complaint.id, complaint.clone());
            Ok(complaint)
        }

        async fn get_complaint(&self, id: ComplaintId) -> Result<Complaint, PortError> {
            self.state
                .read()
                .await
                .complaints
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Complaint", id))
        }

        async fn list_complaints(
            &self,
            query: &ComplaintQuery,
            page: PageRequest,
        ) -> Result<Page<Complaint>, PortError> {
            let state = self.state.read().await;
            let mut complaints: Vec<Complaint> =
                state.complaints.values().filter(|c| query.matches(c)).cloned().collect();
            complaints.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(page.slice(&complaints))
        }

        async fn update_complaint(
            &self,
            complaint: Complaint,
            expected: ComplaintStatus,
        ) -> Result<Complaint, PortError> {
            let mut state = self.state.write().await;
            let stored = state
                .complaints
                .get_mut(&complaint.id)
                .ok_or_else(|| PortError::not_found("Complaint", complaint.id))?;
            if stored.status != expected {
                return Err(stale_update("Complaint", complaint.id));
            }
            *stored = complaint.clone();
            Ok(complaint)
        }

        async fn insert_task(&self, task: Task) -> Result<Task, PortError> {
            let mut state = self.state.write().await;
            state.tasks.insert(task.id, task.clone());
            Ok(task)
        }

        async fn get_task(&self, id: TaskId) -> Result<Task, PortError> {
            self.state
                .read()
                .await
                .tasks
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Task", id))
        }

        async fn list_tasks(&self, query: &TaskQuery, page: PageRequest) -> Result<Page<Task>, PortError> {
            let state = self.state.read().await;
            let mut tasks: Vec<Task> = state.tasks.values().filter(|t| query.matches(t)).cloned().collect();
            tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(page.slice(&tasks))
        }

        async fn update_task(&self, task: Task, expected: TaskStatus) -> Result<Task, PortError> {
            let mut state = self.state.write().await;
            let stored = state
                .tasks
                .get_mut(&task.id)
                .ok_or_else(|| PortError::not_found("Task", task.id))?;
            if stored.status != expected {
                return Err(stale_update("Task", task.id));
            }
            *stored = task.clone();
            Ok(task)
        }

        async fn insert_contract(&self, contract: Contract) -> Result<Contract, PortError> {
            let mut state = self.state.write().await;
            state.contracts.insert(contract.id, contract.clone());
            Ok(contract)
        }

        async fn get_contract(&self, id: ContractId) -> Result<Contract, PortError> {
            self.state
                .read()
                .await
                .contracts
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Contract", id))
        }

        async fn list_contracts(
            &self,
            query: &ContractQuery,
            page: PageRequest,
        ) -> Result<Page<Contract>, PortError> {
            let state = self.state.read().await;
            let mut contracts: Vec<Contract> =
                state.contracts.values().filter(|c| query.matches(c)).cloned().collect();
            contracts.sort_by(|a, b| b.start_date.cmp(&a.start_date));
            Ok(page.slice(&contracts))
        }

        async fn update_contract(
            &self,
            contract: Contract,
            expected: ContractStatus,
        ) -> Result<Contract, PortError> {
            let mut state = self.state.write().await;
            let stored = state
                .contracts
                .get_mut(&contract.id)
                .ok_or_else(|| PortError::not_found("Contract", contract.id))?;
            if stored.status != expected {
                return Err(stale_update("Contract", contract.id));
            }
            *stored = contract.clone();
            Ok(contract)
        }

        async fn insert_notification(&self, notification: Notification) -> Result<Notification, PortError> {
            let mut state = self.state.write().await;
            state.notifications.insert(notification.id, notification.clone());
            Ok(notification)
        }

        async fn get_notification(&self, id: NotificationId) -> Result<Notification, PortError> {
            self.state
                .read()
                .await
                .notifications
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Notification", id))
        }

        async fn list_notifications(
            &self,
            query: &NotificationQuery,
            page: PageRequest,
        ) -> Result<Page<Notification>, PortError> {
            let state = self.state.read().await;
            let mut notifications: Vec<Notification> =
                state.notifications.values().filter(|n| query.matches(n)).cloned().collect();
            notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(page.slice(&notifications))
        }

        async fn mark_notification_read(
            &self,
            id: NotificationId,
            at: DateTime<Utc>,
        ) -> Result<Notification, PortError> {
            let mut state = self.state.write().await;
            let notification = state
                .notifications
                .get_mut(&id)
                .ok_or_else(|| PortError::not_found("Notification", id))?;
            notification.mark_read(at);
            Ok(notification.clone())
        }
    }
}
