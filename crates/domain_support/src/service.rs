//! Support service

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use validator::Validate;

use core_kernel::{
    Actor, ComplaintId, ContractId, CoreError, CustomerId, NotificationId, Page, PageRequest,
    Role, TaskId,
};
use domain_directory::DirectoryPort;

use crate::complaint::{Complaint, ComplaintStatus, NewComplaint};
use crate::contract::{Contract, ContractStatus, NewContract};
use crate::error::SupportError;
use crate::notification::{NewNotification, Notification};
use crate::ports::{ComplaintQuery, ContractQuery, NotificationQuery, SupportPort, TaskQuery};
use crate::task::{NewTask, Task, TaskStatus};
use crate::workflow::authorize_transition;

/// Body of a status change request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange<S> {
    pub status: S,
    /// Resolution text for complaints; ignored elsewhere
    pub note: Option<String>,
}

impl<S> StatusChange<S> {
    pub fn to(status: S) -> Self {
        Self { status, note: None }
    }
}

/// Application service for complaints, tasks, contracts and notifications
#[derive(Clone)]
pub struct SupportService {
    port: Arc<dyn SupportPort>,
    directory: Arc<dyn DirectoryPort>,
}

impl SupportService {
    pub fn new(port: Arc<dyn SupportPort>, directory: Arc<dyn DirectoryPort>) -> Self {
        Self { port, directory }
    }

    // ========================================================================
    // Complaints
    // ========================================================================

    /// Opens a complaint
    ///
    /// Customer logins always complain as themselves; staff must name the customer.
    #[instrument(skip(self, actor, input), fields(branch_id = %input.branch_id))]
    pub async fn create_complaint(
        &self,
        actor: &Actor,
        input: NewComplaint,
    ) -> Result<Complaint, SupportError> {
        input.validate().map_err(CoreError::from)?;
        let customer_id = self.complainant(actor, input.customer_id)?;
        let customer = self.directory.get_customer(customer_id).await?;
        if customer.branch_id != input.branch_id {
            return Err(SupportError::invalid("Customer does not belong to this branch"));
        }
        if actor.role.is_staff() {
            actor.ensure_branch(input.branch_id)?;
        }

        let complaint = self
            .port
            .insert_complaint(Complaint::open(input, customer_id, actor.user_id))
            .await?;
        info!(complaint_id = %complaint.id, priority = %complaint.priority, "Complaint opened");
        Ok(complaint)
    }

    fn complainant(
        &self,
        actor: &Actor,
        requested: Option<CustomerId>,
    ) -> Result<CustomerId, SupportError> {
        if actor.role.is_staff() {
            return requested.ok_or_else(|| SupportError::invalid("customerId is required"));
        }
        let own = actor
            .customer_id
            .ok_or_else(|| SupportError::Forbidden("No customer record for this login".to_string()))?;
        match requested {
            Some(other) if other != own => Err(SupportError::Forbidden(
                "Customers may only file complaints for themselves".to_string(),
            )),
            _ => Ok(own),
        }
    }

    pub async fn get_complaint(&self, actor: &Actor, id: ComplaintId) -> Result<Complaint, SupportError> {
        let complaint = self.port.get_complaint(id).await?;
        if actor.role.is_staff() {
            actor.ensure_branch(complaint.branch_id)?;
        } else if actor.customer_id != Some(complaint.customer_id) {
            return Err(SupportError::Forbidden("Complaint belongs to another customer".to_string()));
        }
        Ok(complaint)
    }

    pub async fn list_complaints(
        &self,
        actor: &Actor,
        mut query: ComplaintQuery,
        page: PageRequest,
    ) -> Result<Page<Complaint>, SupportError> {
        if actor.role.is_staff() {
            query.branch_id = actor.scope_branch(query.branch_id);
        } else {
            let own = actor
                .customer_id
                .ok_or_else(|| SupportError::Forbidden("No customer record for this login".to_string()))?;
            query.customer_id = Some(own);
            query.branch_id = None;
        }
        Ok(self.port.list_complaints(&query, page).await?)
    }

    #[instrument(skip(self, actor, change), fields(complaint_id = %id, to = %change.status))]
    pub async fn change_complaint_status(
        &self,
        actor: &Actor,
        id: ComplaintId,
        change: StatusChange<ComplaintStatus>,
    ) -> Result<Complaint, SupportError> {
        let mut complaint = self.get_complaint(actor, id).await?;
        let from = complaint.status;
        if let Err(e) = authorize_transition(actor, from, change.status) {
            warn!(from = %from, error = %e, "Complaint status change rejected");
            return Err(e);
        }

        complaint.set_status(change.status, change.note, Utc::now());
        let complaint = self.port.update_complaint(complaint, from).await?;
        info!(from = %from, "Complaint status changed");
        Ok(complaint)
    }

    // ========================================================================
    // Tasks
    // ========================================================================

    #[instrument(skip(self, actor, input), fields(branch_id = %input.branch_id))]
    pub async fn create_task(&self, actor: &Actor, input: NewTask) -> Result<Task, SupportError> {
        actor.require(Role::Staff)?;
        input.validate().map_err(CoreError::from)?;
        actor.ensure_branch(input.branch_id)?;
        self.directory.get_branch(input.branch_id).await?;

        let task = self.port.insert_task(Task::create(input, actor.user_id)).await?;
        info!(task_id = %task.id, "Task created");
        Ok(task)
    }

    pub async fn get_task(&self, actor: &Actor, id: TaskId) -> Result<Task, SupportError> {
        actor.require(Role::Staff)?;
        let task = self.port.get_task(id).await?;
        actor.ensure_branch(task.branch_id)?;
        Ok(task)
    }

    pub async fn list_tasks(
        &self,
        actor: &Actor,
        mut query: TaskQuery,
        page: PageRequest,
    ) -> Result<Page<Task>, SupportError> {
        actor.require(Role::Staff)?;
        query.branch_id = actor.scope_branch(query.branch_id);
        Ok(self.port.list_tasks(&query, page).await?)
    }

    #[instrument(skip(self, actor, change), fields(task_id = %id, to = %change.status))]
    pub async fn change_task_status(
        &self,
        actor: &Actor,
        id: TaskId,
        change: StatusChange<TaskStatus>,
    ) -> Result<Task, SupportError> {
        let mut task = self.get_task(actor, id).await?;
        let from = task.status;
        if let Err(e) = authorize_transition(actor, from, change.status) {
            warn!(from = %from, error = %e, "Task status change rejected");
            return Err(e);
        }

        task.set_status(change.status, Utc::now());
        let task = self.port.update_task(task, from).await?;
        info!(from = %from, "Task status changed");
        Ok(task)
    }

    // ========================================================================
    // Contracts
    // ========================================================================

    #[instrument(skip(self, actor, input), fields(branch_id = %input.branch_id, customer_id = %input.customer_id))]
    pub async fn create_contract(&self, actor: &Actor, input: NewContract) -> Result<Contract, SupportError> {
        actor.require(Role::Manager)?;
        input.validate().map_err(CoreError::from)?;
        actor.ensure_branch(input.branch_id)?;
        let customer = self.directory.get_customer(input.customer_id).await?;
        if customer.branch_id != input.branch_id {
            return Err(SupportError::invalid("Customer does not belong to this branch"));
        }

        let contract = self
            .port
            .insert_contract(Contract::draft(input, actor.user_id)?)
            .await?;
        info!(contract_id = %contract.id, monthly_fee = %contract.monthly_fee, "Contract drafted");
        Ok(contract)
    }

    /// Staff see contracts of their branch; customers see their own
    pub async fn get_contract(&self, actor: &Actor, id: ContractId) -> Result<Contract, SupportError> {
        let contract = self.port.get_contract(id).await?;
        if actor.role.is_staff() {
            actor.ensure_branch(contract.branch_id)?;
        } else if actor.customer_id != Some(contract.customer_id) {
            return Err(SupportError::Forbidden("Contract belongs to another customer".to_string()));
        }
        Ok(contract)
    }

    pub async fn list_contracts(
        &self,
        actor: &Actor,
        mut query: ContractQuery,
        page: PageRequest,
    ) -> Result<Page<Contract>, SupportError> {
        if actor.role.is_staff() {
            query.branch_id = actor.scope_branch(query.branch_id);
        } else {
            let own = actor
                .customer_id
                .ok_or_else(|| SupportError::Forbidden("No customer record for this login".to_string()))?;
            query.customer_id = Some(own);
            query.branch_id = None;
        }
        Ok(self.port.list_contracts(&query, page).await?)
    }

    #[instrument(skip(self, actor, change), fields(contract_id = %id, to = %change.status))]
    pub async fn change_contract_status(
        &self,
        actor: &Actor,
        id: ContractId,
        change: StatusChange<ContractStatus>,
    ) -> Result<Contract, SupportError> {
        let mut contract = self.get_contract(actor, id).await?;
        let from = contract.status;
        if let Err(e) = authorize_transition(actor, from, change.status) {
            warn!(from = %from, error = %e, "Contract status change rejected");
            return Err(e);
        }

        contract.set_status(change.status, Utc::now());
        let contract = self.port.update_contract(contract, from).await?;
        info!(from = %from, "Contract status changed");
        Ok(contract)
    }

    // ========================================================================
    // Notifications
    // ========================================================================

    #[instrument(skip(self, actor, input), fields(recipient_id = %input.recipient_id))]
    pub async fn send_notification(
        &self,
        actor: &Actor,
        input: NewNotification,
    ) -> Result<Notification, SupportError> {
        actor.require(Role::Staff)?;
        input.validate().map_err(CoreError::from)?;

        let notification = self.port.insert_notification(Notification::create(input)).await?;
        info!(notification_id = %notification.id, kind = %notification.kind, "Notification sent");
        Ok(notification)
    }

    /// Lists the caller's own notifications, newest first
    pub async fn list_notifications(
        &self,
        actor: &Actor,
        unread_only: bool,
        page: PageRequest,
    ) -> Result<Page<Notification>, SupportError> {
        let query = NotificationQuery {
            unread_only,
            ..NotificationQuery::for_recipient(actor.user_id)
        };
        Ok(self.port.list_notifications(&query, page).await?)
    }

    #[instrument(skip(self, actor), fields(notification_id = %id))]
    pub async fn mark_notification_read(
        &self,
        actor: &Actor,
        id: NotificationId,
    ) -> Result<Notification, SupportError> {
        let notification = self.port.get_notification(id).await?;
        if notification.recipient_id != actor.user_id {
            warn!("Notification read by someone other than its recipient");
            return Err(SupportError::Forbidden(
                "Only the recipient can mark a notification as read".to_string(),
            ));
        }
        Ok(self.port.mark_notification_read(id, Utc::now()).await?)
    }
}
