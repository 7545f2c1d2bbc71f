//! PostgreSQL Support Adapter
//!
//! Status updates carry the status the caller read in their `WHERE` clause.
//! When no row matches, a second lookup tells a stale write from a missing
//! record.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use tracing::instrument;
use uuid::Uuid;

use core_kernel::{
    BranchId, ComplaintId, ContractId, CustomerId, DomainPort, HealthCheckResult, HealthCheckable,
    NotificationId, Page, PageRequest, PortError, TaskId, UserId,
};
use domain_support::{
    stale_update, Complaint, ComplaintQuery, ComplaintStatus, Contract, ContractQuery,
    ContractStatus, Notification, NotificationQuery, SupportPort, Task, TaskQuery, TaskStatus,
};

use super::{convert, limit_offset, to_page};
use crate::error::{decode, port_err, DatabaseError};
use crate::pool::ping;

const COMPLAINT_COLUMNS: &str = "id, branch_id, customer_id, subject, description, category, \
     priority, status, assigned_to, resolution, created_by, created_at, updated_at, resolved_at";

const COMPLAINT_FILTER: &str = "WHERE ($1::uuid IS NULL OR branch_id = $1) \
     AND ($2::uuid IS NULL OR customer_id = $2) \
     AND ($3::text IS NULL OR status = $3) \
     AND ($4::text IS NULL OR priority = $4) \
     AND ($5::uuid IS NULL OR assigned_to = $5)";

const TASK_COLUMNS: &str = "id, branch_id, title, description, assigned_to, created_by, due_date, \
     priority, status, created_at, updated_at, completed_at";

const TASK_FILTER: &str = "WHERE ($1::uuid IS NULL OR branch_id = $1) \
     AND ($2::text IS NULL OR status = $2) \
     AND ($3::uuid IS NULL OR assigned_to = $3)";

const CONTRACT_COLUMNS: &str = "id, branch_id, customer_id, title, start_date, end_date, \
     monthly_fee, document_ref, status, created_by, created_at, updated_at";

const CONTRACT_FILTER: &str = "WHERE ($1::uuid IS NULL OR branch_id = $1) \
     AND ($2::uuid IS NULL OR customer_id = $2) \
     AND ($3::text IS NULL OR status = $3)";

const NOTIFICATION_COLUMNS: &str =
    "id, recipient_id, title, message, kind, is_read, read_at, created_at";

const NOTIFICATION_FILTER: &str = "WHERE recipient_id = $1 AND (NOT $2 OR NOT is_read)";

/// PostgreSQL-backed implementation of `SupportPort`
#[derive(Debug, Clone)]
pub struct PostgresSupportAdapter {
    pool: PgPool,
}

impl PostgresSupportAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Resolves a compare-and-set update that touched no row
    async fn missed_update(&self, table: &str, entity: &str, id: Uuid) -> PortError {
        let sql = format!("SELECT EXISTS (SELECT 1 FROM {table} WHERE id = $1)");
        match sqlx::query_scalar::<_, bool>(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await
        {
            Ok(true) => stale_update(entity, id),
            Ok(false) => PortError::not_found(entity, id),
            Err(e) => port_err(e),
        }
    }
}

impl DomainPort for PostgresSupportAdapter {}

#[async_trait]
impl HealthCheckable for PostgresSupportAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-support").await
    }
}

// ============================================================================
// Rows
// ============================================================================

#[derive(Debug, FromRow)]
struct ComplaintRow {
    id: Uuid,
    branch_id: Uuid,
    customer_id: Uuid,
    subject: String,
    description: String,
    category: Option<String>,
    priority: String,
    status: String,
    assigned_to: Option<Uuid>,
    resolution: Option<String>,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    resolved_at: Option<DateTime<Utc>>,
}

impl TryFrom<ComplaintRow> for Complaint {
    type Error = DatabaseError;

    fn try_from(row: ComplaintRow) -> Result<Self, Self::Error> {
        Ok(Complaint {
            id: ComplaintId::from(row.id),
            branch_id: BranchId::from(row.branch_id),
            customer_id: CustomerId::from(row.customer_id),
            subject: row.subject,
            description: row.description,
            category: row.category,
            priority: decode("priority", &row.priority)?,
            status: decode("status", &row.status)?,
            assigned_to: row.assigned_to.map(UserId::from),
            resolution: row.resolution,
            created_by: UserId::from(row.created_by),
            created_at: row.created_at,
            updated_at: row.updated_at,
            resolved_at: row.resolved_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct TaskRow {
    id: Uuid,
    branch_id: Uuid,
    title: String,
    description: Option<String>,
    assigned_to: Option<Uuid>,
    created_by: Uuid,
    due_date: Option<NaiveDate>,
    priority: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<TaskRow> for Task {
    type Error = DatabaseError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        Ok(Task {
            id: TaskId::from(row.id),
            branch_id: BranchId::from(row.branch_id),
            title: row.title,
            description: row.description,
            assigned_to: row.assigned_to.map(UserId::from),
            created_by: UserId::from(row.created_by),
            due_date: row.due_date,
            priority: decode("priority", &row.priority)?,
            status: decode("status", &row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
            completed_at: row.completed_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ContractRow {
    id: Uuid,
    branch_id: Uuid,
    customer_id: Uuid,
    title: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    monthly_fee: Decimal,
    document_ref: Option<String>,
    status: String,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ContractRow> for Contract {
    type Error = DatabaseError;

    fn try_from(row: ContractRow) -> Result<Self, Self::Error> {
        Ok(Contract {
            id: ContractId::from(row.id),
            branch_id: BranchId::from(row.branch_id),
            customer_id: CustomerId::from(row.customer_id),
            title: row.title,
            start_date: row.start_date,
            end_date: row.end_date,
            monthly_fee: row.monthly_fee,
            document_ref: row.document_ref,
            status: decode("status", &row.status)?,
            created_by: UserId::from(row.created_by),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct NotificationRow {
    id: Uuid,
    recipient_id: Uuid,
    title: String,
    message: String,
    kind: String,
    is_read: bool,
    read_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Notification {
            id: NotificationId::from(row.id),
            recipient_id: UserId::from(row.recipient_id),
            title: row.title,
            message: row.message,
            kind: row.kind,
            is_read: row.is_read,
            read_at: row.read_at,
            created_at: row.created_at,
        }
    }
}

// ============================================================================
// Port
// ============================================================================

#[async_trait]
impl SupportPort for PostgresSupportAdapter {
    #[instrument(skip(self, complaint), fields(complaint_id = %complaint.id))]
    async fn insert_complaint(&self, complaint: Complaint) -> Result<Complaint, PortError> {
        sqlx::query(
            "INSERT INTO complaints (id, branch_id, customer_id, subject, description, category, \
             priority, status, assigned_to, resolution, created_by, created_at, updated_at, resolved_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(Uuid::from(complaint.id))
        .bind(Uuid::from(complaint.branch_id))
        .bind(Uuid::from(complaint.customer_id))
        .bind(&complaint.subject)
        .bind(&complaint.description)
        .bind(&complaint.category)
        .bind(complaint.priority.as_str())
        .bind(complaint.status.as_str())
        .bind(complaint.assigned_to.map(Uuid::from))
        .bind(&complaint.resolution)
        .bind(Uuid::from(complaint.created_by))
        .bind(complaint.created_at)
        .bind(complaint.updated_at)
        .bind(complaint.resolved_at)
        .execute(&self.pool)
        .await
        .map_err(port_err)?;
        Ok(complaint)
    }

    async fn get_complaint(&self, id: ComplaintId) -> Result<Complaint, PortError> {
        let sql = format!("SELECT {COMPLAINT_COLUMNS} FROM complaints WHERE id = $1");
        let row = sqlx::query_as::<_, ComplaintRow>(&sql)
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(port_err)?
            .ok_or_else(|| PortError::not_found("Complaint", id))?;
        Ok(Complaint::try_from(row)?)
    }

    async fn list_complaints(
        &self,
        query: &ComplaintQuery,
        page: PageRequest,
    ) -> Result<Page<Complaint>, PortError> {
        let (limit, offset) = limit_offset(page);
        let branch = query.branch_id.map(Uuid::from);
        let customer = query.customer_id.map(Uuid::from);
        let status = query.status.map(|s| s.as_str());
        let priority = query.priority.map(|p| p.as_str());
        let assignee = query.assigned_to.map(Uuid::from);

        let sql = format!(
            "SELECT {COMPLAINT_COLUMNS} FROM complaints {COMPLAINT_FILTER} \
             ORDER BY created_at DESC LIMIT $6 OFFSET $7"
        );
        let rows = sqlx::query_as::<_, ComplaintRow>(&sql)
            .bind(branch)
            .bind(customer)
            .bind(status)
            .bind(priority)
            .bind(assignee)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(port_err)?;

        let count_sql = format!("SELECT COUNT(*) FROM complaints {COMPLAINT_FILTER}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(branch)
            .bind(customer)
            .bind(status)
            .bind(priority)
            .bind(assignee)
            .fetch_one(&self.pool)
            .await
            .map_err(port_err)?;
        Ok(to_page(convert(rows)?, page, total))
    }

    #[instrument(skip(self, complaint), fields(complaint_id = %complaint.id, expected = %expected))]
    async fn update_complaint(
        &self,
        complaint: Complaint,
        expected: ComplaintStatus,
    ) -> Result<Complaint, PortError> {
        let updated = sqlx::query(
            "UPDATE complaints SET status = $3, assigned_to = $4, resolution = $5, updated_at = $6, \
             resolved_at = $7 WHERE id = $1 AND status = $2",
        )
        .bind(Uuid::from(complaint.id))
        .bind(expected.as_str())
        .bind(complaint.status.as_str())
        .bind(complaint.assigned_to.map(Uuid::from))
        .bind(&complaint.resolution)
        .bind(complaint.updated_at)
        .bind(complaint.resolved_at)
        .execute(&self.pool)
        .await
        .map_err(port_err)?;
        if updated.rows_affected() == 0 {
            return Err(self.missed_update("complaints", "Complaint", complaint.id.into()).await);
        }
        Ok(complaint)
    }

    #[instrument(skip(self, task), fields(task_id = %task.id))]
    async fn insert_task(&self, task: Task) -> Result<Task, PortError> {
        sqlx::query(
            "INSERT INTO tasks (id, branch_id, title, description, assigned_to, created_by, due_date, \
             priority, status, created_at, updated_at, completed_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(Uuid::from(task.id))
        .bind(Uuid::from(task.branch_id))
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.assigned_to.map(Uuid::from))
        .bind(Uuid::from(task.created_by))
        .bind(task.due_date)
        .bind(task.priority.as_str())
        .bind(task.status.as_str())
        .bind(task.created_at)
        .bind(task.updated_at)
        .bind(task.completed_at)
        .execute(&self.pool)
        .await
        .map_err(port_err)?;
        Ok(task)
    }

    async fn get_task(&self, id: TaskId) -> Result<Task, PortError> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1");
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(port_err)?
            .ok_or_else(|| PortError::not_found("Task", id))?;
        Ok(Task::try_from(row)?)
    }

    async fn list_tasks(&self, query: &TaskQuery, page: PageRequest) -> Result<Page<Task>, PortError> {
        let (limit, offset) = limit_offset(page);
        let branch = query.branch_id.map(Uuid::from);
        let status = query.status.map(|s| s.as_str());
        let assignee = query.assigned_to.map(Uuid::from);

        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks {TASK_FILTER} ORDER BY created_at DESC LIMIT $4 OFFSET $5"
        );
        let rows = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(branch)
            .bind(status)
            .bind(assignee)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(port_err)?;

        let count_sql = format!("SELECT COUNT(*) FROM tasks {TASK_FILTER}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(branch)
            .bind(status)
            .bind(assignee)
            .fetch_one(&self.pool)
            .await
            .map_err(port_err)?;
        Ok(to_page(convert(rows)?, page, total))
    }

    #[instrument(skip(self, task), fields(task_id = %task.id, expected = %expected))]
    async fn update_task(&self, task: Task, expected: TaskStatus) -> Result<Task, PortError> {
        let updated = sqlx::query(
            "UPDATE tasks SET status = $3, assigned_to = $4, updated_at = $5, completed_at = $6 \
             WHERE id = $1 AND status = $2",
        )
        .bind(Uuid::from(task.id))
        .bind(expected.as_str())
        .bind(task.status.as_str())
        .bind(task.assigned_to.map(Uuid::from))
        .bind(task.updated_at)
        .bind(task.completed_at)
        .execute(&self.pool)
        .await
        .map_err(port_err)?;
        if updated.rows_affected() == 0 {
            return Err(self.missed_update("tasks", "Task", task.id.into()).await);
        }
        Ok(task)
    }

    #[instrument(skip(self, contract), fields(contract_id = %contract.id))]
    async fn insert_contract(&self, contract: Contract) -> Result<Contract, PortError> {
        sqlx::query(
            "INSERT INTO contracts (id, branch_id, customer_id, title, start_date, end_date, \
             monthly_fee, document_ref, status, created_by, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(Uuid::from(contract.id))
        .bind(Uuid::from(contract.branch_id))
        .bind(Uuid::from(contract.customer_id))
        .bind(&contract.title)
        .bind(contract.start_date)
        .bind(contract.end_date)
        .bind(contract.monthly_fee)
        .bind(&contract.document_ref)
        .bind(contract.status.as_str())
        .bind(Uuid::from(contract.created_by))
        .bind(contract.created_at)
        .bind(contract.updated_at)
        .execute(&self.pool)
        .await
        .map_err(port_err)?;
        Ok(contract)
    }

    async fn get_contract(&self, id: ContractId) -> Result<Contract, PortError> {
        let sql = format!("SELECT {CONTRACT_COLUMNS} FROM contracts WHERE id = $1");
        let row = sqlx::query_as::<_, ContractRow>(&sql)
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(port_err)?
            .ok_or_else(|| PortError::not_found("Contract", id))?;
        Ok(Contract::try_from(row)?)
    }

    async fn list_contracts(
        &self,
        query: &ContractQuery,
        page: PageRequest,
    ) -> Result<Page<Contract>, PortError> {
        let (limit, offset) = limit_offset(page);
        let branch = query.branch_id.map(Uuid::from);
        let customer = query.customer_id.map(Uuid::from);
        let status = query.status.map(|s| s.as_str());

        let sql = format!(
            "SELECT {CONTRACT_COLUMNS} FROM contracts {CONTRACT_FILTER} \
             ORDER BY start_date DESC LIMIT $4 OFFSET $5"
        );
        let rows = sqlx::query_as::<_, ContractRow>(&sql)
            .bind(branch)
            .bind(customer)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(port_err)?;

        let count_sql = format!("SELECT COUNT(*) FROM contracts {CONTRACT_FILTER}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(branch)
            .bind(customer)
            .bind(status)
            .fetch_one(&self.pool)
            .await
            .map_err(port_err)?;
        Ok(to_page(convert(rows)?, page, total))
    }

    #[instrument(skip(self, contract), fields(contract_id = %contract.id, expected = %expected))]
    async fn update_contract(
        &self,
        contract: Contract,
        expected: ContractStatus,
    ) -> Result<Contract, PortError> {
        let updated = sqlx::query(
            "UPDATE contracts SET status = $3, updated_at = $4 WHERE id = $1 AND status = $2",
        )
        .bind(Uuid::from(contract.id))
        .bind(expected.as_str())
        .bind(contract.status.as_str())
        .bind(contract.updated_at)
        .execute(&self.pool)
        .await
        .map_err(port_err)?;
        if updated.rows_affected() == 0 {
            return Err(self.missed_update("contracts", "Contract", contract.id.into()).await);
        }
        Ok(contract)
    }

    async fn insert_notification(&self, notification: Notification) -> Result<Notification, PortError> {
        sqlx::query(
            "INSERT INTO notifications (id, recipient_id, title, message, kind, is_read, read_at, \
             created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(Uuid::from(notification.id))
        .bind(Uuid::from(notification.recipient_id))
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(&notification.kind)
        .bind(notification.is_read)
        .bind(notification.read_at)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await
        .map_err(port_err)?;
        Ok(notification)
    }

    async fn get_notification(&self, id: NotificationId) -> Result<Notification, PortError> {
        let sql = format!("SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = $1");
        let row = sqlx::query_as::<_, NotificationRow>(&sql)
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(port_err)?
            .ok_or_else(|| PortError::not_found("Notification", id))?;
        Ok(row.into())
    }

    async fn list_notifications(
        &self,
        query: &NotificationQuery,
        page: PageRequest,
    ) -> Result<Page<Notification>, PortError> {
        let (limit, offset) = limit_offset(page);
        let recipient = Uuid::from(query.recipient_id);

        let sql = format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications {NOTIFICATION_FILTER} \
             ORDER BY created_at DESC LIMIT $3 OFFSET $4"
        );
        let rows = sqlx::query_as::<_, NotificationRow>(&sql)
            .bind(recipient)
            .bind(query.unread_only)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(port_err)?;

        let count_sql = format!("SELECT COUNT(*) FROM notifications {NOTIFICATION_FILTER}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(recipient)
            .bind(query.unread_only)
            .fetch_one(&self.pool)
            .await
            .map_err(port_err)?;
        let notifications = rows.into_iter().map(Notification::from).collect();
        Ok(to_page(notifications, page, total))
    }

    async fn mark_notification_read(
        &self,
        id: NotificationId,
        at: DateTime<Utc>,
    ) -> Result<Notification, PortError> {
        // COALESCE keeps the first read time
        let sql = format!(
            "UPDATE notifications SET is_read = TRUE, read_at = COALESCE(read_at, $2) \
             WHERE id = $1 RETURNING {NOTIFICATION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, NotificationRow>(&sql)
            .bind(Uuid::from(id))
            .bind(at)
            .fetch_optional(&self.pool)
            .await
            .map_err(port_err)?
            .ok_or_else(|| PortError::not_found("Notification", id))?;
        Ok(row.into())
    }
}
