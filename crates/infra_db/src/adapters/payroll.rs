//! PostgreSQL Payroll Adapter

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, PgPool};
use tracing::instrument;
use uuid::Uuid;

use core_kernel::{
    BranchId, DomainPort, EmployeeId, HealthCheckResult, HealthCheckable, Page, PageRequest,
    PayrollId, PayrollItemId, PortError, UserId,
};
use domain_payroll::{Payroll, PayrollAction, PayrollItem, PayrollPort, PayrollQuery};

use super::{limit_offset, to_page};
use crate::error::{decode, port_err, port_err_unique, DatabaseError};
use crate::pool::ping;

const DUPLICATE_PERIOD: &str = "Payroll already exists for this employee and pay period";

const COLUMNS: &str = "id, employee_id, branch_id, pay_period, base_salary, overtime, bonus, \
     gross_pay, deductions, net_pay, status, notes, created_by, approved_by, paid_at, \
     created_at, updated_at";

const FILTER: &str = "WHERE ($1::uuid IS NULL OR branch_id = $1) \
     AND ($2::uuid IS NULL OR employee_id = $2) \
     AND ($3::text IS NULL OR pay_period = $3) \
     AND ($4::text IS NULL OR status = $4)";

/// PostgreSQL-backed implementation of `PayrollPort`
#[derive(Debug, Clone)]
pub struct PostgresPayrollAdapter {
    pool: PgPool,
}

impl PostgresPayrollAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DomainPort for PostgresPayrollAdapter {}

#[async_trait]
impl HealthCheckable for PostgresPayrollAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-payroll").await
    }
}

#[derive(Debug, FromRow)]
struct PayrollRow {
    id: Uuid,
    employee_id: Uuid,
    branch_id: Uuid,
    pay_period: String,
    base_salary: Decimal,
    overtime: Decimal,
    bonus: Decimal,
    gross_pay: Decimal,
    deductions: Decimal,
    net_pay: Decimal,
    status: String,
    notes: Option<String>,
    created_by: Uuid,
    approved_by: Option<Uuid>,
    paid_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PayrollRow {
    fn into_payroll(self, items: Vec<PayrollItem>) -> Result<Payroll, DatabaseError> {
        Ok(Payroll {
            id: PayrollId::from(self.id),
            employee_id: EmployeeId::from(self.employee_id),
            branch_id: BranchId::from(self.branch_id),
            pay_period: self.pay_period,
            base_salary: self.base_salary,
            overtime: self.overtime,
            bonus: self.bonus,
            gross_pay: self.gross_pay,
            deductions: self.deductions,
            net_pay: self.net_pay,
            status: decode("status", &self.status)?,
            items,
            notes: self.notes,
            created_by: UserId::from(self.created_by),
            approved_by: self.approved_by.map(UserId::from),
            paid_at: self.paid_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    payroll_id: Uuid,
    description: String,
    amount: Decimal,
    is_deduction: bool,
}

async fn load_items(
    conn: &mut PgConnection,
    ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<PayrollItem>>, PortError> {
    let rows = sqlx::query_as::<_, ItemRow>(
        "SELECT id, payroll_id, description, amount, is_deduction FROM payroll_items \
         WHERE payroll_id = ANY($1) ORDER BY payroll_id, position",
    )
    .bind(ids)
    .fetch_all(conn)
    .await
    .map_err(port_err)?;

    let mut items: HashMap<Uuid, Vec<PayrollItem>> = HashMap::new();
    for row in rows {
        items.entry(row.payroll_id).or_default().push(PayrollItem {
            id: PayrollItemId::from(row.id),
            description: row.description,
            amount: row.amount,
            is_deduction: row.is_deduction,
        });
    }
    Ok(items)
}

async fn attach_items(conn: &mut PgConnection, rows: Vec<PayrollRow>) -> Result<Vec<Payroll>, PortError> {
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let mut items = load_items(conn, &ids).await?;
    rows.into_iter()
        .map(|row| {
            let lines = items.remove(&row.id).unwrap_or_default();
            row.into_payroll(lines).map_err(PortError::from)
        })
        .collect()
}

async fn fetch_payroll(
    conn: &mut PgConnection,
    id: PayrollId,
    for_update: bool,
) -> Result<Payroll, PortError> {
    let lock = if for_update { " FOR UPDATE" } else { "" };
    let sql = format!("SELECT {COLUMNS} FROM payrolls WHERE id = $1{lock}");
    let row = sqlx::query_as::<_, PayrollRow>(&sql)
        .bind(Uuid::from(id))
        .fetch_optional(&mut *conn)
        .await
        .map_err(port_err)?
        .ok_or_else(|| PortError::not_found("Payroll", id))?;
    let mut payrolls = attach_items(conn, vec![row]).await?;
    payrolls
        .pop()
        .ok_or_else(|| PortError::not_found("Payroll", id))
}

#[async_trait]
impl PayrollPort for PostgresPayrollAdapter {
    #[instrument(skip(self, payroll), fields(employee_id = %payroll.employee_id, pay_period = %payroll.pay_period))]
    async fn insert_payroll(&self, payroll: Payroll) -> Result<Payroll, PortError> {
        let mut tx = self.pool.begin().await.map_err(port_err)?;
        sqlx::query(
            "INSERT INTO payrolls (id, employee_id, branch_id, pay_period, base_salary, overtime, \
             bonus, gross_pay, deductions, net_pay, status, notes, created_by, approved_by, paid_at, \
             created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)",
        )
        .bind(Uuid::from(payroll.id))
        .bind(Uuid::from(payroll.employee_id))
        .bind(Uuid::from(payroll.branch_id))
        .bind(&payroll.pay_period)
        .bind(payroll.base_salary)
        .bind(payroll.overtime)
        .bind(payroll.bonus)
        .bind(payroll.gross_pay)
        .bind(payroll.deductions)
        .bind(payroll.net_pay)
        .bind(payroll.status.as_str())
        .bind(&payroll.notes)
        .bind(Uuid::from(payroll.created_by))
        .bind(payroll.approved_by.map(Uuid::from))
        .bind(payroll.paid_at)
        .bind(payroll.created_at)
        .bind(payroll.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| port_err_unique(e, || DUPLICATE_PERIOD.to_string()))?;

        for (position, item) in payroll.items.iter().enumerate() {
            sqlx::query(
                "INSERT INTO payroll_items (id, payroll_id, position, description, amount, is_deduction) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(Uuid::from(item.id))
            .bind(Uuid::from(payroll.id))
            .bind(position as i32)
            .bind(&item.description)
            .bind(item.amount)
            .bind(item.is_deduction)
            .execute(&mut *tx)
            .await
            .map_err(port_err)?;
        }

        tx.commit().await.map_err(port_err)?;
        Ok(payroll)
    }

    async fn get_payroll(&self, id: PayrollId) -> Result<Payroll, PortError> {
        let mut conn = self.pool.acquire().await.map_err(port_err)?;
        fetch_payroll(&mut conn, id, false).await
    }

    async fn find_for_period(
        &self,
        employee_id: EmployeeId,
        pay_period: &str,
    ) -> Result<Option<Payroll>, PortError> {
        let mut conn = self.pool.acquire().await.map_err(port_err)?;
        let sql = format!("SELECT {COLUMNS} FROM payrolls WHERE employee_id = $1 AND pay_period = $2");
        let row = sqlx::query_as::<_, PayrollRow>(&sql)
            .bind(Uuid::from(employee_id))
            .bind(pay_period)
            .fetch_optional(&mut *conn)
            .await
            .map_err(port_err)?;
        match row {
            Some(row) => Ok(attach_items(&mut conn, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_payrolls(
        &self,
        query: &PayrollQuery,
        page: PageRequest,
    ) -> Result<Page<Payroll>, PortError> {
        let (limit, offset) = limit_offset(page);
        let branch = query.branch_id.map(Uuid::from);
        let employee = query.employee_id.map(Uuid::from);
        let status = query.status.map(|s| s.as_str());

        let mut conn = self.pool.acquire().await.map_err(port_err)?;
        let sql = format!(
            "SELECT {COLUMNS} FROM payrolls {FILTER} ORDER BY created_at DESC LIMIT $5 OFFSET $6"
        );
        let rows = sqlx::query_as::<_, PayrollRow>(&sql)
            .bind(branch)
            .bind(employee)
            .bind(&query.pay_period)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *conn)
            .await
            .map_err(port_err)?;

        let count_sql = format!("SELECT COUNT(*) FROM payrolls {FILTER}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(branch)
            .bind(employee)
            .bind(&query.pay_period)
            .bind(status)
            .fetch_one(&mut *conn)
            .await
            .map_err(port_err)?;

        let payrolls = attach_items(&mut conn, rows).await?;
        Ok(to_page(payrolls, page, total))
    }

    #[instrument(skip(self), fields(payroll_id = %id))]
    async fn transition_payroll(
        &self,
        id: PayrollId,
        action: PayrollAction,
    ) -> Result<Payroll, PortError> {
        let mut tx = self.pool.begin().await.map_err(port_err)?;
        let mut payroll = fetch_payroll(&mut tx, id, true).await?;
        match action {
            PayrollAction::Approve(by) => payroll.approve(by)?,
            PayrollAction::MarkPaid => payroll.mark_paid(Utc::now())?,
        }

        sqlx::query(
            "UPDATE payrolls SET status = $2, approved_by = $3, paid_at = $4, updated_at = $5 \
             WHERE id = $1",
        )
        .bind(Uuid::from(payroll.id))
        .bind(payroll.status.as_str())
        .bind(payroll.approved_by.map(Uuid::from))
        .bind(payroll.paid_at)
        .bind(payroll.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(port_err)?;

        tx.commit().await.map_err(port_err)?;
        Ok(payroll)
    }
}
