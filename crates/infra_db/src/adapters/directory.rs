//! PostgreSQL Directory Adapter

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{
    BranchId, CustomerId, DomainPort, EmployeeId, HealthCheckResult, HealthCheckable, PackageId,
    Page, PageRequest, PortError, VendorId,
};
use domain_directory::{
    Branch, Customer, CustomerQuery, CustomerStatus, DirectoryPort, Employee, EmployeeQuery,
    Vendor, VendorQuery,
};

use super::{convert, limit_offset, to_page};
use crate::error::{decode, port_err, port_err_unique, DatabaseError};
use crate::pool::ping;

/// PostgreSQL-backed implementation of `DirectoryPort`
#[derive(Debug, Clone)]
pub struct PostgresDirectoryAdapter {
    pool: PgPool,
}

impl PostgresDirectoryAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DomainPort for PostgresDirectoryAdapter {}

#[async_trait]
impl HealthCheckable for PostgresDirectoryAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-directory").await
    }
}

// ============================================================================
// Rows
// ============================================================================

const BRANCH_COLUMNS: &str = "id, code, name, timezone, address, is_active, created_at";

#[derive(Debug, FromRow)]
struct BranchRow {
    id: Uuid,
    code: String,
    name: String,
    timezone: String,
    address: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<BranchRow> for Branch {
    type Error = DatabaseError;

    fn try_from(row: BranchRow) -> Result<Self, Self::Error> {
        Ok(Branch {
            id: BranchId::from(row.id),
            code: row.code,
            name: row.name,
            timezone: decode("timezone", &row.timezone)?,
            address: row.address,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

const CUSTOMER_COLUMNS: &str =
    "id, branch_id, name, email, phone, company, status, package_id, created_at, updated_at";

const CUSTOMER_FILTER: &str = "WHERE ($1::uuid IS NULL OR branch_id = $1) \
     AND ($2::text IS NULL OR status = $2) \
     AND ($3::text IS NULL OR name ILIKE '%' || $3 || '%' OR email ILIKE '%' || $3 || '%')";

#[derive(Debug, FromRow)]
struct CustomerRow {
    id: Uuid,
    branch_id: Uuid,
    name: String,
    email: String,
    phone: Option<String>,
    company: Option<String>,
    status: String,
    package_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = DatabaseError;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        Ok(Customer {
            id: CustomerId::from(row.id),
            branch_id: BranchId::from(row.branch_id),
            name: row.name,
            email: row.email,
            phone: row.phone,
            company: row.company,
            status: decode("status", &row.status)?,
            package_id: row.package_id.map(PackageId::from),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const EMPLOYEE_COLUMNS: &str = "id, branch_id, name, email, role, position, is_active, created_at";

#[derive(Debug, FromRow)]
struct EmployeeRow {
    id: Uuid,
    branch_id: Uuid,
    name: String,
    email: String,
    role: String,
    position: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<EmployeeRow> for Employee {
    type Error = DatabaseError;

    fn try_from(row: EmployeeRow) -> Result<Self, Self::Error> {
        Ok(Employee {
            id: EmployeeId::from(row.id),
            branch_id: BranchId::from(row.branch_id),
            name: row.name,
            email: row.email,
            role: decode("role", &row.role)?,
            position: row.position,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

const VENDOR_COLUMNS: &str = "id, branch_id, name, email, phone, created_at";

#[derive(Debug, FromRow)]
struct VendorRow {
    id: Uuid,
    branch_id: Uuid,
    name: String,
    email: Option<String>,
    phone: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<VendorRow> for Vendor {
    fn from(row: VendorRow) -> Self {
        Vendor {
            id: VendorId::from(row.id),
            branch_id: BranchId::from(row.branch_id),
            name: row.name,
            email: row.email,
            phone: row.phone,
            created_at: row.created_at,
        }
    }
}

// ============================================================================
// Port
// ============================================================================

#[async_trait]
impl DirectoryPort for PostgresDirectoryAdapter {
    #[instrument(skip(self, branch), fields(code = %branch.code))]
    async fn insert_branch(&self, branch: Branch) -> Result<Branch, PortError> {
        sqlx::query(
            "INSERT INTO branches (id, code, name, timezone, address, is_active, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(Uuid::from(branch.id))
        .bind(&branch.code)
        .bind(&branch.name)
        .bind(branch.timezone.name())
        .bind(&branch.address)
        .bind(branch.is_active)
        .bind(branch.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| port_err_unique(e, || format!("Branch code {} already exists", branch.code)))?;
        Ok(branch)
    }

    async fn get_branch(&self, id: BranchId) -> Result<Branch, PortError> {
        let sql = format!("SELECT {BRANCH_COLUMNS} FROM branches WHERE id = $1");
        let row = sqlx::query_as::<_, BranchRow>(&sql)
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(port_err)?
            .ok_or_else(|| PortError::not_found("Branch", id))?;
        Ok(Branch::try_from(row)?)
    }

    async fn list_branches(&self, page: PageRequest) -> Result<Page<Branch>, PortError> {
        let (limit, offset) = limit_offset(page);
        let sql = format!("SELECT {BRANCH_COLUMNS} FROM branches ORDER BY code LIMIT $1 OFFSET $2");
        let rows = sqlx::query_as::<_, BranchRow>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(port_err)?;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM branches")
            .fetch_one(&self.pool)
            .await
            .map_err(port_err)?;
        Ok(to_page(convert(rows)?, page, total))
    }

    #[instrument(skip(self, customer), fields(customer_id = %customer.id))]
    async fn insert_customer(&self, customer: Customer) -> Result<Customer, PortError> {
        sqlx::query(
            "INSERT INTO customers (id, branch_id, name, email, phone, company, status, package_id, \
             created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(Uuid::from(customer.id))
        .bind(Uuid::from(customer.branch_id))
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.company)
        .bind(customer.status.as_str())
        .bind(customer.package_id.map(Uuid::from))
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            port_err_unique(e, || format!("Customer email {} already exists", customer.email))
        })?;
        debug!("Customer stored");
        Ok(customer)
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Customer, PortError> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1");
        let row = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(port_err)?
            .ok_or_else(|| PortError::not_found("Customer", id))?;
        Ok(Customer::try_from(row)?)
    }

    async fn list_customers(
        &self,
        query: &CustomerQuery,
        page: PageRequest,
    ) -> Result<Page<Customer>, PortError> {
        let (limit, offset) = limit_offset(page);
        let branch = query.branch_id.map(Uuid::from);
        let status = query.status.map(|s| s.as_str());

        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers {CUSTOMER_FILTER} \
             ORDER BY created_at DESC LIMIT $4 OFFSET $5"
        );
        let rows = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(branch)
            .bind(status)
            .bind(&query.search)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(port_err)?;

        let count_sql = format!("SELECT COUNT(*) FROM customers {CUSTOMER_FILTER}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(branch)
            .bind(status)
            .bind(&query.search)
            .fetch_one(&self.pool)
            .await
            .map_err(port_err)?;
        Ok(to_page(convert(rows)?, page, total))
    }

    #[instrument(skip(self), fields(customer_id = %id, status = %status))]
    async fn update_customer_status(
        &self,
        id: CustomerId,
        status: CustomerStatus,
    ) -> Result<Customer, PortError> {
        let sql = format!(
            "UPDATE customers SET status = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {CUSTOMER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(Uuid::from(id))
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(port_err)?
            .ok_or_else(|| PortError::not_found("Customer", id))?;
        Ok(Customer::try_from(row)?)
    }

    #[instrument(skip(self), fields(customer_id = %id))]
    async fn assign_package(
        &self,
        id: CustomerId,
        package_id: Option<PackageId>,
    ) -> Result<Customer, PortError> {
        let sql = format!(
            "UPDATE customers SET package_id = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {CUSTOMER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(Uuid::from(id))
            .bind(package_id.map(Uuid::from))
            .fetch_optional(&self.pool)
            .await
            .map_err(port_err)?
            .ok_or_else(|| PortError::not_found("Customer", id))?;
        Ok(Customer::try_from(row)?)
    }

    #[instrument(skip(self, employee), fields(employee_id = %employee.id))]
    async fn insert_employee(&self, employee: Employee) -> Result<Employee, PortError> {
        sqlx::query(
            "INSERT INTO employees (id, branch_id, name, email, role, position, is_active, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(Uuid::from(employee.id))
        .bind(Uuid::from(employee.branch_id))
        .bind(&employee.name)
        .bind(&employee.email)
        .bind(employee.role.as_str())
        .bind(&employee.position)
        .bind(employee.is_active)
        .bind(employee.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            port_err_unique(e, || format!("Employee email {} already exists", employee.email))
        })?;
        Ok(employee)
    }

    async fn get_employee(&self, id: EmployeeId) -> Result<Employee, PortError> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = $1");
        let row = sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(port_err)?
            .ok_or_else(|| PortError::not_found("Employee", id))?;
        Ok(Employee::try_from(row)?)
    }

    async fn list_employees(
        &self,
        query: &EmployeeQuery,
        page: PageRequest,
    ) -> Result<Page<Employee>, PortError> {
        let (limit, offset) = limit_offset(page);
        let branch = query.branch_id.map(Uuid::from);
        let filter = "WHERE ($1::uuid IS NULL OR branch_id = $1) \
                      AND ($2::boolean IS NULL OR is_active = $2)";

        let sql = format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees {filter} \
             ORDER BY created_at DESC LIMIT $3 OFFSET $4"
        );
        let rows = sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(branch)
            .bind(query.is_active)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(port_err)?;

        let count_sql = format!("SELECT COUNT(*) FROM employees {filter}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(branch)
            .bind(query.is_active)
            .fetch_one(&self.pool)
            .await
            .map_err(port_err)?;
        Ok(to_page(convert(rows)?, page, total))
    }

    async fn insert_vendor(&self, vendor: Vendor) -> Result<Vendor, PortError> {
        sqlx::query(
            "INSERT INTO vendors (id, branch_id, name, email, phone, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(Uuid::from(vendor.id))
        .bind(Uuid::from(vendor.branch_id))
        .bind(&vendor.name)
        .bind(&vendor.email)
        .bind(&vendor.phone)
        .bind(vendor.created_at)
        .execute(&self.pool)
        .await
        .map_err(port_err)?;
        Ok(vendor)
    }

    async fn get_vendor(&self, id: VendorId) -> Result<Vendor, PortError> {
        let sql = format!("SELECT {VENDOR_COLUMNS} FROM vendors WHERE id = $1");
        let row = sqlx::query_as::<_, VendorRow>(&sql)
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(port_err)?
            .ok_or_else(|| PortError::not_found("Vendor", id))?;
        Ok(row.into())
    }

    async fn list_vendors(
        &self,
        query: &VendorQuery,
        page: PageRequest,
    ) -> Result<Page<Vendor>, PortError> {
        let (limit, offset) = limit_offset(page);
        let branch = query.branch_id.map(Uuid::from);

        let sql = format!(
            "SELECT {VENDOR_COLUMNS} FROM vendors WHERE ($1::uuid IS NULL OR branch_id = $1) \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, VendorRow>(&sql)
            .bind(branch)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(port_err)?;
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM vendors WHERE ($1::uuid IS NULL OR branch_id = $1)")
                .bind(branch)
                .fetch_one(&self.pool)
                .await
                .map_err(port_err)?;
        Ok(to_page(rows.into_iter().map(Vendor::from).collect(), page, total))
    }
}
