//! Directory Domain Ports
//!
//! `DirectoryPort` is what the directory needs from its data source. The
//! PostgreSQL adapter lives in `infra_db`; the in-memory adapter below backs
//! unit tests and the `memory` storage mode of the API server.
//!
//! Other domains (billing, payroll, booking) resolve customers, employees,
//! vendors and branches through this port rather than reaching into tables.

use async_trait::async_trait;

use core_kernel::{
    BranchId, CustomerId, DomainPort, EmployeeId, HealthCheckable, Page, PageRequest,
    PackageId, PortError, VendorId,
};

use crate::branch::Branch;
use crate::customer::{Customer, CustomerStatus};
use crate::employee::Employee;
use crate::vendor::Vendor;

/// Filters for listing customers
#[derive(Debug, Clone, Default)]
pub struct CustomerQuery {
    pub branch_id: Option<BranchId>,
    pub status: Option<CustomerStatus>,
    /// Case-insensitive match against name or email
    pub search: Option<String>,
}

impl CustomerQuery {
    pub fn matches(&self, customer: &Customer) -> bool {
        if let Some(branch_id) = self.branch_id {
            if customer.branch_id != branch_id {
                return false;
            }
        }
        if let Some(status) = self.status {
            if customer.status != status {
                return false;
            }
        }
        if let Some(ref search) = self.search {
            let needle = search.to_lowercase();
            if !customer.name.to_lowercase().contains(&needle)
                && !customer.email.contains(&needle)
            {
                return false;
            }
        }
        true
    }
}

/// Filters for listing employees
#[derive(Debug, Clone, Default)]
pub struct EmployeeQuery {
    pub branch_id: Option<BranchId>,
    pub is_active: Option<bool>,
}

/// Filters for listing vendors
#[derive(Debug, Clone, Default)]
pub struct VendorQuery {
    pub branch_id: Option<BranchId>,
}

/// The port trait for directory operations
///
/// Inserts report duplicate codes and emails as `PortError::Conflict`;
/// lookups of unknown ids report `PortError::NotFound`.
#[async_trait]
pub trait DirectoryPort: DomainPort + HealthCheckable {
    // ========================================================================
    // Branches
    // ========================================================================

    async fn insert_branch(&self, branch: Branch) -> Result<Branch, PortError>;

    async fn get_branch(&self, id: BranchId) -> Result<Branch, PortError>;

    async fn list_branches(&self, page: PageRequest) -> Result<Page<Branch>, PortError>;

    // ========================================================================
    // Customers
    // ========================================================================

    async fn insert_customer(&self, customer: Customer) -> Result<Customer, PortError>;

    async fn get_customer(&self, id: CustomerId) -> Result<Customer, PortError>;

    async fn list_customers(
        &self,
        query: &CustomerQuery,
        page: PageRequest,
    ) -> Result<Page<Customer>, PortError>;

    async fn update_customer_status(
        &self,
        id: CustomerId,
        status: CustomerStatus,
    ) -> Result<Customer, PortError>;

    /// Sets or clears the customer's package
    async fn assign_package(
        &self,
        id: CustomerId,
        package_id: Option<PackageId>,
    ) -> Result<Customer, PortError>;

    // ========================================================================
    // Employees and vendors
    // ========================================================================

    async fn insert_employee(&self, employee: Employee) -> Result<Employee, PortError>;

    async fn get_employee(&self, id: EmployeeId) -> Result<Employee, PortError>;

    async fn list_employees(
        &self,
        query: &EmployeeQuery,
        page: PageRequest,
    ) -> Result<Page<Employee>, PortError>;

    async fn insert_vendor(&self, vendor: Vendor) -> Result<Vendor, PortError>;

    async fn get_vendor(&self, id: VendorId) -> Result<Vendor, PortError>;

    async fn list_vendors(
        &self,
        query: &VendorQuery,
        page: PageRequest,
    ) -> Result<Page<Vendor>, PortError>;
}

/// In-memory implementation for tests and the `memory` storage mode
#[cfg(any(test, feature = "memory"))]
pub mod memory {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use core_kernel::HealthCheckResult;

    #[derive(Debug, Default)]
    struct DirectoryState {
        branches: HashMap<BranchId, Branch>,
        customers: HashMap<CustomerId, Customer>,
        employees: HashMap<EmployeeId, Employee>,
        vendors: HashMap<VendorId, Vendor>,
    }

    /// In-memory directory
    #[derive(Debug, Default, Clone)]
    pub struct MemoryDirectoryPort {
        state: Arc<RwLock<DirectoryState>>,
    }

    impl MemoryDirectoryPort {
        pub fn new() -> Self {
            Self::default()
        }
    }

    /// Sorts newest first, then pages
    fn page_of<T: Clone, K: Ord>(
        mut items: Vec<T>,
        key: impl Fn(&T) -> K,
        page: PageRequest,
    ) -> Page<T> {
        items.sort_by(|a, b| key(b).cmp(&key(a)));
        page.slice(&items)
    }

    impl DomainPort for MemoryDirectoryPort {}

    #[async_trait]
    impl HealthCheckable for MemoryDirectoryPort {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("memory-directory")
        }
    }

    #[async_trait]
    impl DirectoryPort for MemoryDirectoryPort {
        async fn insert_branch(&self, branch: Branch) -> Result<Branch, PortError> {
            let mut state = self.state.write().await;
            if state.branches.values().any(|b| b.code == branch.code) {
                return Err(PortError::conflict(format!(
                    "Branch code {} already exists",
                    branch.code
                )));
            }
            state.branches.insert(branch.id, branch.clone());
            Ok(branch)
        }

        async fn get_branch(&self, id: BranchId) -> Result<Branch, PortError> {
            self.state
                .read()
                .await
                .branches
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Branch", id))
        }

        async fn list_branches(&self, page: PageRequest) -> Result<Page<Branch>, PortError> {
            let state = self.state.read().await;
            let mut branches: Vec<Branch> = state.branches.values().cloned().collect();
            branches.sort_by(|a, b| a.code.cmp(&b.code));
            Ok(page.slice(&branches))
        }

        async fn insert_customer(&self, customer: Customer) -> Result<Customer, PortError> {
            let mut state = self.state.write().await;
            if state.customers.values().any(|c| c.email == customer.email) {
                return Err(PortError::conflict(format!(
                    "Customer email {} already exists",
                    customer.email
                )));
            }
            state.customers.insert(customer.id, customer.clone());
            Ok(customer)
        }

        async fn get_customer(&self, id: CustomerId) -> Result<Customer, PortError> {
            self.state
                .read()
                .await
                .customers
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Customer", id))
        }

        async fn list_customers(
            &self,
            query: &CustomerQuery,
            page: PageRequest,
        ) -> Result<Page<Customer>, PortError> {
            let state = self.state.read().await;
            let customers = state
                .customers
                .values()
                .filter(|c| query.matches(c))
                .cloned()
                .collect();
            Ok(page_of(customers, |c: &Customer| c.created_at, page))
        }

        async fn update_customer_status(
            &self,
            id: CustomerId,
            status: CustomerStatus,
        ) -> Result<Customer, PortError> {
            let mut state = self.state.write().await;
            let customer = state
                .customers
                .get_mut(&id)
                .ok_or_else(|| PortError::not_found("Customer", id))?;
            customer.status = status;
            customer.updated_at = Utc::now();
            Ok(customer.clone())
        }

        async fn assign_package(
            &self,
            id: CustomerId,
            package_id: Option<PackageId>,
        ) -> Result<Customer, PortError> {
            let mut state = self.state.write().await;
            let customer = state
                .customers
                .get_mut(&id)
                .ok_or_else(|| PortError::not_found("Customer", id))?;
            customer.package_id = package_id;
            customer.updated_at = Utc::now();
            Ok(customer.clone())
        }

        async fn insert_employee(&self, employee: Employee) -> Result<Employee, PortError> {
            let mut state = self.state.write().await;
            if state.employees.values().any(|e| e.email == employee.email) {
                return Err(PortError::conflict(format!(
                    "Employee email {} already exists",
                    employee.email
                )));
            }
            state.employees.insert(employee.id, employee.clone());
            Ok(employee)
        }

        async fn get_employee(&self, id: EmployeeId) -> Result<Employee, PortError> {
            self.state
                .read()
                .await
                .employees
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Employee", id))
        }

        async fn list_employees(
            &self,
            query: &EmployeeQuery,
            page: PageRequest,
        ) -> Result<Page<Employee>, PortError> {
            let state = self.state.read().await;
            let employees = state
                .employees
                .values()
                .filter(|e| query.branch_id.map_or(true, |b| e.branch_id == b))
                .filter(|e| query.is_active.map_or(true, |a| e.is_active == a))
                .cloned()
                .collect();
            Ok(page_of(employees, |e: &Employee| e.created_at, page))
        }

        async fn insert_vendor(&self, vendor: Vendor) -> Result<Vendor, PortError> {
            self.state.write().await.vendors.insert(vendor.id, vendor.clone());
            Ok(vendor)
        }

        async fn get_vendor(&self, id: VendorId) -> Result<Vendor, PortError> {
            self.state
                .read()
                .await
                .vendors
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Vendor", id))
        }

        async fn list_vendors(
            &self,
            query: &VendorQuery,
            page: PageRequest,
        ) -> Result<Page<Vendor>, PortError> {
            let state = self.state.read().await;
            let vendors = state
                .vendors
                .values()
                .filter(|v| query.branch_id.map_or(true, |b| v.branch_id == b))
                .cloned()
                .collect();
            Ok(page_of(vendors, |v: &Vendor| v.created_at, page))
        }
    }
}
