//! Directory service
//!
//! Role and branch checks for directory operations, on top of `DirectoryPort`.

use std::sync::Arc;

use tracing::{info, instrument};
use validator::Validate;

use core_kernel::{
    Actor, BranchId, CoreError, CustomerId, EmployeeId, PackageId, Page, PageRequest, Role,
    VendorId,
};

use crate::branch::{Branch, NewBranch};
use crate::customer::{Customer, CustomerStatus, NewCustomer};
use crate::employee::{Employee, NewEmployee};
use crate::error::DirectoryError;
use crate::ports::{CustomerQuery, DirectoryPort, EmployeeQuery, VendorQuery};
use crate::vendor::{NewVendor, Vendor};

/// Application service for branches, customers, employees and vendors
#[derive(Clone)]
pub struct DirectoryService {
    port: Arc<dyn DirectoryPort>,
}

impl DirectoryService {
    pub fn new(port: Arc<dyn DirectoryPort>) -> Self {
        Self { port }
    }

    /// The underlying port, for services that resolve directory records
    pub fn port(&self) -> Arc<dyn DirectoryPort> {
        Arc::clone(&self.port)
    }

    #[instrument(skip(self, actor, input), fields(code = %input.code))]
    pub async fn create_branch(&self, actor: &Actor, input: NewBranch) -> Result<Branch, DirectoryError> {
        actor.require(Role::Admin)?;
        input.validate().map_err(CoreError::from)?;

        let branch = self.port.insert_branch(Branch::create(input)).await?;
        info!(branch_id = %branch.id, code = %branch.code, "Branch created");
        Ok(branch)
    }

    pub async fn get_branch(&self, actor: &Actor, id: BranchId) -> Result<Branch, DirectoryError> {
        actor.ensure_branch(id)?;
        Ok(self.port.get_branch(id).await?)
    }

    pub async fn list_branches(&self, page: PageRequest) -> Result<Page<Branch>, DirectoryError> {
        Ok(self.port.list_branches(page).await?)
    }

    #[instrument(skip(self, actor, input), fields(branch_id = %input.branch_id))]
    pub async fn create_customer(
        &self,
        actor: &Actor,
        input: NewCustomer,
    ) -> Result<Customer, DirectoryError> {
        actor.require(Role::Staff)?;
        input.validate().map_err(CoreError::from)?;
        actor.ensure_branch(input.branch_id)?;
        self.port.get_branch(input.branch_id).await?;

        let customer = self.port.insert_customer(Customer::create(input)).await?;
        info!(customer_id = %customer.id, "Customer registered");
        Ok(customer)
    }

    /// Staff of the customer's branch, or the customer themselves
    pub async fn get_customer(&self, actor: &Actor, id: CustomerId) -> Result<Customer, DirectoryError> {
        let customer = self.port.get_customer(id).await?;
        if actor.role == Role::Customer {
            if actor.customer_id != Some(id) {
                return Err(DirectoryError::Forbidden(
                    "Customers may only view their own account".to_string(),
                ));
            }
        } else {
            actor.ensure_branch(customer.branch_id)?;
        }
        Ok(customer)
    }

    pub async fn list_customers(
        &self,
        actor: &Actor,
        mut query: CustomerQuery,
        page: PageRequest,
    ) -> Result<Page<Customer>, DirectoryError> {
        actor.require(Role::Staff)?;
        query.branch_id = actor.scope_branch(query.branch_id);
        Ok(self.port.list_customers(&query, page).await?)
    }

    /// Locks, unlocks or deactivates a customer account
    #[instrument(skip(self, actor), fields(customer_id = %id, status = %status))]
    pub async fn set_customer_status(
        &self,
        actor: &Actor,
        id: CustomerId,
        status: CustomerStatus,
    ) -> Result<Customer, DirectoryError> {
        actor.require(Role::TeamLead)?;
        let customer = self.port.get_customer(id).await?;
        actor.ensure_branch(customer.branch_id)?;

        let updated = self.port.update_customer_status(id, status).await?;
        info!(customer_id = %id, from = %customer.status, to = %status, "Customer status changed");
        Ok(updated)
    }

    /// Records the customer's package; the caller has already resolved the package
    #[instrument(skip(self, actor), fields(customer_id = %id))]
    pub async fn assign_package(
        &self,
        actor: &Actor,
        id: CustomerId,
        package_id: Option<PackageId>,
    ) -> Result<Customer, DirectoryError> {
        actor.require(Role::TeamLead)?;
        let customer = self.port.get_customer(id).await?;
        actor.ensure_branch(customer.branch_id)?;

        let updated = self.port.assign_package(id, package_id).await?;
        info!(customer_id = %id, package_id = ?package_id, "Package assigned");
        Ok(updated)
    }

    #[instrument(skip(self, actor, input), fields(branch_id = %input.branch_id))]
    pub async fn create_employee(
        &self,
        actor: &Actor,
        input: NewEmployee,
    ) -> Result<Employee, DirectoryError> {
        actor.require(Role::Manager)?;
        input.validate().map_err(CoreError::from)?;
        actor.ensure_branch(input.branch_id)?;
        if input.role > actor.role {
            return Err(DirectoryError::Forbidden(
                "Cannot grant a role above your own".to_string(),
            ));
        }
        self.port.get_branch(input.branch_id).await?;

        let employee = self.port.insert_employee(Employee::create(input)).await?;
        info!(employee_id = %employee.id, "Employee created");
        Ok(employee)
    }

    pub async fn get_employee(&self, actor: &Actor, id: EmployeeId) -> Result<Employee, DirectoryError> {
        actor.require(Role::Staff)?;
        let employee = self.port.get_employee(id).await?;
        actor.ensure_branch(employee.branch_id)?;
        Ok(employee)
    }

    pub async fn list_employees(
        &self,
        actor: &Actor,
        mut query: EmployeeQuery,
        page: PageRequest,
    ) -> Result<Page<Employee>, DirectoryError> {
        actor.require(Role::Staff)?;
        query.branch_id = actor.scope_branch(query.branch_id);
        Ok(self.port.list_employees(&query, page).await?)
    }

    #[instrument(skip(self, actor, input), fields(branch_id = %input.branch_id))]
    pub async fn create_vendor(&self, actor: &Actor, input: NewVendor) -> Result<Vendor, DirectoryError> {
        actor.require(Role::Manager)?;
        input.validate().map_err(CoreError::from)?;
        actor.ensure_branch(input.branch_id)?;
        self.port.get_branch(input.branch_id).await?;

        let vendor = self.port.insert_vendor(Vendor::create(input)).await?;
        info!(vendor_id = %vendor.id, "Vendor created");
        Ok(vendor)
    }

    pub async fn get_vendor(&self, actor: &Actor, id: VendorId) -> Result<Vendor, DirectoryError> {
        actor.require(Role::Staff)?;
        let vendor = self.port.get_vendor(id).await?;
        actor.ensure_branch(vendor.branch_id)?;
        Ok(vendor)
    }

    pub async fn list_vendors(
        &self,
        actor: &Actor,
        mut query: VendorQuery,
        page: PageRequest,
    ) -> Result<Page<Vendor>, DirectoryError> {
        actor.require(Role::Staff)?;
        query.branch_id = actor.scope_branch(query.branch_id);
        Ok(self.port.list_vendors(&query, page).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::memory::MemoryDirectoryPort;
    use core_kernel::{PortError, UserId};

    fn admin() -> Actor {
        Actor::new(UserId::new(), Role::Admin)
    }

    async fn service_with_branch() -> (DirectoryService, Branch) {
        let service = DirectoryService::new(Arc::new(MemoryDirectoryPort::new()));
        let branch = service
            .create_branch(
                &admin(),
                NewBranch {
                    code: "HQ".to_string(),
                    name: "Head Office".to_string(),
                    timezone: Default::default(),
                    address: None,
                },
            )
            .await
            .unwrap();
        (service, branch)
    }

    fn new_customer(branch_id: BranchId, email: &str) -> NewCustomer {
        NewCustomer {
            branch_id,
            name: "Grace Hopper".to_string(),
            email: email.to_string(),
            phone: None,
            company: Some("Navy".to_string()),
            package_id: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let (service, branch) = service_with_branch().await;
        service
            .create_customer(&admin(), new_customer(branch.id, "grace@example.com"))
            .await
            .unwrap();

        let result = service
            .create_customer(&admin(), new_customer(branch.id, "GRACE@example.com"))
            .await;
        assert!(matches!(result, Err(DirectoryError::Port(PortError::Conflict { .. }))));
    }

    #[tokio::test]
    async fn test_lock_requires_team_lead() {
        let (service, branch) = service_with_branch().await;
        let customer = service
            .create_customer(&admin(), new_customer(branch.id, "lock@example.com"))
            .await
            .unwrap();

        let staff = Actor::new(UserId::new(), Role::Staff).in_branch(branch.id);
        let result = service
            .set_customer_status(&staff, customer.id, CustomerStatus::Locked)
            .await;
        assert!(matches!(result, Err(DirectoryError::Forbidden(_))));

        let lead = Actor::new(UserId::new(), Role::TeamLead).in_branch(branch.id);
        let locked = service
            .set_customer_status(&lead, customer.id, CustomerStatus::Locked)
            .await
            .unwrap();
        assert!(locked.is_locked());
    }

    #[tokio::test]
    async fn test_staff_cannot_create_in_other_branch() {
        let (service, branch) = service_with_branch().await;
        let staff = Actor::new(UserId::new(), Role::Staff).in_branch(BranchId::new());

        let result = service
            .create_customer(&staff, new_customer(branch.id, "x@example.com"))
            .await;
        assert!(matches!(result, Err(DirectoryError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_invalid_email_rejected() {
        let (service, branch) = service_with_branch().await;
        let result = service
            .create_customer(&admin(), new_customer(branch.id, "not-an-email"))
            .await;
        match result {
            Err(DirectoryError::Validation(msg)) => assert!(msg.contains("email")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_customer_sees_only_own_account() {
        let (service, branch) = service_with_branch().await;
        let mine = service
            .create_customer(&admin(), new_customer(branch.id, "me@example.com"))
            .await
            .unwrap();
        let theirs = service
            .create_customer(&admin(), new_customer(branch.id, "them@example.com"))
            .await
            .unwrap();

        let me = Actor::new(UserId::new(), Role::Customer)
            .in_branch(branch.id)
            .as_customer(mine.id);
        assert!(service.get_customer(&me, mine.id).await.is_ok());
        assert!(matches!(
            service.get_customer(&me, theirs.id).await,
            Err(DirectoryError::Forbidden(_))
        ));
    }
}
