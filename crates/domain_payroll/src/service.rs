//! Payroll service

use std::sync::Arc;

use tracing::{info, instrument, warn};
use validator::Validate;

use core_kernel::{Actor, CoreError, Page, PageRequest, PayrollId, Role};
use domain_directory::DirectoryPort;

use crate::error::PayrollError;
use crate::payroll::{NewPayroll, Payroll};
use crate::ports::{PayrollAction, PayrollPort, PayrollQuery};

/// Application service for payroll records
///
/// Every payroll operation requires MANAGER or above.
#[derive(Clone)]
pub struct PayrollService {
    port: Arc<dyn PayrollPort>,
    directory: Arc<dyn DirectoryPort>,
}

impl PayrollService {
    pub fn new(port: Arc<dyn PayrollPort>, directory: Arc<dyn DirectoryPort>) -> Self {
        Self { port, directory }
    }

    /// Creates a DRAFT payroll for an employee and pay period
    ///
    /// # Errors
    ///
    /// - `DuplicatePeriod` if the employee already has a record for the period
    /// - `Port(NotFound)` if the employee or branch does not exist
    #[instrument(skip(self, actor, input), fields(employee_id = %input.employee_id, pay_period = %input.pay_period))]
    pub async fn create_payroll(&self, actor: &Actor, input: NewPayroll) -> Result<Payroll, PayrollError> {
        actor.require(Role::Manager)?;
        input.validate().map_err(CoreError::from)?;
        actor.ensure_branch(input.branch_id)?;

        self.directory.get_branch(input.branch_id).await?;
        let employee = self.directory.get_employee(input.employee_id).await?;
        if employee.branch_id != input.branch_id {
            return Err(PayrollError::invalid("Employee does not belong to this branch"));
        }

        let payroll = Payroll::compose(input, actor.user_id)?;
        if self
            .port
            .find_for_period(payroll.employee_id, &payroll.pay_period)
            .await?
            .is_some()
        {
            warn!(employee_id = %payroll.employee_id, pay_period = %payroll.pay_period, "Duplicate payroll rejected");
            return Err(PayrollError::DuplicatePeriod);
        }

        let payroll = self.port.insert_payroll(payroll).await?;
        info!(
            payroll_id = %payroll.id,
            net_pay = %payroll.net_pay,
            "Payroll created"
        );
        Ok(payroll)
    }

    pub async fn get_payroll(&self, actor: &Actor, id: PayrollId) -> Result<Payroll, PayrollError> {
        actor.require(Role::Manager)?;
        let payroll = self.port.get_payroll(id).await?;
        actor.ensure_branch(payroll.branch_id)?;
        Ok(payroll)
    }

    pub async fn list_payrolls(
        &self,
        actor: &Actor,
        mut query: PayrollQuery,
        page: PageRequest,
    ) -> Result<Page<Payroll>, PayrollError> {
        actor.require(Role::Manager)?;
        query.branch_id = actor.scope_branch(query.branch_id);
        Ok(self.port.list_payrolls(&query, page).await?)
    }

    #[instrument(skip(self, actor), fields(payroll_id = %id))]
    pub async fn approve_payroll(&self, actor: &Actor, id: PayrollId) -> Result<Payroll, PayrollError> {
        self.transition(actor, id, PayrollAction::Approve(actor.user_id)).await
    }

    #[instrument(skip(self, actor), fields(payroll_id = %id))]
    pub async fn mark_paid(&self, actor: &Actor, id: PayrollId) -> Result<Payroll, PayrollError> {
        self.transition(actor, id, PayrollAction::MarkPaid).await
    }

    async fn transition(
        &self,
        actor: &Actor,
        id: PayrollId,
        action: PayrollAction,
    ) -> Result<Payroll, PayrollError> {
        let current = self.get_payroll(actor, id).await?;
        let mut preview = current.clone();
        let checked = match action {
            PayrollAction::Approve(by) => preview.approve(by),
            PayrollAction::MarkPaid => preview.mark_paid(chrono::Utc::now()),
        };
        if let Err(e) = checked {
            warn!(payroll_id = %id, error = %e, "Payroll transition rejected");
            return Err(e);
        }

        let payroll = self.port.transition_payroll(id, action).await?;
        info!(payroll_id = %id, status = %payroll.status, "Payroll status changed");
        Ok(payroll)
    }
}
