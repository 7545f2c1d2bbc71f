//! Payroll Domain Ports
//!
//! `insert_payroll` stores the header and its items as one unit and reports
//! a second record for the same employee and pay period as
//! `PortError::Conflict`. The PostgreSQL adapter backs this with a unique
//! constraint on `(employee_id, pay_period)`.

use async_trait::async_trait;

use core_kernel::{
    BranchId, DomainPort, EmployeeId, HealthCheckable, Page, PageRequest, PayrollId, PortError,
    UserId,
};

use crate::payroll::{Payroll, PayrollStatus};

/// Filters for listing payroll records
#[derive(Debug, Clone, Default)]
pub struct PayrollQuery {
    pub branch_id: Option<BranchId>,
    pub employee_id: Option<EmployeeId>,
    pub pay_period: Option<String>,
    pub status: Option<PayrollStatus>,
}

impl PayrollQuery {
    pub fn matches(&self, payroll: &Payroll) -> bool {
        self.branch_id.map_or(true, |b| payroll.branch_id == b)
            && self.employee_id.map_or(true, |e| payroll.employee_id == e)
            && self
                .pay_period
                .as_deref()
                .map_or(true, |p| payroll.pay_period == p)
            && self.status.map_or(true, |s| payroll.status == s)
    }
}

/// Status changes applied by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayrollAction {
    Approve(UserId),
    MarkPaid,
}

#[async_trait]
pub trait PayrollPort: DomainPort + HealthCheckable {
    async fn insert_payroll(&self, payroll: Payroll) -> Result<Payroll, PortError>;

    async fn get_payroll(&self, id: PayrollId) -> Result<Payroll, PortError>;

    async fn find_for_period(
        &self,
        employee_id: EmployeeId,
        pay_period: &str,
    ) -> Result<Option<Payroll>, PortError>;

    async fn list_payrolls(
        &self,
        query: &PayrollQuery,
        page: PageRequest,
    ) -> Result<Page<Payroll>, PortError>;

    /// Applies a status change under the record's lock
    async fn transition_payroll(
        &self,
        id: PayrollId,
        action: PayrollAction,
    ) -> Result<Payroll, PortError>;
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

    /// In-memory payroll store
    #[derive(Debug, Default, Clone)]
    pub struct MemoryPayrollPort {
        payrolls: Arc<RwLock<HashMap<PayrollId, Payroll>>>,
    }

    impl MemoryPayrollPort {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl DomainPort for MemoryPayrollPort {}

    #[async_trait]
    impl HealthCheckable for MemoryPayrollPort {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("memory-payroll")
        }
    }

    #[async_trait]
    impl PayrollPort for MemoryPayrollPort {
        async fn insert_payroll(&self, payroll: Payroll) -> Result<Payroll, PortError> {
            let mut payrolls = self.payrolls.write().await;
            let duplicate = payrolls
                .values()
                .any(|p| p.employee_id == payroll.employee_id && p.pay_period == payroll.pay_period);
            if duplicate {
                return Err(PortError::conflict(
                    "Payroll already exists for this employee and pay period",
                ));
            }
            payrolls.insert(payroll.id, payroll.clone());
            Ok(payroll)
        }

        async fn get_payroll(&self, id: PayrollId) -> Result<Payroll, PortError> {
            self.payrolls
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Payroll", id))
        }

        async fn find_for_period(
            &self,
            employee_id: EmployeeId,
            pay_period: &str,
        ) -> Result<Option<Payroll>, PortError> {
            Ok(self
                .payrolls
                .read()
                .await
                .values()
                .find(|p| p.employee_id == employee_id && p.pay_period == pay_period)
                .cloned())
        }

        async fn list_payrolls(
            &self,
            query: &PayrollQuery,
            page: PageRequest,
        ) -> Result<Page<Payroll>, PortError> {
            let payrolls = self.payrolls.read().await;
            let mut matching: Vec<Payroll> =
                payrolls.values().filter(|p| query.matches(p)).cloned().collect();
            matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(page.slice(&matching))
        }

        async fn transition_payroll(
            &self,
            id: PayrollId,
            action: PayrollAction,
        ) -> Result<Payroll, PortError> {
            let mut payrolls = self.payrolls.write().await;
            let payroll = payrolls
                .get_mut(&id)
                .ok_or_else(|| PortError::not_found("Payroll", id))?;
            let mut updated = payroll.clone();
            match action {
                PayrollAction::Approve(by) => updated.approve(by)?,
                PayrollAction::MarkPaid => updated.mark_paid(Utc::now())?,
            }
            *payroll = updated.clone();
            Ok(updated)
        }
    }
}
