//! Payroll DTOs

use serde::Deserialize;

use core_kernel::{BranchId, EmployeeId};
use domain_payroll::{PayrollQuery, PayrollStatus};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollFilter {
    pub branch_id: Option<BranchId>,
    pub employee_id: Option<EmployeeId>,
    pub pay_period: Option<String>,
    pub status: Option<PayrollStatus>,
}

impl From<PayrollFilter> for PayrollQuery {
    fn from(filter: PayrollFilter) -> Self {
        PayrollQuery {
            branch_id: filter.branch_id,
            employee_id: filter.employee_id,
            pay_period: filter.pay_period,
            status: filter.status,
        }
    }
}
