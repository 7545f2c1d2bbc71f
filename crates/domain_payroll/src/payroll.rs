//! Payroll records

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use core_kernel::{BranchId, CoreError, EmployeeId, PayrollId, PayrollItemId, UserId};

use crate::calculator::PayrollCalculator;
use crate::error::PayrollError;

/// Payroll status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayrollStatus {
    Draft,
    Approved,
    Paid,
}

impl PayrollStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayrollStatus::Draft => "DRAFT",
            PayrollStatus::Approved => "APPROVED",
            PayrollStatus::Paid => "PAID",
        }
    }
}

impl fmt::Display for PayrollStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PayrollStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(PayrollStatus::Draft),
            "APPROVED" => Ok(PayrollStatus::Approved),
            "PAID" => Ok(PayrollStatus::Paid),
            other => Err(CoreError::validation(format!("Unknown payroll status: {}", other))),
        }
    }
}

/// An earning or deduction line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollItem {
    pub id: PayrollItemId,
    pub description: String,
    pub amount: Decimal,
    pub is_deduction: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewPayrollItem {
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub description: String,
    pub amount: Decimal,
    #[serde(default)]
    pub is_deduction: bool,
}

/// Input for creating a payroll record
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewPayroll {
    pub employee_id: EmployeeId,
    pub branch_id: BranchId,
    /// Free-form period label, e.g. `2024-01`
    #[validate(length(min = 1, max = 50, message = "must be 1-50 characters"))]
    pub pay_period: String,
    pub base_salary: Decimal,
    #[serde(default)]
    pub overtime: Option<Decimal>,
    #[serde(default)]
    pub bonus: Option<Decimal>,
    #[serde(default)]
    #[validate(nested)]
    pub items: Vec<NewPayrollItem>,
    pub notes: Option<String>,
}

/// A payroll record for one employee and pay period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payroll {
    pub id: PayrollId,
    pub employee_id: EmployeeId,
    pub branch_id: BranchId,
    pub pay_period: String,
    pub base_salary: Decimal,
    pub overtime: Decimal,
    pub bonus: Decimal,
    pub gross_pay: Decimal,
    pub deductions: Decimal,
    pub net_pay: Decimal,
    pub status: PayrollStatus,
    pub items: Vec<PayrollItem>,
    pub notes: Option<String>,
    pub created_by: UserId,
    pub approved_by: Option<UserId>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn non_negative(value: Decimal, field: &str) -> Result<Decimal, PayrollError> {
    if value.is_sign_negative() {
        return Err(PayrollError::invalid(format!("{} cannot be negative", field)));
    }
    Ok(value)
}

impl Payroll {
    /// Builds a DRAFT payroll with derived gross, deductions and net pay
    pub fn compose(input: NewPayroll, created_by: UserId) -> Result<Self, PayrollError> {
        let pay_period = input.pay_period.trim().to_string();
        if pay_period.is_empty() {
            return Err(PayrollError::invalid("Missing required fields"));
        }
        let base_salary = non_negative(input.base_salary, "Base salary")?;
        let overtime = non_negative(input.overtime.unwrap_or(Decimal::ZERO), "Overtime")?;
        let bonus = non_negative(input.bonus.unwrap_or(Decimal::ZERO), "Bonus")?;

        let items = input
            .items
            .into_iter()
            .map(|item| {
                Ok(PayrollItem {
                    id: PayrollItemId::new_v7(),
                    description: item.description.trim().to_string(),
                    amount: non_negative(item.amount, "Item amount")?,
                    is_deduction: item.is_deduction,
                })
            })
            .collect::<Result<Vec<_>, PayrollError>>()?;

        let pay = PayrollCalculator::calculate(base_salary, overtime, bonus, &items);
        let now = Utc::now();

        Ok(Self {
            id: PayrollId::new_v7(),
            employee_id: input.employee_id,
            branch_id: input.branch_id,
            pay_period,
            base_salary,
            overtime,
            bonus,
            gross_pay: pay.gross_pay,
            deductions: pay.deductions,
            net_pay: pay.net_pay,
            status: PayrollStatus::Draft,
            items,
            notes: input.notes,
            created_by,
            approved_by: None,
            paid_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// DRAFT → APPROVED
    pub fn approve(&mut self, approver: UserId) -> Result<(), PayrollError> {
        if self.status != PayrollStatus::Draft {
            return Err(PayrollError::InvalidState(format!(
                "Only draft payrolls can be approved, payroll is {}",
                self.status
            )));
        }
        self.status = PayrollStatus::Approved;
        self.approved_by = Some(approver);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// APPROVED → PAID
    pub fn mark_paid(&mut self, at: DateTime<Utc>) -> Result<(), PayrollError> {
        if self.status != PayrollStatus::Approved {
            return Err(PayrollError::InvalidState(format!(
                "Only approved payrolls can be paid, payroll is {}",
                self.status
            )));
        }
        self.status = PayrollStatus::Paid;
        self.paid_at = Some(at);
        self.updated_at = at;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn input() -> NewPayroll {
        NewPayroll {
            employee_id: EmployeeId::new(),
            branch_id: BranchId::new(),
            pay_period: "2024-01".to_string(),
            base_salary: dec!(1000),
            overtime: Some(dec!(100)),
            bonus: Some(dec!(50)),
            items: vec![NewPayrollItem {
                description: "Pension".to_string(),
                amount: dec!(75),
                is_deduction: true,
            }],
            notes: None,
        }
    }

    #[test]
    fn test_compose() {
        let payroll = Payroll::compose(input(), UserId::new()).unwrap();
        assert_eq!(payroll.gross_pay, dec!(1150));
        assert_eq!(payroll.net_pay, dec!(1075));
        assert_eq!(payroll.status, PayrollStatus::Draft);
    }

    #[test]
    fn test_negative_amounts_rejected() {
        let mut bad = input();
        bad.bonus = Some(dec!(-1));
        assert!(matches!(Payroll::compose(bad, UserId::new()), Err(PayrollError::Validation(_))));

        let mut bad_item = input();
        bad_item.items[0].amount = dec!(-5);
        assert!(Payroll::compose(bad_item, UserId::new()).is_err());
    }

    #[test]
    fn test_lifecycle() {
        let mut payroll = Payroll::compose(input(), UserId::new()).unwrap();
        assert!(payroll.mark_paid(Utc::now()).is_err());

        payroll.approve(UserId::new()).unwrap();
        assert!(payroll.approve(UserId::new()).is_err());

        payroll.mark_paid(Utc::now()).unwrap();
        assert_eq!(payroll.status, PayrollStatus::Paid);
        assert!(payroll.paid_at.is_some());
    }
}
