//! Gross and net pay arithmetic

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::payroll::PayrollItem;

/// Amounts derived from a payroll's inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayBreakdown {
    pub gross_pay: Decimal,
    pub deductions: Decimal,
    pub net_pay: Decimal,
}

/// Calculates pay from salary components and items
pub struct PayrollCalculator;

impl PayrollCalculator {
    /// Sums the deduction items; non-deduction items are informational
    pub fn deductions<'a>(items: impl IntoIterator<Item = &'a PayrollItem>) -> Decimal {
        items
            .into_iter()
            .filter(|i| i.is_deduction)
            .map(|i| i.amount)
            .sum()
    }

    pub fn calculate(
        base_salary: Decimal,
        overtime: Decimal,
        bonus: Decimal,
        items: &[PayrollItem],
    ) -> PayBreakdown {
        let gross_pay = base_salary + overtime + bonus;
        let deductions = Self::deductions(items);
        PayBreakdown {
            gross_pay,
            deductions,
            net_pay: gross_pay - deductions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::PayrollItemId;
    use rust_decimal_macros::dec;

    fn item(amount: Decimal, is_deduction: bool) -> PayrollItem {
        PayrollItem {
            id: PayrollItemId::new(),
            description: "line".to_string(),
            amount,
            is_deduction,
        }
    }

    #[test]
    fn test_net_pay() {
        let items = vec![item(dec!(75), true), item(dec!(20), false)];
        let pay = PayrollCalculator::calculate(dec!(1000), dec!(100), dec!(50), &items);

        assert_eq!(pay.gross_pay, dec!(1150));
        assert_eq!(pay.deductions, dec!(75));
        assert_eq!(pay.net_pay, dec!(1075));
    }

    #[test]
    fn test_no_items() {
        let pay = PayrollCalculator::calculate(dec!(800), Decimal::ZERO, Decimal::ZERO, &[]);
        assert_eq!(pay.net_pay, dec!(800));
    }
}
