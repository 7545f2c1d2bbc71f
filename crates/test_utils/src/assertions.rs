//! Custom Test Assertions
//!
//! Provides specialized assertion helpers for domain types that give
//! more meaningful error messages than standard assertions.

use rust_decimal::Decimal;

use core_kernel::{round_money, Rate, TimeSlot};
use domain_billing::{Account, BillingDocument, TrialBalance};
use domain_booking::QuotaUsage;
use domain_payroll::Payroll;

/// Asserts that a decimal value is approximately equal to another
pub fn assert_decimal_approx_eq(actual: Decimal, expected: Decimal, tolerance: Decimal) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= tolerance,
        "Decimals differ by more than tolerance: actual={}, expected={}, diff={}, tolerance={}",
        actual,
        expected,
        diff,
        tolerance
    );
}

/// Asserts that an amount is already rounded to cents
pub fn assert_money_rounded(amount: Decimal) {
    assert_eq!(
        round_money(amount),
        amount,
        "Amount {} is not rounded to two decimal places",
        amount
    );
}

/// Asserts that a document's stored totals match its line items and tax rate
pub fn assert_document_totals(document: &BillingDocument) {
    let subtotal: Decimal = document.items.iter().map(|i| i.amount).sum();
    assert_eq!(
        document.subtotal, subtotal,
        "Subtotal {} does not match line items ({})",
        document.subtotal, subtotal
    );

    let tax = Rate::from_percentage(document.tax_rate).apply(document.subtotal);
    assert_eq!(
        document.tax_amount, tax,
        "Tax {} does not match {}% of {}",
        document.tax_amount, document.tax_rate, document.subtotal
    );
    assert_eq!(
        document.total,
        document.subtotal + document.tax_amount,
        "Total {} is not subtotal plus tax",
        document.total
    );
    assert!(
        document.amount_paid <= document.total,
        "Paid {} exceeds total {}",
        document.amount_paid,
        document.total
    );
}

/// Asserts that an account carries the expected running balance
pub fn assert_balance(account: &Account, expected: Decimal) {
    assert_eq!(
        account.balance, expected,
        "Account {} {} has balance {}, expected {}",
        account.code, account.name, account.balance, expected
    );
}

/// Asserts that debits and credits agree
pub fn assert_trial_balance_balanced(trial_balance: &TrialBalance) {
    assert!(
        trial_balance.is_balanced,
        "Trial balance is off: debits={}, credits={}",
        trial_balance.total_debits,
        trial_balance.total_credits
    );
}

/// Asserts that net pay is gross pay less deductions and never negative
pub fn assert_net_pay_consistent(payroll: &Payroll) {
    assert_eq!(
        payroll.net_pay,
        payroll.gross_pay - payroll.deductions,
        "Net pay {} != gross {} - deductions {}",
        payroll.net_pay,
        payroll.gross_pay,
        payroll.deductions
    );
    assert!(!payroll.net_pay.is_sign_negative(), "Net pay {} is negative", payroll.net_pay);
}

/// Asserts that remaining quota equals limit minus usage on both windows
pub fn assert_quota_consistent(usage: &QuotaUsage) {
    assert_eq!(
        usage.daily_remaining_minutes,
        (usage.daily_limit_minutes - usage.daily_used_minutes).max(0),
        "Daily remaining does not match: {:?}",
        usage
    );
    assert_eq!(
        usage.monthly_remaining_minutes,
        (usage.monthly_limit_minutes - usage.monthly_used_minutes).max(0),
        "Monthly remaining does not match: {:?}",
        usage
    );
}

/// Asserts that two slots overlap
pub fn assert_slots_overlap(a: &TimeSlot, b: &TimeSlot) {
    assert!(a.overlaps(b), "Slots {:?} and {:?} do not overlap", a, b);
}

/// Asserts that two slots do not overlap
pub fn assert_slots_disjoint(a: &TimeSlot, b: &TimeSlot) {
    assert!(!a.overlaps(b), "Slots {:?} and {:?} unexpectedly overlap", a, b);
}

/// Asserts that a result is Ok and returns the value
#[macro_export]
macro_rules! assert_ok {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
    ($result:expr, $msg:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("{}: {:?}", $msg, e),
        }
    };
}

/// Asserts that a result is Err and returns the error
#[macro_export]
macro_rules! assert_err {
    ($result:expr) => {
        match $result {
            Ok(value) => panic!("Expected Err, got Ok: {:?}", value),
            Err(e) => e,
        }
    };
    ($result:expr, $msg:expr) => {
        match $result {
            Ok(value) => panic!("{}: got Ok({:?})", $msg, value),
            Err(e) => e,
        }
    };
}

/// Asserts that an error matches a specific variant
#[macro_export]
macro_rules! assert_err_variant {
    ($result:expr, $pattern:pat) => {
        match $result {
            Ok(value) => panic!("Expected Err matching {}, got Ok({:?})", stringify!($pattern), value),
            Err(ref e) => {
                assert!(
                    matches!(e, $pattern),
                    "Error {:?} does not match pattern {}",
                    e,
                    stringify!($pattern)
                );
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TemporalFixtures;
    use rust_decimal_macros::dec;

    #[test]
    fn test_assert_decimal_approx_eq() {
        assert_decimal_approx_eq(dec!(100.001), dec!(100.002), dec!(0.01));
    }

    #[test]
    #[should_panic(expected = "not rounded")]
    fn test_assert_money_rounded_rejects_fractions_of_cents() {
        assert_money_rounded(dec!(10.005));
    }

    #[test]
    fn test_slot_assertions() {
        let morning = TemporalFixtures::morning_hour();
        let afternoon = TemporalFixtures::afternoon_block();
        assert_slots_disjoint(&morning, &afternoon);
        assert_slots_overlap(&morning, &morning);
    }

    #[test]
    fn test_assert_ok_returns_value() {
        let value: Result<u32, String> = Ok(3);
        assert_eq!(assert_ok!(value), 3);
    }
}
