//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating random test data
//! that maintains domain invariants.

use chrono::{Duration, NaiveDate, NaiveTime};
use proptest::prelude::*;
use rust_decimal::Decimal;

use core_kernel::{Currency, Role, TimeSlot};
use domain_billing::{LineItemInput, PaymentMethod};
use domain_inventory::{InventoryCategory, MovementType};
use domain_payroll::NewPayrollItem;

/// Strategy for generating supported currencies
pub fn currency_strategy() -> impl Strategy<Value = Currency> {
    prop_oneof![
        Just(Currency::USD),
        Just(Currency::EUR),
        Just(Currency::GBP),
        Just(Currency::INR),
        Just(Currency::SGD),
        Just(Currency::AUD),
        Just(Currency::CAD),
        Just(Currency::AED),
    ]
}

/// Strategy for generating positive amounts with cent precision
pub fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for generating non-negative amounts with cent precision
pub fn non_negative_amount_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for generating tax percentages (0% to 100%, two decimals)
pub fn tax_percentage_strategy() -> impl Strategy<Value = Decimal> {
    (0u32..=10_000u32).prop_map(|n| Decimal::new(i64::from(n), 2))
}

/// Strategy for generating invoice line items
pub fn line_item_strategy() -> impl Strategy<Value = LineItemInput> {
    (1i64..100i64, amount_strategy()).prop_map(|(quantity, unit_price)| LineItemInput {
        description: "Line item".to_string(),
        quantity: Decimal::from(quantity),
        unit_price,
    })
}

/// Strategy for generating between one and `max` line items
pub fn line_items_strategy(max: usize) -> impl Strategy<Value = Vec<LineItemInput>> {
    proptest::collection::vec(line_item_strategy(), 1..=max)
}

pub fn payment_method_strategy() -> impl Strategy<Value = PaymentMethod> {
    prop_oneof![
        Just(PaymentMethod::Cash),
        Just(PaymentMethod::BankTransfer),
        Just(PaymentMethod::Card),
        Just(PaymentMethod::Cheque),
        Just(PaymentMethod::Online),
        Just(PaymentMethod::Other),
    ]
}

/// Strategy for generating payroll items, deductions included
pub fn payroll_item_strategy() -> impl Strategy<Value = NewPayrollItem> {
    (amount_strategy(), any::<bool>()).prop_map(|(amount, is_deduction)| NewPayrollItem {
        description: if is_deduction { "Deduction" } else { "Allowance" }.to_string(),
        amount,
        is_deduction,
    })
}

/// Strategy for generating a slot on a 15 minute grid inside business hours
pub fn time_slot_strategy() -> impl Strategy<Value = TimeSlot> {
    (28u32..76u32, 1u32..=16u32).prop_map(|(start_quarter, quarters)| {
        let start = quarter_time(start_quarter);
        let end = quarter_time((start_quarter + quarters).min(95));
        TimeSlot::new(start, end).expect("generated slot is non-empty")
    })
}

fn quarter_time(quarter: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(quarter / 4, (quarter % 4) * 15, 0).expect("quarter within a day")
}

/// Strategy for generating dates within 2026
pub fn date_2026_strategy() -> impl Strategy<Value = NaiveDate> {
    (0i64..365i64).prop_map(|days| {
        NaiveDate::from_ymd_opt(2026, 1, 1).expect("valid date") + Duration::days(days)
    })
}

pub fn role_strategy() -> impl Strategy<Value = Role> {
    prop_oneof![
        Just(Role::Customer),
        Just(Role::Staff),
        Just(Role::TeamLead),
        Just(Role::Manager),
        Just(Role::Admin),
    ]
}

pub fn inventory_category_strategy() -> impl Strategy<Value = InventoryCategory> {
    prop_oneof![
        Just(InventoryCategory::Fixture),
        Just(InventoryCategory::Moveable),
        Just(InventoryCategory::Consumable),
    ]
}

pub fn movement_type_strategy() -> impl Strategy<Value = MovementType> {
    prop_oneof![
        Just(MovementType::In),
        Just(MovementType::Out),
        Just(MovementType::Transfer),
        Just(MovementType::Adjustment),
        Just(MovementType::Consumption),
    ]
}

/// Strategy for generating positive movement quantities
pub fn quantity_strategy() -> impl Strategy<Value = i64> {
    1i64..1_000i64
}

/// Strategy for generating valid email addresses
pub fn email_strategy() -> impl Strategy<Value = String> {
    ("[a-z]{5,10}", "[a-z]{3,8}")
        .prop_map(|(local, domain)| format!("{}@{}.com", local, domain))
}

/// Strategy for generating names
pub fn name_strategy() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{2,10}".prop_map(|s| s)
}
