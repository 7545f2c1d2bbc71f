//! Test Data Builders
//!
//! Provides builder patterns for constructing service inputs with sensible
//! defaults. Tests specify only the fields they care about.

use chrono::{Duration, NaiveDate, NaiveTime};
use rust_decimal::Decimal;

use core_kernel::{BranchId, CustomerId, EmployeeId, PackageId, RoomId, Timezone, VendorId};
use domain_billing::{Counterparty, DocumentDraft, LineItemInput};
use domain_booking::BookingRequest;
use domain_directory::{NewBranch, NewCustomer};
use domain_inventory::{InventoryCategory, NewInventoryItem};
use domain_payroll::{NewPayroll, NewPayrollItem};

use crate::fixtures::{AmountFixtures, FakeData, StringFixtures, TemporalFixtures};

/// Builder for branch inputs
pub struct BranchBuilder {
    code: String,
    name: String,
    timezone: Timezone,
    address: Option<String>,
}

impl Default for BranchBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BranchBuilder {
    pub fn new() -> Self {
        Self {
            code: FakeData::code("BR"),
            name: format!("{} Hub", FakeData::company()),
            timezone: TemporalFixtures::utc(),
            address: Some(FakeData::address()),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_timezone(mut self, timezone: Timezone) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn build(self) -> NewBranch {
        NewBranch {
            code: self.code,
            name: self.name,
            timezone: self.timezone,
            address: self.address,
        }
    }
}

/// Builder for customer inputs
pub struct CustomerBuilder {
    branch_id: BranchId,
    name: String,
    email: String,
    company: Option<String>,
    package_id: Option<PackageId>,
}

impl CustomerBuilder {
    pub fn new(branch_id: BranchId) -> Self {
        Self {
            branch_id,
            name: FakeData::name(),
            email: FakeData::email(),
            company: Some(FakeData::company()),
            package_id: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn with_package(mut self, package_id: PackageId) -> Self {
        self.package_id = Some(package_id);
        self
    }

    pub fn build(self) -> NewCustomer {
        NewCustomer {
            branch_id: self.branch_id,
            name: self.name,
            email: self.email,
            phone: Some(FakeData::phone()),
            company: self.company,
            package_id: self.package_id,
        }
    }
}

/// Builder for invoice and bill drafts
///
/// Starts with no line items; call [`DocumentBuilder::with_item`] at least once.
pub struct DocumentBuilder {
    counterparty: Counterparty,
    branch_id: BranchId,
    issue_date: NaiveDate,
    due_date: NaiveDate,
    items: Vec<LineItemInput>,
    tax_rate: Option<Decimal>,
    notes: Option<String>,
}

impl DocumentBuilder {
    pub fn invoice(customer_id: CustomerId, branch_id: BranchId) -> Self {
        Self::with_counterparty(Counterparty::Customer(customer_id), branch_id)
    }

    pub fn bill(vendor_id: VendorId, branch_id: BranchId) -> Self {
        Self::with_counterparty(Counterparty::Vendor(vendor_id), branch_id)
    }

    fn with_counterparty(counterparty: Counterparty, branch_id: BranchId) -> Self {
        let issue_date = TemporalFixtures::reference_date();
        Self {
            counterparty,
            branch_id,
            issue_date,
            due_date: issue_date + Duration::days(30),
            items: Vec::new(),
            tax_rate: None,
            notes: None,
        }
    }

    pub fn with_item(mut self, description: impl Into<String>, quantity: Decimal, unit_price: Decimal) -> Self {
        self.items.push(LineItemInput {
            description: description.into(),
            quantity,
            unit_price,
        });
        self
    }

    /// Adds a single day pass line
    pub fn with_day_pass(self) -> Self {
        self.with_item("Day pass", Decimal::ONE, AmountFixtures::day_pass())
    }

    pub fn with_tax_rate(mut self, percentage: Decimal) -> Self {
        self.tax_rate = Some(percentage);
        self
    }

    pub fn with_dates(mut self, issue_date: NaiveDate, due_date: NaiveDate) -> Self {
        self.issue_date = issue_date;
        self.due_date = due_date;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn build(self) -> DocumentDraft {
        DocumentDraft {
            counterparty: self.counterparty,
            branch_id: self.branch_id,
            issue_date: self.issue_date,
            due_date: self.due_date,
            items: self.items,
            tax_rate: self.tax_rate,
            notes: self.notes,
        }
    }
}

/// Builder for payroll inputs
pub struct PayrollBuilder {
    employee_id: EmployeeId,
    branch_id: BranchId,
    pay_period: String,
    base_salary: Decimal,
    overtime: Option<Decimal>,
    bonus: Option<Decimal>,
    items: Vec<NewPayrollItem>,
}

impl PayrollBuilder {
    pub fn new(employee_id: EmployeeId, branch_id: BranchId) -> Self {
        Self {
            employee_id,
            branch_id,
            pay_period: TemporalFixtures::pay_period().to_string(),
            base_salary: AmountFixtures::base_salary(),
            overtime: None,
            bonus: None,
            items: Vec::new(),
        }
    }

    pub fn with_period(mut self, pay_period: impl Into<String>) -> Self {
        self.pay_period = pay_period.into();
        self
    }

    pub fn with_base_salary(mut self, amount: Decimal) -> Self {
        self.base_salary = amount;
        self
    }

    pub fn with_overtime(mut self, amount: Decimal) -> Self {
        self.overtime = Some(amount);
        self
    }

    pub fn with_bonus(mut self, amount: Decimal) -> Self {
        self.bonus = Some(amount);
        self
    }

    pub fn with_allowance(mut self, description: impl Into<String>, amount: Decimal) -> Self {
        self.items.push(NewPayrollItem {
            description: description.into(),
            amount,
            is_deduction: false,
        });
        self
    }

    pub fn with_deduction(mut self, description: impl Into<String>, amount: Decimal) -> Self {
        self.items.push(NewPayrollItem {
            description: description.into(),
            amount,
            is_deduction: true,
        });
        self
    }

    pub fn build(self) -> NewPayroll {
        NewPayroll {
            employee_id: self.employee_id,
            branch_id: self.branch_id,
            pay_period: self.pay_period,
            base_salary: self.base_salary,
            overtime: self.overtime,
            bonus: self.bonus,
            items: self.items,
            notes: None,
        }
    }
}

/// Builder for room booking requests
pub struct BookingBuilder {
    customer_id: Option<CustomerId>,
    room_id: RoomId,
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    purpose: Option<String>,
}

impl BookingBuilder {
    /// A one hour morning booking on the day after the reference date
    pub fn new(room_id: RoomId) -> Self {
        let slot = TemporalFixtures::morning_hour();
        Self {
            customer_id: None,
            room_id,
            date: TemporalFixtures::next_day(),
            start_time: slot.start,
            end_time: slot.end,
            purpose: None,
        }
    }

    pub fn for_customer(mut self, customer_id: CustomerId) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    /// Sets the slot from `HH:MM` clock times
    pub fn at(mut self, start: (u32, u32), end: (u32, u32)) -> Self {
        self.start_time = TemporalFixtures::time(start.0, start.1);
        self.end_time = TemporalFixtures::time(end.0, end.1);
        self
    }

    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    pub fn build(self) -> BookingRequest {
        BookingRequest {
            customer_id: self.customer_id,
            room_id: self.room_id,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            purpose: self.purpose,
        }
    }
}

/// Builder for inventory item inputs
pub struct InventoryItemBuilder {
    branch_id: BranchId,
    name: String,
    sku: String,
    category: InventoryCategory,
    minimum_stock: i64,
    maximum_stock: Option<i64>,
}

impl InventoryItemBuilder {
    pub fn new(branch_id: BranchId) -> Self {
        Self {
            branch_id,
            name: "Ergonomic chair".to_string(),
            sku: FakeData::code(StringFixtures::sku()),
            category: InventoryCategory::Moveable,
            minimum_stock: 0,
            maximum_stock: None,
        }
    }

    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = sku.into();
        self
    }

    pub fn with_category(mut self, category: InventoryCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_stock_limits(mut self, minimum: i64, maximum: Option<i64>) -> Self {
        self.minimum_stock = minimum;
        self.maximum_stock = maximum;
        self
    }

    pub fn build(self) -> NewInventoryItem {
        NewInventoryItem {
            branch_id: self.branch_id,
            name: self.name,
            sku: self.sku,
            category: self.category,
            unit: "pcs".to_string(),
            minimum_stock: self.minimum_stock,
            maximum_stock: self.maximum_stock,
            current_price: Decimal::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_billing::DocumentKind;
    use rust_decimal_macros::dec;

    #[test]
    fn test_document_builder_sets_counterparty_kind() {
        let branch = BranchId::new();
        let invoice = DocumentBuilder::invoice(CustomerId::new(), branch)
            .with_day_pass()
            .build();
        assert_eq!(invoice.counterparty.kind(), DocumentKind::Invoice);
        assert_eq!(invoice.items.len(), 1);

        let bill = DocumentBuilder::bill(VendorId::new(), branch)
            .with_item("Paper", dec!(5), dec!(4.50))
            .with_tax_rate(dec!(7))
            .build();
        assert_eq!(bill.counterparty.kind(), DocumentKind::Bill);
        assert_eq!(bill.tax_rate, Some(dec!(7)));
    }

    #[test]
    fn test_payroll_builder_splits_items() {
        let payroll = PayrollBuilder::new(EmployeeId::new(), BranchId::new())
            .with_allowance("Transport", dec!(20))
            .with_deduction("Tax", dec!(75))
            .build();
        assert_eq!(payroll.items.len(), 2);
        assert!(payroll.items[1].is_deduction);
        assert_eq!(payroll.pay_period, "2026-03");
    }

    #[test]
    fn test_booking_builder_slot() {
        let request = BookingBuilder::new(RoomId::new()).at((13, 0), (14, 30)).build();
        assert_eq!(request.start_time, TemporalFixtures::time(13, 0));
        assert_eq!(request.end_time, TemporalFixtures::time(14, 30));
        assert!(request.customer_id.is_none());
    }
}
