//! Payroll Domain
//!
//! One payroll record per employee and pay period. Earnings are the base
//! salary plus overtime and bonus; itemised deductions are subtracted to
//! give the net pay:
//!
//! ```text
//! netPay = baseSalary + overtime + bonus - Σ deduction items
//! ```
//!
//! Records move DRAFT → APPROVED → PAID.

pub mod payroll;
pub mod calculator;
pub mod error;
pub mod ports;
pub mod service;

pub use payroll::{NewPayroll, NewPayrollItem, Payroll, PayrollItem, PayrollStatus};
pub use calculator::{PayBreakdown, PayrollCalculator};
pub use error::PayrollError;
pub use ports::{PayrollAction, PayrollPort, PayrollQuery};
#[cfg(any(test, feature = "memory"))]
pub use ports::memory::MemoryPayrollPort;
pub use service::PayrollService;
