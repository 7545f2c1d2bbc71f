//! Core Kernel - Foundational types and utilities for the coworking portal
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Strongly-typed identifiers
//! - Currency formatting and percentage rates over `rust_decimal`
//! - Clock-time slots, month windows and branch timezones
//! - Roles, actors and pagination shared by every port
//! - The `PortError` contract implemented by storage adapters

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod access;
pub mod page;
pub mod ports;
pub mod error;

pub use money::{Currency, Rate, MoneyError, round_money};
pub use temporal::{Timezone, TimeSlot, DateRange, MonthWindow, TemporalError};
pub use identifiers::{
    AccountId, TransactionId, DocumentId, PaymentId, PayrollId, PayrollItemId,
    BranchId, CustomerId, EmployeeId, VendorId, UserId, RoomId, PackageId, BookingId,
    InventoryItemId, MovementId, TransferId, ComplaintId, TaskId, ContractId,
    NotificationId, LineItemId,
};
pub use access::{Role, Actor};
pub use page::{PageRequest, Page, PageInfo};
pub use ports::{
    PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth,
};
pub use error::CoreError;
