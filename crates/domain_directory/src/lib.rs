//! Directory Domain
//!
//! Branches and the people the portal deals with: customers (members who
//! book rooms and receive invoices), employees (who are paid through
//! payroll) and vendors (who send bills).
//!
//! Customer status gates booking: a `LOCKED` customer cannot reserve rooms
//! until a team lead unlocks the account.

pub mod branch;
pub mod customer;
pub mod employee;
pub mod vendor;
pub mod error;
pub mod ports;
pub mod service;

pub use branch::{Branch, NewBranch};
pub use customer::{Customer, CustomerStatus, NewCustomer};
pub use employee::{Employee, NewEmployee};
pub use vendor::{Vendor, NewVendor};
pub use error::DirectoryError;
pub use ports::{DirectoryPort, CustomerQuery, EmployeeQuery, VendorQuery};
#[cfg(any(test, feature = "memory"))]
pub use ports::memory::MemoryDirectoryPort;
pub use service::DirectoryService;
