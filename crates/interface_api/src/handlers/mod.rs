//! Request handlers, one module per area of the portal

pub mod booking;
pub mod directory;
pub mod documents;
pub mod health;
pub mod inventory;
pub mod ledger;
pub mod payroll;
pub mod support;
