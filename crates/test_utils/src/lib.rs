//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! coworking portal test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built test data and callers at each role
//! - `builders`: Builder patterns for service inputs
//! - `portal`: Every service wired over in-memory storage
//! - `database`: PostgreSQL container management
//! - `assertions`: Custom assertion helpers for domain types
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod portal;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use portal::TestPortal;
pub use database::*;
pub use assertions::*;
pub use generators::*;
