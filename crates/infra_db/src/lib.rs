//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the portal, built on SQLx.
//!
//! # Architecture
//!
//! Each domain crate defines a port trait; this crate provides the
//! PostgreSQL adapter for every one of them. Services only ever see the
//! trait objects, so the HTTP layer can run on these adapters or on the
//! in-memory ones without changes.
//!
//! # Consistency
//!
//! - Document and transaction numbers come from PostgreSQL sequences
//! - Payments and status changes lock the affected row `FOR UPDATE`
//! - Bookings serialize per customer and per room on advisory locks
//! - Support records use compare-and-set status updates
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresBillingAdapter};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/portal")).await?;
//! run_migrations(&pool).await?;
//! let billing = PostgresBillingAdapter::new(pool.clone());
//! ```

pub mod pool;
pub mod error;
pub mod adapters;

pub use pool::{create_pool, run_migrations, DatabaseConfig, DatabasePool};
pub use error::DatabaseError;
pub use adapters::{
    PostgresBillingAdapter, PostgresBookingAdapter, PostgresDirectoryAdapter,
    PostgresInventoryAdapter, PostgresPayrollAdapter, PostgresSupportAdapter,
};
