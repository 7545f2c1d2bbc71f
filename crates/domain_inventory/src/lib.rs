//! Inventory Domain
//!
//! Tracks branch inventory as an append-only log of movements. Each
//! movement adjusts the item's total quantity and the stock held at the
//! named locations:
//!
//! | type          | locations            | item total |
//! |---------------|----------------------|------------|
//! | `in`          | `+q` at to           | `+q`       |
//! | `out`         | `-q` at from         | `-q`       |
//! | `transfer`    | `-q` at from, `+q` at to | unchanged |
//! | `consumption` | `-q` at from         | `-q`       |
//! | `adjustment`  | signed `q` at to (or from) | `+q` |
//!
//! Transfers are a separate approval workflow for moving stock between
//! locations: pending → approved → in_transit → completed, or cancelled.

pub mod item;
pub mod movement;
pub mod stock;
pub mod transfer;
pub mod error;
pub mod ports;
pub mod service;

pub use item::{InventoryCategory, InventoryItem, NewInventoryItem, StockLevel, UpdateInventoryItem};
pub use movement::{Movement, MovementType, RecordMovement, StockDelta};
pub use stock::LocationStock;
pub use transfer::{NewTransfer, Transfer, TransferAction, TransferStatus};
pub use error::InventoryError;
pub use ports::{InventoryPort, ItemQuery, MovementQuery, RecordedMovement, TransferQuery};
#[cfg(any(test, feature = "memory"))]
pub use ports::memory::MemoryInventoryPort;
pub use service::InventoryService;
