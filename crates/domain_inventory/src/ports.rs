//! Inventory Domain Ports
//!
//! `record_movement` appends the movement and applies its deltas to the
//! item total and to per-location stock as one atomic unit.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{
    BranchId, DomainPort, HealthCheckable, InventoryItemId, Page, PageRequest, PortError,
    TransferId, UserId,
};

use crate::item::{InventoryCategory, InventoryItem};
use crate::movement::{Movement, MovementType};
use crate::stock::LocationStock;
use crate::transfer::{Transfer, TransferAction, TransferStatus};

/// Filters for listing items
#[derive(Debug, Clone, Default)]
pub struct ItemQuery {
    pub branch_id: Option<BranchId>,
    pub category: Option<InventoryCategory>,
    /// Only items at or below their minimum stock
    pub low_stock: bool,
    pub include_inactive: bool,
    /// Case-insensitive match against name or SKU
    pub search: Option<String>,
}

impl ItemQuery {
    pub fn matches(&self, item: &InventoryItem) -> bool {
        if !self.include_inactive && !item.is_active {
            return false;
        }
        if self.low_stock && !item.is_low_stock() {
            return false;
        }
        if let Some(ref search) = self.search {
            let needle = search.to_lowercase();
            if !item.name.to_lowercase().contains(&needle)
                && !item.sku.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        self.branch_id.map_or(true, |b| item.branch_id == b)
            && self.category.map_or(true, |c| item.category == c)
    }
}

/// Filters for listing movements
#[derive(Debug, Clone, Default)]
pub struct MovementQuery {
    pub branch_id: Option<BranchId>,
    pub item_id: Option<InventoryItemId>,
    pub movement_type: Option<MovementType>,
}

impl MovementQuery {
    pub fn matches(&self, movement: &Movement) -> bool {
        self.branch_id.map_or(true, |b| movement.branch_id == b)
            && self.item_id.map_or(true, |i| movement.item_id == i)
            && self.movement_type.map_or(true, |t| movement.movement_type == t)
    }
}

/// Filters for listing transfers
#[derive(Debug, Clone, Default)]
pub struct TransferQuery {
    pub branch_id: Option<BranchId>,
    pub item_id: Option<InventoryItemId>,
    pub status: Option<TransferStatus>,
}

impl TransferQuery {
    pub fn matches(&self, transfer: &Transfer) -> bool {
        self.branch_id.map_or(true, |b| transfer.branch_id == b)
            && self.item_id.map_or(true, |i| transfer.item_id == i)
            && self.status.map_or(true, |s| transfer.status == s)
    }
}

/// Result of an atomic movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedMovement {
    pub movement: Movement,
    pub item: InventoryItem,
    /// Stock rows touched by the movement, after the change
    pub stock: Vec<LocationStock>,
}

#[async_trait]
pub trait InventoryPort: DomainPort + HealthCheckable {
    /// Reports a SKU already used in the branch as `PortError::Conflict`
    async fn insert_item(&self, item: InventoryItem) -> Result<InventoryItem, PortError>;

    async fn get_item(&self, id: InventoryItemId) -> Result<InventoryItem, PortError>;

    async fn list_items(
        &self,
        query: &ItemQuery,
        page: PageRequest,
    ) -> Result<Page<InventoryItem>, PortError>;

    /// Saves descriptive fields and thresholds; quantity is left untouched
    async fn update_item(&self, item: InventoryItem) -> Result<InventoryItem, PortError>;

    async fn record_movement(&self, movement: Movement) -> Result<RecordedMovement, PortError>;

    async fn list_movements(
        &self,
        query: &MovementQuery,
        page: PageRequest,
    ) -> Result<Page<Movement>, PortError>;

    async fn item_stock(&self, item_id: InventoryItemId) -> Result<Vec<LocationStock>, PortError>;

    async fn insert_transfer(&self, transfer: Transfer) -> Result<Transfer, PortError>;

    async fn get_transfer(&self, id: TransferId) -> Result<Transfer, PortError>;

    async fn list_transfers(
        &self,
        query: &TransferQuery,
        page: PageRequest,
    ) -> Result<Page<Transfer>, PortError>;

    async fn advance_transfer(
        &self,
        id: TransferId,
        action: TransferAction,
        by: UserId,
        at: DateTime<Utc>,
    ) -> Result<Transfer, PortError>;
}

/// In-memory implementation for tests and the `memory` storage mode
#[cfg(any(test, feature = "memory"))]
pub mod memory {
    use super::*;
    use std::collections::{BTreeMap, HashMap};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use core_kernel::HealthCheckResult;

    #[derive(Debug, Default)]
    struct InventoryState {
        items: HashMap<InventoryItemId, InventoryItem>,
        movements: Vec<Movement>,
        stock: BTreeMap<(InventoryItemId, String), LocationStock>,
        transfers: HashMap<TransferId, Transfer>,
    }

    /// In-memory inventory store
    #[derive(Debug, Default, Clone)]
    pub struct MemoryInventoryPort {
        state: Arc<RwLock<InventoryState>>,
    }

    impl MemoryInventoryPort {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl DomainPort for MemoryInventoryPort {}

    #[async_trait]
    impl HealthCheckable for MemoryInventoryPort {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("memory-inventory")
        }
    }

    fn sku_taken(state: &InventoryState, item: &InventoryItem) -> bool {
        state
            .items
            .values()
            .any(|i| i.id != item.id && i.branch_id == item.branch_id && i.sku == item.sku)
    }

    #[async_trait]
    impl InventoryPort for MemoryInventoryPort {
        async fn insert_item(&self, item: InventoryItem) -> Result<InventoryItem, PortError> {
            let mut state = self.state.write().await;
            if sku_taken(&state, &item) {
                return Err(PortError::conflict(format!("SKU {} already exists", item.sku)));
            }
            state.items.insert(item.id, item.clone());
            Ok(item)
        }

        async fn get_item(&self, id: InventoryItemId) -> Result<InventoryItem, PortError> {
            self.state
                .read()
                .await
                .items
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("InventoryItem", id))
        }

        async fn list_items(
            &self,
            query: &ItemQuery,
            page: PageRequest,
        ) -> Result<Page<InventoryItem>, PortError> {
            let state = self.state.read().await;
            let mut items: Vec<InventoryItem> =
                state.items.values().filter(|i| query.matches(i)).cloned().collect();
            items.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(page.slice(&items))
        }

        async fn update_item(&self, item: InventoryItem) -> Result<InventoryItem, PortError> {
            let mut state = self.state.write().await;
            if sku_taken(&state, &item) {
                return Err(PortError::conflict(format!("SKU {} already exists", item.sku)));
            }
            let stored = state
                .items
                .get_mut(&item.id)
                .ok_or_else(|| PortError::not_found("InventoryItem", item.id))?;
            let quantity = stored.quantity;
            *stored = InventoryItem { quantity, ..item };
            Ok(stored.clone())
        }

        async fn record_movement(&self, movement: Movement) -> Result<RecordedMovement, PortError> {
            let mut state = self.state.write().await;
            let item = state
                .items
                .get_mut(&movement.item_id)
                .ok_or_else(|| PortError::not_found("InventoryItem", movement.item_id))?;
            item.quantity += movement.item_delta();
            item.updated_at = movement.created_at;
            let item = item.clone();

            let mut stock = Vec::new();
            for delta in movement.stock_deltas() {
                let row = state
                    .stock
                    .entry((movement.item_id, delta.location.clone()))
                    .or_insert_with(|| LocationStock::empty(movement.item_id, delta.location.clone()));
                row.apply(&delta);
                stock.push(row.clone());
            }
            state.movements.push(movement.clone());

            Ok(RecordedMovement {
                movement,
                item,
                stock,
            })
        }

        async fn list_movements(
            &self,
            query: &MovementQuery,
            page: PageRequest,
        ) -> Result<Page<Movement>, PortError> {
            let state = self.state.read().await;
            let movements: Vec<Movement> = state
                .movements
                .iter()
                .rev()
                .filter(|m| query.matches(m))
                .cloned()
                .collect();
            Ok(page.slice(&movements))
        }

        async fn item_stock(&self, item_id: InventoryItemId) -> Result<Vec<LocationStock>, PortError> {
            let state = self.state.read().await;
            Ok(state
                .stock
                .values()
                .filter(|s| s.item_id == item_id)
                .cloned()
                .collect())
        }

        async fn insert_transfer(&self, transfer: Transfer) -> Result<Transfer, PortError> {
            let mut state = self.state.write().await;
            state.transfers.insert(transfer.id, transfer.clone());
            Ok(transfer)
        }

        async fn get_transfer(&self, id: TransferId) -> Result<Transfer, PortError> {
            self.state
                .read()
                .await
                .transfers
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Transfer", id))
        }

        async fn list_transfers(
            &self,
            query: &TransferQuery,
            page: PageRequest,
        ) -> Result<Page<Transfer>, PortError> {
            let state = self.state.read().await;
            let mut transfers: Vec<Transfer> =
                state.transfers.values().filter(|t| query.matches(t)).cloned().collect();
            transfers.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
            Ok(page.slice(&transfers))
        }

        async fn advance_transfer(
            &self,
            id: TransferId,
            action: TransferAction,
            by: UserId,
            at: DateTime<Utc>,
        ) -> Result<Transfer, PortError> {
            let mut state = self.state.write().await;
            let transfer = state
                .transfers
                .get_mut(&id)
                .ok_or_else(|| PortError::not_found("Transfer", id))?;
            let mut updated = transfer.clone();
            updated.advance(action, by, at)?;
            *transfer = updated.clone();
            Ok(updated)
        }
    }
}
