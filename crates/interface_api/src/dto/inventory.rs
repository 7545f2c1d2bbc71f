//! Inventory DTOs

use serde::Deserialize;

use core_kernel::{BranchId, InventoryItemId};
use domain_inventory::{
    InventoryCategory, ItemQuery, MovementQuery, MovementType, TransferQuery, TransferStatus,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemFilter {
    pub branch_id: Option<BranchId>,
    pub category: Option<InventoryCategory>,
    /// Only items at or below their minimum stock
    #[serde(default)]
    pub low_stock: bool,
    #[serde(default)]
    pub include_inactive: bool,
    pub search: Option<String>,
}

impl From<ItemFilter> for ItemQuery {
    fn from(filter: ItemFilter) -> Self {
        ItemQuery {
            branch_id: filter.branch_id,
            category: filter.category,
            low_stock: filter.low_stock,
            include_inactive: filter.include_inactive,
            search: filter.search.filter(|s| !s.trim().is_empty()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementFilter {
    pub branch_id: Option<BranchId>,
    pub item_id: Option<InventoryItemId>,
    #[serde(rename = "type")]
    pub movement_type: Option<MovementType>,
}

impl From<MovementFilter> for MovementQuery {
    fn from(filter: MovementFilter) -> Self {
        MovementQuery {
            branch_id: filter.branch_id,
            item_id: filter.item_id,
            movement_type: filter.movement_type,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferFilter {
    pub branch_id: Option<BranchId>,
    pub item_id: Option<InventoryItemId>,
    pub status: Option<TransferStatus>,
}

impl From<TransferFilter> for TransferQuery {
    fn from(filter: TransferFilter) -> Self {
        TransferQuery {
            branch_id: filter.branch_id,
            item_id: filter.item_id,
            status: filter.status,
        }
    }
}
