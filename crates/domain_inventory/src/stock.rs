//! Per-location stock

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::InventoryItemId;

use crate::movement::StockDelta;

/// Quantity of an item held at one location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationStock {
    pub item_id: InventoryItemId,
    pub location: String,
    pub quantity: i64,
    pub updated_at: DateTime<Utc>,
}

impl LocationStock {
    pub fn empty(item_id: InventoryItemId, location: impl Into<String>) -> Self {
        Self {
            item_id,
            location: location.into(),
            quantity: 0,
            updated_at: Utc::now(),
        }
    }

    pub fn apply(&mut self, delta: &StockDelta) {
        self.quantity += delta.delta;
        self.updated_at = Utc::now();
    }

    pub fn is_negative(&self) -> bool {
        self.quantity < 0
    }
}
