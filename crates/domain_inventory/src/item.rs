//! Inventory items

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use core_kernel::{BranchId, CoreError, InventoryItemId};

use crate::error::InventoryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InventoryCategory {
    Fixture,
    Moveable,
    Consumable,
}

impl InventoryCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            InventoryCategory::Fixture => "fixture",
            InventoryCategory::Moveable => "moveable",
            InventoryCategory::Consumable => "consumable",
        }
    }
}

impl fmt::Display for InventoryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InventoryCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fixture" => Ok(InventoryCategory::Fixture),
            "moveable" => Ok(InventoryCategory::Moveable),
            "consumable" => Ok(InventoryCategory::Consumable),
            other => Err(CoreError::validation(format!("Unknown inventory category: {}", other))),
        }
    }
}

/// Stock position against the item's thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockLevel {
    Low,
    Normal,
    Excess,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: InventoryItemId,
    pub branch_id: BranchId,
    pub name: String,
    pub sku: String,
    pub category: InventoryCategory,
    /// Total across all locations; may go negative when stock is drawn
    /// from a location that was never stocked
    pub quantity: i64,
    pub unit: String,
    pub minimum_stock: i64,
    pub maximum_stock: Option<i64>,
    pub current_price: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    /// Low at or below the minimum, excess above the maximum
    pub fn stock_level(&self) -> StockLevel {
        if self.quantity <= self.minimum_stock {
            StockLevel::Low
        } else if self.maximum_stock.is_some_and(|max| self.quantity > max) {
            StockLevel::Excess
        } else {
            StockLevel::Normal
        }
    }

    pub fn is_low_stock(&self) -> bool {
        self.stock_level() == StockLevel::Low
    }

    /// Applies a partial update, re-checking the thresholds
    pub fn apply(&mut self, update: UpdateInventoryItem) -> Result<(), InventoryError> {
        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if let Some(sku) = update.sku {
            self.sku = sku.trim().to_uppercase();
        }
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(unit) = update.unit {
            self.unit = unit;
        }
        if let Some(minimum) = update.minimum_stock {
            self.minimum_stock = minimum;
        }
        if let Some(maximum) = update.maximum_stock {
            self.maximum_stock = Some(maximum);
        }
        if let Some(price) = update.current_price {
            self.current_price = price;
        }
        check_thresholds(self.minimum_stock, self.maximum_stock, self.current_price)?;
        self.updated_at = Utc::now();
        Ok(())
    }
}

fn check_thresholds(
    minimum: i64,
    maximum: Option<i64>,
    price: Decimal,
) -> Result<(), InventoryError> {
    if minimum < 0 {
        return Err(InventoryError::invalid("Minimum stock cannot be negative"));
    }
    if maximum.is_some_and(|max| max < minimum) {
        return Err(InventoryError::invalid(
            "Maximum stock cannot be below minimum stock",
        ));
    }
    if price.is_sign_negative() {
        return Err(InventoryError::invalid("Price cannot be negative"));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewInventoryItem {
    pub branch_id: BranchId,
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 50, message = "must be 1-50 characters"))]
    pub sku: String,
    pub category: InventoryCategory,
    #[validate(length(min = 1, max = 20, message = "must be 1-20 characters"))]
    pub unit: String,
    #[serde(default)]
    pub minimum_stock: i64,
    pub maximum_stock: Option<i64>,
    #[serde(default)]
    pub current_price: Decimal,
}

impl NewInventoryItem {
    /// Builds an item with zero stock; stock arrives through movements
    pub fn into_item(self) -> Result<InventoryItem, InventoryError> {
        check_thresholds(self.minimum_stock, self.maximum_stock, self.current_price)?;
        let now = Utc::now();
        Ok(InventoryItem {
            id: InventoryItemId::new_v7(),
            branch_id: self.branch_id,
            name: self.name.trim().to_string(),
            sku: self.sku.trim().to_uppercase(),
            category: self.category,
            quantity: 0,
            unit: self.unit,
            minimum_stock: self.minimum_stock,
            maximum_stock: self.maximum_stock,
            current_price: self.current_price,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInventoryItem {
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 50, message = "must be 1-50 characters"))]
    pub sku: Option<String>,
    pub category: Option<InventoryCategory>,
    pub unit: Option<String>,
    pub minimum_stock: Option<i64>,
    pub maximum_stock: Option<i64>,
    pub current_price: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn input() -> NewInventoryItem {
        NewInventoryItem {
            branch_id: BranchId::new(),
            name: "Desk chair".to_string(),
            sku: "chr-01".to_string(),
            category: InventoryCategory::Moveable,
            unit: "pcs".to_string(),
            minimum_stock: 5,
            maximum_stock: Some(50),
            current_price: dec!(120),
        }
    }

    #[test]
    fn test_stock_levels() {
        let mut item = input().into_item().unwrap();
        assert_eq!(item.sku, "CHR-01");
        assert_eq!(item.stock_level(), StockLevel::Low);

        item.quantity = 10;
        assert_eq!(item.stock_level(), StockLevel::Normal);

        item.quantity = 51;
        assert_eq!(item.stock_level(), StockLevel::Excess);
    }

    #[test]
    fn test_thresholds_checked() {
        let mut bad = input();
        bad.maximum_stock = Some(2);
        assert!(bad.into_item().is_err());

        let mut item = input().into_item().unwrap();
        let result = item.apply(UpdateInventoryItem {
            minimum_stock: Some(60),
            ..UpdateInventoryItem::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_category_serde() {
        let json = serde_json::to_string(&InventoryCategory::Consumable).unwrap();
        assert_eq!(json, "\"consumable\"");
    }
}
