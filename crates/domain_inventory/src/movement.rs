//! Stock movements
//!
//! Movements are never edited or removed. The effect of a movement on the
//! item total and on per-location stock is derived from its type alone, so
//! replaying the log reproduces both.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use core_kernel::{BranchId, CoreError, InventoryItemId, MovementId, UserId};

use crate::error::InventoryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    In,
    Out,
    Transfer,
    Adjustment,
    Consumption,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::In => "in",
            MovementType::Out => "out",
            MovementType::Transfer => "transfer",
            MovementType::Adjustment => "adjustment",
            MovementType::Consumption => "consumption",
        }
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in" => Ok(MovementType::In),
            "out" => Ok(MovementType::Out),
            "transfer" => Ok(MovementType::Transfer),
            "adjustment" => Ok(MovementType::Adjustment),
            "consumption" => Ok(MovementType::Consumption),
            other => Err(CoreError::validation(format!("Unknown movement type: {}", other))),
        }
    }
}

/// Change of stock at one location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockDelta {
    pub location: String,
    pub delta: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movement {
    pub id: MovementId,
    pub item_id: InventoryItemId,
    pub branch_id: BranchId,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    /// Positive, except for adjustments which carry their sign
    pub quantity: i64,
    pub reason: Option<String>,
    pub from_location: Option<String>,
    pub to_location: Option<String>,
    pub performed_by: UserId,
    pub created_at: DateTime<Utc>,
}

impl Movement {
    /// Validates a movement request against its type's rules
    pub fn create(
        input: RecordMovement,
        branch_id: BranchId,
        performed_by: UserId,
    ) -> Result<Self, InventoryError> {
        let from = clean(input.from_location);
        let to = clean(input.to_location);

        match input.movement_type {
            MovementType::Adjustment => {
                if input.quantity == 0 {
                    return Err(InventoryError::invalid("Adjustment quantity cannot be zero"));
                }
                if from.is_none() && to.is_none() {
                    return Err(InventoryError::invalid("Adjustment requires a location"));
                }
            }
            other => {
                if input.quantity <= 0 {
                    return Err(InventoryError::invalid("Quantity must be greater than zero"));
                }
                let (needs_from, needs_to) = match other {
                    MovementType::In => (false, true),
                    MovementType::Out | MovementType::Consumption => (true, false),
                    _ => (true, true),
                };
                if needs_from && from.is_none() {
                    return Err(InventoryError::invalid(format!(
                        "{} movements require a from location",
                        other
                    )));
                }
                if needs_to && to.is_none() {
                    return Err(InventoryError::invalid(format!(
                        "{} movements require a to location",
                        other
                    )));
                }
                if other == MovementType::Transfer && from == to {
                    return Err(InventoryError::invalid(
                        "Transfer locations must differ",
                    ));
                }
            }
        }

        Ok(Self {
            id: MovementId::new_v7(),
            item_id: input.item_id,
            branch_id,
            movement_type: input.movement_type,
            quantity: input.quantity,
            reason: input.reason,
            from_location: from,
            to_location: to,
            performed_by,
            created_at: Utc::now(),
        })
    }

    /// Change to the item's total quantity
    pub fn item_delta(&self) -> i64 {
        match self.movement_type {
            MovementType::In | MovementType::Adjustment => self.quantity,
            MovementType::Out | MovementType::Consumption => -self.quantity,
            MovementType::Transfer => 0,
        }
    }

    /// Changes to per-location stock
    pub fn stock_deltas(&self) -> Vec<StockDelta> {
        let at = |location: &Option<String>, delta: i64| {
            location.as_ref().map(|l| StockDelta {
                location: l.clone(),
                delta,
            })
        };
        match self.movement_type {
            MovementType::In => at(&self.to_location, self.quantity).into_iter().collect(),
            MovementType::Out | MovementType::Consumption => {
                at(&self.from_location, -self.quantity).into_iter().collect()
            }
            MovementType::Transfer => at(&self.from_location, -self.quantity)
                .into_iter()
                .chain(at(&self.to_location, self.quantity))
                .collect(),
            MovementType::Adjustment => at(&self.to_location, self.quantity)
                .or_else(|| at(&self.from_location, self.quantity))
                .into_iter()
                .collect(),
        }
    }
}

fn clean(location: Option<String>) -> Option<String> {
    location
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecordMovement {
    pub item_id: InventoryItemId,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub quantity: i64,
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub reason: Option<String>,
    #[validate(length(max = 100, message = "must be at most 100 characters"))]
    pub from_location: Option<String>,
    #[validate(length(max = 100, message = "must be at most 100 characters"))]
    pub to_location: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        movement_type: MovementType,
        quantity: i64,
        from: Option<&str>,
        to: Option<&str>,
    ) -> Result<Movement, InventoryError> {
        Movement::create(
            RecordMovement {
                item_id: InventoryItemId::new(),
                movement_type,
                quantity,
                reason: None,
                from_location: from.map(String::from),
                to_location: to.map(String::from),
            },
            BranchId::new(),
            UserId::new(),
        )
    }

    #[test]
    fn test_transfer_deltas() {
        let m = record(MovementType::Transfer, 5, Some("A"), Some("B")).unwrap();
        assert_eq!(m.item_delta(), 0);
        assert_eq!(
            m.stock_deltas(),
            vec![
                StockDelta { location: "A".to_string(), delta: -5 },
                StockDelta { location: "B".to_string(), delta: 5 },
            ]
        );
    }

    #[test]
    fn test_in_out_consumption() {
        let m = record(MovementType::In, 10, None, Some("Store")).unwrap();
        assert_eq!(m.item_delta(), 10);
        assert_eq!(m.stock_deltas()[0].delta, 10);

        let m = record(MovementType::Consumption, 3, Some("Pantry"), None).unwrap();
        assert_eq!(m.item_delta(), -3);
        assert_eq!(m.stock_deltas()[0].location, "Pantry");
    }

    #[test]
    fn test_adjustment_prefers_to_location() {
        let m = record(MovementType::Adjustment, -2, Some("A"), Some("B")).unwrap();
        assert_eq!(m.item_delta(), -2);
        assert_eq!(m.stock_deltas(), vec![StockDelta { location: "B".to_string(), delta: -2 }]);

        let m = record(MovementType::Adjustment, 4, Some("A"), None).unwrap();
        assert_eq!(m.stock_deltas()[0].location, "A");
    }

    #[test]
    fn test_rules() {
        assert!(record(MovementType::In, 0, None, Some("A")).is_err());
        assert!(record(MovementType::In, 1, Some("A"), None).is_err());
        assert!(record(MovementType::Out, -1, Some("A"), None).is_err());
        assert!(record(MovementType::Transfer, 1, Some("A"), Some("A")).is_err());
        assert!(record(MovementType::Adjustment, 0, Some("A"), None).is_err());
        assert!(record(MovementType::Adjustment, 3, None, Some("  ")).is_err());
    }
}
