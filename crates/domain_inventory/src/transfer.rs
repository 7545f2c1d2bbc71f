//! Stock transfer requests between locations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use core_kernel::{BranchId, CoreError, InventoryItemId, Role, TransferId, UserId};

use crate::error::InventoryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    Pending,
    Approved,
    InTransit,
    Completed,
    Cancelled,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "pending",
            TransferStatus::Approved => "approved",
            TransferStatus::InTransit => "in_transit",
            TransferStatus::Completed => "completed",
            TransferStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, TransferStatus::Completed | TransferStatus::Cancelled)
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransferStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransferStatus::Pending),
            "approved" => Ok(TransferStatus::Approved),
            "in_transit" => Ok(TransferStatus::InTransit),
            "completed" => Ok(TransferStatus::Completed),
            "cancelled" => Ok(TransferStatus::Cancelled),
            other => Err(CoreError::validation(format!("Unknown transfer status: {}", other))),
        }
    }
}

/// Workflow steps of a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferAction {
    Approve,
    Dispatch,
    Complete,
    Cancel,
}

impl TransferAction {
    /// Minimum role allowed to take the step
    pub fn required_role(&self) -> Role {
        match self {
            TransferAction::Approve | TransferAction::Complete => Role::TeamLead,
            TransferAction::Dispatch | TransferAction::Cancel => Role::Staff,
        }
    }

    /// Target status when taken from `from`, if the step is allowed
    pub fn target(&self, from: TransferStatus) -> Option<TransferStatus> {
        use TransferStatus::*;
        match (self, from) {
            (TransferAction::Approve, Pending) => Some(Approved),
            (TransferAction::Dispatch, Approved) => Some(InTransit),
            (TransferAction::Complete, Approved | InTransit) => Some(Completed),
            (TransferAction::Cancel, Pending | Approved | InTransit) => Some(Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for TransferAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransferAction::Approve => "approve",
            TransferAction::Dispatch => "dispatch",
            TransferAction::Complete => "complete",
            TransferAction::Cancel => "cancel",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    pub id: TransferId,
    pub item_id: InventoryItemId,
    pub branch_id: BranchId,
    pub quantity: i64,
    pub from_location: String,
    pub to_location: String,
    pub status: TransferStatus,
    pub notes: Option<String>,
    pub requested_by: UserId,
    pub requested_at: DateTime<Utc>,
    pub approved_by: Option<UserId>,
    pub approved_at: Option<DateTime<Utc>>,
    pub dispatched_by: Option<UserId>,
    pub dispatched_at: Option<DateTime<Utc>>,
    pub completed_by: Option<UserId>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_by: Option<UserId>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Transfer {
    pub fn request(
        input: NewTransfer,
        branch_id: BranchId,
        requested_by: UserId,
    ) -> Result<Self, InventoryError> {
        if input.quantity <= 0 {
            return Err(InventoryError::invalid("Quantity must be greater than zero"));
        }
        let from = input.from_location.trim().to_string();
        let to = input.to_location.trim().to_string();
        if from == to {
            return Err(InventoryError::invalid("Transfer locations must differ"));
        }
        Ok(Self {
            id: TransferId::new_v7(),
            item_id: input.item_id,
            branch_id,
            quantity: input.quantity,
            from_location: from,
            to_location: to,
            status: TransferStatus::Pending,
            notes: input.notes,
            requested_by,
            requested_at: Utc::now(),
            approved_by: None,
            approved_at: None,
            dispatched_by: None,
            dispatched_at: None,
            completed_by: None,
            completed_at: None,
            cancelled_by: None,
            cancelled_at: None,
        })
    }

    /// Takes a workflow step, stamping who did it and when
    pub fn advance(
        &mut self,
        action: TransferAction,
        by: UserId,
        at: DateTime<Utc>,
    ) -> Result<(), InventoryError> {
        let target = action.target(self.status).ok_or_else(|| {
            InventoryError::InvalidTransition(format!(
                "Cannot {} a transfer that is {}",
                action, self.status
            ))
        })?;
        let stamp = (Some(by), Some(at));
        match action {
            TransferAction::Approve => (self.approved_by, self.approved_at) = stamp,
            TransferAction::Dispatch => (self.dispatched_by, self.dispatched_at) = stamp,
            TransferAction::Complete => (self.completed_by, self.completed_at) = stamp,
            TransferAction::Cancel => (self.cancelled_by, self.cancelled_at) = stamp,
        }
        self.status = target;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewTransfer {
    pub item_id: InventoryItemId,
    pub quantity: i64,
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub from_location: String,
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub to_location: String,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer() -> Transfer {
        Transfer::request(
            NewTransfer {
                item_id: InventoryItemId::new(),
                quantity: 5,
                from_location: "Store".to_string(),
                to_location: "Level 2".to_string(),
                notes: None,
            },
            BranchId::new(),
            UserId::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_full_lifecycle() {
        let mut t = transfer();
        let lead = UserId::new();
        t.advance(TransferAction::Approve, lead, Utc::now()).unwrap();
        t.advance(TransferAction::Dispatch, UserId::new(), Utc::now()).unwrap();
        t.advance(TransferAction::Complete, lead, Utc::now()).unwrap();

        assert_eq!(t.status, TransferStatus::Completed);
        assert_eq!(t.approved_by, Some(lead));
        assert!(t.dispatched_at.is_some());
        assert!(t.completed_at.is_some());
    }

    #[test]
    fn test_complete_after_cancel_rejected() {
        let mut t = transfer();
        t.advance(TransferAction::Cancel, UserId::new(), Utc::now()).unwrap();
        let result = t.advance(TransferAction::Complete, UserId::new(), Utc::now());
        assert!(matches!(result, Err(InventoryError::InvalidTransition(_))));
        assert_eq!(t.status, TransferStatus::Cancelled);
    }

    #[test]
    fn test_pending_cannot_complete() {
        assert_eq!(TransferAction::Complete.target(TransferStatus::Pending), None);
        assert_eq!(TransferAction::Approve.required_role(), Role::TeamLead);
    }

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_string(&TransferStatus::InTransit).unwrap();
        assert_eq!(json, "\"in_transit\"");
    }
}
