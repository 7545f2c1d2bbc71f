//! Inventory service

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};
use validator::Validate;

use core_kernel::{Actor, CoreError, InventoryItemId, Page, PageRequest, Role, TransferId};
use domain_directory::DirectoryPort;

use crate::error::InventoryError;
use crate::item::{InventoryItem, NewInventoryItem, UpdateInventoryItem};
use crate::movement::{Movement, RecordMovement};
use crate::ports::{InventoryPort, ItemQuery, MovementQuery, RecordedMovement, TransferQuery};
use crate::stock::LocationStock;
use crate::transfer::{NewTransfer, Transfer, TransferAction};

/// Application service for inventory items, movements and transfers
#[derive(Clone)]
pub struct InventoryService {
    port: Arc<dyn InventoryPort>,
    directory: Arc<dyn DirectoryPort>,
}

impl InventoryService {
    pub fn new(port: Arc<dyn InventoryPort>, directory: Arc<dyn DirectoryPort>) -> Self {
        Self { port, directory }
    }

    // ========================================================================
    // Items
    // ========================================================================

    #[instrument(skip(self, actor, input), fields(branch_id = %input.branch_id, sku = %input.sku))]
    pub async fn create_item(
        &self,
        actor: &Actor,
        input: NewInventoryItem,
    ) -> Result<InventoryItem, InventoryError> {
        actor.require(Role::TeamLead)?;
        input.validate().map_err(CoreError::from)?;
        actor.ensure_branch(input.branch_id)?;
        self.directory.get_branch(input.branch_id).await?;

        let item = self.port.insert_item(input.into_item()?).await?;
        info!(item_id = %item.id, "Inventory item created");
        Ok(item)
    }

    pub async fn get_item(&self, actor: &Actor, id: InventoryItemId) -> Result<InventoryItem, InventoryError> {
        actor.require(Role::Staff)?;
        let item = self.port.get_item(id).await?;
        actor.ensure_branch(item.branch_id)?;
        Ok(item)
    }

    pub async fn list_items(
        &self,
        actor: &Actor,
        mut query: ItemQuery,
        page: PageRequest,
    ) -> Result<Page<InventoryItem>, InventoryError> {
        actor.require(Role::Staff)?;
        query.branch_id = actor.scope_branch(query.branch_id);
        Ok(self.port.list_items(&query, page).await?)
    }

    #[instrument(skip(self, actor, update), fields(item_id = %id))]
    pub async fn update_item(
        &self,
        actor: &Actor,
        id: InventoryItemId,
        update: UpdateInventoryItem,
    ) -> Result<InventoryItem, InventoryError> {
        actor.require(Role::TeamLead)?;
        update.validate().map_err(CoreError::from)?;
        let mut item = self.get_item(actor, id).await?;
        item.apply(update)?;

        let item = self.port.update_item(item).await?;
        info!("Inventory item updated");
        Ok(item)
    }

    /// Deactivates an item; its movement history is kept
    #[instrument(skip(self, actor), fields(item_id = %id))]
    pub async fn deactivate_item(
        &self,
        actor: &Actor,
        id: InventoryItemId,
    ) -> Result<InventoryItem, InventoryError> {
        actor.require(Role::Manager)?;
        let mut item = self.get_item(actor, id).await?;
        item.is_active = false;
        item.updated_at = Utc::now();

        let item = self.port.update_item(item).await?;
        info!("Inventory item deactivated");
        Ok(item)
    }

    pub async fn item_stock(
        &self,
        actor: &Actor,
        id: InventoryItemId,
    ) -> Result<Vec<LocationStock>, InventoryError> {
        self.get_item(actor, id).await?;
        Ok(self.port.item_stock(id).await?)
    }

    // ========================================================================
    // Movements
    // ========================================================================

    /// Records a movement and applies it to item and location stock
    ///
    /// Stock is allowed to go negative at a location; that is logged, not refused.
    #[instrument(skip(self, actor, input), fields(item_id = %input.item_id, movement_type = %input.movement_type))]
    pub async fn record_movement(
        &self,
        actor: &Actor,
        input: RecordMovement,
    ) -> Result<RecordedMovement, InventoryError> {
        actor.require(Role::Staff)?;
        input.validate().map_err(CoreError::from)?;
        let item = self.get_item(actor, input.item_id).await?;
        if !item.is_active {
            return Err(InventoryError::InactiveItem(item.sku));
        }

        let movement = Movement::create(input, item.branch_id, actor.user_id)?;
        let recorded = self.port.record_movement(movement).await?;

        for row in recorded.stock.iter().filter(|s| s.is_negative()) {
            warn!(
                item_id = %row.item_id,
                location = %row.location,
                quantity = row.quantity,
                "Location stock went negative"
            );
        }
        if recorded.item.is_low_stock() {
            warn!(item_id = %recorded.item.id, quantity = recorded.item.quantity, "Item at or below minimum stock");
        }
        info!(
            movement_id = %recorded.movement.id,
            quantity = recorded.movement.quantity,
            item_quantity = recorded.item.quantity,
            "Movement recorded"
        );
        Ok(recorded)
    }

    pub async fn list_movements(
        &self,
        actor: &Actor,
        mut query: MovementQuery,
        page: PageRequest,
    ) -> Result<Page<Movement>, InventoryError> {
        actor.require(Role::Staff)?;
        query.branch_id = actor.scope_branch(query.branch_id);
        Ok(self.port.list_movements(&query, page).await?)
    }

    // ========================================================================
    // Transfers
    // ========================================================================

    #[instrument(skip(self, actor, input), fields(item_id = %input.item_id, quantity = input.quantity))]
    pub async fn request_transfer(
        &self,
        actor: &Actor,
        input: NewTransfer,
    ) -> Result<Transfer, InventoryError> {
        actor.require(Role::Staff)?;
        input.validate().map_err(CoreError::from)?;
        let item = self.get_item(actor, input.item_id).await?;
        if !item.is_active {
            return Err(InventoryError::InactiveItem(item.sku));
        }

        let transfer = Transfer::request(input, item.branch_id, actor.user_id)?;
        let transfer = self.port.insert_transfer(transfer).await?;
        info!(transfer_id = %transfer.id, "Transfer requested");
        Ok(transfer)
    }

    pub async fn get_transfer(&self, actor: &Actor, id: TransferId) -> Result<Transfer, InventoryError> {
        actor.require(Role::Staff)?;
        let transfer = self.port.get_transfer(id).await?;
        actor.ensure_branch(transfer.branch_id)?;
        Ok(transfer)
    }

    pub async fn list_transfers(
        &self,
        actor: &Actor,
        mut query: TransferQuery,
        page: PageRequest,
    ) -> Result<Page<Transfer>, InventoryError> {
        actor.require(Role::Staff)?;
        query.branch_id = actor.scope_branch(query.branch_id);
        Ok(self.port.list_transfers(&query, page).await?)
    }

    pub async fn advance_transfer(
        &self,
        actor: &Actor,
        id: TransferId,
        action: TransferAction,
    ) -> Result<Transfer, InventoryError> {
        self.advance_transfer_at(actor, id, action, Utc::now()).await
    }

    /// Takes a workflow step; approve and complete need TEAM_LEAD or above
    #[instrument(skip(self, actor, at), fields(transfer_id = %id, action = %action))]
    pub async fn advance_transfer_at(
        &self,
        actor: &Actor,
        id: TransferId,
        action: TransferAction,
        at: DateTime<Utc>,
    ) -> Result<Transfer, InventoryError> {
        actor.require(action.required_role())?;
        let current = self.get_transfer(actor, id).await?;

        let mut preview = current.clone();
        if let Err(e) = preview.advance(action, actor.user_id, at) {
            warn!(error = %e, "Transfer step rejected");
            return Err(e);
        }

        let transfer = self.port.advance_transfer(id, action, actor.user_id, at).await?;
        info!(status = %transfer.status, "Transfer status changed");
        Ok(transfer)
    }
}
