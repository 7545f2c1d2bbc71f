//! Inventory item, movement and transfer handlers

use axum::{extract::State, Json};

use core_kernel::{InventoryItemId, Page, TransferId};
use domain_inventory::{
    InventoryItem, LocationStock, Movement, NewInventoryItem, NewTransfer, RecordMovement,
    RecordedMovement, Transfer, TransferAction, UpdateInventoryItem,
};

use crate::dto::inventory::{ItemFilter, MovementFilter, TransferFilter};
use crate::dto::{created, ok, ApiResponse, Created, PageParams};
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery, CurrentActor};
use crate::AppState;

// ============================================================================
// Items
// ============================================================================

pub async fn create_item(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiJson(input): ApiJson<NewInventoryItem>,
) -> ApiResult<Created<InventoryItem>> {
    Ok(created(state.inventory.create_item(&actor, input).await?))
}

pub async fn list_items(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiQuery(page): ApiQuery<PageParams>,
    ApiQuery(filter): ApiQuery<ItemFilter>,
) -> ApiResult<Json<Page<InventoryItem>>> {
    let items = state
        .inventory
        .list_items(&actor, filter.into(), page.request())
        .await?;
    Ok(Json(items))
}

pub async fn get_item(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<InventoryItemId>,
) -> ApiResult<Json<ApiResponse<InventoryItem>>> {
    Ok(ok(state.inventory.get_item(&actor, id).await?))
}

/// Descriptive fields only; quantities change through movements
pub async fn update_item(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<InventoryItemId>,
    ApiJson(update): ApiJson<UpdateInventoryItem>,
) -> ApiResult<Json<ApiResponse<InventoryItem>>> {
    Ok(ok(state.inventory.update_item(&actor, id, update).await?))
}

/// Soft delete
pub async fn deactivate_item(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<InventoryItemId>,
) -> ApiResult<Json<ApiResponse<InventoryItem>>> {
    Ok(ok(state.inventory.deactivate_item(&actor, id).await?))
}

pub async fn item_stock(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<InventoryItemId>,
) -> ApiResult<Json<ApiResponse<Vec<LocationStock>>>> {
    Ok(ok(state.inventory.item_stock(&actor, id).await?))
}

// ============================================================================
// Movements
// ============================================================================

pub async fn record_movement(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiJson(input): ApiJson<RecordMovement>,
) -> ApiResult<Created<RecordedMovement>> {
    Ok(created(state.inventory.record_movement(&actor, input).await?))
}

pub async fn list_movements(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiQuery(page): ApiQuery<PageParams>,
    ApiQuery(filter): ApiQuery<MovementFilter>,
) -> ApiResult<Json<Page<Movement>>> {
    let movements = state
        .inventory
        .list_movements(&actor, filter.into(), page.request())
        .await?;
    Ok(Json(movements))
}

// ============================================================================
// Transfers
// ============================================================================

pub async fn request_transfer(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiJson(input): ApiJson<NewTransfer>,
) -> ApiResult<Created<Transfer>> {
    Ok(created(state.inventory.request_transfer(&actor, input).await?))
}

pub async fn list_transfers(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiQuery(page): ApiQuery<PageParams>,
    ApiQuery(filter): ApiQuery<TransferFilter>,
) -> ApiResult<Json<Page<Transfer>>> {
    let transfers = state
        .inventory
        .list_transfers(&actor, filter.into(), page.request())
        .await?;
    Ok(Json(transfers))
}

pub async fn get_transfer(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<TransferId>,
) -> ApiResult<Json<ApiResponse<Transfer>>> {
    Ok(ok(state.inventory.get_transfer(&actor, id).await?))
}

/// `POST /inventory/transfers/:id/{approve,dispatch,complete,cancel}`
pub async fn advance_transfer(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath((id, action)): ApiPath<(TransferId, TransferAction)>,
) -> ApiResult<Json<ApiResponse<Transfer>>> {
    Ok(ok(state.inventory.advance_transfer(&actor, id, action).await?))
}
