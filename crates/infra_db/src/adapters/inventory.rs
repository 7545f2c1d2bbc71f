//! PostgreSQL Inventory Adapter
//!
//! A movement, the item total and the per-location stock rows are written
//! in one transaction with the item row locked.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, PgPool};
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{
    BranchId, DomainPort, HealthCheckResult, HealthCheckable, InventoryItemId, MovementId, Page,
    PageRequest, PortError, TransferId, UserId,
};
use domain_inventory::{
    InventoryItem, InventoryPort, ItemQuery, LocationStock, Movement, MovementQuery,
    RecordedMovement, Transfer, TransferAction, TransferQuery,
};

use super::{convert, limit_offset, to_page};
use crate::error::{decode, port_err, port_err_unique, DatabaseError};
use crate::pool::ping;

const ITEM_COLUMNS: &str = "id, branch_id, name, sku, category, quantity, unit, minimum_stock, \
     maximum_stock, current_price, is_active, created_at, updated_at";

const ITEM_FILTER: &str = "WHERE ($1::uuid IS NULL OR branch_id = $1) \
     AND ($2::text IS NULL OR category = $2) \
     AND (NOT $3 OR quantity <= minimum_stock) \
     AND ($4 OR is_active) \
     AND ($5::text IS NULL OR name ILIKE '%' || $5 || '%' OR sku ILIKE '%' || $5 || '%')";

const MOVEMENT_COLUMNS: &str = "id, item_id, branch_id, movement_type, quantity, reason, \
     from_location, to_location, performed_by, created_at";

const MOVEMENT_FILTER: &str = "WHERE ($1::uuid IS NULL OR branch_id = $1) \
     AND ($2::uuid IS NULL OR item_id = $2) \
     AND ($3::text IS NULL OR movement_type = $3)";

const TRANSFER_COLUMNS: &str = "id, item_id, branch_id, quantity, from_location, to_location, \
     status, notes, requested_by, requested_at, approved_by, approved_at, dispatched_by, \
     dispatched_at, completed_by, completed_at, cancelled_by, cancelled_at";

const TRANSFER_FILTER: &str = "WHERE ($1::uuid IS NULL OR branch_id = $1) \
     AND ($2::uuid IS NULL OR item_id = $2) \
     AND ($3::text IS NULL OR status = $3)";

/// PostgreSQL-backed implementation of `InventoryPort`
#[derive(Debug, Clone)]
pub struct PostgresInventoryAdapter {
    pool: PgPool,
}

impl PostgresInventoryAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DomainPort for PostgresInventoryAdapter {}

#[async_trait]
impl HealthCheckable for PostgresInventoryAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-inventory").await
    }
}

// ============================================================================
// Rows
// ============================================================================

#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    branch_id: Uuid,
    name: String,
    sku: String,
    category: String,
    quantity: i64,
    unit: String,
    minimum_stock: i64,
    maximum_stock: Option<i64>,
    current_price: Decimal,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ItemRow> for InventoryItem {
    type Error = DatabaseError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        Ok(InventoryItem {
            id: InventoryItemId::from(row.id),
            branch_id: BranchId::from(row.branch_id),
            name: row.name,
            sku: row.sku,
            category: decode("category", &row.category)?,
            quantity: row.quantity,
            unit: row.unit,
            minimum_stock: row.minimum_stock,
            maximum_stock: row.maximum_stock,
            current_price: row.current_price,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct MovementRow {
    id: Uuid,
    item_id: Uuid,
    branch_id: Uuid,
    movement_type: String,
    quantity: i64,
    reason: Option<String>,
    from_location: Option<String>,
    to_location: Option<String>,
    performed_by: Uuid,
    created_at: DateTime<Utc>,
}

impl TryFrom<MovementRow> for Movement {
    type Error = DatabaseError;

    fn try_from(row: MovementRow) -> Result<Self, Self::Error> {
        Ok(Movement {
            id: MovementId::from(row.id),
            item_id: InventoryItemId::from(row.item_id),
            branch_id: BranchId::from(row.branch_id),
            movement_type: decode("movement_type", &row.movement_type)?,
            quantity: row.quantity,
            reason: row.reason,
            from_location: row.from_location,
            to_location: row.to_location,
            performed_by: UserId::from(row.performed_by),
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct StockRow {
    item_id: Uuid,
    location: String,
    quantity: i64,
    updated_at: DateTime<Utc>,
}

impl From<StockRow> for LocationStock {
    fn from(row: StockRow) -> Self {
        LocationStock {
            item_id: InventoryItemId::from(row.item_id),
            location: row.location,
            quantity: row.quantity,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct TransferRow {
    id: Uuid,
    item_id: Uuid,
    branch_id: Uuid,
    quantity: i64,
    from_location: String,
    to_location: String,
    status: String,
    notes: Option<String>,
    requested_by: Uuid,
    requested_at: DateTime<Utc>,
    approved_by: Option<Uuid>,
    approved_at: Option<DateTime<Utc>>,
    dispatched_by: Option<Uuid>,
    dispatched_at: Option<DateTime<Utc>>,
    completed_by: Option<Uuid>,
    completed_at: Option<DateTime<Utc>>,
    cancelled_by: Option<Uuid>,
    cancelled_at: Option<DateTime<Utc>>,
}

impl TryFrom<TransferRow> for Transfer {
    type Error = DatabaseError;

    fn try_from(row: TransferRow) -> Result<Self, Self::Error> {
        Ok(Transfer {
            id: TransferId::from(row.id),
            item_id: InventoryItemId::from(row.item_id),
            branch_id: BranchId::from(row.branch_id),
            quantity: row.quantity,
            from_location: row.from_location,
            to_location: row.to_location,
            status: decode("status", &row.status)?,
            notes: row.notes,
            requested_by: UserId::from(row.requested_by),
            requested_at: row.requested_at,
            approved_by: row.approved_by.map(UserId::from),
            approved_at: row.approved_at,
            dispatched_by: row.dispatched_by.map(UserId::from),
            dispatched_at: row.dispatched_at,
            completed_by: row.completed_by.map(UserId::from),
            completed_at: row.completed_at,
            cancelled_by: row.cancelled_by.map(UserId::from),
            cancelled_at: row.cancelled_at,
        })
    }
}

async fn fetch_transfer(
    conn: &mut PgConnection,
    id: TransferId,
    for_update: bool,
) -> Result<Transfer, PortError> {
    let lock = if for_update { " FOR UPDATE" } else { "" };
    let sql = format!("SELECT {TRANSFER_COLUMNS} FROM inventory_transfers WHERE id = $1{lock}");
    let row = sqlx::query_as::<_, TransferRow>(&sql)
        .bind(Uuid::from(id))
        .fetch_optional(conn)
        .await
        .map_err(port_err)?
        .ok_or_else(|| PortError::not_found("Transfer", id))?;
    Ok(Transfer::try_from(row)?)
}

// ============================================================================
// Port
// ============================================================================

#[async_trait]
impl InventoryPort for PostgresInventoryAdapter {
    #[instrument(skip(self, item), fields(branch_id = %item.branch_id, sku = %item.sku))]
    async fn insert_item(&self, item: InventoryItem) -> Result<InventoryItem, PortError> {
        sqlx::query(
            "INSERT INTO inventory_items (id, branch_id, name, sku, category, quantity, unit, \
             minimum_stock, maximum_stock, current_price, is_active, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(Uuid::from(item.id))
        .bind(Uuid::from(item.branch_id))
        .bind(&item.name)
        .bind(&item.sku)
        .bind(item.category.as_str())
        .bind(item.quantity)
        .bind(&item.unit)
        .bind(item.minimum_stock)
        .bind(item.maximum_stock)
        .bind(item.current_price)
        .bind(item.is_active)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| port_err_unique(e, || format!("SKU {} already exists", item.sku)))?;
        Ok(item)
    }

    async fn get_item(&self, id: InventoryItemId) -> Result<InventoryItem, PortError> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM inventory_items WHERE id = $1");
        let row = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(port_err)?
            .ok_or_else(|| PortError::not_found("InventoryItem", id))?;
        Ok(InventoryItem::try_from(row)?)
    }

    async fn list_items(
        &self,
        query: &ItemQuery,
        page: PageRequest,
    ) -> Result<Page<InventoryItem>, PortError> {
        let (limit, offset) = limit_offset(page);
        let branch = query.branch_id.map(Uuid::from);
        let category = query.category.map(|c| c.as_str());

        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items {ITEM_FILTER} ORDER BY name LIMIT $6 OFFSET $7"
        );
        let rows = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(branch)
            .bind(category)
            .bind(query.low_stock)
            .bind(query.include_inactive)
            .bind(&query.search)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(port_err)?;

        let count_sql = format!("SELECT COUNT(*) FROM inventory_items {ITEM_FILTER}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(branch)
            .bind(category)
            .bind(query.low_stock)
            .bind(query.include_inactive)
            .bind(&query.search)
            .fetch_one(&self.pool)
            .await
            .map_err(port_err)?;
        Ok(to_page(convert(rows)?, page, total))
    }

    #[instrument(skip(self, item), fields(item_id = %item.id))]
    async fn update_item(&self, item: InventoryItem) -> Result<InventoryItem, PortError> {
        let sql = format!(
            "UPDATE inventory_items SET name = $2, sku = $3, category = $4, unit = $5, \
             minimum_stock = $6, maximum_stock = $7, current_price = $8, is_active = $9, \
             updated_at = $10 WHERE id = $1 RETURNING {ITEM_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(Uuid::from(item.id))
            .bind(&item.name)
            .bind(&item.sku)
            .bind(item.category.as_str())
            .bind(&item.unit)
            .bind(item.minimum_stock)
            .bind(item.maximum_stock)
            .bind(item.current_price)
            .bind(item.is_active)
            .bind(item.updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| port_err_unique(e, || format!("SKU {} already exists", item.sku)))?
            .ok_or_else(|| PortError::not_found("InventoryItem", item.id))?;
        Ok(InventoryItem::try_from(row)?)
    }

    #[instrument(skip(self, movement), fields(item_id = %movement.item_id, movement_type = %movement.movement_type))]
    async fn record_movement(&self, movement: Movement) -> Result<RecordedMovement, PortError> {
        let mut tx = self.pool.begin().await.map_err(port_err)?;

        let sql = format!(
            "UPDATE inventory_items SET quantity = quantity + $2, updated_at = $3 \
             WHERE id = $1 RETURNING {ITEM_COLUMNS}"
        );
        let item = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(Uuid::from(movement.item_id))
            .bind(movement.item_delta())
            .bind(movement.created_at)
            .fetch_optional(&mut *tx)
            .await
            .map_err(port_err)?
            .ok_or_else(|| PortError::not_found("InventoryItem", movement.item_id))?;
        let item = InventoryItem::try_from(item)?;

        let mut stock = Vec::new();
        for delta in movement.stock_deltas() {
            let row = sqlx::query_as::<_, StockRow>(
                "INSERT INTO location_stock (item_id, location, quantity, updated_at) \
                 VALUES ($1, $2, $3, $4) \
                 ON CONFLICT (item_id, location) \
                 DO UPDATE SET quantity = location_stock.quantity + EXCLUDED.quantity, \
                               updated_at = EXCLUDED.updated_at \
                 RETURNING item_id, location, quantity, updated_at",
            )
            .bind(Uuid::from(movement.item_id))
            .bind(&delta.location)
            .bind(delta.delta)
            .bind(movement.created_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(port_err)?;
            stock.push(LocationStock::from(row));
        }

        sqlx::query(
            "INSERT INTO inventory_movements (id, item_id, branch_id, movement_type, quantity, \
             reason, from_location, to_location, performed_by, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(Uuid::from(movement.id))
        .bind(Uuid::from(movement.item_id))
        .bind(Uuid::from(movement.branch_id))
        .bind(movement.movement_type.as_str())
        .bind(movement.quantity)
        .bind(&movement.reason)
        .bind(&movement.from_location)
        .bind(&movement.to_location)
        .bind(Uuid::from(movement.performed_by))
        .bind(movement.created_at)
        .execute(&mut *tx)
        .await
        .map_err(port_err)?;

        tx.commit().await.map_err(port_err)?;
        debug!(quantity = item.quantity, "Movement recorded");
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
        let (limit, offset) = limit_offset(page);
        let branch = query.branch_id.map(Uuid::from);
        let item = query.item_id.map(Uuid::from);
        let movement_type = query.movement_type.map(|t| t.as_str());

        let sql = format!(
            "SELECT {MOVEMENT_COLUMNS} FROM inventory_movements {MOVEMENT_FILTER} \
             ORDER BY created_at DESC LIMIT $4 OFFSET $5"
        );
        let rows = sqlx::query_as::<_, MovementRow>(&sql)
            .bind(branch)
            .bind(item)
            .bind(movement_type)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(port_err)?;

        let count_sql = format!("SELECT COUNT(*) FROM inventory_movements {MOVEMENT_FILTER}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(branch)
            .bind(item)
            .bind(movement_type)
            .fetch_one(&self.pool)
            .await
            .map_err(port_err)?;
        Ok(to_page(convert(rows)?, page, total))
    }

    async fn item_stock(&self, item_id: InventoryItemId) -> Result<Vec<LocationStock>, PortError> {
        let rows = sqlx::query_as::<_, StockRow>(
            "SELECT item_id, location, quantity, updated_at FROM location_stock \
             WHERE item_id = $1 ORDER BY location",
        )
        .bind(Uuid::from(item_id))
        .fetch_all(&self.pool)
        .await
        .map_err(port_err)?;
        Ok(rows.into_iter().map(LocationStock::from).collect())
    }

    #[instrument(skip(self, transfer), fields(item_id = %transfer.item_id))]
    async fn insert_transfer(&self, transfer: Transfer) -> Result<Transfer, PortError> {
        sqlx::query(
            "INSERT INTO inventory_transfers (id, item_id, branch_id, quantity, from_location, \
             to_location, status, notes, requested_by, requested_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(Uuid::from(transfer.id))
        .bind(Uuid::from(transfer.item_id))
        .bind(Uuid::from(transfer.branch_id))
        .bind(transfer.quantity)
        .bind(&transfer.from_location)
        .bind(&transfer.to_location)
        .bind(transfer.status.as_str())
        .bind(&transfer.notes)
        .bind(Uuid::from(transfer.requested_by))
        .bind(transfer.requested_at)
        .execute(&self.pool)
        .await
        .map_err(port_err)?;
        Ok(transfer)
    }

    async fn get_transfer(&self, id: TransferId) -> Result<Transfer, PortError> {
        let mut conn = self.pool.acquire().await.map_err(port_err)?;
        fetch_transfer(&mut conn, id, false).await
    }

    async fn list_transfers(
        &self,
        query: &TransferQuery,
        page: PageRequest,
    ) -> Result<Page<Transfer>, PortError> {
        let (limit, offset) = limit_offset(page);
        let branch = query.branch_id.map(Uuid::from);
        let item = query.item_id.map(Uuid::from);
        let status = query.status.map(|s| s.as_str());

        let sql = format!(
            "SELECT {TRANSFER_COLUMNS} FROM inventory_transfers {TRANSFER_FILTER} \
             ORDER BY requested_at DESC LIMIT $4 OFFSET $5"
        );
        let rows = sqlx::query_as::<_, TransferRow>(&sql)
            .bind(branch)
            .bind(item)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(port_err)?;

        let count_sql = format!("SELECT COUNT(*) FROM inventory_transfers {TRANSFER_FILTER}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(branch)
            .bind(item)
            .bind(status)
            .fetch_one(&self.pool)
            .await
            .map_err(port_err)?;
        Ok(to_page(convert(rows)?, page, total))
    }

    #[instrument(skip(self), fields(transfer_id = %id, action = %action))]
    async fn advance_transfer(
        &self,
        id: TransferId,
        action: TransferAction,
        by: UserId,
        at: DateTime<Utc>,
    ) -> Result<Transfer, PortError> {
        let mut tx = self.pool.begin().await.map_err(port_err)?;
        let mut transfer = fetch_transfer(&mut tx, id, true).await?;
        transfer.advance(action, by, at)?;

        sqlx::query(
            "UPDATE inventory_transfers SET status = $2, approved_by = $3, approved_at = $4, \
             dispatched_by = $5, dispatched_at = $6, completed_by = $7, completed_at = $8, \
             cancelled_by = $9, cancelled_at = $10 WHERE id = $1",
        )
        .bind(Uuid::from(transfer.id))
        .bind(transfer.status.as_str())
        .bind(transfer.approved_by.map(Uuid::from))
        .bind(transfer.approved_at)
        .bind(transfer.dispatched_by.map(Uuid::from))
        .bind(transfer.dispatched_at)
        .bind(transfer.completed_by.map(Uuid::from))
        .bind(transfer.completed_at)
        .bind(transfer.cancelled_by.map(Uuid::from))
        .bind(transfer.cancelled_at)
        .execute(&mut *tx)
        .await
        .map_err(port_err)?;

        tx.commit().await.map_err(port_err)?;
        Ok(transfer)
    }
}
