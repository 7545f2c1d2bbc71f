//! Inventory service tests over the in-memory ports

use std::sync::Arc;

use rust_decimal_macros::dec;

use core_kernel::{Actor, BranchId, PageRequest, PortError, Role, UserId};
use domain_directory::{DirectoryPort, DirectoryService, MemoryDirectoryPort, NewBranch};
use domain_inventory::{
    InventoryCategory, InventoryError, InventoryItem, InventoryService, ItemQuery,
    MemoryInventoryPort, MovementQuery, MovementType, NewInventoryItem, NewTransfer,
    RecordMovement, TransferAction, TransferStatus, UpdateInventoryItem,
};

struct Fixture {
    service: InventoryService,
    branch: BranchId,
    staff: Actor,
    lead: Actor,
}

async fn fixture() -> Fixture {
    let directory = Arc::new(MemoryDirectoryPort::new());
    let admin = Actor::new(UserId::new(), Role::Admin);
    let branch = DirectoryService::new(directory.clone())
        .create_branch(
            &admin,
            NewBranch {
                code: "HQ".to_string(),
                name: "Headquarters".to_string(),
                timezone: Default::default(),
                address: None,
            },
        )
        .await
        .unwrap();

    let directory: Arc<dyn DirectoryPort> = directory;
    Fixture {
        service: InventoryService::new(Arc::new(MemoryInventoryPort::new()), directory),
        branch: branch.id,
        staff: Actor::new(UserId::new(), Role::Staff).in_branch(branch.id),
        lead: Actor::new(UserId::new(), Role::TeamLead).in_branch(branch.id),
    }
}

async fn chairs(f: &Fixture) -> InventoryItem {
    f.service
        .create_item(
            &f.lead,
            NewInventoryItem {
                branch_id: f.branch,
                name: "Desk chair".to_string(),
                sku: "CHR-01".to_string(),
                category: InventoryCategory::Moveable,
                unit: "pcs".to_string(),
                minimum_stock: 2,
                maximum_stock: Some(40),
                current_price: dec!(120),
            },
        )
        .await
        .unwrap()
}

fn movement(
    item: &InventoryItem,
    movement_type: MovementType,
    quantity: i64,
    from: Option<&str>,
    to: Option<&str>,
) -> RecordMovement {
    RecordMovement {
        item_id: item.id,
        movement_type,
        quantity,
        reason: None,
        from_location: from.map(String::from),
        to_location: to.map(String::from),
    }
}

fn stock_at(rows: &[domain_inventory::LocationStock], location: &str) -> i64 {
    rows.iter()
        .find(|s| s.location == location)
        .map(|s| s.quantity)
        .unwrap_or(0)
}

#[tokio::test]
async fn test_transfer_movement_keeps_total() {
    let f = fixture().await;
    let item = chairs(&f).await;

    let received = f
        .service
        .record_movement(&f.staff, movement(&item, MovementType::In, 10, None, Some("A")))
        .await
        .unwrap();
    assert_eq!(received.item.quantity, 10);

    let moved = f
        .service
        .record_movement(&f.staff, movement(&item, MovementType::Transfer, 5, Some("A"), Some("B")))
        .await
        .unwrap();
    assert_eq!(moved.item.quantity, 10);

    let stock = f.service.item_stock(&f.staff, item.id).await.unwrap();
    assert_eq!(stock_at(&stock, "A"), 5);
    assert_eq!(stock_at(&stock, "B"), 5);
}

#[tokio::test]
async fn test_out_consumption_and_adjustment() {
    let f = fixture().await;
    let item = chairs(&f).await;

    f.service
        .record_movement(&f.staff, movement(&item, MovementType::In, 8, None, Some("Store")))
        .await
        .unwrap();
    f.service
        .record_movement(&f.staff, movement(&item, MovementType::Out, 3, Some("Store"), None))
        .await
        .unwrap();
    f.service
        .record_movement(&f.staff, movement(&item, MovementType::Consumption, 1, Some("Store"), None))
        .await
        .unwrap();
    let adjusted = f
        .service
        .record_movement(&f.staff, movement(&item, MovementType::Adjustment, -2, Some("Store"), None))
        .await
        .unwrap();

    assert_eq!(adjusted.item.quantity, 2);
    assert_eq!(stock_at(&adjusted.stock, "Store"), 2);

    let history = f
        .service
        .list_movements(
            &f.staff,
            MovementQuery {
                item_id: Some(item.id),
                ..MovementQuery::default()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(history.pagination.total, 4);
    assert_eq!(history.data[0].movement_type, MovementType::Adjustment);
}

#[tokio::test]
async fn test_stock_may_go_negative() {
    let f = fixture().await;
    let item = chairs(&f).await;
    let recorded = f
        .service
        .record_movement(&f.staff, movement(&item, MovementType::Out, 4, Some("Empty shelf"), None))
        .await
        .unwrap();
    assert_eq!(recorded.item.quantity, -4);
    assert_eq!(stock_at(&recorded.stock, "Empty shelf"), -4);
}

#[tokio::test]
async fn test_invalid_movement_rejected() {
    let f = fixture().await;
    let item = chairs(&f).await;
    let result = f
        .service
        .record_movement(&f.staff, movement(&item, MovementType::Transfer, 1, Some("A"), None))
        .await;
    assert!(matches!(result, Err(InventoryError::Validation(_))));
}

#[tokio::test]
async fn test_duplicate_sku_conflict() {
    let f = fixture().await;
    chairs(&f).await;
    let again = f
        .service
        .create_item(
            &f.lead,
            NewInventoryItem {
                branch_id: f.branch,
                name: "Other chair".to_string(),
                sku: "chr-01".to_string(),
                category: InventoryCategory::Moveable,
                unit: "pcs".to_string(),
                minimum_stock: 0,
                maximum_stock: None,
                current_price: dec!(0),
            },
        )
        .await;
    assert!(matches!(again, Err(InventoryError::Port(PortError::Conflict { .. }))));
}

#[tokio::test]
async fn test_low_stock_filter_and_deactivate() {
    let f = fixture().await;
    let item = chairs(&f).await;

    let low = f
        .service
        .list_items(
            &f.staff,
            ItemQuery {
                low_stock: true,
                ..ItemQuery::default()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(low.pagination.total, 1);

    let updated = f
        .service
        .update_item(
            &f.lead,
            item.id,
            UpdateInventoryItem {
                name: Some("Ergonomic chair".to_string()),
                ..UpdateInventoryItem::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Ergonomic chair");

    let manager = Actor::new(UserId::new(), Role::Manager).in_branch(f.branch);
    let denied = f.service.deactivate_item(&f.lead, item.id).await;
    assert!(matches!(denied, Err(InventoryError::Forbidden(_))));

    let inactive = f.service.deactivate_item(&manager, item.id).await.unwrap();
    assert!(!inactive.is_active);

    let listed = f
        .service
        .list_items(&f.staff, ItemQuery::default(), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(listed.pagination.total, 0);

    let blocked = f
        .service
        .record_movement(&f.staff, movement(&item, MovementType::In, 1, None, Some("A")))
        .await;
    assert!(matches!(blocked, Err(InventoryError::InactiveItem(_))));
}

#[tokio::test]
async fn test_transfer_workflow_roles() {
    let f = fixture().await;
    let item = chairs(&f).await;
    let transfer = f
        .service
        .request_transfer(
            &f.staff,
            NewTransfer {
                item_id: item.id,
                quantity: 5,
                from_location: "Store".to_string(),
                to_location: "Level 2".to_string(),
                notes: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(transfer.status, TransferStatus::Pending);

    let denied = f
        .service
        .advance_transfer(&f.staff, transfer.id, TransferAction::Approve)
        .await;
    assert!(matches!(denied, Err(InventoryError::Forbidden(_))));

    let approved = f
        .service
        .advance_transfer(&f.lead, transfer.id, TransferAction::Approve)
        .await
        .unwrap();
    assert_eq!(approved.approved_by, Some(f.lead.user_id));

    let dispatched = f
        .service
        .advance_transfer(&f.staff, transfer.id, TransferAction::Dispatch)
        .await
        .unwrap();
    assert_eq!(dispatched.status, TransferStatus::InTransit);

    let completed = f
        .service
        .advance_transfer(&f.lead, transfer.id, TransferAction::Complete)
        .await
        .unwrap();
    assert_eq!(completed.status, TransferStatus::Completed);
}

#[tokio::test]
async fn test_completing_cancelled_transfer_rejected() {
    let f = fixture().await;
    let item = chairs(&f).await;
    let transfer = f
        .service
        .request_transfer(
            &f.staff,
            NewTransfer {
                item_id: item.id,
                quantity: 1,
                from_location: "A".to_string(),
                to_location: "B".to_string(),
                notes: None,
            },
        )
        .await
        .unwrap();

    f.service
        .advance_transfer(&f.staff, transfer.id, TransferAction::Cancel)
        .await
        .unwrap();
    let result = f
        .service
        .advance_transfer(&f.lead, transfer.id, TransferAction::Complete)
        .await;
    assert!(matches!(result, Err(InventoryError::InvalidTransition(_))));
}
