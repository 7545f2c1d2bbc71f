//! Support service tests over the in-memory ports

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use core_kernel::{Actor, BranchId, CustomerId, PageRequest, PortError, Role, UserId};
use domain_directory::{DirectoryPort, DirectoryService, MemoryDirectoryPort, NewBranch, NewCustomer};
use domain_support::{
    ComplaintQuery, ComplaintStatus, ContractStatus, MemorySupportPort, NewComplaint,
    NewContract, NewNotification, NewTask, Priority, StatusChange, SupportError, SupportPort,
    SupportService, TaskQuery, TaskStatus,
};

struct Fixture {
    service: SupportService,
    port: Arc<MemorySupportPort>,
    branch: BranchId,
    customer_id: CustomerId,
    customer: Actor,
    staff: Actor,
    lead: Actor,
    manager: Actor,
}

async fn fixture() -> Fixture {
    let directory = Arc::new(MemoryDirectoryPort::new());
    let admin = Actor::new(UserId::new(), Role::Admin);
    let directory_service = DirectoryService::new(directory.clone());
    let branch = directory_service
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
    let customer = directory_service
        .create_customer(
            &admin,
            NewCustomer {
                branch_id: branch.id,
                name: "Ada Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                phone: None,
                company: None,
                package_id: None,
            },
        )
        .await
        .unwrap();

    let port = Arc::new(MemorySupportPort::new());
    let directory: Arc<dyn DirectoryPort> = directory;
    Fixture {
        service: SupportService::new(port.clone(), directory),
        port,
        branch: branch.id,
        customer_id: customer.id,
        customer: Actor::new(UserId::new(), Role::Customer)
            .in_branch(branch.id)
            .as_customer(customer.id),
        staff: Actor::new(UserId::new(), Role::Staff).in_branch(branch.id),
        lead: Actor::new(UserId::new(), Role::TeamLead).in_branch(branch.id),
        manager: Actor::new(UserId::new(), Role::Manager).in_branch(branch.id),
    }
}

fn complaint_input(branch: BranchId) -> NewComplaint {
    NewComplaint {
        branch_id: branch,
        customer_id: None,
        subject: "Air conditioning".to_string(),
        description: "Room 3 is too warm".to_string(),
        category: Some("facilities".to_string()),
        priority: Priority::High,
        assigned_to: None,
    }
}

#[tokio::test]
async fn test_customer_complaint_lifecycle() {
    let f = fixture().await;
    let complaint = f
        .service
        .create_complaint(&f.customer, complaint_input(f.branch))
        .await
        .unwrap();
    assert_eq!(complaint.customer_id, f.customer_id);
    assert_eq!(complaint.status, ComplaintStatus::Open);

    // Customers cannot move an open complaint forward
    let result = f
        .service
        .change_complaint_status(&f.customer, complaint.id, StatusChange::to(ComplaintStatus::InProgress))
        .await;
    assert!(matches!(result, Err(SupportError::Forbidden(_))));

    f.service
        .change_complaint_status(&f.staff, complaint.id, StatusChange::to(ComplaintStatus::InProgress))
        .await
        .unwrap();
    let resolved = f
        .service
        .change_complaint_status(
            &f.staff,
            complaint.id,
            StatusChange {
                status: ComplaintStatus::Resolved,
                note: Some("Thermostat replaced".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(resolved.resolution.as_deref(), Some("Thermostat replaced"));
    assert!(resolved.resolved_at.is_some());

    let closed = f
        .service
        .change_complaint_status(&f.customer, complaint.id, StatusChange::to(ComplaintStatus::Closed))
        .await
        .unwrap();
    assert_eq!(closed.status, ComplaintStatus::Closed);
}

#[tokio::test]
async fn test_unknown_transition_is_validation_error() {
    let f = fixture().await;
    let complaint = f
        .service
        .create_complaint(&f.customer, complaint_input(f.branch))
        .await
        .unwrap();

    let err = f
        .service
        .change_complaint_status(&f.manager, complaint.id, StatusChange::to(ComplaintStatus::Open))
        .await
        .unwrap_err();
    assert!(matches!(err, SupportError::Validation(ref m) if m == "Invalid status transition"));
}

#[tokio::test]
async fn test_staff_must_name_customer() {
    let f = fixture().await;
    let err = f
        .service
        .create_complaint(&f.staff, complaint_input(f.branch))
        .await
        .unwrap_err();
    assert!(matches!(err, SupportError::Validation(ref m) if m.contains("customerId")));

    let complaint = f
        .service
        .create_complaint(
            &f.staff,
            NewComplaint {
                customer_id: Some(f.customer_id),
                ..complaint_input(f.branch)
            },
        )
        .await
        .unwrap();
    assert_eq!(complaint.created_by, f.staff.user_id);
}

#[tokio::test]
async fn test_customer_cannot_complain_for_someone_else() {
    let f = fixture().await;
    let result = f
        .service
        .create_complaint(
            &f.customer,
            NewComplaint {
                customer_id: Some(CustomerId::new()),
                ..complaint_input(f.branch)
            },
        )
        .await;
    assert!(matches!(result, Err(SupportError::Forbidden(_))));
}

#[tokio::test]
async fn test_customer_lists_only_own_complaints() {
    let f = fixture().await;
    f.service
        .create_complaint(&f.customer, complaint_input(f.branch))
        .await
        .unwrap();

    let other = Actor::new(UserId::new(), Role::Customer)
        .in_branch(f.branch)
        .as_customer(CustomerId::new());
    let page = f
        .service
        .list_complaints(&other, ComplaintQuery::default(), PageRequest::default())
        .await
        .unwrap();
    assert!(page.data.is_empty());

    let page = f
        .service
        .list_complaints(&f.staff, ComplaintQuery::default(), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.pagination.total, 1);
}

#[tokio::test]
async fn test_task_flow_and_cancel_role() {
    let f = fixture().await;
    let task = f
        .service
        .create_task(
            &f.staff,
            NewTask {
                branch_id: f.branch,
                title: "Restock printer paper".to_string(),
                description: None,
                assigned_to: Some(f.staff.user_id),
                due_date: NaiveDate::from_ymd_opt(2030, 1, 15),
                priority: Priority::Low,
            },
        )
        .await
        .unwrap();
    assert_eq!(task.status, TaskStatus::Todo);

    let result = f
        .service
        .change_task_status(&f.staff, task.id, StatusChange::to(TaskStatus::Cancelled))
        .await;
    assert!(matches!(result, Err(SupportError::Forbidden(_))));

    let cancelled = f
        .service
        .change_task_status(&f.lead, task.id, StatusChange::to(TaskStatus::Cancelled))
        .await
        .unwrap();
    assert_eq!(cancelled.status, TaskStatus::Cancelled);

    let result = f
        .service
        .change_task_status(&f.lead, task.id, StatusChange::to(TaskStatus::Todo))
        .await;
    assert!(matches!(result, Err(SupportError::Validation(_))));

    let mine = f
        .service
        .list_tasks(
            &f.staff,
            TaskQuery {
                assigned_to: Some(f.staff.user_id),
                ..Default::default()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(mine.data.len(), 1);
}

#[tokio::test]
async fn test_customers_cannot_see_tasks() {
    let f = fixture().await;
    let result = f
        .service
        .list_tasks(&f.customer, TaskQuery::default(), PageRequest::default())
        .await;
    assert!(matches!(result, Err(SupportError::Forbidden(_))));
}

#[tokio::test]
async fn test_contract_activation_and_termination() {
    let f = fixture().await;
    let input = NewContract {
        branch_id: f.branch,
        customer_id: f.customer_id,
        title: "Dedicated desk 2025".to_string(),
        start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
        monthly_fee: dec!(450),
        document_ref: None,
    };

    let result = f.service.create_contract(&f.lead, input.clone()).await;
    assert!(matches!(result, Err(SupportError::Forbidden(_))));

    let contract = f.service.create_contract(&f.manager, input).await.unwrap();
    assert_eq!(contract.status, ContractStatus::Draft);

    f.service
        .change_contract_status(&f.lead, contract.id, StatusChange::to(ContractStatus::Active))
        .await
        .unwrap();

    let result = f
        .service
        .change_contract_status(&f.lead, contract.id, StatusChange::to(ContractStatus::Terminated))
        .await;
    assert!(matches!(result, Err(SupportError::Forbidden(_))));

    let terminated = f
        .service
        .change_contract_status(&f.manager, contract.id, StatusChange::to(ContractStatus::Terminated))
        .await
        .unwrap();
    assert_eq!(terminated.status, ContractStatus::Terminated);

    let own = f.service.get_contract(&f.customer, contract.id).await.unwrap();
    assert_eq!(own.id, contract.id);
}

#[tokio::test]
async fn test_stale_status_update_conflicts() {
    let f = fixture().await;
    let complaint = f
        .service
        .create_complaint(&f.customer, complaint_input(f.branch))
        .await
        .unwrap();
    f.service
        .change_complaint_status(&f.staff, complaint.id, StatusChange::to(ComplaintStatus::InProgress))
        .await
        .unwrap();

    // A writer that still believes the complaint is open loses
    let result = f.port.update_complaint(complaint, ComplaintStatus::Open).await;
    assert!(matches!(result, Err(PortError::Conflict { .. })));
}

#[tokio::test]
async fn test_notifications_read_by_recipient_only() {
    let f = fixture().await;
    let notification = f
        .service
        .send_notification(
            &f.staff,
            NewNotification {
                recipient_id: f.customer.user_id,
                title: "Booking confirmed".to_string(),
                message: "Room 3, Friday 10:00".to_string(),
                kind: "booking".to_string(),
            },
        )
        .await
        .unwrap();
    assert!(!notification.is_read);

    let result = f.service.mark_notification_read(&f.lead, notification.id).await;
    assert!(matches!(result, Err(SupportError::Forbidden(_))));

    let read = f
        .service
        .mark_notification_read(&f.customer, notification.id)
        .await
        .unwrap();
    assert!(read.is_read);
    let first_read = read.read_at;

    let again = f
        .service
        .mark_notification_read(&f.customer, notification.id)
        .await
        .unwrap();
    assert_eq!(again.read_at, first_read);

    let unread = f
        .service
        .list_notifications(&f.customer, true, PageRequest::default())
        .await
        .unwrap();
    assert!(unread.data.is_empty());
}

#[tokio::test]
async fn test_customers_cannot_send_notifications() {
    let f = fixture().await;
    let result = f
        .service
        .send_notification(
            &f.customer,
            NewNotification {
                recipient_id: f.staff.user_id,
                title: "Hi".to_string(),
                message: "Hello".to_string(),
                kind: "general".to_string(),
            },
        )
        .await;
    assert!(matches!(result, Err(SupportError::Forbidden(_))));
}
