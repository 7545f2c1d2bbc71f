//! Directory service tests over the in-memory port

use std::sync::Arc;

use core_kernel::{Actor, PageRequest, PackageId, PortError, Role, UserId};
use domain_directory::{
    CustomerQuery, CustomerStatus, DirectoryError, DirectoryService, EmployeeQuery,
    MemoryDirectoryPort, NewBranch, NewCustomer, NewEmployee, NewVendor,
};

fn admin() -> Actor {
    Actor::new(UserId::new(), Role::Admin)
}

fn branch_input(code: &str) -> NewBranch {
    NewBranch {
        code: code.to_string(),
        name: format!("Branch {}", code),
        timezone: "Europe/London".parse().unwrap(),
        address: Some("1 High Street".to_string()),
    }
}

fn service() -> DirectoryService {
    DirectoryService::new(Arc::new(MemoryDirectoryPort::new()))
}

#[tokio::test]
async fn test_branch_code_unique() {
    let service = service();
    service.create_branch(&admin(), branch_input("LDN")).await.unwrap();
    let result = service.create_branch(&admin(), branch_input("ldn")).await;
    assert!(matches!(result, Err(DirectoryError::Port(PortError::Conflict { .. }))));
}

#[tokio::test]
async fn test_only_admin_creates_branches() {
    let service = service();
    let manager = Actor::new(UserId::new(), Role::Manager);
    let result = service.create_branch(&manager, branch_input("MCR")).await;
    assert!(matches!(result, Err(DirectoryError::Forbidden(_))));
}

#[tokio::test]
async fn test_customer_listing_is_branch_scoped() {
    let service = service();
    let north = service.create_branch(&admin(), branch_input("N")).await.unwrap();
    let south = service.create_branch(&admin(), branch_input("S")).await.unwrap();

    for (i, branch) in [north.id, north.id, south.id].into_iter().enumerate() {
        service
            .create_customer(
                &admin(),
                NewCustomer {
                    branch_id: branch,
                    name: format!("Member {}", i),
                    email: format!("member{}@example.com", i),
                    phone: None,
                    company: None,
                    package_id: None,
                },
            )
            .await
            .unwrap();
    }

    let staff = Actor::new(UserId::new(), Role::Staff).in_branch(north.id);
    let page = service
        .list_customers(
            &staff,
            CustomerQuery {
                branch_id: Some(south.id),
                ..Default::default()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(page.pagination.total, 2);
    assert!(page.data.iter().all(|c| c.branch_id == north.id));

    let all = service
        .list_customers(&admin(), CustomerQuery::default(), PageRequest::new(Some(1), Some(2)))
        .await
        .unwrap();
    assert_eq!(all.pagination.total, 3);
    assert_eq!(all.pagination.pages, 2);
    assert_eq!(all.data.len(), 2);
}

#[tokio::test]
async fn test_status_filter_and_package_assignment() {
    let service = service();
    let branch = service.create_branch(&admin(), branch_input("HQ")).await.unwrap();
    let customer = service
        .create_customer(
            &admin(),
            NewCustomer {
                branch_id: branch.id,
                name: "Linus".to_string(),
                email: "linus@example.com".to_string(),
                phone: Some("+44 20 0000 0000".to_string()),
                company: None,
                package_id: None,
            },
        )
        .await
        .unwrap();

    service
        .set_customer_status(&admin(), customer.id, CustomerStatus::Locked)
        .await
        .unwrap();
    let locked = service
        .list_customers(
            &admin(),
            CustomerQuery {
                status: Some(CustomerStatus::Locked),
                ..Default::default()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(locked.data.len(), 1);

    let package = PackageId::new();
    let updated = service
        .assign_package(&admin(), customer.id, Some(package))
        .await
        .unwrap();
    assert_eq!(updated.package_id, Some(package));
}

#[tokio::test]
async fn test_manager_cannot_grant_admin_role() {
    let service = service();
    let branch = service.create_branch(&admin(), branch_input("HQ")).await.unwrap();
    let manager = Actor::new(UserId::new(), Role::Manager).in_branch(branch.id);

    let result = service
        .create_employee(
            &manager,
            NewEmployee {
                branch_id: branch.id,
                name: "Root".to_string(),
                email: "root@example.com".to_string(),
                role: Role::Admin,
                position: None,
            },
        )
        .await;
    assert!(matches!(result, Err(DirectoryError::Forbidden(_))));

    let employee = service
        .create_employee(
            &manager,
            NewEmployee {
                branch_id: branch.id,
                name: "Front Desk".to_string(),
                email: "desk@example.com".to_string(),
                role: Role::Staff,
                position: Some("Receptionist".to_string()),
            },
        )
        .await
        .unwrap();
    let listed = service
        .list_employees(&manager, EmployeeQuery::default(), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(listed.data[0].id, employee.id);
}

#[tokio::test]
async fn test_vendor_requires_known_branch() {
    let service = service();
    let result = service
        .create_vendor(
            &admin(),
            NewVendor {
                branch_id: core_kernel::BranchId::new(),
                name: "Cleaning Co".to_string(),
                email: None,
                phone: None,
            },
        )
        .await;
    assert!(matches!(result, Err(DirectoryError::Port(PortError::NotFound { .. }))));
}
