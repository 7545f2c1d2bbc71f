//! In-memory Portal Harness
//!
//! Wires every domain service over the in-memory ports, sharing one
//! directory, so cross-domain scenarios run without a database.

use std::sync::Arc;

use core_kernel::{Actor, BranchId, Role};
use domain_billing::{Account, BillingService, BillingSettings, MemoryBillingPort};
use domain_booking::{BookingService, MeetingRoom, MemoryBookingPort, NewMeetingRoom, QuotaPolicy};
use domain_directory::{
    Branch, Customer, DirectoryPort, DirectoryService, Employee, MemoryDirectoryPort, NewEmployee,
    NewVendor, Vendor,
};
use domain_inventory::{InventoryService, MemoryInventoryPort};
use domain_payroll::{MemoryPayrollPort, PayrollService};
use domain_support::{MemorySupportPort, SupportService};
use rust_decimal_macros::dec;

use crate::builders::{BranchBuilder, CustomerBuilder};
use crate::fixtures::{ActorFixtures, FakeData};

/// All portal services over fresh in-memory storage
#[derive(Clone)]
pub struct TestPortal {
    pub directory: DirectoryService,
    pub billing: BillingService,
    pub payroll: PayrollService,
    pub booking: BookingService,
    pub inventory: InventoryService,
    pub support: SupportService,
    pub admin: Actor,
}

impl Default for TestPortal {
    fn default() -> Self {
        Self::new()
    }
}

impl TestPortal {
    pub fn new() -> Self {
        Self::with_settings(BillingSettings::default(), QuotaPolicy::default())
    }

    pub fn with_settings(billing: BillingSettings, quota: QuotaPolicy) -> Self {
        let directory: Arc<dyn DirectoryPort> = Arc::new(MemoryDirectoryPort::new());
        Self {
            billing: BillingService::new(Arc::new(MemoryBillingPort::new()), directory.clone(), billing),
            payroll: PayrollService::new(Arc::new(MemoryPayrollPort::new()), directory.clone()),
            booking: BookingService::new(Arc::new(MemoryBookingPort::new()), directory.clone(), quota),
            inventory: InventoryService::new(Arc::new(MemoryInventoryPort::new()), directory.clone()),
            support: SupportService::new(Arc::new(MemorySupportPort::new()), directory.clone()),
            directory: DirectoryService::new(directory),
            admin: ActorFixtures::admin(),
        }
    }

    pub async fn branch(&self) -> Branch {
        self.directory
            .create_branch(&self.admin, BranchBuilder::new().build())
            .await
            .expect("branch")
    }

    /// A branch with its chart of accounts already seeded
    pub async fn branch_with_accounts(&self) -> (Branch, Vec<Account>) {
        let branch = self.branch().await;
        let accounts = self
            .billing
            .seed_chart_of_accounts(&self.admin, branch.id)
            .await
            .expect("chart of accounts");
        (branch, accounts)
    }

    pub async fn customer(&self, branch_id: BranchId) -> Customer {
        self.directory
            .create_customer(&self.admin, CustomerBuilder::new(branch_id).build())
            .await
            .expect("customer")
    }

    pub async fn employee(&self, branch_id: BranchId) -> Employee {
        let input = NewEmployee {
            branch_id,
            name: FakeData::name(),
            email: FakeData::email(),
            role: Role::Staff,
            position: Some("Community associate".to_string()),
        };
        self.directory
            .create_employee(&self.admin, input)
            .await
            .expect("employee")
    }

    pub async fn vendor(&self, branch_id: BranchId) -> Vendor {
        let input = NewVendor {
            branch_id,
            name: FakeData::company(),
            email: Some(FakeData::email()),
            phone: None,
        };
        self.directory
            .create_vendor(&self.admin, input)
            .await
            .expect("vendor")
    }

    pub async fn room(&self, branch_id: BranchId) -> MeetingRoom {
        let input = NewMeetingRoom {
            branch_id,
            name: "Board Room".to_string(),
            capacity: 10,
            hourly_rate: dec!(25),
            amenities: vec!["Projector".to_string()],
        };
        self.booking
            .create_room(&self.admin, input)
            .await
            .expect("meeting room")
    }
}
