//! Application state
//!
//! Ports are built once at startup, either over PostgreSQL or in memory, and
//! shared by every request through the services in [`AppState`].

use std::sync::Arc;

use core_kernel::HealthCheckable;
use domain_billing::{BillingPort, BillingService, MemoryBillingPort};
use domain_booking::{BookingPort, BookingService, MemoryBookingPort};
use domain_directory::{DirectoryPort, DirectoryService, MemoryDirectoryPort};
use domain_inventory::{InventoryPort, InventoryService, MemoryInventoryPort};
use domain_payroll::{MemoryPayrollPort, PayrollPort, PayrollService};
use domain_support::{MemorySupportPort, SupportPort, SupportService};
use infra_db::{
    DatabasePool, PostgresBillingAdapter, PostgresBookingAdapter, PostgresDirectoryAdapter,
    PostgresInventoryAdapter, PostgresPayrollAdapter, PostgresSupportAdapter,
};

use crate::config::ApiConfig;

/// The storage ports every service is built from
#[derive(Clone)]
pub struct Ports {
    pub directory: Arc<dyn DirectoryPort>,
    pub billing: Arc<dyn BillingPort>,
    pub payroll: Arc<dyn PayrollPort>,
    pub booking: Arc<dyn BookingPort>,
    pub inventory: Arc<dyn InventoryPort>,
    pub support: Arc<dyn SupportPort>,
    /// The same adapters, seen through their health probes
    pub probes: Vec<Arc<dyn HealthCheckable>>,
}

impl Ports {
    /// Process-local storage; data is lost on restart
    pub fn in_memory() -> Self {
        Self::from_adapters(
            MemoryDirectoryPort::new(),
            MemoryBillingPort::new(),
            MemoryPayrollPort::new(),
            MemoryBookingPort::new(),
            MemoryInventoryPort::new(),
            MemorySupportPort::new(),
        )
    }

    /// PostgreSQL adapters sharing one pool
    pub fn postgres(pool: DatabasePool) -> Self {
        Self::from_adapters(
            PostgresDirectoryAdapter::new(pool.clone()),
            PostgresBillingAdapter::new(pool.clone()),
            PostgresPayrollAdapter::new(pool.clone()),
            PostgresBookingAdapter::new(pool.clone()),
            PostgresInventoryAdapter::new(pool.clone()),
            PostgresSupportAdapter::new(pool),
        )
    }

    fn from_adapters<D, B, P, K, I, S>(
        directory: D,
        billing: B,
        payroll: P,
        booking: K,
        inventory: I,
        support: S,
    ) -> Self
    where
        D: DirectoryPort,
        B: BillingPort,
        P: PayrollPort,
        K: BookingPort,
        I: InventoryPort,
        S: SupportPort,
    {
        let directory = Arc::new(directory);
        let billing = Arc::new(billing);
        let payroll = Arc::new(payroll);
        let booking = Arc::new(booking);
        let inventory = Arc::new(inventory);
        let support = Arc::new(support);

        let probes: Vec<Arc<dyn HealthCheckable>> = vec![
            directory.clone() as Arc<dyn HealthCheckable>,
            billing.clone() as Arc<dyn HealthCheckable>,
            payroll.clone() as Arc<dyn HealthCheckable>,
            booking.clone() as Arc<dyn HealthCheckable>,
            inventory.clone() as Arc<dyn HealthCheckable>,
            support.clone() as Arc<dyn HealthCheckable>,
        ];

        Self {
            directory,
            billing,
            payroll,
            booking,
            inventory,
            support,
            probes,
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub directory: DirectoryService,
    pub billing: BillingService,
    pub payroll: PayrollService,
    pub booking: BookingService,
    pub inventory: InventoryService,
    pub support: SupportService,
    pub probes: Arc<Vec<Arc<dyn HealthCheckable>>>,
}

impl AppState {
    pub fn new(config: ApiConfig, ports: Ports) -> Self {
        let Ports {
            directory,
            billing,
            payroll,
            booking,
            inventory,
            support,
            probes,
        } = ports;

        Self {
            billing: BillingService::new(billing, directory.clone(), config.billing_settings()),
            payroll: PayrollService::new(payroll, directory.clone()),
            booking: BookingService::new(booking, directory.clone(), config.quota_policy()),
            inventory: InventoryService::new(inventory, directory.clone()),
            support: SupportService::new(support, directory.clone()),
            directory: DirectoryService::new(directory),
            config: Arc::new(config),
            probes: Arc::new(probes),
        }
    }
}
