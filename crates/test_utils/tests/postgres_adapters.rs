//! PostgreSQL adapter tests
//!
//! Each test starts its own container. Run with `cargo test -- --ignored`
//! on a machine with Docker.

use std::sync::Arc;

use rust_decimal_macros::dec;

use core_kernel::{AdapterHealth, HealthCheckable, PageRequest};
use domain_billing::{
    BillingService, BillingSettings, DocumentKind, DocumentStatus, PaymentMethod, RecordPayment,
};
use domain_booking::{BookingError, BookingService, NewMeetingRoom, QuotaPolicy};
use domain_directory::{DirectoryPort, DirectoryService};
use domain_payroll::{PayrollError, PayrollService};
use infra_db::{
    PostgresBillingAdapter, PostgresBookingAdapter, PostgresDirectoryAdapter, PostgresPayrollAdapter,
};
use test_utils::{
    assert_balance, assert_document_totals, assert_err_variant, assert_ok, ActorFixtures,
    BookingBuilder, BranchBuilder, CustomerBuilder, DatabaseTestAssertions, DocumentBuilder,
    PayrollBuilder, TemporalFixtures, TestDatabase,
};

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_invoice_payment_posts_to_cash_in_one_transaction() {
    let db = TestDatabase::new().await.expect("database");
    let directory: Arc<dyn DirectoryPort> = Arc::new(PostgresDirectoryAdapter::new(db.pool.clone()));
    let directory_service = DirectoryService::new(directory.clone());
    let billing = BillingService::new(
        Arc::new(PostgresBillingAdapter::new(db.pool.clone())),
        directory,
        BillingSettings::default(),
    );
    let admin = ActorFixtures::admin();

    let branch = assert_ok!(directory_service.create_branch(&admin, BranchBuilder::new().build()).await);
    let customer = assert_ok!(
        directory_service
            .create_customer(&admin, CustomerBuilder::new(branch.id).build())
            .await
    );
    let accounts = assert_ok!(billing.seed_chart_of_accounts(&admin, branch.id).await);
    let cash = accounts.iter().find(|a| a.code == "1000").expect("cash account").clone();

    let first = assert_ok!(
        billing
            .create_document(&admin, DocumentBuilder::invoice(customer.id, branch.id).with_day_pass().build())
            .await
    );
    let second = assert_ok!(
        billing
            .create_document(&admin, DocumentBuilder::invoice(customer.id, branch.id).with_day_pass().build())
            .await
    );
    assert_ne!(first.number, second.number);
    assert!(first.number.starts_with("INV-"));

    let recorded = assert_ok!(
        billing
            .record_payment(
                &admin,
                DocumentKind::Invoice,
                first.id,
                RecordPayment {
                    amount: first.total,
                    method: PaymentMethod::Card,
                    reference: None,
                    paid_at: None,
                },
            )
            .await
    );
    assert_eq!(recorded.document.status, DocumentStatus::Paid);
    assert_document_totals(&recorded.document);

    let cash = assert_ok!(billing.get_account(&admin, cash.id).await);
    assert_balance(&cash, dec!(50.00));
    let reconciliation = assert_ok!(billing.reconcile_account(&admin, cash.id).await);
    assert!(reconciliation.is_consistent);

    db.clear_data().await.expect("truncate");
    let leftover = sqlx::query("DELETE FROM branches").execute(db.pool()).await.expect("delete");
    leftover.assert_rows_affected(0);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_overlapping_bookings_are_serialized() {
    let db = TestDatabase::new().await.expect("database");
    let directory: Arc<dyn DirectoryPort> = Arc::new(PostgresDirectoryAdapter::new(db.pool.clone()));
    let directory_service = DirectoryService::new(directory.clone());
    let booking = BookingService::new(
        Arc::new(PostgresBookingAdapter::new(db.pool.clone())),
        directory,
        QuotaPolicy::default(),
    );
    let admin = ActorFixtures::admin();

    let branch = assert_ok!(directory_service.create_branch(&admin, BranchBuilder::new().build()).await);
    let ada = assert_ok!(directory_service.create_customer(&admin, CustomerBuilder::new(branch.id).build()).await);
    let bob = assert_ok!(directory_service.create_customer(&admin, CustomerBuilder::new(branch.id).build()).await);
    let room = assert_ok!(
        booking
            .create_room(
                &admin,
                NewMeetingRoom {
                    branch_id: branch.id,
                    name: "Studio".to_string(),
                    capacity: 4,
                    hourly_rate: dec!(15),
                    amenities: Vec::new(),
                },
            )
            .await
    );
    let now = TemporalFixtures::reference_instant();

    let (a, b) = tokio::join!(
        booking.book_at(&admin, BookingBuilder::new(room.id).for_customer(ada.id).build(), now),
        booking.book_at(&admin, BookingBuilder::new(room.id).for_customer(bob.id).at((9, 30), (10, 30)).build(), now),
    );
    let outcomes = [a.is_ok(), b.is_ok()];
    assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1, "exactly one booking wins");
    let loser = if a.is_err() { a } else { b };
    assert_err_variant!(loser, BookingError::SlotUnavailable);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_duplicate_pay_period_is_rejected() {
    let db = TestDatabase::new().await.expect("database");
    let directory: Arc<dyn DirectoryPort> = Arc::new(PostgresDirectoryAdapter::new(db.pool.clone()));
    let directory_service = DirectoryService::new(directory.clone());
    let payroll = PayrollService::new(Arc::new(PostgresPayrollAdapter::new(db.pool.clone())), directory);
    let admin = ActorFixtures::admin();

    let branch = assert_ok!(directory_service.create_branch(&admin, BranchBuilder::new().build()).await);
    let employee = assert_ok!(
        directory_service
            .create_employee(
                &admin,
                domain_directory::NewEmployee {
                    branch_id: branch.id,
                    name: "Grace Hopper".to_string(),
                    email: test_utils::FakeData::email(),
                    role: core_kernel::Role::Staff,
                    position: None,
                },
            )
            .await
    );

    let input = PayrollBuilder::new(employee.id, branch.id).with_deduction("Tax", dec!(75)).build();
    let created = assert_ok!(payroll.create_payroll(&admin, input.clone()).await);
    assert_eq!(created.net_pay, dec!(925));
    assert_eq!(created.items.len(), 1);

    assert_err_variant!(payroll.create_payroll(&admin, input).await, PayrollError::DuplicatePeriod);

    let page = assert_ok!(payroll.list_payrolls(&admin, Default::default(), PageRequest::default()).await);
    assert_eq!(page.data.len(), 1);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_adapters_report_healthy() {
    let db = TestDatabase::new().await.expect("database");
    let adapter = PostgresDirectoryAdapter::new(db.pool.clone());

    let health = adapter.health_check().await;
    assert_eq!(health.status, AdapterHealth::Healthy, "{health:?}");
}
