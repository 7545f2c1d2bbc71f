//! Billing service tests over the in-memory ports

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{
    Actor, BranchId, Currency, CustomerId, PageRequest, PortError, Role, UserId, VendorId,
};
use domain_billing::{
    AccountQuery, AccountType, BillingError, BillingPort, BillingService, BillingSettings, Counterparty,
    DocumentDraft, DocumentKind, DocumentQuery, DocumentStatus, EntryType, LineItemInput,
    MemoryBillingPort, NewAccount, Payment, PaymentMethod, PostTransaction, RecordPayment,
    TransactionQuery, INVOICE_PAYMENT_CATEGORY,
};
use domain_directory::{DirectoryPort, MemoryDirectoryPort, NewBranch, NewCustomer, NewVendor, DirectoryService};

struct Fixture {
    service: BillingService,
    port: Arc<MemoryBillingPort>,
    branch: BranchId,
    customer: CustomerId,
    vendor: VendorId,
    manager: Actor,
}

async fn fixture_with(settings: BillingSettings) -> Fixture {
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
                name: "Ada Member".to_string(),
                email: "ada@example.com".to_string(),
                phone: None,
                company: None,
                package_id: None,
            },
        )
        .await
        .unwrap();
    let vendor = directory_service
        .create_vendor(
            &admin,
            NewVendor {
                branch_id: branch.id,
                name: "Clean Co".to_string(),
                email: None,
                phone: None,
            },
        )
        .await
        .unwrap();

    let directory: Arc<dyn DirectoryPort> = directory;
    let port = Arc::new(MemoryBillingPort::new());
    Fixture {
        service: BillingService::new(port.clone(), directory, settings),
        port,
        branch: branch.id,
        customer: customer.id,
        vendor: vendor.id,
        manager: Actor::new(UserId::new(), Role::Manager).in_branch(branch.id),
    }
}

async fn fixture() -> Fixture {
    fixture_with(BillingSettings::default()).await
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn draft(counterparty: Counterparty, branch: BranchId, items: Vec<(Decimal, Decimal)>, tax: Option<Decimal>) -> DocumentDraft {
    DocumentDraft {
        counterparty,
        branch_id: branch,
        issue_date: date(2024, 3, 1),
        due_date: date(2024, 3, 31),
        items: items
            .into_iter()
            .enumerate()
            .map(|(i, (quantity, unit_price))| LineItemInput {
                description: format!("Item {}", i + 1),
                quantity,
                unit_price,
            })
            .collect(),
        tax_rate: tax,
        notes: None,
    }
}

fn payment(amount: Decimal) -> RecordPayment {
    RecordPayment {
        amount,
        method: PaymentMethod::BankTransfer,
        reference: None,
        paid_at: None,
    }
}

#[tokio::test]
async fn test_invoice_totals_and_number() {
    let f = fixture().await;
    let invoice = f
        .service
        .create_document(
            &f.manager,
            draft(
                Counterparty::Customer(f.customer),
                f.branch,
                vec![(dec!(2), dec!(50)), (dec!(1), dec!(100))],
                Some(dec!(10)),
            ),
        )
        .await
        .unwrap();

    assert_eq!(invoice.kind, DocumentKind::Invoice);
    assert_eq!(invoice.number, "INV-000001");
    assert_eq!(invoice.subtotal, dec!(200));
    assert_eq!(invoice.tax_amount, dec!(20.00));
    assert_eq!(invoice.total, dec!(220.00));
    assert_eq!(invoice.status, DocumentStatus::Draft);

    let second = f
        .service
        .create_document(
            &f.manager,
            draft(Counterparty::Customer(f.customer), f.branch, vec![(dec!(1), dec!(10))], None),
        )
        .await
        .unwrap();
    assert_eq!(second.number, "INV-000002");
}

#[tokio::test]
async fn test_invoice_payment_posts_to_cash_account() {
    let f = fixture().await;
    f.service.seed_chart_of_accounts(&f.manager, f.branch).await.unwrap();

    let invoice = f
        .service
        .create_document(
            &f.manager,
            draft(
                Counterparty::Customer(f.customer),
                f.branch,
                vec![(dec!(2), dec!(50)), (dec!(1), dec!(100))],
                Some(dec!(10)),
            ),
        )
        .await
        .unwrap();

    let first = f
        .service
        .record_payment(&f.manager, DocumentKind::Invoice, invoice.id, payment(dec!(110)))
        .await
        .unwrap();
    assert_eq!(first.document.amount_paid, dec!(110));
    assert_eq!(first.document.status, DocumentStatus::Partial);

    let posting = first.transaction.expect("cash posting");
    assert_eq!(posting.entry_type, EntryType::Debit);
    assert_eq!(posting.amount, dec!(110));
    assert_eq!(posting.category, INVOICE_PAYMENT_CATEGORY);
    assert_eq!(posting.reference.as_deref(), Some(invoice.number.as_str()));
    assert_eq!(posting.number, "TXN-000001");

    let overpay = f
        .service
        .record_payment(&f.manager, DocumentKind::Invoice, invoice.id, payment(dec!(111)))
        .await;
    match overpay {
        Err(e @ BillingError::PaymentExceedsBalance { .. }) => {
            assert_eq!(e.to_string(), "Payment amount exceeds remaining balance of $110.00");
        }
        other => panic!("expected PaymentExceedsBalance, got {:?}", other.map(|r| r.document.status)),
    }

    let second = f
        .service
        .record_payment(&f.manager, DocumentKind::Invoice, invoice.id, payment(dec!(110)))
        .await
        .unwrap();
    assert_eq!(second.document.status, DocumentStatus::Paid);
    assert_eq!(second.document.amount_paid, dec!(220));

    let cash = f
        .service
        .list_accounts(&f.manager, AccountQuery::default(), PageRequest::default())
        .await
        .unwrap()
        .data
        .into_iter()
        .find(|a| a.code == "1000")
        .unwrap();
    assert_eq!(cash.balance, dec!(220));

    let payments = f
        .service
        .list_payments(&f.manager, DocumentKind::Invoice, invoice.id)
        .await
        .unwrap();
    assert_eq!(payments.len(), 2);
}

#[tokio::test]
async fn test_missing_cash_account_is_configuration_error() {
    let f = fixture().await;
    let invoice = f
        .service
        .create_document(
            &f.manager,
            draft(Counterparty::Customer(f.customer), f.branch, vec![(dec!(1), dec!(80))], None),
        )
        .await
        .unwrap();

    let result = f
        .service
        .record_payment(&f.manager, DocumentKind::Invoice, invoice.id, payment(dec!(80)))
        .await;
    let err = result.unwrap_err();
    assert!(err.is_configuration());

    let unchanged = f
        .service
        .get_document(&f.manager, DocumentKind::Invoice, invoice.id)
        .await
        .unwrap();
    assert_eq!(unchanged.amount_paid, Decimal::ZERO);
}

#[tokio::test]
async fn test_missing_cash_account_skipped_when_not_required() {
    let f = fixture_with(BillingSettings {
        require_cash_account: false,
        ..BillingSettings::default()
    })
    .await;
    let invoice = f
        .service
        .create_document(
            &f.manager,
            draft(Counterparty::Customer(f.customer), f.branch, vec![(dec!(1), dec!(80))], None),
        )
        .await
        .unwrap();

    let recorded = f
        .service
        .record_payment(&f.manager, DocumentKind::Invoice, invoice.id, payment(dec!(80)))
        .await
        .unwrap();
    assert_eq!(recorded.document.status, DocumentStatus::Paid);
    assert!(recorded.transaction.is_none());
}

#[tokio::test]
async fn test_bill_payment_does_not_post() {
    let f = fixture().await;
    f.service.seed_chart_of_accounts(&f.manager, f.branch).await.unwrap();
    let bill = f
        .service
        .create_document(
            &f.manager,
            draft(Counterparty::Vendor(f.vendor), f.branch, vec![(dec!(3), dec!(25))], None),
        )
        .await
        .unwrap();
    assert_eq!(bill.kind, DocumentKind::Bill);
    assert_eq!(bill.number, "BILL-000001");

    let recorded = f
        .service
        .record_payment(&f.manager, DocumentKind::Bill, bill.id, payment(dec!(75)))
        .await
        .unwrap();
    assert_eq!(recorded.document.status, DocumentStatus::Paid);
    assert!(recorded.transaction.is_none());

    // Bills are not visible through the invoice lookup
    let as_invoice = f.service.get_document(&f.manager, DocumentKind::Invoice, bill.id).await;
    assert!(matches!(as_invoice, Err(BillingError::Port(PortError::NotFound { .. }))));
}

#[tokio::test]
async fn test_staff_cannot_create_bills() {
    let f = fixture().await;
    let staff = Actor::new(UserId::new(), Role::Staff).in_branch(f.branch);
    let result = f
        .service
        .create_document(
            &staff,
            draft(Counterparty::Vendor(f.vendor), f.branch, vec![(dec!(1), dec!(10))], None),
        )
        .await;
    assert!(matches!(result, Err(BillingError::Forbidden(_))));
}

#[tokio::test]
async fn test_document_validation() {
    let f = fixture().await;
    let empty = f
        .service
        .create_document(&f.manager, draft(Counterparty::Customer(f.customer), f.branch, vec![], None))
        .await;
    assert!(matches!(empty, Err(BillingError::Validation(ref m)) if m == "Missing required fields"));

    let bad_tax = f
        .service
        .create_document(
            &f.manager,
            draft(Counterparty::Customer(f.customer), f.branch, vec![(dec!(1), dec!(10))], Some(dec!(101))),
        )
        .await;
    assert!(matches!(bad_tax, Err(BillingError::Validation(ref m)) if m == "Tax rate must be between 0 and 100"));

    let unknown_customer = f
        .service
        .create_document(
            &f.manager,
            draft(Counterparty::Customer(CustomerId::new()), f.branch, vec![(dec!(1), dec!(10))], None),
        )
        .await;
    assert!(matches!(unknown_customer, Err(BillingError::Port(PortError::NotFound { .. }))));
}

#[tokio::test]
async fn test_issue_and_cancel() {
    let f = fixture().await;
    let invoice = f
        .service
        .create_document(
            &f.manager,
            draft(Counterparty::Customer(f.customer), f.branch, vec![(dec!(1), dec!(10))], None),
        )
        .await
        .unwrap();

    let issued = f
        .service
        .issue_document(&f.manager, DocumentKind::Invoice, invoice.id)
        .await
        .unwrap();
    assert_eq!(issued.status, DocumentStatus::Pending);

    let again = f.service.issue_document(&f.manager, DocumentKind::Invoice, invoice.id).await;
    assert!(again.is_err());

    let cancelled = f
        .service
        .cancel_document(&f.manager, DocumentKind::Invoice, invoice.id)
        .await
        .unwrap();
    assert_eq!(cancelled.status, DocumentStatus::Cancelled);

    let pay = f
        .service
        .record_payment(&f.manager, DocumentKind::Invoice, invoice.id, payment(dec!(5)))
        .await;
    assert!(pay.is_err());
}

#[tokio::test]
async fn test_customer_sees_only_own_invoices() {
    let f = fixture().await;
    let invoice = f
        .service
        .create_document(
            &f.manager,
            draft(Counterparty::Customer(f.customer), f.branch, vec![(dec!(1), dec!(10))], None),
        )
        .await
        .unwrap();

    let owner = Actor::new(UserId::new(), Role::Customer)
        .in_branch(f.branch)
        .as_customer(f.customer);
    let stranger = Actor::new(UserId::new(), Role::Customer)
        .in_branch(f.branch)
        .as_customer(CustomerId::new());

    assert!(f.service.get_document(&owner, DocumentKind::Invoice, invoice.id).await.is_ok());
    assert!(matches!(
        f.service.get_document(&stranger, DocumentKind::Invoice, invoice.id).await,
        Err(BillingError::Forbidden(_))
    ));

    let listed = f
        .service
        .list_documents(&stranger, DocumentQuery::new(DocumentKind::Invoice), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(listed.pagination.total, 0);
}

#[tokio::test]
async fn test_manual_posting_and_trial_balance() {
    let f = fixture().await;
    let cash = f
        .service
        .create_account(
            &f.manager,
            NewAccount {
                branch_id: f.branch,
                code: "1000".to_string(),
                name: "Cash".to_string(),
                account_type: AccountType::Asset,
                category: "Current Asset".to_string(),
                parent_id: None,
                description: None,
            },
        )
        .await
        .unwrap();

    let post = |entry_type, amount| PostTransaction {
        branch_id: f.branch,
        account_id: cash.id,
        entry_type,
        amount,
        description: "Float".to_string(),
        category: "Adjustment".to_string(),
        reference: None,
        transaction_date: Some(date(2024, 3, 5)),
    };

    f.service.post_transaction(&f.manager, post(EntryType::Debit, dec!(500))).await.unwrap();
    f.service.post_transaction(&f.manager, post(EntryType::Credit, dec!(120))).await.unwrap();

    let zero = f.service.post_transaction(&f.manager, post(EntryType::Debit, Decimal::ZERO)).await;
    assert!(matches!(zero, Err(BillingError::Validation(_))));

    let account = f.service.get_account(&f.manager, cash.id).await.unwrap();
    assert_eq!(account.balance, dec!(380));

    let reconciliation = f.service.reconcile_account(&f.manager, cash.id).await.unwrap();
    assert!(reconciliation.is_consistent);
    assert_eq!(reconciliation.posting_count, 2);

    let trial = f.service.trial_balance(&f.manager, None).await.unwrap();
    assert_eq!(trial.total_debits, dec!(500));
    assert_eq!(trial.total_credits, dec!(120));

    let debits = f
        .service
        .list_transactions(
            &f.manager,
            TransactionQuery {
                entry_type: Some(EntryType::Debit),
                ..TransactionQuery::default()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(debits.pagination.total, 1);
}

#[tokio::test]
async fn test_posting_to_other_branch_account_rejected() {
    let f = fixture().await;
    let accounts = f.service.seed_chart_of_accounts(&f.manager, f.branch).await.unwrap();
    let admin = Actor::new(UserId::new(), Role::Admin);

    let result = f
        .service
        .post_transaction(
            &admin,
            PostTransaction {
                branch_id: BranchId::new(),
                account_id: accounts[0].id,
                entry_type: EntryType::Debit,
                amount: dec!(10),
                description: "Misrouted".to_string(),
                category: "Adjustment".to_string(),
                reference: None,
                transaction_date: None,
            },
        )
        .await;
    assert!(matches!(result, Err(BillingError::AccountBranchMismatch { .. })));
}

#[tokio::test]
async fn test_seeding_twice_is_harmless() {
    let f = fixture().await;
    let first = f.service.seed_chart_of_accounts(&f.manager, f.branch).await.unwrap();
    let second = f.service.seed_chart_of_accounts(&f.manager, f.branch).await.unwrap();
    assert!(!first.is_empty());
    assert!(second.is_empty());
}

mod proptests {
    use super::*;
    use domain_billing::{BillingDocument, DocumentTotals, LineItem};
    use core_kernel::{LineItemId, Rate};
    use proptest::prelude::*;

    fn line(quantity: i64, cents: i64) -> LineItem {
        let quantity = Decimal::from(quantity);
        let unit_price = Decimal::new(cents, 2);
        LineItem {
            id: LineItemId::new(),
            description: "Desk".to_string(),
            quantity,
            unit_price,
            amount: quantity * unit_price,
        }
    }

    proptest! {
        #[test]
        fn total_is_subtotal_plus_rounded_tax(
            items in prop::collection::vec((1i64..20, 0i64..100_000), 1..8),
            tax in 0u32..=100,
        ) {
            let lines: Vec<LineItem> = items.iter().map(|(q, c)| line(*q, *c)).collect();
            let totals = DocumentTotals::compute(&lines, Rate::from_percentage(Decimal::from(tax)));
            prop_assert_eq!(totals.total, totals.subtotal + totals.tax_amount);
            prop_assert!(totals.tax_amount.scale() <= 2);
            prop_assert!(totals.tax_amount >= Decimal::ZERO);
        }

        #[test]
        fn payments_never_exceed_total(amounts in prop::collection::vec(1i64..50_000, 1..10)) {
            let draft = DocumentDraft {
                counterparty: Counterparty::Customer(CustomerId::new()),
                branch_id: BranchId::new(),
                issue_date: date(2024, 1, 1),
                due_date: date(2024, 1, 31),
                items: vec![LineItemInput {
                    description: "Membership".to_string(),
                    quantity: dec!(1),
                    unit_price: dec!(250),
                }],
                tax_rate: None,
                notes: None,
            };
            let mut document = BillingDocument::compose(draft, UserId::new()).unwrap();
            for cents in amounts {
                let before = document.amount_paid;
                match document.apply_payment(Decimal::new(cents, 2), core_kernel::Currency::USD) {
                    Ok(()) => prop_assert_eq!(
                        document.status,
                        DocumentStatus::for_payment(document.amount_paid, document.total)
                    ),
                    Err(_) => prop_assert_eq!(document.amount_paid, before),
                }
                prop_assert!(document.amount_paid <= document.total);
            }
        }
    }
}

#[tokio::test]
async fn test_store_recheck_keeps_payment_error_variant() {
    let f = fixture().await;
    let bill = f
        .service
        .create_document(
            &f.manager,
            draft(Counterparty::Vendor(f.vendor), f.branch, vec![(dec!(3), dec!(25))], None),
        )
        .await
        .unwrap();
    f.service
        .record_payment(&f.manager, DocumentKind::Bill, bill.id, payment(dec!(50)))
        .await
        .unwrap();

    // A payment that passed the service check before a concurrent one landed
    let late = Payment::new(bill.id, payment(dec!(50)), f.manager.user_id);
    let result = f.port.record_payment(DocumentKind::Bill, late, None, Currency::USD).await;
    match result {
        Err(BillingError::PaymentExceedsBalance { remaining }) => assert_eq!(remaining, "$25.00"),
        other => panic!("expected PaymentExceedsBalance, got {:?}", other.map(|r| r.payment.id)),
    }

    let payments = f.service.list_payments(&f.manager, DocumentKind::Bill, bill.id).await.unwrap();
    assert_eq!(payments.len(), 1);
}
