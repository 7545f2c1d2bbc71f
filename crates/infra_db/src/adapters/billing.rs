//! PostgreSQL Billing Adapter
//!
//! Numbers come from PostgreSQL sequences consumed inside the insert
//! transaction. Payments lock the document row `FOR UPDATE`; postings update
//! the account balance in the same transaction, which also locks the row.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, PgPool};
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{
    AccountId, BranchId, Currency, CustomerId, DocumentId, DomainPort, HealthCheckResult,
    HealthCheckable, LineItemId, Page, PageRequest, PaymentId, PortError, TransactionId, UserId,
    VendorId,
};
use domain_billing::{
    Account, AccountQuery, BillingDocument, BillingError, BillingPort, Counterparty, DocumentAction,
    DocumentKind, DocumentQuery, LineItem, NumberSeries, Payment, Posting, PostingTotals,
    RecordedPayment, Transaction, TransactionQuery,
};

use super::{convert, limit_offset, to_page};
use crate::error::{decode, port_err, port_err_unique, DatabaseError};
use crate::pool::ping;

/// PostgreSQL-backed implementation of `BillingPort`
#[derive(Debug, Clone)]
pub struct PostgresBillingAdapter {
    pool: PgPool,
}

impl PostgresBillingAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DomainPort for PostgresBillingAdapter {}

#[async_trait]
impl HealthCheckable for PostgresBillingAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-billing").await
    }
}

// ============================================================================
// Rows
// ============================================================================

const ACCOUNT_COLUMNS: &str = "id, branch_id, code, name, account_type, category, balance, \
     parent_id, description, is_active, created_at, updated_at";

#[derive(Debug, FromRow)]
struct AccountRow {
    id: Uuid,
    branch_id: Uuid,
    code: String,
    name: String,
    account_type: String,
    category: String,
    balance: Decimal,
    parent_id: Option<Uuid>,
    description: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = DatabaseError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        Ok(Account {
            id: AccountId::from(row.id),
            branch_id: BranchId::from(row.branch_id),
            code: row.code,
            name: row.name,
            account_type: decode("account_type", &row.account_type)?,
            category: row.category,
            balance: row.balance,
            parent_id: row.parent_id.map(AccountId::from),
            description: row.description,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const TRANSACTION_COLUMNS: &str = "id, number, entry_type, amount, account_id, branch_id, \
     category, description, reference, transaction_date, created_by, created_at";

const TRANSACTION_FILTER: &str = "WHERE ($1::uuid IS NULL OR branch_id = $1) \
     AND ($2::uuid IS NULL OR account_id = $2) \
     AND ($3::text IS NULL OR entry_type = $3) \
     AND ($4::text IS NULL OR LOWER(category) = LOWER($4)) \
     AND ($5::date IS NULL OR transaction_date >= $5) \
     AND ($6::date IS NULL OR transaction_date <= $6)";

#[derive(Debug, FromRow)]
struct TransactionRow {
    id: Uuid,
    number: String,
    entry_type: String,
    amount: Decimal,
    account_id: Uuid,
    branch_id: Uuid,
    category: String,
    description: String,
    reference: Option<String>,
    transaction_date: NaiveDate,
    created_by: Uuid,
    created_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = DatabaseError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        Ok(Transaction {
            id: TransactionId::from(row.id),
            number: row.number,
            entry_type: decode("entry_type", &row.entry_type)?,
            amount: row.amount,
            account_id: AccountId::from(row.account_id),
            branch_id: BranchId::from(row.branch_id),
            category: row.category,
            description: row.description,
            reference: row.reference,
            transaction_date: row.transaction_date,
            created_by: UserId::from(row.created_by),
            created_at: row.created_at,
        })
    }
}

const DOCUMENT_COLUMNS: &str = "id, kind, number, customer_id, vendor_id, branch_id, issue_date, \
     due_date, subtotal, tax_rate, tax_amount, total, amount_paid, status, notes, created_by, \
     created_at, updated_at";

const DOCUMENT_FILTER: &str = "WHERE kind = $1 \
     AND ($2::uuid IS NULL OR branch_id = $2) \
     AND ($3::uuid IS NULL OR customer_id = $3) \
     AND ($4::uuid IS NULL OR vendor_id = $4) \
     AND ($5::text IS NULL OR status = $5) \
     AND ($6::date IS NULL OR issue_date >= $6) \
     AND ($7::date IS NULL OR issue_date <= $7)";

#[derive(Debug, FromRow)]
struct DocumentRow {
    id: Uuid,
    kind: String,
    number: String,
    customer_id: Option<Uuid>,
    vendor_id: Option<Uuid>,
    branch_id: Uuid,
    issue_date: NaiveDate,
    due_date: NaiveDate,
    subtotal: Decimal,
    tax_rate: Decimal,
    tax_amount: Decimal,
    total: Decimal,
    amount_paid: Decimal,
    status: String,
    notes: Option<String>,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DocumentRow {
    fn into_document(self, items: Vec<LineItem>) -> Result<BillingDocument, DatabaseError> {
        let counterparty = match (self.customer_id, self.vendor_id) {
            (Some(customer), None) => Counterparty::Customer(CustomerId::from(customer)),
            (None, Some(vendor)) => Counterparty::Vendor(VendorId::from(vendor)),
            _ => {
                return Err(DatabaseError::Decode {
                    column: "customer_id",
                    message: format!("document {} must have exactly one counterparty", self.id),
                })
            }
        };
        Ok(BillingDocument {
            id: DocumentId::from(self.id),
            kind: decode("kind", &self.kind)?,
            number: self.number,
            counterparty,
            branch_id: BranchId::from(self.branch_id),
            issue_date: self.issue_date,
            due_date: self.due_date,
            items,
            subtotal: self.subtotal,
            tax_rate: self.tax_rate,
            tax_amount: self.tax_amount,
            total: self.total,
            amount_paid: self.amount_paid,
            status: decode("status", &self.status)?,
            notes: self.notes,
            created_by: UserId::from(self.created_by),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    document_id: Uuid,
    description: String,
    quantity: Decimal,
    unit_price: Decimal,
    amount: Decimal,
}

impl From<ItemRow> for LineItem {
    fn from(row: ItemRow) -> Self {
        LineItem {
            id: LineItemId::from(row.id),
            description: row.description,
            quantity: row.quantity,
            unit_price: row.unit_price,
            amount: row.amount,
        }
    }
}

const PAYMENT_COLUMNS: &str =
    "id, document_id, amount, method, reference, paid_at, recorded_by, created_at";

#[derive(Debug, FromRow)]
struct PaymentRow {
    id: Uuid,
    document_id: Uuid,
    amount: Decimal,
    method: String,
    reference: Option<String>,
    paid_at: DateTime<Utc>,
    recorded_by: Uuid,
    created_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = DatabaseError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: PaymentId::from(row.id),
            document_id: DocumentId::from(row.document_id),
            amount: row.amount,
            method: decode("method", &row.method)?,
            reference: row.reference,
            paid_at: row.paid_at,
            recorded_by: UserId::from(row.recorded_by),
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct TotalsRow {
    account_id: Uuid,
    debits: Decimal,
    credits: Decimal,
}

// ============================================================================
// Statement helpers shared by several port methods
// ============================================================================

/// Takes the next value of a number series inside the caller's transaction
async fn next_number(conn: &mut PgConnection, series: NumberSeries) -> Result<String, PortError> {
    let sql = format!("SELECT nextval('{}')", series.sequence_name());
    let n: i64 = sqlx::query_scalar(&sql)
        .fetch_one(conn)
        .await
        .map_err(port_err)?;
    Ok(series.format(n))
}

/// Numbers a posting, applies its balance delta and stores it
async fn post_in(conn: &mut PgConnection, posting: Posting) -> Result<Transaction, PortError> {
    let updated = sqlx::query(
        "UPDATE accounts SET balance = balance + $2, updated_at = NOW() WHERE id = $1",
    )
    .bind(Uuid::from(posting.account_id))
    .bind(posting.delta())
    .execute(&mut *conn)
    .await
    .map_err(port_err)?;
    if updated.rows_affected() == 0 {
        return Err(PortError::not_found("Account", posting.account_id));
    }

    let number = next_number(&mut *conn, NumberSeries::Transaction).await?;
    let transaction = posting.into_transaction(number);
    sqlx::query(
        "INSERT INTO transactions (id, number, entry_type, amount, account_id, branch_id, category, \
         description, reference, transaction_date, created_by, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
    )
    .bind(Uuid::from(transaction.id))
    .bind(&transaction.number)
    .bind(transaction.entry_type.as_str())
    .bind(transaction.amount)
    .bind(Uuid::from(transaction.account_id))
    .bind(Uuid::from(transaction.branch_id))
    .bind(&transaction.category)
    .bind(&transaction.description)
    .bind(&transaction.reference)
    .bind(transaction.transaction_date)
    .bind(Uuid::from(transaction.created_by))
    .bind(transaction.created_at)
    .execute(&mut *conn)
    .await
    .map_err(port_err)?;

    debug!(number = %transaction.number, "Transaction posted");
    Ok(transaction)
}

async fn load_items(conn: &mut PgConnection, ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<LineItem>>, PortError> {
    let rows = sqlx::query_as::<_, ItemRow>(
        "SELECT id, document_id, description, quantity, unit_price, amount FROM document_items \
         WHERE document_id = ANY($1) ORDER BY document_id, position",
    )
    .bind(ids)
    .fetch_all(conn)
    .await
    .map_err(port_err)?;

    let mut items: HashMap<Uuid, Vec<LineItem>> = HashMap::new();
    for row in rows {
        items.entry(row.document_id).or_default().push(row.into());
    }
    Ok(items)
}

/// Fetches one document of `kind`, optionally locking its row
async fn fetch_document(
    conn: &mut PgConnection,
    kind: DocumentKind,
    id: DocumentId,
    for_update: bool,
) -> Result<BillingDocument, PortError> {
    let lock = if for_update { " FOR UPDATE" } else { "" };
    let sql = format!("SELECT {DOCUMENT_COLUMNS} FROM billing_documents WHERE id = $1 AND kind = $2{lock}");
    let row = sqlx::query_as::<_, DocumentRow>(&sql)
        .bind(Uuid::from(id))
        .bind(kind.as_str())
        .fetch_optional(&mut *conn)
        .await
        .map_err(port_err)?
        .ok_or_else(|| PortError::not_found(kind.label(), id))?;

    let mut items = load_items(&mut *conn, &[row.id]).await?;
    let lines = items.remove(&row.id).unwrap_or_default();
    Ok(row.into_document(lines)?)
}

async fn save_document_state(conn: &mut PgConnection, document: &BillingDocument) -> Result<(), PortError> {
    sqlx::query(
        "UPDATE billing_documents SET amount_paid = $2, status = $3, updated_at = $4 WHERE id = $1",
    )
    .bind(Uuid::from(document.id))
    .bind(document.amount_paid)
    .bind(document.status.as_str())
    .bind(document.updated_at)
    .execute(conn)
    .await
    .map_err(port_err)?;
    Ok(())
}

// ============================================================================
// Port
// ============================================================================

#[async_trait]
impl BillingPort for PostgresBillingAdapter {
    #[instrument(skip(self, account), fields(code = %account.code))]
    async fn insert_account(&self, account: Account) -> Result<Account, PortError> {
        sqlx::query(
            "INSERT INTO accounts (id, branch_id, code, name, account_type, category, balance, \
             parent_id, description, is_active, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(Uuid::from(account.id))
        .bind(Uuid::from(account.branch_id))
        .bind(&account.code)
        .bind(&account.name)
        .bind(account.account_type.as_str())
        .bind(&account.category)
        .bind(account.balance)
        .bind(account.parent_id.map(Uuid::from))
        .bind(&account.description)
        .bind(account.is_active)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            port_err_unique(e, || {
                format!("Account code {} already exists for this branch", account.code)
            })
        })?;
        Ok(account)
    }

    async fn get_account(&self, id: AccountId) -> Result<Account, PortError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1");
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(port_err)?
            .ok_or_else(|| PortError::not_found("Account", id))?;
        Ok(Account::try_from(row)?)
    }

    async fn list_accounts(
        &self,
        query: &AccountQuery,
        page: PageRequest,
    ) -> Result<Page<Account>, PortError> {
        let (limit, offset) = limit_offset(page);
        let filter = "WHERE ($1::uuid IS NULL OR branch_id = $1) \
                      AND ($2::text IS NULL OR account_type = $2) \
                      AND ($3::text IS NULL OR LOWER(category) = LOWER($3))";
        let branch = query.branch_id.map(Uuid::from);
        let account_type = query.account_type.map(|t| t.as_str());

        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts {filter} ORDER BY code LIMIT $4 OFFSET $5");
        let rows = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(branch)
            .bind(account_type)
            .bind(&query.category)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(port_err)?;

        let count_sql = format!("SELECT COUNT(*) FROM accounts {filter}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(branch)
            .bind(account_type)
            .bind(&query.category)
            .fetch_one(&self.pool)
            .await
            .map_err(port_err)?;
        Ok(to_page(convert(rows)?, page, total))
    }

    async fn branch_accounts(&self, branch_id: BranchId) -> Result<Vec<Account>, PortError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE branch_id = $1 ORDER BY code");
        let rows = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(Uuid::from(branch_id))
            .fetch_all(&self.pool)
            .await
            .map_err(port_err)?;
        convert(rows)
    }

    #[instrument(skip(self, posting), fields(account_id = %posting.account_id))]
    async fn post_transaction(&self, posting: Posting) -> Result<Transaction, PortError> {
        let mut tx = self.pool.begin().await.map_err(port_err)?;
        let transaction = post_in(&mut tx, posting).await?;
        tx.commit().await.map_err(port_err)?;
        Ok(transaction)
    }

    async fn get_transaction(&self, id: TransactionId) -> Result<Transaction, PortError> {
        let sql = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = $1");
        let row = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(port_err)?
            .ok_or_else(|| PortError::not_found("Transaction", id))?;
        Ok(Transaction::try_from(row)?)
    }

    async fn list_transactions(
        &self,
        query: &TransactionQuery,
        page: PageRequest,
    ) -> Result<Page<Transaction>, PortError> {
        let (limit, offset) = limit_offset(page);
        let branch = query.branch_id.map(Uuid::from);
        let account = query.account_id.map(Uuid::from);
        let entry_type = query.entry_type.map(|t| t.as_str());
        let from = query.dates.map(|r| r.start);
        let to = query.dates.map(|r| r.end);

        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions {TRANSACTION_FILTER} \
             ORDER BY created_at DESC, number DESC LIMIT $7 OFFSET $8"
        );
        let rows = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(branch)
            .bind(account)
            .bind(entry_type)
            .bind(&query.category)
            .bind(from)
            .bind(to)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(port_err)?;

        let count_sql = format!("SELECT COUNT(*) FROM transactions {TRANSACTION_FILTER}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(branch)
            .bind(account)
            .bind(entry_type)
            .bind(&query.category)
            .bind(from)
            .bind(to)
            .fetch_one(&self.pool)
            .await
            .map_err(port_err)?;
        Ok(to_page(convert(rows)?, page, total))
    }

    async fn account_transactions(&self, account_id: AccountId) -> Result<Vec<Transaction>, PortError> {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE account_id = $1 \
             ORDER BY created_at, number"
        );
        let rows = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(Uuid::from(account_id))
            .fetch_all(&self.pool)
            .await
            .map_err(port_err)?;
        convert(rows)
    }

    async fn posting_totals(&self, branch_id: BranchId) -> Result<Vec<PostingTotals>, PortError> {
        let rows = sqlx::query_as::<_, TotalsRow>(
            "SELECT account_id, \
                 COALESCE(SUM(amount) FILTER (WHERE entry_type = 'DEBIT'), 0) AS debits, \
                 COALESCE(SUM(amount) FILTER (WHERE entry_type = 'CREDIT'), 0) AS credits \
             FROM transactions WHERE branch_id = $1 GROUP BY account_id",
        )
        .bind(Uuid::from(branch_id))
        .fetch_all(&self.pool)
        .await
        .map_err(port_err)?;

        Ok(rows
            .into_iter()
            .map(|row| PostingTotals {
                account_id: AccountId::from(row.account_id),
                debits: row.debits,
                credits: row.credits,
            })
            .collect())
    }

    #[instrument(skip(self, document), fields(kind = %document.kind, branch_id = %document.branch_id))]
    async fn create_document(&self, mut document: BillingDocument) -> Result<BillingDocument, PortError> {
        let mut tx = self.pool.begin().await.map_err(port_err)?;
        document.number = next_number(&mut tx, document.kind.series()).await?;

        let (customer_id, vendor_id) = match document.counterparty {
            Counterparty::Customer(id) => (Some(Uuid::from(id)), None),
            Counterparty::Vendor(id) => (None, Some(Uuid::from(id))),
        };
        sqlx::query(
            "INSERT INTO billing_documents (id, kind, number, customer_id, vendor_id, branch_id, \
             issue_date, due_date, subtotal, tax_rate, tax_amount, total, amount_paid, status, notes, \
             created_by, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)",
        )
        .bind(Uuid::from(document.id))
        .bind(document.kind.as_str())
        .bind(&document.number)
        .bind(customer_id)
        .bind(vendor_id)
        .bind(Uuid::from(document.branch_id))
        .bind(document.issue_date)
        .bind(document.due_date)
        .bind(document.subtotal)
        .bind(document.tax_rate)
        .bind(document.tax_amount)
        .bind(document.total)
        .bind(document.amount_paid)
        .bind(document.status.as_str())
        .bind(&document.notes)
        .bind(Uuid::from(document.created_by))
        .bind(document.created_at)
        .bind(document.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(port_err)?;

        for (position, item) in document.items.iter().enumerate() {
            sqlx::query(
                "INSERT INTO document_items (id, document_id, position, description, quantity, \
                 unit_price, amount) VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(Uuid::from(item.id))
            .bind(Uuid::from(document.id))
            .bind(position as i32)
            .bind(&item.description)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.amount)
            .execute(&mut *tx)
            .await
            .map_err(port_err)?;
        }

        tx.commit().await.map_err(port_err)?;
        debug!(number = %document.number, "Document stored");
        Ok(document)
    }

    async fn get_document(&self, kind: DocumentKind, id: DocumentId) -> Result<BillingDocument, PortError> {
        let mut conn = self.pool.acquire().await.map_err(port_err)?;
        fetch_document(&mut conn, kind, id, false).await
    }

    async fn list_documents(
        &self,
        query: &DocumentQuery,
        page: PageRequest,
    ) -> Result<Page<BillingDocument>, PortError> {
        let (limit, offset) = limit_offset(page);
        let branch = query.branch_id.map(Uuid::from);
        let (customer, vendor) = match query.counterparty {
            Some(Counterparty::Customer(id)) => (Some(Uuid::from(id)), None),
            Some(Counterparty::Vendor(id)) => (None, Some(Uuid::from(id))),
            None => (None, None),
        };
        let status = query.status.map(|s| s.as_str());
        let from = query.issued.map(|r| r.start);
        let to = query.issued.map(|r| r.end);

        let mut conn = self.pool.acquire().await.map_err(port_err)?;
        let sql = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM billing_documents {DOCUMENT_FILTER} \
             ORDER BY number DESC LIMIT $8 OFFSET $9"
        );
        let rows = sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(query.kind.as_str())
            .bind(branch)
            .bind(customer)
            .bind(vendor)
            .bind(status)
            .bind(from)
            .bind(to)
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *conn)
            .await
            .map_err(port_err)?;

        let count_sql = format!("SELECT COUNT(*) FROM billing_documents {DOCUMENT_FILTER}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(query.kind.as_str())
            .bind(branch)
            .bind(customer)
            .bind(vendor)
            .bind(status)
            .bind(from)
            .bind(to)
            .fetch_one(&mut *conn)
            .await
            .map_err(port_err)?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut items = load_items(&mut conn, &ids).await?;
        let documents = rows
            .into_iter()
            .map(|row| {
                let lines = items.remove(&row.id).unwrap_or_default();
                row.into_document(lines).map_err(PortError::from)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(to_page(documents, page, total))
    }

    #[instrument(skip(self), fields(kind = %kind, document_id = %id))]
    async fn transition_document(
        &self,
        kind: DocumentKind,
        id: DocumentId,
        action: DocumentAction,
    ) -> Result<BillingDocument, PortError> {
        let mut tx = self.pool.begin().await.map_err(port_err)?;
        let mut document = fetch_document(&mut tx, kind, id, true).await?;
        action.apply(&mut document)?;
        document.updated_at = Utc::now();
        save_document_state(&mut tx, &document).await?;
        tx.commit().await.map_err(port_err)?;
        Ok(document)
    }

    #[instrument(skip(self, payment, cash_posting), fields(document_id = %payment.document_id, amount = %payment.amount))]
    async fn record_payment(
        &self,
        kind: DocumentKind,
        payment: Payment,
        cash_posting: Option<Posting>,
        currency: Currency,
    ) -> Result<RecordedPayment, BillingError> {
        let mut tx = self.pool.begin().await.map_err(port_err)?;
        let mut document = fetch_document(&mut tx, kind, payment.document_id, true).await?;
        document.apply_payment(payment.amount, currency)?;

        sqlx::query(
            "INSERT INTO payments (id, document_id, amount, method, reference, paid_at, recorded_by, \
             created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(Uuid::from(payment.id))
        .bind(Uuid::from(payment.document_id))
        .bind(payment.amount)
        .bind(payment.method.as_str())
        .bind(&payment.reference)
        .bind(payment.paid_at)
        .bind(Uuid::from(payment.recorded_by))
        .bind(payment.created_at)
        .execute(&mut *tx)
        .await
        .map_err(port_err)?;
        save_document_state(&mut tx, &document).await?;

        let transaction = match cash_posting {
            Some(posting) => Some(post_in(&mut tx, posting).await?),
            None => None,
        };

        tx.commit().await.map_err(port_err)?;
        Ok(RecordedPayment {
            payment,
            document,
            transaction,
        })
    }

    async fn list_payments(&self, document_id: DocumentId) -> Result<Vec<Payment>, PortError> {
        let sql = format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE document_id = $1 ORDER BY paid_at, created_at"
        );
        let rows = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(Uuid::from(document_id))
            .fetch_all(&self.pool)
            .await
            .map_err(port_err)?;
        convert(rows)
    }
}
