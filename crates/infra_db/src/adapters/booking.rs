//! PostgreSQL Booking Adapter
//!
//! `reserve` serializes on two transaction-scoped advisory locks, one keyed
//! by the customer and one by the room, so the quota guard sees every
//! booking committed before it and none can slip in before the insert.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, PgPool};
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{
    BookingId, BranchId, CustomerId, DateRange, DomainPort, HealthCheckResult, HealthCheckable,
    MonthWindow, PackageId, Page, PageRequest, PortError, RoomId, UserId,
};
use domain_booking::{
    Booking, BookingPort, BookingQuery, MeetingRoom, Package, QuotaGuard, RoomQuery,
};

use super::{convert, limit_offset, to_page};
use crate::error::{decode, port_err, port_err_unique, DatabaseError};
use crate::pool::ping;

const ROOM_COLUMNS: &str = "id, branch_id, name, capacity, hourly_rate, amenities, is_active, created_at";

const PACKAGE_COLUMNS: &str = "id, name, monthly_hours, price, description, is_active, created_at";

const BOOKING_COLUMNS: &str = "id, customer_id, room_id, branch_id, booking_date, start_time, \
     end_time, status, purpose, created_by, created_at, cancelled_at";

const BOOKING_FILTER: &str = "WHERE ($1::uuid IS NULL OR branch_id = $1) \
     AND ($2::uuid IS NULL OR customer_id = $2) \
     AND ($3::uuid IS NULL OR room_id = $3) \
     AND ($4::text IS NULL OR status = $4) \
     AND ($5::date IS NULL OR booking_date >= $5) \
     AND ($6::date IS NULL OR booking_date <= $6)";

/// PostgreSQL-backed implementation of `BookingPort`
#[derive(Debug, Clone)]
pub struct PostgresBookingAdapter {
    pool: PgPool,
}

impl PostgresBookingAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DomainPort for PostgresBookingAdapter {}

#[async_trait]
impl HealthCheckable for PostgresBookingAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-booking").await
    }
}

#[derive(Debug, FromRow)]
struct RoomRow {
    id: Uuid,
    branch_id: Uuid,
    name: String,
    capacity: i32,
    hourly_rate: Decimal,
    amenities: Vec<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<RoomRow> for MeetingRoom {
    type Error = DatabaseError;

    fn try_from(row: RoomRow) -> Result<Self, Self::Error> {
        let capacity = u32::try_from(row.capacity).map_err(|e| DatabaseError::Decode {
            column: "capacity",
            message: e.to_string(),
        })?;
        Ok(MeetingRoom {
            id: RoomId::from(row.id),
            branch_id: BranchId::from(row.branch_id),
            name: row.name,
            capacity,
            hourly_rate: row.hourly_rate,
            amenities: row.amenities,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct PackageRow {
    id: Uuid,
    name: String,
    monthly_hours: i32,
    price: Decimal,
    description: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<PackageRow> for Package {
    type Error = DatabaseError;

    fn try_from(row: PackageRow) -> Result<Self, Self::Error> {
        let monthly_hours = u32::try_from(row.monthly_hours).map_err(|e| DatabaseError::Decode {
            column: "monthly_hours",
            message: e.to_string(),
        })?;
        Ok(Package {
            id: PackageId::from(row.id),
            name: row.name,
            monthly_hours,
            price: row.price,
            description: row.description,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct BookingRow {
    id: Uuid,
    customer_id: Uuid,
    room_id: Uuid,
    branch_id: Uuid,
    booking_date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    status: String,
    purpose: Option<String>,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    cancelled_at: Option<DateTime<Utc>>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = DatabaseError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: BookingId::from(row.id),
            customer_id: CustomerId::from(row.customer_id),
            room_id: RoomId::from(row.room_id),
            branch_id: BranchId::from(row.branch_id),
            date: row.booking_date,
            start_time: row.start_time,
            end_time: row.end_time,
            status: decode("status", &row.status)?,
            purpose: row.purpose,
            created_by: UserId::from(row.created_by),
            created_at: row.created_at,
            cancelled_at: row.cancelled_at,
        })
    }
}

/// Advisory lock key derived from an entity id
fn lock_key(id: Uuid) -> i64 {
    id.as_u64_pair().0 as i64
}

async fn advisory_lock(conn: &mut PgConnection, id: Uuid) -> Result<(), PortError> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(lock_key(id))
        .execute(conn)
        .await
        .map_err(port_err)?;
    Ok(())
}

async fn active_bookings(
    conn: &mut PgConnection,
    filter: &str,
    id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<Booking>, PortError> {
    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE {filter} = $1 \
         AND booking_date BETWEEN $2 AND $3 AND status <> 'CANCELLED' \
         ORDER BY booking_date, start_time"
    );
    let rows = sqlx::query_as::<_, BookingRow>(&sql)
        .bind(id)
        .bind(from)
        .bind(to)
        .fetch_all(conn)
        .await
        .map_err(port_err)?;
    convert(rows)
}

#[async_trait]
impl BookingPort for PostgresBookingAdapter {
    #[instrument(skip(self, room), fields(branch_id = %room.branch_id, name = %room.name))]
    async fn insert_room(&self, room: MeetingRoom) -> Result<MeetingRoom, PortError> {
        sqlx::query(
            "INSERT INTO meeting_rooms (id, branch_id, name, capacity, hourly_rate, amenities, \
             is_active, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(Uuid::from(room.id))
        .bind(Uuid::from(room.branch_id))
        .bind(&room.name)
        .bind(room.capacity as i32)
        .bind(room.hourly_rate)
        .bind(&room.amenities)
        .bind(room.is_active)
        .bind(room.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            port_err_unique(e, || format!("Meeting room {} already exists in this branch", room.name))
        })?;
        Ok(room)
    }

    async fn get_room(&self, id: RoomId) -> Result<MeetingRoom, PortError> {
        let sql = format!("SELECT {ROOM_COLUMNS} FROM meeting_rooms WHERE id = $1");
        let row = sqlx::query_as::<_, RoomRow>(&sql)
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(port_err)?
            .ok_or_else(|| PortError::not_found("MeetingRoom", id))?;
        Ok(MeetingRoom::try_from(row)?)
    }

    async fn list_rooms(
        &self,
        query: &RoomQuery,
        page: PageRequest,
    ) -> Result<Page<MeetingRoom>, PortError> {
        let (limit, offset) = limit_offset(page);
        let filter = "WHERE ($1::uuid IS NULL OR branch_id = $1) AND ($2::bool IS NULL OR is_active = $2)";
        let branch = query.branch_id.map(Uuid::from);

        let sql = format!("SELECT {ROOM_COLUMNS} FROM meeting_rooms {filter} ORDER BY name LIMIT $3 OFFSET $4");
        let rows = sqlx::query_as::<_, RoomRow>(&sql)
            .bind(branch)
            .bind(query.is_active)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(port_err)?;

        let count_sql = format!("SELECT COUNT(*) FROM meeting_rooms {filter}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(branch)
            .bind(query.is_active)
            .fetch_one(&self.pool)
            .await
            .map_err(port_err)?;
        Ok(to_page(convert(rows)?, page, total))
    }

    #[instrument(skip(self, package), fields(name = %package.name))]
    async fn insert_package(&self, package: Package) -> Result<Package, PortError> {
        sqlx::query(
            "INSERT INTO packages (id, name, monthly_hours, price, description, is_active, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(Uuid::from(package.id))
        .bind(&package.name)
        .bind(package.monthly_hours as i32)
        .bind(package.price)
        .bind(&package.description)
        .bind(package.is_active)
        .bind(package.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| port_err_unique(e, || format!("Package {} already exists", package.name)))?;
        Ok(package)
    }

    async fn get_package(&self, id: PackageId) -> Result<Package, PortError> {
        let sql = format!("SELECT {PACKAGE_COLUMNS} FROM packages WHERE id = $1");
        let row = sqlx::query_as::<_, PackageRow>(&sql)
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(port_err)?
            .ok_or_else(|| PortError::not_found("Package", id))?;
        Ok(Package::try_from(row)?)
    }

    async fn list_packages(&self, page: PageRequest) -> Result<Page<Package>, PortError> {
        let (limit, offset) = limit_offset(page);
        let sql = format!("SELECT {PACKAGE_COLUMNS} FROM packages ORDER BY name LIMIT $1 OFFSET $2");
        let rows = sqlx::query_as::<_, PackageRow>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(port_err)?;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM packages")
            .fetch_one(&self.pool)
            .await
            .map_err(port_err)?;
        Ok(to_page(convert(rows)?, page, total))
    }

    async fn customer_bookings(
        &self,
        customer_id: CustomerId,
        dates: DateRange,
    ) -> Result<Vec<Booking>, PortError> {
        let mut conn = self.pool.acquire().await.map_err(port_err)?;
        active_bookings(&mut conn, "customer_id", customer_id.into(), dates.start, dates.end).await
    }

    async fn branch_bookings(
        &self,
        branch_id: BranchId,
        date: NaiveDate,
    ) -> Result<Vec<Booking>, PortError> {
        let mut conn = self.pool.acquire().await.map_err(port_err)?;
        active_bookings(&mut conn, "branch_id", branch_id.into(), date, date).await
    }

    #[instrument(skip(self, booking, guard), fields(customer_id = %booking.customer_id, room_id = %booking.room_id, date = %booking.date))]
    async fn reserve(&self, booking: Booking, guard: QuotaGuard) -> Result<Booking, PortError> {
        let mut tx = self.pool.begin().await.map_err(port_err)?;
        // Fixed order: customer then room
        advisory_lock(&mut tx, booking.customer_id.into()).await?;
        advisory_lock(&mut tx, booking.room_id.into()).await?;

        let month = MonthWindow::containing(booking.date);
        let customer = active_bookings(
            &mut tx,
            "customer_id",
            booking.customer_id.into(),
            month.first,
            month.last,
        )
        .await?;
        let room = active_bookings(&mut tx, "room_id", booking.room_id.into(), booking.date, booking.date).await?;
        guard.check(&booking, &customer, &room)?;

        sqlx::query(
            "INSERT INTO bookings (id, customer_id, room_id, branch_id, booking_date, start_time, \
             end_time, status, purpose, created_by, created_at, cancelled_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(Uuid::from(booking.id))
        .bind(Uuid::from(booking.customer_id))
        .bind(Uuid::from(booking.room_id))
        .bind(Uuid::from(booking.branch_id))
        .bind(booking.date)
        .bind(booking.start_time)
        .bind(booking.end_time)
        .bind(booking.status.as_str())
        .bind(&booking.purpose)
        .bind(Uuid::from(booking.created_by))
        .bind(booking.created_at)
        .bind(booking.cancelled_at)
        .execute(&mut *tx)
        .await
        .map_err(port_err)?;

        tx.commit().await.map_err(port_err)?;
        debug!(booking_id = %booking.id, "Booking reserved");
        Ok(booking)
    }

    async fn get_booking(&self, id: BookingId) -> Result<Booking, PortError> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1");
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(port_err)?
            .ok_or_else(|| PortError::not_found("Booking", id))?;
        Ok(Booking::try_from(row)?)
    }

    async fn list_bookings(
        &self,
        query: &BookingQuery,
        page: PageRequest,
    ) -> Result<Page<Booking>, PortError> {
        let (limit, offset) = limit_offset(page);
        let branch = query.branch_id.map(Uuid::from);
        let customer = query.customer_id.map(Uuid::from);
        let room = query.room_id.map(Uuid::from);
        let status = query.status.map(|s| s.as_str());
        let from = query.dates.map(|d| d.start);
        let to = query.dates.map(|d| d.end);

        let sql = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings {BOOKING_FILTER} \
             ORDER BY booking_date DESC, start_time DESC LIMIT $7 OFFSET $8"
        );
        let rows = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(branch)
            .bind(customer)
            .bind(room)
            .bind(status)
            .bind(from)
            .bind(to)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(port_err)?;

        let count_sql = format!("SELECT COUNT(*) FROM bookings {BOOKING_FILTER}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(branch)
            .bind(customer)
            .bind(room)
            .bind(status)
            .bind(from)
            .bind(to)
            .fetch_one(&self.pool)
            .await
            .map_err(port_err)?;
        Ok(to_page(convert(rows)?, page, total))
    }

    #[instrument(skip(self), fields(booking_id = %id))]
    async fn cancel_booking(
        &self,
        id: BookingId,
        at: DateTime<Utc>,
        started: bool,
    ) -> Result<Booking, PortError> {
        let mut tx = self.pool.begin().await.map_err(port_err)?;
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1 FOR UPDATE");
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(Uuid::from(id))
            .fetch_optional(&mut *tx)
            .await
            .map_err(port_err)?
            .ok_or_else(|| PortError::not_found("Booking", id))?;
        let mut booking = Booking::try_from(row)?;
        booking.cancel(at, started)?;

        sqlx::query("UPDATE bookings SET status = $2, cancelled_at = $3 WHERE id = $1")
            .bind(Uuid::from(booking.id))
            .bind(booking.status.as_str())
            .bind(booking.cancelled_at)
            .execute(&mut *tx)
            .await
            .map_err(port_err)?;

        tx.commit().await.map_err(port_err)?;
        Ok(booking)
    }
}
