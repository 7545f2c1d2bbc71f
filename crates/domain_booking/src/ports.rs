//! Booking Domain Ports
//!
//! `reserve` is the only multi-step write: it re-runs the quota guard over
//! the customer's bookings for the month and the room's bookings for the
//! day, then inserts, all while reservations for that customer and room
//! are serialized. The PostgreSQL adapter takes transaction-scoped
//! advisory locks on both; the in-memory adapter holds its write guard.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use core_kernel::{
    BookingId, BranchId, CustomerId, DateRange, DomainPort, HealthCheckable, PackageId, Page,
    PageRequest, PortError, RoomId,
};

use crate::booking::{Booking, BookingStatus};
use crate::package::Package;
use crate::quota::QuotaGuard;
use crate::room::MeetingRoom;

/// Filters for listing rooms
#[derive(Debug, Clone, Default)]
pub struct RoomQuery {
    pub branch_id: Option<BranchId>,
    pub is_active: Option<bool>,
}

impl RoomQuery {
    pub fn matches(&self, room: &MeetingRoom) -> bool {
        self.branch_id.map_or(true, |b| room.branch_id == b)
            && self.is_active.map_or(true, |a| room.is_active == a)
    }
}

/// Filters for listing bookings
#[derive(Debug, Clone, Default)]
pub struct BookingQuery {
    pub branch_id: Option<BranchId>,
    pub customer_id: Option<CustomerId>,
    pub room_id: Option<RoomId>,
    pub status: Option<BookingStatus>,
    pub dates: Option<DateRange>,
}

impl BookingQuery {
    pub fn matches(&self, booking: &Booking) -> bool {
        self.branch_id.map_or(true, |b| booking.branch_id == b)
            && self.customer_id.map_or(true, |c| booking.customer_id == c)
            && self.room_id.map_or(true, |r| booking.room_id == r)
            && self.status.map_or(true, |s| booking.status == s)
            && self.dates.map_or(true, |d| d.contains(booking.date))
    }
}

#[async_trait]
pub trait BookingPort: DomainPort + HealthCheckable {
    // ========================================================================
    // Rooms and packages
    // ========================================================================

    async fn insert_room(&self, room: MeetingRoom) -> Result<MeetingRoom, PortError>;

    async fn get_room(&self, id: RoomId) -> Result<MeetingRoom, PortError>;

    async fn list_rooms(
        &self,
        query: &RoomQuery,
        page: PageRequest,
    ) -> Result<Page<MeetingRoom>, PortError>;

    async fn insert_package(&self, package: Package) -> Result<Package, PortError>;

    async fn get_package(&self, id: PackageId) -> Result<Package, PortError>;

    async fn list_packages(&self, page: PageRequest) -> Result<Page<Package>, PortError>;

    // ========================================================================
    // Bookings
    // ========================================================================

    /// Non-cancelled bookings of a customer within a date range
    async fn customer_bookings(
        &self,
        customer_id: CustomerId,
        dates: DateRange,
    ) -> Result<Vec<Booking>, PortError>;

    /// Non-cancelled bookings in a branch on a date, for availability
    async fn branch_bookings(
        &self,
        branch_id: BranchId,
        date: NaiveDate,
    ) -> Result<Vec<Booking>, PortError>;

    /// Checks `guard` and inserts the booking as one atomic unit
    async fn reserve(&self, booking: Booking, guard: QuotaGuard) -> Result<Booking, PortError>;

    async fn get_booking(&self, id: BookingId) -> Result<Booking, PortError>;

    async fn list_bookings(
        &self,
        query: &BookingQuery,
        page: PageRequest,
    ) -> Result<Page<Booking>, PortError>;

    /// Marks a booking cancelled; `started` is evaluated by the caller in branch time
    async fn cancel_booking(
        &self,
        id: BookingId,
        at: DateTime<Utc>,
        started: bool,
    ) -> Result<Booking, PortError>;
}

/// In-memory implementation for tests and the `memory` storage mode
#[cfg(any(test, feature = "memory"))]
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use core_kernel::{HealthCheckResult, MonthWindow};

    #[derive(Debug, Default)]
    struct BookingState {
        rooms: HashMap<RoomId, MeetingRoom>,
        packages: HashMap<PackageId, Package>,
        bookings: HashMap<BookingId, Booking>,
    }

    /// In-memory booking store
    #[derive(Debug, Default, Clone)]
    pub struct MemoryBookingPort {
        state: Arc<RwLock<BookingState>>,
    }

    impl MemoryBookingPort {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl DomainPort for MemoryBookingPort {}

    #[async_trait]
    impl HealthCheckable for MemoryBookingPort {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("memory-booking")
        }
    }

    fn active<'a>(
        bookings: impl Iterator<Item = &'a Booking>,
        keep: impl Fn(&Booking) -> bool,
    ) -> Vec<Booking> {
        bookings.filter(|b| b.is_active() && keep(b)).cloned().collect()
    }

    #[async_trait]
    impl BookingPort for MemoryBookingPort {
        async fn insert_room(&self, room: MeetingRoom) -> Result<MeetingRoom, PortError> {
            let mut state = self.state.write().await;
            let duplicate = state
                .rooms
                .values()
                .any(|r| r.branch_id == room.branch_id && r.name.eq_ignore_ascii_case(&room.name));
            if duplicate {
                return Err(PortError::conflict(format!(
                    "Meeting room {} already exists in this branch",
                    room.name
                )));
            }
            state.rooms.insert(room.id, room.clone());
            Ok(room)
        }

        async fn get_room(&self, id: RoomId) -> Result<MeetingRoom, PortError> {
            self.state
                .read()
                .await
                .rooms
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("MeetingRoom", id))
        }

        async fn list_rooms(
            &self,
            query: &RoomQuery,
            page: PageRequest,
        ) -> Result<Page<MeetingRoom>, PortError> {
            let state = self.state.read().await;
            let mut rooms: Vec<MeetingRoom> =
                state.rooms.values().filter(|r| query.matches(r)).cloned().collect();
            rooms.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(page.slice(&rooms))
        }

        async fn insert_package(&self, package: Package) -> Result<Package, PortError> {
            let mut state = self.state.write().await;
            if state.packages.values().any(|p| p.name.eq_ignore_ascii_case(&package.name)) {
                return Err(PortError::conflict(format!("Package {} already exists", package.name)));
            }
            state.packages.insert(package.id, package.clone());
            Ok(package)
        }

        async fn get_package(&self, id: PackageId) -> Result<Package, PortError> {
            self.state
                .read()
                .await
                .packages
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Package", id))
        }

        async fn list_packages(&self, page: PageRequest) -> Result<Page<Package>, PortError> {
            let state = self.state.read().await;
            let mut packages: Vec<Package> = state.packages.values().cloned().collect();
            packages.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(page.slice(&packages))
        }

        async fn customer_bookings(
            &self,
            customer_id: CustomerId,
            dates: DateRange,
        ) -> Result<Vec<Booking>, PortError> {
            let state = self.state.read().await;
            Ok(active(state.bookings.values(), |b| {
                b.customer_id == customer_id && dates.contains(b.date)
            }))
        }

        async fn branch_bookings(
            &self,
            branch_id: BranchId,
            date: NaiveDate,
        ) -> Result<Vec<Booking>, PortError> {
            let state = self.state.read().await;
            Ok(active(state.bookings.values(), |b| {
                b.branch_id == branch_id && b.date == date
            }))
        }

        async fn reserve(&self, booking: Booking, guard: QuotaGuard) -> Result<Booking, PortError> {
            let mut state = self.state.write().await;
            let month = MonthWindow::containing(booking.date);
            let customer = active(state.bookings.values(), |b| {
                b.customer_id == booking.customer_id && month.contains(b.date)
            });
            let room = active(state.bookings.values(), |b| {
                b.room_id == booking.room_id && b.date == booking.date
            });
            guard.check(&booking, &customer, &room)?;

            state.bookings.insert(booking.id, booking.clone());
            Ok(booking)
        }

        async fn get_booking(&self, id: BookingId) -> Result<Booking, PortError> {
            self.state
                .read()
                .await
                .bookings
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Booking", id))
        }

        async fn list_bookings(
            &self,
            query: &BookingQuery,
            page: PageRequest,
        ) -> Result<Page<Booking>, PortError> {
            let state = self.state.read().await;
            let mut bookings: Vec<Booking> =
                state.bookings.values().filter(|b| query.matches(b)).cloned().collect();
            bookings.sort_by(|a, b| (b.date, b.start_time).cmp(&(a.date, a.start_time)));
            Ok(page.slice(&bookings))
        }

        async fn cancel_booking(
            &self,
            id: BookingId,
            at: DateTime<Utc>,
            started: bool,
        ) -> Result<Booking, PortError> {
            let mut state = self.state.write().await;
            let booking = state
                .bookings
                .get_mut(&id)
                .ok_or_else(|| PortError::not_found("Booking", id))?;
            let mut updated = booking.clone();
            updated.cancel(at, started)?;
            *booking = updated.clone();
            Ok(updated)
        }
    }
}
