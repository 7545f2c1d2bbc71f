//! Booking service
//!
//! Rooms, packages, reservations and quota reporting. Methods that depend
//! on the current time have an `_at` variant taking `now` explicitly.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, instrument, warn};
use validator::Validate;

use core_kernel::{
    Actor, BookingId, BranchId, CoreError, CustomerId, DateRange, MonthWindow, PackageId, Page,
    PageRequest, Role, RoomId, TimeSlot, Timezone,
};
use domain_directory::{Customer, DirectoryPort};

use crate::booking::{Booking, BookingRequest};
use crate::error::BookingError;
use crate::package::{NewPackage, Package};
use crate::ports::{BookingPort, BookingQuery, RoomQuery};
use crate::quota::{QuotaGuard, QuotaPolicy, QuotaUsage};
use crate::room::{MeetingRoom, NewMeetingRoom};

/// Application service for meeting rooms and bookings
#[derive(Clone)]
pub struct BookingService {
    port: Arc<dyn BookingPort>,
    directory: Arc<dyn DirectoryPort>,
    policy: QuotaPolicy,
}

impl BookingService {
    pub fn new(
        port: Arc<dyn BookingPort>,
        directory: Arc<dyn DirectoryPort>,
        policy: QuotaPolicy,
    ) -> Self {
        Self {
            port,
            directory,
            policy,
        }
    }

    pub fn policy(&self) -> QuotaPolicy {
        self.policy
    }

    // ========================================================================
    // Rooms and packages
    // ========================================================================

    #[instrument(skip(self, actor, input), fields(branch_id = %input.branch_id, name = %input.name))]
    pub async fn create_room(&self, actor: &Actor, input: NewMeetingRoom) -> Result<MeetingRoom, BookingError> {
        actor.require(Role::Manager)?;
        input.validate().map_err(CoreError::from)?;
        if input.hourly_rate.is_sign_negative() {
            return Err(BookingError::invalid("Hourly rate cannot be negative"));
        }
        actor.ensure_branch(input.branch_id)?;
        self.directory.get_branch(input.branch_id).await?;

        let room = self.port.insert_room(MeetingRoom::create(input)).await?;
        info!(room_id = %room.id, "Meeting room created");
        Ok(room)
    }

    pub async fn get_room(&self, id: RoomId) -> Result<MeetingRoom, BookingError> {
        Ok(self.port.get_room(id).await?)
    }

    pub async fn list_rooms(
        &self,
        actor: &Actor,
        mut query: RoomQuery,
        page: PageRequest,
    ) -> Result<Page<MeetingRoom>, BookingError> {
        if actor.role.is_staff() {
            query.branch_id = actor.scope_branch(query.branch_id);
        }
        Ok(self.port.list_rooms(&query, page).await?)
    }

    #[instrument(skip(self, actor, input), fields(name = %input.name))]
    pub async fn create_package(&self, actor: &Actor, input: NewPackage) -> Result<Package, BookingError> {
        actor.require(Role::Manager)?;
        input.validate().map_err(CoreError::from)?;
        if input.price.is_sign_negative() {
            return Err(BookingError::invalid("Package price cannot be negative"));
        }
        let package = self.port.insert_package(Package::create(input)).await?;
        info!(package_id = %package.id, monthly_hours = package.monthly_hours, "Package created");
        Ok(package)
    }

    pub async fn get_package(&self, id: PackageId) -> Result<Package, BookingError> {
        Ok(self.port.get_package(id).await?)
    }

    pub async fn list_packages(&self, page: PageRequest) -> Result<Page<Package>, BookingError> {
        Ok(self.port.list_packages(page).await?)
    }

    /// Assigns (or with `None` removes) a customer's package
    #[instrument(skip(self, actor), fields(customer_id = %customer_id))]
    pub async fn assign_package(
        &self,
        actor: &Actor,
        customer_id: CustomerId,
        package_id: Option<PackageId>,
    ) -> Result<Customer, BookingError> {
        actor.require(Role::TeamLead)?;
        let customer = self.directory.get_customer(customer_id).await?;
        actor.ensure_branch(customer.branch_id)?;

        if let Some(id) = package_id {
            let package = self.port.get_package(id).await?;
            if !package.is_active {
                return Err(BookingError::invalid(format!("Package {} is inactive", package.name)));
            }
        }

        let customer = self.directory.assign_package(customer_id, package_id).await?;
        info!(package_id = ?package_id, "Customer package changed");
        Ok(customer)
    }

    // ========================================================================
    // Bookings
    // ========================================================================

    pub async fn book(&self, actor: &Actor, request: BookingRequest) -> Result<Booking, BookingError> {
        self.book_at(actor, request, Utc::now()).await
    }

    /// Books a room as of `now`
    ///
    /// # Errors
    ///
    /// - `StartNotInFuture` if the slot starts at or before `now` in branch time
    /// - `CustomerLocked` for locked customer accounts
    /// - `DailyLimitExceeded`, `MonthlyLimitExceeded` or `SlotUnavailable`
    ///   from the quota guard
    #[instrument(skip(self, actor, request, now), fields(room_id = %request.room_id, date = %request.date))]
    pub async fn book_at(
        &self,
        actor: &Actor,
        request: BookingRequest,
        now: DateTime<Utc>,
    ) -> Result<Booking, BookingError> {
        request.validate().map_err(CoreError::from)?;
        let customer_id = self.booking_customer(actor, request.customer_id)?;

        let room = self.port.get_room(request.room_id).await?;
        if !room.is_active {
            return Err(BookingError::invalid("Meeting room is not available"));
        }
        if actor.role.is_staff() {
            actor.ensure_branch(room.branch_id)?;
        }
        let timezone = self.branch_timezone(room.branch_id).await?;

        if !self.starts_after(timezone, request.date, &request, now)? {
            warn!(customer_id = %customer_id, "Booking in the past rejected");
            return Err(BookingError::StartNotInFuture);
        }

        let customer = self.directory.get_customer(customer_id).await?;
        if customer.is_locked() {
            warn!(customer_id = %customer_id, "Locked customer tried to book");
            return Err(BookingError::CustomerLocked);
        }

        let slot = TimeSlot::new(request.start_time, request.end_time)?;
        let guard = self.guard_for(&customer).await?;
        let booking = Booking::confirmed(
            customer_id,
            room.id,
            room.branch_id,
            request.date,
            slot,
            request.purpose,
            actor.user_id,
        );

        let month = MonthWindow::containing(booking.date);
        let existing = self
            .port
            .customer_bookings(customer_id, DateRange { start: month.first, end: month.last })
            .await?;
        let room_day = self.port.branch_bookings(room.branch_id, booking.date).await?;
        if let Err(e) = guard.check(&booking, &existing, &room_day) {
            warn!(customer_id = %customer_id, error = %e, "Booking rejected by quota guard");
            return Err(e);
        }

        let booking = self.port.reserve(booking, guard).await?;
        info!(
            booking_id = %booking.id,
            customer_id = %customer_id,
            minutes = booking.duration_minutes(),
            "Booking confirmed"
        );
        Ok(booking)
    }

    pub async fn cancel_booking(&self, actor: &Actor, id: BookingId) -> Result<Booking, BookingError> {
        self.cancel_booking_at(actor, id, Utc::now()).await
    }

    /// Cancels a confirmed booking that has not started yet
    #[instrument(skip(self, actor, now), fields(booking_id = %id))]
    pub async fn cancel_booking_at(
        &self,
        actor: &Actor,
        id: BookingId,
        now: DateTime<Utc>,
    ) -> Result<Booking, BookingError> {
        let current = self.get_booking(actor, id).await?;
        let timezone = self.branch_timezone(current.branch_id).await?;
        let started = timezone.resolve_utc(current.date, current.start_time) <= now;

        let mut preview = current.clone();
        if let Err(e) = preview.cancel(now, started) {
            warn!(booking_id = %id, error = %e, "Cancellation rejected");
            return Err(e);
        }

        let booking = self.port.cancel_booking(id, now, started).await?;
        info!(booking_id = %id, "Booking cancelled");
        Ok(booking)
    }

    pub async fn get_booking(&self, actor: &Actor, id: BookingId) -> Result<Booking, BookingError> {
        let booking = self.port.get_booking(id).await?;
        if actor.role == Role::Customer {
            if actor.customer_id != Some(booking.customer_id) {
                return Err(BookingError::Forbidden(
                    "Customers may only access their own bookings".to_string(),
                ));
            }
        } else {
            actor.ensure_branch(booking.branch_id)?;
        }
        Ok(booking)
    }

    pub async fn list_bookings(
        &self,
        actor: &Actor,
        mut query: BookingQuery,
        page: PageRequest,
    ) -> Result<Page<Booking>, BookingError> {
        if actor.role == Role::Customer {
            query.customer_id = Some(self.booking_customer(actor, None)?);
        } else {
            query.branch_id = actor.scope_branch(query.branch_id);
        }
        Ok(self.port.list_bookings(&query, page).await?)
    }

    /// Active rooms of a branch that are free for the whole slot
    pub async fn available_rooms(
        &self,
        actor: &Actor,
        branch_id: BranchId,
        date: NaiveDate,
        slot: TimeSlot,
    ) -> Result<Vec<MeetingRoom>, BookingError> {
        if actor.role.is_staff() {
            actor.ensure_branch(branch_id)?;
        }
        let rooms = self
            .port
            .list_rooms(
                &RoomQuery {
                    branch_id: Some(branch_id),
                    is_active: Some(true),
                },
                PageRequest::new(Some(1), Some(core_kernel::page::MAX_LIMIT)),
            )
            .await?;
        let booked = self.port.branch_bookings(branch_id, date).await?;

        Ok(rooms
            .data
            .into_iter()
            .filter(|room| {
                !booked
                    .iter()
                    .any(|b| b.room_id == room.id && b.slot().overlaps(&slot))
            })
            .collect())
    }

    /// Daily and monthly minutes used against the customer's limits
    pub async fn quota_usage(
        &self,
        actor: &Actor,
        customer_id: CustomerId,
        date: NaiveDate,
    ) -> Result<QuotaUsage, BookingError> {
        let customer_id = self.booking_customer(actor, Some(customer_id))?;
        let customer = self.directory.get_customer(customer_id).await?;
        if actor.role.is_staff() {
            actor.ensure_branch(customer.branch_id)?;
        }
        let guard = self.guard_for(&customer).await?;
        let month = MonthWindow::containing(date);
        let bookings = self
            .port
            .customer_bookings(customer_id, DateRange { start: month.first, end: month.last })
            .await?;
        Ok(QuotaUsage::compute(customer_id, date, &guard, &bookings))
    }

    /// Resolves whose quota a request uses
    ///
    /// Customers always act for themselves; staff must name the customer.
    fn booking_customer(
        &self,
        actor: &Actor,
        requested: Option<CustomerId>,
    ) -> Result<CustomerId, BookingError> {
        if actor.role == Role::Customer {
            let own = actor
                .customer_id
                .ok_or_else(|| BookingError::Forbidden("No customer account linked".to_string()))?;
            if requested.is_some_and(|id| id != own) {
                return Err(BookingError::Forbidden(
                    "Customers may only book for themselves".to_string(),
                ));
            }
            return Ok(own);
        }
        requested.ok_or_else(|| BookingError::invalid("Missing required fields"))
    }

    async fn branch_timezone(&self, branch_id: BranchId) -> Result<Timezone, BookingError> {
        Ok(self.directory.get_branch(branch_id).await?.timezone)
    }

    async fn guard_for(&self, customer: &Customer) -> Result<QuotaGuard, BookingError> {
        let package = match customer.package_id {
            Some(id) => Some(self.port.get_package(id).await?),
            None => None,
        };
        Ok(self.policy.guard_for(package.as_ref()))
    }

    fn starts_after(
        &self,
        timezone: Timezone,
        date: NaiveDate,
        request: &BookingRequest,
        now: DateTime<Utc>,
    ) -> Result<bool, BookingError> {
        let start = timezone.to_utc(date, request.start_time).ok_or_else(|| {
            BookingError::invalid("Start time does not exist in the branch timezone")
        })?;
        Ok(start > now)
    }
}
