//! Booking quota guard
//!
//! Pure checks over a customer's existing bookings and a room's schedule.
//! The service runs them up front for a precise error; the store runs them
//! again while holding the reservation lock.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use core_kernel::{CustomerId, MonthWindow};

use crate::booking::Booking;
use crate::error::BookingError;
use crate::package::Package;

/// Default daily cap on booked minutes per customer
pub const DEFAULT_DAILY_CAP_MINUTES: i64 = 120;
/// Monthly allowance for customers without a package
pub const DEFAULT_MONTHLY_HOURS: u32 = 20;

/// Configurable limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaPolicy {
    pub daily_cap_minutes: i64,
    pub default_monthly_hours: u32,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            daily_cap_minutes: DEFAULT_DAILY_CAP_MINUTES,
            default_monthly_hours: DEFAULT_MONTHLY_HOURS,
        }
    }
}

impl QuotaPolicy {
    /// The guard for a customer holding `package`, if any
    pub fn guard_for(&self, package: Option<&Package>) -> QuotaGuard {
        let monthly_limit_minutes = package
            .map(Package::monthly_minutes)
            .unwrap_or_else(|| i64::from(self.default_monthly_hours) * 60);
        QuotaGuard {
            daily_cap_minutes: self.daily_cap_minutes,
            monthly_limit_minutes,
        }
    }
}

/// Renders a minute count the way limits are shown to members
fn describe_minutes(minutes: i64) -> String {
    match (minutes / 60, minutes % 60) {
        (1, 0) => "1 hour".to_string(),
        (hours, 0) => format!("{} hours", hours),
        _ => format!("{} minutes", minutes),
    }
}

/// Limits in force for one reservation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaGuard {
    pub daily_cap_minutes: i64,
    pub monthly_limit_minutes: i64,
}

impl QuotaGuard {
    /// Checks the daily cap, the monthly allowance and room availability
    ///
    /// `customer_bookings` and `room_bookings` may be supersets; cancelled
    /// bookings and bookings outside the relevant day or month are ignored.
    pub fn check(
        &self,
        candidate: &Booking,
        customer_bookings: &[Booking],
        room_bookings: &[Booking],
    ) -> Result<(), BookingError> {
        let duration = candidate.duration_minutes();
        let usage = QuotaUsage::compute(candidate.customer_id, candidate.date, self, customer_bookings);

        if usage.daily_used_minutes + duration > self.daily_cap_minutes {
            return Err(BookingError::DailyLimitExceeded {
                limit: describe_minutes(self.daily_cap_minutes),
            });
        }
        if usage.monthly_used_minutes + duration > self.monthly_limit_minutes {
            return Err(BookingError::MonthlyLimitExceeded {
                limit: describe_minutes(self.monthly_limit_minutes),
            });
        }

        let slot = candidate.slot();
        let taken = room_bookings.iter().any(|b| {
            b.id != candidate.id
                && b.is_active()
                && b.room_id == candidate.room_id
                && b.date == candidate.date
                && b.slot().overlaps(&slot)
        });
        if taken {
            return Err(BookingError::SlotUnavailable);
        }
        Ok(())
    }
}

/// A customer's booked minutes against their limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaUsage {
    pub customer_id: CustomerId,
    pub date: NaiveDate,
    pub daily_used_minutes: i64,
    pub daily_limit_minutes: i64,
    pub daily_remaining_minutes: i64,
    pub monthly_used_minutes: i64,
    pub monthly_limit_minutes: i64,
    pub monthly_remaining_minutes: i64,
}

impl QuotaUsage {
    pub fn compute(
        customer_id: CustomerId,
        date: NaiveDate,
        guard: &QuotaGuard,
        bookings: &[Booking],
    ) -> Self {
        let month = MonthWindow::containing(date);
        let own = bookings
            .iter()
            .filter(|b| b.customer_id == customer_id && b.is_active());

        let (mut daily, mut monthly) = (0, 0);
        for booking in own {
            if month.contains(booking.date) {
                monthly += booking.duration_minutes();
                if booking.date == date {
                    daily += booking.duration_minutes();
                }
            }
        }

        Self {
            customer_id,
            date,
            daily_used_minutes: daily,
            daily_limit_minutes: guard.daily_cap_minutes,
            daily_remaining_minutes: (guard.daily_cap_minutes - daily).max(0),
            monthly_used_minutes: monthly,
            monthly_limit_minutes: guard.monthly_limit_minutes,
            monthly_remaining_minutes: (guard.monthly_limit_minutes - monthly).max(0),
        }
    }
}
