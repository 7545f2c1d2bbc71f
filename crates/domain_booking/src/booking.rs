//! Room bookings

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use core_kernel::temporal::hhmm;
use core_kernel::{BookingId, BranchId, CoreError, CustomerId, RoomId, TimeSlot, UserId};

use crate::error::BookingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "CANCELLED" => Ok(BookingStatus::Cancelled),
            "COMPLETED" => Ok(BookingStatus::Completed),
            other => Err(CoreError::validation(format!("Unknown booking status: {}", other))),
        }
    }
}

/// A reservation of a room for a same-day slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: BookingId,
    pub customer_id: CustomerId,
    pub room_id: RoomId,
    pub branch_id: BranchId,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub status: BookingStatus,
    pub purpose: Option<String>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Booking {
    /// A CONFIRMED booking for an already validated slot
    pub fn confirmed(
        customer_id: CustomerId,
        room_id: RoomId,
        branch_id: BranchId,
        date: NaiveDate,
        slot: TimeSlot,
        purpose: Option<String>,
        created_by: UserId,
    ) -> Self {
        Self {
            id: BookingId::new_v7(),
            customer_id,
            room_id,
            branch_id,
            date,
            start_time: slot.start,
            end_time: slot.end,
            status: BookingStatus::Confirmed,
            purpose,
            created_by,
            created_at: Utc::now(),
            cancelled_at: None,
        }
    }

    pub fn slot(&self) -> TimeSlot {
        TimeSlot {
            start: self.start_time,
            end: self.end_time,
        }
    }

    pub fn duration_minutes(&self) -> i64 {
        self.slot().duration_minutes()
    }

    /// Cancelled bookings release both the room and the quota
    pub fn is_active(&self) -> bool {
        self.status != BookingStatus::Cancelled
    }

    /// Cancels a CONFIRMED booking
    ///
    /// `started` tells whether the slot has already begun in branch time.
    pub fn cancel(&mut self, at: DateTime<Utc>, started: bool) -> Result<(), BookingError> {
        if self.status != BookingStatus::Confirmed {
            return Err(BookingError::InvalidState(format!(
                "Only confirmed bookings can be cancelled, booking is {}",
                self.status
            )));
        }
        if started {
            return Err(BookingError::InvalidState(
                "Bookings that have already started cannot be cancelled".to_string(),
            ));
        }
        self.status = BookingStatus::Cancelled;
        self.cancelled_at = Some(at);
        Ok(())
    }
}

/// Input for booking a room
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    /// Defaults to the caller's own customer record for customer logins
    pub customer_id: Option<CustomerId>,
    pub room_id: RoomId,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub purpose: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking(start: &str, end: &str) -> Booking {
        Booking::confirmed(
            CustomerId::new(),
            RoomId::new(),
            BranchId::new(),
            NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            TimeSlot::parse(start, end).unwrap(),
            None,
            UserId::new(),
        )
    }

    #[test]
    fn test_duration() {
        assert_eq!(booking("09:00", "10:30").duration_minutes(), 90);
    }

    #[test]
    fn test_cancel() {
        let mut b = booking("09:00", "10:00");
        assert!(b.cancel(Utc::now(), true).is_err());
        b.cancel(Utc::now(), false).unwrap();
        assert!(!b.is_active());
        assert!(b.cancel(Utc::now(), false).is_err());
    }

    #[test]
    fn test_request_json() {
        let json = serde_json::json!({
            "roomId": RoomId::new(),
            "date": "2024-06-03",
            "startTime": "09:00",
            "endTime": "10:30",
        });
        let request: BookingRequest = serde_json::from_value(json).unwrap();
        assert!(request.customer_id.is_none());
        assert_eq!(request.start_time.format("%H:%M").to_string(), "09:00");
    }
}
