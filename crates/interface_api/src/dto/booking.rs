//! Meeting room and package DTOs

use chrono::NaiveDate;
use serde::Deserialize;

use core_kernel::{BranchId, CustomerId, RoomId, TimeSlot};
use domain_booking::{BookingQuery, BookingStatus, RoomQuery};

use super::date_range;
use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomFilter {
    pub branch_id: Option<BranchId>,
    pub is_active: Option<bool>,
}

impl From<RoomFilter> for RoomQuery {
    fn from(filter: RoomFilter) -> Self {
        RoomQuery {
            branch_id: filter.branch_id,
            is_active: filter.is_active,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingFilter {
    pub branch_id: Option<BranchId>,
    pub customer_id: Option<CustomerId>,
    pub room_id: Option<RoomId>,
    pub status: Option<BookingStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl BookingFilter {
    pub fn into_query(self) -> Result<BookingQuery, ApiError> {
        Ok(BookingQuery {
            dates: date_range(self.start_date, self.end_date)?,
            branch_id: self.branch_id,
            customer_id: self.customer_id,
            room_id: self.room_id,
            status: self.status,
        })
    }
}

/// `GET /meeting-rooms/available?branchId=&date=&startTime=HH:MM&endTime=HH:MM`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityParams {
    pub branch_id: Option<BranchId>,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
}

impl AvailabilityParams {
    pub fn slot(&self) -> Result<TimeSlot, ApiError> {
        Ok(TimeSlot::parse(&self.start_time, &self.end_time)?)
    }
}

/// `GET /meeting-rooms/limits/:customerId?date=`; defaults to today
#[derive(Debug, Default, Deserialize)]
pub struct LimitsParams {
    pub date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_availability_slot() {
        let params = AvailabilityParams {
            branch_id: None,
            date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            start_time: "09:00".to_string(),
            end_time: "10:30".to_string(),
        };
        assert_eq!(params.slot().unwrap().duration_minutes(), 90);
    }

    #[test]
    fn test_reversed_slot_is_rejected() {
        let params = AvailabilityParams {
            branch_id: None,
            date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            start_time: "11:00".to_string(),
            end_time: "10:00".to_string(),
        };
        assert!(matches!(params.slot(), Err(ApiError::Validation(_))));
    }
}
