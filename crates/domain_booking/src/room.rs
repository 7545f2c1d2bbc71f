//! Meeting rooms

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{BranchId, RoomId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingRoom {
    pub id: RoomId,
    pub branch_id: BranchId,
    pub name: String,
    pub capacity: u32,
    pub hourly_rate: Decimal,
    pub amenities: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewMeetingRoom {
    pub branch_id: BranchId,
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub name: String,
    #[validate(range(min = 1, max = 500, message = "must be between 1 and 500"))]
    pub capacity: u32,
    #[serde(default)]
    pub hourly_rate: Decimal,
    #[serde(default)]
    pub amenities: Vec<String>,
}

impl MeetingRoom {
    pub fn create(input: NewMeetingRoom) -> Self {
        Self {
            id: RoomId::new_v7(),
            branch_id: input.branch_id,
            name: input.name.trim().to_string(),
            capacity: input.capacity,
            hourly_rate: input.hourly_rate,
            amenities: input.amenities,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}
