//! In-portal notifications

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{NotificationId, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub recipient_id: UserId,
    pub title: String,
    pub message: String,
    /// Free-form kind used by the front end for icons, e.g. `booking`
    pub kind: String,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    pub recipient_id: UserId,
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 2000, message = "must be 1-2000 characters"))]
    pub message: String,
    #[serde(default = "default_kind")]
    pub kind: String,
}

fn default_kind() -> String {
    "general".to_string()
}

impl Notification {
    pub fn create(input: NewNotification) -> Self {
        Self {
            id: NotificationId::new_v7(),
            recipient_id: input.recipient_id,
            title: input.title.trim().to_string(),
            message: input.message,
            kind: input.kind,
            is_read: false,
            read_at: None,
            created_at: Utc::now(),
        }
    }

    /// Marks read; reading twice keeps the first timestamp
    pub fn mark_read(&mut self, at: DateTime<Utc>) {
        if !self.is_read {
            self.is_read = true;
            self.read_at = Some(at);
        }
    }
}
