//! Request and response shapes that are specific to HTTP
//!
//! Domain input types (`NewCustomer`, `DocumentDraft`, ...) are accepted as
//! request bodies directly; this module holds the envelopes, list filters and
//! the few bodies that only exist at the HTTP edge.

pub mod billing;
pub mod booking;
pub mod directory;
pub mod inventory;
pub mod payroll;
pub mod support;

use axum::{http::StatusCode, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use core_kernel::{DateRange, PageRequest};

use crate::error::ApiError;

/// Success envelope for single-record responses
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

/// A 201 response carrying the new record
pub type Created<T> = (StatusCode, Json<ApiResponse<T>>);

/// 200 with `{success: true, data}`
pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse { success: true, data })
}

/// 201 with `{success: true, data}`
pub fn created<T: Serialize>(data: T) -> Created<T> {
    (StatusCode::CREATED, ok(data))
}

/// `?page=&limit=` on list endpoints
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageParams {
    pub fn request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

/// Inclusive date filter from optional `startDate`/`endDate` bounds
pub(crate) fn date_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<Option<DateRange>, ApiError> {
    if start.is_none() && end.is_none() {
        return Ok(None);
    }
    let floor = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN);
    let ceiling = NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX);
    let range = DateRange::new(start.unwrap_or(floor), end.unwrap_or(ceiling))?;
    Ok(Some(range))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_page_params_are_clamped() {
        let params = PageParams {
            page: Some(0),
            limit: Some(500),
        };
        let request = params.request();
        assert_eq!(request.page, 1);
        assert_eq!(request.limit, 100);
        assert_eq!(PageParams::default().request().limit, 20);
    }

    #[test]
    fn test_open_ended_date_range() {
        assert!(date_range(None, None).unwrap().is_none());

        let from = date_range(Some(date("2024-06-01")), None).unwrap().unwrap();
        assert!(from.contains(date("2030-01-01")));
        assert!(!from.contains(date("2024-05-31")));

        assert!(date_range(Some(date("2024-06-02")), Some(date("2024-06-01"))).is_err());
    }
}
