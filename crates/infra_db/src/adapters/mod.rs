//! PostgreSQL adapters for the domain ports
//!
//! Each adapter implements one domain's port trait over a shared `PgPool`.
//! Rows are read into private `FromRow` structs and converted into domain
//! types; enumerations are stored as TEXT in their serialized form.
//! Multi-record writes run inside one SQL transaction.

pub mod directory;
pub mod billing;
pub mod payroll;
pub mod booking;
pub mod inventory;
pub mod support;

pub use directory::PostgresDirectoryAdapter;
pub use billing::PostgresBillingAdapter;
pub use payroll::PostgresPayrollAdapter;
pub use booking::PostgresBookingAdapter;
pub use inventory::PostgresInventoryAdapter;
pub use support::PostgresSupportAdapter;

use core_kernel::{Page, PageRequest, PortError};

use crate::error::DatabaseError;

/// `LIMIT` / `OFFSET` bind values for a page request
pub(crate) fn limit_offset(page: PageRequest) -> (i64, i64) {
    (i64::from(page.limit), page.offset() as i64)
}

/// Wraps fetched rows and the filtered row count into a page
pub(crate) fn to_page<T>(data: Vec<T>, page: PageRequest, total: i64) -> Page<T> {
    Page::new(data, page, total.max(0) as u64)
}

/// Converts fetched rows into domain values, failing on the first bad row
pub(crate) fn convert<R, T>(rows: Vec<R>) -> Result<Vec<T>, PortError>
where
    T: TryFrom<R, Error = DatabaseError>,
{
    rows.into_iter()
        .map(|r| T::try_from(r).map_err(PortError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_first_page_has_no_offset() {
        assert_eq!(limit_offset(PageRequest::new(Some(1), Some(25))), (25, 0));
        assert_eq!(limit_offset(PageRequest::new(Some(3), Some(10))), (10, 20));
    }

    #[test]
    fn test_negative_count_is_treated_as_empty() {
        let page: Page<u8> = to_page(vec![], PageRequest::default(), -1);
        assert_eq!(page.pagination.total, 0);
        assert_eq!(page.pagination.pages, 0);
    }

    #[test]
    fn test_convert_stops_at_bad_row() {
        struct Raw(&'static str);
        #[derive(Debug)]
        struct Parsed;
        impl TryFrom<Raw> for Parsed {
            type Error = DatabaseError;
            fn try_from(raw: Raw) -> Result<Self, Self::Error> {
                crate::error::decode::<u32>("n", raw.0).map(|_| Parsed)
            }
        }

        assert_eq!(convert::<_, Parsed>(vec![Raw("1"), Raw("2")]).unwrap().len(), 2);
        assert!(convert::<_, Parsed>(vec![Raw("1"), Raw("x")]).is_err());
    }

    proptest! {
        #[test]
        fn offsets_walk_pages_without_gaps(page in 1u32..1000, limit in 1u32..100) {
            let (l, this) = limit_offset(PageRequest::new(Some(page), Some(limit)));
            let (_, next) = limit_offset(PageRequest::new(Some(page + 1), Some(limit)));
            prop_assert_eq!(next - this, l);
        }
    }
}
