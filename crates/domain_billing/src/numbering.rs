//! Human-facing document numbers
//!
//! Numbers are `PREFIX-` plus a zero-padded six digit counter. The counter
//! comes from a store-issued sequence consumed inside the insert.

use serde::{Deserialize, Serialize};

/// The numbered series kept by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NumberSeries {
    Invoice,
    Bill,
    Transaction,
}

impl NumberSeries {
    pub fn prefix(&self) -> &'static str {
        match self {
            NumberSeries::Invoice => "INV",
            NumberSeries::Bill => "BILL",
            NumberSeries::Transaction => "TXN",
        }
    }

    /// Name of the PostgreSQL sequence backing the series
    pub fn sequence_name(&self) -> &'static str {
        match self {
            NumberSeries::Invoice => "invoice_number_seq",
            NumberSeries::Bill => "bill_number_seq",
            NumberSeries::Transaction => "transaction_number_seq",
        }
    }

    /// Formats the `n`th number of the series
    pub fn format(&self, n: i64) -> String {
        format!("{}-{:06}", self.prefix(), n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format() {
        assert_eq!(NumberSeries::Invoice.format(1), "INV-000001");
        assert_eq!(NumberSeries::Bill.format(42), "BILL-000042");
        assert_eq!(NumberSeries::Transaction.format(123456), "TXN-123456");
    }

    #[test]
    fn test_overflowing_six_digits_keeps_counting() {
        assert_eq!(NumberSeries::Invoice.format(1_000_000), "INV-1000000");
    }
}
