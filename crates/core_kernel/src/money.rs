//! Amount helpers with precise decimal arithmetic
//!
//! Portal amounts are plain `rust_decimal::Decimal` values in the branch
//! currency. This module supplies the pieces shared by every domain:
//! rounding to minor units, percentage rates, and currency-aware display.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Currency codes following ISO 4217
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    USD,
    EUR,
    GBP,
    INR,
    SGD,
    AUD,
    CAD,
    AED,
}

impl Currency {
    /// Returns the number of decimal places for this currency
    pub fn decimal_places(&self) -> u32 {
        2
    }

    /// Returns the currency symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::USD => "$",
            Currency::EUR => "€",
            Currency::GBP => "£",
            Currency::INR => "₹",
            Currency::SGD => "S$",
            Currency::AUD => "A$",
            Currency::CAD => "C$",
            Currency::AED => "AED ",
        }
    }

    /// Returns the ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::INR => "INR",
            Currency::SGD => "SGD",
            Currency::AUD => "AUD",
            Currency::CAD => "CAD",
            Currency::AED => "AED",
        }
    }

    /// Formats an amount for messages shown to users, e.g. `$110.00`
    pub fn format(&self, amount: Decimal) -> String {
        let dp = self.decimal_places();
        let rounded = amount.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
        format!("{}{:.dp$}", self.symbol(), rounded, dp = dp as usize)
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::USD
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Currency::USD),
            "EUR" => Ok(Currency::EUR),
            "GBP" => Ok(Currency::GBP),
            "INR" => Ok(Currency::INR),
            "SGD" => Ok(Currency::SGD),
            "AUD" => Ok(Currency::AUD),
            "CAD" => Ok(Currency::CAD),
            "AED" => Ok(Currency::AED),
            other => Err(MoneyError::UnknownCurrency(other.to_string())),
        }
    }
}

/// Errors that can occur during amount operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid rate: {0}")]
    InvalidRate(String),
}

/// Rounds an amount to two decimal places (half away from zero)
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Represents a percentage rate (e.g., tax rate)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rate {
    /// The rate as a decimal (e.g., 0.05 for 5%)
    value: Decimal,
}

impl Rate {
    /// Creates a rate from a decimal value (e.g., 0.05 for 5%)
    pub fn new(value: Decimal) -> Self {
        Self { value }
    }

    /// Creates a rate from a percentage (e.g., 5.0 for 5%)
    pub fn from_percentage(percentage: Decimal) -> Self {
        Self {
            value: percentage / dec!(100),
        }
    }

    /// Creates a rate from a percentage that must lie within 0..=100
    pub fn checked_percentage(percentage: Decimal) -> Result<Self, MoneyError> {
        if percentage.is_sign_negative() || percentage > dec!(100) {
            return Err(MoneyError::InvalidRate(format!(
                "{} is outside 0..=100",
                percentage
            )));
        }
        Ok(Self::from_percentage(percentage))
    }

    /// A zero rate
    pub fn zero() -> Self {
        Self { value: Decimal::ZERO }
    }

    /// Returns the rate as a decimal
    pub fn as_decimal(&self) -> Decimal {
        self.value
    }

    /// Returns the rate as a percentage
    pub fn as_percentage(&self) -> Decimal {
        self.value * dec!(100)
    }

    /// Applies this rate to an amount, rounded to minor units
    pub fn apply(&self, amount: Decimal) -> Decimal {
        round_money(amount * self.value)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percentage().round_dp(4).normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_format() {
        assert_eq!(Currency::USD.format(dec!(110)), "$110.00");
        assert_eq!(Currency::USD.format(dec!(0.005)), "$0.01");
        assert_eq!(Currency::GBP.format(dec!(12.5)), "£12.50");
    }

    #[test]
    fn test_currency_parse() {
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::USD);
        assert!("XYZ".parse::<Currency>().is_err());
    }

    #[test]
    fn test_rate_application() {
        let rate = Rate::from_percentage(dec!(10));
        assert_eq!(rate.apply(dec!(100)), dec!(10.00));
        assert_eq!(rate.to_string(), "10%");
    }

    #[test]
    fn test_checked_percentage_bounds() {
        assert!(Rate::checked_percentage(dec!(-1)).is_err());
        assert!(Rate::checked_percentage(dec!(100.01)).is_err());
        assert!(Rate::checked_percentage(dec!(100)).is_ok());
    }
}
