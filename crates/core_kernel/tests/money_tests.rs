//! Tests for amount helpers

use core_kernel::money::{round_money, Currency, MoneyError, Rate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

mod currency_tests {
    use super::*;

    #[test]
    fn test_all_currencies_use_two_decimal_places() {
        for currency in [
            Currency::USD,
            Currency::EUR,
            Currency::GBP,
            Currency::INR,
            Currency::SGD,
            Currency::AUD,
            Currency::CAD,
            Currency::AED,
        ] {
            assert_eq!(currency.decimal_places(), 2);
            assert_eq!(currency.code().parse::<Currency>().unwrap(), currency);
        }
    }

    #[test]
    fn test_remaining_balance_message_format() {
        let remaining = dec!(110) - Decimal::ZERO;
        assert_eq!(Currency::USD.format(remaining), "$110.00");
        assert_eq!(Currency::SGD.format(dec!(1234.5)), "S$1234.50");
    }

    #[test]
    fn test_unknown_currency() {
        assert_eq!(
            "ZZZ".parse::<Currency>(),
            Err(MoneyError::UnknownCurrency("ZZZ".to_string()))
        );
    }

    #[test]
    fn test_serde_uses_iso_code() {
        let json = serde_json::to_string(&Currency::EUR).unwrap();
        assert_eq!(json, "\"EUR\"");
    }
}

mod rounding_tests {
    use super::*;

    #[test]
    fn test_midpoint_rounds_away_from_zero() {
        assert_eq!(round_money(dec!(2.345)), dec!(2.35));
        assert_eq!(round_money(dec!(-2.345)), dec!(-2.35));
        assert_eq!(round_money(dec!(2.344)), dec!(2.34));
    }

    #[test]
    fn test_tax_on_fractional_subtotal() {
        let rate = Rate::from_percentage(dec!(7.5));
        assert_eq!(rate.apply(dec!(33.33)), dec!(2.50));
    }

    #[test]
    fn test_zero_rate() {
        assert_eq!(Rate::zero().apply(dec!(999.99)), Decimal::ZERO);
        assert_eq!(Rate::zero().as_percentage(), Decimal::ZERO);
    }

    #[test]
    fn test_percentage_round_trip() {
        let rate = Rate::checked_percentage(dec!(12.5)).unwrap();
        assert_eq!(rate.as_decimal(), dec!(0.125));
        assert_eq!(rate.as_percentage(), dec!(12.5));
    }
}
