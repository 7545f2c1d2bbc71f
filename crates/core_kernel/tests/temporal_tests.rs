//! Tests for time slots, month windows and timezones

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use core_kernel::temporal::{parse_clock_time, DateRange, MonthWindow, TemporalError, TimeSlot, Timezone};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_parse_clock_time_formats() {
    assert_eq!(parse_clock_time("09:30").unwrap(), NaiveTime::from_hms_opt(9, 30, 0).unwrap());
    assert_eq!(parse_clock_time("09:30:00").unwrap(), NaiveTime::from_hms_opt(9, 30, 0).unwrap());
    assert!(matches!(parse_clock_time("9.30"), Err(TemporalError::InvalidTime(_))));
    assert!(matches!(parse_clock_time("09:30:59"), Err(TemporalError::InvalidTime(_))));
}

#[test]
fn test_slot_rejects_inverted_times() {
    assert!(TimeSlot::parse("14:00", "13:00").is_err());
    assert!(TimeSlot::parse("14:00", "14:00").is_err());
}

#[test]
fn test_back_to_back_slots_do_not_overlap() {
    let morning = TimeSlot::parse("09:00", "10:00").unwrap();
    let next = TimeSlot::parse("10:00", "11:00").unwrap();
    let inner = TimeSlot::parse("09:15", "09:45").unwrap();

    assert!(!morning.overlaps(&next));
    assert!(morning.overlaps(&inner));
    assert!(inner.overlaps(&morning));
}

#[test]
fn test_slot_deserializes_from_hhmm() {
    let slot: TimeSlot = serde_json::from_str(r#"{"start":"13:00","end":"14:30"}"#).unwrap();
    assert_eq!(slot.duration_minutes(), 90);
}

#[test]
fn test_month_window_boundaries() {
    let window = MonthWindow::containing(date(2023, 2, 10));
    assert_eq!(window.last, date(2023, 2, 28));
    assert!(window.contains(date(2023, 2, 1)));
    assert!(!window.contains(date(2023, 3, 1)));
}

#[test]
fn test_date_range() {
    let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 31)).unwrap();
    assert_eq!(range.days(), 31);
    assert!(range.contains(date(2024, 1, 15)));
    assert!(DateRange::new(date(2024, 2, 1), date(2024, 1, 1)).is_err());
}

#[test]
fn test_timezone_local_date() {
    let tz: Timezone = "America/New_York".parse().unwrap();
    let late_utc = Utc.with_ymd_and_hms(2024, 6, 2, 2, 0, 0).unwrap();
    assert_eq!(tz.local_date(late_utc), date(2024, 6, 1));
    assert_eq!(tz.name(), "America/New_York");
}

#[test]
fn test_unknown_timezone() {
    assert!(matches!(
        "Mars/Olympus".parse::<Timezone>(),
        Err(TemporalError::InvalidTimezone(_))
    ));
}
