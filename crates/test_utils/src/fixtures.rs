//! Pre-built Test Fixtures
//!
//! Provides ready-to-use test data for common entities across the portal.
//! Fixed values are consistent and predictable; the `Fake*` helpers draw
//! realistic names and addresses from the `fake` crate where uniqueness
//! matters more than the exact value.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use fake::faker::address::en::StreetName;
use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use core_kernel::{Actor, BranchId, CustomerId, Role, TimeSlot, Timezone, UserId};

/// Monday of a quiet week used by date-sensitive tests
static REFERENCE_DATE: Lazy<NaiveDate> =
    Lazy::new(|| NaiveDate::from_ymd_opt(2026, 3, 16).unwrap());

/// Fixture for amounts used across billing and payroll
pub struct AmountFixtures;

impl AmountFixtures {
    /// Hot desk day rate
    pub fn day_pass() -> Decimal {
        dec!(50.00)
    }

    /// Monthly dedicated desk fee
    pub fn monthly_desk() -> Decimal {
        dec!(450.00)
    }

    /// Standard tax percentage
    pub fn tax_rate() -> Decimal {
        dec!(10)
    }

    /// Base salary for payroll scenarios
    pub fn base_salary() -> Decimal {
        dec!(1000.00)
    }

    pub fn zero() -> Decimal {
        Decimal::ZERO
    }
}

/// Fixture for dates, clock times and zones
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// A fixed Monday in March 2026
    pub fn reference_date() -> NaiveDate {
        *REFERENCE_DATE
    }

    /// 08:00 UTC on the reference date
    pub fn reference_instant() -> DateTime<Utc> {
        Utc.from_utc_datetime(&Self::reference_date().and_time(Self::time(8, 0)))
    }

    /// The day after the reference date
    pub fn next_day() -> NaiveDate {
        Self::reference_date() + Duration::days(1)
    }

    pub fn time(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    /// 09:00-10:00
    pub fn morning_hour() -> TimeSlot {
        TimeSlot::new(Self::time(9, 0), Self::time(10, 0)).unwrap()
    }

    /// 14:00-15:30
    pub fn afternoon_block() -> TimeSlot {
        TimeSlot::new(Self::time(14, 0), Self::time(15, 30)).unwrap()
    }

    pub fn utc() -> Timezone {
        Timezone::new(Tz::UTC)
    }

    /// A zone well ahead of UTC, for "today" edge cases
    pub fn singapore() -> Timezone {
        Timezone::new(Tz::Asia__Singapore)
    }

    pub fn pay_period() -> &'static str {
        "2026-03"
    }
}

/// Fixture for identifier test data
pub struct IdFixtures;

impl IdFixtures {
    /// Creates a deterministic branch ID for testing
    pub fn branch_id() -> BranchId {
        BranchId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440001").unwrap())
    }

    /// Creates a deterministic customer ID for testing
    pub fn customer_id() -> CustomerId {
        CustomerId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440002").unwrap())
    }

    /// Creates a deterministic user ID for testing
    pub fn user_id() -> UserId {
        UserId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440003").unwrap())
    }
}

/// Fixture for callers at each role
pub struct ActorFixtures;

impl ActorFixtures {
    pub fn admin() -> Actor {
        Actor::new(UserId::new(), Role::Admin)
    }

    pub fn manager(branch_id: BranchId) -> Actor {
        Actor::new(UserId::new(), Role::Manager).in_branch(branch_id)
    }

    pub fn team_lead(branch_id: BranchId) -> Actor {
        Actor::new(UserId::new(), Role::TeamLead).in_branch(branch_id)
    }

    pub fn staff(branch_id: BranchId) -> Actor {
        Actor::new(UserId::new(), Role::Staff).in_branch(branch_id)
    }

    /// A customer login tied to its own customer record
    pub fn customer(branch_id: BranchId, customer_id: CustomerId) -> Actor {
        Actor::new(UserId::new(), Role::Customer)
            .in_branch(branch_id)
            .as_customer(customer_id)
    }
}

/// Fixture for string test data
pub struct StringFixtures;

impl StringFixtures {
    pub fn branch_code() -> &'static str {
        "SGP-01"
    }

    pub fn sku() -> &'static str {
        "CHAIR-ERG-01"
    }

    pub fn store_room() -> &'static str {
        "Store room"
    }

    pub fn floor_two() -> &'static str {
        "Floor 2"
    }
}

/// Randomized person and company data
pub struct FakeData;

impl FakeData {
    pub fn name() -> String {
        Name().fake()
    }

    /// An email that is unique across calls
    pub fn email() -> String {
        let email: String = SafeEmail().fake();
        format!("{}.{}", Uuid::new_v4().simple(), email)
    }

    pub fn phone() -> String {
        PhoneNumber().fake()
    }

    pub fn company() -> String {
        CompanyName().fake()
    }

    pub fn address() -> String {
        format!("{} {}", (1..999).fake::<u32>(), StreetName().fake::<String>())
    }

    /// Upper-case code unique enough for branch and SKU fields
    pub fn code(prefix: &str) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!("{}-{}", prefix, &suffix[..8].to_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temporal_fixtures_ordering() {
        assert!(TemporalFixtures::reference_date() < TemporalFixtures::next_day());
        assert_eq!(TemporalFixtures::morning_hour().duration_minutes(), 60);
        assert_eq!(TemporalFixtures::afternoon_block().duration_minutes(), 90);
    }

    #[test]
    fn test_id_fixtures_are_deterministic() {
        assert_eq!(IdFixtures::branch_id(), IdFixtures::branch_id());
    }

    #[test]
    fn test_actor_fixtures_carry_scope() {
        let branch = BranchId::new();
        assert_eq!(ActorFixtures::manager(branch).branch_id, Some(branch));
        assert!(ActorFixtures::admin().branch_id.is_none());

        let customer = CustomerId::new();
        assert_eq!(ActorFixtures::customer(branch, customer).customer_id, Some(customer));
    }

    #[test]
    fn test_fake_emails_are_unique() {
        let a = FakeData::email();
        let b = FakeData::email();
        assert_ne!(a, b);
        assert!(a.contains('@'));
    }

    #[test]
    fn test_fake_codes_fit_branch_limits() {
        let code = FakeData::code("BR");
        assert!(code.len() <= 20);
        assert!(code.starts_with("BR-"));
    }
}
