//! Booking service tests over the in-memory ports

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal_macros::dec;

use core_kernel::{Actor, BranchId, CustomerId, PageRequest, Role, RoomId, TimeSlot, UserId};
use domain_booking::{
    Booking, BookingError, BookingPort, BookingQuery, BookingRequest, BookingService, BookingStatus,
    MemoryBookingPort, NewMeetingRoom, NewPackage, QuotaPolicy,
};
use domain_directory::{
    CustomerStatus, DirectoryPort, DirectoryService, MemoryDirectoryPort, NewBranch, NewCustomer,
};

struct Fixture {
    service: BookingService,
    directory: DirectoryService,
    branch: BranchId,
    room: RoomId,
    customer: CustomerId,
    staff: Actor,
}

async fn fixture() -> Fixture {
    let directory_port = Arc::new(MemoryDirectoryPort::new());
    let admin = Actor::new(UserId::new(), Role::Admin);
    let directory = DirectoryService::new(directory_port.clone());

    let branch = directory
        .create_branch(
            &admin,
            NewBranch {
                code: "SG".to_string(),
                name: "Singapore".to_string(),
                timezone: "Asia/Singapore".parse().unwrap(),
                address: None,
            },
        )
        .await
        .unwrap();
    let customer = directory
        .create_customer(
            &admin,
            NewCustomer {
                branch_id: branch.id,
                name: "Lin Member".to_string(),
                email: "lin@example.com".to_string(),
                phone: None,
                company: None,
                package_id: None,
            },
        )
        .await
        .unwrap();

    let port: Arc<dyn DirectoryPort> = directory_port;
    let service = BookingService::new(Arc::new(MemoryBookingPort::new()), port, QuotaPolicy::default());
    let manager = Actor::new(UserId::new(), Role::Manager).in_branch(branch.id);
    let room = service
        .create_room(
            &manager,
            NewMeetingRoom {
                branch_id: branch.id,
                name: "Boardroom".to_string(),
                capacity: 8,
                hourly_rate: dec!(25),
                amenities: vec!["Projector".to_string()],
            },
        )
        .await
        .unwrap();

    Fixture {
        service,
        directory,
        branch: branch.id,
        room: room.id,
        customer: customer.id,
        staff: Actor::new(UserId::new(), Role::Staff).in_branch(branch.id),
    }
}

/// 2024-06-01 00:00 UTC, well before every booking below
fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
}

fn time(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M").unwrap()
}

fn request(f: &Fixture, date: NaiveDate, start: &str, end: &str) -> BookingRequest {
    BookingRequest {
        customer_id: Some(f.customer),
        room_id: f.room,
        date,
        start_time: time(start),
        end_time: time(end),
        purpose: Some("Team sync".to_string()),
    }
}

#[tokio::test]
async fn test_daily_cap_across_bookings() {
    let f = fixture().await;
    let first = f
        .service
        .book_at(&f.staff, request(&f, day(3), "09:00", "10:30"), now())
        .await
        .unwrap();
    assert_eq!(first.status, BookingStatus::Confirmed);
    assert_eq!(first.duration_minutes(), 90);

    let second = f
        .service
        .book_at(&f.staff, request(&f, day(3), "14:00", "14:40"), now())
        .await;
    match second {
        Err(e @ BookingError::DailyLimitExceeded { .. }) => {
            assert_eq!(e.to_string(), "Daily booking limit of 2 hours exceeded");
        }
        other => panic!("expected DailyLimitExceeded, got {:?}", other.map(|b| b.id)),
    }

    // Another day is a fresh allowance
    f.service
        .book_at(&f.staff, request(&f, day(4), "14:00", "14:40"), now())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_seconds_cannot_slip_past_the_daily_cap() {
    let f = fixture().await;
    f.service
        .book_at(&f.staff, request(&f, day(3), "09:00", "11:00"), now())
        .await
        .unwrap();

    let mut sub_minute = request(&f, day(3), "20:00", "20:00");
    sub_minute.end_time = NaiveTime::from_hms_opt(20, 0, 59).unwrap();
    let result = f.service.book_at(&f.staff, sub_minute, now()).await;
    assert!(matches!(result, Err(BookingError::Validation(_))));

    let one_minute = f
        .service
        .book_at(&f.staff, request(&f, day(3), "20:00", "20:01"), now())
        .await;
    assert!(matches!(one_minute, Err(BookingError::DailyLimitExceeded { .. })));

    let parsed: Result<BookingRequest, _> = serde_json::from_value(serde_json::json!({
        "roomId": f.room,
        "date": "2024-06-03",
        "startTime": "21:00:00",
        "endTime": "21:00:59",
    }));
    assert!(parsed.is_err());

    let whole_minutes: Result<BookingRequest, _> = serde_json::from_value(serde_json::json!({
        "roomId": f.room,
        "date": "2024-06-03",
        "startTime": "21:00:00",
        "endTime": "21:30",
    }));
    assert!(whole_minutes.is_ok());
}

#[tokio::test]
async fn test_past_start_rejected_in_branch_time() {
    let f = fixture().await;
    // 09:00 in Singapore is 01:00 UTC
    let after_start = Utc.with_ymd_and_hms(2024, 6, 3, 1, 0, 0).unwrap();
    let result = f
        .service
        .book_at(&f.staff, request(&f, day(3), "09:00", "10:00"), after_start)
        .await;
    assert!(matches!(result, Err(BookingError::StartNotInFuture)));

    let just_before = Utc.with_ymd_and_hms(2024, 6, 3, 0, 59, 0).unwrap();
    assert!(f
        .service
        .book_at(&f.staff, request(&f, day(3), "09:00", "10:00"), just_before)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_locked_customer_rejected() {
    let f = fixture().await;
    let lead = Actor::new(UserId::new(), Role::TeamLead).in_branch(f.branch);
    f.directory
        .set_customer_status(&lead, f.customer, CustomerStatus::Locked)
        .await
        .unwrap();

    let result = f
        .service
        .book_at(&f.staff, request(&f, day(3), "09:00", "10:00"), now())
        .await;
    assert!(matches!(result, Err(BookingError::CustomerLocked)));
}

#[tokio::test]
async fn test_inverted_slot_rejected() {
    let f = fixture().await;
    let result = f
        .service
        .book_at(&f.staff, request(&f, day(3), "11:00", "10:00"), now())
        .await;
    assert!(matches!(result, Err(BookingError::Validation(_))));
}

#[tokio::test]
async fn test_overlapping_room_slot_rejected() {
    let f = fixture().await;
    let other = f
        .directory
        .create_customer(
            &Actor::new(UserId::new(), Role::Admin),
            NewCustomer {
                branch_id: f.branch,
                name: "Sam Member".to_string(),
                email: "sam@example.com".to_string(),
                phone: None,
                company: None,
                package_id: None,
            },
        )
        .await
        .unwrap();

    f.service
        .book_at(&f.staff, request(&f, day(5), "10:00", "11:00"), now())
        .await
        .unwrap();

    let mut clash = request(&f, day(5), "10:30", "11:30");
    clash.customer_id = Some(other.id);
    let result = f.service.book_at(&f.staff, clash, now()).await;
    match result {
        Err(e @ BookingError::SlotUnavailable) => assert_eq!(e.to_string(), "Time slot not available"),
        other => panic!("expected SlotUnavailable, got {:?}", other.map(|b| b.id)),
    }

    let available = f
        .service
        .available_rooms(&f.staff, f.branch, day(5), TimeSlot::parse("10:15", "10:45").unwrap())
        .await
        .unwrap();
    assert!(available.is_empty());

    let later = f
        .service
        .available_rooms(&f.staff, f.branch, day(5), TimeSlot::parse("11:00", "12:00").unwrap())
        .await
        .unwrap();
    assert_eq!(later.len(), 1);
}

#[tokio::test]
async fn test_package_sets_monthly_limit() {
    let f = fixture().await;
    let manager = Actor::new(UserId::new(), Role::Manager).in_branch(f.branch);
    let package = f
        .service
        .create_package(
            &manager,
            NewPackage {
                name: "Hot desk".to_string(),
                monthly_hours: 2,
                price: dec!(99),
                description: None,
            },
        )
        .await
        .unwrap();
    let customer = f
        .service
        .assign_package(&manager, f.customer, Some(package.id))
        .await
        .unwrap();
    assert_eq!(customer.package_id, Some(package.id));

    f.service
        .book_at(&f.staff, request(&f, day(3), "09:00", "10:30"), now())
        .await
        .unwrap();
    let result = f
        .service
        .book_at(&f.staff, request(&f, day(4), "09:00", "10:00"), now())
        .await;
    assert!(matches!(result, Err(BookingError::MonthlyLimitExceeded { .. })));

    let usage = f
        .service
        .quota_usage(&f.staff, f.customer, day(4))
        .await
        .unwrap();
    assert_eq!(usage.monthly_limit_minutes, 120);
    assert_eq!(usage.monthly_used_minutes, 90);
    assert_eq!(usage.daily_used_minutes, 0);
}

#[tokio::test]
async fn test_cancel_releases_quota() {
    let f = fixture().await;
    let booking = f
        .service
        .book_at(&f.staff, request(&f, day(3), "09:00", "11:00"), now())
        .await
        .unwrap();

    let cancelled = f
        .service
        .cancel_booking_at(&f.staff, booking.id, now())
        .await
        .unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert!(cancelled.cancelled_at.is_some());

    let again = f.service.cancel_booking_at(&f.staff, booking.id, now()).await;
    assert!(matches!(again, Err(BookingError::InvalidState(_))));

    f.service
        .book_at(&f.staff, request(&f, day(3), "09:00", "11:00"), now())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_customer_books_for_self_only() {
    let f = fixture().await;
    let member = Actor::new(UserId::new(), Role::Customer)
        .in_branch(f.branch)
        .as_customer(f.customer);

    let mut own = request(&f, day(6), "09:00", "10:00");
    own.customer_id = None;
    let booking = f.service.book_at(&member, own, now()).await.unwrap();
    assert_eq!(booking.customer_id, f.customer);

    let mut someone_else = request(&f, day(6), "12:00", "12:30");
    someone_else.customer_id = Some(CustomerId::new());
    let result = f.service.book_at(&member, someone_else, now()).await;
    assert!(matches!(result, Err(BookingError::Forbidden(_))));

    let listed = f
        .service
        .list_bookings(&member, BookingQuery::default(), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(listed.pagination.total, 1);
}

#[tokio::test]
async fn test_booking_in_dst_gap_can_still_be_cancelled() {
    let directory_port = Arc::new(MemoryDirectoryPort::new());
    let admin = Actor::new(UserId::new(), Role::Admin);
    let directory = DirectoryService::new(directory_port.clone());
    let branch = directory
        .create_branch(
            &admin,
            NewBranch {
                code: "NY".to_string(),
                name: "New York".to_string(),
                timezone: "America/New_York".parse().unwrap(),
                address: None,
            },
        )
        .await
        .unwrap();

    let bookings = Arc::new(MemoryBookingPort::new());
    let port: Arc<dyn DirectoryPort> = directory_port;
    let service = BookingService::new(bookings.clone(), port, QuotaPolicy::default());
    let room = service
        .create_room(
            &admin,
            NewMeetingRoom {
                branch_id: branch.id,
                name: "Loft".to_string(),
                capacity: 4,
                hourly_rate: dec!(20),
                amenities: Vec::new(),
            },
        )
        .await
        .unwrap();

    // 02:30 does not exist on 2024-03-10 in New York
    let stored = Booking::confirmed(
        CustomerId::new(),
        room.id,
        branch.id,
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
        TimeSlot::parse("02:30", "03:30").unwrap(),
        None,
        admin.user_id,
    );
    let stored = bookings
        .reserve(stored, QuotaPolicy::default().guard_for(None))
        .await
        .unwrap();

    let before_gap = Utc.with_ymd_and_hms(2024, 3, 10, 6, 0, 0).unwrap();
    let cancelled = service.cancel_booking_at(&admin, stored.id, before_gap).await.unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
}
