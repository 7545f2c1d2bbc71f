//! Booking Domain
//!
//! Meeting rooms, membership packages and room bookings.
//!
//! Every booking passes the quota guard, in this order:
//!
//! 1. the start (date and time in the branch timezone) must be in the future
//! 2. the customer must not be `LOCKED`
//! 3. the slot must end after it starts
//! 4. the customer's booked minutes that day stay within the daily cap
//!    (120 minutes unless configured otherwise)
//! 5. the customer's booked minutes that calendar month stay within the
//!    package allowance (20 hours without a package)
//! 6. the room is free for the whole slot
//!
//! Steps 4 to 6 are repeated by the store inside the same atomic unit that
//! inserts the booking, so concurrent requests cannot both pass.

pub mod room;
pub mod package;
pub mod booking;
pub mod quota;
pub mod error;
pub mod ports;
pub mod service;

pub use room::{MeetingRoom, NewMeetingRoom};
pub use package::{NewPackage, Package};
pub use booking::{Booking, BookingRequest, BookingStatus};
pub use quota::{QuotaGuard, QuotaPolicy, QuotaUsage};
pub use error::BookingError;
pub use ports::{BookingPort, BookingQuery, RoomQuery};
#[cfg(any(test, feature = "memory"))]
pub use ports::memory::MemoryBookingPort;
pub use service::BookingService;
