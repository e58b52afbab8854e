//! Domain primitives, ports, and booking use-cases.
//!
//! Public surface:
//! - Booking types (`BookingSlot`, `Booking`, `NewBooking`, identifiers).
//! - `ports`: traits implemented by outbound adapters.
//! - `reservation_client`: authenticated access to the reservation API.
//! - `BookingCoordinator`: ledger-first booking and cancellation.

pub mod booking;
pub mod booking_coordinator;
pub mod ports;
pub mod reservation_client;

pub use self::booking::{
    Booking, BookingSlot, BookingValidationError, DATE_FORMAT, LocalBookingId, NewBooking,
    RemoteBookingId, StationNumber, TIME_FORMAT, UserId,
};
pub use self::booking_coordinator::{
    BookingConfirmation, BookingCoordinator, BookingRequest, BookingServiceError,
};
