//! Driven port for the local booking ledger.
//!
//! The ledger is the source of truth for availability decisions: the remote
//! reservation system is only written to after the ledger accepts a slot.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{Booking, BookingSlot, LocalBookingId, NewBooking, RemoteBookingId, UserId};

define_port_error! {
    /// Errors raised by ledger adapters.
    pub enum BookingLedgerError {
        /// Storage could not be reached or a connection could not be checked out.
        Connection { message: String } => "booking ledger connection failed: {message}",
        /// Storage rejected or failed to execute a statement.
        Query { message: String } => "booking ledger query failed: {message}",
        /// Schema bootstrap failed.
        Migration { message: String } => "booking ledger migration failed: {message}",
    }
}

/// Persistence operations for bookings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingLedger: Send + Sync {
    /// Return `true` when no stored booking on the same station and date
    /// overlaps the half-open window of `slot`.
    ///
    /// Touching intervals (`[10:00, 12:00)` against `[12:00, 14:00)`) do not
    /// overlap. A window running past midnight covers both ends of its date.
    async fn is_available(&self, slot: &BookingSlot) -> Result<bool, BookingLedgerError>;

    /// Insert a booking unconditionally and return its new row id.
    async fn add_booking(&self, booking: &NewBooking)
    -> Result<LocalBookingId, BookingLedgerError>;

    /// Attach the remote reservation id to an existing row.
    ///
    /// Unknown row ids are a silent no-op.
    async fn update_remote_id(
        &self,
        id: LocalBookingId,
        remote_id: RemoteBookingId,
    ) -> Result<(), BookingLedgerError>;

    /// Most recently inserted booking of a user.
    async fn last_booking(&self, user_id: UserId) -> Result<Option<Booking>, BookingLedgerError>;

    /// Fetch one booking by row id.
    async fn find_booking(&self, id: LocalBookingId)
    -> Result<Option<Booking>, BookingLedgerError>;

    /// All bookings of a user, newest date first, later start first within a
    /// date.
    async fn user_bookings(&self, user_id: UserId) -> Result<Vec<Booking>, BookingLedgerError>;

    /// Delete a booking by row id. Unknown ids are a silent no-op.
    async fn delete_booking(&self, id: LocalBookingId) -> Result<(), BookingLedgerError>;
}
