//! Domain ports for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod booking_ledger;
mod reservation_gateway;

#[cfg(test)]
pub use booking_ledger::MockBookingLedger;
pub use booking_ledger::{BookingLedger, BookingLedgerError};
#[cfg(test)]
pub use reservation_gateway::MockReservationGateway;
pub use reservation_gateway::{
    ApiCredentials, HostId, HostRecord, RemoteReservation, ReservationGateway,
    ReservationGatewayError, ReservationPayload, TokenGrant,
};
