//! Reservation API outbound adapter.
//!
//! A thin HTTP implementation of the `ReservationGateway` port.

mod dto;
mod http_gateway;
mod tls;

pub use http_gateway::{ClubApiHttpGateway, ClubApiTimeouts};
