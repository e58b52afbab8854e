//! Booking core for a computer club: reservation API client, SQLite booking
//! ledger, and the coordinator tying them together.

pub mod config;
pub mod domain;
pub mod outbound;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
