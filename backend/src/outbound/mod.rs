//! Outbound adapters implementing domain ports.
//!
//! - **club_api**: reqwest-backed reservation API gateway
//! - **persistence**: SQLite booking ledger via Diesel
//!
//! Adapters translate between domain types and infrastructure representations
//! and hold no business logic.

pub mod club_api;
pub mod persistence;
