//! SQLite persistence adapters using Diesel ORM.
//!
//! - **Thin adapters**: only translate between Diesel rows and domain types.
//! - **Internal models**: row structs (`models.rs`) and `schema.rs` never leave
//!   this module.
//! - **Async pooling**: `bb8` pools of `diesel-async` wrapped SQLite
//!   connections.
//!
//! # Example
//!
//! ```ignore
//! use club_booking::outbound::persistence::{
//!     DbPool, DieselBookingLedger, PoolConfig, bootstrap_schema,
//! };
//!
//! bootstrap_schema("club.db").await?;
//! let pool = DbPool::new(PoolConfig::new("club.db")).await?;
//! let ledger = DieselBookingLedger::new(pool);
//! ```

mod diesel_booking_ledger;
mod diesel_error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_booking_ledger::DieselBookingLedger;
pub use migrations::{MIGRATIONS, bootstrap_schema};
pub use pool::{DbPool, LedgerConnection, PoolConfig, PoolError};
