//! Layered settings (environment, config files, defaults) via OrthoConfig.

mod club_api;
mod ledger;

pub use club_api::{ClubApiConfig, ClubApiConfigError, ClubApiSettings};
pub use ledger::LedgerSettings;
