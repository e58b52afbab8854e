//! Booking ledger settings loaded via OrthoConfig.

use std::path::PathBuf;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::outbound::persistence::PoolConfig;

const DEFAULT_DATABASE_PATH: &str = "club.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 1;

/// Ledger storage settings (`BOOKING_LEDGER_*`).
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "BOOKING_LEDGER")]
pub struct LedgerSettings {
    /// SQLite file holding the ledger.
    pub database_path: Option<PathBuf>,
    /// Pool size override.
    pub max_connections: Option<u32>,
}

impl LedgerSettings {
    /// Return the configured database path, falling back to `club.db`.
    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH))
    }

    pub fn max_connections(&self) -> u32 {
        self.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS)
    }

    /// Pool configuration for these settings.
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig::new(self.database_path().to_string_lossy().into_owned())
            .with_max_size(self.max_connections())
    }
}
