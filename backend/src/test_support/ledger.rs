//! Throwaway SQLite ledgers for adapter tests.

use std::path::PathBuf;

use tempfile::TempDir;

use crate::domain::ports::BookingLedgerError;
use crate::outbound::persistence::{
    DbPool, DieselBookingLedger, PoolConfig, PoolError, bootstrap_schema,
};

/// Errors raised while provisioning a temporary ledger.
#[derive(Debug, thiserror::Error)]
pub enum TempLedgerError {
    #[error("failed to create temporary directory: {0}")]
    TempDir(#[from] std::io::Error),
    #[error(transparent)]
    Bootstrap(#[from] BookingLedgerError),
    #[error(transparent)]
    Pool(#[from] PoolError),
}

/// Ledger database living in its own temporary directory.
///
/// The directory, and the database with it, is removed on drop.
pub struct TempLedger {
    dir: TempDir,
    path: PathBuf,
}

impl TempLedger {
    /// Create an empty directory without bootstrapping a schema.
    pub fn empty() -> Result<Self, TempLedgerError> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("club.db");
        Ok(Self { dir, path })
    }

    /// Create a temporary ledger with the current schema applied.
    pub async fn bootstrapped() -> Result<Self, TempLedgerError> {
        let ledger = Self::empty()?;
        bootstrap_schema(&ledger.database_path()).await?;
        Ok(ledger)
    }

    pub fn database_path(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    pub fn dir(&self) -> &std::path::Path {
        self.dir.path()
    }

    /// Open a pool against the temporary database.
    pub async fn pool(&self) -> Result<DbPool, TempLedgerError> {
        Ok(DbPool::new(PoolConfig::new(self.database_path())).await?)
    }

    /// Open a ledger adapter against the temporary database.
    pub async fn ledger(&self) -> Result<DieselBookingLedger, TempLedgerError> {
        Ok(DieselBookingLedger::new(self.pool().await?))
    }
}
