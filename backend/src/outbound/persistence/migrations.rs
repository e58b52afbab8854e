//! Ledger schema bootstrap.
//!
//! Runs the embedded Diesel migrations, then adds `api_booking_id` to ledgers
//! created before the column existed. Both steps are idempotent.

use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

use crate::domain::ports::BookingLedgerError;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

const ADD_REMOTE_ID_COLUMN: &str = "ALTER TABLE bookings ADD COLUMN api_booking_id INTEGER";

/// Bring the ledger at `database_path` up to the current schema, creating the
/// file when missing.
pub async fn bootstrap_schema(database_path: &str) -> Result<(), BookingLedgerError> {
    let path = database_path.to_owned();
    tokio::task::spawn_blocking(move || bootstrap_blocking(&path))
        .await
        .map_err(|err| BookingLedgerError::migration(format!("bootstrap task failed: {err}")))?
}

fn bootstrap_blocking(database_path: &str) -> Result<(), BookingLedgerError> {
    let mut conn = SqliteConnection::establish(database_path)
        .map_err(|err| BookingLedgerError::connection(err.to_string()))?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| BookingLedgerError::migration(err.to_string()))?;
    if !applied.is_empty() {
        info!(
            database = database_path,
            applied = applied.len(),
            "applied ledger migrations"
        );
    }
    add_remote_id_column(&mut conn)
}

fn add_remote_id_column(conn: &mut SqliteConnection) -> Result<(), BookingLedgerError> {
    match diesel::sql_query(ADD_REMOTE_ID_COLUMN).execute(conn) {
        Ok(_) => {
            info!("added api_booking_id column to legacy ledger");
            Ok(())
        }
        Err(DieselError::DatabaseError(_, info))
            if info.message().contains("duplicate column name") =>
        {
            Ok(())
        }
        Err(err) => Err(BookingLedgerError::migration(err.to_string())),
    }
}
