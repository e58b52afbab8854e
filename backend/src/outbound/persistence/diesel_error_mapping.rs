//! Diesel and pool error mapping for the booking ledger.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;
use crate::domain::ports::BookingLedgerError;

pub(crate) fn map_pool_error(error: PoolError) -> BookingLedgerError {
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    BookingLedgerError::connection(message)
}

/// Map Diesel failures into ledger errors, keeping the database message.
pub(crate) fn map_diesel_error(error: DieselError) -> BookingLedgerError {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(error = %error, "diesel operation failed"),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, info) => {
            BookingLedgerError::connection(info.message().to_owned())
        }
        DieselError::DatabaseError(_, info) => BookingLedgerError::query(info.message().to_owned()),
        DieselError::NotFound => BookingLedgerError::query("record not found"),
        other => BookingLedgerError::query(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn pool_errors_become_connection_errors() {
        let mapped = map_pool_error(PoolError::checkout("timed out waiting for connection"));
        assert_eq!(
            mapped,
            BookingLedgerError::connection("timed out waiting for connection")
        );
    }

    #[rstest]
    fn closed_connections_become_connection_errors() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::ClosedConnection,
            Box::new("connection closed".to_owned()),
        );
        assert_eq!(
            map_diesel_error(error),
            BookingLedgerError::connection("connection closed")
        );
    }

    #[rstest]
    fn other_database_errors_become_query_errors() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::Unknown,
            Box::new("no such table: bookings".to_owned()),
        );
        assert_eq!(
            map_diesel_error(error),
            BookingLedgerError::query("no such table: bookings")
        );
    }
}
