//! SQLite-backed `BookingLedger` implementation using Diesel.

use async_trait::async_trait;
use chrono::NaiveTime;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{BookingRow, NewBookingRow};
use super::pool::DbPool;
use super::schema::bookings;
use crate::domain::booking::parse_time;
use crate::domain::ports::{BookingLedger, BookingLedgerError};
use crate::domain::{Booking, BookingSlot, LocalBookingId, NewBooking, RemoteBookingId, UserId};

/// Diesel-backed implementation of the booking ledger port.
#[derive(Clone)]
pub struct DieselBookingLedger {
    pool: DbPool,
}

impl DieselBookingLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn to_domain(row: BookingRow) -> Result<Booking, BookingLedgerError> {
    Booking::try_from(row)
        .map_err(|message| BookingLedgerError::query(format!("corrupt booking row: {message}")))
}

fn stored_window(
    time_from: &str,
    time_to: &str,
) -> Result<(NaiveTime, NaiveTime), BookingLedgerError> {
    let parse = |value: &str| {
        parse_time(value)
            .map_err(|err| BookingLedgerError::query(format!("corrupt booking window: {err}")))
    };
    Ok((parse(time_from)?, parse(time_to)?))
}

fn pc_number(slot: &BookingSlot) -> Result<i32, BookingLedgerError> {
    i32::try_from(slot.station().get())
        .map_err(|_| BookingLedgerError::query(format!("station {} out of range", slot.station())))
}

#[async_trait]
impl BookingLedger for DieselBookingLedger {
    async fn is_available(&self, slot: &BookingSlot) -> Result<bool, BookingLedgerError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        // Windows past midnight do not order as text, so each row of the
        // station's date is checked against the slot.
        let windows: Vec<(String, String)> = bookings::table
            .filter(bookings::pc_number.eq(pc_number(slot)?))
            .filter(bookings::date.eq(slot.date_text()))
            .select((bookings::time_from, bookings::time_to))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        for (time_from, time_to) in &windows {
            let (from, to) = stored_window(time_from, time_to)?;
            if slot.overlaps_window(from, to) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn add_booking(
        &self,
        booking: &NewBooking,
    ) -> Result<LocalBookingId, BookingLedgerError> {
        let row = NewBookingRow::try_from_domain(booking).map_err(BookingLedgerError::query)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let id: i64 = diesel::insert_into(bookings::table)
            .values(row)
            .returning(bookings::id)
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(LocalBookingId::new(id))
    }

    async fn update_remote_id(
        &self,
        id: LocalBookingId,
        remote_id: RemoteBookingId,
    ) -> Result<(), BookingLedgerError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::update(bookings::table.filter(bookings::id.eq(id.get())))
            .set(bookings::api_booking_id.eq(Some(remote_id.get())))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(())
    }

    async fn last_booking(&self, user_id: UserId) -> Result<Option<Booking>, BookingLedgerError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = bookings::table
            .filter(bookings::user_id.eq(user_id.get()))
            .order(bookings::id.desc())
            .select(BookingRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(to_domain).transpose()
    }

    async fn find_booking(
        &self,
        id: LocalBookingId,
    ) -> Result<Option<Booking>, BookingLedgerError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = bookings::table
            .find(id.get())
            .select(BookingRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(to_domain).transpose()
    }

    async fn user_bookings(&self, user_id: UserId) -> Result<Vec<Booking>, BookingLedgerError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<BookingRow> = bookings::table
            .filter(bookings::user_id.eq(user_id.get()))
            .order((
                bookings::date.desc(),
                bookings::time_from.desc(),
                bookings::id.desc(),
            ))
            .select(BookingRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(to_domain).collect()
    }

    async fn delete_booking(&self, id: LocalBookingId) -> Result<(), BookingLedgerError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::delete(bookings::table.filter(bookings::id.eq(id.get())))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(())
    }
}
