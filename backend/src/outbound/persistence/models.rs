//! Diesel row structs for the ledger. Internal to the persistence adapter.

use diesel::prelude::*;

use super::schema::bookings;
use crate::domain::{
    Booking, BookingSlot, LocalBookingId, NewBooking, RemoteBookingId, StationNumber, UserId,
};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = bookings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub(crate) struct BookingRow {
    pub id: i64,
    pub user_id: i64,
    pub pc_number: i32,
    pub date: String,
    pub time_from: String,
    pub time_to: String,
    pub api_booking_id: Option<i64>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = String;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let station = StationNumber::from_signed(i64::from(row.pc_number))
            .map_err(|err| format!("booking {}: {err}", row.id))?;
        let slot = BookingSlot::parse(station, &row.date, &row.time_from, &row.time_to)
            .map_err(|err| format!("booking {}: {err}", row.id))?;
        Ok(Self {
            id: LocalBookingId::new(row.id),
            user_id: UserId::new(row.user_id),
            slot,
            remote_booking_id: row.api_booking_id.map(RemoteBookingId::new),
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = bookings)]
pub(crate) struct NewBookingRow {
    pub user_id: i64,
    pub pc_number: i32,
    pub date: String,
    pub time_from: String,
    pub time_to: String,
    pub api_booking_id: Option<i64>,
}

impl NewBookingRow {
    /// Build an insertable row; fails only when the station does not fit the
    /// column, which `StationNumber` already rules out.
    pub fn try_from_domain(booking: &NewBooking) -> Result<Self, String> {
        let pc_number = i32::try_from(booking.slot.station().get())
            .map_err(|_| format!("station {} out of range", booking.slot.station()))?;
        Ok(Self {
            user_id: booking.user_id.get(),
            pc_number,
            date: booking.slot.date_text(),
            time_from: booking.slot.time_from_text(),
            time_to: booking.slot.time_to_text(),
            api_booking_id: booking.remote_booking_id.map(RemoteBookingId::get),
        })
    }
}
