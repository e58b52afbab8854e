//! Booking data model shared by the ledger and the reservation client.
//!
//! Stations are the numbered PCs a user picks from; bookings pin one station to
//! a half-open `[time_from, time_to)` window on a calendar date.

use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveTime, Timelike};

/// Wire format for booking dates (`2025-01-15`).
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Wire format for booking times of day (`14:00`).
pub const TIME_FORMAT: &str = "%H:%M";

/// Validation errors returned by booking constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingValidationError {
    /// Station numbers start at 1.
    ZeroStation,
    /// Station number does not fit the ledger's integer column.
    StationOutOfRange { value: u64 },
    /// Date text was not `YYYY-MM-DD`.
    InvalidDate { value: String },
    /// Time text was not `HH:MM`.
    InvalidTime { value: String },
    /// Start and end times are identical.
    EmptyInterval,
}

impl fmt::Display for BookingValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroStation => write!(f, "station number must be positive"),
            Self::StationOutOfRange { value } => {
                write!(f, "station number {value} is out of range")
            }
            Self::InvalidDate { value } => {
                write!(f, "date '{value}' must use the YYYY-MM-DD format")
            }
            Self::InvalidTime { value } => write!(f, "time '{value}' must use the HH:MM format"),
            Self::EmptyInterval => write!(f, "booking must end after it starts"),
        }
    }
}

impl std::error::Error for BookingValidationError {}

/// External user identifier supplied by the chat front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(i64);

impl UserId {
    /// Wrap a raw front-end user id.
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Raw identifier value.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Visible ordinal number of a bookable station.
///
/// ## Invariants
/// - Always positive.
/// - Fits in a signed 32-bit ledger column.
///
/// # Examples
/// ```
/// use club_booking::domain::StationNumber;
///
/// let station = StationNumber::new(7).expect("positive station");
/// assert_eq!(station.get(), 7);
/// assert!(StationNumber::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StationNumber(u32);

impl StationNumber {
    /// Validate and construct a station number.
    pub fn new(raw: u32) -> Result<Self, BookingValidationError> {
        if raw == 0 {
            return Err(BookingValidationError::ZeroStation);
        }
        if i32::try_from(raw).is_err() {
            return Err(BookingValidationError::StationOutOfRange {
                value: u64::from(raw),
            });
        }
        Ok(Self(raw))
    }

    /// Build a station number from a signed value, as stored by the ledger or
    /// returned by the remote host list.
    pub fn from_signed(raw: i64) -> Result<Self, BookingValidationError> {
        let value = u32::try_from(raw).map_err(|_| {
            if raw <= 0 {
                BookingValidationError::ZeroStation
            } else {
                BookingValidationError::StationOutOfRange {
                    value: raw.unsigned_abs(),
                }
            }
        })?;
        Self::new(value)
    }

    /// Raw station number.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for StationNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sequential identifier of a ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalBookingId(i64);

impl LocalBookingId {
    /// Wrap a ledger row id.
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Raw row id.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for LocalBookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier the reservation API assigned to a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RemoteBookingId(i64);

impl RemoteBookingId {
    /// Wrap a remote reservation id.
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Raw remote id.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RemoteBookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Station, date, and time window of one booking.
///
/// Times are minute precision; seconds are not persisted. An end time earlier
/// than the start time is accepted and means the booking runs past midnight.
/// For overlap checks such a window covers `[time_from, 24:00)` and
/// `[00:00, time_to)` of its own date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingSlot {
    station: StationNumber,
    date: NaiveDate,
    time_from: NaiveTime,
    time_to: NaiveTime,
}

impl BookingSlot {
    /// Build a slot from typed parts.
    pub fn new(
        station: StationNumber,
        date: NaiveDate,
        time_from: NaiveTime,
        time_to: NaiveTime,
    ) -> Result<Self, BookingValidationError> {
        if time_from == time_to {
            return Err(BookingValidationError::EmptyInterval);
        }
        Ok(Self {
            station,
            date,
            time_from,
            time_to,
        })
    }

    /// Parse a slot from the textual formats used by the front end.
    ///
    /// # Examples
    /// ```
    /// use club_booking::domain::{BookingSlot, StationNumber};
    ///
    /// let station = StationNumber::new(3).expect("station");
    /// let slot = BookingSlot::parse(station, "2025-01-15", "14:00", "17:00").expect("slot");
    /// assert_eq!(slot.time_from_text(), "14:00");
    /// ```
    pub fn parse(
        station: StationNumber,
        date: &str,
        time_from: &str,
        time_to: &str,
    ) -> Result<Self, BookingValidationError> {
        Self::new(
            station,
            parse_date(date)?,
            parse_time(time_from)?,
            parse_time(time_to)?,
        )
    }

    /// Station being booked.
    pub fn station(&self) -> StationNumber {
        self.station
    }

    /// Calendar date of the booking.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Inclusive start time.
    pub fn time_from(&self) -> NaiveTime {
        self.time_from
    }

    /// Exclusive end time.
    pub fn time_to(&self) -> NaiveTime {
        self.time_to
    }

    /// Date rendered as `YYYY-MM-DD`.
    pub fn date_text(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }

    /// Start time rendered as `HH:MM`.
    pub fn time_from_text(&self) -> String {
        self.time_from.format(TIME_FORMAT).to_string()
    }

    /// End time rendered as `HH:MM`.
    pub fn time_to_text(&self) -> String {
        self.time_to.format(TIME_FORMAT).to_string()
    }

    /// Whether this slot collides with the window `[time_from, time_to)` of
    /// another booking on the same station and date.
    ///
    /// Touching windows do not collide. Either window may run past midnight.
    pub fn overlaps_window(&self, time_from: NaiveTime, time_to: NaiveTime) -> bool {
        let theirs = day_segments(time_from, time_to);
        day_segments(self.time_from, self.time_to)
            .into_iter()
            .flatten()
            .any(|(start, end)| {
                theirs
                    .into_iter()
                    .flatten()
                    .any(|(other_start, other_end)| start < other_end && other_start < end)
            })
    }
}

const MINUTES_PER_DAY: u32 = 24 * 60;

fn minute_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Split a window into at most two `[start, end)` minute ranges within one day.
fn day_segments(time_from: NaiveTime, time_to: NaiveTime) -> [Option<(u32, u32)>; 2] {
    let start = minute_of_day(time_from);
    let end = minute_of_day(time_to);
    match start.cmp(&end) {
        Ordering::Less => [Some((start, end)), None],
        Ordering::Greater => [Some((start, MINUTES_PER_DAY)), (end > 0).then_some((0, end))],
        Ordering::Equal => [None, None],
    }
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Result<NaiveDate, BookingValidationError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        BookingValidationError::InvalidDate {
            value: value.to_owned(),
        }
    })
}

/// Parse an `HH:MM` time of day.
pub fn parse_time(value: &str) -> Result<NaiveTime, BookingValidationError> {
    NaiveTime::parse_from_str(value.trim(), TIME_FORMAT).map_err(|_| {
        BookingValidationError::InvalidTime {
            value: value.to_owned(),
        }
    })
}

/// Booking about to be written to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewBooking {
    /// Owner of the booking.
    pub user_id: UserId,
    /// Booked window.
    pub slot: BookingSlot,
    /// Remote id when already known; usually patched in later.
    pub remote_booking_id: Option<RemoteBookingId>,
}

impl NewBooking {
    /// A booking recorded before the remote reservation exists.
    pub fn pending(user_id: UserId, slot: BookingSlot) -> Self {
        Self {
            user_id,
            slot,
            remote_booking_id: None,
        }
    }
}

/// Booking row as stored in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Booking {
    /// Ledger row id.
    pub id: LocalBookingId,
    /// Owner of the booking.
    pub user_id: UserId,
    /// Booked window.
    pub slot: BookingSlot,
    /// Remote reservation id, absent until remote creation succeeded.
    pub remote_booking_id: Option<RemoteBookingId>,
}
