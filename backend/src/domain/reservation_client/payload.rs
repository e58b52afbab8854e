//! Pure helpers that shape the reservation creation request.

use chrono::{DateTime, NaiveDateTime, NaiveTime, Utc};

use crate::domain::TIME_FORMAT;
use crate::domain::booking::parse_date;

/// Timestamp layout expected by the reservation API.
pub const START_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S.000Z";
/// Duration used when either time cannot be parsed.
pub const FALLBACK_DURATION_MINUTES: u32 = 60;

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Minutes between two `HH:MM` times, wrapping past midnight when the end
/// precedes the start.
///
/// # Examples
/// ```
/// use club_booking::domain::reservation_client::duration_minutes;
///
/// assert_eq!(duration_minutes("14:00", "17:30"), 210);
/// assert_eq!(duration_minutes("23:00", "01:00"), 120);
/// assert_eq!(duration_minutes("soon", "later"), 60);
/// ```
pub fn duration_minutes(time_from: &str, time_to: &str) -> u32 {
    let parsed = (
        NaiveTime::parse_from_str(time_from.trim(), TIME_FORMAT),
        NaiveTime::parse_from_str(time_to.trim(), TIME_FORMAT),
    );
    let (Ok(start), Ok(end)) = parsed else {
        return FALLBACK_DURATION_MINUTES;
    };
    let mut minutes = end.signed_duration_since(start).num_minutes();
    if end < start {
        minutes += MINUTES_PER_DAY;
    }
    u32::try_from(minutes).unwrap_or(FALLBACK_DURATION_MINUTES)
}

/// Start timestamp for `date` and `time_from`, or `now` when either part is
/// malformed.
pub fn start_timestamp(date: &str, time_from: &str, now: DateTime<Utc>) -> String {
    let start = parse_date(date).ok().and_then(|day| {
        NaiveTime::parse_from_str(time_from.trim(), TIME_FORMAT)
            .ok()
            .map(|time| NaiveDateTime::new(day, time))
    });
    match start {
        Some(start) => start.format(START_TIMESTAMP_FORMAT).to_string(),
        None => now.naive_utc().format(START_TIMESTAMP_FORMAT).to_string(),
    }
}

/// Keep `raw` only when it looks like an email address: it contains `@` and
/// the segment between the first and second `@` contains a dot.
pub fn contact_email(raw: &str) -> String {
    let looks_valid = raw
        .split('@')
        .nth(1)
        .is_some_and(|domain| domain.contains('.'));
    if looks_valid {
        raw.to_owned()
    } else {
        String::new()
    }
}

/// Free-text note attached to every reservation.
pub fn booking_note(station: u32) -> String {
    format!("Booked via chat bot (PC {station})")
}
