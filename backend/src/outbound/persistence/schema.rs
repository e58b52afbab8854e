//! Diesel table definitions for the SQLite ledger.
//!
//! Must match `migrations/` plus the additive `api_booking_id` column applied
//! by [`super::bootstrap_schema`].

diesel::table! {
    /// One row per local booking.
    ///
    /// `date` is `YYYY-MM-DD`; `time_from` and `time_to` are zero-padded
    /// `HH:MM`, so text comparison orders them chronologically.
    bookings (id) {
        id -> BigInt,
        /// Front-end user id.
        user_id -> BigInt,
        /// Station number.
        pc_number -> Integer,
        date -> Text,
        time_from -> Text,
        time_to -> Text,
        /// Remote reservation id, null until the API confirmed the booking.
        api_booking_id -> Nullable<BigInt>,
    }
}
