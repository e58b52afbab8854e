//! `club-booking` command-line driver for the booking core.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io::{self, Write};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Result, eyre};
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use club_booking::config::{ClubApiSettings, LedgerSettings};
use club_booking::domain::reservation_client::{ReservationClient, SessionState};
use club_booking::domain::{
    Booking, BookingCoordinator, BookingRequest, BookingServiceError, BookingSlot,
    LocalBookingId, StationNumber, UserId,
};
use club_booking::outbound::club_api::ClubApiHttpGateway;
use club_booking::outbound::persistence::{DbPool, DieselBookingLedger, bootstrap_schema};

/// `club-booking` command arguments.
#[derive(Debug, Parser)]
#[command(
    name = "club-booking",
    about = "Book club stations against the local ledger and the reservation API",
    version
)]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Book a station for a time window.
    Book {
        #[arg(long)]
        user: i64,
        #[arg(long)]
        station: u32,
        /// Date as `YYYY-MM-DD`.
        #[arg(long)]
        date: String,
        /// Start time as `HH:MM`.
        #[arg(long)]
        from: String,
        /// End time as `HH:MM`; earlier than the start means past midnight.
        #[arg(long)]
        to: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "")]
        email: String,
    },
    /// Cancel the user's most recent booking.
    CancelLast {
        #[arg(long)]
        user: i64,
    },
    /// Cancel one booking by its local id.
    Cancel {
        #[arg(long)]
        user: i64,
        #[arg(long)]
        booking: i64,
    },
    /// List the user's bookings.
    List {
        #[arg(long)]
        user: i64,
    },
    /// List remote hosts.
    Hosts,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let args = CliArgs::parse();
    let coordinator = build_coordinator().await?;
    let outcome = run(&coordinator, args.command).await;
    coordinator.shutdown();
    outcome
}

async fn build_coordinator() -> Result<BookingCoordinator> {
    let program = [OsString::from("club-booking")];
    let api_settings = ClubApiSettings::load_from_iter(program.clone())
        .map_err(|err| eyre!("load CLUB_API settings: {err}"))?;
    let ledger_settings = LedgerSettings::load_from_iter(program)
        .map_err(|err| eyre!("load BOOKING_LEDGER settings: {err}"))?;

    let api = api_settings.validate()?;
    let pool_config = ledger_settings.pool_config();
    bootstrap_schema(pool_config.database_path())
        .await
        .wrap_err("bootstrap ledger schema")?;
    let pool = DbPool::new(pool_config)
        .await
        .wrap_err("open ledger database")?;

    let gateway = ClubApiHttpGateway::new(&api.base_url, api.timeouts, api.disable_ssl_verify)?;
    let client = ReservationClient::new(
        Arc::new(gateway),
        Arc::new(DefaultClock),
        api.credentials,
        api.retry,
    );
    Ok(BookingCoordinator::new(
        Arc::new(DieselBookingLedger::new(pool)),
        client,
        SessionState::default(),
    ))
}

async fn run(coordinator: &BookingCoordinator, command: Command) -> Result<()> {
    let mut out = io::stdout();
    match command {
        Command::Book {
            user,
            station,
            date,
            from,
            to,
            phone,
            email,
        } => {
            let slot = BookingSlot::parse(StationNumber::new(station)?, &date, &from, &to)?;
            let request = BookingRequest {
                user_id: UserId::new(user),
                slot,
                contact_phone: phone,
                contact_email: email,
            };
            match coordinator.book(&request).await {
                Ok(confirmation) => {
                    let remote = confirmation
                        .remote_booking_id
                        .map_or_else(|| "unknown".to_owned(), |id| id.to_string());
                    writeln!(
                        out,
                        "booked #{} (remote {remote}): PC {} on {} {}-{}",
                        confirmation.booking_id,
                        slot.station(),
                        slot.date_text(),
                        slot.time_from_text(),
                        slot.time_to_text()
                    )?;
                }
                Err(BookingServiceError::RemoteOutcomeUnknown { local_id, source }) => {
                    writeln!(
                        out,
                        "booking #{local_id} recorded locally; remote outcome unknown ({source})"
                    )?;
                }
                Err(err) => return Err(err.into()),
            }
        }
        Command::CancelLast { user } => {
            let booking = coordinator.cancel_last(UserId::new(user)).await?;
            writeln!(out, "cancelled {}", describe(&booking))?;
        }
        Command::Cancel { user, booking } => {
            let booking = coordinator
                .cancel(UserId::new(user), LocalBookingId::new(booking))
                .await?;
            writeln!(out, "cancelled {}", describe(&booking))?;
        }
        Command::List { user } => {
            let bookings = coordinator.bookings(UserId::new(user)).await?;
            if bookings.is_empty() {
                writeln!(out, "no bookings")?;
            }
            for booking in &bookings {
                writeln!(out, "{}", describe(booking))?;
            }
        }
        Command::Hosts => {
            for host in coordinator.hosts().await? {
                writeln!(
                    out,
                    "number={} id={} name={}",
                    display_or_dash(host.number),
                    display_or_dash(host.id),
                    host.name.as_deref().unwrap_or("-")
                )?;
            }
        }
    }
    Ok(())
}

fn describe(booking: &Booking) -> String {
    format!(
        "#{} PC {} on {} {}-{} (remote {})",
        booking.id,
        booking.slot.station(),
        booking.slot.date_text(),
        booking.slot.time_from_text(),
        booking.slot.time_to_text(),
        display_or_dash(booking.remote_booking_id)
    )
}

fn display_or_dash<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_owned(), |value| value.to_string())
}

#[cfg(test)]
mod tests {
    //! Regression coverage for argument parsing.
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn parses_book_arguments() {
        let args = CliArgs::try_parse_from([
            "club-booking",
            "book",
            "--user",
            "42",
            "--station",
            "3",
            "--date",
            "2025-01-15",
            "--from",
            "14:00",
            "--to",
            "17:00",
        ])
        .expect("valid arguments");

        match args.command {
            Command::Book {
                user,
                station,
                phone,
                email,
                ..
            } => {
                assert_eq!((user, station), (42, 3));
                assert!(phone.is_empty());
                assert!(email.is_empty());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[rstest]
    #[case(&["club-booking", "cancel-last", "--user", "7"])]
    #[case(&["club-booking", "cancel", "--user", "7", "--booking", "12"])]
    #[case(&["club-booking", "list", "--user", "7"])]
    #[case(&["club-booking", "hosts"])]
    fn parses_other_subcommands(#[case] argv: &[&str]) {
        CliArgs::try_parse_from(argv).expect("valid arguments");
    }

    #[rstest]
    fn cancel_requires_a_booking_id() {
        assert!(CliArgs::try_parse_from(["club-booking", "cancel", "--user", "7"]).is_err());
    }

    #[rstest]
    fn missing_values_render_as_dashes() {
        assert_eq!(display_or_dash(None::<i64>), "-");
        assert_eq!(display_or_dash(Some(5001)), "5001");
    }
}
