//! Booking use-cases combining the local ledger and the reservation API.
//!
//! The ledger decides availability. A booking is first recorded locally, then
//! created remotely; a definite remote failure rolls the local row back, while
//! a lost response keeps it so an operator can reconcile.

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::domain::ports::{BookingLedger, BookingLedgerError, HostRecord};
use crate::domain::reservation_client::{
    ReservationClient, ReservationError, ReservationRequest, SessionState,
};
use crate::domain::{
    Booking, BookingSlot, LocalBookingId, NewBooking, RemoteBookingId, StationNumber, UserId,
};

/// Errors surfaced by [`BookingCoordinator`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingServiceError {
    /// Another booking overlaps the requested window.
    #[error("station {station} is already booked on {date} in that window")]
    SlotUnavailable {
        station: StationNumber,
        date: NaiveDate,
    },
    /// The remote call failed after the request may have been delivered. The
    /// local row is kept without a remote id.
    #[error("reservation outcome unknown for local booking {local_id}: {source}")]
    RemoteOutcomeUnknown {
        local_id: LocalBookingId,
        #[source]
        source: ReservationError,
    },
    /// The user has no bookings.
    #[error("user {user_id} has no bookings to cancel")]
    NothingToCancel { user_id: UserId },
    /// No booking with this id belongs to the user.
    #[error("booking {id} not found")]
    NotFound { id: LocalBookingId },
    #[error(transparent)]
    Remote(#[from] ReservationError),
    #[error(transparent)]
    Ledger(#[from] BookingLedgerError),
}

/// One booking request from the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    pub user_id: UserId,
    pub slot: BookingSlot,
    pub contact_phone: String,
    pub contact_email: String,
}

/// Result of a successful booking.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingConfirmation {
    pub booking_id: LocalBookingId,
    /// Absent when the server's record carried no id.
    pub remote_booking_id: Option<RemoteBookingId>,
    /// Record returned by the reservation API.
    pub record: Value,
}

/// Front-end facing booking service.
///
/// Owns the single reservation session; concurrent callers take turns on it.
pub struct BookingCoordinator {
    ledger: Arc<dyn BookingLedger>,
    client: ReservationClient,
    session: Mutex<SessionState>,
}

impl BookingCoordinator {
    pub fn new(
        ledger: Arc<dyn BookingLedger>,
        client: ReservationClient,
        session: SessionState,
    ) -> Self {
        Self {
            ledger,
            client,
            session: Mutex::new(session),
        }
    }

    /// Book a slot locally and remotely.
    ///
    /// The availability check and the insert are separate statements, so two
    /// concurrent callers can both pass the check for the same window.
    pub async fn book(
        &self,
        request: &BookingRequest,
    ) -> Result<BookingConfirmation, BookingServiceError> {
        let slot = request.slot;
        if !self.ledger.is_available(&slot).await? {
            info!(
                station = slot.station().get(),
                date = %slot.date_text(),
                "slot unavailable"
            );
            return Err(BookingServiceError::SlotUnavailable {
                station: slot.station(),
                date: slot.date(),
            });
        }

        let local_id = self
            .ledger
            .add_booking(&NewBooking::pending(request.user_id, slot))
            .await?;
        let remote_request = ReservationRequest::for_slot(
            request.user_id,
            &slot,
            request.contact_phone.as_str(),
            request.contact_email.as_str(),
        );

        let outcome = {
            let mut session = self.session.lock().await;
            self.client
                .create_booking(&mut session, &remote_request)
                .await
        };

        match outcome {
            Ok(reservation) => {
                if let Some(remote_id) = reservation.id {
                    self.ledger
                        .update_remote_id(local_id, remote_id)
                        .await
                        .inspect_err(|error| {
                            error!(
                                local_id = local_id.get(),
                                remote_id = remote_id.get(),
                                error = %error,
                                "reservation created but remote id not stored"
                            );
                        })?;
                } else {
                    warn!(
                        local_id = local_id.get(),
                        "reservation record carried no id"
                    );
                }
                info!(
                    local_id = local_id.get(),
                    user_id = request.user_id.get(),
                    "booking confirmed"
                );
                Ok(BookingConfirmation {
                    booking_id: local_id,
                    remote_booking_id: reservation.id,
                    record: reservation.record,
                })
            }
            Err(source) if source.is_outcome_unknown() => {
                warn!(
                    local_id = local_id.get(),
                    error = %source,
                    "reservation outcome unknown; keeping local booking"
                );
                Err(BookingServiceError::RemoteOutcomeUnknown { local_id, source })
            }
            Err(source) => {
                if let Err(rollback) = self.ledger.delete_booking(local_id).await {
                    error!(
                        local_id = local_id.get(),
                        error = %rollback,
                        "failed to roll back local booking"
                    );
                }
                Err(BookingServiceError::Remote(source))
            }
        }
    }

    /// Cancel the user's most recently created booking.
    pub async fn cancel_last(&self, user_id: UserId) -> Result<Booking, BookingServiceError> {
        let booking = self
            .ledger
            .last_booking(user_id)
            .await?
            .ok_or(BookingServiceError::NothingToCancel { user_id })?;
        self.cancel_booking(booking).await
    }

    /// Cancel one booking owned by the user.
    pub async fn cancel(
        &self,
        user_id: UserId,
        id: LocalBookingId,
    ) -> Result<Booking, BookingServiceError> {
        let booking = self
            .ledger
            .find_booking(id)
            .await?
            .filter(|booking| booking.user_id == user_id)
            .ok_or(BookingServiceError::NotFound { id })?;
        self.cancel_booking(booking).await
    }

    /// The user's bookings, newest date first.
    pub async fn bookings(&self, user_id: UserId) -> Result<Vec<Booking>, BookingServiceError> {
        Ok(self.ledger.user_bookings(user_id).await?)
    }

    /// Remote host list.
    pub async fn hosts(&self) -> Result<Vec<HostRecord>, BookingServiceError> {
        let mut session = self.session.lock().await;
        Ok(self.client.hosts(&mut session).await?)
    }

    /// Release the client's pooled connections.
    pub fn shutdown(&self) {
        self.client.close();
    }

    async fn cancel_booking(&self, booking: Booking) -> Result<Booking, BookingServiceError> {
        if let Some(remote_id) = booking.remote_booking_id {
            let mut session = self.session.lock().await;
            self.client.delete_booking(&mut session, remote_id).await?;
        }
        self.ledger.delete_booking(booking.id).await?;
        info!(
            local_id = booking.id.get(),
            user_id = booking.user_id.get(),
            "booking cancelled"
        );
        Ok(booking)
    }
}
