//! Reservation API client.
//!
//! Wraps a [`ReservationGateway`] with the behaviour the rest of the system
//! relies on: authentication with exponential backoff, lazy token
//! acquisition, station-to-host resolution, and request shaping. Session state
//! is owned by the caller and lent to each operation.

use std::sync::Arc;

use mockable::Clock;
use tracing::{debug, error, info, warn};
use zeroize::Zeroizing;

use crate::domain::ports::{
    ApiCredentials, HostId, HostRecord, RemoteReservation, ReservationGateway,
    ReservationGatewayError, ReservationPayload,
};
use crate::domain::{BookingSlot, RemoteBookingId, StationNumber, UserId};

mod host_cache;
mod payload;
mod retry;
mod session;

pub use host_cache::{CacheExpiry, HostCache};
pub use payload::{
    FALLBACK_DURATION_MINUTES, START_TIMESTAMP_FORMAT, booking_note, contact_email,
    duration_minutes, start_timestamp,
};
pub use retry::{
    DEFAULT_AUTH_ATTEMPTS, DEFAULT_BACKOFF_BASE, RetryPolicy, RetrySleeper, TokioSleeper,
};
pub use session::{AuthPhase, SessionState};

/// Errors returned by [`ReservationClient`] operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReservationError {
    /// Authentication gave up, either on a non-retryable error or after the
    /// attempt budget was spent.
    #[error("authentication failed after {attempts} attempt(s): {source}")]
    AuthenticationFailed {
        attempts: u32,
        #[source]
        source: ReservationGatewayError,
    },
    /// The token endpoint answered 200 without a usable token.
    #[error("authentication response did not contain an access token")]
    MissingToken,
    /// A single authenticated call failed.
    #[error(transparent)]
    Gateway(#[from] ReservationGatewayError),
}

impl ReservationError {
    /// Whether the request may have taken effect on the server without a
    /// usable answer: a timeout or broken exchange after sending, or a 200
    /// whose body could not be decoded. Connection failures are definite.
    pub fn is_outcome_unknown(&self) -> bool {
        matches!(
            self,
            Self::Gateway(
                ReservationGatewayError::Timeout { .. }
                    | ReservationGatewayError::Transport { .. }
                    | ReservationGatewayError::Decode { .. }
            )
        )
    }
}

/// Inputs for one reservation as received from the front end.
///
/// Date and times stay textual; malformed values degrade to defaults instead
/// of failing the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationRequest {
    pub user_id: UserId,
    pub station: StationNumber,
    /// `YYYY-MM-DD`.
    pub date: String,
    /// `HH:MM`.
    pub time_from: String,
    /// `HH:MM`.
    pub time_to: String,
    pub contact_phone: String,
    pub contact_email: String,
}

impl ReservationRequest {
    /// Build a request for an already validated slot.
    pub fn for_slot(
        user_id: UserId,
        slot: &BookingSlot,
        contact_phone: impl Into<String>,
        contact_email: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            station: slot.station(),
            date: slot.date_text(),
            time_from: slot.time_from_text(),
            time_to: slot.time_to_text(),
            contact_phone: contact_phone.into(),
            contact_email: contact_email.into(),
        }
    }
}

/// Client for the club's reservation API.
pub struct ReservationClient {
    gateway: Arc<dyn ReservationGateway>,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn RetrySleeper>,
    credentials: ApiCredentials,
    retry: RetryPolicy,
}

impl ReservationClient {
    /// Build a client that sleeps on the Tokio timer between retries.
    pub fn new(
        gateway: Arc<dyn ReservationGateway>,
        clock: Arc<dyn Clock>,
        credentials: ApiCredentials,
        retry: RetryPolicy,
    ) -> Self {
        Self::with_sleeper(gateway, clock, Arc::new(TokioSleeper), credentials, retry)
    }

    /// Build a client with an injected sleeper.
    pub fn with_sleeper(
        gateway: Arc<dyn ReservationGateway>,
        clock: Arc<dyn Clock>,
        sleeper: Arc<dyn RetrySleeper>,
        credentials: ApiCredentials,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            gateway,
            clock,
            sleeper,
            credentials,
            retry,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Obtain a token pair, retrying transient failures with exponential
    /// backoff for up to `max_attempts` attempts.
    ///
    /// TLS failures and non-retryable statuses fail on the first attempt. A
    /// 200 answer without a token fails without retrying.
    pub async fn authenticate(
        &self,
        session: &mut SessionState,
        max_attempts: u32,
    ) -> Result<(), ReservationError> {
        let policy = self.retry.with_max_attempts(max_attempts);
        let mut attempt = 1_u32;

        loop {
            session.begin_attempt(attempt);
            let error = match self.gateway.request_token(&self.credentials).await {
                Ok(grant) => {
                    let Some(token) = grant.token.filter(|token| !token.is_empty()) else {
                        session.mark_unauthenticated();
                        error!(attempt, "authentication response carried no access token");
                        return Err(ReservationError::MissingToken);
                    };
                    session.complete(token, grant.refresh_token);
                    info!(attempt, "authenticated against reservation api");
                    return Ok(());
                }
                Err(error) => error,
            };

            let delay = if error.is_retryable() {
                policy.delay_after(attempt)
            } else {
                None
            };
            let Some(delay) = delay else {
                session.mark_unauthenticated();
                error!(attempt, error = %error, "authentication failed");
                return Err(ReservationError::AuthenticationFailed {
                    attempts: attempt,
                    source: error,
                });
            };

            warn!(
                attempt,
                max_attempts = policy.max_attempts(),
                delay_secs = delay.as_secs(),
                error = %error,
                "authentication attempt failed; retrying"
            );
            self.sleeper.sleep(delay).await;
            attempt = attempt.saturating_add(1);
        }
    }

    /// Return the current access token, authenticating first when the session
    /// has none. Tokens are not checked for expiry.
    pub async fn ensure_authenticated(
        &self,
        session: &mut SessionState,
    ) -> Result<Zeroizing<String>, ReservationError> {
        if !session.is_authenticated() {
            self.authenticate(session, self.retry.max_attempts())
                .await?;
        }
        session
            .access_token()
            .map(|token| Zeroizing::new(token.to_owned()))
            .ok_or(ReservationError::MissingToken)
    }

    /// List non-deleted hosts. Failures are not retried.
    pub async fn hosts(
        &self,
        session: &mut SessionState,
    ) -> Result<Vec<HostRecord>, ReservationError> {
        let token = self.ensure_authenticated(session).await?;
        let hosts = self.gateway.list_hosts(&token).await.inspect_err(|error| {
            error!(error = %error, "failed to list hosts");
        })?;
        debug!(count = hosts.len(), "listed hosts");
        Ok(hosts)
    }

    /// Map a station number to its remote host id.
    ///
    /// The host list is fetched once and cached. When the list cannot be
    /// fetched, or the station is not in it, the station number itself is
    /// returned. A failed fetch leaves the cache empty so the next call tries
    /// again.
    pub async fn resolve_host_id(
        &self,
        session: &mut SessionState,
        station: StationNumber,
    ) -> HostId {
        let number = i64::from(station.get());
        let now = self.clock.utc();

        if !session.hosts().is_fresh(now) {
            match self.hosts(session).await {
                Ok(records) => {
                    let stored = session.hosts_mut().populate(&records, now);
                    debug!(
                        stored,
                        generation = session.hosts().generation(),
                        "populated host cache"
                    );
                }
                Err(error) => {
                    warn!(
                        station = number,
                        error = %error,
                        "host list unavailable; using station number as host id"
                    );
                    return HostId::new(number);
                }
            }
        }

        if let Some(host_id) = session.hosts().get(number) {
            debug!(station = number, host_id = host_id.get(), "resolved host id");
            return host_id;
        }
        warn!(
            station = number,
            "station missing from host list; using station number as host id"
        );
        HostId::new(number)
    }

    /// Create a reservation. Failures are not retried.
    pub async fn create_booking(
        &self,
        session: &mut SessionState,
        request: &ReservationRequest,
    ) -> Result<RemoteReservation, ReservationError> {
        let token = self.ensure_authenticated(session).await?;
        let host_id = self.resolve_host_id(session, request.station).await;
        let payload = self.build_payload(request, host_id);

        let reservation = self
            .gateway
            .create_reservation(&token, &payload)
            .await
            .inspect_err(|error| {
                error!(
                    station = request.station.get(),
                    date = %request.date,
                    error = %error,
                    "failed to create reservation"
                );
            })?;
        info!(
            station = request.station.get(),
            host_id = host_id.get(),
            remote_id = reservation.id.map(RemoteBookingId::get),
            "created reservation"
        );
        Ok(reservation)
    }

    /// Delete a reservation. Failures are not retried.
    pub async fn delete_booking(
        &self,
        session: &mut SessionState,
        id: RemoteBookingId,
    ) -> Result<(), ReservationError> {
        let token = self.ensure_authenticated(session).await?;
        self.gateway
            .delete_reservation(&token, id)
            .await
            .inspect_err(|error| {
                error!(remote_id = id.get(), error = %error, "failed to delete reservation");
            })?;
        info!(remote_id = id.get(), "deleted reservation");
        Ok(())
    }

    /// Release pooled HTTP connections.
    pub fn close(&self) {
        self.gateway.close();
    }

    fn build_payload(&self, request: &ReservationRequest, host_id: HostId) -> ReservationPayload {
        ReservationPayload {
            user_id: request.user_id,
            start: start_timestamp(&request.date, &request.time_from, self.clock.utc()),
            duration_minutes: duration_minutes(&request.time_from, &request.time_to),
            contact_phone: request.contact_phone.clone(),
            contact_email: contact_email(&request.contact_email),
            note: booking_note(request.station.get()),
            host_id,
        }
    }
}

#[cfg(test)]
mod tests;
