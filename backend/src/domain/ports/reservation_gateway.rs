//! Driven port for the club's remote reservation API.
//!
//! The gateway performs exactly one HTTP exchange per call. Retries, token
//! bookkeeping, and host-id resolution live in the reservation client so the
//! adapter stays a thin transport.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use zeroize::Zeroizing;

use super::define_port_error;
use crate::domain::{RemoteBookingId, UserId};

/// Credentials sent to the token endpoint.
#[derive(Clone)]
pub struct ApiCredentials {
    username: String,
    password: Zeroizing<String>,
    branch_id: Option<i64>,
    register_id: Option<i64>,
}

impl ApiCredentials {
    /// Build credentials for one operator account.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Zeroizing::new(password.into()),
            branch_id: None,
            register_id: None,
        }
    }

    /// Scope the token to a club branch.
    pub fn with_branch_id(mut self, branch_id: Option<i64>) -> Self {
        self.branch_id = branch_id;
        self
    }

    /// Scope the token to a cash register.
    pub fn with_register_id(mut self, register_id: Option<i64>) -> Self {
        self.register_id = register_id;
        self
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        self.password.as_str()
    }

    pub fn branch_id(&self) -> Option<i64> {
        self.branch_id
    }

    pub fn register_id(&self) -> Option<i64> {
        self.register_id
    }
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("branch_id", &self.branch_id)
            .field("register_id", &self.register_id)
            .finish()
    }
}

/// Token pair returned by a successful authentication exchange.
///
/// Fields are optional because the server may answer 200 without them; the
/// client decides whether that counts as a failure.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct TokenGrant {
    pub token: Option<String>,
    pub refresh_token: Option<String>,
}

impl fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGrant")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Remote identifier of a bookable station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostId(i64);

impl HostId {
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry of the remote host list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRecord {
    /// Visible station number, when the server supplied one.
    pub number: Option<i64>,
    /// Remote host id, when the server supplied one.
    pub id: Option<i64>,
    /// Display name, informational only.
    pub name: Option<String>,
}

/// Body of a reservation creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationPayload {
    pub user_id: UserId,
    /// Start timestamp formatted `YYYY-MM-DDTHH:MM:SS.000Z`.
    pub start: String,
    pub duration_minutes: u32,
    pub contact_phone: String,
    /// Validated email, or the empty string.
    pub contact_email: String,
    pub note: String,
    pub host_id: HostId,
}

/// Record returned by the server after creating a reservation.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteReservation {
    /// Reservation id, when the record carried a numeric one.
    pub id: Option<RemoteBookingId>,
    /// Full unwrapped record as returned by the server.
    pub record: Value,
}

define_port_error! {
    /// Errors surfaced while calling the reservation API.
    pub enum ReservationGatewayError {
        /// Connection could not be established; the request was never sent.
        Connect { message: String } =>
            "reservation api connection failed: {message}",
        /// Connection broke after the request may have been sent.
        Transport { message: String } =>
            "reservation api transport failed: {message}",
        /// Request exceeded its timeout.
        Timeout { message: String } =>
            "reservation api timeout: {message}",
        /// Server answered with a gateway-class 5xx status.
        ServerUnavailable { status: u16, message: String } =>
            "reservation api unavailable ({status}): {message}",
        /// Response body could not be decoded.
        Decode { message: String } =>
            "reservation api response decode failed: {message}",
        /// Server answered with a non-success status.
        Rejected { status: u16, message: String } =>
            "reservation api rejected request ({status}): {message}",
        /// TLS handshake or certificate validation failed.
        Tls { message: String } =>
            "reservation api tls failure: {message}",
        /// Adapter could not build the request.
        InvalidRequest { message: String } =>
            "reservation api request invalid: {message}",
    }
}

impl ReservationGatewayError {
    /// Return whether retrying authentication after this error may help.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. }
                | Self::Transport { .. }
                | Self::Timeout { .. }
                | Self::ServerUnavailable { .. }
                | Self::Decode { .. }
        )
    }
}

/// Single-shot operations against the reservation API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReservationGateway: Send + Sync {
    /// Exchange credentials for a token pair.
    async fn request_token(
        &self,
        credentials: &ApiCredentials,
    ) -> Result<TokenGrant, ReservationGatewayError>;

    /// List non-deleted hosts.
    async fn list_hosts(&self, token: &str) -> Result<Vec<HostRecord>, ReservationGatewayError>;

    /// Create one reservation.
    async fn create_reservation(
        &self,
        token: &str,
        payload: &ReservationPayload,
    ) -> Result<RemoteReservation, ReservationGatewayError>;

    /// Delete one reservation.
    async fn delete_reservation(
        &self,
        token: &str,
        id: RemoteBookingId,
    ) -> Result<(), ReservationGatewayError>;

    /// Release pooled connections. Later calls reopen them.
    fn close(&self);
}
