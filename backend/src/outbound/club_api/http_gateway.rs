//! Reqwest-backed reservation API adapter.
//!
//! Owns transport details only: URL building, per-profile timeouts, TLS
//! policy, status mapping, and JSON decoding. Every call performs a single
//! exchange.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use super::dto::{
    ReservationRequestDto, TokenEnvelopeDto, hosts_from_value, reservation_from_value,
};
use super::tls::{is_certificate_error, skip_certificate_validation};
use crate::domain::RemoteBookingId;
use crate::domain::ports::{
    ApiCredentials, HostRecord, RemoteReservation, ReservationGateway, ReservationGatewayError,
    ReservationPayload, TokenGrant,
};

const API_ROOT_PATH: &str = "api/v2.0/";

/// Total and connect timeouts for both request profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClubApiTimeouts {
    pub auth_total: Duration,
    pub auth_connect: Duration,
    pub api_total: Duration,
    pub api_connect: Duration,
}

impl Default for ClubApiTimeouts {
    fn default() -> Self {
        Self {
            auth_total: Duration::from_secs(90),
            auth_connect: Duration::from_secs(30),
            api_total: Duration::from_secs(30),
            api_connect: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Profile {
    Auth,
    Api,
}

/// HTTP adapter for the reservation API.
///
/// Clients are built on first use, one per timeout profile, and reused until
/// [`ReservationGateway::close`] drops them.
pub struct ClubApiHttpGateway {
    api_root: Url,
    accept_invalid_certs: bool,
    timeouts: ClubApiTimeouts,
    auth_client: Mutex<Option<Client>>,
    api_client: Mutex<Option<Client>>,
}

impl ClubApiHttpGateway {
    /// Build an adapter rooted at `{base_url}/api/v2.0/`.
    ///
    /// # Errors
    ///
    /// Returns [`ReservationGatewayError::InvalidRequest`] when the base URL
    /// cannot carry a path.
    pub fn new(
        base_url: &Url,
        timeouts: ClubApiTimeouts,
        disable_ssl_verify: bool,
    ) -> Result<Self, ReservationGatewayError> {
        let api_root = api_root(base_url)?;
        let accept_invalid_certs = skip_certificate_validation(base_url, disable_ssl_verify);
        if disable_ssl_verify {
            warn!(
                base_url = %base_url,
                "TLS certificate validation disabled by configuration"
            );
        } else if accept_invalid_certs {
            debug!(
                base_url = %base_url,
                "TLS certificate validation skipped for local host"
            );
        }
        Ok(Self {
            api_root,
            accept_invalid_certs,
            timeouts,
            auth_client: Mutex::new(None),
            api_client: Mutex::new(None),
        })
    }

    /// Whether certificate validation is skipped for this adapter.
    pub fn accepts_invalid_certs(&self) -> bool {
        self.accept_invalid_certs
    }

    fn client(&self, profile: Profile) -> Result<Client, ReservationGatewayError> {
        let (slot, total, connect) = match profile {
            Profile::Auth => (
                &self.auth_client,
                self.timeouts.auth_total,
                self.timeouts.auth_connect,
            ),
            Profile::Api => (
                &self.api_client,
                self.timeouts.api_total,
                self.timeouts.api_connect,
            ),
        };
        let mut guard = lock_slot(slot);
        if let Some(client) = guard.as_ref() {
            return Ok(client.clone());
        }
        let client = Client::builder()
            .timeout(total)
            .connect_timeout(connect)
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .build()
            .map_err(|error| {
                ReservationGatewayError::invalid_request(format!(
                    "failed to build http client: {error}"
                ))
            })?;
        *guard = Some(client.clone());
        Ok(client)
    }

    fn endpoint(&self, path: &str) -> Result<Url, ReservationGatewayError> {
        self.api_root.join(path).map_err(|error| {
            ReservationGatewayError::invalid_request(format!("invalid endpoint {path}: {error}"))
        })
    }
}

#[async_trait]
impl ReservationGateway for ClubApiHttpGateway {
    async fn request_token(
        &self,
        credentials: &ApiCredentials,
    ) -> Result<TokenGrant, ReservationGatewayError> {
        let mut query = vec![
            ("Username", credentials.username().to_owned()),
            ("Password", credentials.password().to_owned()),
        ];
        if let Some(branch_id) = credentials.branch_id() {
            query.push(("BranchId", branch_id.to_string()));
        }
        if let Some(register_id) = credentials.register_id() {
            query.push(("RegisterId", register_id.to_string()));
        }

        let request = self
            .client(Profile::Auth)?
            .get(self.endpoint("auth/accesstoken")?)
            .query(&query);
        let body = exchange(request).await?;
        let envelope: TokenEnvelopeDto = decode(&body)?;
        Ok(envelope.into_grant())
    }

    async fn list_hosts(&self, token: &str) -> Result<Vec<HostRecord>, ReservationGatewayError> {
        let request = self
            .client(Profile::Api)?
            .get(self.endpoint("hosts")?)
            .bearer_auth(token)
            .query(&[("IsDeleted", "false")]);
        let body = exchange(request).await?;
        Ok(hosts_from_value(decode(&body)?))
    }

    async fn create_reservation(
        &self,
        token: &str,
        payload: &ReservationPayload,
    ) -> Result<RemoteReservation, ReservationGatewayError> {
        let request = self
            .client(Profile::Api)?
            .post(self.endpoint("reservations")?)
            .bearer_auth(token)
            .json(&ReservationRequestDto::from(payload));
        let body = exchange(request).await?;
        Ok(reservation_from_value(decode(&body)?))
    }

    async fn delete_reservation(
        &self,
        token: &str,
        id: RemoteBookingId,
    ) -> Result<(), ReservationGatewayError> {
        let request = self
            .client(Profile::Api)?
            .delete(self.endpoint(&format!("reservations/{id}"))?)
            .bearer_auth(token);
        exchange(request).await?;
        Ok(())
    }

    fn close(&self) {
        lock_slot(&self.auth_client).take();
        lock_slot(&self.api_client).take();
    }
}

fn lock_slot(slot: &Mutex<Option<Client>>) -> MutexGuard<'_, Option<Client>> {
    // A cached client cannot be left half-written, so a poisoned slot is
    // still usable.
    slot.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

fn api_root(base_url: &Url) -> Result<Url, ReservationGatewayError> {
    let mut root = base_url.clone();
    if root.cannot_be_a_base() {
        return Err(ReservationGatewayError::invalid_request(format!(
            "base url {base_url} cannot carry a path"
        )));
    }
    if !root.path().ends_with('/') {
        let path = format!("{}/", root.path());
        root.set_path(&path);
    }
    root.join(API_ROOT_PATH).map_err(|error| {
        ReservationGatewayError::invalid_request(format!("invalid base url {base_url}: {error}"))
    })
}

/// Send one request and return the body of a 200 answer.
async fn exchange(request: RequestBuilder) -> Result<Vec<u8>, ReservationGatewayError> {
    let response = request.send().await.map_err(map_transport_error)?;
    let status = response.status();
    let body = response.bytes().await.map_err(map_transport_error)?;
    if status != StatusCode::OK {
        return Err(map_status_error(status, body.as_ref()));
    }
    Ok(body.to_vec())
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ReservationGatewayError> {
    serde_json::from_slice(body).map_err(|error| {
        ReservationGatewayError::decode(format!("invalid reservation api JSON payload: {error}"))
    })
}

fn map_transport_error(error: reqwest::Error) -> ReservationGatewayError {
    if is_certificate_error(&error) {
        ReservationGatewayError::tls(error.to_string())
    } else if error.is_connect() {
        ReservationGatewayError::connect(error.to_string())
    } else if error.is_timeout() {
        ReservationGatewayError::timeout(error.to_string())
    } else {
        ReservationGatewayError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> ReservationGatewayError {
    let body_preview = body_preview(body);
    let message = if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        body_preview
    };

    match status {
        StatusCode::INTERNAL_SERVER_ERROR
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => {
            ReservationGatewayError::server_unavailable(status.as_u16(), message)
        }
        _ => ReservationGatewayError::rejected(status.as_u16(), message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 200;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
