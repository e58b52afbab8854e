//! Reservation API settings loaded via OrthoConfig.

use std::fmt;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::ports::ApiCredentials;
use crate::domain::reservation_client::{DEFAULT_AUTH_ATTEMPTS, DEFAULT_BACKOFF_BASE, RetryPolicy};
use crate::outbound::club_api::ClubApiTimeouts;

/// Raw reservation API settings (`CLUB_API_*`).
#[derive(Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CLUB_API")]
pub struct ClubApiSettings {
    /// Server root, e.g. `https://club.example.com`.
    pub base_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub branch_id: Option<i64>,
    pub register_id: Option<i64>,
    /// Skip TLS certificate validation for every host.
    #[ortho_config(default = false)]
    pub disable_ssl_verify: bool,
    /// Authentication attempts including the first.
    pub auth_max_attempts: Option<u32>,
    /// Delay before the second authentication attempt, in seconds.
    pub auth_backoff_base_secs: Option<u64>,
    pub auth_timeout_secs: Option<u64>,
    pub auth_connect_timeout_secs: Option<u64>,
    pub api_timeout_secs: Option<u64>,
    pub api_connect_timeout_secs: Option<u64>,
}

impl fmt::Debug for ClubApiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClubApiSettings")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("branch_id", &self.branch_id)
            .field("register_id", &self.register_id)
            .field("disable_ssl_verify", &self.disable_ssl_verify)
            .field("auth_max_attempts", &self.auth_max_attempts)
            .field("auth_backoff_base_secs", &self.auth_backoff_base_secs)
            .finish_non_exhaustive()
    }
}

/// Settings that cannot be turned into a usable client configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClubApiConfigError {
    #[error("missing required setting CLUB_API_{name}")]
    Missing { name: &'static str },
    #[error("invalid CLUB_API_BASE_URL '{value}': {message}")]
    InvalidBaseUrl { value: String, message: String },
}

/// Validated reservation API configuration.
#[derive(Debug, Clone)]
pub struct ClubApiConfig {
    pub base_url: Url,
    pub credentials: ApiCredentials,
    pub disable_ssl_verify: bool,
    pub retry: RetryPolicy,
    pub timeouts: ClubApiTimeouts,
}

impl ClubApiSettings {
    /// Authentication attempt budget, falling back to the default.
    pub fn auth_max_attempts(&self) -> u32 {
        self.auth_max_attempts.unwrap_or(DEFAULT_AUTH_ATTEMPTS)
    }

    /// Backoff base, falling back to the default.
    pub fn auth_backoff_base(&self) -> Duration {
        self.auth_backoff_base_secs
            .map_or(DEFAULT_BACKOFF_BASE, Duration::from_secs)
    }

    /// Request timeouts with per-field overrides applied.
    pub fn timeouts(&self) -> ClubApiTimeouts {
        let defaults = ClubApiTimeouts::default();
        let pick = |value: Option<u64>, fallback: Duration| {
            value.map_or(fallback, Duration::from_secs)
        };
        ClubApiTimeouts {
            auth_total: pick(self.auth_timeout_secs, defaults.auth_total),
            auth_connect: pick(self.auth_connect_timeout_secs, defaults.auth_connect),
            api_total: pick(self.api_timeout_secs, defaults.api_total),
            api_connect: pick(self.api_connect_timeout_secs, defaults.api_connect),
        }
    }

    /// Validate required fields and build the typed configuration.
    ///
    /// # Errors
    ///
    /// Fails when the base URL, username, or password is missing, or the base
    /// URL does not parse.
    pub fn validate(&self) -> Result<ClubApiConfig, ClubApiConfigError> {
        let raw_url = required(self.base_url.as_deref(), "BASE_URL")?;
        let base_url =
            Url::parse(raw_url.trim()).map_err(|err| ClubApiConfigError::InvalidBaseUrl {
                value: raw_url.to_owned(),
                message: err.to_string(),
            })?;
        let username = required(self.username.as_deref(), "USERNAME")?;
        let password = required(self.password.as_deref(), "PASSWORD")?;

        Ok(ClubApiConfig {
            base_url,
            credentials: ApiCredentials::new(username, password)
                .with_branch_id(self.branch_id)
                .with_register_id(self.register_id),
            disable_ssl_verify: self.disable_ssl_verify,
            retry: RetryPolicy::new(self.auth_max_attempts(), self.auth_backoff_base()),
            timeouts: self.timeouts(),
        })
    }
}

fn required<'a>(
    value: Option<&'a str>,
    name: &'static str,
) -> Result<&'a str, ClubApiConfigError> {
    value
        .filter(|value| !value.trim().is_empty())
        .ok_or(ClubApiConfigError::Missing { name })
}
