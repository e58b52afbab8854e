//! Client session state: tokens, authentication phase, and the host cache.

use std::fmt;

use zeroize::Zeroizing;

use super::host_cache::{CacheExpiry, HostCache};

/// Authentication lifecycle.
///
/// `Unauthenticated -> Authenticating -> Authenticated`, falling back to
/// `Unauthenticated` when an authentication run fails. Nothing moves an
/// authenticated session back automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthPhase {
    #[default]
    Unauthenticated,
    Authenticating {
        /// 1-based attempt currently in flight.
        attempt: u32,
    },
    Authenticated,
}

/// Process-lifetime state owned by the caller and lent to the client.
#[derive(Default)]
pub struct SessionState {
    phase: AuthPhase,
    access_token: Option<Zeroizing<String>>,
    refresh_token: Option<Zeroizing<String>>,
    hosts: HostCache,
}

impl SessionState {
    pub fn new(expiry: CacheExpiry) -> Self {
        Self {
            hosts: HostCache::new(expiry),
            ..Self::default()
        }
    }

    /// Pre-authenticated session, mainly for tests and token reuse.
    pub fn with_tokens(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        let mut state = Self::default();
        state.complete(access_token.into(), refresh_token);
        state
    }

    pub fn phase(&self) -> AuthPhase {
        self.phase
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_ref().map(|token| token.as_str())
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_ref().map(|token| token.as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    pub fn hosts(&self) -> &HostCache {
        &self.hosts
    }

    pub fn hosts_mut(&mut self) -> &mut HostCache {
        &mut self.hosts
    }

    pub(crate) fn begin_attempt(&mut self, attempt: u32) {
        self.phase = AuthPhase::Authenticating { attempt };
    }

    pub(crate) fn complete(&mut self, access_token: String, refresh_token: Option<String>) {
        self.access_token = Some(Zeroizing::new(access_token));
        self.refresh_token = refresh_token.map(Zeroizing::new);
        self.phase = AuthPhase::Authenticated;
    }

    /// Forget the tokens; the next operation authenticates again.
    pub fn mark_unauthenticated(&mut self) {
        self.access_token = None;
        self.refresh_token = None;
        self.phase = AuthPhase::Unauthenticated;
    }
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionState")
            .field("phase", &self.phase)
            .field("has_access_token", &self.access_token.is_some())
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("cached_hosts", &self.hosts.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn new_sessions_start_unauthenticated() {
        let state = SessionState::default();
        assert_eq!(state.phase(), AuthPhase::Unauthenticated);
        assert!(!state.is_authenticated());
    }

    #[rstest]
    fn completing_stores_both_tokens() {
        let mut state = SessionState::default();
        state.begin_attempt(2);
        assert_eq!(state.phase(), AuthPhase::Authenticating { attempt: 2 });

        state.complete("access".to_owned(), Some("refresh".to_owned()));
        assert_eq!(state.phase(), AuthPhase::Authenticated);
        assert_eq!(state.access_token(), Some("access"));
        assert_eq!(state.refresh_token(), Some("refresh"));
    }

    #[rstest]
    fn debug_output_never_prints_tokens() {
        let state = SessionState::with_tokens("very-secret", None);
        let rendered = format!("{state:?}");
        assert!(!rendered.contains("very-secret"), "token leaked: {rendered}");
    }
}
