//! TLS policy for the reservation API.

use std::error::Error as StdError;

use url::{Host, Url};

/// Decide whether certificate validation is skipped for `base_url`.
///
/// Local development servers (loopback, `localhost`, `0.0.0.0`) use
/// self-signed certificates; elsewhere only the explicit override disables
/// validation.
pub(super) fn skip_certificate_validation(base_url: &Url, override_requested: bool) -> bool {
    override_requested || is_local_host(base_url)
}

fn is_local_host(base_url: &Url) -> bool {
    match base_url.host() {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(address)) => address.is_loopback() || address.is_unspecified(),
        Some(Host::Ipv6(address)) => address.is_loopback(),
        None => false,
    }
}

/// Whether a transport error was caused by TLS certificate validation.
///
/// Walks the source chain looking for a `rustls` error, including one wrapped
/// in an `io::Error`, and falls back to the error text.
pub(super) fn is_certificate_error(error: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(cause) = current {
        if cause.downcast_ref::<rustls::Error>().is_some() {
            return true;
        }
        let wraps_rustls = cause
            .downcast_ref::<std::io::Error>()
            .and_then(std::io::Error::get_ref)
            .is_some_and(|inner| inner.downcast_ref::<rustls::Error>().is_some());
        if wraps_rustls {
            return true;
        }
        if cause.to_string().to_ascii_lowercase().contains("certificate") {
            return true;
        }
        current = cause.source();
    }
    false
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use std::fmt;
    use std::io;

    use rstest::rstest;

    #[rstest]
    #[case("https://127.0.0.1:8443", true)]
    #[case("https://localhost", true)]
    #[case("https://LOCALHOST:9000", true)]
    #[case("http://0.0.0.0:8080", true)]
    #[case("https://[::1]:8443", true)]
    #[case("https://club.example.com", false)]
    #[case("https://10.0.0.5", false)]
    fn skips_validation_for_local_hosts(#[case] raw: &str, #[case] expected: bool) {
        let url = Url::parse(raw).expect("valid url");
        assert_eq!(skip_certificate_validation(&url, false), expected, "{raw}");
    }

    #[rstest]
    fn override_disables_validation_everywhere() {
        let url = Url::parse("https://club.example.com").expect("valid url");
        assert!(skip_certificate_validation(&url, true));
    }

    #[derive(Debug)]
    struct Wrapper(io::Error);

    impl fmt::Display for Wrapper {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "error sending request")
        }
    }

    impl StdError for Wrapper {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    #[rstest]
    fn finds_rustls_errors_wrapped_in_io_errors() {
        let inner = io::Error::new(
            io::ErrorKind::InvalidData,
            rustls::Error::InvalidCertificate(rustls::CertificateError::UnknownIssuer),
        );
        assert!(is_certificate_error(&Wrapper(inner)));
    }

    #[rstest]
    fn falls_back_to_the_error_text() {
        let inner = io::Error::other("invalid peer certificate: Expired");
        assert!(is_certificate_error(&Wrapper(inner)));
    }

    #[rstest]
    fn ignores_plain_connection_failures() {
        let inner = io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused");
        assert!(!is_certificate_error(&Wrapper(inner)));
    }
}
