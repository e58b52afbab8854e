//! Regression coverage for the reservation client.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use rstest::{fixture, rstest};
use serde_json::json;

use super::*;
use crate::domain::ports::{MockReservationGateway, TokenGrant};
use crate::test_support::{MutableClock, RecordingSleeper};

fn grant(token: &str) -> TokenGrant {
    TokenGrant {
        token: Some(token.to_owned()),
        refresh_token: Some(format!("{token}-refresh")),
    }
}

fn host(number: i64, id: i64) -> HostRecord {
    HostRecord {
        number: Some(number),
        id: Some(id),
        name: None,
    }
}

fn station(raw: u32) -> StationNumber {
    StationNumber::new(raw).expect("valid station")
}

struct Harness {
    client: ReservationClient,
    sleeper: Arc<RecordingSleeper>,
}

impl Harness {
    fn recorded_sleeps(&self) -> Vec<Duration> {
        self.sleeper.0.lock().expect("sleeper mutex").clone()
    }
}

#[fixture]
fn clock() -> Arc<MutableClock> {
    Arc::new(MutableClock::new(
        Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0)
            .single()
            .expect("valid timestamp"),
    ))
}

fn harness(gateway: MockReservationGateway, clock: Arc<MutableClock>) -> Harness {
    let sleeper = Arc::new(RecordingSleeper::default());
    let client = ReservationClient::with_sleeper(
        Arc::new(gateway),
        clock,
        sleeper.clone(),
        ApiCredentials::new("operator", "secret"),
        RetryPolicy::default(),
    );
    Harness { client, sleeper }
}

/// Gateway whose token endpoint fails `failures` times with `error` before
/// succeeding.
fn flaky_token_gateway(failures: u32, error: ReservationGatewayError) -> MockReservationGateway {
    let calls = AtomicU32::new(0);
    let mut gateway = MockReservationGateway::new();
    gateway.expect_request_token().returning(move |_| {
        if calls.fetch_add(1, Ordering::SeqCst) < failures {
            Err(error.clone())
        } else {
            Ok(grant("token"))
        }
    });
    gateway
}

#[rstest]
#[case(0, vec![])]
#[case(1, vec![5])]
#[case(3, vec![5, 10, 20])]
#[case(4, vec![5, 10, 20, 40])]
#[tokio::test]
async fn authenticate_retries_gateway_timeouts_with_doubling_backoff(
    clock: Arc<MutableClock>,
    #[case] failures: u32,
    #[case] expected_sleeps: Vec<u64>,
) {
    let gateway = flaky_token_gateway(
        failures,
        ReservationGatewayError::server_unavailable(504_u16, "gateway timeout"),
    );
    let harness = harness(gateway, clock);
    let mut session = SessionState::default();

    harness
        .client
        .authenticate(&mut session, 5)
        .await
        .expect("authentication should eventually succeed");

    assert_eq!(session.phase(), AuthPhase::Authenticated);
    assert_eq!(session.access_token(), Some("token"));
    assert_eq!(session.refresh_token(), Some("token-refresh"));
    assert_eq!(
        harness.recorded_sleeps(),
        expected_sleeps
            .into_iter()
            .map(Duration::from_secs)
            .collect::<Vec<_>>()
    );
}

#[rstest]
#[tokio::test]
async fn authenticate_gives_up_without_sleeping_after_the_last_attempt(
    clock: Arc<MutableClock>,
) {
    let gateway = flaky_token_gateway(
        u32::MAX,
        ReservationGatewayError::server_unavailable(503_u16, "maintenance"),
    );
    let harness = harness(gateway, clock);
    let mut session = SessionState::default();

    let err = harness
        .client
        .authenticate(&mut session, 5)
        .await
        .expect_err("retries should be exhausted");

    assert!(matches!(
        err,
        ReservationError::AuthenticationFailed { attempts: 5, .. }
    ));
    assert_eq!(session.phase(), AuthPhase::Unauthenticated);
    assert_eq!(
        harness.recorded_sleeps().len(),
        4,
        "no sleep follows the final attempt"
    );
}

#[rstest]
#[case(ReservationGatewayError::tls("certificate verify failed"))]
#[case(ReservationGatewayError::rejected(401_u16, "invalid credentials"))]
#[tokio::test]
async fn authenticate_does_not_retry_permanent_failures(
    clock: Arc<MutableClock>,
    #[case] failure: ReservationGatewayError,
) {
    let mut gateway = MockReservationGateway::new();
    let returned = failure.clone();
    gateway
        .expect_request_token()
        .times(1)
        .returning(move |_| Err(returned.clone()));
    let harness = harness(gateway, clock);
    let mut session = SessionState::default();

    let err = harness
        .client
        .authenticate(&mut session, 5)
        .await
        .expect_err("permanent failure");

    assert_eq!(
        err,
        ReservationError::AuthenticationFailed {
            attempts: 1,
            source: failure,
        }
    );
    assert!(harness.recorded_sleeps().is_empty());
}

#[rstest]
#[case(None)]
#[case(Some(String::new()))]
#[tokio::test]
async fn authenticate_rejects_a_response_without_token(
    clock: Arc<MutableClock>,
    #[case] token: Option<String>,
) {
    let mut gateway = MockReservationGateway::new();
    gateway.expect_request_token().times(1).returning(move |_| {
        Ok(TokenGrant {
            token: token.clone(),
            refresh_token: None,
        })
    });
    let harness = harness(gateway, clock);
    let mut session = SessionState::default();

    let err = harness
        .client
        .authenticate(&mut session, 5)
        .await
        .expect_err("missing token");

    assert_eq!(err, ReservationError::MissingToken);
    assert!(!session.is_authenticated());
}

#[rstest]
#[tokio::test]
async fn ensure_authenticated_reuses_an_existing_token(clock: Arc<MutableClock>) {
    let mut gateway = MockReservationGateway::new();
    gateway.expect_request_token().never();
    let harness = harness(gateway, clock);
    let mut session = SessionState::with_tokens("cached", None);

    let token = harness
        .client
        .ensure_authenticated(&mut session)
        .await
        .expect("cached token");

    assert_eq!(token.as_str(), "cached");
}

#[rstest]
#[case(3, 1003)]
#[case(9, 9)]
#[tokio::test]
async fn resolve_host_id_maps_known_stations_and_falls_back_otherwise(
    clock: Arc<MutableClock>,
    #[case] raw_station: u32,
    #[case] expected: i64,
) {
    let mut gateway = MockReservationGateway::new();
    gateway
        .expect_list_hosts()
        .withf(|token| token == "cached")
        .times(1)
        .returning(|_| Ok(vec![host(1, 1001), host(3, 1003)]));
    let harness = harness(gateway, clock);
    let mut session = SessionState::with_tokens("cached", None);

    let host_id = harness
        .client
        .resolve_host_id(&mut session, station(raw_station))
        .await;

    assert_eq!(host_id, HostId::new(expected));
}

#[rstest]
#[tokio::test]
async fn resolve_host_id_fetches_the_host_list_once(clock: Arc<MutableClock>) {
    let mut gateway = MockReservationGateway::new();
    gateway
        .expect_list_hosts()
        .times(1)
        .returning(|_| Ok(vec![host(2, 2002)]));
    let harness = harness(gateway, clock);
    let mut session = SessionState::with_tokens("cached", None);

    for _ in 0..3 {
        let host_id = harness.client.resolve_host_id(&mut session, station(2)).await;
        assert_eq!(host_id, HostId::new(2002));
    }
    assert_eq!(session.hosts().generation(), 1);
}

#[rstest]
#[tokio::test]
async fn resolve_host_id_refreshes_an_expired_cache(clock: Arc<MutableClock>) {
    let mut gateway = MockReservationGateway::new();
    gateway
        .expect_list_hosts()
        .times(2)
        .returning(|_| Ok(vec![host(2, 2002)]));
    let harness = harness(gateway, Arc::clone(&clock));
    let mut session = SessionState::new(CacheExpiry::After(Duration::from_secs(60)));
    session.complete("cached".to_owned(), None);

    harness.client.resolve_host_id(&mut session, station(2)).await;
    clock.advance(Duration::from_secs(30));
    harness.client.resolve_host_id(&mut session, station(2)).await;
    clock.advance(Duration::from_secs(31));
    harness.client.resolve_host_id(&mut session, station(2)).await;

    assert_eq!(session.hosts().generation(), 2);
}

#[rstest]
#[tokio::test]
async fn resolve_host_id_retries_the_host_list_after_a_failure(clock: Arc<MutableClock>) {
    let calls = AtomicU32::new(0);
    let mut gateway = MockReservationGateway::new();
    gateway.expect_list_hosts().times(2).returning(move |_| {
        if calls.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(ReservationGatewayError::rejected(500_u16, "boom"))
        } else {
            Ok(vec![host(4, 4004)])
        }
    });
    let harness = harness(gateway, clock);
    let mut session = SessionState::with_tokens("cached", None);

    let first = harness.client.resolve_host_id(&mut session, station(4)).await;
    let second = harness.client.resolve_host_id(&mut session, station(4)).await;

    assert_eq!(first, HostId::new(4), "failure falls back to the station");
    assert_eq!(second, HostId::new(4004));
}

#[rstest]
#[tokio::test]
async fn create_booking_shapes_the_payload(clock: Arc<MutableClock>) {
    let captured: Arc<Mutex<Option<ReservationPayload>>> = Arc::default();
    let sink = Arc::clone(&captured);
    let mut gateway = MockReservationGateway::new();
    gateway
        .expect_request_token()
        .times(1)
        .returning(|_| Ok(grant("fresh")));
    gateway
        .expect_list_hosts()
        .returning(|_| Ok(vec![host(5, 5005)]));
    gateway
        .expect_create_reservation()
        .times(1)
        .returning(move |token, payload| {
            assert_eq!(token, "fresh");
            *sink.lock().expect("payload mutex") = Some(payload.clone());
            Ok(RemoteReservation {
                id: Some(RemoteBookingId::new(77)),
                record: json!({"id": 77}),
            })
        });
    let harness = harness(gateway, clock);
    let mut session = SessionState::default();
    let request = ReservationRequest {
        user_id: UserId::new(42),
        station: station(5),
        date: "2025-01-15".to_owned(),
        time_from: "23:00".to_owned(),
        time_to: "01:00".to_owned(),
        contact_phone: "+10000000000".to_owned(),
        contact_email: "bad-email".to_owned(),
    };

    let reservation = harness
        .client
        .create_booking(&mut session, &request)
        .await
        .expect("reservation created");

    assert_eq!(reservation.id, Some(RemoteBookingId::new(77)));
    let payload = captured
        .lock()
        .expect("payload mutex")
        .clone()
        .expect("payload captured");
    assert_eq!(payload.start, "2025-01-15T23:00:00.000Z");
    assert_eq!(payload.duration_minutes, 120);
    assert_eq!(payload.contact_email, "");
    assert_eq!(payload.host_id, HostId::new(5005));
    assert_eq!(payload.user_id, UserId::new(42));
    assert!(payload.note.contains("PC 5"));
}

#[rstest]
#[tokio::test]
async fn create_booking_surfaces_gateway_failures_without_retrying(clock: Arc<MutableClock>) {
    let mut gateway = MockReservationGateway::new();
    gateway.expect_list_hosts().returning(|_| Ok(vec![]));
    gateway
        .expect_create_reservation()
        .times(1)
        .returning(|_, _| Err(ReservationGatewayError::timeout("read timed out")));
    let harness = harness(gateway, clock);
    let mut session = SessionState::with_tokens("cached", None);
    let slot = BookingSlot::parse(station(1), "2025-01-15", "10:00", "11:00").expect("slot");
    let request = ReservationRequest::for_slot(UserId::new(1), &slot, "", "");

    let err = harness
        .client
        .create_booking(&mut session, &request)
        .await
        .expect_err("timeout");

    assert!(err.is_outcome_unknown());
    assert!(harness.recorded_sleeps().is_empty());
}

#[rstest]
#[tokio::test]
async fn delete_booking_passes_the_remote_id(clock: Arc<MutableClock>) {
    let mut gateway = MockReservationGateway::new();
    gateway
        .expect_delete_reservation()
        .withf(|token, id| token == "cached" && *id == RemoteBookingId::new(31))
        .times(1)
        .returning(|_, _| Ok(()));
    let harness = harness(gateway, clock);
    let mut session = SessionState::with_tokens("cached", None);

    harness
        .client
        .delete_booking(&mut session, RemoteBookingId::new(31))
        .await
        .expect("deleted");
}

#[rstest]
#[case(ReservationGatewayError::transport("connection reset"), true)]
#[case(ReservationGatewayError::timeout("read timed out"), true)]
#[case(ReservationGatewayError::decode("truncated body"), true)]
#[case(ReservationGatewayError::connect("connection refused"), false)]
#[case(ReservationGatewayError::server_unavailable(503_u16, "busy"), false)]
#[case(ReservationGatewayError::rejected(409_u16, "taken"), false)]
#[case(ReservationGatewayError::tls("unknown issuer"), false)]
fn unknown_outcome_is_limited_to_lost_responses(
    #[case] error: ReservationGatewayError,
    #[case] expected: bool,
) {
    assert_eq!(
        ReservationError::Gateway(error.clone()).is_outcome_unknown(),
        expected,
        "{error}"
    );
}

#[rstest]
fn client_side_failures_are_definite() {
    assert!(!ReservationError::MissingToken.is_outcome_unknown());
    assert!(
        !ReservationError::AuthenticationFailed {
            attempts: 5,
            source: ReservationGatewayError::connect("refused"),
        }
        .is_outcome_unknown()
    );
}
