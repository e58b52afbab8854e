//! Wire DTOs for the reservation API.
//!
//! Responses are not consistently enveloped, so host and reservation bodies
//! are decoded as `serde_json::Value` and sniffed before mapping into port
//! types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::RemoteBookingId;
use crate::domain::ports::{HostRecord, RemoteReservation, ReservationPayload, TokenGrant};

#[derive(Debug, Deserialize)]
pub(super) struct TokenEnvelopeDto {
    #[serde(default)]
    result: Option<TokenResultDto>,
}

#[derive(Debug, Deserialize)]
struct TokenResultDto {
    #[serde(default)]
    token: Option<String>,
    #[serde(default, rename = "refreshToken")]
    refresh_token: Option<String>,
}

impl TokenEnvelopeDto {
    pub(super) fn into_grant(self) -> TokenGrant {
        match self.result {
            Some(result) => TokenGrant {
                token: result.token,
                refresh_token: result.refresh_token,
            },
            None => TokenGrant::default(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ReservationRequestDto<'a> {
    user_id: i64,
    date: &'a str,
    duration: u32,
    contact_phone: &'a str,
    contact_email: &'a str,
    note: &'a str,
    pin: &'static str,
    status: u8,
    hosts: [HostRefDto; 1],
    users: [UserRefDto; 1],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HostRefDto {
    host_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UserRefDto {
    user_id: i64,
}

impl<'a> From<&'a ReservationPayload> for ReservationRequestDto<'a> {
    fn from(payload: &'a ReservationPayload) -> Self {
        Self {
            user_id: payload.user_id.get(),
            date: payload.start.as_str(),
            duration: payload.duration_minutes,
            contact_phone: payload.contact_phone.as_str(),
            contact_email: payload.contact_email.as_str(),
            note: payload.note.as_str(),
            pin: "",
            status: 0,
            hosts: [HostRefDto {
                host_id: payload.host_id.get(),
            }],
            users: [UserRefDto {
                user_id: payload.user_id.get(),
            }],
        }
    }
}

/// Extract host records from `{result: {data: [...]}}`, `{data: [...]}`, or a
/// bare array. Any other shape yields an empty list.
pub(super) fn hosts_from_value(body: Value) -> Vec<HostRecord> {
    let entries = match body {
        Value::Array(entries) => entries,
        Value::Object(mut envelope) => match envelope.remove("result") {
            Some(Value::Object(mut result)) => take_array(&mut result, "data"),
            Some(_) => Vec::new(),
            None => take_array(&mut envelope, "data"),
        },
        _ => Vec::new(),
    };
    entries.iter().filter_map(host_from_value).collect()
}

fn take_array(object: &mut Map<String, Value>, key: &str) -> Vec<Value> {
    match object.remove(key) {
        Some(Value::Array(entries)) => entries,
        _ => Vec::new(),
    }
}

fn host_from_value(entry: &Value) -> Option<HostRecord> {
    let object = entry.as_object()?;
    Some(HostRecord {
        number: object.get("number").and_then(Value::as_i64),
        id: object.get("id").and_then(Value::as_i64),
        name: object.get("name").and_then(Value::as_str).map(str::to_owned),
    })
}

/// Unwrap the record returned after creating a reservation.
///
/// A `result` object is the record. A truthy scalar `result` becomes
/// `{"id": result}` and a falsy one an empty record. Bodies without `result`
/// are taken as-is.
pub(super) fn reservation_from_value(body: Value) -> RemoteReservation {
    let record = match body {
        Value::Object(mut envelope) if envelope.contains_key("result") => {
            match envelope.remove("result").unwrap_or(Value::Null) {
                record @ Value::Object(_) => record,
                scalar if is_truthy(&scalar) => {
                    Value::Object(Map::from_iter([("id".to_owned(), scalar)]))
                }
                _ => Value::Object(Map::new()),
            }
        }
        other => other,
    };
    RemoteReservation {
        id: record_id(&record),
        record,
    }
}

fn record_id(record: &Value) -> Option<RemoteBookingId> {
    match record.get("id")? {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
    .map(RemoteBookingId::new)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for wire decoding helpers.
    use super::*;
    use crate::domain::UserId;
    use crate::domain::ports::HostId;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn decodes_token_envelope() {
        let dto: TokenEnvelopeDto = serde_json::from_value(json!({
            "result": {"token": "abc", "refreshToken": "def", "expires": 3600}
        }))
        .expect("token envelope");
        let grant = dto.into_grant();
        assert_eq!(grant.token.as_deref(), Some("abc"));
        assert_eq!(grant.refresh_token.as_deref(), Some("def"));
    }

    #[rstest]
    fn token_envelope_without_result_has_no_token() {
        let dto: TokenEnvelopeDto =
            serde_json::from_value(json!({"message": "ok"})).expect("token envelope");
        assert_eq!(dto.into_grant(), TokenGrant::default());
    }

    #[rstest]
    #[case(json!({"result": {"data": [{"number": 1, "id": 11}]}}), 1)]
    #[case(json!({"data": [{"number": 1, "id": 11}, {"number": 2, "id": 12}]}), 2)]
    #[case(json!([{"number": 1, "id": 11}]), 1)]
    #[case(json!({"result": [{"number": 1, "id": 11}]}), 0)]
    #[case(json!({"unexpected": true}), 0)]
    #[case(json!("nope"), 0)]
    fn sniffs_host_envelopes(#[case] body: Value, #[case] expected: usize) {
        assert_eq!(hosts_from_value(body).len(), expected);
    }

    #[rstest]
    fn host_fields_must_be_numeric() {
        let hosts = hosts_from_value(json!([
            {"number": 3, "id": 33, "name": "PC-3"},
            {"number": "4", "id": 44},
            "garbage"
        ]));
        assert_eq!(hosts.len(), 2, "non-object entries are dropped");
        assert_eq!(hosts[0].name.as_deref(), Some("PC-3"));
        assert_eq!(hosts[1].number, None);
        assert_eq!(hosts[1].id, Some(44));
    }

    #[rstest]
    #[case(json!({"result": {"id": 15, "status": 0}}), Some(15), json!({"id": 15, "status": 0}))]
    #[case(json!({"result": 99}), Some(99), json!({"id": 99}))]
    #[case(json!({"result": "120"}), Some(120), json!({"id": "120"}))]
    #[case(json!({"result": 0}), None, json!({}))]
    #[case(json!({"result": null}), None, json!({}))]
    #[case(json!({"id": 7, "note": "x"}), Some(7), json!({"id": 7, "note": "x"}))]
    fn unwraps_created_reservations(
        #[case] body: Value,
        #[case] expected_id: Option<i64>,
        #[case] expected_record: Value,
    ) {
        let reservation = reservation_from_value(body);
        assert_eq!(reservation.id, expected_id.map(RemoteBookingId::new));
        assert_eq!(reservation.record, expected_record);
    }

    #[rstest]
    fn serialises_reservation_body() {
        let payload = ReservationPayload {
            user_id: UserId::new(42),
            start: "2025-01-15T14:00:00.000Z".to_owned(),
            duration_minutes: 180,
            contact_phone: "+10000000000".to_owned(),
            contact_email: String::new(),
            note: "Booked via chat bot (PC 4)".to_owned(),
            host_id: HostId::new(1004),
        };

        let body = serde_json::to_value(ReservationRequestDto::from(&payload)).expect("json");

        assert_eq!(
            body,
            json!({
                "userId": 42,
                "date": "2025-01-15T14:00:00.000Z",
                "duration": 180,
                "contactPhone": "+10000000000",
                "contactEmail": "",
                "note": "Booked via chat bot (PC 4)",
                "pin": "",
                "status": 0,
                "hosts": [{"hostId": 1004}],
                "users": [{"userId": 42}]
            })
        );
    }
}
