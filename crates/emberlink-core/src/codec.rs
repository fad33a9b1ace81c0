//! Wire codec for event records.
//!
//! One event is exchanged as a JSON object with string fields `beg` and `end`
//! in the fixed UTC format `YYYY-MM-DDTHH:mm:ssZ` and an optional integer
//! field `sid` (default 0). Field names and format are wire-stable; there is
//! no schema versioning.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{error::DecodeError, types::Event};

/// Fixed timestamp format: UTC, whole seconds, literal `Z` suffix.
pub const WIRE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Serialize, Deserialize)]
struct WireEvent {
    beg: String,
    end: String,
    #[serde(default)]
    sid: i64,
}

/// Decode one wire-encoded event record.
///
/// Fails when the payload is not valid JSON, when `beg` or `end` is missing,
/// or when either does not match [`WIRE_TIME_FORMAT`]. A missing `sid` is not
/// an error and defaults to 0.
pub fn decode_event(text: &str) -> Result<Event, DecodeError> {
    let wire: WireEvent =
        serde_json::from_str(text).map_err(|err| DecodeError::Malformed(err.to_string()))?;
    let begin = parse_wire_timestamp("beg", &wire.beg)?;
    let end = parse_wire_timestamp("end", &wire.end)?;
    Ok(Event::new(begin, end, wire.sid))
}

/// Encode one event into its canonical wire form.
///
/// Always emits all three fields; never fails for a validly-constructed
/// [`Event`]. Sub-second precision is truncated.
pub fn encode_event(event: &Event) -> String {
    let wire = WireEvent {
        beg: event.begin().format(WIRE_TIME_FORMAT).to_string(),
        end: event.end().format(WIRE_TIME_FORMAT).to_string(),
        sid: event.session_id(),
    };
    serde_json::to_string(&wire).expect("wire event serialization cannot fail")
}

/// Decode a batch of wire records, skipping entries that fail to decode.
///
/// A bad entry is logged and dropped; it never aborts sibling decodes. Use
/// [`decode_event`] directly when per-entry failures must be surfaced.
pub fn decode_events(raw: &[String]) -> Vec<Event> {
    raw.iter()
        .filter_map(|text| match decode_event(text) {
            Ok(event) => Some(event),
            Err(err) => {
                warn!(error = %err, "skipping undecodable event entry");
                None
            }
        })
        .collect()
}

/// Encode a batch of events into wire records.
pub fn encode_events(events: &[Event]) -> Vec<String> {
    events.iter().map(encode_event).collect()
}

fn parse_wire_timestamp(field: &'static str, value: &str) -> Result<DateTime<Utc>, DecodeError> {
    NaiveDateTime::parse_from_str(value, WIRE_TIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| DecodeError::Timestamp {
            field,
            value: value.to_owned(),
        })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s)
            .single()
            .expect("valid test timestamp")
    }

    #[test]
    fn round_trips_at_second_precision() {
        let event = Event::new(
            utc(2020, 1, 1, 0, 0, 0) + chrono::Duration::milliseconds(450),
            utc(2020, 1, 1, 0, 5, 0),
            42,
        );

        let decoded = decode_event(&encode_event(&event)).expect("round trip should decode");
        assert_eq!(decoded.begin(), utc(2020, 1, 1, 0, 0, 0));
        assert_eq!(decoded.end(), utc(2020, 1, 1, 0, 5, 0));
        assert_eq!(decoded.session_id(), 42);
    }

    #[test]
    fn emits_canonical_field_order() {
        let event = Event::new(utc(2020, 1, 1, 0, 0, 0), utc(2020, 1, 1, 0, 5, 0), 7);
        assert_eq!(
            encode_event(&event),
            r#"{"beg":"2020-01-01T00:00:00Z","end":"2020-01-01T00:05:00Z","sid":7}"#
        );
    }

    #[test]
    fn defaults_missing_session_id_to_zero() {
        let decoded =
            decode_event(r#"{"beg":"2020-01-01T00:00:00Z","end":"2020-01-01T00:05:00Z"}"#)
                .expect("record without sid should decode");
        assert_eq!(decoded.session_id(), 0);
    }

    #[test]
    fn rejects_malformed_json() {
        let err = decode_event("{not json").expect_err("malformed payload must fail");
        assert!(matches!(err, DecodeError::Malformed(_)));
    }

    #[test]
    fn rejects_missing_begin_field() {
        let err = decode_event(r#"{"end":"2020-01-01T00:05:00Z"}"#)
            .expect_err("record without beg must fail");
        assert!(matches!(err, DecodeError::Malformed(_)));
    }

    #[test]
    fn rejects_fractional_second_timestamps() {
        let err =
            decode_event(r#"{"beg":"2020-01-01T00:00:00.500Z","end":"2020-01-01T00:05:00Z"}"#)
                .expect_err("fractional seconds are not part of the wire format");
        assert_eq!(
            err,
            DecodeError::Timestamp {
                field: "beg",
                value: "2020-01-01T00:00:00.500Z".to_owned(),
            }
        );
    }

    #[test]
    fn batch_decode_skips_bad_entries() {
        let raw = vec![
            r#"{"beg":"2020-01-01T00:00:00Z","end":"2020-01-01T00:05:00Z","sid":1}"#.to_owned(),
            "garbage".to_owned(),
            r#"{"beg":"2020-01-02T00:00:00Z","end":"2020-01-02T00:03:00Z","sid":2}"#.to_owned(),
        ];

        let decoded = decode_events(&raw);
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].session_id(), 1);
        assert_eq!(decoded[1].session_id(), 2);
    }
}
