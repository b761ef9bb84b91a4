// Naive local timestamps: wire format, bucket keys, and epoch-millis storage encoding.

use chrono::{DateTime, NaiveDateTime, Timelike};

/// `YYYY-MM-DDTHH:mm:ss.SSS`, used wherever a timestamp crosses a serialization boundary.
pub const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";
/// Accepts the wire format and second-precision ISO date-times (`2024-05-01T00:00:00`).
const PARSE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

pub const HOUR_KEY_FORMAT: &str = "%Y-%m-%dT%H:00";
pub const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

pub fn format_wire(t: &NaiveDateTime) -> String {
    t.format(WIRE_FORMAT).to_string()
}

pub fn parse_wire(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s, PARSE_FORMAT)
}

/// Drop sub-millisecond precision so a timestamp survives a storage round-trip unchanged.
pub fn truncate_to_millis(t: NaiveDateTime) -> NaiveDateTime {
    let nanos = t.nanosecond() / 1_000_000 * 1_000_000;
    t.with_nanosecond(nanos).unwrap_or(t)
}

/// Storage encoding: the naive wall-clock reading as if it were UTC, in milliseconds.
/// Preserves ordering, which is all range scans need.
pub fn to_epoch_millis(t: &NaiveDateTime) -> i64 {
    t.and_utc().timestamp_millis()
}

pub fn from_epoch_millis(ms: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(ms).map(|d| d.naive_utc())
}

/// Current wall-clock time as naive local time.
pub fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// serde adapter for `#[serde(with = "...")]` on `NaiveDateTime` fields.
pub mod wire {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_wire(t))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_wire(&raw).map_err(serde::de::Error::custom)
    }
}
