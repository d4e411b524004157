//! Normalization of `reviewedAt` to epoch seconds.
//!
//! Historical writers stored the review time in several shapes: a document
//! store timestamp object, its JSON serialization with underscore-prefixed
//! fields, plain epoch seconds, epoch milliseconds, and numeric strings of
//! either. [`normalize`] is the single mapping from all of them to the
//! integer that enters the canonical encoding and the record key. Both the
//! write path ([`SkillRecord::ledger_entry`](crate::SkillRecord::ledger_entry))
//! and the verifier call it.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// Integers at or above this value are epoch milliseconds.
///
/// `1e11` seconds is beyond the year 5000, while `1e11` milliseconds is
/// March 1973, so the two ranges cannot be confused for real review times.
pub const MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// A `reviewedAt` value exactly as found in a record document.
#[derive(Debug, Clone, PartialEq)]
pub enum RawTimestamp {
    /// `{ "seconds": s, "nanoseconds": n }`
    Timestamp { seconds: i64, nanoseconds: i64 },
    /// `{ "_seconds": s, "_nanoseconds": n }`
    Serialized { seconds: i64, nanoseconds: i64 },
    /// A JSON integer.
    Integer(i64),
    /// A JSON number with a fractional part or outside the `i64` range.
    Float(f64),
    /// A JSON string, expected to hold a number.
    Text(String),
    /// Anything else.
    Other(Value),
}

impl RawTimestamp {
    /// Classify a JSON value. `null` is not a timestamp; callers map it to `None`.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Number(n) => match n.as_i64() {
                Some(i) => RawTimestamp::Integer(i),
                None => RawTimestamp::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => RawTimestamp::Text(s.clone()),
            Value::Object(map) => {
                if let Some(seconds) = map.get("seconds") {
                    match seconds_field(seconds) {
                        Some(seconds) => RawTimestamp::Timestamp {
                            seconds,
                            nanoseconds: nanos(map, "nanoseconds"),
                        },
                        None => RawTimestamp::Other(value.clone()),
                    }
                } else if let Some(seconds) = map.get("_seconds") {
                    match seconds_field(seconds) {
                        Some(seconds) => RawTimestamp::Serialized {
                            seconds,
                            nanoseconds: nanos(map, "_nanoseconds"),
                        },
                        None => RawTimestamp::Other(value.clone()),
                    }
                } else {
                    RawTimestamp::Other(value.clone())
                }
            }
            other => RawTimestamp::Other(other.clone()),
        }
    }

    /// The JSON form this value was read from.
    pub fn to_value(&self) -> Value {
        match self {
            RawTimestamp::Timestamp {
                seconds,
                nanoseconds,
            } => serde_json::json!({ "seconds": seconds, "nanoseconds": nanoseconds }),
            RawTimestamp::Serialized {
                seconds,
                nanoseconds,
            } => serde_json::json!({ "_seconds": seconds, "_nanoseconds": nanoseconds }),
            RawTimestamp::Integer(i) => Value::from(*i),
            RawTimestamp::Float(f) => Value::from(*f),
            RawTimestamp::Text(s) => Value::String(s.clone()),
            RawTimestamp::Other(v) => v.clone(),
        }
    }
}

/// Whole seconds from a timestamp object's seconds field.
///
/// Accepts the same numeric shapes as a bare value (integers, floats,
/// numeric strings), floored. The unit is always seconds.
fn seconds_field(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(floor_seconds)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(floor_seconds))
        }
        _ => None,
    }
}

fn floor_seconds(v: f64) -> Option<i64> {
    // `as` saturates out-of-range values.
    v.is_finite().then(|| v.floor() as i64)
}

fn nanos(map: &Map<String, Value>, field: &str) -> i64 {
    map.get(field).and_then(Value::as_i64).unwrap_or(0)
}

impl From<i64> for RawTimestamp {
    fn from(seconds_or_millis: i64) -> Self {
        RawTimestamp::Integer(seconds_or_millis)
    }
}

impl From<&str> for RawTimestamp {
    fn from(s: &str) -> Self {
        RawTimestamp::Text(s.to_string())
    }
}

impl Serialize for RawTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RawTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(RawTimestamp::from_value(&value))
    }
}

/// Which historical form a timestamp was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampSource {
    /// `seconds` field of a timestamp object.
    Timestamp,
    /// `_seconds` field of a serialized timestamp object.
    SerializedTimestamp,
    /// Number (or numeric string) already in seconds.
    EpochSeconds,
    /// Number (or numeric string) in milliseconds, divided down.
    EpochMillis,
    /// Field absent or `null`.
    Missing,
    /// Present but not interpretable as a time.
    Unparseable,
    /// Interpretable, but zero or negative.
    ZeroOrNegative,
}

impl TimestampSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimestampSource::Timestamp => "timestamp",
            TimestampSource::SerializedTimestamp => "serialized_timestamp",
            TimestampSource::EpochSeconds => "epoch_seconds",
            TimestampSource::EpochMillis => "epoch_millis",
            TimestampSource::Missing => "missing",
            TimestampSource::Unparseable => "unparseable",
            TimestampSource::ZeroOrNegative => "zero_or_negative",
        }
    }

    /// True when normalization fell back to `0`.
    pub fn is_degenerate(&self) -> bool {
        matches!(
            self,
            TimestampSource::Missing | TimestampSource::Unparseable | TimestampSource::ZeroOrNegative
        )
    }
}

impl fmt::Display for TimestampSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved `reviewedAt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NormalizedTimestamp {
    pub seconds: u64,
    pub source: TimestampSource,
}

impl NormalizedTimestamp {
    const fn new(seconds: u64, source: TimestampSource) -> Self {
        Self { seconds, source }
    }

    const fn degenerate(source: TimestampSource) -> Self {
        Self { seconds: 0, source }
    }

    pub fn is_degenerate(&self) -> bool {
        self.source.is_degenerate()
    }
}

/// Resolve a raw `reviewedAt` to epoch seconds.
///
/// Never fails: unusable input resolves to `0` with a degenerate
/// [`TimestampSource`] that callers must surface.
pub fn normalize(raw: Option<&RawTimestamp>) -> NormalizedTimestamp {
    let Some(raw) = raw else {
        return NormalizedTimestamp::degenerate(TimestampSource::Missing);
    };

    match raw {
        RawTimestamp::Timestamp { seconds, .. } => from_seconds_field(*seconds, TimestampSource::Timestamp),
        RawTimestamp::Serialized { seconds, .. } => {
            from_seconds_field(*seconds, TimestampSource::SerializedTimestamp)
        }
        RawTimestamp::Integer(v) => from_integer(*v),
        RawTimestamp::Float(v) => from_float(*v),
        RawTimestamp::Text(s) => from_text(s),
        RawTimestamp::Other(_) => NormalizedTimestamp::degenerate(TimestampSource::Unparseable),
    }
}

/// Resolve a `reviewedAt` JSON value; `null` counts as missing.
pub fn normalize_value(value: &Value) -> NormalizedTimestamp {
    if value.is_null() {
        return normalize(None);
    }
    normalize(Some(&RawTimestamp::from_value(value)))
}

fn from_seconds_field(seconds: i64, source: TimestampSource) -> NormalizedTimestamp {
    if seconds > 0 {
        NormalizedTimestamp::new(seconds as u64, source)
    } else {
        NormalizedTimestamp::degenerate(TimestampSource::ZeroOrNegative)
    }
}

fn from_integer(v: i64) -> NormalizedTimestamp {
    if v >= MILLIS_THRESHOLD {
        NormalizedTimestamp::new((v / 1000) as u64, TimestampSource::EpochMillis)
    } else if v > 0 {
        NormalizedTimestamp::new(v as u64, TimestampSource::EpochSeconds)
    } else {
        NormalizedTimestamp::degenerate(TimestampSource::ZeroOrNegative)
    }
}

fn from_float(v: f64) -> NormalizedTimestamp {
    if !v.is_finite() {
        return NormalizedTimestamp::degenerate(TimestampSource::Unparseable);
    }
    if v >= MILLIS_THRESHOLD as f64 {
        // Saturates at u64::MAX for absurd inputs.
        return NormalizedTimestamp::new((v / 1000.0).floor() as u64, TimestampSource::EpochMillis);
    }
    let seconds = v.floor();
    if seconds >= 1.0 {
        NormalizedTimestamp::new(seconds as u64, TimestampSource::EpochSeconds)
    } else {
        NormalizedTimestamp::degenerate(TimestampSource::ZeroOrNegative)
    }
}

fn from_text(s: &str) -> NormalizedTimestamp {
    let s = s.trim();
    if let Ok(i) = s.parse::<i64>() {
        return from_integer(i);
    }
    match s.parse::<f64>() {
        Ok(f) if f.is_finite() => from_float(f),
        _ => NormalizedTimestamp::degenerate(TimestampSource::Unparseable),
    }
}
