//! Tolerant timestamp decoding for upstream payloads
//!
//! Upstream feeds mix RFC3339 with and without seconds and with
//! nanosecond precision. Decoding accepts all of them, encoding always
//! emits RFC3339 with second precision.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Raised when no supported layout matches
#[derive(Debug, Clone, Error)]
#[error("cannot parse timestamp {input:?}: {reason}")]
pub struct TimestampError {
    /// Text as received from upstream
    pub input: String,
    /// Failure of the last layout tried
    pub reason: String,
}

type LayoutParser = fn(&str) -> Result<DateTime<Utc>, chrono::ParseError>;

fn parse_rfc3339(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|value| value.with_timezone(&Utc))
}

fn parse_minutes_offset(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M%:z").map(|value| value.with_timezone(&Utc))
}

fn parse_minutes_utc(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%MZ").map(|value| value.and_utc())
}

fn parse_seconds_utc(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%SZ").map(|value| value.and_utc())
}

fn parse_nanoseconds(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%:z").map(|value| value.with_timezone(&Utc))
}

/// Layouts in preference order
const LAYOUTS: &[(&str, LayoutParser)] = &[
    ("rfc3339", parse_rfc3339),
    ("rfc3339 without seconds", parse_minutes_offset),
    ("rfc3339 without seconds, utc", parse_minutes_utc),
    ("rfc3339 utc", parse_seconds_utc),
    ("rfc3339 nanoseconds", parse_nanoseconds),
];

/// Decode an upstream timestamp
///
/// Empty input and the literal `null` mean "no value".
pub fn decode(raw: &str) -> Result<Option<DateTime<Utc>>, TimestampError> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "null" {
        return Ok(None);
    }

    let mut last_failure = None;
    for (name, parse) in LAYOUTS {
        match parse(raw) {
            Ok(value) => return Ok(Some(value)),
            Err(error) => last_failure = Some(format!("{name}: {error}")),
        }
    }

    Err(TimestampError {
        input: raw.to_string(),
        reason: last_failure.unwrap_or_else(|| "no layout matched".to_string()),
    })
}

/// Canonical RFC3339 with seconds, `None` for an absent value
pub fn encode(value: Option<&DateTime<Utc>>) -> Option<String> {
    value.map(|value| value.to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// Optional instant with tolerant (de)serialization
///
/// Serializes to `null` when absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FlexibleTimestamp(pub Option<DateTime<Utc>>);

impl FlexibleTimestamp {
    pub fn value(&self) -> Option<DateTime<Utc>> {
        self.0
    }

    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }

    pub fn parse(raw: &str) -> Result<Self, TimestampError> {
        decode(raw).map(Self)
    }
}

impl From<DateTime<Utc>> for FlexibleTimestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self(Some(value))
    }
}

impl From<FlexibleTimestamp> for Option<DateTime<Utc>> {
    fn from(value: FlexibleTimestamp) -> Self {
        value.0
    }
}

impl fmt::Display for FlexibleTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match encode(self.0.as_ref()) {
            Some(text) => f.write_str(&text),
            None => f.write_str("null"),
        }
    }
}

impl Serialize for FlexibleTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match encode(self.0.as_ref()) {
            Some(text) => serializer.serialize_str(&text),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for FlexibleTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw {
            None => Ok(Self(None)),
            Some(raw) => Self::parse(&raw).map_err(serde::de::Error::custom),
        }
    }
}
