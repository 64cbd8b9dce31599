//! Timestamp decoding for record temporal fields.
//!
//! Record sources exchange `start`/`end` either as ISO text or as serialized
//! epoch milliseconds. The offset carried by the text is preserved because the
//! time-of-day filter compares against the event's local clock.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::Deref;

use crate::error::ParseError;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// A timestamp that deserializes from any of the encodings record sources use.
///
/// Accepts:
/// - RFC 3339 with offset: `2024-03-05T10:00:00-05:00`
/// - ISO 8601 without offset (assumes UTC): `2024-03-05T10:00:00`
/// - Space separated (assumes UTC): `2024-03-05 10:00:00`
/// - Epoch milliseconds, as a JSON number or a digit string
///
/// Serializes as RFC 3339 with the original offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FlexibleTimestamp(pub DateTime<FixedOffset>);

impl FlexibleTimestamp {
    /// Returns the inner timestamp.
    pub fn into_inner(self) -> DateTime<FixedOffset> {
        self.0
    }
}

impl Deref for FlexibleTimestamp {
    type Target = DateTime<FixedOffset>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<DateTime<FixedOffset>> for FlexibleTimestamp {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Self(dt)
    }
}

impl From<DateTime<Utc>> for FlexibleTimestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt.fixed_offset())
    }
}

impl fmt::Display for FlexibleTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl Serialize for FlexibleTimestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_rfc3339())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    FractionalMillis(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for FlexibleTimestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let parsed = match RawTimestamp::deserialize(deserializer)? {
            RawTimestamp::Millis(ms) => from_epoch_millis(ms),
            RawTimestamp::FractionalMillis(ms) => from_epoch_millis(ms as i64),
            RawTimestamp::Text(s) => parse_timestamp(&s),
        };
        parsed.map(FlexibleTimestamp).map_err(de::Error::custom)
    }
}

/// Parse a timestamp string in any accepted encoding.
pub fn parse_timestamp(s: &str) -> Result<DateTime<FixedOffset>, ParseError> {
    let s = s.trim();

    if s.is_empty() {
        return Err(ParseError::Timestamp(s.to_string()));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt);
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(naive.and_utc().fixed_offset());
        }
    }

    if s.chars().all(|c| c.is_ascii_digit()) {
        let ms = s
            .parse::<i64>()
            .map_err(|_| ParseError::Timestamp(s.to_string()))?;
        return from_epoch_millis(ms);
    }

    Err(ParseError::Timestamp(s.to_string()))
}

fn from_epoch_millis(ms: i64) -> Result<DateTime<FixedOffset>, ParseError> {
    DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.fixed_offset())
        .ok_or_else(|| ParseError::Timestamp(ms.to_string()))
}
