//! Lenient timestamp (de)serialization
//!
//! Timestamps are written as RFC 3339 in UTC. On read, offset-less values such
//! as `2024-03-01T09:15:00.1234567` (what earlier versions of the application
//! stored) are accepted and interpreted in the local time zone. A `null` or
//! unparseable value never fails the surrounding document: it falls back to
//! the current time, or to no time for optional fields, and is logged.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Parse an RFC 3339 timestamp, or a naive local one
pub fn parse(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()?;
    Some(
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map_or_else(|| naive.and_utc(), |local| local.with_timezone(&Utc)),
    )
}

/// Serde adapter for `DateTime<Utc>` fields
pub mod lenient {
    use super::{DateTime, Deserialize, Deserializer, Serializer, Utc};

    /// Serialize as RFC 3339
    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    /// Deserialize RFC 3339 or naive local timestamps, `null` as now
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let parsed = Option::<String>::deserialize(deserializer)?.and_then(|text| {
            let parsed = super::parse(&text);
            if parsed.is_none() {
                tracing::warn!("Ignoring invalid timestamp {:?}", text);
            }
            parsed
        });
        Ok(parsed.unwrap_or_else(Utc::now))
    }
}

/// Serde adapter for `Option<DateTime<Utc>>` fields
pub mod lenient_option {
    use super::{DateTime, Deserialize, Deserializer, Serializer, Utc};

    /// Serialize as RFC 3339 or `null`
    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => serializer.serialize_some(&ts.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize `null`, RFC 3339, or naive local timestamps; invalid text
    /// reads as `None`
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Ok(Option::<String>::deserialize(deserializer)?.and_then(|text| {
            let parsed = super::parse(&text);
            if parsed.is_none() {
                tracing::warn!("Ignoring invalid timestamp {:?}", text);
            }
            parsed
        }))
    }
}
