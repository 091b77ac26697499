//! Shared types passed between storage backends and the generator.
//!
//! Backends translate their native listing responses into [`ObjectInfo`] so the
//! manifest builder never sees SDK types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One object descriptor from a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// Full object key, including the listing prefix.
    pub key: String,
    /// Size in bytes.
    pub size: u64,
    #[serde(with = "iso_millis")]
    pub last_modified: DateTime<Utc>,
}

/// Result of a single listing call.
///
/// `truncated` is set when the backend had more keys than it returned. Only the
/// first page is ever requested.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub objects: Vec<ObjectInfo>,
    pub truncated: bool,
}

/// Serde adapter rendering timestamps as `2024-01-01T00:00:00.000Z`.
///
/// UTC, millisecond precision, `Z` suffix. Parsing accepts any RFC 3339 value
/// and normalizes it to UTC.
pub mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn format(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format(value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_with_millis_and_z() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(iso_millis::format(&t), "2024-01-01T00:00:00.000Z");
    }

    #[test]
    fn truncates_sub_millisecond_precision() {
        let t = Utc.timestamp_opt(1_704_067_200, 123_456_789).unwrap();
        assert_eq!(iso_millis::format(&t), "2024-01-01T00:00:00.123Z");
    }

    #[test]
    fn parses_offset_timestamps_into_utc() {
        let json = r#"{"key":"a.jpg","size":1,"last_modified":"2024-01-01T02:00:00+02:00"}"#;
        let info: ObjectInfo = serde_json::from_str(json).unwrap();
        assert_eq!(
            info.last_modified,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn rejects_malformed_timestamp() {
        let json = r#"{"key":"a.jpg","size":1,"last_modified":"yesterday"}"#;
        assert!(serde_json::from_str::<ObjectInfo>(json).is_err());
    }
}
