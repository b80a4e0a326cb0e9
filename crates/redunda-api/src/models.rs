// Wire types for the Redunda endpoints.
//
// Only the fields the library consumes are modelled; serde ignores the
// rest of each payload.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Form body of a liveness report (`POST /status.json`).
#[derive(Debug, Clone, Serialize)]
pub(crate) struct StatusPing<'a> {
    pub key: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<&'a str>,
}

/// Response to a liveness report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct StatusReport {
    /// `true` if this instance should stand by.
    pub should_standby: bool,
}

/// One entry of the remote file listing (`GET /bots/data.json`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RemoteFile {
    /// Encoded file name, as stored by the service.
    pub key: String,
    /// The service's last-write time for this file.
    #[serde(
        deserialize_with = "deserialize_timestamp",
        serialize_with = "chrono::serde::ts_seconds::serialize"
    )]
    pub updated_at: DateTime<Utc>,
}

/// Epoch seconds, or an ISO-8601 string from older server versions.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Seconds(i64),
    Text(String),
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as _;

    match RawTimestamp::deserialize(deserializer)? {
        RawTimestamp::Seconds(secs) => Utc
            .timestamp_opt(secs, 0)
            .single()
            .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {secs}"))),
        RawTimestamp::Text(text) => parse_timestamp_text(&text).map_err(D::Error::custom),
    }
}

fn parse_timestamp_text(text: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    // Offset-less timestamps are taken as UTC.
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("invalid timestamp {text:?}: {e}"))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn remote_file_accepts_epoch_seconds() {
        let file: RemoteFile =
            serde_json::from_str(r#"{"key":"data_slash_a.json","updated_at":1700000000}"#)
                .unwrap();
        assert_eq!(file.key, "data_slash_a.json");
        assert_eq!(file.updated_at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn remote_file_accepts_iso_strings() {
        let with_offset: RemoteFile =
            serde_json::from_str(r#"{"key":"a","updated_at":"2023-11-14T22:13:20Z"}"#).unwrap();
        let naive: RemoteFile =
            serde_json::from_str(r#"{"key":"a","updated_at":"2023-11-14T22:13:20.000"}"#)
                .unwrap();
        assert_eq!(with_offset.updated_at.timestamp(), 1_700_000_000);
        assert_eq!(naive.updated_at, with_offset.updated_at);
    }

    #[test]
    fn remote_file_rejects_garbage_timestamp() {
        let result = serde_json::from_str::<RemoteFile>(r#"{"key":"a","updated_at":"yesterday"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn status_report_ignores_extra_fields() {
        let report: StatusReport =
            serde_json::from_str(r#"{"should_standby":false,"location":"eu-1"}"#).unwrap();
        assert!(!report.should_standby);
    }

    #[test]
    fn status_report_requires_the_directive() {
        assert!(serde_json::from_str::<StatusReport>(r#"{"location":"eu-1"}"#).is_err());
    }
}
