//! Opaque keyset-pagination cursor.
//!
//! Decoded form is `"<RFC3339 timestamp>~<tiebreaker>"`. A timestamp alone is
//! not a valid keyset cursor when many rows share it at second/microsecond
//! granularity, so the page boundary carries a secondary tiebreaker (the
//! contact email for contact listing). Callers must treat the encoded string
//! as opaque; the format is a wire contract and changing it is breaking.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};

use crate::StoreError;

/// A "resume strictly after this (timestamp, tiebreaker) pair" token.
///
/// Derived from the last row of a page; never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cursor {
    pub timestamp: DateTime<Utc>,
    pub tiebreaker: String,
}

impl Cursor {
    pub fn new(timestamp: DateTime<Utc>, tiebreaker: impl Into<String>) -> Self {
        Self {
            timestamp,
            tiebreaker: tiebreaker.into(),
        }
    }

    pub fn encode(&self) -> String {
        let raw = format!(
            "{}~{}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            self.tiebreaker
        );
        BASE64.encode(raw.as_bytes())
    }

    pub fn decode(cursor: &str) -> Result<Self, StoreError> {
        let raw = BASE64
            .decode(cursor.as_bytes())
            .map_err(|e| StoreError::InvalidCursor(format!("invalid base64: {e}")))?;
        let raw = String::from_utf8(raw)
            .map_err(|_| StoreError::InvalidCursor("cursor is not valid UTF-8".into()))?;

        let (ts, tiebreaker) = raw
            .split_once('~')
            .ok_or_else(|| StoreError::InvalidCursor("missing '~' separator".into()))?;

        let timestamp = DateTime::parse_from_rfc3339(ts)
            .map_err(|e| StoreError::InvalidCursor(format!("invalid timestamp {ts:?}: {e}")))?
            .with_timezone(&Utc);

        Ok(Self {
            timestamp,
            tiebreaker: tiebreaker.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn round_trip() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap();
        let cursor = Cursor::new(ts, "ada@example.com");
        let decoded = Cursor::decode(&cursor.encode()).unwrap();
        assert_eq!(decoded, cursor);
    }

    #[test]
    fn round_trip_preserves_subsecond_precision() {
        let ts = Utc
            .timestamp_opt(1_741_944_413, 123_456_789)
            .single()
            .unwrap();
        let cursor = Cursor::new(ts, "grace@example.com");
        let decoded = Cursor::decode(&cursor.encode()).unwrap();
        assert_eq!(decoded.timestamp, ts);
    }

    #[test]
    fn round_trip_with_tilde_in_tiebreaker() {
        // split_once keeps everything after the first separator intact.
        let ts = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let cursor = Cursor::new(ts, "odd~address@example.com");
        assert_eq!(Cursor::decode(&cursor.encode()).unwrap(), cursor);
    }

    #[test]
    fn rejects_invalid_base64() {
        let err = Cursor::decode("not base64!!").unwrap_err();
        assert!(matches!(err, StoreError::InvalidCursor(_)));
    }

    #[test]
    fn rejects_missing_separator() {
        let encoded = BASE64.encode(b"2025-01-01T00:00:00Z");
        let err = Cursor::decode(&encoded).unwrap_err();
        assert!(matches!(err, StoreError::InvalidCursor(_)));
    }

    #[test]
    fn rejects_invalid_timestamp() {
        let encoded = BASE64.encode(b"yesterday~a@example.com");
        let err = Cursor::decode(&encoded).unwrap_err();
        assert!(matches!(err, StoreError::InvalidCursor(_)));
    }

    #[test]
    fn rejects_non_utf8_payload() {
        let encoded = BASE64.encode([0xff, 0xfe, 0x7e, 0x61]);
        let err = Cursor::decode(&encoded).unwrap_err();
        assert!(matches!(err, StoreError::InvalidCursor(_)));
    }
}
