//! Timestamp parsing and formatting
//!
//! Abstracted data carries naive local timestamps. Several textual layouts are accepted
//! on input; output always uses [`TIMESTAMP_FORMAT`].

use crate::provider::{SourceError, SourceResult};
use chrono::{NaiveDate, NaiveDateTime};

/// Canonical timestamp layout used for output
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse a timestamp. A bare date is interpreted as midnight.
pub fn parse_timestamp(input: &str) -> SourceResult<NaiveDateTime> {
    let trimmed = input.trim();

    for format in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(ts);
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| SourceError::InvalidTimestamp(input.to_string()))
}

/// Format a timestamp using [`TIMESTAMP_FORMAT`]
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Serde adapter for `NaiveDateTime` fields using the accepted layouts
pub mod serde_timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_timestamp(ts))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("2024-03-01 08:30:00", 8, 30)]
    #[case("2024-03-01T08:30:00", 8, 30)]
    #[case("2024-03-01T08:30:00.250", 8, 30)]
    #[case("2024-03-01 08:30", 8, 30)]
    #[case("2024-03-01", 0, 0)]
    #[case("  2024-03-01 08:30:00 ", 8, 30)]
    fn test_parse_accepted_layouts(#[case] input: &str, #[case] hour: u32, #[case] minute: u32) {
        use chrono::Timelike;

        let ts = parse_timestamp(input).unwrap();
        assert_eq!(ts.date(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(ts.hour(), hour);
        assert_eq!(ts.minute(), minute);
    }

    #[rstest]
    #[case("")]
    #[case("yesterday")]
    #[case("2024-13-01")]
    #[case("01/03/2024")]
    fn test_parse_rejects_garbage(#[case] input: &str) {
        assert!(matches!(
            parse_timestamp(input),
            Err(SourceError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_format_is_canonical() {
        let ts = parse_timestamp("2024-03-01T08:30:05.999").unwrap();
        assert_eq!(format_timestamp(&ts), "2024-03-01 08:30:05");
    }
}
