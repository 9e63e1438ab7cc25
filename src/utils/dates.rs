//! Date and time utilities
//!
//! Timestamps are stored as unix seconds and rendered as RFC 3339 in JSON.

use chrono::{DateTime, SecondsFormat, Utc};

/// Current unix timestamp in seconds
pub fn now_ts() -> i64 {
    Utc::now().timestamp()
}

/// Render a timestamp as RFC 3339 (e.g. "2025-07-02T05:27:26Z")
pub fn to_rfc3339(timestamp: i64) -> String {
    let dt = DateTime::from_timestamp(timestamp, 0).unwrap_or_else(Utc::now);
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Optional variant for nullable columns
pub fn opt_rfc3339(timestamp: Option<i64>) -> Option<String> {
    timestamp.map(to_rfc3339)
}

/// Convert timestamp to relative time string (e.g., "2 hours ago")
pub fn timestamp_to_relative(timestamp: i64) -> String {
    let dt = DateTime::from_timestamp(timestamp, 0).unwrap_or_else(Utc::now);
    chrono_humanize::HumanTime::from(dt).to_string()
}

/// True when `timestamp` is missing or strictly older than `hours` before `now`
pub fn is_older_than_hours(timestamp: Option<i64>, hours: i64, now: i64) -> bool {
    match timestamp {
        None => true,
        Some(ts) => ts < now - hours * 3600,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc3339() {
        assert_eq!(to_rfc3339(0), "1970-01-01T00:00:00Z");
        assert_eq!(opt_rfc3339(None), None);
    }

    #[test]
    fn test_older_than_hours() {
        let now = 1_750_000_000;
        assert!(is_older_than_hours(None, 1, now));
        assert!(is_older_than_hours(Some(now - 3601), 1, now));
        assert!(!is_older_than_hours(Some(now - 3600), 1, now));
        assert!(!is_older_than_hours(Some(now), 1, now));
    }

    #[test]
    fn test_relative() {
        let s = timestamp_to_relative(now_ts() - 2 * 3600);
        assert!(s.contains("hours"), "{}", s);
    }
}
