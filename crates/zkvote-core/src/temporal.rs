//! # Temporal Types — UTC-Only Timestamps
//!
//! `Timestamp` is a UTC instant truncated to seconds precision. Session
//! transitions, closing snapshots, and report file names all use it so
//! that every rendered time in the system has the same shape.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A UTC-only timestamp, truncated to seconds precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// Parse an RFC 3339 string with a `Z` suffix.
    ///
    /// # Errors
    ///
    /// Rejects strings with explicit offsets (even `+00:00`) and anything
    /// that is not valid RFC 3339.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        if !s.ends_with('Z') {
            return Err(ValidationError::Timestamp(format!(
                "must use Z suffix (UTC only), got {s:?}"
            )));
        }
        let dt = DateTime::parse_from_rfc3339(s)
            .map_err(|e| ValidationError::Timestamp(format!("{s:?}: {e}")))?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// `YYYY-MM-DDTHH:MM:SSZ`.
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }

    /// `YYYY-MM-DDTHH-MM-SS`, safe for use in file names on every platform.
    pub fn to_file_stamp(&self) -> String {
        self.0.format("%Y-%m-%dT%H-%M-%S").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_render() {
        let ts = Timestamp::parse("2026-03-01T09:15:30Z").unwrap();
        assert_eq!(ts.to_iso8601(), "2026-03-01T09:15:30Z");
        assert_eq!(ts.to_file_stamp(), "2026-03-01T09-15-30");
    }

    #[test]
    fn parse_truncates_fractional_seconds() {
        let ts = Timestamp::parse("2026-03-01T09:15:30.987Z").unwrap();
        assert_eq!(ts.to_string(), "2026-03-01T09:15:30Z");
    }

    #[test]
    fn parse_rejects_offsets() {
        assert!(Timestamp::parse("2026-03-01T09:15:30+00:00").is_err());
        assert!(Timestamp::parse("yesterday Z").is_err());
    }

    #[test]
    fn now_has_no_subseconds() {
        assert_eq!(Timestamp::now().as_datetime().nanosecond(), 0);
    }
}
