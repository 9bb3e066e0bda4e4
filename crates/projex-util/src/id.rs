//! Timestamp-derived run identifiers.
//!
//! Every export run is stored under a directory named after the UTC time it
//! started, e.g. `20260128201039`. Runs started within the same second get a
//! numeric suffix: `20260128201039-1`.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Identifier of one export run.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    /// Create a run ID for the current time.
    pub fn now() -> Self {
        Self::from_timestamp(Utc::now())
    }

    /// Create a run ID for a specific time.
    pub fn from_timestamp(timestamp: DateTime<Utc>) -> Self {
        Self(timestamp.format(TIMESTAMP_FORMAT).to_string())
    }

    /// Derive a disambiguated ID for the `n`-th collision in the same second.
    pub fn with_suffix(&self, n: u32) -> Self {
        Self(format!("{}-{}", self.timestamp_part(), n))
    }

    /// Parse a run ID, validating the timestamp and optional suffix.
    pub fn parse(s: &str) -> Option<Self> {
        let (stamp, suffix) = match s.split_once('-') {
            Some((stamp, suffix)) => (stamp, Some(suffix)),
            None => (s, None),
        };

        if stamp.len() != 14 || NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).is_err() {
            return None;
        }
        if let Some(suffix) = suffix {
            if suffix.is_empty() || !suffix.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
        }
        Some(Self(s.to_string()))
    }

    /// Get the ID as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn timestamp_part(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_from_timestamp() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 28, 20, 10, 39).unwrap();
        assert_eq!(RunId::from_timestamp(ts).as_str(), "20260128201039");
    }

    #[test]
    fn test_with_suffix_replaces_previous_suffix() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 28, 20, 10, 39).unwrap();
        let id = RunId::from_timestamp(ts);
        let first = id.with_suffix(1);
        assert_eq!(first.as_str(), "20260128201039-1");
        assert_eq!(first.with_suffix(2).as_str(), "20260128201039-2");
    }

    #[test]
    fn test_parse() {
        assert!(RunId::parse("20260128201039").is_some());
        assert!(RunId::parse("20260128201039-3").is_some());
        assert!(RunId::parse("2026012820103").is_none());
        assert!(RunId::parse("20261328201039").is_none());
        assert!(RunId::parse("20260128201039-").is_none());
        assert!(RunId::parse("../etc").is_none());
    }

    #[test]
    fn test_ordering_follows_time() {
        let earlier = RunId::from_timestamp(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        let later = RunId::from_timestamp(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 1).unwrap());
        assert!(earlier < later);
    }

    #[test]
    fn test_serde_transparent() {
        let id = RunId::parse("20260128201039").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"20260128201039\"");
    }
}
