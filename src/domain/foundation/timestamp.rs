//! UTC timestamps for session records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A fixed point in time, carried as UTC and serialized as RFC 3339.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// The current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Wraps an existing `DateTime<Utc>`.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// The wrapped `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// True when this instant precedes `other`.
    pub fn is_before(&self, other: &Timestamp) -> bool {
        self.0 < other.0
    }

    /// True when this instant follows `other`.
    pub fn is_after(&self, other: &Timestamp) -> bool {
        self.0 > other.0
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn now_moves_forward() {
        let a = Timestamp::now();
        sleep(Duration::from_millis(5));
        let b = Timestamp::now();

        assert!(a.is_before(&b));
        assert!(b.is_after(&a));
        assert!(a < b);
    }

    #[test]
    fn wraps_a_datetime_unchanged() {
        let dt = Utc::now();
        assert_eq!(Timestamp::from_datetime(dt).as_datetime(), &dt);
    }

    #[test]
    fn serializes_as_rfc3339() {
        let dt = DateTime::parse_from_rfc3339("2026-03-02T08:15:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let json = serde_json::to_string(&Timestamp::from_datetime(dt)).unwrap();

        assert!(json.contains("2026-03-02T08:15:00"));
    }

    #[test]
    fn deserializes_from_rfc3339() {
        let ts: Timestamp = serde_json::from_str("\"2026-03-02T08:15:00Z\"").unwrap();
        assert_eq!(ts.as_datetime().year(), 2026);
    }
}
