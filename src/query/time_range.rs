//! Time windows for grouped queries and time-range filters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A `[from, to)` time window over UTC instants.
///
/// The service treats `from` as inclusive and `to` as exclusive, but both
/// bounds are carried exactly as supplied. Conversion to and from the wire's
/// epoch-millisecond form is exact, with no timezone adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Window start (inclusive)
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub from: DateTime<Utc>,

    /// Window end (exclusive by service convention)
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub to: DateTime<Utc>,
}

impl TimeRange {
    /// Create a time range from its bounds
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    /// Serialize as a `withinTimeRange` filter clause
    pub fn to_query_json(&self) -> Value {
        json!({
            "type": "withinTimeRange",
            "lowerLimit": self.from.timestamp_millis(),
            "upperLimit": self.to.timestamp_millis(),
        })
    }
}
