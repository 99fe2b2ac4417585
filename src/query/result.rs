//! Result containers for query responses
//!
//! All of these are value objects produced by the response codec; they are
//! never constructed from caller input and never mutated after decoding.

use super::time_range::TimeRange;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// One historical state record
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryState {
    /// Free-form state payload, with the bookkeeping fields split off
    pub state: Map<String, Value>,
    /// Server-side creation instant of the record
    pub created_at: DateTime<Utc>,
}

impl HistoryState {
    /// Create a history state record
    pub fn new(state: Map<String, Value>, created_at: DateTime<Utc>) -> Self {
        Self { state, created_at }
    }
}

/// One time bucket of a grouped query
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedHistoryStates {
    /// Bucket window
    pub range: TimeRange,
    /// States recorded within the window, in response order
    pub states: Vec<HistoryState>,
}

impl GroupedHistoryStates {
    /// Create a grouped bucket
    pub fn new(range: TimeRange, states: Vec<HistoryState>) -> Self {
        Self { range, states }
    }
}

/// One time bucket of an aggregate query.
///
/// `value` and `aggregated_states` are both absent for buckets with no
/// source records. For buckets with data, the service may return the value
/// alone (pure counts) or together with the contributing state record; the
/// codec tolerates either combination.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedResults {
    /// Bucket window
    pub range: TimeRange,
    /// Aggregated value, if the bucket had source records
    pub value: Option<f64>,
    /// Contributing state record(s), when the service carries them along
    pub aggregated_states: Option<Vec<HistoryState>>,
}

impl AggregatedResults {
    /// Create an aggregated bucket
    pub fn new(
        range: TimeRange,
        value: Option<f64>,
        aggregated_states: Option<Vec<HistoryState>>,
    ) -> Self {
        Self {
            range,
            value,
            aggregated_states,
        }
    }
}

/// Pagination-aware result wrapper.
///
/// Continue pagination by re-issuing the same query with
/// [`pagination_key`](Self::pagination_key) set on the request. Pagination is
/// caller-driven and sequential: each page's key feeds the next request.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<T> {
    /// Decoded results in response order
    pub results: Vec<T>,
    /// Opaque cursor for the next page, if more data is available
    pub pagination_key: Option<String>,
}

impl<T> QueryResult<T> {
    /// Create a result page
    pub fn new(results: Vec<T>, pagination_key: Option<String>) -> Self {
        Self {
            results,
            pagination_key,
        }
    }

    /// An empty page with no continuation
    pub fn empty() -> Self {
        Self {
            results: Vec::new(),
            pagination_key: None,
        }
    }

    /// Whether another page can be requested
    pub fn has_next(&self) -> bool {
        self.pagination_key.as_deref().is_some_and(|key| !key.is_empty())
    }
}
