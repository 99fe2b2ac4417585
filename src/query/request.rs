//! Request objects for the three query operations
//!
//! Requests are plain value objects built by the caller and handed once to
//! the engine. Optional fields use chainable setters instead of positional
//! parameters; unset options are simply omitted from the wire body.

use super::aggregation::Aggregation;
use super::clause::Clause;
use super::time_range::TimeRange;

/// Ungrouped (flat) history-state query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryHistoryStatesRequest {
    /// Alias scoping the queried state stream
    pub alias: String,
    /// Filter clause
    pub clause: Clause,
    /// Restrict to states reported by this firmware version
    pub firmware_version: Option<String>,
    /// Soft cap on the number of returned states per page
    pub best_effort_limit: Option<u64>,
    /// Cursor from a previous page's result
    pub pagination_key: Option<String>,
}

impl QueryHistoryStatesRequest {
    /// Create a query over `alias` filtered by `clause`
    pub fn new<S: Into<String>>(alias: S, clause: Clause) -> Self {
        Self {
            alias: alias.into(),
            clause,
            firmware_version: None,
            best_effort_limit: None,
            pagination_key: None,
        }
    }

    /// Restrict to states reported by a firmware version
    pub fn firmware_version<S: Into<String>>(mut self, version: S) -> Self {
        self.firmware_version = Some(version.into());
        self
    }

    /// Set the best-effort page size
    pub fn best_effort_limit(mut self, limit: u64) -> Self {
        self.best_effort_limit = Some(limit);
        self
    }

    /// Continue a paginated query from a previous result's key
    pub fn pagination_key<S: Into<String>>(mut self, key: S) -> Self {
        self.pagination_key = Some(key.into());
        self
    }
}

/// Time-bucketed history-state query. Not paginated.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryGroupedHistoryStatesRequest {
    /// Alias scoping the queried state stream
    pub alias: String,
    /// Grouping window; also applied as a time-range filter
    pub range: TimeRange,
    /// Optional extra filter, combined with the range by an implicit AND
    pub clause: Option<Clause>,
    /// Restrict to states reported by this firmware version
    pub firmware_version: Option<String>,
}

impl QueryGroupedHistoryStatesRequest {
    /// Create a grouped query over `alias` for the given window
    pub fn new<S: Into<String>>(alias: S, range: TimeRange) -> Self {
        Self {
            alias: alias.into(),
            range,
            clause: None,
            firmware_version: None,
        }
    }

    /// Add an explicit filter clause
    pub fn clause(mut self, clause: Clause) -> Self {
        self.clause = Some(clause);
        self
    }

    /// Restrict to states reported by a firmware version
    pub fn firmware_version<S: Into<String>>(mut self, version: S) -> Self {
        self.firmware_version = Some(version.into());
        self
    }
}

/// Aggregation over a grouped query's time buckets
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateGroupedHistoryStatesRequest {
    /// The grouped query producing the buckets
    pub grouped_query: QueryGroupedHistoryStatesRequest,
    /// Aggregation applied to each bucket
    pub aggregation: Aggregation,
}

impl AggregateGroupedHistoryStatesRequest {
    /// Create an aggregate query
    pub fn new(grouped_query: QueryGroupedHistoryStatesRequest, aggregation: Aggregation) -> Self {
        Self {
            grouped_query,
            aggregation,
        }
    }
}
