//! Wire codec for the trait-state query language
//!
//! One direction builds the request bodies out of the typed request objects;
//! the other parses the three response shapes (flat, grouped, aggregated)
//! into the result containers. Epoch-millisecond instants convert exactly,
//! with no timezone adjustment.

use super::clause::Clause;
use super::request::{
    AggregateGroupedHistoryStatesRequest, QueryGroupedHistoryStatesRequest,
    QueryHistoryStatesRequest,
};
use super::result::{AggregatedResults, GroupedHistoryStates, HistoryState, QueryResult};
use super::time_range::TimeRange;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};

/// Body of an ungrouped query:
/// `{"query":{"clause":...}}` plus the optional top-level fields.
pub(crate) fn ungrouped_query_body(request: &QueryHistoryStatesRequest) -> Value {
    let mut body = Map::new();
    body.insert(
        "query".into(),
        json!({"clause": request.clause.to_query_json()}),
    );
    if let Some(limit) = request.best_effort_limit {
        body.insert("bestEffortLimit".into(), json!(limit));
    }
    if let Some(version) = &request.firmware_version {
        body.insert("firmwareVersion".into(), json!(version));
    }
    if let Some(key) = &request.pagination_key {
        body.insert("paginationKey".into(), json!(key));
    }
    Value::Object(body)
}

/// Combine the optional explicit clause with the mandatory time range.
///
/// Both present: an AND with the explicit clause first and the range second.
/// Range only: the bare `withinTimeRange` clause.
pub(crate) fn grouped_clause(clause: Option<&Clause>, range: &TimeRange) -> Value {
    match clause {
        Some(clause) => json!({
            "type": "and",
            "clauses": [clause.to_query_json(), range.to_query_json()],
        }),
        None => range.to_query_json(),
    }
}

/// Body of a grouped query: the combined clause plus `"grouped": true`.
pub(crate) fn grouped_query_body(request: &QueryGroupedHistoryStatesRequest) -> Value {
    let mut query = Map::new();
    query.insert(
        "clause".into(),
        grouped_clause(request.clause.as_ref(), &request.range),
    );
    query.insert("grouped".into(), json!(true));

    let mut body = Map::new();
    body.insert("query".into(), Value::Object(query));
    if let Some(version) = &request.firmware_version {
        body.insert("firmwareVersion".into(), json!(version));
    }
    Value::Object(body)
}

/// Body of an aggregate query: the grouped body with the single aggregation
/// appended under `query.aggregations`.
pub(crate) fn aggregate_query_body(request: &AggregateGroupedHistoryStatesRequest) -> Value {
    let mut body = grouped_query_body(&request.grouped_query);
    body["query"]["aggregations"] = json!([request.aggregation.to_query_json()]);
    body
}

/// One state record on the wire: `_created` plus the free-form payload
#[derive(Debug, Deserialize)]
struct StateEntry {
    #[serde(rename = "_created", with = "chrono::serde::ts_milliseconds")]
    created: DateTime<Utc>,
    #[serde(flatten)]
    state: Map<String, Value>,
}

impl From<StateEntry> for HistoryState {
    fn from(entry: StateEntry) -> Self {
        HistoryState::new(entry.state, entry.created)
    }
}

#[derive(Debug, Deserialize)]
struct UngroupedResponse {
    results: Vec<StateEntry>,
    #[serde(rename = "nextPaginationKey", default)]
    next_pagination_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroupedBucket {
    range: TimeRange,
    #[serde(default)]
    objects: Vec<StateEntry>,
}

#[derive(Debug, Deserialize)]
struct GroupedResponse {
    #[serde(rename = "groupedResults")]
    grouped_results: Vec<GroupedBucket>,
}

#[derive(Debug, Deserialize)]
struct AggregationEntry {
    #[serde(default)]
    value: Option<f64>,
    #[serde(default)]
    object: Option<StateEntry>,
}

#[derive(Debug, Deserialize)]
struct AggregatedBucket {
    range: TimeRange,
    #[serde(default)]
    aggregations: Vec<AggregationEntry>,
}

#[derive(Debug, Deserialize)]
struct AggregatedResponse {
    #[serde(rename = "groupedResults")]
    grouped_results: Vec<AggregatedBucket>,
}

/// Decode a flat query response into a paginated result
pub(crate) fn decode_history_states(body: Value) -> Result<QueryResult<HistoryState>> {
    let response: UngroupedResponse = serde_json::from_value(body)?;
    let states = response.results.into_iter().map(HistoryState::from).collect();
    Ok(QueryResult::new(states, response.next_pagination_key))
}

/// Decode a grouped query response, preserving bucket and state order
pub(crate) fn decode_grouped_history_states(body: Value) -> Result<Vec<GroupedHistoryStates>> {
    let response: GroupedResponse = serde_json::from_value(body)?;
    Ok(response
        .grouped_results
        .into_iter()
        .map(|bucket| {
            let states = bucket.objects.into_iter().map(HistoryState::from).collect();
            GroupedHistoryStates::new(bucket.range, states)
        })
        .collect())
}

/// Decode an aggregate query response.
///
/// Buckets with an empty `aggregations` array had no source records and
/// decode with neither a value nor states. Otherwise the first entry's value
/// is the bucket value and, when the entry carries the contributing state
/// record, it becomes a one-element `aggregated_states`.
pub(crate) fn decode_aggregated_results(body: Value) -> Result<Vec<AggregatedResults>> {
    let response: AggregatedResponse = serde_json::from_value(body)?;
    Ok(response
        .grouped_results
        .into_iter()
        .map(|bucket| {
            let mut entries = bucket.aggregations.into_iter();
            match entries.next() {
                None => AggregatedResults::new(bucket.range, None, None),
                Some(entry) => {
                    let states = entry
                        .object
                        .map(|object| vec![HistoryState::from(object)]);
                    AggregatedResults::new(bucket.range, entry.value, states)
                }
            }
        })
        .collect())
}
