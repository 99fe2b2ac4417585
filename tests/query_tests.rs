//! Integration tests for the historical state query operations
//!
//! Drives the three query operations end-to-end through the API facade and
//! a mock transport, asserting both the wire bodies sent and the decoding
//! of the three response shapes.

mod common;

use chrono::{TimeZone, Utc};
use common::*;
use serde_json::json;
use thing_if_rust::{
    transport::Method, AggregateGroupedHistoryStatesRequest, AggregatedResults, Aggregation,
    Clause, FieldType, QueryGroupedHistoryStatesRequest, QueryHistoryStatesRequest, ThingIfError,
    TimeRange,
};

fn window(from_ms: i64, to_ms: i64) -> TimeRange {
    TimeRange::new(
        Utc.timestamp_millis_opt(from_ms).unwrap(),
        Utc.timestamp_millis_opt(to_ms).unwrap(),
    )
}

// Ungrouped queries

#[tokio::test]
async fn test_ungrouped_query_decodes_results() {
    let transport = MockTransport::new();
    transport
        .push_response(
            200,
            json!({"results": [
                {"power": false, "_created": 1},
                {"power": true, "_created": 2},
            ]}),
        )
        .await;
    let api = test_api_with_target(transport.clone());

    let request = QueryHistoryStatesRequest::new("AirConditionerAlias", Clause::all());
    let page = api.query_states(&request).await.unwrap();

    assert_eq!(page.results.len(), 2);
    assert_eq!(page.results[0].state["power"], json!(false));
    assert_eq!(page.results[0].created_at.timestamp_millis(), 1);
    assert_eq!(page.results[1].state["power"], json!(true));
    assert_eq!(page.results[1].created_at.timestamp_millis(), 2);
    assert!(page.pagination_key.is_none());
    assert!(!page.has_next());

    // Exactly one POST against the alias-scoped query endpoint
    let requests = transport.requests().await;
    assert_eq!(requests.len(), 1);
    let sent = &requests[0];
    assert_eq!(sent.method, Method::Post);
    assert_eq!(
        sent.url.path(),
        "/thing-if/apps/app-1/targets/thing:th-1/states/aliases/AirConditionerAlias/query"
    );
    assert_eq!(
        header_value(sent, "Content-Type"),
        Some("application/vnd.kii.TraitStateQueryRequest+json")
    );
    assert_eq!(header_value(sent, "Authorization"), Some("Bearer owner-token-1"));
    assert_eq!(header_value(sent, "X-Kii-AppID"), Some("app-1"));
    assert_eq!(
        sent.body.as_ref().unwrap(),
        &json!({"query": {"clause": {"type": "all"}}})
    );
}

#[tokio::test]
async fn test_ungrouped_query_carries_options() {
    let transport = MockTransport::new();
    transport.push_response(200, json!({"results": []})).await;
    let api = test_api_with_target(transport.clone());

    let request = QueryHistoryStatesRequest::new(
        "AirConditionerAlias",
        Clause::greater_than("currentTemperature", 23.0),
    )
    .best_effort_limit(25)
    .firmware_version("1.0.2")
    .pagination_key("100/2");
    api.query_states(&request).await.unwrap();

    let requests = transport.requests().await;
    let sent = &requests[0];
    assert_eq!(
        sent.body.as_ref().unwrap(),
        &json!({
            "query": {"clause": {
                "type": "range",
                "field": "currentTemperature",
                "lowerLimit": 23.0,
                "lowerIncluded": false,
            }},
            "bestEffortLimit": 25,
            "firmwareVersion": "1.0.2",
            "paginationKey": "100/2",
        })
    );
}

#[tokio::test]
async fn test_ungrouped_query_surfaces_pagination_key() {
    let transport = MockTransport::new();
    transport
        .push_response(
            200,
            json!({
                "results": [{"power": true, "_created": 1}],
                "nextPaginationKey": "2/1",
            }),
        )
        .await;
    let api = test_api_with_target(transport);

    let request = QueryHistoryStatesRequest::new("AirConditionerAlias", Clause::all());
    let page = api.query_states(&request).await.unwrap();
    assert!(page.has_next());
    assert_eq!(page.pagination_key.as_deref(), Some("2/1"));
}

// Grouped queries

#[tokio::test]
async fn test_grouped_query_combines_clause_and_range() {
    let transport = MockTransport::new();
    transport.push_response(200, json!({"groupedResults": []})).await;
    let api = test_api_with_target(transport.clone());

    let request = QueryGroupedHistoryStatesRequest::new("AirConditionerAlias", window(10, 100))
        .clause(Clause::equals("power", true));
    let buckets = api.query_grouped_states(&request).await.unwrap();
    assert!(buckets.is_empty());

    let requests = transport.requests().await;
    let sent = &requests[0];
    let query = &sent.body.as_ref().unwrap()["query"];
    assert_eq!(query["grouped"], json!(true));
    // Explicit clause first, range second
    assert_eq!(
        query["clause"],
        json!({
            "type": "and",
            "clauses": [
                {"type": "eq", "field": "power", "value": true},
                {"type": "withinTimeRange", "lowerLimit": 10, "upperLimit": 100},
            ],
        })
    );
}

#[tokio::test]
async fn test_grouped_query_range_only_uses_bare_clause() {
    let transport = MockTransport::new();
    transport.push_response(200, json!({"groupedResults": []})).await;
    let api = test_api_with_target(transport.clone());

    let request = QueryGroupedHistoryStatesRequest::new("AirConditionerAlias", window(10, 100));
    api.query_grouped_states(&request).await.unwrap();

    let requests = transport.requests().await;
    let sent = &requests[0];
    assert_eq!(
        sent.body.as_ref().unwrap()["query"]["clause"],
        json!({"type": "withinTimeRange", "lowerLimit": 10, "upperLimit": 100})
    );
}

#[tokio::test]
async fn test_grouped_query_decodes_buckets_in_order() {
    let transport = MockTransport::new();
    transport
        .push_response(
            200,
            json!({"groupedResults": [
                {
                    "range": {"from": 10, "to": 20},
                    "objects": [
                        {"currentTemperature": 22, "_created": 11},
                        {"currentTemperature": 24, "_created": 15},
                    ],
                },
                {"range": {"from": 20, "to": 30}, "objects": []},
            ]}),
        )
        .await;
    let api = test_api_with_target(transport);

    let request = QueryGroupedHistoryStatesRequest::new("AirConditionerAlias", window(10, 30));
    let buckets = api.query_grouped_states(&request).await.unwrap();

    assert_eq!(buckets.len(), 2);
    assert_eq!(buckets[0].range, window(10, 20));
    assert_eq!(buckets[0].states.len(), 2);
    assert_eq!(buckets[0].states[0].state["currentTemperature"], json!(22));
    assert_eq!(buckets[0].states[1].created_at.timestamp_millis(), 15);
    assert!(buckets[1].states.is_empty());
}

// Aggregate queries

#[tokio::test]
async fn test_aggregate_query_body_and_decoding() {
    let transport = MockTransport::new();
    transport
        .push_response(
            200,
            json!({"groupedResults": [
                {
                    "range": {"from": 10, "to": 20},
                    "aggregations": [
                        {"value": 25, "name": "max",
                         "object": {"currentTemperature": 25, "_created": 12}},
                    ],
                },
                {"range": {"from": 20, "to": 30}, "aggregations": []},
            ]}),
        )
        .await;
    let api = test_api_with_target(transport.clone());

    let request = AggregateGroupedHistoryStatesRequest::new(
        QueryGroupedHistoryStatesRequest::new("AirConditionerAlias", window(10, 30)),
        Aggregation::max("currentTemperature", FieldType::Integer),
    );
    let buckets = api.aggregate_states(&request).await.unwrap();

    // Bucket with data carries the value and the contributing record
    assert_eq!(buckets[0].value, Some(25.0));
    let states = buckets[0].aggregated_states.as_ref().unwrap();
    assert_eq!(states[0].state["currentTemperature"], json!(25));
    assert_eq!(states[0].created_at.timestamp_millis(), 12);

    // Empty bucket decodes with both fields absent
    assert_eq!(
        buckets[1],
        AggregatedResults::new(window(20, 30), None, None)
    );

    let requests = transport.requests().await;
    let sent = &requests[0];
    let query = &sent.body.as_ref().unwrap()["query"];
    assert_eq!(query["grouped"], json!(true));
    assert_eq!(
        query["aggregations"],
        json!([{
            "type": "MAX",
            "putAggregationInto": "max",
            "field": "currentTemperature",
            "fieldType": "INTEGER",
        }])
    );
}

// No-history normalization

#[tokio::test]
async fn test_no_history_409_resolves_empty_for_all_operations() {
    let no_history = json!({
        "errorCode": "STATE_HISTORY_NOT_AVAILABLE",
        "message": "Time series bucket does not exist",
    });

    let transport = MockTransport::new();
    transport.push_response(409, no_history.clone()).await;
    transport.push_response(409, no_history.clone()).await;
    transport.push_response(409, no_history).await;
    let api = test_api_with_target(transport.clone());

    let page = api
        .query_states(&QueryHistoryStatesRequest::new(
            "AirConditionerAlias",
            Clause::all(),
        ))
        .await
        .unwrap();
    assert!(page.results.is_empty());
    assert!(!page.has_next());

    let grouped = api
        .query_grouped_states(&QueryGroupedHistoryStatesRequest::new(
            "AirConditionerAlias",
            window(10, 100),
        ))
        .await
        .unwrap();
    assert!(grouped.is_empty());

    let aggregated = api
        .aggregate_states(&AggregateGroupedHistoryStatesRequest::new(
            QueryGroupedHistoryStatesRequest::new("AirConditionerAlias", window(10, 100)),
            Aggregation::count("power", FieldType::Boolean),
        ))
        .await
        .unwrap();
    assert!(aggregated.is_empty());

    assert_eq!(transport.request_count().await, 3);
}

#[tokio::test]
async fn test_409_with_other_error_code_propagates() {
    let transport = MockTransport::new();
    transport
        .push_response(409, json!({"errorCode": "RESOURCE_ALREADY_EXISTS"}))
        .await;
    let api = test_api_with_target(transport);

    let err = api
        .query_states(&QueryHistoryStatesRequest::new(
            "AirConditionerAlias",
            Clause::all(),
        ))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(409));
    assert_eq!(err.error_code(), Some("RESOURCE_ALREADY_EXISTS"));
}

#[tokio::test]
async fn test_http_error_carries_status_and_body() {
    let transport = MockTransport::new();
    transport
        .push_response(
            404,
            json!({"errorCode": "TARGET_NOT_FOUND", "message": "Target th-1 not found"}),
        )
        .await;
    let api = test_api_with_target(transport);

    let err = api
        .query_states(&QueryHistoryStatesRequest::new(
            "AirConditionerAlias",
            Clause::all(),
        ))
        .await
        .unwrap_err();
    match err {
        ThingIfError::Http { status, body } => {
            assert_eq!(status, 404);
            assert_eq!(body["errorCode"], "TARGET_NOT_FOUND");
            assert_eq!(body["message"], "Target th-1 not found");
        }
        other => panic!("expected HTTP error, got {other:?}"),
    }
}

// Local validation

#[tokio::test]
async fn test_empty_alias_rejected_without_network_call() {
    let transport = MockTransport::new();
    let api = test_api_with_target(transport.clone());

    let err = api
        .query_states(&QueryHistoryStatesRequest::new("", Clause::all()))
        .await
        .unwrap_err();
    assert!(err.is_argument_error());

    let err = api
        .query_grouped_states(&QueryGroupedHistoryStatesRequest::new("", window(10, 100)))
        .await
        .unwrap_err();
    assert!(err.is_argument_error());

    assert_eq!(transport.request_count().await, 0);
}

#[tokio::test]
async fn test_malformed_clause_rejected_without_network_call() {
    let transport = MockTransport::new();
    let api = test_api_with_target(transport.clone());

    let err = api
        .query_states(&QueryHistoryStatesRequest::new(
            "AirConditionerAlias",
            Clause::and(vec![]),
        ))
        .await
        .unwrap_err();
    assert!(err.is_argument_error());
    assert_eq!(transport.request_count().await, 0);
}

#[tokio::test]
async fn test_invalid_aggregation_rejected_without_network_call() {
    let transport = MockTransport::new();
    let api = test_api_with_target(transport.clone());

    let request = AggregateGroupedHistoryStatesRequest::new(
        QueryGroupedHistoryStatesRequest::new("AirConditionerAlias", window(10, 100)),
        Aggregation::max("power", FieldType::Boolean),
    );
    let err = api.aggregate_states(&request).await.unwrap_err();
    assert!(err.is_argument_error());
    assert!(format!("{err}").contains("INTEGER or DECIMAL"));
    assert_eq!(transport.request_count().await, 0);
}

#[tokio::test]
async fn test_query_without_target_is_illegal_state() {
    let transport = MockTransport::new();
    let api = test_api(transport.clone());

    let err = api
        .query_states(&QueryHistoryStatesRequest::new(
            "AirConditionerAlias",
            Clause::all(),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, ThingIfError::IllegalState(_)));
    assert_eq!(transport.request_count().await, 0);
}

// Concurrency: calls on one API instance resolve independently

#[tokio::test]
async fn test_concurrent_queries_resolve_independently() {
    let transport = MockTransport::new();
    let body = json!({"results": [{"power": true, "_created": 1}]});
    transport.push_response(200, body.clone()).await;
    transport.push_response(200, body).await;
    let api = test_api_with_target(transport.clone());

    let first_req = QueryHistoryStatesRequest::new(
        "AirConditionerAlias",
        Clause::all(),
    );
    let second_req = QueryHistoryStatesRequest::new(
        "AirConditionerAlias",
        Clause::all(),
    );
    let first = api.query_states(&first_req);
    let second = api.query_states(&second_req);
    let (first, second) = futures::join!(first, second);

    assert_eq!(first.unwrap().results.len(), 1);
    assert_eq!(second.unwrap().results.len(), 1);
    assert_eq!(transport.request_count().await, 2);
}

// Pagination is caller-driven: the key from one page feeds the next request

#[tokio::test]
async fn test_sequential_pagination_flow() {
    let transport = MockTransport::new();
    transport
        .push_response(
            200,
            json!({"results": [{"power": true, "_created": 1}], "nextPaginationKey": "2/1"}),
        )
        .await;
    transport
        .push_response(200, json!({"results": [{"power": false, "_created": 2}]}))
        .await;
    let api = test_api_with_target(transport.clone());

    let first = api
        .query_states(&QueryHistoryStatesRequest::new(
            "AirConditionerAlias",
            Clause::all(),
        ))
        .await
        .unwrap();
    assert!(first.has_next());

    let request = QueryHistoryStatesRequest::new("AirConditionerAlias", Clause::all())
        .pagination_key(first.pagination_key.unwrap());
    let second = api.query_states(&request).await.unwrap();
    assert!(!second.has_next());
    assert_eq!(second.results[0].created_at.timestamp_millis(), 2);

    let requests = transport.requests().await;
    assert_eq!(requests[1].body.as_ref().unwrap()["paginationKey"], "2/1");
}
