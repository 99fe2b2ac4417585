//! Query execution engine for historical trait state
//!
//! Each operation validates locally, performs exactly one round-trip through
//! the transport collaborator and decodes the response. There is no retry
//! loop and no cross-call state; concurrent calls on one engine only share
//! the immutable configuration. Dropping a pending future abandons the call
//! but does not abort the in-flight HTTP request.

use super::clause::Clause;
use super::codec;
use super::request::{
    AggregateGroupedHistoryStatesRequest, QueryGroupedHistoryStatesRequest,
    QueryHistoryStatesRequest,
};
use super::result::{AggregatedResults, GroupedHistoryStates, HistoryState, QueryResult};
use crate::app::KiiApp;
use crate::error::{Result, ThingIfError};
use crate::target::TypedId;
use crate::transport::{HttpRequest, HttpTransport, Method};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Media type of trait-state query request bodies
pub const TRAIT_STATE_QUERY_MEDIA_TYPE: &str = "application/vnd.kii.TraitStateQueryRequest+json";

/// The one error code the service uses to report an absent time-series
/// bucket. Paired with HTTP 409 it means "no history yet", which is a
/// legitimate empty result, not a caller error.
const STATE_HISTORY_NOT_AVAILABLE: &str = "STATE_HISTORY_NOT_AVAILABLE";

/// Executes the three state-query operations against one application
pub struct StateQueryEngine {
    app: KiiApp,
    access_token: String,
    transport: Arc<dyn HttpTransport>,
}

impl StateQueryEngine {
    /// Create an engine bound to an application and access token
    pub fn new<S: Into<String>>(
        app: KiiApp,
        access_token: S,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            app,
            access_token: access_token.into(),
            transport,
        }
    }

    /// Query historical states without grouping.
    ///
    /// Resolves with an empty page when the service reports that no history
    /// bucket exists yet for the alias.
    pub async fn ungrouped_query(
        &self,
        target: &TypedId,
        request: &QueryHistoryStatesRequest,
    ) -> Result<QueryResult<HistoryState>> {
        validate_alias(&request.alias)?;
        validate_clause(&request.clause)?;

        let body = codec::ungrouped_query_body(request);
        match self.post_query(target, &request.alias, body).await? {
            Some(response) => codec::decode_history_states(response),
            None => Ok(QueryResult::empty()),
        }
    }

    /// Query historical states grouped into time buckets.
    ///
    /// Grouped queries are not paginated; the buckets come back as a plain
    /// array in window order.
    pub async fn grouped_query(
        &self,
        target: &TypedId,
        request: &QueryGroupedHistoryStatesRequest,
    ) -> Result<Vec<GroupedHistoryStates>> {
        validate_alias(&request.alias)?;
        if let Some(clause) = &request.clause {
            validate_clause(clause)?;
        }

        let body = codec::grouped_query_body(request);
        match self.post_query(target, &request.alias, body).await? {
            Some(response) => codec::decode_grouped_history_states(response),
            None => Ok(Vec::new()),
        }
    }

    /// Run an aggregation over the buckets of a grouped query
    pub async fn aggregate_query(
        &self,
        target: &TypedId,
        request: &AggregateGroupedHistoryStatesRequest,
    ) -> Result<Vec<AggregatedResults>> {
        let grouped = &request.grouped_query;
        validate_alias(&grouped.alias)?;
        if let Some(clause) = &grouped.clause {
            validate_clause(clause)?;
        }
        request.aggregation.validate()?;

        let body = codec::aggregate_query_body(request);
        match self.post_query(target, &grouped.alias, body).await? {
            Some(response) => codec::decode_aggregated_results(response),
            None => Ok(Vec::new()),
        }
    }

    /// Dispatch one query POST. `Ok(None)` is the normalized no-history case.
    async fn post_query(
        &self,
        target: &TypedId,
        alias: &str,
        body: Value,
    ) -> Result<Option<Value>> {
        let url = self
            .app
            .thing_if_base_url()?
            .join(&format!("targets/{target}/states/aliases/{alias}/query"))
            .map_err(|e| ThingIfError::config(format!("Invalid query URL: {e}")))?;

        debug!("Querying states of {target} via alias {alias}");
        let request = HttpRequest::new(Method::Post, url)
            .header("Authorization", format!("Bearer {}", self.access_token))
            .header("X-Kii-AppID", self.app.app_id.clone())
            .header("X-Kii-AppKey", self.app.app_key.clone())
            .header("Content-Type", TRAIT_STATE_QUERY_MEDIA_TYPE)
            .json(body);

        let response = self.transport.send(request).await?;
        if response.is_success() {
            return Ok(Some(response.body));
        }

        let no_history = response.status == 409
            && response.body.get("errorCode").and_then(Value::as_str)
                == Some(STATE_HISTORY_NOT_AVAILABLE);
        if no_history {
            debug!("No state history for {target}/{alias} yet, returning empty result");
            return Ok(None);
        }

        Err(response.into_error())
    }
}

fn validate_alias(alias: &str) -> Result<()> {
    if alias.is_empty() {
        return Err(ThingIfError::argument("alias is empty"));
    }
    Ok(())
}

/// Reject malformed clause trees before serialization: combinators must have
/// at least one child and range clauses at least one limit.
fn validate_clause(clause: &Clause) -> Result<()> {
    match clause {
        Clause::Equals { field, .. } | Clause::NotEquals { field, .. } => {
            if field.is_empty() {
                return Err(ThingIfError::argument("clause field is empty"));
            }
        }
        Clause::Range {
            field,
            lower_limit,
            upper_limit,
            ..
        } => {
            if field.is_empty() {
                return Err(ThingIfError::argument("clause field is empty"));
            }
            if lower_limit.is_none() && upper_limit.is_none() {
                return Err(ThingIfError::argument(
                    "range clause requires at least one limit",
                ));
            }
        }
        Clause::All => {}
        Clause::And(clauses) | Clause::Or(clauses) => {
            if clauses.is_empty() {
                return Err(ThingIfError::argument(
                    "and/or clause requires at least one subclause",
                ));
            }
            for child in clauses {
                validate_clause(child)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_alias() {
        assert!(validate_alias("AirConditionerAlias").is_ok());
        let err = validate_alias("").unwrap_err();
        assert!(err.is_argument_error());
    }

    #[test]
    fn test_validate_clause_rejects_empty_combinators() {
        assert!(validate_clause(&Clause::and(vec![])).is_err());
        assert!(validate_clause(&Clause::or(vec![])).is_err());
        assert!(validate_clause(&Clause::and(vec![Clause::all()])).is_ok());
    }

    #[test]
    fn test_validate_clause_recurses() {
        let nested = Clause::and(vec![Clause::all(), Clause::or(vec![])]);
        assert!(validate_clause(&nested).is_err());
    }

    #[test]
    fn test_validate_clause_unbounded_range() {
        let unbounded = Clause::Range {
            field: "temp".into(),
            lower_limit: None,
            lower_included: None,
            upper_limit: None,
            upper_included: None,
        };
        assert!(validate_clause(&unbounded).is_err());
        assert!(validate_clause(&Clause::greater_than("temp", 1.0)).is_ok());
    }
}
