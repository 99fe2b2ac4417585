//! Async Rust client for the Thing Interaction Framework IoT cloud
//!
//! This crate lets an application onboard things, send commands to them,
//! define triggers that fire commands or server code on state conditions,
//! and query historical and aggregated trait-state time series. The query
//! subsystem is the interesting part: typed, composable filter clauses, a
//! query-language JSON codec, three response shapes (flat, time-bucketed,
//! aggregated) and caller-driven pagination.
//!
//! HTTP transport is a pluggable collaborator behind the
//! [`transport::HttpTransport`] trait; a reqwest-based implementation is
//! used by default. Retries, token refresh and push notification are
//! outside this crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use thing_if_rust::{
//!     Clause, KiiApp, QueryHistoryStatesRequest, Site, Target, ThingIfApi, TypedId,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let app = KiiApp::new("my-app-id", "my-app-key", Site::Jp)?;
//!     let owner = TypedId::user("owner-id")?;
//!     let mut api = ThingIfApi::new(app, owner, "owner-token")?;
//!     api.set_target(Target::new(TypedId::thing("my-thing-id")?));
//!
//!     let request = QueryHistoryStatesRequest::new(
//!         "AirConditionerAlias",
//!         Clause::equals("power", true),
//!     )
//!     .best_effort_limit(25);
//!     let page = api.query_states(&request).await?;
//!     for state in &page.results {
//!         println!("{} -> {:?}", state.created_at, state.state);
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod app;
pub mod error;
pub mod query;
pub mod target;
pub mod transport;

// Re-export main types
pub use crate::{
    api::ThingIfApi,
    app::{KiiApp, Site},
    error::{Result, ThingIfError},
    query::{
        AggregateGroupedHistoryStatesRequest, AggregatedResults, Aggregation, AggregationType,
        Clause, FieldType, GroupedHistoryStates, HistoryState, QueryGroupedHistoryStatesRequest,
        QueryHistoryStatesRequest, QueryResult, StateQueryEngine, TimeRange,
    },
    target::{Target, TypedId, TypedIdKind},
};
