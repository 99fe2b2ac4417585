//! Historical trait-state queries
//!
//! The query subsystem turns typed filter clauses, time windows and
//! aggregation descriptors into the service's query-language JSON, executes
//! the request through the transport collaborator and decodes the three
//! response shapes (flat, time-bucketed, aggregated) into typed results.

pub mod aggregation;
pub mod clause;
mod codec;
pub mod engine;
pub mod request;
pub mod result;
pub mod time_range;

pub use aggregation::{Aggregation, AggregationType, FieldType};
pub use clause::Clause;
pub use engine::{StateQueryEngine, TRAIT_STATE_QUERY_MEDIA_TYPE};
pub use request::{
    AggregateGroupedHistoryStatesRequest, QueryGroupedHistoryStatesRequest,
    QueryHistoryStatesRequest,
};
pub use result::{AggregatedResults, GroupedHistoryStates, HistoryState, QueryResult};
pub use time_range::TimeRange;
