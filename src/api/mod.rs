//! High-level API facade
//!
//! [`ThingIfApi`] binds an application, the owner identity and an HTTP
//! transport together, and exposes the SDK surface: onboarding, commands,
//! triggers, current state and the historical state queries. Operations
//! scoped to a target require one to be established first, either by
//! onboarding or by [`ThingIfApi::set_target`].

pub mod commands;
pub mod onboarding;
pub mod triggers;

use crate::app::KiiApp;
use crate::error::{Result, ThingIfError};
use crate::query::{
    AggregateGroupedHistoryStatesRequest, AggregatedResults, GroupedHistoryStates, HistoryState,
    QueryGroupedHistoryStatesRequest, QueryHistoryStatesRequest, QueryResult, StateQueryEngine,
};
use crate::target::{Target, TypedId};
use crate::transport::{HttpRequest, HttpTransport, Method, ReqwestTransport};
use serde_json::{Map, Value};
use std::sync::Arc;
use url::Url;

/// Client facade for one application and owner
pub struct ThingIfApi {
    app: KiiApp,
    owner: TypedId,
    access_token: String,
    target: Option<Target>,
    transport: Arc<dyn HttpTransport>,
    engine: StateQueryEngine,
}

impl ThingIfApi {
    /// Create an API instance with the default reqwest transport
    pub fn new<S: Into<String>>(app: KiiApp, owner: TypedId, access_token: S) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new()?);
        Ok(Self::with_transport(app, owner, access_token, transport))
    }

    /// Create an API instance with an explicit transport implementation
    pub fn with_transport<S: Into<String>>(
        app: KiiApp,
        owner: TypedId,
        access_token: S,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        let access_token = access_token.into();
        let engine = StateQueryEngine::new(app.clone(), access_token.clone(), transport.clone());
        Self {
            app,
            owner,
            access_token,
            target: None,
            transport,
            engine,
        }
    }

    /// Owner identity all operations act on behalf of
    pub fn owner(&self) -> &TypedId {
        &self.owner
    }

    /// The established target, if any
    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    /// Establish a target without onboarding (e.g. restored from storage)
    pub fn set_target(&mut self, target: Target) {
        self.target = Some(target);
    }

    pub(crate) fn established_target(&self) -> Result<&Target> {
        self.target
            .as_ref()
            .ok_or_else(|| ThingIfError::illegal_state("target is not established"))
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url> {
        self.app
            .thing_if_base_url()?
            .join(path)
            .map_err(|e| ThingIfError::config(format!("Invalid endpoint URL {path}: {e}")))
    }

    /// Send a request with the standard app/auth headers attached and
    /// return the body of a successful response; any non-2xx response maps
    /// to the matching HTTP error verbatim.
    pub(crate) async fn dispatch(&self, request: HttpRequest) -> Result<Value> {
        let request = request
            .header("Authorization", format!("Bearer {}", self.access_token))
            .header("X-Kii-AppID", self.app.app_id.clone())
            .header("X-Kii-AppKey", self.app.app_key.clone());
        let response = self.transport.send(request).await?;
        if response.is_success() {
            Ok(response.body)
        } else {
            Err(response.into_error())
        }
    }

    /// Read the target's current state across all aliases
    pub async fn get_state(&self) -> Result<Map<String, Value>> {
        let target = self.established_target()?;
        let url = self.endpoint(&format!("targets/{}/states", target.typed_id))?;
        let response = self.dispatch(HttpRequest::new(Method::Get, url)).await?;
        match response {
            Value::Object(state) => Ok(state),
            Value::Null => Ok(Map::new()),
            other => Err(ThingIfError::transport(format!(
                "Unexpected state payload: {other}"
            ))),
        }
    }

    /// Read the target's current state under one alias
    pub async fn get_state_with_alias(&self, alias: &str) -> Result<Map<String, Value>> {
        let target = self.established_target()?;
        if alias.is_empty() {
            return Err(ThingIfError::argument("alias is empty"));
        }
        let url = self.endpoint(&format!(
            "targets/{}/states/aliases/{alias}",
            target.typed_id
        ))?;
        let response = self.dispatch(HttpRequest::new(Method::Get, url)).await?;
        match response {
            Value::Object(state) => Ok(state),
            Value::Null => Ok(Map::new()),
            other => Err(ThingIfError::transport(format!(
                "Unexpected state payload: {other}"
            ))),
        }
    }

    /// Query historical states of the target without grouping
    pub async fn query_states(
        &self,
        request: &QueryHistoryStatesRequest,
    ) -> Result<QueryResult<HistoryState>> {
        let target = self.established_target()?;
        self.engine.ungrouped_query(&target.typed_id, request).await
    }

    /// Query historical states of the target grouped into time buckets
    pub async fn query_grouped_states(
        &self,
        request: &QueryGroupedHistoryStatesRequest,
    ) -> Result<Vec<GroupedHistoryStates>> {
        let target = self.established_target()?;
        self.engine.grouped_query(&target.typed_id, request).await
    }

    /// Aggregate historical states of the target over time buckets
    pub async fn aggregate_states(
        &self,
        request: &AggregateGroupedHistoryStatesRequest,
    ) -> Result<Vec<AggregatedResults>> {
        let target = self.established_target()?;
        self.engine.aggregate_query(&target.typed_id, request).await
    }
}
