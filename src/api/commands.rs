//! Command operations
//!
//! Commands carry per-alias action lists to the target thing. Posting a
//! command is a plain REST call; the interesting state lives server-side.

use super::ThingIfApi;
use crate::error::{Result, ThingIfError};
use crate::query::QueryResult;
use crate::transport::{HttpRequest, Method};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

/// Actions addressed to one alias of the target thing
#[derive(Debug, Clone, PartialEq)]
pub struct AliasAction {
    /// Alias the actions belong to
    pub alias: String,
    /// Action objects in execution order, e.g. `{"turnPower": true}`
    pub actions: Vec<Value>,
}

impl AliasAction {
    /// Create an alias/action-list pair
    pub fn new<S: Into<String>>(alias: S, actions: Vec<Value>) -> Self {
        Self {
            alias: alias.into(),
            actions,
        }
    }

    fn to_json(&self) -> Value {
        let mut object = Map::new();
        object.insert(self.alias.clone(), Value::Array(self.actions.clone()));
        Value::Object(object)
    }
}

/// A new command to post to the target
#[derive(Debug, Clone, PartialEq)]
pub struct PostCommandRequest {
    /// Per-alias action lists, in execution order
    pub alias_actions: Vec<AliasAction>,
    /// Display title
    pub title: Option<String>,
    /// Display description
    pub description: Option<String>,
    /// Arbitrary metadata stored with the command
    pub metadata: Option<Map<String, Value>>,
}

impl PostCommandRequest {
    /// Create a command request from its action lists
    pub fn new(alias_actions: Vec<AliasAction>) -> Self {
        Self {
            alias_actions,
            title: None,
            description: None,
            metadata: None,
        }
    }

    /// Set the display title
    pub fn title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the display description
    pub fn description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach metadata
    pub fn metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// A command as stored by the cloud
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Command {
    /// Command identifier
    #[serde(rename = "commandID")]
    pub command_id: String,
    /// Issuer typed ID string
    #[serde(default)]
    pub issuer: Option<String>,
    /// Target typed ID string
    #[serde(default)]
    pub target: Option<String>,
    /// Per-alias action lists as posted
    #[serde(default)]
    pub actions: Vec<Value>,
    /// Per-action results reported by the thing
    #[serde(rename = "actionResults", default)]
    pub action_results: Vec<Value>,
    /// Lifecycle state (SENDING, DELIVERED, DONE, ...)
    #[serde(rename = "commandState", default)]
    pub command_state: Option<String>,
    /// Creation instant
    #[serde(
        rename = "createdAt",
        with = "chrono::serde::ts_milliseconds_option",
        default
    )]
    pub created_at: Option<DateTime<Utc>>,
    /// Last modification instant
    #[serde(
        rename = "modifiedAt",
        with = "chrono::serde::ts_milliseconds_option",
        default
    )]
    pub modified_at: Option<DateTime<Utc>>,
    /// Display title
    #[serde(default)]
    pub title: Option<String>,
    /// Display description
    #[serde(default)]
    pub description: Option<String>,
    /// Attached metadata
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

pub(crate) fn command_body(issuer: &str, request: &PostCommandRequest) -> Value {
    let mut body = Map::new();
    body.insert("issuer".into(), json!(issuer));
    body.insert(
        "actions".into(),
        Value::Array(request.alias_actions.iter().map(AliasAction::to_json).collect()),
    );
    if let Some(title) = &request.title {
        body.insert("title".into(), json!(title));
    }
    if let Some(description) = &request.description {
        body.insert("description".into(), json!(description));
    }
    if let Some(metadata) = &request.metadata {
        body.insert("metadata".into(), Value::Object(metadata.clone()));
    }
    Value::Object(body)
}

impl ThingIfApi {
    /// Post a new command to the target. Returns the stored command.
    pub async fn post_new_command(&self, request: &PostCommandRequest) -> Result<Command> {
        let target = self.established_target()?;
        if request.alias_actions.is_empty() {
            return Err(ThingIfError::argument("command has no actions"));
        }
        if request
            .alias_actions
            .iter()
            .any(|alias_action| alias_action.alias.is_empty())
        {
            return Err(ThingIfError::argument("alias is empty"));
        }

        let url = self.endpoint(&format!("targets/{}/commands", target.typed_id))?;
        let body = command_body(&self.owner().to_string(), request);
        let http_request = HttpRequest::new(Method::Post, url)
            .header("Content-Type", "application/json")
            .json(body);
        let response = self.dispatch(http_request).await?;

        let command_id = response
            .get("commandID")
            .and_then(Value::as_str)
            .ok_or_else(|| ThingIfError::transport("Command response has no commandID"))?
            .to_string();
        debug!("Posted command {command_id}");
        self.get_command(&command_id).await
    }

    /// Fetch one command by its ID
    pub async fn get_command(&self, command_id: &str) -> Result<Command> {
        let target = self.established_target()?;
        if command_id.is_empty() {
            return Err(ThingIfError::argument("commandID is empty"));
        }

        let url = self.endpoint(&format!(
            "targets/{}/commands/{command_id}",
            target.typed_id
        ))?;
        let response = self.dispatch(HttpRequest::new(Method::Get, url)).await?;
        Ok(serde_json::from_value(response)?)
    }

    /// List commands posted to the target, newest first, paginated
    pub async fn list_commands(
        &self,
        best_effort_limit: Option<u64>,
        pagination_key: Option<&str>,
    ) -> Result<QueryResult<Command>> {
        let target = self.established_target()?;

        let mut url = self.endpoint(&format!("targets/{}/commands", target.typed_id))?;
        if best_effort_limit.is_some() || pagination_key.is_some() {
            let mut pairs = url.query_pairs_mut();
            if let Some(limit) = best_effort_limit {
                pairs.append_pair("bestEffortLimit", &limit.to_string());
            }
            if let Some(key) = pagination_key {
                pairs.append_pair("paginationKey", key);
            }
        }

        let response = self.dispatch(HttpRequest::new(Method::Get, url)).await?;

        #[derive(Deserialize)]
        struct ListResponse {
            #[serde(default)]
            commands: Vec<Command>,
            #[serde(rename = "nextPaginationKey", default)]
            next_pagination_key: Option<String>,
        }
        let list: ListResponse = serde_json::from_value(response)?;
        Ok(QueryResult::new(list.commands, list.next_pagination_key))
    }
}
