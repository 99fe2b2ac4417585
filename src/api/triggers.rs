//! Trigger operations
//!
//! A trigger is a server-side rule firing a command or a server-code
//! invocation when a state condition or schedule matches.

use super::commands::{command_body, AliasAction, PostCommandRequest};
use super::ThingIfApi;
use crate::error::{Result, ThingIfError};
use crate::query::{Clause, QueryResult};
use crate::transport::{HttpRequest, Method};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::debug;

/// When a state condition fires its trigger
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggersWhen {
    /// Fire whenever the condition evaluates true on a state upload
    ConditionTrue,
    /// Fire on the false-to-true transition only
    ConditionFalseToTrue,
    /// Fire whenever the condition's value changes
    ConditionChanged,
}

/// What causes a trigger to fire
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// A state condition over the target's trait state
    State {
        /// Firing mode
        triggers_when: TriggersWhen,
        /// Condition clause over state fields
        condition: Clause,
    },
    /// A recurring cron schedule
    Schedule {
        /// Cron expression in the service's five-field dialect
        cron: String,
    },
    /// A single future instant
    ScheduleOnce {
        /// Firing instant
        at: DateTime<Utc>,
    },
}

impl Predicate {
    fn to_json(&self) -> Value {
        match self {
            Predicate::State {
                triggers_when,
                condition,
            } => json!({
                "eventSource": "STATES",
                "triggersWhen": triggers_when,
                "condition": condition.to_query_json(),
            }),
            Predicate::Schedule { cron } => json!({
                "eventSource": "SCHEDULE",
                "schedule": cron,
            }),
            Predicate::ScheduleOnce { at } => json!({
                "eventSource": "SCHEDULE_ONCE",
                "scheduleAt": at.timestamp_millis(),
            }),
        }
    }
}

/// Server-code invocation fired by a trigger
#[derive(Debug, Clone, PartialEq)]
pub struct ServerCode {
    /// Endpoint name of the deployed server code
    pub endpoint: String,
    /// Token the server code executes with
    pub executor_access_token: Option<String>,
    /// Application hosting the server code, when not this one
    pub target_app_id: Option<String>,
    /// Invocation parameters
    pub parameters: Option<Map<String, Value>>,
}

impl ServerCode {
    /// Create a server-code action for an endpoint
    pub fn new<S: Into<String>>(endpoint: S) -> Self {
        Self {
            endpoint: endpoint.into(),
            executor_access_token: None,
            target_app_id: None,
            parameters: None,
        }
    }

    /// Set the executor access token
    pub fn executor_access_token<S: Into<String>>(mut self, token: S) -> Self {
        self.executor_access_token = Some(token.into());
        self
    }

    /// Set the hosting application ID
    pub fn target_app_id<S: Into<String>>(mut self, app_id: S) -> Self {
        self.target_app_id = Some(app_id.into());
        self
    }

    /// Set invocation parameters
    pub fn parameters(mut self, parameters: Map<String, Value>) -> Self {
        self.parameters = Some(parameters);
        self
    }

    fn to_json(&self) -> Value {
        let mut body = Map::new();
        body.insert("endpoint".into(), json!(self.endpoint));
        if let Some(token) = &self.executor_access_token {
            body.insert("executorAccessToken".into(), json!(token));
        }
        if let Some(app_id) = &self.target_app_id {
            body.insert("targetAppID".into(), json!(app_id));
        }
        if let Some(parameters) = &self.parameters {
            body.insert("parameters".into(), Value::Object(parameters.clone()));
        }
        Value::Object(body)
    }
}

/// What a trigger does when it fires
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerAction {
    /// Post a command built from the given action lists
    Command(Vec<AliasAction>),
    /// Invoke deployed server code
    ServerCode(ServerCode),
}

/// A trigger as stored by the cloud.
///
/// Predicate and action come back as raw JSON; the wire shape is the
/// authoritative representation for round-tripping through patch calls.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Trigger {
    /// Trigger identifier
    #[serde(rename = "triggerID")]
    pub trigger_id: String,
    /// Predicate as stored
    #[serde(default)]
    pub predicate: Value,
    /// Command template, for command triggers
    #[serde(default)]
    pub command: Option<Value>,
    /// Server-code descriptor, for server-code triggers
    #[serde(rename = "serverCode", default)]
    pub server_code: Option<Value>,
    /// Whether the trigger is currently disabled
    #[serde(default)]
    pub disabled: bool,
    /// Display title
    #[serde(default)]
    pub title: Option<String>,
    /// Display description
    #[serde(default)]
    pub description: Option<String>,
}

fn trigger_body(issuer: &str, predicate: &Predicate, action: &TriggerAction) -> Result<Value> {
    if let Predicate::State { condition, .. } = predicate {
        if let Clause::And(clauses) | Clause::Or(clauses) = condition {
            if clauses.is_empty() {
                return Err(ThingIfError::argument(
                    "and/or clause requires at least one subclause",
                ));
            }
        }
    }

    let mut body = Map::new();
    body.insert("predicate".into(), predicate.to_json());
    match action {
        TriggerAction::Command(alias_actions) => {
            if alias_actions.is_empty() {
                return Err(ThingIfError::argument("command has no actions"));
            }
            body.insert("triggersWhat".into(), json!("COMMAND"));
            let request = PostCommandRequest::new(alias_actions.clone());
            body.insert("command".into(), command_body(issuer, &request));
        }
        TriggerAction::ServerCode(server_code) => {
            if server_code.endpoint.is_empty() {
                return Err(ThingIfError::argument("server code endpoint is empty"));
            }
            body.insert("triggersWhat".into(), json!("SERVER_CODE"));
            body.insert("serverCode".into(), server_code.to_json());
        }
    }
    Ok(Value::Object(body))
}

impl ThingIfApi {
    /// Create a trigger on the target. Returns the stored trigger.
    pub async fn post_new_trigger(
        &self,
        predicate: &Predicate,
        action: &TriggerAction,
    ) -> Result<Trigger> {
        let target = self.established_target()?;
        let body = trigger_body(&self.owner().to_string(), predicate, action)?;

        let url = self.endpoint(&format!("targets/{}/triggers", target.typed_id))?;
        let request = HttpRequest::new(Method::Post, url)
            .header("Content-Type", "application/json")
            .json(body);
        let response = self.dispatch(request).await?;

        let trigger_id = response
            .get("triggerID")
            .and_then(Value::as_str)
            .ok_or_else(|| ThingIfError::transport("Trigger response has no triggerID"))?
            .to_string();
        debug!("Created trigger {trigger_id}");
        self.get_trigger(&trigger_id).await
    }

    /// Replace a trigger's predicate and action
    pub async fn patch_trigger(
        &self,
        trigger_id: &str,
        predicate: &Predicate,
        action: &TriggerAction,
    ) -> Result<Trigger> {
        let target = self.established_target()?;
        if trigger_id.is_empty() {
            return Err(ThingIfError::argument("triggerID is empty"));
        }
        let body = trigger_body(&self.owner().to_string(), predicate, action)?;

        let url = self.endpoint(&format!(
            "targets/{}/triggers/{trigger_id}",
            target.typed_id
        ))?;
        let request = HttpRequest::new(Method::Patch, url)
            .header("Content-Type", "application/json")
            .json(body);
        self.dispatch(request).await?;
        self.get_trigger(trigger_id).await
    }

    /// Fetch one trigger by its ID
    pub async fn get_trigger(&self, trigger_id: &str) -> Result<Trigger> {
        let target = self.established_target()?;
        if trigger_id.is_empty() {
            return Err(ThingIfError::argument("triggerID is empty"));
        }

        let url = self.endpoint(&format!(
            "targets/{}/triggers/{trigger_id}",
            target.typed_id
        ))?;
        let response = self.dispatch(HttpRequest::new(Method::Get, url)).await?;
        Ok(serde_json::from_value(response)?)
    }

    /// Enable or disable a trigger
    pub async fn enable_trigger(&self, trigger_id: &str, enable: bool) -> Result<()> {
        let target = self.established_target()?;
        if trigger_id.is_empty() {
            return Err(ThingIfError::argument("triggerID is empty"));
        }

        let verb = if enable { "enable" } else { "disable" };
        let url = self.endpoint(&format!(
            "targets/{}/triggers/{trigger_id}/{verb}",
            target.typed_id
        ))?;
        self.dispatch(HttpRequest::new(Method::Put, url)).await?;
        Ok(())
    }

    /// Delete a trigger
    pub async fn delete_trigger(&self, trigger_id: &str) -> Result<()> {
        let target = self.established_target()?;
        if trigger_id.is_empty() {
            return Err(ThingIfError::argument("triggerID is empty"));
        }

        let url = self.endpoint(&format!(
            "targets/{}/triggers/{trigger_id}",
            target.typed_id
        ))?;
        self.dispatch(HttpRequest::new(Method::Delete, url)).await?;
        Ok(())
    }

    /// List triggers defined on the target, paginated
    pub async fn list_triggers(
        &self,
        best_effort_limit: Option<u64>,
        pagination_key: Option<&str>,
    ) -> Result<QueryResult<Trigger>> {
        let target = self.established_target()?;

        let mut url = self.endpoint(&format!("targets/{}/triggers", target.typed_id))?;
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
            triggers: Vec<Trigger>,
            #[serde(rename = "nextPaginationKey", default)]
            next_pagination_key: Option<String>,
        }
        let list: ListResponse = serde_json::from_value(response)?;
        Ok(QueryResult::new(list.triggers, list.next_pagination_key))
    }
}
