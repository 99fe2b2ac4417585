//! Typed identifiers for things, users and groups
//!
//! The cloud addresses every entity with a `"{type}:{id}"` pair. Commands,
//! triggers and state queries are scoped to a target (usually a thing), while
//! ownership is expressed with a user or group identifier.

use crate::error::{Result, ThingIfError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of a typed identifier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TypedIdKind {
    /// A managed IoT device
    Thing,
    /// A cloud user
    User,
    /// A user group
    Group,
}

impl TypedIdKind {
    fn as_str(&self) -> &'static str {
        match self {
            TypedIdKind::Thing => "thing",
            TypedIdKind::User => "user",
            TypedIdKind::Group => "group",
        }
    }
}

/// Typed entity identifier, rendered on the wire as `"{type}:{id}"`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypedId {
    /// Entity kind
    pub kind: TypedIdKind,
    /// Entity ID assigned by the cloud
    pub id: String,
}

impl TypedId {
    /// Create a typed identifier
    pub fn new<S: Into<String>>(kind: TypedIdKind, id: S) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(ThingIfError::argument("id is empty"));
        }
        Ok(Self { kind, id })
    }

    /// Shorthand for a thing identifier
    pub fn thing<S: Into<String>>(id: S) -> Result<Self> {
        Self::new(TypedIdKind::Thing, id)
    }

    /// Shorthand for a user identifier
    pub fn user<S: Into<String>>(id: S) -> Result<Self> {
        Self::new(TypedIdKind::User, id)
    }

    /// Shorthand for a group identifier
    pub fn group<S: Into<String>>(id: S) -> Result<Self> {
        Self::new(TypedIdKind::Group, id)
    }
}

impl fmt::Display for TypedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.id)
    }
}

impl FromStr for TypedId {
    type Err = ThingIfError;

    fn from_str(s: &str) -> Result<Self> {
        let (kind, id) = s
            .split_once(':')
            .ok_or_else(|| ThingIfError::argument(format!("Malformed typed ID: {s}")))?;
        let kind = match kind {
            "thing" => TypedIdKind::Thing,
            "user" => TypedIdKind::User,
            "group" => TypedIdKind::Group,
            other => {
                return Err(ThingIfError::argument(format!(
                    "Unknown typed ID kind: {other}"
                )))
            }
        };
        TypedId::new(kind, id)
    }
}

impl Serialize for TypedId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TypedId {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A target established by onboarding, with the token used to act on it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Typed identifier of the target thing
    pub typed_id: TypedId,
    /// Access token scoped to the target, if one was issued
    pub access_token: Option<String>,
}

impl Target {
    /// Create a target from its typed identifier
    pub fn new(typed_id: TypedId) -> Self {
        Self {
            typed_id,
            access_token: None,
        }
    }

    /// Attach the target-scoped access token
    pub fn with_access_token<S: Into<String>>(mut self, token: S) -> Self {
        self.access_token = Some(token.into());
        self
    }
}
