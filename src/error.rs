//! Error types for the Thing Interaction Framework client

use serde_json::Value;
use thiserror::Error;

/// Result type alias for thing-if operations
pub type Result<T> = std::result::Result<T, ThingIfError>;

/// Error types for thing-if client operations
#[derive(Error, Debug)]
pub enum ThingIfError {
    /// Local request validation failures, raised before any I/O
    #[error("Invalid argument: {0}")]
    Argument(String),

    /// An operation was invoked before its precondition was established
    /// (e.g. a target-scoped call without an onboarded target)
    #[error("Illegal state: {0}")]
    IllegalState(String),

    /// Non-2xx HTTP response, carrying the status and the parsed error body
    #[error("HTTP error {status}: {body}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Parsed response body, verbatim
        body: Value,
    },

    /// Connection-level transport failures (DNS, TLS, timeouts, ...)
    #[error("Transport error: {0}")]
    Transport(String),

    /// JSON parsing errors
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ThingIfError {
    /// Create an argument error
    pub fn argument<S: Into<String>>(msg: S) -> Self {
        Self::Argument(msg.into())
    }

    /// Create an illegal state error
    pub fn illegal_state<S: Into<String>>(msg: S) -> Self {
        Self::IllegalState(msg.into())
    }

    /// Create a transport error
    pub fn transport<S: Into<String>>(msg: S) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error from a status code and parsed body
    pub fn http(status: u16, body: Value) -> Self {
        Self::Http { status, body }
    }

    /// Check if error is a local validation failure
    pub fn is_argument_error(&self) -> bool {
        matches!(self, ThingIfError::Argument(_))
    }

    /// Check if error never left the client (no network round-trip happened)
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ThingIfError::Argument(_) | ThingIfError::IllegalState(_) | ThingIfError::Config(_)
        )
    }

    /// HTTP status code, for HTTP errors
    pub fn status(&self) -> Option<u16> {
        match self {
            ThingIfError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Service error code (the `errorCode` field of the error body), if any
    pub fn error_code(&self) -> Option<&str> {
        match self {
            ThingIfError::Http { body, .. } => body.get("errorCode").and_then(Value::as_str),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ThingIfError {
    fn from(err: reqwest::Error) -> Self {
        ThingIfError::Transport(err.to_string())
    }
}
