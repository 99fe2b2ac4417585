//! HTTP transport collaborator
//!
//! The API layer describes every call as an [`HttpRequest`] and hands it to
//! an [`HttpTransport`]. The transport performs exactly one exchange and
//! resolves with the raw status and parsed body for every completed response,
//! 2xx or not; status interpretation (including the no-history 409
//! convention) belongs to the callers. Only connection-level failures reject.
//!
//! Retries, authentication flows and token refresh are outside this layer.

use crate::error::{Result, ThingIfError};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// HTTP method of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

/// A single HTTP exchange to perform
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute request URL
    pub url: Url,
    /// Request headers as name/value pairs
    pub headers: Vec<(String, String)>,
    /// JSON request body, if any
    pub body: Option<Value>,
}

impl HttpRequest {
    /// Create a request without a body
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Add a header
    pub fn header<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attach a JSON body
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A completed HTTP exchange
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Parsed JSON body; `Value::Null` when the response had no body
    pub body: Value,
}

impl HttpResponse {
    /// Whether the status code is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Convert a non-2xx response into the matching HTTP error
    pub fn into_error(self) -> ThingIfError {
        ThingIfError::http(self.status, self.body)
    }
}

/// Trait for HTTP transport implementations
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Perform one HTTP exchange
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// reqwest-based transport used by default
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport with the default 30 second timeout
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Create a transport with an explicit request timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .user_agent(format!("thing-if-rust/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ThingIfError::transport(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        debug!("{} {}", request.method.as_str(), request.url);

        let mut builder = match request.method {
            Method::Get => self.client.get(request.url.clone()),
            Method::Post => self.client.post(request.url.clone()),
            Method::Put => self.client.put(request.url.clone()),
            Method::Patch => self.client.patch(request.url.clone()),
            Method::Delete => self.client.delete(request.url.clone()),
        };

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ThingIfError::transport(format!("Request timed out: {e}"))
            } else {
                ThingIfError::transport(format!("HTTP request failed: {e}"))
            }
        })?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ThingIfError::transport(format!("Failed to read response: {e}")))?;

        // Empty bodies (204, some DELETEs) parse as null; anything that is
        // not valid JSON is carried as a string so error bodies survive.
        let body = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or_else(|_| {
                warn!("Non-JSON response body ({} bytes)", text.len());
                Value::String(text)
            })
        };

        debug!("HTTP response status {status}");
        Ok(HttpResponse { status, body })
    }
}
