//! Common test utilities and fixtures
//!
//! Provides the mock transport and API fixtures shared by the integration
//! test suite.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use thing_if_rust::{
    error::{Result, ThingIfError},
    transport::{HttpRequest, HttpResponse, HttpTransport},
    KiiApp, Site, Target, ThingIfApi, TypedId,
};
use tokio::sync::RwLock;
use url::Url;

/// Mock transport capturing requests and replaying queued responses
pub struct MockTransport {
    /// Requests received, in call order
    requests: Arc<RwLock<Vec<HttpRequest>>>,

    /// Responses to replay, consumed front to back
    responses: Arc<RwLock<VecDeque<HttpResponse>>>,
}

impl MockTransport {
    /// Create an empty mock transport
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            requests: Arc::new(RwLock::new(Vec::new())),
            responses: Arc::new(RwLock::new(VecDeque::new())),
        })
    }

    /// Queue a response to replay for the next request
    pub async fn push_response(&self, status: u16, body: Value) {
        self.responses
            .write()
            .await
            .push_back(HttpResponse { status, body });
    }

    /// All captured requests so far
    pub async fn requests(&self) -> Vec<HttpRequest> {
        self.requests.read().await.clone()
    }

    /// Number of requests that reached the transport
    pub async fn request_count(&self) -> usize {
        self.requests.read().await.len()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.write().await.push(request);
        self.responses
            .write()
            .await
            .pop_front()
            .ok_or_else(|| ThingIfError::transport("no mock response queued"))
    }
}

/// Application fixture on a custom site so URLs are predictable
pub fn test_app() -> KiiApp {
    let site = Site::Custom(Url::parse("https://api.example.com/").unwrap());
    KiiApp::new("app-1", "app-key-1", site).unwrap()
}

/// API fixture with the owner `user:owner-1` and no target
pub fn test_api(transport: Arc<MockTransport>) -> ThingIfApi {
    ThingIfApi::with_transport(
        test_app(),
        TypedId::user("owner-1").unwrap(),
        "owner-token-1",
        transport,
    )
}

/// API fixture with the target `thing:th-1` established
#[allow(dead_code)]
pub fn test_api_with_target(transport: Arc<MockTransport>) -> ThingIfApi {
    let mut api = test_api(transport);
    api.set_target(Target::new(TypedId::thing("th-1").unwrap()).with_access_token("thing-token-1"));
    api
}

/// Value of the first header with the given name, if any
#[allow(dead_code)]
pub fn header_value<'a>(request: &'a HttpRequest, name: &str) -> Option<&'a str> {
    request
        .headers
        .iter()
        .find(|(header, _)| header == name)
        .map(|(_, value)| value.as_str())
}
