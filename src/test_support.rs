//! In-memory doubles shared by unit tests

use crate::error::Result;
use crate::http::{ApiRequest, ApiResponse, Transport};
use crate::navigation::Navigator;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::Mutex;
use std::time::Duration;

type Responder = Box<dyn Fn(&ApiRequest) -> Result<ApiResponse> + Send + Sync>;
type Latency = Box<dyn Fn(&ApiRequest) -> Duration + Send + Sync>;

/// Transport that records every request and answers from a closure
pub struct StubTransport {
    responder: Responder,
    latency: Latency,
    requests: Mutex<Vec<ApiRequest>>,
}

impl StubTransport {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&ApiRequest) -> Result<ApiResponse> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            latency: Box::new(|_: &ApiRequest| Duration::ZERO),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn ok(body: &'static str) -> Self {
        Self::status(StatusCode::OK, body)
    }

    pub fn status(status: StatusCode, body: &'static str) -> Self {
        Self::new(move |_| Ok(ApiResponse::new(status, body)))
    }

    /// Delay every response by `latency` (tokio time)
    pub fn with_latency(self, latency: Duration) -> Self {
        self.with_latency_fn(move |_: &ApiRequest| latency)
    }

    /// Per-request delay (tokio time)
    pub fn with_latency_fn<F>(mut self, latency: F) -> Self
    where
        F: Fn(&ApiRequest) -> Duration + Send + Sync + 'static,
    {
        self.latency = Box::new(latency);
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Full URLs of every request, in order
    pub fn urls(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| r.url(""))
            .collect()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn send(&self, _base_url: &str, request: &ApiRequest) -> Result<ApiResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let latency = (self.latency)(request);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        (self.responder)(request)
    }
}

/// Navigator that remembers every redirect
#[derive(Debug, Default)]
pub struct CountingNavigator {
    paths: Mutex<Vec<String>>,
}

impl CountingNavigator {
    pub fn count(&self) -> usize {
        self.paths.lock().unwrap().len()
    }

    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }
}

impl Navigator for CountingNavigator {
    fn navigate(&self, path: &str) {
        self.paths.lock().unwrap().push(path.to_string());
    }
}
