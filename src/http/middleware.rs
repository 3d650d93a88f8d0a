//! Request/response middleware
//!
//! Every call runs request middleware in registration order, then the
//! transport, then response middleware in registration order. Each call's
//! chain is independent of any other call in flight.

use super::request::{ApiRequest, ApiResponse};
use crate::error::{ClientError, Result};
use crate::navigation::{Navigator, LOGIN_PATH};
use crate::session::SessionStore;
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Transform applied to every outgoing request
pub trait RequestMiddleware: Send + Sync {
    fn on_request(&self, request: ApiRequest) -> Result<ApiRequest>;
}

/// Transform applied to every outcome, success or failure
pub trait ResponseMiddleware: Send + Sync {
    fn on_response(&self, outcome: Result<ApiResponse>) -> Result<ApiResponse>;
}

/// Ordered middleware lists
#[derive(Clone, Default)]
pub struct Pipeline {
    request: Vec<Arc<dyn RequestMiddleware>>,
    response: Vec<Arc<dyn ResponseMiddleware>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Standard HMS pipeline: JSON content type, bearer auth, 401 handling
    pub fn standard(session: Arc<dyn SessionStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self::new()
            .with_request(JsonContentType)
            .with_request(BearerAuth::new(session.clone()))
            .with_response(UnauthorizedHandler::new(session, navigator))
    }

    pub fn with_request(mut self, middleware: impl RequestMiddleware + 'static) -> Self {
        self.request.push(Arc::new(middleware));
        self
    }

    pub fn with_response(mut self, middleware: impl ResponseMiddleware + 'static) -> Self {
        self.response.push(Arc::new(middleware));
        self
    }

    pub fn apply_request(&self, mut request: ApiRequest) -> Result<ApiRequest> {
        for middleware in &self.request {
            request = middleware.on_request(request)?;
        }
        Ok(request)
    }

    pub fn apply_response(&self, mut outcome: Result<ApiResponse>) -> Result<ApiResponse> {
        for middleware in &self.response {
            outcome = middleware.on_response(outcome);
        }
        outcome
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("request", &self.request.len())
            .field("response", &self.response.len())
            .finish()
    }
}

/// Sets `Content-Type: application/json` unless the caller chose otherwise
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonContentType;

impl RequestMiddleware for JsonContentType {
    fn on_request(&self, mut request: ApiRequest) -> Result<ApiRequest> {
        request
            .headers
            .entry(CONTENT_TYPE)
            .or_insert(HeaderValue::from_static("application/json"));
        Ok(request)
    }
}

/// Adds `Authorization: Bearer <token>` when the session holds a token
pub struct BearerAuth {
    session: Arc<dyn SessionStore>,
}

impl BearerAuth {
    pub fn new(session: Arc<dyn SessionStore>) -> Self {
        Self { session }
    }
}

impl RequestMiddleware for BearerAuth {
    fn on_request(&self, mut request: ApiRequest) -> Result<ApiRequest> {
        match self.session.token() {
            Some(token) => {
                let value = HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| ClientError::InvalidHeader(e.to_string()))?;
                request.headers.insert(AUTHORIZATION, value);
            }
            None => {
                request.headers.remove(AUTHORIZATION);
            }
        }
        Ok(request)
    }
}

/// On 401: clear the session, send the user to login, then re-raise
pub struct UnauthorizedHandler {
    session: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
}

impl UnauthorizedHandler {
    pub fn new(session: Arc<dyn SessionStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self { session, navigator }
    }
}

impl ResponseMiddleware for UnauthorizedHandler {
    fn on_response(&self, outcome: Result<ApiResponse>) -> Result<ApiResponse> {
        match outcome {
            Err(e) if e.is_unauthorized() => {
                warn!("Unauthorized response, clearing session");
                if let Err(clear_err) = self.session.clear() {
                    error!("Failed to clear session after 401: {}", clear_err);
                }
                self.navigator.navigate(LOGIN_PATH);
                Err(e)
            }
            Err(e) => {
                debug!("Request failed: {}", e);
                Err(e)
            }
            ok => ok,
        }
    }
}
