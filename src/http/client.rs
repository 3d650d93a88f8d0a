//! Single egress point for backend calls

use super::middleware::Pipeline;
use super::request::{ApiRequest, ApiResponse};
use super::transport::{ReqwestTransport, Transport};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::navigation::{LogNavigator, Navigator};
use crate::session::SessionStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// HTTP client for the HMS REST API
///
/// # Example
///
/// ```rust,no_run
/// use hms_client::{ApiClient, ClientConfig, MemorySession};
/// use std::sync::Arc;
///
/// # async fn example() -> hms_client::Result<()> {
/// let session = Arc::new(MemorySession::with_token("token"));
/// let client = ApiClient::new(ClientConfig::from_env(), session)?;
///
/// let patients: Vec<serde_json::Value> = client.get_json("/api/patients").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    transport: Arc<dyn Transport>,
    pipeline: Pipeline,
    session: Arc<dyn SessionStore>,
}

impl ApiClient {
    /// Create a client with the reqwest transport and the standard pipeline
    pub fn new(config: ClientConfig, session: Arc<dyn SessionStore>) -> Result<Self> {
        Self::with_navigator(config, session, Arc::new(LogNavigator))
    }

    /// Create a client whose 401 handler redirects through `navigator`
    pub fn with_navigator(
        config: ClientConfig,
        session: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        config.validate()?;
        let transport = Arc::new(ReqwestTransport::new(&config)?);
        let pipeline = Pipeline::standard(session.clone(), navigator);
        Ok(Self::from_parts(config.base_url, transport, pipeline, session))
    }

    /// Assemble a client from explicit parts
    pub fn from_parts(
        base_url: impl Into<String>,
        transport: Arc<dyn Transport>,
        pipeline: Pipeline,
        session: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
            pipeline,
            session,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Session store shared with the auth middleware
    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    /// Run a request through middleware and transport
    ///
    /// Non-success statuses become [`ClientError::Status`] before the response
    /// middleware sees them.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let request = self.pipeline.apply_request(request)?;
        debug!(method = %request.method, path = %request.path, "Sending request");

        let outcome = match self.transport.send(&self.base_url, &request).await {
            Ok(response) if response.status.is_success() => Ok(response),
            Ok(response) => Err(ClientError::Status {
                status: response.status.as_u16(),
                body: response.text(),
            }),
            Err(e) => Err(e),
        };

        self.pipeline.apply_response(outcome)
    }

    /// Send and decode the response body
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        self.send(request).await?.json()
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send_json(ApiRequest::get(path)).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(ApiRequest::post(path).json(body)?).await
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(ApiRequest::put(path).json(body)?).await
    }

    pub async fn patch_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(ApiRequest::patch(path).json(body)?).await
    }

    /// DELETE, returning the raw response
    pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.send(ApiRequest::delete(path)).await
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("pipeline", &self.pipeline)
            .finish()
    }
}
