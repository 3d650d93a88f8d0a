//! HTTP client wrapper
//!
//! - [`ApiClient`]: the single egress point for backend calls
//! - [`Pipeline`]: ordered request/response middleware (auth, 401 handling)
//! - [`Transport`]: the network seam, reqwest in production

mod client;
mod middleware;
mod request;
mod transport;

pub use client::ApiClient;
pub use middleware::{
    BearerAuth, JsonContentType, Pipeline, RequestMiddleware, ResponseMiddleware,
    UnauthorizedHandler,
};
pub use request::{ApiRequest, ApiResponse};
pub use transport::{ReqwestTransport, Transport};
