//! The per-dispatch request context.
//!
//! [`RequestContext`] is what flows through the middleware chain into the router: the normalized request
//! together with the host's invocation context. Both are reference counted so bound handler arguments can
//! hold on to them without copying the body.

use std::sync::Arc;

use http::{HeaderMap, Method};
use lambda_api_http::protocol::{Context, NormalizedRequest};

/// Represents one dispatch's inbound data.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request: Arc<NormalizedRequest>,
    context: Arc<Context>,
}

impl RequestContext {
    /// Creates a new RequestContext from a normalized request and the host context
    pub fn new(request: NormalizedRequest, context: Context) -> Self {
        Self { request: Arc::new(request), context: Arc::new(context) }
    }

    /// Returns the shared normalized request
    pub fn request(&self) -> &Arc<NormalizedRequest> {
        &self.request
    }

    /// Returns the shared host context
    pub fn context(&self) -> &Arc<Context> {
        &self.context
    }

    /// Returns the HTTP method of the request
    pub fn method(&self) -> &Method {
        self.request.method()
    }

    /// Returns the raw request path
    pub fn path(&self) -> &str {
        self.request.path()
    }

    /// Returns the HTTP headers of the request
    pub fn headers(&self) -> &HeaderMap {
        self.request.headers()
    }
}
