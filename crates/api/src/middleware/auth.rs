use std::fmt;
use std::sync::Arc;

use http::StatusCode;
use lambda_api_http::protocol::Response;
use tracing::info;

use crate::decorator::Decorator;
use crate::dependency::DependencyRegistry;
use crate::error::BoxError;
use crate::handler::RequestHandler;
use crate::request::RequestContext;

pub const UNAUTHORIZED: &str = "Unauthorized request";

type Predicate = dyn Fn(&RequestContext) -> bool + Send + Sync;

/// Rejects requests the predicate does not authorize with `401 Unauthorized request`.
#[derive(Clone)]
pub struct AuthMiddleware {
    is_authorized: Arc<Predicate>,
}

impl AuthMiddleware {
    pub fn new<F>(is_authorized: F) -> Self
    where
        F: Fn(&RequestContext) -> bool + Send + Sync + 'static,
    {
        Self { is_authorized: Arc::new(is_authorized) }
    }
}

impl fmt::Debug for AuthMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthMiddleware").finish_non_exhaustive()
    }
}

pub struct AuthHandler<H> {
    handler: H,
    is_authorized: Arc<Predicate>,
}

impl<H: RequestHandler> Decorator<H> for AuthMiddleware {
    type Out = AuthHandler<H>;

    fn decorate(&self, raw: H) -> Self::Out {
        AuthHandler { handler: raw, is_authorized: Arc::clone(&self.is_authorized) }
    }
}

impl<H: RequestHandler> RequestHandler for AuthHandler<H> {
    fn invoke(&self, req: &RequestContext, registry: &mut DependencyRegistry) -> Result<Response, BoxError> {
        if !(self.is_authorized)(req) {
            info!(method = %req.method(), path = req.path(), "unauthorized request");
            return Ok(Response::with_body(StatusCode::UNAUTHORIZED, UNAUTHORIZED));
        }
        self.handler.invoke(req, registry)
    }
}

impl<H: fmt::Debug> fmt::Debug for AuthHandler<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthHandler").field("handler", &self.handler).finish_non_exhaustive()
    }
}
