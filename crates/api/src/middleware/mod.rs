//! Middleware around the router's dispatch.
//!
//! A middleware wraps the handler it is given and returns a new handler; the [`MiddlewareChain`] builds the
//! final handler out of the router and every registered middleware:
//!
//! ```text
//! first registered ─▶ second registered ─▶ ... ─▶ ExceptionTranslator ─▶ Router::dispatch
//! ```
//!
//! The first registered middleware is the outermost layer: it sees the request first and the response
//! last. The [`ExceptionTranslator`] always sits innermost, so every middleware observes handler failures
//! as ordinary responses. Errors raised by a middleware itself travel outwards to its caller.
//!
//! Any [`Decorator`] over [`BoxedHandler`] producing a handler is a middleware, including closures adapted
//! with [`decorator_fn`](crate::decorator::decorator_fn), layers combined with [`stack`], and a whole
//! [`MiddlewareChain`].

mod auth;
mod cors;
mod exception;

pub use auth::AuthHandler;
pub use auth::AuthMiddleware;
pub use cors::CorsConfig;
pub use cors::CorsHandler;
pub use cors::CorsMiddleware;
pub use exception::ExceptionTranslator;
pub use exception::TranslatedHandler;
pub use exception::translate;

use std::fmt;

use crate::decorator::{Decorator, stack};
use crate::handler::{BoxedHandler, RequestHandler};

/// An object safe handler transform, the unit the chain is built from.
pub trait Middleware: Send + Sync {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler;
}

impl<D> Middleware for D
where
    D: Decorator<BoxedHandler> + Send + Sync,
    D::Out: RequestHandler + 'static,
{
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Box::new(self.decorate(next))
    }
}

/// The registered middleware, in registration order.
#[derive(Default)]
pub struct MiddlewareChain {
    middlewares: Vec<Box<dyn Middleware>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a middleware; it becomes the innermost user layer so far
    pub fn push<M: Middleware + 'static>(&mut self, middleware: M) {
        self.middlewares.push(Box::new(middleware));
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Wraps `dispatch` with the exception translator and then every middleware.
    pub fn compose(&self, dispatch: BoxedHandler) -> BoxedHandler {
        stack(self, ExceptionTranslator).decorate(dispatch)
    }
}

/// Applies the user layers only, so a chain can itself be registered as one middleware of another.
impl<H: RequestHandler + 'static> Decorator<H> for MiddlewareChain {
    type Out = BoxedHandler;

    fn decorate(&self, raw: H) -> BoxedHandler {
        let raw: BoxedHandler = Box::new(raw);
        self.middlewares.iter().rev().fold(raw, |next, middleware| middleware.wrap(next))
    }
}

impl fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareChain").field("len", &self.middlewares.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decorator::decorator_fn;
    use crate::dependency::DependencyRegistry;
    use crate::handler::{MockRequestHandler, request_handler_fn};
    use crate::request::RequestContext;
    use http::{HeaderValue, Method, StatusCode};
    use lambda_api_http::protocol::{Body, Context, HttpException, INTERNAL_ERROR, NormalizedRequest, Response};
    use std::sync::{Arc, Mutex};

    fn recording(name: &'static str, log: &Arc<Mutex<Vec<String>>>) -> impl Decorator<BoxedHandler, Out = BoxedHandler> + Send + Sync + 'static {
        let log = Arc::clone(log);
        decorator_fn(move |inner: BoxedHandler| -> BoxedHandler {
            let log = Arc::clone(&log);
            Box::new(request_handler_fn(move |req, registry| {
                log.lock().unwrap().push(format!("{name} in"));
                let response = inner.invoke(req, registry);
                log.lock().unwrap().push(format!("{name} out"));
                response
            }))
        })
    }

    fn request() -> RequestContext {
        RequestContext::new(NormalizedRequest::new(Method::GET, "/items"), Context::default())
    }

    #[test]
    fn first_registered_is_outermost() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = MiddlewareChain::new();
        chain.push(recording("first", &log));
        chain.push(recording("second", &log));
        assert_eq!(chain.len(), 2);

        let mut dispatch = MockRequestHandler::new();
        dispatch.expect_invoke().times(1).returning(|_, _| Ok(Response::new(StatusCode::OK)));

        let handler = chain.compose(Box::new(dispatch));
        handler.invoke(&request(), &mut DependencyRegistry::new()).unwrap();

        assert_eq!(*log.lock().unwrap(), ["first in", "second in", "second out", "first out"]);
    }

    #[test]
    fn stacked_layers_register_as_one() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = MiddlewareChain::new();
        chain.push(stack(recording("outer", &log), recording("inner", &log)));
        assert_eq!(chain.len(), 1);

        let mut dispatch = MockRequestHandler::new();
        dispatch.expect_invoke().times(1).returning(|_, _| Ok(Response::new(StatusCode::OK)));

        chain.compose(Box::new(dispatch)).invoke(&request(), &mut DependencyRegistry::new()).unwrap();
        assert_eq!(*log.lock().unwrap(), ["outer in", "inner in", "inner out", "outer out"]);
    }

    #[test]
    fn nested_chain_keeps_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut nested = MiddlewareChain::new();
        nested.push(recording("second", &log));
        nested.push(recording("third", &log));

        let mut chain = MiddlewareChain::new();
        chain.push(recording("first", &log));
        chain.push(nested);

        let mut dispatch = MockRequestHandler::new();
        dispatch.expect_invoke().times(1).returning(|_, _| Ok(Response::new(StatusCode::OK)));

        chain.compose(Box::new(dispatch)).invoke(&request(), &mut DependencyRegistry::new()).unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            ["first in", "second in", "third in", "third out", "second out", "first out"]
        );
    }

    #[test]
    fn middleware_sees_translated_errors() {
        let seen = Arc::new(Mutex::new(None));
        let observed = Arc::clone(&seen);
        let mut chain = MiddlewareChain::new();
        chain.push(decorator_fn(move |inner: BoxedHandler| -> BoxedHandler {
            let observed = Arc::clone(&observed);
            Box::new(request_handler_fn(move |req, registry| {
                let response = inner.invoke(req, registry)?;
                *observed.lock().unwrap() = Some(response.status());
                Ok(response)
            }))
        }));

        let mut dispatch = MockRequestHandler::new();
        dispatch.expect_invoke().returning(|_, _| Err(std::io::Error::other("database unreachable").into()));

        let response = chain.compose(Box::new(dispatch)).invoke(&request(), &mut DependencyRegistry::new()).unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body(), &Body::from(INTERNAL_ERROR));
        assert_eq!(*seen.lock().unwrap(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[test]
    fn middleware_errors_escape_the_chain() {
        let mut chain = MiddlewareChain::new();
        chain.push(decorator_fn(|_inner: BoxedHandler| -> BoxedHandler {
            Box::new(request_handler_fn(|_req, _registry| Err(HttpException::forbidden("blocked").into())))
        }));

        let mut dispatch = MockRequestHandler::new();
        dispatch.expect_invoke().never();

        let error = chain.compose(Box::new(dispatch)).invoke(&request(), &mut DependencyRegistry::new()).unwrap_err();
        assert_eq!(error.downcast_ref::<HttpException>().unwrap().status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn empty_chain_only_translates() {
        let chain = MiddlewareChain::new();
        assert!(chain.is_empty());

        let mut dispatch = MockRequestHandler::new();
        dispatch
            .expect_invoke()
            .returning(|_, _| Err(HttpException::bad_request("bad").with_header(http::header::RETRY_AFTER, HeaderValue::from_static("1")).into()));

        let response = chain.compose(Box::new(dispatch)).invoke(&request(), &mut DependencyRegistry::new()).unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers().get(http::header::RETRY_AFTER).unwrap(), "1");
    }
}
