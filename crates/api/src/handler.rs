use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use lambda_api_http::protocol::Response;

use crate::dependency::DependencyRegistry;
use crate::error::BoxError;
use crate::extract::Arguments;
use crate::param::ParameterSpec;
use crate::request::RequestContext;
use crate::responder::Responder;
use crate::response::ResponseHandle;

/// Anything that turns a request into a response: the router, and every middleware layer around it.
#[cfg_attr(test, mockall::automock)]
pub trait RequestHandler: Send + Sync {
    fn invoke(&self, req: &RequestContext, registry: &mut DependencyRegistry) -> Result<Response, BoxError>;
}

pub type BoxedHandler = Box<dyn RequestHandler>;

impl RequestHandler for Box<dyn RequestHandler> {
    fn invoke(&self, req: &RequestContext, registry: &mut DependencyRegistry) -> Result<Response, BoxError> {
        (**self).invoke(req, registry)
    }
}

impl<T: RequestHandler + ?Sized> RequestHandler for Arc<T> {
    fn invoke(&self, req: &RequestContext, registry: &mut DependencyRegistry) -> Result<Response, BoxError> {
        (**self).invoke(req, registry)
    }
}

/// a closure holder which acts as a [`RequestHandler`]
pub struct FnRequestHandler<F> {
    f: F,
}

pub fn request_handler_fn<F>(f: F) -> FnRequestHandler<F>
where
    F: Fn(&RequestContext, &mut DependencyRegistry) -> Result<Response, BoxError> + Send + Sync,
{
    FnRequestHandler { f }
}

impl<F> RequestHandler for FnRequestHandler<F>
where
    F: Fn(&RequestContext, &mut DependencyRegistry) -> Result<Response, BoxError> + Send + Sync,
{
    fn invoke(&self, req: &RequestContext, registry: &mut DependencyRegistry) -> Result<Response, BoxError> {
        (self.f)(req, registry)
    }
}

impl<F> fmt::Debug for FnRequestHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnRequestHandler").finish_non_exhaustive()
    }
}

/// The user function behind a route: its declared parameters and how to call it with them bound.
pub trait EndpointHandler: Send + Sync {
    fn params(&self) -> &[ParameterSpec];

    /// Calls the function and applies its result to `response`
    fn call(&self, args: &mut Arguments, response: &ResponseHandle) -> Result<(), BoxError>;
}

/// a closure holder with its parameter declaration
pub struct FnHandler<F, Out> {
    params: Vec<ParameterSpec>,
    f: F,
    _phantom: PhantomData<fn() -> Out>,
}

/// Declares a handler from its parameters and a closure reading the bound [`Arguments`].
///
/// The closure's `Ok` value is applied to the response through [`Responder`]; its `Err` is raised to the
/// middleware chain, where an [`HttpException`](lambda_api_http::protocol::HttpException) answers with
/// its own status and anything else becomes a 500.
pub fn handler_fn<P, F, R, E>(params: P, f: F) -> FnHandler<F, (R, E)>
where
    P: IntoIterator<Item = ParameterSpec>,
    F: Fn(&mut Arguments) -> Result<R, E> + Send + Sync,
    R: Responder,
    E: Into<BoxError>,
{
    FnHandler { params: params.into_iter().collect(), f, _phantom: PhantomData }
}

impl<F, R, E> EndpointHandler for FnHandler<F, (R, E)>
where
    F: Fn(&mut Arguments) -> Result<R, E> + Send + Sync,
    R: Responder,
    E: Into<BoxError>,
{
    fn params(&self) -> &[ParameterSpec] {
        &self.params
    }

    fn call(&self, args: &mut Arguments, response: &ResponseHandle) -> Result<(), BoxError> {
        let responder = (self.f)(args).map_err(Into::<BoxError>::into)?;
        response.with(|response| responder.respond_to(response));
        Ok(())
    }
}

impl<F, Out> fmt::Debug for FnHandler<F, Out> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").field("params", &self.params).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BindError;
    use crate::param::Param;
    use http::{Method, StatusCode};
    use lambda_api_http::protocol::{Body, Context, HttpException, NormalizedRequest};

    fn assert_is_endpoint<T: EndpointHandler>(_handler: &T) {
        // no op
    }

    #[test]
    fn fn_handler_applies_result() {
        let handler = handler_fn([Param::int("id")], |args| {
            let id = args.get::<i64>("id")?;
            Ok::<_, BindError>(format!("item {id}"))
        });
        assert_is_endpoint(&handler);
        assert_eq!(handler.params()[0].name(), "id");

        let response = ResponseHandle::new(Response::new(StatusCode::CREATED));
        handler.call(&mut Arguments::new().with("id", 3), &response).unwrap();

        let response = response.take();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.body(), &Body::from("item 3"));
    }

    #[test]
    fn fn_handler_raises_errors() {
        let handler = handler_fn([], |_args| Err::<(), _>(HttpException::not_found("no such item")));

        let error = handler.call(&mut Arguments::new(), &ResponseHandle::default()).unwrap_err();
        assert_eq!(error.downcast_ref::<HttpException>().unwrap().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn boxed_and_shared_handlers_delegate() {
        let mut mock = MockRequestHandler::new();
        mock.expect_invoke().times(2).returning(|_, _| Ok(Response::new(StatusCode::ACCEPTED)));

        let shared = Arc::new(mock);
        let boxed: BoxedHandler = Box::new(Arc::clone(&shared));
        let req = RequestContext::new(NormalizedRequest::new(Method::GET, "/"), Context::default());
        let mut registry = DependencyRegistry::new();

        assert_eq!(boxed.invoke(&req, &mut registry).unwrap().status(), StatusCode::ACCEPTED);
        assert_eq!(shared.invoke(&req, &mut registry).unwrap().status(), StatusCode::ACCEPTED);
    }

    #[test]
    fn closure_request_handler() {
        let handler = request_handler_fn(|req, _registry| Ok(Response::with_body(StatusCode::OK, req.path().to_owned())));
        let req = RequestContext::new(NormalizedRequest::new(Method::GET, "/ping"), Context::default());

        let response = handler.invoke(&req, &mut DependencyRegistry::new()).unwrap();
        assert_eq!(response.body(), &Body::from("/ping"));
    }
}
