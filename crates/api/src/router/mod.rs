//! Request routing.
//!
//! Routes live in one bucket per HTTP method and are tried in registration order; the first route whose
//! compiled pattern matches the path wins. A broad route registered before a more specific one therefore
//! shadows it:
//!
//! ```
//! use lambda_api::{Param, Router, handler_fn};
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.get("/a/{x}", handler_fn([Param::string("x")], |args| args.get::<String>("x"))).unwrap();
//! router.get("/a/fixed", handler_fn([], |_args| Ok::<_, lambda_api::BoxError>("fixed"))).unwrap();
//!
//! let first = router.routes(&Method::GET).next().unwrap();
//! assert_eq!(first.template(), "/a/{x}");
//! assert_eq!(first.pattern().as_str(), r"^/a/([^/\s]+)$");
//! ```

mod path;

pub use path::PathPattern;

use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use http::{Method, StatusCode};
use lambda_api_http::protocol::Response;
use tracing::{debug, info};

use crate::dependency::DependencyRegistry;
use crate::error::{BindError, BoxError, RouteError};
use crate::extract::{Arguments, Payload, bind, convert};
use crate::handler::{EndpointHandler, RequestHandler};
use crate::param::ParameterSpec;
use crate::request::RequestContext;
use crate::response::ResponseHandle;

/// Main router structure that maps a method and path to a registered handler
#[derive(Default)]
pub struct Router {
    routes: HashMap<Method, Vec<Arc<Route>>>,
}

/// One registered (method, template, handler) triple
pub struct Route {
    method: Method,
    pattern: PathPattern,
    params: Vec<ParameterSpec>,
    status: StatusCode,
    handler: Box<dyn EndpointHandler>,
}

/// The handle returned by registration, usable to inspect or call the route directly
#[derive(Clone)]
pub struct Endpoint {
    route: Arc<Route>,
}

macro_rules! method_route {
    ($name:ident, $method:ident) => {
        #[doc = concat!("Registers a `", stringify!($method), "` route answering with `200 OK` by default")]
        pub fn $name<H: EndpointHandler + 'static>(&mut self, template: &str, handler: H) -> Result<Endpoint, RouteError> {
            self.register(Method::$method, template, handler, StatusCode::OK)
        }
    };
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `method` requests matching `template`.
    ///
    /// Every `{token}` of the template must name a scalar parameter of the handler; those parameters are
    /// bound from the path, every other scalar from the query string.
    pub fn register<H: EndpointHandler + 'static>(
        &mut self,
        method: Method,
        template: &str,
        handler: H,
        status: StatusCode,
    ) -> Result<Endpoint, RouteError> {
        let pattern = PathPattern::compile(template, handler.params())?;
        let params = handler
            .params()
            .iter()
            .cloned()
            .map(|param| if pattern.names().iter().any(|name| name == param.name()) { param.into_path_segment() } else { param })
            .collect();

        info!(%method, path = template, pattern = pattern.as_str(), "registered path");
        let route = Arc::new(Route { method: method.clone(), pattern, params, status, handler: Box::new(handler) });
        self.routes.entry(method).or_default().push(Arc::clone(&route));
        Ok(Endpoint { route })
    }

    method_route!(get, GET);
    method_route!(put, PUT);
    method_route!(post, POST);
    method_route!(patch, PATCH);
    method_route!(delete, DELETE);

    /// Iterates the routes registered for `method` in match order
    pub fn routes(&self, method: &Method) -> impl Iterator<Item = &Route> {
        self.routes.get(method).into_iter().flatten().map(Arc::as_ref)
    }

    /// Dispatches a request to the first matching route.
    ///
    /// An unknown method or path is answered with `404 Unknown path`; binding failures and handler errors
    /// are returned for the middleware chain to translate.
    pub fn dispatch(&self, req: &RequestContext, registry: &mut DependencyRegistry) -> Result<Response, BoxError> {
        let path = req.path();
        let matched = self
            .routes(req.method())
            .find_map(|route| route.pattern.captures(path).map(|captures| (route, captures)));

        match matched {
            Some((route, captures)) => {
                info!(method = %req.method(), path, route = route.template(), "matched route");
                route.handle(req, captures, registry)
            }
            None => {
                info!(method = %req.method(), path, "unknown path");
                Ok(Response::not_found())
            }
        }
    }
}

impl RequestHandler for Router {
    fn invoke(&self, req: &RequestContext, registry: &mut DependencyRegistry) -> Result<Response, BoxError> {
        self.dispatch(req, registry)
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.routes.iter().map(|(method, routes)| (method, routes.len()))).finish()
    }
}

impl Route {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn template(&self) -> &str {
        self.pattern.template()
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// The handler's parameters, with template tokens typed as path segments
    pub fn params(&self) -> &[ParameterSpec] {
        &self.params
    }

    /// The status the response is seeded with
    pub fn status(&self) -> StatusCode {
        self.status
    }

    fn param(&self, name: &str) -> Option<&ParameterSpec> {
        self.params.iter().find(|param| param.name() == name)
    }

    fn handle(
        &self,
        req: &RequestContext,
        captures: Vec<(&str, &str)>,
        registry: &mut DependencyRegistry,
    ) -> Result<Response, BoxError> {
        let query = req.request().query().iter().map(|(name, value)| (name.as_str(), value.as_str()));

        // query values are applied after the captures and win on a name clash
        let mut supplied = HashMap::new();
        for (name, raw) in captures.into_iter().chain(query) {
            match self.param(name).and_then(|param| param.kind().value_type()) {
                Some(value_type) => {
                    let argument = convert(name, value_type, raw).map_err(BindError::into_dispatch_error)?;
                    supplied.insert(name.to_owned(), argument);
                }
                None => debug!(param = name, route = self.template(), "ignoring undeclared parameter"),
            }
        }

        let response = ResponseHandle::new(Response::new(self.status));
        let payload = Payload::new(req.request(), req.context(), &response);
        let mut args = bind(&self.params, supplied, &payload, registry).map_err(BindError::into_dispatch_error)?;
        self.handler.call(&mut args, &response)?;
        Ok(response.take())
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .field("params", &self.params)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl Endpoint {
    /// Calls the handler with caller supplied arguments, bypassing routing.
    ///
    /// Supplied arguments are taken as they are; every other declared parameter is bound against `req` the
    /// way a dispatch binds it, so defaults, dependencies, the body and a fresh response seeded with the
    /// route's status are filled in.
    pub fn invoke(
        &self,
        args: Arguments,
        req: &RequestContext,
        registry: &mut DependencyRegistry,
    ) -> Result<Response, BoxError> {
        let mut supplied = args.into_iter().collect::<HashMap<_, _>>();
        let missing = self
            .route
            .params
            .iter()
            .filter(|param| !supplied.contains_key(param.name()))
            .cloned()
            .collect::<Vec<_>>();

        let response = ResponseHandle::new(Response::new(self.route.status));
        let payload = Payload::new(req.request(), req.context(), &response);
        let mut bound = bind(&missing, HashMap::new(), &payload, registry).map_err(BindError::into_dispatch_error)?;

        let mut args = Arguments::new();
        for param in &self.route.params {
            let argument = match supplied.remove(param.name()) {
                Some(argument) => argument,
                None => bound
                    .take(param.name())
                    .ok_or_else(|| BindError::missing_argument(param.name()).into_dispatch_error())?,
            };
            args.insert(param.name(), argument);
        }
        for (name, argument) in supplied {
            args.insert(name, argument);
        }

        self.route.handler.call(&mut args, &response)?;
        Ok(response.take())
    }
}

impl Deref for Endpoint {
    type Target = Route;

    fn deref(&self) -> &Route {
        &self.route
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.route, f)
    }
}
