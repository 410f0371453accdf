//! The dispatch entry point a serverless host calls.
//!
//! An [`Api`] owns the router, the composed middleware chain and the event adapter. The host hands it the
//! raw event and its invocation context, together with the [`DependencyRegistry`] it keeps for the life of
//! the process, and returns the [`SerializedResponse`] to the caller. Nothing escapes `dispatch`: event
//! shape errors answer 400, and errors raised by middleware are translated once more at this boundary.

use std::sync::Arc;

use lambda_api_http::protocol::{AutoDetect, Context, EventAdapter, HttpException, NormalizedRequest, Response, SerializedResponse};
use serde_json::Value;
use tracing::warn;

use crate::dependency::DependencyRegistry;
use crate::error::ApiBuildError;
use crate::handler::{BoxedHandler, RequestHandler};
use crate::middleware::{Middleware, MiddlewareChain, translate};
use crate::request::RequestContext;
use crate::router::Router;

pub struct ApiBuilder {
    router: Option<Router>,
    middlewares: MiddlewareChain,
    adapter: Box<dyn EventAdapter>,
}

impl ApiBuilder {
    fn new() -> Self {
        Self { router: None, middlewares: MiddlewareChain::new(), adapter: Box::new(AutoDetect) }
    }

    pub fn router(mut self, router: Router) -> Self {
        self.router = Some(router);
        self
    }

    /// Appends a middleware; the first one appended is the outermost layer
    pub fn middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middlewares.push(middleware);
        self
    }

    /// Sets how raw events are normalized, [`AutoDetect`] by default
    pub fn adapter(mut self, adapter: impl EventAdapter + 'static) -> Self {
        self.adapter = Box::new(adapter);
        self
    }

    pub fn build(self) -> Result<Api, ApiBuildError> {
        let router = Arc::new(self.router.ok_or(ApiBuildError::MissingRouter)?);
        let handler = self.middlewares.compose(Box::new(Arc::clone(&router)));
        Ok(Api { router, handler, adapter: self.adapter })
    }
}

pub struct Api {
    router: Arc<Router>,
    handler: BoxedHandler,
    adapter: Box<dyn EventAdapter>,
}

impl Api {
    pub fn builder() -> ApiBuilder {
        ApiBuilder::new()
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Dispatches one raw host event.
    pub fn dispatch(&self, event: &Value, context: impl Into<Context>, registry: &mut DependencyRegistry) -> SerializedResponse {
        let response = match self.adapter.normalize(event) {
            Ok(request) => self.dispatch_request(request, context.into(), registry),
            Err(e) => {
                warn!(cause = %e, "cannot normalize event");
                Response::from(HttpException::from(e))
            }
        };
        response.serialize()
    }

    /// Dispatches an already normalized request through the middleware chain and the router.
    pub fn dispatch_request(&self, request: NormalizedRequest, context: Context, registry: &mut DependencyRegistry) -> Response {
        let req = RequestContext::new(request, context);
        self.handler.invoke(&req, registry).unwrap_or_else(translate)
    }
}

impl std::fmt::Debug for ApiBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiBuilder").field("router", &self.router).field("middlewares", &self.middlewares).finish_non_exhaustive()
    }
}

impl std::fmt::Debug for Api {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Api").field("router", &self.router).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decorator::{decorator_fn, stack};
    use crate::dependency::Dependency;
    use crate::error::BindError;
    use crate::extract::UploadFile;
    use crate::handler::{handler_fn, request_handler_fn};
    use crate::middleware::{AuthMiddleware, CorsMiddleware};
    use crate::param::Param;
    use crate::response::ResponseHandle;
    use http::StatusCode;
    use indoc::indoc;
    use lambda_api_http::codec::base64;
    use lambda_api_http::protocol::{INTERNAL_ERROR, UNKNOWN_PATH};
    use serde::Deserialize;
    use serde_json::json;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Deserialize)]
    struct NewItem {
        name: String,
    }

    fn v1_event(method: &str, path: &str, body: Option<&str>) -> Value {
        json!({
            "httpMethod": method,
            "path": path,
            "queryStringParameters": null,
            "headers": { "origin": "http://localhost:3001" },
            "body": body,
            "isBase64Encoded": false
        })
    }

    fn router() -> Router {
        let mut router = Router::new();
        router
            .get("/items/{id}", handler_fn([Param::int("id")], |args| Ok::<_, BindError>(json!({ "id": args.get::<i64>("id")? }))))
            .unwrap();
        router
            .post("/items", handler_fn([Param::body::<NewItem>("item"), Param::response("response")], |args| {
                let item = args.object::<NewItem>("item")?;
                args.get::<ResponseHandle>("response")?.set_status(StatusCode::CREATED);
                Ok::<_, BindError>(json!({ "name": item.name }))
            }))
            .unwrap();
        router
            .post("/upload", handler_fn([Param::file("upload")], |args| {
                let file = args.get::<UploadFile>("upload")?;
                Ok::<_, BindError>(format!("{}:{}", file.filename(), file.len()))
            }))
            .unwrap();
        router.get("/boom", handler_fn([], |_args| Err::<(), _>(std::io::Error::other("boom")))).unwrap();
        router
    }

    fn api() -> Api {
        Api::builder().router(router()).middleware(CorsMiddleware::default()).build().unwrap()
    }

    #[test]
    fn missing_router() {
        assert!(matches!(Api::builder().build(), Err(ApiBuildError::MissingRouter)));
    }

    #[test]
    fn dispatch_typed_path() {
        let response = api().dispatch(&v1_event("GET", "/items/42", None), json!({}), &mut DependencyRegistry::new());

        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, r#"{"id":42}"#);
        assert_eq!(response.headers["content-type"], "application/json");
        assert_eq!(response.headers["access-control-allow-origin"], "http://localhost:3001");
    }

    #[test]
    fn dispatch_unknown_path() {
        for method in ["GET", "POST", "PUT", "PATCH", "DELETE"] {
            let response = api().dispatch(&v1_event(method, "/nothing/here", None), json!({}), &mut DependencyRegistry::new());
            assert_eq!(response.status_code, 404);
            assert_eq!(response.body, UNKNOWN_PATH);
        }
    }

    #[test]
    fn dispatch_structured_body() {
        let api = api();
        let mut registry = DependencyRegistry::new();

        let response = api.dispatch(&v1_event("POST", "/items", Some(r#"{"name":"apple"}"#)), json!({}), &mut registry);
        assert_eq!(response.status_code, 201);
        assert_eq!(response.body, r#"{"name":"apple"}"#);

        let response = api.dispatch(&v1_event("POST", "/items", Some(r#"{"title":"apple"}"#)), json!({}), &mut registry);
        assert_eq!(response.status_code, 400);
        assert!(response.body.contains("missing field `name`"));
    }

    #[test]
    fn dispatch_upload() {
        let body = indoc! {r#"
            --frontier
            Content-Disposition: form-data; name="upload"; filename="notes.txt"
            Content-Type: text/plain

            hello world
            --frontier--
        "#}
        .replace('\n', "\r\n");
        let event = json!({
            "httpMethod": "POST",
            "path": "/upload",
            "headers": { "content-type": "multipart/form-data; boundary=frontier" },
            "body": base64::encode(body.as_bytes()),
            "isBase64Encoded": true
        });

        let response = api().dispatch(&event, json!({}), &mut DependencyRegistry::new());
        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, "notes.txt:11");
    }

    #[test]
    fn upload_without_filename() {
        let body = indoc! {r#"
            --frontier
            Content-Disposition: form-data; name="upload"

            hello world
            --frontier--
        "#}
        .replace('\n', "\r\n");
        let event = json!({
            "httpMethod": "POST",
            "path": "/upload",
            "headers": { "content-type": "multipart/form-data; boundary=frontier" },
            "body": body,
        });

        let response = api().dispatch(&event, json!({}), &mut DependencyRegistry::new());
        assert_eq!(response.status_code, 500);
        assert_eq!(response.body, INTERNAL_ERROR);
    }

    #[test]
    fn unhandled_handler_error() {
        let response = api().dispatch(&v1_event("GET", "/boom", None), json!({}), &mut DependencyRegistry::new());
        assert_eq!(response.status_code, 500);
        assert_eq!(response.body, INTERNAL_ERROR);
        assert_eq!(response.headers["access-control-allow-origin"], "http://localhost:3001");
    }

    #[test]
    fn unrecognized_event() {
        let response = api().dispatch(&json!({ "source": "aws.events" }), json!({}), &mut DependencyRegistry::new());
        assert_eq!(response.status_code, 400);
    }

    #[test]
    fn middleware_errors_are_translated() {
        let api = Api::builder()
            .router(router())
            .middleware(decorator_fn(|_inner: BoxedHandler| -> BoxedHandler {
                Box::new(request_handler_fn(|_req, _registry| Err(std::io::Error::other("middleware failed").into())))
            }))
            .build()
            .unwrap();

        let response = api.dispatch(&v1_event("GET", "/items/1", None), json!({}), &mut DependencyRegistry::new());
        assert_eq!(response.status_code, 500);
        assert_eq!(response.body, INTERNAL_ERROR);
    }

    #[test]
    fn auth_rejects_before_routing() {
        let api = Api::builder()
            .router(router())
            .middleware(CorsMiddleware::default())
            .middleware(AuthMiddleware::new(|req| req.headers().contains_key(http::header::AUTHORIZATION)))
            .build()
            .unwrap();

        let response = api.dispatch(&v1_event("GET", "/items/1", None), json!({}), &mut DependencyRegistry::new());
        assert_eq!(response.status_code, 401);
        assert_eq!(response.body, "Unauthorized request");
        assert_eq!(response.headers["access-control-allow-origin"], "http://localhost:3001");
    }

    #[test]
    fn stacked_middleware() {
        let api = Api::builder()
            .router(router())
            .middleware(stack(
                CorsMiddleware::default(),
                AuthMiddleware::new(|req| req.headers().contains_key(http::header::AUTHORIZATION)),
            ))
            .build()
            .unwrap();

        let response = api.dispatch(&v1_event("GET", "/items/1", None), json!({}), &mut DependencyRegistry::new());
        assert_eq!(response.status_code, 401);
        assert_eq!(response.headers["access-control-allow-origin"], "http://localhost:3001");
    }

    #[test]
    fn cached_dependency_across_dispatches() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&calls);
        let config = Dependency::new("config", [], move |_args| {
            counted.fetch_add(1, Ordering::SeqCst);
            Ok::<_, Infallible>(String::from("eu-west-1"))
        })
        .cached();

        let mut router = Router::new();
        router
            .get("/region", handler_fn([Param::depends("config", &config)], |args| {
                Ok::<_, BindError>(args.object::<String>("config")?.as_str().to_owned())
            }))
            .unwrap();
        let api = Api::builder().router(router).build().unwrap();

        let mut registry = DependencyRegistry::new();
        for _ in 0..3 {
            let response = api.dispatch(&v1_event("GET", "/region", None), json!({}), &mut registry);
            assert_eq!(response.body, "eu-west-1");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        registry.set_override(&config, || Ok::<_, Infallible>(String::from("test-region")));
        let response = api.dispatch(&v1_event("GET", "/region", None), json!({}), &mut registry);
        assert_eq!(response.body, "test-region");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn v2_events() {
        let event = json!({
            "version": "2.0",
            "rawPath": "/items/7",
            "rawQueryString": "",
            "requestContext": { "http": { "method": "GET" } },
            "headers": {},
            "isBase64Encoded": false
        });

        let response = api().dispatch(&event, json!({ "aws_request_id": "abc" }), &mut DependencyRegistry::new());
        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, r#"{"id":7}"#);
    }
}
