//! Request routing, parameter binding and dependency injection for serverless http handlers.
//!
//! A handler declares its parameters up front; the [`Router`] matches the request against the registered
//! route templates, converts path and query values to the declared types, resolves dependencies through the
//! caller's [`DependencyRegistry`], and applies the handler's result to the response. Middleware wrap the
//! router's dispatch, and the [`Api`] turns raw host events into serialized responses.
//!
//! # Example
//!
//! ```
//! use lambda_api::{Api, BindError, DependencyRegistry, Param, Router, handler_fn};
//! use serde_json::json;
//!
//! let mut router = Router::new();
//! router
//!     .get("/items/{id}", handler_fn([Param::int("id"), Param::string("view").default("short")], |args| {
//!         let id = args.get::<i64>("id")?;
//!         let view = args.get::<String>("view")?;
//!         Ok::<_, BindError>(json!({ "id": id, "view": view }))
//!     }))
//!     .unwrap();
//!
//! let api = Api::builder().router(router).build().unwrap();
//! let mut registry = DependencyRegistry::new();
//!
//! let event = json!({ "httpMethod": "GET", "path": "/items/42", "headers": {} });
//! let response = api.dispatch(&event, json!({}), &mut registry);
//! assert_eq!(response.status_code, 200);
//! assert_eq!(response.body, r#"{"id":42,"view":"short"}"#);
//! ```
//!
//! # Architecture
//!
//! - [`param`]: parameter declarations
//! - [`router`]: path compilation, route registration and dispatch
//! - [`extract`]: bound arguments and the parameter binder
//! - [`dependency`]: dependencies, their cache and overrides
//! - [`middleware`]: the middleware chain, the exception translator, CORS and auth
//! - [`decorator`]: the static decorator abstraction middleware build on

mod api;
mod error;
mod handler;
mod request;
mod responder;
mod response;

pub mod decorator;
pub mod dependency;
pub mod extract;
pub mod middleware;
pub mod param;
pub mod router;

pub use api::Api;
pub use api::ApiBuilder;
pub use dependency::Dependency;
pub use dependency::DependencyRegistry;
pub use error::ApiBuildError;
pub use error::BindError;
pub use error::BoxError;
pub use error::RouteError;
pub use extract::Argument;
pub use extract::Arguments;
pub use extract::UploadFile;
pub use handler::BoxedHandler;
pub use handler::EndpointHandler;
pub use handler::FnHandler;
pub use handler::FnRequestHandler;
pub use handler::RequestHandler;
pub use handler::handler_fn;
pub use handler::request_handler_fn;
pub use param::Param;
pub use param::ParameterKind;
pub use param::ParameterSpec;
pub use param::ValueType;
pub use request::RequestContext;
pub use responder::Json;
pub use responder::Responder;
pub use response::ResponseHandle;
pub use router::Endpoint;
pub use router::Route;
pub use router::Router;

pub use lambda_api_http::protocol::{Body, Context, HttpException, NormalizedRequest, Response, SerializedResponse};
