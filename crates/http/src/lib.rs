//! The protocol layer of `lambda-api`.
//!
//! This crate holds everything that describes a single serverless http invocation independently of how it
//! is routed: the normalized inbound request, the outgoing response and its wire shape, the structured
//! error type handlers raise, the adapters turning raw host events into requests, and a byte level
//! `multipart/*` codec used to pull uploaded files out of request bodies.
//!
//! Nothing here performs I/O. A host runtime hands a raw event (a `serde_json::Value`) to an
//! [`EventAdapter`](protocol::EventAdapter), the framework crate dispatches the resulting
//! [`NormalizedRequest`](protocol::NormalizedRequest), and the produced [`Response`](protocol::Response)
//! is turned into a [`SerializedResponse`](protocol::SerializedResponse) for the host.
//!
//! # Example
//!
//! ```
//! use lambda_api_http::protocol::{ApiGatewayV1, EventAdapter, Response};
//! use http::{Method, StatusCode};
//! use serde_json::json;
//!
//! let event = json!({
//!     "httpMethod": "GET",
//!     "path": "/items/42",
//!     "queryStringParameters": { "verbose": "1" },
//!     "headers": { "accept": "application/json" },
//!     "body": null
//! });
//!
//! let request = ApiGatewayV1.normalize(&event).unwrap();
//! assert_eq!(request.method(), &Method::GET);
//! assert_eq!(request.path(), "/items/42");
//! assert_eq!(request.query().get("verbose").map(String::as_str), Some("1"));
//!
//! let serialized = Response::with_body(StatusCode::OK, json!({ "id": 42 })).serialize();
//! assert_eq!(serialized.status_code, 200);
//! assert_eq!(serialized.body, r#"{"id":42}"#);
//! ```
//!
//! # Architecture
//!
//! - [`protocol`]: request, response, error and event adapter types
//! - [`codec`]: the multipart decoder/encoder and base64 helpers

pub mod codec;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
