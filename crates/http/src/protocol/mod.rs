//! Core protocol abstractions for one serverless http invocation.
//!
//! This module provides the types every other layer speaks: what came in, what goes out, and how a
//! dispatch fails.
//!
//! # Architecture
//!
//! - **Requests** ([`request`]): the source independent inbound call
//!   - [`NormalizedRequest`]: method, raw path, query, headers and raw body bytes
//!   - [`Context`]: the host's opaque invocation context
//!
//! - **Responses** ([`response`]): the mutable outgoing result
//!   - [`Response`]: status, headers and a [`Body`]
//!   - [`SerializedResponse`]: the wire shape handed back to the host
//!
//! - **Errors** ([`error`]):
//!   - [`HttpException`]: a structured error carrying the exact status and body to answer with
//!   - [`EventError`]: a raw event that cannot be normalized
//!
//! - **Event adapters** ([`event`]): [`ApiGatewayV1`], [`ApiGatewayV2`] and [`AutoDetect`] behind the
//!   [`EventAdapter`] trait

mod request;
pub use request::Context;
pub use request::NormalizedRequest;
pub use request::NormalizedRequestBuilder;

mod response;
pub use response::Body;
pub use response::INTERNAL_ERROR;
pub use response::Response;
pub use response::SerializedResponse;
pub use response::UNKNOWN_PATH;

mod error;
pub use error::EventError;
pub use error::HttpException;

mod event;
pub use event::ApiGatewayV1;
pub use event::ApiGatewayV2;
pub use event::AutoDetect;
pub use event::EventAdapter;
