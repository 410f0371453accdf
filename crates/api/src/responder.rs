//! Turning handler results into the dispatch response.
//!
//! This module provides the [`Responder`] trait which defines how a handler's return value is applied to
//! the response the router seeded with the route's success status. Falsy results (unit, `None`, an empty
//! string, JSON `null`) leave the body untouched, so a handler that only mutates its injected response
//! can simply return `()`.

use bytes::Bytes;
use http::StatusCode;
use lambda_api_http::protocol::{Body, Response};
use serde::Serialize;
use tracing::error;

/// A trait for types a handler can return.
pub trait Responder {
    fn respond_to(self, response: &mut Response);
}

impl Responder for () {
    fn respond_to(self, _response: &mut Response) {}
}

impl Responder for Body {
    fn respond_to(self, response: &mut Response) {
        if !self.is_empty() {
            response.set_body(self);
        }
    }
}

impl Responder for String {
    fn respond_to(self, response: &mut Response) {
        Body::Text(self).respond_to(response);
    }
}

impl Responder for &'static str {
    fn respond_to(self, response: &mut Response) {
        Body::from(self).respond_to(response);
    }
}

impl Responder for serde_json::Value {
    fn respond_to(self, response: &mut Response) {
        Body::Json(self).respond_to(response);
    }
}

impl Responder for Bytes {
    fn respond_to(self, response: &mut Response) {
        Body::Binary(self).respond_to(response);
    }
}

/// Implementation for Option allows handlers to answer with nothing. `None` keeps the body as is.
impl<T: Responder> Responder for Option<T> {
    fn respond_to(self, response: &mut Response) {
        if let Some(responder) = self {
            responder.respond_to(response);
        }
    }
}

/// Implementation for (StatusCode, T) tuple allows overriding the route's success status.
impl<T: Responder> Responder for (StatusCode, T) {
    fn respond_to(self, response: &mut Response) {
        let (status, responder) = self;
        response.set_status(status);
        responder.respond_to(response);
    }
}

/// A pre-built response replaces the seeded one entirely.
impl Responder for Response {
    fn respond_to(self, response: &mut Response) {
        *response = self;
    }
}

/// Serializes any `Serialize` value as a JSON body.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

impl<T: Serialize> Responder for Json<T> {
    fn respond_to(self, response: &mut Response) {
        match serde_json::to_value(&self.0) {
            Ok(value) => value.respond_to(response),
            Err(e) => {
                error!(cause = %e, "failed to serialize handler result");
                *response = Response::internal_error();
            }
        }
    }
}
