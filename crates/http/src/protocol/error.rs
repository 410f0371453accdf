use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use thiserror::Error;

use crate::codec::base64::Base64Error;
use crate::protocol::Body;

/// A structured http error carrying the exact status and body to answer with.
///
/// Handlers and dependencies raise it (usually through `?` into a boxed error) to end a dispatch with a
/// chosen response. The exception translator recognises it and turns it into a response verbatim; every
/// other error becomes a generic internal error.
#[derive(Error, Debug, Clone)]
#[error("http exception {status}: {body}")]
pub struct HttpException {
    status: StatusCode,
    body: Body,
    headers: HeaderMap,
}

impl HttpException {
    pub fn new(status: StatusCode, body: impl Into<Body>) -> Self {
        Self { status, body: body.into(), headers: HeaderMap::new() }
    }

    pub fn bad_request(body: impl Into<Body>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, body)
    }

    pub fn unauthorized(body: impl Into<Body>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, body)
    }

    pub fn forbidden(body: impl Into<Body>) -> Self {
        Self::new(StatusCode::FORBIDDEN, body)
    }

    pub fn not_found(body: impl Into<Body>) -> Self {
        Self::new(StatusCode::NOT_FOUND, body)
    }

    pub fn internal(body: impl Into<Body>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, body)
    }

    /// Adds a header to the response this exception turns into.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub(crate) fn into_parts(self) -> (StatusCode, HeaderMap, Body) {
        (self.status, self.headers, self.body)
    }
}

/// Errors raised while turning a raw host event into a [`NormalizedRequest`](crate::protocol::NormalizedRequest).
#[derive(Error, Debug)]
pub enum EventError {
    #[error("unrecognized event shape: {reason}")]
    UnrecognizedShape { reason: String },

    #[error("invalid http method {method}: {reason}")]
    InvalidMethod { method: String, reason: String },

    #[error("invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("invalid query string: {reason}")]
    InvalidQuery { reason: String },

    #[error("invalid body encoding: {source}")]
    InvalidBody {
        #[from]
        source: Base64Error,
    },
}

impl EventError {
    pub fn unrecognized_shape<S: ToString>(str: S) -> Self {
        Self::UnrecognizedShape { reason: str.to_string() }
    }

    pub fn invalid_method<M: ToString, S: ToString>(method: M, str: S) -> Self {
        Self::InvalidMethod { method: method.to_string(), reason: str.to_string() }
    }

    pub fn invalid_header<N: ToString, S: ToString>(name: N, str: S) -> Self {
        Self::InvalidHeader { name: name.to_string(), reason: str.to_string() }
    }

    pub fn invalid_query<S: ToString>(str: S) -> Self {
        Self::InvalidQuery { reason: str.to_string() }
    }
}

/// An event the adapter cannot understand is the caller's fault: it becomes a 400 carrying the reason.
impl From<EventError> for HttpException {
    fn from(error: EventError) -> Self {
        HttpException::bad_request(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exception_display() {
        let exception = HttpException::not_found("no such item");
        assert_eq!(exception.to_string(), "http exception 404 Not Found: no such item");
        assert_eq!(exception.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn event_error_is_bad_request() {
        let exception = HttpException::from(EventError::unrecognized_shape("missing field `httpMethod`"));
        assert_eq!(exception.status(), StatusCode::BAD_REQUEST);
        assert_eq!(exception.body(), &Body::from("unrecognized event shape: missing field `httpMethod`"));
    }
}
