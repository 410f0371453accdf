//! Outgoing response handling implementation.
//!
//! A [`Response`] is created by the router at the start of a dispatch, seeded with the route's declared
//! success status. Handlers (which may receive it as a parameter) and middleware mutate it, and at the
//! end of the dispatch it is turned into the [`SerializedResponse`] the host expects.

use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};

use crate::codec::base64;
use crate::protocol::HttpException;

/// The body returned when no route matches.
pub const UNKNOWN_PATH: &str = "Unknown path";

/// The body returned for every unhandled error.
pub const INTERNAL_ERROR: &str = "Internal Server Error";

/// The response body, opaque until serialization.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Body {
    #[default]
    Empty,
    Text(String),
    Json(serde_json::Value),
    Binary(Bytes),
}

impl Body {
    pub fn is_empty(&self) -> bool {
        match self {
            Body::Empty => true,
            Body::Text(text) => text.is_empty(),
            Body::Json(value) => value.is_null(),
            Body::Binary(bytes) => bytes.is_empty(),
        }
    }

    /// The content type implied by the body kind, used when the response carries none
    fn default_content_type(&self) -> Option<&'static str> {
        match self {
            Body::Empty => None,
            Body::Text(_) => Some("text/plain; charset=utf-8"),
            Body::Json(_) => Some("application/json"),
            Body::Binary(_) => Some("application/octet-stream"),
        }
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Empty => Ok(()),
            Body::Text(text) => f.write_str(text),
            Body::Json(value) => write!(f, "{value}"),
            Body::Binary(bytes) => write!(f, "<{} bytes>", bytes.len()),
        }
    }
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Body::Text(value)
    }
}

impl From<&str> for Body {
    fn from(value: &str) -> Self {
        Body::Text(value.to_owned())
    }
}

impl From<serde_json::Value> for Body {
    fn from(value: serde_json::Value) -> Self {
        Body::Json(value)
    }
}

impl From<Bytes> for Body {
    fn from(value: Bytes) -> Self {
        Body::Binary(value)
    }
}

impl From<Vec<u8>> for Body {
    fn from(value: Vec<u8>) -> Self {
        Body::Binary(Bytes::from(value))
    }
}

impl From<()> for Body {
    fn from(_: ()) -> Self {
        Body::Empty
    }
}

/// The outgoing result of one dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Body,
    is_base64_encoded: bool,
}

impl Default for Response {
    fn default() -> Self {
        Self::new(StatusCode::OK)
    }
}

impl Response {
    /// Creates an empty response with the given status.
    pub fn new(status: StatusCode) -> Self {
        Self { status, headers: HeaderMap::new(), body: Body::Empty, is_base64_encoded: false }
    }

    pub fn with_body(status: StatusCode, body: impl Into<Body>) -> Self {
        let mut response = Self::new(status);
        response.set_body(body);
        response
    }

    /// The fixed answer for a method and path no route matches.
    pub fn not_found() -> Self {
        Self::with_body(StatusCode::NOT_FOUND, UNKNOWN_PATH)
    }

    /// The fixed answer for an unhandled error; the cause never reaches the body.
    pub fn internal_error() -> Self {
        Self::with_body(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Replaces the body. A binary body marks the response as base64 encoded, any other body clears the mark.
    pub fn set_body(&mut self, body: impl Into<Body>) {
        self.body = body.into();
        self.is_base64_encoded = matches!(self.body, Body::Binary(_));
    }

    pub fn is_base64_encoded(&self) -> bool {
        self.is_base64_encoded
    }

    /// Marks a text body as already base64 encoded by the handler.
    pub fn set_base64_encoded(&mut self, encoded: bool) {
        self.is_base64_encoded = encoded;
    }

    /// Turns the response into the shape the host runtime expects.
    pub fn serialize(self) -> SerializedResponse {
        let mut headers = BTreeMap::new();
        for name in self.headers.keys() {
            let values = self
                .headers
                .get_all(name)
                .iter()
                .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
                .collect::<Vec<_>>();
            headers.insert(name.as_str().to_owned(), values.join(", "));
        }

        if !self.headers.contains_key(CONTENT_TYPE)
            && let Some(content_type) = self.body.default_content_type()
        {
            headers.insert(CONTENT_TYPE.as_str().to_owned(), content_type.to_owned());
        }

        let (body, is_base64_encoded) = match self.body {
            Body::Empty => (String::new(), false),
            Body::Text(text) => (text, self.is_base64_encoded),
            Body::Json(value) => (value.to_string(), false),
            Body::Binary(bytes) => (base64::encode(&bytes), true),
        };

        SerializedResponse { status_code: self.status.as_u16(), headers, body, is_base64_encoded }
    }
}

/// A structured error becomes a response with its exact status, headers and body.
impl From<HttpException> for Response {
    fn from(exception: HttpException) -> Self {
        let (status, headers, body) = exception.into_parts();
        let mut response = Response::with_body(status, body);
        response.headers = headers;
        response
    }
}

/// The wire shape of a response, as serverless http hosts expect it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub is_base64_encoded: bool,
}
