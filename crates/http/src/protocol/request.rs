//! Normalized request handling implementation.
//!
//! This module provides the source independent representation of one inbound invocation. Whatever event
//! shape the host delivered, an [`EventAdapter`](crate::protocol::EventAdapter) reduces it to a
//! [`NormalizedRequest`]: method, raw path, query parameters, headers and the raw body bytes. The host's
//! invocation context travels next to it as an opaque [`Context`].

use std::collections::HashMap;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue, Method};

use crate::protocol::EventError;

/// One inbound call, independent of the source event shape.
///
/// A request is created once per dispatch and is read-only afterwards.
#[derive(Debug, Clone)]
pub struct NormalizedRequest {
    method: Method,
    path: String,
    query: HashMap<String, String>,
    headers: HeaderMap,
    body: Bytes,
}

impl NormalizedRequest {
    /// Creates a request with the given method and path and no query, headers or body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), query: HashMap::new(), headers: HeaderMap::new(), body: Bytes::new() }
    }

    pub fn builder() -> NormalizedRequestBuilder {
        NormalizedRequestBuilder::new()
    }

    /// Returns the HTTP method of the request
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the raw path, exactly as the host delivered it
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the query parameters, one value per name
    pub fn query(&self) -> &HashMap<String, String> {
        &self.query
    }

    /// Returns the HTTP headers of the request
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the raw body bytes, empty when the event carried no body
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the `content-type` header when present and valid ascii
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|value| value.to_str().ok())
    }
}

/// Builder for [`NormalizedRequest`], used by the event adapters and by tests.
#[derive(Debug)]
pub struct NormalizedRequestBuilder {
    method: Method,
    path: String,
    query: HashMap<String, String>,
    headers: HeaderMap,
    body: Bytes,
}

impl NormalizedRequestBuilder {
    fn new() -> Self {
        Self { method: Method::GET, path: "/".into(), query: HashMap::new(), headers: HeaderMap::new(), body: Bytes::new() }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn queries<I, K, V>(mut self, queries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query.extend(queries.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Appends a header, failing when the name or value is not a valid http header.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self, EventError> {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| EventError::invalid_header(name, e))?;
        let header_value = HeaderValue::from_str(value).map_err(|e| EventError::invalid_header(name, e))?;
        self.headers.append(header_name, header_value);
        Ok(self)
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn build(self) -> NormalizedRequest {
        NormalizedRequest {
            method: self.method,
            path: self.path,
            query: self.query,
            headers: self.headers,
            body: self.body,
        }
    }
}

/// The host's opaque invocation context.
///
/// The framework never interprets it beyond a couple of well known lambda fields; handlers that declare a
/// context parameter receive it as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    data: serde_json::Value,
}

impl Context {
    pub fn new(data: serde_json::Value) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &serde_json::Value {
        &self.data
    }

    /// The lambda request id, when the host supplied one
    pub fn request_id(&self) -> Option<&str> {
        self.data.get("aws_request_id").or_else(|| self.data.get("awsRequestId")).and_then(|v| v.as_str())
    }

    /// The invoked function's name, when the host supplied one
    pub fn function_name(&self) -> Option<&str> {
        self.data.get("function_name").or_else(|| self.data.get("functionName")).and_then(|v| v.as_str())
    }
}

impl From<serde_json::Value> for Context {
    fn from(data: serde_json::Value) -> Self {
        Self::new(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn build_request() {
        let request = NormalizedRequest::builder()
            .method(Method::POST)
            .path("/items/7/")
            .query("verbose", "true")
            .header("Content-Type", "application/json")
            .unwrap()
            .body(r#"{"name":"apple"}"#)
            .build();

        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.path(), "/items/7/");
        assert_eq!(request.query().get("verbose").map(String::as_str), Some("true"));
        assert_eq!(request.content_type(), Some("application/json"));
        assert_eq!(request.body().as_ref(), br#"{"name":"apple"}"#);
    }

    #[test]
    fn reject_invalid_header_name() {
        let result = NormalizedRequest::builder().header("bad header", "x");
        assert!(matches!(result, Err(EventError::InvalidHeader { .. })));
    }

    #[test]
    fn context_fields() {
        let context = Context::new(json!({ "aws_request_id": "abc-123", "functionName": "items" }));
        assert_eq!(context.request_id(), Some("abc-123"));
        assert_eq!(context.function_name(), Some("items"));
        assert_eq!(Context::default().request_id(), None);
    }
}
