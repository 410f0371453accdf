//! Event adapters turning raw host events into [`NormalizedRequest`]s.
//!
//! A serverless host delivers each invocation as a JSON document whose shape depends on the trigger. The
//! adapters in this module understand the two API Gateway payload formats:
//!
//! - [`ApiGatewayV1`]: REST APIs and payload format 1.0 (`httpMethod`, `path`, `queryStringParameters`)
//! - [`ApiGatewayV2`]: HTTP APIs and payload format 2.0 (`requestContext.http.method`, `rawPath`,
//!   `rawQueryString`)
//! - [`AutoDetect`]: picks one of the above from the event's `version` field
//!
//! Bodies flagged with `isBase64Encoded` are decoded, so a [`NormalizedRequest`] always carries raw bytes.

use std::collections::HashMap;

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::Deserialize;
use tracing::trace;

use crate::codec::base64;
use crate::protocol::{EventError, NormalizedRequest};

/// Reduces one raw event shape to a [`NormalizedRequest`].
pub trait EventAdapter: Send + Sync {
    fn normalize(&self, event: &serde_json::Value) -> Result<NormalizedRequest, EventError>;
}

/// Adapter for API Gateway REST events (payload format 1.0).
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiGatewayV1;

/// Adapter for API Gateway HTTP API events (payload format 2.0).
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiGatewayV2;

/// Adapter choosing between [`ApiGatewayV1`] and [`ApiGatewayV2`] per event.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoDetect;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct V1Event {
    http_method: String,
    path: String,
    #[serde(default)]
    query_string_parameters: Option<HashMap<String, String>>,
    #[serde(default)]
    headers: Option<HashMap<String, String>>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    is_base64_encoded: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct V2Event {
    raw_path: String,
    #[serde(default)]
    raw_query_string: String,
    request_context: V2RequestContext,
    #[serde(default)]
    headers: Option<HashMap<String, String>>,
    #[serde(default)]
    cookies: Option<Vec<String>>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    is_base64_encoded: bool,
}

#[derive(Deserialize)]
struct V2RequestContext {
    http: V2Http,
}

#[derive(Deserialize)]
struct V2Http {
    method: String,
}

impl EventAdapter for ApiGatewayV1 {
    fn normalize(&self, event: &serde_json::Value) -> Result<NormalizedRequest, EventError> {
        let event = V1Event::deserialize(event).map_err(EventError::unrecognized_shape)?;
        trace!(method = %event.http_method, path = %event.path, "normalizing rest api event");

        let request = NormalizedRequest::builder()
            .method(parse_method(&event.http_method)?)
            .path(event.path)
            .queries(event.query_string_parameters.unwrap_or_default())
            .headers(parse_headers(event.headers.unwrap_or_default(), None)?)
            .body(parse_body(event.body, event.is_base64_encoded)?)
            .build();
        Ok(request)
    }
}

impl EventAdapter for ApiGatewayV2 {
    fn normalize(&self, event: &serde_json::Value) -> Result<NormalizedRequest, EventError> {
        let event = V2Event::deserialize(event).map_err(EventError::unrecognized_shape)?;
        let method = &event.request_context.http.method;
        trace!(method = %method, path = %event.raw_path, "normalizing http api event");

        let query = serde_urlencoded::from_str::<Vec<(String, String)>>(&event.raw_query_string)
            .map_err(EventError::invalid_query)?;

        let request = NormalizedRequest::builder()
            .method(parse_method(method)?)
            .path(event.raw_path)
            .queries(query)
            .headers(parse_headers(event.headers.unwrap_or_default(), event.cookies)?)
            .body(parse_body(event.body, event.is_base64_encoded)?)
            .build();
        Ok(request)
    }
}

impl EventAdapter for AutoDetect {
    fn normalize(&self, event: &serde_json::Value) -> Result<NormalizedRequest, EventError> {
        match event.get("version").and_then(serde_json::Value::as_str) {
            Some("2.0") => ApiGatewayV2.normalize(event),
            _ => ApiGatewayV1.normalize(event),
        }
    }
}

fn parse_method(method: &str) -> Result<Method, EventError> {
    Method::from_bytes(method.to_ascii_uppercase().as_bytes()).map_err(|e| EventError::invalid_method(method, e))
}

fn parse_headers(headers: HashMap<String, String>, cookies: Option<Vec<String>>) -> Result<HeaderMap, EventError> {
    let mut header_map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| EventError::invalid_header(&name, e))?;
        let header_value = HeaderValue::from_str(&value).map_err(|e| EventError::invalid_header(&name, e))?;
        header_map.append(header_name, header_value);
    }

    // payload 2.0 moves cookies out of the headers
    if let Some(cookies) = cookies.filter(|cookies| !cookies.is_empty()) {
        let joined = cookies.join("; ");
        let value = HeaderValue::from_str(&joined).map_err(|e| EventError::invalid_header("cookie", e))?;
        header_map.insert(http::header::COOKIE, value);
    }

    Ok(header_map)
}

fn parse_body(body: Option<String>, is_base64_encoded: bool) -> Result<Bytes, EventError> {
    match body {
        None => Ok(Bytes::new()),
        Some(body) if is_base64_encoded => Ok(Bytes::from(base64::decode(&body)?)),
        Some(body) => Ok(Bytes::from(body)),
    }
}
