//! Cross origin resource sharing headers.
//!
//! Responses from credentialed requests may not use the `*` wildcard as allowed origin, so the middleware
//! echoes the caller's origin when it is allowed and answers with an empty origin otherwise.

use std::sync::Arc;

use http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN, REFERER,
};
use http::{HeaderMap, HeaderValue, Uri};
use lambda_api_http::protocol::Response;
use tracing::{debug, warn};

use crate::decorator::Decorator;
use crate::dependency::DependencyRegistry;
use crate::error::BoxError;
use crate::handler::RequestHandler;
use crate::request::RequestContext;

const DEFAULT_ORIGINS: [&str; 2] = ["http://localhost:3001", "https://d391wccgyuzfh3.cloudfront.net"];
const DEFAULT_METHODS: &str = "GET,OPTIONS,POST,PUT,PATCH,DELETE";
const DEFAULT_HEADERS: &str = "Content-Type,X-Amz-Date,Authorization,X-Api-Key,X-Amz-Security-Token";

/// The environment variable [`CorsConfig::from_env`] reads allowed origins from
pub const ALLOWED_ORIGINS_ENV: &str = "CORS_ALLOWED_ORIGINS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsConfig {
    allowed_origins: Vec<String>,
    allowed_methods: String,
    allowed_headers: String,
    allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: DEFAULT_ORIGINS.iter().map(|&origin| origin.to_owned()).collect(),
            allowed_methods: DEFAULT_METHODS.to_owned(),
            allowed_headers: DEFAULT_HEADERS.to_owned(),
            allow_credentials: true,
        }
    }
}

impl CorsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// The defaults, with allowed origins taken from `CORS_ALLOWED_ORIGINS` when it is set
    pub fn from_env() -> Self {
        match std::env::var(ALLOWED_ORIGINS_ENV) {
            Ok(origins) => Self::default().allowed_origins(parse_origins(&origins)),
            Err(_) => Self::default(),
        }
    }

    #[must_use]
    pub fn allowed_origins<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_origins = origins.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn allowed_methods(mut self, methods: impl Into<String>) -> Self {
        self.allowed_methods = methods.into();
        self
    }

    #[must_use]
    pub fn allowed_headers(mut self, headers: impl Into<String>) -> Self {
        self.allowed_headers = headers.into();
        self
    }

    #[must_use]
    pub fn allow_credentials(mut self, allow: bool) -> Self {
        self.allow_credentials = allow;
        self
    }

    /// The origin to answer with: the request origin when allowed, empty otherwise
    pub fn allowed_origin<'a>(&self, origin: &'a str) -> &'a str {
        let allowed = self.allowed_origins.iter().any(|allowed| allowed == "*" || allowed == origin);
        if allowed { origin } else { "" }
    }

    fn headers(&self, origin: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let pairs = [
            (ACCESS_CONTROL_ALLOW_ORIGIN, self.allowed_origin(origin)),
            (ACCESS_CONTROL_ALLOW_METHODS, self.allowed_methods.as_str()),
            (ACCESS_CONTROL_ALLOW_HEADERS, self.allowed_headers.as_str()),
        ];
        for (name, value) in pairs {
            match HeaderValue::from_str(value) {
                Ok(value) => {
                    headers.insert(name, value);
                }
                Err(e) => warn!(header = %name, cause = %e, "skipping invalid cors header"),
            }
        }
        if self.allow_credentials {
            headers.insert(ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
        }
        headers
    }
}

/// Splits a comma separated origin list, dropping blanks
pub fn parse_origins(origins: &str) -> Vec<String> {
    origins.split(',').map(str::trim).filter(|origin| !origin.is_empty()).map(str::to_owned).collect()
}

/// The caller's origin: the `Origin` header, or the scheme and host of the `Referer`
fn request_origin(headers: &HeaderMap) -> Option<String> {
    if let Some(origin) = headers.get(ORIGIN).and_then(|value| value.to_str().ok()) {
        return Some(origin.to_owned());
    }
    let referer = headers.get(REFERER)?.to_str().ok()?.parse::<Uri>().ok()?;
    Some(format!("{}://{}", referer.scheme_str()?, referer.authority()?))
}

/// Adds CORS headers to every response, overriding handler set values of the same name.
#[derive(Debug, Clone, Default)]
pub struct CorsMiddleware {
    config: Arc<CorsConfig>,
}

impl CorsMiddleware {
    pub fn new(config: CorsConfig) -> Self {
        Self { config: Arc::new(config) }
    }
}

#[derive(Debug)]
pub struct CorsHandler<H> {
    handler: H,
    config: Arc<CorsConfig>,
}

impl<H: RequestHandler> Decorator<H> for CorsMiddleware {
    type Out = CorsHandler<H>;

    fn decorate(&self, raw: H) -> Self::Out {
        CorsHandler { handler: raw, config: Arc::clone(&self.config) }
    }
}

impl<H: RequestHandler> RequestHandler for CorsHandler<H> {
    fn invoke(&self, req: &RequestContext, registry: &mut DependencyRegistry) -> Result<Response, BoxError> {
        let origin = request_origin(req.headers()).unwrap_or_default();
        let headers = self.config.headers(&origin);
        debug!(origin = origin.as_str(), "applying cors headers");

        let mut response = self.handler.invoke(req, registry)?;
        for (name, value) in headers {
            if let Some(name) = name {
                response.headers_mut().insert(name, value);
            }
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::MockRequestHandler;
    use http::StatusCode;
    use http::header::CONTENT_TYPE;
    use lambda_api_http::protocol::{Context, NormalizedRequest};

    fn invoke(middleware: &CorsMiddleware, headers: &[(&str, &str)]) -> Response {
        let mut inner = MockRequestHandler::new();
        inner.expect_invoke().returning(|_, _| {
            let mut response = Response::with_body(StatusCode::OK, "ok");
            response.headers_mut().insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("GET"));
            response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
            Ok(response)
        });

        let mut builder = NormalizedRequest::builder();
        for (name, value) in headers {
            builder = builder.header(name, value).unwrap();
        }
        let req = RequestContext::new(builder.build(), Context::default());
        middleware.decorate(inner).invoke(&req, &mut DependencyRegistry::new()).unwrap()
    }

    #[test]
    fn allowed_origin_is_echoed() {
        let response = invoke(&CorsMiddleware::default(), &[("origin", "http://localhost:3001")]);

        let headers = response.headers();
        assert_eq!(headers.get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "http://localhost:3001");
        assert_eq!(headers.get(ACCESS_CONTROL_ALLOW_METHODS).unwrap(), DEFAULT_METHODS);
        assert_eq!(headers.get(ACCESS_CONTROL_ALLOW_HEADERS).unwrap(), DEFAULT_HEADERS);
        assert_eq!(headers.get(ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(), "true");
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "text/plain");
    }

    #[test]
    fn unknown_origin_is_blank() {
        let response = invoke(&CorsMiddleware::default(), &[("origin", "https://evil.example")]);
        assert_eq!(response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "");

        let response = invoke(&CorsMiddleware::default(), &[]);
        assert_eq!(response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "");
    }

    #[test]
    fn origin_from_referer() {
        let response = invoke(&CorsMiddleware::default(), &[("referer", "https://d391wccgyuzfh3.cloudfront.net/items?page=2")]);
        assert_eq!(response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "https://d391wccgyuzfh3.cloudfront.net");
    }

    #[test]
    fn wildcard_and_credentials() {
        let config = CorsConfig::new().allowed_origins(["*"]).allow_credentials(false);
        let response = invoke(&CorsMiddleware::new(config), &[("origin", "https://any.example")]);

        assert_eq!(response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "https://any.example");
        assert!(response.headers().get(ACCESS_CONTROL_ALLOW_CREDENTIALS).is_none());
    }

    #[test]
    fn parse_origin_list() {
        assert_eq!(parse_origins(" https://a.example, ,https://b.example "), ["https://a.example", "https://b.example"]);
        assert!(parse_origins("").is_empty());
    }
}
