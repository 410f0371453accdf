use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use http::{HeaderName, HeaderValue, StatusCode};
use lambda_api_http::protocol::{Body, Response};

/// The response under construction, shared between the router and a handler that declares a
/// [`Param::response`](crate::Param::response) parameter.
///
/// The router seeds it with the route's success status before the handler runs and takes it back
/// afterwards, so whatever the handler changes through the handle ends up in the dispatch result.
#[derive(Clone, Default)]
pub struct ResponseHandle {
    inner: Arc<Mutex<Response>>,
}

impl ResponseHandle {
    pub fn new(response: Response) -> Self {
        Self { inner: Arc::new(Mutex::new(response)) }
    }

    fn lock(&self) -> MutexGuard<'_, Response> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn status(&self) -> StatusCode {
        self.lock().status()
    }

    pub fn set_status(&self, status: StatusCode) {
        self.lock().set_status(status);
    }

    pub fn insert_header(&self, name: HeaderName, value: HeaderValue) {
        self.lock().headers_mut().insert(name, value);
    }

    pub fn set_body(&self, body: impl Into<Body>) {
        self.lock().set_body(body);
    }

    /// Runs `f` with exclusive access to the response
    pub fn with<R>(&self, f: impl FnOnce(&mut Response) -> R) -> R {
        f(&mut self.lock())
    }

    /// Takes the response out, leaving an empty one behind
    pub fn take(&self) -> Response {
        std::mem::take(&mut *self.lock())
    }
}

impl fmt::Debug for ResponseHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ResponseHandle").field(&*self.lock()).finish()
    }
}
