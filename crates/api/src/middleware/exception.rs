use std::error::Error;
use std::fmt::Write;

use lambda_api_http::protocol::{HttpException, Response};
use tracing::error;

use crate::decorator::Decorator;
use crate::dependency::DependencyRegistry;
use crate::error::BoxError;
use crate::handler::RequestHandler;
use crate::request::RequestContext;

/// Converts every error escaping the wrapped handler into a response.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExceptionTranslator;

/// The handler produced by [`ExceptionTranslator`]; it never returns `Err`.
#[derive(Debug)]
pub struct TranslatedHandler<H> {
    handler: H,
}

impl<H: RequestHandler> Decorator<H> for ExceptionTranslator {
    type Out = TranslatedHandler<H>;

    fn decorate(&self, raw: H) -> Self::Out {
        TranslatedHandler { handler: raw }
    }
}

impl<H: RequestHandler> RequestHandler for TranslatedHandler<H> {
    fn invoke(&self, req: &RequestContext, registry: &mut DependencyRegistry) -> Result<Response, BoxError> {
        Ok(self.handler.invoke(req, registry).unwrap_or_else(translate))
    }
}

/// Turns an error into the response it answers with.
///
/// An [`HttpException`] answers with its own status, body and headers. Anything else is logged with its
/// whole source chain and answered with a generic `500 Internal Server Error`.
pub fn translate(error: BoxError) -> Response {
    match error.downcast::<HttpException>() {
        Ok(exception) => Response::from(*exception),
        Err(error) => {
            error!(cause = %chain(&*error), "unhandled error");
            Response::internal_error()
        }
    }
}

fn chain(error: &(dyn Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let _ = write!(message, ": {cause}");
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BindError;
    use http::StatusCode;
    use lambda_api_http::codec::multipart::MultipartError;
    use lambda_api_http::protocol::{Body, INTERNAL_ERROR};

    #[test]
    fn structured_errors_keep_status() {
        let response = translate(Box::new(HttpException::not_found("no such item")));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.body(), &Body::from("no such item"));
    }

    #[test]
    fn other_errors_are_hidden() {
        let response = translate(Box::new(std::io::Error::other("password=hunter2")));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body(), &Body::from(INTERNAL_ERROR));
    }

    #[test]
    fn chain_includes_sources() {
        let source = MultipartError::missing_boundary("multipart/form-data");
        let expected = format!(": {source}");
        let error = BindError::Multipart { name: "upload".into(), source };
        let message = chain(&error);
        assert!(message.starts_with("cannot decode multipart body for upload"));
        assert!(message.ends_with(&expected));
    }
}
