use lambda_api_http::codec::multipart::MultipartError;
use lambda_api_http::protocol::HttpException;
use thiserror::Error;

use crate::param::ValueType;

/// The erased error handlers, dependencies and middleware fail with.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while registering a route.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("path parameter {name} of {template} is not declared by the handler")]
    MissingPathParameter { template: String, name: String },

    #[error("path parameter {name} of {template} must be an integer, float or string")]
    UnsupportedPathType { template: String, name: String },

    #[error("invalid route pattern for {template}: {reason}")]
    InvalidPattern { template: String, reason: String },
}

/// Errors raised while binding a handler's or a dependency's arguments.
#[derive(Error, Debug)]
pub enum BindError {
    #[error("missing argument {name}")]
    MissingArgument { name: String },

    #[error("invalid {expected} value for {name}: {value}")]
    InvalidValue { name: String, value: String, expected: ValueType },

    #[error("{message}")]
    Validation { name: String, message: String },

    #[error("cannot decode multipart body for {name}: {source}")]
    Multipart {
        name: String,
        #[source]
        source: MultipartError,
    },

    #[error("multipart body for {name} has no parts")]
    EmptyMultipart { name: String },

    #[error("uploaded part for {name} carries no filename")]
    MissingFilename { name: String },

    #[error("argument {name} is not a {expected}")]
    TypeMismatch { name: String, expected: &'static str },

    #[error("dependency {name} failed: {source}")]
    Dependency { name: String, source: BoxError },
}

impl BindError {
    pub fn missing_argument<S: ToString>(name: S) -> Self {
        Self::MissingArgument { name: name.to_string() }
    }

    pub fn invalid_value<N: ToString, V: ToString>(name: N, value: V, expected: ValueType) -> Self {
        Self::InvalidValue { name: name.to_string(), value: value.to_string(), expected }
    }

    pub fn type_mismatch<S: ToString>(name: S, expected: &'static str) -> Self {
        Self::TypeMismatch { name: name.to_string(), expected }
    }

    /// Converts a binding failure into the error a dispatch ends with.
    ///
    /// Bad input becomes a 400 [`HttpException`]; a dependency's own error passes through untouched, so a
    /// structured error raised inside a dependency keeps its status; a missing filename or a mistyped
    /// argument is a handler contract violation and stays an unstructured (500) error.
    pub fn into_dispatch_error(self) -> BoxError {
        match self {
            BindError::Dependency { source, .. } => source,
            BindError::Validation { message, .. } => Box::new(HttpException::bad_request(message)),
            error @ (BindError::MissingFilename { .. } | BindError::TypeMismatch { .. }) => Box::new(error),
            error => Box::new(HttpException::bad_request(error.to_string())),
        }
    }
}

/// Errors raised by [`ApiBuilder::build`](crate::ApiBuilder::build).
#[derive(Error, Debug)]
pub enum ApiBuildError {
    #[error("router must be set")]
    MissingRouter,
}
