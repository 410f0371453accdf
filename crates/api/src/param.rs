//! Handler parameter declarations.
//!
//! A handler states up front which parameters it takes and where each one comes from. The declaration is
//! a list of [`ParameterSpec`]s, built with the [`Param`] constructors:
//!
//! ```
//! use lambda_api::{Dependency, Param};
//!
//! let db = Dependency::new("db", [], |_args| Ok::<_, std::convert::Infallible>("connection"));
//!
//! let params = [
//!     Param::int("id"),                  // `{id}` in the path, or `?id=` in the query
//!     Param::string("sort").default("asc"),
//!     Param::depends("db", &db),
//!     Param::response("response"),
//! ];
//! assert_eq!(params[1].name(), "sort");
//! ```
//!
//! Scalar parameters start out as query parameters; the router turns the ones named by a `{token}` of the
//! route template into path segments when the route is registered.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::dependency::Dependency;
use crate::extract::Argument;

/// The target type of a path or query value, each with the pattern a path segment must match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Integer,
    Float,
    String,
}

impl ValueType {
    /// The regex fragment matching one value of this type inside a path
    pub fn pattern(self) -> &'static str {
        match self {
            ValueType::Integer => r"[0-9]+",
            ValueType::Float => r"[0-9]+(?:\.[0-9]*)?",
            ValueType::String => r"[^/\s]+",
        }
    }

    /// Converts a raw path or query value, `None` when it does not parse as this type
    pub fn convert(self, raw: &str) -> Option<Argument> {
        match self {
            ValueType::Integer => raw.parse::<i64>().ok().map(Argument::Int),
            ValueType::Float => raw.parse::<f64>().ok().map(Argument::Float),
            ValueType::String => Some(Argument::Str(raw.to_owned())),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::String => "string",
        })
    }
}

type ParseFn = dyn Fn(&[u8]) -> Result<Arc<dyn Any + Send + Sync>, String> + Send + Sync;

/// A structured body type: the raw body is parsed and validated into it as JSON.
#[derive(Clone)]
pub struct BodyModel {
    type_name: &'static str,
    parse: Arc<ParseFn>,
}

impl BodyModel {
    pub fn of<T: DeserializeOwned + Send + Sync + 'static>() -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            parse: Arc::new(|bytes| {
                serde_json::from_slice::<T>(bytes)
                    .map(|model| Arc::new(model) as Arc<dyn Any + Send + Sync>)
                    .map_err(|e| e.to_string())
            }),
        }
    }

    /// Parses a raw body, the error carries the validator's message
    pub fn parse(&self, bytes: &[u8]) -> Result<Arc<dyn Any + Send + Sync>, String> {
        (self.parse)(bytes)
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for BodyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodyModel").field("type_name", &self.type_name).finish_non_exhaustive()
    }
}

/// Where a parameter's value comes from.
#[derive(Debug, Clone)]
pub enum ParameterKind {
    /// A `{token}` of the route template
    PathSegment(ValueType),
    /// A query string entry
    QueryParam(ValueType),
    /// The raw request body bytes
    RawBody,
    /// The request body parsed into a model
    StructuredBody(BodyModel),
    /// The first part of a multipart body, with its filename
    File,
    Headers,
    /// The host's invocation context
    Context,
    /// The whole normalized request
    Event,
    /// The response under construction
    InjectableResponse,
    Dependency(Dependency),
}

impl ParameterKind {
    /// The scalar type of a path or query parameter
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            ParameterKind::PathSegment(value_type) | ParameterKind::QueryParam(value_type) => Some(*value_type),
            _ => None,
        }
    }
}

/// The value a parameter takes when the request supplies none.
#[derive(Debug, Clone)]
pub enum DefaultValue {
    Value(Argument),
    /// Resolved through the dependency registry once everything else is bound
    Dependency(Dependency),
}

/// One declared handler parameter.
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    name: String,
    kind: ParameterKind,
    default: Option<DefaultValue>,
}

/// Shorthand for building [`ParameterSpec`]s.
pub type Param = ParameterSpec;

impl ParameterSpec {
    pub fn new(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self { name: name.into(), kind, default: None }
    }

    pub fn scalar(name: impl Into<String>, value_type: ValueType) -> Self {
        Self::new(name, ParameterKind::QueryParam(value_type))
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::scalar(name, ValueType::Integer)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::scalar(name, ValueType::Float)
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::scalar(name, ValueType::String)
    }

    pub fn raw_body(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::RawBody)
    }

    pub fn body<T: DeserializeOwned + Send + Sync + 'static>(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::StructuredBody(BodyModel::of::<T>()))
    }

    pub fn file(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::File)
    }

    pub fn headers(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::Headers)
    }

    pub fn context(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::Context)
    }

    pub fn event(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::Event)
    }

    pub fn response(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::InjectableResponse)
    }

    pub fn depends(name: impl Into<String>, dependency: &Dependency) -> Self {
        Self::new(name, ParameterKind::Dependency(dependency.clone()))
    }

    /// Sets the value used when the request does not supply one
    pub fn default(mut self, value: impl Into<Argument>) -> Self {
        self.default = Some(DefaultValue::Value(value.into()));
        self
    }

    /// Makes the parameter optional, absent values bind as [`Argument::None`]
    pub fn optional(self) -> Self {
        self.default(Argument::None)
    }

    /// Takes the default from a dependency, resolved only when the request does not supply a value
    pub fn default_from(mut self, dependency: &Dependency) -> Self {
        self.default = Some(DefaultValue::Dependency(dependency.clone()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &ParameterKind {
        &self.kind
    }

    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    /// Turns a query parameter into a path segment, used by the router for template tokens
    pub(crate) fn into_path_segment(mut self) -> Self {
        if let ParameterKind::QueryParam(value_type) = self.kind {
            self.kind = ParameterKind::PathSegment(value_type);
        }
        self
    }
}
