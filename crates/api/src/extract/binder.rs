//! Parameter binding.
//!
//! Given a declared parameter list and the per-dispatch [`Payload`], the binder produces the
//! [`Arguments`] a handler or dependency is called with. Parameters bind in declaration order:
//!
//! - dependencies are resolved through the registry
//! - request capabilities (raw body, headers, context, event, response) are handed over from the payload
//! - structured bodies are parsed from the raw body, files are decoded from a multipart body
//! - path and query parameters take the values the router already converted, or their declared default
//!
//! Defaults that are themselves dependencies are resolved in a second pass, once everything else is bound.

use std::collections::HashMap;
use std::sync::Arc;

use lambda_api_http::codec::multipart::MultipartDecoder;
use lambda_api_http::protocol::{Context, NormalizedRequest};
use tracing::trace;

use crate::dependency::{Dependency, DependencyRegistry};
use crate::error::BindError;
use crate::extract::{Argument, Arguments, UploadFile};
use crate::param::{DefaultValue, ParameterKind, ParameterSpec, ValueType};
use crate::response::ResponseHandle;

/// Everything one dispatch makes available to binding.
#[derive(Debug, Clone, Copy)]
pub struct Payload<'a> {
    request: &'a Arc<NormalizedRequest>,
    context: &'a Arc<Context>,
    response: &'a ResponseHandle,
}

impl<'a> Payload<'a> {
    pub fn new(request: &'a Arc<NormalizedRequest>, context: &'a Arc<Context>, response: &'a ResponseHandle) -> Self {
        Self { request, context, response }
    }

    pub fn request(&self) -> &'a Arc<NormalizedRequest> {
        self.request
    }

    pub fn context(&self) -> &'a Arc<Context> {
        self.context
    }

    pub fn response(&self) -> &'a ResponseHandle {
        self.response
    }
}

enum Slot {
    Ready(Argument),
    Deferred(Dependency),
}

/// Binds `specs`, taking path and query values from `supplied`.
pub fn bind(
    specs: &[ParameterSpec],
    mut supplied: HashMap<String, Argument>,
    payload: &Payload<'_>,
    registry: &mut DependencyRegistry,
) -> Result<Arguments, BindError> {
    let mut slots = Vec::with_capacity(specs.len());
    for spec in specs {
        let name = spec.name();
        let slot = match spec.kind() {
            ParameterKind::Dependency(dependency) => Slot::Ready(registry.resolve(dependency, payload)?),
            ParameterKind::RawBody => Slot::Ready(Argument::Bytes(payload.request.body().clone())),
            ParameterKind::Headers => Slot::Ready(Argument::Headers(payload.request.headers().clone())),
            ParameterKind::Context => Slot::Ready(Argument::Context(Arc::clone(payload.context))),
            ParameterKind::Event => Slot::Ready(Argument::Event(Arc::clone(payload.request))),
            ParameterKind::InjectableResponse => Slot::Ready(Argument::Response(payload.response.clone())),
            ParameterKind::StructuredBody(model) => {
                let parsed = model
                    .parse(payload.request.body())
                    .map_err(|message| BindError::Validation { name: name.to_owned(), message })?;
                Slot::Ready(Argument::Object(parsed))
            }
            ParameterKind::File => Slot::Ready(Argument::File(upload_file(name, payload.request)?)),
            ParameterKind::PathSegment(_) | ParameterKind::QueryParam(_) => match supplied.remove(name) {
                Some(argument) => Slot::Ready(argument),
                None => match spec.default_value() {
                    Some(DefaultValue::Value(argument)) => Slot::Ready(argument.clone()),
                    Some(DefaultValue::Dependency(dependency)) => Slot::Deferred(dependency.clone()),
                    None => return Err(BindError::missing_argument(name)),
                },
            },
        };
        slots.push((name, slot));
    }

    let mut arguments = Arguments::new();
    for (name, slot) in slots {
        let argument = match slot {
            Slot::Ready(argument) => argument,
            Slot::Deferred(dependency) => {
                trace!(param = name, dependency = dependency.name(), "resolving deferred default");
                registry.resolve(&dependency, payload)?
            }
        };
        arguments.insert(name, argument);
    }
    Ok(arguments)
}

/// Binds a dependency's own parameters; its scalars read the request's query values.
pub(crate) fn bind_dependency(
    specs: &[ParameterSpec],
    payload: &Payload<'_>,
    registry: &mut DependencyRegistry,
) -> Result<Arguments, BindError> {
    let mut supplied = HashMap::new();
    for spec in specs {
        if let Some(value_type) = spec.kind().value_type()
            && let Some(raw) = payload.request.query().get(spec.name())
        {
            supplied.insert(spec.name().to_owned(), convert(spec.name(), value_type, raw)?);
        }
    }
    bind(specs, supplied, payload, registry)
}

/// Converts one raw path or query value to its declared type.
pub(crate) fn convert(name: &str, value_type: ValueType, raw: &str) -> Result<Argument, BindError> {
    value_type.convert(raw).ok_or_else(|| BindError::invalid_value(name, raw, value_type))
}

fn upload_file(name: &str, request: &NormalizedRequest) -> Result<UploadFile, BindError> {
    let decoder = MultipartDecoder::from_response(request)
        .map_err(|source| BindError::Multipart { name: name.to_owned(), source })?;
    let part = decoder
        .into_parts()
        .into_iter()
        .next()
        .ok_or_else(|| BindError::EmptyMultipart { name: name.to_owned() })?;
    let filename = part.filename().ok_or_else(|| BindError::MissingFilename { name: name.to_owned() })?;
    let content_type = part.content_type();
    Ok(UploadFile::new(filename, content_type, part.into_content()))
}
