use std::any::Any;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::HeaderMap;
use lambda_api_http::protocol::{Context, NormalizedRequest};

use crate::error::BindError;
use crate::response::ResponseHandle;

/// One bound parameter value.
#[derive(Clone)]
pub enum Argument {
    /// An absent optional value
    None,
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Bytes),
    Headers(HeaderMap),
    Context(Arc<Context>),
    Event(Arc<NormalizedRequest>),
    File(UploadFile),
    Response(ResponseHandle),
    /// A dependency result or a parsed body model
    Object(Arc<dyn Any + Send + Sync>),
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::None => f.write_str("None"),
            Argument::Int(v) => f.debug_tuple("Int").field(v).finish(),
            Argument::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Argument::Str(v) => f.debug_tuple("Str").field(v).finish(),
            Argument::Bytes(v) => f.debug_tuple("Bytes").field(v).finish(),
            Argument::Headers(v) => f.debug_tuple("Headers").field(v).finish(),
            Argument::Context(v) => f.debug_tuple("Context").field(v).finish(),
            Argument::Event(v) => f.debug_tuple("Event").field(v).finish(),
            Argument::File(v) => f.debug_tuple("File").field(v).finish(),
            Argument::Response(_) => f.write_str("Response(..)"),
            Argument::Object(_) => f.write_str("Object(..)"),
        }
    }
}

macro_rules! argument_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Argument {
                fn from(value: $ty) -> Self {
                    Argument::$variant(value.into())
                }
            }
        )*
    };
}

argument_from! {
    i64 => Int,
    i32 => Int,
    u32 => Int,
    f64 => Float,
    f32 => Float,
    String => Str,
    &str => Str,
    Bytes => Bytes,
    HeaderMap => Headers,
    UploadFile => File,
    ResponseHandle => Response,
}

/// The upload a file parameter binds to: the first part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    filename: String,
    content_type: Option<String>,
    content: Bytes,
}

impl UploadFile {
    pub fn new(filename: impl Into<String>, content_type: Option<String>, content: Bytes) -> Self {
        Self { filename: filename.into(), content_type, content }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// The part's own `Content-Type`, when it declared one
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Types a bound [`Argument`] can be read back as.
///
/// Every implementation also accepts an [`Argument::Object`] holding the type itself, so a dependency
/// returning, say, an `i64` can feed an integer parameter.
pub trait FromArgument: Sized {
    /// The name reported when the argument has another type
    const EXPECTED: &'static str;

    fn from_argument(argument: &Argument) -> Option<Self>;
}

fn downcast<T: Clone + 'static>(argument: &Argument) -> Option<T> {
    match argument {
        Argument::Object(object) => object.downcast_ref::<T>().cloned(),
        _ => None,
    }
}

macro_rules! from_argument {
    ($ty:ty, $expected:literal, $($pattern:pat => $value:expr),+ $(,)?) => {
        impl FromArgument for $ty {
            const EXPECTED: &'static str = $expected;

            fn from_argument(argument: &Argument) -> Option<Self> {
                match argument {
                    $($pattern => $value,)+
                    other => downcast::<$ty>(other),
                }
            }
        }
    };
}

from_argument!(i64, "integer", Argument::Int(v) => Some(*v));
from_argument!(i32, "integer", Argument::Int(v) => i32::try_from(*v).ok());
from_argument!(u64, "integer", Argument::Int(v) => u64::try_from(*v).ok());
from_argument!(f64, "float", Argument::Float(v) => Some(*v));
from_argument!(String, "string", Argument::Str(v) => Some(v.clone()));
from_argument!(Bytes, "bytes", Argument::Bytes(v) => Some(v.clone()));
from_argument!(HeaderMap, "headers", Argument::Headers(v) => Some(v.clone()));
from_argument!(Arc<Context>, "context", Argument::Context(v) => Some(Arc::clone(v)));
from_argument!(Arc<NormalizedRequest>, "event", Argument::Event(v) => Some(Arc::clone(v)));
from_argument!(UploadFile, "file", Argument::File(v) => Some(v.clone()));
from_argument!(ResponseHandle, "response", Argument::Response(v) => Some(v.clone()));

impl<T: FromArgument> FromArgument for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn from_argument(argument: &Argument) -> Option<Self> {
        match argument {
            Argument::None => Some(None),
            other => T::from_argument(other).map(Some),
        }
    }
}

impl FromArgument for Argument {
    const EXPECTED: &'static str = "argument";

    fn from_argument(argument: &Argument) -> Option<Self> {
        Some(argument.clone())
    }
}

/// The bound arguments of one handler or dependency call, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    values: Vec<(String, Argument)>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an argument, replacing a previous value of the same name
    pub fn insert(&mut self, name: impl Into<String>, argument: impl Into<Argument>) {
        let name = name.into();
        let argument = argument.into();
        match self.values.iter_mut().find(|(key, _)| *key == name) {
            Some((_, slot)) => *slot = argument,
            None => self.values.push((name, argument)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, argument: impl Into<Argument>) -> Self {
        self.insert(name, argument);
        self
    }

    pub fn raw(&self, name: &str) -> Option<&Argument> {
        self.values.iter().find(|(key, _)| key == name).map(|(_, argument)| argument)
    }

    /// Removes an argument, returning it
    pub fn take(&mut self, name: &str) -> Option<Argument> {
        let index = self.values.iter().position(|(key, _)| key == name)?;
        Some(self.values.remove(index).1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.raw(name).is_some()
    }

    /// Reads an argument as `T`
    pub fn get<T: FromArgument>(&self, name: &str) -> Result<T, BindError> {
        let argument = self.raw(name).ok_or_else(|| BindError::missing_argument(name))?;
        T::from_argument(argument).ok_or_else(|| BindError::type_mismatch(name, T::EXPECTED))
    }

    /// Reads a dependency result or parsed body model
    pub fn object<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>, BindError> {
        match self.raw(name) {
            Some(Argument::Object(object)) => Arc::clone(object)
                .downcast::<T>()
                .map_err(|_object| BindError::type_mismatch(name, std::any::type_name::<T>())),
            Some(_) => Err(BindError::type_mismatch(name, std::any::type_name::<T>())),
            None => Err(BindError::missing_argument(name)),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Argument)> {
        self.values.iter().map(|(name, argument)| (name.as_str(), argument))
    }
}

impl IntoIterator for Arguments {
    type Item = (String, Argument);
    type IntoIter = std::vec::IntoIter<(String, Argument)>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Client {
        region: String,
    }

    #[test]
    fn read_scalars() {
        let args = Arguments::new().with("id", 42).with("price", 9.5).with("name", "apple");

        assert_eq!(args.get::<i64>("id").unwrap(), 42);
        assert_eq!(args.get::<i32>("id").unwrap(), 42);
        assert!((args.get::<f64>("price").unwrap() - 9.5).abs() < f64::EPSILON);
        assert_eq!(args.get::<String>("name").unwrap(), "apple");
    }

    #[test]
    fn read_optional() {
        let args = Arguments::new().with("page", Argument::None).with("size", 10);
        assert_eq!(args.get::<Option<i64>>("page").unwrap(), None);
        assert_eq!(args.get::<Option<i64>>("size").unwrap(), Some(10));
    }

    #[test]
    fn type_mismatch_and_missing() {
        let args = Arguments::new().with("name", "apple");
        assert!(matches!(args.get::<i64>("name"), Err(BindError::TypeMismatch { .. })));
        assert!(matches!(args.get::<i64>("id"), Err(BindError::MissingArgument { .. })));
    }

    #[test]
    fn read_objects() {
        let client = Arc::new(Client { region: "eu-west-1".into() }) as Arc<dyn Any + Send + Sync>;
        let args = Arguments::new().with("client", Argument::Object(client)).with("limit", Argument::Object(Arc::new(5i64)));

        assert_eq!(args.object::<Client>("client").unwrap().region, "eu-west-1");
        assert!(args.object::<String>("client").is_err());
        assert_eq!(args.get::<i64>("limit").unwrap(), 5);
    }

    #[test]
    fn insert_replaces() {
        let mut args = Arguments::new().with("id", 1);
        args.insert("id", 2);
        assert_eq!(args.len(), 1);
        assert_eq!(args.get::<i64>("id").unwrap(), 2);
    }
}
