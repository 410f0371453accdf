//! Binding request data to declared handler parameters.
//!
//! Handlers and dependencies never see the request directly. They declare their parameters with
//! [`Param`](crate::Param) and receive the bound [`Arguments`], read back by name:
//!
//! ```
//! use lambda_api::extract::Arguments;
//!
//! let args = Arguments::new().with("id", 42).with("q", "apples");
//! assert_eq!(args.get::<i64>("id").unwrap(), 42);
//! assert_eq!(args.get::<String>("q").unwrap(), "apples");
//! assert!(args.get::<i64>("q").is_err());
//! ```

mod arguments;
mod binder;

pub use arguments::Argument;
pub use arguments::Arguments;
pub use arguments::FromArgument;
pub use arguments::UploadFile;
pub use binder::Payload;
pub use binder::bind;

pub(crate) use binder::bind_dependency;
pub(crate) use binder::convert;
