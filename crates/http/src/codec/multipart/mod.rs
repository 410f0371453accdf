//! `multipart/*` body codec.
//!
//! - [`MultipartDecoder`] splits a complete body into [`BodyPart`]s given the request's content type
//! - [`MultipartEncoder`] builds `multipart/form-data` bodies
//! - [`Encoding`] selects how part content is turned into text
//!
//! Parts keep their headers and content as raw bytes; text is produced on demand.

mod body_part;
pub use body_part::BodyPart;
pub use body_part::PartHeaders;

mod decoder;
pub use decoder::MultipartDecoder;
pub use decoder::MultipartSource;
pub use decoder::decode;

mod encoder;
pub use encoder::MultipartEncoder;

mod encoding;
pub use encoding::Encoding;

mod error;
pub use error::MultipartError;
