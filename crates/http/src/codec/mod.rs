//! Byte level codecs for request and response bodies.
//!
//! # Architecture
//!
//! - [`multipart`]: decoding `multipart/*` request bodies into parts, and encoding form data
//!   - [`MultipartDecoder`](multipart::MultipartDecoder): splits a body on its boundary
//!   - [`BodyPart`](multipart::BodyPart): one part's headers and raw content
//! - [`base64`]: the standard alphabet used for binary bodies in host events and responses
//!
//! # Example
//!
//! ```
//! use lambda_api_http::codec::base64;
//! use lambda_api_http::codec::multipart::{MultipartDecoder, MultipartEncoder};
//!
//! let encoder = MultipartEncoder::new("boundary-1").field("greeting", "hello");
//! let body = encoder.encode().unwrap();
//!
//! let decoder = MultipartDecoder::new(body.clone(), &encoder.content_type()).unwrap();
//! assert_eq!(decoder.parts()[0].text().unwrap(), "hello");
//!
//! let transported = base64::encode(&body);
//! assert_eq!(base64::decode(&transported).unwrap(), body.as_ref());
//! ```

pub mod base64;
pub mod multipart;
