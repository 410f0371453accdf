//! Decoder splitting a `multipart/*` body into its parts.
//!
//! The decoder works on the complete body at once: serverless hosts deliver the whole payload in the
//! event, so there is nothing to stream.
//!
//! # Algorithm
//!
//! 1. Check that the content type's primary token is `multipart` (case-insensitive) and read its
//!    `boundary` parameter
//! 2. Split the body on every `CRLF--boundary` delimiter
//! 3. Drop the prologue (anything before the first delimiter), the `--` terminator with whatever
//!    epilogue follows it, and empty segments
//! 4. Parse each remaining segment as a [`BodyPart`]; one improper segment fails the whole body
//!
//! # Example
//!
//! ```
//! use lambda_api_http::codec::multipart::MultipartDecoder;
//!
//! let body = b"--xyz\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\n1\r\n--xyz--\r\n";
//! let decoder = MultipartDecoder::new(&body[..], "multipart/form-data; boundary=xyz").unwrap();
//!
//! assert_eq!(decoder.parts().len(), 1);
//! assert_eq!(decoder.parts()[0].name().as_deref(), Some("a"));
//! assert_eq!(decoder.parts()[0].content().as_ref(), b"1");
//! ```

use bytes::{Bytes, BytesMut};
use http::header::CONTENT_TYPE;
use mime::Mime;
use tracing::trace;

use crate::codec::multipart::body_part::find;
use crate::codec::multipart::{BodyPart, Encoding, MultipartError};
use crate::ensure;
use crate::protocol::NormalizedRequest;

/// Something carrying a multipart payload next to its content type, such as an already fetched http
/// response or a normalized request.
pub trait MultipartSource {
    fn content(&self) -> &[u8];

    fn content_type(&self) -> Option<&str>;
}

impl<B: AsRef<[u8]>> MultipartSource for http::Response<B> {
    fn content(&self) -> &[u8] {
        self.body().as_ref()
    }

    fn content_type(&self) -> Option<&str> {
        self.headers().get(CONTENT_TYPE).and_then(|value| value.to_str().ok())
    }
}

impl MultipartSource for NormalizedRequest {
    fn content(&self) -> &[u8] {
        self.body()
    }

    fn content_type(&self) -> Option<&str> {
        NormalizedRequest::content_type(self)
    }
}

/// A decoded multipart body.
#[derive(Debug, Clone)]
pub struct MultipartDecoder {
    content_type: String,
    boundary: String,
    encoding: Encoding,
    parts: Vec<BodyPart>,
}

impl MultipartDecoder {
    /// Decodes `content` using UTF-8 as the parts' text encoding.
    pub fn new(content: impl Into<Bytes>, content_type: &str) -> Result<Self, MultipartError> {
        Self::with_encoding(content, content_type, Encoding::default())
    }

    pub fn with_encoding(
        content: impl Into<Bytes>,
        content_type: &str,
        encoding: Encoding,
    ) -> Result<Self, MultipartError> {
        let boundary = parse_boundary(content_type)?;
        let parts = split_parts(&content.into(), &boundary, encoding)?;
        trace!(boundary = %boundary, parts = parts.len(), "decoded multipart body");
        Ok(Self { content_type: content_type.to_owned(), boundary, encoding, parts })
    }

    /// Decodes the payload of a response-like source, using its `content-type`.
    pub fn from_response<S: MultipartSource + ?Sized>(source: &S) -> Result<Self, MultipartError> {
        Self::from_response_with_encoding(source, Encoding::default())
    }

    pub fn from_response_with_encoding<S: MultipartSource + ?Sized>(
        source: &S,
        encoding: Encoding,
    ) -> Result<Self, MultipartError> {
        let content_type = source.content_type().ok_or(MultipartError::MissingContentType)?;
        Self::with_encoding(Bytes::copy_from_slice(source.content()), content_type, encoding)
    }

    /// The content type the body was decoded with, verbatim
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn parts(&self) -> &[BodyPart] {
        &self.parts
    }

    pub fn into_parts(self) -> Vec<BodyPart> {
        self.parts
    }
}

/// Decodes a multipart body into its parts with the default encoding.
pub fn decode(content: impl Into<Bytes>, content_type: &str) -> Result<Vec<BodyPart>, MultipartError> {
    MultipartDecoder::new(content, content_type).map(MultipartDecoder::into_parts)
}

fn parse_boundary(content_type: &str) -> Result<String, MultipartError> {
    let primary = content_type.split('/').next().unwrap_or_default().trim();
    ensure!(primary.eq_ignore_ascii_case("multipart"), MultipartError::not_multipart(content_type));

    let mime = content_type
        .parse::<Mime>()
        .map_err(|e| MultipartError::invalid_content_type(content_type, e))?;
    let boundary = mime.get_param(mime::BOUNDARY).ok_or_else(|| MultipartError::missing_boundary(content_type))?;

    let boundary = boundary.as_str();
    ensure!(!boundary.is_empty(), MultipartError::missing_boundary(content_type));
    Ok(boundary.to_owned())
}

fn split_parts(content: &Bytes, boundary: &str, encoding: Encoding) -> Result<Vec<BodyPart>, MultipartError> {
    let mut marker = BytesMut::with_capacity(boundary.len() + 2);
    marker.extend_from_slice(b"--");
    marker.extend_from_slice(boundary.as_bytes());

    let mut delimiter = BytesMut::with_capacity(marker.len() + 2);
    delimiter.extend_from_slice(b"\r\n");
    delimiter.extend_from_slice(&marker);

    let mut parts = Vec::new();
    let mut start = 0;
    let mut first = true;
    loop {
        let end = find(&content[start..], &delimiter).map(|offset| start + offset);
        let mut segment = content.slice(start..end.unwrap_or(content.len()));

        if first {
            first = false;
            // a body may open with the bare marker; anything else before the first delimiter is prologue
            if segment.starts_with(&marker) {
                segment = segment.slice(marker.len()..);
            } else {
                segment = Bytes::new();
            }
        }

        // the `--` after the last delimiter ends the body, the epilogue goes with it
        if segment.starts_with(b"--") {
            break;
        }

        if !segment.is_empty() && segment.as_ref() != b"\r\n" {
            parts.push(BodyPart::parse(segment, encoding)?);
        }

        match end {
            Some(end) => start = end + delimiter.len(),
            None => break,
        }
    }
    Ok(parts)
}
