use bytes::{BufMut, Bytes, BytesMut};

use crate::codec::multipart::{Encoding, MultipartError};

#[derive(Debug)]
enum Field {
    Text { name: String, value: String },
    File { name: String, filename: String, content_type: Option<String>, content: Bytes },
}

/// Builds `multipart/form-data` bodies.
///
/// Header lines and text values are written with the encoder's [`Encoding`] (header lines fall back to
/// UTF-8 when the encoding is not ascii compatible); file contents are written as given.
#[derive(Debug)]
pub struct MultipartEncoder {
    boundary: String,
    encoding: Encoding,
    fields: Vec<Field>,
}

impl MultipartEncoder {
    pub fn new(boundary: impl Into<String>) -> Self {
        Self { boundary: boundary.into(), encoding: Encoding::default(), fields: Vec::new() }
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Appends a text field
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(Field::Text { name: name.into(), value: value.into() });
        self
    }

    /// Appends a file field
    pub fn file(
        mut self,
        name: impl Into<String>,
        filename: impl Into<String>,
        content_type: Option<&str>,
        content: impl Into<Bytes>,
    ) -> Self {
        self.fields.push(Field::File {
            name: name.into(),
            filename: filename.into(),
            content_type: content_type.map(str::to_owned),
            content: content.into(),
        });
        self
    }

    /// The `content-type` header value announcing this encoder's boundary
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary=\"{}\"", self.boundary)
    }

    pub fn encode(&self) -> Result<Bytes, MultipartError> {
        let header_encoding = if self.encoding.is_ascii_compatible() { self.encoding } else { Encoding::Utf8 };

        let mut buf = BytesMut::new();
        for field in &self.fields {
            buf.put_slice(b"--");
            buf.put_slice(self.boundary.as_bytes());
            buf.put_slice(b"\r\n");

            match field {
                Field::Text { name, value } => {
                    let disposition = format!("Content-Disposition: form-data; name=\"{}\"", escape(name));
                    buf.put_slice(&header_encoding.encode(&disposition)?);
                    buf.put_slice(b"\r\n\r\n");
                    buf.put_slice(&self.encoding.encode(value)?);
                }
                Field::File { name, filename, content_type, content } => {
                    let disposition = format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"",
                        escape(name),
                        escape(filename)
                    );
                    buf.put_slice(&header_encoding.encode(&disposition)?);
                    if let Some(content_type) = content_type {
                        buf.put_slice(b"\r\n");
                        buf.put_slice(&header_encoding.encode(&format!("Content-Type: {content_type}"))?);
                    }
                    buf.put_slice(b"\r\n\r\n");
                    buf.put_slice(content);
                }
            }
            buf.put_slice(b"\r\n");
        }

        buf.put_slice(b"--");
        buf.put_slice(self.boundary.as_bytes());
        buf.put_slice(b"--\r\n");
        Ok(buf.freeze())
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::multipart::MultipartDecoder;
    use indoc::indoc;

    #[test]
    fn encode_layout() {
        let body = MultipartEncoder::new("xx")
            .field("title", "hello")
            .file("upload", "notes.txt", Some("text/plain"), &b"line"[..])
            .encode()
            .unwrap();

        let expected = indoc! {r#"
            --xx
            Content-Disposition: form-data; name="title"

            hello
            --xx
            Content-Disposition: form-data; name="upload"; filename="notes.txt"
            Content-Type: text/plain

            line
            --xx--
        "#}
        .replace('\n', "\r\n");
        assert_eq!(body.as_ref(), expected.as_bytes());
    }

    #[test]
    fn file_round_trip() {
        let payload = vec![0u8, 159, 146, 150, 13, 10, 13, 10];
        let encoder = MultipartEncoder::new("Xy-1").file("blob", "data \"raw\".bin", None, payload.clone());
        let decoder = MultipartDecoder::new(encoder.encode().unwrap(), &encoder.content_type()).unwrap();

        let part = &decoder.parts()[0];
        assert_eq!(part.name().as_deref(), Some("blob"));
        assert_eq!(part.filename().as_deref(), Some("data \"raw\".bin"));
        assert_eq!(part.content().as_ref(), payload.as_slice());
    }

    #[test]
    fn narrow_encoding_rejects_wide_value() {
        let result = MultipartEncoder::new("b").with_encoding(Encoding::Ascii).field("a", "é").encode();
        assert!(matches!(result, Err(MultipartError::Encode { .. })));
    }
}
