use bytes::Bytes;
use tracing::trace;

use crate::codec::multipart::{Encoding, MultipartError};

const HEADER_SEPARATOR: &[u8] = b"\r\n\r\n";

/// The headers of one body part, keyed by raw bytes and looked up case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartHeaders {
    entries: Vec<(Bytes, Bytes)>,
}

impl PartHeaders {
    /// Parses a header block: one header per line, split on the first colon, continuation lines folded
    /// into the previous value.
    fn parse(block: &Bytes) -> Self {
        let mut entries: Vec<(Bytes, Bytes)> = Vec::new();
        let mut start = 0;
        while start < block.len() {
            let end = find(&block[start..], b"\r\n").map_or(block.len(), |offset| start + offset);
            let line = block.slice(start..end);
            start = end + 2;

            if line.is_empty() {
                continue;
            }

            if line[0] == b' ' || line[0] == b'\t' {
                if let Some((_, value)) = entries.last_mut() {
                    let mut folded = value.to_vec();
                    folded.push(b' ');
                    folded.extend_from_slice(trim(&line));
                    *value = Bytes::from(folded);
                }
                continue;
            }

            match line.iter().position(|&b| b == b':') {
                Some(colon) => {
                    let name = line.slice_ref(trim(&line[..colon]));
                    let value = line.slice_ref(trim(&line[colon + 1..]));
                    entries.push((name, value));
                }
                None => trace!(line = %String::from_utf8_lossy(&line), "skipping header line without colon"),
            }
        }
        Self { entries }
    }

    /// Returns the first value for `name`, compared case-insensitively
    pub fn get(&self, name: impl AsRef<[u8]>) -> Option<&Bytes> {
        let name = name.as_ref();
        self.entries.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)).map(|(_, value)| value)
    }

    pub fn contains(&self, name: impl AsRef<[u8]>) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Bytes, &Bytes)> {
        self.entries.iter().map(|(name, value)| (name, value))
    }
}

/// One decoded segment of a multipart body.
///
/// The content is kept as raw bytes. [`BodyPart::text`] decodes it with the part's current encoding on
/// every call, so changing the encoding with [`BodyPart::set_encoding`] changes the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyPart {
    headers: PartHeaders,
    content: Bytes,
    encoding: Encoding,
}

impl BodyPart {
    /// Parses one segment into headers and content.
    ///
    /// The segment is split once on the first blank line. An empty header block means a part without
    /// headers; a segment with no blank line at all is rejected.
    pub fn parse(segment: impl Into<Bytes>, encoding: Encoding) -> Result<Self, MultipartError> {
        let segment = segment.into();
        let Some(separator) = find(&segment, HEADER_SEPARATOR) else {
            return Err(MultipartError::ImproperBodyPart);
        };

        let block = segment.slice(..separator);
        let content = segment.slice(separator + HEADER_SEPARATOR.len()..);

        let headers = match block.iter().position(|b| !b.is_ascii_whitespace()) {
            Some(first) => PartHeaders::parse(&block.slice(first..)),
            None => PartHeaders::default(),
        };

        Ok(Self { headers, content, encoding })
    }

    pub fn headers(&self) -> &PartHeaders {
        &self.headers
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn into_content(self) -> Bytes {
        self.content
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn set_encoding(&mut self, encoding: Encoding) {
        self.encoding = encoding;
    }

    /// Decodes the content with the part's current encoding
    pub fn text(&self) -> Result<String, MultipartError> {
        self.encoding.decode(&self.content)
    }

    /// Returns a header value as text, decoded with the part's encoding when it is ascii compatible
    pub fn header_text(&self, name: impl AsRef<[u8]>) -> Option<String> {
        let value = self.headers.get(name)?;
        if self.encoding.is_ascii_compatible() {
            self.encoding.decode(value).ok()
        } else {
            Some(String::from_utf8_lossy(value).into_owned())
        }
    }

    /// The `name` parameter of the `Content-Disposition` header
    pub fn name(&self) -> Option<String> {
        self.disposition_param("name")
    }

    /// The `filename` parameter of the `Content-Disposition` header
    pub fn filename(&self) -> Option<String> {
        self.disposition_param("filename")
    }

    /// The part's own `Content-Type` header, if any
    pub fn content_type(&self) -> Option<String> {
        self.header_text("content-type")
    }

    fn disposition_param(&self, key: &str) -> Option<String> {
        let disposition = self.header_text("content-disposition")?;
        disposition_params(&disposition).into_iter().find(|(name, _)| name.eq_ignore_ascii_case(key)).map(|(_, v)| v)
    }
}

/// Splits `form-data; name="a"; filename="b;c.txt"` into its parameters, honouring quoted values.
fn disposition_params(value: &str) -> Vec<(String, String)> {
    let mut params = Vec::new();
    let mut chars = value.chars().peekable();

    // skip the disposition type
    for c in chars.by_ref() {
        if c == ';' {
            break;
        }
    }

    loop {
        let mut name = String::new();
        let mut has_value = false;
        for c in chars.by_ref() {
            if c == '=' {
                has_value = true;
                break;
            }
            if c == ';' {
                break;
            }
            name.push(c);
        }
        if !has_value {
            if chars.peek().is_none() {
                break;
            }
            continue;
        }

        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }

        let mut value = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => value.extend(chars.next()),
                    '"' => break,
                    _ => value.push(c),
                }
            }
            for c in chars.by_ref() {
                if c == ';' {
                    break;
                }
            }
        } else {
            for c in chars.by_ref() {
                if c == ';' {
                    break;
                }
                value.push(c);
            }
            value = value.trim().to_owned();
        }

        let name = name.trim();
        if !name.is_empty() {
            params.push((name.to_owned(), value));
        }
    }
    params
}

fn trim(bytes: &[u8]) -> &[u8] {
    bytes.trim_ascii()
}

pub(crate) fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|window| window == needle)
}
