//! Text encodings for multipart content.
//!
//! Part content is kept as raw bytes; an [`Encoding`] only comes into play when the caller asks for text.

use std::fmt;
use std::str::FromStr;

use crate::codec::multipart::MultipartError;

/// A text encoding understood by [`BodyPart::text`](crate::codec::multipart::BodyPart::text) and the
/// [`MultipartEncoder`](crate::codec::multipart::MultipartEncoder).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Encoding {
    #[default]
    Utf8,
    /// UTF-16 with an optional byte order mark, little endian when the mark is absent. Encoding emits a
    /// little endian mark.
    Utf16,
    Utf16Le,
    Utf16Be,
    Latin1,
    Ascii,
}

const BOM_LE: [u8; 2] = [0xFF, 0xFE];
const BOM_BE: [u8; 2] = [0xFE, 0xFF];

impl Encoding {
    pub fn name(self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Utf16 => "utf-16",
            Encoding::Utf16Le => "utf-16-le",
            Encoding::Utf16Be => "utf-16-be",
            Encoding::Latin1 => "latin-1",
            Encoding::Ascii => "ascii",
        }
    }

    /// Whether ascii text encodes to the same bytes under this encoding
    pub fn is_ascii_compatible(self) -> bool {
        matches!(self, Encoding::Utf8 | Encoding::Latin1 | Encoding::Ascii)
    }

    pub fn decode(self, bytes: &[u8]) -> Result<String, MultipartError> {
        match self {
            Encoding::Utf8 => {
                String::from_utf8(bytes.to_vec()).map_err(|e| MultipartError::decode(self.name(), e))
            }
            Encoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            Encoding::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(index) => Err(MultipartError::decode(self.name(), format!("non-ascii byte at offset {index}"))),
                None => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            },
            Encoding::Utf16 => {
                if let Some(rest) = bytes.strip_prefix(&BOM_LE) {
                    decode_utf16(self.name(), rest, u16::from_le_bytes)
                } else if let Some(rest) = bytes.strip_prefix(&BOM_BE) {
                    decode_utf16(self.name(), rest, u16::from_be_bytes)
                } else {
                    decode_utf16(self.name(), bytes, u16::from_le_bytes)
                }
            }
            Encoding::Utf16Le => decode_utf16(self.name(), bytes, u16::from_le_bytes),
            Encoding::Utf16Be => decode_utf16(self.name(), bytes, u16::from_be_bytes),
        }
    }

    pub fn encode(self, text: &str) -> Result<Vec<u8>, MultipartError> {
        match self {
            Encoding::Utf8 => Ok(text.as_bytes().to_vec()),
            Encoding::Latin1 => encode_narrow(self.name(), text, 0xFF),
            Encoding::Ascii => encode_narrow(self.name(), text, 0x7F),
            Encoding::Utf16 => {
                let mut bytes = BOM_LE.to_vec();
                bytes.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
                Ok(bytes)
            }
            Encoding::Utf16Le => Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect()),
            Encoding::Utf16Be => Ok(text.encode_utf16().flat_map(u16::to_be_bytes).collect()),
        }
    }
}

fn decode_utf16(name: &'static str, bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Result<String, MultipartError> {
    if bytes.len() % 2 != 0 {
        return Err(MultipartError::decode(name, "truncated code unit"));
    }
    let units = bytes.chunks_exact(2).map(|pair| unit([pair[0], pair[1]]));
    char::decode_utf16(units).collect::<Result<String, _>>().map_err(|e| MultipartError::decode(name, e))
}

fn encode_narrow(name: &'static str, text: &str, max: u32) -> Result<Vec<u8>, MultipartError> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).ok().filter(|&b| u32::from(b) <= max))
        .collect::<Option<Vec<u8>>>()
        .ok_or_else(|| MultipartError::encode(name, "character out of range"))
}

impl FromStr for Encoding {
    type Err = MultipartError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        let normalized = label.trim().to_ascii_lowercase().replace('_', "-");
        let encoding = match normalized.as_str() {
            "utf-8" | "utf8" => Encoding::Utf8,
            "utf-16" | "utf16" => Encoding::Utf16,
            "utf-16le" | "utf-16-le" => Encoding::Utf16Le,
            "utf-16be" | "utf-16-be" => Encoding::Utf16Be,
            "latin-1" | "latin1" | "iso-8859-1" | "iso8859-1" => Encoding::Latin1,
            "ascii" | "us-ascii" => Encoding::Ascii,
            _ => return Err(MultipartError::UnknownEncoding { label: label.to_owned() }),
        };
        Ok(encoding)
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf16_honours_byte_order_mark() {
        let little = Encoding::Utf16.encode("Â©").unwrap();
        assert_eq!(little, [0xFF, 0xFE, 0xC2, 0x00, 0xA9, 0x00]);
        assert_eq!(Encoding::Utf16.decode(&little).unwrap(), "Â©");

        let big = [0xFE, 0xFF, 0x00, 0xC2, 0x00, 0xA9];
        assert_eq!(Encoding::Utf16.decode(&big).unwrap(), "Â©");
        assert_eq!(Encoding::Utf16Be.decode(&big[2..]).unwrap(), "Â©");
    }

    #[test]
    fn latin1_differs_from_utf8() {
        let bytes = Encoding::Utf8.encode("Â©").unwrap();
        assert_ne!(bytes, Encoding::Latin1.encode("Â©").unwrap());
        assert_eq!(Encoding::Latin1.decode(&bytes).unwrap(), "Ã\u{82}Â©");
    }

    #[test]
    fn narrow_encodings_reject_wide_chars() {
        assert!(matches!(Encoding::Latin1.encode("☃"), Err(MultipartError::Encode { .. })));
        assert!(matches!(Encoding::Ascii.encode("é"), Err(MultipartError::Encode { .. })));
        assert!(matches!(Encoding::Ascii.decode(&[0x41, 0xE9]), Err(MultipartError::Decode { .. })));
        assert!(matches!(Encoding::Utf8.decode(&[0xFF]), Err(MultipartError::Decode { .. })));
    }

    #[test]
    fn parse_labels() {
        assert_eq!("UTF-8".parse::<Encoding>().unwrap(), Encoding::Utf8);
        assert_eq!("utf_16_le".parse::<Encoding>().unwrap(), Encoding::Utf16Le);
        assert_eq!("ISO-8859-1".parse::<Encoding>().unwrap(), Encoding::Latin1);
        assert!("koi8-r".parse::<Encoding>().is_err());
    }
}
