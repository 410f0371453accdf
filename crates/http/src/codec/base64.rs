//! Standard alphabet base64, as API Gateway uses it for binary bodies.
//!
//! Inbound events flag binary bodies with `isBase64Encoded`; outbound binary responses are encoded the
//! same way. Decoding tolerates missing padding and ascii whitespace, which some gateways insert.

use thiserror::Error;

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
const PAD: u8 = b'=';

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Base64Error {
    #[error("invalid base64 byte {byte:#04x} at offset {offset}")]
    InvalidByte { offset: usize, byte: u8 },

    #[error("invalid base64 length {len}")]
    InvalidLength { len: usize },
}

/// Encodes bytes with the standard alphabet and `=` padding.
pub fn encode(data: &[u8]) -> String {
    let mut result = String::with_capacity(data.len().div_ceil(3) * 4);
    for chunk in data.chunks(3) {
        let b0 = u32::from(chunk[0]);
        let b1 = chunk.get(1).copied().map_or(0, u32::from);
        let b2 = chunk.get(2).copied().map_or(0, u32::from);
        let triple = (b0 << 16) | (b1 << 8) | b2;

        result.push(sextet(triple >> 18));
        result.push(sextet(triple >> 12));
        result.push(if chunk.len() > 1 { sextet(triple >> 6) } else { PAD as char });
        result.push(if chunk.len() > 2 { sextet(triple) } else { PAD as char });
    }
    result
}

/// Decodes standard alphabet base64.
pub fn decode(input: &str) -> Result<Vec<u8>, Base64Error> {
    let mut values = Vec::with_capacity(input.len());
    let mut padding = 0usize;
    for (offset, byte) in input.bytes().enumerate() {
        match byte {
            b if b.is_ascii_whitespace() => {}
            PAD => padding += 1,
            // data after padding
            b if padding > 0 => return Err(Base64Error::InvalidByte { offset, byte: b }),
            b => values.push(value_of(b).ok_or(Base64Error::InvalidByte { offset, byte: b })?),
        }
    }

    if values.len() % 4 == 1 || padding > 2 {
        return Err(Base64Error::InvalidLength { len: values.len() + padding });
    }

    let mut output = Vec::with_capacity(values.len() * 3 / 4);
    for chunk in values.chunks(4) {
        let mut triple = 0u32;
        for (i, value) in chunk.iter().enumerate() {
            triple |= u32::from(*value) << (18 - 6 * i);
        }
        let [_, b0, b1, b2] = triple.to_be_bytes();
        output.push(b0);
        if chunk.len() > 2 {
            output.push(b1);
        }
        if chunk.len() > 3 {
            output.push(b2);
        }
    }
    Ok(output)
}

fn sextet(value: u32) -> char {
    ALPHABET[(value & 0x3F) as usize] as char
}

fn value_of(byte: u8) -> Option<u8> {
    match byte {
        b'A'..=b'Z' => Some(byte - b'A'),
        b'a'..=b'z' => Some(byte - b'a' + 26),
        b'0'..=b'9' => Some(byte - b'0' + 52),
        b'+' => Some(62),
        b'/' => Some(63),
        _ => None,
    }
}
