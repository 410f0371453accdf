use thiserror::Error;

/// Errors raised while decoding or encoding `multipart/*` bodies.
///
/// Every decode error is fatal for the body at hand: the decoder never returns a partial list of parts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MultipartError {
    #[error("unexpected non-multipart content type: {content_type}")]
    NotMultipart { content_type: String },

    #[error("invalid content type {content_type}: {reason}")]
    InvalidContentType { content_type: String, reason: String },

    #[error("content type {content_type} carries no boundary")]
    MissingBoundary { content_type: String },

    #[error("no content type available for multipart content")]
    MissingContentType,

    #[error("body part has no header/content separator")]
    ImproperBodyPart,

    #[error("unknown encoding label {label}")]
    UnknownEncoding { label: String },

    #[error("cannot decode content as {encoding}: {reason}")]
    Decode { encoding: &'static str, reason: String },

    #[error("cannot encode text as {encoding}: {reason}")]
    Encode { encoding: &'static str, reason: String },
}

impl MultipartError {
    pub fn not_multipart<S: ToString>(content_type: S) -> Self {
        Self::NotMultipart { content_type: content_type.to_string() }
    }

    pub fn invalid_content_type<C: ToString, S: ToString>(content_type: C, str: S) -> Self {
        Self::InvalidContentType { content_type: content_type.to_string(), reason: str.to_string() }
    }

    pub fn missing_boundary<S: ToString>(content_type: S) -> Self {
        Self::MissingBoundary { content_type: content_type.to_string() }
    }

    pub fn decode<S: ToString>(encoding: &'static str, str: S) -> Self {
        Self::Decode { encoding, reason: str.to_string() }
    }

    pub fn encode<S: ToString>(encoding: &'static str, str: S) -> Self {
        Self::Encode { encoding, reason: str.to_string() }
    }
}
