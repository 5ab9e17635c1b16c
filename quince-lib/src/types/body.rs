use crate::Result;

/// A fetched or cached response body.
///
/// Bodies with a `text/*` content type are decoded as UTF-8 and carried as
/// [`Body::Text`]; everything else stays opaque as [`Body::Bytes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// A textual body, decoded as UTF-8
    Text(String),
    /// An opaque binary body
    Bytes(Vec<u8>),
}

impl Body {
    /// Classify `bytes` based on `content_type` and decode if textual.
    ///
    /// # Errors
    ///
    /// Returns an `Err` if the content type indicates text but the bytes
    /// are not valid UTF-8.
    pub(crate) fn from_bytes(content_type: &str, bytes: Vec<u8>) -> Result<Self> {
        if is_text(content_type) {
            Ok(Self::Text(String::from_utf8(bytes)?))
        } else {
            Ok(Self::Bytes(bytes))
        }
    }

    /// The raw bytes of the body, regardless of flavor
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Bytes(bytes) => bytes,
        }
    }

    /// The decoded text, if this is a textual body
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Bytes(_) => None,
        }
    }

    /// Consume the body, returning its raw bytes
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Text(text) => text.into_bytes(),
            Self::Bytes(bytes) => bytes,
        }
    }

    /// Whether this is a textual body
    #[must_use]
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}

/// Whether a content type denotes a textual body. Only the essence is
/// considered; parameters like `;charset=utf-8` are ignored.
pub(crate) fn is_text(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .starts_with("text/")
}
