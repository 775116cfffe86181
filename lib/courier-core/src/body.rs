//! Wire body representation and form encoding.

use bytes::Bytes;

use crate::{DataFormat, Error, Result};

/// `application/x-www-form-urlencoded`
pub const FORM_URL_ENCODED: &str = "application/x-www-form-urlencoded";

/// `application/octet-stream`
pub const OCTET_STREAM: &str = "application/octet-stream";

/// `text/plain`
pub const PLAIN_TEXT: &str = "text/plain";

/// Body of a wire request.
///
/// Text and binary are kept apart so binary serializer output never goes
/// through a lossy string conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Body {
    /// No body.
    #[default]
    Empty,
    /// Text content.
    Text(String),
    /// Binary content.
    Binary(Bytes),
}

impl Body {
    /// Returns `true` if there is no body.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Body length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Text(text) => text.len(),
            Self::Binary(bytes) => bytes.len(),
        }
    }

    /// Body content as bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Empty => &[],
            Self::Text(text) => text.as_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }

    /// Body content as text, if it is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Convert into bytes for the transport.
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        match self {
            Self::Empty => Bytes::new(),
            Self::Text(text) => Bytes::from(text),
            Self::Binary(bytes) => bytes,
        }
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self::Binary(bytes)
    }
}

/// Encode pairs as `application/x-www-form-urlencoded`.
///
/// Uses `serde_html_form`, so repeated names are kept in order.
///
/// # Example
///
/// ```
/// use courier_core::to_form;
///
/// let pairs = [("tag", "a b"), ("tag", "c")];
/// assert_eq!(to_form(&pairs).expect("form"), "tag=a+b&tag=c");
/// ```
pub fn to_form<K, V>(pairs: &[(K, V)]) -> Result<String>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let pairs: Vec<(&str, &str)> = pairs
        .iter()
        .map(|(k, v)| (k.as_ref(), v.as_ref()))
        .collect();
    serde_html_form::to_string(&pairs).map_err(|e| Error::serialization(DataFormat::None, e))
}
