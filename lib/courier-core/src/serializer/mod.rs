//! Pluggable body serializers.
//!
//! A [`Serializer`] converts values to and from one wire format. Serializers are
//! object safe: values cross the trait boundary as `&dyn erased_serde::Serialize`
//! on the way out, and as an `erased_serde::Deserializer` handed to a visitor on
//! the way in. Use [`deserialize`] to obtain a typed value.
//!
//! Built-in formats:
//!
//! | Serializer | Data format | Output |
//! |------------|-------------|--------|
//! | [`JsonSerializer`] | [`DataFormat::Json`] | text |
//! | [`XmlSerializer`] | [`DataFormat::Xml`] | text |
//! | [`CsvSerializer`] | [`DataFormat::Csv`] | text |
//! | [`MessagePackSerializer`] | [`DataFormat::MessagePack`] | bytes |
//! | [`ChainedSerializer`] | inner format | compressed bytes |

mod compression;
mod csv;
mod json;
mod msgpack;
mod registry;
mod xml;

use std::fmt;

use bytes::Bytes;

pub use self::compression::{ChainedSerializer, Compression};
pub use self::csv::CsvSerializer;
pub use self::json::JsonSerializer;
pub use self::msgpack::MessagePackSerializer;
pub use self::registry::{SerializerEntry, SerializerRegistry};
pub use self::xml::XmlSerializer;

use crate::{Error, Result};

/// A logical serialization family, independent of exact content type strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataFormat {
    /// JSON.
    Json,
    /// XML.
    Xml,
    /// Comma separated values.
    Csv,
    /// MessagePack.
    MessagePack,
    /// No structured format (raw bytes or text).
    None,
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Xml => write!(f, "xml"),
            Self::Csv => write!(f, "csv"),
            Self::MessagePack => write!(f, "msgpack"),
            Self::None => write!(f, "none"),
        }
    }
}

/// Callback receiving the format's deserializer.
pub type DeserializeVisitor<'v> = dyn FnMut(&mut dyn erased_serde::Deserializer<'_>) -> std::result::Result<(), erased_serde::Error>
    + 'v;

/// A serializer/deserializer pair for one data format.
///
/// Text formats implement [`Serializer::serialize`]; binary formats report
/// [`Serializer::is_binary`] and implement [`Serializer::serialize_bytes`],
/// leaving `serialize` to fail with [`Error::UnsupportedOperation`].
pub trait Serializer: Send + Sync + fmt::Debug {
    /// The data format handled by this serializer.
    fn data_format(&self) -> DataFormat;

    /// Content type sent with serialized bodies.
    fn content_type(&self) -> &str;

    /// Content types (or `*` patterns such as `*+json`) this serializer reads.
    fn supported_content_types(&self) -> &[&str];

    /// Fallback match for content types not listed in
    /// [`Serializer::supported_content_types`].
    fn accepts(&self, _content_type: &str) -> bool {
        false
    }

    /// Returns `true` if the serializer emits raw bytes instead of text.
    fn is_binary(&self) -> bool {
        false
    }

    /// `Content-Encoding` applied to serialized bodies, if any.
    fn content_encoding(&self) -> Option<&str> {
        None
    }

    /// Serialize a value to text.
    fn serialize(&self, value: &dyn erased_serde::Serialize) -> Result<String>;

    /// Serialize a value to bytes.
    ///
    /// Text formats return the UTF-8 bytes of [`Serializer::serialize`].
    fn serialize_bytes(&self, value: &dyn erased_serde::Serialize) -> Result<Bytes> {
        self.serialize(value).map(Bytes::from)
    }

    /// Run `visitor` against a deserializer reading `content`.
    fn deserialize(&self, content: &[u8], visitor: &mut DeserializeVisitor<'_>) -> Result<()>;
}

/// Deserialize `content` into `T` with the given serializer.
///
/// Failures carry the path of the offending field when the format allows it.
///
/// # Example
///
/// ```
/// use courier_core::{JsonSerializer, deserialize};
///
/// let numbers: Vec<u32> = deserialize(&JsonSerializer::new(), b"[1,2,3]").expect("json");
/// assert_eq!(numbers, vec![1, 2, 3]);
/// ```
pub fn deserialize<T>(serializer: &dyn Serializer, content: &[u8]) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let mut value = None;
    let mut failed_at = None;

    let outcome = serializer.deserialize(content, &mut |de| {
        match serde_path_to_error::deserialize::<_, T>(de) {
            Ok(v) => {
                value = Some(v);
                Ok(())
            }
            Err(err) => {
                failed_at = Some(err.path().to_string());
                Err(err.into_inner())
            }
        }
    });

    match (outcome, value) {
        (Ok(()), Some(value)) => Ok(value),
        (Ok(()), None) => Err(Error::deserialization(
            serializer.data_format(),
            ".",
            "no value was produced",
        )),
        (
            Err(Error::Deserialization {
                format, message, ..
            }),
            _,
        ) if failed_at.is_some() => Err(Error::Deserialization {
            format,
            path: failed_at.unwrap_or_default(),
            message,
        }),
        (Err(err), _) => Err(err),
    }
}

/// Strip parameters and normalize case: `Application/JSON; charset=utf-8` → `application/json`.
pub(crate) fn normalize_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Order {
        id: u64,
        customer: String,
        total: f64,
        express: bool,
        notes: Option<String>,
    }

    fn order() -> Order {
        Order {
            id: 7,
            customer: "Ada".to_string(),
            total: 12.5,
            express: true,
            notes: None,
        }
    }

    #[test]
    fn data_format_display() {
        assert_eq!(DataFormat::Json.to_string(), "json");
        assert_eq!(DataFormat::MessagePack.to_string(), "msgpack");
    }

    #[test]
    fn normalize_strips_parameters() {
        assert_eq!(
            normalize_content_type("Application/JSON; charset=utf-8"),
            "application/json"
        );
        assert_eq!(normalize_content_type(" text/csv "), "text/csv");
    }

    #[test]
    fn json_round_trip() {
        let serializer = JsonSerializer::new();
        let text = serializer.serialize(&order()).expect("serialize");
        let back: Order = deserialize(&serializer, text.as_bytes()).expect("deserialize");
        assert_eq!(back, order());
    }

    #[test]
    fn msgpack_round_trip() {
        let serializer = MessagePackSerializer::new();
        let bytes = serializer.serialize_bytes(&order()).expect("serialize");
        let back: Order = deserialize(&serializer, &bytes).expect("deserialize");
        assert_eq!(back, order());
    }

    #[test]
    fn xml_round_trip() {
        let order = Order {
            notes: Some("leave at door".to_string()),
            ..order()
        };
        let serializer = XmlSerializer::new();
        let text = serializer.serialize(&order).expect("serialize");
        assert!(text.starts_with("<Order>"), "unexpected root: {text}");
        let back: Order = deserialize(&serializer, text.as_bytes()).expect("deserialize");
        assert_eq!(back, order);
    }

    #[test]
    fn gzip_chain_round_trip() {
        let serializer = ChainedSerializer::new(JsonSerializer::new(), Compression::Gzip);
        let bytes = serializer.serialize_bytes(&order()).expect("serialize");
        assert_ne!(bytes.first(), Some(&b'{'));
        let back: Order = deserialize(&serializer, &bytes).expect("deserialize");
        assert_eq!(back, order());
    }

    #[test]
    fn deserialize_error_has_path() {
        #[derive(Debug, Deserialize)]
        struct Address {
            #[allow(dead_code)]
            city: String,
        }

        #[derive(Debug, Deserialize)]
        struct User {
            #[allow(dead_code)]
            address: Address,
        }

        let err = deserialize::<User>(&JsonSerializer::new(), br#"{"address":{"city":5}}"#)
            .expect_err("type mismatch");
        match err {
            Error::Deserialization { format, path, .. } => {
                assert_eq!(format, DataFormat::Json);
                assert_eq!(path, "address.city");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn deserialize_syntax_error() {
        let err = deserialize::<Order>(&JsonSerializer::new(), b"not json")
            .expect_err("syntax error");
        assert!(err.to_string().contains("json deserialization error"));
    }
}
