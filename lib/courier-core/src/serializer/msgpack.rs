use bytes::Bytes;

use super::{DataFormat, DeserializeVisitor, Serializer};
use crate::{Error, Result};

const CONTENT_TYPES: &[&str] = &[
    "application/msgpack",
    "application/x-msgpack",
    "application/vnd.msgpack",
];

/// MessagePack serializer backed by `rmp-serde`.
///
/// Structs are encoded as maps keyed by field name. This is a binary format:
/// use [`Serializer::serialize_bytes`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MessagePackSerializer;

impl MessagePackSerializer {
    /// Create a MessagePack serializer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Serializer for MessagePackSerializer {
    fn data_format(&self) -> DataFormat {
        DataFormat::MessagePack
    }

    fn content_type(&self) -> &str {
        "application/msgpack"
    }

    fn supported_content_types(&self) -> &[&str] {
        CONTENT_TYPES
    }

    fn is_binary(&self) -> bool {
        true
    }

    fn serialize(&self, _value: &dyn erased_serde::Serialize) -> Result<String> {
        Err(Error::unsupported_operation(
            "MessagePack is a binary format, use serialize_bytes",
        ))
    }

    fn serialize_bytes(&self, value: &dyn erased_serde::Serialize) -> Result<Bytes> {
        rmp_serde::to_vec_named(value)
            .map(Bytes::from)
            .map_err(|e| Error::serialization(DataFormat::MessagePack, e))
    }

    fn deserialize(&self, content: &[u8], visitor: &mut DeserializeVisitor<'_>) -> Result<()> {
        let mut de = rmp_serde::Deserializer::from_read_ref(content);
        let mut erased = <dyn erased_serde::Deserializer>::erase(&mut de);
        visitor(&mut erased).map_err(|e| Error::deserialization(DataFormat::MessagePack, ".", e))
    }
}
