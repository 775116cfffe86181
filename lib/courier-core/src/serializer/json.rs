use super::{DataFormat, DeserializeVisitor, Serializer};
use crate::{Error, Result};

const CONTENT_TYPES: &[&str] = &[
    "application/json",
    "text/json",
    "text/x-json",
    "text/javascript",
    "*+json",
];

/// JSON serializer backed by `serde_json`.
///
/// Reads `application/json`, `text/json`, `text/x-json`, `text/javascript` and
/// any `*+json` structured syntax suffix.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer {
    pretty: bool,
}

impl JsonSerializer {
    /// Create a compact JSON serializer.
    #[must_use]
    pub const fn new() -> Self {
        Self { pretty: false }
    }

    /// Create a JSON serializer emitting indented output.
    #[must_use]
    pub const fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Serializer for JsonSerializer {
    fn data_format(&self) -> DataFormat {
        DataFormat::Json
    }

    fn content_type(&self) -> &str {
        "application/json"
    }

    fn supported_content_types(&self) -> &[&str] {
        CONTENT_TYPES
    }

    fn serialize(&self, value: &dyn erased_serde::Serialize) -> Result<String> {
        let result = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        result.map_err(|e| Error::serialization(DataFormat::Json, e))
    }

    fn deserialize(&self, content: &[u8], visitor: &mut DeserializeVisitor<'_>) -> Result<()> {
        let mut de = serde_json::Deserializer::from_slice(content);
        {
            let mut erased = <dyn erased_serde::Deserializer>::erase(&mut de);
            visitor(&mut erased).map_err(|e| Error::deserialization(DataFormat::Json, ".", e))?;
        }
        de.end()
            .map_err(|e| Error::deserialization(DataFormat::Json, ".", e))
    }
}
