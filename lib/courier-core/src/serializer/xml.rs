use super::{DataFormat, DeserializeVisitor, Serializer};
use crate::{Error, Result};

const CONTENT_TYPES: &[&str] = &["application/xml", "text/xml", "*+xml"];

/// XML serializer backed by `quick-xml`.
///
/// The root element is named after the serialized type unless
/// [`XmlSerializer::with_root`] overrides it.
#[derive(Debug, Clone, Default)]
pub struct XmlSerializer {
    root: Option<String>,
}

impl XmlSerializer {
    /// Create an XML serializer using type names as root elements.
    #[must_use]
    pub const fn new() -> Self {
        Self { root: None }
    }

    /// Use a fixed root element name.
    #[must_use]
    pub fn with_root(root: impl Into<String>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }
}

impl Serializer for XmlSerializer {
    fn data_format(&self) -> DataFormat {
        DataFormat::Xml
    }

    fn content_type(&self) -> &str {
        "application/xml"
    }

    fn supported_content_types(&self) -> &[&str] {
        CONTENT_TYPES
    }

    fn serialize(&self, value: &dyn erased_serde::Serialize) -> Result<String> {
        let result = match &self.root {
            Some(root) => quick_xml::se::to_string_with_root(root, value),
            None => quick_xml::se::to_string(value),
        };
        result.map_err(|e| Error::serialization(DataFormat::Xml, e))
    }

    fn deserialize(&self, content: &[u8], visitor: &mut DeserializeVisitor<'_>) -> Result<()> {
        let text = std::str::from_utf8(content)
            .map_err(|e| Error::deserialization(DataFormat::Xml, ".", e))?;
        let mut de = quick_xml::de::Deserializer::from_str(text);
        let mut erased = <dyn erased_serde::Deserializer>::erase(&mut de);
        visitor(&mut erased).map_err(|e| Error::deserialization(DataFormat::Xml, ".", e))
    }
}
