use std::sync::Arc;

use super::{DataFormat, JsonSerializer, Serializer, normalize_content_type};
use crate::{Error, Result};

/// One registered serializer with the content types it answers for.
#[derive(Debug, Clone)]
pub struct SerializerEntry {
    data_format: DataFormat,
    content_types: Vec<String>,
    serializer: Arc<dyn Serializer>,
}

impl SerializerEntry {
    /// The entry's data format.
    #[must_use]
    pub const fn data_format(&self) -> DataFormat {
        self.data_format
    }

    /// Content types (possibly `*` patterns) resolved to this entry.
    #[must_use]
    pub fn content_types(&self) -> &[String] {
        &self.content_types
    }

    /// The serializer.
    #[must_use]
    pub fn serializer(&self) -> &Arc<dyn Serializer> {
        &self.serializer
    }

    fn matches_exactly(&self, content_type: &str) -> bool {
        self.content_types.iter().any(|ct| ct == content_type)
    }

    fn matches_wildcard(&self, content_type: &str) -> bool {
        self.content_types
            .iter()
            .filter(|ct| ct.contains('*'))
            .any(|pattern| wildcard_matches(pattern, content_type))
    }
}

/// Maps content types and data formats to serializers.
///
/// Resolution of a content type, after lowercasing and dropping parameters:
/// 1. an entry listing the exact content type,
/// 2. an entry with a matching `*` pattern (`*+json`, `application/*`),
/// 3. an entry whose serializer [`accepts`](Serializer::accepts) it,
/// 4. the default entry.
///
/// Registering a serializer for a data format that is already present replaces
/// the existing entry.
///
/// # Example
///
/// ```
/// use courier_core::{DataFormat, SerializerRegistry};
///
/// let registry = SerializerRegistry::with_defaults();
/// let serializer = registry
///     .resolve("application/problem+json; charset=utf-8")
///     .expect("json");
/// assert_eq!(serializer.data_format(), DataFormat::Json);
/// ```
#[derive(Debug, Clone)]
pub struct SerializerRegistry {
    entries: Vec<SerializerEntry>,
    default_format: Option<DataFormat>,
}

impl Default for SerializerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl SerializerRegistry {
    /// Create an empty registry with no default.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            entries: Vec::new(),
            default_format: None,
        }
    }

    /// Create a registry holding JSON as the default serializer.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(JsonSerializer::new());
        registry.default_format = Some(DataFormat::Json);
        registry
    }

    /// Register a serializer under its own supported content types.
    pub fn register(&mut self, serializer: impl Serializer + 'static) -> &mut Self {
        self.register_shared(Arc::new(serializer))
    }

    /// Register a shared serializer under its own supported content types.
    pub fn register_shared(&mut self, serializer: Arc<dyn Serializer>) -> &mut Self {
        let content_types = serializer
            .supported_content_types()
            .iter()
            .map(|ct| normalize_content_type(ct))
            .collect();
        self.insert(SerializerEntry {
            data_format: serializer.data_format(),
            content_types,
            serializer,
        })
    }

    /// Register a serializer under explicit content types.
    pub fn register_with<I, S>(
        &mut self,
        serializer: impl Serializer + 'static,
        content_types: I,
    ) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let serializer: Arc<dyn Serializer> = Arc::new(serializer);
        self.insert(SerializerEntry {
            data_format: serializer.data_format(),
            content_types: content_types
                .into_iter()
                .map(|ct| normalize_content_type(ct.as_ref()))
                .collect(),
            serializer,
        })
    }

    fn insert(&mut self, entry: SerializerEntry) -> &mut Self {
        match self
            .entries
            .iter_mut()
            .find(|existing| existing.data_format == entry.data_format)
        {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
        self
    }

    /// Select the entry used when nothing else matches.
    ///
    /// Has no effect if no serializer is registered for `format`.
    pub fn set_default(&mut self, format: DataFormat) -> &mut Self {
        if self.entries.iter().any(|e| e.data_format == format) {
            self.default_format = Some(format);
        }
        self
    }

    /// The default data format, if any.
    #[must_use]
    pub const fn default_format(&self) -> Option<DataFormat> {
        self.default_format
    }

    /// Registered entries in registration order.
    #[must_use]
    pub fn entries(&self) -> &[SerializerEntry] {
        &self.entries
    }

    /// Find the serializer for a response content type.
    pub fn resolve(&self, content_type: &str) -> Result<Arc<dyn Serializer>> {
        let normalized = normalize_content_type(content_type);

        let entry = self
            .entries
            .iter()
            .find(|e| e.matches_exactly(&normalized))
            .or_else(|| self.entries.iter().find(|e| e.matches_wildcard(&normalized)))
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|e| e.serializer.accepts(&normalized))
            })
            .or_else(|| self.default_entry());

        entry
            .map(|e| Arc::clone(&e.serializer))
            .ok_or_else(|| Error::unsupported_content_type(content_type))
    }

    /// Find the serializer for a data format.
    pub fn resolve_by_format(&self, format: DataFormat) -> Result<Arc<dyn Serializer>> {
        self.entries
            .iter()
            .find(|e| e.data_format == format)
            .map(|e| Arc::clone(&e.serializer))
            .ok_or_else(|| Error::unsupported_content_type(format!("no serializer for {format}")))
    }

    /// The default serializer, if any.
    #[must_use]
    pub fn default_serializer(&self) -> Option<Arc<dyn Serializer>> {
        self.default_entry().map(|e| Arc::clone(&e.serializer))
    }

    /// `Accept` header value listing every concrete content type, in
    /// registration order and without duplicates.
    #[must_use]
    pub fn accept_header(&self) -> String {
        let mut accepted: Vec<&str> = Vec::new();
        for ct in self
            .entries
            .iter()
            .flat_map(|e| e.content_types.iter())
            .filter(|ct| !ct.contains('*'))
        {
            if !accepted.contains(&ct.as_str()) {
                accepted.push(ct);
            }
        }
        accepted.join(", ")
    }

    /// Deserialize `content` with the serializer resolved for `content_type`.
    pub fn deserialize<T>(&self, content_type: &str, content: &[u8]) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let serializer = self.resolve(content_type)?;
        super::deserialize(serializer.as_ref(), content)
    }

    fn default_entry(&self) -> Option<&SerializerEntry> {
        let format = self.default_format?;
        self.entries.iter().find(|e| e.data_format == format)
    }
}

/// `*+json` matches `application/problem+json`; `application/*` matches any
/// `application/` subtype; `*` matches anything.
fn wildcard_matches(pattern: &str, content_type: &str) -> bool {
    match pattern.split_once('*') {
        Some((prefix, suffix)) => {
            content_type.len() >= prefix.len() + suffix.len()
                && content_type.starts_with(prefix)
                && content_type.ends_with(suffix)
        }
        None => pattern == content_type,
    }
}
