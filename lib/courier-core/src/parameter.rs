//! Request parameters.
//!
//! A [`Parameter`] is a named textual value routed to a specific part of the
//! wire request by its [`ParameterKind`]. Request bodies and file uploads carry
//! non-textual payloads and have their own types, [`RequestBody`] and
//! [`FileParameter`].

use std::fmt;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;

use crate::{DataFormat, Result};

/// Where a parameter is sent in the HTTP request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    /// Query string pair (e.g., `?limit=10`). Repeated names are kept.
    Query,
    /// Replaces a `{name}` placeholder in the resource template.
    UrlSegment,
    /// HTTP header.
    Header,
    /// Cookie, rendered into the `Cookie` header.
    Cookie,
    /// The request body.
    RequestBody,
    /// Query string for GET-like methods, form body for POST-like methods.
    GetOrPost,
    /// Multipart file upload.
    File,
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query => write!(f, "query"),
            Self::UrlSegment => write!(f, "url-segment"),
            Self::Header => write!(f, "header"),
            Self::Cookie => write!(f, "cookie"),
            Self::RequestBody => write!(f, "body"),
            Self::GetOrPost => write!(f, "get-or-post"),
            Self::File => write!(f, "file"),
        }
    }
}

/// A named textual request parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    name: String,
    value: String,
    kind: ParameterKind,
    content_type: Option<String>,
    encode: bool,
}

impl Parameter {
    /// Create a parameter of the given kind.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl ToString, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            value: value.to_string(),
            kind,
            content_type: None,
            encode: true,
        }
    }

    /// Create a query string parameter.
    #[must_use]
    pub fn query(name: impl Into<String>, value: impl ToString) -> Self {
        Self::new(name, value, ParameterKind::Query)
    }

    /// Create a URL segment parameter.
    #[must_use]
    pub fn url_segment(name: impl Into<String>, value: impl ToString) -> Self {
        Self::new(name, value, ParameterKind::UrlSegment)
    }

    /// Create a header parameter.
    #[must_use]
    pub fn header(name: impl Into<String>, value: impl ToString) -> Self {
        Self::new(name, value, ParameterKind::Header)
    }

    /// Create a cookie parameter.
    #[must_use]
    pub fn cookie(name: impl Into<String>, value: impl ToString) -> Self {
        Self::new(name, value, ParameterKind::Cookie)
    }

    /// Create a `GetOrPost` parameter.
    #[must_use]
    pub fn get_or_post(name: impl Into<String>, value: impl ToString) -> Self {
        Self::new(name, value, ParameterKind::GetOrPost)
    }

    /// Set the content type (used for multipart parts).
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Disable percent-encoding of the value (query and URL segment only).
    ///
    /// An unencoded URL segment may contain `/` to span several path segments.
    #[must_use]
    pub const fn without_encoding(mut self) -> Self {
        self.encode = false;
        self
    }

    /// Parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Parameter kind.
    #[must_use]
    pub const fn kind(&self) -> ParameterKind {
        self.kind
    }

    /// Content type, if set.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Whether the value is percent-encoded when placed in the URI.
    #[must_use]
    pub const fn encode(&self) -> bool {
        self.encode
    }

    /// Returns `true` if this parameter has the given kind and name.
    ///
    /// Header and cookie names compare case-insensitively.
    #[must_use]
    pub fn matches(&self, name: &str, kind: ParameterKind) -> bool {
        if self.kind != kind {
            return false;
        }
        match kind {
            ParameterKind::Header | ParameterKind::Cookie => self.name.eq_ignore_ascii_case(name),
            _ => self.name == name,
        }
    }
}

// ============================================================================
// Request body
// ============================================================================

/// A value serialized lazily by the serializer selected at build time.
pub type BodyValue = Arc<dyn erased_serde::Serialize + Send + Sync>;

/// The single body of a request.
#[derive(Clone)]
pub enum RequestBody {
    /// An object serialized by the registry at build time.
    Object {
        /// The value to serialize.
        value: BodyValue,
        /// Explicit format, overriding the request and client defaults.
        format: Option<DataFormat>,
        /// Part name used when the body travels inside a multipart form.
        name: Option<String>,
    },
    /// Raw text sent as is.
    Text {
        /// Body text.
        content: String,
        /// Content type header value.
        content_type: String,
    },
    /// Raw bytes sent as is.
    Bytes {
        /// Body bytes.
        content: Bytes,
        /// Content type header value.
        content_type: String,
    },
}

impl RequestBody {
    /// Create a body serialized with the request's selected serializer.
    #[must_use]
    pub fn object<T>(value: T) -> Self
    where
        T: serde::Serialize + Send + Sync + 'static,
    {
        Self::Object {
            value: Arc::new(value),
            format: None,
            name: None,
        }
    }

    /// Create a body serialized with the serializer registered for `format`.
    #[must_use]
    pub fn object_as<T>(value: T, format: DataFormat) -> Self
    where
        T: serde::Serialize + Send + Sync + 'static,
    {
        Self::Object {
            value: Arc::new(value),
            format: Some(format),
            name: None,
        }
    }

    /// The kind shared by all bodies.
    #[must_use]
    pub const fn kind(&self) -> ParameterKind {
        ParameterKind::RequestBody
    }
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Object { format, name, .. } => f
                .debug_struct("Object")
                .field("format", format)
                .field("name", name)
                .finish_non_exhaustive(),
            Self::Text {
                content,
                content_type,
            } => f
                .debug_struct("Text")
                .field("len", &content.len())
                .field("content_type", content_type)
                .finish(),
            Self::Bytes {
                content,
                content_type,
            } => f
                .debug_struct("Bytes")
                .field("len", &content.len())
                .field("content_type", content_type)
                .finish(),
        }
    }
}

// ============================================================================
// Files
// ============================================================================

type DataProducer = Box<dyn FnOnce() -> std::io::Result<Bytes> + Send>;

/// A file uploaded as one part of a `multipart/form-data` body.
///
/// The data source is lazy and is invoked exactly once, when the body is
/// built.
pub struct FileParameter {
    name: String,
    file_name: String,
    content_type: String,
    producer: DataProducer,
}

impl FileParameter {
    /// Create a file parameter from a lazy data producer.
    #[must_use]
    pub fn from_fn<F>(name: impl Into<String>, file_name: impl Into<String>, producer: F) -> Self
    where
        F: FnOnce() -> std::io::Result<Bytes> + Send + 'static,
    {
        let file_name = file_name.into();
        let content_type = crate::multipart::guess_content_type(&file_name).to_string();
        Self {
            name: name.into(),
            file_name,
            content_type,
            producer: Box::new(producer),
        }
    }

    /// Create a file parameter from in-memory bytes.
    #[must_use]
    pub fn from_bytes(
        name: impl Into<String>,
        file_name: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        let data = data.into();
        Self::from_fn(name, file_name, move || Ok(data))
    }

    /// Create a file parameter that reads a file from disk when the body is built.
    ///
    /// The part's file name is the last component of `path`.
    #[must_use]
    pub fn from_path(name: impl Into<String>, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_fn(name, file_name, move || std::fs::read(&path).map(Bytes::from))
    }

    /// Create a file parameter draining a reader when the body is built.
    #[must_use]
    pub fn from_reader<R>(name: impl Into<String>, file_name: impl Into<String>, reader: R) -> Self
    where
        R: Read + Send + 'static,
    {
        Self::from_fn(name, file_name, move || {
            let mut reader = reader;
            let mut data = Vec::new();
            reader.read_to_end(&mut data)?;
            Ok(Bytes::from(data))
        })
    }

    /// Override the guessed content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Form field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File name sent in the `Content-Disposition` header.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Content type of the part.
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// The kind shared by all files.
    #[must_use]
    pub const fn kind(&self) -> ParameterKind {
        ParameterKind::File
    }

    /// Consume the parameter, reading its data.
    pub(crate) fn into_part(self) -> Result<crate::Part> {
        let data = (self.producer)()?;
        Ok(crate::Part::file(self.name, self.file_name, data).with_content_type(self.content_type))
    }
}

impl fmt::Debug for FileParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileParameter")
            .field("name", &self.name)
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Object to parameters
// ============================================================================

/// Conversion of a value into named query parameters.
///
/// This is automatically implemented by `#[derive(Parameters)]`. Fields whose
/// value is `None` produce no pair.
///
/// # Example
///
/// ```ignore
/// use courier::Parameters;
///
/// #[derive(Parameters)]
/// #[param(rename_all = "camelCase")]
/// struct SearchParams {
///     query_text: String,
///     page: Option<u32>,
///     #[param(rename = "page_size")]
///     limit: u32,
///     #[param(format = "csv")]
///     tags: Vec<String>,
/// }
/// ```
pub trait ToParameters {
    /// Convert this value into `(name, value)` pairs, in declaration order.
    fn to_parameters(&self) -> Vec<(String, String)>;
}

impl<T: ToParameters + ?Sized> ToParameters for &T {
    fn to_parameters(&self) -> Vec<(String, String)> {
        (**self).to_parameters()
    }
}

impl ToParameters for [(String, String)] {
    fn to_parameters(&self) -> Vec<(String, String)> {
        self.to_vec()
    }
}

impl ToParameters for Vec<(String, String)> {
    fn to_parameters(&self) -> Vec<(String, String)> {
        self.clone()
    }
}

/// Name filter applied by [`crate::Request::add_object_filtered`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectFilter<'a> {
    /// Keep only the listed names.
    Include(&'a [&'a str]),
    /// Drop the listed names.
    Exclude(&'a [&'a str]),
}

impl ObjectFilter<'_> {
    /// Returns `true` if a pair with this name is kept.
    #[must_use]
    pub fn allows(&self, name: &str) -> bool {
        match self {
            Self::Include(names) => names.contains(&name),
            Self::Exclude(names) => !names.contains(&name),
        }
    }
}
