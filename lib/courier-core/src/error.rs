//! Error types for courier.
//!
//! Errors fall into four families:
//! - build errors, raised before any network activity
//!   ([`Error::MissingSegment`], [`Error::InvalidUri`],
//!   [`Error::UnsupportedContentType`], ...);
//! - transport errors ([`Error::Connection`], [`Error::NameResolution`],
//!   [`Error::Timeout`], [`Error::Aborted`], ...);
//! - (de)serialization errors;
//! - interceptor and authenticator failures.

use derive_more::{Display, Error, From};

use crate::DataFormat;

/// Main error type for courier operations.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// The resource template references a `{name}` with no URL segment parameter.
    #[display("missing URL segment parameter for `{{{name}}}`")]
    #[from(skip)]
    MissingSegment {
        /// Placeholder name found in the template.
        #[error(not(source))]
        name: String,
    },

    /// The combined base URL and resource do not form a valid absolute URI.
    #[display("invalid URI: {_0}")]
    #[from]
    InvalidUri(url::ParseError),

    /// No serializer is registered for a content type and no default exists.
    #[display("unsupported content type: {_0}")]
    #[from(skip)]
    UnsupportedContentType(#[error(not(source))] String),

    /// The operation is not supported by this serializer.
    #[display("unsupported operation: {_0}")]
    #[from(skip)]
    UnsupportedOperation(#[error(not(source))] String),

    /// A value could not be serialized to the wire format.
    #[display("{format} serialization error: {message}")]
    #[from(skip)]
    Serialization {
        /// Format in use.
        format: DataFormat,
        /// Error message.
        message: String,
    },

    /// Response content could not be deserialized into the requested type.
    #[display("{format} deserialization error at '{path}': {message}")]
    #[from(skip)]
    Deserialization {
        /// Format in use.
        format: DataFormat,
        /// Path to the failing field (e.g. `user.address.city`), `.` when unknown.
        path: String,
        /// Error message.
        message: String,
    },

    /// Non-2xx status surfaced by [`crate::Response::error_for_status`].
    #[display("HTTP error {status}: {message}")]
    #[from(skip)]
    Http {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
        /// Response body, if available.
        #[error(not(source))]
        body: Option<bytes::Bytes>,
    },

    /// Invalid request configuration (bad header name, conflicting parameters).
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// Network/connection errors.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(#[error(not(source))] String),

    /// Host name could not be resolved.
    #[display("name resolution failure: {_0}")]
    #[from(skip)]
    NameResolution(#[error(not(source))] String),

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    #[from(skip)]
    Tls(#[error(not(source))] String),

    /// The execution deadline elapsed.
    #[display("request timeout")]
    #[from(skip)]
    Timeout,

    /// The execution was cancelled by the caller.
    #[display("request aborted")]
    #[from(skip)]
    Aborted,

    /// An interceptor hook failed and aborted the pipeline.
    #[display("interceptor error: {_0}")]
    #[from(skip)]
    Interceptor(#[error(not(source))] String),

    /// An authenticator failed to apply credentials.
    #[display("authentication error: {_0}")]
    #[from(skip)]
    Authentication(#[error(not(source))] String),

    /// I/O failure while producing or compressing body data.
    #[display("I/O error: {_0}")]
    #[from]
    Io(std::io::Error),
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a missing URL segment error.
    #[must_use]
    pub fn missing_segment(name: impl Into<String>) -> Self {
        Self::MissingSegment { name: name.into() }
    }

    /// Create an unsupported content type error.
    #[must_use]
    pub fn unsupported_content_type(content_type: impl Into<String>) -> Self {
        Self::UnsupportedContentType(content_type.into())
    }

    /// Create an unsupported operation error.
    #[must_use]
    pub fn unsupported_operation(message: impl Into<String>) -> Self {
        Self::UnsupportedOperation(message.into())
    }

    /// Create a serialization error.
    #[must_use]
    pub fn serialization(format: DataFormat, message: impl ToString) -> Self {
        Self::Serialization {
            format,
            message: message.to_string(),
        }
    }

    /// Create a deserialization error with path context.
    #[must_use]
    pub fn deserialization(
        format: DataFormat,
        path: impl Into<String>,
        message: impl ToString,
    ) -> Self {
        Self::Deserialization {
            format,
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create an HTTP error with body.
    #[must_use]
    pub fn http_with_body(status: u16, message: impl Into<String>, body: bytes::Bytes) -> Self {
        Self::Http {
            status,
            message: message.into(),
            body: Some(body),
        }
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a name resolution error.
    #[must_use]
    pub fn name_resolution(message: impl Into<String>) -> Self {
        Self::NameResolution(message.into())
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create an interceptor error.
    #[must_use]
    pub fn interceptor(message: impl Into<String>) -> Self {
        Self::Interceptor(message.into())
    }

    /// Create an authentication error.
    #[must_use]
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication(message.into())
    }

    /// Returns `true` for errors raised while building the request.
    #[must_use]
    pub const fn is_build_error(&self) -> bool {
        matches!(
            self,
            Self::MissingSegment { .. }
                | Self::InvalidUri(_)
                | Self::UnsupportedContentType(_)
                | Self::InvalidRequest(_)
                | Self::Serialization { .. }
        )
    }

    /// Returns `true` for errors raised by the transport.
    #[must_use]
    pub const fn is_transport_error(&self) -> bool {
        matches!(
            self,
            Self::Connection(_)
                | Self::NameResolution(_)
                | Self::Tls(_)
                | Self::Timeout
                | Self::Aborted
        )
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns `true` if the execution was cancelled.
    #[must_use]
    pub const fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }

    /// Returns `true` if this is a connection or name resolution error.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::NameResolution(_))
    }

    /// Returns the HTTP status code if this is an HTTP error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the response body if this is an HTTP error with a body.
    #[must_use]
    pub fn body(&self) -> Option<&bytes::Bytes> {
        match self {
            Self::Http { body, .. } => body.as_ref(),
            _ => None,
        }
    }
}
