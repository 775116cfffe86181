//! Raw transport responses and the response envelope.
//!
//! A transport returns a [`RawResponse`]. Execution wraps it into a
//! [`Response`] envelope that also records how the execution ended
//! ([`ResponseStatus`]), the deserialized data and any error. Failures are
//! carried by the envelope instead of being returned as `Err`:
//!
//! ```
//! use courier_core::{Error, Response, ResponseStatus};
//!
//! let response = Response::<()>::failed(None, Error::Timeout);
//! assert_eq!(response.response_status(), ResponseStatus::TimedOut);
//! assert!(!response.is_successful());
//! ```

use std::borrow::Cow;

use bytes::Bytes;
use http::HeaderMap;
use http::header::CONTENT_TYPE;
use url::Url;

use crate::{Error, Result};

/// Response as returned by a transport, before any deserialization.
#[derive(Debug, Clone, Default)]
pub struct RawResponse {
    status: u16,
    headers: HeaderMap,
    body: Bytes,
}

impl RawResponse {
    /// Create a raw response.
    #[must_use]
    pub fn new(status: u16, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Set the status code.
    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable response headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// First value of a header, if it is valid text.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Response body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Replace the body.
    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }

    /// Status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Consume into `(status, headers, body)`.
    #[must_use]
    pub fn into_parts(self) -> (u16, HeaderMap, Bytes) {
        (self.status, self.headers, self.body)
    }
}

/// How an execution ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResponseStatus {
    /// Not finished yet.
    #[default]
    None,
    /// A response was received (whatever its HTTP status).
    Completed,
    /// The execution failed: build, transport, interceptor or
    /// deserialization error.
    Error,
    /// The deadline elapsed before a response arrived.
    TimedOut,
    /// The execution was cancelled.
    Aborted,
}

impl ResponseStatus {
    /// The status an execution ends with when it fails with `error`.
    #[must_use]
    pub const fn for_error(error: &Error) -> Self {
        match error {
            Error::Timeout => Self::TimedOut,
            Error::Aborted => Self::Aborted,
            _ => Self::Error,
        }
    }
}

/// Result of one execution.
///
/// The envelope is produced for every execution, successful or not. Check
/// [`Response::is_successful`] or [`Response::response_status`], or convert
/// with [`Response::into_result`] to use `?`.
///
/// A non-2xx status is not an execution failure: the envelope is
/// [`ResponseStatus::Completed`] and [`Response::is_success_status_code`] is
/// `false`.
#[derive(Debug)]
pub struct Response<T = ()> {
    url: Option<Url>,
    status: u16,
    headers: HeaderMap,
    raw_bytes: Bytes,
    data: Option<T>,
    response_status: ResponseStatus,
    error: Option<Error>,
}

impl<T> Default for Response<T> {
    fn default() -> Self {
        Self {
            url: None,
            status: 0,
            headers: HeaderMap::new(),
            raw_bytes: Bytes::new(),
            data: None,
            response_status: ResponseStatus::None,
            error: None,
        }
    }
}

impl Response<()> {
    /// Envelope for a received response.
    #[must_use]
    pub fn from_raw(url: Option<Url>, raw: RawResponse) -> Self {
        let (status, headers, raw_bytes) = raw.into_parts();
        Self {
            url,
            status,
            headers,
            raw_bytes,
            data: None,
            response_status: ResponseStatus::Completed,
            error: None,
        }
    }
}

impl<T> Response<T> {
    /// Envelope for a failed execution. Carries no response payload.
    #[must_use]
    pub fn failed(url: Option<Url>, error: Error) -> Self {
        Self {
            url,
            response_status: ResponseStatus::for_error(&error),
            error: Some(error),
            ..Self::default()
        }
    }

    /// The request URL, when building succeeded.
    #[must_use]
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    /// HTTP status code, `0` if no response was received.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable response headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// First value of a header (case-insensitive), if it is valid text.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The `Content-Type` header.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    /// Raw response body.
    #[must_use]
    pub fn raw_bytes(&self) -> &Bytes {
        &self.raw_bytes
    }

    /// Replace the raw response body.
    pub fn set_raw_bytes(&mut self, body: impl Into<Bytes>) {
        self.raw_bytes = body.into();
    }

    /// Response body as text, invalid UTF-8 replaced.
    #[must_use]
    pub fn content(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.raw_bytes)
    }

    /// Deserialized data, if any.
    #[must_use]
    pub const fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    /// Mutable deserialized data.
    pub fn data_mut(&mut self) -> Option<&mut T> {
        self.data.as_mut()
    }

    /// How the execution ended.
    #[must_use]
    pub const fn response_status(&self) -> ResponseStatus {
        self.response_status
    }

    /// The execution error, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Record a failure. The response status follows the error kind.
    pub fn set_error(&mut self, error: Error) {
        self.response_status = ResponseStatus::for_error(&error);
        self.error = Some(error);
    }

    /// Take the error out of the envelope.
    pub fn take_error(&mut self) -> Option<Error> {
        self.error.take()
    }

    /// Status is 2xx.
    #[must_use]
    pub const fn is_success_status_code(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Status is 2xx, the execution completed and nothing failed.
    #[must_use]
    pub const fn is_successful(&self) -> bool {
        self.is_success_status_code()
            && matches!(self.response_status, ResponseStatus::Completed)
            && self.error.is_none()
    }

    /// Replace the data type.
    #[must_use]
    pub fn with_data<U>(self, data: Option<U>) -> Response<U> {
        Response {
            url: self.url,
            status: self.status,
            headers: self.headers,
            raw_bytes: self.raw_bytes,
            data,
            response_status: self.response_status,
            error: self.error,
        }
    }

    /// Turn a non-2xx status into [`Error::Http`], keeping the body.
    pub fn error_for_status(self) -> Result<Self> {
        if self.status != 0 && !self.is_success_status_code() {
            let message = http::StatusCode::from_u16(self.status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("unexpected status")
                .to_string();
            return Err(Error::http_with_body(self.status, message, self.raw_bytes));
        }
        Ok(self)
    }

    /// Convert into `Result`: the execution error, or an HTTP error for a
    /// non-2xx status, or the envelope itself.
    pub fn into_result(mut self) -> Result<Self> {
        if let Some(error) = self.error.take() {
            return Err(error);
        }
        self.error_for_status()
    }

    /// Convert into the deserialized data.
    ///
    /// Fails like [`Response::into_result`], or with
    /// [`Error::Deserialization`] when the response had no content.
    pub fn into_data(self) -> Result<T> {
        self.into_result()?.data.ok_or_else(|| {
            Error::deserialization(crate::DataFormat::None, ".", "response has no content")
        })
    }
}

#[cfg(test)]
mod tests {
    use http::HeaderValue;

    use super::*;

    fn raw(status: u16, body: &'static str) -> RawResponse {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        RawResponse::new(status, headers, body)
    }

    #[test]
    fn raw_response_accessors() {
        let mut response = raw(201, "{}");
        assert_eq!(response.status(), 201);
        assert!(response.is_success());
        assert_eq!(response.header("Content-Type"), Some("application/json"));

        response.set_status(503);
        response.set_body("down");
        assert!(!response.is_success());
        assert_eq!(response.body().as_ref(), b"down");
    }

    #[test]
    fn completed_envelope() {
        let response = Response::from_raw(None, raw(200, r#"{"id":1}"#)).with_data(Some(1_u32));
        assert_eq!(response.response_status(), ResponseStatus::Completed);
        assert!(response.is_successful());
        assert_eq!(response.content(), r#"{"id":1}"#);
        assert_eq!(response.content_type(), Some("application/json"));
        assert_eq!(response.into_data().expect("data"), 1);
    }

    #[test]
    fn non_success_status_is_completed_but_not_successful() {
        let response = Response::from_raw(None, raw(404, "missing"));
        assert_eq!(response.response_status(), ResponseStatus::Completed);
        assert!(!response.is_success_status_code());
        assert!(!response.is_successful());

        let err = response.into_result().expect_err("404");
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), "HTTP error 404: Not Found");
        assert_eq!(err.body().map(AsRef::as_ref), Some(&b"missing"[..]));
    }

    #[test]
    fn deserialization_failure_keeps_success_status_code() {
        let mut response = Response::from_raw(None, raw(200, "oops")).with_data::<u32>(None);
        response.set_error(Error::deserialization(crate::DataFormat::Json, ".", "bad"));

        assert!(response.is_success_status_code());
        assert!(!response.is_successful());
        assert_eq!(response.response_status(), ResponseStatus::Error);
        assert!(matches!(
            response.into_result(),
            Err(Error::Deserialization { .. })
        ));
    }

    #[test]
    fn failure_status_follows_error_kind() {
        assert_eq!(
            Response::<()>::failed(None, Error::Aborted).response_status(),
            ResponseStatus::Aborted
        );
        assert_eq!(
            Response::<()>::failed(None, Error::connection("refused")).response_status(),
            ResponseStatus::Error
        );
        assert_eq!(Response::<()>::failed(None, Error::Timeout).status(), 0);
    }

    #[test]
    fn empty_content_has_no_data() {
        let response = Response::from_raw(None, raw(204, "")).with_data::<String>(None);
        assert!(response.is_successful());
        assert!(matches!(
            response.into_data(),
            Err(Error::Deserialization { .. })
        ));
    }
}
