//! Request descriptions and wire requests.
//!
//! A [`Request`] describes *what* to send: a resource template, a method and
//! an ordered list of parameters. [`crate::build_request`] turns it into a
//! [`WireRequest`], the fully resolved request handed to a transport.
//!
//! # Example
//!
//! ```
//! use courier_core::{Method, Request};
//!
//! let request = Request::new("/users/{id}/posts", Method::Get)
//!     .add_url_segment("id", 42)
//!     .add_query_parameter("tag", "rust")
//!     .add_query_parameter("tag", "http")
//!     .add_header("X-Trace", "abc");
//!
//! assert_eq!(request.parameters().len(), 4);
//! ```

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::HeaderMap;
use url::Url;

use crate::{
    Body, DataFormat, FileParameter, Method, ObjectFilter, Parameter, ParameterKind, RequestBody,
    Serializer, ToParameters,
};

/// Description of a request, owned by the caller until it is executed.
#[derive(Debug)]
pub struct Request {
    resource: String,
    method: Method,
    parameters: Vec<Parameter>,
    files: Vec<FileParameter>,
    body: Option<RequestBody>,
    serializer: Option<Arc<dyn Serializer>>,
    data_format: Option<DataFormat>,
    always_multipart: bool,
    timeout: Option<Duration>,
}

impl Default for Request {
    fn default() -> Self {
        Self::new("", Method::Get)
    }
}

impl Request {
    /// Create a request for a resource template such as `/users/{id}`.
    #[must_use]
    pub fn new(resource: impl Into<String>, method: Method) -> Self {
        Self {
            resource: resource.into(),
            method,
            parameters: Vec::new(),
            files: Vec::new(),
            body: None,
            serializer: None,
            data_format: None,
            always_multipart: false,
            timeout: None,
        }
    }

    /// Create a GET request.
    #[must_use]
    pub fn get(resource: impl Into<String>) -> Self {
        Self::new(resource, Method::Get)
    }

    /// Create a POST request.
    #[must_use]
    pub fn post(resource: impl Into<String>) -> Self {
        Self::new(resource, Method::Post)
    }

    /// Create a PUT request.
    #[must_use]
    pub fn put(resource: impl Into<String>) -> Self {
        Self::new(resource, Method::Put)
    }

    /// Create a PATCH request.
    #[must_use]
    pub fn patch(resource: impl Into<String>) -> Self {
        Self::new(resource, Method::Patch)
    }

    /// Create a DELETE request.
    #[must_use]
    pub fn delete(resource: impl Into<String>) -> Self {
        Self::new(resource, Method::Delete)
    }

    // ------------------------------------------------------------------
    // Builder
    // ------------------------------------------------------------------

    /// Add a `GetOrPost` parameter: query string for GET-like methods, form
    /// field for POST-like methods.
    #[must_use]
    pub fn add_parameter(self, name: impl Into<String>, value: impl ToString) -> Self {
        self.add_param(Parameter::get_or_post(name, value))
    }

    /// Add a query string parameter. Repeated names are all sent.
    #[must_use]
    pub fn add_query_parameter(self, name: impl Into<String>, value: impl ToString) -> Self {
        self.add_param(Parameter::query(name, value))
    }

    /// Add a value for a `{name}` placeholder of the resource template.
    #[must_use]
    pub fn add_url_segment(self, name: impl Into<String>, value: impl ToString) -> Self {
        self.add_param(Parameter::url_segment(name, value))
    }

    /// Add a header.
    #[must_use]
    pub fn add_header(self, name: impl Into<String>, value: impl ToString) -> Self {
        self.add_param(Parameter::header(name, value))
    }

    /// Add several headers.
    #[must_use]
    pub fn add_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        self.parameters.extend(
            headers
                .into_iter()
                .map(|(name, value)| Parameter::header(name, value)),
        );
        self
    }

    /// Add a cookie.
    #[must_use]
    pub fn add_cookie(self, name: impl Into<String>, value: impl ToString) -> Self {
        self.add_param(Parameter::cookie(name, value))
    }

    /// Add a prepared parameter.
    #[must_use]
    pub fn add_param(mut self, parameter: Parameter) -> Self {
        self.push_parameter(parameter);
        self
    }

    /// Add a file, sent as part of a `multipart/form-data` body.
    #[must_use]
    pub fn add_file(mut self, file: FileParameter) -> Self {
        self.files.push(file);
        self
    }

    /// Set the request body, replacing any previous body.
    #[must_use]
    pub fn add_body(mut self, body: RequestBody) -> Self {
        self.set_body(body);
        self
    }

    /// Set a body serialized as JSON.
    #[must_use]
    pub fn add_json_body<T>(self, value: T) -> Self
    where
        T: serde::Serialize + Send + Sync + 'static,
    {
        self.add_body(RequestBody::object_as(value, DataFormat::Json))
    }

    /// Set a body serialized as XML.
    #[must_use]
    pub fn add_xml_body<T>(self, value: T) -> Self
    where
        T: serde::Serialize + Send + Sync + 'static,
    {
        self.add_body(RequestBody::object_as(value, DataFormat::Xml))
    }

    /// Set a text body sent without serialization.
    #[must_use]
    pub fn add_string_body(self, content: impl Into<String>, content_type: impl Into<String>) -> Self {
        self.add_body(RequestBody::Text {
            content: content.into(),
            content_type: content_type.into(),
        })
    }

    /// Set a binary body sent without serialization.
    #[must_use]
    pub fn add_bytes_body(self, content: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        self.add_body(RequestBody::Bytes {
            content: content.into(),
            content_type: content_type.into(),
        })
    }

    /// Add every pair of `value` as a query parameter.
    ///
    /// `None` fields produce no parameter.
    #[must_use]
    pub fn add_object<T: ToParameters + ?Sized>(mut self, value: &T) -> Self {
        self.parameters.extend(
            value
                .to_parameters()
                .into_iter()
                .map(|(name, value)| Parameter::query(name, value)),
        );
        self
    }

    /// Like [`Request::add_object`], keeping only names allowed by `filter`.
    #[must_use]
    pub fn add_object_filtered<T: ToParameters + ?Sized>(
        mut self,
        value: &T,
        filter: ObjectFilter<'_>,
    ) -> Self {
        self.parameters.extend(
            value
                .to_parameters()
                .into_iter()
                .filter(|(name, _)| filter.allows(name))
                .map(|(name, value)| Parameter::query(name, value)),
        );
        self
    }

    /// Serialize the body with this serializer instead of the client's.
    #[must_use]
    pub fn with_serializer(mut self, serializer: impl Serializer + 'static) -> Self {
        self.serializer = Some(Arc::new(serializer));
        self
    }

    /// Serialize the body with the client's serializer for `format`.
    #[must_use]
    pub const fn with_data_format(mut self, format: DataFormat) -> Self {
        self.data_format = Some(format);
        self
    }

    /// Send a `multipart/form-data` body even without files.
    #[must_use]
    pub const fn always_multipart_form_data(mut self, always: bool) -> Self {
        self.always_multipart = always;
        self
    }

    /// Deadline for this execution, overriding the client timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    // ------------------------------------------------------------------
    // In-place mutation, for authenticators and interceptors
    // ------------------------------------------------------------------

    /// Append a parameter.
    pub fn push_parameter(&mut self, parameter: Parameter) {
        self.parameters.push(parameter);
    }

    /// Append a parameter unless one with the same name and kind exists.
    ///
    /// Returns `true` if the parameter was added.
    pub fn push_parameter_if_absent(&mut self, parameter: Parameter) -> bool {
        if self.has_parameter(parameter.name(), parameter.kind()) {
            return false;
        }
        self.parameters.push(parameter);
        true
    }

    /// Remove every parameter with this name and kind.
    pub fn remove_parameter(&mut self, name: &str, kind: ParameterKind) {
        self.parameters.retain(|p| !p.matches(name, kind));
    }

    /// Set the body, replacing any previous body.
    pub fn set_body(&mut self, body: RequestBody) {
        self.body = Some(body);
    }

    /// Change the resource template.
    pub fn set_resource(&mut self, resource: impl Into<String>) {
        self.resource = resource.into();
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Resource template.
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Parameters in insertion order.
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Files in insertion order.
    #[must_use]
    pub fn files(&self) -> &[FileParameter] {
        &self.files
    }

    /// The request body, if any.
    #[must_use]
    pub const fn body(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }

    /// Per-request serializer override.
    #[must_use]
    pub fn serializer(&self) -> Option<&Arc<dyn Serializer>> {
        self.serializer.as_ref()
    }

    /// Per-request data format.
    #[must_use]
    pub const fn data_format(&self) -> Option<DataFormat> {
        self.data_format
    }

    /// Returns `true` if the body is multipart regardless of files.
    #[must_use]
    pub const fn is_always_multipart(&self) -> bool {
        self.always_multipart
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Returns `true` if a parameter with this name and kind exists.
    ///
    /// Header and cookie names compare case-insensitively.
    #[must_use]
    pub fn has_parameter(&self, name: &str, kind: ParameterKind) -> bool {
        self.parameter(name, kind).is_some()
    }

    /// First parameter with this name and kind.
    #[must_use]
    pub fn parameter(&self, name: &str, kind: ParameterKind) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.matches(name, kind))
    }

    pub(crate) fn into_parts(self) -> RequestParts {
        RequestParts {
            resource: self.resource,
            method: self.method,
            parameters: self.parameters,
            files: self.files,
            body: self.body,
            serializer: self.serializer,
            data_format: self.data_format,
            always_multipart: self.always_multipart,
        }
    }
}

pub(crate) struct RequestParts {
    pub(crate) resource: String,
    pub(crate) method: Method,
    pub(crate) parameters: Vec<Parameter>,
    pub(crate) files: Vec<FileParameter>,
    pub(crate) body: Option<RequestBody>,
    pub(crate) serializer: Option<Arc<dyn Serializer>>,
    pub(crate) data_format: Option<DataFormat>,
    pub(crate) always_multipart: bool,
}

/// A fully resolved request, ready for a transport.
#[derive(Debug, Clone)]
pub struct WireRequest {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Body,
}

impl WireRequest {
    /// Create a wire request.
    #[must_use]
    pub fn new(method: Method, url: Url, headers: HeaderMap, body: Body) -> Self {
        Self {
            method,
            url,
            headers,
            body,
        }
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Absolute request URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Replace the URL.
    pub fn set_url(&mut self, url: Url) {
        self.url = url;
    }

    /// Headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// First value of a header, if it is valid text.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Body.
    #[must_use]
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Replace the body.
    pub fn set_body(&mut self, body: Body) {
        self.body = body;
    }

    /// Consume into `(method, url, headers, body)`.
    #[must_use]
    pub fn into_parts(self) -> (Method, Url, HeaderMap, Body) {
        (self.method, self.url, self.headers, self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JsonSerializer;

    #[test]
    fn builder_keeps_insertion_order() {
        let request = Request::get("/search")
            .add_query_parameter("type", "STAT")
            .add_query_parameter("type", "PICT")
            .add_parameter("count", 50);

        let names: Vec<_> = request.parameters().iter().map(Parameter::name).collect();
        assert_eq!(names, ["type", "type", "count"]);
        assert_eq!(
            request.parameters().get(2).map(Parameter::kind),
            Some(ParameterKind::GetOrPost)
        );
    }

    #[test]
    fn second_body_replaces_first() {
        let request = Request::post("/notes")
            .add_string_body("first", "text/plain")
            .add_json_body(vec![1, 2, 3]);

        match request.body() {
            Some(RequestBody::Object { format, .. }) => assert_eq!(*format, Some(DataFormat::Json)),
            other => panic!("unexpected body: {other:?}"),
        }
    }

    #[test]
    fn add_object_uses_query_parameters() {
        let pairs = vec![
            ("q".to_string(), "rust".to_string()),
            ("secret".to_string(), "x".to_string()),
        ];
        let request = Request::get("/s").add_object_filtered(&pairs, ObjectFilter::Exclude(&["secret"]));

        assert_eq!(request.parameters().len(), 1);
        assert!(request.has_parameter("q", ParameterKind::Query));
    }

    #[test]
    fn push_if_absent_is_case_insensitive_for_headers() {
        let mut request = Request::get("/").add_header("authorization", "X");
        assert!(!request.push_parameter_if_absent(Parameter::header("Authorization", "Y")));
        assert_eq!(
            request
                .parameter("AUTHORIZATION", ParameterKind::Header)
                .map(Parameter::value),
            Some("X")
        );

        assert!(request.push_parameter_if_absent(Parameter::query("Authorization", "Z")));
    }

    #[test]
    fn remove_parameter() {
        let mut request = Request::get("/")
            .add_header("X-A", 1)
            .add_header("x-a", 2)
            .add_header("X-B", 3);
        request.remove_parameter("X-A", ParameterKind::Header);
        assert_eq!(request.parameters().len(), 1);
    }

    #[test]
    fn serializer_override_and_options() {
        let request = Request::post("/")
            .with_serializer(JsonSerializer::pretty())
            .with_data_format(DataFormat::Xml)
            .always_multipart_form_data(true)
            .timeout(Duration::from_secs(3));

        assert!(request.serializer().is_some());
        assert_eq!(request.data_format(), Some(DataFormat::Xml));
        assert!(request.is_always_multipart());
        assert_eq!(request.request_timeout(), Some(Duration::from_secs(3)));
    }

    #[test]
    fn wire_request_header_lookup() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", http::HeaderValue::from_static("text/plain"));
        let wire = WireRequest::new(
            Method::Post,
            Url::parse("http://example.com/x").expect("url"),
            headers,
            Body::Text("hi".to_string()),
        );
        assert_eq!(wire.header("Content-Type"), Some("text/plain"));
        assert_eq!(wire.body().as_text(), Some("hi"));
    }
}
