//! Turning a [`Request`] into a [`WireRequest`].

use std::sync::Arc;

use http::header::{ACCEPT, CONTENT_ENCODING, CONTENT_TYPE, COOKIE};
use http::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::body::{FORM_URL_ENCODED, to_form};
use crate::{
    Body, DataFormat, Error, Form, Parameter, ParameterKind, Part, Request, RequestBody, Result,
    Serializer, SerializerRegistry, WireRequest, build_uri,
};

/// Client-level inputs to request building.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    base_url: Url,
    default_headers: HeaderMap,
    registry: Arc<SerializerRegistry>,
    default_format: DataFormat,
    accept: Option<String>,
}

impl BuildOptions {
    /// Create options with the default registry (JSON) and no default headers.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            default_headers: HeaderMap::new(),
            registry: Arc::new(SerializerRegistry::with_defaults()),
            default_format: DataFormat::Json,
            accept: None,
        }
    }

    /// Headers sent with every request unless the request sets them.
    #[must_use]
    pub fn with_default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = headers;
        self
    }

    /// Serializer registry used for bodies and responses.
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<SerializerRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Data format used for bodies without an explicit format.
    #[must_use]
    pub const fn with_default_format(mut self, format: DataFormat) -> Self {
        self.default_format = format;
        self
    }

    /// Fixed `Accept` value instead of the registry's content types.
    #[must_use]
    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    /// Base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Default headers.
    #[must_use]
    pub fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }

    /// Serializer registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<SerializerRegistry> {
        &self.registry
    }

    /// Default body data format.
    #[must_use]
    pub const fn default_format(&self) -> DataFormat {
        self.default_format
    }

    /// The `Accept` value sent when a request does not set one.
    #[must_use]
    pub fn accept(&self) -> String {
        self.accept
            .clone()
            .unwrap_or_else(|| self.registry.accept_header())
    }
}

/// Build the wire request.
///
/// Routing rules:
/// - `UrlSegment` and `Query` parameters go to the URI.
/// - `GetOrPost` parameters become form fields for POST-like methods without
///   a body, multipart fields when the body is multipart, and query pairs
///   otherwise.
/// - Files (or `always_multipart_form_data`) produce a `multipart/form-data`
///   body; a request body then travels as one more part.
/// - Headers: defaults, overridden by request headers of the same name.
///   `Cookie` parameters are joined into one `Cookie` header.
/// - `Accept` and `Content-Type` are set unless already present.
///
/// The body serializer is picked from: the body's own format, the request's
/// serializer override, the request's data format, then the client default.
pub fn build_request(request: Request, options: &BuildOptions) -> Result<WireRequest> {
    let parts = request.into_parts();

    if let Some(param) = parts.parameters.iter().find(|p| p.name().is_empty()) {
        return Err(Error::invalid_request(format!(
            "{} parameter name must not be empty",
            param.kind()
        )));
    }
    if let Some(file) = parts.files.iter().find(|f| f.name().is_empty()) {
        return Err(Error::invalid_request(format!(
            "file parameter name must not be empty (file `{}`)",
            file.file_name()
        )));
    }

    let multipart = parts.always_multipart || !parts.files.is_empty();
    let form_body = parts.method.allows_body() && parts.body.is_none();
    let url = uri_for(
        &options.base_url,
        &parts.resource,
        &parts.parameters,
        !multipart && !form_body,
    )?;

    let mut headers = merge_headers(&options.default_headers, &parts.parameters)?;

    let body_serializer = select_serializer(
        parts.body.as_ref(),
        parts.serializer.as_ref(),
        parts.data_format,
        options,
    )?;

    let fields: Vec<&Parameter> = parts
        .parameters
        .iter()
        .filter(|p| p.kind() == ParameterKind::GetOrPost)
        .collect();

    let body = if multipart {
        let mut form = Form::new();
        for field in &fields {
            form.push(match field.content_type() {
                Some(content_type) => Part::data(field.name(), content_type, field.value().to_string()),
                None => Part::field(field.name(), field.value()),
            });
        }
        if let Some(body) = &parts.body {
            form.push(body_part(body, body_serializer.as_deref())?);
        }
        for file in parts.files {
            form.push(file.into_part()?);
        }
        let (content_type, content) = form.into_body();
        set_if_absent(&mut headers, CONTENT_TYPE, &content_type)?;
        Body::Binary(content)
    } else if let Some(body) = &parts.body {
        let (content_type, content_encoding, body) =
            encode_body(body, body_serializer.as_deref())?;
        set_if_absent(&mut headers, CONTENT_TYPE, &content_type)?;
        if let Some(encoding) = content_encoding {
            set_if_absent(&mut headers, CONTENT_ENCODING, &encoding)?;
        }
        body
    } else if form_body && !fields.is_empty() {
        let pairs: Vec<(&str, &str)> = fields.iter().map(|p| (p.name(), p.value())).collect();
        set_if_absent(&mut headers, CONTENT_TYPE, FORM_URL_ENCODED)?;
        Body::Text(to_form(&pairs)?)
    } else {
        Body::Empty
    };

    let accept = options.accept();
    if !accept.is_empty() {
        set_if_absent(&mut headers, ACCEPT, &accept)?;
    }

    Ok(WireRequest::new(parts.method, url, headers, body))
}

/// The URI [`build_request`] produces for `request`, without consuming it.
pub fn request_uri(request: &Request, base_url: &Url) -> Result<Url> {
    let multipart = request.is_always_multipart() || !request.files().is_empty();
    let form_body = request.method().allows_body() && request.body().is_none();
    uri_for(
        base_url,
        request.resource(),
        request.parameters(),
        !multipart && !form_body,
    )
}

fn uri_for(
    base_url: &Url,
    resource: &str,
    parameters: &[Parameter],
    get_or_post_in_query: bool,
) -> Result<Url> {
    let segments = parameters
        .iter()
        .filter(|p| p.kind() == ParameterKind::UrlSegment);
    let query = parameters.iter().filter(|p| match p.kind() {
        ParameterKind::Query => true,
        ParameterKind::GetOrPost => get_or_post_in_query,
        _ => false,
    });
    build_uri(base_url, resource, segments, query)
}

/// Defaults first, then request headers replacing defaults of the same name.
fn merge_headers(defaults: &HeaderMap, parameters: &[Parameter]) -> Result<HeaderMap> {
    let mut headers = defaults.clone();
    let mut replaced: Vec<HeaderName> = Vec::new();

    for param in parameters.iter().filter(|p| p.kind() == ParameterKind::Header) {
        let name = header_name(param.name())?;
        let value = header_value(param.value())?;
        if !replaced.contains(&name) {
            headers.remove(&name);
            replaced.push(name.clone());
        }
        headers.append(name, value);
    }

    let cookies: Vec<String> = parameters
        .iter()
        .filter(|p| p.kind() == ParameterKind::Cookie)
        .map(|p| format!("{}={}", p.name(), p.value()))
        .collect();
    if !cookies.is_empty() {
        let mut cookie = cookies.join("; ");
        if let Some(existing) = headers.get(COOKIE).and_then(|v| v.to_str().ok()) {
            cookie = format!("{existing}; {cookie}");
        }
        headers.insert(COOKIE, header_value(&cookie)?);
    }

    Ok(headers)
}

/// Request override, then the body's own format, then the request data
/// format or the client default.
fn select_serializer(
    body: Option<&RequestBody>,
    override_serializer: Option<&Arc<dyn Serializer>>,
    data_format: Option<DataFormat>,
    options: &BuildOptions,
) -> Result<Option<Arc<dyn Serializer>>> {
    let Some(RequestBody::Object { format, .. }) = body else {
        return Ok(None);
    };

    if let Some(serializer) = override_serializer {
        return Ok(Some(Arc::clone(serializer)));
    }
    if let Some(format) = format {
        return options.registry.resolve_by_format(*format).map(Some);
    }
    let format = data_format.unwrap_or(options.default_format);
    match options.registry.resolve_by_format(format) {
        Ok(serializer) => Ok(Some(serializer)),
        Err(err) => options.registry.default_serializer().map(Some).ok_or(err),
    }
}

/// `(content type, content encoding, body)` for a non-multipart body.
fn encode_body(
    body: &RequestBody,
    serializer: Option<&dyn Serializer>,
) -> Result<(String, Option<String>, Body)> {
    match body {
        RequestBody::Object { value, .. } => {
            let serializer = serializer.ok_or_else(|| {
                Error::unsupported_content_type("no serializer for the request body")
            })?;
            let value: &dyn erased_serde::Serialize = value.as_ref();
            let body = if serializer.is_binary() {
                Body::Binary(serializer.serialize_bytes(value)?)
            } else {
                Body::Text(serializer.serialize(value)?)
            };
            Ok((
                serializer.content_type().to_string(),
                serializer.content_encoding().map(str::to_string),
                body,
            ))
        }
        RequestBody::Text {
            content,
            content_type,
        } => Ok((content_type.clone(), None, Body::Text(content.clone()))),
        RequestBody::Bytes {
            content,
            content_type,
        } => Ok((content_type.clone(), None, Body::Binary(content.clone()))),
    }
}

fn body_part(body: &RequestBody, serializer: Option<&dyn Serializer>) -> Result<Part> {
    let name = match body {
        RequestBody::Object {
            name: Some(name), ..
        } => name.as_str(),
        _ => "body",
    };
    let (content_type, _, content) = encode_body(body, serializer)?;
    Ok(Part::data(name, content_type, content.into_bytes()))
}

fn set_if_absent(headers: &mut HeaderMap, name: HeaderName, value: &str) -> Result<()> {
    if !headers.contains_key(&name) {
        headers.insert(name, header_value(value)?);
    }
    Ok(())
}

fn header_name(name: &str) -> Result<HeaderName> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| Error::invalid_request(format!("invalid header name `{name}`: {e}")))
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| Error::invalid_request(format!("invalid header value `{value}`: {e}")))
}
