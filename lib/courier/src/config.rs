//! Client and transport configuration.
//!
//! [`ClientOptions`] is built once and then shared read-only by every
//! execution of a [`crate::Client`]. [`TransportConfig`] tunes the default
//! hyper transport.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use courier_core::{
    BuildOptions, DataFormat, Error, HeaderMap, Result, Serializer, SerializerRegistry, header,
};
use http::{HeaderName, HeaderValue};
use url::Url;

use crate::auth::Authenticator;
use crate::interceptor::{Interceptor, InterceptorChain};

/// Default `User-Agent` header value.
pub const DEFAULT_USER_AGENT: &str = concat!("courier/", env!("CARGO_PKG_VERSION"));

/// Default execution timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(100);

// ============================================================================
// Client options
// ============================================================================

/// Options shared by every execution of a client.
///
/// Built with [`ClientOptions::builder`]; immutable afterwards.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use courier::{ClientOptions, DataFormat};
///
/// let options = ClientOptions::builder("https://api.example.com/v1")
///     .default_header("X-Api-Version", "2")
///     .timeout(Duration::from_secs(10))
///     .default_data_format(DataFormat::Json)
///     .build()?;
///
/// assert_eq!(options.base_url().as_str(), "https://api.example.com/v1");
/// # Ok::<(), courier::Error>(())
/// ```
#[derive(Clone)]
pub struct ClientOptions {
    build: BuildOptions,
    timeout: Option<Duration>,
    authenticator: Option<Arc<dyn Authenticator>>,
    interceptors: InterceptorChain,
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("base_url", &self.build.base_url().as_str())
            .field("default_headers", &self.build.default_headers().len())
            .field("default_format", &self.build.default_format())
            .field("timeout", &self.timeout)
            .field("authenticator", &self.authenticator)
            .field("interceptors", &self.interceptors.len())
            .finish()
    }
}

impl ClientOptions {
    /// Create a builder for a client targeting `base_url`.
    #[must_use]
    pub fn builder(base_url: impl Into<String>) -> ClientOptionsBuilder {
        ClientOptionsBuilder::new(base_url)
    }

    /// Base URL every resource is resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        self.build.base_url()
    }

    /// Headers sent with every request, including `User-Agent`.
    #[must_use]
    pub fn default_headers(&self) -> &HeaderMap {
        self.build.default_headers()
    }

    /// Execution timeout, unless overridden per request.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// The authenticator, if any.
    #[must_use]
    pub fn authenticator(&self) -> Option<&Arc<dyn Authenticator>> {
        self.authenticator.as_ref()
    }

    /// Interceptors, in chain order.
    #[must_use]
    pub const fn interceptors(&self) -> &InterceptorChain {
        &self.interceptors
    }

    /// Registered serializers.
    #[must_use]
    pub fn registry(&self) -> &SerializerRegistry {
        self.build.registry()
    }

    /// Format used for request bodies without an explicit one.
    #[must_use]
    pub const fn default_data_format(&self) -> DataFormat {
        self.build.default_format()
    }

    /// Options handed to the request builder.
    #[must_use]
    pub const fn build_options(&self) -> &BuildOptions {
        &self.build
    }
}

/// Builder for [`ClientOptions`].
pub struct ClientOptionsBuilder {
    base_url: String,
    headers: Vec<(String, String)>,
    user_agent: String,
    timeout: Option<Duration>,
    authenticator: Option<Arc<dyn Authenticator>>,
    interceptors: Vec<Arc<dyn Interceptor>>,
    registry: SerializerRegistry,
    default_format: DataFormat,
    accept: Option<String>,
}

impl fmt::Debug for ClientOptionsBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptionsBuilder")
            .field("base_url", &self.base_url)
            .field("headers", &self.headers.len())
            .field("user_agent", &self.user_agent)
            .field("timeout", &self.timeout)
            .field("interceptors", &self.interceptors.len())
            .field("default_format", &self.default_format)
            .finish_non_exhaustive()
    }
}

impl ClientOptionsBuilder {
    fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            headers: Vec::new(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Some(DEFAULT_TIMEOUT),
            authenticator: None,
            interceptors: Vec::new(),
            registry: SerializerRegistry::with_defaults(),
            default_format: DataFormat::Json,
            accept: None,
        }
    }

    /// Add a header sent with every request.
    ///
    /// Repeated names are all sent. A request header with the same name
    /// replaces them.
    #[must_use]
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add several default headers.
    #[must_use]
    pub fn default_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Set the `User-Agent` header value.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the execution timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Disable the execution timeout.
    #[must_use]
    pub const fn no_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Set the authenticator, invoked once per execution.
    #[must_use]
    pub fn authenticator(mut self, authenticator: impl Authenticator + 'static) -> Self {
        self.authenticator = Some(Arc::new(authenticator));
        self
    }

    /// Append an interceptor to the chain.
    #[must_use]
    pub fn interceptor(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Register a serializer, replacing the one registered for its format.
    #[must_use]
    pub fn serializer(mut self, serializer: impl Serializer + 'static) -> Self {
        self.registry.register(serializer);
        self
    }

    /// Register a serializer for explicit content types.
    #[must_use]
    pub fn serializer_for<I, S>(mut self, serializer: impl Serializer + 'static, content_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.registry.register_with(serializer, content_types);
        self
    }

    /// Replace the whole serializer registry.
    #[must_use]
    pub fn registry(mut self, registry: SerializerRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Format for request bodies and fallback for responses.
    #[must_use]
    pub const fn default_data_format(mut self, format: DataFormat) -> Self {
        self.default_format = format;
        self
    }

    /// Override the `Accept` header derived from the registry.
    #[must_use]
    pub fn accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    /// Validate and build the options.
    pub fn build(self) -> Result<ClientOptions> {
        let base_url = Url::parse(&self.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(Error::invalid_request(format!(
                "base URL `{}` cannot be a base",
                self.base_url
            )));
        }

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::invalid_request(format!("invalid header name `{name}`: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::invalid_request(format!("invalid value for `{name}`: {e}")))?;
            headers.append(name, value);
        }
        if !headers.contains_key(header::USER_AGENT) && !self.user_agent.is_empty() {
            let value = HeaderValue::from_str(&self.user_agent)
                .map_err(|e| Error::invalid_request(format!("invalid user agent: {e}")))?;
            headers.insert(header::USER_AGENT, value);
        }

        let mut registry = self.registry;
        registry.set_default(self.default_format);

        let mut build = BuildOptions::new(base_url)
            .with_default_headers(headers)
            .with_registry(Arc::new(registry))
            .with_default_format(self.default_format);
        if let Some(accept) = self.accept {
            build = build.with_accept(accept);
        }

        Ok(ClientOptions {
            build,
            timeout: self.timeout,
            authenticator: self.authenticator,
            interceptors: InterceptorChain::new(self.interceptors),
        })
    }
}

// ============================================================================
// Transport configuration
// ============================================================================

/// Configuration for the hyper transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Connection timeout duration.
    pub connect_timeout: Duration,
    /// Maximum idle connections per host.
    pub pool_idle_per_host: usize,
    /// Idle connection timeout.
    pub pool_idle_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            pool_idle_per_host: 32,
            pool_idle_timeout: Duration::from_secs(90),
        }
    }
}

impl TransportConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> TransportConfigBuilder {
        TransportConfigBuilder::default()
    }
}

/// Builder for [`TransportConfig`].
#[derive(Debug, Clone, Default)]
pub struct TransportConfigBuilder {
    connect_timeout: Option<Duration>,
    pool_idle_per_host: Option<usize>,
    pool_idle_timeout: Option<Duration>,
}

impl TransportConfigBuilder {
    /// Set the connection timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the maximum idle connections per host.
    #[must_use]
    pub const fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.pool_idle_per_host = Some(count);
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub const fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(timeout);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> TransportConfig {
        let defaults = TransportConfig::default();
        TransportConfig {
            connect_timeout: self.connect_timeout.unwrap_or(defaults.connect_timeout),
            pool_idle_per_host: self
                .pool_idle_per_host
                .unwrap_or(defaults.pool_idle_per_host),
            pool_idle_timeout: self.pool_idle_timeout.unwrap_or(defaults.pool_idle_timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use courier_core::{MessagePackSerializer, XmlSerializer};

    use super::*;

    #[test]
    fn defaults() {
        let options = ClientOptions::builder("http://example.com")
            .build()
            .expect("options");

        check!(options.base_url().as_str() == "http://example.com/");
        check!(options.timeout() == Some(DEFAULT_TIMEOUT));
        check!(options.default_data_format() == DataFormat::Json);
        check!(options.authenticator().is_none());
        check!(options.interceptors().is_empty());
        check!(
            options.default_headers().get(header::USER_AGENT)
                == Some(&HeaderValue::from_static(DEFAULT_USER_AGENT))
        );
    }

    #[test]
    fn builder_overrides() {
        let options = ClientOptions::builder("http://example.com/api")
            .default_header("X-Trace", "1")
            .default_headers([("X-Tenant", "acme"), ("X-Trace", "2")])
            .user_agent("acme-sync/3.1")
            .no_timeout()
            .serializer(XmlSerializer::new())
            .default_data_format(DataFormat::Xml)
            .accept("application/xml")
            .build()
            .expect("options");

        let trace: Vec<_> = options
            .default_headers()
            .get_all("x-trace")
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        check!(trace == ["1", "2"]);
        check!(options.default_headers().get(header::USER_AGENT) == Some(&HeaderValue::from_static("acme-sync/3.1")));
        check!(options.timeout().is_none());
        check!(options.default_data_format() == DataFormat::Xml);
        check!(options.registry().default_format() == Some(DataFormat::Xml));
        check!(options.build_options().accept() == "application/xml");
    }

    #[test]
    fn explicit_user_agent_header_wins() {
        let options = ClientOptions::builder("http://example.com")
            .default_header("user-agent", "custom")
            .build()
            .expect("options");
        check!(options.default_headers().get_all(header::USER_AGENT).iter().count() == 1);
        check!(options.default_headers().get(header::USER_AGENT) == Some(&HeaderValue::from_static("custom")));
    }

    #[test]
    fn registers_serializer_for_content_types() {
        let options = ClientOptions::builder("http://example.com")
            .serializer_for(MessagePackSerializer, ["application/x-acme-pack"])
            .build()
            .expect("options");

        let_assert!(Ok(serializer) = options.registry().resolve("application/x-acme-pack"));
        check!(serializer.data_format() == DataFormat::MessagePack);
    }

    #[test]
    fn invalid_base_url() {
        let_assert!(Err(err) = ClientOptions::builder("not a url").build());
        check!(matches!(err, Error::InvalidUri(_)));

        let_assert!(Err(err) = ClientOptions::builder("mailto:someone@example.com").build());
        check!(matches!(err, Error::InvalidRequest(_)));
    }

    #[test]
    fn invalid_default_header() {
        let_assert!(
            Err(err) = ClientOptions::builder("http://example.com")
                .default_header("bad header", "x")
                .build()
        );
        check!(err.to_string().contains("invalid header name"));
    }

    #[test]
    fn transport_config_builder() {
        let config = TransportConfig::builder()
            .connect_timeout(Duration::from_secs(5))
            .pool_idle_per_host(16)
            .build();

        check!(config.connect_timeout == Duration::from_secs(5));
        check!(config.pool_idle_per_host == 16);
        check!(config.pool_idle_timeout == Duration::from_secs(90));
    }
}
