//! Transport: sends a wire request and returns the raw response.
//!
//! [`Transport`] is the seam between the execution pipeline and the network.
//! [`HyperTransport`] is the default implementation, built on hyper-util with
//! connection pooling, rustls and optional tower middleware.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use courier_core::{Error, RawResponse, Result, WireRequest};
use http_body_util::{BodyExt, Full};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use tokio_util::sync::CancellationToken;
use tower::util::BoxCloneService;
use tower::{Layer, ServiceExt};
use tower_service::Service;

use crate::config::{TransportConfig, TransportConfigBuilder};

#[cfg(feature = "middleware-decompression")]
use crate::middleware::DecompressionLayer;
#[cfg(feature = "middleware-retry")]
use crate::middleware::RetryPolicy;
#[cfg(feature = "middleware-concurrency")]
use tower::limit::ConcurrencyLimitLayer;
#[cfg(feature = "middleware-retry")]
use tower::retry::RetryLayer;

/// Sends wire requests.
///
/// Implementations must stop work and return [`Error::Aborted`] once
/// `cancel` is cancelled. Dropping the returned future must also abandon the
/// request.
pub trait Transport: Send + Sync {
    /// Send `request` and wait for the complete response.
    ///
    /// # Errors
    ///
    /// Returns a transport error: connection, name resolution, TLS, or
    /// [`Error::Aborted`] on cancellation.
    fn send(
        &self,
        request: WireRequest,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<RawResponse>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn send(
        &self,
        request: WireRequest,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<RawResponse>> + Send {
        (**self).send(request, cancel)
    }
}

/// Type-erased transport service, the unit tower layers are applied to.
pub type BoxedService = BoxCloneService<WireRequest, RawResponse, Error>;

/// Future type for the tower `Service` implementation.
pub type ServiceFuture = Pin<Box<dyn Future<Output = Result<RawResponse>> + Send + 'static>>;

/// Makes `BoxedService` shareable across concurrent executions.
#[derive(Clone)]
struct SyncService {
    inner: Arc<Mutex<BoxedService>>,
}

impl SyncService {
    fn new(service: BoxedService) -> Self {
        Self {
            inner: Arc::new(Mutex::new(service)),
        }
    }

    fn call(&self, request: WireRequest) -> ServiceFuture {
        // The lock is held only for the clone.
        let mut service = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();

        // Each clone drives its own readiness, so layers such as
        // `ConcurrencyLimit` acquire their permit before the call.
        Box::pin(async move { service.ready().await?.call(request).await })
    }
}

/// HTTPS connector using rustls with the Mozilla root certificates.
fn https_connector(config: &TransportConfig) -> HttpsConnector<HttpConnector> {
    let root_store: rustls::RootCertStore =
        webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();

    let tls_config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_connect_timeout(Some(config.connect_timeout));

    HttpsConnectorBuilder::new()
        .with_tls_config(tls_config)
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .wrap_connector(http)
}

/// The innermost service: one hyper round trip.
#[derive(Clone)]
struct HyperService {
    inner: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
}

impl HyperService {
    fn new(config: &TransportConfig) -> Self {
        let inner = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_idle_per_host)
            .build(https_connector(config));

        Self { inner }
    }

    fn to_hyper_request(request: WireRequest) -> Result<http::Request<Full<Bytes>>> {
        let (method, url, headers, body) = request.into_parts();

        let mut http_request = http::Request::builder()
            .method(http::Method::from(method))
            .uri(url.as_str())
            .body(Full::new(body.into_bytes()))
            .map_err(|e| Error::invalid_request(e.to_string()))?;
        *http_request.headers_mut() = headers;

        Ok(http_request)
    }

    async fn send(&self, request: WireRequest) -> Result<RawResponse> {
        let hyper_request = Self::to_hyper_request(request)?;

        let response = self
            .inner
            .request(hyper_request)
            .await
            .map_err(Self::map_hyper_error)?;

        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| Error::connection(e.to_string()))?
            .to_bytes();

        Ok(RawResponse::new(parts.status.as_u16(), parts.headers, body))
    }

    #[allow(clippy::needless_pass_by_value)]
    fn map_hyper_error(err: hyper_util::client::legacy::Error) -> Error {
        let mut msg = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            msg.push_str(": ");
            msg.push_str(&cause.to_string());
            source = cause.source();
        }
        let lower = msg.to_lowercase();

        if lower.contains("dns") || lower.contains("lookup") || lower.contains("resolve") {
            return Error::name_resolution(msg);
        }

        if lower.contains("ssl") || lower.contains("tls") || lower.contains("certificate") {
            return Error::tls(msg);
        }

        Error::connection(msg)
    }
}

impl Service<WireRequest> for HyperService {
    type Response = RawResponse;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: WireRequest) -> Self::Future {
        let service = self.clone();
        Box::pin(async move { service.send(request).await })
    }
}

/// Default transport: hyper-util with connection pooling, rustls and tower
/// middleware.
///
/// # Example
///
/// ```ignore
/// use courier::HyperTransport;
///
/// // Plain transport
/// let transport = HyperTransport::new();
///
/// // With middleware (feature-gated helpers)
/// let transport = HyperTransport::builder()
///     .with_retry(3)
///     .with_concurrency_limit(16)
///     .with_decompression()
///     .build();
/// ```
#[derive(Clone)]
pub struct HyperTransport {
    service: SyncService,
    config: TransportConfig,
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HyperTransport {
    /// Create a transport with default configuration and no middleware.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(TransportConfig::default())
    }

    /// Create a transport with custom configuration and no middleware.
    #[must_use]
    pub fn with_config(config: TransportConfig) -> Self {
        let service = BoxCloneService::new(HyperService::new(&config));
        Self {
            service: SyncService::new(service),
            config,
        }
    }

    /// Create a transport builder.
    #[must_use]
    pub fn builder() -> HyperTransportBuilder {
        HyperTransportBuilder::default()
    }

    /// The transport configuration.
    #[must_use]
    pub const fn config(&self) -> &TransportConfig {
        &self.config
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HyperTransport {
    async fn send(&self, request: WireRequest, cancel: CancellationToken) -> Result<RawResponse> {
        if cancel.is_cancelled() {
            return Err(Error::Aborted);
        }
        let call = self.service.call(request);
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(Error::Aborted),
            result = call => result,
        }
    }
}

impl Service<WireRequest> for HyperTransport {
    type Response = RawResponse;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: WireRequest) -> Self::Future {
        self.service.call(request)
    }
}

/// Builder for [`HyperTransport`].
///
/// Layers are applied in order: first added = outermost.
#[derive(Default)]
pub struct HyperTransportBuilder {
    config: TransportConfigBuilder,
    layers: Vec<Arc<dyn Fn(BoxedService) -> BoxedService + Send + Sync>>,
}

impl std::fmt::Debug for HyperTransportBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransportBuilder")
            .field("config", &self.config)
            .field("layers", &self.layers.len())
            .finish()
    }
}

impl HyperTransportBuilder {
    /// Set the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.connect_timeout(timeout);
        self
    }

    /// Set the maximum idle connections per host.
    #[must_use]
    pub fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.config = self.config.pool_idle_per_host(count);
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.pool_idle_timeout(timeout);
        self
    }

    /// Add a tower layer around the transport.
    #[must_use]
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<BoxedService> + Send + Sync + 'static,
        L::Service: Service<WireRequest, Response = RawResponse, Error = Error>
            + Clone
            + Send
            + 'static,
        <L::Service as Service<WireRequest>>::Future: Send,
    {
        self.layers.push(Arc::new(move |service| {
            BoxCloneService::new(layer.layer(service))
        }));
        self
    }

    /// Retry connection failures, timeouts, 5xx and 429 up to `max_retries`
    /// times.
    #[cfg(feature = "middleware-retry")]
    #[must_use]
    pub fn with_retry(self, max_retries: u32) -> Self {
        self.layer(RetryLayer::new(RetryPolicy::new(max_retries)))
    }

    /// Limit the number of requests in flight.
    #[cfg(feature = "middleware-concurrency")]
    #[must_use]
    pub fn with_concurrency_limit(self, max: usize) -> Self {
        self.layer(ConcurrencyLimitLayer::new(max))
    }

    /// Advertise `Accept-Encoding` and decompress responses by
    /// `Content-Encoding`.
    #[cfg(feature = "middleware-decompression")]
    #[must_use]
    pub fn with_decompression(self) -> Self {
        self.layer(DecompressionLayer::new())
    }

    /// Build the transport with all configured middleware.
    #[must_use]
    pub fn build(self) -> HyperTransport {
        let config = self.config.build();
        let mut service: BoxedService = BoxCloneService::new(HyperService::new(&config));

        for wrap in self.layers.iter().rev() {
            service = wrap(service);
        }

        HyperTransport {
            service: SyncService::new(service),
            config,
        }
    }
}
