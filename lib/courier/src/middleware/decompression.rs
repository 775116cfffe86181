//! Response decompression middleware.
//!
//! Advertises the supported codings in `Accept-Encoding` and decompresses
//! responses according to their `Content-Encoding` header.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use courier_core::{Compression, Error, RawResponse, Result, WireRequest, header};
use http::HeaderValue;
use tower::{Layer, Service};

/// Value sent in `Accept-Encoding` unless the request sets one.
const ACCEPT_ENCODING: &str = "gzip, deflate, br, zstd";

/// Layer that enables automatic response decompression.
///
/// # Example
///
/// ```ignore
/// use courier::HyperTransport;
/// use courier::middleware::DecompressionLayer;
///
/// let transport = HyperTransport::builder()
///     .layer(DecompressionLayer::new())
///     .build();
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DecompressionLayer {
    _private: (),
}

impl DecompressionLayer {
    /// Create a new decompression layer.
    #[must_use]
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl<S> Layer<S> for DecompressionLayer {
    type Service = Decompression<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Decompression { inner }
    }
}

/// Service that decompresses responses.
#[derive(Debug, Clone)]
pub struct Decompression<S> {
    inner: S,
}

impl<S> Decompression<S> {
    /// Create a new decompression service wrapping the given service.
    #[must_use]
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

/// Decode `response` in place. Unknown codings are left untouched.
fn decompress(response: &mut RawResponse) -> Result<()> {
    let Some(encoding) = response.header(header::CONTENT_ENCODING.as_str()) else {
        return Ok(());
    };
    let Some(compression) = Compression::from_encoding(encoding) else {
        return Ok(());
    };

    let decompressed = compression.decompress(response.body())?;
    let headers = response.headers_mut();
    headers.remove(header::CONTENT_ENCODING);
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(decompressed.len()));
    response.set_body(decompressed);
    Ok(())
}

impl<S> Service<WireRequest> for Decompression<S>
where
    S: Service<WireRequest, Response = RawResponse, Error = Error> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = RawResponse;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: WireRequest) -> Self::Future {
        request
            .headers_mut()
            .entry(header::ACCEPT_ENCODING)
            .or_insert(HeaderValue::from_static(ACCEPT_ENCODING));

        // Take the service that was driven ready and leave a fresh clone.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let mut response = inner.call(request).await?;
            decompress(&mut response)?;
            Ok(response)
        })
    }
}
