//! Interceptors: hooks into the execution pipeline.
//!
//! An [`Interceptor`] implements any of four hooks, each with a default that
//! does nothing:
//!
//! | Hook | Runs | Sees |
//! |------|------|------|
//! | [`Interceptor::before_serialize`] | after the authenticator, before building | the [`Request`] |
//! | [`Interceptor::before_send`] | after building | the [`WireRequest`] |
//! | [`Interceptor::after_send`] | once the transport answered | the [`RawResponse`] |
//! | [`Interceptor::before_deserialize`] | before the body is deserialized | the [`Response`] envelope |
//!
//! Interceptors run sequentially in registration order, for the "after"
//! hooks too. A hook returning an error stops the pipeline: later hooks do
//! not run and the envelope carries the error with
//! [`courier_core::ResponseStatus::Error`].

mod chain;
mod logging;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use courier_core::{Method, RawResponse, Request, Response, Result, WireRequest};

pub use chain::InterceptorChain;
pub(crate) use chain::ensure_active;
pub use logging::{LogLevel, LoggingInterceptor};

/// Execution the hooks are called for.
#[derive(Debug, Clone)]
pub struct InterceptContext {
    method: Method,
    resource: String,
    started: Instant,
}

impl InterceptContext {
    pub(crate) fn new(request: &Request) -> Self {
        Self {
            method: request.method(),
            resource: request.resource().to_string(),
            started: Instant::now(),
        }
    }

    /// Request method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Resource template as given by the caller.
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Time since the execution started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Pipeline hooks.
///
/// # Example
///
/// ```
/// use courier::interceptor::{InterceptContext, Interceptor};
/// use courier::{WireRequest, Result, async_trait};
///
/// #[derive(Debug)]
/// struct RequestId;
///
/// #[async_trait]
/// impl Interceptor for RequestId {
///     async fn before_send(&self, _ctx: &InterceptContext, request: &mut WireRequest) -> Result<()> {
///         request
///             .headers_mut()
///             .insert("x-request-id", courier::HeaderValue::from_static("42"));
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Interceptor: Send + Sync {
    /// Mutate the request description before it is built.
    async fn before_serialize(&self, _ctx: &InterceptContext, _request: &mut Request) -> Result<()> {
        Ok(())
    }

    /// Mutate the wire request before it is sent.
    async fn before_send(&self, _ctx: &InterceptContext, _request: &mut WireRequest) -> Result<()> {
        Ok(())
    }

    /// Observe or mutate the raw response.
    async fn after_send(&self, _ctx: &InterceptContext, _response: &mut RawResponse) -> Result<()> {
        Ok(())
    }

    /// Mutate the envelope before its body is deserialized.
    async fn before_deserialize(&self, _ctx: &InterceptContext, _response: &mut Response) -> Result<()> {
        Ok(())
    }
}
