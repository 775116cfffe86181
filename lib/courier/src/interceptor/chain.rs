//! Sequential interceptor invocation.

use std::fmt;
use std::sync::Arc;

use courier_core::{Error, RawResponse, Request, Response, Result, WireRequest};
use tokio_util::sync::CancellationToken;

use super::{InterceptContext, Interceptor};

/// Interceptors in chain order.
///
/// Each phase runs every interceptor in order, one at a time. Cancellation
/// is checked before each interceptor.
#[derive(Clone, Default)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("len", &self.interceptors.len())
            .finish()
    }
}

impl InterceptorChain {
    /// Create a chain.
    #[must_use]
    pub fn new(interceptors: Vec<Arc<dyn Interceptor>>) -> Self {
        Self { interceptors }
    }

    /// Number of interceptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    /// Returns `true` if the chain has no interceptor.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    pub(crate) async fn before_serialize(
        &self,
        ctx: &InterceptContext,
        cancel: &CancellationToken,
        request: &mut Request,
    ) -> Result<()> {
        for interceptor in &self.interceptors {
            ensure_active(cancel)?;
            interceptor.before_serialize(ctx, request).await?;
        }
        Ok(())
    }

    pub(crate) async fn before_send(
        &self,
        ctx: &InterceptContext,
        cancel: &CancellationToken,
        request: &mut WireRequest,
    ) -> Result<()> {
        for interceptor in &self.interceptors {
            ensure_active(cancel)?;
            interceptor.before_send(ctx, request).await?;
        }
        Ok(())
    }

    pub(crate) async fn after_send(
        &self,
        ctx: &InterceptContext,
        cancel: &CancellationToken,
        response: &mut RawResponse,
    ) -> Result<()> {
        for interceptor in &self.interceptors {
            ensure_active(cancel)?;
            interceptor.after_send(ctx, response).await?;
        }
        Ok(())
    }

    pub(crate) async fn before_deserialize(
        &self,
        ctx: &InterceptContext,
        cancel: &CancellationToken,
        response: &mut Response,
    ) -> Result<()> {
        for interceptor in &self.interceptors {
            ensure_active(cancel)?;
            interceptor.before_deserialize(ctx, response).await?;
        }
        Ok(())
    }
}

pub(crate) fn ensure_active(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        Err(Error::Aborted)
    } else {
        Ok(())
    }
}
