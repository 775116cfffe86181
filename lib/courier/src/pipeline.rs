//! Execution pipeline.
//!
//! One execution moves through a fixed sequence of states:
//!
//! ```text
//! Building -> Serializing -> Sending -> AwaitingResponse -> Deserializing -> Completed
//! ```
//!
//! Any failure ends the execution early, as `Aborted` on cancellation and
//! as a failed envelope otherwise. A failed envelope never carries a partial
//! transport response, even when the failure comes from a hook that ran
//! after the response arrived. Failures are recorded in the returned
//! [`Response`], never returned as `Err`. The pipeline does not retry.
//!
//! Cancellation is checked before the authenticator, before each
//! interceptor and while awaiting the response. The timeout only covers
//! `AwaitingResponse`.

use std::time::Duration;

use courier_core::{Error, RawResponse, Request, Response, Result, build_request, deserialize};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info_span, warn};

use crate::ClientOptions;
use crate::interceptor::{InterceptContext, ensure_active};
use crate::transport::Transport;

/// Pipeline state, as reported in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    /// Authenticator and `before_serialize` hooks.
    Building,
    /// Request building and body serialization.
    Serializing,
    /// `before_send` hooks.
    Sending,
    /// Waiting for the transport.
    AwaitingResponse,
    /// `after_send` and `before_deserialize` hooks, then body deserialization.
    Deserializing,
    /// Finished.
    Completed,
    /// Cancelled by the caller.
    Aborted,
}

/// One execution of one request.
pub(crate) struct Execution<'a, T> {
    options: &'a ClientOptions,
    transport: &'a T,
    cancel: CancellationToken,
    context: InterceptContext,
    timeout: Option<Duration>,
}

impl<'a, T: Transport> Execution<'a, T> {
    pub(crate) fn new(
        options: &'a ClientOptions,
        transport: &'a T,
        request: &Request,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            options,
            transport,
            cancel,
            context: InterceptContext::new(request),
            timeout: request.request_timeout().or(options.timeout()),
        }
    }

    /// Run the pipeline without deserializing the body.
    pub(crate) async fn run(self, request: Request) -> Response {
        let span = self.span();
        async move {
            let response = self.exchange(request).await;
            self.finish(&response);
            response
        }
        .instrument(span)
        .await
    }

    /// Run the pipeline and deserialize a 2xx body into `D`.
    pub(crate) async fn run_as<D: DeserializeOwned>(self, request: Request) -> Response<D> {
        let span = self.span();
        async move {
            let response = self.exchange(request).await;
            let response = self.deserialize(response);
            self.finish(&response);
            response
        }
        .instrument(span)
        .await
    }

    fn span(&self) -> tracing::Span {
        info_span!(
            "courier.execute",
            method = %self.context.method(),
            resource = self.context.resource(),
        )
    }

    /// Everything up to and including the `before_deserialize` hooks.
    async fn exchange(&self, mut request: Request) -> Response {
        let chain = self.options.interceptors();

        self.enter(ExecutionState::Building);
        if let Err(error) = self.authenticate(&mut request).await {
            return Response::failed(None, error);
        }
        if let Err(error) = chain
            .before_serialize(&self.context, &self.cancel, &mut request)
            .await
        {
            return Response::failed(None, error);
        }

        self.enter(ExecutionState::Serializing);
        let mut wire = match build_request(request, self.options.build_options()) {
            Ok(wire) => wire,
            Err(error) => return Response::failed(None, error),
        };
        let url = wire.url().clone();

        self.enter(ExecutionState::Sending);
        if let Err(error) = chain
            .before_send(&self.context, &self.cancel, &mut wire)
            .await
        {
            return Response::failed(Some(url), error);
        }
        if let Err(error) = ensure_active(&self.cancel) {
            return Response::failed(Some(url), error);
        }

        self.enter(ExecutionState::AwaitingResponse);
        let mut raw = match self.send(wire).await {
            Ok(raw) => raw,
            Err(error) => return Response::failed(Some(url), error),
        };

        // Hook failures drop the transport response.
        self.enter(ExecutionState::Deserializing);
        if let Err(error) = chain.after_send(&self.context, &self.cancel, &mut raw).await {
            return Response::failed(Some(url), error);
        }
        let mut response = Response::from_raw(Some(url.clone()), raw);
        if let Err(error) = chain
            .before_deserialize(&self.context, &self.cancel, &mut response)
            .await
        {
            return Response::failed(Some(url), error);
        }
        response
    }

    async fn authenticate(&self, request: &mut Request) -> Result<()> {
        ensure_active(&self.cancel)?;
        match self.options.authenticator() {
            Some(authenticator) => authenticator.authenticate(self.options, request).await,
            None => Ok(()),
        }
    }

    /// Send through the transport, racing cancellation and the deadline.
    async fn send(&self, wire: courier_core::WireRequest) -> Result<RawResponse> {
        let transport_cancel = self.cancel.child_token();
        let result = tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(Error::Aborted),
            () = deadline(self.timeout) => Err(Error::Timeout),
            result = self.transport.send(wire, transport_cancel.clone()) => result,
        };
        if result.is_err() {
            transport_cancel.cancel();
        }
        result
    }

    fn deserialize<D: DeserializeOwned>(&self, mut response: Response) -> Response<D> {
        if response.error().is_some()
            || !response.is_success_status_code()
            || response.raw_bytes().is_empty()
        {
            return response.with_data(None);
        }

        let registry = self.options.registry();
        let result = match response.content_type() {
            Some(content_type) => registry.deserialize::<D>(content_type, response.raw_bytes()),
            None => registry
                .default_serializer()
                .ok_or_else(|| Error::unsupported_content_type("<none>"))
                .and_then(|serializer| deserialize(serializer.as_ref(), response.raw_bytes())),
        };

        match result {
            Ok(data) => response.with_data(Some(data)),
            Err(error) => {
                response.set_error(error);
                response.with_data(None)
            }
        }
    }

    fn enter(&self, state: ExecutionState) {
        debug!(state = ?state, elapsed_ms = self.elapsed_ms(), "pipeline state");
    }

    fn finish<D>(&self, response: &Response<D>) {
        match response.error() {
            None => {
                self.enter(ExecutionState::Completed);
            }
            Some(error) if error.is_aborted() => {
                self.enter(ExecutionState::Aborted);
                warn!(elapsed_ms = self.elapsed_ms(), "execution aborted");
            }
            Some(error) => {
                warn!(
                    error = %error,
                    status = ?response.response_status(),
                    elapsed_ms = self.elapsed_ms(),
                    "execution failed"
                );
            }
        }
    }

    fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.context.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Completes after `timeout`, never without one.
async fn deadline(timeout: Option<Duration>) {
    match timeout {
        Some(timeout) => tokio::time::sleep(timeout).await,
        None => std::future::pending().await,
    }
}
