//! The client facade.

use std::sync::Arc;

use courier_core::{Request, RequestBody, Response, Result, request_uri};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::ClientOptions;
use crate::pipeline::Execution;
use crate::transport::{HyperTransport, Transport};

/// HTTP client.
///
/// Cheap to clone; clones share options and transport. Options are
/// read-only, so a client can serve any number of concurrent executions.
///
/// Every `execute*` method returns a [`Response`] envelope, even when the
/// execution fails. Check [`Response::is_successful`] or convert with
/// [`Response::into_result`].
///
/// # Example
///
/// ```no_run
/// use courier::{Client, ClientOptions, Request};
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize)]
/// struct User {
///     id: u64,
///     name: String,
/// }
///
/// # async fn run() -> courier::Result<()> {
/// let client = Client::new(ClientOptions::builder("https://api.example.com").build()?);
///
/// let request = Request::get("/users/{id}").add_url_segment("id", 42);
/// let user: User = client.execute_as(request).await.into_data()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Client<T = HyperTransport> {
    options: Arc<ClientOptions>,
    transport: Arc<T>,
}

impl<T> Clone for Client<T> {
    fn clone(&self) -> Self {
        Self {
            options: Arc::clone(&self.options),
            transport: Arc::clone(&self.transport),
        }
    }
}

impl Client<HyperTransport> {
    /// Create a client using the default hyper transport.
    #[must_use]
    pub fn new(options: ClientOptions) -> Self {
        Self::with_transport(options, HyperTransport::new())
    }
}

impl<T: Transport> Client<T> {
    /// Create a client using a custom transport.
    #[must_use]
    pub fn with_transport(options: ClientOptions, transport: T) -> Self {
        Self {
            options: Arc::new(options),
            transport: Arc::new(transport),
        }
    }

    /// Client options.
    #[must_use]
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// The transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Execute `request` without deserializing the response body.
    pub async fn execute(&self, request: Request) -> Response {
        self.execute_with_cancel(request, CancellationToken::new())
            .await
    }

    /// Execute `request`, aborting when `cancel` is cancelled.
    pub async fn execute_with_cancel(&self, request: Request, cancel: CancellationToken) -> Response {
        Execution::new(&self.options, &*self.transport, &request, cancel)
            .run(request)
            .await
    }

    /// Execute `request` and deserialize a successful response body into `D`.
    ///
    /// Only 2xx responses with a non-empty body are deserialized. The
    /// serializer is resolved from the response `Content-Type`, falling back
    /// to the registry default.
    pub async fn execute_as<D: DeserializeOwned>(&self, request: Request) -> Response<D> {
        self.execute_as_with_cancel(request, CancellationToken::new())
            .await
    }

    /// [`Client::execute_as`], aborting when `cancel` is cancelled.
    pub async fn execute_as_with_cancel<D: DeserializeOwned>(
        &self,
        request: Request,
        cancel: CancellationToken,
    ) -> Response<D> {
        Execution::new(&self.options, &*self.transport, &request, cancel)
            .run_as(request)
            .await
    }

    /// `GET resource`, deserialized into `D`.
    pub async fn get<D: DeserializeOwned>(&self, resource: impl Into<String>) -> Response<D> {
        self.execute_as(Request::get(resource)).await
    }

    /// `POST resource` with `body` in the default format, deserialized into `D`.
    pub async fn post<D, B>(&self, resource: impl Into<String>, body: B) -> Response<D>
    where
        D: DeserializeOwned,
        B: Serialize + Send + Sync + 'static,
    {
        self.execute_as(Request::post(resource).add_body(RequestBody::object(body)))
            .await
    }

    /// `PUT resource` with `body` in the default format, deserialized into `D`.
    pub async fn put<D, B>(&self, resource: impl Into<String>, body: B) -> Response<D>
    where
        D: DeserializeOwned,
        B: Serialize + Send + Sync + 'static,
    {
        self.execute_as(Request::put(resource).add_body(RequestBody::object(body)))
            .await
    }

    /// `DELETE resource`.
    pub async fn delete(&self, resource: impl Into<String>) -> Response {
        self.execute(Request::delete(resource)).await
    }

    /// The URI `request` would be sent to.
    ///
    /// Authenticators and interceptors are not applied.
    pub fn build_uri(&self, request: &Request) -> Result<Url> {
        request_uri(request, self.options.base_url())
    }
}

#[cfg(test)]
mod tests {
    use courier_core::Error;

    use super::*;

    fn client() -> Client {
        Client::new(
            ClientOptions::builder("http://example.com")
                .build()
                .expect("options"),
        )
    }

    #[test]
    fn client_is_clone() {
        let client = client();
        let cloned = client.clone();
        assert!(Arc::ptr_eq(&client.options, &cloned.options));
    }

    #[test]
    fn build_uri_joins_resource_and_query() {
        let client = client();
        let request = Request::get("/resource/").add_parameter("foo", "bar");
        let uri = client.build_uri(&request).expect("uri");
        assert_eq!(uri.as_str(), "http://example.com/resource/?foo=bar");
    }

    #[test]
    fn build_uri_reports_missing_segment() {
        let client = client();
        let err = client
            .build_uri(&Request::get("/resource/{foo}"))
            .expect_err("missing");
        assert!(matches!(err, Error::MissingSegment { ref name } if name == "foo"));
    }
}
