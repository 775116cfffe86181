//! HTTP client with URI templating, pluggable serializers, authenticators
//! and interceptors.
//!
//! A [`Client`] turns a [`Request`] description into a [`Response`]
//! envelope:
//!
//! 1. the [`Authenticator`](auth::Authenticator) decorates the request
//! 2. [`Interceptor`](interceptor::Interceptor) hooks run in registration order
//! 3. the request is built: URL segments, query string, headers, cookies and
//!    body, serialized with the [`SerializerRegistry`]
//! 4. the [`Transport`] sends it, through any tower layers it was built with
//! 5. 2xx bodies are deserialized by the serializer matching the response
//!    `Content-Type`
//!
//! Failures never surface as `Err` from `execute*`: they are recorded in
//! the envelope, see [`Response::response_status`] and [`Response::error`].
//!
//! # Example
//!
//! ```no_run
//! use courier::prelude::*;
//!
//! #[derive(Debug, Deserialize)]
//! struct Note {
//!     id: u64,
//!     title: String,
//! }
//!
//! #[derive(Parameters)]
//! struct Filter {
//!     tag: Option<String>,
//!     #[param(format = "csv")]
//!     ids: Vec<u64>,
//! }
//!
//! # async fn run() -> courier::Result<()> {
//! let options = ClientOptions::builder("https://api.example.com")
//!     .authenticator(HttpBasicAuthenticator::new("ada", "s3cret"))
//!     .interceptor(LoggingInterceptor::new())
//!     .build()?;
//! let client = Client::new(options);
//!
//! let filter = Filter { tag: Some("rust".into()), ids: vec![1, 2] };
//! let request = Request::get("/users/{user}/notes")
//!     .add_url_segment("user", 7)
//!     .add_object(&filter);
//!
//! let notes: Vec<Note> = client.execute_as(request).await.into_data()?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
mod client;
mod config;
pub mod interceptor;
pub mod middleware;
mod pipeline;
pub mod prelude;
mod transport;

pub use client::Client;
pub use config::{
    ClientOptions, ClientOptionsBuilder, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, TransportConfig,
    TransportConfigBuilder,
};
pub use pipeline::ExecutionState;
pub use transport::{BoxedService, HyperTransport, HyperTransportBuilder, ServiceFuture, Transport};

// Re-export core types
pub use courier_core::{
    Body, BodyValue, BuildOptions, ChainedSerializer, Compression, CsvSerializer, DataFormat,
    Error, FORM_URL_ENCODED, FileParameter, Form, JsonSerializer, MessagePackSerializer, Method,
    OCTET_STREAM, ObjectFilter, PLAIN_TEXT, Parameter, ParameterKind, Part, RawResponse, Request,
    RequestBody, Response, ResponseStatus, Result, Serializer, SerializerEntry,
    SerializerRegistry, ToParameters, WireRequest, XmlSerializer, build_request, build_uri,
    request_uri,
};

// Re-export http types for status codes and headers
pub use courier_core::{HeaderMap, HeaderValue, StatusCode, header};

// Re-export crates used in extension points
pub use async_trait::async_trait;
pub use tokio_util::sync::CancellationToken;
pub use tower;
pub use url::Url;

// Re-export macros
pub use courier_macro::Parameters;
