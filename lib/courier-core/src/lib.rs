//! Core types for the courier HTTP client.
//!
//! This crate is network-free. It covers everything between a request
//! description and the bytes a transport sends, and back:
//! - [`Request`], [`Parameter`], [`FileParameter`], [`RequestBody`] - the
//!   request description and its parameter model
//! - [`build_uri`] - resource templates, URL segments and query strings
//! - [`build_request`] - turns a [`Request`] into a [`WireRequest`]
//! - [`Serializer`] and [`SerializerRegistry`] - pluggable body formats
//!   (JSON, XML, CSV, MessagePack, compressed)
//! - [`RawResponse`] and [`Response`] - transport output and the response
//!   envelope
//! - [`Error`] and [`Result`] - error handling
//! - [`ToParameters`] - object to query parameter mapping

mod body;
mod build;
mod error;
mod method;
mod multipart;
mod parameter;
pub mod prelude;
mod request;
mod response;
mod serializer;
mod uri;

pub use body::{Body, FORM_URL_ENCODED, OCTET_STREAM, PLAIN_TEXT, to_form};
pub use build::{BuildOptions, build_request, request_uri};
pub use error::{Error, Result};
pub use method::Method;
pub use multipart::{Form, Part};
pub use parameter::{
    BodyValue, FileParameter, ObjectFilter, Parameter, ParameterKind, RequestBody, ToParameters,
};
pub use request::{Request, WireRequest};
pub use response::{RawResponse, Response, ResponseStatus};
pub use serializer::{
    ChainedSerializer, Compression, CsvSerializer, DataFormat, DeserializeVisitor,
    JsonSerializer, MessagePackSerializer, Serializer, SerializerEntry, SerializerRegistry,
    XmlSerializer, deserialize,
};
pub use uri::build_uri;

// Re-export http crate types for status codes and headers
pub use http::{HeaderMap, HeaderValue, StatusCode, header};
