//! Prelude module for convenient imports.
//!
//! ```
//! use courier_core::prelude::*;
//! ```

pub use crate::{
    Body, DataFormat, Error, FileParameter, Method, Parameter, ParameterKind, RawResponse,
    Request, RequestBody, Response, ResponseStatus, Result, Serializer, SerializerRegistry,
    ToParameters, WireRequest,
};
