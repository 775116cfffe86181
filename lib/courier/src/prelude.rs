//! Prelude module for convenient imports.
//!
//! ```
//! use courier::prelude::*;
//! ```

pub use crate::auth::{Authenticator, HttpBasicAuthenticator};
pub use crate::interceptor::{InterceptContext, Interceptor, LoggingInterceptor};
pub use crate::{
    CancellationToken, Client, ClientOptions, DataFormat, Error, Method, Parameter,
    ParameterKind, Parameters, RawResponse, Request, RequestBody, Response, ResponseStatus,
    Result, StatusCode, ToParameters, Transport, WireRequest, async_trait, header,
};
pub use serde::{Deserialize, Serialize};
