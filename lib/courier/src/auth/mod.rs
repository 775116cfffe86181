//! Authenticators.
//!
//! An [`Authenticator`] runs once per execution, before interceptors and
//! request building, and adds credentials to the request as parameters.
//! Every built-in authenticator only adds a credential when the request does
//! not carry one already, so an explicit per-request credential always wins.
//!
//! | Authenticator | Adds |
//! |---------------|------|
//! | [`HttpBasicAuthenticator`] | `Authorization: Basic <base64(user:pass)>` header |
//! | [`SimpleAuthenticator`] | username and password as `GetOrPost` parameters |
//! | [`OAuth2AuthorizationHeaderAuthenticator`] | `Authorization: <type> <token>` header |
//! | [`OAuth2UriQueryParameterAuthenticator`] | `oauth_token` query parameter |

mod basic;
mod oauth2;
mod simple;

use std::fmt;

use async_trait::async_trait;
use courier_core::{Request, Result};

use crate::ClientOptions;

pub use basic::HttpBasicAuthenticator;
pub use oauth2::{
    OAUTH_TOKEN_PARAMETER, OAuth2AuthorizationHeaderAuthenticator,
    OAuth2UriQueryParameterAuthenticator,
};
pub use simple::SimpleAuthenticator;

/// Applies credentials to a request.
///
/// Implementations should not overwrite a credential the request already
/// carries.
///
/// # Example
///
/// ```
/// use courier::auth::Authenticator;
/// use courier::{ClientOptions, Parameter, Request, Result, async_trait};
///
/// #[derive(Debug)]
/// struct ApiKey(String);
///
/// #[async_trait]
/// impl Authenticator for ApiKey {
///     async fn authenticate(&self, _options: &ClientOptions, request: &mut Request) -> Result<()> {
///         request.push_parameter_if_absent(Parameter::header("X-Api-Key", &self.0));
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Authenticator: Send + Sync + fmt::Debug {
    /// Add credentials to `request`.
    ///
    /// # Errors
    ///
    /// A failure aborts the execution with [`courier_core::Error::Authentication`]
    /// or the returned error.
    async fn authenticate(&self, options: &ClientOptions, request: &mut Request) -> Result<()>;
}
