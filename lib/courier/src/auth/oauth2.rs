//! OAuth2 access token injection.
//!
//! Acquiring the token is up to the caller; these authenticators only attach
//! it.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use courier_core::{Parameter, Request, Result, header};

use super::Authenticator;
use crate::ClientOptions;

/// Query parameter used by [`OAuth2UriQueryParameterAuthenticator`].
pub const OAUTH_TOKEN_PARAMETER: &str = "oauth_token";

/// Adds `Authorization: <token type> <access token>`, `Bearer` by default.
#[derive(Clone)]
pub struct OAuth2AuthorizationHeaderAuthenticator {
    access_token: Arc<str>,
    token_type: Arc<str>,
}

impl fmt::Debug for OAuth2AuthorizationHeaderAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuth2AuthorizationHeaderAuthenticator")
            .field("token_type", &self.token_type)
            .finish_non_exhaustive()
    }
}

impl OAuth2AuthorizationHeaderAuthenticator {
    /// Create a `Bearer` authenticator.
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::with_token_type(access_token, "Bearer")
    }

    /// Create an authenticator with a custom token type (e.g. `OAuth`).
    #[must_use]
    pub fn with_token_type(access_token: impl Into<String>, token_type: impl Into<String>) -> Self {
        Self {
            access_token: Arc::from(access_token.into()),
            token_type: Arc::from(token_type.into()),
        }
    }
}

#[async_trait]
impl Authenticator for OAuth2AuthorizationHeaderAuthenticator {
    async fn authenticate(&self, _options: &ClientOptions, request: &mut Request) -> Result<()> {
        let value = format!("{} {}", self.token_type, self.access_token);
        request.push_parameter_if_absent(Parameter::header(header::AUTHORIZATION.as_str(), value));
        Ok(())
    }
}

/// Adds the access token as the `oauth_token` query parameter.
#[derive(Clone)]
pub struct OAuth2UriQueryParameterAuthenticator {
    access_token: Arc<str>,
}

impl fmt::Debug for OAuth2UriQueryParameterAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuth2UriQueryParameterAuthenticator")
            .finish_non_exhaustive()
    }
}

impl OAuth2UriQueryParameterAuthenticator {
    /// Create an authenticator for `access_token`.
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: Arc::from(access_token.into()),
        }
    }
}

#[async_trait]
impl Authenticator for OAuth2UriQueryParameterAuthenticator {
    async fn authenticate(&self, _options: &ClientOptions, request: &mut Request) -> Result<()> {
        request.push_parameter_if_absent(Parameter::query(OAUTH_TOKEN_PARAMETER, &*self.access_token));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use courier_core::ParameterKind;

    use super::*;

    fn options() -> ClientOptions {
        ClientOptions::builder("http://example.com")
            .build()
            .expect("options")
    }

    #[tokio::test]
    async fn bearer_header() {
        let mut request = Request::get("/me");
        OAuth2AuthorizationHeaderAuthenticator::new("tok-123")
            .authenticate(&options(), &mut request)
            .await
            .expect("authenticate");

        let auth = request
            .parameter("Authorization", ParameterKind::Header)
            .expect("header");
        assert_eq!(auth.value(), "Bearer tok-123");
    }

    #[tokio::test]
    async fn custom_token_type() {
        let mut request = Request::get("/me");
        OAuth2AuthorizationHeaderAuthenticator::with_token_type("tok-123", "OAuth")
            .authenticate(&options(), &mut request)
            .await
            .expect("authenticate");

        let auth = request
            .parameter("authorization", ParameterKind::Header)
            .expect("header");
        assert_eq!(auth.value(), "OAuth tok-123");
    }

    #[tokio::test]
    async fn header_not_overwritten() {
        let mut request = Request::get("/me").add_header("AUTHORIZATION", "Bearer mine");
        OAuth2AuthorizationHeaderAuthenticator::new("tok-123")
            .authenticate(&options(), &mut request)
            .await
            .expect("authenticate");

        assert_eq!(request.parameters().len(), 1);
        assert_eq!(
            request.parameters().first().map(Parameter::value),
            Some("Bearer mine")
        );
    }

    #[tokio::test]
    async fn query_parameter() {
        let mut request = Request::get("/me");
        OAuth2UriQueryParameterAuthenticator::new("tok-123")
            .authenticate(&options(), &mut request)
            .await
            .expect("authenticate");

        let token = request
            .parameter(OAUTH_TOKEN_PARAMETER, ParameterKind::Query)
            .expect("query");
        assert_eq!(token.value(), "tok-123");
    }

    #[test]
    fn debug_hides_token() {
        let debug = format!("{:?}", OAuth2AuthorizationHeaderAuthenticator::new("tok-123"));
        assert!(!debug.contains("tok-123"));
        let debug = format!("{:?}", OAuth2UriQueryParameterAuthenticator::new("tok-123"));
        assert!(!debug.contains("tok-123"));
    }
}
