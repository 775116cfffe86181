//! HTTP Basic authentication.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use courier_core::{Parameter, Request, Result, header};

use super::Authenticator;
use crate::ClientOptions;

/// Adds `Authorization: Basic <base64(username:password)>`.
///
/// The credential pair is UTF-8 encoded before base64. The header is only
/// added when the request has no `Authorization` header, whatever its case.
///
/// # Example
///
/// ```
/// use courier::ClientOptions;
/// use courier::auth::HttpBasicAuthenticator;
///
/// let options = ClientOptions::builder("https://api.example.com")
///     .authenticator(HttpBasicAuthenticator::new("aladdin", "opensesame"))
///     .build()?;
/// # Ok::<(), courier::Error>(())
/// ```
#[derive(Clone)]
pub struct HttpBasicAuthenticator {
    /// `Basic <base64>`, computed once.
    authorization: Arc<str>,
}

impl fmt::Debug for HttpBasicAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpBasicAuthenticator")
            .field("authorization", &"Basic <redacted>")
            .finish()
    }
}

impl HttpBasicAuthenticator {
    /// Create an authenticator for `username` and `password`.
    #[must_use]
    pub fn new(username: impl AsRef<str>, password: impl AsRef<str>) -> Self {
        let credentials = format!("{}:{}", username.as_ref(), password.as_ref());
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
        Self {
            authorization: Arc::from(format!("Basic {encoded}")),
        }
    }
}

#[async_trait]
impl Authenticator for HttpBasicAuthenticator {
    async fn authenticate(&self, _options: &ClientOptions, request: &mut Request) -> Result<()> {
        request.push_parameter_if_absent(Parameter::header(
            header::AUTHORIZATION.as_str(),
            &*self.authorization,
        ));
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

    fn authorization(request: &Request) -> Vec<&str> {
        request
            .parameters()
            .iter()
            .filter(|p| p.matches("authorization", ParameterKind::Header))
            .map(Parameter::value)
            .collect()
    }

    #[tokio::test]
    async fn adds_basic_header() {
        let authenticator = HttpBasicAuthenticator::new("Aladdin", "open sesame");
        let mut request = Request::get("/secure");

        authenticator
            .authenticate(&options(), &mut request)
            .await
            .expect("authenticate");

        assert_eq!(
            authorization(&request),
            ["Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ=="]
        );
    }

    #[tokio::test]
    async fn encodes_utf8_credentials() {
        let authenticator = HttpBasicAuthenticator::new("jürgen", "pässword");
        let mut request = Request::get("/secure");

        authenticator
            .authenticate(&options(), &mut request)
            .await
            .expect("authenticate");

        let expected = format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode("jürgen:pässword".as_bytes())
        );
        assert_eq!(authorization(&request), [expected.as_str()]);
    }

    #[tokio::test]
    async fn keeps_existing_authorization_header() {
        let authenticator = HttpBasicAuthenticator::new("user", "pass");
        let mut request = Request::get("/secure").add_header("authorization", "X");

        authenticator
            .authenticate(&options(), &mut request)
            .await
            .expect("authenticate");

        assert_eq!(authorization(&request), ["X"]);
    }

    #[test]
    fn debug_redacts_credentials() {
        let debug = format!("{:?}", HttpBasicAuthenticator::new("user", "pass"));
        assert!(!debug.contains("dXNlcjpwYXNz"));
        assert!(debug.contains("redacted"));
    }
}
