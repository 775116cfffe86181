//! Credentials sent as request parameters.

use std::fmt;

use async_trait::async_trait;
use courier_core::{Parameter, Request, Result};

use super::Authenticator;
use crate::ClientOptions;

/// Adds a username and a password as `GetOrPost` parameters.
///
/// They end up in the form body for POST-like methods and in the query
/// string otherwise. Each parameter is only added when the request does not
/// already carry one with the same name.
#[derive(Clone)]
pub struct SimpleAuthenticator {
    username_key: String,
    username: String,
    password_key: String,
    password: String,
}

impl fmt::Debug for SimpleAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleAuthenticator")
            .field("username_key", &self.username_key)
            .field("username", &self.username)
            .field("password_key", &self.password_key)
            .finish_non_exhaustive()
    }
}

impl SimpleAuthenticator {
    /// Create an authenticator sending `username_key=username` and
    /// `password_key=password`.
    #[must_use]
    pub fn new(
        username_key: impl Into<String>,
        username: impl Into<String>,
        password_key: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username_key: username_key.into(),
            username: username.into(),
            password_key: password_key.into(),
            password: password.into(),
        }
    }
}

#[async_trait]
impl Authenticator for SimpleAuthenticator {
    async fn authenticate(&self, _options: &ClientOptions, request: &mut Request) -> Result<()> {
        request.push_parameter_if_absent(Parameter::get_or_post(&self.username_key, &self.username));
        request.push_parameter_if_absent(Parameter::get_or_post(&self.password_key, &self.password));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use courier_core::{BuildOptions, ParameterKind, build_request};

    use super::*;

    fn authenticator() -> SimpleAuthenticator {
        SimpleAuthenticator::new("user", "ada", "pass", "s3cret")
    }

    #[tokio::test]
    async fn adds_get_or_post_parameters() {
        let options = ClientOptions::builder("http://example.com").build().expect("options");
        let mut request = Request::get("/login");

        authenticator()
            .authenticate(&options, &mut request)
            .await
            .expect("authenticate");

        let user = request.parameter("user", ParameterKind::GetOrPost).expect("user");
        let pass = request.parameter("pass", ParameterKind::GetOrPost).expect("pass");
        assert_eq!(user.value(), "ada");
        assert_eq!(pass.value(), "s3cret");

        let wire = build_request(request, &BuildOptions::new(options.base_url().clone())).expect("build");
        assert_eq!(wire.url().query(), Some("user=ada&pass=s3cret"));
    }

    #[tokio::test]
    async fn keeps_explicit_username() {
        let options = ClientOptions::builder("http://example.com").build().expect("options");
        let mut request = Request::post("/login").add_parameter("user", "grace");

        authenticator()
            .authenticate(&options, &mut request)
            .await
            .expect("authenticate");

        let users: Vec<_> = request
            .parameters()
            .iter()
            .filter(|p| p.matches("user", ParameterKind::GetOrPost))
            .map(Parameter::value)
            .collect();
        assert_eq!(users, ["grace"]);
        assert!(request.has_parameter("pass", ParameterKind::GetOrPost));
    }

    #[test]
    fn debug_hides_password() {
        let debug = format!("{:?}", authenticator());
        assert!(!debug.contains("s3cret"));
    }
}
