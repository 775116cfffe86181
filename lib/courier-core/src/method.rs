//! Request methods.

use derive_more::Display;

/// Request method.
///
/// Determines where `GetOrPost` parameters go, see [`Method::allows_body`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
pub enum Method {
    /// `GET`
    #[default]
    #[display("GET")]
    Get,
    /// `POST`
    #[display("POST")]
    Post,
    /// `PUT`
    #[display("PUT")]
    Put,
    /// `DELETE`
    #[display("DELETE")]
    Delete,
    /// `PATCH`
    #[display("PATCH")]
    Patch,
    /// `HEAD`
    #[display("HEAD")]
    Head,
    /// `OPTIONS`
    #[display("OPTIONS")]
    Options,
}

impl Method {
    /// `GET`, `HEAD` and `OPTIONS`.
    #[must_use]
    pub const fn is_safe(&self) -> bool {
        matches!(self, Self::Get | Self::Head | Self::Options)
    }

    /// Safe methods plus `PUT` and `DELETE`. Retry layers only retry these by default.
    #[must_use]
    pub const fn is_idempotent(&self) -> bool {
        matches!(
            self,
            Self::Get | Self::Head | Self::Options | Self::Put | Self::Delete
        )
    }

    /// Returns `true` for POST-like methods.
    ///
    /// `GetOrPost` parameters are form-encoded into the body for these methods
    /// and appended to the query string for every other method.
    #[must_use]
    pub const fn allows_body(&self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Delete => Self::DELETE,
            Method::Patch => Self::PATCH,
            Method::Head => Self::HEAD,
            Method::Options => Self::OPTIONS,
        }
    }
}

impl TryFrom<http::Method> for Method {
    type Error = crate::Error;

    fn try_from(method: http::Method) -> Result<Self, Self::Error> {
        match method {
            http::Method::GET => Ok(Self::Get),
            http::Method::POST => Ok(Self::Post),
            http::Method::PUT => Ok(Self::Put),
            http::Method::DELETE => Ok(Self::Delete),
            http::Method::PATCH => Ok(Self::Patch),
            http::Method::HEAD => Ok(Self::Head),
            http::Method::OPTIONS => Ok(Self::Options),
            other => Err(crate::Error::invalid_request(format!(
                "unsupported HTTP method: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_display() {
        assert_eq!(Method::Get.to_string(), "GET");
        assert_eq!(Method::Post.to_string(), "POST");
        assert_eq!(Method::Patch.to_string(), "PATCH");
        assert_eq!(Method::Options.to_string(), "OPTIONS");
    }

    #[test]
    fn method_is_safe() {
        assert!(Method::Get.is_safe());
        assert!(Method::Head.is_safe());
        assert!(!Method::Post.is_safe());
        assert!(!Method::Delete.is_safe());
    }

    #[test]
    fn method_allows_body() {
        assert!(Method::Post.allows_body());
        assert!(Method::Put.allows_body());
        assert!(Method::Patch.allows_body());
        assert!(!Method::Get.allows_body());
        assert!(!Method::Delete.allows_body());
        assert!(!Method::Head.allows_body());
        assert!(!Method::Options.allows_body());
    }

    #[test]
    fn method_http_conversions() {
        assert_eq!(http::Method::from(Method::Get), http::Method::GET);
        assert_eq!(
            Method::try_from(http::Method::PUT).expect("PUT"),
            Method::Put
        );
        assert!(Method::try_from(http::Method::TRACE).is_err());
    }
}
