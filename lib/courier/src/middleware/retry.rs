//! Retry policy for the transport.
//!
//! Retrying wraps the transport; a retried request is sent again unchanged.

use std::future;

use courier_core::{Error, RawResponse, WireRequest};
use tower::retry::Policy;

/// Retry policy for [`tower::retry::RetryLayer`].
///
/// By default, retries:
/// - connection and name resolution errors
/// - 5xx server errors
/// - 429 Too Many Requests
///
/// Non-idempotent methods (`POST`, `PATCH`) are only retried on connection
/// errors, when the request never reached the server, unless
/// [`RetryPolicy::retry_non_idempotent`] is set.
///
/// # Example
///
/// ```ignore
/// use courier::HyperTransport;
/// use courier::middleware::{RetryLayer, RetryPolicy};
///
/// let transport = HyperTransport::builder()
///     .layer(RetryLayer::new(RetryPolicy::new(3)))
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    remaining: u32,
    non_idempotent: bool,
}

impl RetryPolicy {
    /// Create a retry policy with the given maximum number of retries.
    #[must_use]
    pub const fn new(max_retries: u32) -> Self {
        Self {
            remaining: max_retries,
            non_idempotent: false,
        }
    }

    /// Also retry failed responses to non-idempotent methods.
    #[must_use]
    pub const fn retry_non_idempotent(mut self, retry: bool) -> Self {
        self.non_idempotent = retry;
        self
    }

    /// Returns `true` if the response status is worth another attempt.
    fn should_retry_response(response: &RawResponse) -> bool {
        let status = response.status();
        status >= 500 || status == 429
    }

    /// Returns `true` if the error is worth another attempt.
    fn should_retry_error(error: &Error) -> bool {
        error.is_connection() || error.is_timeout()
    }
}

impl Policy<WireRequest, RawResponse, Error> for RetryPolicy {
    type Future = future::Ready<()>;

    fn retry(
        &mut self,
        req: &mut WireRequest,
        result: &mut Result<RawResponse, Error>,
    ) -> Option<Self::Future> {
        if self.remaining == 0 {
            return None;
        }

        let replayable = self.non_idempotent || req.method().is_idempotent();
        let should_retry = match result {
            Ok(response) => replayable && Self::should_retry_response(response),
            Err(error) if error.is_connection() => true,
            Err(error) => replayable && Self::should_retry_error(error),
        };

        if should_retry {
            self.remaining -= 1;
            Some(future::ready(()))
        } else {
            None
        }
    }

    fn clone_request(&mut self, req: &WireRequest) -> Option<WireRequest> {
        Some(req.clone())
    }
}

#[cfg(test)]
mod tests {
    use courier_core::{Body, HeaderMap, Method};
    use url::Url;

    use super::*;

    fn request(method: Method) -> WireRequest {
        let url = Url::parse("http://example.com/jobs").expect("url");
        WireRequest::new(method, url, HeaderMap::new(), Body::Empty)
    }

    fn response(status: u16) -> RawResponse {
        RawResponse::new(status, HeaderMap::new(), "")
    }

    #[test]
    fn retry_policy_new() {
        let policy = RetryPolicy::new(3);
        assert_eq!(policy.remaining, 3);
        assert!(!policy.non_idempotent);
    }

    #[test]
    fn should_retry_responses() {
        assert!(RetryPolicy::should_retry_response(&response(500)));
        assert!(RetryPolicy::should_retry_response(&response(503)));
        assert!(RetryPolicy::should_retry_response(&response(429)));
        assert!(!RetryPolicy::should_retry_response(&response(404)));
        assert!(!RetryPolicy::should_retry_response(&response(200)));
    }

    #[test]
    fn should_retry_errors() {
        assert!(RetryPolicy::should_retry_error(&Error::connection("refused")));
        assert!(RetryPolicy::should_retry_error(&Error::name_resolution("no host")));
        assert!(RetryPolicy::should_retry_error(&Error::Timeout));
        assert!(!RetryPolicy::should_retry_error(&Error::tls("bad certificate")));
    }

    #[test]
    fn budget_is_consumed() {
        let mut policy = RetryPolicy::new(1);
        let mut req = request(Method::Get);

        assert!(policy.retry(&mut req, &mut Ok(response(502))).is_some());
        assert!(policy.retry(&mut req, &mut Ok(response(502))).is_none());
    }

    #[test]
    fn post_only_retried_on_connection_errors() {
        let mut policy = RetryPolicy::new(3);
        let mut req = request(Method::Post);

        assert!(policy.retry(&mut req, &mut Ok(response(503))).is_none());
        assert!(policy.retry(&mut req, &mut Err(Error::Timeout)).is_none());
        assert!(
            policy
                .retry(&mut req, &mut Err(Error::connection("reset")))
                .is_some()
        );

        let mut policy = RetryPolicy::new(3).retry_non_idempotent(true);
        assert!(policy.retry(&mut req, &mut Ok(response(503))).is_some());
    }

    #[test]
    fn clones_request() {
        let mut policy = RetryPolicy::new(1);
        let req = request(Method::Put);
        let cloned = policy.clone_request(&req).expect("clone");
        assert_eq!(cloned.url(), req.url());
        assert_eq!(cloned.method(), Method::Put);
    }
}
