//! Request/response logging with `tracing`.

use async_trait::async_trait;
use courier_core::{RawResponse, Response, Result, WireRequest};
use tracing::{debug, info, warn};

use super::{InterceptContext, Interceptor};

/// Log level for [`LoggingInterceptor`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Log at debug level, including header names and body sizes.
    Debug,
    /// Log at info level (summary only).
    #[default]
    Info,
}

/// Logs each request and response.
///
/// Header values are never logged.
///
/// # Example
///
/// ```
/// use courier::ClientOptions;
/// use courier::interceptor::LoggingInterceptor;
///
/// let options = ClientOptions::builder("https://api.example.com")
///     .interceptor(LoggingInterceptor::new())
///     .build()?;
/// # Ok::<(), courier::Error>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingInterceptor {
    level: LogLevel,
}

impl LoggingInterceptor {
    /// Create a logging interceptor with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a logging interceptor that logs at debug level.
    #[must_use]
    pub fn debug() -> Self {
        Self {
            level: LogLevel::Debug,
        }
    }

    /// The configured level.
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        self.level
    }
}

#[async_trait]
impl Interceptor for LoggingInterceptor {
    async fn before_send(&self, ctx: &InterceptContext, request: &mut WireRequest) -> Result<()> {
        let method = ctx.method();
        let url = request.url().as_str();
        match self.level {
            LogLevel::Debug => {
                let headers: Vec<&str> = request.headers().keys().map(http::HeaderName::as_str).collect();
                debug!(
                    method = %method,
                    url,
                    ?headers,
                    body_bytes = request.body().len(),
                    "sending request"
                );
            }
            LogLevel::Info => info!(method = %method, url, "sending request"),
        }
        Ok(())
    }

    async fn after_send(&self, ctx: &InterceptContext, response: &mut RawResponse) -> Result<()> {
        let status = response.status();
        // Saturating conversion to u64
        let elapsed_ms = u64::try_from(ctx.elapsed().as_millis()).unwrap_or(u64::MAX);

        if response.is_success() {
            info!(resource = ctx.resource(), status, elapsed_ms, "request completed");
        } else {
            warn!(resource = ctx.resource(), status, elapsed_ms, "request failed with HTTP error");
        }
        if self.level == LogLevel::Debug {
            debug!(
                content_type = response.header("content-type"),
                body_bytes = response.body().len(),
                "response received"
            );
        }
        Ok(())
    }

    async fn before_deserialize(&self, _ctx: &InterceptContext, response: &mut Response) -> Result<()> {
        if self.level == LogLevel::Debug {
            debug!(content_type = response.content_type(), "deserializing response");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use courier_core::{Body, HeaderMap, Method, Request};
    use url::Url;

    use super::*;

    #[test]
    fn logging_interceptor_default() {
        assert_eq!(LoggingInterceptor::new().level(), LogLevel::Info);
        assert_eq!(LoggingInterceptor::debug().level(), LogLevel::Debug);
    }

    #[tokio::test]
    async fn hooks_leave_messages_untouched() {
        let interceptor = LoggingInterceptor::debug();
        let ctx = InterceptContext::new(&Request::get("/ping"));

        let mut request = WireRequest::new(
            Method::Get,
            Url::parse("http://example.com/ping").expect("url"),
            HeaderMap::new(),
            Body::Text("hello".to_string()),
        );
        interceptor.before_send(&ctx, &mut request).await.expect("before_send");
        assert_eq!(request.body().as_text(), Some("hello"));

        let mut response = RawResponse::new(503, HeaderMap::new(), "down");
        interceptor.after_send(&ctx, &mut response).await.expect("after_send");
        assert_eq!(response.status(), 503);
        assert_eq!(response.body().as_ref(), b"down");
    }
}
