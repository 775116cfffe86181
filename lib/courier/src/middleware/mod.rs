//! Tower middleware layers for the courier transport.
//!
//! Layers wrap the [`crate::HyperTransport`] service, below the execution
//! pipeline: they see wire requests and raw responses only. Retrying belongs
//! here; the pipeline itself never retries.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `middleware-retry` | `.with_retry()` helper |
//! | `middleware-concurrency` | `.with_concurrency_limit()` helper |
//! | `middleware-decompression` | `.with_decompression()` helper |
//! | `middleware-core` | All of the above (default) |
//!
//! # Available Layers
//!
//! - [`RetryPolicy`] - retry policy for [`RetryLayer`]
//! - [`DecompressionLayer`] - decompresses responses by `Content-Encoding`
//! - [`ConcurrencyLimitLayer`] - limits concurrent requests
//!
//! # Example
//!
//! ```ignore
//! use courier::HyperTransport;
//! use courier::middleware::{ConcurrencyLimitLayer, DecompressionLayer};
//!
//! let transport = HyperTransport::builder()
//!     .with_retry(3)
//!     .layer(DecompressionLayer::new())
//!     .layer(ConcurrencyLimitLayer::new(8))
//!     .build();
//! ```

mod decompression;
mod retry;

pub use decompression::{Decompression, DecompressionLayer};
pub use retry::RetryPolicy;

// Re-export tower types for convenience
pub use tower::{Layer, ServiceBuilder};

// Re-export tower middleware layers
pub use tower::limit::ConcurrencyLimitLayer;
pub use tower::retry::RetryLayer;
