//! Metrics module for the Pressroom server.
//!
//! Cache counters live next to the cache in [`CacheMetrics`]; HTTP counters
//! are recorded by [`http::http_metrics_middleware`].

pub mod cache;
pub mod http;
pub mod setup;

pub use cache::{CacheMetrics, register_cache_metrics};
pub use http::register_http_metrics;
pub use setup::{MetricsError, detached_handle, init_metrics};
