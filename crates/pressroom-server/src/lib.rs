//! Pressroom Server - HTTP surface and response cache for Pressroom
//!
//! This crate wires the [`cache::ResponseCache`] over a shared
//! [`pressroom_store::Store`] and exposes it through Axum:
//!
//! - `GET /content/{group}/{item}` serves upstream documents through the cache
//! - `GET|POST /api/cache?action=delete|deleteGroup` invalidates entries
//! - `GET /health` and `GET /metrics`

pub mod cache;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod server;
pub mod settings;
pub mod source;
pub mod state;

pub use cache::{CacheError, ResponseCache, WrapOptions};
pub use server::{create_router, create_router_with_state, run_server_with_state};
pub use settings::Settings;
pub use state::AppState;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
