//! Cache module for the Pressroom server.
//!
//! This module provides the read-through response cache over a shared
//! [`pressroom_store::Store`], with stale-while-revalidate refreshes,
//! pattern-based invalidation, expiry sweeping and metrics.

pub mod invalidation;
pub mod options;
pub mod refresh;
pub mod response_cache;
pub mod sweeper;

// Re-exports
pub use invalidation::InvalidationResult;
pub use options::WrapOptions;
pub use refresh::RefreshTracker;
pub use response_cache::{CacheError, ResponseCache};
pub use sweeper::{ExpirySweeper, SweeperHandle};
