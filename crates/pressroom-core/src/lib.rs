//! Pressroom Core - cache key and group types
//!
//! This crate provides the leaf types of the Pressroom response cache:
//! key derivation, the allow-list of cache groups and the clock used to age
//! entries.

pub mod clock;
pub mod error;
pub mod groups;
pub mod keys;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CoreError, Result};
pub use groups::{DEFAULT_GROUPS, GroupAllowList, GroupKey};
pub use keys::{CacheKey, KEY_SEPARATOR, KeyBuilder};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
