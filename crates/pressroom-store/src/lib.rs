//! # Pressroom Store
//!
//! Persistence layer for the Pressroom response cache.
//!
//! ## Features
//!
//! - Async [`Store`] trait with per-entry TTL
//! - [`DiskStore`]: hash-bucketed JSON files under a root directory
//! - Lock files so independent worker processes never interleave writes to a key
//! - Atomic publish via rename; readers never take locks
//!
//! ## Example
//!
//! ```ignore
//! use pressroom_store::{DiskStore, DiskStoreConfig, Store};
//!
//! let store = DiskStore::open(DiskStoreConfig::new("/var/cache/pressroom")).await?;
//! store.set("www:indev:home", value, Duration::from_secs(60)).await?;
//! let entry = store.get("www:indev:home").await?;
//! ```

pub mod disk;
pub mod entry;
pub mod error;
pub mod store;

// Re-exports
pub use disk::{DiskStore, DiskStoreConfig};
pub use entry::StoredEntry;
pub use error::{Result, StoreError};
pub use store::Store;
