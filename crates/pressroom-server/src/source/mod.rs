//! Upstream content sources.
//!
//! The cache sits in front of a [`ContentSource`]; handlers only ever fetch
//! through [`crate::cache::ResponseCache::wrap`].

mod error;
mod file;

pub use error::SourceError;
pub use file::FileContentSource;

use async_trait::async_trait;

/// A slow upstream that produces documents by group and item.
///
/// # Implementors
///
/// - `FileContentSource` - reads `<root>/<group>/<item>.json` documents
///
/// # Example
///
/// ```ignore
/// use pressroom_server::source::{ContentSource, SourceError};
///
/// struct FeedApi;
///
/// #[async_trait]
/// impl ContentSource for FeedApi {
///     async fn fetch(&self, group: &str, item: &str) -> Result<serde_json::Value, SourceError> {
///         // Call the feed API here
///     }
///
///     fn name(&self) -> &str {
///         "feed-api"
///     }
/// }
/// ```
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetches the document for `item` in `group`.
    ///
    /// # Errors
    ///
    /// - `SourceError::NotFound` if the upstream has no such document
    /// - `SourceError::Unavailable` if the upstream cannot be reached
    async fn fetch(&self, group: &str, item: &str) -> Result<serde_json::Value, SourceError>;

    /// Returns the name of this source, for logging.
    fn name(&self) -> &str;
}
