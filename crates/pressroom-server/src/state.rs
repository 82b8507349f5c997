//! Application state.

use std::sync::Arc;

use pressroom_core::{GroupAllowList, KeyBuilder};

use crate::cache::ResponseCache;
use crate::source::ContentSource;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The response cache in front of the content source.
    cache: ResponseCache,
    /// Builds keys under this deployment's prefix.
    keys: Arc<KeyBuilder>,
    /// Groups accepted by the content and invalidation endpoints.
    groups: Arc<GroupAllowList>,
    /// The upstream content source.
    source: Arc<dyn ContentSource>,
}

impl AppState {
    /// Creates a new AppState.
    pub fn new(
        cache: ResponseCache,
        keys: KeyBuilder,
        groups: GroupAllowList,
        source: Arc<dyn ContentSource>,
    ) -> Self {
        Self {
            cache,
            keys: Arc::new(keys),
            groups: Arc::new(groups),
            source,
        }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn keys(&self) -> &KeyBuilder {
        &self.keys
    }

    pub fn groups(&self) -> &GroupAllowList {
        &self.groups
    }

    /// Returns a shared handle to the content source, for fetches that
    /// outlive the request.
    pub fn source(&self) -> Arc<dyn ContentSource> {
        Arc::clone(&self.source)
    }
}
