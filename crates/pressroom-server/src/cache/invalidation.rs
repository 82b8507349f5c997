//! Group invalidation with glob pattern matching.

use glob::Pattern;
use pressroom_core::{GroupKey, KeyBuilder};
use serde::Serialize;
use tracing::{debug, info};

use crate::cache::{CacheError, ResponseCache};

/// Resultado de una operación de invalidación.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidationResult {
    /// Número de entries invalidadas.
    pub count: usize,
    /// Patrones aplicados.
    pub patterns: Vec<String>,
}

impl ResponseCache {
    /// Invalida todas las entradas de un grupo.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use std::sync::Arc;
    /// # use pressroom_core::{GroupAllowList, KeyBuilder};
    /// # use pressroom_server::cache::{ResponseCache, WrapOptions};
    /// # use pressroom_store::{DiskStore, DiskStoreConfig};
    /// # #[tokio::main]
    /// # async fn main() -> anyhow::Result<()> {
    /// # let store = DiskStore::open(DiskStoreConfig::new("/tmp/pressroom")).await?;
    /// # let cache = ResponseCache::new(Arc::new(store), WrapOptions::default());
    /// let keys = KeyBuilder::new("www");
    /// let group = GroupAllowList::default().resolve("publications")?;
    /// let result = cache.invalidate_group(&keys, &group).await?;
    /// println!("Invalidated {} entries", result.count);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn invalidate_group(
        &self,
        keys: &KeyBuilder,
        group: &GroupKey,
    ) -> Result<InvalidationResult, CacheError> {
        let pattern = keys.group_pattern(group.as_str());
        self.invalidate_by_pattern(&pattern).await
    }

    /// Invalida entradas usando un patrón glob sobre la key completa.
    ///
    /// - `*`: coincide con cualquier secuencia de caracteres
    /// - `?`: coincide con un carácter
    ///
    /// An invalid pattern matches nothing.
    pub async fn invalidate_by_pattern(
        &self,
        pattern_str: &str,
    ) -> Result<InvalidationResult, CacheError> {
        let pattern = match Pattern::new(pattern_str) {
            Ok(p) => p,
            Err(e) => {
                debug!(pattern = %pattern_str, error = %e, "Invalid glob pattern");
                return Ok(InvalidationResult {
                    count: 0,
                    patterns: vec![pattern_str.to_string()],
                });
            },
        };

        let matching: Vec<String> = self
            .store()
            .keys()
            .await?
            .into_iter()
            .filter(|key| pattern.matches(key))
            .collect();

        let count = matching.len();
        for key in &matching {
            self.store().delete(key).await?;
        }
        self.metrics().record_invalidation(count);

        info!(
            pattern = %pattern_str,
            count = count,
            "Cache entries invalidated by pattern"
        );

        Ok(InvalidationResult {
            count,
            patterns: vec![pattern_str.to_string()],
        })
    }
}
