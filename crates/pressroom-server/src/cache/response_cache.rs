//! Read-through response cache with stale-while-revalidate refreshes.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use pressroom_core::{CacheKey, Clock, SystemClock};
use pressroom_store::{Store, StoreError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{Instrument, debug, debug_span, info, warn};

use crate::cache::options::WrapOptions;
use crate::cache::refresh::RefreshTracker;
use crate::metrics::CacheMetrics;

/// Error del sistema de cache
#[derive(Debug, Error)]
pub enum CacheError {
    /// The store could not be read or written.
    #[error("cache store error: {0}")]
    Store(#[from] StoreError),

    /// The caller-supplied fetch failed and there was no servable value.
    #[error("failed to fetch fresh value: {0:#}")]
    Upstream(anyhow::Error),

    /// The value could not be encoded for storage.
    #[error("failed to encode value: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Outcome of looking a key up against the caller's options.
enum Lookup<T> {
    Fresh(T),
    Stale(T),
    Miss,
}

/// Cache de respuestas sobre un [`Store`] compartido entre procesos.
///
/// One instance is built at startup and cloned into every handler; clones
/// share the store, metrics and refresh bookkeeping.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use pressroom_core::KeyBuilder;
/// use pressroom_server::cache::{ResponseCache, WrapOptions};
/// use pressroom_store::{DiskStore, DiskStoreConfig};
///
/// # #[tokio::main]
/// # async fn main() -> anyhow::Result<()> {
/// let store = DiskStore::open(DiskStoreConfig::new("/var/cache/pressroom")).await?;
/// let cache = ResponseCache::new(Arc::new(store), WrapOptions::default());
/// let key = KeyBuilder::new("www").build("publications", "latest");
///
/// let titles: Vec<String> = cache
///     .wrap_default(&key, || async {
///         // Fetch from the feed API (only on miss or inside the refresh window)
///         Ok(vec!["Annual report".to_string()])
///     })
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ResponseCache {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    defaults: WrapOptions,
    refreshes: RefreshTracker,
    metrics: CacheMetrics,
}

impl ResponseCache {
    /// Crea un cache sobre el store dado, usando el reloj del sistema.
    pub fn new(store: Arc<dyn Store>, defaults: WrapOptions) -> Self {
        Self::with_clock(store, defaults, Arc::new(SystemClock))
    }

    /// Crea un cache que calcula la edad de las entries con `clock`.
    ///
    /// The clock must agree with the one the store stamps entries with.
    pub fn with_clock(store: Arc<dyn Store>, defaults: WrapOptions, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            defaults,
            refreshes: RefreshTracker::new(),
            metrics: CacheMetrics::new(),
        }
    }

    /// Returns the value cached under `key`, computing it with `compute` when
    /// needed.
    ///
    /// - missing or older than `options.ttl`: awaits `compute`, stores and
    ///   returns its value; a failing `compute` is returned as
    ///   [`CacheError::Upstream`] and nothing is stored
    /// - younger than `ttl - refresh_threshold`: returns the cached value
    /// - otherwise: returns the cached value and runs `compute` in a detached
    ///   task that overwrites the entry; its failures are only logged
    ///
    /// Concurrent misses for the same key each run their own `compute`.
    pub async fn wrap<T, F, Fut>(
        &self,
        key: &CacheKey,
        compute: F,
        options: WrapOptions,
    ) -> Result<T, CacheError>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let start = Instant::now();

        match self.lookup::<T>(key, options).await? {
            Lookup::Fresh(value) => {
                self.metrics.record_hit();
                self.metrics
                    .record_operation_duration("wrap_hit", start.elapsed());
                return Ok(value);
            },
            Lookup::Stale(value) => {
                self.metrics.record_stale_hit();
                self.spawn_refresh(key.clone(), compute, options);
                self.metrics
                    .record_operation_duration("wrap_stale", start.elapsed());
                return Ok(value);
            },
            Lookup::Miss => {},
        }

        self.metrics.record_miss();

        let value = compute().await.map_err(CacheError::Upstream)?;
        self.store
            .set(key.as_str(), serde_json::to_value(&value)?, options.ttl)
            .await?;

        self.metrics
            .record_operation_duration("wrap_miss", start.elapsed());

        Ok(value)
    }

    /// [`wrap`](Self::wrap) with the configured default options.
    pub async fn wrap_default<T, F, Fut>(&self, key: &CacheKey, compute: F) -> Result<T, CacheError>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        self.wrap(key, compute, self.defaults).await
    }

    /// Invalida una entrada especifica. Invalidar una key ausente no es error.
    pub async fn invalidate(&self, key: &CacheKey) -> Result<(), CacheError> {
        self.store.delete(key.as_str()).await?;
        self.metrics.record_invalidation(1);

        info!(key = %key, "Cache entry invalidated");
        Ok(())
    }

    /// Waits up to `timeout` for background refreshes to finish.
    /// Returns false if some were still running.
    pub async fn drain(&self, timeout: Duration) -> bool {
        self.refreshes.drain(timeout).await
    }

    /// Number of background refreshes running in this process.
    pub fn in_flight_refreshes(&self) -> usize {
        self.refreshes.in_flight()
    }

    /// Options [`wrap_default`](Self::wrap_default) applies.
    pub fn defaults(&self) -> WrapOptions {
        self.defaults
    }

    pub(crate) fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Retorna las metricas para acceso externo.
    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    async fn lookup<T: DeserializeOwned>(
        &self,
        key: &CacheKey,
        options: WrapOptions,
    ) -> Result<Lookup<T>, CacheError> {
        let Some(entry) = self.store.get(key.as_str()).await? else {
            return Ok(Lookup::Miss);
        };

        // The caller's TTL may be shorter than the one the entry was stored with.
        let age = entry.age(self.clock.now_millis());
        if age >= options.ttl {
            debug!(key = %key, age_ms = age.as_millis() as u64, "Cache entry expired");
            return Ok(Lookup::Miss);
        }

        let value = match serde_json::from_value::<T>(entry.value) {
            Ok(value) => value,
            Err(e) => {
                warn!(key = %key, error = %e, "Cached value has unexpected shape, recomputing");
                return Ok(Lookup::Miss);
            },
        };

        if age >= options.refresh_after() {
            Ok(Lookup::Stale(value))
        } else {
            Ok(Lookup::Fresh(value))
        }
    }

    fn spawn_refresh<T, F, Fut>(&self, key: CacheKey, compute: F, options: WrapOptions)
    where
        T: Serialize + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let Some(guard) = self.refreshes.try_begin(&key) else {
            debug!(key = %key, "Refresh already in flight");
            return;
        };

        let store = Arc::clone(&self.store);
        let metrics = self.metrics.clone();
        let span = debug_span!("cache_refresh", key = %key);

        tokio::spawn(
            async move {
                let _guard = guard;

                let result = async {
                    let value = compute().await.map_err(CacheError::Upstream)?;
                    store
                        .set(key.as_str(), serde_json::to_value(&value)?, options.ttl)
                        .await?;
                    Ok::<_, CacheError>(())
                }
                .await;

                match result {
                    Ok(()) => {
                        metrics.record_refresh();
                        debug!("Background refresh stored");
                    },
                    Err(e) => {
                        metrics.record_refresh_failure();
                        warn!(error = %e, "Background refresh failed, cached value kept");
                    },
                }
            }
            .instrument(span),
        );
    }
}
