//! Cache metrics recording.

use metrics::{counter, histogram};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Registra las metricas de cache.
/// Llamar una vez al inicio para registrar las metricas.
pub fn register_cache_metrics() {
    metrics::describe_counter!("pressroom_cache_hits_total", "Total number of fresh cache hits");
    metrics::describe_counter!("pressroom_cache_misses_total", "Total number of cache misses");
    metrics::describe_counter!(
        "pressroom_cache_stale_hits_total",
        "Total number of hits inside the refresh window"
    );
    metrics::describe_counter!(
        "pressroom_cache_refreshes_total",
        "Total number of background refreshes, by outcome"
    );
    metrics::describe_counter!(
        "pressroom_cache_invalidations_total",
        "Total number of entries removed by invalidation"
    );
    metrics::describe_histogram!(
        "pressroom_cache_operation_seconds",
        "Time spent on cache operations"
    );
}

/// Recorder de metricas de cache.
/// Usa atomic counters internos para consultas rapidas en tests y logs.
#[derive(Debug, Clone, Default)]
pub struct CacheMetrics {
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
    stale_hits: Arc<AtomicU64>,
    refresh_failures: Arc<AtomicU64>,
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra un cache hit
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        counter!("pressroom_cache_hits_total").increment(1);
    }

    /// Registra un cache miss
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        counter!("pressroom_cache_misses_total").increment(1);
    }

    /// Registra un hit dentro de la ventana de refresco
    pub fn record_stale_hit(&self) {
        self.stale_hits.fetch_add(1, Ordering::Relaxed);
        counter!("pressroom_cache_stale_hits_total").increment(1);
    }

    /// Registra un refresco en segundo plano completado
    pub fn record_refresh(&self) {
        counter!("pressroom_cache_refreshes_total", "outcome" => "ok").increment(1);
    }

    /// Registra un refresco en segundo plano fallido
    pub fn record_refresh_failure(&self) {
        self.refresh_failures.fetch_add(1, Ordering::Relaxed);
        counter!("pressroom_cache_refreshes_total", "outcome" => "error").increment(1);
    }

    /// Registra entries invalidadas
    pub fn record_invalidation(&self, count: usize) {
        counter!("pressroom_cache_invalidations_total").increment(count as u64);
    }

    /// Registra la duracion de una operacion
    pub fn record_operation_duration(&self, operation: &'static str, duration: Duration) {
        histogram!("pressroom_cache_operation_seconds", "operation" => operation)
            .record(duration.as_secs_f64());
    }

    /// Calcula hit rate (para logging/debugging). Stale hits cuentan como hits.
    pub fn hit_rate(&self) -> f64 {
        let hits = (self.hits() + self.stale_hits()) as f64;
        let misses = self.misses() as f64;
        let total = hits + misses;
        if total == 0.0 { 0.0 } else { hits / total }
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn stale_hits(&self) -> u64 {
        self.stale_hits.load(Ordering::Relaxed)
    }

    pub fn refresh_failures(&self) -> u64 {
        self.refresh_failures.load(Ordering::Relaxed)
    }
}
