//! Metrics setup and initialization.

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::info;

use super::{register_cache_metrics, register_http_metrics};

/// Buckets de latencia en segundos. Upstream fetches on a miss dominate the
/// upper end, disk hits the lower.
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

#[derive(Debug, thiserror::Error)]
#[error("failed to initialize metrics: {0}")]
pub struct MetricsError(#[from] BuildError);

/// Inicializa el sistema de metricas y retorna el handle para el endpoint.
///
/// Installs the global recorder, so call it once per process.
pub fn init_metrics() -> Result<PrometheusHandle, MetricsError> {
    let handle = PrometheusBuilder::new()
        .set_buckets(LATENCY_BUCKETS)?
        .install_recorder()?;

    register_cache_metrics();
    register_http_metrics();

    info!("Metrics system initialized");
    Ok(handle)
}

/// Builds a handle without installing a global recorder, for routers built
/// in tests.
pub fn detached_handle() -> PrometheusHandle {
    PrometheusBuilder::new().build_recorder().handle()
}
