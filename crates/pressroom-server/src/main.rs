//! Pressroom server binary.

use std::sync::Arc;

use anyhow::Context;
use pressroom_server::cache::{ExpirySweeper, ResponseCache};
use pressroom_server::metrics::init_metrics;
use pressroom_server::source::FileContentSource;
use pressroom_server::{AppState, run_server_with_state, settings};
use pressroom_store::{DiskStore, Store};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = settings::load().context("failed to load settings")?;

    // Initialize tracing; RUST_LOG overrides the configured level
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = settings.addr()?;

    info!(
        "Starting Pressroom server v{}",
        pressroom_server::version()
    );
    info!("Cache directory: {}", settings.cache.file_path.display());
    info!("Content root: {}", settings.content.root.display());
    info!("Key prefix: {}", settings.cache.key_prefix);

    let prometheus = init_metrics()?;

    let store: Arc<dyn Store> = Arc::new(
        DiskStore::open(settings.store_config())
            .await
            .context("failed to open cache directory")?,
    );

    let _sweeper = settings
        .sweep_interval()
        .map(|interval| ExpirySweeper::new(Arc::clone(&store), interval).start());

    let cache = ResponseCache::new(store, settings.wrap_options());
    let defaults = cache.defaults();
    info!(
        ttl_ms = defaults.ttl.as_millis() as u64,
        refresh_threshold_ms = defaults.refresh_threshold.as_millis() as u64,
        "Response cache ready"
    );
    let state = AppState::new(
        cache.clone(),
        settings.key_builder(),
        settings.allow_list()?,
        Arc::new(FileContentSource::new(&settings.content.root)),
    );

    run_server_with_state(addr, state, prometheus).await?;

    if !cache.drain(settings.drain_timeout()).await {
        warn!(
            in_flight = cache.in_flight_refreshes(),
            "Shutting down with background refreshes still running"
        );
    }

    info!("Server stopped");
    Ok(())
}
