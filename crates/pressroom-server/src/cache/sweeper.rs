//! Background reclamation of expired entries.

use std::sync::Arc;
use std::time::Duration;

use pressroom_store::Store;
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

/// Handle for controlling a running sweeper. Dropping it stops the loop.
pub struct SweeperHandle {
    shutdown_tx: watch::Sender<bool>,
}

impl SweeperHandle {
    /// Signals the sweeper to stop.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Periodically removes expired entries from a [`Store`].
///
/// Reads already ignore expired entries; the sweeper only keeps the
/// directory from growing with entries nobody asks for again.
pub struct ExpirySweeper {
    store: Arc<dyn Store>,
    interval: Duration,
}

impl ExpirySweeper {
    pub fn new(store: Arc<dyn Store>, interval: Duration) -> Self {
        Self { store, interval }
    }

    /// Spawns the sweep loop. The first sweep runs immediately.
    pub fn start(self) -> SweeperHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = SweeperHandle { shutdown_tx };

        tokio::spawn(self.run(shutdown_rx));

        handle
    }

    async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        let mut timer = interval(self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            store = self.store.name(),
            interval_secs = self.interval.as_secs_f64(),
            "Starting expiry sweeper"
        );

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    self.sweep().await;
                }
                result = shutdown_rx.changed() => {
                    if result.is_err() || *shutdown_rx.borrow() {
                        info!("Expiry sweeper shutting down");
                        break;
                    }
                }
            }
        }
    }

    async fn sweep(&self) {
        match self.store.purge_expired().await {
            Ok(0) => debug!("Sweep found no expired entries"),
            Ok(count) => info!(count, "Expired cache entries reclaimed"),
            Err(e) => warn!(error = %e, "Sweep failed"),
        }
    }
}
