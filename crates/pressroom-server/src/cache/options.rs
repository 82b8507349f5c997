//! Per-call cache options.

use std::time::Duration;

/// TTL y ventana de refresco para una llamada a `wrap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrapOptions {
    /// Edad maxima servible (default: 300s)
    pub ttl: Duration,
    /// Ventana antes de expirar en la que una lectura dispara un refresco (default: 60s)
    pub refresh_threshold: Duration,
}

impl WrapOptions {
    pub fn new(ttl: Duration, refresh_threshold: Duration) -> Self {
        Self {
            ttl,
            refresh_threshold,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_refresh_threshold(mut self, refresh_threshold: Duration) -> Self {
        self.refresh_threshold = refresh_threshold;
        self
    }

    /// Age from which a read also triggers a background refresh.
    ///
    /// A threshold at or above the TTL makes every hit refresh.
    pub fn refresh_after(&self) -> Duration {
        self.ttl.saturating_sub(self.refresh_threshold)
    }
}

impl Default for WrapOptions {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            refresh_threshold: Duration::from_secs(60),
        }
    }
}
