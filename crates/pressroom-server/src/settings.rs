//! Server settings.
//!
//! Precedence, lowest first: built-in defaults, the config file
//! (`PRESSROOM_CONFIG_FILE`, else `pressroom.{toml,yaml,json}` in the working
//! directory if present), then `PRESSROOM__SECTION__KEY` environment variables.
//!
//! ```toml
//! [cache]
//! key_prefix = "www"
//! file_path = "/var/cache/pressroom"
//! default_ttl_ms = 300000
//! refresh_threshold_ms = 60000
//! allowed_groups = ["publications", "indev"]
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use pressroom_core::{DEFAULT_GROUPS, GroupAllowList, KeyBuilder};
use pressroom_store::DiskStoreConfig;
use serde::Deserialize;

use crate::cache::WrapOptions;

/// Environment variable naming an explicit config file.
pub const CONFIG_FILE_ENV: &str = "PRESSROOM_CONFIG_FILE";
const DEFAULT_CONFIG_BASENAME: &str = "pressroom";
const ENV_PREFIX: &str = "PRESSROOM";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl SettingsError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub cache: CacheSettings,
    pub content: ContentSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// IP address to bind; host names are not resolved.
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Scopes keys per deployment environment.
    pub key_prefix: String,
    pub default_ttl_ms: u64,
    pub refresh_threshold_ms: u64,
    /// Directory shared by every worker process.
    pub file_path: PathBuf,
    pub lock_timeout_ms: u64,
    pub stale_lock_after_ms: u64,
    /// 0 disables the expiry sweeper.
    pub sweep_interval_secs: u64,
    /// How long shutdown waits for background refreshes.
    pub drain_timeout_ms: u64,
    pub allowed_groups: Vec<String>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            key_prefix: "pressroom".to_string(),
            default_ttl_ms: 300_000,
            refresh_threshold_ms: 60_000,
            file_path: PathBuf::from(".cache/pressroom"),
            lock_timeout_ms: 2_000,
            stale_lock_after_ms: 30_000,
            sweep_interval_secs: 300,
            drain_timeout_ms: 5_000,
            allowed_groups: DEFAULT_GROUPS.iter().map(|g| g.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContentSettings {
    /// Root of the `<group>/<item>.json` documents.
    pub root: PathBuf,
}

impl Default for ContentSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("content"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default `EnvFilter` directive; `RUST_LOG` overrides it.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Loads settings from the default file location and the environment.
pub fn load() -> Result<Settings, SettingsError> {
    let file = std::env::var_os(CONFIG_FILE_ENV).map(PathBuf::from);
    load_from(file.as_deref())
}

/// Loads settings from `file` (required when given) and the environment.
pub fn load_from(file: Option<&Path>) -> Result<Settings, SettingsError> {
    let builder = Config::builder();
    let builder = match file {
        Some(path) => builder.add_source(File::from(path).required(true)),
        None => builder.add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false)),
    };

    let settings: Settings = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("cache.allowed_groups")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()?;

    settings.validate()?;
    Ok(settings)
}

impl Settings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        let cache = &self.cache;

        if cache.key_prefix.trim().is_empty() {
            return Err(SettingsError::invalid("cache.key_prefix", "must not be empty"));
        }
        if cache.default_ttl_ms == 0 {
            return Err(SettingsError::invalid("cache.default_ttl_ms", "must be positive"));
        }
        if cache.refresh_threshold_ms > cache.default_ttl_ms {
            return Err(SettingsError::invalid(
                "cache.refresh_threshold_ms",
                format!(
                    "{} exceeds default_ttl_ms {}",
                    cache.refresh_threshold_ms, cache.default_ttl_ms
                ),
            ));
        }
        if cache.lock_timeout_ms == 0 {
            return Err(SettingsError::invalid("cache.lock_timeout_ms", "must be positive"));
        }
        if cache.file_path.as_os_str().is_empty() {
            return Err(SettingsError::invalid("cache.file_path", "must not be empty"));
        }
        self.allow_list()?;
        self.addr()?;

        Ok(())
    }

    pub fn addr(&self) -> Result<SocketAddr, SettingsError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| SettingsError::invalid("server.host", format!("{e}")))
    }

    pub fn wrap_options(&self) -> WrapOptions {
        WrapOptions::new(
            Duration::from_millis(self.cache.default_ttl_ms),
            Duration::from_millis(self.cache.refresh_threshold_ms),
        )
    }

    pub fn store_config(&self) -> DiskStoreConfig {
        DiskStoreConfig::new(&self.cache.file_path)
            .with_lock_timeout(Duration::from_millis(self.cache.lock_timeout_ms))
            .with_stale_lock_after(Duration::from_millis(self.cache.stale_lock_after_ms))
    }

    pub fn key_builder(&self) -> KeyBuilder {
        KeyBuilder::new(self.cache.key_prefix.trim())
    }

    pub fn allow_list(&self) -> Result<GroupAllowList, SettingsError> {
        GroupAllowList::new(&self.cache.allowed_groups)
            .map_err(|e| SettingsError::invalid("cache.allowed_groups", e.to_string()))
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.cache.sweep_interval_secs > 0)
            .then(|| Duration::from_secs(self.cache.sweep_interval_secs))
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.cache.drain_timeout_ms)
    }
}
