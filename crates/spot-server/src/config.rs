use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use spot_registry::{RegistryConfig, SweeperConfig};

use crate::error::{ServerError, ServerResult};

/// Top-level server configuration, read from a TOML file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// First path segment of every route, e.g. `v1`.
    pub api_version: String,
    pub store: StoreConfig,
    pub registry: RegistrySettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            api_version: "v1".to_string(),
            store: StoreConfig::default(),
            registry: RegistrySettings::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_toml(text: &str) -> ServerResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> ServerResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ServerError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml(&text)
    }

    pub fn to_toml(&self) -> ServerResult<String> {
        toml::to_string_pretty(self).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn validate(&self) -> ServerResult<()> {
        if self.api_version.is_empty() || self.api_version.contains('/') {
            return Err(ServerError::Config(format!(
                "api_version must be a single path segment, got {:?}",
                self.api_version
            )));
        }
        if self.registry.sweep_interval_secs == 0 {
            return Err(ServerError::Config(
                "registry.sweep_interval_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Where the garage catalog is persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoreConfig {
    /// A JSON document file, created on first write.
    File { path: PathBuf },
    /// Nothing survives a restart.
    Memory,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::File {
            path: PathBuf::from("garages.json"),
        }
    }
}

/// Registry deadlines and sweep schedule, in seconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySettings {
    pub store_timeout_secs: u64,
    pub load_timeout_secs: u64,
    pub sweep_interval_secs: u64,
    pub stale_after_secs: u64,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        let registry = RegistryConfig::default();
        Self {
            store_timeout_secs: registry.store_timeout.as_secs(),
            load_timeout_secs: registry.load_timeout.as_secs(),
            sweep_interval_secs: SweeperConfig::default().interval.as_secs(),
            stale_after_secs: registry.stale_after.as_secs(),
        }
    }
}

impl RegistrySettings {
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            store_timeout: Duration::from_secs(self.store_timeout_secs),
            load_timeout: Duration::from_secs(self.load_timeout_secs),
            stale_after: Duration::from_secs(self.stale_after_secs),
        }
    }

    pub fn sweeper_config(&self) -> SweeperConfig {
        SweeperConfig {
            interval: Duration::from_secs(self.sweep_interval_secs),
        }
    }
}
