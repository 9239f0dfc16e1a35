//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.

use provider::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_TIMEOUT};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Overrides `[server] listen_addr` when set.
pub const LISTEN_ADDR_ENV: &str = "VALIDATOR_LISTEN_ADDR";

const DEFAULT_PATH: &str = "credential-validator.toml";

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
}

/// Inbound HTTP settings
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

/// Outbound probe settings
#[derive(Debug, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// JSON catalog replacing the embedded one.
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            catalog_path: None,
        }
    }
}

impl ValidationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn default_max_connections() -> usize {
    1000
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT.as_secs()
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if config.validation.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if config.validation.connect_timeout_secs == 0 {
            return Err(common::Error::Config(
                "connect_timeout_secs must be greater than 0".into(),
            ));
        }

        if config.server.max_connections == 0 {
            return Err(common::Error::Config(
                "max_connections must be greater than 0".into(),
            ));
        }

        if let Ok(addr) = std::env::var(LISTEN_ADDR_ENV) {
            config.server.listen_addr = addr.parse().map_err(|e| {
                common::Error::Config(format!(
                    "{LISTEN_ADDR_ENV} must be a socket address, got {addr:?}: {e}"
                ))
            })?;
        }

        // A relative catalog path is relative to the config file.
        if let Some(catalog) = config.validation.catalog_path.take() {
            let resolved = match path.parent() {
                Some(dir) if catalog.is_relative() => dir.join(catalog),
                _ => catalog,
            };
            config.validation.catalog_path = Some(resolved);
        }

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from(DEFAULT_PATH)
    }
}
