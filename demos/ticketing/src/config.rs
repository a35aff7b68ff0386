//! Application configuration.
//!
//! Process-level settings come from environment variables with defaults.
//! The simulation parameters themselves are entered interactively and kept
//! in a JSON file between runs (see [`ConfigStore`]).

use crate::error::AppError;
use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use ticket_pool_core::config::SimulationConfig;
use ticket_pool_runtime::sink::DEFAULT_TRANSACTIONS_FILE;

/// Default simulation config file
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Default log filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "ticketing=info,ticket_pool_runtime=info,ticket_pool_core=info";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Where the simulation config is saved and loaded (`TICKETING_CONFIG_PATH`)
    pub config_path: PathBuf,
    /// Where transactions are exported (`TICKETING_TRANSACTIONS_PATH`)
    pub transactions_path: PathBuf,
    /// Prometheus listener address (`TICKETING_METRICS_ADDR`), disabled if unset
    pub metrics_addr: Option<SocketAddr>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// An unparseable `TICKETING_METRICS_ADDR` is logged and ignored.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let metrics_addr = lookup("TICKETING_METRICS_ADDR").and_then(|raw| {
            raw.parse()
                .map_err(|error| {
                    tracing::warn!(value = %raw, error = %error, "Ignoring invalid TICKETING_METRICS_ADDR");
                })
                .ok()
        });

        Self {
            config_path: lookup("TICKETING_CONFIG_PATH")
                .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from),
            transactions_path: lookup("TICKETING_TRANSACTIONS_PATH")
                .map_or_else(|| PathBuf::from(DEFAULT_TRANSACTIONS_FILE), PathBuf::from),
            metrics_addr,
        }
    }
}

/// Loads and saves a [`SimulationConfig`] as JSON.
///
/// Files written by older versions (`totalTickets`, `ticketReleaseRate`,
/// `customerRetrievalRate`, `maxTicketCapacity`) load as well.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Store backed by `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the saved configuration. Returns `Ok(None)` if no file exists.
    ///
    /// The result is not validated.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Io`] if the file exists but cannot be read, or
    /// [`AppError::Json`] if it is not a configuration.
    pub async fn load(&self) -> Result<Option<SimulationConfig>, AppError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Write `config` as pretty-printed JSON, replacing any previous file.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Io`] if the file cannot be written.
    pub async fn save(&self, config: &SimulationConfig) -> Result<(), AppError> {
        let bytes = serde_json::to_vec_pretty(config)?;
        tokio::fs::write(&self.path, bytes).await?;
        tracing::debug!(path = %self.path.display(), "Configuration saved");
        Ok(())
    }
}
