//! Runtime settings, loaded from an optional YAML file.
//!
//! Every key is optional; anything left out falls back to the defaults
//! below. Command-line flags are applied on top by `main`.
//!
//! ```yaml
//! registry_path: data/feeds.csv
//! snapshot_path: data/articles.csv
//! per_page: 10
//! fetch:
//!   feed_timeout_secs: 15
//!   page_timeout_secs: 8
//!   feed_concurrency: 8
//!   page_concurrency: 16
//!   max_retries: 2
//!   base_delay_ms: 500
//! ```

use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Feed registry CSV.
    pub registry_path: PathBuf,
    /// Article snapshot CSV.
    pub snapshot_path: PathBuf,
    pub per_page: usize,
    pub fetch: FetchSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            registry_path: PathBuf::from("data/feeds.csv"),
            snapshot_path: PathBuf::from("data/articles.csv"),
            per_page: 10,
            fetch: FetchSettings::default(),
        }
    }
}

/// Network limits for a refresh.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub feed_timeout_secs: u64,
    pub page_timeout_secs: u64,
    /// Feeds fetched at the same time.
    pub feed_concurrency: usize,
    /// Article pages fetched at the same time, across all feeds.
    pub page_concurrency: usize,
    /// Extra attempts for a failing feed fetch.
    pub max_retries: usize,
    pub base_delay_ms: u64,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            feed_timeout_secs: 15,
            page_timeout_secs: 8,
            feed_concurrency: 8,
            page_concurrency: 16,
            max_retries: 2,
            base_delay_ms: 500,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl FetchSettings {
    pub fn feed_timeout(&self) -> Duration {
        Duration::from_secs(self.feed_timeout_secs.max(1))
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs.max(1))
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

impl Settings {
    /// Load settings from `path`, or return the defaults when no path is given.
    #[instrument(level = "debug")]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_yaml(&raw).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(settings)
    }

    fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }
}
