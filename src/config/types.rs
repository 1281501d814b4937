use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::store::{StoreOptions, DEFAULT_DRAIN_WARNING_THRESHOLD};

/// Root configuration container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub garage: GarageConfig,
}

/// Runtime tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Actions one drain may reduce before a feedback-loop warning (default: 1000).
    #[serde(default = "default_drain_warning_threshold")]
    pub drain_warning_threshold: usize,
}

/// Settings for the garage demo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GarageConfig {
    /// Where the garage is stored. Defaults to the platform data directory.
    #[serde(default)]
    pub data_file: Option<PathBuf>,
    /// Quiet period before a change is written to disk (default: 300).
    #[serde(default = "default_persist_debounce_ms")]
    pub persist_debounce_ms: u64,
}

fn default_drain_warning_threshold() -> usize {
    DEFAULT_DRAIN_WARNING_THRESHOLD
}

fn default_persist_debounce_ms() -> u64 {
    300
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            drain_warning_threshold: default_drain_warning_threshold(),
        }
    }
}

impl Default for GarageConfig {
    fn default() -> Self {
        Self {
            data_file: None,
            persist_debounce_ms: default_persist_debounce_ms(),
        }
    }
}

impl Config {
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            drain_warning_threshold: self.store.drain_warning_threshold,
        }
    }
}

impl GarageConfig {
    /// The configured data file, or `velostore/garage.json` under the
    /// platform data directory.
    pub fn data_file(&self) -> PathBuf {
        match &self.data_file {
            Some(path) => path.clone(),
            None => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("velostore")
                .join("garage.json"),
        }
    }

    pub fn persist_debounce(&self) -> Duration {
        Duration::from_millis(self.persist_debounce_ms)
    }
}
