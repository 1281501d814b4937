use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::types::Config;

/// Longest accepted `garage.persist_debounce_ms`.
const MAX_PERSIST_DEBOUNCE_MS: u64 = 60_000;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

impl Config {
    /// Returns the path to the configuration file.
    ///
    /// Uses `~/.config/velostore/config.toml` on Unix/macOS,
    /// or equivalent on other platforms via `dirs::config_dir()`.
    /// Falls back to current directory if config_dir is unavailable.
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("velostore").join("config.toml")
    }

    /// Loads configuration from the default config file.
    ///
    /// A missing file yields `Config::default()`.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();

        if !path.exists() {
            return Ok(Config::default());
        }

        Self::load_from(&path)
    }

    /// Reads, parses and validates the TOML file at `path`.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Checks:
    /// - The drain warning threshold is positive
    /// - The persist debounce does not exceed one minute
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.drain_warning_threshold == 0 {
            return Err(ConfigError::ValidationError {
                message: "store.drain_warning_threshold must be greater than zero".to_string(),
            });
        }

        if self.garage.persist_debounce_ms > MAX_PERSIST_DEBOUNCE_MS {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "garage.persist_debounce_ms must be at most {}, got {}",
                    MAX_PERSIST_DEBOUNCE_MS, self.garage.persist_debounce_ms
                ),
            });
        }

        Ok(())
    }
}
