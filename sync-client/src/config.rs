//! Configuration for reader-sync sessions.
//!
//! Supplied by the embedding host, either built in code or loaded from a TOML
//! file. Every field has a default, so an empty file is a valid configuration.

use reader_sync_core::{Platform, DEFAULT_QUIET_WINDOW};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// View-state debouncing.
    #[serde(default)]
    pub debounce: DebounceConfig,
    /// Keyboard handling.
    #[serde(default)]
    pub input: InputConfig,
    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// View-state debouncing.
#[derive(Debug, Clone, Deserialize)]
pub struct DebounceConfig {
    /// Quiet window in milliseconds before `setState` fires (default: 100).
    #[serde(default = "default_quiet_window_ms")]
    pub quiet_window_ms: u64,
}

/// Keyboard handling.
#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    /// Modifier conventions to follow (default: the compile target's).
    #[serde(default = "Platform::current")]
    pub platform: Platform,
}

/// Log output.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive (default: `info`).
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

// Default value functions
fn default_quiet_window_ms() -> u64 {
    u64::try_from(DEFAULT_QUIET_WINDOW.as_millis()).unwrap_or(u64::MAX)
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            quiet_window_ms: default_quiet_window_ms(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            platform: Platform::current(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl DebounceConfig {
    /// The quiet window as a duration.
    pub fn quiet_window(&self) -> Duration {
        Duration::from_millis(self.quiet_window_ms)
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Parse configuration from TOML text held in memory.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: PathBuf::from("<inline>"),
            source: e,
        })
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
}
