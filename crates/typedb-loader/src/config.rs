//! Loader configuration.

use crate::error::LoaderError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default number of statements committed per transaction.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Default number of concurrent workers.
pub const DEFAULT_WORKERS: usize = 1;

/// Default number of statements between progress messages.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1000;

/// Configuration for a load run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Database server address (e.g., "localhost:1729")
    #[serde(default = "default_address")]
    pub address: String,
    /// Target database (keyspace) name
    pub database: String,
    /// Statements per transaction
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Number of concurrent workers
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Directory for per-worker batch logs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs_dir: Option<PathBuf>,
    /// Statements between progress messages (0 disables them)
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,
}

fn default_address() -> String {
    "localhost:1729".to_string()
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_progress_interval() -> u64 {
    DEFAULT_PROGRESS_INTERVAL
}

impl LoaderConfig {
    /// Create a configuration with default settings for the given database.
    pub fn new(address: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            database: database.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            workers: DEFAULT_WORKERS,
            logs_dir: None,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_logs_dir(mut self, logs_dir: impl Into<PathBuf>) -> Self {
        self.logs_dir = Some(logs_dir.into());
        self
    }

    pub fn with_progress_interval(mut self, progress_interval: u64) -> Self {
        self.progress_interval = progress_interval;
        self
    }

    /// Load configuration from a YAML or TOML file, chosen by extension.
    pub fn from_file(path: &Path) -> Result<Self, LoaderError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            LoaderError::Config(format!("Failed to read config file {path:?}: {e}"))
        })?;

        let config: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .map_err(|e| LoaderError::Config(format!("Invalid YAML in {path:?}: {e}")))?,
            Some("toml") => toml::from_str(&content)
                .map_err(|e| LoaderError::Config(format!("Invalid TOML in {path:?}: {e}")))?,
            other => {
                return Err(LoaderError::Config(format!(
                    "Unsupported config file extension: {other:?}"
                )))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration can drive a load.
    pub fn validate(&self) -> Result<(), LoaderError> {
        if self.workers == 0 {
            return Err(LoaderError::Config("workers must be at least 1".into()));
        }
        if self.batch_size == 0 {
            return Err(LoaderError::Config("batch_size must be at least 1".into()));
        }
        if self.database.trim().is_empty() {
            return Err(LoaderError::Config("database must not be empty".into()));
        }
        Ok(())
    }
}
