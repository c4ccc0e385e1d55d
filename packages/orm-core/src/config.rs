//! Session configuration.
//!
//! Supports JSON config files, environment variable overrides, and defaults.

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::OrmError;

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Data directory for snapshots
    pub data_dir: PathBuf,
    /// Snapshot file name inside `data_dir`
    pub snapshot_file: String,
    /// Whether listeners may cache reference data for the session lifetime
    pub cache_catalog: bool,
    /// Verify per-table checksums when loading a snapshot
    pub verify_checksums: bool,
    /// Maximum retry attempts for transient I/O errors
    pub persistence_max_retries: u32,
    /// Delay between retry attempts in milliseconds
    pub persistence_retry_delay_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            snapshot_file: "snapshot.json".to_string(),
            cache_catalog: false,
            verify_checksums: true,
            persistence_max_retries: 3,      // Default retry attempts
            persistence_retry_delay_ms: 100, // 100ms delay between retries
        }
    }
}

impl SessionConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, OrmError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| OrmError::ConfigError(format!("Failed to read config file: {}", e)))?;
        Self::from_json(&content)
    }

    /// Parses configuration from a JSON string. Missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, OrmError> {
        serde_json::from_str(json).map_err(|e| OrmError::ConfigError(format!("Invalid JSON: {}", e)))
    }

    /// Saves the configuration to a JSON file.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), OrmError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| OrmError::ConfigError(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path.as_ref(), json)
            .map_err(|e| OrmError::ConfigError(format!("Failed to write config file: {}", e)))?;
        Ok(())
    }

    /// Applies environment variable overrides.
    /// Environment variables are prefixed with `ORM_`.
    /// Example: `ORM_CACHE_CATALOG=true` overrides `cache_catalog`.
    pub fn apply_env_overrides(&mut self) -> Result<(), OrmError> {
        if let Ok(val) = env::var("ORM_DATA_DIR") {
            self.data_dir = PathBuf::from(val);
        }
        if let Ok(val) = env::var("ORM_SNAPSHOT_FILE") {
            self.snapshot_file = val;
        }
        if let Ok(val) = env::var("ORM_CACHE_CATALOG") {
            self.cache_catalog = val
                .parse()
                .map_err(|_| OrmError::ConfigError(format!("Invalid cache_catalog: {}", val)))?;
        }
        if let Ok(val) = env::var("ORM_VERIFY_CHECKSUMS") {
            self.verify_checksums = val.parse().map_err(|_| {
                OrmError::ConfigError(format!("Invalid verify_checksums: {}", val))
            })?;
        }
        if let Ok(val) = env::var("ORM_PERSISTENCE_MAX_RETRIES") {
            self.persistence_max_retries = val.parse().map_err(|_| {
                OrmError::ConfigError(format!("Invalid persistence_max_retries: {}", val))
            })?;
        }
        if let Ok(val) = env::var("ORM_PERSISTENCE_RETRY_DELAY_MS") {
            self.persistence_retry_delay_ms = val.parse().map_err(|_| {
                OrmError::ConfigError(format!("Invalid persistence_retry_delay_ms: {}", val))
            })?;
        }
        Ok(())
    }

    /// Full path of the snapshot file.
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(&self.snapshot_file)
    }
}
