//! Configuration management for BucketDB

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

/// Main configuration structure for BucketDB
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML or JSON file
    ///
    /// Files ending in `.toml` are parsed as TOML, anything else as JSON.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;

        if path.as_ref().extension().map_or(false, |ext| ext == "toml") {
            Self::from_toml_str(&content)
        } else {
            serde_json::from_str(&content)
                .map_err(|e| Error::Config(format!("Failed to parse JSON config: {}", e)))
        }
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML config: {}", e)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the store on disk
    pub path: String,
    /// Tables that must exist once the store is open
    pub tables: Vec<String>,
    /// How long to keep retrying while another handle holds the store lock
    pub open_timeout_ms: u64,
    /// Engine page cache size in bytes
    pub cache_capacity_bytes: u64,
    /// Background flush interval; `None` disables periodic flushing
    pub flush_every_ms: Option<u64>,
    /// Discard the store when the handle is dropped
    pub temporary: bool,
}

impl StorageConfig {
    /// Storage settings for `path` with the given tables and default tuning
    pub fn new<P, I, S>(path: P, tables: I) -> Self
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: path.as_ref().to_string_lossy().to_string(),
            tables: tables.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn open_timeout(&self) -> Duration {
        Duration::from_millis(self.open_timeout_ms)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "bucketdb.data".to_string(),
            tables: Vec::new(),
            open_timeout_ms: 1000,
            cache_capacity_bytes: 64 * 1024 * 1024, // 64MB
            flush_every_ms: Some(500),
            temporary: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level for BucketDB targets when `RUST_LOG` does not say otherwise
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
