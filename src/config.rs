//! Application configuration — `config.toml`.
//!
//! ```toml
//! [storage]
//! name = "staplay"        # database file stem
//! schema_version = 1
//! # directory = "/custom/data/dir"
//!
//! [logging]
//! filter = "info"
//! file = true
//! ```
//!
//! A missing or unreadable file is equivalent to the defaults. The storage
//! section resolves to a [`StoreConfig`], which is what the session store is
//! constructed with; nothing in the library reads configuration globally.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::storage::SCHEMA_VERSION;

pub const DEFAULT_STORE_NAME: &str = "staplay";

/// Location and schema version of one session store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub directory: PathBuf,
    pub name: String,
    pub version: u32,
}

impl StoreConfig {
    pub fn new(directory: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            name: name.into(),
            version: SCHEMA_VERSION,
        }
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn database_path(&self) -> PathBuf {
        self.directory.join(format!("{}.db", self.name))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_store_name")]
    pub name: String,
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Overrides the XDG data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Also write logs to the log directory.
    #[serde(default = "default_true")]
    pub file: bool,
}

fn default_store_name() -> String {
    DEFAULT_STORE_NAME.to_string()
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

fn default_filter() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            name: default_store_name(),
            schema_version: default_schema_version(),
            directory: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            file: true,
        }
    }
}

impl Config {
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Resolve the store location. `None` when no data directory is known.
    pub fn store_config(&self) -> Option<StoreConfig> {
        let directory = self
            .storage
            .directory
            .clone()
            .or_else(crate::paths::data_directory)?;
        Some(
            StoreConfig::new(directory, self.storage.name.clone())
                .with_version(self.storage.schema_version),
        )
    }
}

/// Load `config.toml`. A missing or unreadable file yields the defaults; a
/// file that fails to parse is an error.
pub fn try_load_config() -> Result<Config, ConfigError> {
    let Some(path) = crate::paths::config_file() else {
        return Ok(Config::default());
    };

    let contents = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(_) => return Ok(Config::default()),
    };

    Config::from_toml(&contents).map_err(|source| ConfigError { path, source })
}

/// Load `config.toml`. Returns defaults if the file doesn't exist or can't be parsed.
pub fn load_config() -> Config {
    try_load_config().unwrap_or_else(|e| {
        tracing::warn!("{e}");
        Config::default()
    })
}
