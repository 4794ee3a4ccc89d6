//! Error types for the entity model, storage and backup layers.

use thiserror::Error;

/// Raised when a named entity is built with an empty name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} name must not be empty")]
pub struct EmptyNameError {
    pub kind: &'static str,
}

/// Failure to rebuild a typed entity from an untyped JSON value.
#[derive(Error, Debug)]
pub enum AssignError {
    #[error(transparent)]
    EmptyName(#[from] EmptyNameError),

    #[error("Malformed record: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A config file that exists but does not parse.
#[derive(Error, Debug)]
#[error("Failed to parse config at {}: {source}", path.display())]
pub struct ConfigError {
    pub path: std::path::PathBuf,
    #[source]
    pub source: toml::de::Error,
}

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Stored schema version {stored} is newer than requested version {requested}")]
    VersionTooNew { stored: u32, requested: u32 },

    #[error("No stored game named {0:?}")]
    GameNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Backup error: {0}")]
    Backup(#[from] BackupError),
}

pub type BackupResult<T> = Result<T, BackupError>;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Archive has no info.json entry")]
    MissingInfo,

    #[error("Archive has no entry for referenced attachment {0}")]
    MissingReference(String),

    #[error("info.json is malformed: {0}")]
    MalformedInfo(String),

    #[error("Invalid record in archive: {0}")]
    InvalidRecord(#[from] AssignError),

    #[error("Corrupt archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
