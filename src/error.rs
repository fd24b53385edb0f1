//! Error types shared across the crate.
//!
//! Storage errors describe what went wrong with a blob or a path. Quote
//! errors are the structural failures of the record layer and are the only
//! ones allowed to reach callers of the service or the purge job.

use thiserror::Error;

use crate::model::QuoteId;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Path escapes the media root: {0}")]
    SuspiciousPath(String),

    #[error("Storage backend has no filesystem paths")]
    Unsupported,

    #[error("Stored file not found: {0}")]
    NotFound(String),
}

#[derive(Error, Debug)]
pub enum QuoteError {
    #[error("Quote request not found: {0}")]
    NotFound(QuoteId),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Invalid field: {0}")]
    InvalidField(String),
}

#[derive(Error, Debug)]
#[error("Notification failed: {0}")]
pub struct NotifyError(pub String);

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, QuoteError>;
