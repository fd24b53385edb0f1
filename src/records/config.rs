//! Configuration for record store backends

use crate::error::Result;
use crate::records::{mock_store::MockRecordStore, sqlite_store::SQLiteRecordStore, RecordStore};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::sync::Arc;

/// Available record store backends
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordsBackend {
    #[default]
    SQLite,
    #[serde(alias = "memory")]
    Mock,
}

impl std::str::FromStr for RecordsBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(RecordsBackend::SQLite),
            "mock" | "memory" => Ok(RecordsBackend::Mock),
            _ => Err(format!("Unknown records backend: {}", s)),
        }
    }
}

/// Record store section of the application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordsConfig {
    /// Record store backend type
    pub backend: RecordsBackend,
    /// Database file path
    pub db_path: String,
    /// Enable WAL mode
    pub wal_mode: bool,
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            backend: RecordsBackend::default(),
            db_path: "./data/quotes.db".to_string(),
            wal_mode: true,
        }
    }
}

impl RecordsConfig {
    /// Let `RECORDS_BACKEND` override the configured backend
    pub fn apply_env(&mut self) {
        if let Ok(backend_str) = env::var("RECORDS_BACKEND") {
            match backend_str.parse::<RecordsBackend>() {
                Ok(backend) => {
                    info!("Using records backend from environment: {:?}", backend);
                    self.backend = backend;
                }
                Err(e) => warn!("Invalid records backend in environment: {}. Keeping {:?}.", e, self.backend),
            }
        }
    }

    /// Create a record store based on the configuration
    pub fn create_store(&self) -> Result<Arc<dyn RecordStore>> {
        Ok(match self.backend {
            RecordsBackend::SQLite => {
                info!("Creating SQLite record store");
                Arc::new(SQLiteRecordStore::open(Path::new(&self.db_path), self.wal_mode)?)
            }
            RecordsBackend::Mock => {
                info!("Creating mock record store");
                Arc::new(MockRecordStore::new())
            }
        })
    }
}
