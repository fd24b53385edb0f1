//! Configuration for file storage backends

use crate::error::StorageError;
use crate::storage::{local_store::LocalFileStorage, mock_store::MockFileStorage, FileStorage, UploadLayout};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Arc;

/// Available file storage backends
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    #[serde(alias = "filesystem", alias = "fs")]
    Local,
    #[serde(alias = "memory")]
    Mock,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" | "filesystem" | "fs" => Ok(StorageBackend::Local),
            "mock" | "memory" => Ok(StorageBackend::Mock),
            _ => Err(format!("Unknown storage backend: {}", s)),
        }
    }
}

/// Storage section of the application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage backend type
    pub backend: StorageBackend,
    /// Directory all uploads are stored under
    pub media_root: String,
    /// Sub-directory of the media root holding quote images
    pub upload_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            media_root: "./data/media".to_string(),
            upload_dir: "quotes".to_string(),
        }
    }
}

impl StorageConfig {
    /// Let `STORAGE_BACKEND` override the configured backend
    pub fn apply_env(&mut self) {
        if let Ok(backend_str) = env::var("STORAGE_BACKEND") {
            match backend_str.parse::<StorageBackend>() {
                Ok(backend) => {
                    info!("Using storage backend from environment: {:?}", backend);
                    self.backend = backend;
                }
                Err(e) => warn!("Invalid storage backend in environment: {}. Keeping {:?}.", e, self.backend),
            }
        }
    }

    pub fn layout(&self) -> UploadLayout {
        UploadLayout::new(&self.media_root, self.upload_dir.clone())
    }

    /// Create a storage instance based on the configuration
    pub fn create_store(&self) -> Result<Arc<dyn FileStorage>, StorageError> {
        Ok(match self.backend {
            StorageBackend::Local => Arc::new(LocalFileStorage::new(self.layout())?),
            StorageBackend::Mock => Arc::new(MockFileStorage::new(self.layout())),
        })
    }
}
