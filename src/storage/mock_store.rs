//! In-memory file storage for testing and for deployments without a media root.
//!
//! Keys follow the same layout as local storage, but nothing maps to a
//! filesystem path, so directory pruning never applies.

use crate::error::StorageError;
use crate::model::FileRef;
use crate::storage::{alternative_key, FileStorage, UploadLayout};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Mock implementation of FileStorage
pub struct MockFileStorage {
    layout: UploadLayout,
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MockFileStorage {
    pub fn new(layout: UploadLayout) -> Self {
        Self {
            layout,
            files: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number of stored blobs
    pub fn file_count(&self) -> usize {
        self.files.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Default for MockFileStorage {
    fn default() -> Self {
        Self::new(UploadLayout::new("media", "quotes"))
    }
}

impl FileStorage for MockFileStorage {
    fn save(&self, file_name: &str, data: &[u8], uploaded_at: DateTime<Utc>) -> Result<FileRef, StorageError> {
        let base_key = self.layout.key_for(file_name, uploaded_at);
        let mut files = self.files.lock().unwrap_or_else(PoisonError::into_inner);

        let mut key = base_key.clone();
        let mut attempt = 0;
        while files.contains_key(&key) {
            key = alternative_key(&base_key, data, attempt);
            attempt += 1;
        }

        files.insert(key.clone(), data.to_vec());
        Ok(FileRef::new(key))
    }

    fn open(&self, file: &FileRef) -> Result<Vec<u8>, StorageError> {
        let files = self.files.lock().unwrap_or_else(PoisonError::into_inner);
        files
            .get(file.as_str())
            .cloned()
            .ok_or_else(|| StorageError::NotFound(file.to_string()))
    }

    fn exists(&self, file: &FileRef) -> Result<bool, StorageError> {
        let files = self.files.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(files.contains_key(file.as_str()))
    }

    fn delete(&self, file: &FileRef) -> Result<(), StorageError> {
        let mut files = self.files.lock().unwrap_or_else(PoisonError::into_inner);
        files.remove(file.as_str());
        Ok(())
    }
}
