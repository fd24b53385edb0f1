//! Local filesystem file storage implementation

use crate::error::StorageError;
use crate::model::FileRef;
use crate::storage::{alternative_key, FileStorage, UploadLayout};
use chrono::{DateTime, Utc};
use log::{debug, info};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Give up looking for a free name after this many attempts
const MAX_NAME_ATTEMPTS: u32 = 100;

/// Stores uploads as plain files below the media root
pub struct LocalFileStorage {
    layout: UploadLayout,
}

impl LocalFileStorage {
    pub fn new(layout: UploadLayout) -> Result<Self, StorageError> {
        fs::create_dir_all(layout.media_root())?;
        info!("Using local media root: {}", layout.media_root().display());
        Ok(Self { layout })
    }

    pub fn layout(&self) -> &UploadLayout {
        &self.layout
    }

    /// Map a key onto a path, refusing anything that could leave the media root
    fn resolve(&self, file: &FileRef) -> Result<PathBuf, StorageError> {
        if !file.is_confined() {
            return Err(StorageError::SuspiciousPath(file.to_string()));
        }
        Ok(self.layout.media_root().join(file.as_str()))
    }

    /// Create the file only if the name is still free
    fn write_new(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
        file.write_all(data)?;
        file.flush()
    }
}

impl FileStorage for LocalFileStorage {
    fn save(&self, file_name: &str, data: &[u8], uploaded_at: DateTime<Utc>) -> Result<FileRef, StorageError> {
        let base_key = self.layout.key_for(file_name, uploaded_at);
        let mut key = base_key.clone();

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let file = FileRef::new(key.clone());
            let path = self.resolve(&file)?;
            match self.write_new(&path, data) {
                Ok(()) => {
                    info!("Stored {} ({} bytes)", file, data.len());
                    return Ok(file);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    debug!("{} is taken, trying another name", key);
                    key = alternative_key(&base_key, data, attempt);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(StorageError::Io(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free name for {}", base_key),
        )))
    }

    fn open(&self, file: &FileRef) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(file)?;
        fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StorageError::NotFound(file.to_string()),
            _ => StorageError::Io(e),
        })
    }

    fn exists(&self, file: &FileRef) -> Result<bool, StorageError> {
        Ok(self.resolve(file)?.is_file())
    }

    fn delete(&self, file: &FileRef) -> Result<(), StorageError> {
        let path = self.resolve(file)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                info!("Deleted stored file {}", file);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Stored file {} already gone", file);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn path(&self, file: &FileRef) -> Result<PathBuf, StorageError> {
        self.resolve(file)
    }
}
