//! File Storage Layer Abstraction
//!
//! This module provides an abstraction over the place uploaded quote images
//! live, so the record layer only ever deals in `FileRef` keys. Local storage
//! maps keys onto paths under a media root; other backends have no paths and
//! therefore no directories to prune.

pub mod local_store;
pub mod mock_store;
pub mod config;
pub mod pruner;

#[cfg(test)]
mod comprehensive_test;

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

use crate::error::StorageError;
use crate::model::FileRef;

/// Trait defining the file storage interface
pub trait FileStorage: Send + Sync {
    /// Store an uploaded file and return the key it was stored under
    fn save(&self, file_name: &str, data: &[u8], uploaded_at: DateTime<Utc>) -> Result<FileRef, StorageError>;

    /// Read a stored file back
    fn open(&self, file: &FileRef) -> Result<Vec<u8>, StorageError>;

    /// Check whether the blob behind a reference is present
    fn exists(&self, file: &FileRef) -> Result<bool, StorageError>;

    /// Remove the blob behind a reference. Removing a missing blob succeeds.
    fn delete(&self, file: &FileRef) -> Result<(), StorageError>;

    /// Resolve a reference to a filesystem path (local backends only)
    fn path(&self, _file: &FileRef) -> Result<PathBuf, StorageError> {
        Err(StorageError::Unsupported)
    }
}

/// Where uploads live: `<media_root>/<upload_dir>/<YYYY>/<MM>/<name>`.
///
/// `upload_dir` under the media root is the logical root of all quote
/// images. It is the boundary the pruner never removes.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadLayout {
    media_root: PathBuf,
    upload_dir: String,
}

impl UploadLayout {
    pub fn new(media_root: impl Into<PathBuf>, upload_dir: impl Into<String>) -> Self {
        let upload_dir = upload_dir.into().trim_matches('/').to_string();
        Self {
            media_root: media_root.into(),
            upload_dir,
        }
    }

    pub fn media_root(&self) -> &Path {
        &self.media_root
    }

    pub fn upload_dir(&self) -> &str {
        &self.upload_dir
    }

    /// Absolute (or media-root relative) path of the logical root
    pub fn root(&self) -> PathBuf {
        self.media_root.join(&self.upload_dir)
    }

    /// Storage key for a file uploaded at `uploaded_at`
    pub fn key_for(&self, file_name: &str, uploaded_at: DateTime<Utc>) -> String {
        format!(
            "{}/{}/{}",
            self.upload_dir,
            uploaded_at.format("%Y/%m"),
            sanitize_file_name(file_name)
        )
    }
}

/// Reduce an uploaded file name to a single safe path component
pub fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(file_name);
    let cleaned: String = base
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

/// Alternative key for a taken one: `photo.jpg` becomes `photo_1a2b3c4.jpg`.
/// The suffix is derived from the content and the attempt number.
pub fn alternative_key(key: &str, data: &[u8], attempt: u32) -> String {
    let mut context = md5::Context::new();
    context.consume(data);
    context.consume(attempt.to_be_bytes());
    let digest = context.compute();
    let encoded = hex::encode(&digest.0[..4]);
    let suffix = &encoded[..7];

    let (dir, name) = match key.rsplit_once('/') {
        Some((dir, name)) => (Some(dir), name),
        None => (None, key),
    };
    let renamed = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}_{}.{}", stem, suffix, ext),
        _ => format!("{}_{}", name, suffix),
    };
    match dir {
        Some(dir) => format!("{}/{}", dir, renamed),
        None => renamed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_key_partitioned_by_upload_month() {
        let layout = UploadLayout::new("/srv/media", "/quotes/");
        let uploaded_at = Utc.with_ymd_and_hms(2024, 6, 9, 8, 30, 0).unwrap();

        assert_eq!(layout.upload_dir(), "quotes");
        assert_eq!(layout.root(), PathBuf::from("/srv/media/quotes"));
        assert_eq!(layout.key_for("sofa.jpg", uploaded_at), "quotes/2024/06/sofa.jpg");
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\Users\\me\\my photo.png"), "my_photo.png");
        assert_eq!(sanitize_file_name(".."), "upload");
        assert_eq!(sanitize_file_name(""), "upload");
        assert_eq!(sanitize_file_name(".hidden"), "hidden");
    }

    #[test]
    fn test_alternative_key_keeps_directory_and_extension() {
        let first = alternative_key("quotes/2024/06/sofa.jpg", b"data", 0);
        let second = alternative_key("quotes/2024/06/sofa.jpg", b"data", 1);

        assert!(first.starts_with("quotes/2024/06/sofa_"));
        assert!(first.ends_with(".jpg"));
        assert_eq!(first.len(), "quotes/2024/06/sofa_.jpg".len() + 7);
        assert_ne!(first, second);
        assert!(alternative_key("README", b"", 0).starts_with("README_"));
    }
}
