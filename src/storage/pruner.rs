//! Removal of directories left empty after a file deletion.
//!
//! Pruning walks upward from the directory that held a deleted file and
//! removes each empty directory until it reaches a non-empty one or the
//! upload root. The root itself is never removed. Filesystem errors end the
//! walk quietly; this is housekeeping and never fails the caller.
//!
//! Containment is checked on the path text first, then again with symlinks
//! resolved. The walk runs over the resolved path, so a linked directory can
//! never lead it outside the root.

use log::debug;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::StorageError;
use crate::storage::UploadLayout;

/// Prunes empty directories below a fixed root
#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryPruner {
    root: PathBuf,
}

impl DirectoryPruner {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: normalize(root.as_ref()),
        }
    }

    pub fn for_layout(layout: &UploadLayout) -> Self {
        Self::new(layout.root())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// True when `dir` lies strictly below the root
    pub fn contains(&self, dir: &Path) -> bool {
        is_within(&self.root, dir)
    }

    /// Prune upward from `start_dir`, returning how many directories were removed.
    ///
    /// A start directory outside the root, by text or once resolved, is
    /// refused with `SuspiciousPath` and nothing is touched. If either path
    /// cannot be resolved nothing is pruned.
    pub fn prune(&self, start_dir: &Path) -> Result<usize, StorageError> {
        if !self.contains(start_dir) {
            return Err(StorageError::SuspiciousPath(start_dir.display().to_string()));
        }

        let Some((root, start)) = self.resolve(start_dir) else {
            return Ok(0);
        };
        if !is_within(&root, &start) {
            return Err(StorageError::SuspiciousPath(format!(
                "{} resolves to {}",
                start_dir.display(),
                start.display()
            )));
        }
        Ok(remove_empty_parents(&start, &root))
    }

    fn resolve(&self, start_dir: &Path) -> Option<(PathBuf, PathBuf)> {
        let resolved = fs::canonicalize(&self.root)
            .and_then(|root| Ok((root, fs::canonicalize(normalize(start_dir))?)));
        match resolved {
            Ok(paths) => Some(paths),
            Err(e) => {
                debug!("Not pruning {}: {}", start_dir.display(), e);
                None
            }
        }
    }
}

/// Lexically normalize a path: drop `.` components and fold `..` into
/// their parent without touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// True when `dir` is a strict descendant of `root` once both are normalized
pub fn is_within(root: &Path, dir: &Path) -> bool {
    let root = normalize(root);
    let dir = normalize(dir);
    dir != root && dir.starts_with(&root)
}

/// Walk from `start_dir` towards `stop_at`, removing empty directories.
/// `stop_at` is never removed.
pub fn remove_empty_parents(start_dir: &Path, stop_at: &Path) -> usize {
    let stop_at = normalize(stop_at);
    let mut current = normalize(start_dir);
    let mut removed = 0;

    if !current.starts_with(&stop_at) {
        return 0;
    }

    while current != stop_at {
        match is_empty_dir(&current) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                debug!("Stopped pruning at {}: {}", current.display(), e);
                break;
            }
        }

        // another pruner may have removed it first; that ends this walk too
        if let Err(e) = fs::remove_dir(&current) {
            debug!("Stopped pruning at {}: {}", current.display(), e);
            break;
        }
        debug!("Removed empty directory {}", current.display());
        removed += 1;

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => break,
        }
    }

    removed
}

fn is_empty_dir(path: &Path) -> io::Result<bool> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    if !meta.is_dir() {
        return Ok(false);
    }
    Ok(fs::read_dir(path)?.next().is_none())
}
