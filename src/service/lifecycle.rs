//! File lifecycle hooks run by the quote service around record mutations.
//!
//! - before an existing record is saved, a replaced image is deleted
//! - after a record is deleted, its image is deleted
//!
//! Every deletion is followed by pruning the directories it emptied. Hooks
//! never fail the mutation they belong to; they report a `CleanupOutcome`
//! that the caller logs and drops.

use log::{debug, warn};
use std::sync::Arc;

use crate::error::StorageError;
use crate::model::{FileRef, QuoteId, QuoteRequest};
use crate::records::RecordStore;
use crate::storage::pruner::DirectoryPruner;
use crate::storage::{FileStorage, UploadLayout};

/// What a hook did about stored files
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// Nothing to clean up
    Skipped,
    /// The file was deleted and `pruned_dirs` empty directories removed
    Removed { pruned_dirs: usize },
    /// Cleanup was attempted and abandoned
    Failed(String),
}

impl CleanupOutcome {
    /// Log the outcome. Failures are warnings, never errors for the caller.
    pub fn log(&self, event: &str, id: QuoteId) {
        match self {
            CleanupOutcome::Skipped => {}
            CleanupOutcome::Removed { pruned_dirs } => {
                debug!("{} for quote {}: file removed, {} directories pruned", event, id, pruned_dirs)
            }
            CleanupOutcome::Failed(reason) => {
                warn!("{} for quote {}: cleanup abandoned: {}", event, id, reason)
            }
        }
    }
}

pub struct LifecycleHooks {
    storage: Arc<dyn FileStorage>,
    pruner: DirectoryPruner,
}

impl LifecycleHooks {
    pub fn new(storage: Arc<dyn FileStorage>, layout: &UploadLayout) -> Self {
        Self {
            storage,
            pruner: DirectoryPruner::for_layout(layout),
        }
    }

    /// Run before a record is persisted.
    ///
    /// New records (`id` is `None`) have nothing to clean up. For existing
    /// ones the stored version is read first; if its image differs from
    /// `incoming` the old file is deleted. The incoming file is never touched.
    pub fn before_save(
        &self,
        records: &dyn RecordStore,
        id: Option<QuoteId>,
        incoming: Option<&FileRef>,
    ) -> CleanupOutcome {
        let Some(id) = id else {
            return CleanupOutcome::Skipped;
        };

        let previous = match records.find(id) {
            Ok(Some(previous)) => previous,
            Ok(None) => return CleanupOutcome::Skipped,
            Err(e) => return CleanupOutcome::Failed(format!("could not load stored quote: {}", e)),
        };

        match previous.image {
            Some(old) if incoming != Some(&old) => self.remove_file(&old),
            _ => CleanupOutcome::Skipped,
        }
    }

    /// Run after a record row has been deleted
    pub fn after_delete(&self, deleted: &QuoteRequest) -> CleanupOutcome {
        match &deleted.image {
            Some(image) => self.remove_file(image),
            None => CleanupOutcome::Skipped,
        }
    }

    fn remove_file(&self, file: &FileRef) -> CleanupOutcome {
        if let Err(e) = self.storage.delete(file) {
            return CleanupOutcome::Failed(format!("failed to delete {}: {}", file, e));
        }

        let dir = match self.storage.path(file) {
            Ok(path) => path.parent().map(|p| p.to_path_buf()),
            Err(StorageError::Unsupported) => None,
            Err(e) => {
                debug!("Not pruning after {}: {}", file, e);
                None
            }
        };

        let pruned_dirs = match dir {
            Some(dir) => match self.pruner.prune(&dir) {
                Ok(removed) => removed,
                Err(e) => {
                    debug!("Not pruning {}: {}", dir.display(), e);
                    0
                }
            },
            None => 0,
        };

        CleanupOutcome::Removed { pruned_dirs }
    }
}
