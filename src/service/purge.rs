//! Retention purge: delete quote requests older than a cutoff and reclaim
//! the directories their images lived in.
//!
//! Records are deleted one at a time through the quote service so the
//! post-delete hook removes each image. A second pruning sweep then runs
//! over every directory that held a purged image, catching directories whose
//! last file went away with a later sibling.

use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{Result, StorageError};
use crate::service::quote_service::QuoteService;
use crate::storage::pruner::DirectoryPruner;
use crate::storage::UploadLayout;

const MINUTES_PER_DAY: i64 = 24 * 60;

/// How old a quote request must be to get purged.
/// Both parts are optional and add up; the total must be positive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeRequest {
    #[serde(default, deserialize_with = "deserialize_age")]
    pub older_than_days: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_age")]
    pub older_than_minutes: Option<i64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AgeValue {
    Whole(i64),
    Fractional(f64),
}

/// Accept any number for an age, truncating fractions toward zero.
/// Out-of-range floats saturate and NaN becomes zero.
pub fn deserialize_age<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<AgeValue>::deserialize(deserializer)?.map(|age| match age {
        AgeValue::Whole(value) => value,
        AgeValue::Fractional(value) => value.trunc() as i64,
    }))
}

impl PurgeRequest {
    pub fn new(older_than_days: Option<i64>, older_than_minutes: Option<i64>) -> Self {
        Self {
            older_than_days,
            older_than_minutes,
        }
    }

    /// Combined age in minutes
    pub fn total_minutes(&self) -> i64 {
        self.older_than_days
            .unwrap_or(0)
            .saturating_mul(MINUTES_PER_DAY)
            .saturating_add(self.older_than_minutes.unwrap_or(0))
    }

    /// The newest creation time that still gets purged, or `None` if no
    /// positive age was given. Ages beyond chrono's range clamp to the
    /// earliest representable instant.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let minutes = self.total_minutes();
        if minutes <= 0 {
            return None;
        }
        let cutoff = Duration::try_minutes(minutes)
            .and_then(|age| now.checked_sub_signed(age))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Some(cutoff)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurgeSkipReason {
    NoCutoffProvided,
}

/// Result reported back to the scheduler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeOutcome {
    pub deleted: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<PurgeSkipReason>,
}

impl PurgeOutcome {
    pub fn deleted(deleted: usize) -> Self {
        Self { deleted, reason: None }
    }

    pub fn no_cutoff() -> Self {
        Self {
            deleted: 0,
            reason: Some(PurgeSkipReason::NoCutoffProvided),
        }
    }
}

pub struct PurgeJob {
    service: Arc<QuoteService>,
    layout: UploadLayout,
    pruner: DirectoryPruner,
}

impl PurgeJob {
    pub fn new(service: Arc<QuoteService>, layout: UploadLayout) -> Self {
        let pruner = DirectoryPruner::for_layout(&layout);
        Self {
            service,
            layout,
            pruner,
        }
    }

    /// Purge against the wall clock
    pub fn run(&self, request: &PurgeRequest) -> Result<PurgeOutcome> {
        self.run_at(request, Utc::now())
    }

    /// Purge everything created at or before `now - age`.
    ///
    /// Fails only if selecting or deleting a row fails.
    pub fn run_at(&self, request: &PurgeRequest, now: DateTime<Utc>) -> Result<PurgeOutcome> {
        let Some(cutoff) = request.cutoff(now) else {
            info!("Retention purge skipped: no cutoff provided");
            return Ok(PurgeOutcome::no_cutoff());
        };

        let expired = self.service.records().created_on_or_before(cutoff)?;
        debug!("{} quote requests created on or before {}", expired.len(), cutoff);

        let mut dirs_to_check: BTreeSet<PathBuf> = BTreeSet::new();
        let mut deleted = 0;

        for quote in &expired {
            if let Some(image) = &quote.image {
                match self.service.storage().path(image) {
                    Ok(path) => {
                        if let Some(dir) = path.parent() {
                            dirs_to_check.insert(dir.to_path_buf());
                        }
                    }
                    Err(StorageError::Unsupported) => {}
                    Err(e) => debug!("Not tracking directory of {}: {}", image, e),
                }
            }

            if self.service.delete_record(quote)? {
                deleted += 1;
            }
        }

        let pruned = self.sweep(&dirs_to_check);
        info!(
            "Retention purge removed {} quote requests created on or before {} ({} directories pruned)",
            deleted, cutoff, pruned
        );
        Ok(PurgeOutcome::deleted(deleted))
    }

    fn sweep(&self, dirs: &BTreeSet<PathBuf>) -> usize {
        if dirs.is_empty() || !self.layout.root().is_dir() {
            return 0;
        }

        let mut pruned = 0;
        for dir in dirs {
            match self.pruner.prune(dir) {
                Ok(removed) => pruned += removed,
                Err(e) => debug!("Skipping {}: {}", dir.display(), e),
            }
        }
        pruned
    }
}
