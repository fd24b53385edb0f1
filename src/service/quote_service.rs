//! Quote service: the only path through which records are created, changed
//! and deleted.
//!
//! Each mutation runs its lifecycle hook as an explicit step, so stored
//! files follow the record without callers having to remember cleanup.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::sync::Arc;

use crate::error::Result;
use crate::model::{NewQuote, QuoteId, QuoteRequest};
use crate::records::RecordStore;
use crate::service::lifecycle::LifecycleHooks;
use crate::service::notifier::Notifier;
use crate::storage::{FileStorage, UploadLayout};

/// An uploaded image as received from the form
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub file_name: String,
    pub data: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            data: data.into(),
        }
    }
}

pub struct QuoteService {
    records: Arc<dyn RecordStore>,
    storage: Arc<dyn FileStorage>,
    hooks: LifecycleHooks,
    notifier: Option<Arc<dyn Notifier>>,
}

impl QuoteService {
    /// Create a new quote service with injected backends
    pub fn new(records: Arc<dyn RecordStore>, storage: Arc<dyn FileStorage>, layout: &UploadLayout) -> Self {
        let hooks = LifecycleHooks::new(storage.clone(), layout);
        Self {
            records,
            storage,
            hooks,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn records(&self) -> &dyn RecordStore {
        self.records.as_ref()
    }

    pub fn storage(&self) -> &dyn FileStorage {
        self.storage.as_ref()
    }

    /// Accept a new quote request, timestamped now
    pub fn submit(&self, quote: &NewQuote, image: Option<&ImageUpload>) -> Result<QuoteRequest> {
        self.submit_at(quote, image, Utc::now())
    }

    /// Accept a new quote request with an explicit creation time.
    ///
    /// The image is stored first; if the record cannot be written the file
    /// is removed again so it does not linger as an orphan.
    pub fn submit_at(&self, quote: &NewQuote, image: Option<&ImageUpload>, created_at: DateTime<Utc>) -> Result<QuoteRequest> {
        quote.validate()?;

        let stored_image = match image {
            Some(upload) => Some(self.storage.save(&upload.file_name, &upload.data, created_at)?),
            None => None,
        };

        let stored = match self.records.insert(quote, stored_image.as_ref(), created_at) {
            Ok(stored) => stored,
            Err(e) => {
                if let Some(file) = &stored_image {
                    if let Err(cleanup) = self.storage.delete(file) {
                        warn!("Failed to remove {} after rejected insert: {}", file, cleanup);
                    }
                }
                return Err(e);
            }
        };
        info!("Accepted quote request {} ({})", stored.id, stored);

        self.notify(&stored);
        Ok(stored)
    }

    fn notify(&self, quote: &QuoteRequest) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        if let Err(e) = notifier.notify_owner(quote) {
            warn!("Owner notification for quote {} failed: {}", quote.id, e);
        }
        if let Err(e) = notifier.notify_requester(quote) {
            warn!("Requester notification for quote {} failed: {}", quote.id, e);
        }
    }

    pub fn get(&self, id: QuoteId) -> Result<QuoteRequest> {
        self.records.get(id)
    }

    /// All quote requests, newest first
    pub fn list(&self) -> Result<Vec<QuoteRequest>> {
        self.records.list()
    }

    /// Persist changes to an existing quote request.
    ///
    /// The pre-save hook sees the stored version before it is overwritten and
    /// deletes the previous image if it was replaced or cleared.
    pub fn update(&self, quote: &QuoteRequest) -> Result<()> {
        quote.validate()?;
        let _mdc = log_mdc::insert_scoped("quote", quote.id.to_string());

        self.hooks
            .before_save(self.records.as_ref(), Some(quote.id), quote.image.as_ref())
            .log("pre-save", quote.id);

        self.records.update(quote)
    }

    /// Swap the image of a quote request for a newly uploaded one
    pub fn replace_image(&self, id: QuoteId, upload: &ImageUpload) -> Result<QuoteRequest> {
        let mut quote = self.records.get(id)?;
        let file = self.storage.save(&upload.file_name, &upload.data, Utc::now())?;
        quote.image = Some(file.clone());

        if let Err(e) = self.update(&quote) {
            if let Err(cleanup) = self.storage.delete(&file) {
                warn!("Failed to remove {} after rejected update: {}", file, cleanup);
            }
            return Err(e);
        }
        Ok(quote)
    }

    /// Remove the image from a quote request, deleting the stored file.
    ///
    /// A missing record is an error; trouble deleting the file is not.
    pub fn clear_image(&self, id: QuoteId) -> Result<QuoteRequest> {
        let mut quote = self.records.get(id)?;
        if quote.image.take().is_some() {
            self.update(&quote)?;
        }
        Ok(quote)
    }

    /// Delete a quote request by id. Returns false when it was already gone.
    pub fn delete(&self, id: QuoteId) -> Result<bool> {
        match self.records.find(id)? {
            Some(quote) => self.delete_record(&quote),
            None => {
                debug!("Quote {} already deleted", id);
                Ok(false)
            }
        }
    }

    /// Delete a loaded quote request and clean up its image.
    ///
    /// Only a failure of the row deletion itself is returned; file cleanup
    /// is logged and dropped.
    pub fn delete_record(&self, quote: &QuoteRequest) -> Result<bool> {
        let _mdc = log_mdc::insert_scoped("quote", quote.id.to_string());

        if !self.records.delete(quote.id)? {
            debug!("Quote {} already deleted", quote.id);
            return Ok(false);
        }
        info!("Deleted quote request {}", quote.id);

        self.hooks.after_delete(quote).log("post-delete", quote.id);
        Ok(true)
    }
}
