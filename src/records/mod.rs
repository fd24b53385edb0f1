//! Record Store Abstraction
//!
//! This module provides an abstraction over where quote requests are
//! persisted, allowing the service layer to run against SQLite or an
//! in-memory store without changes. Stores only persist rows; file cleanup
//! is the job of the lifecycle hooks that sit in front of them.

pub mod sqlite_store;
pub mod mock_store;
pub mod config;


use chrono::{DateTime, Utc};

use crate::error::{QuoteError, Result};
use crate::model::{FileRef, NewQuote, QuoteId, QuoteRequest};

/// Trait defining the record store interface
pub trait RecordStore: Send + Sync {
    /// Persist a new quote request and return it with its assigned identity
    fn insert(&self, quote: &NewQuote, image: Option<&FileRef>, created_at: DateTime<Utc>) -> Result<QuoteRequest>;

    /// Fetch a quote request, failing with `NotFound` if it does not exist
    fn get(&self, id: QuoteId) -> Result<QuoteRequest>;

    /// Overwrite the mutable fields of an existing quote request.
    /// `created_at` is never changed.
    fn update(&self, quote: &QuoteRequest) -> Result<()>;

    /// Delete a quote request. Returns false when it was already gone.
    fn delete(&self, id: QuoteId) -> Result<bool>;

    /// Snapshot of every quote request created at or before `cutoff`
    fn created_on_or_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<QuoteRequest>>;

    /// All quote requests, newest first
    fn list(&self) -> Result<Vec<QuoteRequest>>;

    /// Like `get`, but a missing record is `None`
    fn find(&self, id: QuoteId) -> Result<Option<QuoteRequest>> {
        match self.get(id) {
            Ok(quote) => Ok(Some(quote)),
            Err(QuoteError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
