//! Mock implementation of RecordStore for testing

use crate::error::{QuoteError, Result};
use crate::model::{FileRef, NewQuote, QuoteId, QuoteRequest};
use crate::records::RecordStore;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct MockState {
    next_id: i64,
    quotes: BTreeMap<QuoteId, QuoteRequest>,
}

/// In-memory record store
pub struct MockRecordStore {
    state: Arc<Mutex<MockState>>,
}

impl MockRecordStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Number of stored quote requests
    pub fn count(&self) -> usize {
        self.state().quotes.len()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for MockRecordStore {
    fn insert(&self, quote: &NewQuote, image: Option<&FileRef>, created_at: DateTime<Utc>) -> Result<QuoteRequest> {
        let mut state = self.state();
        state.next_id += 1;
        let id = QuoteId(state.next_id);
        let stored = QuoteRequest::from_new(id, quote, image.cloned(), created_at);
        state.quotes.insert(id, stored.clone());
        Ok(stored)
    }

    fn get(&self, id: QuoteId) -> Result<QuoteRequest> {
        self.state()
            .quotes
            .get(&id)
            .cloned()
            .ok_or(QuoteError::NotFound(id))
    }

    fn update(&self, quote: &QuoteRequest) -> Result<()> {
        let mut state = self.state();
        let stored = state
            .quotes
            .get_mut(&quote.id)
            .ok_or(QuoteError::NotFound(quote.id))?;
        let created_at = stored.created_at;
        *stored = quote.clone();
        stored.created_at = created_at;
        Ok(())
    }

    fn delete(&self, id: QuoteId) -> Result<bool> {
        Ok(self.state().quotes.remove(&id).is_some())
    }

    fn created_on_or_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<QuoteRequest>> {
        Ok(self
            .state()
            .quotes
            .values()
            .filter(|quote| quote.created_at <= cutoff)
            .cloned()
            .collect())
    }

    fn list(&self) -> Result<Vec<QuoteRequest>> {
        let mut quotes: Vec<QuoteRequest> = self.state().quotes.values().cloned().collect();
        quotes.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(quotes)
    }
}
