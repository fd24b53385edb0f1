//! Application State Management
//!
//! This module provides the application state that contains all services
//! and their dependencies, following the dependency injection pattern.

use std::sync::Arc;
use log::info;

use crate::config::AppConfig;
use crate::error::Result;
use crate::records::mock_store::MockRecordStore;
use crate::service::notifier::LogNotifier;
use crate::service::purge::PurgeJob;
use crate::service::quote_service::QuoteService;
use crate::storage::mock_store::MockFileStorage;

/// Application state containing all services and their dependencies
#[derive(Clone)]
pub struct AppState {
    pub quote_service: Arc<QuoteService>,
    pub purge_job: Arc<PurgeJob>,
    pub config: AppConfig,
}

impl AppState {
    /// Create application state from configuration
    pub fn from_config(config: AppConfig) -> Result<Self> {
        info!("Initializing application state with configuration");

        let layout = config.storage.layout();
        info!(
            "Using {:?} file storage, uploads under {}",
            config.storage.backend,
            layout.root().display()
        );
        let storage = config.storage.create_store()?;

        info!("Using {:?} record store", config.records.backend);
        let records = config.records.create_store()?;

        let quote_service = Arc::new(
            QuoteService::new(records, storage, &layout)
                .with_notifier(Arc::new(LogNotifier::new(config.notify.owner_email.clone()))),
        );
        let purge_job = Arc::new(PurgeJob::new(quote_service.clone(), layout));

        info!("Application state initialized successfully");
        Ok(Self {
            quote_service,
            purge_job,
            config,
        })
    }

    /// Create application state for testing with mock backends
    pub fn new_for_testing() -> Self {
        let config = AppConfig::default();
        let layout = config.storage.layout();

        let quote_service = Arc::new(QuoteService::new(
            Arc::new(MockRecordStore::new()),
            Arc::new(MockFileStorage::new(layout.clone())),
            &layout,
        ));
        let purge_job = Arc::new(PurgeJob::new(quote_service.clone(), layout));

        Self {
            quote_service,
            purge_job,
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::purge::PurgeOutcome;

    #[test]
    fn test_from_config_wires_backends() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.storage.media_root = temp.path().join("media").display().to_string();
        config.records.db_path = temp.path().join("quotes.db").display().to_string();

        let state = AppState::from_config(config).unwrap();
        assert!(temp.path().join("media").is_dir());
        assert!(temp.path().join("quotes.db").is_file());
        assert!(state.quote_service.list().unwrap().is_empty());
        assert_eq!(
            state.purge_job.run(&state.config.purge.request()).unwrap(),
            PurgeOutcome::deleted(0)
        );
    }

    #[test]
    fn test_new_for_testing_uses_mocks() {
        let state = AppState::new_for_testing();
        assert!(state.quote_service.list().unwrap().is_empty());
        assert_eq!(
            state.purge_job.run(&Default::default()).unwrap(),
            PurgeOutcome::no_cutoff()
        );
    }
}
