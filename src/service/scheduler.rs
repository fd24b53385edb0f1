//! Periodic trigger for the retention purge
//!
//! Runs the purge job on a fixed interval. The job itself is blocking
//! (filesystem and SQLite), so each run is moved onto the blocking pool.

use log::{error, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::time;

use crate::config::PurgeConfig;
use crate::service::purge::{PurgeJob, PurgeOutcome, PurgeRequest};

/// Background purge scheduler
pub struct PurgeScheduler {
    job: Arc<PurgeJob>,
    request: PurgeRequest,
    interval: Duration,
}

impl PurgeScheduler {
    pub fn new(job: Arc<PurgeJob>, request: PurgeRequest, interval: Duration) -> Self {
        Self {
            job,
            request,
            // tokio refuses a zero period
            interval: interval.max(Duration::from_secs(1)),
        }
    }

    pub fn from_config(job: Arc<PurgeJob>, config: &PurgeConfig) -> Self {
        Self::new(job, config.request(), Duration::from_secs(config.interval_secs))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start the scheduler as a background task (non-blocking)
    pub fn start_background(self) -> tokio::task::JoinHandle<()> {
        info!("Starting retention purge with {}s interval", self.interval.as_secs());

        tokio::spawn(async move {
            let mut interval = time::interval(self.interval);

            loop {
                interval.tick().await;
                self.run_once().await;
            }
        })
    }

    /// Run one purge; failures are logged and reported as `None`
    pub async fn run_once(&self) -> Option<PurgeOutcome> {
        let job = self.job.clone();
        let request = self.request.clone();

        match tokio::task::spawn_blocking(move || job.run(&request)).await {
            Ok(Ok(outcome)) => {
                info!("Retention purge finished: {:?}", outcome);
                Some(outcome)
            }
            Ok(Err(e)) => {
                error!("Retention purge failed: {}", e);
                None
            }
            Err(e) => {
                error!("Retention purge task panicked or was cancelled: {}", e);
                None
            }
        }
    }
}
