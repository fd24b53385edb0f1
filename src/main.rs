use log::{error, info, warn};
use std::path::Path;

use quote_intake::app_state::AppState;
use quote_intake::config::AppConfig;
use quote_intake::service::scheduler::PurgeScheduler;

fn init_logging(config_file: &str) {
    if Path::new(config_file).exists() {
        match log4rs::init_file(config_file, Default::default()) {
            Ok(()) => return,
            Err(e) => eprintln!("Failed to load log config {}: {}, falling back to env_logger", config_file, e),
        }
    }
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (config, source) = AppConfig::load()?;
    init_logging(&config.logging.config_file);
    source.log();

    let run_once = std::env::args().skip(1).any(|arg| arg == "--once");
    let state = AppState::from_config(config)?;

    if run_once {
        let job = state.purge_job.clone();
        let request = state.config.purge.request();
        let outcome = tokio::task::spawn_blocking(move || job.run(&request)).await??;
        println!("{}", serde_json::to_string(&outcome)?);
        return Ok(());
    }

    if !state.config.purge.enabled {
        warn!("Retention purge is disabled, nothing to schedule");
        return Ok(());
    }

    let handle = PurgeScheduler::from_config(state.purge_job.clone(), &state.config.purge).start_background();
    info!("Quote intake retention service running, press Ctrl-C to stop");

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down");
    handle.abort();
    Ok(())
}
