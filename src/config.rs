//! Application Configuration
//!
//! This module provides configuration management for the application,
//! supporting YAML configuration files with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fs};
use log::{info, warn};

use crate::error::ConfigError;
use crate::records::config::RecordsConfig;
use crate::service::purge::{deserialize_age, PurgeRequest};
use crate::storage::config::StorageConfig;

/// Environment variable naming an alternative config file
pub const CONFIG_ENV: &str = "QUOTE_INTAKE_CONFIG";

const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Image storage configuration
    pub storage: StorageConfig,
    /// Record store configuration
    pub records: RecordsConfig,
    /// Retention purge configuration
    pub purge: PurgeConfig,
    /// Notification configuration
    pub notify: NotifyConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Retention purge configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PurgeConfig {
    /// Run the purge on a schedule
    pub enabled: bool,
    /// Seconds between purge runs
    pub interval_secs: u64,
    /// Age in days, added to `older_than_minutes`
    #[serde(deserialize_with = "deserialize_age")]
    pub older_than_days: Option<i64>,
    /// Age in minutes, added to `older_than_days`
    #[serde(deserialize_with = "deserialize_age")]
    pub older_than_minutes: Option<i64>,
}

impl Default for PurgeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 3600,
            older_than_days: Some(30),
            older_than_minutes: None,
        }
    }
}

impl PurgeConfig {
    pub fn request(&self) -> PurgeRequest {
        PurgeRequest::new(self.older_than_days, self.older_than_minutes)
    }
}

/// Notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Address new quote requests are reported to
    pub owner_email: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            owner_email: "owner@localhost".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Path to log configuration file
    pub config_file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            config_file: "server_log.yaml".to_string(),
        }
    }
}

/// Where a loaded configuration came from
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    File(PathBuf),
    /// The named file was absent and defaults were used
    Defaults(PathBuf),
}

impl ConfigSource {
    /// Report the source; call once logging is initialised
    pub fn log(&self) {
        match self {
            ConfigSource::File(path) => info!("Loaded configuration from {}", path.display()),
            ConfigSource::Defaults(path) => warn!("Config file {} not found, using defaults", path.display()),
        }
    }
}

impl AppConfig {
    /// Load configuration from `$QUOTE_INTAKE_CONFIG` or `config.yaml`,
    /// using defaults if the file is not there.
    ///
    /// Runs before logging is set up, so nothing is logged here; the returned
    /// `ConfigSource` says which file was used.
    pub fn load() -> Result<(Self, ConfigSource), ConfigError> {
        let config_path = PathBuf::from(env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string()));
        let (mut config, source) = if config_path.exists() {
            (Self::load_from(&config_path)?, ConfigSource::File(config_path))
        } else {
            (Self::default(), ConfigSource::Defaults(config_path))
        };
        config.storage.apply_env();
        config.records.apply_env();
        Ok((config, source))
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::config::RecordsBackend;
    use crate::storage::config::StorageBackend;
    use serial_test::serial;

    #[test]
    fn test_partial_yaml_falls_back_to_defaults() {
        let yaml = r#"
storage:
  media_root: /srv/media
purge:
  older_than_days: 1
  older_than_minutes: 30
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.storage.media_root, "/srv/media");
        assert_eq!(config.storage.upload_dir, "quotes");
        assert_eq!(config.storage.backend, StorageBackend::Local);
        assert_eq!(config.records.backend, RecordsBackend::SQLite);
        assert_eq!(config.purge.request(), PurgeRequest::new(Some(1), Some(30)));
        assert!(config.purge.enabled);
    }

    #[test]
    fn test_backend_names_in_yaml() {
        let yaml = "storage:\n  backend: mock\nrecords:\n  backend: sqlite\n";
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Mock);
        assert_eq!(config.records.backend, RecordsBackend::SQLite);

        assert!(serde_yaml::from_str::<AppConfig>("storage:\n  backend: s3\n").is_err());
    }

    #[test]
    fn test_fractional_purge_ages_are_truncated() {
        let yaml = "purge:\n  older_than_days: 1.9\n  older_than_minutes: 30\n";
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.purge.request(), PurgeRequest::new(Some(1), Some(30)));

        let config: AppConfig = serde_yaml::from_str("purge:\n  older_than_days: ~\n").unwrap();
        assert_eq!(config.purge.older_than_days, None);
    }

    #[test]
    #[serial]
    fn test_load_from_env_path() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("custom.yaml");
        fs::write(&path, "records:\n  backend: mock\npurge:\n  enabled: false\n").unwrap();

        env::set_var(CONFIG_ENV, &path);
        let (config, source) = AppConfig::load().unwrap();
        env::remove_var(CONFIG_ENV);

        assert_eq!(source, ConfigSource::File(path));
        assert_eq!(config.records.backend, RecordsBackend::Mock);
        assert!(!config.purge.enabled);
    }

    #[test]
    #[serial]
    fn test_load_missing_file_uses_defaults() {
        env::set_var(CONFIG_ENV, "/definitely/not/here.yaml");
        let (config, source) = AppConfig::load().unwrap();
        env::remove_var(CONFIG_ENV);

        assert_eq!(source, ConfigSource::Defaults(PathBuf::from("/definitely/not/here.yaml")));
        assert_eq!(config.purge.interval_secs, 3600);
        assert_eq!(config.logging.config_file, "server_log.yaml");
    }
}
