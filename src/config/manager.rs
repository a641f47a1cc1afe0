//! Configuration Manager

use super::Config;
use crate::Result;
use anyhow::{bail, Context};
use std::path::Path;
use std::time::Duration;

/// Manages configuration loading and validation
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration from file
    pub fn load_from_file(path: &Path) -> Result<Config> {
        if path.exists() {
            tracing::info!("Loading configuration from: {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;

            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

            config
                .validate()
                .with_context(|| "Configuration validation failed")?;

            Ok(config)
        } else {
            tracing::warn!(
                "Configuration file not found at {}, using defaults",
                path.display()
            );
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }

    /// Load configuration from environment variables
    pub fn load_from_env() -> Result<Config> {
        let mut config = Config::default();

        if let Ok(data_file) = std::env::var("CONNWATCH_DATA_FILE") {
            config.storage.data_file = data_file.into();
        }

        if let Ok(log_file) = std::env::var("CONNWATCH_AUDIT_LOG") {
            config.audit.log_file = log_file.into();
        }

        if let Ok(threshold) = std::env::var("CONNWATCH_THRESHOLD") {
            config.sweep.default_threshold = humantime::parse_duration(&threshold)
                .with_context(|| format!("Invalid CONNWATCH_THRESHOLD: {}", threshold))?;
        }

        if let Ok(log_level) = std::env::var("CONNWATCH_LOG_LEVEL") {
            config.monitoring.log_level = log_level;
        }

        config.validate()?;
        Ok(config)
    }
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.storage.data_file.as_os_str().is_empty() {
            bail!("storage.data_file must not be empty");
        }

        if self.audit.log_file.as_os_str().is_empty() {
            bail!("audit.log_file must not be empty");
        }

        // A zero threshold would evict every entry on each sweep.
        if self.sweep.default_threshold.is_zero() {
            bail!("sweep.default_threshold must be greater than 0");
        }

        if self.sweep.default_threshold > Duration::from_secs(365 * 24 * 3600) {
            bail!("sweep.default_threshold cannot exceed 1 year");
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.monitoring.log_level.as_str()) {
            bail!(
                "monitoring.log_level must be one of: {}",
                valid_log_levels.join(", ")
            );
        }

        Ok(())
    }

    /// Merge with CLI arguments
    pub fn merge_with_cli_args(
        &mut self,
        data_file: Option<&Path>,
        threshold: Option<Duration>,
        no_audit: bool,
    ) {
        if let Some(data_file) = data_file {
            self.storage.data_file = data_file.to_path_buf();
            tracing::info!("CLI override: data file set to {}", data_file.display());
        }

        if let Some(threshold) = threshold {
            self.sweep.default_threshold = threshold;
            tracing::info!(
                "CLI override: default sweep threshold set to {}",
                humantime::format_duration(threshold)
            );
        }

        if no_audit {
            self.audit.enabled = false;
            tracing::info!("CLI override: audit log disabled");
        }
    }
}
