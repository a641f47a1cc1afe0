//! Configuration Types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub storage: StorageConfig,
    pub audit: AuditConfig,
    pub sweep: SweepConfig,
    pub monitoring: MonitoringConfig,
}

/// Data file configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub data_file: PathBuf,
}

/// Audit log configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuditConfig {
    pub enabled: bool,
    pub log_file: PathBuf,
}

/// Sweep configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SweepConfig {
    /// Inactivity threshold used when the operator does not supply one.
    #[serde(with = "humantime_serde")]
    pub default_threshold: Duration,
}

/// Monitoring configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonitoringConfig {
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                data_file: PathBuf::from("connections.txt"),
            },
            audit: AuditConfig {
                enabled: true,
                log_file: PathBuf::from("audit.log"),
            },
            sweep: SweepConfig {
                default_threshold: Duration::from_secs(5 * 60),
            },
            monitoring: MonitoringConfig {
                log_level: "info".to_string(),
            },
        }
    }
}
