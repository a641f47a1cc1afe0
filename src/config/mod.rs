//! Configuration Management

mod manager;
mod types;

pub use manager::ConfigManager;
pub use types::{AuditConfig, Config, MonitoringConfig, StorageConfig, SweepConfig};
