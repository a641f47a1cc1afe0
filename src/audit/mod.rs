//! Audit Log
//!
//! Append-only record of every completed operation, one timestamped line per
//! event. Purely observational: a failed audit write is reported through
//! `tracing` and never affects the operation that triggered it.

use chrono::Local;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::Result;

const STAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Appends operation records to a text file.
pub struct AuditLog {
    path: PathBuf,
    enabled: bool,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            path: path.into(),
            enabled,
        }
    }

    pub fn system_started(&self) {
        self.record("SYSTEM STARTED");
    }

    pub fn system_stopped(&self) {
        self.record("SYSTEM STOPPED");
    }

    pub fn connection_added(&self, ip: &str) {
        self.record(&format!("CONNECTION ADDED: {ip}"));
    }

    pub fn connection_deleted(&self, ip: &str) {
        self.record(&format!("CONNECTION DELETED: {ip}"));
    }

    pub fn connections_swept(&self, evicted: &[String], threshold: Duration) {
        let threshold = humantime::format_duration(threshold);
        if evicted.is_empty() {
            self.record(&format!("SWEEP: no connections idle for more than {threshold}"));
            return;
        }
        self.record(&format!(
            "SWEEP: {} connections idle for more than {} removed",
            evicted.len(),
            threshold
        ));
        for ip in evicted {
            self.record(&format!("  - {ip}"));
        }
    }

    pub fn connection_searched(&self, ip: &str, found: bool) {
        let outcome = if found { "found" } else { "not found" };
        self.record(&format!("SEARCH: connection {ip} {outcome}"));
    }

    pub fn connections_displayed(&self, count: usize) {
        self.record(&format!("DISPLAY: {count} connections listed"));
    }

    pub fn connections_saved(&self, path: &Path, count: usize) {
        self.record(&format!("SAVE: {} connections saved to {}", count, path.display()));
    }

    pub fn connections_loaded(&self, path: &Path, count: usize) {
        self.record(&format!(
            "LOAD: {} connections loaded from {}",
            count,
            path.display()
        ));
    }

    fn record(&self, message: &str) {
        if !self.enabled {
            return;
        }
        if let Err(e) = self.append(message) {
            warn!("Failed to write audit log entry to {}: {e:#}", self.path.display());
        }
    }

    fn append(&self, message: &str) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "[{}] {}", Local::now().format(STAMP_FORMAT), message)?;
        Ok(())
    }
}
