//! Flat-file persistence for the connection index.
//!
//! One line per entry, `<ip>,<timestamp>`, written in ascending key order.
//! The format is shared with older deployments and must stay byte-compatible.

use anyhow::Context;
use chrono::NaiveDateTime;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::index::{self, Link, TIMESTAMP_FORMAT};
use crate::Result;

/// Loads and saves the index from a line-oriented data file.
pub struct ConnectionStore {
    path: PathBuf,
}

impl ConnectionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the index from disk. A missing file yields an empty index, not an
    /// error; the on-disk order does not matter since every line is re-inserted
    /// and the tree rebalances itself. Returns the root and the line count.
    pub fn load(&self) -> Result<(Link, usize)> {
        if !self.path.exists() {
            info!(
                "Data file {} not found, starting with an empty index",
                self.path.display()
            );
            return Ok((None, 0));
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read data file: {}", self.path.display()))?;

        let mut root = None;
        let mut count = 0;
        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (ip, stamp) = line.split_once(',').with_context(|| {
                format!(
                    "{}:{}: expected `<ip>,<timestamp>`",
                    self.path.display(),
                    line_no + 1
                )
            })?;
            let last_seen = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT)
                .with_context(|| {
                    format!(
                        "{}:{}: invalid timestamp `{}`",
                        self.path.display(),
                        line_no + 1,
                        stamp
                    )
                })?;
            root = index::insert(root, ip, last_seen);
            count += 1;
        }

        debug!("Loaded {} connections from {}", count, self.path.display());
        Ok((root, count))
    }

    /// Save the index, one entry per line in ascending key order. Returns the
    /// number of entries written. Failures are surfaced to the caller; a save
    /// that quietly fails would lose the whole session's data.
    pub fn save(&self, root: &Link) -> Result<usize> {
        let entries = index::inorder(root);

        let file = File::create(&self.path)
            .with_context(|| format!("Failed to create data file: {}", self.path.display()))?;
        let mut writer = BufWriter::new(file);
        for entry in &entries {
            writeln!(writer, "{},{}", entry.ip, entry.last_seen_stamp())
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }
        writer
            .flush()
            .with_context(|| format!("Failed to flush {}", self.path.display()))?;

        debug!(
            "Saved {} connections to {}",
            entries.len(),
            self.path.display()
        );
        Ok(entries.len())
    }
}
