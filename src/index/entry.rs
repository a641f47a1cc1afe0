//! Connection record stored at each index node.

use chrono::NaiveDateTime;
use std::fmt;

/// Timestamp layout used by the on-disk format. Fractional seconds are optional
/// on parse, so files written with whole-second precision load unchanged.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// A single tracked connection: the IP it came from and when it was last seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub ip: String,
    pub last_seen: NaiveDateTime,
}

impl Entry {
    pub fn new(ip: impl Into<String>, last_seen: NaiveDateTime) -> Self {
        Self {
            ip: ip.into(),
            last_seen,
        }
    }

    /// Timestamp rendered in the persistence format.
    pub fn last_seen_stamp(&self) -> String {
        self.last_seen.format(TIMESTAMP_FORMAT).to_string()
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IP: {}, Last seen: {}",
            self.ip,
            self.last_seen.format("%Y-%m-%d %H:%M:%S")
        )
    }
}
