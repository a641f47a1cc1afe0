//! Connwatch Library
//!
//! IP connection surveillance backed by a self-balancing activity index:
//! an AVL tree keyed by IP address, with exact lookup, ordered enumeration,
//! bulk eviction of idle entries, flat-file persistence, and an audit log.

pub mod audit;
pub mod config;
pub mod index;
pub mod menu;
pub mod store;

pub use config::Config;
pub use store::ConnectionStore;

/// Common error type for the tool
pub type Result<T> = anyhow::Result<T>;
