//! Ordered Connection Index
//!
//! Self-balancing index of connection records keyed by IP address, with exact
//! lookup, ordered enumeration, and bulk eviction of stale entries.

mod entry;
mod tree;

pub use entry::{Entry, TIMESTAMP_FORMAT};
pub use tree::{delete, inorder, insert, is_balanced, search, size, sweep_expired, Link, Node};
