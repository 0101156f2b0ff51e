//! Storage backends for data sources.
//!
//! This crate provides:
//! - `MemoryStorage` - In-process storage with optional TTL
//! - `FileStorage` - One JSON file per key under a directory
//! - `StoredEntry` - Timestamped, origin-tagged stored value
//!
//! Both backends key entries by `SourceParams::cache_key()`. Clearing with
//! default params clears every entry.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use dc_storage::{FileStorage, MemoryStorage};
//!
//! let memory = Arc::new(MemoryStorage::<Feed>::new().with_ttl(Duration::from_secs(60)));
//! let disk = Arc::new(FileStorage::<Feed>::new("/var/cache/feeds")?);
//! ```

mod entry;
mod file;
mod memory;

pub use entry::*;
pub use file::*;
pub use memory::*;

/// Tracing target for storage events.
pub const TRACING_TARGET: &str = "dc_storage";
