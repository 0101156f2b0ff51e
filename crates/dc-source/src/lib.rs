//! Single-flight, cache-aware data sources.
//!
//! This crate provides:
//! - `DataSource` - Busy-guarded accessor over one origin (memory, disk, network)
//! - `SourceCaller` / `SourceStorage` - Capabilities a source delegates to
//! - `RefreshStrategy` - Decides whether a request should reach the caller
//! - `TaskCaller` - Runs an `AsyncFetch` implementation on a tokio runtime
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use dc_source::{DataSource, RefreshWhenEmpty};
//! use dc_core::SourceType;
//!
//! let source = DataSource::builder(Arc::new(feed_caller), SourceType::Network)
//!     .storage(Arc::new(storage))
//!     .refresh_strategy(RefreshWhenEmpty)
//!     .build();
//!
//! source.get(None, |resp| render(resp.data), |err| report(err));
//! ```

mod caller;
mod refresh;
mod source;
mod storage;
mod task;

pub use caller::*;
pub use refresh::*;
pub use source::*;
pub use storage::*;
pub use task::*;

/// Tracing target for data source events.
pub const TRACING_TARGET: &str = "dc_source";
