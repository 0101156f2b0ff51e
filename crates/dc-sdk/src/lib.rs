//! Cache-aware data sources behind one controller.
//!
//! This crate re-exports the whole library:
//!
//! ```ignore
//! use std::sync::Arc;
//! use dc_sdk::prelude::*;
//!
//! let memory = DataSource::builder(Arc::new(memory_caller), SourceType::Memory)
//!     .storage(Arc::new(MemoryStorage::new()))
//!     .refresh_strategy(RefreshWhenEmpty)
//!     .build();
//! let network = DataSource::builder(
//!     Arc::new(TaskCaller::try_current(FeedApi::new(), SourceType::Network)?),
//!     SourceType::Network,
//! )
//! .build();
//!
//! let controller = DataController::from_sources([memory, network])?;
//! controller
//!     .request()
//!     .mode(DispatchMode::Cascade)
//!     .on_success(|resp| render(resp.data))
//!     .execute();
//! ```

pub use dc_controller;
pub use dc_core;
pub use dc_source;
pub use dc_storage;

/// Prelude for convenient imports.
pub mod prelude {
    pub use dc_controller::{
        ControllerError, DataController, DataControllerRequest, DispatchMode, ErrorHandler,
        SuccessHandler,
    };
    pub use dc_core::{
        ConfigError, DataResponse, RefreshMode, ResponseError, SourceConfig, SourceParams,
        SourceType, StorageError,
    };
    pub use dc_source::{
        AlwaysRefresh, AsyncFetch, DataSource, DataSourceBuilder, Dispatch, ErrorCallback,
        MinIntervalRefresh, RefreshStrategy, RefreshWhenEmpty, Source, SourceCaller, SourceStorage,
        SuccessCallback, TaskCaller,
    };
    pub use dc_storage::{FileStorage, MemoryStorage, StoredEntry};
}
