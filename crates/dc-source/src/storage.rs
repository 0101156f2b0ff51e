//! Persistence capability a data source may own.

use dc_core::{DataResponse, SourceParams, StorageError};

use crate::caller::SourceCaller;

/// Contract a storage backend must satisfy.
///
/// How bytes are persisted is up to the backend. Implementations arbitrate
/// their own concurrency.
pub trait SourceStorage<T>: Send + Sync {
    /// Persist a response.
    fn store(&self, response: &DataResponse<T>) -> Result<(), StorageError>;

    /// Stored value for the given params, if any.
    fn stored_data(&self, params: &SourceParams) -> Result<Option<T>, StorageError>;

    /// Remove stored data for the given params.
    fn clear_stored_data(&self, params: &SourceParams) -> Result<(), StorageError>;

    /// Check if a value is stored for the given params.
    fn has_stored_data(&self, params: &SourceParams) -> Result<bool, StorageError>;
}

/// A single object that both fetches and persists data.
///
/// Implemented for every type that is both a [`SourceCaller`] and a
/// [`SourceStorage`]; see [`DataSourceBuilder::from_source`](crate::DataSourceBuilder::from_source).
pub trait Source<T>: SourceCaller<T> + SourceStorage<T> {}

impl<T, S> Source<T> for S where S: SourceCaller<T> + SourceStorage<T> + ?Sized {}
