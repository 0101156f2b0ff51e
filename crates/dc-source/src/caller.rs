//! Fetch capability a data source delegates to.

use dc_core::{DataResponse, ResponseError, SourceParams};

/// Continuation invoked with a successful response.
pub type SuccessCallback<T> = Box<dyn FnOnce(DataResponse<T>) + Send + 'static>;

/// Continuation invoked with a failed response.
pub type ErrorCallback = Box<dyn FnOnce(ResponseError) + Send + 'static>;

/// Performs the actual fetch for a data source (network call, disk read, ...).
///
/// Implementations must eventually invoke exactly one of the two callbacks,
/// once, for every call to [`get`](SourceCaller::get). A caller that never
/// completes leaves its source busy until the source is cancelled.
pub trait SourceCaller<T>: Send + Sync {
    /// Start a fetch. May complete on any thread.
    fn get(&self, params: SourceParams, on_error: ErrorCallback, on_success: SuccessCallback<T>);

    /// Best-effort abort of outstanding fetches.
    fn cancel(&self);
}
