//! Single-flight data source over one origin.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dc_core::{
    DataResponse, ResponseError, SourceConfig, SourceParams, SourceType, StorageError,
};
use futures::channel::oneshot;

use crate::caller::{ErrorCallback, SourceCaller, SuccessCallback};
use crate::refresh::{strategy_for, AlwaysRefresh, RefreshStrategy};
use crate::storage::{Source, SourceStorage};
use crate::TRACING_TARGET;

/// Outcome of a `get` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The caller was invoked; exactly one callback will follow unless the
    /// source is cancelled first.
    Issued,
    /// The source was busy or its refresh strategy declined. No callback
    /// will fire.
    Skipped,
}

impl Dispatch {
    /// Check if the request reached the caller.
    pub fn is_issued(&self) -> bool {
        matches!(self, Self::Issued)
    }
}

#[derive(Debug, Default)]
struct BusyState {
    busy: bool,
    /// Bumped on cancel; completions from older epochs are dropped.
    epoch: u64,
}

#[derive(Debug, Default)]
struct Busy {
    state: Mutex<BusyState>,
}

impl Busy {
    fn lock(&self) -> MutexGuard<'_, BusyState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_busy(&self) -> bool {
        self.lock().busy
    }

    /// Mark busy, returning the epoch of the new fetch. `None` if already
    /// busy and not forced.
    fn try_acquire(&self, force: bool) -> Option<u64> {
        let mut state = self.lock();
        if state.busy && !force {
            return None;
        }
        state.busy = true;
        Some(state.epoch)
    }

    /// Release busy for a fetch issued in `epoch`. Returns false if the
    /// fetch was cancelled in the meantime.
    fn release(&self, epoch: u64) -> bool {
        let mut state = self.lock();
        if state.epoch != epoch {
            return false;
        }
        state.busy = false;
        true
    }

    fn cancel(&self) {
        let mut state = self.lock();
        state.epoch = state.epoch.wrapping_add(1);
        state.busy = false;
    }
}

/// A single-flight accessor over one origin.
///
/// At most one fetch is in flight at a time unless a request forces a
/// refresh. Responses from other origins can be persisted into the source's
/// storage through [`store`](DataSource::store).
///
/// Clones share the caller, storage, refresh strategy and busy state.
pub struct DataSource<T> {
    caller: Arc<dyn SourceCaller<T>>,
    source_type: SourceType,
    storage: Option<Arc<dyn SourceStorage<T>>>,
    refresh_strategy: Arc<dyn RefreshStrategy<T>>,
    default_params: SourceParams,
    busy: Arc<Busy>,
}

impl<T> Clone for DataSource<T> {
    fn clone(&self) -> Self {
        Self {
            caller: Arc::clone(&self.caller),
            source_type: self.source_type,
            storage: self.storage.clone(),
            refresh_strategy: Arc::clone(&self.refresh_strategy),
            default_params: self.default_params.clone(),
            busy: Arc::clone(&self.busy),
        }
    }
}

impl<T> std::fmt::Debug for DataSource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSource")
            .field("source_type", &self.source_type)
            .field("has_storage", &self.storage.is_some())
            .field("default_params", &self.default_params)
            .field("busy", &self.busy.is_busy())
            .finish()
    }
}

impl<T: Send + 'static> DataSource<T> {
    /// Start building a source over the given caller and origin.
    pub fn builder(caller: Arc<dyn SourceCaller<T>>, source_type: SourceType) -> DataSourceBuilder<T> {
        DataSourceBuilder::new(caller, source_type)
    }

    /// Get the refresh strategy.
    pub fn refresh_strategy(&self) -> &dyn RefreshStrategy<T> {
        self.refresh_strategy.as_ref()
    }

    /// Get the origin of this source.
    pub fn source_type(&self) -> SourceType {
        self.source_type
    }

    /// Get the params used when a request passes none.
    pub fn default_params(&self) -> &SourceParams {
        &self.default_params
    }

    /// Check if a storage backend is configured.
    pub fn has_storage(&self) -> bool {
        self.storage.is_some()
    }

    /// Check if a fetch is outstanding.
    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    /// Request data, respecting the refresh strategy and busy state.
    ///
    /// `None` or default params are replaced by the source's default params.
    /// When the request is skipped neither callback fires; use
    /// [`try_get`](DataSource::try_get) to find out.
    pub fn get<S, E>(&self, params: Option<SourceParams>, on_success: S, on_error: E)
    where
        S: FnOnce(DataResponse<T>) + Send + 'static,
        E: FnOnce(ResponseError) + Send + 'static,
    {
        let _ = self.try_get(params, on_success, on_error);
    }

    /// Like [`get`](DataSource::get), reporting whether the caller was
    /// invoked.
    pub fn try_get<S, E>(&self, params: Option<SourceParams>, on_success: S, on_error: E) -> Dispatch
    where
        S: FnOnce(DataResponse<T>) + Send + 'static,
        E: FnOnce(ResponseError) + Send + 'static,
    {
        let force = params.as_ref().is_some_and(|p| p.force);

        if !force {
            if self.busy.is_busy() {
                tracing::debug!(target: TRACING_TARGET, source = %self.source_type, "source busy, skipping request");
                return Dispatch::Skipped;
            }
            if !self.refresh_strategy.should_refresh(self) {
                tracing::debug!(target: TRACING_TARGET, source = %self.source_type, "refresh declined, skipping request");
                return Dispatch::Skipped;
            }
        }

        let Some(epoch) = self.busy.try_acquire(force) else {
            tracing::debug!(target: TRACING_TARGET, source = %self.source_type, "source busy, skipping request");
            return Dispatch::Skipped;
        };

        let params = self.resolve_params(params);
        tracing::debug!(
            target: TRACING_TARGET,
            source = %self.source_type,
            key = %params.cache_key(),
            force,
            "issuing fetch"
        );

        let (on_error, on_success) = self.wrap_callbacks(epoch, Box::new(on_success), Box::new(on_error));
        self.caller.get(params, on_error, on_success);
        Dispatch::Issued
    }

    /// Request data as a future.
    ///
    /// Returns `None` when the request is skipped. A fetch cancelled before it
    /// completes resolves to [`ResponseError::Cancelled`].
    pub fn fetch(
        &self,
        params: Option<SourceParams>,
    ) -> Option<impl Future<Output = Result<DataResponse<T>, ResponseError>> + Send + 'static> {
        let (tx, rx) = oneshot::channel();
        let success_tx = Arc::new(Mutex::new(Some(tx)));
        let error_tx = Arc::clone(&success_tx);

        let dispatch = self.try_get(
            params,
            move |resp| send_once(&success_tx, Ok(resp)),
            move |err| send_once(&error_tx, Err(err)),
        );

        match dispatch {
            Dispatch::Issued => Some(async move { rx.await.unwrap_or(Err(ResponseError::Cancelled)) }),
            Dispatch::Skipped => None,
        }
    }

    /// Cancel outstanding fetches.
    ///
    /// Busy is released immediately and completions from fetches issued
    /// before the cancel are dropped without reaching their callbacks.
    pub fn cancel(&self) {
        self.busy.cancel();
        self.caller.cancel();
        tracing::debug!(target: TRACING_TARGET, source = %self.source_type, "cancelled outstanding fetches");
    }

    /// Persist a response from another origin.
    ///
    /// Responses that originated from this source's own origin are never
    /// stored. Does nothing without storage.
    pub fn store(&self, response: &DataResponse<T>) -> Result<(), StorageError> {
        let Some(storage) = &self.storage else {
            return Ok(());
        };
        if response.is_from(self.source_type) {
            return Ok(());
        }

        tracing::debug!(
            target: TRACING_TARGET,
            source = %self.source_type,
            from = %response.source_type,
            key = %response.params.cache_key(),
            "storing response"
        );
        storage.store(response)
    }

    /// Stored value for the default params. `None` without storage.
    pub fn stored_data(&self) -> Result<Option<T>, StorageError> {
        self.stored_data_for(&self.default_params)
    }

    /// Stored value for the given params. `None` without storage.
    pub fn stored_data_for(&self, params: &SourceParams) -> Result<Option<T>, StorageError> {
        match &self.storage {
            Some(storage) => storage.stored_data(params),
            None => Ok(None),
        }
    }

    /// Check for stored data under the default params. `false` without
    /// storage.
    pub fn has_stored_data(&self) -> Result<bool, StorageError> {
        self.has_stored_data_for(&self.default_params)
    }

    /// Check for stored data under the given params. `false` without storage.
    pub fn has_stored_data_for(&self, params: &SourceParams) -> Result<bool, StorageError> {
        match &self.storage {
            Some(storage) => storage.has_stored_data(params),
            None => Ok(false),
        }
    }

    /// Clear stored data for the default params. Does nothing without
    /// storage.
    pub fn clear_stored_data(&self) -> Result<(), StorageError> {
        self.clear_stored_data_for(&self.default_params)
    }

    /// Clear stored data for the given params. Does nothing without storage.
    pub fn clear_stored_data_for(&self, params: &SourceParams) -> Result<(), StorageError> {
        match &self.storage {
            Some(storage) => storage.clear_stored_data(params),
            None => Ok(()),
        }
    }

    fn resolve_params(&self, params: Option<SourceParams>) -> SourceParams {
        match params {
            Some(params) if !params.is_default() => params,
            _ => self.default_params.clone(),
        }
    }

    fn wrap_callbacks(
        &self,
        epoch: u64,
        on_success: SuccessCallback<T>,
        on_error: ErrorCallback,
    ) -> (ErrorCallback, SuccessCallback<T>) {
        let settled = Arc::new(AtomicBool::new(false));
        let source_type = self.source_type;

        let error_settled = Arc::clone(&settled);
        let error_busy = Arc::clone(&self.busy);
        let error: ErrorCallback = Box::new(move |err| {
            if settle(&error_settled, &error_busy, epoch, source_type) {
                tracing::debug!(target: TRACING_TARGET, source = %source_type, error = %err, "fetch failed");
                on_error(err);
            }
        });

        let success_busy = Arc::clone(&self.busy);
        let success: SuccessCallback<T> = Box::new(move |resp| {
            if settle(&settled, &success_busy, epoch, source_type) {
                tracing::debug!(target: TRACING_TARGET, source = %source_type, from = %resp.source_type, "fetch succeeded");
                on_success(resp);
            }
        });

        (error, success)
    }
}

/// Mark a fetch completed. Returns true if its outer callback should run.
fn settle(settled: &AtomicBool, busy: &Busy, epoch: u64, source_type: SourceType) -> bool {
    if settled.swap(true, Ordering::AcqRel) {
        tracing::warn!(target: TRACING_TARGET, source = %source_type, "fetch completed more than once, ignoring");
        return false;
    }
    if !busy.release(epoch) {
        tracing::debug!(target: TRACING_TARGET, source = %source_type, "dropping completion of cancelled fetch");
        return false;
    }
    true
}

type Outcome<T> = Result<DataResponse<T>, ResponseError>;

fn send_once<T>(slot: &Mutex<Option<oneshot::Sender<Outcome<T>>>>, outcome: Outcome<T>) {
    let sender = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
    if let Some(sender) = sender {
        let _ = sender.send(outcome);
    }
}

/// Builder for [`DataSource`].
pub struct DataSourceBuilder<T> {
    caller: Arc<dyn SourceCaller<T>>,
    source_type: SourceType,
    storage: Option<Arc<dyn SourceStorage<T>>>,
    refresh_strategy: Option<Arc<dyn RefreshStrategy<T>>>,
    default_params: SourceParams,
}

impl<T: Send + 'static> DataSourceBuilder<T> {
    /// Create a builder with the required caller and origin.
    pub fn new(caller: Arc<dyn SourceCaller<T>>, source_type: SourceType) -> Self {
        Self {
            caller,
            source_type,
            storage: None,
            refresh_strategy: None,
            default_params: SourceParams::default(),
        }
    }

    /// Create a builder from a configuration.
    pub fn from_config(caller: Arc<dyn SourceCaller<T>>, config: &SourceConfig) -> Self {
        Self {
            caller,
            source_type: config.origin,
            storage: None,
            refresh_strategy: Some(strategy_for(&config.refresh)),
            default_params: config.default_params.clone(),
        }
    }

    /// Create a builder whose caller and storage are the same object.
    pub fn from_source<S>(source: Arc<S>, source_type: SourceType) -> Self
    where
        S: Source<T> + 'static,
    {
        let caller: Arc<dyn SourceCaller<T>> = source.clone();
        Self::new(caller, source_type).storage(source)
    }

    /// Set the storage backend.
    pub fn storage(mut self, storage: Arc<dyn SourceStorage<T>>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Set the refresh strategy.
    pub fn refresh_strategy(mut self, strategy: impl RefreshStrategy<T> + 'static) -> Self {
        self.refresh_strategy = Some(Arc::new(strategy));
        self
    }

    /// Set the params used when a request passes none.
    pub fn default_params(mut self, params: SourceParams) -> Self {
        self.default_params = params;
        self
    }

    /// Build the source.
    pub fn build(self) -> DataSource<T> {
        DataSource {
            caller: self.caller,
            source_type: self.source_type,
            storage: self.storage,
            refresh_strategy: self
                .refresh_strategy
                .unwrap_or_else(|| Arc::new(AlwaysRefresh)),
            default_params: self.default_params,
            busy: Arc::new(Busy::default()),
        }
    }
}
