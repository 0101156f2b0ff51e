//! Requests dispatched across a controller's sources.

use std::sync::Arc;

use dc_core::{DataResponse, ResponseError, SourceParams, SourceType};
use dc_source::{DataSource, Dispatch};

use crate::controller::merge_store;
use crate::TRACING_TARGET;

/// Handler for every successful response of a request.
pub type SuccessHandler<T> = Arc<dyn Fn(DataResponse<T>) + Send + Sync + 'static>;

/// Handler for failures reported by a request.
pub type ErrorHandler = Arc<dyn Fn(ResponseError) + Send + Sync + 'static>;

/// How a request is spread across its targeted sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    /// Issue every targeted source at once. The success handler runs once
    /// per answering source; every error is reported.
    #[default]
    Parallel,
    /// Walk the targeted sources in order, moving on only when a source
    /// errors or skips the request. Only the last error is reported.
    Cascade,
}

/// A request over some or all of a controller's sources.
///
/// Built with [`DataController::request`](crate::DataController::request).
/// The request can be executed more than once.
pub struct DataControllerRequest<T> {
    sources: Vec<DataSource<T>>,
    params: Option<SourceParams>,
    targets: Option<Vec<SourceType>>,
    mode: DispatchMode,
    on_success: Option<SuccessHandler<T>>,
    on_error: Option<ErrorHandler>,
}

impl<T> std::fmt::Debug for DataControllerRequest<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataControllerRequest")
            .field("params", &self.params)
            .field("targets", &self.targets)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl<T: Send + 'static> DataControllerRequest<T> {
    pub(crate) fn new(sources: Vec<DataSource<T>>) -> Self {
        Self {
            sources,
            params: None,
            targets: None,
            mode: DispatchMode::default(),
            on_success: None,
            on_error: None,
        }
    }

    /// Set the params passed to every source.
    pub fn params(mut self, params: SourceParams) -> Self {
        self.params = Some(params);
        self
    }

    /// Restrict the request to an origin. Can be called repeatedly; without
    /// any target every source is used.
    pub fn target(mut self, origin: SourceType) -> Self {
        let targets = self.targets.get_or_insert_with(Vec::new);
        if !targets.contains(&origin) {
            targets.push(origin);
        }
        self
    }

    /// Restrict the request to the given origins.
    pub fn targets(self, origins: impl IntoIterator<Item = SourceType>) -> Self {
        origins.into_iter().fold(self, Self::target)
    }

    /// Set the dispatch mode.
    pub fn mode(mut self, mode: DispatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the success handler.
    pub fn on_success(mut self, handler: impl Fn(DataResponse<T>) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Arc::new(handler));
        self
    }

    /// Set the error handler.
    pub fn on_error(mut self, handler: impl Fn(ResponseError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(handler));
        self
    }

    /// Get the dispatch mode.
    pub fn dispatch_mode(&self) -> DispatchMode {
        self.mode
    }

    /// Origins this request reaches, in dispatch order.
    pub fn targeted(&self) -> Vec<SourceType> {
        self.targeted_sources().map(|source| source.source_type()).collect()
    }

    /// Dispatch the request.
    ///
    /// Returns [`Dispatch::Skipped`] if no targeted source issued a fetch.
    pub fn execute(&self) -> Dispatch {
        let run = Arc::new(Run {
            sources: self.sources.clone(),
            targets: self.targeted_sources().cloned().collect(),
            params: self.params.clone(),
            on_success: self.on_success.clone(),
            on_error: self.on_error.clone(),
        });

        tracing::debug!(
            target: TRACING_TARGET,
            mode = ?self.mode,
            targets = ?self.targeted(),
            "executing request"
        );

        match self.mode {
            DispatchMode::Parallel => dispatch_parallel(&run),
            DispatchMode::Cascade => dispatch_cascade(run, 0, None),
        }
    }

    /// Cancel outstanding fetches on every targeted source.
    pub fn cancel(&self) {
        for source in self.targeted_sources() {
            source.cancel();
        }
    }

    fn targeted_sources(&self) -> impl Iterator<Item = &DataSource<T>> + '_ {
        self.sources.iter().filter(move |source| match &self.targets {
            Some(targets) => targets.contains(&source.source_type()),
            None => true,
        })
    }
}

/// State shared by the callbacks of one execution.
struct Run<T> {
    /// Every source of the controller, for merging responses.
    sources: Vec<DataSource<T>>,
    targets: Vec<DataSource<T>>,
    params: Option<SourceParams>,
    on_success: Option<SuccessHandler<T>>,
    on_error: Option<ErrorHandler>,
}

impl<T: Send + 'static> Run<T> {
    fn succeed(&self, response: DataResponse<T>) {
        merge_store(&self.sources, &response);
        if let Some(handler) = &self.on_success {
            handler(response);
        }
    }

    fn fail(&self, err: ResponseError) {
        match &self.on_error {
            Some(handler) => handler(err),
            None => tracing::debug!(target: TRACING_TARGET, error = %err, "request failed without error handler"),
        }
    }
}

fn dispatch_parallel<T: Send + 'static>(run: &Arc<Run<T>>) -> Dispatch {
    let mut issued = false;
    for source in &run.targets {
        let success = Arc::clone(run);
        let error = Arc::clone(run);
        let dispatch = source.try_get(
            run.params.clone(),
            move |resp| success.succeed(resp),
            move |err| error.fail(err),
        );
        issued |= dispatch.is_issued();
    }

    if issued {
        Dispatch::Issued
    } else {
        Dispatch::Skipped
    }
}

/// Try targets from `start` on until one issues a fetch. If none does,
/// `last_error` is reported.
fn dispatch_cascade<T: Send + 'static>(
    run: Arc<Run<T>>,
    start: usize,
    last_error: Option<ResponseError>,
) -> Dispatch {
    for (index, source) in run.targets.iter().enumerate().skip(start) {
        let success = Arc::clone(&run);
        let next = Arc::clone(&run);
        let source_type = source.source_type();
        let dispatch = source.try_get(
            run.params.clone(),
            move |resp| success.succeed(resp),
            move |err| {
                tracing::debug!(target: TRACING_TARGET, source = %source_type, error = %err, "cascading past failed source");
                dispatch_cascade(next, index + 1, Some(err));
            },
        );
        if dispatch.is_issued() {
            return Dispatch::Issued;
        }
    }

    if let Some(err) = last_error {
        run.fail(err);
    }
    Dispatch::Skipped
}
