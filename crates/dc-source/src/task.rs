//! Caller that runs async fetches on a tokio runtime.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use dc_core::{DataResponse, ResponseError, SourceParams, SourceType};
use tokio::runtime::{Handle, TryCurrentError};
use tokio::task::AbortHandle;

use crate::caller::{ErrorCallback, SourceCaller, SuccessCallback};
use crate::TRACING_TARGET;

/// An async fetch operation, e.g. an HTTP call or a file read.
#[async_trait]
pub trait AsyncFetch<T: Send>: Send + Sync + 'static {
    /// Fetch the payload for the given params.
    async fn fetch(&self, params: &SourceParams) -> Result<T, ResponseError>;
}

/// Adapts an [`AsyncFetch`] into a [`SourceCaller`].
///
/// Each `get` spawns a task on the runtime; the result is tagged with the
/// caller's origin and the request params. `cancel` aborts every task still
/// running, dropping its callbacks.
pub struct TaskCaller<F> {
    fetcher: Arc<F>,
    source_type: SourceType,
    handle: Handle,
    tasks: Mutex<Vec<AbortHandle>>,
}

impl<F> TaskCaller<F> {
    /// Create a caller spawning onto the given runtime.
    pub fn new(fetcher: F, source_type: SourceType, handle: Handle) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            source_type,
            handle,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Create a caller spawning onto the current runtime.
    pub fn try_current(fetcher: F, source_type: SourceType) -> Result<Self, TryCurrentError> {
        Ok(Self::new(fetcher, source_type, Handle::try_current()?))
    }

    /// Get the origin this caller tags responses with.
    pub fn source_type(&self) -> SourceType {
        self.source_type
    }

    /// Number of fetch tasks still running.
    pub fn in_flight(&self) -> usize {
        let mut tasks = self.tasks();
        tasks.retain(|task| !task.is_finished());
        tasks.len()
    }

    fn tasks(&self) -> MutexGuard<'_, Vec<AbortHandle>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T, F> SourceCaller<T> for TaskCaller<F>
where
    T: Send + 'static,
    F: AsyncFetch<T>,
{
    fn get(&self, params: SourceParams, on_error: ErrorCallback, on_success: SuccessCallback<T>) {
        let fetcher = Arc::clone(&self.fetcher);
        let source_type = self.source_type;

        let task = self.handle.spawn(async move {
            let result = fetcher.fetch(&params).await;
            match result {
                Ok(data) => on_success(DataResponse::new(data, source_type).with_params(params)),
                Err(err) => on_error(err),
            }
        });

        let mut tasks = self.tasks();
        tasks.retain(|task| !task.is_finished());
        tasks.push(task.abort_handle());
    }

    fn cancel(&self) {
        let tasks = std::mem::take(&mut *self.tasks());
        if !tasks.is_empty() {
            tracing::debug!(target: TRACING_TARGET, source = %self.source_type, count = tasks.len(), "aborting fetch tasks");
        }
        for task in tasks {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tokio::sync::{oneshot, Notify};

    use crate::DataSource;

    struct EchoFetch;

    #[async_trait]
    impl AsyncFetch<String> for EchoFetch {
        async fn fetch(&self, params: &SourceParams) -> Result<String, ResponseError> {
            match params.cache_key().as_str() {
                "fail" => Err(ResponseError::Http {
                    status: 404,
                    message: "missing".to_string(),
                }),
                key => Ok(format!("echo:{}", key)),
            }
        }
    }

    /// Blocks until released, so tests control completion.
    struct GatedFetch {
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl AsyncFetch<u32> for GatedFetch {
        async fn fetch(&self, _params: &SourceParams) -> Result<u32, ResponseError> {
            self.gate.notified().await;
            Ok(1)
        }
    }

    #[tokio::test]
    async fn test_task_caller_success_is_tagged() {
        let caller = TaskCaller::try_current(EchoFetch, SourceType::Network).unwrap();
        let source = DataSource::<String>::builder(Arc::new(caller), SourceType::Network).build();

        let resp = source
            .fetch(Some(SourceParams::new("feed")))
            .unwrap()
            .await
            .unwrap();

        assert_eq!(resp.data, "echo:feed");
        assert_eq!(resp.source_type, SourceType::Network);
        assert_eq!(resp.params, SourceParams::new("feed"));
        assert!(!source.is_busy());
    }

    #[tokio::test]
    async fn test_task_caller_error_reaches_callback() {
        let caller = TaskCaller::try_current(EchoFetch, SourceType::Disk).unwrap();
        let source = DataSource::<String>::builder(Arc::new(caller), SourceType::Disk).build();
        let (tx, rx) = oneshot::channel();

        source.get(
            Some(SourceParams::new("fail")),
            |_| panic!("should fail"),
            move |err| {
                let _ = tx.send(err.status());
            },
        );

        assert_eq!(rx.await.unwrap(), Some(404));
        assert!(!source.is_busy());
    }

    #[tokio::test]
    async fn test_task_caller_cancel_aborts_tasks() {
        let gate = Arc::new(Notify::new());
        let caller = Arc::new(
            TaskCaller::try_current(GatedFetch { gate: gate.clone() }, SourceType::Network).unwrap(),
        );
        let source = DataSource::<u32>::builder(caller.clone(), SourceType::Network).build();

        let pending = source.fetch(None).unwrap();
        tokio::task::yield_now().await;
        assert_eq!(caller.in_flight(), 1);

        source.cancel();
        gate.notify_waiters();

        let result = tokio::time::timeout(Duration::from_secs(5), pending)
            .await
            .expect("cancelled fetch should resolve");
        assert!(matches!(result, Err(ResponseError::Cancelled)));
        assert!(!source.is_busy());
    }

    #[test]
    fn test_try_current_outside_runtime() {
        assert!(TaskCaller::try_current(EchoFetch, SourceType::Network).is_err());
    }
}
