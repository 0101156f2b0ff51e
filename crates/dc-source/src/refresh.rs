//! Refresh strategies deciding whether a request reaches the caller.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use dc_core::RefreshMode;

use crate::source::DataSource;
use crate::TRACING_TARGET;

/// Decides when data should get refreshed.
///
/// If [`should_refresh`](RefreshStrategy::should_refresh) returns false, a
/// non-forced `get` on the source does nothing.
pub trait RefreshStrategy<T>: Send + Sync {
    /// Return true if the source should call its caller.
    fn should_refresh(&self, source: &DataSource<T>) -> bool;
}

impl<T, F> RefreshStrategy<T> for F
where
    F: Fn(&DataSource<T>) -> bool + Send + Sync,
{
    fn should_refresh(&self, source: &DataSource<T>) -> bool {
        self(source)
    }
}

/// Refresh on every request. The default strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysRefresh;

impl<T> RefreshStrategy<T> for AlwaysRefresh {
    fn should_refresh(&self, _source: &DataSource<T>) -> bool {
        true
    }
}

/// Refresh only while the source has nothing stored for its default params.
///
/// A source without storage always refreshes. Storage failures count as
/// "nothing stored".
#[derive(Debug, Clone, Copy, Default)]
pub struct RefreshWhenEmpty;

impl<T: Send + 'static> RefreshStrategy<T> for RefreshWhenEmpty {
    fn should_refresh(&self, source: &DataSource<T>) -> bool {
        match source.has_stored_data() {
            Ok(has_data) => !has_data,
            Err(err) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    source = %source.source_type(),
                    error = %err,
                    "stored data check failed, refreshing"
                );
                true
            }
        }
    }
}

/// Refresh at most once per interval.
///
/// The interval starts when the strategy allows a refresh, not when the
/// fetch completes.
#[derive(Debug)]
pub struct MinIntervalRefresh {
    interval: Duration,
    last_refresh: Mutex<Option<Instant>>,
}

impl MinIntervalRefresh {
    /// Create a new min-interval strategy.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_refresh: Mutex::new(None),
        }
    }

    /// Get the configured interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn allow(&self, now: Instant) -> bool {
        let mut last = self
            .last_refresh
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        match *last {
            Some(at) if now.duration_since(at) < self.interval => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }
}

impl<T> RefreshStrategy<T> for MinIntervalRefresh {
    fn should_refresh(&self, _source: &DataSource<T>) -> bool {
        self.allow(Instant::now())
    }
}

/// Build the strategy described by a configured refresh mode.
pub fn strategy_for<T: Send + 'static>(mode: &RefreshMode) -> Arc<dyn RefreshStrategy<T>> {
    match mode {
        RefreshMode::Always => Arc::new(AlwaysRefresh),
        RefreshMode::WhenEmpty => Arc::new(RefreshWhenEmpty),
        RefreshMode::MinInterval { interval_ms } => {
            Arc::new(MinIntervalRefresh::new(Duration::from_millis(*interval_ms)))
        }
    }
}
