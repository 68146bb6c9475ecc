//! Resolution observers.
//!
//! Observers are told when a top-level resolution starts, finishes, or fails.
//! Nested resolutions inside the same request are reported through `tracing`
//! events instead, so an observer sees one event pair per `get` call.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::DiError;
use crate::key::Key;

/// Observer trait for top-level resolution events.
///
/// Calls are made synchronously on the resolving thread, just before the
/// container lock is taken and just after it is released. Implementations
/// should be cheap and must not resolve services themselves.
///
/// # Examples
///
/// ```
/// use ferrous_wire::{DiError, DiObserver, Key, ServiceCollection};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// struct StdoutObserver;
///
/// impl DiObserver for StdoutObserver {
///     fn resolving(&self, key: &Key) {
///         println!("resolving {}", key.display_name());
///     }
///
///     fn resolved(&self, key: &Key, duration: Duration) {
///         println!("resolved {} in {:?}", key.display_name(), duration);
///     }
///
///     fn resolution_failed(&self, key: &Key, error: &DiError) {
///         println!("{} failed: {}", key.display_name(), error);
///     }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_observer(Arc::new(StdoutObserver));
/// let provider = services.build();
/// ```
pub trait DiObserver: Send + Sync {
    /// Called before a top-level resolution starts.
    fn resolving(&self, key: &Key);

    /// Called after a top-level resolution succeeded.
    ///
    /// `duration` is measured from `resolving`, and includes cache hits.
    fn resolved(&self, key: &Key, duration: Duration);

    /// Called when a top-level resolution failed.
    ///
    /// Nothing the failed request built has been cached.
    fn resolution_failed(&self, key: &Key, error: &DiError) {
        let _ = (key, error);
    }
}

/// Observer collection held by the provider.
#[derive(Default)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn DiObserver>>,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self { observers: Vec::new() }
    }

    pub(crate) fn add(&mut self, observer: Arc<dyn DiObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    #[inline]
    pub(crate) fn resolving(&self, key: &Key) {
        for observer in &self.observers {
            observer.resolving(key);
        }
    }

    #[inline]
    pub(crate) fn resolved(&self, key: &Key, duration: Duration) {
        for observer in &self.observers {
            observer.resolved(key, duration);
        }
    }

    pub(crate) fn resolution_failed(&self, key: &Key, error: &DiError) {
        for observer in &self.observers {
            observer.resolution_failed(key, error);
        }
    }
}

/// Built-in observer that forwards events to `tracing`.
///
/// Successes are logged at `debug`, failures at `warn`, both under the
/// `ferrous_wire` target.
///
/// # Examples
///
/// ```
/// use ferrous_wire::{ServiceCollection, TracingObserver};
/// use std::sync::Arc;
///
/// let mut services = ServiceCollection::new();
/// services.add_observer(Arc::new(TracingObserver::new()));
/// let provider = services.build();
/// ```
#[derive(Debug, Default)]
pub struct TracingObserver {
    _private: (),
}

impl TracingObserver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DiObserver for TracingObserver {
    fn resolving(&self, key: &Key) {
        tracing::trace!(target: "ferrous_wire", contract = key.display_name(), "resolving");
    }

    fn resolved(&self, key: &Key, duration: Duration) {
        tracing::debug!(
            target: "ferrous_wire",
            contract = key.display_name(),
            elapsed_us = duration.as_micros() as u64,
            "resolved"
        );
    }

    fn resolution_failed(&self, key: &Key, error: &DiError) {
        tracing::warn!(
            target: "ferrous_wire",
            contract = key.display_name(),
            chain = ?error.chain(),
            error = %error.root_cause(),
            "resolution failed"
        );
    }
}

/// Observer that counts resolutions and failures.
///
/// Handy in tests and for coarse health reporting.
#[derive(Debug, Default)]
pub struct MetricsObserver {
    resolutions: AtomicU64,
    failures: AtomicU64,
    total_nanos: AtomicU64,
}

impl MetricsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful top-level resolutions.
    pub fn resolution_count(&self) -> u64 {
        self.resolutions.load(Ordering::Relaxed)
    }

    pub fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn average_resolution_time(&self) -> Option<Duration> {
        let count = self.resolution_count();
        if count == 0 {
            return None;
        }
        Some(Duration::from_nanos(self.total_nanos.load(Ordering::Relaxed) / count))
    }
}

impl DiObserver for MetricsObserver {
    fn resolving(&self, _key: &Key) {}

    fn resolved(&self, _key: &Key, duration: Duration) {
        self.resolutions.fetch_add(1, Ordering::Relaxed);
        self.total_nanos.fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    fn resolution_failed(&self, _key: &Key, _error: &DiError) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key_of;

    #[test]
    fn metrics_observer_counts() {
        let observer = MetricsObserver::new();
        let key = key_of::<String>();
        assert!(observer.average_resolution_time().is_none());

        observer.resolved(&key, Duration::from_millis(10));
        observer.resolved(&key, Duration::from_millis(20));
        observer.resolution_failed(&key, &DiError::NotFound("String"));

        assert_eq!(observer.resolution_count(), 2);
        assert_eq!(observer.failure_count(), 1);
        assert_eq!(observer.average_resolution_time(), Some(Duration::from_millis(15)));
    }

    #[test]
    fn observers_fan_out() {
        let metrics = Arc::new(MetricsObserver::new());
        let mut observers = Observers::new();
        assert!(!observers.has_observers());
        observers.add(metrics.clone());
        observers.add(Arc::new(TracingObserver::new()));

        let key = key_of::<u8>();
        observers.resolving(&key);
        observers.resolved(&key, Duration::from_micros(5));
        observers.resolution_failed(&key, &DiError::DepthExceeded(3));

        assert!(observers.has_observers());
        assert_eq!(metrics.resolution_count(), 1);
        assert_eq!(metrics.failure_count(), 1);
    }
}
