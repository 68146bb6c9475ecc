use ferrous_wire::{
    DiError, DiObserver, Injectable, Key, MetricsObserver, Resolver, ServiceCollection, TracingObserver,
    TypeMetadata,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl DiObserver for Recorder {
    fn resolving(&self, key: &Key) {
        self.events.lock().push(format!("resolving {}", short(key)));
    }

    fn resolved(&self, key: &Key, _elapsed: Duration) {
        self.events.lock().push(format!("resolved {}", short(key)));
    }

    fn resolution_failed(&self, key: &Key, _error: &DiError) {
        self.events.lock().push(format!("failed {}", short(key)));
    }
}

fn short(key: &Key) -> &'static str {
    key.display_name().rsplit("::").next().unwrap_or_default()
}

struct Repository;

struct Handler {
    _repository: Arc<Repository>,
}

impl Injectable for Handler {
    fn describe(meta: &mut TypeMetadata<Self>) {
        meta.constructor(|(repository,): (Arc<Repository>,)| Ok(Handler { _repository: repository }));
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("ferrous_wire=trace")
        .with_test_writer()
        .try_init();
}

#[test]
fn observers_see_top_level_requests_only() {
    init_tracing();

    let recorder = Arc::new(Recorder::default());
    let mut services = ServiceCollection::new();
    services.add_singleton(Repository);
    services.add_transient_type::<Handler>();
    services.add_observer(recorder.clone());
    services.add_observer(Arc::new(TracingObserver::new()));

    let provider = services.build();
    provider.get_required::<Handler>();
    assert!(provider.get::<String>().is_err());

    let events = recorder.events.lock().clone();
    assert_eq!(
        events,
        vec!["resolving Handler", "resolved Handler", "resolving String", "failed String"]
    );
}

#[test]
fn metrics_observer_tracks_provider_traffic() {
    init_tracing();

    let metrics = Arc::new(MetricsObserver::new());
    let mut services = ServiceCollection::new();
    services.add_singleton(Repository);
    services.add_transient_type::<Handler>();
    services.add_observer(metrics.clone());

    let provider = services.build();
    for _ in 0..3 {
        provider.get_required::<Handler>();
    }
    assert!(provider.try_get::<String>().unwrap().is_none());

    assert_eq!(metrics.resolution_count(), 3);
    assert_eq!(metrics.failure_count(), 1);
    assert!(metrics.average_resolution_time().is_some());
}

#[derive(Default)]
struct SingletonTally {
    provider: once_cell::sync::OnceCell<ferrous_wire::ServiceProvider>,
    seen: Mutex<Vec<usize>>,
}

impl DiObserver for SingletonTally {
    fn resolving(&self, _key: &Key) {}

    fn resolved(&self, _key: &Key, _elapsed: Duration) {
        // Reads container state; the container lock is already released here
        if let Some(provider) = self.provider.get() {
            self.seen.lock().push(provider.singleton_count());
        }
    }
}

#[test]
fn observers_may_inspect_the_provider_after_a_request() {
    let tally = Arc::new(SingletonTally::default());
    let mut services = ServiceCollection::new();
    services.add_singleton(Repository);
    services.add_singleton_type::<Handler>();
    services.add_observer(tally.clone());

    let provider = services.build();
    let _ = tally.provider.set(provider.clone());

    provider.get_required::<Handler>();
    provider.get_required::<Handler>();

    assert_eq!(*tally.seen.lock(), vec![1, 1]);
}
