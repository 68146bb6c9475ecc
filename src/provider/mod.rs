//! Service provider module for dependency injection.
//!
//! This module contains the ServiceProvider type, which owns the frozen
//! registration table and the instance cache, and runs each top-level request
//! through the graph resolver.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use crate::cache::InstanceCache;
use crate::descriptors::ServiceDescriptor;
use crate::error::DiResult;
use crate::key::Key;
use crate::metadata::{describe_type, Injectable, Scanner, TypeDescriptor};
use crate::observer::Observers;
use crate::options::ContainerOptions;
use crate::registration::{AnyArc, Registry};
use crate::traits::ResolverCore;

pub mod context;
mod resolution;

pub use context::ResolverContext;
use resolution::Walk;

/// Service provider for resolving dependencies from the DI container.
///
/// Built by [`ServiceCollection::build`](crate::ServiceCollection::build). The
/// registration table is frozen from that point on. Singletons are created on
/// first request and shared afterwards; transients are created per request.
///
/// # Thread Safety
///
/// `ServiceProvider` is cheap to clone and can be shared across threads. Each
/// top-level resolution holds the container lock from start to finish, so two
/// threads asking for the same singleton always observe the same instance.
/// Constructors and factories run under that lock and must not call back into
/// the provider; factories resolve through their [`ResolverContext`].
///
/// # Examples
///
/// ```
/// use ferrous_wire::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct UserService { db: Arc<Database> }
///
/// let mut collection = ServiceCollection::new();
/// collection.add_singleton(Database { url: "postgres://localhost".to_string() });
/// collection.add_transient_factory::<UserService, _>(|resolver| {
///     Ok(UserService { db: resolver.get::<Database>()? })
/// });
///
/// let provider = collection.build();
/// let user_service = provider.get_required::<UserService>();
/// assert_eq!(user_service.db.url, "postgres://localhost");
/// ```
#[derive(Clone)]
pub struct ServiceProvider {
    inner: Arc<ProviderInner>,
}

pub(crate) struct ProviderInner {
    registry: Registry,
    options: ContainerOptions,
    observers: Observers,
    state: Mutex<ContainerState>,
}

/// Everything a resolution mutates.
struct ContainerState {
    cache: InstanceCache,
    scanner: Scanner,
}

impl ServiceProvider {
    pub(crate) fn new(registry: Registry, options: ContainerOptions, observers: Observers) -> Self {
        tracing::debug!(
            registrations = registry.len(),
            max_depth = options.max_depth,
            selection = ?options.constructor_selection,
            "service provider built"
        );
        Self {
            inner: Arc::new(ProviderInner {
                registry,
                options,
                observers,
                state: Mutex::new(ContainerState {
                    cache: InstanceCache::new(),
                    scanner: Scanner::new(),
                }),
            }),
        }
    }

    #[inline]
    pub(crate) fn inner(&self) -> &ProviderInner {
        &self.inner
    }

    /// Options the provider was built with.
    pub fn options(&self) -> &ContainerOptions {
        &self.inner().options
    }

    /// Whether a singleton for contract `T` has been created and cached.
    pub fn is_resolved<T: ?Sized + 'static>(&self) -> bool {
        self.inner().state.lock().cache.contains(&Key::of::<T>())
    }

    /// Number of cached singletons.
    pub fn singleton_count(&self) -> usize {
        self.inner().state.lock().cache.len()
    }

    /// Metadata the container uses for implementation type `I`.
    ///
    /// Shares the memoized descriptor when `I` has already been scanned.
    pub fn type_descriptor<I: Injectable>(&self) -> Arc<TypeDescriptor> {
        self.inner()
            .state
            .lock()
            .scanner
            .describe(std::any::TypeId::of::<I>(), describe_type::<I>)
    }

    /// Describes every registration, in registration order.
    pub fn get_service_descriptors(&self) -> Vec<ServiceDescriptor> {
        self.inner().registry.iter().map(ServiceDescriptor::from_registration).collect()
    }

    fn resolve_root(&self, key: Key) -> DiResult<AnyArc> {
        let inner = self.inner();
        let observed = inner.observers.has_observers();
        let start = observed.then(Instant::now);
        if observed {
            inner.observers.resolving(&key);
        }

        let span = tracing::debug_span!("resolve", contract = key.display_name());
        let result = span.in_scope(|| self.resolve_locked(key));

        if let Some(start) = start {
            match &result {
                Ok(_) => inner.observers.resolved(&key, start.elapsed()),
                Err(err) => inner.observers.resolution_failed(&key, err),
            }
        }
        result
    }

    fn resolve_locked(&self, key: Key) -> DiResult<AnyArc> {
        let inner = self.inner();
        let mut state = inner.state.lock();
        let ContainerState { cache, scanner } = &mut *state;

        if let Some(service) = cache.get(&key) {
            return Ok(service);
        }

        let (result, created) = {
            let mut walk = Walk::new(&inner.registry, &inner.options, cache, scanner);
            let result = walk.resolve(key);
            let created = if result.is_ok() { walk.into_created() } else { Vec::new() };
            (result, created)
        };

        match result {
            Ok(service) => {
                if !created.is_empty() {
                    tracing::debug!(singletons = created.len(), "caching singletons");
                }
                for (contract, singleton) in created {
                    cache.put(contract, singleton);
                }
                Ok(service)
            }
            Err(err) => {
                tracing::debug!(error = %err, "resolution failed; request discarded");
                Err(err.with_chain(vec![key.display_name()]))
            }
        }
    }
}

impl ResolverCore for ServiceProvider {
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        self.resolve_root(*key)
    }
}

impl std::fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("registrations", &self.inner().registry.len())
            .field("options", &self.inner().options)
            .finish()
    }
}
