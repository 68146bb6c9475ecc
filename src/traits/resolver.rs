//! Resolver traits for service resolution.

use std::any::Any;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::registration::downcast_service;

/// Core resolver trait for object-safe service resolution.
///
/// Implemented by [`ServiceProvider`](crate::ServiceProvider), which starts a
/// new top-level resolution per call, and by
/// [`ResolverContext`](crate::ResolverContext), which continues the resolution
/// a factory is running in. Most users want the generic [`Resolver`] methods.
pub trait ResolverCore {
    /// Resolves a contract to its type-erased service.
    ///
    /// The returned value holds an `Arc<C>` for the contract `C` behind the
    /// `Any`; [`Resolver::get`] performs the downcast.
    fn resolve_any(&self, key: &Key) -> DiResult<Arc<dyn Any + Send + Sync>>;
}

/// High-level resolver interface with generic methods for type-safe service resolution.
///
/// Blanket-implemented for every [`ResolverCore`], so the provider and the
/// factory context expose the same API.
///
/// # Examples
///
/// ```
/// use ferrous_wire::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// trait Logger: Send + Sync {
///     fn log(&self, msg: &str);
/// }
///
/// struct ConsoleLogger;
/// impl Logger for ConsoleLogger {
///     fn log(&self, msg: &str) {
///         println!("LOG: {}", msg);
///     }
/// }
///
/// let mut collection = ServiceCollection::new();
/// collection.add_singleton(42usize);
/// collection.add_singleton_arc::<dyn Logger>(Arc::new(ConsoleLogger));
///
/// let provider = collection.build();
///
/// let number = provider.get_required::<usize>();
/// assert_eq!(*number, 42);
///
/// let logger = provider.get_required::<dyn Logger>();
/// logger.log("Service resolved successfully");
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves the service registered for contract `T`.
    ///
    /// `T` may be a concrete type or a trait object.
    fn get<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        let any = self.resolve_any(&Key::of::<T>())?;
        downcast_service::<T>(&any)
    }

    /// Resolves `T`, returning `Ok(None)` when nothing is registered for it.
    ///
    /// Only a missing registration for `T` itself maps to `None`; a missing
    /// dependency deeper in the graph is still an error.
    fn try_get<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Option<Arc<T>>> {
        match self.get::<T>() {
            Ok(service) => Ok(Some(service)),
            Err(err) => match (err.root_cause(), err.chain()) {
                (DiError::NotFound(name), chain)
                    if *name == std::any::type_name::<T>()
                        && chain.last().map_or(true, |last| last == name) =>
                {
                    Ok(None)
                }
                _ => Err(err),
            },
        }
    }

    /// Resolves `T` or panics with the resolution error.
    fn get_required<T: ?Sized + Send + Sync + 'static>(&self) -> Arc<T> {
        self.get::<T>()
            .unwrap_or_else(|e| panic!("Failed to resolve {}: {}", std::any::type_name::<T>(), e))
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}
