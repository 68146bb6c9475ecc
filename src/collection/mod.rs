//! Service collection module for dependency injection.
//!
//! This module contains the ServiceCollection type, which fills the
//! registration table and builds a [`ServiceProvider`] from it.

use std::any::TypeId;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::metadata::{describe_type, Injectable};
use crate::observer::{DiObserver, Observers};
use crate::options::ContainerOptions;
use crate::provider::{ResolverContext, ServiceProvider};
use crate::registration::{erase_service, AnyArc, Binding, CastFn, FactoryFn, Registration, Registry};
use crate::validation::{self, ValidationReport};
use crate::ServiceDescriptor;

pub mod module_system;
pub use module_system::*;

/// Registration table under construction.
///
/// Each contract has at most one binding; registering a contract again
/// replaces the earlier binding. Calling [`build`](Self::build) consumes the
/// collection, so nothing can be registered once resolution has started.
pub struct ServiceCollection {
    registry: Registry,
    observers: Observers,
    options: ContainerOptions,
}

impl ServiceCollection {
    /// Creates a new empty service collection.
    pub fn new() -> Self {
        Self::with_options(ContainerOptions::default())
    }

    /// Creates an empty collection whose provider will use `options`.
    pub fn with_options(options: ContainerOptions) -> Self {
        Self {
            registry: Registry::new(),
            observers: Observers::new(),
            options,
        }
    }

    pub fn options(&self) -> &ContainerOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut ContainerOptions {
        &mut self.options
    }

    // ----- Instances -----

    /// Registers a ready-made singleton under its own type.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use ferrous_wire::{ServiceCollection, Resolver};
    /// struct Config {
    ///     database_url: String
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton(Config {
    ///     database_url: "postgres://localhost".to_string()
    /// });
    /// let provider = services.build();
    /// assert_eq!(provider.get_required::<Config>().database_url, "postgres://localhost");
    /// ```
    pub fn add_singleton<T: Send + Sync + 'static>(&mut self, value: T) -> &mut Self {
        self.add_singleton_arc::<T>(Arc::new(value))
    }

    /// Registers a ready-made singleton under contract `C`, which may be a trait object.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use ferrous_wire::{ServiceCollection, Resolver};
    /// # use std::sync::Arc;
    /// trait Clock: Send + Sync { fn now(&self) -> u64; }
    /// struct Fixed;
    /// impl Clock for Fixed { fn now(&self) -> u64 { 7 } }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton_arc::<dyn Clock>(Arc::new(Fixed));
    /// let provider = services.build();
    /// assert_eq!(provider.get_required::<dyn Clock>().now(), 7);
    /// ```
    pub fn add_singleton_arc<C: ?Sized + Send + Sync + 'static>(&mut self, value: Arc<C>) -> &mut Self {
        self.insert(Key::of::<C>(), Lifetime::Singleton, Binding::Instance(erase_service(value)))
    }

    // ----- Factories -----

    /// Registers a singleton built by `factory` on first request.
    ///
    /// The factory resolves its dependencies through the [`ResolverContext`]
    /// it receives; those count as constructor edges.
    pub fn add_singleton_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.add_factory(Lifetime::Singleton, factory)
    }

    /// Registers a transient built by `factory` on every request.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use ferrous_wire::{ServiceCollection, Resolver};
    /// # use std::sync::Arc;
    /// let mut services = ServiceCollection::new();
    /// services.add_transient_factory::<Vec<u8>, _>(|_| Ok(Vec::with_capacity(16)));
    ///
    /// let provider = services.build();
    /// let a = provider.get_required::<Vec<u8>>();
    /// let b = provider.get_required::<Vec<u8>>();
    /// assert!(!Arc::ptr_eq(&a, &b));
    /// ```
    pub fn add_transient_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.add_factory(Lifetime::Transient, factory)
    }

    /// Registers a factory with an explicit lifetime.
    pub fn add_factory<T, F>(&mut self, lifetime: Lifetime, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        let factory: FactoryFn = Arc::new(move |ctx: &ResolverContext<'_>| -> DiResult<AnyArc> {
            factory(ctx).map(|value| erase_service(Arc::new(value)))
        });
        self.insert(Key::of::<T>(), lifetime, Binding::Factory(factory))
    }

    /// Registers a singleton factory for a trait-object contract.
    pub fn add_singleton_trait_factory<C, F>(&mut self, factory: F) -> &mut Self
    where
        C: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<Arc<C>> + Send + Sync + 'static,
    {
        self.add_trait_factory(Lifetime::Singleton, factory)
    }

    /// Registers a transient factory for a trait-object contract.
    pub fn add_transient_trait_factory<C, F>(&mut self, factory: F) -> &mut Self
    where
        C: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<Arc<C>> + Send + Sync + 'static,
    {
        self.add_trait_factory(Lifetime::Transient, factory)
    }

    /// Registers a trait-object factory with an explicit lifetime.
    pub fn add_trait_factory<C, F>(&mut self, lifetime: Lifetime, factory: F) -> &mut Self
    where
        C: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<Arc<C>> + Send + Sync + 'static,
    {
        let factory: FactoryFn = Arc::new(move |ctx: &ResolverContext<'_>| -> DiResult<AnyArc> {
            factory(ctx).map(erase_service)
        });
        self.insert(Key::of::<C>(), lifetime, Binding::Factory(factory))
    }

    // ----- Scanned components -----

    /// Binds contract `C` to implementation `I` as a singleton.
    ///
    /// `I` is built through its declared constructor and then autowired. The
    /// `cast` closure upcasts the implementation to the contract; for a trait
    /// object it is simply `|i| i`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ferrous_wire::{Autowired, Injectable, Resolver, ServiceCollection, TypeMetadata};
    /// use std::sync::Arc;
    ///
    /// trait Greeter: Send + Sync { fn greet(&self) -> String; }
    /// trait Names: Send + Sync { fn name(&self) -> String; }
    ///
    /// struct World;
    /// impl Names for World { fn name(&self) -> String { "world".into() } }
    ///
    /// struct Polite { names: Autowired<dyn Names> }
    ///
    /// impl Greeter for Polite {
    ///     fn greet(&self) -> String { format!("hello, {}", self.names.get().name()) }
    /// }
    ///
    /// impl Injectable for Polite {
    ///     fn describe(meta: &mut TypeMetadata<Self>) {
    ///         meta.constructor(|()| Ok(Polite { names: Autowired::new() }))
    ///             .autowire("names", |p: &Polite| &p.names);
    ///     }
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton_arc::<dyn Names>(Arc::new(World));
    /// services.add_singleton_component::<dyn Greeter, Polite, _>(|p| p);
    ///
    /// let provider = services.build();
    /// assert_eq!(provider.get_required::<dyn Greeter>().greet(), "hello, world");
    /// ```
    pub fn add_singleton_component<C, I, F>(&mut self, cast: F) -> &mut Self
    where
        C: ?Sized + Send + Sync + 'static,
        I: Injectable,
        F: Fn(Arc<I>) -> Arc<C> + Send + Sync + 'static,
    {
        self.add_component(Lifetime::Singleton, cast)
    }

    /// Binds contract `C` to implementation `I` as a transient.
    pub fn add_transient_component<C, I, F>(&mut self, cast: F) -> &mut Self
    where
        C: ?Sized + Send + Sync + 'static,
        I: Injectable,
        F: Fn(Arc<I>) -> Arc<C> + Send + Sync + 'static,
    {
        self.add_component(Lifetime::Transient, cast)
    }

    /// Registers `I` as a singleton under its own type.
    pub fn add_singleton_type<I: Injectable>(&mut self) -> &mut Self {
        self.add_component::<I, I, _>(Lifetime::Singleton, |i| i)
    }

    /// Registers `I` as a transient under its own type.
    pub fn add_transient_type<I: Injectable>(&mut self) -> &mut Self {
        self.add_component::<I, I, _>(Lifetime::Transient, |i| i)
    }

    /// Binds contract `C` to implementation `I` with an explicit lifetime.
    pub fn add_component<C, I, F>(&mut self, lifetime: Lifetime, cast: F) -> &mut Self
    where
        C: ?Sized + Send + Sync + 'static,
        I: Injectable,
        F: Fn(Arc<I>) -> Arc<C> + Send + Sync + 'static,
    {
        let cast: CastFn = Arc::new(move |instance: AnyArc| -> DiResult<AnyArc> {
            let concrete = instance
                .downcast::<I>()
                .map_err(|_| DiError::TypeMismatch(std::any::type_name::<I>()))?;
            Ok(erase_service(cast(concrete)))
        });
        self.insert(
            Key::of::<C>(),
            lifetime,
            Binding::Component {
                impl_id: TypeId::of::<I>(),
                impl_name: std::any::type_name::<I>(),
                describe: describe_type::<I>,
                cast,
            },
        )
    }

    fn insert(&mut self, contract: Key, lifetime: Lifetime, binding: Binding) -> &mut Self {
        if self.registry.contains_key(&contract) {
            tracing::debug!(contract = contract.display_name(), "replacing registration");
        }
        self.registry.insert(Registration::new(contract, lifetime, binding));
        self
    }

    // ----- Introspection -----

    /// Whether contract `T` has a registration.
    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.registry.contains_key(&Key::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.len() == 0
    }

    /// Describes every registration, in registration order.
    pub fn get_service_descriptors(&self) -> Vec<ServiceDescriptor> {
        self.registry.iter().map(ServiceDescriptor::from_registration).collect()
    }

    /// Checks the configuration without building any service.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ferrous_wire::{Injectable, ServiceCollection, TypeMetadata};
    /// use std::sync::Arc;
    ///
    /// struct Needs(Arc<String>);
    ///
    /// impl Injectable for Needs {
    ///     fn describe(meta: &mut TypeMetadata<Self>) {
    ///         meta.constructor(|(s,): (Arc<String>,)| Ok(Needs(s)));
    ///     }
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton_type::<Needs>();
    ///
    /// let report = services.validate();
    /// assert!(!report.is_valid());
    /// ```
    pub fn validate(&self) -> ValidationReport {
        validation::validate(&self.registry, &self.options)
    }

    // ----- Diagnostics -----

    /// Adds an observer notified of every top-level resolution.
    pub fn add_observer(&mut self, observer: Arc<dyn DiObserver>) -> &mut Self {
        self.observers.add(observer);
        self
    }

    /// Freezes the registrations and builds the provider.
    pub fn build(self) -> ServiceProvider {
        ServiceProvider::new(self.registry, self.options, self.observers)
    }
}

impl Default for ServiceCollection {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BindingKind, Resolver};

    #[test]
    fn later_registration_replaces_earlier() {
        let mut services = ServiceCollection::new();
        services.add_singleton(1u32);
        services.add_transient_factory::<u32, _>(|_| Ok(2));

        assert_eq!(services.len(), 1);
        let descriptor = &services.get_service_descriptors()[0];
        assert_eq!(descriptor.kind, BindingKind::Factory);
        assert_eq!(descriptor.lifetime, Lifetime::Transient);

        let provider = services.build();
        assert_eq!(*provider.get_required::<u32>(), 2);
    }

    #[test]
    fn factory_error_surfaces_with_chain() {
        let mut services = ServiceCollection::new();
        services.add_singleton_factory::<String, _>(|_| Err(DiError::factory::<String>("offline")));
        let provider = services.build();

        let err = provider.get::<String>().unwrap_err();
        assert!(matches!(err.root_cause(), DiError::Factory { message, .. } if message == "offline"));
        assert_eq!(err.chain(), &[std::any::type_name::<String>()]);
        assert!(!provider.is_resolved::<String>());
    }
}
