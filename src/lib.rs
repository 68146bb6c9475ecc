//! # ferrous-wire
//!
//! Constructor and field injection for Rust, with cycles broken by deferring
//! field injection until every constructor in the cycle has run.
//!
//! ## Features
//!
//! - **Typed contracts**: services are requested by type, usually `dyn Trait`
//! - **Two-phase construction**: constructors first, then [`Autowired`] members
//! - **Cycle handling**: cycles through autowired members resolve; cycles made only of constructor parameters fail with the full path
//! - **No poisoning**: a failed request caches nothing
//! - **Thread-safe**: one container lock per top-level request
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_wire::{Injectable, Resolver, ServiceCollection, TypeMetadata};
//! use std::sync::Arc;
//!
//! struct Database {
//!     connection_string: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! impl Injectable for UserService {
//!     fn describe(meta: &mut TypeMetadata<Self>) {
//!         meta.constructor(|(db,): (Arc<Database>,)| Ok(UserService { db }));
//!     }
//! }
//!
//! let mut services = ServiceCollection::new();
//! services.add_singleton(Database {
//!     connection_string: "postgres://localhost".to_string(),
//! });
//! services.add_singleton_type::<UserService>();
//!
//! let provider = services.build();
//! let user_service = provider.get_required::<UserService>();
//! assert_eq!(user_service.db.connection_string, "postgres://localhost");
//! ```
//!
//! ## Circular references
//!
//! ```rust
//! use ferrous_wire::{Autowired, Injectable, Resolver, ServiceCollection, TypeMetadata};
//! use std::sync::Arc;
//!
//! trait Parent: Send + Sync { fn child(&self) -> Arc<dyn Child>; }
//! trait Child: Send + Sync { fn parent(&self) -> Arc<dyn Parent>; }
//!
//! struct P { child: Arc<dyn Child> }
//! struct C { parent: Autowired<dyn Parent> }
//!
//! impl Parent for P { fn child(&self) -> Arc<dyn Child> { self.child.clone() } }
//! impl Child for C { fn parent(&self) -> Arc<dyn Parent> { self.parent.get().clone() } }
//!
//! impl Injectable for P {
//!     fn describe(meta: &mut TypeMetadata<Self>) {
//!         meta.constructor(|(child,): (Arc<dyn Child>,)| Ok(P { child }));
//!     }
//! }
//!
//! impl Injectable for C {
//!     fn describe(meta: &mut TypeMetadata<Self>) {
//!         meta.constructor(|()| Ok(C { parent: Autowired::new() }))
//!             .autowire("parent", |c: &C| &c.parent);
//!     }
//! }
//!
//! let mut services = ServiceCollection::new();
//! services.add_singleton_component::<dyn Parent, P, _>(|p| p);
//! services.add_singleton_component::<dyn Child, C, _>(|c| c);
//!
//! let provider = services.build();
//! let parent = provider.get_required::<dyn Parent>();
//! assert!(Arc::ptr_eq(&parent.child().parent(), &parent));
//! ```
//!
//! ## Service Lifetimes
//!
//! - **Singleton**: Created once and shared for the life of the provider
//! - **Transient**: Created fresh on every resolution

pub mod autowired;
pub mod collection;
pub mod descriptors;
pub mod error;
pub mod key;
pub mod lifetime;
pub mod metadata;
pub mod observer;
pub mod options;
pub mod provider;
pub mod traits;
pub mod validation;

mod cache;
mod registration;

pub use autowired::Autowired;
pub use collection::{ServiceCollection, ServiceCollectionExt, ServiceModule};
pub use descriptors::ServiceDescriptor;
pub use error::{DiError, DiResult};
pub use key::{key_of, Key};
pub use lifetime::Lifetime;
pub use metadata::{
    ConstructorArgs, ConstructorDescriptor, Injectable, InjectableMember, MemberKind, TypeDescriptor,
    TypeMetadata,
};
pub use observer::{DiObserver, MetricsObserver, TracingObserver};
pub use options::{ConstructorSelection, ContainerOptions};
pub use provider::{ResolverContext, ServiceProvider};
pub use registration::BindingKind;
pub use traits::{Resolver, ResolverCore};
pub use validation::{ValidationError, ValidationReport, ValidationWarning};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct English;

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".into()
        }
    }

    impl Injectable for English {
        fn describe(meta: &mut TypeMetadata<Self>) {
            meta.constructor(|()| Ok(English));
        }
    }

    #[test]
    fn singleton_component_is_shared() {
        let mut services = ServiceCollection::new();
        services.add_singleton_component::<dyn Greeter, English, _>(|e| e);
        let provider = services.build();

        let a = provider.get_required::<dyn Greeter>();
        let b = provider.get_required::<dyn Greeter>();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.greet(), "hello");
        assert!(provider.is_resolved::<dyn Greeter>());
        assert_eq!(provider.singleton_count(), 1);
    }

    #[test]
    fn transient_component_is_fresh() {
        let mut services = ServiceCollection::new();
        services.add_transient_component::<dyn Greeter, English, _>(|e| e);
        let provider = services.build();

        let a = provider.get_required::<dyn Greeter>();
        let b = provider.get_required::<dyn Greeter>();
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(!provider.is_resolved::<dyn Greeter>());
    }

    #[test]
    fn try_get_maps_missing_root_to_none() {
        let provider = ServiceCollection::new().build();
        assert!(provider.try_get::<dyn Greeter>().unwrap().is_none());
    }

    #[test]
    fn scanned_metadata_is_memoized_per_provider() {
        let provider = ServiceCollection::new().build();
        let first = provider.type_descriptor::<English>();
        let second = provider.type_descriptor::<English>();
        assert!(Arc::ptr_eq(&first, &second));

        let other = ServiceCollection::new().build();
        assert!(!Arc::ptr_eq(&first, &other.type_descriptor::<English>()));
    }
}
