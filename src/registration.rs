//! Service registration types.

use std::any::{Any, TypeId};
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::metadata::TypeDescriptor;

// ResolverContext is defined in provider module
pub(crate) use crate::provider::ResolverContext;

#[cfg(feature = "ahash")]
pub(crate) type FastMap<K, V> = ahash::AHashMap<K, V>;
#[cfg(not(feature = "ahash"))]
pub(crate) type FastMap<K, V> = std::collections::HashMap<K, V>;

// Type-erased Arc for storage. Services are stored as `Arc<Arc<C>>` so that
// unsized contracts (`dyn Trait`) go through the same path as concrete types.
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

pub(crate) type FactoryFn =
    Arc<dyn for<'a> Fn(&ResolverContext<'a>) -> DiResult<AnyArc> + Send + Sync>;

/// Turns a freshly built `Arc<I>` (erased) into the contract's stored form.
pub(crate) type CastFn = Arc<dyn Fn(AnyArc) -> DiResult<AnyArc> + Send + Sync>;

/// Wraps a contract service for storage.
#[inline]
pub(crate) fn erase_service<C: ?Sized + Send + Sync + 'static>(service: Arc<C>) -> AnyArc {
    Arc::new(service)
}

/// Recovers the contract service from storage.
#[inline]
pub(crate) fn downcast_service<C: ?Sized + Send + Sync + 'static>(any: &AnyArc) -> DiResult<Arc<C>> {
    any.downcast_ref::<Arc<C>>()
        .cloned()
        .ok_or(DiError::TypeMismatch(std::any::type_name::<C>()))
}

/// What a contract is bound to.
pub(crate) enum Binding {
    /// A pre-built instance; never participates in cycles
    Instance(AnyArc),
    /// A closure that builds the service, resolving through a `ResolverContext`
    Factory(FactoryFn),
    /// A scanned implementation type, built by constructor then autowired
    Component {
        impl_id: TypeId,
        impl_name: &'static str,
        describe: fn() -> TypeDescriptor,
        cast: CastFn,
    },
}

/// Kind of binding, for descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// Registered with a ready instance
    Instance,
    /// Registered with a factory closure
    Factory,
    /// Registered with an [`Injectable`](crate::Injectable) implementation type
    Component,
}

/// Service registration with lifetime and binding
pub(crate) struct Registration {
    pub(crate) contract: Key,
    pub(crate) lifetime: Lifetime,
    pub(crate) binding: Binding,
}

impl Registration {
    pub(crate) fn new(contract: Key, lifetime: Lifetime, binding: Binding) -> Self {
        Self { contract, lifetime, binding }
    }

    pub(crate) fn kind(&self) -> BindingKind {
        match self.binding {
            Binding::Instance(_) => BindingKind::Instance,
            Binding::Factory(_) => BindingKind::Factory,
            Binding::Component { .. } => BindingKind::Component,
        }
    }

    pub(crate) fn impl_name(&self) -> Option<&'static str> {
        match self.binding {
            Binding::Component { impl_name, .. } => Some(impl_name),
            _ => None,
        }
    }
}

/// Registration table: one binding per contract, last registration wins.
///
/// Registration order is preserved for introspection; replacing a contract
/// keeps its original position.
pub(crate) struct Registry {
    entries: Vec<Registration>,
    index: FastMap<Key, usize>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: FastMap::default(),
        }
    }

    /// Inserts a registration, overwriting any prior one for the same contract
    pub(crate) fn insert(&mut self, registration: Registration) {
        let key = registration.contract;
        if let Some(&pos) = self.index.get(&key) {
            self.entries[pos] = registration;
        } else {
            self.index.insert(key, self.entries.len());
            self.entries.push(registration);
        }
    }

    #[inline]
    pub(crate) fn get(&self, key: &Key) -> Option<&Registration> {
        self.index.get(key).map(|&pos| &self.entries[pos])
    }

    /// Like [`get`](Self::get), failing with `NotFound` when absent.
    pub(crate) fn lookup(&self, key: &Key) -> DiResult<&Registration> {
        self.get(key).ok_or(DiError::NotFound(key.display_name()))
    }

    #[inline]
    pub(crate) fn contains_key(&self, key: &Key) -> bool {
        self.index.contains_key(key)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Registration> {
        self.entries.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key_of;

    fn instance<T: Send + Sync + 'static>(value: T) -> Registration {
        Registration::new(
            key_of::<T>(),
            Lifetime::Singleton,
            Binding::Instance(erase_service(Arc::new(value))),
        )
    }

    #[test]
    fn last_registration_wins_in_place() {
        let mut registry = Registry::new();
        registry.insert(instance(1u32));
        registry.insert(instance("a"));
        registry.insert(instance(2u32));

        assert_eq!(registry.len(), 2);
        let first = registry.iter().next().map(|r| r.contract);
        assert_eq!(first, Some(key_of::<u32>()));

        let reg = registry.lookup(&key_of::<u32>()).expect("registered");
        match &reg.binding {
            Binding::Instance(any) => assert_eq!(*downcast_service::<u32>(any).unwrap(), 2),
            _ => panic!("expected instance binding"),
        }
    }

    #[test]
    fn lookup_missing_is_not_found() {
        let registry = Registry::new();
        assert!(!registry.contains_key(&key_of::<u8>()));
        match registry.lookup(&key_of::<u8>()) {
            Err(DiError::NotFound(name)) => assert_eq!(name, "u8"),
            _ => panic!("expected NotFound"),
        }
    }

    #[test]
    fn downcast_rejects_wrong_contract() {
        let any = erase_service(Arc::new(5i64));
        assert!(matches!(downcast_service::<u64>(&any), Err(DiError::TypeMismatch("u64"))));
    }
}
