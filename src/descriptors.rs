//! Service descriptors for introspection and diagnostics.

use std::any::TypeId;

use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::registration::{Binding, BindingKind, Registration};

/// Service descriptor for introspection and diagnostics
///
/// A read-only view of one registration: which contract it binds, for how
/// long instances live, and what produces them.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{BindingKind, Lifetime, ServiceCollection};
/// use std::sync::Arc;
///
/// trait Logger: Send + Sync {}
/// struct ConsoleLogger;
/// impl Logger for ConsoleLogger {}
///
/// struct Settings { verbose: bool }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton(Settings { verbose: true });
/// services.add_singleton_arc::<dyn Logger>(Arc::new(ConsoleLogger));
/// services.add_transient_factory::<String, _>(|_| Ok(String::from("hi")));
///
/// let descriptors = services.get_service_descriptors();
/// assert_eq!(descriptors.len(), 3);
///
/// let settings = descriptors.iter().find(|d| d.type_name().contains("Settings")).unwrap();
/// assert_eq!(settings.lifetime, Lifetime::Singleton);
/// assert_eq!(settings.kind, BindingKind::Instance);
///
/// let transient = descriptors.iter().filter(|d| d.lifetime == Lifetime::Transient).count();
/// assert_eq!(transient, 1);
/// ```
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    /// The contract key
    pub key: Key,
    /// Service lifetime
    pub lifetime: Lifetime,
    /// What the contract is bound to
    pub kind: BindingKind,
    /// Implementation type ID, for component bindings
    pub impl_type_id: Option<TypeId>,
    /// Implementation type name, for component bindings
    pub impl_type_name: Option<&'static str>,
}

impl ServiceDescriptor {
    pub(crate) fn from_registration(registration: &Registration) -> Self {
        let impl_type_id = match &registration.binding {
            Binding::Component { impl_id, .. } => Some(*impl_id),
            _ => None,
        };
        Self {
            key: registration.contract,
            lifetime: registration.lifetime,
            kind: registration.kind(),
            impl_type_id,
            impl_type_name: registration.impl_name(),
        }
    }

    /// Get the contract type name
    ///
    /// This is the `std::any::type_name` of the contract, e.g. `dyn app::Logger`.
    pub fn type_name(&self) -> &'static str {
        self.key.display_name()
    }

    /// Whether the binding is a scanned implementation type.
    pub fn is_component(&self) -> bool {
        self.kind == BindingKind::Component
    }
}
