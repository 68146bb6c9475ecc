//! Contract keys for the dependency injection container.

use std::any::TypeId;
use std::fmt;

/// Key identifying a contract type in the container.
///
/// A contract is whatever callers ask the container for: usually a trait
/// object such as `dyn Logger`, sometimes a concrete type that is registered
/// against itself. Both are `'static`, so both have a `TypeId`, which is the
/// only thing compared and hashed. The type name is carried along for
/// diagnostics and error chains.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{Key, key_of};
///
/// trait Logger: Send + Sync {}
///
/// let a = key_of::<dyn Logger>();
/// let b = Key::of::<dyn Logger>();
/// assert_eq!(a, b);
/// assert!(a.display_name().contains("Logger"));
/// assert_ne!(a, key_of::<String>());
/// ```
#[derive(Clone, Copy)]
pub struct Key {
    id: TypeId,
    name: &'static str,
}

impl Key {
    /// Creates the key for contract type `T`.
    #[inline(always)]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Key {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The `TypeId` of the contract.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Get the contract type name for display
    ///
    /// This is the `std::any::type_name` result, so it is meant for humans,
    /// not for comparisons.
    pub fn display_name(&self) -> &'static str {
        self.name
    }
}

// TypeId-only comparison; the name is diagnostic
impl PartialEq for Key {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Key {}

impl std::hash::Hash for Key {
    #[inline(always)]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.name)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Helper for creating contract keys.
#[inline(always)]
pub fn key_of<T: ?Sized + 'static>() -> Key {
    Key::of::<T>()
}
