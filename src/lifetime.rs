//! Service lifetime definitions.

/// Service lifetimes controlling instance caching behavior
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct RequestModel { id: u32 }
///
/// let mut services = ServiceCollection::new();
///
/// // Singleton: one instance for the container's lifetime
/// services.add_singleton(Database { url: "postgres://localhost".to_string() });
///
/// // Transient: new instance every time
/// services.add_transient_factory::<RequestModel, _>(|_| Ok(RequestModel { id: 12345 }));
///
/// let provider = services.build();
///
/// let db1 = provider.get_required::<Database>();
/// let db2 = provider.get_required::<Database>();
/// assert!(Arc::ptr_eq(&db1, &db2));
///
/// let model1 = provider.get_required::<RequestModel>();
/// let model2 = provider.get_required::<RequestModel>();
/// assert!(!Arc::ptr_eq(&model1, &model2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// Single instance per container, constructed and wired exactly once
    ///
    /// Singleton instances are promoted to the instance cache only after the
    /// request that created them finished wiring every autowired member.
    Singleton,
    /// New instance per resolution, never cached
    ///
    /// Within one resolution request a transient that is still being built is
    /// handed to its cycle partners; otherwise every request builds a new one.
    Transient,
}

impl Lifetime {
    /// Whether instances with this lifetime go into the instance cache.
    #[inline]
    pub fn is_cached(self) -> bool {
        matches!(self, Lifetime::Singleton)
    }
}
