//! Write-once cells backing autowired fields.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

/// A field that the container fills after construction.
///
/// Instances are shared behind `Arc` as soon as they are built, so autowired
/// members need interior mutability. `Autowired<T>` is written exactly once by
/// the container and read by the owning type afterwards. The field can stay
/// private: the owning type hands the container an accessor in
/// [`Injectable::describe`](crate::Injectable::describe).
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{Autowired, Injectable, TypeMetadata, ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// trait Clock: Send + Sync { fn now(&self) -> u64; }
/// struct FixedClock;
/// impl Clock for FixedClock { fn now(&self) -> u64 { 7 } }
///
/// #[derive(Default)]
/// struct Report { clock: Autowired<dyn Clock> }
///
/// impl Injectable for Report {
///     fn describe(meta: &mut TypeMetadata<Self>) {
///         meta.constructor(|()| Ok(Report::default()))
///             .autowire("clock", |r: &Report| &r.clock);
///     }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton_arc::<dyn Clock>(Arc::new(FixedClock));
/// services.add_singleton_component::<Report, Report, _>(|r| r);
///
/// let report = services.build().get_required::<Report>();
/// assert_eq!(report.clock.get().now(), 7);
/// ```
pub struct Autowired<T: ?Sized> {
    cell: OnceCell<Arc<T>>,
}

impl<T: ?Sized> Autowired<T> {
    /// Creates an empty member awaiting injection.
    pub const fn new() -> Self {
        Self { cell: OnceCell::new() }
    }

    /// Returns the injected value.
    ///
    /// # Panics
    ///
    /// Panics if read before the container finished wiring the owner. Owners
    /// obtained from a [`ServiceProvider`](crate::ServiceProvider) are always
    /// fully wired.
    pub fn get(&self) -> &Arc<T> {
        match self.cell.get() {
            Some(value) => value,
            None => panic!(
                "autowired member of type {} read before injection",
                std::any::type_name::<T>()
            ),
        }
    }

    /// Returns the injected value, or `None` while the owner is still being wired.
    pub fn try_get(&self) -> Option<&Arc<T>> {
        self.cell.get()
    }

    /// Whether the container has written this member.
    pub fn is_injected(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Writes the value. Fails with the rejected value if already written.
    pub(crate) fn inject(&self, value: Arc<T>) -> Result<(), Arc<T>> {
        self.cell.set(value)
    }
}

impl<T: ?Sized> Default for Autowired<T> {
    fn default() -> Self {
        Self::new()
    }
}

// Value omitted: owners in a cycle would print each other forever.
impl<T: ?Sized> fmt::Debug for Autowired<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Autowired")
            .field("type", &std::any::type_name::<T>())
            .field("injected", &self.is_injected())
            .finish()
    }
}
