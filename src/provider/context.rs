//! Resolver context for factory functions.

use std::cell::RefCell;

use crate::error::DiResult;
use crate::key::Key;
use crate::registration::AnyArc;
use crate::traits::ResolverCore;

/// Continues an in-flight resolution from inside a factory.
pub(crate) trait EdgeResolver {
    fn resolve_edge(&mut self, key: Key) -> DiResult<AnyArc>;
}

/// Context passed to factory functions for resolving dependencies.
///
/// Anything a factory resolves through its context belongs to the same
/// request as the factory itself: it is checked for cycles, it sees the
/// singletons the request has already built, and it is discarded if the
/// request fails. Each such dependency counts as a constructor edge.
///
/// Do not call the [`ServiceProvider`](crate::ServiceProvider) directly from a
/// factory; the provider is locked for the duration of the request.
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
/// let mut services = ServiceCollection::new();
/// services.add_singleton(Database {
///     url: "postgres://localhost".to_string()
/// });
/// services.add_transient_factory::<UserService, _>(|resolver| {
///     Ok(UserService {
///         db: resolver.get::<Database>()?,
///     })
/// });
///
/// let provider = services.build();
/// assert_eq!(provider.get_required::<UserService>().db.url, "postgres://localhost");
/// ```
pub struct ResolverContext<'a> {
    walk: RefCell<&'a mut (dyn EdgeResolver + 'a)>,
}

impl<'a> ResolverContext<'a> {
    pub(crate) fn new(walk: &'a mut (dyn EdgeResolver + 'a)) -> Self {
        Self { walk: RefCell::new(walk) }
    }
}

impl ResolverCore for ResolverContext<'_> {
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        self.walk.borrow_mut().resolve_edge(*key)
    }
}
