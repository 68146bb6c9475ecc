//! Graph resolution for a single top-level request.
//!
//! Every component is built in two phases. The constructor runs first, with
//! each parameter resolved recursively. The finished instance is then exposed
//! as a shell under its contract, and only after that are its autowired members
//! resolved and written. A member edge that points back at something still
//! being built either receives that shell, or, when the target has not reached
//! its shell yet, is queued and written the moment the shell exists. The same
//! holds when a member leads through constructor edges back to something still
//! waiting for its constructor: the member is queued behind that contract and
//! resolved once its shell exists. A cycle made only of constructor edges can
//! never produce a shell and fails.
//!
//! Singletons built by a request are handed back to the provider, which caches
//! them only if the whole request succeeded.

use std::sync::Arc;

use crate::cache::InstanceCache;
use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::metadata::{Scanner, TypeDescriptor};
use crate::options::ContainerOptions;
use crate::provider::context::{EdgeResolver, ResolverContext};
use crate::registration::{AnyArc, Binding, CastFn, FastMap, Registry};

/// A member injection waiting for a shell.
///
/// `awaiting` is either the member's own contract or the contract whose
/// constructor the member's dependency chain runs back into.
struct PendingInjection {
    awaiting: Key,
    owner: Arc<TypeDescriptor>,
    member: usize,
    instance: AnyArc,
}

/// Bookkeeping lengths to roll back to when an edge fails.
#[derive(Clone, Copy)]
struct Checkpoint {
    stack: usize,
    created: usize,
    pending: usize,
    shells: usize,
}

/// State of one top-level resolution.
pub(crate) struct Walk<'r> {
    registry: &'r Registry,
    options: &'r ContainerOptions,
    cache: &'r InstanceCache,
    scanner: &'r mut Scanner,
    stack: Vec<Key>,
    shells: FastMap<Key, AnyArc>,
    shell_log: Vec<Key>,
    pending: Vec<PendingInjection>,
    created: Vec<(Key, AnyArc)>,
    cycle_closer: Option<Key>,
}

impl<'r> Walk<'r> {
    pub(crate) fn new(
        registry: &'r Registry,
        options: &'r ContainerOptions,
        cache: &'r InstanceCache,
        scanner: &'r mut Scanner,
    ) -> Self {
        Self {
            registry,
            options,
            cache,
            scanner,
            stack: Vec::new(),
            shells: FastMap::default(),
            shell_log: Vec::new(),
            pending: Vec::new(),
            created: Vec::new(),
            cycle_closer: None,
        }
    }

    /// Singletons completed by this request, ready to be cached.
    pub(crate) fn into_created(self) -> Vec<(Key, AnyArc)> {
        debug_assert!(self.pending.is_empty(), "member injections left pending");
        debug_assert!(self.stack.is_empty());
        self.created
    }

    /// Resolves one edge of the graph.
    ///
    /// On failure the error carries the chain of contracts that was being
    /// built, and everything allocated below this edge is dropped.
    pub(crate) fn resolve(&mut self, key: Key) -> DiResult<AnyArc> {
        if let Some(service) = self.cache.get(&key) {
            return Ok(service);
        }
        if let Some(shell) = self.shells.get(&key) {
            tracing::trace!(contract = key.display_name(), "returning shell");
            return Ok(shell.clone());
        }
        if self.stack.contains(&key) {
            let mut path = self.chain();
            path.push(key.display_name());
            self.cycle_closer = Some(key);
            return Err(DiError::ConstructorCycle(path));
        }
        if self.stack.len() >= self.options.max_depth {
            return Err(DiError::DepthExceeded(self.options.max_depth));
        }

        let mark = self.checkpoint();
        match self.construct(key) {
            Ok(service) => Ok(service),
            Err(err) => {
                let err = err.with_chain(self.chain());
                self.rollback(mark);
                Err(err)
            }
        }
    }

    fn construct(&mut self, key: Key) -> DiResult<AnyArc> {
        self.stack.push(key);
        let registry = self.registry;
        let registration = registry.lookup(&key)?;

        let service = match &registration.binding {
            Binding::Instance(instance) => {
                self.stack.pop();
                return Ok(instance.clone());
            }
            Binding::Factory(factory) => {
                tracing::trace!(contract = key.display_name(), "invoking factory");
                let service = {
                    let context = ResolverContext::new(self);
                    factory(&context)?
                };
                self.allocate_shell(key, service.clone())?;
                service
            }
            Binding::Component { impl_id, impl_name, describe, cast } => {
                let descriptor = self.scanner.describe(*impl_id, *describe);
                self.build_component(key, *impl_name, descriptor, cast)?
            }
        };

        self.stack.pop();
        match registration.lifetime {
            Lifetime::Singleton => self.created.push((key, service.clone())),
            Lifetime::Transient => {
                self.shells.remove(&key);
            }
        }
        Ok(service)
    }

    fn build_component(
        &mut self,
        key: Key,
        impl_name: &'static str,
        descriptor: Arc<TypeDescriptor>,
        cast: &CastFn,
    ) -> DiResult<AnyArc> {
        let constructor = descriptor.select_constructor(self.options.constructor_selection)?;
        if let Some(member) = descriptor.first_non_writable() {
            return Err(DiError::NonWritableInjectionTarget {
                implementation: impl_name,
                member: member.name(),
            });
        }

        let mut args = Vec::with_capacity(constructor.arity());
        for parameter in constructor.parameters() {
            args.push(self.resolve(*parameter)?);
        }
        let instance = constructor.build(&args)?;
        tracing::trace!(
            contract = key.display_name(),
            implementation = impl_name,
            "constructed"
        );

        let shell = cast(instance.clone())?;
        self.allocate_shell(key, shell.clone())?;

        for index in 0..descriptor.members().len() {
            self.inject_member(&descriptor, index, &instance)?;
        }

        Ok(shell)
    }

    /// Resolves one autowired member and writes it, or queues it when its
    /// dependency chain runs into a constructor that has not finished.
    fn inject_member(&mut self, owner: &Arc<TypeDescriptor>, index: usize, instance: &AnyArc) -> DiResult<()> {
        let member = &owner.members()[index];
        let target = member.contract();
        if self.awaits_constructor(&target) {
            self.defer(target, owner, index, instance);
            return Ok(());
        }

        self.cycle_closer = None;
        match self.resolve(target) {
            Ok(value) => member.write(owner.type_name(), &**instance, value),
            Err(err) => match self.cycle_closer.take() {
                // resolve() already rolled the failed subtree back
                Some(closer) if closes_cycle(&err, &closer) && self.awaits_constructor(&closer) => {
                    self.defer(closer, owner, index, instance);
                    Ok(())
                }
                _ => Err(err),
            },
        }
    }

    /// In construction, with no shell yet.
    fn awaits_constructor(&self, key: &Key) -> bool {
        self.stack.contains(key) && !self.shells.contains_key(key)
    }

    fn defer(&mut self, awaiting: Key, owner: &Arc<TypeDescriptor>, index: usize, instance: &AnyArc) {
        tracing::trace!(
            implementation = owner.type_name(),
            member = owner.members()[index].name(),
            awaiting = awaiting.display_name(),
            "deferring member injection"
        );
        self.pending.push(PendingInjection {
            awaiting,
            owner: owner.clone(),
            member: index,
            instance: instance.clone(),
        });
    }

    /// Publishes `shell` for `key` and injects any member waiting on it.
    fn allocate_shell(&mut self, key: Key, shell: AnyArc) -> DiResult<()> {
        self.shells.insert(key, shell);
        self.shell_log.push(key);

        let mut index = 0;
        while index < self.pending.len() {
            if self.pending[index].awaiting != key {
                index += 1;
                continue;
            }
            let waiting = self.pending.remove(index);
            self.inject_member(&waiting.owner, waiting.member, &waiting.instance)?;
        }
        Ok(())
    }

    fn chain(&self) -> Vec<&'static str> {
        self.stack.iter().map(Key::display_name).collect()
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            stack: self.stack.len(),
            created: self.created.len(),
            pending: self.pending.len(),
            shells: self.shell_log.len(),
        }
    }

    fn rollback(&mut self, mark: Checkpoint) {
        self.stack.truncate(mark.stack);
        self.created.truncate(mark.created);
        self.pending.truncate(mark.pending);
        for key in self.shell_log.drain(mark.shells..) {
            self.shells.remove(&key);
        }
    }
}

fn closes_cycle(err: &DiError, closer: &Key) -> bool {
    match err.root_cause() {
        DiError::ConstructorCycle(path) => path.last() == Some(&closer.display_name()),
        _ => false,
    }
}

impl EdgeResolver for Walk<'_> {
    fn resolve_edge(&mut self, key: Key) -> DiResult<AnyArc> {
        self.resolve(key)
    }
}
