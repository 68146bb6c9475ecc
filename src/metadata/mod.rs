//! Type metadata for scanned implementations.
//!
//! An implementation type describes itself once through [`Injectable`]: which
//! constructors it offers and which members the container must fill after
//! construction. The container turns that description into a type-erased
//! [`TypeDescriptor`] and memoizes it per implementation type.
//!
//! Members are addressed through closures written in the implementation's own
//! module, so private fields and private setters are reachable without giving
//! up encapsulation to the rest of the program.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::autowired::Autowired;
use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::options::ConstructorSelection;
use crate::registration::{downcast_service, erase_service, AnyArc};

mod args;
mod scanner;

pub use args::{ConstructorArgs, ParameterKeys};
pub(crate) use scanner::Scanner;

type BuildFn = Arc<dyn Fn(&[AnyArc]) -> DiResult<AnyArc> + Send + Sync>;
type WriteFn = Arc<dyn Fn(&dyn Any, AnyArc) -> DiResult<()> + Send + Sync>;
type ReadFn = Arc<dyn Fn(&dyn Any) -> Option<AnyArc> + Send + Sync>;

/// An implementation type the container can construct and autowire.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{Autowired, Injectable, TypeMetadata};
/// use std::sync::Arc;
///
/// trait Repository: Send + Sync {}
/// trait Audit: Send + Sync {}
///
/// pub struct UserService {
///     repo: Arc<dyn Repository>,
///     audit: Autowired<dyn Audit>,
/// }
///
/// impl Injectable for UserService {
///     fn describe(meta: &mut TypeMetadata<Self>) {
///         meta.constructor(|(repo,): (Arc<dyn Repository>,)| {
///             Ok(UserService { repo, audit: Autowired::new() })
///         })
///         .autowire("audit", |s: &UserService| &s.audit);
///     }
/// }
/// ```
pub trait Injectable: Send + Sync + Sized + 'static {
    /// Declares constructors and autowired members.
    fn describe(meta: &mut TypeMetadata<Self>);
}

/// Whether an autowired member is a plain field or an accessor pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// An [`Autowired`] field
    Field,
    /// A setter (and optionally a getter) supplied by the type
    Property,
}

/// Typed builder handed to [`Injectable::describe`].
pub struct TypeMetadata<I> {
    constructors: Vec<ConstructorDescriptor>,
    members: Vec<InjectableMember>,
    _marker: std::marker::PhantomData<fn() -> I>,
}

impl<I: Injectable> TypeMetadata<I> {
    pub(crate) fn new() -> Self {
        Self {
            constructors: Vec::new(),
            members: Vec::new(),
            _marker: std::marker::PhantomData,
        }
    }

    /// Declares a constructor taking the tuple `A` of resolved contracts.
    ///
    /// A type may declare several; which one runs is decided by the
    /// container's [`ConstructorSelection`] policy.
    pub fn constructor<A, F>(&mut self, build: F) -> &mut Self
    where
        A: ConstructorArgs,
        F: Fn(A) -> DiResult<I> + Send + Sync + 'static,
    {
        let build: BuildFn = Arc::new(move |values: &[AnyArc]| {
            let args = A::from_resolved(values)?;
            let instance: AnyArc = Arc::new(build(args)?);
            Ok(instance)
        });
        self.constructors.push(ConstructorDescriptor {
            parameters: A::keys(),
            build,
        });
        self
    }

    /// Declares an [`Autowired`] field to be filled with contract `C`.
    pub fn autowire<C, F>(&mut self, name: &'static str, field: F) -> &mut Self
    where
        C: ?Sized + Send + Sync + 'static,
        F: for<'a> Fn(&'a I) -> &'a Autowired<C> + Send + Sync + 'static,
    {
        let field = Arc::new(field);
        let reader = field.clone();
        let write: WriteFn = Arc::new(move |owner: &dyn Any, value: AnyArc| {
            let owner = owner_of::<I>(owner)?;
            let value = downcast_service::<C>(&value)?;
            (*field)(owner).inject(value).map_err(|_| DiError::NonWritableInjectionTarget {
                implementation: std::any::type_name::<I>(),
                member: name,
            })
        });
        let read: ReadFn = Arc::new(move |owner: &dyn Any| {
            let owner = owner.downcast_ref::<I>()?;
            (*reader)(owner).try_get().cloned().map(erase_service)
        });
        self.push_member(name, Key::of::<C>(), MemberKind::Field, Some(write), Some(read))
    }

    /// Declares a property with a setter, typically private to the type.
    pub fn autowire_property<C, S>(&mut self, name: &'static str, setter: S) -> &mut Self
    where
        C: ?Sized + Send + Sync + 'static,
        S: Fn(&I, Arc<C>) + Send + Sync + 'static,
    {
        let write = property_writer::<I, C, S>(setter);
        self.push_member(name, Key::of::<C>(), MemberKind::Property, Some(write), None)
    }

    /// Declares a property with both a getter and a setter.
    pub fn autowire_property_with_getter<C, G, S>(
        &mut self,
        name: &'static str,
        getter: G,
        setter: S,
    ) -> &mut Self
    where
        C: ?Sized + Send + Sync + 'static,
        G: Fn(&I) -> Option<Arc<C>> + Send + Sync + 'static,
        S: Fn(&I, Arc<C>) + Send + Sync + 'static,
    {
        let write = property_writer::<I, C, S>(setter);
        let read = property_reader::<I, C, G>(getter);
        self.push_member(name, Key::of::<C>(), MemberKind::Property, Some(write), Some(read))
    }

    /// Declares an autowired property that can only be read.
    ///
    /// The declaration is accepted, but resolving the type fails with
    /// [`DiError::NonWritableInjectionTarget`].
    pub fn autowire_readonly<C, G>(&mut self, name: &'static str, getter: G) -> &mut Self
    where
        C: ?Sized + Send + Sync + 'static,
        G: Fn(&I) -> Option<Arc<C>> + Send + Sync + 'static,
    {
        let read = property_reader::<I, C, G>(getter);
        self.push_member(name, Key::of::<C>(), MemberKind::Property, None, Some(read))
    }

    fn push_member(
        &mut self,
        name: &'static str,
        contract: Key,
        kind: MemberKind,
        write: Option<WriteFn>,
        read: Option<ReadFn>,
    ) -> &mut Self {
        self.members.push(InjectableMember { name, contract, kind, write, read });
        self
    }

    pub(crate) fn into_descriptor(self) -> TypeDescriptor {
        TypeDescriptor {
            type_id: TypeId::of::<I>(),
            type_name: std::any::type_name::<I>(),
            constructors: self.constructors,
            members: self.members,
        }
    }
}

fn owner_of<I: 'static>(owner: &dyn Any) -> DiResult<&I> {
    owner
        .downcast_ref::<I>()
        .ok_or(DiError::TypeMismatch(std::any::type_name::<I>()))
}

fn property_writer<I, C, S>(setter: S) -> WriteFn
where
    I: 'static,
    C: ?Sized + Send + Sync + 'static,
    S: Fn(&I, Arc<C>) + Send + Sync + 'static,
{
    Arc::new(move |owner: &dyn Any, value: AnyArc| {
        let owner = owner_of::<I>(owner)?;
        setter(owner, downcast_service::<C>(&value)?);
        Ok(())
    })
}

fn property_reader<I, C, G>(getter: G) -> ReadFn
where
    I: 'static,
    C: ?Sized + Send + Sync + 'static,
    G: Fn(&I) -> Option<Arc<C>> + Send + Sync + 'static,
{
    Arc::new(move |owner: &dyn Any| {
        let owner = owner.downcast_ref::<I>()?;
        getter(owner).map(erase_service)
    })
}

/// Builds the erased descriptor for `I`. Stored as a fn pointer in registrations.
pub(crate) fn describe_type<I: Injectable>() -> TypeDescriptor {
    let mut meta = TypeMetadata::<I>::new();
    I::describe(&mut meta);
    meta.into_descriptor()
}

/// One declared constructor.
pub struct ConstructorDescriptor {
    parameters: ParameterKeys,
    build: BuildFn,
}

impl ConstructorDescriptor {
    /// Parameter contracts in resolution order.
    pub fn parameters(&self) -> &[Key] {
        &self.parameters
    }

    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// Runs the constructor; yields the erased `Arc<I>`.
    pub(crate) fn build(&self, args: &[AnyArc]) -> DiResult<AnyArc> {
        (self.build)(args)
    }
}

impl fmt::Debug for ConstructorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDescriptor")
            .field("parameters", &self.parameters)
            .finish()
    }
}

/// A member the container injects after construction.
pub struct InjectableMember {
    name: &'static str,
    contract: Key,
    kind: MemberKind,
    write: Option<WriteFn>,
    read: Option<ReadFn>,
}

impl InjectableMember {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The declared contract the member is resolved against.
    pub fn contract(&self) -> Key {
        self.contract
    }

    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    pub fn is_readable(&self) -> bool {
        self.read.is_some()
    }

    pub fn is_writable(&self) -> bool {
        self.write.is_some()
    }

    pub(crate) fn write(&self, owner_name: &'static str, owner: &dyn Any, value: AnyArc) -> DiResult<()> {
        match &self.write {
            Some(write) => write(owner, value),
            None => Err(DiError::NonWritableInjectionTarget {
                implementation: owner_name,
                member: self.name,
            }),
        }
    }

    /// Reads the member's current value from an instance of the described type.
    ///
    /// Returns `None` when the member is not readable, not yet injected, or
    /// `owner` is not an instance of the described type.
    pub fn read<C: ?Sized + Send + Sync + 'static>(&self, owner: &dyn Any) -> Option<Arc<C>> {
        let read = self.read.as_ref()?;
        let value = read(owner)?;
        downcast_service::<C>(&value).ok()
    }
}

impl fmt::Debug for InjectableMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectableMember")
            .field("name", &self.name)
            .field("contract", &self.contract)
            .field("kind", &self.kind)
            .field("readable", &self.is_readable())
            .field("writable", &self.is_writable())
            .finish()
    }
}

/// Everything the container knows about an implementation type.
///
/// Computed once per type and shared; a pure function of the type.
#[derive(Debug)]
pub struct TypeDescriptor {
    type_id: TypeId,
    type_name: &'static str,
    constructors: Vec<ConstructorDescriptor>,
    members: Vec<InjectableMember>,
}

impl TypeDescriptor {
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn constructors(&self) -> &[ConstructorDescriptor] {
        &self.constructors
    }

    /// Injectable members in declaration order.
    pub fn members(&self) -> &[InjectableMember] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&InjectableMember> {
        self.members.iter().find(|m| m.name == name)
    }

    /// Picks the constructor to run under `policy`.
    ///
    /// # Errors
    ///
    /// [`DiError::NoConstructor`] when none is declared, and
    /// [`DiError::AmbiguousConstructor`] when the policy does not single one out.
    pub fn select_constructor(&self, policy: ConstructorSelection) -> DiResult<&ConstructorDescriptor> {
        let candidates: Vec<&ConstructorDescriptor> = match policy {
            ConstructorSelection::Single => self.constructors.iter().collect(),
            ConstructorSelection::GreatestArity => {
                let greatest = self.constructors.iter().map(ConstructorDescriptor::arity).max();
                self.constructors
                    .iter()
                    .filter(|c| Some(c.arity()) == greatest)
                    .collect()
            }
        };

        match candidates.as_slice() {
            [] => Err(DiError::NoConstructor(self.type_name)),
            [only] => Ok(*only),
            [first, ..] => Err(DiError::AmbiguousConstructor {
                implementation: self.type_name,
                arity: first.arity(),
                candidates: candidates.len(),
            }),
        }
    }

    /// First member that cannot be written, if any.
    pub(crate) fn first_non_writable(&self) -> Option<&InjectableMember> {
        self.members.iter().find(|m| !m.is_writable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key_of;
    use parking_lot::Mutex;

    trait Port: Send + Sync {}
    struct Dummy;
    impl Port for Dummy {}

    struct Overloaded {
        port: Autowired<dyn Port>,
        label: Mutex<Option<Arc<String>>>,
    }

    impl Overloaded {
        fn bare() -> Self {
            Self { port: Autowired::new(), label: Mutex::new(None) }
        }
    }

    impl Injectable for Overloaded {
        fn describe(meta: &mut TypeMetadata<Self>) {
            meta.constructor(|()| Ok(Overloaded::bare()))
                .constructor(|(_n,): (Arc<u32>,)| Ok(Overloaded::bare()))
                .constructor(|(_n, _s): (Arc<u32>, Arc<String>)| Ok(Overloaded::bare()))
                .autowire("port", |o: &Overloaded| &o.port)
                .autowire_property_with_getter(
                    "label",
                    |o: &Overloaded| o.label.lock().clone(),
                    |o: &Overloaded, v: Arc<String>| *o.label.lock() = Some(v),
                );
        }
    }

    struct Twins;

    impl Injectable for Twins {
        fn describe(meta: &mut TypeMetadata<Self>) {
            meta.constructor(|(_a,): (Arc<u8>,)| Ok(Twins))
                .constructor(|(_b,): (Arc<u16>,)| Ok(Twins));
        }
    }

    struct Bare;

    impl Injectable for Bare {
        fn describe(_meta: &mut TypeMetadata<Self>) {}
    }

    #[test]
    fn greatest_arity_wins() {
        let desc = describe_type::<Overloaded>();
        assert_eq!(desc.constructors().len(), 3);
        let chosen = desc.select_constructor(ConstructorSelection::GreatestArity).unwrap();
        assert_eq!(chosen.parameters(), &[key_of::<u32>(), key_of::<String>()]);
    }

    #[test]
    fn single_policy_rejects_overloads() {
        let desc = describe_type::<Overloaded>();
        match desc.select_constructor(ConstructorSelection::Single) {
            Err(DiError::AmbiguousConstructor { candidates, .. }) => assert_eq!(candidates, 3),
            other => panic!("expected ambiguity, got {:?}", other.map(|c| c.arity())),
        }
    }

    #[test]
    fn tie_at_greatest_arity_is_ambiguous() {
        let desc = describe_type::<Twins>();
        match desc.select_constructor(ConstructorSelection::GreatestArity) {
            Err(DiError::AmbiguousConstructor { arity, candidates, .. }) => {
                assert_eq!(arity, 1);
                assert_eq!(candidates, 2);
            }
            other => panic!("expected ambiguity, got {:?}", other.map(|c| c.arity())),
        }
    }

    #[test]
    fn no_constructor_is_reported() {
        let desc = describe_type::<Bare>();
        assert!(matches!(
            desc.select_constructor(ConstructorSelection::GreatestArity),
            Err(DiError::NoConstructor(_))
        ));
    }

    #[test]
    fn members_keep_declaration_order_and_access() {
        let desc = describe_type::<Overloaded>();
        let names: Vec<_> = desc.members().iter().map(|m| m.name()).collect();
        assert_eq!(names, ["port", "label"]);

        let port = desc.member("port").unwrap();
        assert_eq!(port.kind(), MemberKind::Field);
        assert_eq!(port.contract(), key_of::<dyn Port>());
        assert!(port.is_readable() && port.is_writable());

        let instance = Overloaded::bare();
        let value: Arc<dyn Port> = Arc::new(Dummy);
        port.write("Overloaded", &instance, erase_service(value.clone())).unwrap();
        let read_back = port.read::<dyn Port>(&instance).unwrap();
        assert!(Arc::ptr_eq(&read_back, &value));

        let label = desc.member("label").unwrap();
        assert_eq!(label.kind(), MemberKind::Property);
        label
            .write("Overloaded", &instance, erase_service(Arc::new("x".to_string())))
            .unwrap();
        assert_eq!(label.read::<String>(&instance).as_deref().map(String::as_str), Some("x"));
    }

    #[test]
    fn field_written_twice_is_rejected() {
        let desc = describe_type::<Overloaded>();
        let port = desc.member("port").unwrap();
        let instance = Overloaded::bare();
        let value: Arc<dyn Port> = Arc::new(Dummy);
        port.write("Overloaded", &instance, erase_service(value.clone())).unwrap();
        assert!(matches!(
            port.write("Overloaded", &instance, erase_service(value)),
            Err(DiError::NonWritableInjectionTarget { member: "port", .. })
        ));
    }
}
