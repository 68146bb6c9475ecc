//! Constructor argument tuples.

use std::sync::Arc;

use smallvec::{smallvec, SmallVec};

use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::registration::{downcast_service, AnyArc};

/// Parameter keys of one constructor, in declaration order.
pub type ParameterKeys = SmallVec<[Key; 4]>;

/// A tuple of `Arc<C>` constructor parameters.
///
/// Implemented for `()` and for tuples of up to eight `Arc`s, where each
/// element type is the contract that parameter is resolved against. The tuple
/// order is the resolution order.
pub trait ConstructorArgs: Sized {
    /// Contract keys of the parameters, in order.
    fn keys() -> ParameterKeys;

    /// Rebuilds the typed tuple from resolved services.
    fn from_resolved(values: &[AnyArc]) -> DiResult<Self>;
}

impl ConstructorArgs for () {
    fn keys() -> ParameterKeys {
        SmallVec::new()
    }

    fn from_resolved(_values: &[AnyArc]) -> DiResult<Self> {
        Ok(())
    }
}

macro_rules! impl_constructor_args {
    ($arity:expr; $($name:ident : $idx:tt),+) => {
        impl<$($name),+> ConstructorArgs for ($(Arc<$name>,)+)
        where
            $($name: ?Sized + Send + Sync + 'static),+
        {
            fn keys() -> ParameterKeys {
                smallvec![$(Key::of::<$name>()),+]
            }

            fn from_resolved(values: &[AnyArc]) -> DiResult<Self> {
                if values.len() != $arity {
                    return Err(DiError::TypeMismatch(std::any::type_name::<Self>()));
                }
                Ok(($(downcast_service::<$name>(&values[$idx])?,)+))
            }
        }
    };
}

impl_constructor_args!(1; A: 0);
impl_constructor_args!(2; A: 0, B: 1);
impl_constructor_args!(3; A: 0, B: 1, C: 2);
impl_constructor_args!(4; A: 0, B: 1, C: 2, D: 3);
impl_constructor_args!(5; A: 0, B: 1, C: 2, D: 3, E: 4);
impl_constructor_args!(6; A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
impl_constructor_args!(7; A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6);
impl_constructor_args!(8; A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7);
