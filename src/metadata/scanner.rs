//! Memoized metadata scanning.

use std::any::TypeId;
use std::sync::Arc;

use crate::metadata::TypeDescriptor;
use crate::registration::FastMap;

/// Caches one [`TypeDescriptor`] per implementation type.
///
/// Descriptors depend only on the type, so they are computed the first time a
/// type is resolved and shared afterwards.
pub(crate) struct Scanner {
    memo: FastMap<TypeId, Arc<TypeDescriptor>>,
}

impl Scanner {
    pub(crate) fn new() -> Self {
        Self { memo: FastMap::default() }
    }

    /// Returns the descriptor for `id`, running `describe` only on first use.
    pub(crate) fn describe(&mut self, id: TypeId, describe: fn() -> TypeDescriptor) -> Arc<TypeDescriptor> {
        self.memo
            .entry(id)
            .or_insert_with(|| {
                let descriptor = describe();
                tracing::trace!(
                    implementation = descriptor.type_name(),
                    constructors = descriptor.constructors().len(),
                    members = descriptor.members().len(),
                    "scanned implementation metadata"
                );
                Arc::new(descriptor)
            })
            .clone()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.memo.len()
    }
}
