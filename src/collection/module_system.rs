//! Registration modules.
//!
//! A module groups the registrations of one part of an application, so the
//! composition root can install whole features at a time.

use crate::{DiResult, ServiceCollection};

/// A bundle of registrations.
///
/// # Example
///
/// ```rust
/// use ferrous_wire::{DiResult, Injectable, Resolver, ServiceCollection, ServiceCollectionExt, ServiceModule, TypeMetadata};
/// use std::sync::Arc;
///
/// struct AuthSettings { issuer: String }
///
/// struct TokenService { settings: Arc<AuthSettings> }
///
/// impl Injectable for TokenService {
///     fn describe(meta: &mut TypeMetadata<Self>) {
///         meta.constructor(|(settings,): (Arc<AuthSettings>,)| Ok(TokenService { settings }));
///     }
/// }
///
/// struct AuthModule { issuer: &'static str }
///
/// impl ServiceModule for AuthModule {
///     fn register_services(self, services: &mut ServiceCollection) -> DiResult<()> {
///         services.add_singleton(AuthSettings { issuer: self.issuer.to_string() });
///         services.add_singleton_type::<TokenService>();
///         Ok(())
///     }
/// }
///
/// # fn main() -> DiResult<()> {
/// let provider = ServiceCollection::new()
///     .add_module(AuthModule { issuer: "wire" })?
///     .build();
/// assert_eq!(provider.get::<TokenService>()?.settings.issuer, "wire");
/// # Ok(())
/// # }
/// ```
pub trait ServiceModule {
    /// Registers this module's services.
    fn register_services(self, services: &mut ServiceCollection) -> DiResult<()>;
}

/// Module installation on [`ServiceCollection`].
pub trait ServiceCollectionExt {
    /// Installs `module`, consuming and returning the collection for chaining.
    fn add_module<M: ServiceModule>(self, module: M) -> DiResult<Self>
    where
        Self: Sized;

    /// Installs `module` in place.
    fn add_module_mut<M: ServiceModule>(&mut self, module: M) -> DiResult<&mut Self>;
}

impl ServiceCollectionExt for ServiceCollection {
    fn add_module<M: ServiceModule>(mut self, module: M) -> DiResult<Self> {
        module.register_services(&mut self)?;
        Ok(self)
    }

    fn add_module_mut<M: ServiceModule>(&mut self, module: M) -> DiResult<&mut Self> {
        tracing::trace!(module = std::any::type_name::<M>(), "installing module");
        module.register_services(self)?;
        Ok(self)
    }
}
