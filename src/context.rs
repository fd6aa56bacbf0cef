//! The runtime context injected into every manager hook.

use crate::instance::InstanceManager;
use crate::namespace::NamespaceManager;
use crate::registry::RegistryManager;
use crate::ty::TypeManager;
use crate::Result;

/// Owns the registries and identity arenas of a runtime.
///
/// There is exactly one context per [`Runtime`](crate::Runtime).
/// It is passed to manager hooks instead of being reachable through global state.
#[derive(Default)]
pub struct Context {
    registries: RegistryManager,
    namespaces: NamespaceManager,
    types:      TypeManager,
    instances:  InstanceManager,
}

#[cfg(test)]
static_assertions::assert_impl_all!(Context: Send, Sync);

impl Context {
    /// Creates an empty context with a closed registry window.
    pub fn new() -> Self { Self::default() }

    /// Opens the registry window and registers the namespace, type and instance registries.
    pub(crate) fn begin_pre_initialization(&mut self) -> Result<()> {
        self.registries.open()?;
        self.registries.register_registry(self.namespaces.registry().clone())?;
        self.registries.register_registry(self.types.registry().clone())?;
        self.registries.register_registry(self.instances.registry().clone())?;
        Ok(())
    }

    /// Seals the registry window.
    pub(crate) fn end_pre_initialization(&mut self) -> Result<()> { self.registries.seal() }

    /// Seals the registry window after a failed bring-up.
    pub(crate) fn abort_pre_initialization(&mut self) { self.registries.abort() }

    /// The registry of registries.
    pub fn registries(&self) -> &RegistryManager { &self.registries }

    /// The registry of registries.
    pub fn registries_mut(&mut self) -> &mut RegistryManager { &mut self.registries }

    /// The namespace tree.
    pub fn namespaces(&self) -> &NamespaceManager { &self.namespaces }

    /// The namespace tree.
    pub fn namespaces_mut(&mut self) -> &mut NamespaceManager { &mut self.namespaces }

    /// The registered types.
    pub fn types(&self) -> &TypeManager { &self.types }

    /// The registered types.
    pub fn types_mut(&mut self) -> &mut TypeManager { &mut self.types }

    /// The live instances.
    pub fn instances(&self) -> &InstanceManager { &self.instances }

    /// The live instances.
    pub fn instances_mut(&mut self) -> &mut InstanceManager { &mut self.instances }

    /// Splits the context into its identity arenas for operations spanning several of them.
    pub fn split_mut(
        &mut self,
    ) -> (&mut RegistryManager, &mut NamespaceManager, &mut TypeManager, &mut InstanceManager) {
        (&mut self.registries, &mut self.namespaces, &mut self.types, &mut self.instances)
    }
}
