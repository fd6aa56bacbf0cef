use super::tree::Tree;
use super::{NodeIndex, Runtime};
use crate::factory::Catalog;
use crate::lifecycle::{AnyManager, Manager};
use crate::Result;

/// A bundle contributes a subtree of managers for a specific feature.
/// This can be used by feature crates to expose their managers as a single API.
pub trait Bundle {
    /// Inserts the managers of this bundle under `parent`.
    fn register(&self, builder: &mut Builder, parent: NodeIndex);
}

/// This type is used to build a runtime.
/// No more managers can be added after the builder is built.
pub struct Builder {
    tree: Tree,
}

impl Builder {
    /// Creates a builder with the given root manager.
    pub fn new(root: impl Manager) -> Self { Self::new_boxed(Box::new(root)) }

    /// Creates a builder with a boxed root manager, e.g. from a [`Catalog`].
    pub fn new_boxed(root: Box<dyn AnyManager>) -> Self { Self { tree: Tree::new(root) } }

    /// The root node.
    pub fn root(&self) -> NodeIndex { NodeIndex(0) }

    /// Adds a module manager directly under the root.
    pub fn module(&mut self, manager: impl Manager) -> NodeIndex {
        self.child(self.root(), Box::new(manager))
    }

    /// Adds a sub-module manager under `parent`.
    pub fn sub_module(&mut self, parent: NodeIndex, manager: impl Manager) -> NodeIndex {
        self.child(parent, Box::new(manager))
    }

    /// Adds a boxed manager under `parent`.
    ///
    /// The kind of the new node follows from its depth:
    /// children of the root are module managers, deeper nodes are sub-module managers.
    ///
    /// # Panics
    /// Panics if `parent` was not returned by this builder.
    pub fn child(&mut self, parent: NodeIndex, manager: Box<dyn AnyManager>) -> NodeIndex {
        self.tree.insert(parent, manager)
    }

    /// Instantiates the manager registered as `key` in `catalog` and adds it under `parent`.
    pub fn from_catalog(
        &mut self,
        parent: NodeIndex,
        catalog: &Catalog,
        key: &str,
    ) -> Result<NodeIndex> {
        let manager = catalog.instantiate(key)?;
        Ok(self.child(parent, manager))
    }

    /// Lets `bundle` insert its managers under the root.
    pub fn bundle(&mut self, bundle: &dyn Bundle) -> &mut Self {
        let root = self.root();
        bundle.register(self, root);
        self
    }

    /// Constructs the runtime from the builder.
    pub fn build(mut self) -> Runtime {
        self.tree.seal();
        Runtime::from_tree(self.tree)
    }
}
