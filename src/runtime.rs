//! The runtime owns the manager tree and drives it through the lifecycle phases.
//!
//! Initialization phases visit the tree in pre-order,
//! so a manager can always find the namespace of its parent.
//! Termination phases visit the tree in the exact reverse order,
//! so sub-modules finish each termination phase before their module starts it.
//! Every phase is a tree-wide barrier.

use crate::context::Context;
use crate::lifecycle::{AnyManager, Identity, Kind, Manager, Phase, State};
use crate::tracer::Tracer;
use crate::{Error, Result};

mod builder;
pub use builder::{Builder, Bundle};

mod driver;

mod tree;
use tree::Tree;

#[cfg(test)]
mod tests;

/// Identifies a manager node in the tree of a [`Runtime`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeIndex(pub(crate) usize);

impl NodeIndex {
    /// The position of the node in insertion order. The root is always `0`.
    pub fn get(self) -> usize { self.0 }
}

/// Creates a runtime from a root manager and bundles contributing modules under it.
pub fn new<'t>(root: impl Manager, bundles: impl IntoIterator<Item = &'t dyn Bundle>) -> Runtime {
    let mut builder = Builder::new(root);
    for bundle in bundles {
        builder.bundle(bundle);
    }
    builder.build()
}

/// The manager tree together with its [`Context`].
pub struct Runtime {
    tree:    Tree,
    context: Context,
    state:   State,
    failed:  bool,
}

static_assertions::assert_impl_all!(Runtime: Send);

impl Runtime {
    fn from_tree(tree: Tree) -> Self {
        Self { tree, context: Context::new(), state: State::Uninitialized, failed: false }
    }

    /// Runs pre-initialization, initialization and post-initialization on the whole tree.
    ///
    /// The first error aborts the bring-up and poisons the runtime.
    pub fn start(&mut self, tracer: &impl Tracer) -> Result<()> {
        let allowed = "once, on a runtime that has not started";
        self.check_usable("start", allowed, State::Uninitialized)?;

        let result = self.bring_up(tracer);
        if let Err(err) = &result {
            log::error!("Bring-up failed: {err}");
            self.failed = true;
            self.context.abort_pre_initialization();
        }
        result
    }

    fn bring_up(&mut self, tracer: &impl Tracer) -> Result<()> {
        self.context.begin_pre_initialization()?;
        self.sweep(Phase::PreInitialize, tracer)?;
        self.context.end_pre_initialization()?;

        self.sweep(Phase::Initialize, tracer)?;
        self.sweep(Phase::PostInitialize, tracer)?;

        log::info!("Runtime started with {} managers", self.tree.len());
        Ok(())
    }

    /// Runs the seven termination phases on the whole tree,
    /// then destroys the instance of every manager.
    ///
    /// The first error aborts the teardown and poisons the runtime.
    pub fn shutdown(&mut self, tracer: &impl Tracer) -> Result<()> {
        self.check_usable(
            "shut down",
            "once, after bring-up has completed",
            State::Completed(Phase::PostInitialize),
        )?;

        for phase in Phase::termination() {
            if let Err(err) = self.sweep(phase, tracer) {
                log::error!("Teardown failed: {err}");
                self.failed = true;
                return Err(err);
            }
        }

        log::info!("Runtime terminated");
        Ok(())
    }

    fn sweep(&mut self, phase: Phase, tracer: &impl Tracer) -> Result<()> {
        driver::sweep(&mut self.tree, &mut self.context, &mut self.state, phase, tracer)
    }

    fn check_usable(
        &self,
        operation: &'static str,
        allowed: &'static str,
        expect: State,
    ) -> Result<()> {
        if self.failed {
            return Err(Error::Phase {
                operation,
                allowed,
                actual: format!("after the runtime failed during {}", self.state),
            });
        }
        if self.state != expect {
            return Err(Error::Phase {
                operation,
                allowed,
                actual: format!("while the runtime has {}", self.state),
            });
        }
        Ok(())
    }

    /// The global lifecycle state, i.e. the last phase swept over the whole tree.
    pub fn state(&self) -> State { self.state }

    /// Whether a bring-up or teardown has failed.
    pub fn is_failed(&self) -> bool { self.failed }

    /// The root manager node.
    pub fn root(&self) -> NodeIndex { NodeIndex(0) }

    /// The number of manager nodes.
    pub fn len(&self) -> usize { self.tree.len() }

    /// Whether the tree is empty. Always false, since the root is mandatory.
    pub fn is_empty(&self) -> bool { self.tree.len() == 0 }

    /// The nodes in initialization order.
    pub fn pre_order(&self) -> &[NodeIndex] { self.tree.pre_order() }

    /// The lifecycle state of a node.
    pub fn node_state(&self, index: NodeIndex) -> State { self.tree.node(index).state }

    /// The position of a node in the tree.
    pub fn kind_of(&self, index: NodeIndex) -> Kind { self.tree.node(index).kind }

    /// The qualified path of a node, e.g. `LooCast.Mission.Target`.
    pub fn path_of(&self, index: NodeIndex) -> &str { &self.tree.node(index).path }

    /// The registered identity of a node, available once it has entered pre-initialization.
    pub fn identity_of(&self, index: NodeIndex) -> Option<Identity> {
        self.tree.node(index).identity
    }

    /// The parent of a node.
    pub fn parent_of(&self, index: NodeIndex) -> Option<NodeIndex> { self.tree.node(index).parent }

    /// The children of a node in insertion order.
    pub fn children_of(&self, index: NodeIndex) -> &[NodeIndex] { &self.tree.node(index).children }

    /// Finds the first node whose manager has the concrete type `M`.
    pub fn index_of<M: Manager>(&self) -> Option<NodeIndex> {
        self.tree.iter().find(|(_, node)| node.manager.as_any().is::<M>()).map(|(index, _)| index)
    }

    /// Downcasts the first manager of the concrete type `M`.
    pub fn manager<M: Manager>(&self) -> Option<&M> {
        self.tree.iter().find_map(|(_, node)| node.manager.as_any().downcast_ref::<M>())
    }

    /// Downcasts the first manager of the concrete type `M`.
    pub fn manager_mut<M: Manager>(&mut self) -> Option<&mut M> {
        let index = self.index_of::<M>()?;
        self.tree.node_mut(index).manager.as_any_mut().downcast_mut::<M>()
    }

    /// The boxed manager of a node.
    pub fn manager_at(&self, index: NodeIndex) -> &dyn AnyManager {
        &*self.tree.node(index).manager
    }

    /// The runtime context.
    pub fn context(&self) -> &Context { &self.context }

    /// The runtime context.
    pub fn context_mut(&mut self) -> &mut Context { &mut self.context }
}
