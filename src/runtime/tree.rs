use super::NodeIndex;
use crate::lifecycle::{AnyManager, Identity, Kind, State};

pub(super) struct Node {
    pub(super) manager:  Box<dyn AnyManager>,
    /// Dot-joined manager names from the root, used for diagnostics.
    pub(super) path:     String,
    pub(super) kind:     Kind,
    pub(super) parent:   Option<NodeIndex>,
    pub(super) children: Vec<NodeIndex>,
    pub(super) state:    State,
    pub(super) identity: Option<Identity>,
}

/// An arena of manager nodes.
pub(super) struct Tree {
    nodes:     Vec<Node>,
    /// Node indices in pre-order, computed by [`Tree::seal`].
    pre_order: Vec<NodeIndex>,
}

impl Tree {
    pub(super) fn new(root: Box<dyn AnyManager>) -> Self {
        let path = root.name().to_string();
        let node = Node {
            manager: root,
            path,
            kind: Kind::at_depth(0),
            parent: None,
            children: Vec::new(),
            state: State::Uninitialized,
            identity: None,
        };
        Self { nodes: vec![node], pre_order: Vec::new() }
    }

    pub(super) fn insert(&mut self, parent: NodeIndex, manager: Box<dyn AnyManager>) -> NodeIndex {
        let index = NodeIndex(self.nodes.len());
        let depth = self.depth(parent) + 1;

        let parent_node = self.nodes.get_mut(parent.0).expect("invalid parent node index");
        parent_node.children.push(index);
        let path = format!("{}.{}", parent_node.path, manager.name());

        self.nodes.push(Node {
            manager,
            path,
            kind: Kind::at_depth(depth),
            parent: Some(parent),
            children: Vec::new(),
            state: State::Uninitialized,
            identity: None,
        });
        index
    }

    fn depth(&self, index: NodeIndex) -> usize {
        std::iter::successors(Some(index), |&index| self.node(index).parent).count() - 1
    }

    /// Computes the traversal order. No nodes may be inserted afterwards.
    pub(super) fn seal(&mut self) {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![NodeIndex(0)];
        while let Some(index) = stack.pop() {
            order.push(index);
            stack.extend(self.node(index).children.iter().rev().copied());
        }
        debug_assert_eq!(order.len(), self.nodes.len());
        self.pre_order = order;
    }

    pub(super) fn pre_order(&self) -> &[NodeIndex] { &self.pre_order }

    pub(super) fn node(&self, index: NodeIndex) -> &Node {
        self.nodes.get(index.0).expect("invalid node index")
    }

    pub(super) fn node_mut(&mut self, index: NodeIndex) -> &mut Node {
        self.nodes.get_mut(index.0).expect("invalid node index")
    }

    pub(super) fn iter(&self) -> impl Iterator<Item = (NodeIndex, &Node)> + '_ {
        self.nodes.iter().enumerate().map(|(index, node)| (NodeIndex(index), node))
    }

    pub(super) fn len(&self) -> usize { self.nodes.len() }
}
