//! The hierarchical namespace tree.
//!
//! Namespaces are stored in an arena owned by the [`NamespaceManager`].
//! Parents are referenced by handle, so a namespace never owns its parent.

use indexmap::IndexMap;

use crate::identifier::validate_name;
use crate::registry::{Registry, Shared};
use crate::{Error, Identifiable, NamespaceId, Result};


/// Refers to a [`Namespace`] in a [`NamespaceManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NamespaceHandle(usize);

/// A node in the namespace tree.
#[derive(Debug)]
pub struct Namespace {
    handle:   NamespaceHandle,
    id:       NamespaceId,
    parent:   Option<NamespaceHandle>,
    children: IndexMap<String, NamespaceHandle>,
}

impl Namespace {
    /// The handle of this namespace.
    pub fn handle(&self) -> NamespaceHandle { self.handle }

    /// The fully qualified path of this namespace.
    pub fn id(&self) -> &NamespaceId { &self.id }

    /// The unqualified name of this namespace.
    pub fn name(&self) -> &str { self.id.name() }

    /// The parent namespace, if this is not a root.
    pub fn parent(&self) -> Option<NamespaceHandle> { self.parent }

    /// Looks up a direct child by name.
    pub fn child(&self, name: &str) -> Option<NamespaceHandle> { self.children.get(name).copied() }

    /// The direct children in creation order.
    pub fn children(&self) -> impl Iterator<Item = NamespaceHandle> + '_ {
        self.children.values().copied()
    }
}

impl Identifiable for Namespace {
    type Id = NamespaceId;

    fn identifier(&self) -> &NamespaceId { &self.id }
}

/// Creates namespaces and resolves qualified paths.
pub struct NamespaceManager {
    nodes:    Vec<Namespace>,
    roots:    IndexMap<String, NamespaceHandle>,
    registry: Shared<NamespaceId, NamespaceHandle>,
}

impl Default for NamespaceManager {
    fn default() -> Self { Self::new() }
}

impl NamespaceManager {
    /// Creates an empty namespace tree with its own registry.
    pub fn new() -> Self {
        Self {
            nodes:    Vec::new(),
            roots:    IndexMap::new(),
            registry: Registry::new().labeled("namespace registry").into_shared(),
        }
    }

    /// The registry indexing every namespace by its qualified path.
    pub fn registry(&self) -> &Shared<NamespaceId, NamespaceHandle> { &self.registry }

    /// Creates a namespace called `name` under `parent`, or a root namespace if `parent` is `None`.
    ///
    /// Fails without side effects if the name is taken by a sibling.
    pub fn create(
        &mut self,
        name: &str,
        parent: Option<NamespaceHandle>,
    ) -> Result<NamespaceHandle> {
        validate_name(name)?;

        let (id, siblings) = match parent {
            Some(parent) => {
                let parent_node = self.nodes.get(parent.0).ok_or_else(|| Error::InvalidParent {
                    child:  name.to_string(),
                    reason: format!("{parent:?} does not belong to this namespace tree"),
                })?;
                (parent_node.id.child(name)?, &parent_node.children)
            }
            None => (NamespaceId::root(name)?, &self.roots),
        };

        if siblings.contains_key(name) {
            return Err(Error::DuplicateName {
                scope: match parent {
                    Some(_) => id.parent().expect("child paths have parents").to_string(),
                    None => "the root scope".to_string(),
                },
                name:  name.to_string(),
            });
        }

        let handle = NamespaceHandle(self.nodes.len());
        self.registry.write().register(id.clone(), handle)?;

        match parent {
            Some(parent) => {
                self.nodes[parent.0].children.insert(name.to_string(), handle);
            }
            None => {
                self.roots.insert(name.to_string(), handle);
            }
        }

        log::debug!("Created namespace {id}");
        self.nodes.push(Namespace { handle, id, parent, children: IndexMap::new() });
        Ok(handle)
    }

    /// Resolves a dot-qualified path such as `LooCast.Mission.Target`.
    ///
    /// Fails with [`Error::NamespaceNotFound`] naming the first unregistered segment.
    pub fn get(&self, path: &str) -> Result<&Namespace> {
        let id = NamespaceId::parse(path)?;
        let mut segments = id.segments().iter();

        let first = segments.next().expect("namespace paths are never empty");
        let mut current = self.roots.get(first.as_str()).copied().ok_or_else(|| {
            Error::NamespaceNotFound { path: path.to_string(), segment: first.clone() }
        })?;

        for segment in segments {
            current = self.namespace(current).child(segment).ok_or_else(|| {
                Error::NamespaceNotFound { path: path.to_string(), segment: segment.clone() }
            })?;
        }

        Ok(self.namespace(current))
    }

    /// Resolves a namespace identifier through the namespace registry.
    pub fn lookup(&self, id: &NamespaceId) -> Result<&Namespace> {
        let handle = self.registry.read().get(id)?;
        Ok(self.namespace(handle))
    }

    /// Fetches a namespace by handle.
    ///
    /// # Panics
    /// Panics if `handle` was not created by this manager.
    pub fn namespace(&self, handle: NamespaceHandle) -> &Namespace {
        self.nodes.get(handle.0).expect("namespace handle from another namespace tree")
    }

    /// Iterates from `handle` up to its root, starting with `handle` itself.
    pub fn ancestors(&self, handle: NamespaceHandle) -> impl Iterator<Item = &Namespace> + '_ {
        std::iter::successors(Some(self.namespace(handle)), move |node| {
            node.parent.map(|parent| self.namespace(parent))
        })
    }

    /// The direct children of `handle` in creation order.
    pub fn children(&self, handle: NamespaceHandle) -> impl Iterator<Item = &Namespace> + '_ {
        self.namespace(handle).children().map(move |child| self.namespace(child))
    }

    /// The qualified path of `handle`.
    pub fn path_of(&self, handle: NamespaceHandle) -> &NamespaceId { self.namespace(handle).id() }

    /// The root namespaces in creation order.
    pub fn roots(&self) -> impl Iterator<Item = &Namespace> + '_ {
        self.roots.values().map(move |&handle| self.namespace(handle))
    }

    /// All namespaces in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Namespace> + '_ { self.nodes.iter() }

    /// The number of namespaces.
    pub fn len(&self) -> usize { self.nodes.len() }

    /// Whether no namespaces exist.
    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }
}
