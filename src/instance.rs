//! Live instances of registered types and their composition tree.
//!
//! Instances live in a generational arena.
//! Parent and child links are handles into the arena,
//! and a handle to a destroyed instance is detected as stale
//! even if its slot has been reused.

use std::fmt;

use crate::registry::{Registry, Shared};
use crate::ty::{Type, TypeHandle};
use crate::{Error, Identifiable, InstanceIdentifier, Result};

#[cfg(test)]
mod tests;

/// Refers to an [`Instance`] in an [`InstanceManager`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceHandle {
    index:      u32,
    generation: u32,
}

impl fmt::Debug for InstanceHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InstanceHandle({}v{})", self.index, self.generation)
    }
}

/// A live object of a registered type.
#[derive(Debug)]
pub struct Instance {
    handle:   InstanceHandle,
    id:       InstanceIdentifier,
    ty:       TypeHandle,
    parent:   Option<InstanceHandle>,
    children: Vec<InstanceHandle>,
}

impl Instance {
    /// The handle of this instance.
    pub fn handle(&self) -> InstanceHandle { self.handle }

    /// The identifier of this instance.
    pub fn id(&self) -> &InstanceIdentifier { &self.id }

    /// The type of this instance.
    pub fn ty(&self) -> TypeHandle { self.ty }

    /// The parent instance, if this is a root.
    pub fn parent(&self) -> Option<InstanceHandle> { self.parent }

    /// The children in attachment order.
    pub fn children(&self) -> &[InstanceHandle] { &self.children }
}

impl Identifiable for Instance {
    type Id = InstanceIdentifier;

    fn identifier(&self) -> &InstanceIdentifier { &self.id }
}

struct Slot {
    generation: u32,
    instance:   Option<Instance>,
}

/// Creates, reparents and destroys instances.
pub struct InstanceManager {
    slots:       Vec<Slot>,
    free:        Vec<u32>,
    next_serial: u64,
    registry:    Shared<InstanceIdentifier, InstanceHandle>,
}

impl Default for InstanceManager {
    fn default() -> Self { Self::new() }
}

impl InstanceManager {
    /// Creates an empty instance arena with its own registry.
    pub fn new() -> Self {
        Self {
            slots:       Vec::new(),
            free:        Vec::new(),
            next_serial: 0,
            registry:    Registry::new().labeled("instance registry").into_shared(),
        }
    }

    /// The registry indexing every live instance by its identifier.
    pub fn registry(&self) -> &Shared<InstanceIdentifier, InstanceHandle> { &self.registry }

    /// Creates an instance of `ty`, appended to the children of `parent` if given.
    pub fn create(&mut self, ty: &Type, parent: Option<InstanceHandle>) -> Result<InstanceHandle> {
        if let Some(parent) = parent {
            if self.instance(parent).is_none() {
                return Err(Error::InvalidParent {
                    child:  format!("new instance of {}", ty.id()),
                    reason: format!("{parent:?} is not a live instance"),
                });
            }
        }

        let id = InstanceIdentifier::new(ty.id().clone(), self.next_serial);
        let handle = match self.free.last() {
            Some(&index) => {
                InstanceHandle { index, generation: self.slots[index as usize].generation }
            }
            None => InstanceHandle {
                index:      u32::try_from(self.slots.len()).expect("too many instances"),
                generation: 0,
            },
        };

        self.registry.write().register(id.clone(), handle)?;

        // nothing below can fail
        self.next_serial += 1;
        let instance = Instance { handle, id, ty: ty.handle(), parent, children: Vec::new() };
        log::trace!("Created instance {}", instance.id);
        if self.free.pop().is_some() {
            self.slots[handle.index as usize].instance = Some(instance);
        } else {
            self.slots.push(Slot { generation: 0, instance: Some(instance) });
        }

        if let Some(parent) = parent {
            self.live_mut(parent).children.push(handle);
        }

        Ok(handle)
    }

    /// Moves `child` under `parent`, or makes it a root if `parent` is `None`.
    ///
    /// Fails without side effects if `parent` is `child` itself or one of its descendants.
    pub fn set_parent(
        &mut self,
        child: InstanceHandle,
        parent: Option<InstanceHandle>,
    ) -> Result<()> {
        let child_id = self.instance(child).ok_or_else(|| self.stale(child))?.id.to_string();

        if let Some(parent) = parent {
            if self.instance(parent).is_none() {
                return Err(Error::InvalidParent {
                    child:  child_id,
                    reason: format!("{parent:?} is not a live instance"),
                });
            }

            if self.ancestors(parent).any(|ancestor| ancestor.handle == child) {
                let parent = self.live(parent).id.to_string();
                return Err(Error::Cycle { child: child_id, parent });
            }
        }

        if let Some(old_parent) = self.live(child).parent {
            self.live_mut(old_parent).children.retain(|&sibling| sibling != child);
        }
        if let Some(parent) = parent {
            self.live_mut(parent).children.push(child);
        }
        self.live_mut(child).parent = parent;

        Ok(())
    }

    /// Destroys `handle` together with all of its descendants.
    ///
    /// The instance is detached from its parent
    /// and every destroyed instance is unregistered from the instance registry.
    /// Returns the destroyed identifiers, descendants before ancestors.
    pub fn destroy(&mut self, handle: InstanceHandle) -> Result<Vec<InstanceIdentifier>> {
        let root = self.instance(handle).ok_or_else(|| self.stale(handle))?;
        let parent = root.parent;

        let subtree = self.subtree_post_order(handle);

        {
            let mut registry = self.registry.write();
            for &member in &subtree {
                let id = &self.live(member).id;
                if !registry.contains_local(id) {
                    return Err(Error::KeyNotFound {
                        registry: registry.label().to_string(),
                        key:      id.to_string(),
                    });
                }
            }
            for &member in &subtree {
                registry.unregister(&self.live(member).id)?;
            }
        }

        if let Some(parent) = parent {
            self.live_mut(parent).children.retain(|&sibling| sibling != handle);
        }

        let mut destroyed = Vec::with_capacity(subtree.len());
        for member in subtree {
            let slot = &mut self.slots[member.index as usize];
            let instance = slot.instance.take().expect("subtree members are live");
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(member.index);
            log::trace!("Destroyed instance {}", instance.id);
            destroyed.push(instance.id);
        }

        Ok(destroyed)
    }

    fn subtree_post_order(&self, handle: InstanceHandle) -> Vec<InstanceHandle> {
        let mut output = Vec::new();
        let mut stack = vec![(handle, false)];
        while let Some((node, expanded)) = stack.pop() {
            if expanded {
                output.push(node);
            } else {
                stack.push((node, true));
                for &child in self.live(node).children.iter().rev() {
                    stack.push((child, false));
                }
            }
        }
        output
    }

    /// Fetches a live instance, returning `None` for stale handles.
    pub fn instance(&self, handle: InstanceHandle) -> Option<&Instance> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.instance.as_ref()
    }

    /// Whether `handle` refers to a live instance.
    pub fn is_alive(&self, handle: InstanceHandle) -> bool { self.instance(handle).is_some() }

    /// Resolves an instance identifier through the instance registry.
    pub fn get(&self, id: &InstanceIdentifier) -> Result<&Instance> {
        let handle = self.registry.read().get(id)?;
        self.instance(handle).ok_or_else(|| self.stale(handle))
    }

    /// Iterates from `handle` up to its root, starting with `handle` itself.
    ///
    /// The iterator is empty if `handle` is stale.
    pub fn ancestors(&self, handle: InstanceHandle) -> impl Iterator<Item = &Instance> + '_ {
        std::iter::successors(self.instance(handle), move |instance| {
            instance.parent.map(|parent| self.live(parent))
        })
    }

    /// The direct children of `handle`, or `None` if it is stale.
    pub fn children(&self, handle: InstanceHandle) -> Option<&[InstanceHandle]> {
        self.instance(handle).map(Instance::children)
    }

    /// The root of the tree containing `handle`.
    pub fn root_of(&self, handle: InstanceHandle) -> Option<&Instance> {
        self.ancestors(handle).last()
    }

    /// All live instances in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Instance> + '_ {
        self.slots.iter().filter_map(|slot| slot.instance.as_ref())
    }

    /// The number of live instances.
    pub fn len(&self) -> usize { self.slots.len() - self.free.len() }

    /// Whether no instances are alive.
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    fn live(&self, handle: InstanceHandle) -> &Instance {
        self.instance(handle).expect("instance links must point to live instances")
    }

    fn live_mut(&mut self, handle: InstanceHandle) -> &mut Instance {
        let slot = self.slots.get_mut(handle.index as usize).expect("invalid instance index");
        assert_eq!(
            slot.generation, handle.generation,
            "instance links must point to live instances"
        );
        slot.instance.as_mut().expect("instance links must point to live instances")
    }

    fn stale(&self, handle: InstanceHandle) -> Error {
        Error::KeyNotFound { registry: "instance arena".to_string(), key: format!("{handle:?}") }
    }
}
