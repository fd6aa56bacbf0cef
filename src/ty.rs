//! Runtime-visible type descriptors scoped to namespaces.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::namespace::{Namespace, NamespaceHandle};
use crate::registry::{Registry, Shared};
use crate::util::type_segment;
use crate::{Error, Identifiable, Result, TypeIdentifier};


/// Describes a native Rust type.
///
/// Two descriptors are equal if and only if they describe the same [`TypeId`].
#[derive(Clone, Copy)]
pub struct NativeType {
    id:   TypeId,
    name: &'static str,
}

impl NativeType {
    /// Describes the type `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self { id: TypeId::of::<T>(), name: std::any::type_name::<T>() }
    }

    /// The [`TypeId`] of the type.
    pub fn id(&self) -> TypeId { self.id }

    /// The fully qualified Rust type name.
    pub fn name(&self) -> &'static str { self.name }

    /// The type name without module paths, as it appears in a [`TypeIdentifier`].
    ///
    /// Generic arguments are kept, so distinct instantiations of a generic type
    /// have distinct short names.
    pub fn short_name(&self) -> String { type_segment(self.name) }
}

impl PartialEq for NativeType {
    fn eq(&self, other: &Self) -> bool { self.id == other.id }
}

impl Eq for NativeType {}

impl Hash for NativeType {
    fn hash<H: Hasher>(&self, state: &mut H) { self.id.hash(state) }
}

impl fmt::Debug for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "NativeType({})", self.name) }
}

/// Refers to a [`Type`] in a [`TypeManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeHandle(usize);

/// A registered native type in a namespace.
#[derive(Debug)]
pub struct Type {
    handle:    TypeHandle,
    id:        TypeIdentifier,
    native:    NativeType,
    namespace: NamespaceHandle,
}

impl Type {
    /// The handle of this type.
    pub fn handle(&self) -> TypeHandle { self.handle }

    /// The qualified identifier of this type.
    pub fn id(&self) -> &TypeIdentifier { &self.id }

    /// The native type described.
    pub fn native(&self) -> NativeType { self.native }

    /// The namespace containing this type.
    pub fn namespace(&self) -> NamespaceHandle { self.namespace }
}

impl Identifiable for Type {
    type Id = TypeIdentifier;

    fn identifier(&self) -> &TypeIdentifier { &self.id }
}

/// Registers native types into namespaces.
pub struct TypeManager {
    types:     Vec<Type>,
    by_native: HashMap<(NativeType, NamespaceHandle), TypeHandle>,
    registry:  Shared<TypeIdentifier, TypeHandle>,
}

impl Default for TypeManager {
    fn default() -> Self { Self::new() }
}

impl TypeManager {
    /// Creates an empty type manager with its own registry.
    pub fn new() -> Self {
        Self {
            types:     Vec::new(),
            by_native: HashMap::new(),
            registry:  Registry::new().labeled("type registry").into_shared(),
        }
    }

    /// The registry indexing every type by its qualified identifier.
    pub fn registry(&self) -> &Shared<TypeIdentifier, TypeHandle> { &self.registry }

    /// Registers `native` in `namespace`.
    ///
    /// Fails without side effects if the same native type is already registered there,
    /// or if another native type with the same short name is.
    pub fn create(&mut self, native: NativeType, namespace: &Namespace) -> Result<TypeHandle> {
        if self.by_native.contains_key(&(native, namespace.handle())) {
            return Err(Error::DuplicateType {
                native:    native.name(),
                namespace: namespace.id().to_string(),
            });
        }

        let name = native.short_name();
        let id = TypeIdentifier::new(namespace.id().clone(), name.clone())?;

        let handle = TypeHandle(self.types.len());
        {
            let mut registry = self.registry.write();
            if registry.contains_local(&id) {
                return Err(Error::DuplicateName { scope: namespace.id().to_string(), name });
            }
            registry.register(id.clone(), handle)?;
        }

        log::debug!("Registered type {id} for {}", native.name());
        self.by_native.insert((native, namespace.handle()), handle);
        self.types.push(Type { handle, id, native, namespace: namespace.handle() });
        Ok(handle)
    }

    /// Resolves a type identifier through the type registry.
    pub fn get(&self, id: &TypeIdentifier) -> Result<&Type> {
        let handle = self.registry.read().get(id)?;
        Ok(self.ty(handle))
    }

    /// Finds the registration of `native` in `namespace`.
    pub fn find(&self, native: NativeType, namespace: NamespaceHandle) -> Option<&Type> {
        self.by_native.get(&(native, namespace)).map(|&handle| self.ty(handle))
    }

    /// Fetches a type by handle.
    ///
    /// # Panics
    /// Panics if `handle` was not created by this manager.
    pub fn ty(&self, handle: TypeHandle) -> &Type {
        self.types.get(handle.0).expect("type handle from another type manager")
    }

    /// The types registered in `namespace`, in registration order.
    pub fn types_in(&self, namespace: NamespaceHandle) -> impl Iterator<Item = &Type> + '_ {
        self.types.iter().filter(move |ty| ty.namespace == namespace)
    }

    /// All types in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Type> + '_ { self.types.iter() }

    /// The number of registered types.
    pub fn len(&self) -> usize { self.types.len() }

    /// Whether no types are registered.
    pub fn is_empty(&self) -> bool { self.types.is_empty() }
}
