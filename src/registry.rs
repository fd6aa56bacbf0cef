//! Uniqueness-enforcing key-value stores with optional fallback scopes.
//!
//! A [`Registry`] owns a local map and may chain to a *base registry*.
//! Lookups fall through to the base when the local scope misses,
//! but registration and removal only ever consider the local scope,
//! so a module-local registry can shadow entries of the global one.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::util::short_type_name;
use crate::{Error, Identifier, Result};

/// The registry of registries.
pub mod manager;
pub use manager::{RegistryManager, Window};


/// A registry shared between its owner, the [`RegistryManager`] and derived scopes.
///
/// The lock is the critical section that serializes all writes to one registry.
pub type Shared<K, V> = Arc<RwLock<Registry<K, V>>>;

/// A mapping from identifiers to values with an optional fallback scope.
pub struct Registry<K, V> {
    label:   Cow<'static, str>,
    entries: IndexMap<K, V>,
    base:    Option<Shared<K, V>>,
}

impl<K: Identifier, V> Default for Registry<K, V> {
    fn default() -> Self { Self::new() }
}

impl<K: Identifier, V> Registry<K, V> {
    /// Creates an empty registry without a base scope.
    pub fn new() -> Self {
        Self {
            label:   Cow::Owned(format!(
                "registry of {} => {}",
                short_type_name(std::any::type_name::<K>()),
                short_type_name(std::any::type_name::<V>()),
            )),
            entries: IndexMap::new(),
            base:    None,
        }
    }

    /// Creates an empty registry that falls back to `base` on lookup misses.
    pub fn with_base(base: Shared<K, V>) -> Self {
        let label = format!("{} (scoped)", base.read().label);
        Self { label: Cow::Owned(label), entries: IndexMap::new(), base: Some(base) }
    }

    /// Replaces the label used in error messages.
    pub fn labeled(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.label = label.into();
        self
    }

    /// Wraps the registry for sharing.
    pub fn into_shared(self) -> Shared<K, V> { Arc::new(RwLock::new(self)) }

    /// The label used in error messages.
    pub fn label(&self) -> &str { &self.label }

    /// The base registry consulted on lookup misses.
    pub fn base(&self) -> Option<&Shared<K, V>> { self.base.as_ref() }

    /// The number of base registries below this one.
    pub fn depth(&self) -> usize {
        match &self.base {
            Some(base) => base.read().depth() + 1,
            None => 0,
        }
    }

    /// Registers `value` under `key` in the local scope.
    ///
    /// Fails if `key` is already present locally.
    /// Base registries are not checked, so a local entry may shadow a base entry.
    pub fn register(&mut self, key: K, value: V) -> Result<()> {
        match self.entries.entry(key) {
            indexmap::map::Entry::Occupied(entry) => Err(Error::DuplicateKey {
                registry: self.label.to_string(),
                key:      entry.key().to_string(),
            }),
            indexmap::map::Entry::Vacant(entry) => {
                log::trace!("{}: register {}", self.label, entry.key());
                entry.insert(value);
                Ok(())
            }
        }
    }

    /// Removes `key` from the local scope and returns its value.
    ///
    /// Base registries are never modified.
    pub fn unregister(&mut self, key: &K) -> Result<V> {
        match self.entries.shift_remove(key) {
            Some(value) => {
                log::trace!("{}: unregister {}", self.label, key);
                Ok(value)
            }
            None => Err(self.not_found(key)),
        }
    }

    /// Looks up `key` in the local scope only.
    pub fn get_local(&self, key: &K) -> Option<&V> { self.entries.get(key) }

    /// Whether `key` is present in the local scope.
    pub fn contains_local(&self, key: &K) -> bool { self.entries.contains_key(key) }

    /// Whether `key` is present in the local scope or any base scope.
    pub fn contains(&self, key: &K) -> bool {
        self.contains_local(key)
            || self.base.as_ref().map_or(false, |base| base.read().contains(key))
    }

    /// Iterates over the local entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ { self.entries.iter() }

    /// Iterates over the local keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ { self.entries.keys() }

    /// The number of local entries.
    pub fn len(&self) -> usize { self.entries.len() }

    /// Whether the local scope is empty.
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    fn not_found(&self, key: &K) -> Error {
        Error::KeyNotFound { registry: self.label.to_string(), key: key.to_string() }
    }
}

impl<K: Identifier, V: Clone> Registry<K, V> {
    /// Looks up `key` in the local scope, then in the base chain.
    pub fn get(&self, key: &K) -> Result<V> {
        self.try_get(key).ok_or_else(|| self.not_found(key))
    }

    /// Looks up `key` in the local scope, then in the base chain,
    /// returning `None` if it is absent everywhere.
    pub fn try_get(&self, key: &K) -> Option<V> {
        match self.entries.get(key) {
            Some(value) => Some(value.clone()),
            None => self.base.as_ref().and_then(|base| base.read().try_get(key)),
        }
    }
}

impl<K, V> fmt::Debug for Registry<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Registry")
            .field("label", &self.label)
            .field("len", &self.entries.len())
            .field("has_base", &self.base.is_some())
            .finish()
    }
}
