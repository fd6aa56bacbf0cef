//! The registry of registries.
//!
//! A [`RegistryManager`] accepts new registries only while its [`Window`] is open,
//! which the runtime does for the duration of global pre-initialization.
//!
//! ```
//! use loocast_runtime::registry::Window;
//! use loocast_runtime::{Error, NamespaceId, RegistryManager};
//!
//! let mut registries = RegistryManager::new();
//! assert_eq!(registries.window(), Window::Closed);
//!
//! let err = registries.create_registry::<NamespaceId, u32>().unwrap_err();
//! assert!(matches!(err, Error::Phase { operation: "register a registry", .. }));
//! ```

use std::any::Any;
use std::fmt;

use indexmap::IndexMap;

use super::{Registry, Shared};
use crate::util::{short_type_name, DbgTypeId};
use crate::{Error, Identifier, Result};

/// The lifecycle window of a [`RegistryManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Window {
    /// Global pre-initialization has not started yet.
    Closed,
    /// Global pre-initialization is running; registries may be registered.
    Open,
    /// Global pre-initialization has completed; registries may be looked up.
    Sealed,
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::Sealed => "sealed",
        })
    }
}

struct Entry {
    key:      &'static str,
    value:    &'static str,
    registry: Box<dyn Any + Send + Sync>,
}

/// Owns one [`Registry`] per key/value type pair.
///
/// Registries can only be registered while global pre-initialization is running,
/// and can only be looked up after it has completed.
/// The registries themselves stay mutable for the whole lifetime of the runtime.
pub struct RegistryManager {
    window:     Window,
    registries: IndexMap<(DbgTypeId, DbgTypeId), Entry>,
}

impl Default for RegistryManager {
    fn default() -> Self { Self::new() }
}

impl RegistryManager {
    /// Creates an empty manager with a closed window.
    pub fn new() -> Self { Self { window: Window::Closed, registries: IndexMap::new() } }

    /// The current window.
    pub fn window(&self) -> Window { self.window }

    pub(crate) fn open(&mut self) -> Result<()> { self.advance(Window::Closed, Window::Open) }

    pub(crate) fn seal(&mut self) -> Result<()> { self.advance(Window::Open, Window::Sealed) }

    /// Seals the window if it is still open, without checking the order.
    pub(crate) fn abort(&mut self) {
        if self.window == Window::Open {
            log::debug!("Registry window: open -> sealed after a failed pre-initialization");
            self.window = Window::Sealed;
        }
    }

    fn advance(&mut self, from: Window, to: Window) -> Result<()> {
        if self.window != from {
            return Err(Error::Phase {
                operation: if to == Window::Open {
                    "open the registry window"
                } else {
                    "seal the registry window"
                },
                allowed:   "once, in the order closed, open, sealed",
                actual:    format!("while the registry window is {}", self.window),
            });
        }

        log::debug!("Registry window: {} -> {}", self.window, to);
        self.window = to;
        Ok(())
    }

    /// Registers the registry for the pair `K => V`.
    pub fn register_registry<K, V>(&mut self, registry: Shared<K, V>) -> Result<()>
    where
        K: Identifier,
        V: Send + Sync + 'static,
    {
        if self.window != Window::Open {
            return Err(Error::Phase {
                operation: "register a registry",
                allowed:   "during global pre-initialization",
                actual:    format!("while the registry window is {}", self.window),
            });
        }

        let pair = (DbgTypeId::of::<K>(), DbgTypeId::of::<V>());
        let key = short_type_name(std::any::type_name::<K>());
        let value = short_type_name(std::any::type_name::<V>());

        if self.registries.contains_key(&pair) {
            return Err(Error::DuplicateRegistry { key: key.to_string(), value: value.to_string() });
        }

        log::debug!("Registered {}", registry.read().label());
        self.registries.insert(pair, Entry { key, value, registry: Box::new(registry) });
        Ok(())
    }

    /// Creates and registers an empty registry for the pair `K => V`.
    pub fn create_registry<K, V>(&mut self) -> Result<Shared<K, V>>
    where
        K: Identifier,
        V: Send + Sync + 'static,
    {
        let registry = Registry::<K, V>::new().into_shared();
        self.register_registry(registry.clone())?;
        Ok(registry)
    }

    /// Fetches the registry for the pair `K => V`.
    pub fn get_registry<K, V>(&self) -> Result<Shared<K, V>>
    where
        K: Identifier,
        V: Send + Sync + 'static,
    {
        if self.window != Window::Sealed {
            return Err(Error::Phase {
                operation: "look up a registry",
                allowed:   "after global pre-initialization has completed",
                actual:    format!("while the registry window is {}", self.window),
            });
        }

        self.lookup::<K, V>()
    }

    /// Fetches the registry for the pair `K => V`,
    /// returning `None` if it is missing or the window is not sealed yet.
    pub fn try_get_registry<K, V>(&self) -> Option<Shared<K, V>>
    where
        K: Identifier,
        V: Send + Sync + 'static,
    {
        self.get_registry().ok()
    }

    /// Creates an unregistered module-local registry
    /// whose base is the registered registry for `K => V`.
    ///
    /// Unlike [`get_registry`](Self::get_registry),
    /// this is also allowed during global pre-initialization,
    /// so that modules can set up their scopes while registering themselves.
    pub fn scoped<K, V>(&self) -> Result<Shared<K, V>>
    where
        K: Identifier,
        V: Send + Sync + 'static,
    {
        if self.window == Window::Closed {
            return Err(Error::Phase {
                operation: "create a scoped registry",
                allowed:   "after global pre-initialization has started",
                actual:    format!("while the registry window is {}", self.window),
            });
        }

        Ok(Registry::with_base(self.lookup::<K, V>()?).into_shared())
    }

    fn lookup<K, V>(&self) -> Result<Shared<K, V>>
    where
        K: Identifier,
        V: Send + Sync + 'static,
    {
        let pair = (DbgTypeId::of::<K>(), DbgTypeId::of::<V>());
        match self.registries.get(&pair) {
            Some(entry) => Ok(entry
                .registry
                .downcast_ref::<Shared<K, V>>()
                .expect("TypeId mismatch")
                .clone()),
            None => Err(Error::RegistryNotFound {
                key:   short_type_name(std::any::type_name::<K>()).to_string(),
                value: short_type_name(std::any::type_name::<V>()).to_string(),
            }),
        }
    }

    /// Lists the registered key/value type names in registration order.
    pub fn registered(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.registries.values().map(|entry| (entry.key, entry.value))
    }

    /// The number of registered registries.
    pub fn len(&self) -> usize { self.registries.len() }

    /// Whether no registries have been registered.
    pub fn is_empty(&self) -> bool { self.registries.is_empty() }
}

impl fmt::Debug for RegistryManager {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RegistryManager")
            .field("window", &self.window)
            .field("registries", &self.registered().collect::<Vec<_>>())
            .finish()
    }
}
