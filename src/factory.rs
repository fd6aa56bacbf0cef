//! Maps stable string keys to manager factories.
//!
//! The composition root resolves managers through a [`Catalog`]
//! instead of discovering them at runtime.

use std::borrow::Cow;
use std::fmt;

use crate::lifecycle::{AnyManager, Manager};
use crate::registry::Registry;
use crate::Result;

/// Constructs a fresh manager.
pub type Factory = fn() -> Box<dyn AnyManager>;

/// The stable key of a factory, e.g. `loocast.enemy`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FactoryKey(Cow<'static, str>);

impl FactoryKey {
    /// The key as a string.
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for FactoryKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { f.write_str(&self.0) }
}

/// A registry of manager factories.
pub struct Catalog {
    factories: Registry<FactoryKey, Factory>,
}

impl Default for Catalog {
    fn default() -> Self { Self::new() }
}

fn make_default<M: Manager + Default>() -> Box<dyn AnyManager> { Box::new(M::default()) }

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self { Self { factories: Registry::new().labeled("manager catalog") } }

    /// Registers `factory` under `key`.
    pub fn register(&mut self, key: impl Into<Cow<'static, str>>, factory: Factory) -> Result<()> {
        self.factories.register(FactoryKey(key.into()), factory)
    }

    /// Registers the [`Default`] constructor of `M` under `key`.
    pub fn insert<M>(&mut self, key: impl Into<Cow<'static, str>>) -> Result<()>
    where
        M: Manager + Default,
    {
        self.register(key, make_default::<M>)
    }

    /// Constructs the manager registered under `key`.
    pub fn instantiate(&self, key: &str) -> Result<Box<dyn AnyManager>> {
        let factory = self.factories.get(&FactoryKey(Cow::Owned(key.to_string())))?;
        Ok(factory())
    }

    /// Whether a factory is registered under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.factories.contains_local(&FactoryKey(Cow::Owned(key.to_string())))
    }

    /// The registered keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.factories.keys().map(FactoryKey::as_str)
    }
}
