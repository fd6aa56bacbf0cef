//! The identity and registry runtime of LooCast.
//!
//! # Identities
//! Every named thing in the runtime lives in a hierarchical [namespace](namespace).
//! Native Rust types are registered as [types](ty) inside a namespace,
//! and live objects are tracked as [instances](instance) of a registered type.
//! The three kinds of identifiers are [`NamespaceId`], [`TypeIdentifier`]
//! and [`InstanceIdentifier`]; each has a stable, parseable text form:
//!
//! ```text
//! LooCast.Enemy              namespace
//! LooCast.Enemy:Health       type
//! LooCast.Enemy:Health#3     instance
//! ```
//!
//! # Registries
//! A [`Registry`] is a keyed store that may fall back to a base registry on lookup misses.
//! Registries of every key/value pair are themselves registered in the [`RegistryManager`],
//! which only accepts registrations while the runtime is pre-initializing.
//!
//! # Managers
//! Feature subsystems are coordinated by [managers](Manager) arranged in a tree:
//! a single root manager, module managers below it, and sub-module managers below those.
//! The [`Runtime`] drives the tree through three initialization phases
//! and seven termination phases.
//! Every manager completes a phase before any manager enters the next one,
//! so a manager may rely on all of its peers being registered when it initializes.
//!
//! ```
//! use loocast_runtime::{tracer, Manager};
//!
//! struct Root;
//! impl Manager for Root {
//!     fn name(&self) -> &str { "LooCast" }
//! }
//!
//! let mut runtime = loocast_runtime::new(Root, []);
//! runtime.start(&tracer::Noop).unwrap();
//! assert!(runtime.context().namespaces().get("LooCast").is_ok());
//! runtime.shutdown(&tracer::Noop).unwrap();
//! ```

#![cfg_attr(not(debug_assertions), deny(missing_docs))]
#![cfg_attr(doc, warn(missing_docs))]

pub mod context;
pub use context::Context;

mod error;
pub use error::{Error, Result};

pub mod factory;
pub use factory::Catalog;

pub mod identifier;
pub use identifier::{
    AnyIdentifier, Identifiable, Identifier, InstanceIdentifier, NamespaceId, TypeIdentifier,
};

pub mod instance;

pub mod lifecycle;
pub use lifecycle::{Identity, Manager, Phase, State};

pub mod namespace;

pub mod registry;
pub use registry::{Registry, RegistryManager};

pub mod runtime;
pub use runtime::{new, Builder, Bundle, NodeIndex, Runtime};

#[cfg(any(test, feature = "internal-bench"))]
pub mod test_util;

pub mod tracer;

pub mod ty;
pub use ty::NativeType;

pub mod util;
