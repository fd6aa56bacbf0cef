//! The error taxonomy shared by every registry and lifecycle operation.

use crate::lifecycle::Phase;

/// Result type used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised by the identity, registry and lifecycle runtime.
///
/// None of these are recoverable at the point of detection.
/// They propagate up through the phase driver and abort the bring-up or teardown.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A namespace or type name is already taken in the same scope.
    #[error("{name:?} is already declared in {scope}")]
    DuplicateName {
        /// The scope in which the name collides, e.g. `LooCast.Enemy` or `the root scope`.
        scope: String,
        /// The colliding name.
        name:  String,
    },

    /// A native type was registered twice in the same namespace.
    #[error("Type {native} is already registered in namespace {namespace}")]
    DuplicateType {
        /// The native type name.
        native:    &'static str,
        /// The qualified namespace path.
        namespace: String,
    },

    /// A key is already present in the local scope of a registry.
    #[error("Key {key} is already registered in {registry}")]
    DuplicateKey {
        /// The label of the registry.
        registry: String,
        /// The duplicate key.
        key:      String,
    },

    /// A registry for the same key/value pair has already been registered.
    #[error("A registry of {key} => {value} has already been registered")]
    DuplicateRegistry {
        /// The key type name.
        key:   String,
        /// The value type name.
        value: String,
    },

    /// A key is absent from a registry and all of its base registries.
    #[error("Key {key} is not registered in {registry}")]
    KeyNotFound {
        /// The label of the registry.
        registry: String,
        /// The missing key.
        key:      String,
    },

    /// No registry was registered for a key/value pair.
    #[error("No registry of {key} => {value} has been registered")]
    RegistryNotFound {
        /// The key type name.
        key:   String,
        /// The value type name.
        value: String,
    },

    /// A segment of a namespace path is not registered.
    #[error("Namespace {path} cannot be resolved: segment {segment:?} is not registered")]
    NamespaceNotFound {
        /// The requested path.
        path:    String,
        /// The first unregistered segment.
        segment: String,
    },

    /// A namespace or type name cannot be used as a path segment.
    #[error("{name:?} is not a valid name: {reason}")]
    InvalidName {
        /// The rejected name.
        name:   String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// An operation was attempted outside its legal lifecycle window.
    #[error("Cannot {operation} {actual}; this is only allowed {allowed}")]
    Phase {
        /// The attempted operation.
        operation: &'static str,
        /// The window in which the operation is legal.
        allowed:   &'static str,
        /// The current lifecycle state.
        actual:    String,
    },

    /// A parent handle does not refer to a live object.
    #[error("Invalid parent for {child}: {reason}")]
    InvalidParent {
        /// The object being parented.
        child:  String,
        /// Why the parent was rejected.
        reason: String,
    },

    /// A parent assignment would turn the instance tree into a cyclic graph.
    #[error("Cannot parent {child} under {parent} because {parent} descends from {child}")]
    Cycle {
        /// The instance being parented.
        child:  String,
        /// The rejected parent.
        parent: String,
    },

    /// A manager failed during a lifecycle phase, aborting the whole sweep.
    #[error("{manager} failed during {phase}")]
    PhaseFailed {
        /// The phase being swept.
        phase:   Phase,
        /// The qualified name of the failing manager.
        manager: String,
        /// The underlying failure.
        #[source]
        source:  Box<Error>,
    },
}

impl Error {
    /// Returns the innermost error, unwrapping [`Error::PhaseFailed`] layers.
    pub fn root_cause(&self) -> &Error {
        match self {
            Self::PhaseFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
