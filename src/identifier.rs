//! Structural composite keys for namespaces, types and instances.
//!
//! Identifiers compare and hash by value.
//! Two identifiers built from the same path data are equal
//! no matter which code path constructed them,
//! so they always resolve to the same registry entry.

use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use itertools::Itertools;

use crate::{Error, Result};


/// A key that can index a [`Registry`](crate::Registry).
pub trait Identifier:
    Clone + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static
{
}
impl<T: Clone + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static> Identifier for T {}

/// A record that exposes its own identifier.
pub trait Identifiable {
    /// The identifier type of this record.
    type Id: Identifier;

    /// Returns the identifier of this record.
    fn identifier(&self) -> &Self::Id;
}

/// Checks that `name` can be used as a single path segment.
pub(crate) fn validate_name(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        "names must not be empty"
    } else if name.contains('.') {
        "names must not contain the namespace separator '.'"
    } else if name.contains(':') {
        "names must not contain the type separator ':'"
    } else if name.contains('#') {
        "names must not contain the instance separator '#'"
    } else if name.chars().any(char::is_whitespace) {
        "names must not contain whitespace"
    } else {
        return Ok(());
    };

    Err(Error::InvalidName { name: name.to_string(), reason })
}

/// The fully qualified path of a namespace, e.g. `LooCast.Mission.Target`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespaceId {
    segments: Vec<String>,
}

impl NamespaceId {
    /// Creates the identifier of a root namespace.
    pub fn root(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self { segments: vec![name] })
    }

    /// Creates the identifier of a direct child namespace.
    pub fn child(&self, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        let mut segments = self.segments.clone();
        segments.push(name);
        Ok(Self { segments })
    }

    /// Parses a dot-qualified path.
    pub fn parse(path: &str) -> Result<Self> {
        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        for segment in &segments {
            validate_name(segment)?;
        }
        Ok(Self { segments })
    }

    /// The path segments from the root to this namespace.
    pub fn segments(&self) -> &[String] { &self.segments }

    /// The unqualified name of this namespace.
    pub fn name(&self) -> &str { self.segments.last().expect("namespace paths are never empty") }

    /// The number of segments in the path.
    pub fn depth(&self) -> usize { self.segments.len() }

    /// The identifier of the parent namespace, if this is not a root.
    pub fn parent(&self) -> Option<Self> {
        match self.segments.split_last() {
            Some((_, rest)) if !rest.is_empty() => Some(Self { segments: rest.to_vec() }),
            _ => None,
        }
    }

    /// Whether `self` is a strict ancestor of `other`.
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        self.depth() < other.depth() && other.segments.starts_with(&self.segments)
    }
}

impl fmt::Display for NamespaceId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.segments.iter().join("."))
    }
}

impl fmt::Debug for NamespaceId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "NamespaceId({self})") }
}

impl FromStr for NamespaceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> { Self::parse(s) }
}

/// Identifies a type inside a namespace, e.g. `LooCast.Enemy:EnemyManager`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeIdentifier {
    namespace: NamespaceId,
    name:      String,
}

impl TypeIdentifier {
    /// Creates a type identifier from its namespace and unqualified name.
    pub fn new(namespace: NamespaceId, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self { namespace, name })
    }

    /// Parses a `Namespace.Path:TypeName` string.
    pub fn parse(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((namespace, name)) => Self::new(NamespaceId::parse(namespace)?, name),
            None => Err(Error::InvalidName {
                name:   s.to_string(),
                reason: "type identifiers must have the form `Namespace:Type`",
            }),
        }
    }

    /// The namespace containing the type.
    pub fn namespace(&self) -> &NamespaceId { &self.namespace }

    /// The unqualified type name.
    pub fn name(&self) -> &str { &self.name }
}

impl fmt::Display for TypeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.name)
    }
}

impl fmt::Debug for TypeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "TypeIdentifier({self})") }
}

impl FromStr for TypeIdentifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> { Self::parse(s) }
}

/// Identifies a live instance of a type, e.g. `LooCast.Enemy:EnemyManager#3`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceIdentifier {
    ty:     TypeIdentifier,
    serial: u64,
}

impl InstanceIdentifier {
    /// Creates an instance identifier from its type and per-runtime serial number.
    pub fn new(ty: TypeIdentifier, serial: u64) -> Self { Self { ty, serial } }

    /// Parses a `Namespace.Path:TypeName#serial` string.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidName {
            name:   s.to_string(),
            reason: "instance identifiers must have the form `Namespace:Type#serial`",
        };

        let (ty, serial) = s.rsplit_once('#').ok_or_else(invalid)?;
        let serial = serial.parse().map_err(|_| invalid())?;
        Ok(Self::new(TypeIdentifier::parse(ty)?, serial))
    }

    /// The type of the instance.
    pub fn ty(&self) -> &TypeIdentifier { &self.ty }

    /// The disambiguating serial number.
    pub fn serial(&self) -> u64 { self.serial }
}

impl fmt::Display for InstanceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}#{}", self.ty, self.serial)
    }
}

impl fmt::Debug for InstanceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InstanceIdentifier({self})")
    }
}

impl FromStr for InstanceIdentifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> { Self::parse(s) }
}

/// Any of the identifier kinds, for registries with heterogeneous keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AnyIdentifier {
    /// A namespace path.
    Namespace(NamespaceId),
    /// A type in a namespace.
    Type(TypeIdentifier),
    /// An instance of a type.
    Instance(InstanceIdentifier),
}

impl AnyIdentifier {
    /// The namespace that (transitively) qualifies this identifier.
    pub fn namespace(&self) -> &NamespaceId {
        match self {
            Self::Namespace(id) => id,
            Self::Type(id) => id.namespace(),
            Self::Instance(id) => id.ty().namespace(),
        }
    }
}

impl fmt::Display for AnyIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Namespace(id) => fmt::Display::fmt(id, f),
            Self::Type(id) => fmt::Display::fmt(id, f),
            Self::Instance(id) => fmt::Display::fmt(id, f),
        }
    }
}

impl From<NamespaceId> for AnyIdentifier {
    fn from(id: NamespaceId) -> Self { Self::Namespace(id) }
}

impl From<TypeIdentifier> for AnyIdentifier {
    fn from(id: TypeIdentifier) -> Self { Self::Type(id) }
}

impl From<InstanceIdentifier> for AnyIdentifier {
    fn from(id: InstanceIdentifier) -> Self { Self::Instance(id) }
}
