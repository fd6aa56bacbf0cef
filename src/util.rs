//! Miscellaneous helpers for type identification.

use std::any::TypeId;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A [`TypeId`] that remembers the type name in debug builds.
#[derive(Clone, Copy)]
pub struct DbgTypeId {
    id:   TypeId,
    #[cfg(debug_assertions)]
    name: &'static str,
}

impl DbgTypeId {
    /// Identifies the type `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            #[cfg(debug_assertions)]
            name: std::any::type_name::<T>(),
        }
    }

    /// The underlying [`TypeId`].
    pub fn id(&self) -> TypeId { self.id }
}

impl PartialEq for DbgTypeId {
    fn eq(&self, other: &Self) -> bool { self.id == other.id }
}

impl Eq for DbgTypeId {}

impl PartialOrd for DbgTypeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for DbgTypeId {
    fn cmp(&self, other: &Self) -> Ordering { self.id.cmp(&other.id) }
}

impl Hash for DbgTypeId {
    fn hash<H: Hasher>(&self, state: &mut H) { self.id.hash(state) }
}

impl fmt::Debug for DbgTypeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { fmt::Display::fmt(self, f) }
}

impl fmt::Display for DbgTypeId {
    #[cfg(debug_assertions)]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "{}", self.name) }

    #[cfg(not(debug_assertions))]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "{:?}", self.id) }
}

/// Strips the module path and generic arguments from a [`std::any::type_name`].
///
/// `alloc::vec::Vec<u8>` becomes `Vec`.
pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    let base = match full.find('<') {
        Some(generic_start) => &full[..generic_start],
        None => full,
    };
    match base.rfind("::") {
        Some(sep) => &base[sep + 2..],
        None => base,
    }
}

/// Renders a [`std::any::type_name`] as the name segment of a type identifier.
///
/// Module paths are stripped from every path in the name while generic arguments are kept,
/// so `core::option::Option<alloc::string::String>` becomes `Option<String>`.
/// The separators `.`, `:` and `#` become `_`.
/// Whitespace after `,` and `;` is dropped, and any other whitespace becomes `_`.
pub(crate) fn type_segment(full: &str) -> String {
    let mut segment = String::with_capacity(full.len());
    let mut path_start = 0;

    let mut chars = full.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch.is_alphanumeric() || ch == '_' {
            segment.push(ch);
            continue;
        }

        if ch == ':' && chars.peek() == Some(&':') {
            chars.next();
            segment.truncate(path_start);
            continue;
        }

        if ch.is_whitespace() {
            if segment.ends_with([',', ';']) {
                continue;
            }
            segment.push('_');
        } else if matches!(ch, '.' | ':' | '#') {
            segment.push('_');
        } else {
            segment.push(ch);
        }
        path_start = segment.len();
    }

    segment
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("alloc::vec::Vec<u8>"), "Vec");
        assert_eq!(short_type_name("loocast::enemy::EnemyManager"), "EnemyManager");
        assert_eq!(short_type_name("u32"), "u32");
        assert_eq!(
            short_type_name("std::collections::HashMap<a::B, c::D>"),
            "HashMap",
            "generic arguments with paths should not leak into the short name",
        );
    }

    #[test]
    fn test_type_segment() {
        assert_eq!(type_segment("loocast::enemy::EnemyManager"), "EnemyManager");
        assert_eq!(type_segment("u32"), "u32");
        assert_eq!(type_segment("core::option::Option<u8>"), "Option<u8>");
        assert_eq!(
            type_segment("std::collections::HashMap<a::B, alloc::vec::Vec<c::D>>"),
            "HashMap<B,Vec<D>>"
        );
        assert_eq!(type_segment("[u8; 4]"), "[u8;4]");
        assert_eq!(type_segment("(u8, u16)"), "(u8,u16)");
        assert_eq!(type_segment("&mut dyn core::any::Any"), "&mut_dyn_Any");
        assert_eq!(type_segment("<a::T as b::Trait>::Output"), "<T_as_Trait>Output");
    }

    #[test]
    fn test_dbg_type_id_eq() {
        assert_eq!(DbgTypeId::of::<u32>(), DbgTypeId::of::<u32>());
        assert_ne!(DbgTypeId::of::<u32>(), DbgTypeId::of::<i32>());
    }
}
