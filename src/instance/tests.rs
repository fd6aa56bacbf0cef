use super::*;
use crate::namespace::NamespaceManager;
use crate::test_util;
use crate::ty::{NativeType, TypeManager};

struct Ship;

fn ship_type() -> TypeManager {
    let mut namespaces = NamespaceManager::new();
    let root = namespaces.create("LooCast", None).expect("root");
    let mut types = TypeManager::new();
    types.create(NativeType::of::<Ship>(), namespaces.namespace(root)).expect("new type");
    types
}

fn ship(types: &TypeManager) -> &Type { types.iter().next().expect("one type registered") }

#[test]
fn test_create_links_parent() {
    test_util::init();

    let types = ship_type();
    let mut instances = InstanceManager::new();

    let root = instances.create(ship(&types), None).expect("root");
    let a = instances.create(ship(&types), Some(root)).expect("child a");
    let b = instances.create(ship(&types), Some(root)).expect("child b");

    let root_instance = instances.instance(root).expect("alive");
    assert_eq!(root_instance.children(), &[a, b]);
    assert_eq!(instances.instance(a).and_then(Instance::parent), Some(root));
    assert_eq!(instances.root_of(b).map(Instance::handle), Some(root));
    assert_eq!(instances.len(), 3);

    assert_eq!(root_instance.id().to_string(), "LooCast:Ship#0");
    let id = InstanceIdentifier::parse("LooCast:Ship#2").expect("valid");
    assert_eq!(instances.get(&id).expect("registered").handle(), b);
}

#[test]
fn test_set_parent_rejects_cycles() {
    let types = ship_type();
    let mut instances = InstanceManager::new();

    let root = instances.create(ship(&types), None).expect("root");
    let module = instances.create(ship(&types), Some(root)).expect("module");
    let leaf = instances.create(ship(&types), Some(module)).expect("leaf");

    let err = instances.set_parent(root, Some(leaf)).expect_err("leaf descends from root");
    assert!(matches!(err, Error::Cycle { .. }), "{err}");
    let err = instances.set_parent(module, Some(module)).expect_err("self parenting");
    assert!(matches!(err, Error::Cycle { .. }), "{err}");

    assert_eq!(instances.instance(root).expect("alive").children(), &[module]);
    assert_eq!(instances.instance(module).expect("alive").children(), &[leaf]);
    assert!(instances.instance(leaf).expect("alive").children().is_empty());
    assert_eq!(instances.instance(root).expect("alive").parent(), None);
}

#[test]
fn test_set_parent_moves_child() {
    let types = ship_type();
    let mut instances = InstanceManager::new();

    let a = instances.create(ship(&types), None).expect("a");
    let b = instances.create(ship(&types), None).expect("b");
    let c = instances.create(ship(&types), Some(a)).expect("c");

    instances.set_parent(c, Some(b)).expect("reparent");
    assert!(instances.instance(a).expect("alive").children().is_empty());
    assert_eq!(instances.instance(b).expect("alive").children(), &[c]);
    assert_eq!(instances.children(b), Some(&[c][..]));

    instances.set_parent(c, None).expect("detach");
    assert!(instances.instance(b).expect("alive").children().is_empty());
    assert_eq!(instances.root_of(c).map(Instance::handle), Some(c));
}

#[test]
fn test_destroy_subtree() {
    test_util::init();

    let types = ship_type();
    let mut instances = InstanceManager::new();

    let root = instances.create(ship(&types), None).expect("root");
    let module = instances.create(ship(&types), Some(root)).expect("module");
    let leaf = instances.create(ship(&types), Some(module)).expect("leaf");
    let sibling = instances.create(ship(&types), Some(root)).expect("sibling");

    let destroyed = instances.destroy(module).expect("live");
    let destroyed: Vec<_> = destroyed.iter().map(ToString::to_string).collect();
    assert_eq!(destroyed, vec!["LooCast:Ship#2", "LooCast:Ship#1"], "leaf is destroyed first");

    assert!(!instances.is_alive(module));
    assert!(!instances.is_alive(leaf));
    assert_eq!(instances.instance(root).expect("alive").children(), &[sibling]);
    assert_eq!(instances.registry().read().len(), 2);
    assert_eq!(instances.len(), 2);
}

#[test]
fn test_stale_handles() {
    let types = ship_type();
    let mut instances = InstanceManager::new();

    let old = instances.create(ship(&types), None).expect("old");
    instances.destroy(old).expect("live");
    let new = instances.create(ship(&types), None).expect("reuses the slot");

    assert_ne!(old, new);
    assert!(instances.instance(old).is_none());
    assert!(matches!(instances.destroy(old), Err(Error::KeyNotFound { .. })));
    assert!(matches!(instances.create(ship(&types), Some(old)), Err(Error::InvalidParent { .. })));
    assert!(matches!(instances.set_parent(new, Some(old)), Err(Error::InvalidParent { .. })));
    assert_eq!(instances.len(), 1);
}

#[test]
fn test_destroy_requires_registered_subtree() {
    let types = ship_type();
    let mut instances = InstanceManager::new();

    let root = instances.create(ship(&types), None).expect("root");
    let child = instances.create(ship(&types), Some(root)).expect("child");

    let child_id = instances.instance(child).expect("alive").id().clone();
    instances.registry().write().unregister(&child_id).expect("registered");

    let err = instances.destroy(root).expect_err("registry diverged");
    assert!(matches!(err, Error::KeyNotFound { .. }), "{err}");
    assert!(instances.is_alive(root), "a failed destruction must not destroy anything");
    assert!(instances.is_alive(child));
}
