use super::tree::{Node, Tree};
use super::NodeIndex;
use crate::context::Context;
use crate::lifecycle::{AnyManager, Identity, Phase, State};
use crate::tracer::{NodeInfo, Tracer};
use crate::{Error, Result};

/// Drives every node of `tree` through `phase`.
///
/// Returns on the first failure, leaving the failing node in the entered state.
pub(super) fn sweep(
    tree: &mut Tree,
    cx: &mut Context,
    global: &mut State,
    phase: Phase,
    tracer: &impl Tracer,
) -> Result<()> {
    global.advance(State::Entered(phase))?;
    tracer.start_sweep(phase);
    log::debug!("Sweeping {phase} over {} managers", tree.len());

    let order: Vec<NodeIndex> = if phase.is_termination() {
        tree.pre_order().iter().rev().copied().collect()
    } else {
        tree.pre_order().to_vec()
    };

    for index in order {
        run_node(tree, cx, index, phase, tracer)?;
    }

    verify_sweep(tree, phase);
    global.advance(State::Completed(phase))?;
    tracer.end_sweep(phase);
    Ok(())
}

fn run_node(
    tree: &mut Tree,
    cx: &mut Context,
    index: NodeIndex,
    phase: Phase,
    tracer: &impl Tracer,
) -> Result<()> {
    let parent_identity = tree.node(index).parent.map(|parent| {
        tree.node(parent).identity.expect("parents are pre-initialized before their children")
    });

    let Node { manager, path, kind, state, identity, .. } = tree.node_mut(index);
    let info = NodeInfo { index, path, kind: *kind };

    let result = state
        .advance(State::Entered(phase))
        .and_then(|()| {
            tracer.enter_phase(info, phase);
            execute(&mut **manager, identity, parent_identity, cx, phase)
        })
        .and_then(|()| state.advance(State::Completed(phase)));

    match result {
        Ok(()) => {
            tracer.complete_phase(info, phase);
            Ok(())
        }
        Err(err) => {
            tracer.fail_phase(info, phase, &err);
            Err(Error::PhaseFailed { phase, manager: path.clone(), source: Box::new(err) })
        }
    }
}

fn execute(
    manager: &mut dyn AnyManager,
    identity: &mut Option<Identity>,
    parent: Option<Identity>,
    cx: &mut Context,
    phase: Phase,
) -> Result<()> {
    if phase == Phase::PreInitialize {
        *identity = Some(register_identity(manager, parent, cx)?);
    }
    let me = identity.expect("identity is registered during pre-initialization");

    manager.run_phase(phase, cx, &me)?;

    if phase == Phase::last() {
        let destroyed = cx.instances_mut().destroy(me.instance)?;
        log::trace!("Destroyed manager instances {destroyed:?}");
    }

    Ok(())
}

/// Registers the namespace, type and instance of a manager and every type it owns.
fn register_identity(
    manager: &dyn AnyManager,
    parent: Option<Identity>,
    cx: &mut Context,
) -> Result<Identity> {
    let (_, namespaces, types, instances) = cx.split_mut();

    let namespace = namespaces.create(manager.name(), parent.map(|parent| parent.namespace))?;
    let namespace_node = namespaces.namespace(namespace);

    let ty = types.create(manager.native_type(), namespace_node)?;
    let instance = instances.create(types.ty(ty), parent.map(|parent| parent.instance))?;

    for owned in manager.owned_types() {
        types.create(owned, namespace_node)?;
    }

    Ok(Identity { namespace, ty, instance })
}

cfg_if::cfg_if! {
    if #[cfg(feature = "debug-phase-check")] {
        fn verify_sweep(tree: &Tree, phase: Phase) {
            for (_, node) in tree.iter() {
                debug_assert_eq!(
                    node.state,
                    State::Completed(phase),
                    "{} did not complete {phase} within its sweep",
                    node.path,
                );
            }
        }
    } else {
        fn verify_sweep(_tree: &Tree, _phase: Phase) {}
    }
}
