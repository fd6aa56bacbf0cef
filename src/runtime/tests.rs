use itertools::iproduct;
use strum::{EnumCount, IntoEnumIterator};

use super::*;
use crate::identifier::{InstanceIdentifier, TypeIdentifier};
use crate::registry::{Shared, Window};
use crate::test_util::{self, Event, EventTracer, Journal, Recorder, Step, THREE_LEVEL_PRE_ORDER};
use crate::tracer::{self, Aggregate, Noop};
use crate::ty::NativeType;
use crate::Catalog;

#[test]
fn test_tree_shape() {
    let (runtime, nodes) = test_util::three_level(&Journal::default());

    assert_eq!(runtime.len(), 5);
    assert_eq!(
        runtime.pre_order().iter().map(|&index| runtime.path_of(index)).collect::<Vec<_>>(),
        THREE_LEVEL_PRE_ORDER
    );
    assert_eq!(runtime.kind_of(nodes.root), Kind::Manager);
    assert_eq!(runtime.kind_of(nodes.enemy), Kind::ModuleManager);
    assert_eq!(runtime.kind_of(nodes.health), Kind::SubModuleManager);
    assert_eq!(runtime.parent_of(nodes.target), Some(nodes.mission));
    assert_eq!(runtime.children_of(nodes.root), &[nodes.mission, nodes.enemy]);
    assert_eq!(runtime.state(), State::Uninitialized);
}

#[test]
fn test_initialize_waits_for_tree_pre_initialize() {
    test_util::init();

    // every node must complete a phase before any node enters the next one
    let orders = Phase::iter().zip(Phase::iter().skip(1)).flat_map(|(prev, next)| {
        iproduct!(THREE_LEVEL_PRE_ORDER, THREE_LEVEL_PRE_ORDER).map(move |(before, after)| {
            (Event::new(before, prev, Step::Complete), Event::new(after, next, Step::Enter))
        })
    });
    let tracer = EventTracer::new(orders.collect::<Vec<_>>());

    let journal = Journal::default();
    let (mut runtime, _) = test_util::three_level(&journal);
    runtime.start(&tracer).expect("bring-up succeeds");
    runtime.shutdown(&tracer).expect("teardown succeeds");

    let events = tracer.get_events();
    assert_eq!(events.len(), 5 * Phase::COUNT * 2);

    // the barrier also holds between the subtree of a node and the node itself
    for path in THREE_LEVEL_PRE_ORDER {
        let initialize = journal.position(path, Phase::Initialize).expect("initialize ran");
        for descendant in THREE_LEVEL_PRE_ORDER.iter().filter(|other| other.starts_with(path)) {
            let pre_initialize =
                journal.position(descendant, Phase::PreInitialize).expect("pre-initialize ran");
            assert!(
                pre_initialize < initialize,
                "{descendant} pre-initialized after {path} initialized"
            );
        }
    }
}

#[test]
fn test_hooks_are_phase_sorted() {
    let journal = Journal::default();
    let (mut runtime, _) = test_util::three_level(&journal);
    runtime.start(&Noop).expect("bring-up succeeds");
    runtime.shutdown(&Noop).expect("teardown succeeds");

    let phases: Vec<Phase> = journal.hooks().into_iter().map(|(_, phase)| phase).collect();
    assert_eq!(phases.len(), 5 * Phase::COUNT);
    assert!(phases.windows(2).all(|pair| pair[0] <= pair[1]), "phases interleave: {phases:?}");
}

#[test]
fn test_termination_reverses_initialization() {
    let journal = Journal::default();
    let (mut runtime, _) = test_util::three_level(&journal);
    runtime.start(&Noop).expect("bring-up succeeds");
    runtime.shutdown(&Noop).expect("teardown succeeds");

    for phase in Phase::initialization() {
        assert_eq!(journal.order_of(phase), THREE_LEVEL_PRE_ORDER);
    }

    let mut reversed = THREE_LEVEL_PRE_ORDER;
    reversed.reverse();
    for phase in Phase::termination() {
        assert_eq!(journal.order_of(phase), reversed, "{phase} did not run in reverse order");
    }

    let target = journal.position("LooCast.Mission.Target", Phase::Terminate);
    let mission = journal.position("LooCast.Mission", Phase::Terminate);
    assert!(target < mission, "sub-modules terminate before their module");
}

#[test]
fn test_node_states_follow_global_state() {
    let (mut runtime, nodes) = test_util::three_level(&Journal::default());
    runtime.start(&Noop).expect("bring-up succeeds");

    assert!(runtime.state().is_steady());
    for &index in runtime.pre_order() {
        assert_eq!(runtime.node_state(index), State::Completed(Phase::PostInitialize));
    }

    runtime.shutdown(&Noop).expect("teardown succeeds");
    assert!(runtime.state().is_terminal());
    assert!(runtime.node_state(nodes.health).is_terminal());
}

#[test]
fn test_identity_registration() {
    let (mut runtime, nodes) = test_util::three_level(&Journal::default());
    runtime.start(&Noop).expect("bring-up succeeds");

    let cx = runtime.context();
    assert_eq!(cx.registries().window(), Window::Sealed);
    assert_eq!(cx.namespaces().len(), 5);
    for path in THREE_LEVEL_PRE_ORDER {
        cx.namespaces().get(path).expect("every manager has a namespace");
    }

    let health = runtime.identity_of(nodes.health).expect("registered");
    let enemy = runtime.identity_of(nodes.enemy).expect("registered");
    let root = runtime.identity_of(nodes.root).expect("registered");

    let health_ns = cx.namespaces().namespace(health.namespace);
    assert_eq!(health_ns.id().to_string(), "LooCast.Enemy.Health");
    assert_eq!(health_ns.parent(), Some(enemy.namespace));

    let ty_id = TypeIdentifier::parse("LooCast.Enemy.Health:Recorder").expect("valid identifier");
    assert_eq!(cx.types().get(&ty_id).expect("manager type is registered").handle(), health.ty);

    let instance = cx.instances().instance(health.instance).expect("manager instance is alive");
    assert_eq!(instance.parent(), Some(enemy.instance));
    assert_eq!(instance.id().ty(), &ty_id);
    let root_instance = cx.instances().root_of(health.instance).map(|root| root.handle());
    assert_eq!(root_instance, Some(root.instance));
    assert_eq!(cx.instances().get(instance.id()).expect("registered").handle(), health.instance);
}

#[test]
fn test_owned_types() {
    let journal = Journal::default();
    let mut builder = Builder::new(Recorder::new("LooCast", &journal));
    builder.module(Recorder::new("Enemy", &journal).owning(NativeType::of::<u32>()));
    let mut runtime = builder.build();
    runtime.start(&Noop).expect("bring-up succeeds");

    let types = runtime.context().types();
    let id = TypeIdentifier::parse("LooCast.Enemy:u32").expect("valid identifier");
    assert_eq!(types.get(&id).expect("owned type is registered").native(), NativeType::of::<u32>());
    assert_eq!(types.len(), 3);
}

#[test]
fn test_duplicate_sibling_fails_bring_up() {
    test_util::init();

    let journal = Journal::default();
    let mut builder = Builder::new(Recorder::new("LooCast", &journal));
    builder.module(Recorder::new("Enemy", &journal));
    builder.module(Recorder::new("Enemy", &journal));
    let mut runtime = builder.build();

    let err = runtime.start(&tracer::Log(log::Level::Trace)).expect_err("duplicate namespace");
    match &err {
        Error::PhaseFailed { phase, manager, .. } => {
            assert_eq!(*phase, Phase::PreInitialize);
            assert_eq!(manager, "LooCast.Enemy");
        }
        _ => panic!("unexpected error {err}"),
    }
    match err.root_cause() {
        Error::DuplicateName { scope, name } => {
            assert_eq!(scope, "LooCast");
            assert_eq!(name, "Enemy");
        }
        cause => panic!("unexpected root cause {cause}"),
    }

    assert!(runtime.is_failed());
    assert_eq!(runtime.state(), State::Entered(Phase::PreInitialize));
    assert_eq!(runtime.context().namespaces().len(), 2, "the failed namespace is not created");

    assert_eq!(runtime.context().registries().window(), Window::Sealed);
    let err = runtime
        .context_mut()
        .registries_mut()
        .create_registry::<TypeIdentifier, u32>()
        .expect_err("failed runtimes accept no registries");
    assert!(matches!(err, Error::Phase { operation: "register a registry", .. }), "{err}");

    let err = runtime.start(&Noop).expect_err("failed runtimes cannot restart");
    assert!(matches!(err, Error::Phase { operation: "start", .. }), "{err}");
    let err = runtime.shutdown(&Noop).expect_err("failed runtimes cannot shut down");
    assert!(matches!(err, Error::Phase { operation: "shut down", .. }), "{err}");
}

#[test]
fn test_hook_failure_aborts_sweep() {
    let journal = Journal::default();
    let (mut runtime, nodes) = test_util::three_level_with(&journal, |name| match name {
        "Enemy" => Some(Phase::Initialize),
        _ => None,
    });

    let err = runtime.start(&Noop).expect_err("injected failure");
    assert!(
        matches!(&err, Error::PhaseFailed { phase: Phase::Initialize, manager, .. }
            if manager == "LooCast.Enemy"),
        "{err}"
    );
    assert!(matches!(err.root_cause(), Error::InvalidParent { .. }));

    assert_eq!(journal.order_of(Phase::Initialize), &THREE_LEVEL_PRE_ORDER[..4]);
    assert_eq!(journal.position("LooCast", Phase::PostInitialize), None);
    assert_eq!(runtime.node_state(nodes.enemy), State::Entered(Phase::Initialize));
    assert_eq!(runtime.node_state(nodes.health), State::Completed(Phase::PreInitialize));
    assert_eq!(runtime.node_state(nodes.target), State::Completed(Phase::Initialize));
    assert_eq!(runtime.state(), State::Entered(Phase::Initialize));
    assert!(runtime.is_failed());
}

#[test]
fn test_teardown_failure_poisons_runtime() {
    let journal = Journal::default();
    let (mut runtime, _) = test_util::three_level_with(&journal, |name| match name {
        "Target" => Some(Phase::PreTerminate),
        _ => None,
    });
    runtime.start(&Noop).expect("bring-up succeeds");

    let err = runtime.shutdown(&Noop).expect_err("injected failure");
    assert!(matches!(&err, Error::PhaseFailed { phase: Phase::PreTerminate, .. }), "{err}");
    assert!(runtime.is_failed());
    assert_eq!(
        journal.order_of(Phase::PreTerminate),
        ["LooCast.Enemy.Health", "LooCast.Enemy", "LooCast.Mission.Target"]
    );
    assert_eq!(runtime.context().instances().len(), 5, "instances outlive a failed teardown");
}

#[test]
fn test_shutdown_destroys_instances() {
    let (mut runtime, nodes) = test_util::three_level(&Journal::default());
    runtime.start(&Noop).expect("bring-up succeeds");
    assert_eq!(runtime.context().instances().len(), 5);

    let health = runtime.identity_of(nodes.health).expect("registered");
    runtime.shutdown(&Noop).expect("teardown succeeds");

    let cx = runtime.context();
    assert!(cx.instances().is_empty());
    assert!(!cx.instances().is_alive(health.instance));
    assert_eq!(cx.types().len(), 5, "types outlive their instances");
    assert_eq!(cx.namespaces().len(), 5);
}

#[test]
fn test_lifecycle_misuse() {
    let (mut runtime, _) = test_util::three_level(&Journal::default());

    let err = runtime.shutdown(&Noop).expect_err("shutdown before start");
    assert!(matches!(err, Error::Phase { operation: "shut down", .. }), "{err}");
    assert!(!runtime.is_failed(), "rejected calls do not poison the runtime");

    runtime.start(&Noop).expect("bring-up succeeds");
    let err = runtime.start(&Noop).expect_err("start twice");
    assert!(matches!(err, Error::Phase { operation: "start", .. }), "{err}");
    runtime.shutdown(&Noop).expect("teardown succeeds");
}

/// Scores keyed by the instance they belong to.
type Scores = Shared<InstanceIdentifier, u32>;

/// Creates the score registry while the registry window is open.
#[derive(Default)]
struct Scoreboard {
    scores: Option<Scores>,
}

impl Manager for Scoreboard {
    fn name(&self) -> &str { "Scoreboard" }

    fn pre_initialize(&mut self, cx: &mut Context, _me: &Identity) -> Result<()> {
        self.scores = Some(cx.registries_mut().create_registry()?);
        Ok(())
    }

    fn terminate(&mut self, _cx: &mut Context, _me: &Identity) -> Result<()> {
        if let Some(scores) = &self.scores {
            assert!(scores.read().is_empty(), "scores are released during pre-termination");
        }
        Ok(())
    }
}

/// Uses the score registry of a sibling that pre-initializes after it.
#[derive(Default)]
struct Player {
    premature_lookup: Option<Error>,
    late_create:      Option<Error>,
    scoreboard_path:  Option<String>,
}

impl Manager for Player {
    fn name(&self) -> &str { "Player" }

    fn pre_initialize(&mut self, cx: &mut Context, _me: &Identity) -> Result<()> {
        self.premature_lookup = cx.registries().get_registry::<InstanceIdentifier, u32>().err();
        Ok(())
    }

    fn initialize(&mut self, cx: &mut Context, me: &Identity) -> Result<()> {
        let scoreboard = cx.namespaces().get("LooCast.Scoreboard")?;
        self.scoreboard_path = Some(scoreboard.id().to_string());

        let instance = cx.instances().instance(me.instance).expect("alive").id().clone();
        let scores = cx.registries().get_registry::<InstanceIdentifier, u32>()?;
        scores.write().register(instance, 42)?;

        self.late_create = cx.registries_mut().create_registry::<TypeIdentifier, u32>().err();
        Ok(())
    }

    fn pre_terminate(&mut self, cx: &mut Context, me: &Identity) -> Result<()> {
        let instance = cx.instances().instance(me.instance).expect("alive").id().clone();
        let scores = cx.registries().get_registry::<InstanceIdentifier, u32>()?;
        assert_eq!(scores.write().unregister(&instance)?, 42);
        Ok(())
    }
}

#[test]
fn test_registry_window_and_cross_manager_lookup() {
    test_util::init();

    let journal = Journal::default();
    let mut builder = Builder::new(Recorder::new("LooCast", &journal));
    builder.module(Player::default());
    builder.module(Scoreboard::default());
    let mut runtime = builder.build();
    assert_eq!(runtime.context().registries().window(), Window::Closed);

    runtime.start(&Noop).expect("bring-up succeeds");

    let player = runtime.manager::<Player>().expect("player is in the tree");
    assert!(matches!(player.premature_lookup, Some(Error::Phase { .. })));
    assert!(matches!(
        player.late_create,
        Some(Error::Phase { operation: "register a registry", .. })
    ));
    assert_eq!(player.scoreboard_path.as_deref(), Some("LooCast.Scoreboard"));

    let scores = runtime
        .context()
        .registries()
        .get_registry::<InstanceIdentifier, u32>()
        .expect("registered by the scoreboard");
    let id = InstanceIdentifier::parse("LooCast.Player:Player#1").expect("valid identifier");
    assert_eq!(scores.read().get(&id).expect("registered by the player"), 42);
    assert_eq!(runtime.context().registries().len(), 4);

    runtime.shutdown(&Noop).expect("teardown succeeds");
    assert!(scores.read().is_empty());
}

#[test]
fn test_manager_downcast() {
    let journal = Journal::default();
    let mut builder = Builder::new(Recorder::new("LooCast", &journal));
    let player = builder.module(Player::default());
    let mut runtime = builder.build();

    assert_eq!(runtime.index_of::<Player>(), Some(player));
    assert_eq!(runtime.index_of::<Recorder>(), Some(runtime.root()));
    assert!(runtime.manager::<Scoreboard>().is_none());
    assert_eq!(runtime.manager_at(player).name(), "Player");

    let manager = runtime.manager_mut::<Player>().expect("player is in the tree");
    manager.scoreboard_path = Some("set".into());
    assert_eq!(runtime.manager::<Player>().and_then(|p| p.scoreboard_path.as_deref()), Some("set"));
}

lazy_static::lazy_static! {
    static ref CATALOG: Catalog = {
        let mut catalog = Catalog::new();
        catalog.insert::<Scoreboard>("loocast.scoreboard").expect("fresh key");
        catalog.insert::<Player>("loocast.player").expect("fresh key");
        catalog
    };
}

/// Contributes the scoring feature from the static catalog.
struct Scoring;

impl Bundle for Scoring {
    fn register(&self, builder: &mut Builder, parent: NodeIndex) {
        for key in ["loocast.player", "loocast.scoreboard"] {
            builder.from_catalog(parent, &CATALOG, key).expect("key is in the catalog");
        }
    }
}

#[test]
fn test_bundle_from_catalog() {
    test_util::init();

    let journal = Journal::default();
    let mut runtime = crate::new(Recorder::new("LooCast", &journal), [&Scoring as &dyn Bundle]);
    assert_eq!(runtime.len(), 3);

    let tracer = Aggregate((EventTracer::<Event>::new([]), tracer::Log(log::Level::Trace)));
    runtime.start(&tracer).expect("bring-up succeeds");
    runtime.shutdown(&tracer).expect("teardown succeeds");

    let Aggregate((events, _)) = tracer;
    let events = events.get_events();
    assert_eq!(events.first(), Some(&Event::new("LooCast", Phase::PreInitialize, Step::Enter)));
    let last = Event::new("LooCast", Phase::LatePostTerminate, Step::Complete);
    assert_eq!(events.last(), Some(&last));
    assert_eq!(journal.hooks().len(), Phase::COUNT);
}
