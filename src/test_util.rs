#![allow(missing_docs)]

use std::sync::Arc;

use parking_lot::{Mutex, Once};

use crate::context::Context;
use crate::lifecycle::{Identity, Manager, Phase};
use crate::runtime::{Builder, NodeIndex, Runtime};
use crate::ty::NativeType;
use crate::{Error, Result};

mod event_tracer;
pub use event_tracer::{Event, EventTracer, Step};

pub(crate) fn init() {
    static SET_LOGGER_ONCE: Once = Once::new();
    SET_LOGGER_ONCE.call_once(env_logger::init);
}

/// A hook invocation observed by a [`Recorder`]: the qualified namespace and the phase.
pub type Hook = (String, Phase);

/// A shared, ordered log of hook invocations.
#[derive(Default, Clone)]
pub struct Journal(Arc<Mutex<Vec<Hook>>>);

impl Journal {
    pub fn record(&self, namespace: String, phase: Phase) {
        self.0.lock().push((namespace, phase));
    }

    /// A snapshot of the recorded hooks.
    pub fn hooks(&self) -> Vec<Hook> { self.0.lock().clone() }

    /// The namespaces whose `phase` hook ran, in invocation order.
    pub fn order_of(&self, phase: Phase) -> Vec<String> {
        self.0.lock().iter().filter(|(_, p)| *p == phase).map(|(ns, _)| ns.clone()).collect()
    }

    /// The position of a hook invocation in the journal.
    pub fn position(&self, namespace: &str, phase: Phase) -> Option<usize> {
        self.0.lock().iter().position(|(ns, p)| ns == namespace && *p == phase)
    }
}

/// A manager that records every hook invocation into a [`Journal`].
pub struct Recorder {
    pub name:    &'static str,
    pub journal: Journal,
    /// The phase in which this manager fails, if any.
    pub fail_at: Option<Phase>,
    pub owned:   Vec<NativeType>,
}

impl Recorder {
    pub fn new(name: &'static str, journal: &Journal) -> Self {
        Self { name, journal: journal.clone(), fail_at: None, owned: Vec::new() }
    }

    pub fn failing_at(mut self, phase: Phase) -> Self {
        self.fail_at = Some(phase);
        self
    }

    pub fn owning(mut self, native: NativeType) -> Self {
        self.owned.push(native);
        self
    }

    fn hook(&mut self, cx: &mut Context, me: &Identity, phase: Phase) -> Result<()> {
        let namespace = cx.namespaces().namespace(me.namespace).id().to_string();
        self.journal.record(namespace.clone(), phase);

        if self.fail_at == Some(phase) {
            return Err(Error::InvalidParent {
                child:  namespace,
                reason: format!("injected failure during {phase}"),
            });
        }
        Ok(())
    }
}

macro_rules! recorder_hooks {
    ($($hook:ident => $phase:ident,)*) => {
        impl Manager for Recorder {
            fn name(&self) -> &str { self.name }

            fn owned_types(&self) -> Vec<NativeType> { self.owned.clone() }

            $(
                fn $hook(&mut self, cx: &mut Context, me: &Identity) -> Result<()> {
                    self.hook(cx, me, Phase::$phase)
                }
            )*
        }
    }
}

recorder_hooks! {
    pre_initialize => PreInitialize,
    initialize => Initialize,
    post_initialize => PostInitialize,
    early_pre_terminate => EarlyPreTerminate,
    pre_terminate => PreTerminate,
    terminate => Terminate,
    late_pre_terminate => LatePreTerminate,
    early_post_terminate => EarlyPostTerminate,
    post_terminate => PostTerminate,
    late_post_terminate => LatePostTerminate,
}

/// The nodes of [`three_level`].
pub struct ThreeLevel {
    pub root:    NodeIndex,
    pub mission: NodeIndex,
    pub target:  NodeIndex,
    pub enemy:   NodeIndex,
    pub health:  NodeIndex,
}

/// The qualified namespaces of [`three_level`] in pre-order.
pub const THREE_LEVEL_PRE_ORDER: [&str; 5] = [
    "LooCast",
    "LooCast.Mission",
    "LooCast.Mission.Target",
    "LooCast.Enemy",
    "LooCast.Enemy.Health",
];

/// Builds a manager tree of three levels whose managers all record into `journal`.
///
/// ```text
/// LooCast
/// ├── Mission
/// │   └── Target
/// └── Enemy
///     └── Health
/// ```
pub fn three_level(journal: &Journal) -> (Runtime, ThreeLevel) {
    three_level_with(journal, |_| None)
}

/// Like [`three_level`], but lets `fail` choose a failing phase for each manager by name.
pub fn three_level_with(
    journal: &Journal,
    fail: impl Fn(&'static str) -> Option<Phase>,
) -> (Runtime, ThreeLevel) {
    let recorder = |name: &'static str| {
        let recorder = Recorder::new(name, journal);
        match fail(name) {
            Some(phase) => recorder.failing_at(phase),
            None => recorder,
        }
    };

    let mut builder = Builder::new(recorder("LooCast"));
    let root = builder.root();
    let mission = builder.module(recorder("Mission"));
    let target = builder.sub_module(mission, recorder("Target"));
    let enemy = builder.module(recorder("Enemy"));
    let health = builder.sub_module(enemy, recorder("Health"));

    (builder.build(), ThreeLevel { root, mission, target, enemy, health })
}
