//! Manager lifecycle phases and the capability trait implemented by every manager.
//!
//! A manager node goes through ten phases, each entered and completed exactly once:
//! three initialization phases during bring-up
//! and seven termination phases during teardown.
//! The [`runtime`](crate::runtime) drives every node of the manager tree
//! through each phase before any node may enter the next one.

use std::any::Any;
use std::cmp::Ordering;
use std::fmt;

use strum::{EnumCount, EnumIter, IntoEnumIterator, IntoStaticStr};

use crate::context::Context;
use crate::instance::InstanceHandle;
use crate::namespace::NamespaceHandle;
use crate::ty::{NativeType, TypeHandle};
use crate::{Error, Result};


/// A lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(EnumCount, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    /// Registers the namespace, type and instance of every manager.
    PreInitialize,
    /// Runs logic that depends on other managers being registered.
    Initialize,
    /// Runs logic that depends on other managers being initialized.
    PostInitialize,
    /// The first termination phase.
    EarlyPreTerminate,
    /// The second termination phase.
    PreTerminate,
    /// The main termination phase.
    Terminate,
    /// The fourth termination phase.
    LatePreTerminate,
    /// The fifth termination phase.
    EarlyPostTerminate,
    /// The sixth termination phase.
    PostTerminate,
    /// The last termination phase. Manager instances are destroyed after it.
    LatePostTerminate,
}

impl Phase {
    /// The phases run during bring-up, in order.
    pub fn initialization() -> impl Iterator<Item = Phase> {
        Phase::iter().filter(|phase| !phase.is_termination())
    }

    /// The phases run during teardown, in order.
    pub fn termination() -> impl Iterator<Item = Phase> {
        Phase::iter().filter(|phase| phase.is_termination())
    }

    /// Whether this phase belongs to teardown.
    pub fn is_termination(self) -> bool { self >= Phase::EarlyPreTerminate }

    /// The snake_case name of the phase, which is also the name of its [`Manager`] hook.
    pub fn name(self) -> &'static str { self.into() }

    /// The first phase.
    pub fn first() -> Phase { Phase::PreInitialize }

    /// The last phase.
    pub fn last() -> Phase { Phase::LatePostTerminate }

    fn index(self) -> usize { self as usize }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { f.write_str(self.name()) }
}

/// The lifecycle state of a manager node or of the whole runtime.
///
/// States are totally ordered;
/// a valid transition always advances to the immediately following state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// No phase has been entered yet.
    Uninitialized,
    /// The phase has been entered but not completed, e.g. `PreInitializing`.
    Entered(Phase),
    /// The phase has been completed, e.g. `PreInitialized`.
    Completed(Phase),
}

impl State {
    /// The number of distinct states.
    pub const COUNT: usize = Phase::COUNT * 2 + 1;

    fn rank(self) -> usize {
        match self {
            Self::Uninitialized => 0,
            Self::Entered(phase) => phase.index() * 2 + 1,
            Self::Completed(phase) => phase.index() * 2 + 2,
        }
    }

    /// The state immediately after this one, if this is not the terminal state.
    pub fn next(self) -> Option<State> {
        match self {
            Self::Uninitialized => Some(Self::Entered(Phase::first())),
            Self::Entered(phase) => Some(Self::Completed(phase)),
            Self::Completed(phase) => {
                Phase::iter().find(|&next| next.index() == phase.index() + 1).map(Self::Entered)
            }
        }
    }

    /// Whether `phase` has been entered, regardless of whether it has completed.
    pub fn has_entered(self, phase: Phase) -> bool { self >= Self::Entered(phase) }

    /// Whether `phase` has completed.
    pub fn has_completed(self, phase: Phase) -> bool { self >= Self::Completed(phase) }

    /// Whether the state is currently inside `phase`.
    pub fn is_in(self, phase: Phase) -> bool { self == Self::Entered(phase) }

    /// Whether bring-up has completed and teardown has not started.
    pub fn is_steady(self) -> bool { self == Self::Completed(Phase::PostInitialize) }

    /// Whether the final phase has completed.
    pub fn is_terminal(self) -> bool { self == Self::Completed(Phase::last()) }

    /// Advances to `to`, which must be the immediately following state.
    pub fn advance(&mut self, to: State) -> Result<()> {
        if self.next() != Some(to) {
            return Err(Error::Phase {
                operation: "transition",
                allowed:   "to the immediately following lifecycle state",
                actual:    format!("from {self} to {to}"),
            });
        }
        *self = to;
        Ok(())
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering { self.rank().cmp(&other.rank()) }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Uninitialized => f.write_str("uninitialized"),
            Self::Entered(phase) => write!(f, "entered {phase}"),
            Self::Completed(phase) => write!(f, "completed {phase}"),
        }
    }
}

/// The position of a manager in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// The root manager of the runtime.
    Manager,
    /// A direct child of the root manager.
    ModuleManager,
    /// A manager nested inside a module.
    SubModuleManager,
}

impl Kind {
    pub(crate) fn at_depth(depth: usize) -> Self {
        match depth {
            0 => Self::Manager,
            1 => Self::ModuleManager,
            _ => Self::SubModuleManager,
        }
    }
}

/// The registered identity of a manager, available from [`Phase::PreInitialize`] onwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identity {
    /// The namespace created for the manager.
    pub namespace: NamespaceHandle,
    /// The type registered for the manager itself.
    pub ty:        TypeHandle,
    /// The instance representing the manager.
    pub instance:  InstanceHandle,
}

/// A coordinating singleton of a feature subsystem.
///
/// Every hook defaults to doing nothing.
/// Identity registration happens in the phase driver before
/// [`pre_initialize`](Self::pre_initialize) is called,
/// so hooks only contain the manager's own logic.
pub trait Manager: Send + 'static {
    /// The namespace segment of this manager, e.g. `Enemy`.
    fn name(&self) -> &str;

    /// The native types owned by this manager,
    /// registered into its namespace during pre-initialization.
    fn owned_types(&self) -> Vec<NativeType> { Vec::new() }

    /// Pre-initialization logic. Other managers may not be registered yet.
    fn pre_initialize(&mut self, _cx: &mut Context, _me: &Identity) -> Result<()> { Ok(()) }

    /// Initialization logic. All managers are registered.
    fn initialize(&mut self, _cx: &mut Context, _me: &Identity) -> Result<()> { Ok(()) }

    /// Post-initialization logic. All managers are initialized.
    fn post_initialize(&mut self, _cx: &mut Context, _me: &Identity) -> Result<()> { Ok(()) }

    /// The first termination hook.
    fn early_pre_terminate(&mut self, _cx: &mut Context, _me: &Identity) -> Result<()> { Ok(()) }

    /// The second termination hook.
    fn pre_terminate(&mut self, _cx: &mut Context, _me: &Identity) -> Result<()> { Ok(()) }

    /// The main termination hook.
    fn terminate(&mut self, _cx: &mut Context, _me: &Identity) -> Result<()> { Ok(()) }

    /// The fourth termination hook.
    fn late_pre_terminate(&mut self, _cx: &mut Context, _me: &Identity) -> Result<()> { Ok(()) }

    /// The fifth termination hook.
    fn early_post_terminate(&mut self, _cx: &mut Context, _me: &Identity) -> Result<()> { Ok(()) }

    /// The sixth termination hook.
    fn post_terminate(&mut self, _cx: &mut Context, _me: &Identity) -> Result<()> { Ok(()) }

    /// The last termination hook. The manager instance is destroyed right after it returns.
    fn late_post_terminate(&mut self, _cx: &mut Context, _me: &Identity) -> Result<()> { Ok(()) }
}

/// Object-safe access to a boxed [`Manager`].
pub trait AnyManager: Manager {
    /// Describes the concrete manager type.
    fn native_type(&self) -> NativeType;

    /// Dispatches `phase` to the corresponding hook.
    fn run_phase(&mut self, phase: Phase, cx: &mut Context, me: &Identity) -> Result<()>;

    /// Upcasts for downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Upcasts for downcasting to the concrete type.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Manager> AnyManager for T {
    fn native_type(&self) -> NativeType { NativeType::of::<T>() }

    fn run_phase(&mut self, phase: Phase, cx: &mut Context, me: &Identity) -> Result<()> {
        match phase {
            Phase::PreInitialize => self.pre_initialize(cx, me),
            Phase::Initialize => self.initialize(cx, me),
            Phase::PostInitialize => self.post_initialize(cx, me),
            Phase::EarlyPreTerminate => self.early_pre_terminate(cx, me),
            Phase::PreTerminate => self.pre_terminate(cx, me),
            Phase::Terminate => self.terminate(cx, me),
            Phase::LatePreTerminate => self.late_pre_terminate(cx, me),
            Phase::EarlyPostTerminate => self.early_post_terminate(cx, me),
            Phase::PostTerminate => self.post_terminate(cx, me),
            Phase::LatePostTerminate => self.late_post_terminate(cx, me),
        }
    }

    fn as_any(&self) -> &dyn Any { self }

    fn as_any_mut(&mut self) -> &mut dyn Any { self }
}
