//! Exposes testing, profiling and tracing capabilities for lifecycle sweeps.

use std::fmt;

use crate::lifecycle::{Kind, Phase};
use crate::runtime::NodeIndex;
use crate::Error;

/// Describes the manager node an event refers to.
#[derive(Debug, Clone, Copy)]
pub struct NodeInfo<'t> {
    /// The index of the node in the manager tree.
    pub index: NodeIndex,
    /// The qualified namespace path of the manager, e.g. `LooCast.Enemy`.
    pub path:  &'t str,
    /// The position of the node in the tree.
    pub kind:  Kind,
}

impl<'t> fmt::Display for NodeInfo<'t> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?} {} (#{})", self.kind, self.path, self.index.0)
    }
}

/// A handler that receives lifecycle events.
///
/// All methods default to doing nothing.
pub trait Tracer: Sync {
    /// A tree-wide sweep of `phase` starts.
    fn start_sweep(&self, _phase: Phase) {}

    /// Every node has completed `phase`.
    fn end_sweep(&self, _phase: Phase) {}

    /// A node enters `phase`.
    fn enter_phase(&self, _node: NodeInfo<'_>, _phase: Phase) {}

    /// A node completes `phase`.
    fn complete_phase(&self, _node: NodeInfo<'_>, _phase: Phase) {}

    /// A node fails `phase`, aborting the sweep.
    fn fail_phase(&self, _node: NodeInfo<'_>, _phase: Phase, _error: &Error) {}
}

/// An empty tracer.
pub struct Noop;

impl Tracer for Noop {}

/// Groups two tracers and dispatches each call to them in serial.
pub struct Aggregate<T>(
    /// A pair of child tracers to execute in serial.
    pub T,
);

impl<A: Tracer, B: Tracer> Tracer for Aggregate<(A, B)> {
    fn start_sweep(&self, phase: Phase) {
        self.0 .0.start_sweep(phase);
        self.0 .1.start_sweep(phase);
    }

    fn end_sweep(&self, phase: Phase) {
        self.0 .0.end_sweep(phase);
        self.0 .1.end_sweep(phase);
    }

    fn enter_phase(&self, node: NodeInfo<'_>, phase: Phase) {
        self.0 .0.enter_phase(node, phase);
        self.0 .1.enter_phase(node, phase);
    }

    fn complete_phase(&self, node: NodeInfo<'_>, phase: Phase) {
        self.0 .0.complete_phase(node, phase);
        self.0 .1.complete_phase(node, phase);
    }

    fn fail_phase(&self, node: NodeInfo<'_>, phase: Phase, error: &Error) {
        self.0 .0.fail_phase(node, phase, error);
        self.0 .1.fail_phase(node, phase, error);
    }
}

/// A tracer that logs all events.
pub struct Log(
    /// The log level to log events with.
    pub log::Level,
);

impl Tracer for Log {
    fn start_sweep(&self, phase: Phase) { log::log!(self.0, "start_sweep(phase = {phase})") }

    fn end_sweep(&self, phase: Phase) { log::log!(self.0, "end_sweep(phase = {phase})") }

    fn enter_phase(&self, node: NodeInfo<'_>, phase: Phase) {
        log::log!(self.0, "enter_phase(node = {node}, phase = {phase})")
    }

    fn complete_phase(&self, node: NodeInfo<'_>, phase: Phase) {
        log::log!(self.0, "complete_phase(node = {node}, phase = {phase})")
    }

    fn fail_phase(&self, node: NodeInfo<'_>, phase: Phase, error: &Error) {
        log::error!("fail_phase(node = {node}, phase = {phase}, error = {error})")
    }
}
