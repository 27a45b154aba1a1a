//! The reconfiguration problem.
//!
//! A [`ReconfigurationProblem`] holds the constraint model of one instance:
//! a transition for every node and every VM, the slice scheduler bounding
//! node usage, and whatever the constraints and the objective inject on
//! top of it. Solving it and materializing the solution gives a
//! [`ReconfigurationPlan`].

mod builder;

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use vmplan_core::{
    Action, ActionKind, Element, Model, Node, ReconfigurationPlan, Result, Vm, VmState,
};

use crate::cp::{
    Csp, GeometricRestarts, IntVar, SearchOutcome, Solution, Strategy, StrategySequence,
};
use crate::duration::DurationEvaluators;
use crate::slice::Slice;
use crate::termination::Termination;
use crate::transition::{NodeTransition, Transition, TransitionContext, VmTransition};

pub use builder::ReconfigurationProblemBuilder;

/// Growth of the backtrack limit between two restarts.
pub const RESTART_FACTOR: f64 = 1.5;

/// The constraint model of a reconfiguration.
///
/// Nodes and VMs are indexed by increasing id. Hoster variables take node
/// ids as values.
#[derive(Debug)]
pub struct ReconfigurationProblem {
    csp: Csp,
    source: Model,
    start: IntVar,
    end: IntVar,
    max_end: i64,
    durations: DurationEvaluators,
    nodes: Vec<Node>,
    node_index: HashMap<Node, usize>,
    vms: Vec<Vm>,
    vm_index: HashMap<Vm, usize>,
    hosts: Vec<i64>,
    node_transitions: Vec<NodeTransition>,
    vm_transitions: Vec<VmTransition>,
    manageable: BTreeSet<Vm>,
    mis_placed: BTreeSet<Vm>,
    next_states: HashMap<Vm, VmState>,
    objective: Option<IntVar>,
    strategy: Option<Box<dyn Strategy>>,
    restarts: Option<GeometricRestarts>,
    build_duration: Duration,
}

impl ReconfigurationProblem {
    pub fn csp(&self) -> &Csp {
        &self.csp
    }

    pub fn csp_mut(&mut self) -> &mut Csp {
        &mut self.csp
    }

    /// The model the reconfiguration starts from.
    pub fn source_model(&self) -> &Model {
        &self.source
    }

    /// Beginning of the reconfiguration, the constant 0.
    pub fn start(&self) -> IntVar {
        self.start
    }

    /// End of the reconfiguration.
    pub fn end(&self) -> IntVar {
        self.end
    }

    pub fn max_end(&self) -> i64 {
        self.max_end
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn vms(&self) -> &[Vm] {
        &self.vms
    }

    pub fn node_index(&self, n: Node) -> Option<usize> {
        self.node_index.get(&n).copied()
    }

    pub fn vm_index(&self, vm: Vm) -> Option<usize> {
        self.vm_index.get(&vm).copied()
    }

    pub fn node_transitions(&self) -> &[NodeTransition] {
        &self.node_transitions
    }

    pub fn vm_transitions(&self) -> &[VmTransition] {
        &self.vm_transitions
    }

    pub fn node_transition(&self, n: Node) -> Option<&NodeTransition> {
        self.node_index(n).map(|i| &self.node_transitions[i])
    }

    pub fn vm_transition(&self, vm: Vm) -> Option<&VmTransition> {
        self.vm_index(vm).map(|i| &self.vm_transitions[i])
    }

    /// The VMs whose placement the search may change.
    pub fn manageable_vms(&self) -> &BTreeSet<Vm> {
        &self.manageable
    }

    /// The VMs known to violate a constraint in the source model.
    pub fn mis_placed_vms(&self) -> &BTreeSet<Vm> {
        &self.mis_placed
    }

    /// State of a VM at the end of the reconfiguration.
    pub fn next_state(&self, vm: Vm) -> Option<VmState> {
        self.next_states.get(&vm).copied()
    }

    /// The VMs running at the end of the reconfiguration.
    pub fn future_running_vms(&self) -> BTreeSet<Vm> {
        self.vms_ending(VmState::Running)
    }

    pub fn future_ready_vms(&self) -> BTreeSet<Vm> {
        self.vms_ending(VmState::Ready)
    }

    pub fn future_sleeping_vms(&self) -> BTreeSet<Vm> {
        self.vms_ending(VmState::Sleeping)
    }

    fn vms_ending(&self, state: VmState) -> BTreeSet<Vm> {
        self.next_states
            .iter()
            .filter(|(_, s)| **s == state)
            .map(|(v, _)| *v)
            .collect()
    }

    fn context(&mut self) -> TransitionContext<'_> {
        TransitionContext {
            csp: &mut self.csp,
            model: &self.source,
            durations: &self.durations,
            start: self.start,
            end: self.end,
            max_end: self.max_end,
            hosts: &self.hosts,
        }
    }

    /// A fresh hoster variable over every node.
    pub fn make_host_var(&mut self, label: &str) -> IntVar {
        self.context().host_var(label)
    }

    /// A fresh moment of the reconfiguration.
    pub fn make_time_var(&mut self, label: &str) -> IntVar {
        self.context().time_var(label)
    }

    /// Estimated duration of an action on an element.
    pub fn make_duration(&self, kind: ActionKind, e: impl Into<Element>) -> Result<i64> {
        self.durations.evaluate(&self.source, kind, e.into())
    }

    /// Every consuming slice, in VM order.
    pub fn c_slices(&self) -> impl Iterator<Item = &Slice> {
        self.vm_transitions.iter().filter_map(|t| t.c_slice())
    }

    /// Every demanding slice, in VM order.
    pub fn d_slices(&self) -> impl Iterator<Item = &Slice> {
        self.vm_transitions.iter().filter_map(|t| t.d_slice())
    }

    /// Sets the variable to minimize.
    pub fn set_objective(&mut self, cost: IntVar) {
        self.objective = Some(cost);
    }

    pub fn objective(&self) -> Option<IntVar> {
        self.objective
    }

    /// Sets the search heuristic.
    pub fn set_strategy(&mut self, strategy: Box<dyn Strategy>) {
        self.strategy = Some(strategy);
    }

    pub fn has_strategy(&self) -> bool {
        self.strategy.is_some()
    }

    /// Time spent building the core model.
    pub fn build_duration(&self) -> Duration {
        self.build_duration
    }

    /// The restart schedule of the optimizing search, if any.
    pub fn restarts(&self) -> Option<&GeometricRestarts> {
        self.restarts.as_ref()
    }

    pub fn set_restarts(&mut self, restarts: Option<GeometricRestarts>) {
        self.restarts = restarts;
    }

    /// Runs the search.
    ///
    /// When `optimize` is set and an objective was declared, the search
    /// keeps looking for cheaper solutions, restarting on the restart
    /// schedule, until the tree is exhausted or `termination` stops it.
    pub fn solve(&mut self, termination: &dyn Termination, optimize: bool) -> SearchOutcome {
        let minimize = if optimize { self.objective } else { None };
        let mut strategy = self
            .strategy
            .take()
            .unwrap_or_else(|| Box::new(StrategySequence::new()));
        let outcome =
            self.csp
                .search_with_restarts(strategy.as_mut(), minimize, termination, self.restarts);
        self.strategy = Some(strategy);
        outcome
    }

    /// The plan matching a solution: the actions of the node transitions
    /// then of the VM transitions, sorted by schedule order.
    pub fn build_plan(&self, solution: &Solution) -> ReconfigurationPlan {
        let mut actions: Vec<Action> = self
            .node_transitions
            .iter()
            .filter_map(|t| t.materialize(solution))
            .chain(
                self.vm_transitions
                    .iter()
                    .filter_map(|t| t.materialize(solution)),
            )
            .collect();
        actions.sort_by(Action::schedule_cmp);
        let mut plan = ReconfigurationPlan::new(self.source.clone());
        plan.extend(actions);
        plan
    }
}

#[cfg(test)]
mod tests;
