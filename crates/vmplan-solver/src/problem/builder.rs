//! Builder of reconfiguration problems.

use std::collections::{BTreeSet, HashMap};
use std::time::Instant;

use tracing::debug;
use vmplan_core::{Model, Result, SchedulerError, Vm, VmState};

use super::{ReconfigurationProblem, RESTART_FACTOR};
use crate::cp::{Csp, GeometricRestarts, Linear};
use crate::params::Parameters;
use crate::scheduler::{NodeWindow, SliceScheduler};
use crate::transition::{Transition, TransitionContext};

/// Builds a [`ReconfigurationProblem`] from a source model.
///
/// By default every VM keeps its state and is manageable.
///
/// # Example
///
/// ```
/// use vmplan_core::{Model, VmState};
/// use vmplan_solver::{Parameters, ReconfigurationProblemBuilder};
///
/// let mut mo = Model::new();
/// let n = mo.new_node();
/// let v = mo.new_vm();
/// mo.mapping_mut().add_online_node(n);
/// mo.mapping_mut().add_running_vm(v, n);
///
/// let rp = ReconfigurationProblemBuilder::new(&mo)
///     .with_params(&Parameters::default())
///     .with_next_state(v, VmState::Ready)
///     .build()
///     .unwrap();
/// assert_eq!(rp.vm_transitions().len(), 1);
/// assert!(rp.future_ready_vms().contains(&v));
/// ```
#[derive(Debug)]
pub struct ReconfigurationProblemBuilder<'a> {
    model: &'a Model,
    params: Option<&'a Parameters>,
    next_states: HashMap<Vm, VmState>,
    manageable: Option<BTreeSet<Vm>>,
    mis_placed: BTreeSet<Vm>,
}

impl<'a> ReconfigurationProblemBuilder<'a> {
    pub fn new(model: &'a Model) -> Self {
        Self {
            model,
            params: None,
            next_states: HashMap::new(),
            manageable: None,
            mis_placed: BTreeSet::new(),
        }
    }

    pub fn with_params(mut self, params: &'a Parameters) -> Self {
        self.params = Some(params);
        self
    }

    /// Sets the state of a VM at the end of the reconfiguration.
    pub fn with_next_state(mut self, vm: Vm, state: VmState) -> Self {
        self.next_states.insert(vm, state);
        self
    }

    pub fn with_next_states(mut self, states: impl IntoIterator<Item = (Vm, VmState)>) -> Self {
        self.next_states.extend(states);
        self
    }

    /// Restricts the VMs whose placement may change. VMs changing state
    /// are managed anyway.
    pub fn with_manageable_vms(mut self, vms: BTreeSet<Vm>) -> Self {
        self.manageable = Some(vms);
        self
    }

    /// VMs known to violate a constraint, placed first by the search.
    pub fn with_mis_placed_vms(mut self, vms: BTreeSet<Vm>) -> Self {
        self.mis_placed = vms;
        self
    }

    /// Builds the problem.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::ModelInconsistency`] when a next state refers to
    /// an unknown VM, when no transition handles a state change, or when
    /// a duration cannot be estimated.
    pub fn build(self) -> Result<ReconfigurationProblem> {
        let started = Instant::now();
        let default_params = Parameters::default();
        let params = self.params.unwrap_or(&default_params);
        let map = self.model.mapping();

        for vm in self.next_states.keys() {
            if !map.contains_vm(*vm) {
                return Err(SchedulerError::inconsistency(format!(
                    "{} is not part of the model",
                    vm
                )));
            }
        }

        let nodes = map.all_nodes();
        let vms: Vec<Vm> = map.all_vms().collect();
        let hosts: Vec<i64> = nodes.iter().map(|n| n.id() as i64).collect();
        let max_end = params.max_end();

        let mut csp = Csp::new();
        let start = csp.constant(0);
        let end = csp.int_var("rp.end", 0, max_end);

        let mut ctx = TransitionContext {
            csp: &mut csp,
            model: self.model,
            durations: params.durations(),
            start,
            end,
            max_end,
            hosts: &hosts,
        };

        let mut node_transitions = Vec::with_capacity(nodes.len());
        for &n in &nodes {
            let state = map.node_state(n).ok_or_else(|| {
                SchedulerError::Internal(format!("{} listed without a state", n))
            })?;
            node_transitions.push(params.transitions().build_node(&mut ctx, n, state)?);
        }

        let mut next_states = HashMap::with_capacity(vms.len());
        let mut vm_transitions = Vec::with_capacity(vms.len());
        for &vm in &vms {
            let from = map.vm_state(vm).ok_or_else(|| {
                SchedulerError::Internal(format!("{} listed without a state", vm))
            })?;
            let to = self.next_states.get(&vm).copied().unwrap_or(from);
            let manageable = self.manageable.as_ref().map_or(true, |m| m.contains(&vm));
            let t = params
                .transitions()
                .build_vm(&mut ctx, vm, from, to, manageable)?;
            next_states.insert(vm, to);
            vm_transitions.push(t);
        }

        let node_index: HashMap<_, _> = nodes.iter().enumerate().map(|(i, n)| (*n, i)).collect();

        // a node keeping a sleeping VM stays online
        for &vm in &vms {
            if next_states.get(&vm) != Some(&VmState::Sleeping) {
                continue;
            }
            let &i = map
                .vm_location(vm)
                .and_then(|n| node_index.get(&n))
                .ok_or_else(|| {
                    SchedulerError::inconsistency(format!("{} cannot sleep without a host", vm))
                })?;
            let state = node_transitions[i].state();
            csp.post(Linear::eq(vec![(1, state)], 1));
        }

        let windows = nodes
            .iter()
            .zip(&node_transitions)
            .map(|(n, t)| NodeWindow {
                id: n.id() as i64,
                state: t.state(),
                hosting_start: t.hosting_start(),
                hosting_end: t.hosting_end(),
                capacity: self.model.resources().iter().map(|r| r.capacity(*n)).collect(),
            })
            .collect();
        let mut scheduler = SliceScheduler::new(windows, self.model.resources().len());
        for t in &vm_transitions {
            if let Some(c) = t.c_slice() {
                scheduler.add_c_slice(c);
            }
            if let Some(d) = t.d_slice() {
                scheduler.add_d_slice(d);
            }
        }
        debug!(
            event = "slices",
            c_slices = scheduler.nb_c_slices(),
            d_slices = scheduler.nb_d_slices(),
        );
        csp.post(scheduler);

        let manageable: BTreeSet<Vm> = vm_transitions
            .iter()
            .filter(|t| t.is_managed())
            .map(|t| t.vm())
            .collect();
        let vm_index = vms.iter().enumerate().map(|(i, v)| (*v, i)).collect();
        let restarts = params
            .restarts()
            .then(|| GeometricRestarts::new(2 * vms.len() as u64, RESTART_FACTOR));
        let build_duration = started.elapsed();
        debug!(
            event = "problem_built",
            nodes = nodes.len(),
            vms = vms.len(),
            managed_vms = manageable.len(),
            variables = csp.nb_vars(),
            propagators = csp.nb_propagators(),
            duration_ms = build_duration.as_millis() as u64,
        );
        Ok(ReconfigurationProblem {
            csp,
            source: self.model.clone(),
            start,
            end,
            max_end,
            durations: params.durations().clone(),
            nodes,
            node_index,
            vms,
            vm_index,
            hosts,
            node_transitions,
            vm_transitions,
            manageable,
            mis_placed: self.mis_placed,
            next_states,
            objective: None,
            strategy: None,
            restarts,
            build_duration,
        })
    }
}
