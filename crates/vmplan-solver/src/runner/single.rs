//! Solves an instance in one piece.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};
use vmplan_core::{Instance, Result, SchedulerError, Vm, VmState};

use super::{InstanceResult, SolutionStatistics, SolveStatus, SolvingStatistics, Statistics};
use crate::constraint::SolverConstraint;
use crate::objective::solver_objective;
use crate::params::Parameters;
use crate::problem::ReconfigurationProblemBuilder;
use crate::termination::{
    BacktrackCountTermination, ExternalTermination, NodeCountTermination, OrTermination,
    TimeTermination,
};

/// Runs the solving pipeline of an instance:
///
/// 1. map the constraints to solver constraints and gather the VM states
///    they impose;
/// 2. compute the mis-placed VMs and, in repair mode, the VMs to manage;
/// 3. build the problem, inject the constraints then the objective;
/// 4. search within the limits of the parameters;
/// 5. extract the plan of the best solution.
#[derive(Debug)]
pub struct InstanceSolverRunner<'a> {
    params: &'a Parameters,
    instance: &'a Instance,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a> InstanceSolverRunner<'a> {
    pub fn new(params: &'a Parameters, instance: &'a Instance) -> Self {
        Self {
            params,
            instance,
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn termination(&self) -> OrTermination {
        let mut t = OrTermination::new();
        if let Some(limit) = self.params.time_limit() {
            t.push(TimeTermination::new(limit));
        }
        if let Some(limit) = self.params.backtrack_limit() {
            t.push(BacktrackCountTermination::new(limit));
        }
        if let Some(limit) = self.params.node_limit() {
            t.push(NodeCountTermination::new(limit));
        }
        if let Some(flag) = &self.cancel {
            t.push(ExternalTermination::new(flag.clone()));
        }
        t
    }

    pub fn run(&self) -> Result<InstanceResult> {
        let model = self.instance.model();
        let mapping = model.mapping();
        let mut stats = SolvingStatistics::new(
            mapping.nb_nodes(),
            mapping.nb_vms(),
            self.instance.constraints().len(),
        );
        info!(
            event = "solve_start",
            node_count = stats.nb_nodes,
            vm_count = stats.nb_vms,
            constraint_count = stats.nb_constraints,
            objective = %self.instance.objective(),
        );

        let cstrs = self
            .instance
            .constraints()
            .iter()
            .map(|c| self.params.mapper().map(c.as_ref()))
            .collect::<Result<Vec<Box<dyn SolverConstraint>>>>()?;
        let objective = solver_objective(self.instance.objective());

        let mut next_states: HashMap<Vm, VmState> = HashMap::new();
        for (vm, state) in cstrs.iter().flat_map(|c| c.next_vm_states()) {
            match next_states.insert(vm, state) {
                Some(previous) if previous != state => {
                    return Err(SchedulerError::inconsistency(format!(
                        "{} cannot be both {} and {}",
                        vm, previous, state
                    )));
                }
                _ => {}
            }
        }

        let mis_placed: BTreeSet<Vm> = cstrs
            .iter()
            .chain(std::iter::once(&objective))
            .flat_map(|c| c.mis_placed_vms(model))
            .collect();
        let mut builder = ReconfigurationProblemBuilder::new(model)
            .with_params(self.params)
            .with_next_states(next_states.iter().map(|(v, s)| (*v, *s)))
            .with_mis_placed_vms(mis_placed.clone());
        if self.params.repair() {
            let changing = next_states
                .iter()
                .filter(|(v, s)| mapping.vm_state(**v) != Some(**s))
                .map(|(v, _)| *v);
            builder = builder.with_manageable_vms(mis_placed.iter().copied().chain(changing).collect());
        }
        let mut rp = builder.build()?;
        stats.core_build_duration = rp.build_duration();
        stats.nb_managed_vms = rp.manageable_vms().len();

        let spe_start = Instant::now();
        let mut feasible = true;
        for c in cstrs.iter().chain(std::iter::once(&objective)) {
            if !c.inject(self.params, &mut rp)? {
                debug!(event = "infeasible_constraint", constraint = ?c);
                feasible = false;
                break;
            }
        }
        stats.spe_build_duration = spe_start.elapsed();
        debug!(
            event = "problem_ready",
            variables = rp.csp().nb_vars(),
            propagators = rp.csp().nb_propagators(),
            managed = stats.nb_managed_vms,
            mis_placed = mis_placed.len(),
        );

        if !feasible {
            info!(event = "solve_end", status = "infeasible", nodes = 0u64);
            return Ok(InstanceResult {
                plan: None,
                status: SolveStatus::Infeasible,
                statistics: Statistics::Single(stats),
            });
        }

        let outcome = rp.solve(&self.termination(), self.params.optimize());
        stats.nodes = outcome.nodes;
        stats.backtracks = outcome.backtracks;
        stats.restarts = outcome.restarts;
        stats.hit_timeout = outcome.hit_limit();
        stats.solutions = outcome
            .solutions
            .iter()
            .map(|s| SolutionStatistics {
                time: s.time,
                nodes: s.nodes,
                backtracks: s.backtracks,
                objective: s.objective,
            })
            .collect();

        let plan = outcome.best().map(|s| rp.build_plan(s));
        let status = match (&plan, outcome.hit_limit()) {
            (Some(_), _) => SolveStatus::Solved,
            (None, true) => SolveStatus::TimedOut,
            (None, false) => SolveStatus::Infeasible,
        };
        info!(
            event = "solve_end",
            status = ?status,
            actions = plan.as_ref().map_or(0, |p| p.size()),
            nodes = stats.nodes,
            backtracks = stats.backtracks,
            restarts = stats.restarts,
            solutions = stats.solutions.len(),
            elapsed_ms = outcome.elapsed.as_millis() as u64,
        );
        Ok(InstanceResult {
            plan,
            status,
            statistics: Statistics::Single(stats),
        })
    }
}
