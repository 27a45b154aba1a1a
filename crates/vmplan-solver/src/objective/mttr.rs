use std::collections::BTreeSet;

use tracing::debug;
use vmplan_core::{Model, Result, Vm};

use crate::constraint::SolverConstraint;
use crate::cp::Linear;
use crate::heuristic::default_strategy;
use crate::params::Parameters;
use crate::problem::ReconfigurationProblem;
use crate::transition::Transition;

/// Minimizes the mean time to repair: the sum of the end moments of every
/// transition.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinMttr;

impl SolverConstraint for MinMttr {
    fn inject(&self, params: &Parameters, rp: &mut ReconfigurationProblem) -> Result<bool> {
        let ends: Vec<_> = rp
            .node_transitions()
            .iter()
            .map(|t| t.end())
            .chain(rp.vm_transitions().iter().map(|t| t.end()))
            .collect();
        let ub = rp.max_end().saturating_mul(ends.len() as i64);
        let cost = rp.csp_mut().int_var("mttr", 0, ub);
        let mut terms: Vec<(i64, _)> = ends.iter().map(|e| (1, *e)).collect();
        terms.push((-1, cost));
        rp.csp_mut().post(Linear::eq(terms, 0));
        debug!(event = "objective", kind = "mttr", terms = ends.len());

        rp.set_objective(cost);
        let strategy = default_strategy(rp, params, cost);
        rp.set_strategy(Box::new(strategy));
        Ok(true)
    }

    fn mis_placed_vms(&self, _model: &Model) -> BTreeSet<Vm> {
        BTreeSet::new()
    }
}
