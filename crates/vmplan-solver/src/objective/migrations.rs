use std::collections::BTreeSet;

use tracing::debug;
use vmplan_core::{Model, Result, Vm};

use crate::constraint::SolverConstraint;
use crate::cp::Linear;
use crate::heuristic::default_strategy;
use crate::params::Parameters;
use crate::problem::ReconfigurationProblem;

/// Minimizes the number of managed running VMs that leave their node.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinMigrations;

impl SolverConstraint for MinMigrations {
    fn inject(&self, params: &Parameters, rp: &mut ReconfigurationProblem) -> Result<bool> {
        let stays: Vec<_> = rp
            .vm_transitions()
            .iter()
            .filter_map(|t| t.as_relocatable().map(|r| r.stay()))
            .collect();
        let n = stays.len() as i64;
        let cost = rp.csp_mut().int_var("migrations", 0, n);
        // cost + Σ stay = n
        let mut terms: Vec<(i64, _)> = stays.iter().map(|s| (1, *s)).collect();
        terms.push((1, cost));
        rp.csp_mut().post(Linear::eq(terms, n));
        debug!(event = "objective", kind = "migrations", relocatables = n);

        rp.set_objective(cost);
        let strategy = default_strategy(rp, params, cost);
        rp.set_strategy(Box::new(strategy));
        Ok(true)
    }

    fn mis_placed_vms(&self, _model: &Model) -> BTreeSet<Vm> {
        BTreeSet::new()
    }
}
