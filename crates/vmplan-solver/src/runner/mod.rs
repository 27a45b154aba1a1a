//! Instance solvers.
//!
//! An [`InstanceSolver`] turns an [`Instance`] into a plan and a report.
//! [`DefaultInstanceSolver`] solves it as a whole; the partitioning
//! solvers of [`crate::partition`] split it first and reuse the default
//! solver on every part.

mod single;
mod statistics;

use std::fmt::Debug;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use vmplan_core::{Instance, ReconfigurationPlan, Result};

use crate::params::Parameters;

pub use single::InstanceSolverRunner;
pub use statistics::{PartitionedStatistics, SolutionStatistics, SolvingStatistics, Statistics};

/// How a solve ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// A plan was computed.
    Solved,
    /// The instance has no solution.
    Infeasible,
    /// A limit stopped the search before any solution was found.
    TimedOut,
}

/// Outcome of a solve.
#[derive(Debug, Clone)]
pub struct InstanceResult {
    /// The plan, absent unless [`SolveStatus::Solved`].
    pub plan: Option<ReconfigurationPlan>,
    pub status: SolveStatus,
    pub statistics: Statistics,
}

impl InstanceResult {
    pub fn is_solved(&self) -> bool {
        self.status == SolveStatus::Solved
    }
}

/// Solves instances.
///
/// Infeasible and interrupted searches are reported through
/// [`InstanceResult::status`]; errors are reserved to instances that
/// cannot be turned into a problem.
pub trait InstanceSolver: Send + Sync + Debug {
    fn solve(&self, params: &Parameters, instance: &Instance) -> Result<InstanceResult>;
}

/// Solves an instance in one piece, on the calling thread.
///
/// # Example
///
/// ```
/// use vmplan_solver::{DefaultInstanceSolver, InstanceSolver, Parameters, SolveStatus};
/// use vmplan_test::instances::shutdown_single_vm;
///
/// let f = shutdown_single_vm();
/// let result = DefaultInstanceSolver::new()
///     .solve(&Parameters::default(), &f.instance)
///     .unwrap();
///
/// assert_eq!(result.status, SolveStatus::Solved);
/// assert_eq!(result.plan.unwrap().size(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DefaultInstanceSolver {
    cancel: Option<Arc<AtomicBool>>,
}

impl DefaultInstanceSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stops the search once the flag is raised.
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }
}

impl InstanceSolver for DefaultInstanceSolver {
    fn solve(&self, params: &Parameters, instance: &Instance) -> Result<InstanceResult> {
        let mut runner = InstanceSolverRunner::new(params, instance);
        if let Some(flag) = &self.cancel {
            runner = runner.with_cancel(flag.clone());
        }
        runner.run()
    }
}

#[cfg(test)]
mod tests;
