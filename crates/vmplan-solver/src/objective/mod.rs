//! Objectives of the reconfiguration problem.
//!
//! An objective is a [`SolverConstraint`](crate::SolverConstraint) that
//! declares a cost variable to minimize and installs the search
//! heuristics suited to it.

mod migrations;
mod mttr;

pub use migrations::MinMigrations;
pub use mttr::MinMttr;

use vmplan_core::Objective;

use crate::constraint::SolverConstraint;

/// The solver side of a model objective.
pub fn solver_objective(objective: Objective) -> Box<dyn SolverConstraint> {
    match objective {
        Objective::MinMttr => Box::new(MinMttr),
        Objective::MinMigrations => Box::new(MinMigrations),
    }
}
