//! Problem instances.

use std::fmt;
use std::sync::Arc;

use crate::constraint::SatConstraint;
use crate::model::Model;

/// Optimization goal of a reconfiguration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Objective {
    /// Minimize the sum of the completion times of every transition.
    #[default]
    MinMttr,
    /// Minimize the number of VM relocations.
    MinMigrations,
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Objective::MinMttr => write!(f, "minimizeMTTR()"),
            Objective::MinMigrations => write!(f, "minimizeMigrations()"),
        }
    }
}

/// A model, the constraints to satisfy and the objective to optimize.
///
/// Constraints are shared, so cloning an instance is cheap apart from
/// the model.
#[derive(Debug, Clone)]
pub struct Instance {
    model: Model,
    constraints: Vec<Arc<dyn SatConstraint>>,
    objective: Objective,
}

impl Instance {
    pub fn new(model: Model, constraints: Vec<Arc<dyn SatConstraint>>, objective: Objective) -> Self {
        Self {
            model,
            constraints,
            objective,
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut Model {
        &mut self.model
    }

    pub fn constraints(&self) -> &[Arc<dyn SatConstraint>] {
        &self.constraints
    }

    pub fn add_constraint(&mut self, c: Arc<dyn SatConstraint>) {
        self.constraints.push(c);
    }

    pub fn objective(&self) -> Objective {
        self.objective
    }

    /// Constraints that are not satisfied by the given model.
    pub fn unsatisfied<'a>(&'a self, model: &'a Model) -> impl Iterator<Item = &'a Arc<dyn SatConstraint>> {
        self.constraints.iter().filter(move |c| !c.is_satisfied(model))
    }
}
