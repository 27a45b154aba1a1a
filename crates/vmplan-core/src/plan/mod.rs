//! Reconfiguration plans.

mod action;

use std::fmt;

pub use action::{Action, ActionKind, Operation};

use crate::error::{Result, SchedulerError};
use crate::model::{Element, Model};

/// A timed sequence of actions that reconfigures a model.
///
/// Actions are kept in insertion order. [`ReconfigurationPlan::apply`]
/// replays them in schedule order on a copy of the origin model.
///
/// # Example
///
/// ```
/// use vmplan_core::{Action, Model, Operation, ReconfigurationPlan};
///
/// let mut mo = Model::new();
/// let (n1, n2, v) = (mo.new_node(), mo.new_node(), mo.new_vm());
/// mo.mapping_mut().add_online_node(n1);
/// mo.mapping_mut().add_online_node(n2);
/// mo.mapping_mut().add_running_vm(v, n1);
///
/// let mut plan = ReconfigurationPlan::new(mo);
/// plan.add(Action::new(Operation::MigrateVm { vm: v, src: n1, dst: n2 }, 0, 3));
///
/// assert_eq!(plan.duration(), 3);
/// let result = plan.apply().unwrap();
/// assert_eq!(result.mapping().vm_location(v), Some(n2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconfigurationPlan {
    origin: Model,
    actions: Vec<Action>,
}

impl ReconfigurationPlan {
    pub fn new(origin: Model) -> Self {
        Self {
            origin,
            actions: Vec::new(),
        }
    }

    pub fn origin(&self) -> &Model {
        &self.origin
    }

    /// Appends an action.
    pub fn add(&mut self, a: Action) {
        self.actions.push(a);
    }

    pub fn extend(&mut self, actions: impl IntoIterator<Item = Action>) {
        self.actions.extend(actions);
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter()
    }

    pub fn size(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Moment the last action ends, 0 for an empty plan.
    pub fn duration(&self) -> i64 {
        self.actions.iter().map(|a| a.end).max().unwrap_or(0)
    }

    /// Actions involving the given element.
    pub fn actions_of(&self, e: impl Into<Element>) -> impl Iterator<Item = &Action> {
        let e = e.into();
        self.actions.iter().filter(move |a| a.op.subject() == e)
    }

    /// Actions sorted by schedule order.
    pub fn scheduled(&self) -> Vec<Action> {
        let mut sorted = self.actions.clone();
        sorted.sort_by(Action::schedule_cmp);
        sorted
    }

    /// Computes the model resulting from the plan.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::ModelInconsistency`] on the first action
    /// that cannot be applied.
    pub fn apply(&self) -> Result<Model> {
        let mut result = self.origin.clone();
        for a in self.scheduled() {
            if !a.op.apply(result.mapping_mut()) {
                return Err(SchedulerError::inconsistency(format!(
                    "unable to apply '{}'",
                    a
                )));
            }
        }
        Ok(result)
    }

    pub fn is_applyable(&self) -> bool {
        self.apply().is_ok()
    }
}

impl fmt::Display for ReconfigurationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for a in self.scheduled() {
            writeln!(f, "{}", a)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
