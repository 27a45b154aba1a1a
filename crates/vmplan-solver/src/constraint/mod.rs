//! Solver side of the constraints.
//!
//! A [`SatConstraint`] only describes a property of a model. To take part
//! in a solve it is mapped to a [`SolverConstraint`] that knows how to
//! restrict a [`ReconfigurationProblem`].

mod placement;
mod state;

use std::collections::{BTreeSet, HashMap};
use std::fmt::Debug;

use vmplan_core::{
    Ban, Fence, Model, Offline, Online, Ready, Result, Root, Running, RunningCapacity,
    SatConstraint, SchedulerError, Sleeping, Vm, VmState,
};

use crate::params::Parameters;
use crate::problem::ReconfigurationProblem;
use crate::transition::VmTransition;

pub use placement::{BanConstraint, FenceConstraint, RootConstraint, RunningCapacityConstraint};
pub use state::{NodeStateConstraint, VmStateConstraint};

/// A constraint able to restrict a reconfiguration problem.
pub trait SolverConstraint: Debug + Send {
    /// Posts the restrictions.
    ///
    /// Returns `Ok(false)` when the problem is found infeasible while
    /// injecting.
    fn inject(&self, params: &Parameters, rp: &mut ReconfigurationProblem) -> Result<bool>;

    /// The VMs of a model that must be managed to satisfy the constraint.
    fn mis_placed_vms(&self, model: &Model) -> BTreeSet<Vm>;

    /// States some VMs must have at the end of the reconfiguration.
    fn next_vm_states(&self) -> Vec<(Vm, VmState)> {
        Vec::new()
    }
}

/// Turns a model constraint into a solver constraint. `None` when the
/// constraint is not of the expected type.
pub type ConstraintBuilder = fn(&dyn SatConstraint) -> Option<Box<dyn SolverConstraint>>;

/// Registry of the solver constraints, by constraint kind.
///
/// # Example
///
/// ```
/// use vmplan_core::{Ban, Node, Vm};
/// use vmplan_solver::ConstraintMapper;
///
/// let mapper = ConstraintMapper::new_bundle();
/// let ban = Ban::new([Vm(0)], [Node(1)]);
/// assert!(mapper.is_registered("ban"));
/// assert!(mapper.map(&ban).is_ok());
///
/// let empty = ConstraintMapper::new();
/// assert!(empty.map(&ban).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConstraintMapper {
    builders: HashMap<&'static str, ConstraintBuilder>,
}

impl ConstraintMapper {
    /// A mapper knowing no constraint.
    pub fn new() -> Self {
        Self::default()
    }

    /// A mapper knowing every built-in constraint.
    pub fn new_bundle() -> Self {
        let mut m = Self::new();
        m.register("running", map_running);
        m.register("ready", map_ready);
        m.register("sleeping", map_sleeping);
        m.register("online", map_online);
        m.register("offline", map_offline);
        m.register("ban", map_ban);
        m.register("fence", map_fence);
        m.register("root", map_root);
        m.register("runningCapacity", map_running_capacity);
        m
    }

    /// Registers the builder for a kind, returning the previous one.
    pub fn register(
        &mut self,
        kind: &'static str,
        builder: ConstraintBuilder,
    ) -> Option<ConstraintBuilder> {
        self.builders.insert(kind, builder)
    }

    pub fn unregister(&mut self, kind: &str) -> Option<ConstraintBuilder> {
        self.builders.remove(kind)
    }

    pub fn is_registered(&self, kind: &str) -> bool {
        self.builders.contains_key(kind)
    }

    /// Maps a model constraint.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::ModelInconsistency`] when the kind is unknown, the
    /// builder rejects the constraint, or the constraint is continuous.
    pub fn map(&self, c: &dyn SatConstraint) -> Result<Box<dyn SolverConstraint>> {
        if c.is_continuous() {
            return Err(SchedulerError::inconsistency(format!(
                "continuous restriction of '{}' is not supported",
                c.kind()
            )));
        }
        let builder = self.builders.get(c.kind()).ok_or_else(|| {
            SchedulerError::inconsistency(format!("no solver constraint for '{}'", c.kind()))
        })?;
        builder(c).ok_or_else(|| {
            SchedulerError::inconsistency(format!(
                "the builder registered for '{}' rejected {:?}",
                c.kind(),
                c
            ))
        })
    }
}

fn map_running(c: &dyn SatConstraint) -> Option<Box<dyn SolverConstraint>> {
    let c = c.downcast_ref::<Running>()?;
    Some(Box::new(VmStateConstraint::new(c.vms().iter().copied(), VmState::Running)))
}

fn map_ready(c: &dyn SatConstraint) -> Option<Box<dyn SolverConstraint>> {
    let c = c.downcast_ref::<Ready>()?;
    Some(Box::new(VmStateConstraint::new(c.vms().iter().copied(), VmState::Ready)))
}

fn map_sleeping(c: &dyn SatConstraint) -> Option<Box<dyn SolverConstraint>> {
    let c = c.downcast_ref::<Sleeping>()?;
    Some(Box::new(VmStateConstraint::new(c.vms().iter().copied(), VmState::Sleeping)))
}

fn map_online(c: &dyn SatConstraint) -> Option<Box<dyn SolverConstraint>> {
    let c = c.downcast_ref::<Online>()?;
    Some(Box::new(NodeStateConstraint::new(c.nodes().iter().copied(), true)))
}

fn map_offline(c: &dyn SatConstraint) -> Option<Box<dyn SolverConstraint>> {
    let c = c.downcast_ref::<Offline>()?;
    Some(Box::new(NodeStateConstraint::new(c.nodes().iter().copied(), false)))
}

fn map_ban(c: &dyn SatConstraint) -> Option<Box<dyn SolverConstraint>> {
    let c = c.downcast_ref::<Ban>()?;
    Some(Box::new(BanConstraint::new(c.vms().clone(), c.nodes().clone())))
}

fn map_fence(c: &dyn SatConstraint) -> Option<Box<dyn SolverConstraint>> {
    let c = c.downcast_ref::<Fence>()?;
    Some(Box::new(FenceConstraint::new(c.vms().clone(), c.nodes().clone())))
}

fn map_root(c: &dyn SatConstraint) -> Option<Box<dyn SolverConstraint>> {
    let c = c.downcast_ref::<Root>()?;
    Some(Box::new(RootConstraint::new(c.vms().clone())))
}

fn map_running_capacity(c: &dyn SatConstraint) -> Option<Box<dyn SolverConstraint>> {
    let c = c.downcast_ref::<RunningCapacity>()?;
    Some(Box::new(RunningCapacityConstraint::new(c.nodes().clone(), c.amount())))
}

/// The transition of a VM named by a constraint.
fn transition_of(rp: &ReconfigurationProblem, vm: Vm) -> Result<&VmTransition> {
    rp.vm_transition(vm)
        .ok_or_else(|| SchedulerError::inconsistency(format!("{} is not part of the problem", vm)))
}

#[cfg(test)]
mod tests;
