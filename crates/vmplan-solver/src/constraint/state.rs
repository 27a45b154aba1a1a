//! State constraints.

use std::collections::BTreeSet;

use vmplan_core::{Model, Node, Result, SchedulerError, Vm, VmState};

use super::SolverConstraint;
use crate::params::Parameters;
use crate::problem::ReconfigurationProblem;
use crate::transition::Transition;

/// Forces the state of VMs at the end of the reconfiguration.
///
/// The state is applied when the problem is built, through
/// [`SolverConstraint::next_vm_states`].
#[derive(Debug, Clone)]
pub struct VmStateConstraint {
    vms: BTreeSet<Vm>,
    state: VmState,
}

impl VmStateConstraint {
    pub fn new(vms: impl IntoIterator<Item = Vm>, state: VmState) -> Self {
        Self {
            vms: vms.into_iter().collect(),
            state,
        }
    }

    pub fn state(&self) -> VmState {
        self.state
    }
}

impl SolverConstraint for VmStateConstraint {
    fn inject(&self, _params: &Parameters, _rp: &mut ReconfigurationProblem) -> Result<bool> {
        Ok(true)
    }

    fn mis_placed_vms(&self, model: &Model) -> BTreeSet<Vm> {
        self.vms
            .iter()
            .copied()
            .filter(|v| model.mapping().vm_state(*v) != Some(self.state))
            .collect()
    }

    fn next_vm_states(&self) -> Vec<(Vm, VmState)> {
        self.vms.iter().map(|v| (*v, self.state)).collect()
    }
}

/// Forces nodes online or offline at the end of the reconfiguration.
#[derive(Debug, Clone)]
pub struct NodeStateConstraint {
    nodes: BTreeSet<Node>,
    online: bool,
}

impl NodeStateConstraint {
    pub fn new(nodes: impl IntoIterator<Item = Node>, online: bool) -> Self {
        Self {
            nodes: nodes.into_iter().collect(),
            online,
        }
    }
}

impl SolverConstraint for NodeStateConstraint {
    fn inject(&self, _params: &Parameters, rp: &mut ReconfigurationProblem) -> Result<bool> {
        for &n in &self.nodes {
            let state = rp
                .node_transition(n)
                .map(|t| t.state())
                .ok_or_else(|| {
                    SchedulerError::inconsistency(format!("{} is not part of the problem", n))
                })?;
            if rp
                .csp_mut()
                .store_mut()
                .instantiate(state, self.online as i64)
                .is_err()
            {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Running VMs have to leave a node going offline.
    fn mis_placed_vms(&self, model: &Model) -> BTreeSet<Vm> {
        if self.online {
            return BTreeSet::new();
        }
        self.nodes
            .iter()
            .flat_map(|n| model.mapping().running_vms_on(*n))
            .collect()
    }
}
