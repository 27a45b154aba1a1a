//! Placement constraints.

use std::collections::BTreeSet;

use vmplan_core::{Model, Node, Result, Vm};

use super::{transition_of, SolverConstraint};
use crate::cp::{AtMostInSet, DomainView, IntVar};
use crate::params::Parameters;
use crate::problem::ReconfigurationProblem;
use crate::transition::Transition;

/// Hoster of the demanding slice of a VM, if it has one.
fn hoster(rp: &ReconfigurationProblem, vm: Vm) -> Result<Option<IntVar>> {
    Ok(transition_of(rp, vm)?.d_slice().map(|s| s.hoster()))
}

fn ids(nodes: &BTreeSet<Node>) -> BTreeSet<i64> {
    nodes.iter().map(|n| n.id() as i64).collect()
}

/// Running VMs of `vms` whose host does not satisfy `accept`.
fn running_outside(model: &Model, vms: &BTreeSet<Vm>, accept: impl Fn(Node) -> bool) -> BTreeSet<Vm> {
    let map = model.mapping();
    vms.iter()
        .copied()
        .filter(|v| map.is_running(*v))
        .filter(|v| map.vm_location(*v).is_some_and(|n| !accept(n)))
        .collect()
}

/// Removes hosts from the hoster variables of VMs.
#[derive(Debug, Clone)]
pub struct BanConstraint {
    vms: BTreeSet<Vm>,
    nodes: BTreeSet<Node>,
}

impl BanConstraint {
    pub fn new(vms: BTreeSet<Vm>, nodes: BTreeSet<Node>) -> Self {
        Self { vms, nodes }
    }
}

impl SolverConstraint for BanConstraint {
    fn inject(&self, _params: &Parameters, rp: &mut ReconfigurationProblem) -> Result<bool> {
        let banned = ids(&self.nodes);
        for &vm in &self.vms {
            let Some(h) = hoster(rp, vm)? else {
                continue;
            };
            if rp.csp_mut().store_mut().retain(h, |x| !banned.contains(&x)).is_err() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn mis_placed_vms(&self, model: &Model) -> BTreeSet<Vm> {
        running_outside(model, &self.vms, |n| !self.nodes.contains(&n))
    }
}

/// Keeps the VMs on a set of nodes.
#[derive(Debug, Clone)]
pub struct FenceConstraint {
    vms: BTreeSet<Vm>,
    nodes: BTreeSet<Node>,
}

impl FenceConstraint {
    pub fn new(vms: BTreeSet<Vm>, nodes: BTreeSet<Node>) -> Self {
        Self { vms, nodes }
    }
}

impl SolverConstraint for FenceConstraint {
    fn inject(&self, _params: &Parameters, rp: &mut ReconfigurationProblem) -> Result<bool> {
        let allowed = ids(&self.nodes);
        for &vm in &self.vms {
            let Some(h) = hoster(rp, vm)? else {
                continue;
            };
            if rp.csp_mut().store_mut().retain(h, |x| allowed.contains(&x)).is_err() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn mis_placed_vms(&self, model: &Model) -> BTreeSet<Vm> {
        running_outside(model, &self.vms, |n| self.nodes.contains(&n))
    }
}

/// Pins running VMs to their current node.
#[derive(Debug, Clone)]
pub struct RootConstraint {
    vms: BTreeSet<Vm>,
}

impl RootConstraint {
    pub fn new(vms: BTreeSet<Vm>) -> Self {
        Self { vms }
    }
}

impl SolverConstraint for RootConstraint {
    fn inject(&self, _params: &Parameters, rp: &mut ReconfigurationProblem) -> Result<bool> {
        for &vm in &self.vms {
            let t = transition_of(rp, vm)?;
            let (Some(c), Some(d)) = (t.c_slice(), t.d_slice()) else {
                continue;
            };
            let store = rp.csp().store();
            let Some(src) = store.value(c.hoster()) else {
                continue;
            };
            let h = d.hoster();
            if rp.csp_mut().store_mut().instantiate(h, src).is_err() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn mis_placed_vms(&self, _model: &Model) -> BTreeSet<Vm> {
        BTreeSet::new()
    }
}

/// Bounds the number of VMs running on a set of nodes at the end of the
/// reconfiguration.
#[derive(Debug, Clone)]
pub struct RunningCapacityConstraint {
    nodes: BTreeSet<Node>,
    amount: usize,
}

impl RunningCapacityConstraint {
    pub fn new(nodes: BTreeSet<Node>, amount: usize) -> Self {
        Self { nodes, amount }
    }
}

impl SolverConstraint for RunningCapacityConstraint {
    fn inject(&self, _params: &Parameters, rp: &mut ReconfigurationProblem) -> Result<bool> {
        let hosters: Vec<IntVar> = rp.d_slices().map(|s| s.hoster()).collect();
        rp.csp_mut()
            .post(AtMostInSet::new(hosters, ids(&self.nodes), self.amount));
        Ok(true)
    }

    fn mis_placed_vms(&self, model: &Model) -> BTreeSet<Vm> {
        let map = model.mapping();
        let running: BTreeSet<Vm> = self
            .nodes
            .iter()
            .flat_map(|n| map.running_vms_on(*n))
            .collect();
        if running.len() <= self.amount {
            return BTreeSet::new();
        }
        running
    }
}
