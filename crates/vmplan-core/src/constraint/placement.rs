//! Placement constraints.

use std::any::Any;
use std::collections::BTreeSet;

use super::SatConstraint;
use crate::model::{Model, Node, Vm};

/// The VMs must not run on any of the nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ban {
    vms: BTreeSet<Vm>,
    nodes: BTreeSet<Node>,
}

impl Ban {
    pub fn new(vms: impl IntoIterator<Item = Vm>, nodes: impl IntoIterator<Item = Node>) -> Self {
        Self {
            vms: vms.into_iter().collect(),
            nodes: nodes.into_iter().collect(),
        }
    }

    pub fn vms(&self) -> &BTreeSet<Vm> {
        &self.vms
    }

    pub fn nodes(&self) -> &BTreeSet<Node> {
        &self.nodes
    }
}

impl SatConstraint for Ban {
    fn kind(&self) -> &'static str {
        "ban"
    }

    fn involved_vms(&self) -> Vec<Vm> {
        self.vms.iter().copied().collect()
    }

    fn involved_nodes(&self) -> Vec<Node> {
        self.nodes.iter().copied().collect()
    }

    fn is_satisfied(&self, model: &Model) -> bool {
        let map = model.mapping();
        self.vms.iter().all(|v| {
            !map.is_running(*v) || map.vm_location(*v).map_or(true, |n| !self.nodes.contains(&n))
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The VMs may only run on the given nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fence {
    vms: BTreeSet<Vm>,
    nodes: BTreeSet<Node>,
}

impl Fence {
    pub fn new(vms: impl IntoIterator<Item = Vm>, nodes: impl IntoIterator<Item = Node>) -> Self {
        Self {
            vms: vms.into_iter().collect(),
            nodes: nodes.into_iter().collect(),
        }
    }

    pub fn vms(&self) -> &BTreeSet<Vm> {
        &self.vms
    }

    pub fn nodes(&self) -> &BTreeSet<Node> {
        &self.nodes
    }
}

impl SatConstraint for Fence {
    fn kind(&self) -> &'static str {
        "fence"
    }

    fn involved_vms(&self) -> Vec<Vm> {
        self.vms.iter().copied().collect()
    }

    fn involved_nodes(&self) -> Vec<Node> {
        self.nodes.iter().copied().collect()
    }

    fn is_satisfied(&self, model: &Model) -> bool {
        let map = model.mapping();
        self.vms.iter().all(|v| {
            !map.is_running(*v) || map.vm_location(*v).is_some_and(|n| self.nodes.contains(&n))
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The running VMs must not be relocated.
///
/// The constraint is about the reconfiguration itself, so any resulting
/// model satisfies it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Root {
    vms: BTreeSet<Vm>,
}

impl Root {
    pub fn new(vms: impl IntoIterator<Item = Vm>) -> Self {
        Self {
            vms: vms.into_iter().collect(),
        }
    }

    pub fn vms(&self) -> &BTreeSet<Vm> {
        &self.vms
    }
}

impl SatConstraint for Root {
    fn kind(&self) -> &'static str {
        "root"
    }

    fn involved_vms(&self) -> Vec<Vm> {
        self.vms.iter().copied().collect()
    }

    fn involved_nodes(&self) -> Vec<Node> {
        Vec::new()
    }

    fn is_satisfied(&self, _model: &Model) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// At most `amount` VMs may run on the nodes, all together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningCapacity {
    nodes: BTreeSet<Node>,
    amount: usize,
}

impl RunningCapacity {
    pub fn new(nodes: impl IntoIterator<Item = Node>, amount: usize) -> Self {
        Self {
            nodes: nodes.into_iter().collect(),
            amount,
        }
    }

    pub fn nodes(&self) -> &BTreeSet<Node> {
        &self.nodes
    }

    pub fn amount(&self) -> usize {
        self.amount
    }
}

impl SatConstraint for RunningCapacity {
    fn kind(&self) -> &'static str {
        "runningCapacity"
    }

    fn involved_vms(&self) -> Vec<Vm> {
        Vec::new()
    }

    fn involved_nodes(&self) -> Vec<Node> {
        self.nodes.iter().copied().collect()
    }

    fn is_satisfied(&self, model: &Model) -> bool {
        let map = model.mapping();
        let running: usize = self.nodes.iter().map(|n| map.running_vms_on(*n).count()).sum();
        running <= self.amount
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> Model {
        let mut mo = Model::new();
        for _ in 0..3 {
            let n = mo.new_node();
            mo.mapping_mut().add_online_node(n);
        }
        for n in [0, 0, 1] {
            let v = mo.new_vm();
            mo.mapping_mut().add_running_vm(v, Node(n));
        }
        let v = mo.new_vm();
        mo.mapping_mut().add_ready_vm(v);
        mo
    }

    #[test]
    fn test_ban() {
        let mo = model();
        assert!(Ban::new([Vm(2)], [Node(0)]).is_satisfied(&mo));
        assert!(!Ban::new([Vm(0), Vm(2)], [Node(0)]).is_satisfied(&mo));
        // ready VMs are not placed anywhere
        assert!(Ban::new([Vm(3)], [Node(0), Node(1)]).is_satisfied(&mo));
    }

    #[test]
    fn test_fence() {
        let mo = model();
        assert!(Fence::new([Vm(0), Vm(1)], [Node(0)]).is_satisfied(&mo));
        assert!(!Fence::new([Vm(2)], [Node(0), Node(2)]).is_satisfied(&mo));
        assert!(Fence::new([Vm(3)], [Node(2)]).is_satisfied(&mo));
    }

    #[test]
    fn test_root_holds_on_any_model() {
        let root = Root::new([Vm(0), Vm(2)]);
        assert!(root.is_satisfied(&model()));
        assert!(root.involved_nodes().is_empty());
        assert_eq!(root.kind(), "root");
    }

    #[test]
    fn test_running_capacity() {
        let mo = model();
        assert!(RunningCapacity::new([Node(0)], 2).is_satisfied(&mo));
        assert!(!RunningCapacity::new([Node(0)], 1).is_satisfied(&mo));
        assert!(!RunningCapacity::new([Node(0), Node(1)], 2).is_satisfied(&mo));
        assert!(RunningCapacity::new([Node(2)], 0).is_satisfied(&mo));
    }
}
