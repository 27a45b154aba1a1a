//! Placement of VMs on nodes.

use std::collections::{BTreeMap, BTreeSet};

use super::element::{Node, NodeState, Vm, VmState};

/// Where a VM currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Place {
    Ready,
    Running(Node),
    Sleeping(Node),
}

/// The placement of every VM and the state of every node.
///
/// A VM is in exactly one place. Only online nodes host VMs, so a node
/// hosting running or sleeping VMs cannot be turned offline.
///
/// Every collection is ordered so iteration is deterministic.
///
/// # Example
///
/// ```
/// use vmplan_core::{Mapping, Node, Vm, VmState};
///
/// let mut m = Mapping::new();
/// let (n1, n2) = (Node(0), Node(1));
/// assert!(m.add_online_node(n1));
/// assert!(m.add_offline_node(n2));
/// assert!(m.add_running_vm(Vm(0), n1));
/// // offline nodes cannot host VMs
/// assert!(!m.add_running_vm(Vm(1), n2));
///
/// assert_eq!(m.vm_state(Vm(0)), Some(VmState::Running));
/// assert_eq!(m.vm_location(Vm(0)), Some(n1));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    online: BTreeSet<Node>,
    offline: BTreeSet<Node>,
    running: BTreeMap<Node, BTreeSet<Vm>>,
    sleeping: BTreeMap<Node, BTreeSet<Vm>>,
    places: BTreeMap<Vm, Place>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a node online. Returns `true` on success.
    pub fn add_online_node(&mut self, n: Node) -> bool {
        self.offline.remove(&n);
        self.online.insert(n);
        true
    }

    /// Sets a node offline. Fails when the node hosts VMs.
    pub fn add_offline_node(&mut self, n: Node) -> bool {
        if self.running.get(&n).is_some_and(|s| !s.is_empty())
            || self.sleeping.get(&n).is_some_and(|s| !s.is_empty())
        {
            return false;
        }
        self.online.remove(&n);
        self.offline.insert(n);
        true
    }

    /// Forgets a node. Fails when the node hosts VMs.
    pub fn remove_node(&mut self, n: Node) -> bool {
        if !self.add_offline_node(n) {
            return false;
        }
        self.offline.remove(&n);
        self.running.remove(&n);
        self.sleeping.remove(&n);
        true
    }

    /// Sets a VM running on an online node, wherever it was before.
    pub fn add_running_vm(&mut self, vm: Vm, n: Node) -> bool {
        if !self.online.contains(&n) {
            return false;
        }
        self.detach(vm);
        self.running.entry(n).or_default().insert(vm);
        self.places.insert(vm, Place::Running(n));
        true
    }

    /// Sets a VM sleeping on an online node, wherever it was before.
    pub fn add_sleeping_vm(&mut self, vm: Vm, n: Node) -> bool {
        if !self.online.contains(&n) {
            return false;
        }
        self.detach(vm);
        self.sleeping.entry(n).or_default().insert(vm);
        self.places.insert(vm, Place::Sleeping(n));
        true
    }

    /// Sets a VM in the ready state, wherever it was before.
    pub fn add_ready_vm(&mut self, vm: Vm) -> bool {
        self.detach(vm);
        self.places.insert(vm, Place::Ready);
        true
    }

    /// Forgets a VM. Returns `false` if it was unknown.
    pub fn remove_vm(&mut self, vm: Vm) -> bool {
        let known = self.detach(vm);
        self.places.remove(&vm);
        known
    }

    fn detach(&mut self, vm: Vm) -> bool {
        match self.places.get(&vm) {
            Some(Place::Running(n)) => {
                if let Some(s) = self.running.get_mut(n) {
                    s.remove(&vm);
                }
                true
            }
            Some(Place::Sleeping(n)) => {
                if let Some(s) = self.sleeping.get_mut(n) {
                    s.remove(&vm);
                }
                true
            }
            Some(Place::Ready) => true,
            None => false,
        }
    }

    pub fn node_state(&self, n: Node) -> Option<NodeState> {
        if self.online.contains(&n) {
            Some(NodeState::Online)
        } else if self.offline.contains(&n) {
            Some(NodeState::Offline)
        } else {
            None
        }
    }

    pub fn vm_state(&self, vm: Vm) -> Option<VmState> {
        self.places.get(&vm).map(|p| match p {
            Place::Ready => VmState::Ready,
            Place::Running(_) => VmState::Running,
            Place::Sleeping(_) => VmState::Sleeping,
        })
    }

    /// Returns the node hosting a running or sleeping VM.
    pub fn vm_location(&self, vm: Vm) -> Option<Node> {
        match self.places.get(&vm) {
            Some(Place::Running(n)) | Some(Place::Sleeping(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn is_online(&self, n: Node) -> bool {
        self.online.contains(&n)
    }

    pub fn is_offline(&self, n: Node) -> bool {
        self.offline.contains(&n)
    }

    pub fn is_running(&self, vm: Vm) -> bool {
        matches!(self.places.get(&vm), Some(Place::Running(_)))
    }

    pub fn is_sleeping(&self, vm: Vm) -> bool {
        matches!(self.places.get(&vm), Some(Place::Sleeping(_)))
    }

    pub fn is_ready(&self, vm: Vm) -> bool {
        matches!(self.places.get(&vm), Some(Place::Ready))
    }

    pub fn contains_node(&self, n: Node) -> bool {
        self.online.contains(&n) || self.offline.contains(&n)
    }

    pub fn contains_vm(&self, vm: Vm) -> bool {
        self.places.contains_key(&vm)
    }

    pub fn online_nodes(&self) -> impl Iterator<Item = Node> + '_ {
        self.online.iter().copied()
    }

    pub fn offline_nodes(&self) -> impl Iterator<Item = Node> + '_ {
        self.offline.iter().copied()
    }

    /// All nodes, by increasing id.
    pub fn all_nodes(&self) -> Vec<Node> {
        let mut all: Vec<Node> = self.online.iter().chain(self.offline.iter()).copied().collect();
        all.sort_unstable();
        all
    }

    /// All VMs, by increasing id.
    pub fn all_vms(&self) -> impl Iterator<Item = Vm> + '_ {
        self.places.keys().copied()
    }

    pub fn running_vms_on(&self, n: Node) -> impl Iterator<Item = Vm> + '_ {
        self.running.get(&n).into_iter().flatten().copied()
    }

    pub fn sleeping_vms_on(&self, n: Node) -> impl Iterator<Item = Vm> + '_ {
        self.sleeping.get(&n).into_iter().flatten().copied()
    }

    pub fn running_vms(&self) -> impl Iterator<Item = Vm> + '_ {
        self.places
            .iter()
            .filter(|(_, p)| matches!(p, Place::Running(_)))
            .map(|(v, _)| *v)
    }

    pub fn sleeping_vms(&self) -> impl Iterator<Item = Vm> + '_ {
        self.places
            .iter()
            .filter(|(_, p)| matches!(p, Place::Sleeping(_)))
            .map(|(v, _)| *v)
    }

    pub fn ready_vms(&self) -> impl Iterator<Item = Vm> + '_ {
        self.places
            .iter()
            .filter(|(_, p)| matches!(p, Place::Ready))
            .map(|(v, _)| *v)
    }

    pub fn nb_nodes(&self) -> usize {
        self.online.len() + self.offline.len()
    }

    pub fn nb_vms(&self) -> usize {
        self.places.len()
    }
}
