//! Datacenter model: elements, placement, attributes and resources.

mod attributes;
mod element;
mod mapping;
mod resource;

use std::collections::BTreeSet;

pub use attributes::{AttrValue, Attributes};
pub use element::{Element, Node, NodeState, Vm, VmState};
pub use mapping::Mapping;
pub use resource::ShareableResource;

/// A datacenter snapshot.
///
/// The model owns the element id counters so fresh elements never
/// collide with existing ones.
///
/// # Example
///
/// ```
/// use vmplan_core::Model;
///
/// let mut mo = Model::new();
/// let n = mo.new_node();
/// let v = mo.new_vm();
/// mo.mapping_mut().add_online_node(n);
/// mo.mapping_mut().add_running_vm(v, n);
///
/// assert_eq!(mo.mapping().nb_vms(), 1);
/// assert_ne!(mo.new_vm(), v);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Model {
    mapping: Mapping,
    attributes: Attributes,
    resources: Vec<ShareableResource>,
    next_node: u32,
    next_vm: u32,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn mapping_mut(&mut self) -> &mut Mapping {
        &mut self.mapping
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    /// Attaches a resource, replacing any resource with the same name.
    pub fn add_resource(&mut self, rc: ShareableResource) {
        self.resources.retain(|r| r.name() != rc.name());
        self.resources.push(rc);
    }

    pub fn resources(&self) -> &[ShareableResource] {
        &self.resources
    }

    pub fn resource(&self, name: &str) -> Option<&ShareableResource> {
        self.resources.iter().find(|r| r.name() == name)
    }

    pub fn resource_mut(&mut self, name: &str) -> Option<&mut ShareableResource> {
        self.resources.iter_mut().find(|r| r.name() == name)
    }

    /// Allocates a fresh node id. The node is not placed in the mapping.
    pub fn new_node(&mut self) -> Node {
        let n = Node(self.next_node);
        self.next_node += 1;
        n
    }

    /// Allocates a fresh VM id. The VM is not placed in the mapping.
    pub fn new_vm(&mut self) -> Vm {
        let v = Vm(self.next_vm);
        self.next_vm += 1;
        v
    }

    /// Id the next call to [`Model::new_vm`] will return.
    pub fn next_vm_id(&self) -> u32 {
        self.next_vm
    }

    pub fn next_node_id(&self) -> u32 {
        self.next_node
    }

    /// Makes sure ids inserted by hand into the mapping are never
    /// handed out again.
    pub fn register_vm(&mut self, vm: Vm) {
        self.next_vm = self.next_vm.max(vm.0 + 1);
    }

    pub fn register_node(&mut self, n: Node) {
        self.next_node = self.next_node.max(n.0 + 1);
    }

    /// Restriction of the model to a set of nodes.
    ///
    /// The sub-model holds the given nodes with their state, the VMs
    /// running or sleeping on them, and the extra `ready` VMs. Attributes
    /// and resource values are kept for those elements only. Id counters
    /// are inherited.
    pub fn sub_model(&self, nodes: &BTreeSet<Node>, ready: &[Vm]) -> Model {
        let mut sub = Model {
            next_node: self.next_node,
            next_vm: self.next_vm,
            ..Model::default()
        };
        let mut vms = Vec::new();
        for &n in nodes {
            match self.mapping.node_state(n) {
                Some(NodeState::Online) => {
                    sub.mapping.add_online_node(n);
                    for v in self.mapping.running_vms_on(n) {
                        sub.mapping.add_running_vm(v, n);
                        vms.push(v);
                    }
                    for v in self.mapping.sleeping_vms_on(n) {
                        sub.mapping.add_sleeping_vm(v, n);
                        vms.push(v);
                    }
                }
                Some(NodeState::Offline) => {
                    sub.mapping.add_offline_node(n);
                }
                None => continue,
            }
            sub.attributes.copy_from(&self.attributes, n);
        }
        for &v in ready {
            sub.mapping.add_ready_vm(v);
            vms.push(v);
        }
        for &v in &vms {
            sub.attributes.copy_from(&self.attributes, v);
        }
        sub.resources = self
            .resources
            .iter()
            .map(|r| r.restricted(nodes.iter().copied(), vms.iter().copied()))
            .collect();
        sub
    }
}

#[cfg(test)]
mod tests;
