//! Shareable resources: capacities of nodes and consumptions of VMs.

use std::collections::BTreeMap;

use super::element::{Node, Vm};

/// A resource such as CPU or memory, shared by the VMs running on a node.
///
/// Values that are not set explicitly fall back to the defaults.
///
/// # Example
///
/// ```
/// use vmplan_core::{Node, ShareableResource, Vm};
///
/// let mut mem = ShareableResource::new("mem", 8, 1);
/// mem.set_capacity(Node(0), 16);
/// mem.set_consumption(Vm(1), 4);
///
/// assert_eq!(mem.capacity(Node(0)), 16);
/// assert_eq!(mem.capacity(Node(1)), 8);
/// assert_eq!(mem.consumption(Vm(1)), 4);
/// assert_eq!(mem.consumption(Vm(2)), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareableResource {
    name: String,
    default_capacity: i64,
    default_consumption: i64,
    capacities: BTreeMap<Node, i64>,
    consumptions: BTreeMap<Vm, i64>,
}

impl ShareableResource {
    pub fn new(name: impl Into<String>, default_capacity: i64, default_consumption: i64) -> Self {
        Self {
            name: name.into(),
            default_capacity,
            default_consumption,
            capacities: BTreeMap::new(),
            consumptions: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_capacity(&mut self, n: Node, amount: i64) -> &mut Self {
        self.capacities.insert(n, amount);
        self
    }

    pub fn set_consumption(&mut self, vm: Vm, amount: i64) -> &mut Self {
        self.consumptions.insert(vm, amount);
        self
    }

    pub fn capacity(&self, n: Node) -> i64 {
        self.capacities.get(&n).copied().unwrap_or(self.default_capacity)
    }

    pub fn consumption(&self, vm: Vm) -> i64 {
        self.consumptions.get(&vm).copied().unwrap_or(self.default_consumption)
    }

    pub fn default_capacity(&self) -> i64 {
        self.default_capacity
    }

    pub fn default_consumption(&self) -> i64 {
        self.default_consumption
    }

    /// Sum of the consumptions of the given VMs.
    pub fn sum_consumptions(&self, vms: impl IntoIterator<Item = Vm>) -> i64 {
        vms.into_iter().map(|v| self.consumption(v)).sum()
    }

    /// Copy restricted to the given elements, keeping the defaults.
    pub fn restricted(
        &self,
        nodes: impl IntoIterator<Item = Node>,
        vms: impl IntoIterator<Item = Vm>,
    ) -> Self {
        let mut r = Self::new(self.name.clone(), self.default_capacity, self.default_consumption);
        for n in nodes {
            if let Some(c) = self.capacities.get(&n) {
                r.capacities.insert(n, *c);
            }
        }
        for v in vms {
            if let Some(c) = self.consumptions.get(&v) {
                r.consumptions.insert(v, *c);
            }
        }
        r
    }
}
