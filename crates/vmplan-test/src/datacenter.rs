//! Small datacenter builder.
//!
//! # Example
//!
//! ```
//! use vmplan_test::Datacenter;
//!
//! let mut dc = Datacenter::new().with_cpu(4, 1);
//! let n = dc.online_node();
//! let v = dc.running_vm(n);
//! let mo = dc.build();
//!
//! assert!(mo.mapping().is_running(v));
//! assert_eq!(mo.resource("cpu").unwrap().capacity(n), 4);
//! ```

use vmplan_core::{AttrValue, Element, Model, Node, ShareableResource, Vm};

/// Name of the resource added by [`Datacenter::with_cpu`].
pub const CPU: &str = "cpu";

/// Builds a model element by element.
#[derive(Debug, Clone, Default)]
pub struct Datacenter {
    model: Model,
}

impl Datacenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a `cpu` resource with default capacity and consumption.
    pub fn with_cpu(mut self, capacity: i64, consumption: i64) -> Self {
        self.model
            .add_resource(ShareableResource::new(CPU, capacity, consumption));
        self
    }

    pub fn online_node(&mut self) -> Node {
        let n = self.model.new_node();
        self.model.mapping_mut().add_online_node(n);
        n
    }

    pub fn online_nodes(&mut self, count: usize) -> Vec<Node> {
        (0..count).map(|_| self.online_node()).collect()
    }

    pub fn offline_node(&mut self) -> Node {
        let n = self.model.new_node();
        self.model.mapping_mut().add_offline_node(n);
        n
    }

    pub fn running_vm(&mut self, n: Node) -> Vm {
        let v = self.model.new_vm();
        self.model.mapping_mut().add_running_vm(v, n);
        v
    }

    pub fn running_vms(&mut self, n: Node, count: usize) -> Vec<Vm> {
        (0..count).map(|_| self.running_vm(n)).collect()
    }

    pub fn sleeping_vm(&mut self, n: Node) -> Vm {
        let v = self.model.new_vm();
        self.model.mapping_mut().add_sleeping_vm(v, n);
        v
    }

    pub fn ready_vm(&mut self) -> Vm {
        let v = self.model.new_vm();
        self.model.mapping_mut().add_ready_vm(v);
        v
    }

    /// Overrides the `cpu` capacity of a node. No-op without the resource.
    pub fn set_capacity(&mut self, n: Node, amount: i64) -> &mut Self {
        if let Some(r) = self.model.resource_mut(CPU) {
            r.set_capacity(n, amount);
        }
        self
    }

    /// Overrides the `cpu` consumption of a VM. No-op without the resource.
    pub fn set_consumption(&mut self, vm: Vm, amount: i64) -> &mut Self {
        if let Some(r) = self.model.resource_mut(CPU) {
            r.set_consumption(vm, amount);
        }
        self
    }

    pub fn set_attribute(
        &mut self,
        e: impl Into<Element>,
        key: &str,
        value: impl Into<AttrValue>,
    ) -> &mut Self {
        self.model.attributes_mut().put(e, key, value);
        self
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn build(self) -> Model {
        self.model
    }
}
