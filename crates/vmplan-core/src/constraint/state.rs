//! Constraints on the final state of elements.

use std::any::Any;
use std::collections::BTreeSet;

use super::SatConstraint;
use crate::model::{Model, Node, Vm};

macro_rules! vm_state_constraint {
    ($(#[$doc:meta])* $name:ident, $kind:literal, $check:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            vms: BTreeSet<Vm>,
        }

        impl $name {
            pub fn new(vms: impl IntoIterator<Item = Vm>) -> Self {
                Self {
                    vms: vms.into_iter().collect(),
                }
            }

            pub fn vms(&self) -> &BTreeSet<Vm> {
                &self.vms
            }
        }

        impl SatConstraint for $name {
            fn kind(&self) -> &'static str {
                $kind
            }

            fn involved_vms(&self) -> Vec<Vm> {
                self.vms.iter().copied().collect()
            }

            fn involved_nodes(&self) -> Vec<Node> {
                Vec::new()
            }

            fn is_satisfied(&self, model: &Model) -> bool {
                self.vms.iter().all(|v| model.mapping().$check(*v))
            }

            fn as_any(&self) -> &dyn Any {
                self
            }
        }
    };
}

macro_rules! node_state_constraint {
    ($(#[$doc:meta])* $name:ident, $kind:literal, $check:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            nodes: BTreeSet<Node>,
        }

        impl $name {
            pub fn new(nodes: impl IntoIterator<Item = Node>) -> Self {
                Self {
                    nodes: nodes.into_iter().collect(),
                }
            }

            pub fn nodes(&self) -> &BTreeSet<Node> {
                &self.nodes
            }
        }

        impl SatConstraint for $name {
            fn kind(&self) -> &'static str {
                $kind
            }

            fn involved_vms(&self) -> Vec<Vm> {
                Vec::new()
            }

            fn involved_nodes(&self) -> Vec<Node> {
                self.nodes.iter().copied().collect()
            }

            fn is_satisfied(&self, model: &Model) -> bool {
                self.nodes.iter().all(|n| model.mapping().$check(*n))
            }

            fn as_any(&self) -> &dyn Any {
                self
            }
        }
    };
}

vm_state_constraint!(
    /// The VMs must be running at the end of the reconfiguration.
    Running,
    "running",
    is_running
);

vm_state_constraint!(
    /// The VMs must be in the ready state at the end of the
    /// reconfiguration.
    Ready,
    "ready",
    is_ready
);

vm_state_constraint!(
    /// The VMs must be sleeping at the end of the reconfiguration.
    Sleeping,
    "sleeping",
    is_sleeping
);

node_state_constraint!(
    /// The nodes must be online at the end of the reconfiguration.
    Online,
    "online",
    is_online
);

node_state_constraint!(
    /// The nodes must be offline at the end of the reconfiguration.
    Offline,
    "offline",
    is_offline
);

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> Model {
        let mut mo = Model::new();
        let (n1, n2) = (mo.new_node(), mo.new_node());
        let (v1, v2) = (mo.new_vm(), mo.new_vm());
        mo.mapping_mut().add_online_node(n1);
        mo.mapping_mut().add_offline_node(n2);
        mo.mapping_mut().add_running_vm(v1, n1);
        mo.mapping_mut().add_ready_vm(v2);
        mo
    }

    #[test]
    fn test_vm_states() {
        let mo = model();
        assert!(Running::new([Vm(0)]).is_satisfied(&mo));
        assert!(!Running::new([Vm(0), Vm(1)]).is_satisfied(&mo));
        assert!(Ready::new([Vm(1)]).is_satisfied(&mo));
        assert!(!Sleeping::new([Vm(0)]).is_satisfied(&mo));
    }

    #[test]
    fn test_node_states() {
        let mo = model();
        assert!(Online::new([Node(0)]).is_satisfied(&mo));
        assert!(Offline::new([Node(1)]).is_satisfied(&mo));
        assert!(!Offline::new([Node(0), Node(1)]).is_satisfied(&mo));
    }

    #[test]
    fn test_metadata() {
        let c = Running::new([Vm(3), Vm(1)]);
        assert_eq!(c.kind(), "running");
        assert_eq!(c.involved_vms(), vec![Vm(1), Vm(3)]);
        assert!(c.involved_nodes().is_empty());
        assert!(!c.is_continuous());

        let dynamic: &dyn SatConstraint = &c;
        assert!(dynamic.downcast_ref::<Running>().is_some());
        assert!(dynamic.downcast_ref::<Ready>().is_none());
    }
}
