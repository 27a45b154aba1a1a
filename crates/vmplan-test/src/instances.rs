//! Ready-made problem instances.
//!
//! Every instance uses a `cpu` resource, 4 units per node and 1 per VM
//! unless stated otherwise, and the [`Objective::MinMttr`] objective.

use std::sync::Arc;

use vmplan_core::{
    Ban, Instance, Node, Objective, Offline, Ready, Running, RunningCapacity, SatConstraint, Vm,
};

use crate::datacenter::Datacenter;

/// An instance with its elements, by creation order.
#[derive(Debug, Clone)]
pub struct Fixture {
    pub instance: Instance,
    pub nodes: Vec<Node>,
    pub vms: Vec<Vm>,
}

fn fixture(dc: Datacenter, nodes: Vec<Node>, vms: Vec<Vm>, cstrs: Vec<Arc<dyn SatConstraint>>) -> Fixture {
    Fixture {
        instance: Instance::new(dc.build(), cstrs, Objective::MinMttr),
        nodes,
        vms,
    }
}

/// One online node hosting one running VM that must become ready.
pub fn shutdown_single_vm() -> Fixture {
    let mut dc = Datacenter::new().with_cpu(4, 1);
    let n = dc.online_node();
    let v = dc.running_vm(n);
    let cstrs: Vec<Arc<dyn SatConstraint>> = vec![Arc::new(Ready::new([v]))];
    fixture(dc, vec![n], vec![v], cstrs)
}

/// Two online nodes, the first one hosting two VMs while it may only run
/// one.
pub fn overloaded_node() -> Fixture {
    let mut dc = Datacenter::new().with_cpu(4, 1);
    let nodes = dc.online_nodes(2);
    let vms = dc.running_vms(nodes[0], 2);
    let cstrs: Vec<Arc<dyn SatConstraint>> = vec![Arc::new(RunningCapacity::new([nodes[0]], 1))];
    fixture(dc, nodes, vms, cstrs)
}

/// A single offline node and a ready VM that must run.
pub fn boot_on_offline_node() -> Fixture {
    let mut dc = Datacenter::new().with_cpu(4, 1);
    let n = dc.offline_node();
    let v = dc.ready_vm();
    let cstrs: Vec<Arc<dyn SatConstraint>> = vec![Arc::new(Running::new([v]))];
    fixture(dc, vec![n], vec![v], cstrs)
}

/// Six online nodes hosting two VMs each.
///
/// The first VM is banned from its node and the fifth node must go
/// offline. Splitting the nodes in halves keeps every constraint inside
/// one half.
pub fn six_nodes() -> Fixture {
    let mut dc = Datacenter::new().with_cpu(4, 1);
    let nodes = dc.online_nodes(6);
    let vms: Vec<Vm> = nodes.iter().flat_map(|n| dc.running_vms(*n, 2)).collect();
    let cstrs: Vec<Arc<dyn SatConstraint>> = vec![
        Arc::new(Ban::new([vms[0]], [nodes[0]])),
        Arc::new(Offline::new([nodes[4]])),
    ];
    fixture(dc, nodes, vms, cstrs)
}

/// A rack of `nb_nodes` online nodes hosting three VMs each.
///
/// The first VM of each of the first `nb_bans` nodes is banned from its
/// node and the last `nb_offline` nodes must go offline. Every node keeps
/// a single free cpu unit, so the VMs that move compete for them.
pub fn crowded_rack(nb_nodes: usize, nb_bans: usize, nb_offline: usize) -> Fixture {
    let mut dc = Datacenter::new().with_cpu(4, 1);
    let nodes = dc.online_nodes(nb_nodes);
    let vms: Vec<Vm> = nodes.iter().flat_map(|n| dc.running_vms(*n, 3)).collect();
    let mut cstrs: Vec<Arc<dyn SatConstraint>> = (0..nb_bans.min(nb_nodes))
        .map(|i| Arc::new(Ban::new([vms[3 * i]], [nodes[i]])) as Arc<dyn SatConstraint>)
        .collect();
    let leaving = &nodes[nb_nodes.saturating_sub(nb_offline)..];
    if !leaving.is_empty() {
        cstrs.push(Arc::new(Offline::new(leaving.iter().copied())));
    }
    fixture(dc, nodes, vms, cstrs)
}
