//! Plan checkers.
//!
//! [`capacity_violations`] replays a plan over time and reports every
//! instant where a node hosts more than its capacity. A VM that leaves a
//! node keeps its resources there until its action ends. A VM that
//! arrives holds them from the beginning of its action.
//!
//! # Example
//!
//! ```
//! use vmplan_core::{Action, Operation, ReconfigurationPlan};
//! use vmplan_test::check::capacity_violations;
//! use vmplan_test::Datacenter;
//!
//! let mut dc = Datacenter::new().with_cpu(1, 1);
//! let nodes = dc.online_nodes(3);
//! let a = dc.running_vm(nodes[0]);
//! let b = dc.running_vm(nodes[1]);
//! let migrate = |vm, src, dst, start, end| {
//!     Action::new(Operation::MigrateVm { vm, src, dst }, start, end)
//! };
//!
//! // the first node is full until `a` leaves at 3
//! let mut plan = ReconfigurationPlan::new(dc.build());
//! plan.add(migrate(a, nodes[0], nodes[2], 0, 3));
//! plan.add(migrate(b, nodes[1], nodes[0], 3, 5));
//! assert!(capacity_violations(&plan).is_empty());
//!
//! let mut early = ReconfigurationPlan::new(plan.origin().clone());
//! early.add(migrate(a, nodes[0], nodes[2], 0, 3));
//! early.add(migrate(b, nodes[1], nodes[0], 2, 4));
//! let overloads = capacity_violations(&early);
//! assert_eq!(overloads.len(), 1);
//! assert_eq!((overloads[0].node, overloads[0].at, overloads[0].load), (nodes[0], 2, 2));
//! ```

use std::collections::{BTreeMap, BTreeSet};

use vmplan_core::{Node, Operation, ReconfigurationPlan, Vm};

/// A node exceeding one of its resources at some instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overload {
    pub resource: String,
    pub node: Node,
    pub at: i64,
    pub load: i64,
    pub capacity: i64,
}

/// Time window `[from, until)` during which a VM occupies a node.
#[derive(Debug, Clone, Copy)]
struct Occupancy {
    vm: Vm,
    node: Node,
    from: i64,
    until: i64,
}

fn occupancies(plan: &ReconfigurationPlan) -> Vec<Occupancy> {
    let horizon = plan.duration() + 1;
    let map = plan.origin().mapping();
    let mut moved = BTreeSet::new();
    let mut out = Vec::new();
    for a in plan.actions() {
        match a.op {
            Operation::MigrateVm { vm, src, dst }
            | Operation::ReinstantiateVm { vm, src, dst } => {
                moved.insert(vm);
                out.push(Occupancy { vm, node: src, from: 0, until: a.end });
                out.push(Occupancy { vm, node: dst, from: a.start, until: horizon });
            }
            Operation::SuspendVm { vm, src, .. } => {
                moved.insert(vm);
                out.push(Occupancy { vm, node: src, from: 0, until: a.end });
            }
            Operation::ShutdownVm { vm, node } => {
                moved.insert(vm);
                out.push(Occupancy { vm, node, from: 0, until: a.end });
            }
            Operation::ResumeVm { vm, dst, .. } => {
                out.push(Occupancy { vm, node: dst, from: a.start, until: horizon });
            }
            Operation::BootVm { vm, node } => {
                out.push(Occupancy { vm, node, from: a.start, until: horizon });
            }
            Operation::BootNode { .. } | Operation::ShutdownNode { .. } => {}
        }
    }
    for vm in map.running_vms() {
        if moved.contains(&vm) {
            continue;
        }
        if let Some(node) = map.vm_location(vm) {
            out.push(Occupancy { vm, node, from: 0, until: horizon });
        }
    }
    out
}

/// Every overload of the plan, at the instants where the load of a node
/// changes.
pub fn capacity_violations(plan: &ReconfigurationPlan) -> Vec<Overload> {
    let occupancies = occupancies(plan);
    let mut instants: Vec<i64> = occupancies.iter().flat_map(|o| [o.from, o.until]).collect();
    instants.sort_unstable();
    instants.dedup();

    let mut overloads = Vec::new();
    for rc in plan.origin().resources() {
        for &t in &instants {
            let mut loads: BTreeMap<Node, i64> = BTreeMap::new();
            for o in occupancies.iter().filter(|o| o.from <= t && t < o.until) {
                *loads.entry(o.node).or_default() += rc.consumption(o.vm);
            }
            for (node, load) in loads {
                let capacity = rc.capacity(node);
                if load > capacity {
                    overloads.push(Overload {
                        resource: rc.name().to_string(),
                        node,
                        at: t,
                        load,
                        capacity,
                    });
                }
            }
        }
    }
    overloads
}
