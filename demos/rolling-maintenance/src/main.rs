//! Rolling Maintenance Example
//!
//! A rack of hypervisors must be patched a few at a time: the nodes of the
//! current batch go offline, their VMs are moved to the other nodes of the
//! rack, and a couple of pending VMs are started on the way.
//!
//! Run with: cargo run -p rolling-maintenance [-- scheduler.toml]

use std::sync::Arc;

use vmplan::prelude::*;
use vmplan::{init_tracing, SatConstraint, Statistics};

const NODES: usize = 8;
const VMS_PER_NODE: usize = 3;
const BATCH: usize = 2;

/// Builds the rack: 8 online nodes of 16 cores, 3 VMs of 2 to 4 cores on
/// each, 2 ready VMs.
fn build_rack() -> (Model, Vec<Node>, Vec<Vm>) {
    let mut mo = Model::new();
    let mut cpu = ShareableResource::new("cpu", 16, 2);
    let mut nodes = Vec::new();
    let mut ready = Vec::new();

    for i in 0..NODES {
        let n = mo.new_node();
        mo.mapping_mut().add_online_node(n);
        for j in 0..VMS_PER_NODE {
            let vm = mo.new_vm();
            mo.mapping_mut().add_running_vm(vm, n);
            cpu.set_consumption(vm, 2 + ((i + j) % 3) as i64);
            // large VMs are slower to migrate
            mo.attributes_mut().put(vm, "migrate", 2 + ((i + j) % 3) as i64);
        }
        nodes.push(n);
    }
    for _ in 0..2 {
        let vm = mo.new_vm();
        mo.mapping_mut().add_ready_vm(vm);
        mo.attributes_mut().put(vm, "boot", 3i64);
        ready.push(vm);
    }
    mo.add_resource(cpu);
    (mo, nodes, ready)
}

fn print_report(batch: usize, stats: &Statistics) {
    println!("Batch {} statistics: {}", batch, stats);
}

fn main() {
    init_tracing();

    let scheduler = match std::env::args().nth(1) {
        Some(path) => Scheduler::load(&path).unwrap_or_else(|e| {
            eprintln!("cannot load {}: {}", path, e);
            std::process::exit(1);
        }),
        None => Scheduler::new(),
    };

    let (mut model, nodes, ready) = build_rack();
    for (batch, group) in nodes.chunks(BATCH).enumerate() {
        let mut constraints: Vec<Arc<dyn SatConstraint>> = vec![Arc::new(Offline::new(group.iter().copied()))];
        if batch == 0 {
            constraints.push(Arc::new(Running::new(ready.iter().copied())));
        }
        // the nodes patched earlier must not be left down
        let done: Vec<Node> = nodes[..batch * BATCH].to_vec();
        if !done.is_empty() {
            constraints.push(Arc::new(Online::new(done)));
        }
        let instance = Instance::new(model.clone(), constraints, Objective::MinMttr);

        let result = match scheduler.solve(&instance) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("batch {}: {}", batch, e);
                std::process::exit(1);
            }
        };
        print_report(batch, &result.statistics);
        let Some(plan) = result.plan else {
            eprintln!("batch {}: no plan ({:?})", batch, result.status);
            std::process::exit(2);
        };
        println!("{}", plan);

        model = match plan.apply() {
            Ok(after) => after,
            Err(e) => {
                eprintln!("batch {}: plan cannot be applied: {}", batch, e);
                std::process::exit(1);
            }
        };
        // patched nodes come back for the next batch
        for &n in group {
            model.mapping_mut().add_online_node(n);
        }
    }
}
