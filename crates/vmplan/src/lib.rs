//! vmplan - Reconfiguration scheduling for virtualized datacenters
//!
//! Describe the datacenter and the wanted properties, call
//! [`Scheduler::solve`], get a timed plan of actions.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use vmplan::prelude::*;
//!
//! let mut mo = Model::new();
//! let n = mo.new_node();
//! let vm = mo.new_vm();
//! mo.mapping_mut().add_online_node(n);
//! mo.mapping_mut().add_running_vm(vm, n);
//!
//! let instance = Instance::new(mo, vec![Arc::new(Ready::new([vm]))], Objective::MinMttr);
//! let result = Scheduler::new().solve(&instance).unwrap();
//!
//! assert_eq!(result.status, SolveStatus::Solved);
//! assert_eq!(result.plan.unwrap().size(), 1);
//! ```

mod logging;
mod scheduler;

pub use logging::init_tracing;
pub use scheduler::Scheduler;

pub use vmplan_config::{PartitioningConfig, SchedulerConfig, WorkerCount};
pub use vmplan_core::{
    Action, ActionKind, Ban, Element, Fence, Instance, Model, Node, Objective, Offline, Online,
    Operation, Ready, ReconfigurationPlan, Result, Root, Running, RunningCapacity, SatConstraint,
    SchedulerError, ShareableResource, Sleeping, Vm, VmState,
};
pub use vmplan_solver::{
    DefaultInstanceSolver, FixedNodeSetsPartitioning, FixedSizePartitioning, InstanceResult,
    InstanceSolver, Parameters, SolveStatus, StaticPartitioning, Statistics,
};

pub mod prelude {
    pub use super::{
        Ban, Fence, Instance, Model, Node, Objective, Offline, Online, Ready, Root, Running,
        RunningCapacity, Scheduler, SchedulerConfig, ShareableResource, Sleeping, SolveStatus, Vm,
    };
}
