//! vmplan Core - datacenter model and reconfiguration plans
//!
//! This crate provides the types shared by every vmplan crate:
//! - Elements (nodes and VMs), their placement and attributes
//! - Shareable resources
//! - Declarative constraints and problem instances
//! - Timed actions and reconfiguration plans

pub mod constraint;
pub mod error;
pub mod instance;
pub mod model;
pub mod plan;

pub use constraint::{
    Ban, Fence, Offline, Online, Ready, Root, Running, RunningCapacity, SatConstraint, Sleeping,
};
pub use error::{Result, SchedulerError};
pub use instance::{Instance, Objective};
pub use model::{
    AttrValue, Attributes, Element, Mapping, Model, Node, NodeState, ShareableResource, Vm,
    VmState,
};
pub use plan::{Action, ActionKind, Operation, ReconfigurationPlan};
