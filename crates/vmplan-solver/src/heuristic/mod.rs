//! Search heuristics of the reconfiguration problem.
//!
//! The branching order matters more than the engine: a good first
//! solution comes from placing the VMs first, then scheduling the actions
//! so that nodes are freed before VMs arrive on them.

mod chain;
mod leaf;
mod movement_graph;
mod placement;
mod stable;

pub use chain::default_strategy;
pub use leaf::StartOnLeafNodes;
pub use movement_graph::MovementGraph;
pub use placement::RandomVmPlacement;
pub use stable::OnStableNodeFirst;
