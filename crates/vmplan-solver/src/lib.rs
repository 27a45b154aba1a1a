//! vmplan Solver Engine
//!
//! This crate turns a problem instance into a reconfiguration plan:
//! - A small finite-domain constraint engine ([`cp`])
//! - Slices, transitions and the slice scheduler
//! - The reconfiguration problem and its builder
//! - Objectives and search heuristics
//! - Instance runners and solving statistics
//! - Static partitioning of large instances
//! - Termination conditions

pub mod constraint;
pub mod cp;
pub mod duration;
pub mod heuristic;
pub mod objective;
pub mod params;
pub mod partition;
pub mod problem;
pub mod runner;
pub mod scheduler;
pub mod slice;
pub mod termination;
pub mod transition;

pub use constraint::{ConstraintMapper, SolverConstraint};
pub use duration::{
    ActionDurationEvaluator, AttributeDuration, ConstantDuration, DurationEvaluators, FnDuration,
};
pub use heuristic::{MovementGraph, OnStableNodeFirst, RandomVmPlacement, StartOnLeafNodes};
pub use objective::{MinMigrations, MinMttr};
pub use params::Parameters;
pub use partition::{
    ConstraintSplitter, FixedNodeSetsPartitioning, FixedSizePartitioning, StaticPartitioning,
};
pub use problem::{ReconfigurationProblem, ReconfigurationProblemBuilder};
pub use runner::{
    DefaultInstanceSolver, InstanceResult, InstanceSolver, InstanceSolverRunner,
    PartitionedStatistics, SolutionStatistics, SolveStatus, SolvingStatistics, Statistics,
};
pub use slice::Slice;
pub use termination::{
    BacktrackCountTermination, ExternalTermination, NodeCountTermination, OrTermination,
    Termination, TimeTermination,
};
pub use transition::{NodeTransition, Transition, TransitionFactory, VmTransition};
