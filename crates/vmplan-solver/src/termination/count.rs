//! Count-based terminations.

use super::Termination;
use crate::cp::SearchMonitor;

/// Terminates after a number of backtracks.
#[derive(Debug, Clone, Copy)]
pub struct BacktrackCountTermination {
    limit: u64,
}

impl BacktrackCountTermination {
    pub fn new(limit: u64) -> Self {
        Self { limit }
    }
}

impl Termination for BacktrackCountTermination {
    fn is_terminated(&self, monitor: &SearchMonitor) -> bool {
        monitor.backtracks >= self.limit
    }
}

/// Terminates after a number of search nodes.
#[derive(Debug, Clone, Copy)]
pub struct NodeCountTermination {
    limit: u64,
}

impl NodeCountTermination {
    pub fn new(limit: u64) -> Self {
        Self { limit }
    }
}

impl Termination for NodeCountTermination {
    fn is_terminated(&self, monitor: &SearchMonitor) -> bool {
        monitor.nodes >= self.limit
    }
}
