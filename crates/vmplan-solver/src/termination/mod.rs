//! Termination conditions for the search.

mod composite;
mod count;
mod external;
mod time;

use std::fmt::Debug;

use crate::cp::SearchMonitor;

pub use composite::OrTermination;
pub use count::{BacktrackCountTermination, NodeCountTermination};
pub use external::ExternalTermination;
pub use time::TimeTermination;

/// Trait for determining when to stop searching.
pub trait Termination: Send + Sync + Debug {
    /// Returns true if the search should stop.
    fn is_terminated(&self, monitor: &SearchMonitor) -> bool;
}

/// Never terminates: the search runs until it completes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTermination;

impl Termination for NoTermination {
    fn is_terminated(&self, _monitor: &SearchMonitor) -> bool {
        false
    }
}

#[cfg(test)]
mod tests;
