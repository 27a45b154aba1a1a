//! Composite termination.

use super::Termination;
use crate::cp::SearchMonitor;

/// Terminates when ANY child terminates.
///
/// # Examples
///
/// ```
/// use vmplan_solver::termination::{
///     BacktrackCountTermination, OrTermination, TimeTermination,
/// };
///
/// // Terminate after 30 seconds OR 1000 backtracks
/// let termination = OrTermination::new()
///     .with(TimeTermination::seconds(30))
///     .with(BacktrackCountTermination::new(1000));
/// assert_eq!(termination.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct OrTermination {
    children: Vec<Box<dyn Termination>>,
}

impl OrTermination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, t: impl Termination + 'static) -> Self {
        self.children.push(Box::new(t));
        self
    }

    pub fn push(&mut self, t: impl Termination + 'static) {
        self.children.push(Box::new(t));
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl Termination for OrTermination {
    fn is_terminated(&self, monitor: &SearchMonitor) -> bool {
        self.children.iter().any(|t| t.is_terminated(monitor))
    }
}
