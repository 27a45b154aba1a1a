//! Declarative constraints over a model.
//!
//! A constraint states a property the model resulting from a
//! reconfiguration must satisfy. The scheduler never interprets a
//! constraint directly: it looks up the solver-side implementation
//! registered for the constraint [`kind`](SatConstraint::kind).

mod placement;
mod state;

use std::any::Any;
use std::fmt::Debug;

pub use placement::{Ban, Fence, Root, RunningCapacity};
pub use state::{Offline, Online, Ready, Running, Sleeping};

use crate::model::{Model, Node, Vm};

/// A constraint checked against a model.
pub trait SatConstraint: Debug + Send + Sync {
    /// Tag used to find the solver-side implementation and the splitter.
    fn kind(&self) -> &'static str;

    fn involved_vms(&self) -> Vec<Vm>;

    fn involved_nodes(&self) -> Vec<Node>;

    /// Checks the constraint on a model.
    fn is_satisfied(&self, model: &Model) -> bool;

    /// `true` if the constraint must hold at every moment of a
    /// reconfiguration, not only at its end.
    fn is_continuous(&self) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any;
}

impl<'a> dyn SatConstraint + 'a {
    /// Downcasts to a concrete constraint.
    pub fn downcast_ref<T: SatConstraint + 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}
