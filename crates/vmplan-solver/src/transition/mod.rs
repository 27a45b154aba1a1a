//! State changes of the elements, as constraint models.
//!
//! Every node and every VM of a problem gets exactly one transition. A
//! transition owns the variables describing when the element changes its
//! state and where it is hosted, and turns their values into an
//! [`Action`] once the search has bound them.

mod factory;
mod node;
mod vm;

use vmplan_core::{Action, ActionKind, Element, Model, Node, Result, SchedulerError, Vm};

use crate::cp::{Csp, DomainView, IntVar, Linear};
use crate::duration::DurationEvaluators;
use crate::slice::{Demand, Slice};

pub use factory::{TransitionFactory, VmTransitionKind};
pub use node::{BootableNode, ShutdownableNode};
pub use vm::{BootVm, RelocatableVm, ResumeVm, ShutdownVm, StayVm, SuspendVm};

/// Variables shared by every kind of transition.
pub trait Transition {
    fn element(&self) -> Element;

    fn start(&self) -> IntVar;

    fn end(&self) -> IntVar;

    /// `end - start`.
    fn duration(&self) -> IntVar;

    /// Boolean telling whether the element is up at the end: online for a
    /// node, running for a VM.
    fn state(&self) -> IntVar;

    /// The part on the source node.
    fn c_slice(&self) -> Option<&Slice> {
        None
    }

    /// The part on the destination node.
    fn d_slice(&self) -> Option<&Slice> {
        None
    }

    /// The action performed, `None` when nothing happens.
    fn materialize(&self, view: &dyn DomainView) -> Option<Action>;
}

/// Transition of a node.
#[derive(Debug, Clone)]
pub enum NodeTransition {
    Boot(BootableNode),
    Shutdown(ShutdownableNode),
}

impl NodeTransition {
    pub fn node(&self) -> Node {
        match self {
            NodeTransition::Boot(t) => t.node(),
            NodeTransition::Shutdown(t) => t.node(),
        }
    }

    /// Moment VMs may start arriving on the node.
    pub fn hosting_start(&self) -> IntVar {
        match self {
            NodeTransition::Boot(t) => t.hosting_start(),
            NodeTransition::Shutdown(t) => t.hosting_start(),
        }
    }

    /// Moment every VM must have left the node.
    pub fn hosting_end(&self) -> IntVar {
        match self {
            NodeTransition::Boot(t) => t.hosting_end(),
            NodeTransition::Shutdown(t) => t.hosting_end(),
        }
    }

    fn inner(&self) -> &dyn Transition {
        match self {
            NodeTransition::Boot(t) => t,
            NodeTransition::Shutdown(t) => t,
        }
    }
}

/// Transition of a VM.
#[derive(Debug, Clone)]
pub enum VmTransition {
    Stay(StayVm),
    Boot(BootVm),
    Shutdown(ShutdownVm),
    Relocate(RelocatableVm),
    Suspend(SuspendVm),
    Resume(ResumeVm),
}

impl VmTransition {
    pub fn vm(&self) -> Vm {
        match self {
            VmTransition::Stay(t) => t.vm(),
            VmTransition::Boot(t) => t.vm(),
            VmTransition::Shutdown(t) => t.vm(),
            VmTransition::Relocate(t) => t.vm(),
            VmTransition::Suspend(t) => t.vm(),
            VmTransition::Resume(t) => t.vm(),
        }
    }

    pub fn kind(&self) -> VmTransitionKind {
        match self {
            VmTransition::Stay(_) => VmTransitionKind::Stay,
            VmTransition::Boot(_) => VmTransitionKind::Boot,
            VmTransition::Shutdown(_) => VmTransitionKind::Shutdown,
            VmTransition::Relocate(_) => VmTransitionKind::Relocate,
            VmTransition::Suspend(_) => VmTransitionKind::Suspend,
            VmTransition::Resume(_) => VmTransitionKind::Resume,
        }
    }

    /// `true` if the VM may be hosted elsewhere at the end or changes
    /// state: everything but a stay.
    pub fn is_managed(&self) -> bool {
        !matches!(self, VmTransition::Stay(_))
    }

    /// The relocation, if the VM is running and stays running.
    pub fn as_relocatable(&self) -> Option<&RelocatableVm> {
        match self {
            VmTransition::Relocate(t) => Some(t),
            _ => None,
        }
    }

    fn inner(&self) -> &dyn Transition {
        match self {
            VmTransition::Stay(t) => t,
            VmTransition::Boot(t) => t,
            VmTransition::Shutdown(t) => t,
            VmTransition::Relocate(t) => t,
            VmTransition::Suspend(t) => t,
            VmTransition::Resume(t) => t,
        }
    }
}

macro_rules! delegate_transition {
    ($ty:ty) => {
        impl Transition for $ty {
            fn element(&self) -> Element {
                self.inner().element()
            }

            fn start(&self) -> IntVar {
                self.inner().start()
            }

            fn end(&self) -> IntVar {
                self.inner().end()
            }

            fn duration(&self) -> IntVar {
                self.inner().duration()
            }

            fn state(&self) -> IntVar {
                self.inner().state()
            }

            fn c_slice(&self) -> Option<&Slice> {
                self.inner().c_slice()
            }

            fn d_slice(&self) -> Option<&Slice> {
                self.inner().d_slice()
            }

            fn materialize(&self, view: &dyn DomainView) -> Option<Action> {
                self.inner().materialize(view)
            }
        }
    };
}

delegate_transition!(NodeTransition);
delegate_transition!(VmTransition);

/// What transitions need from the problem under construction.
pub struct TransitionContext<'a> {
    pub csp: &'a mut Csp,
    pub model: &'a Model,
    pub durations: &'a DurationEvaluators,
    /// Constant 0, the beginning of the reconfiguration.
    pub start: IntVar,
    /// End of the reconfiguration.
    pub end: IntVar,
    pub max_end: i64,
    /// Ids of the nodes a VM may be hosted on.
    pub hosts: &'a [i64],
}

impl TransitionContext<'_> {
    /// A moment of the reconfiguration, constrained to end with it.
    pub fn time_var(&mut self, label: &str) -> IntVar {
        let v = self.csp.int_var(label, 0, self.max_end);
        self.csp.post(Linear::leq_offset(v, self.end, 0));
        v
    }

    /// A hoster variable over every node.
    pub fn host_var(&mut self, label: &str) -> IntVar {
        self.csp.enum_var(label, self.hosts.to_vec())
    }

    pub fn constant(&mut self, value: i64) -> IntVar {
        self.csp.constant(value)
    }

    pub fn bool_var(&mut self, label: &str) -> IntVar {
        self.csp.bool_var(label)
    }

    /// Estimated duration of an action.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::ModelInconsistency`] when the estimate is missing
    /// or negative.
    pub fn duration(&self, kind: ActionKind, e: impl Into<Element>) -> Result<i64> {
        self.durations.evaluate(self.model, kind, e.into())
    }

    /// Estimated duration of an action that must fit in the
    /// reconfiguration.
    pub fn bounded_duration(&self, kind: ActionKind, e: impl Into<Element>) -> Result<i64> {
        let e = e.into();
        let d = self.duration(kind, e)?;
        if d > self.max_end {
            return Err(SchedulerError::inconsistency(format!(
                "duration of '{}' on {} ({}) exceeds the maximum end ({})",
                kind, e, d, self.max_end
            )));
        }
        Ok(d)
    }

    /// Resource demand of a VM.
    pub fn demand(&self, vm: Vm) -> Demand {
        self.model
            .resources()
            .iter()
            .map(|r| r.consumption(vm))
            .collect()
    }

    /// A demand of zero on every resource.
    pub fn no_demand(&self) -> Demand {
        self.model.resources().iter().map(|_| 0).collect()
    }

    /// A consuming slice: starts with the reconfiguration and ends at
    /// `end` on the given node.
    pub fn c_slice(&mut self, vm: Vm, host: Node, end: IntVar, demand: Demand) -> Slice {
        let hoster = self.constant(host.id() as i64);
        // the slice starts at 0 so its duration is its end
        Slice::new(vm, self.start, end, end, hoster, demand)
    }

    /// A demanding slice: starts at `start` and lasts until the end of the
    /// reconfiguration.
    pub fn d_slice(&mut self, vm: Vm, label: &str, start: IntVar, hoster: IntVar, demand: Demand) -> Slice {
        let duration = self.csp.int_var(&format!("{}.dSlice.duration", label), 0, self.max_end);
        self.csp
            .post(Linear::eq(vec![(1, self.end), (-1, start), (-1, duration)], 0));
        Slice::new(vm, start, self.end, duration, hoster, demand)
    }

    /// Posts `end = start + duration`.
    pub fn link(&mut self, start: IntVar, duration: IntVar, end: IntVar) {
        self.csp
            .post(Linear::eq(vec![(1, end), (-1, start), (-1, duration)], 0));
    }
}
