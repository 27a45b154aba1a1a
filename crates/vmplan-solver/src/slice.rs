//! Slices: time intervals a VM spends on a node.

use smallvec::SmallVec;
use vmplan_core::Vm;

use crate::cp::{DomainView, IntVar};

/// Demand of a slice, one entry per resource of the model.
pub type Demand = SmallVec<[i64; 4]>;

/// A VM occupying a node over `[start, end)`.
///
/// A consuming slice (cSlice) is the part of a VM on its source node: it
/// starts with the reconfiguration and ends when the VM leaves. A
/// demanding slice (dSlice) is the part on the destination node: it starts
/// when the VM arrives and lasts until the end of the reconfiguration.
/// The hoster variable takes node ids as values.
#[derive(Debug, Clone)]
pub struct Slice {
    subject: Vm,
    start: IntVar,
    end: IntVar,
    duration: IntVar,
    hoster: IntVar,
    demand: Demand,
}

impl Slice {
    pub(crate) fn new(
        subject: Vm,
        start: IntVar,
        end: IntVar,
        duration: IntVar,
        hoster: IntVar,
        demand: Demand,
    ) -> Self {
        Self {
            subject,
            start,
            end,
            duration,
            hoster,
            demand,
        }
    }

    pub fn subject(&self) -> Vm {
        self.subject
    }

    pub fn start(&self) -> IntVar {
        self.start
    }

    pub fn end(&self) -> IntVar {
        self.end
    }

    pub fn duration(&self) -> IntVar {
        self.duration
    }

    pub fn hoster(&self) -> IntVar {
        self.hoster
    }

    /// Demand for each resource, in the order of the model resources.
    pub fn demand(&self) -> &[i64] {
        &self.demand
    }

    /// Sum of the demands over every resource.
    pub fn total_demand(&self) -> i64 {
        self.demand.iter().sum()
    }

    /// The node hosting the slice, once decided.
    pub fn host(&self, view: &(impl DomainView + ?Sized)) -> Option<i64> {
        view.value(self.hoster)
    }

    /// `true` if the slice may end up on the given node.
    pub fn may_be_on(&self, view: &(impl DomainView + ?Sized), node: i64) -> bool {
        view.contains(self.hoster, node)
    }
}
