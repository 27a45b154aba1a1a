//! Schedules the remaining VM transitions.

use crate::cp::{Decision, DomainStore, DomainView, IntVar, Strategy};
use crate::problem::ReconfigurationProblem;
use crate::transition::Transition;

#[derive(Debug, Clone, Copy)]
struct Candidate {
    start: IntVar,
    /// `Some` for relocations, whose move depends on it.
    stay: Option<IntVar>,
    arrives: bool,
}

/// Instantiates the start of the managed VM transitions at their earliest
/// moment, VMs changing node first, the earliest one first.
#[derive(Debug, Clone)]
pub struct OnStableNodeFirst {
    candidates: Vec<Candidate>,
}

impl OnStableNodeFirst {
    pub fn new(rp: &ReconfigurationProblem) -> Self {
        let candidates = rp
            .vm_transitions()
            .iter()
            .filter(|t| t.is_managed())
            .map(|t| Candidate {
                start: t.start(),
                stay: t.as_relocatable().map(|r| r.stay()),
                arrives: t.d_slice().is_some(),
            })
            .collect();
        Self { candidates }
    }

    fn earliest(
        &self,
        store: &DomainStore,
        keep: impl Fn(&Candidate) -> bool,
    ) -> Option<IntVar> {
        self.candidates
            .iter()
            .filter(|c| !store.is_bound(c.start) && keep(c))
            .min_by_key(|c| store.lb(c.start))
            .map(|c| c.start)
    }
}

impl Strategy for OnStableNodeFirst {
    fn next_decision(&mut self, store: &DomainStore) -> Option<Decision> {
        let moving = |c: &Candidate| c.arrives && c.stay.map_or(true, |s| store.value(s) == Some(0));
        let var = self
            .earliest(store, moving)
            .or_else(|| self.earliest(store, |_| true))?;
        Some(Decision {
            var,
            value: store.lb(var),
        })
    }
}
