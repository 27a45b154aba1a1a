//! Pending movements between nodes.

use std::collections::HashMap;

use vmplan_core::Node;

use crate::cp::{DomainStore, DomainView, IntVar};
use crate::problem::ReconfigurationProblem;
use crate::transition::Transition;

/// A VM that may arrive on a node.
#[derive(Debug, Clone, Copy)]
struct Arrival {
    start: IntVar,
    hoster: IntVar,
    /// Node the VM already runs on, not an arrival.
    source: Option<i64>,
}

/// A VM that may leave a node.
#[derive(Debug, Clone, Copy)]
struct Departure {
    node: usize,
    end: IntVar,
    /// Unset for VMs that leave in any case.
    stay: Option<IntVar>,
}

/// For every node, the VMs that may still arrive on it and the VMs that
/// may still leave it.
///
/// A node nobody has to leave anymore is a *leaf*: VMs can arrive there
/// right away without waiting for any departure.
///
/// The graph is rebuilt from the current domains by [`refresh`]. Edges are
/// stored per node index and the buffers are reused across refreshes.
///
/// [`refresh`]: MovementGraph::refresh
#[derive(Debug, Clone)]
pub struct MovementGraph {
    node_ids: Vec<i64>,
    index: HashMap<i64, usize>,
    arrivals: Vec<Arrival>,
    departures: Vec<Departure>,
    incoming: Vec<Vec<usize>>,
    outgoing: Vec<Vec<usize>>,
}

impl MovementGraph {
    /// Collects the movements of the managed VMs of a problem.
    pub fn new(rp: &ReconfigurationProblem) -> Self {
        let node_ids: Vec<i64> = rp.nodes().iter().map(|n| n.id() as i64).collect();
        let index: HashMap<i64, usize> = node_ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        let store = rp.csp().store();
        let mut arrivals = Vec::new();
        let mut departures = Vec::new();
        for t in rp.vm_transitions().iter().filter(|t| t.is_managed()) {
            let relocatable = t.as_relocatable();
            if let Some(d) = t.d_slice() {
                arrivals.push(Arrival {
                    start: d.start(),
                    hoster: d.hoster(),
                    source: relocatable.map(|r| r.source().id() as i64),
                });
            }
            if let Some(c) = t.c_slice() {
                let node = store
                    .value(c.hoster())
                    .and_then(|id| rp.node_index(Node(id as u32)));
                if let Some(node) = node {
                    departures.push(Departure {
                        node,
                        end: c.end(),
                        stay: relocatable.map(|r| r.stay()),
                    });
                }
            }
        }
        let n = node_ids.len();
        Self {
            node_ids,
            index,
            arrivals,
            departures,
            incoming: vec![Vec::new(); n],
            outgoing: vec![Vec::new(); n],
        }
    }

    /// Rebuilds the edges from the current domains.
    pub fn refresh(&mut self, store: &DomainStore) {
        self.incoming.iter_mut().for_each(Vec::clear);
        self.outgoing.iter_mut().for_each(Vec::clear);
        for (i, a) in self.arrivals.iter().enumerate() {
            if store.is_bound(a.start) {
                continue;
            }
            for id in store.values(a.hoster) {
                if Some(id) == a.source {
                    continue;
                }
                if let Some(&k) = self.index.get(&id) {
                    self.incoming[k].push(i);
                }
            }
        }
        for (i, d) in self.departures.iter().enumerate() {
            if store.is_bound(d.end) || d.stay.is_some_and(|s| store.value(s) == Some(1)) {
                continue;
            }
            self.outgoing[d.node].push(i);
        }
    }

    pub fn nb_nodes(&self) -> usize {
        self.node_ids.len()
    }

    /// Id of the node at an index.
    pub fn node_id(&self, k: usize) -> i64 {
        self.node_ids[k]
    }

    /// Start moments of the VMs that may arrive on a node.
    pub fn incoming(&self, k: usize) -> impl Iterator<Item = IntVar> + '_ {
        self.incoming[k].iter().map(|&i| self.arrivals[i].start)
    }

    /// Incoming start moments with the hoster variable of the VM.
    pub fn incoming_with_hoster(&self, k: usize) -> impl Iterator<Item = (IntVar, IntVar)> + '_ {
        self.incoming[k]
            .iter()
            .map(|&i| (self.arrivals[i].start, self.arrivals[i].hoster))
    }

    /// End moments of the VMs that may leave a node.
    pub fn outgoing(&self, k: usize) -> impl Iterator<Item = IntVar> + '_ {
        self.outgoing[k].iter().map(|&i| self.departures[i].end)
    }

    pub fn is_leaf(&self, k: usize) -> bool {
        self.outgoing[k].is_empty()
    }
}
