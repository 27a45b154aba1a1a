//! Starts the VMs arriving on leaf nodes first.

use crate::cp::{Decision, DomainStore, DomainView, Strategy};
use crate::problem::ReconfigurationProblem;

use super::MovementGraph;

/// Schedules the arrivals on nodes no VM has to leave, at their earliest
/// moment.
///
/// VMs already placed on a leaf go first, then any VM that may still
/// land on one. Once no leaf has a pending arrival the strategy gives up
/// its turn.
#[derive(Debug, Clone)]
pub struct StartOnLeafNodes {
    graph: MovementGraph,
}

impl StartOnLeafNodes {
    pub fn new(rp: &ReconfigurationProblem) -> Self {
        Self {
            graph: MovementGraph::new(rp),
        }
    }

    pub fn graph(&self) -> &MovementGraph {
        &self.graph
    }
}

impl Strategy for StartOnLeafNodes {
    fn next_decision(&mut self, store: &DomainStore) -> Option<Decision> {
        self.graph.refresh(store);
        let leaves: Vec<usize> = (0..self.graph.nb_nodes())
            .filter(|&k| self.graph.is_leaf(k))
            .collect();
        let placed = leaves.iter().find_map(|&k| {
            let id = self.graph.node_id(k);
            self.graph
                .incoming_with_hoster(k)
                .find(|(_, hoster)| store.value(*hoster) == Some(id))
                .map(|(start, _)| start)
        });
        let start = placed.or_else(|| leaves.iter().find_map(|&k| self.graph.incoming(k).next()))?;
        Some(Decision {
            var: start,
            value: store.lb(start),
        })
    }
}
