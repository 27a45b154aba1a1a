//! The default branching order of a reconfiguration problem.

use std::cmp::Reverse;

use tracing::debug;

use crate::cp::{
    DomainView, FirstFail, InputOrder, IntStrategy, IntVar, MaxValue, MinValue, StrategySequence,
};
use crate::params::Parameters;
use crate::problem::ReconfigurationProblem;
use crate::transition::{NodeTransition, Transition};

use super::{OnStableNodeFirst, RandomVmPlacement, StartOnLeafNodes};

/// Builds the strategies used by the objectives, in order:
///
/// 1. hosts of the VMs to place, mis-placed and host-less VMs first, the
///    heaviest first;
/// 2. relocation methods, re-instantiating first;
/// 3. node states, keeping online nodes up and offline nodes down;
/// 4. end of the node boots;
/// 5. starts of the VMs arriving on leaf nodes;
/// 6. starts of the remaining VMs, moving ones first;
/// 7. end of the node shutdowns;
/// 8. end of every transition;
/// 9. end of the reconfiguration, then the cost.
pub fn default_strategy(rp: &ReconfigurationProblem, params: &Parameters, cost: IntVar) -> StrategySequence {
    let store = rp.csp().store();
    let mis_placed = rp.mis_placed_vms();

    let mut placement = RandomVmPlacement::new(params.random_seed());
    if let Some(buckets) = params.host_buckets() {
        placement = placement.with_buckets(
            buckets
                .iter()
                .map(|b| b.iter().map(|n| n.id() as i64).collect())
                .collect(),
        );
    }
    let mut bad = Vec::new();
    let mut good = Vec::new();
    for t in rp.vm_transitions() {
        let Some(d) = t.d_slice() else { continue };
        if store.is_bound(d.hoster()) {
            continue;
        }
        let current = t.c_slice().and_then(|c| store.value(c.hoster()));
        if let Some(host) = current {
            placement.prefer(d.hoster(), host);
        }
        let key = (Reverse(d.total_demand()), t.vm(), d.hoster());
        if current.is_none() || mis_placed.contains(&t.vm()) {
            bad.push(key);
        } else {
            good.push(key);
        }
    }
    bad.sort();
    good.sort();
    let hosters: Vec<IntVar> = bad.iter().chain(&good).map(|(_, _, h)| *h).collect();

    let mut shutdownable = Vec::new();
    let mut bootable = Vec::new();
    let mut boot_ends = Vec::new();
    let mut shutdown_ends = Vec::new();
    for t in rp.node_transitions() {
        match t {
            NodeTransition::Boot(b) => {
                bootable.push(b.state());
                boot_ends.push(b.end());
            }
            NodeTransition::Shutdown(s) => {
                shutdownable.push(s.state());
                shutdown_ends.push(s.end());
            }
        }
    }

    let methods: Vec<IntVar> = rp
        .vm_transitions()
        .iter()
        .filter_map(|t| t.as_relocatable().and_then(|r| r.method()))
        .collect();
    let ends: Vec<IntVar> = rp
        .node_transitions()
        .iter()
        .map(|t| t.end())
        .chain(rp.vm_transitions().iter().map(|t| t.end()))
        .collect();

    debug!(
        event = "strategy",
        placed = hosters.len(),
        misplaced = bad.len(),
        methods = methods.len(),
        ends = ends.len(),
    );

    let mut seq = StrategySequence::new();
    seq.push(IntStrategy::new("placement", hosters, InputOrder, placement));
    seq.push(IntStrategy::new("method", methods, FirstFail, MaxValue));
    seq.push(IntStrategy::new("node.online", shutdownable, InputOrder, MaxValue));
    seq.push(IntStrategy::new("node.offline", bootable, InputOrder, MinValue));
    seq.push(IntStrategy::new("boot.end", boot_ends, FirstFail, MinValue));
    seq.push(StartOnLeafNodes::new(rp));
    seq.push(OnStableNodeFirst::new(rp));
    seq.push(IntStrategy::new("shutdown.end", shutdown_ends, FirstFail, MinValue));
    seq.push(IntStrategy::new("end", ends, InputOrder, MinValue));
    seq.push(IntStrategy::new("cost", vec![rp.end(), cost], InputOrder, MinValue));
    seq
}
