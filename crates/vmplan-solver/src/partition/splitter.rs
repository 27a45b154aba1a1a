//! Splitting of the constraints that span several partitions.

use std::collections::{BTreeSet, HashMap};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use vmplan_core::{
    Ban, Fence, Instance, Node, Offline, Online, Ready, Root, Running, SatConstraint, Sleeping, Vm,
};

/// Rewrites a constraint as one constraint per partition.
pub trait ConstraintSplitter: Send + Sync + Debug {
    /// Adds the pieces of `cstr` to the partitions. `vm_index` and
    /// `node_index` give the partition of every element of `origin`.
    ///
    /// Returns `false` when the constraint cannot be split.
    fn split(
        &self,
        cstr: &dyn SatConstraint,
        origin: &Instance,
        partitions: &mut [Instance],
        vm_index: &HashMap<Vm, usize>,
        node_index: &HashMap<Node, usize>,
    ) -> bool;
}

/// Groups elements by partition. `None` if an element has no partition.
fn by_partition<T: Copy + Ord + Hash>(
    elems: &BTreeSet<T>,
    index: &HashMap<T, usize>,
    n: usize,
) -> Option<Vec<BTreeSet<T>>> {
    let mut groups = vec![BTreeSet::new(); n];
    for e in elems {
        groups.get_mut(*index.get(e)?)?.insert(*e);
    }
    Some(groups)
}

fn dispatch<T>(
    partitions: &mut [Instance],
    groups: Vec<BTreeSet<T>>,
    make: impl Fn(BTreeSet<T>) -> Arc<dyn SatConstraint>,
) {
    for (p, group) in partitions.iter_mut().zip(groups) {
        if !group.is_empty() {
            p.add_constraint(make(group));
        }
    }
}

/// Splits the VM state constraints: every VM keeps its state constraint
/// in its own partition.
#[derive(Debug, Clone, Copy, Default)]
pub struct VmStateSplitter;

impl ConstraintSplitter for VmStateSplitter {
    fn split(
        &self,
        cstr: &dyn SatConstraint,
        _origin: &Instance,
        partitions: &mut [Instance],
        vm_index: &HashMap<Vm, usize>,
        _node_index: &HashMap<Node, usize>,
    ) -> bool {
        let n = partitions.len();
        if let Some(c) = cstr.downcast_ref::<Running>() {
            let Some(groups) = by_partition(c.vms(), vm_index, n) else { return false };
            dispatch(partitions, groups, |vms| Arc::new(Running::new(vms)));
        } else if let Some(c) = cstr.downcast_ref::<Ready>() {
            let Some(groups) = by_partition(c.vms(), vm_index, n) else { return false };
            dispatch(partitions, groups, |vms| Arc::new(Ready::new(vms)));
        } else if let Some(c) = cstr.downcast_ref::<Sleeping>() {
            let Some(groups) = by_partition(c.vms(), vm_index, n) else { return false };
            dispatch(partitions, groups, |vms| Arc::new(Sleeping::new(vms)));
        } else if let Some(c) = cstr.downcast_ref::<Root>() {
            let Some(groups) = by_partition(c.vms(), vm_index, n) else { return false };
            dispatch(partitions, groups, |vms| Arc::new(Root::new(vms)));
        } else {
            return false;
        }
        true
    }
}

/// Splits the node state constraints.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeStateSplitter;

impl ConstraintSplitter for NodeStateSplitter {
    fn split(
        &self,
        cstr: &dyn SatConstraint,
        _origin: &Instance,
        partitions: &mut [Instance],
        _vm_index: &HashMap<Vm, usize>,
        node_index: &HashMap<Node, usize>,
    ) -> bool {
        let n = partitions.len();
        if let Some(c) = cstr.downcast_ref::<Online>() {
            let Some(groups) = by_partition(c.nodes(), node_index, n) else { return false };
            dispatch(partitions, groups, |nodes| Arc::new(Online::new(nodes)));
        } else if let Some(c) = cstr.downcast_ref::<Offline>() {
            let Some(groups) = by_partition(c.nodes(), node_index, n) else { return false };
            dispatch(partitions, groups, |nodes| Arc::new(Offline::new(nodes)));
        } else {
            return false;
        }
        true
    }
}

/// Splits a ban: in each partition, its VMs are banned from its nodes.
///
/// Nodes of other partitions are unreachable anyway.
#[derive(Debug, Clone, Copy, Default)]
pub struct BanSplitter;

impl ConstraintSplitter for BanSplitter {
    fn split(
        &self,
        cstr: &dyn SatConstraint,
        _origin: &Instance,
        partitions: &mut [Instance],
        vm_index: &HashMap<Vm, usize>,
        node_index: &HashMap<Node, usize>,
    ) -> bool {
        let Some(c) = cstr.downcast_ref::<Ban>() else { return false };
        let n = partitions.len();
        let (Some(vms), Some(nodes)) = (
            by_partition(c.vms(), vm_index, n),
            by_partition(c.nodes(), node_index, n),
        ) else {
            return false;
        };
        for ((p, vms), nodes) in partitions.iter_mut().zip(vms).zip(nodes) {
            if !vms.is_empty() && !nodes.is_empty() {
                p.add_constraint(Arc::new(Ban::new(vms, nodes)));
            }
        }
        true
    }
}

/// Splits a fence: in each partition, its VMs are restricted to the
/// nodes of the fence in that partition, possibly none.
#[derive(Debug, Clone, Copy, Default)]
pub struct FenceSplitter;

impl ConstraintSplitter for FenceSplitter {
    fn split(
        &self,
        cstr: &dyn SatConstraint,
        _origin: &Instance,
        partitions: &mut [Instance],
        vm_index: &HashMap<Vm, usize>,
        node_index: &HashMap<Node, usize>,
    ) -> bool {
        let Some(c) = cstr.downcast_ref::<Fence>() else { return false };
        let n = partitions.len();
        let (Some(vms), Some(nodes)) = (
            by_partition(c.vms(), vm_index, n),
            by_partition(c.nodes(), node_index, n),
        ) else {
            return false;
        };
        for ((p, vms), nodes) in partitions.iter_mut().zip(vms).zip(nodes) {
            if !vms.is_empty() {
                p.add_constraint(Arc::new(Fence::new(vms, nodes)));
            }
        }
        true
    }
}

/// The splitters of the built-in constraints, by kind.
///
/// `runningCapacity` has none: a capacity shared by several partitions
/// cannot be divided without choosing a share for each one.
pub fn default_splitters() -> HashMap<&'static str, Arc<dyn ConstraintSplitter>> {
    let vm_state: Arc<dyn ConstraintSplitter> = Arc::new(VmStateSplitter);
    let node_state: Arc<dyn ConstraintSplitter> = Arc::new(NodeStateSplitter);
    let mut m = HashMap::new();
    for kind in ["running", "ready", "sleeping", "root"] {
        m.insert(kind, vm_state.clone());
    }
    for kind in ["online", "offline"] {
        m.insert(kind, node_state.clone());
    }
    m.insert("ban", Arc::new(BanSplitter) as Arc<dyn ConstraintSplitter>);
    m.insert("fence", Arc::new(FenceSplitter));
    m
}
