//! Partitioning over caller-supplied node sets.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};
use vmplan_core::{Element, Instance, Node, Result, SchedulerError, Vm};

use super::splitter::{default_splitters, ConstraintSplitter};
use super::StaticPartitioning;
use crate::params::Parameters;
use crate::runner::{InstanceResult, InstanceSolver};

/// Splits an instance over disjoint node sets covering every node of the
/// model, then solves the parts with a [`StaticPartitioning`].
///
/// Running and sleeping VMs follow their host. Ready VMs are dealt to the
/// partitions in turn, by id. A constraint whose elements all lie in one
/// partition goes there unchanged; otherwise the splitter registered for
/// its kind divides it, and without one the instance is rejected.
///
/// # Example
///
/// ```
/// use std::collections::BTreeSet;
///
/// use vmplan_solver::FixedNodeSetsPartitioning;
/// use vmplan_test::instances::six_nodes;
///
/// let f = six_nodes();
/// let halves = vec![
///     f.nodes[..3].iter().copied().collect::<BTreeSet<_>>(),
///     f.nodes[3..].iter().copied().collect(),
/// ];
/// let parts = FixedNodeSetsPartitioning::new(halves).split(&f.instance).unwrap();
///
/// assert_eq!(parts.len(), 2);
/// assert_eq!(parts[0].model().mapping().nb_vms(), 6);
/// assert_eq!(parts[1].constraints().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct FixedNodeSetsPartitioning {
    sets: Vec<BTreeSet<Node>>,
    splitters: HashMap<&'static str, Arc<dyn ConstraintSplitter>>,
    engine: StaticPartitioning,
}

impl FixedNodeSetsPartitioning {
    pub fn new(sets: Vec<BTreeSet<Node>>) -> Self {
        Self {
            sets,
            splitters: default_splitters(),
            engine: StaticPartitioning::new(),
        }
    }

    /// Sets the worker pool solving the partitions.
    pub fn with_engine(mut self, engine: StaticPartitioning) -> Self {
        self.engine = engine;
        self
    }

    /// Registers the splitter of a constraint kind, returning the one it
    /// replaces.
    pub fn register_splitter(
        &mut self,
        kind: &'static str,
        splitter: Arc<dyn ConstraintSplitter>,
    ) -> Option<Arc<dyn ConstraintSplitter>> {
        self.splitters.insert(kind, splitter)
    }

    pub fn unregister_splitter(&mut self, kind: &str) -> Option<Arc<dyn ConstraintSplitter>> {
        self.splitters.remove(kind)
    }

    pub fn sets(&self) -> &[BTreeSet<Node>] {
        &self.sets
    }

    fn node_index(&self, instance: &Instance) -> Result<HashMap<Node, usize>> {
        let mapping = instance.model().mapping();
        if self.sets.is_empty() {
            return Err(SchedulerError::SplitRejected("no partition".into()));
        }
        let mut index = HashMap::new();
        for (i, set) in self.sets.iter().enumerate() {
            for &n in set {
                if !mapping.contains_node(n) {
                    return Err(SchedulerError::SplitRejected(format!("{} is not in the model", n)));
                }
                if index.insert(n, i).is_some() {
                    return Err(SchedulerError::SplitRejected(format!(
                        "{} belongs to several partitions",
                        n
                    )));
                }
            }
        }
        if let Some(n) = mapping.all_nodes().into_iter().find(|n| !index.contains_key(n)) {
            return Err(SchedulerError::SplitRejected(format!("{} belongs to no partition", n)));
        }
        Ok(index)
    }

    /// Splits an instance into one instance per node set.
    pub fn split(&self, instance: &Instance) -> Result<Vec<Instance>> {
        let model = instance.model();
        let mapping = model.mapping();
        let node_index = self.node_index(instance)?;
        let n = self.sets.len();

        let mut vm_index: HashMap<Vm, usize> = HashMap::new();
        let mut ready: Vec<Vec<Vm>> = vec![Vec::new(); n];
        let mut next = 0;
        for vm in mapping.all_vms() {
            let part = match mapping.vm_location(vm) {
                Some(host) => node_index[&host],
                None => {
                    let p = next % n;
                    next += 1;
                    ready[p].push(vm);
                    p
                }
            };
            vm_index.insert(vm, part);
        }

        let mut partitions: Vec<Instance> = self
            .sets
            .iter()
            .zip(&ready)
            .map(|(set, ready)| Instance::new(model.sub_model(set, ready), Vec::new(), instance.objective()))
            .collect();

        for cstr in instance.constraints() {
            let mut parts = BTreeSet::new();
            for e in cstr
                .involved_vms()
                .into_iter()
                .map(Element::from)
                .chain(cstr.involved_nodes().into_iter().map(Element::from))
            {
                let p = match e {
                    Element::Vm(v) => vm_index.get(&v),
                    Element::Node(n) => node_index.get(&n),
                };
                let p = p.ok_or_else(|| {
                    SchedulerError::SplitRejected(format!("{} of {} is not in the model", e, cstr.kind()))
                })?;
                parts.insert(*p);
            }
            match parts.len() {
                0 => partitions.iter_mut().for_each(|p| p.add_constraint(cstr.clone())),
                1 => {
                    if let Some(&p) = parts.first() {
                        partitions[p].add_constraint(cstr.clone());
                    }
                }
                spanned => {
                    let accepted = self.splitters.get(cstr.kind()).is_some_and(|s| {
                        s.split(cstr.as_ref(), instance, &mut partitions, &vm_index, &node_index)
                    });
                    if !accepted {
                        return Err(SchedulerError::SplitRejected(format!(
                            "{} spans {} partitions",
                            cstr.kind(),
                            spanned
                        )));
                    }
                    debug!(event = "constraint_split", kind = cstr.kind(), partitions = spanned);
                }
            }
        }
        info!(
            event = "split",
            partitions = n,
            nodes = mapping.nb_nodes(),
            vms = mapping.nb_vms(),
            constraints = instance.constraints().len(),
        );
        Ok(partitions)
    }
}

impl InstanceSolver for FixedNodeSetsPartitioning {
    fn solve(&self, params: &Parameters, instance: &Instance) -> Result<InstanceResult> {
        let start = Instant::now();
        let partitions = self.split(instance)?;
        self.engine
            .solve_partitions(params, instance, partitions, start.elapsed())
    }
}
