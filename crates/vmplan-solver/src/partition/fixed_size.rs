//! Partitioning in groups of nodes of bounded size.

use std::collections::BTreeSet;
use std::time::Instant;

use rand::prelude::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use vmplan_config::PartitioningConfig;
use vmplan_core::{Instance, Model, Node, Result, SchedulerError};

use super::{FixedNodeSetsPartitioning, StaticPartitioning};
use crate::params::Parameters;
use crate::runner::{InstanceResult, InstanceSolver};

/// Groups the nodes by chunks of at most `size` nodes, in id order or
/// shuffled with the random seed of the parameters, then partitions over
/// those groups.
///
/// # Example
///
/// ```
/// use vmplan_core::Model;
/// use vmplan_solver::FixedSizePartitioning;
///
/// let mut mo = Model::new();
/// for _ in 0..13 {
///     let n = mo.new_node();
///     mo.mapping_mut().add_online_node(n);
/// }
/// let sets = FixedSizePartitioning::new(5).node_sets(&mo, 0).unwrap();
/// let sizes: Vec<usize> = sets.iter().map(|s| s.len()).collect();
/// assert_eq!(sizes, vec![5, 5, 3]);
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizePartitioning {
    size: usize,
    random_pick_up: bool,
    engine: StaticPartitioning,
}

impl FixedSizePartitioning {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            random_pick_up: false,
            engine: StaticPartitioning::new(),
        }
    }

    pub fn from_config(config: &PartitioningConfig) -> Self {
        Self {
            size: config.size,
            random_pick_up: config.random_pick_up,
            engine: StaticPartitioning::from_config(config),
        }
    }

    /// Shuffles the nodes before grouping them.
    pub fn with_random_pick_up(mut self, random: bool) -> Self {
        self.random_pick_up = random;
        self
    }

    pub fn with_engine(mut self, engine: StaticPartitioning) -> Self {
        self.engine = engine;
        self
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// The node groups of a model.
    pub fn node_sets(&self, model: &Model, seed: u64) -> Result<Vec<BTreeSet<Node>>> {
        if self.size == 0 {
            return Err(SchedulerError::Config("partition size must be positive".into()));
        }
        let mut nodes = model.mapping().all_nodes();
        if self.random_pick_up {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            nodes.shuffle(&mut rng);
        }
        Ok(nodes
            .chunks(self.size)
            .map(|c| c.iter().copied().collect())
            .collect())
    }
}

impl InstanceSolver for FixedSizePartitioning {
    fn solve(&self, params: &Parameters, instance: &Instance) -> Result<InstanceResult> {
        let start = Instant::now();
        let sets = self.node_sets(instance.model(), params.random_seed())?;
        let partitions = FixedNodeSetsPartitioning::new(sets).split(instance)?;
        self.engine
            .solve_partitions(params, instance, partitions, start.elapsed())
    }
}
