//! Parameters of a solve.

use std::time::Duration;

use vmplan_config::{SchedulerConfig, DEFAULT_MAX_END};
use vmplan_core::Node;

use crate::constraint::ConstraintMapper;
use crate::duration::DurationEvaluators;
use crate::transition::TransitionFactory;

/// Everything tuning how an instance is solved.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use vmplan_config::SchedulerConfig;
/// use vmplan_solver::Parameters;
///
/// let config = SchedulerConfig::new()
///     .with_time_limit_seconds(5)
///     .with_random_seed(3)
///     .with_optimize(true);
/// let params = Parameters::from_config(&config);
///
/// assert_eq!(params.time_limit(), Some(Duration::from_secs(5)));
/// assert_eq!(params.random_seed(), 3);
/// assert!(params.optimize());
/// assert!(!params.repair());
/// ```
#[derive(Debug, Clone)]
pub struct Parameters {
    optimize: bool,
    repair: bool,
    time_limit: Option<Duration>,
    backtrack_limit: Option<u64>,
    node_limit: Option<u64>,
    max_end: i64,
    restarts: bool,
    random_seed: u64,
    durations: DurationEvaluators,
    mapper: ConstraintMapper,
    transitions: TransitionFactory,
    host_buckets: Option<Vec<Vec<Node>>>,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            optimize: false,
            repair: false,
            time_limit: None,
            backtrack_limit: None,
            node_limit: None,
            max_end: DEFAULT_MAX_END,
            restarts: true,
            random_seed: 0,
            durations: DurationEvaluators::new_bundle(),
            mapper: ConstraintMapper::new_bundle(),
            transitions: TransitionFactory::new(),
            host_buckets: None,
        }
    }
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Solver parameters described by a configuration. A missing seed
    /// means seed 0.
    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self {
            optimize: config.search.optimize,
            repair: config.search.repair,
            time_limit: config.time_limit(),
            backtrack_limit: config.search.backtrack_limit,
            node_limit: config.search.node_limit,
            max_end: config.search.max_end,
            restarts: config.search.restarts,
            random_seed: config.random_seed.unwrap_or(0),
            durations: DurationEvaluators::from_config(&config.durations),
            ..Self::default()
        }
    }

    /// Keep searching for better solutions until the search space is
    /// exhausted or a limit is reached.
    pub fn optimize(&self) -> bool {
        self.optimize
    }

    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }

    /// Only manage the VMs that are mis-placed or change state.
    pub fn repair(&self) -> bool {
        self.repair
    }

    pub fn with_repair(mut self, repair: bool) -> Self {
        self.repair = repair;
        self
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn backtrack_limit(&self) -> Option<u64> {
        self.backtrack_limit
    }

    pub fn with_backtrack_limit(mut self, limit: u64) -> Self {
        self.backtrack_limit = Some(limit);
        self
    }

    pub fn node_limit(&self) -> Option<u64> {
        self.node_limit
    }

    pub fn with_node_limit(mut self, limit: u64) -> Self {
        self.node_limit = Some(limit);
        self
    }

    /// Latest possible end of the reconfiguration.
    pub fn max_end(&self) -> i64 {
        self.max_end
    }

    pub fn with_max_end(mut self, max_end: i64) -> Self {
        self.max_end = max_end;
        self
    }

    /// Geometric restarts while optimizing: the first after twice as many
    /// backtracks as there are VMs, each next one 1.5 times later.
    pub fn restarts(&self) -> bool {
        self.restarts
    }

    pub fn with_restarts(mut self, restarts: bool) -> Self {
        self.restarts = restarts;
        self
    }

    pub fn random_seed(&self) -> u64 {
        self.random_seed
    }

    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    pub fn durations(&self) -> &DurationEvaluators {
        &self.durations
    }

    pub fn durations_mut(&mut self) -> &mut DurationEvaluators {
        &mut self.durations
    }

    pub fn mapper(&self) -> &ConstraintMapper {
        &self.mapper
    }

    pub fn mapper_mut(&mut self) -> &mut ConstraintMapper {
        &mut self.mapper
    }

    pub fn transitions(&self) -> &TransitionFactory {
        &self.transitions
    }

    pub fn transitions_mut(&mut self) -> &mut TransitionFactory {
        &mut self.transitions
    }

    /// Preferred hosts, by decreasing preference, for the VMs that cannot
    /// stay where they are.
    pub fn host_buckets(&self) -> Option<&[Vec<Node>]> {
        self.host_buckets.as_deref()
    }

    pub fn with_host_buckets(mut self, buckets: Vec<Vec<Node>>) -> Self {
        self.host_buckets = Some(buckets);
        self
    }
}
