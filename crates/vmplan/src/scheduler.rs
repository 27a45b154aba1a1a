//! Scheduler entry point.

use std::path::Path;

use tracing::debug;
use vmplan_config::SchedulerConfig;
use vmplan_core::{Instance, Result};
use vmplan_solver::{
    DefaultInstanceSolver, FixedSizePartitioning, InstanceResult, InstanceSolver, Parameters,
};

/// Computes reconfiguration plans.
///
/// Holds the configuration and the solver parameters derived from it.
/// When partitioning is configured, instances are split in groups of
/// nodes solved in parallel; otherwise they are solved as a whole.
#[derive(Debug, Clone)]
pub struct Scheduler {
    config: SchedulerConfig,
    params: Parameters,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// A scheduler with the default configuration.
    pub fn new() -> Self {
        let config = SchedulerConfig::default();
        let params = Parameters::from_config(&config);
        Self { config, params }
    }

    /// # Errors
    ///
    /// Returns [`SchedulerError::Config`](vmplan_core::SchedulerError::Config)
    /// when the configuration is invalid.
    pub fn from_config(config: SchedulerConfig) -> Result<Self> {
        config.validate()?;
        let params = Parameters::from_config(&config);
        Ok(Self { config, params })
    }

    /// Reads the configuration from a TOML or YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_config(SchedulerConfig::load(path)?)
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    /// Parameters not covered by the configuration: custom durations,
    /// constraints, host buckets.
    pub fn params_mut(&mut self) -> &mut Parameters {
        &mut self.params
    }

    fn solver(&self) -> Box<dyn InstanceSolver> {
        match &self.config.partitioning {
            Some(p) => Box::new(FixedSizePartitioning::from_config(p)),
            None => Box::new(DefaultInstanceSolver::new()),
        }
    }

    /// Computes a plan satisfying the constraints of an instance.
    pub fn solve(&self, instance: &Instance) -> Result<InstanceResult> {
        let solver = self.solver();
        debug!(event = "scheduler", solver = ?solver);
        solver.solve(&self.params, instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vmplan_config::PartitioningConfig;
    use vmplan_core::{Operation, SchedulerError};
    use vmplan_solver::SolveStatus;
    use vmplan_test::instances::{overloaded_node, six_nodes};

    #[test]
    fn test_solve_as_a_whole() {
        let f = overloaded_node();
        let result = Scheduler::new().solve(&f.instance).unwrap();
        assert_eq!(result.status, SolveStatus::Solved);
        assert!(result.statistics.as_partitioned().is_none());
        let plan = result.plan.unwrap();
        assert!(matches!(plan.actions()[0].op, Operation::MigrateVm { .. }));
    }

    #[test]
    fn test_solve_by_partitions() {
        let f = six_nodes();
        let config = SchedulerConfig::new()
            .with_random_seed(3)
            .with_partitioning(PartitioningConfig::new(3).with_workers(2));
        let scheduler = Scheduler::from_config(config).unwrap();
        let result = scheduler.solve(&f.instance).unwrap();
        assert!(result.is_solved());

        let stats = result.statistics.as_partitioned().unwrap();
        assert_eq!(stats.nb_partitions, 2);
        assert_eq!(stats.nb_workers, 2);
        assert_eq!(scheduler.params().random_seed(), 3);
    }

    #[test]
    fn test_invalid_configuration() {
        let config = SchedulerConfig::new().with_partitioning(PartitioningConfig::new(0));
        let err = Scheduler::from_config(config).unwrap_err();
        assert!(matches!(err, SchedulerError::Config(_)));
    }

    #[test]
    fn test_configuration_from_toml() {
        let config = SchedulerConfig::from_toml_str(
            r#"
            random_seed = 5

            [search]
            optimize = true
            backtrack_limit = 200
            "#,
        )
        .unwrap();
        let scheduler = Scheduler::from_config(config).unwrap();
        assert!(scheduler.params().optimize());
        assert_eq!(scheduler.params().backtrack_limit(), Some(200));

        let f = overloaded_node();
        assert!(scheduler.solve(&f.instance).unwrap().is_solved());
    }
}
