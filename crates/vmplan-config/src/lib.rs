//! Configuration system for vmplan.
//!
//! Load scheduler configuration from TOML or YAML files to control the
//! search limits, the action durations and the partitioning of large
//! instances without code changes.
//!
//! # Examples
//!
//! Load configuration from TOML string:
//!
//! ```
//! use vmplan_config::{SchedulerConfig, WorkerCount};
//! use std::time::Duration;
//!
//! let config = SchedulerConfig::from_toml_str(r#"
//!     random_seed = 7
//!
//!     [search]
//!     optimize = true
//!     time_limit_seconds = 30
//!
//!     [durations]
//!     migrate_vm = 5
//!
//!     [partitioning]
//!     size = 50
//!     workers = { count = 4 }
//! "#).unwrap();
//!
//! assert_eq!(config.time_limit(), Some(Duration::from_secs(30)));
//! assert_eq!(config.durations.migrate_vm, 5);
//! assert_eq!(config.durations.boot_vm, 1);
//! assert_eq!(config.partitioning.unwrap().workers, WorkerCount::Count(4));
//! ```
//!
//! Use default config when file is missing:
//!
//! ```
//! use vmplan_config::SchedulerConfig;
//!
//! let config = SchedulerConfig::load("scheduler.toml").unwrap_or_default();
//! assert!(!config.search.optimize);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vmplan_core::{ActionKind, SchedulerError};

/// Default latest possible end of a reconfiguration, in time units.
pub const DEFAULT_MAX_END: i64 = 3600;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<ConfigError> for SchedulerError {
    fn from(e: ConfigError) -> Self {
        SchedulerError::Config(e.to_string())
    }
}

/// Main scheduler configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SchedulerConfig {
    /// Seed of every random decision (placement, node shuffling).
    #[serde(default)]
    pub random_seed: Option<u64>,

    /// Search configuration.
    #[serde(default)]
    pub search: SearchConfig,

    /// Default durations of the actions.
    #[serde(default)]
    pub durations: DurationConfig,

    /// Static partitioning. `None` solves the instance as a whole.
    #[serde(default)]
    pub partitioning: Option<PartitioningConfig>,
}

impl SchedulerConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML or YAML file, depending on the
    /// extension. Anything but `.yaml`/`.yml` is read as TOML.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist or cannot be parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            _ => Self::from_toml_file(path),
        }
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the values serde cannot check.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search.max_end <= 0 {
            return Err(ConfigError::Invalid(format!(
                "max_end must be positive, got {}",
                self.search.max_end
            )));
        }
        if let Some(kind) = ActionKind::ALL
            .iter()
            .copied()
            .find(|k| self.durations.get(*k).is_some_and(|d| d < 0))
        {
            return Err(ConfigError::Invalid(format!(
                "negative default duration for '{}'",
                kind
            )));
        }
        if let Some(p) = &self.partitioning {
            if p.size == 0 {
                return Err(ConfigError::Invalid("partition size must be positive".into()));
            }
            if p.workers == WorkerCount::Count(0) {
                return Err(ConfigError::Invalid("worker count must be positive".into()));
            }
        }
        Ok(())
    }

    /// Sets the search time limit.
    pub fn with_time_limit_seconds(mut self, seconds: u64) -> Self {
        self.search.time_limit_seconds = Some(seconds);
        self
    }

    /// Sets the random seed.
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Enables or disables optimization.
    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.search.optimize = optimize;
        self
    }

    /// Enables or disables the repair mode.
    pub fn with_repair(mut self, repair: bool) -> Self {
        self.search.repair = repair;
        self
    }

    /// Sets the partitioning configuration.
    pub fn with_partitioning(mut self, partitioning: PartitioningConfig) -> Self {
        self.partitioning = Some(partitioning);
        self
    }

    /// Returns the search time limit, if configured.
    ///
    /// # Examples
    ///
    /// ```
    /// use vmplan_config::SchedulerConfig;
    /// use std::time::Duration;
    ///
    /// let config = SchedulerConfig::from_toml_str(r#"
    ///     [search]
    ///     time_limit_millis = 1500
    /// "#).unwrap();
    ///
    /// assert_eq!(config.time_limit(), Some(Duration::from_millis(1500)));
    /// ```
    pub fn time_limit(&self) -> Option<Duration> {
        self.search.time_limit()
    }
}

/// Search configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SearchConfig {
    /// Keep searching for better solutions after the first one.
    pub optimize: bool,

    /// Only VMs that are mis-placed or change state may be managed.
    pub repair: bool,

    /// Maximum seconds to spend solving.
    pub time_limit_seconds: Option<u64>,

    /// Maximum milliseconds to spend solving, added to the seconds.
    pub time_limit_millis: Option<u64>,

    /// Maximum number of backtracks.
    pub backtrack_limit: Option<u64>,

    /// Maximum number of search nodes.
    pub node_limit: Option<u64>,

    /// Latest possible end of the reconfiguration.
    pub max_end: i64,

    /// Restart the optimizing search from the root on a geometric
    /// backtrack schedule.
    pub restarts: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            optimize: false,
            repair: false,
            time_limit_seconds: None,
            time_limit_millis: None,
            backtrack_limit: None,
            node_limit: None,
            max_end: DEFAULT_MAX_END,
            restarts: true,
        }
    }
}

impl SearchConfig {
    /// Returns the time limit as a Duration, if any.
    pub fn time_limit(&self) -> Option<Duration> {
        let ms = self.time_limit_seconds.unwrap_or(0) * 1000 + self.time_limit_millis.unwrap_or(0);
        if ms > 0 {
            Some(Duration::from_millis(ms))
        } else {
            None
        }
    }
}

/// Default duration of every action kind.
///
/// These values are used when an element does not carry an attribute
/// overriding them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct DurationConfig {
    pub boot_node: i64,
    pub shutdown_node: i64,
    pub boot_vm: i64,
    pub shutdown_vm: i64,
    pub migrate_vm: i64,
    pub suspend_vm: i64,
    pub resume_vm: i64,
    pub forge_vm: i64,
}

impl Default for DurationConfig {
    fn default() -> Self {
        Self {
            boot_node: 1,
            shutdown_node: 1,
            boot_vm: 1,
            shutdown_vm: 1,
            migrate_vm: 1,
            suspend_vm: 1,
            resume_vm: 1,
            forge_vm: 1,
        }
    }
}

impl DurationConfig {
    /// Default duration of an action kind. Re-instantiations have no
    /// duration of their own: they are made of a forge, a boot and a
    /// shutdown.
    pub fn get(&self, kind: ActionKind) -> Option<i64> {
        match kind {
            ActionKind::BootNode => Some(self.boot_node),
            ActionKind::ShutdownNode => Some(self.shutdown_node),
            ActionKind::BootVm => Some(self.boot_vm),
            ActionKind::ShutdownVm => Some(self.shutdown_vm),
            ActionKind::MigrateVm => Some(self.migrate_vm),
            ActionKind::SuspendVm => Some(self.suspend_vm),
            ActionKind::ResumeVm => Some(self.resume_vm),
            ActionKind::ForgeVm => Some(self.forge_vm),
            ActionKind::ReinstantiateVm => None,
        }
    }
}

/// Number of threads solving partitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerCount {
    /// One worker per available core.
    #[default]
    Auto,

    /// Specific number of workers.
    Count(usize),
}

/// Static partitioning configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PartitioningConfig {
    /// Maximum number of nodes per partition.
    pub size: usize,

    /// Shuffle the nodes (with the random seed) before grouping them.
    #[serde(default)]
    pub random_pick_up: bool,

    /// Worker pool size.
    #[serde(default)]
    pub workers: WorkerCount,

    /// Maximum seconds to wait for all the partitions.
    #[serde(default)]
    pub split_timeout_seconds: Option<u64>,
}

impl PartitioningConfig {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            random_pick_up: false,
            workers: WorkerCount::Auto,
            split_timeout_seconds: None,
        }
    }

    pub fn with_workers(mut self, n: usize) -> Self {
        self.workers = WorkerCount::Count(n);
        self
    }

    pub fn with_random_pick_up(mut self, random: bool) -> Self {
        self.random_pick_up = random;
        self
    }

    pub fn split_timeout(&self) -> Option<Duration> {
        self.split_timeout_seconds.map(Duration::from_secs)
    }
}
