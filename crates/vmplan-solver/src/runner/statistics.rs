//! Solving statistics.

use std::fmt;
use std::time::Duration;

/// Measures taken when a solution was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolutionStatistics {
    /// Time since the search started.
    pub time: Duration,
    pub nodes: u64,
    pub backtracks: u64,
    /// Cost of the solution, when optimizing.
    pub objective: Option<i64>,
}

/// Statistics of a solved instance.
///
/// # Example
///
/// ```
/// use vmplan_solver::SolvingStatistics;
///
/// let mut stats = SolvingStatistics::new(4, 10, 2);
/// stats.nb_managed_vms = 3;
/// stats.nodes = 12;
///
/// assert_eq!(stats.nb_nodes, 4);
/// assert!(stats.to_string().contains("3 managed VM(s)"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolvingStatistics {
    pub nb_nodes: usize,
    pub nb_vms: usize,
    pub nb_constraints: usize,
    pub nb_managed_vms: usize,
    /// Time spent building the core problem.
    pub core_build_duration: Duration,
    /// Time spent injecting the constraints and the objective.
    pub spe_build_duration: Duration,
    /// Search nodes explored.
    pub nodes: u64,
    pub backtracks: u64,
    /// Restarts of the optimizing search.
    pub restarts: u64,
    /// `true` when a limit stopped the search.
    pub hit_timeout: bool,
    /// Solutions by order of discovery.
    pub solutions: Vec<SolutionStatistics>,
}

impl SolvingStatistics {
    pub fn new(nb_nodes: usize, nb_vms: usize, nb_constraints: usize) -> Self {
        Self {
            nb_nodes,
            nb_vms,
            nb_constraints,
            ..Self::default()
        }
    }

    /// The last, and best, solution.
    pub fn best(&self) -> Option<&SolutionStatistics> {
        self.solutions.last()
    }

    pub fn build_duration(&self) -> Duration {
        self.core_build_duration + self.spe_build_duration
    }
}

impl fmt::Display for SolvingStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} node(s), {} VM(s), {} managed VM(s), {} constraint(s); build: {}ms + {}ms; search: {} node(s), {} backtrack(s), {} restart(s), {} solution(s)",
            self.nb_nodes,
            self.nb_vms,
            self.nb_managed_vms,
            self.nb_constraints,
            self.core_build_duration.as_millis(),
            self.spe_build_duration.as_millis(),
            self.nodes,
            self.backtracks,
            self.restarts,
            self.solutions.len(),
        )?;
        if let Some(best) = self.best() {
            write!(f, "; last at {}ms", best.time.as_millis())?;
            if let Some(cost) = best.objective {
                write!(f, " (cost {})", cost)?;
            }
        }
        if self.hit_timeout {
            write!(f, "; timeout")?;
        }
        Ok(())
    }
}

/// Statistics of an instance solved partition by partition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionedStatistics {
    /// Merged counters of the partitions.
    pub merged: SolvingStatistics,
    pub nb_partitions: usize,
    pub nb_workers: usize,
    /// Time spent splitting the instance.
    pub split_duration: Duration,
    /// Partitions that produced a plan.
    pub solved_partitions: usize,
    /// Statistics of each partition that reported, by partition index.
    pub partitions: Vec<(usize, SolvingStatistics)>,
}

impl PartitionedStatistics {
    pub fn new(nb_partitions: usize, nb_workers: usize, split_duration: Duration) -> Self {
        Self {
            nb_partitions,
            nb_workers,
            split_duration,
            ..Self::default()
        }
    }

    /// Accounts for a partition: the build durations are the slowest ones,
    /// the counters are summed and any timeout marks the whole instance.
    ///
    /// The merged solutions are the moments where every partition reported
    /// so far had a solution: their counters and costs are the sums of the
    /// latest solution of each partition. Times are those of the partition
    /// searches, which all start together.
    pub fn merge(&mut self, partition: usize, stats: SolvingStatistics, solved: bool) {
        let m = &mut self.merged;
        m.core_build_duration = m.core_build_duration.max(stats.core_build_duration);
        m.spe_build_duration = m.spe_build_duration.max(stats.spe_build_duration);
        m.nb_nodes += stats.nb_nodes;
        m.nb_vms += stats.nb_vms;
        m.nb_constraints += stats.nb_constraints;
        m.nb_managed_vms += stats.nb_managed_vms;
        m.nodes += stats.nodes;
        m.backtracks += stats.backtracks;
        m.restarts += stats.restarts;
        m.hit_timeout |= stats.hit_timeout;
        if solved {
            self.solved_partitions += 1;
        }
        self.partitions.push((partition, stats));
        self.merge_solutions();
    }

    fn merge_solutions(&mut self) {
        let mut events: Vec<(Duration, usize, SolutionStatistics)> = Vec::new();
        for (k, (_, stats)) in self.partitions.iter().enumerate() {
            events.extend(stats.solutions.iter().map(|s| (s.time, k, *s)));
        }
        events.sort_by_key(|(time, k, _)| (*time, *k));

        let mut latest: Vec<Option<SolutionStatistics>> = vec![None; self.partitions.len()];
        let mut merged = Vec::new();
        for (time, k, sol) in events {
            latest[k] = Some(sol);
            let Some(all) = latest.iter().copied().collect::<Option<Vec<_>>>() else {
                continue;
            };
            merged.push(SolutionStatistics {
                time,
                nodes: all.iter().map(|s| s.nodes).sum(),
                backtracks: all.iter().map(|s| s.backtracks).sum(),
                objective: all.iter().map(|s| s.objective).sum(),
            });
        }
        self.merged.solutions = merged;
    }

    pub fn is_solved(&self) -> bool {
        self.solved_partitions == self.nb_partitions
    }
}

impl fmt::Display for PartitionedStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} solved partition(s) on {} worker(s), split: {}ms; {}",
            self.solved_partitions,
            self.nb_partitions,
            self.nb_workers,
            self.split_duration.as_millis(),
            self.merged,
        )
    }
}

/// Statistics of a solve, single or partitioned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statistics {
    Single(SolvingStatistics),
    Partitioned(PartitionedStatistics),
}

impl Statistics {
    /// The counters of the whole instance.
    pub fn solving(&self) -> &SolvingStatistics {
        match self {
            Statistics::Single(s) => s,
            Statistics::Partitioned(p) => &p.merged,
        }
    }

    pub fn hit_timeout(&self) -> bool {
        self.solving().hit_timeout
    }

    pub fn as_partitioned(&self) -> Option<&PartitionedStatistics> {
        match self {
            Statistics::Partitioned(p) => Some(p),
            Statistics::Single(_) => None,
        }
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statistics::Single(s) => s.fmt(f),
            Statistics::Partitioned(p) => p.fmt(f),
        }
    }
}
