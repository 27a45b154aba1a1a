//! Static partitioning.
//!
//! Large instances are split into independent sub-instances over disjoint
//! node sets. Each part is solved by its own single-threaded search on a
//! fixed-size worker pool and the plans are concatenated.
//!
//! - [`FixedNodeSetsPartitioning`]: node sets given by the caller
//! - [`FixedSizePartitioning`]: node sets of bounded size
//! - [`StaticPartitioning`]: the worker pool both delegate to

mod fixed_sets;
mod fixed_size;
mod splitter;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, RecvTimeoutError};
use tracing::{debug, info, warn};
use vmplan_config::{PartitioningConfig, WorkerCount};
use vmplan_core::{Instance, ReconfigurationPlan, Result, SchedulerError};

use crate::params::Parameters;
use crate::runner::{
    DefaultInstanceSolver, InstanceResult, InstanceSolver, PartitionedStatistics, SolveStatus,
    Statistics,
};

pub use fixed_sets::FixedNodeSetsPartitioning;
pub use fixed_size::FixedSizePartitioning;
pub use splitter::{
    default_splitters, BanSplitter, ConstraintSplitter, FenceSplitter, NodeStateSplitter,
    VmStateSplitter,
};

type WorkerReport = (usize, std::thread::Result<Result<InstanceResult>>);

/// Solves partitions in parallel.
///
/// Every partition is solved by a [`DefaultInstanceSolver`] on a pool of
/// `workers` threads. Results come back over a channel; the first worker
/// error or panic aborts the whole solve. With a split timeout, the
/// partitions still running when it elapses are cancelled and the
/// instance is reported unsolved.
#[derive(Debug, Clone, Default)]
pub struct StaticPartitioning {
    workers: WorkerCount,
    split_timeout: Option<Duration>,
}

impl StaticPartitioning {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &PartitioningConfig) -> Self {
        Self {
            workers: config.workers,
            split_timeout: config.split_timeout(),
        }
    }

    pub fn with_workers(mut self, n: usize) -> Self {
        self.workers = WorkerCount::Count(n);
        self
    }

    pub fn with_split_timeout(mut self, timeout: Duration) -> Self {
        self.split_timeout = Some(timeout);
        self
    }

    /// Size of the pool; one worker per core by default.
    pub fn nb_workers(&self) -> usize {
        match self.workers {
            WorkerCount::Auto => std::thread::available_parallelism().map_or(1, |n| n.get()),
            WorkerCount::Count(n) => n.max(1),
        }
    }

    /// Solves the partitions of `origin` and merges the results.
    ///
    /// The plan holds the actions of every partition, partition after
    /// partition, and only exists when every partition was solved.
    pub fn solve_partitions(
        &self,
        params: &Parameters,
        origin: &Instance,
        partitions: Vec<Instance>,
        split_duration: Duration,
    ) -> Result<InstanceResult> {
        let n = partitions.len();
        let workers = self.nb_workers().min(n.max(1));
        info!(
            event = "partitions_start",
            partitions = n,
            workers = workers,
            split_ms = split_duration.as_millis() as u64,
        );
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("vmplan-partition-{}", i))
            .build()
            .map_err(|e| SchedulerError::Internal(format!("worker pool: {}", e)))?;

        let cancel = Arc::new(AtomicBool::new(false));
        let (tx, rx) = channel::unbounded::<WorkerReport>();
        for (i, part) in partitions.into_iter().enumerate() {
            let tx = tx.clone();
            let params = params.clone();
            let solver = DefaultInstanceSolver::new().with_cancel(cancel.clone());
            pool.spawn(move || {
                let report = panic::catch_unwind(AssertUnwindSafe(|| solver.solve(&params, &part)));
                // the supervisor may have given up already
                let _ = tx.send((i, report));
            });
        }
        drop(tx);

        let deadline = self.split_timeout.map(|d| Instant::now() + d);
        let mut stats = PartitionedStatistics::new(n, workers, split_duration);
        let mut results: Vec<Option<InstanceResult>> = vec![None; n];
        let mut received = 0;
        while received < n {
            let next = match deadline {
                Some(d) => rx.recv_deadline(d),
                None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };
            let (i, report) = match next {
                Ok(r) => r,
                Err(RecvTimeoutError::Timeout) => {
                    cancel.store(true, Ordering::SeqCst);
                    stats.merged.hit_timeout = true;
                    warn!(event = "split_timeout", reported = received, partitions = n);
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(SchedulerError::Internal(format!(
                        "{} partition(s) never reported",
                        n - received
                    )));
                }
            };
            received += 1;
            let result = match report {
                Ok(Ok(r)) => r,
                Ok(Err(e)) => {
                    cancel.store(true, Ordering::SeqCst);
                    return Err(SchedulerError::WorkerFailure {
                        partition: i,
                        message: e.to_string(),
                    });
                }
                Err(payload) => {
                    cancel.store(true, Ordering::SeqCst);
                    return Err(SchedulerError::WorkerFailure {
                        partition: i,
                        message: panic_message(payload),
                    });
                }
            };
            debug!(event = "partition_end", partition = i, status = ?result.status);
            stats.merge(i, result.statistics.solving().clone(), result.plan.is_some());
            results[i] = Some(result);
        }
        stats.partitions.sort_by_key(|(i, _)| *i);

        let status = if stats.is_solved() {
            SolveStatus::Solved
        } else if results
            .iter()
            .flatten()
            .any(|r| r.status == SolveStatus::Infeasible)
        {
            SolveStatus::Infeasible
        } else {
            SolveStatus::TimedOut
        };
        let plan = (status == SolveStatus::Solved).then(|| {
            let mut plan = ReconfigurationPlan::new(origin.model().clone());
            for p in results.iter().flatten().filter_map(|r| r.plan.as_ref()) {
                plan.extend(p.actions().iter().copied());
            }
            plan
        });
        info!(
            event = "partitions_end",
            solved = stats.solved_partitions,
            partitions = n,
            actions = plan.as_ref().map_or(0, |p| p.size()),
            nodes = stats.merged.nodes,
            backtracks = stats.merged.backtracks,
        );
        Ok(InstanceResult {
            plan,
            status,
            statistics: Statistics::Partitioned(stats),
        })
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "worker panicked".to_string()
    }
}

#[cfg(test)]
mod tests;
