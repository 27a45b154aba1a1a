//! Tests for static partitioning.

use std::any::Any;
use std::collections::BTreeSet;
use std::sync::atomic::AtomicBool;
use std::thread;
use std::time::{Duration, Instant};

use vmplan_core::{
    ActionKind, Ban, Element, Model, Node, Objective, RunningCapacity, SatConstraint, Vm,
};
use vmplan_test::instances::{overloaded_node, six_nodes};
use vmplan_test::Datacenter;

use super::*;
use crate::duration::FnDuration;
use crate::runner::{SolutionStatistics, SolvingStatistics};

fn halves(nodes: &[Node]) -> Vec<BTreeSet<Node>> {
    let mid = nodes.len() / 2;
    vec![
        nodes[..mid].iter().copied().collect(),
        nodes[mid..].iter().copied().collect(),
    ]
}

#[derive(Debug)]
struct Exotic(Node);

impl SatConstraint for Exotic {
    fn kind(&self) -> &'static str {
        "exotic"
    }

    fn involved_vms(&self) -> Vec<Vm> {
        Vec::new()
    }

    fn involved_nodes(&self) -> Vec<Node> {
        vec![self.0]
    }

    fn is_satisfied(&self, _model: &Model) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[test]
fn test_six_nodes_in_two_partitions() {
    let f = six_nodes();
    let solver = FixedNodeSetsPartitioning::new(halves(&f.nodes))
        .with_engine(StaticPartitioning::new().with_workers(2));
    let result = solver.solve(&Parameters::default(), &f.instance).unwrap();
    assert_eq!(result.status, SolveStatus::Solved);

    let stats = result.statistics.as_partitioned().unwrap();
    assert_eq!(stats.nb_partitions, 2);
    assert_eq!(stats.nb_workers, 2);
    assert_eq!(stats.solved_partitions, 2);
    assert_eq!(stats.merged.nb_vms, 12);
    assert_eq!(stats.merged.nb_nodes, 6);
    let backtracks: u64 = stats.partitions.iter().map(|(_, s)| s.backtracks).sum();
    assert_eq!(stats.merged.backtracks, backtracks);
    assert!(result.statistics.to_string().contains("2/2 solved partition(s)"));

    let after = result.plan.unwrap().apply().unwrap();
    assert!(f.instance.unsatisfied(&after).next().is_none());
}

#[test]
fn test_partitions_are_disjoint() {
    let f = six_nodes();
    let parts = FixedNodeSetsPartitioning::new(halves(&f.nodes))
        .split(&f.instance)
        .unwrap();

    let mut nodes = BTreeSet::new();
    let mut vms = BTreeSet::new();
    for p in &parts {
        for n in p.model().mapping().all_nodes() {
            assert!(nodes.insert(n));
        }
        for v in p.model().mapping().all_vms() {
            assert!(vms.insert(v));
        }
    }
    assert_eq!(nodes.len(), 6);
    assert_eq!(vms.len(), 12);
    assert_eq!(parts[0].constraints().len(), 1);
    assert_eq!(parts[1].constraints().len(), 1);
    assert_eq!(parts[0].objective(), Objective::MinMttr);
}

#[test]
fn test_ready_vms_are_dealt_in_turn() {
    let mut dc = Datacenter::new().with_cpu(4, 1);
    let nodes = dc.online_nodes(2);
    let ready: Vec<Vm> = (0..3).map(|_| dc.ready_vm()).collect();
    let instance = vmplan_core::Instance::new(dc.build(), Vec::new(), Objective::MinMttr);

    let parts = FixedNodeSetsPartitioning::new(halves(&nodes))
        .split(&instance)
        .unwrap();
    let first: Vec<Vm> = parts[0].model().mapping().ready_vms().collect();
    let second: Vec<Vm> = parts[1].model().mapping().ready_vms().collect();
    assert_eq!(first, vec![ready[0], ready[2]]);
    assert_eq!(second, vec![ready[1]]);
}

#[test]
fn test_malformed_node_sets() {
    let f = six_nodes();
    let overlapping = vec![
        f.nodes[..4].iter().copied().collect(),
        f.nodes[3..].iter().copied().collect(),
    ];
    let err = FixedNodeSetsPartitioning::new(overlapping)
        .split(&f.instance)
        .unwrap_err();
    assert!(matches!(err, SchedulerError::SplitRejected(_)));

    let partial = vec![f.nodes[..5].iter().copied().collect::<BTreeSet<_>>()];
    let err = FixedNodeSetsPartitioning::new(partial)
        .split(&f.instance)
        .unwrap_err();
    assert!(err.to_string().contains("no partition"));

    assert!(FixedNodeSetsPartitioning::new(Vec::new()).split(&f.instance).is_err());
}

#[test]
fn test_spanning_capacity_is_rejected() {
    let f = overloaded_node();
    let mut instance = f.instance.clone();
    instance.add_constraint(Arc::new(RunningCapacity::new(f.nodes.iter().copied(), 1)));

    let err = FixedNodeSetsPartitioning::new(halves(&f.nodes))
        .split(&instance)
        .unwrap_err();
    assert!(matches!(err, SchedulerError::SplitRejected(_)));
    assert!(err.to_string().contains("runningCapacity"));
}

#[test]
fn test_spanning_ban_is_split() {
    let f = six_nodes();
    let mut instance = f.instance.clone();
    instance.add_constraint(Arc::new(Ban::new([f.vms[0]], [f.nodes[1], f.nodes[5]])));

    let parts = FixedNodeSetsPartitioning::new(halves(&f.nodes))
        .split(&instance)
        .unwrap();
    assert_eq!(parts[0].constraints().len(), 2);
    assert_eq!(parts[1].constraints().len(), 1);
    let piece = parts[0].constraints()[1].downcast_ref::<Ban>().unwrap();
    assert_eq!(piece.nodes(), &BTreeSet::from([f.nodes[1]]));

    let mut strict = FixedNodeSetsPartitioning::new(halves(&f.nodes));
    assert!(strict.unregister_splitter("ban").is_some());
    assert!(strict.split(&instance).is_err());
}

#[test]
fn test_failing_worker() {
    let f = six_nodes();
    let mut instance = f.instance.clone();
    instance.add_constraint(Arc::new(Exotic(f.nodes[5])));

    let err = FixedNodeSetsPartitioning::new(halves(&f.nodes))
        .solve(&Parameters::default(), &instance)
        .unwrap_err();
    match err {
        SchedulerError::WorkerFailure { partition, message } => {
            assert_eq!(partition, 1);
            assert!(message.contains("exotic"));
        }
        e => panic!("unexpected error {}", e),
    }
}

#[test]
fn test_fixed_size_groups() {
    let mut dc = Datacenter::new();
    let nodes = dc.online_nodes(13);
    let mo = dc.build();

    let sets = FixedSizePartitioning::new(5).node_sets(&mo, 0).unwrap();
    assert_eq!(sets[0], nodes[..5].iter().copied().collect::<BTreeSet<_>>());

    let shuffled = FixedSizePartitioning::new(5).with_random_pick_up(true);
    let a = shuffled.node_sets(&mo, 9).unwrap();
    let b = shuffled.node_sets(&mo, 9).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.iter().map(|s| s.len()).collect::<Vec<_>>(), vec![5, 5, 3]);
    let all: BTreeSet<Node> = a.into_iter().flatten().collect();
    assert_eq!(all.len(), 13);

    assert!(FixedSizePartitioning::new(0).node_sets(&mo, 0).is_err());
}

#[test]
fn test_fixed_size_solve() {
    let f = six_nodes();
    let solver = FixedSizePartitioning::new(3)
        .with_engine(StaticPartitioning::new().with_workers(1).with_split_timeout(Duration::from_secs(60)));
    let result = solver.solve(&Parameters::default(), &f.instance).unwrap();
    assert!(result.is_solved());
    assert_eq!(result.statistics.as_partitioned().unwrap().nb_partitions, 2);
}

#[test]
fn test_split_timeout_reports_the_solved_partitions() {
    let f = six_nodes();
    let slow: Element = f.vms[6].into();
    let slept = Arc::new(AtomicBool::new(false));
    let mut params = Parameters::default();
    params.durations_mut().register(
        ActionKind::MigrateVm,
        Arc::new(FnDuration(move |_: &Model, e: Element| {
            if e == slow && !slept.swap(true, Ordering::SeqCst) {
                thread::sleep(Duration::from_secs(3));
            }
            1
        })),
    );

    let solver = FixedNodeSetsPartitioning::new(halves(&f.nodes)).with_engine(
        StaticPartitioning::new()
            .with_workers(2)
            .with_split_timeout(Duration::from_millis(300)),
    );
    let started = Instant::now();
    let result = solver.solve(&params, &f.instance).unwrap();
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(result.status, SolveStatus::TimedOut);
    assert!(result.plan.is_none());
    assert!(result.statistics.hit_timeout());

    let stats = result.statistics.as_partitioned().unwrap();
    assert!(stats.merged.hit_timeout);
    assert_eq!(stats.nb_partitions, 2);
    assert_eq!(stats.solved_partitions, 1);
    assert_eq!(stats.partitions.len(), 1);
    let (index, first) = &stats.partitions[0];
    assert_eq!(*index, 0);
    assert_eq!(first.nb_vms, 6);
    assert_eq!(stats.merged.nb_vms, 6);
    assert!(result.statistics.to_string().contains("1/2 solved partition(s)"));
}

#[test]
fn test_merge() {
    let mut stats = PartitionedStatistics::new(2, 2, Duration::from_millis(3));
    let mut a = SolvingStatistics::new(3, 6, 1);
    a.backtracks = 4;
    a.nodes = 10;
    a.core_build_duration = Duration::from_millis(5);
    let mut b = SolvingStatistics::new(3, 6, 1);
    b.backtracks = 1;
    b.nodes = 7;
    b.core_build_duration = Duration::from_millis(2);
    b.hit_timeout = true;

    stats.merge(1, b, false);
    stats.merge(0, a, true);
    assert_eq!(stats.merged.backtracks, 5);
    assert_eq!(stats.merged.nodes, 17);
    assert_eq!(stats.merged.nb_vms, 12);
    assert_eq!(stats.merged.core_build_duration, Duration::from_millis(5));
    assert!(stats.merged.hit_timeout);
    assert_eq!(stats.solved_partitions, 1);
    assert!(!stats.is_solved());
}

fn solution(ms: u64, backtracks: u64, cost: i64) -> SolutionStatistics {
    SolutionStatistics {
        time: Duration::from_millis(ms),
        nodes: backtracks * 2,
        backtracks,
        objective: Some(cost),
    }
}

#[test]
fn test_merge_solutions() {
    let mut stats = PartitionedStatistics::new(2, 2, Duration::ZERO);
    let mut a = SolvingStatistics::new(3, 6, 0);
    a.solutions = vec![solution(1, 0, 20), solution(5, 3, 12)];
    a.restarts = 2;
    let mut b = SolvingStatistics::new(3, 6, 0);
    b.solutions = vec![solution(2, 1, 9), solution(3, 4, 7)];
    b.restarts = 1;

    stats.merge(0, a, true);
    assert_eq!(stats.merged.solutions.len(), 2);
    stats.merge(1, b, true);

    // no merged solution before both partitions have one
    let merged = &stats.merged.solutions;
    let costs: Vec<_> = merged.iter().map(|s| s.objective).collect();
    assert_eq!(costs, vec![Some(29), Some(27), Some(19)]);
    assert_eq!(merged[0].time, Duration::from_millis(2));
    assert_eq!(merged[2].backtracks, 7);
    assert_eq!(stats.merged.best().and_then(|s| s.objective), Some(19));
    assert_eq!(stats.merged.restarts, 3);
}
