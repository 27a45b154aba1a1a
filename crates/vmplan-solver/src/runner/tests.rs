//! Tests for the instance solvers.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use vmplan_core::{
    Action, Ban, Instance, Objective, Operation, Ready, Running, SatConstraint, SchedulerError,
    VmState,
};
use vmplan_test::check::capacity_violations;
use vmplan_test::instances::{
    boot_on_offline_node, crowded_rack, overloaded_node, shutdown_single_vm, six_nodes,
};
use vmplan_test::Datacenter;

use super::*;

fn solve(params: &Parameters, instance: &Instance) -> InstanceResult {
    DefaultInstanceSolver::new().solve(params, instance).unwrap()
}

#[test]
fn test_shutdown_a_vm() {
    let f = shutdown_single_vm();
    let result = solve(&Parameters::default(), &f.instance);
    assert_eq!(result.status, SolveStatus::Solved);

    let plan = result.plan.unwrap();
    assert_eq!(plan.size(), 1);
    let a = plan.actions()[0];
    assert_eq!(
        a.op,
        Operation::ShutdownVm {
            vm: f.vms[0],
            node: f.nodes[0]
        }
    );
    assert_eq!((a.start, a.end), (0, 1));

    let after = plan.apply().unwrap();
    assert_eq!(after.mapping().vm_state(f.vms[0]), Some(VmState::Ready));
}

#[test]
fn test_relieve_an_overloaded_node() {
    let f = overloaded_node();
    let result = solve(&Parameters::default(), &f.instance);
    assert!(result.is_solved());

    let plan = result.plan.unwrap();
    assert_eq!(plan.size(), 1);
    match plan.actions()[0].op {
        Operation::MigrateVm { src, dst, .. } => {
            assert_eq!(src, f.nodes[0]);
            assert_eq!(dst, f.nodes[1]);
        }
        op => panic!("unexpected operation {}", op),
    }
    let after = plan.apply().unwrap();
    assert!(f.instance.unsatisfied(&after).next().is_none());
}

#[test]
fn test_boot_a_node_then_the_vm() {
    let f = boot_on_offline_node();
    let result = solve(&Parameters::default(), &f.instance);
    assert!(result.is_solved());

    let plan = result.plan.unwrap();
    assert_eq!(plan.size(), 2);
    let boot_node = plan.actions_of(f.nodes[0]).next().copied().unwrap();
    let boot_vm = plan.actions_of(f.vms[0]).next().copied().unwrap();
    assert_eq!(boot_node.op, Operation::BootNode { node: f.nodes[0] });
    assert_eq!(
        boot_vm.op,
        Operation::BootVm {
            vm: f.vms[0],
            node: f.nodes[0]
        }
    );
    assert!(boot_vm.start >= boot_node.end);
}

#[test]
fn test_same_seed_same_plan() {
    let f = six_nodes();
    let params = Parameters::default().with_random_seed(11);
    let first: Vec<Action> = solve(&params, &f.instance).plan.unwrap().actions().to_vec();
    let second: Vec<Action> = solve(&params, &f.instance).plan.unwrap().actions().to_vec();
    assert_eq!(first, second);
    assert!(!first.is_empty());
}

#[test]
fn test_infeasible_instance() {
    let mut dc = Datacenter::new().with_cpu(4, 1);
    let n = dc.online_node();
    let v = dc.running_vm(n);
    let cstrs: Vec<Arc<dyn SatConstraint>> = vec![Arc::new(Ban::new([v], [n]))];
    let instance = Instance::new(dc.build(), cstrs, Objective::MinMttr);

    let result = solve(&Parameters::default(), &instance);
    assert_eq!(result.status, SolveStatus::Infeasible);
    assert!(result.plan.is_none());
    assert!(!result.statistics.hit_timeout());
}

#[test]
fn test_conflicting_states() {
    let f = shutdown_single_vm();
    let mut instance = f.instance.clone();
    instance.add_constraint(Arc::new(Running::new([f.vms[0]])));
    instance.add_constraint(Arc::new(Ready::new([f.vms[0]])));

    let err = DefaultInstanceSolver::new()
        .solve(&Parameters::default(), &instance)
        .unwrap_err();
    assert!(matches!(err, SchedulerError::ModelInconsistency(_)));
}

#[test]
fn test_cancelled_search_times_out() {
    let f = overloaded_node();
    let flag = Arc::new(AtomicBool::new(true));
    let result = DefaultInstanceSolver::new()
        .with_cancel(flag)
        .solve(&Parameters::default(), &f.instance)
        .unwrap();
    assert_eq!(result.status, SolveStatus::TimedOut);
    assert!(result.statistics.hit_timeout());
    assert!(result.plan.is_none());
}

#[test]
fn test_repair_manages_mis_placed_vms_only() {
    let f = six_nodes();
    let params = Parameters::default().with_repair(true);
    let result = solve(&params, &f.instance);
    assert!(result.is_solved());

    let stats = result.statistics.solving();
    assert_eq!(stats.nb_managed_vms, 3);
    assert_eq!(stats.nb_nodes, 6);
    assert_eq!(stats.nb_vms, 12);

    let after = result.plan.unwrap().apply().unwrap();
    assert!(f.instance.unsatisfied(&after).next().is_none());
    assert!(after.mapping().is_offline(f.nodes[4]));
}

#[test]
fn test_optimized_statistics() {
    let f = overloaded_node();
    let params = Parameters::default()
        .with_optimize(true)
        .with_backtrack_limit(500);
    let result = solve(&params, &f.instance);
    assert!(result.is_solved());

    let stats = result.statistics.solving();
    let costs: Vec<i64> = stats.solutions.iter().filter_map(|s| s.objective).collect();
    assert!(!costs.is_empty());
    assert!(costs.windows(2).all(|w| w[1] < w[0]));
    assert!(result.statistics.to_string().contains("solution(s)"));
}

#[test]
fn test_bans_on_a_crowded_rack() {
    let f = crowded_rack(40, 10, 0);
    let params = Parameters::default().with_time_limit(Duration::from_secs(30));
    let result = solve(&params, &f.instance);
    assert_eq!(result.status, SolveStatus::Solved);
    assert!(!result.statistics.hit_timeout());

    let plan = result.plan.unwrap();
    for i in 0..10 {
        let moved = plan.actions_of(f.vms[3 * i]).any(|a| {
            matches!(a.op, Operation::MigrateVm { src, .. } if src == f.nodes[i])
        });
        assert!(moved, "{} stayed on {}", f.vms[3 * i], f.nodes[i]);
    }
    assert_eq!(capacity_violations(&plan), vec![]);
    let after = plan.apply().unwrap();
    assert!(f.instance.unsatisfied(&after).next().is_none());
}

#[test]
fn test_plans_never_overload_a_node() {
    let limits = Parameters::default().with_time_limit(Duration::from_secs(30));
    let runs = [
        (crowded_rack(12, 4, 1), limits.clone()),
        (crowded_rack(24, 6, 2), limits.clone()),
        (crowded_rack(36, 12, 3), limits.clone()),
        (
            crowded_rack(24, 8, 2),
            limits.clone().with_optimize(true).with_backtrack_limit(300),
        ),
        (crowded_rack(30, 10, 4), limits.with_repair(true)),
    ];
    for (f, params) in runs {
        let result = solve(&params, &f.instance);
        assert!(result.is_solved(), "{} nodes: {:?}", f.nodes.len(), result.status);

        let plan = result.plan.unwrap();
        assert_eq!(capacity_violations(&plan), vec![], "{} nodes:\n{}", f.nodes.len(), plan);
        let after = plan.apply().unwrap();
        assert!(f.instance.unsatisfied(&after).next().is_none());
    }
}
