//! Tests for reconfiguration plans.

use super::*;
use crate::model::{Node, Vm, VmState};

fn origin() -> (Model, Node, Node, Vm, Vm) {
    let mut mo = Model::new();
    let (n1, n2) = (mo.new_node(), mo.new_node());
    let (v1, v2) = (mo.new_vm(), mo.new_vm());
    mo.mapping_mut().add_online_node(n1);
    mo.mapping_mut().add_offline_node(n2);
    mo.mapping_mut().add_running_vm(v1, n1);
    mo.mapping_mut().add_ready_vm(v2);
    (mo, n1, n2, v1, v2)
}

#[test]
fn test_apply_follows_schedule_order() {
    let (mo, n1, n2, v1, v2) = origin();
    let mut plan = ReconfigurationPlan::new(mo);
    // inserted out of order on purpose
    plan.add(Action::new(Operation::ShutdownNode { node: n1 }, 3, 4));
    plan.add(Action::new(Operation::BootVm { vm: v2, node: n2 }, 2, 3));
    plan.add(Action::new(Operation::MigrateVm { vm: v1, src: n1, dst: n2 }, 2, 3));
    plan.add(Action::new(Operation::BootNode { node: n2 }, 0, 2));

    assert_eq!(plan.size(), 4);
    assert_eq!(plan.duration(), 4);
    assert_eq!(plan.actions()[0].kind(), ActionKind::ShutdownNode);

    let result = plan.apply().unwrap();
    let map = result.mapping();
    assert!(map.is_offline(n1));
    assert_eq!(map.vm_location(v1), Some(n2));
    assert_eq!(map.vm_state(v2), Some(VmState::Running));
}

#[test]
fn test_illegal_action_is_reported() {
    let (mo, n1, n2, v1, _) = origin();
    let mut plan = ReconfigurationPlan::new(mo);
    // n2 is offline
    plan.add(Action::new(Operation::MigrateVm { vm: v1, src: n1, dst: n2 }, 0, 1));
    assert!(!plan.is_applyable());
    let err = plan.apply().unwrap_err();
    assert!(err.to_string().contains("migrateVM"));
}

#[test]
fn test_shutdown_of_busy_node_is_illegal() {
    let (mo, n1, _, _, _) = origin();
    let mut plan = ReconfigurationPlan::new(mo);
    plan.add(Action::new(Operation::ShutdownNode { node: n1 }, 0, 1));
    assert!(plan.apply().is_err());
}

#[test]
fn test_tie_break_by_kind_then_subject() {
    let (mo, n1, _, v1, _) = origin();
    let mut plan = ReconfigurationPlan::new(mo);
    plan.add(Action::new(Operation::SuspendVm { vm: v1, src: n1, dst: n1 }, 0, 1));
    plan.add(Action::new(Operation::BootNode { node: Node(7) }, 0, 1));
    plan.add(Action::new(Operation::BootNode { node: Node(5) }, 0, 1));

    let kinds: Vec<_> = plan.scheduled().iter().map(|a| a.op.subject()).collect();
    assert_eq!(
        kinds,
        vec![Node(5).into(), Node(7).into(), Element::Vm(v1)]
    );
}

#[test]
fn test_empty_plan() {
    let (mo, ..) = origin();
    let plan = ReconfigurationPlan::new(mo.clone());
    assert!(plan.is_empty());
    assert_eq!(plan.duration(), 0);
    assert_eq!(plan.apply().unwrap(), mo);
}

#[test]
fn test_display() {
    let (mo, n1, n2, v1, _) = origin();
    let mut plan = ReconfigurationPlan::new(mo);
    plan.add(Action::new(Operation::ReinstantiateVm { vm: v1, src: n1, dst: n2 }, 1, 5));
    assert_eq!(
        plan.to_string(),
        "1:5 reinstantiateVM(vm#0, from=node#0, to=node#1)\n"
    );
    assert_eq!(plan.actions_of(v1).count(), 1);
}
