//! Tests for the reconfiguration problem and its builder.

use std::collections::BTreeSet;

use vmplan_core::{ActionKind, Model, Operation, SchedulerError, VmState};
use vmplan_test::instances::{overloaded_node, shutdown_single_vm};
use vmplan_test::Datacenter;

use super::*;
use crate::cp::DomainView;
use crate::termination::NoTermination;
use crate::transition::VmTransitionKind;

#[test]
fn test_indexes_follow_ids() {
    let f = overloaded_node();
    let rp = ReconfigurationProblemBuilder::new(f.instance.model())
        .build()
        .unwrap();

    assert_eq!(rp.nodes(), f.nodes.as_slice());
    assert_eq!(rp.vms(), f.vms.as_slice());
    assert_eq!(rp.node_index(f.nodes[1]), Some(1));
    assert_eq!(rp.vm_index(f.vms[0]), Some(0));
    assert_eq!(rp.node_transitions().len(), 2);
    for t in rp.vm_transitions() {
        assert_eq!(t.kind(), VmTransitionKind::Relocate);
    }
    assert_eq!(rp.c_slices().count(), 2);
    assert_eq!(rp.d_slices().count(), 2);
    assert_eq!(rp.future_running_vms().len(), 2);
}

#[test]
fn test_unmanaged_vm_stays() {
    let f = overloaded_node();
    let rp = ReconfigurationProblemBuilder::new(f.instance.model())
        .with_manageable_vms(BTreeSet::from([f.vms[1]]))
        .build()
        .unwrap();

    let stay = rp.vm_transition(f.vms[0]).unwrap();
    assert_eq!(stay.kind(), VmTransitionKind::Stay);
    assert!(!rp.manageable_vms().contains(&f.vms[0]));
    assert!(rp.manageable_vms().contains(&f.vms[1]));
    // the staying VM is pinned on its node
    let hoster = stay.d_slice().unwrap().hoster();
    assert_eq!(rp.csp().store().value(hoster), Some(f.nodes[0].id() as i64));
}

#[test]
fn test_state_change_is_managed_anyway() {
    let f = shutdown_single_vm();
    let v = f.vms[0];
    let rp = ReconfigurationProblemBuilder::new(f.instance.model())
        .with_manageable_vms(BTreeSet::new())
        .with_next_state(v, VmState::Ready)
        .build()
        .unwrap();
    assert_eq!(rp.vm_transition(v).unwrap().kind(), VmTransitionKind::Shutdown);
    assert!(rp.manageable_vms().contains(&v));
}

#[test]
fn test_unknown_vm_is_rejected() {
    let f = shutdown_single_vm();
    let err = ReconfigurationProblemBuilder::new(f.instance.model())
        .with_next_state(vmplan_core::Vm(42), VmState::Running)
        .build()
        .unwrap_err();
    assert!(matches!(err, SchedulerError::ModelInconsistency(_)));
}

#[test]
fn test_missing_transition_is_rejected() {
    let mut dc = Datacenter::new();
    let n = dc.online_node();
    let v = dc.sleeping_vm(n);
    let mo = dc.build();
    let err = ReconfigurationProblemBuilder::new(&mo)
        .with_next_state(v, VmState::Ready)
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("no transition to go from sleeping to ready"));
}

#[test]
fn test_make_duration() {
    let mut dc = Datacenter::new();
    let n = dc.online_node();
    let v = dc.running_vm(n);
    dc.set_attribute(v, "migrate", 7);
    let mo = dc.build();
    let mut rp = ReconfigurationProblemBuilder::new(&mo).build().unwrap();

    assert_eq!(rp.make_duration(ActionKind::MigrateVm, v).unwrap(), 7);
    assert_eq!(rp.make_duration(ActionKind::BootNode, n).unwrap(), 1);
    let h = rp.make_host_var("extra.hoster");
    assert_eq!(rp.csp().store().values(h), vec![n.id() as i64]);
    let t = rp.make_time_var("extra.time");
    assert_eq!(rp.csp().store().ub(t), rp.max_end());
}

#[test]
fn test_shutdown_plan() {
    let f = shutdown_single_vm();
    let v = f.vms[0];
    let mut rp = ReconfigurationProblemBuilder::new(f.instance.model())
        .with_next_state(v, VmState::Ready)
        .build()
        .unwrap();

    let outcome = rp.solve(&NoTermination, false);
    let plan = rp.build_plan(outcome.best().unwrap());
    let actions: Vec<_> = plan.actions_of(v).collect();
    assert_eq!(actions.len(), 1);
    assert_eq!(
        actions[0].op,
        Operation::ShutdownVm {
            vm: v,
            node: f.nodes[0]
        }
    );
    assert_eq!((actions[0].start, actions[0].end), (0, 1));

    let result = plan.apply().unwrap();
    assert!(result.mapping().is_ready(v));
}

#[test]
fn test_sleeping_vm_keeps_its_node_online() {
    let mut dc = Datacenter::new();
    let n = dc.online_node();
    let v = dc.sleeping_vm(n);
    let mo: Model = dc.build();
    let mut rp = ReconfigurationProblemBuilder::new(&mo).build().unwrap();
    rp.csp_mut().propagate().unwrap();

    let state = rp.node_transition(n).unwrap().state();
    assert_eq!(rp.csp().store().value(state), Some(1));
    assert!(rp.future_sleeping_vms().contains(&v));
}
