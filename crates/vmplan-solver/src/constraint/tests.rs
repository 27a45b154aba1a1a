//! Tests for the solver constraints and their registry.

use std::any::Any;
use std::collections::BTreeSet;

use vmplan_core::{Node, Offline, RunningCapacity};
use vmplan_test::instances::{overloaded_node, six_nodes};
use vmplan_test::Datacenter;

use super::*;
use crate::cp::DomainView;
use crate::problem::ReconfigurationProblemBuilder;
use crate::transition::Transition;

#[derive(Debug)]
struct Spread;

impl SatConstraint for Spread {
    fn kind(&self) -> &'static str {
        "spread"
    }

    fn involved_vms(&self) -> Vec<Vm> {
        Vec::new()
    }

    fn involved_nodes(&self) -> Vec<Node> {
        Vec::new()
    }

    fn is_satisfied(&self, _model: &Model) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn problem(model: &Model) -> ReconfigurationProblem {
    ReconfigurationProblemBuilder::new(model).build().unwrap()
}

#[test]
fn test_unknown_kind_is_rejected() {
    let mapper = ConstraintMapper::new_bundle();
    let err = mapper.map(&Spread).unwrap_err();
    assert!(matches!(err, SchedulerError::ModelInconsistency(_)));
    assert!(err.to_string().contains("spread"));
}

#[test]
fn test_builder_of_the_wrong_type() {
    let mut mapper = ConstraintMapper::new();
    mapper.register("spread", map_running);
    assert!(mapper.map(&Spread).is_err());
    assert!(mapper.unregister("spread").is_some());
    assert!(!mapper.is_registered("spread"));
}

#[test]
fn test_vm_states() {
    let f = overloaded_node();
    let c = ConstraintMapper::new_bundle()
        .map(&Ready::new([f.vms[0]]))
        .unwrap();
    assert_eq!(c.next_vm_states(), vec![(f.vms[0], VmState::Ready)]);
    assert_eq!(c.mis_placed_vms(f.instance.model()), BTreeSet::from([f.vms[0]]));

    let c = VmStateConstraint::new([f.vms[1]], VmState::Running);
    assert!(c.mis_placed_vms(f.instance.model()).is_empty());
}

#[test]
fn test_ban() {
    let f = six_nodes();
    let params = Parameters::default();
    let mut rp = problem(f.instance.model());
    let c = BanConstraint::new(BTreeSet::from([f.vms[0]]), BTreeSet::from([f.nodes[0]]));

    assert_eq!(c.mis_placed_vms(f.instance.model()), BTreeSet::from([f.vms[0]]));
    assert!(c.inject(&params, &mut rp).unwrap());
    let h = rp.vm_transition(f.vms[0]).unwrap().d_slice().unwrap().hoster();
    assert!(!rp.csp().store().contains(h, f.nodes[0].id() as i64));
    assert_eq!(rp.csp().store().domain_size(h), 5);
}

#[test]
fn test_fence() {
    let f = six_nodes();
    let params = Parameters::default();
    let mut rp = problem(f.instance.model());
    let fence = BTreeSet::from([f.nodes[1], f.nodes[2]]);
    let c = FenceConstraint::new(BTreeSet::from([f.vms[0], f.vms[2]]), fence);

    assert_eq!(c.mis_placed_vms(f.instance.model()), BTreeSet::from([f.vms[0]]));
    assert!(c.inject(&params, &mut rp).unwrap());
    let h = rp.vm_transition(f.vms[0]).unwrap().d_slice().unwrap().hoster();
    assert_eq!(
        rp.csp().store().values(h),
        vec![f.nodes[1].id() as i64, f.nodes[2].id() as i64]
    );
}

#[test]
fn test_ban_on_a_pinned_vm_is_infeasible() {
    let f = six_nodes();
    let params = Parameters::default();
    let mut rp = ReconfigurationProblemBuilder::new(f.instance.model())
        .with_manageable_vms(BTreeSet::new())
        .build()
        .unwrap();
    let c = BanConstraint::new(BTreeSet::from([f.vms[0]]), BTreeSet::from([f.nodes[0]]));
    assert!(!c.inject(&params, &mut rp).unwrap());
}

#[test]
fn test_root_pins_the_vm() {
    let f = overloaded_node();
    let params = Parameters::default();
    let mut rp = problem(f.instance.model());
    let c = RootConstraint::new(BTreeSet::from([f.vms[1]]));

    assert!(c.inject(&params, &mut rp).unwrap());
    let t = rp.vm_transition(f.vms[1]).unwrap().as_relocatable().unwrap();
    let h = t.d_slice().unwrap().hoster();
    assert_eq!(rp.csp().store().value(h), Some(f.nodes[0].id() as i64));
    assert!(c.mis_placed_vms(f.instance.model()).is_empty());
}

#[test]
fn test_offline_node() {
    let f = six_nodes();
    let params = Parameters::default();
    let mut rp = problem(f.instance.model());
    let c = ConstraintMapper::new_bundle()
        .map(&Offline::new([f.nodes[4]]))
        .unwrap();

    assert_eq!(
        c.mis_placed_vms(f.instance.model()),
        BTreeSet::from([f.vms[8], f.vms[9]])
    );
    assert!(c.inject(&params, &mut rp).unwrap());
    let state = rp.node_transition(f.nodes[4]).unwrap().state();
    assert_eq!(rp.csp().store().value(state), Some(0));
}

#[test]
fn test_online_node_with_sleeping_vm_cannot_go_offline() {
    let mut dc = Datacenter::new();
    let n = dc.online_node();
    dc.sleeping_vm(n);
    let mo = dc.build();
    let params = Parameters::default();
    let mut rp = problem(&mo);

    let c = NodeStateConstraint::new([n], false);
    assert!(c.inject(&params, &mut rp).unwrap());
    assert!(rp.csp_mut().propagate().is_err());
}

#[test]
fn test_running_capacity() {
    let f = overloaded_node();
    let params = Parameters::default();
    let mut rp = problem(f.instance.model());
    let c = ConstraintMapper::new_bundle()
        .map(&RunningCapacity::new([f.nodes[0]], 1))
        .unwrap();

    assert_eq!(c.mis_placed_vms(f.instance.model()).len(), 2);
    assert!(c.inject(&params, &mut rp).unwrap());

    let h0 = rp.vm_transition(f.vms[0]).unwrap().d_slice().unwrap().hoster();
    let h1 = rp.vm_transition(f.vms[1]).unwrap().d_slice().unwrap().hoster();
    let n0 = f.nodes[0].id() as i64;
    rp.csp_mut().store_mut().instantiate(h0, n0).unwrap();
    rp.csp_mut().propagate().unwrap();
    assert!(!rp.csp().store().contains(h1, n0));

    let relaxed = RunningCapacityConstraint::new(BTreeSet::from([f.nodes[0]]), 2);
    assert!(relaxed.mis_placed_vms(f.instance.model()).is_empty());
}
