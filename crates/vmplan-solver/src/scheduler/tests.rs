//! Tests for the slice scheduler.

use smallvec::smallvec;
use vmplan_core::Vm;

use super::*;
use crate::cp::Csp;

struct Fixture {
    csp: Csp,
    nodes: Vec<NodeWindow>,
}

impl Fixture {
    /// Online nodes with ids `0..capacities.len()`, one resource.
    fn new(capacities: &[i64]) -> Self {
        let mut csp = Csp::new();
        let nodes = capacities
            .iter()
            .enumerate()
            .map(|(id, &cap)| NodeWindow {
                id: id as i64,
                state: csp.bool_var("state"),
                hosting_start: csp.int_var("hs", 0, 10),
                hosting_end: csp.int_var("he", 0, 10),
                capacity: smallvec![cap],
            })
            .collect();
        Self { csp, nodes }
    }

    fn c_slice(&mut self, host: i64, end: (i64, i64), demand: i64) -> Slice {
        let start = self.csp.constant(0);
        let end = self.csp.int_var("c.end", end.0, end.1);
        let hoster = self.csp.constant(host);
        Slice::new(Vm(0), start, end, end, hoster, smallvec![demand])
    }

    fn d_slice(&mut self, hosts: Vec<i64>, start: (i64, i64), demand: i64) -> Slice {
        let start = self.csp.int_var("d.start", start.0, start.1);
        let end = self.csp.int_var("d.end", 0, 10);
        let duration = self.csp.int_var("d.duration", 0, 10);
        let hoster = self.csp.enum_var("d.hoster", hosts);
        Slice::new(Vm(1), start, end, duration, hoster, smallvec![demand])
    }

    fn post(&mut self, c: &[&Slice], d: &[&Slice]) {
        let mut s = SliceScheduler::new(self.nodes.clone(), 1);
        for x in c {
            s.add_c_slice(x);
        }
        for x in d {
            s.add_d_slice(x);
        }
        self.csp.post(s);
    }
}

#[test]
fn test_arrival_waits_for_departure() {
    let mut f = Fixture::new(&[2]);
    let c = f.c_slice(0, (5, 10), 2);
    let d = f.d_slice(vec![0], (0, 8), 1);
    f.post(&[&c], &[&d]);
    f.csp.propagate().unwrap();

    let store = f.csp.store();
    // the arrival cannot overlap the departing VM
    assert_eq!(store.lb(d.start()), 5);
    // nor can the departure last once the arrival surely happened
    assert_eq!(store.ub(c.end()), 8);
    assert_eq!(store.value(f.nodes[0].state), Some(1));
}

#[test]
fn test_overload_fails() {
    let mut f = Fixture::new(&[2]);
    let a = f.d_slice(vec![0], (0, 0), 2);
    let b = f.d_slice(vec![0], (0, 10), 1);
    f.post(&[], &[&a, &b]);
    assert!(f.csp.propagate().is_err());
}

#[test]
fn test_offline_node_is_not_a_candidate() {
    let mut f = Fixture::new(&[4, 4]);
    let d = f.d_slice(vec![0, 1], (0, 10), 1);
    let state = f.nodes[0].state;
    f.post(&[], &[&d]);
    f.csp.store_mut().instantiate(state, 0).unwrap();
    f.csp.propagate().unwrap();
    assert_eq!(f.csp.store().value(d.hoster()), Some(1));
    // the remaining host must be online
    assert_eq!(f.csp.store().value(f.nodes[1].state), Some(1));
}

#[test]
fn test_hosting_window() {
    let mut f = Fixture::new(&[4]);
    let hs = f.nodes[0].hosting_start;
    let he = f.nodes[0].hosting_end;
    let c = f.c_slice(0, (3, 10), 1);
    let d = f.d_slice(vec![0], (0, 10), 1);
    f.post(&[&c], &[&d]);
    f.csp.store_mut().set_lb(hs, 4).unwrap();
    f.csp.store_mut().set_ub(he, 7).unwrap();
    f.csp.propagate().unwrap();

    let store = f.csp.store();
    assert_eq!(store.lb(d.start()), 4);
    assert_eq!(store.ub(c.end()), 7);
    assert_eq!(store.lb(he), 3);
}

#[test]
fn test_late_window_removes_candidate() {
    let mut f = Fixture::new(&[4, 4]);
    let hs = f.nodes[1].hosting_start;
    let d = f.d_slice(vec![0, 1], (0, 3), 1);
    f.post(&[], &[&d]);
    f.csp.store_mut().set_lb(hs, 5).unwrap();
    f.csp.propagate().unwrap();
    assert_eq!(f.csp.store().value(d.hoster()), Some(0));
}

#[test]
fn test_full_node_removed_from_candidates() {
    let mut f = Fixture::new(&[2, 3, 1]);
    let staying = f.d_slice(vec![0], (0, 0), 2);
    let d = f.d_slice(vec![0, 1, 2], (0, 10), 2);
    f.post(&[], &[&staying, &d]);
    f.csp.propagate().unwrap();
    // node 0 is full forever, node 2 is too small
    assert_eq!(f.csp.store().value(d.hoster()), Some(1));
}

#[test]
fn test_violation_helpers() {
    let profile: Profile = vec![(0, 2), (5, 0), (8, 1)];
    assert_eq!(last_violation_end(&profile, 1, 2, 8), Some(5));
    assert_eq!(last_violation_end(&profile, 2, 2, i64::MAX), Some(i64::MAX));
    assert_eq!(last_violation_end(&profile, 3, 2, 8), Some(i64::MAX));
    assert_eq!(first_violation_start(&profile, 2, 2, 5), Some(8));
    assert_eq!(first_violation_start(&profile, 1, 2, 5), None);
    assert_eq!(first_violation_start(&profile, 1, 1, 3), Some(3));
}
