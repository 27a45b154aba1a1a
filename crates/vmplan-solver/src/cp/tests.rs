//! Tests for the constraint engine.

use super::*;
use crate::termination::{NoTermination, NodeCountTermination};

#[test]
fn test_worlds_restore_domains() {
    let mut csp = Csp::new();
    let x = csp.int_var("x", 0, 10);
    let y = csp.enum_var("y", vec![1, 2, 3]);

    csp.store_mut().push_world();
    csp.store_mut().set_lb(x, 4).unwrap();
    csp.store_mut().push_world();
    csp.store_mut().set_ub(x, 6).unwrap();
    csp.store_mut().remove(y, 2).unwrap();
    csp.store_mut().set_lb(x, 5).unwrap();
    assert_eq!(csp.store().domain(x), &Domain::interval(5, 6));

    csp.store_mut().pop_world();
    assert_eq!(csp.store().domain(x), &Domain::interval(4, 10));
    assert_eq!(csp.store().domain_size(y), 3);

    csp.store_mut().pop_world();
    assert_eq!(csp.store().lb(x), 0);
    assert_eq!(csp.store().depth(), 0);
}

#[test]
fn test_root_changes_are_permanent() {
    let mut csp = Csp::new();
    let x = csp.int_var("x", 0, 10);
    csp.store_mut().set_lb(x, 3).unwrap();
    csp.store_mut().pop_world();
    assert_eq!(csp.store().lb(x), 3);
}

#[test]
fn test_first_solution() {
    let mut csp = Csp::new();
    let x = csp.int_var("x", 0, 5);
    let y = csp.int_var("y", 0, 5);
    // x + y >= 7 and x <= y - 1
    csp.post(Linear::ge(vec![(1, x), (1, y)], 7));
    csp.post(Linear::leq_offset(x, y, -1));

    let mut strategy = IntStrategy::new("xy", vec![x, y], InputOrder, MinValue);
    let out = csp.search(&mut strategy, None, &NoTermination);
    assert_eq!(out.status, SearchStatus::Complete);
    let sol = out.best().unwrap();
    assert_eq!((sol.value(x), sol.value(y)), (2, 5));
    // domains are restored
    assert_eq!(csp.store().lb(x), 2);
    assert!(!csp.store().is_bound(x));
}

#[test]
fn test_minimize() {
    let mut csp = Csp::new();
    let x = csp.int_var("x", 0, 5);
    let y = csp.int_var("y", 0, 5);
    let cost = csp.int_var("cost", 0, 20);
    // cost = 3x + y, x + y >= 4
    csp.post(Linear::eq(vec![(3, x), (1, y), (-1, cost)], 0));
    csp.post(Linear::ge(vec![(1, x), (1, y)], 4));

    // deliberately bad first choices
    let mut strategy = IntStrategy::new("xy", vec![x, y], InputOrder, MaxValue);
    let out = csp.search(&mut strategy, Some(cost), &NoTermination);
    assert_eq!(out.status, SearchStatus::Complete);
    assert!(out.solutions.len() > 1);
    let best = out.best().unwrap();
    assert_eq!(best.objective, Some(4));
    assert_eq!((best.value(x), best.value(y)), (0, 4));
    let objectives: Vec<_> = out.solutions.iter().filter_map(|s| s.objective).collect();
    assert!(objectives.windows(2).all(|w| w[1] < w[0]));
}

#[test]
fn test_infeasible() {
    let mut csp = Csp::new();
    let x = csp.enum_var("x", vec![0, 2, 4]);
    let y = csp.enum_var("y", vec![0, 2, 4]);
    csp.post(Linear::eq(vec![(1, x), (1, y)], 5));

    let mut strategy = IntStrategy::new("xy", vec![x, y], FirstFail, MinValue);
    let out = csp.search(&mut strategy, None, &NoTermination);
    assert_eq!(out.status, SearchStatus::Complete);
    assert!(out.solutions.is_empty());
}

#[test]
fn test_empty_enum_var_is_infeasible() {
    let mut csp = Csp::new();
    csp.enum_var("nothing", Vec::new());
    let out = csp.search(&mut StrategySequence::new(), None, &NoTermination);
    assert!(out.solutions.is_empty());
}

#[test]
fn test_unassigned_variables_are_completed() {
    let mut csp = Csp::new();
    let x = csp.int_var("x", 2, 9);
    let out = csp.search(&mut StrategySequence::new(), None, &NoTermination);
    assert_eq!(out.best().unwrap().value(x), 2);
}

#[test]
fn test_node_limit() {
    let mut csp = Csp::new();
    let vars: Vec<IntVar> = (0..6).map(|i| csp.int_var(&format!("v{}", i), 0, 3)).collect();
    let cost = csp.int_var("cost", 0, 100);
    let mut terms: Vec<(i64, IntVar)> = vars.iter().map(|v| (1, *v)).collect();
    terms.push((-1, cost));
    csp.post(Linear::eq(terms, 0));

    let mut strategy = IntStrategy::new("v", vars, InputOrder, MaxValue);
    let out = csp.search(&mut strategy, Some(cost), &NodeCountTermination::new(10));
    assert_eq!(out.status, SearchStatus::Limited);
    assert!(out.hit_limit());
    assert!(out.best().is_some());
}

/// Picks a fixed value while it is in the domain.
#[derive(Debug)]
struct Prefer(i64);

impl ValueSelector for Prefer {
    fn select(&mut self, store: &DomainStore, v: IntVar) -> i64 {
        if store.contains(v, self.0) {
            self.0
        } else {
            store.lb(v)
        }
    }
}

#[test]
fn test_refuting_inside_a_wide_interval_keeps_lower_values() {
    let mut csp = Csp::new();
    let x = csp.int_var("x", 0, 1 << 20);
    let forbidden = csp.constant(0);
    // x != 5, only detected once x is bound
    csp.post(ReifEqConst::new(forbidden, x, 5));

    let mut strategy = IntStrategy::new("x", vec![x], InputOrder, Prefer(5));
    let out = csp.search(&mut strategy, None, &NoTermination);
    assert_eq!(out.best().unwrap().value(x), 0);
    assert_eq!(out.backtracks, 1);
}

#[test]
fn test_wide_interval_is_searched_completely() {
    let mut csp = Csp::new();
    let x = csp.int_var("x", 0, 1 << 20);
    let cost = csp.int_var("cost", 0, 1 << 20);
    csp.post(Linear::eq(vec![(1, x), (-1, cost)], 0));
    let forbidden = csp.constant(0);
    csp.post(ReifEqConst::new(forbidden, x, 5));

    // starting in the middle, the cheapest values lie below the decision
    let mut strategy = IntStrategy::new("x", vec![x], InputOrder, Prefer(7));
    let out = csp.search(&mut strategy, Some(cost), &NoTermination);
    assert_eq!(out.status, SearchStatus::Complete);
    assert_eq!(out.best().unwrap().objective, Some(0));
}

#[test]
fn test_geometric_restarts() {
    let mut csp = Csp::new();
    let vars: Vec<IntVar> = (0..6).map(|i| csp.int_var(&format!("v{}", i), 0, 3)).collect();
    let cost = csp.int_var("cost", 0, 100);
    let mut terms: Vec<(i64, IntVar)> = vars.iter().map(|v| (1, *v)).collect();
    terms.push((-1, cost));
    csp.post(Linear::eq(terms, 0));
    // even total only
    let half = csp.int_var("half", 0, 50);
    csp.post(Linear::eq(vec![(2, half), (-1, cost)], 0));

    let mut strategy = IntStrategy::new("v", vars.clone(), InputOrder, MaxValue);
    let out = csp.search_with_restarts(
        &mut strategy,
        Some(cost),
        &NoTermination,
        Some(GeometricRestarts::new(2, 1.5)),
    );
    assert_eq!(out.status, SearchStatus::Complete);
    assert!(out.restarts > 0);
    assert_eq!(out.best().unwrap().objective, Some(0));
    let objectives: Vec<_> = out.solutions.iter().filter_map(|s| s.objective).collect();
    assert!(objectives.windows(2).all(|w| w[1] < w[0]));

    let mut plain = IntStrategy::new("v", vars, InputOrder, MaxValue);
    let without = csp.search(&mut plain, Some(cost), &NoTermination);
    assert_eq!(without.restarts, 0);
    assert_eq!(without.best().unwrap().objective, Some(0));
}
