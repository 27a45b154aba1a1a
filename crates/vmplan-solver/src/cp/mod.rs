//! A small finite-domain constraint engine.
//!
//! The scheduling model only needs a narrow set of capabilities from a
//! constraint solver: integer and boolean variables, a handful of
//! arithmetic and logical propagators, and a backtracking search driven by
//! pluggable variable and value selectors. This module provides exactly
//! that surface.
//!
//! # Design
//!
//! - Variables are handles ([`IntVar`]) into a [`DomainStore`].
//! - Every domain change is trailed, so [`DomainStore::push_world`] and
//!   [`DomainStore::pop_world`] restore the domains on backtrack.
//! - Propagators watch variables and are re-run until a fix point is
//!   reached ([`Csp::propagate`]).
//!
//! # Example
//!
//! ```
//! use vmplan_solver::cp::{Csp, DomainView, Linear};
//!
//! let mut csp = Csp::new();
//! let x = csp.int_var("x", 0, 10);
//! let y = csp.int_var("y", 0, 10);
//! // x + y = 12
//! csp.post(Linear::eq(vec![(1, x), (1, y)], 12));
//! csp.propagate().unwrap();
//!
//! assert_eq!(csp.store().lb(x), 2);
//! assert_eq!(csp.store().ub(y), 10);
//! ```

mod domain;
mod propagators;
mod search;
mod selectors;

use std::collections::VecDeque;
use std::fmt::{self, Debug};

pub use domain::{Contradiction, DomResult, Domain};
pub use propagators::{AtMostInSet, Linear, ReifEqConst, Select};
pub use search::{
    Decision, GeometricRestarts, IntStrategy, SearchMonitor, SearchOutcome, SearchStatus,
    Solution, Strategy, StrategySequence,
};
pub use selectors::{FirstFail, InputOrder, MaxValue, MinValue, ValueSelector, VariableSelector};

/// Handle of an integer variable. Booleans are integer variables over
/// `{0, 1}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntVar(u32);

impl IntVar {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Read access to the current domains.
///
/// This is everything heuristics and plan extraction are allowed to see
/// of the solver.
pub trait DomainView {
    fn lb(&self, v: IntVar) -> i64;

    fn ub(&self, v: IntVar) -> i64;

    fn domain_size(&self, v: IntVar) -> u64;

    fn contains(&self, v: IntVar, x: i64) -> bool;

    /// Values of the domain in increasing order.
    fn values(&self, v: IntVar) -> Vec<i64>;

    fn is_bound(&self, v: IntVar) -> bool {
        self.lb(v) == self.ub(v)
    }

    /// The value of a bound variable.
    fn value(&self, v: IntVar) -> Option<i64> {
        let lb = self.lb(v);
        (lb == self.ub(v)).then_some(lb)
    }
}

/// Domains of every variable plus the trail used to restore them.
#[derive(Debug, Default)]
pub struct DomainStore {
    domains: Vec<Domain>,
    names: Vec<String>,
    trail: Vec<(u32, Domain)>,
    /// Trail length and world id of every open world.
    worlds: Vec<(usize, u64)>,
    /// Id of the world each variable was last saved in.
    saved_in: Vec<u64>,
    current_world: u64,
    world_counter: u64,
    modified: Vec<u32>,
}

impl DomainStore {
    fn add(&mut self, name: &str, dom: Domain) -> IntVar {
        let id = self.domains.len() as u32;
        self.domains.push(dom);
        self.names.push(name.to_string());
        self.saved_in.push(u64::MAX);
        IntVar(id)
    }

    pub fn nb_vars(&self) -> usize {
        self.domains.len()
    }

    pub fn name(&self, v: IntVar) -> &str {
        &self.names[v.index()]
    }

    pub fn domain(&self, v: IntVar) -> &Domain {
        &self.domains[v.index()]
    }

    /// Number of open worlds.
    pub fn depth(&self) -> usize {
        self.worlds.len()
    }

    /// Opens a world. Every change made from now on is undone by the
    /// matching [`DomainStore::pop_world`].
    pub fn push_world(&mut self) {
        self.world_counter += 1;
        self.worlds.push((self.trail.len(), self.current_world));
        self.current_world = self.world_counter;
    }

    /// Restores the domains as they were when the last world was opened.
    pub fn pop_world(&mut self) {
        let Some((mark, parent)) = self.worlds.pop() else {
            return;
        };
        while self.trail.len() > mark {
            if let Some((v, d)) = self.trail.pop() {
                self.domains[v as usize] = d;
            }
        }
        self.current_world = parent;
        self.modified.clear();
    }

    fn save(&mut self, i: usize) {
        if !self.worlds.is_empty() && self.saved_in[i] != self.current_world {
            self.trail.push((i as u32, self.domains[i].clone()));
            self.saved_in[i] = self.current_world;
        }
    }

    fn update(&mut self, v: IntVar, op: impl FnOnce(&mut Domain) -> DomResult) -> DomResult {
        let i = v.index();
        let mut d = self.domains[i].clone();
        if op(&mut d)? {
            self.save(i);
            self.domains[i] = d;
            self.modified.push(v.0);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn set_lb(&mut self, v: IntVar, x: i64) -> DomResult {
        let d = &self.domains[v.index()];
        if x <= d.lb() {
            return Ok(false);
        }
        if x > d.ub() {
            return Err(Contradiction);
        }
        self.update(v, |d| d.set_lb(x))
    }

    pub fn set_ub(&mut self, v: IntVar, x: i64) -> DomResult {
        let d = &self.domains[v.index()];
        if x >= d.ub() {
            return Ok(false);
        }
        if x < d.lb() {
            return Err(Contradiction);
        }
        self.update(v, |d| d.set_ub(x))
    }

    pub fn instantiate(&mut self, v: IntVar, x: i64) -> DomResult {
        let d = &self.domains[v.index()];
        if !d.contains(x) {
            return Err(Contradiction);
        }
        if d.is_bound() {
            return Ok(false);
        }
        self.update(v, |d| d.instantiate(x))
    }

    pub fn remove(&mut self, v: IntVar, x: i64) -> DomResult {
        if !self.domains[v.index()].contains(x) {
            return Ok(false);
        }
        self.update(v, |d| d.remove(x))
    }

    pub fn retain(&mut self, v: IntVar, keep: impl FnMut(i64) -> bool) -> DomResult {
        self.update(v, |d| d.retain(keep))
    }

    fn take_modified(&mut self) -> Vec<u32> {
        std::mem::take(&mut self.modified)
    }
}

impl DomainView for DomainStore {
    fn lb(&self, v: IntVar) -> i64 {
        self.domains[v.index()].lb()
    }

    fn ub(&self, v: IntVar) -> i64 {
        self.domains[v.index()].ub()
    }

    fn domain_size(&self, v: IntVar) -> u64 {
        self.domains[v.index()].size()
    }

    fn contains(&self, v: IntVar, x: i64) -> bool {
        self.domains[v.index()].contains(x)
    }

    fn values(&self, v: IntVar) -> Vec<i64> {
        self.domains[v.index()].iter().collect()
    }
}

/// A filtering algorithm.
///
/// `propagate` removes values that cannot be part of a solution given the
/// current domains. It must detect a violation at the latest once all its
/// variables are bound.
pub trait Propagator: Send + Debug {
    /// Variables whose changes wake the propagator up.
    fn vars(&self) -> Vec<IntVar>;

    fn propagate(&self, store: &mut DomainStore) -> Result<(), Contradiction>;
}

/// Variables and propagators of a constraint satisfaction problem.
#[derive(Default)]
pub struct Csp {
    store: DomainStore,
    propagators: Vec<Box<dyn Propagator>>,
    watchers: Vec<Vec<usize>>,
    queue: VecDeque<usize>,
    queued: Vec<bool>,
}

impl Csp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an integer variable over `[lo, hi]`.
    pub fn int_var(&mut self, name: &str, lo: i64, hi: i64) -> IntVar {
        self.add_var(name, Domain::interval(lo, hi.max(lo)))
    }

    /// Creates an integer variable over an explicit set of values.
    ///
    /// An empty set gives a variable that can never be instantiated.
    pub fn enum_var(&mut self, name: &str, values: Vec<i64>) -> IntVar {
        match Domain::values(values) {
            Some(d) => self.add_var(name, d),
            None => {
                let v = self.add_var(name, Domain::interval(0, 0));
                self.post(Unsatisfiable(v));
                v
            }
        }
    }

    pub fn bool_var(&mut self, name: &str) -> IntVar {
        self.add_var(name, Domain::Values(vec![0, 1]))
    }

    /// Creates a variable bound to `value`.
    pub fn constant(&mut self, value: i64) -> IntVar {
        self.add_var(&value.to_string(), Domain::interval(value, value))
    }

    fn add_var(&mut self, name: &str, dom: Domain) -> IntVar {
        self.watchers.push(Vec::new());
        self.store.add(name, dom)
    }

    pub fn nb_vars(&self) -> usize {
        self.store.nb_vars()
    }

    pub fn nb_propagators(&self) -> usize {
        self.propagators.len()
    }

    /// Adds a propagator. It runs at the next [`Csp::propagate`].
    pub fn post(&mut self, p: impl Propagator + 'static) {
        self.post_boxed(Box::new(p));
    }

    pub fn post_boxed(&mut self, p: Box<dyn Propagator>) {
        let id = self.propagators.len();
        for v in p.vars() {
            let w = &mut self.watchers[v.index()];
            if w.last() != Some(&id) {
                w.push(id);
            }
        }
        self.propagators.push(p);
        self.queued.push(true);
        self.queue.push_back(id);
    }

    pub fn store(&self) -> &DomainStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut DomainStore {
        &mut self.store
    }

    /// Runs the propagators until no domain changes anymore.
    pub fn propagate(&mut self) -> Result<(), Contradiction> {
        loop {
            for v in self.store.take_modified() {
                for &p in &self.watchers[v as usize] {
                    if !self.queued[p] {
                        self.queued[p] = true;
                        self.queue.push_back(p);
                    }
                }
            }
            let Some(p) = self.queue.pop_front() else {
                return Ok(());
            };
            self.queued[p] = false;
            if let Err(c) = self.propagators[p].propagate(&mut self.store) {
                self.flush_queue();
                return Err(c);
            }
        }
    }

    fn flush_queue(&mut self) {
        for p in self.queue.drain(..) {
            self.queued[p] = false;
        }
        self.store.modified.clear();
    }
}

impl Debug for Csp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Csp")
            .field("vars", &self.store.nb_vars())
            .field("propagators", &self.propagators.len())
            .finish()
    }
}

/// Fails as soon as it runs.
#[derive(Debug)]
struct Unsatisfiable(IntVar);

impl Propagator for Unsatisfiable {
    fn vars(&self) -> Vec<IntVar> {
        vec![self.0]
    }

    fn propagate(&self, _store: &mut DomainStore) -> Result<(), Contradiction> {
        Err(Contradiction)
    }
}

#[cfg(test)]
mod tests;
