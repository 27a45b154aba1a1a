//! Depth-first search with binary branching and branch-and-bound.

use std::fmt::{self, Debug};
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use super::{Csp, DomainStore, DomainView, IntVar, ValueSelector, VariableSelector};
use crate::termination::Termination;

/// A branching decision: `var = value` on the left branch, `var ≠ value`
/// on the right one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub var: IntVar,
    pub value: i64,
}

/// Produces the next decision from the current domains.
pub trait Strategy: Send + Debug {
    /// Returns `None` when the strategy has nothing left to decide.
    fn next_decision(&mut self, store: &DomainStore) -> Option<Decision>;
}

/// A variable selector and a value selector over a fixed scope.
#[derive(Debug)]
pub struct IntStrategy {
    label: &'static str,
    scope: Vec<IntVar>,
    vars: Box<dyn VariableSelector>,
    values: Box<dyn ValueSelector>,
}

impl IntStrategy {
    pub fn new(
        label: &'static str,
        scope: Vec<IntVar>,
        vars: impl VariableSelector + 'static,
        values: impl ValueSelector + 'static,
    ) -> Self {
        Self {
            label,
            scope,
            vars: Box::new(vars),
            values: Box::new(values),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn scope(&self) -> &[IntVar] {
        &self.scope
    }
}

impl Strategy for IntStrategy {
    fn next_decision(&mut self, store: &DomainStore) -> Option<Decision> {
        let var = self.vars.select(store, &self.scope)?;
        let value = self.values.select(store, var);
        Some(Decision { var, value })
    }
}

/// Strategies tried in order: the first one with a decision wins.
#[derive(Debug, Default)]
pub struct StrategySequence {
    strategies: Vec<Box<dyn Strategy>>,
}

impl StrategySequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, s: impl Strategy + 'static) {
        self.strategies.push(Box::new(s));
    }

    pub fn push_boxed(&mut self, s: Box<dyn Strategy>) {
        self.strategies.push(s);
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl Strategy for StrategySequence {
    fn next_decision(&mut self, store: &DomainStore) -> Option<Decision> {
        self.strategies.iter_mut().find_map(|s| s.next_decision(store))
    }
}

/// Geometric restart schedule.
///
/// The search goes back to the root once `base` backtracks were done since
/// the last restart; the limit is then multiplied by `factor`. Only the
/// decisions are forgotten: the bound on the objective and the state of the
/// strategies are kept, so the next descent differs from the previous one.
///
/// # Example
///
/// ```
/// use vmplan_solver::cp::GeometricRestarts;
///
/// let mut r = GeometricRestarts::new(4, 1.5);
/// assert!(!r.is_due(3));
/// assert!(r.is_due(4));
/// r.restart(4);
/// assert_eq!(r.limit(), 6);
/// assert!(!r.is_due(9));
/// assert!(r.is_due(10));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometricRestarts {
    limit: u64,
    factor: f64,
    since: u64,
}

impl GeometricRestarts {
    pub fn new(base: u64, factor: f64) -> Self {
        Self {
            limit: base.max(1),
            factor: factor.max(1.0),
            since: 0,
        }
    }

    /// Backtracks allowed before the next restart.
    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn is_due(&self, backtracks: u64) -> bool {
        backtracks - self.since >= self.limit
    }

    /// Records a restart done after `backtracks` backtracks in total.
    pub fn restart(&mut self, backtracks: u64) {
        self.since = backtracks;
        self.limit = ((self.limit as f64) * self.factor).ceil() as u64;
    }
}

/// Counters of a running search.
#[derive(Debug, Clone)]
pub struct SearchMonitor {
    started: Instant,
    /// Decisions taken.
    pub nodes: u64,
    /// Refuted decisions.
    pub backtracks: u64,
    /// Solutions found.
    pub solutions: u64,
    pub restarts: u64,
}

impl SearchMonitor {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            nodes: 0,
            backtracks: 0,
            solutions: 0,
            restarts: 0,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Values of every variable at a solution.
#[derive(Clone, PartialEq, Eq)]
pub struct Solution {
    values: Vec<i64>,
    /// Objective value, when optimizing.
    pub objective: Option<i64>,
    /// Search nodes explored when the solution was found.
    pub nodes: u64,
    /// Backtracks done when the solution was found.
    pub backtracks: u64,
    /// Time elapsed since the search started.
    pub time: Duration,
}

impl Solution {
    pub fn value(&self, v: IntVar) -> i64 {
        self.values[v.index()]
    }

    /// Value of a boolean variable.
    pub fn is_true(&self, v: IntVar) -> bool {
        self.values[v.index()] != 0
    }
}

impl DomainView for Solution {
    fn lb(&self, v: IntVar) -> i64 {
        self.values[v.index()]
    }

    fn ub(&self, v: IntVar) -> i64 {
        self.values[v.index()]
    }

    fn domain_size(&self, _v: IntVar) -> u64 {
        1
    }

    fn contains(&self, v: IntVar, x: i64) -> bool {
        self.values[v.index()] == x
    }

    fn values(&self, v: IntVar) -> Vec<i64> {
        vec![self.values[v.index()]]
    }
}

impl Debug for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Solution")
            .field("vars", &self.values.len())
            .field("objective", &self.objective)
            .field("nodes", &self.nodes)
            .field("backtracks", &self.backtracks)
            .finish()
    }
}

/// How the search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    /// The search ended on its own: a first solution was found, optimality
    /// was proven or the problem was proven infeasible.
    Complete,
    /// A termination condition stopped the search.
    Limited,
}

/// Result of [`Csp::search`].
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub status: SearchStatus,
    /// Solutions by order of discovery. When minimizing, each one is
    /// strictly better than the previous one.
    pub solutions: Vec<Solution>,
    pub nodes: u64,
    pub backtracks: u64,
    pub restarts: u64,
    pub elapsed: Duration,
}

impl SearchOutcome {
    pub fn best(&self) -> Option<&Solution> {
        self.solutions.last()
    }

    pub fn hit_limit(&self) -> bool {
        self.status == SearchStatus::Limited
    }
}

/// How a decision is applied on a branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Branch {
    /// `var = value`
    Assign,
    /// `var ≠ value`
    Refute,
    /// `var < value`, when `value` cannot be removed alone
    Below,
    /// `var > value`, explored after `Below`
    Above,
}

impl Csp {
    /// Explores the search tree.
    ///
    /// Without `minimize`, stops at the first solution. With it, every
    /// solution forces the next ones to be strictly better until the tree
    /// is exhausted. Variables the strategy leaves unbound are decided on
    /// their smallest value. The domains are restored afterwards, except
    /// for the filtering done before the first decision.
    pub fn search(
        &mut self,
        strategy: &mut dyn Strategy,
        minimize: Option<IntVar>,
        termination: &dyn Termination,
    ) -> SearchOutcome {
        self.search_with_restarts(strategy, minimize, termination, None)
    }

    /// Same as [`Csp::search`], going back to the root according to
    /// `restarts` while minimizing.
    pub fn search_with_restarts(
        &mut self,
        strategy: &mut dyn Strategy,
        minimize: Option<IntVar>,
        termination: &dyn Termination,
        mut restarts: Option<GeometricRestarts>,
    ) -> SearchOutcome {
        let mut monitor = SearchMonitor::start();
        let mut solutions = Vec::new();
        let mut bound: Option<i64> = None;
        let mut stack: Vec<(Decision, Branch)> = Vec::new();
        let base = self.store.depth();

        // root filtering is implied by the constraints and kept
        let mut ok = self.propagate().is_ok();
        self.store.push_world();
        let root = self.store.depth();
        let status = loop {
            if termination.is_terminated(&monitor) {
                break SearchStatus::Limited;
            }
            if let (Some(schedule), Some(cost)) = (restarts.as_mut(), minimize) {
                if !stack.is_empty() && schedule.is_due(monitor.backtracks) {
                    schedule.restart(monitor.backtracks);
                    monitor.restarts += 1;
                    while self.store.depth() > root {
                        self.store.pop_world();
                    }
                    stack.clear();
                    debug!(
                        event = "restart",
                        restarts = monitor.restarts,
                        backtracks = monitor.backtracks,
                        next_limit = schedule.limit(),
                    );
                    ok = self.tighten(cost, bound);
                    if !ok {
                        break SearchStatus::Complete;
                    }
                    continue;
                }
            }
            if ok {
                let decision = strategy
                    .next_decision(&self.store)
                    .or_else(|| self.first_unbound());
                if let Some(d) = decision {
                    monitor.nodes += 1;
                    trace!(var = self.store.name(d.var), value = d.value, "decision");
                    self.store.push_world();
                    stack.push((d, Branch::Assign));
                    ok = self.branch(d, Branch::Assign, minimize, bound);
                    continue;
                }
                monitor.solutions += 1;
                let sol = self.snapshot(&monitor, minimize);
                debug!(
                    event = "solution",
                    objective = ?sol.objective,
                    nodes = monitor.nodes,
                    backtracks = monitor.backtracks,
                );
                bound = sol.objective;
                solutions.push(sol);
                if minimize.is_none() {
                    break SearchStatus::Complete;
                }
            }
            ok = self.backtrack(&mut stack, &mut monitor, minimize, bound);
            if !ok && stack.is_empty() {
                break SearchStatus::Complete;
            }
        };
        while self.store.depth() > base {
            self.store.pop_world();
        }
        SearchOutcome {
            status,
            solutions,
            nodes: monitor.nodes,
            backtracks: monitor.backtracks,
            restarts: monitor.restarts,
            elapsed: monitor.elapsed(),
        }
    }

    fn first_unbound(&self) -> Option<Decision> {
        (0..self.store.nb_vars() as u32)
            .map(IntVar)
            .find(|v| !self.store.is_bound(*v))
            .map(|var| Decision {
                var,
                value: self.store.lb(var),
            })
    }

    fn snapshot(&self, monitor: &SearchMonitor, minimize: Option<IntVar>) -> Solution {
        Solution {
            values: (0..self.store.nb_vars() as u32)
                .map(|i| self.store.lb(IntVar(i)))
                .collect(),
            objective: minimize.map(|c| self.store.lb(c)),
            nodes: monitor.nodes,
            backtracks: monitor.backtracks,
            time: monitor.elapsed(),
        }
    }

    /// Applies one branch of a decision, then the objective bound, and
    /// propagates.
    fn branch(&mut self, d: Decision, how: Branch, minimize: Option<IntVar>, bound: Option<i64>) -> bool {
        let applied = match how {
            Branch::Assign => self.store.instantiate(d.var, d.value),
            Branch::Refute => self.store.remove(d.var, d.value),
            Branch::Below => self.store.set_ub(d.var, d.value - 1),
            Branch::Above => self.store.set_lb(d.var, d.value + 1),
        };
        if applied.is_err() {
            return false;
        }
        match minimize {
            Some(cost) => self.tighten(cost, bound),
            None => self.propagate().is_ok(),
        }
    }

    /// Forces the cost under the best one found so far and propagates.
    fn tighten(&mut self, cost: IntVar, bound: Option<i64>) -> bool {
        if let Some(best) = bound {
            if self.store.set_ub(cost, best - 1).is_err() {
                return false;
            }
        }
        self.propagate().is_ok()
    }

    /// Pops decisions until an alternative branch succeeds. Returns
    /// `false` once the tree is exhausted.
    fn backtrack(
        &mut self,
        stack: &mut Vec<(Decision, Branch)>,
        monitor: &mut SearchMonitor,
        minimize: Option<IntVar>,
        bound: Option<i64>,
    ) -> bool {
        while let Some((d, done)) = stack.pop() {
            self.store.pop_world();
            let next = match done {
                Branch::Assign => {
                    monitor.backtracks += 1;
                    if self.store.domain(d.var).is_removable(d.value) {
                        Branch::Refute
                    } else {
                        Branch::Below
                    }
                }
                Branch::Below => Branch::Above,
                Branch::Refute | Branch::Above => continue,
            };
            self.store.push_world();
            stack.push((d, next));
            if self.branch(d, next, minimize, bound) {
                return true;
            }
        }
        false
    }
}
