//! Basic variable and value selectors.

use std::fmt::Debug;

use super::{DomainStore, DomainView, IntVar};

/// Picks the next variable to branch on among a scope.
pub trait VariableSelector: Send + Debug {
    /// Returns `None` when every variable of the scope is bound.
    fn select(&mut self, store: &DomainStore, scope: &[IntVar]) -> Option<IntVar>;
}

/// Picks the value to try first for a variable.
pub trait ValueSelector: Send + Debug {
    /// Called on unbound variables only. The returned value must belong to
    /// the domain.
    fn select(&mut self, store: &DomainStore, v: IntVar) -> i64;
}

/// First unbound variable, in scope order.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputOrder;

impl VariableSelector for InputOrder {
    fn select(&mut self, store: &DomainStore, scope: &[IntVar]) -> Option<IntVar> {
        scope.iter().copied().find(|v| !store.is_bound(*v))
    }
}

/// Unbound variable with the smallest domain, the first one on ties.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstFail;

impl VariableSelector for FirstFail {
    fn select(&mut self, store: &DomainStore, scope: &[IntVar]) -> Option<IntVar> {
        let mut best: Option<(u64, IntVar)> = None;
        for &v in scope {
            let size = store.domain_size(v);
            if size > 1 && best.map_or(true, |(s, _)| size < s) {
                best = Some((size, v));
            }
        }
        best.map(|(_, v)| v)
    }
}

/// Smallest value of the domain.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinValue;

impl ValueSelector for MinValue {
    fn select(&mut self, store: &DomainStore, v: IntVar) -> i64 {
        store.lb(v)
    }
}

/// Largest value of the domain.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxValue;

impl ValueSelector for MaxValue {
    fn select(&mut self, store: &DomainStore, v: IntVar) -> i64 {
        store.ub(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::Csp;

    #[test]
    fn test_first_fail_skips_bound_variables() {
        let mut csp = Csp::new();
        let a = csp.int_var("a", 0, 9);
        let b = csp.constant(3);
        let c = csp.int_var("c", 0, 2);
        let d = csp.enum_var("d", vec![1, 5, 7]);

        let scope = [a, b, c, d];
        assert_eq!(FirstFail.select(csp.store(), &scope), Some(c));
        assert_eq!(InputOrder.select(csp.store(), &scope), Some(a));
        assert_eq!(FirstFail.select(csp.store(), &[b]), None);
    }

    #[test]
    fn test_value_selectors() {
        let mut csp = Csp::new();
        let d = csp.enum_var("d", vec![1, 5, 7]);
        assert_eq!(MinValue.select(csp.store(), d), 1);
        assert_eq!(MaxValue.select(csp.store(), d), 7);
    }
}
