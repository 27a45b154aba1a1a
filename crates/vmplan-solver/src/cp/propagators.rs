//! Arithmetic and logical propagators.

use std::collections::BTreeSet;

use super::{Contradiction, DomainStore, DomainView, IntVar, Propagator};

fn floor_div(a: i64, b: i64) -> i64 {
    let q = a / b;
    if (a % b != 0) && ((a < 0) != (b < 0)) {
        q - 1
    } else {
        q
    }
}

fn ceil_div(a: i64, b: i64) -> i64 {
    -floor_div(-a, b)
}

/// `Σ cᵢ·xᵢ = rhs` or `Σ cᵢ·xᵢ ≤ rhs`, filtered on bounds.
#[derive(Debug, Clone)]
pub struct Linear {
    terms: Vec<(i64, IntVar)>,
    rhs: i64,
    equality: bool,
}

impl Linear {
    /// `Σ cᵢ·xᵢ = rhs`
    pub fn eq(terms: Vec<(i64, IntVar)>, rhs: i64) -> Self {
        Self::new(terms, rhs, true)
    }

    /// `Σ cᵢ·xᵢ ≤ rhs`
    pub fn le(terms: Vec<(i64, IntVar)>, rhs: i64) -> Self {
        Self::new(terms, rhs, false)
    }

    /// `Σ cᵢ·xᵢ ≥ rhs`
    pub fn ge(terms: Vec<(i64, IntVar)>, rhs: i64) -> Self {
        Self::new(terms.into_iter().map(|(c, x)| (-c, x)).collect(), -rhs, false)
    }

    /// `a ≤ b + offset`
    pub fn leq_offset(a: IntVar, b: IntVar, offset: i64) -> Self {
        Self::le(vec![(1, a), (-1, b)], offset)
    }

    fn new(terms: Vec<(i64, IntVar)>, rhs: i64, equality: bool) -> Self {
        Self {
            terms: terms.into_iter().filter(|(c, _)| *c != 0).collect(),
            rhs,
            equality,
        }
    }

    fn term_min(store: &DomainStore, c: i64, x: IntVar) -> i64 {
        if c > 0 {
            c * store.lb(x)
        } else {
            c * store.ub(x)
        }
    }

    fn term_max(store: &DomainStore, c: i64, x: IntVar) -> i64 {
        if c > 0 {
            c * store.ub(x)
        } else {
            c * store.lb(x)
        }
    }

    /// Filters `Σ cᵢ·xᵢ ≤ rhs`.
    fn filter_le(
        store: &mut DomainStore,
        terms: &[(i64, IntVar)],
        rhs: i64,
        negated: bool,
    ) -> Result<bool, Contradiction> {
        let sign = if negated { -1 } else { 1 };
        let min_sum: i64 = terms
            .iter()
            .map(|&(c, x)| Self::term_min(store, sign * c, x))
            .sum();
        if min_sum > rhs {
            return Err(Contradiction);
        }
        let mut changed = false;
        for &(c, x) in terms {
            let c = sign * c;
            let slack = rhs - (min_sum - Self::term_min(store, c, x));
            // c·x ≤ slack
            if c > 0 {
                changed |= store.set_ub(x, floor_div(slack, c))?;
            } else {
                changed |= store.set_lb(x, ceil_div(slack, c))?;
            }
        }
        Ok(changed)
    }
}

impl Propagator for Linear {
    fn vars(&self) -> Vec<IntVar> {
        self.terms.iter().map(|(_, x)| *x).collect()
    }

    fn propagate(&self, store: &mut DomainStore) -> Result<(), Contradiction> {
        loop {
            let mut changed = Self::filter_le(store, &self.terms, self.rhs, false)?;
            if self.equality {
                changed |= Self::filter_le(store, &self.terms, -self.rhs, true)?;
            }
            if !changed {
                break;
            }
        }
        if self.equality && self.terms.iter().all(|(_, x)| store.is_bound(*x)) {
            let max_sum: i64 = self
                .terms
                .iter()
                .map(|&(c, x)| Self::term_max(store, c, x))
                .sum();
            if max_sum != self.rhs {
                return Err(Contradiction);
            }
        }
        Ok(())
    }
}

/// `b ⇔ (x = value)` where `b` is a boolean.
#[derive(Debug, Clone)]
pub struct ReifEqConst {
    b: IntVar,
    x: IntVar,
    value: i64,
}

impl ReifEqConst {
    pub fn new(b: IntVar, x: IntVar, value: i64) -> Self {
        Self { b, x, value }
    }
}

impl Propagator for ReifEqConst {
    fn vars(&self) -> Vec<IntVar> {
        vec![self.b, self.x]
    }

    fn propagate(&self, store: &mut DomainStore) -> Result<(), Contradiction> {
        match store.value(self.b) {
            Some(1) => {
                store.instantiate(self.x, self.value)?;
            }
            Some(_) => {
                store.remove(self.x, self.value)?;
                if store.value(self.x) == Some(self.value) {
                    return Err(Contradiction);
                }
            }
            None => {
                if !store.contains(self.x, self.value) {
                    store.instantiate(self.b, 0)?;
                } else if store.value(self.x) == Some(self.value) {
                    store.instantiate(self.b, 1)?;
                }
            }
        }
        Ok(())
    }
}

/// `result = cond ? if_true : if_false` where `cond` is a boolean.
#[derive(Debug, Clone)]
pub struct Select {
    cond: IntVar,
    if_false: IntVar,
    if_true: IntVar,
    result: IntVar,
}

impl Select {
    pub fn new(cond: IntVar, if_false: IntVar, if_true: IntVar, result: IntVar) -> Self {
        Self {
            cond,
            if_false,
            if_true,
            result,
        }
    }

    fn equal(store: &mut DomainStore, a: IntVar, b: IntVar) -> Result<(), Contradiction> {
        loop {
            let mut changed = store.set_lb(a, store.lb(b))?;
            changed |= store.set_ub(a, store.ub(b))?;
            changed |= store.set_lb(b, store.lb(a))?;
            changed |= store.set_ub(b, store.ub(a))?;
            if !changed {
                return Ok(());
            }
        }
    }

    fn disjoint(store: &DomainStore, a: IntVar, b: IntVar) -> bool {
        store.ub(a) < store.lb(b) || store.ub(b) < store.lb(a)
    }
}

impl Propagator for Select {
    fn vars(&self) -> Vec<IntVar> {
        vec![self.cond, self.if_false, self.if_true, self.result]
    }

    fn propagate(&self, store: &mut DomainStore) -> Result<(), Contradiction> {
        if !store.is_bound(self.cond) {
            if Self::disjoint(store, self.result, self.if_true) {
                store.instantiate(self.cond, 0)?;
            } else if Self::disjoint(store, self.result, self.if_false) {
                store.instantiate(self.cond, 1)?;
            }
        }
        match store.value(self.cond) {
            Some(1) => Self::equal(store, self.result, self.if_true),
            Some(_) => Self::equal(store, self.result, self.if_false),
            None => {
                let lo = store.lb(self.if_false).min(store.lb(self.if_true));
                let hi = store.ub(self.if_false).max(store.ub(self.if_true));
                store.set_lb(self.result, lo)?;
                store.set_ub(self.result, hi)?;
                Ok(())
            }
        }
    }
}

/// At most `max` of the variables take a value in `values`.
#[derive(Debug, Clone)]
pub struct AtMostInSet {
    vars: Vec<IntVar>,
    values: BTreeSet<i64>,
    max: usize,
}

impl AtMostInSet {
    pub fn new(vars: Vec<IntVar>, values: BTreeSet<i64>, max: usize) -> Self {
        Self { vars, values, max }
    }
}

impl Propagator for AtMostInSet {
    fn vars(&self) -> Vec<IntVar> {
        self.vars.clone()
    }

    fn propagate(&self, store: &mut DomainStore) -> Result<(), Contradiction> {
        let sure = self
            .vars
            .iter()
            .filter(|v| store.value(**v).is_some_and(|x| self.values.contains(&x)))
            .count();
        if sure > self.max {
            return Err(Contradiction);
        }
        if sure == self.max {
            for &v in &self.vars {
                if !store.is_bound(v) {
                    store.retain(v, |x| !self.values.contains(&x))?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::Csp;

    #[test]
    fn test_division_helpers() {
        assert_eq!(floor_div(7, 2), 3);
        assert_eq!(floor_div(-7, 2), -4);
        assert_eq!(ceil_div(7, 2), 4);
        assert_eq!(ceil_div(-7, 2), -3);
        assert_eq!(ceil_div(7, -2), -3);
    }

    #[test]
    fn test_linear_le() {
        let mut csp = Csp::new();
        let x = csp.int_var("x", 0, 10);
        let y = csp.int_var("y", 3, 10);
        // x - y <= -2, so x <= y - 2
        csp.post(Linear::leq_offset(x, y, -2));
        csp.propagate().unwrap();
        assert_eq!(csp.store().ub(x), 8);
        assert_eq!(csp.store().lb(y), 3);

        csp.store_mut().set_lb(x, 6).unwrap();
        csp.propagate().unwrap();
        assert_eq!(csp.store().lb(y), 8);
    }

    #[test]
    fn test_linear_eq() {
        let mut csp = Csp::new();
        let x = csp.int_var("x", 0, 5);
        let y = csp.enum_var("y", vec![0, 4]);
        csp.post(Linear::eq(vec![(1, x), (1, y)], 5));
        csp.propagate().unwrap();
        assert_eq!(csp.store().lb(x), 1);

        csp.store_mut().push_world();
        csp.store_mut().instantiate(x, 1).unwrap();
        csp.propagate().unwrap();
        assert_eq!(csp.store().value(y), Some(4));
        csp.store_mut().pop_world();

        // y would have to be 2
        csp.store_mut().instantiate(x, 3).unwrap();
        assert!(csp.propagate().is_err());
    }

    #[test]
    fn test_linear_ge_with_coefficients() {
        let mut csp = Csp::new();
        let x = csp.int_var("x", 0, 10);
        let b = csp.bool_var("b");
        // x >= 4 * b
        csp.post(Linear::ge(vec![(1, x), (-4, b)], 0));
        csp.propagate().unwrap();
        assert_eq!(csp.store().lb(x), 0);
        csp.store_mut().instantiate(b, 1).unwrap();
        csp.propagate().unwrap();
        assert_eq!(csp.store().lb(x), 4);
    }

    #[test]
    fn test_reif_eq() {
        let mut csp = Csp::new();
        let b = csp.bool_var("b");
        let x = csp.enum_var("x", vec![0, 3]);
        csp.post(ReifEqConst::new(b, x, 0));
        csp.propagate().unwrap();
        assert!(!csp.store().is_bound(b));

        csp.store_mut().push_world();
        csp.store_mut().instantiate(b, 0).unwrap();
        csp.propagate().unwrap();
        assert_eq!(csp.store().value(x), Some(3));
        csp.store_mut().pop_world();

        csp.store_mut().remove(x, 3).unwrap();
        csp.propagate().unwrap();
        assert_eq!(csp.store().value(b), Some(1));
    }

    #[test]
    fn test_select() {
        let mut csp = Csp::new();
        let c = csp.bool_var("c");
        let zero = csp.constant(0);
        let end = csp.constant(50);
        let r = csp.int_var("r", 0, 100);
        csp.post(Select::new(c, zero, end, r));
        csp.propagate().unwrap();
        assert_eq!((csp.store().lb(r), csp.store().ub(r)), (0, 50));

        csp.store_mut().set_lb(r, 1).unwrap();
        csp.propagate().unwrap();
        assert_eq!(csp.store().value(c), Some(1));
        assert_eq!(csp.store().value(r), Some(50));
    }

    #[test]
    fn test_at_most_in_set() {
        let mut csp = Csp::new();
        let a = csp.enum_var("a", vec![0, 1, 2]);
        let b = csp.enum_var("b", vec![0, 1, 2]);
        csp.post(AtMostInSet::new(vec![a, b], [0, 1].into_iter().collect(), 1));
        csp.store_mut().instantiate(a, 1).unwrap();
        csp.propagate().unwrap();
        assert_eq!(csp.store().value(b), Some(2));
    }
}
