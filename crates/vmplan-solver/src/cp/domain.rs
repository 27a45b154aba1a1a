//! Integer domains.

use std::fmt;

/// Largest interval turned into an explicit value list when a value is
/// removed from its interior. Wider intervals keep their bounds only.
const MAX_ENUMERATED_WIDTH: i64 = 1 << 16;

/// Raised when a domain becomes empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contradiction;

impl fmt::Display for Contradiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "empty domain")
    }
}

/// Outcome of a domain operation.
pub type DomResult = Result<bool, Contradiction>;

/// Set of values a variable may take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Domain {
    /// Every value in `[lo, hi]`.
    Interval { lo: i64, hi: i64 },
    /// Sorted, deduplicated, non-empty list of values.
    Values(Vec<i64>),
}

impl Domain {
    pub fn interval(lo: i64, hi: i64) -> Self {
        Domain::Interval { lo, hi }
    }

    /// Builds an enumerated domain. Returns `None` for an empty set.
    pub fn values(mut vals: Vec<i64>) -> Option<Self> {
        vals.sort_unstable();
        vals.dedup();
        if vals.is_empty() {
            None
        } else {
            Some(Domain::Values(vals))
        }
    }

    pub fn lb(&self) -> i64 {
        match self {
            Domain::Interval { lo, .. } => *lo,
            Domain::Values(v) => v[0],
        }
    }

    pub fn ub(&self) -> i64 {
        match self {
            Domain::Interval { hi, .. } => *hi,
            Domain::Values(v) => v[v.len() - 1],
        }
    }

    pub fn size(&self) -> u64 {
        match self {
            Domain::Interval { lo, hi } => (hi - lo + 1) as u64,
            Domain::Values(v) => v.len() as u64,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.lb() == self.ub()
    }

    pub fn contains(&self, x: i64) -> bool {
        match self {
            Domain::Interval { lo, hi } => *lo <= x && x <= *hi,
            Domain::Values(v) => v.binary_search(&x).is_ok(),
        }
    }

    /// Smallest value strictly greater than `x`, if any.
    pub fn next_value(&self, x: i64) -> Option<i64> {
        match self {
            Domain::Interval { lo, hi } => {
                let n = (x + 1).max(*lo);
                (n <= *hi).then_some(n)
            }
            Domain::Values(v) => {
                let i = v.partition_point(|&e| e <= x);
                v.get(i).copied()
            }
        }
    }

    /// Iterates over the values in increasing order.
    pub fn iter(&self) -> Box<dyn Iterator<Item = i64> + '_> {
        match self {
            Domain::Interval { lo, hi } => Box::new(*lo..=*hi),
            Domain::Values(v) => Box::new(v.iter().copied()),
        }
    }

    /// Removes every value below `x`. Returns whether the domain changed.
    pub fn set_lb(&mut self, x: i64) -> DomResult {
        if x <= self.lb() {
            return Ok(false);
        }
        if x > self.ub() {
            return Err(Contradiction);
        }
        match self {
            Domain::Interval { lo, .. } => *lo = x,
            Domain::Values(v) => {
                let i = v.partition_point(|&e| e < x);
                v.drain(..i);
            }
        }
        Ok(true)
    }

    /// Removes every value above `x`. Returns whether the domain changed.
    pub fn set_ub(&mut self, x: i64) -> DomResult {
        if x >= self.ub() {
            return Ok(false);
        }
        if x < self.lb() {
            return Err(Contradiction);
        }
        match self {
            Domain::Interval { hi, .. } => *hi = x,
            Domain::Values(v) => {
                let i = v.partition_point(|&e| e <= x);
                v.truncate(i);
            }
        }
        Ok(true)
    }

    /// Reduces the domain to `{x}`.
    pub fn instantiate(&mut self, x: i64) -> DomResult {
        if !self.contains(x) {
            return Err(Contradiction);
        }
        if self.is_bound() {
            return Ok(false);
        }
        *self = Domain::Interval { lo: x, hi: x };
        Ok(true)
    }

    /// Whether [`Domain::remove`] can take `x` out on its own: false for
    /// the interior of very wide intervals.
    pub fn is_removable(&self, x: i64) -> bool {
        match self {
            Domain::Interval { lo, hi } => x <= *lo || x >= *hi || *hi - *lo < MAX_ENUMERATED_WIDTH,
            Domain::Values(_) => true,
        }
    }

    /// Removes `x`. A value in the interior of a very wide interval is
    /// left in place, the domain then stays bound-consistent only.
    pub fn remove(&mut self, x: i64) -> DomResult {
        if !self.contains(x) {
            return Ok(false);
        }
        if self.lb() == x {
            return self.set_lb(x + 1).map(|_| true);
        }
        if self.ub() == x {
            return self.set_ub(x - 1).map(|_| true);
        }
        match self {
            Domain::Interval { lo, hi } => {
                if *hi - *lo >= MAX_ENUMERATED_WIDTH {
                    return Ok(false);
                }
                let vals: Vec<i64> = (*lo..=*hi).filter(|&e| e != x).collect();
                *self = Domain::Values(vals);
            }
            Domain::Values(v) => {
                if let Ok(i) = v.binary_search(&x) {
                    v.remove(i);
                }
            }
        }
        Ok(true)
    }

    /// Keeps only the values accepted by `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(i64) -> bool) -> DomResult {
        let before = self.size();
        let vals: Vec<i64> = self.iter().filter(|&x| keep(x)).collect();
        if vals.is_empty() {
            return Err(Contradiction);
        }
        if vals.len() as u64 == before {
            return Ok(false);
        }
        *self = Domain::Values(vals);
        Ok(true)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::Interval { lo, hi } if lo == hi => write!(f, "{}", lo),
            Domain::Interval { lo, hi } => write!(f, "[{}, {}]", lo, hi),
            Domain::Values(v) => {
                write!(f, "{{")?;
                for (i, x) in v.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", x)?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_bounds() {
        let mut d = Domain::interval(0, 10);
        assert_eq!(d.set_lb(3), Ok(true));
        assert_eq!(d.set_lb(2), Ok(false));
        assert_eq!(d.set_ub(7), Ok(true));
        assert_eq!((d.lb(), d.ub(), d.size()), (3, 7, 5));
        assert_eq!(d.set_lb(8), Err(Contradiction));
    }

    #[test]
    fn test_remove_interior_enumerates() {
        let mut d = Domain::interval(0, 4);
        assert_eq!(d.remove(2), Ok(true));
        assert_eq!(d, Domain::Values(vec![0, 1, 3, 4]));
        assert_eq!(d.next_value(1), Some(3));
        assert_eq!(d.remove(0), Ok(true));
        assert_eq!(d.lb(), 1);
    }

    #[test]
    fn test_remove_in_wide_interval_is_ignored() {
        let mut d = Domain::interval(0, 1 << 20);
        assert!(!d.is_removable(5));
        assert_eq!(d.remove(5), Ok(false));
        assert!(d.contains(5));
        assert!(d.is_removable(0));
        assert_eq!(d.remove(0), Ok(true));
        assert_eq!(d.lb(), 1);
    }

    #[test]
    fn test_values() {
        let mut d = Domain::values(vec![5, 1, 3, 3]).unwrap();
        assert_eq!(d.size(), 3);
        assert!(!d.contains(2));
        assert_eq!(d.set_ub(4), Ok(true));
        assert_eq!(d.iter().collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(d.instantiate(2), Err(Contradiction));
        assert_eq!(d.instantiate(3), Ok(true));
        assert!(d.is_bound());
        assert_eq!(d.remove(3), Err(Contradiction));
        assert!(Domain::values(Vec::new()).is_none());
    }

    #[test]
    fn test_retain() {
        let mut d = Domain::interval(0, 5);
        assert_eq!(d.retain(|x| x % 2 == 0), Ok(true));
        assert_eq!(d.to_string(), "{0, 2, 4}");
        assert_eq!(d.retain(|_| true), Ok(false));
        assert_eq!(d.retain(|_| false), Err(Contradiction));
    }
}
