//! Host selection for the VMs.

use std::collections::HashMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::cp::{DomainStore, DomainView, IntVar, ValueSelector};

/// Picks a host for a VM.
///
/// The current host wins when it is still possible. Otherwise, with
/// ranked buckets, a random host of the first bucket holding a possible
/// host; without them, a random possible host. The generator is seeded,
/// so a given seed always leads to the same choices.
///
/// # Example
///
/// ```
/// use vmplan_solver::cp::{Csp, ValueSelector};
/// use vmplan_solver::RandomVmPlacement;
///
/// let mut csp = Csp::new();
/// let h = csp.enum_var("hoster", vec![0, 1, 2, 3]);
/// let mut sel = RandomVmPlacement::new(7).with_preferred(h, 2);
/// assert_eq!(sel.select(csp.store(), h), 2);
///
/// let mut ranked = RandomVmPlacement::new(7).with_buckets(vec![vec![9], vec![1, 3]]);
/// let v = ranked.select(csp.store(), h);
/// assert!(v == 1 || v == 3);
/// ```
#[derive(Debug, Clone)]
pub struct RandomVmPlacement {
    preferred: HashMap<IntVar, i64>,
    buckets: Vec<Vec<i64>>,
    rng: ChaCha8Rng,
}

impl RandomVmPlacement {
    pub fn new(seed: u64) -> Self {
        Self {
            preferred: HashMap::new(),
            buckets: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Sets the host to keep for a hoster variable.
    pub fn with_preferred(mut self, hoster: IntVar, node: i64) -> Self {
        self.preferred.insert(hoster, node);
        self
    }

    pub fn prefer(&mut self, hoster: IntVar, node: i64) {
        self.preferred.insert(hoster, node);
    }

    /// Node ids by decreasing preference.
    pub fn with_buckets(mut self, buckets: Vec<Vec<i64>>) -> Self {
        self.buckets = buckets;
        self
    }

    fn pick(&mut self, values: &[i64]) -> Option<i64> {
        if values.is_empty() {
            return None;
        }
        Some(values[self.rng.random_range(0..values.len())])
    }
}

impl ValueSelector for RandomVmPlacement {
    fn select(&mut self, store: &DomainStore, v: IntVar) -> i64 {
        if let Some(&current) = self.preferred.get(&v) {
            if store.contains(v, current) {
                return current;
            }
        }
        let ranked = self.buckets.iter().find_map(|b| {
            let possible: Vec<i64> = b.iter().copied().filter(|x| store.contains(v, *x)).collect();
            (!possible.is_empty()).then_some(possible)
        });
        if let Some(possible) = ranked {
            if let Some(x) = self.pick(&possible) {
                return x;
            }
        }
        let values = store.values(v);
        self.pick(&values).unwrap_or_else(|| store.lb(v))
    }
}
