//! Global placement and capacity propagator over every slice.
//!
//! For every node:
//! - a node offline at the end hosts no demanding slice, and a node
//!   hosting one is online at the end;
//! - demanding slices start once the hosting window is open and consuming
//!   slices end before it closes;
//! - for every resource and at every instant, the demand of the slices on
//!   the node does not exceed its capacity.
//!
//! Capacities are checked on the compulsory parts of the slices: a
//! consuming slice surely occupies `[0, lb(end))` and a placed demanding
//! slice surely occupies `[ub(start), ∞)`.

use std::collections::HashMap;

use crate::cp::{Contradiction, DomainStore, DomainView, IntVar, Propagator};
use crate::slice::{Demand, Slice};

/// What the scheduler needs to know about a node.
#[derive(Debug, Clone)]
pub struct NodeWindow {
    pub id: i64,
    /// Boolean, online at the end.
    pub state: IntVar,
    pub hosting_start: IntVar,
    pub hosting_end: IntVar,
    /// Capacity for each resource.
    pub capacity: Demand,
}

#[derive(Debug, Clone)]
struct Part {
    hoster: IntVar,
    /// End of a consuming slice, start of a demanding one.
    moment: IntVar,
    demand: Demand,
}

/// Load of a node by time segment: `(t, load)` holds over `[t, next t)`,
/// the last entry up to infinity.
type Profile = Vec<(i64, i64)>;

/// The placement and capacity propagator.
#[derive(Debug, Clone, Default)]
pub struct SliceScheduler {
    nodes: Vec<NodeWindow>,
    index: HashMap<i64, usize>,
    c_slices: Vec<Part>,
    d_slices: Vec<Part>,
    nb_resources: usize,
}

impl SliceScheduler {
    pub fn new(nodes: Vec<NodeWindow>, nb_resources: usize) -> Self {
        let index = nodes.iter().enumerate().map(|(i, n)| (n.id, i)).collect();
        Self {
            nodes,
            index,
            c_slices: Vec::new(),
            d_slices: Vec::new(),
            nb_resources,
        }
    }

    pub fn add_c_slice(&mut self, s: &Slice) {
        self.c_slices.push(Part {
            hoster: s.hoster(),
            moment: s.end(),
            demand: s.demand().iter().copied().collect(),
        });
    }

    pub fn add_d_slice(&mut self, s: &Slice) {
        self.d_slices.push(Part {
            hoster: s.hoster(),
            moment: s.start(),
            demand: s.demand().iter().copied().collect(),
        });
    }

    pub fn nb_c_slices(&self) -> usize {
        self.c_slices.len()
    }

    pub fn nb_d_slices(&self) -> usize {
        self.d_slices.len()
    }

    fn node_of(&self, store: &DomainStore, hoster: IntVar) -> Option<usize> {
        store.value(hoster).and_then(|h| self.index.get(&h).copied())
    }

    fn filter_states_and_windows(&self, store: &mut DomainStore) -> Result<(), Contradiction> {
        for d in &self.d_slices {
            if let Some(i) = self.node_of(store, d.hoster) {
                let n = &self.nodes[i];
                store.instantiate(n.state, 1)?;
                store.set_lb(d.moment, store.lb(n.hosting_start))?;
                store.set_ub(n.hosting_start, store.ub(d.moment))?;
            } else {
                let latest = store.ub(d.moment);
                let forbidden: Vec<i64> = store
                    .values(d.hoster)
                    .into_iter()
                    .filter(|h| match self.index.get(h) {
                        Some(&i) => {
                            let n = &self.nodes[i];
                            store.value(n.state) == Some(0) || latest < store.lb(n.hosting_start)
                        }
                        None => true,
                    })
                    .collect();
                for h in forbidden {
                    store.remove(d.hoster, h)?;
                }
            }
        }
        for c in &self.c_slices {
            if let Some(i) = self.node_of(store, c.hoster) {
                let n = &self.nodes[i];
                store.set_ub(c.moment, store.ub(n.hosting_end))?;
                store.set_lb(n.hosting_end, store.lb(c.moment))?;
            }
        }
        Ok(())
    }

    /// Load profile of every node for one resource.
    fn profiles(&self, store: &DomainStore, r: usize) -> Vec<Profile> {
        let mut events: Vec<Vec<(i64, i64)>> = vec![Vec::new(); self.nodes.len()];
        for c in &self.c_slices {
            let (Some(i), dem) = (self.node_of(store, c.hoster), c.demand[r]) else {
                continue;
            };
            let end = store.lb(c.moment);
            if dem != 0 && end > 0 {
                events[i].push((0, dem));
                events[i].push((end, -dem));
            }
        }
        for d in &self.d_slices {
            let (Some(i), dem) = (self.node_of(store, d.hoster), d.demand[r]) else {
                continue;
            };
            if dem != 0 {
                events[i].push((store.ub(d.moment), dem));
            }
        }
        events
            .into_iter()
            .map(|mut ev| {
                ev.sort_unstable();
                let mut profile: Profile = Vec::new();
                let mut load = 0;
                for (t, delta) in ev {
                    load += delta;
                    match profile.last_mut() {
                        Some(last) if last.0 == t => last.1 = load,
                        _ => profile.push((t, load)),
                    }
                }
                profile
            })
            .collect()
    }

    fn filter_capacities(&self, store: &mut DomainStore) -> Result<(), Contradiction> {
        for r in 0..self.nb_resources {
            let profiles = self.profiles(store, r);
            for (i, profile) in profiles.iter().enumerate() {
                let cap = self.nodes[i].capacity[r];
                if profile.iter().any(|&(_, load)| load > cap) {
                    return Err(Contradiction);
                }
            }
            for d in &self.d_slices {
                let dem = d.demand[r];
                if dem == 0 {
                    continue;
                }
                match self.node_of(store, d.hoster) {
                    Some(i) => {
                        let latest = store.ub(d.moment);
                        let cap = self.nodes[i].capacity[r];
                        if let Some(t) = last_violation_end(&profiles[i], dem, cap, latest) {
                            store.set_lb(d.moment, t)?;
                        }
                    }
                    None => {
                        let latest = store.ub(d.moment);
                        let unfit: Vec<i64> = store
                            .values(d.hoster)
                            .into_iter()
                            .filter(|h| {
                                self.index.get(h).is_some_and(|&i| {
                                    let cap = self.nodes[i].capacity[r];
                                    last_violation_end(&profiles[i], dem, cap, i64::MAX)
                                        .is_some_and(|t| t > latest)
                                })
                            })
                            .collect();
                        for h in unfit {
                            store.remove(d.hoster, h)?;
                        }
                    }
                }
            }
            for c in &self.c_slices {
                let dem = c.demand[r];
                let Some(i) = self.node_of(store, c.hoster) else {
                    continue;
                };
                if dem == 0 {
                    continue;
                }
                let cap = self.nodes[i].capacity[r];
                let from = store.lb(c.moment);
                if let Some(t) = first_violation_start(&profiles[i], dem, cap, from) {
                    store.set_ub(c.moment, t)?;
                }
            }
        }
        Ok(())
    }
}

/// End of the last segment starting before `before` where adding `dem`
/// exceeds `cap`. `i64::MAX` when that segment is unbounded.
fn last_violation_end(profile: &Profile, dem: i64, cap: i64, before: i64) -> Option<i64> {
    // a demand alone above the capacity never fits
    if dem > cap {
        return Some(i64::MAX);
    }
    let mut found = None;
    for (k, &(t, load)) in profile.iter().enumerate() {
        if t >= before {
            break;
        }
        if load + dem > cap {
            found = Some(profile.get(k + 1).map_or(i64::MAX, |next| next.0));
        }
    }
    found
}

/// Start of the first segment ending after `from` where adding `dem`
/// exceeds `cap`, clamped to `from`.
fn first_violation_start(profile: &Profile, dem: i64, cap: i64, from: i64) -> Option<i64> {
    if dem > cap {
        return Some(from);
    }
    for (k, &(t, load)) in profile.iter().enumerate() {
        let until = profile.get(k + 1).map_or(i64::MAX, |next| next.0);
        if until > from && load + dem > cap {
            return Some(t.max(from));
        }
    }
    None
}

impl Propagator for SliceScheduler {
    fn vars(&self) -> Vec<IntVar> {
        let mut vars = Vec::new();
        for n in &self.nodes {
            vars.extend([n.state, n.hosting_start, n.hosting_end]);
        }
        for p in self.c_slices.iter().chain(&self.d_slices) {
            vars.extend([p.hoster, p.moment]);
        }
        vars
    }

    fn propagate(&self, store: &mut DomainStore) -> Result<(), Contradiction> {
        self.filter_states_and_windows(store)?;
        self.filter_capacities(store)
    }
}

#[cfg(test)]
mod tests;
