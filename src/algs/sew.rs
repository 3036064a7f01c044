//! Sewing and unsewing darts.
//!
//! Sewing `d1` to `d2` at level `i` links not only the two darts but every
//! pair of darts matched by a parallel walk of both sides over the levels
//! that must stay compatible with βi:
//! - `i == 1`: levels `3..=d`;
//! - `i >= 2`: levels `1..=i-2` and `i+2..=d`, the second side walking β1
//!   backwards since the sewn cells face each other.
//!
//! Level 0 is handled as level 1 with the darts swapped.

use std::collections::VecDeque;

use hashbrown::{HashMap, HashSet};

use crate::map_error::MapError;
use crate::topology::dart::DartHandle;
use crate::topology::map::CombinatorialMap;

/// Two darts linked together by one sew.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct SewPair {
    pub(crate) x: DartHandle,
    pub(crate) y: DartHandle,
    /// Reached through an odd number of involutions: for level 1 the pair
    /// is linked as β1(y) = x.
    pub(crate) flipped: bool,
}

/// Levels walked in parallel by an `i`-sew.
pub(crate) fn sew_levels(i: usize, dimension: usize) -> Vec<usize> {
    if i <= 1 {
        return (3..=dimension).collect();
    }
    (1..=i.saturating_sub(2)).chain(i + 2..=dimension).collect()
}

impl CombinatorialMap {
    /// Pairs matched by an `i`-sew of `d1` with `d2` (`i >= 1`), or `None`
    /// when the two sides have different shapes.
    pub(crate) fn sew_pairs(&self, i: usize, d1: DartHandle, d2: DartHandle) -> Option<Vec<SewPair>> {
        let levels = sew_levels(i, self.dimension());
        let mut seen: HashMap<DartHandle, DartHandle> = HashMap::new();
        let mut pairs = Vec::new();
        let mut queue = VecDeque::from([SewPair {
            x: d1,
            y: d2,
            flipped: false,
        }]);
        seen.insert(d1, d2);

        while let Some(pair) = queue.pop_front() {
            pairs.push(pair);
            let mut next = Vec::with_capacity(levels.len() + 1);
            for &l in &levels {
                if l == 1 {
                    next.push((self.beta(pair.x, 1), self.beta(pair.y, 0), pair.flipped));
                    next.push((self.beta(pair.x, 0), self.beta(pair.y, 1), pair.flipped));
                } else {
                    next.push((self.beta(pair.x, l), self.beta(pair.y, l), !pair.flipped));
                }
            }
            for (a, b, flipped) in next {
                match (a, b) {
                    (None, None) => {}
                    (Some(x), Some(y)) => match seen.get(&x) {
                        Some(&known) if known == y => {}
                        Some(_) => return None,
                        None => {
                            seen.insert(x, y);
                            queue.push_back(SewPair { x, y, flipped });
                        }
                    },
                    _ => return None,
                }
            }
        }
        Some(pairs)
    }

    fn pairs_are_sewable(&self, i: usize, pairs: &[SewPair]) -> bool {
        if i == 1 {
            let mut from = HashSet::new();
            let mut to = HashSet::new();
            return pairs.iter().all(|p| {
                let (a, b) = if p.flipped { (p.y, p.x) } else { (p.x, p.y) };
                self.is_free(a, 1) && self.is_free(b, 0) && from.insert(a) && to.insert(b)
            });
        }
        let mut partner: HashMap<DartHandle, DartHandle> = HashMap::new();
        pairs.iter().all(|p| {
            p.x != p.y
                && self.is_free(p.x, i)
                && self.is_free(p.y, i)
                && *partner.entry(p.x).or_insert(p.y) == p.y
                && *partner.entry(p.y).or_insert(p.x) == p.x
        })
    }

    /// Returns true iff `d1` can be `i`-sewn to `d2` keeping the map valid.
    pub fn is_sewable(&self, i: usize, d1: DartHandle, d2: DartHandle) -> Result<bool, MapError> {
        self.check_level(i)?;
        self.check_dart(d1)?;
        self.check_dart(d2)?;
        let (i, d1, d2) = if i == 0 { (1, d2, d1) } else { (i, d1, d2) };
        Ok(self
            .sew_pairs(i, d1, d2)
            .is_some_and(|pairs| self.pairs_are_sewable(i, &pairs)))
    }

    /// Sews `d1` to `d2` at level `i`.
    ///
    /// With automatic attribute management, cells merged by the sew end up
    /// with one attribute; `on_merge` fires once per pair of merged
    /// attributes.
    pub fn sew(&mut self, i: usize, d1: DartHandle, d2: DartHandle) -> Result<(), MapError> {
        if !self.is_sewable(i, d1, d2)? {
            return Err(MapError::PreconditionViolation {
                operation: "sew",
                reason: "darts are not sewable",
            });
        }
        let (i, d1, d2) = if i == 0 { (1, d2, d1) } else { (i, d1, d2) };
        let pairs = self.sew_pairs(i, d1, d2).unwrap_or_default();
        let mut touched = Vec::with_capacity(2 * pairs.len());
        for p in &pairs {
            match (i, p.flipped) {
                (1, false) => self.raw_link(1, p.x, p.y),
                (1, true) => self.raw_link(1, p.y, p.x),
                _ => self.raw_link(i, p.x, p.y),
            }
            touched.push(p.x);
            touched.push(p.y);
        }
        log::debug!("{}-sew linked {} dart pairs", i, pairs.len());
        let candidates = self.with_neighbors(&touched);
        self.update_all_attributes(Some(i), &candidates)?;
        self.debug_check("sew");
        Ok(())
    }

    /// Sews `d1` to `d2` at level `i` touching links only.
    pub fn topo_sew(&mut self, i: usize, d1: DartHandle, d2: DartHandle) -> Result<(), MapError> {
        let managed = self.are_attributes_automatically_managed();
        self.set_automatic_attributes_management(false);
        let result = self.sew(i, d1, d2);
        self.set_automatic_attributes_management(managed);
        result
    }

    /// Darts unlinked by an `i`-unsew of `d`, with the level to clear on each.
    fn unsew_darts(&self, i: usize, d: DartHandle) -> Vec<(DartHandle, usize)> {
        let levels = sew_levels(i, self.dimension());
        let mut seen: HashSet<DartHandle> = HashSet::from([d]);
        let mut queue = VecDeque::from([(d, false)]);
        let mut out = Vec::new();
        while let Some((x, flipped)) = queue.pop_front() {
            out.push((x, if i == 1 && flipped { 0 } else { i }));
            for &l in &levels {
                let steps: &[(usize, bool)] = if l == 1 {
                    &[(1, false), (0, false)]
                } else {
                    &[(l, true)]
                };
                for &(level, flips) in steps {
                    if let Some(y) = self.beta(x, level) {
                        if seen.insert(y) {
                            queue.push_back((y, flipped ^ flips));
                        }
                    }
                }
            }
        }
        out
    }

    /// Unsews `d` from its `i`-neighbour.
    ///
    /// With automatic attribute management, each cell split in two keeps its
    /// attribute on one piece and a copy on the other; `on_split` fires once
    /// per copy.
    pub fn unsew(&mut self, i: usize, d: DartHandle) -> Result<(), MapError> {
        self.check_level(i)?;
        self.check_dart(d)?;
        let (i, d) = match i {
            0 => match self.beta(d, 0) {
                Some(prev) => (1, prev),
                None => (0, d),
            },
            _ => (i, d),
        };
        if self.is_free(d, i) {
            return Err(MapError::PreconditionViolation {
                operation: "unsew",
                reason: "dart is free at this level",
            });
        }
        let unlinked = self.unsew_darts(i, d);
        let touched: Vec<DartHandle> = unlinked.iter().map(|&(x, _)| x).collect();
        let candidates = self.with_neighbors(&touched);
        for &(x, level) in &unlinked {
            self.detach(x, level);
        }
        log::debug!("{}-unsew released {} darts", i, unlinked.len());
        self.update_all_attributes(Some(i), &candidates)?;
        self.debug_check("unsew");
        Ok(())
    }

    /// Unsews `d` at level `i` touching links only.
    pub fn topo_unsew(&mut self, i: usize, d: DartHandle) -> Result<(), MapError> {
        let managed = self.are_attributes_automatically_managed();
        self.set_automatic_attributes_management(false);
        let result = self.unsew(i, d);
        self.set_automatic_attributes_management(managed);
        result
    }
}
