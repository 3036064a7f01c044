//! Orbit and cell traversal over a combinatorial map.
//!
//! Every traversal borrows one mark from the map's pool to remember visited
//! darts, which keeps it linear in the size of the orbit and guarantees
//! termination. The mark is released when the iterator is dropped, whether
//! it was exhausted or abandoned. Building a traversal fails with
//! [`MapError::MarkPoolExhausted`] when no mark is available.

use std::collections::VecDeque;

use crate::map_error::MapError;
use crate::topology::dart::{Dart, DartHandle};
use crate::topology::map::CombinatorialMap;
use crate::topology::mark::{Mark, ScopedMark};
use crate::topology::orbit::{OrbitSpec, Step, cell_steps, check_cell};

/// Darts reached from `dart` by one application of `step`.
fn step_neighbors(
    map: &CombinatorialMap,
    dart: DartHandle,
    step: Step,
) -> impl Iterator<Item = DartHandle> {
    let (first, second) = match step {
        Step::Permutation => (map.beta(dart, 1), map.beta(dart, 0)),
        Step::Involution(level) => (map.beta(dart, level), None),
        Step::Compose(a, b) => (map.beta_path(dart, &[a, b]), None),
    };
    first.into_iter().chain(second)
}

/// Lazy breadth-first traversal of an orbit; the seed comes first.
pub struct DartsOfOrbit<'a> {
    map: &'a CombinatorialMap,
    mark: Mark,
    steps: Vec<Step>,
    queue: VecDeque<DartHandle>,
    visited: Vec<DartHandle>,
}

impl<'a> DartsOfOrbit<'a> {
    pub(crate) fn with_steps(
        map: &'a CombinatorialMap,
        seed: DartHandle,
        steps: Vec<Step>,
    ) -> Result<Self, MapError> {
        map.check_dart(seed)?;
        let mark = map.reserve_mark()?;
        map.mark(seed, mark);
        Ok(Self {
            map,
            mark,
            steps,
            queue: VecDeque::from([seed]),
            visited: vec![seed],
        })
    }
}

impl Iterator for DartsOfOrbit<'_> {
    type Item = DartHandle;

    fn next(&mut self) -> Option<DartHandle> {
        let dart = self.queue.pop_front()?;
        for &step in &self.steps {
            for next in step_neighbors(self.map, dart, step) {
                if !self.map.is_marked(next, self.mark) {
                    self.map.mark(next, self.mark);
                    self.visited.push(next);
                    self.queue.push_back(next);
                }
            }
        }
        Some(dart)
    }
}

impl Drop for DartsOfOrbit<'_> {
    fn drop(&mut self) {
        for &dart in &self.visited {
            self.map.unmark(dart, self.mark);
        }
        if let Err(e) = self.map.free_mark(self.mark) {
            log::error!("orbit traversal failed to release {:?}: {}", self.mark, e);
        }
    }
}

/// One dart of each cell of the map, in first-discovery order.
///
/// Cells partition the darts, so a single mark both records visited cells
/// and drives the flood fill of each newly discovered cell.
pub struct OneDartPerCell<'a> {
    map: &'a CombinatorialMap,
    mark: Mark,
    steps: Vec<Step>,
    keys: slotmap::basic::Keys<'a, DartHandle, Dart>,
    stack: Vec<DartHandle>,
}

impl<'a> OneDartPerCell<'a> {
    pub(crate) fn with_steps(map: &'a CombinatorialMap, steps: Vec<Step>) -> Result<Self, MapError> {
        let mark = map.reserve_mark()?;
        Ok(Self {
            map,
            mark,
            steps,
            keys: map.darts.keys(),
            stack: Vec::new(),
        })
    }

    fn flood(&mut self, seed: DartHandle) {
        self.map.mark(seed, self.mark);
        self.stack.push(seed);
        while let Some(dart) = self.stack.pop() {
            for &step in &self.steps {
                for next in step_neighbors(self.map, dart, step) {
                    if !self.map.is_marked(next, self.mark) {
                        self.map.mark(next, self.mark);
                        self.stack.push(next);
                    }
                }
            }
        }
    }
}

impl Iterator for OneDartPerCell<'_> {
    type Item = DartHandle;

    fn next(&mut self) -> Option<DartHandle> {
        loop {
            let dart = self.keys.next()?;
            if !self.map.is_marked(dart, self.mark) {
                self.flood(dart);
                return Some(dart);
            }
        }
    }
}

impl Drop for OneDartPerCell<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.map.free_mark(self.mark) {
            log::error!("cell traversal failed to release {:?}: {}", self.mark, e);
        }
    }
}

impl CombinatorialMap {
    /// Darts of the orbit generated by `levels` around `dart`.
    ///
    /// `levels` must be strictly increasing and must not start with `0, 1`;
    /// levels 0 and 1 both follow the β1 permutation in both directions.
    pub fn darts_of_orbit(
        &self,
        dart: DartHandle,
        levels: &[usize],
    ) -> Result<DartsOfOrbit<'_>, MapError> {
        let orbit = OrbitSpec::new(levels, self.dimension())?;
        DartsOfOrbit::with_steps(self, dart, orbit.steps())
    }

    /// Darts of the `i`-cell containing `dart`; `i == dimension + 1` gives
    /// the connected component.
    pub fn darts_of_cell(&self, dart: DartHandle, i: usize) -> Result<DartsOfOrbit<'_>, MapError> {
        self.darts_of_cell_in(dart, i, self.dimension())
    }

    /// Darts of the `i`-cell containing `dart`, cells considered in dimension `dim`.
    pub fn darts_of_cell_in(
        &self,
        dart: DartHandle,
        i: usize,
        dim: usize,
    ) -> Result<DartsOfOrbit<'_>, MapError> {
        check_cell(i, dim, self.dimension())?;
        DartsOfOrbit::with_steps(self, dart, cell_steps(i, dim))
    }

    /// One dart per `i`-cell of the map.
    pub fn one_dart_per_cell(&self, i: usize) -> Result<OneDartPerCell<'_>, MapError> {
        self.one_dart_per_cell_in(i, self.dimension())
    }

    pub fn one_dart_per_cell_in(&self, i: usize, dim: usize) -> Result<OneDartPerCell<'_>, MapError> {
        check_cell(i, dim, self.dimension())?;
        OneDartPerCell::with_steps(self, cell_steps(i, dim))
    }

    /// One dart of each `i`-cell incident to the `j`-cell containing `dart`.
    /// The first element is `dart`.
    pub fn one_dart_per_incident_cell(
        &self,
        dart: DartHandle,
        i: usize,
        j: usize,
    ) -> Result<Vec<DartHandle>, MapError> {
        self.one_dart_per_incident_cell_in(dart, i, j, self.dimension())
    }

    pub fn one_dart_per_incident_cell_in(
        &self,
        dart: DartHandle,
        i: usize,
        j: usize,
        dim: usize,
    ) -> Result<Vec<DartHandle>, MapError> {
        check_cell(i, dim, self.dimension())?;
        check_cell(j, dim, self.dimension())?;
        let steps = cell_steps(i, dim);
        let seen = ScopedMark::new(self)?;
        let mut out = Vec::new();
        let mut stack = Vec::new();
        for d in self.darts_of_cell_in(dart, j, dim)? {
            if self.is_marked(d, *seen) {
                continue;
            }
            out.push(d);
            self.mark(d, *seen);
            stack.push(d);
            while let Some(x) = stack.pop() {
                for &step in &steps {
                    for y in step_neighbors(self, x, step) {
                        if !self.is_marked(y, *seen) {
                            self.mark(y, *seen);
                            stack.push(y);
                        }
                    }
                }
            }
        }
        Ok(out)
    }

    /// Returns true iff `d1` and `d2` lie in the same `i`-cell.
    pub fn belong_to_same_cell(
        &self,
        d1: DartHandle,
        d2: DartHandle,
        i: usize,
    ) -> Result<bool, MapError> {
        self.check_dart(d2)?;
        Ok(self.darts_of_cell(d1, i)?.any(|d| d == d2))
    }

    /// Number of `i`-cells (`i == dimension + 1` counts connected components).
    pub fn number_of_cells(&self, i: usize) -> Result<usize, MapError> {
        Ok(self.one_dart_per_cell(i)?.count())
    }

    /// Number of `i`-cells for every `i` in `0..=dimension + 1`.
    pub fn count_all_cells(&self) -> Result<Vec<usize>, MapError> {
        (0..=self.dimension() + 1)
            .map(|i| self.number_of_cells(i))
            .collect()
    }

    /// Marks every dart of the `i`-cell of `dart` with `mark`.
    pub fn mark_cell(&self, dart: DartHandle, i: usize, mark: Mark) -> Result<(), MapError> {
        self.marks_check(mark)?;
        for d in self.darts_of_cell(dart, i)? {
            self.mark(d, mark);
        }
        Ok(())
    }

    pub fn unmark_cell(&self, dart: DartHandle, i: usize, mark: Mark) -> Result<(), MapError> {
        self.marks_check(mark)?;
        for d in self.darts_of_cell(dart, i)? {
            self.unmark(d, mark);
        }
        Ok(())
    }

    pub(crate) fn cell_darts(&self, dart: DartHandle, i: usize) -> Result<Vec<DartHandle>, MapError> {
        Ok(self.darts_of_cell(dart, i)?.collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle(map: &mut CombinatorialMap) -> [DartHandle; 3] {
        let a = map.create_dart();
        let b = map.create_dart();
        let c = map.create_dart();
        map.link_beta(1, a, b).unwrap();
        map.link_beta(1, b, c).unwrap();
        map.link_beta(1, c, a).unwrap();
        [a, b, c]
    }

    #[test]
    fn orbit_starts_with_seed_and_visits_each_dart_once() {
        let mut map = CombinatorialMap::new(2);
        let [a, b, c] = triangle(&mut map);
        let orbit: Vec<_> = map.darts_of_orbit(b, &[1]).unwrap().collect();
        assert_eq!(orbit[0], b);
        assert_eq!(orbit.len(), 3);
        assert!(orbit.contains(&a) && orbit.contains(&c));
    }

    #[test]
    fn open_path_is_walked_in_both_directions() {
        let mut map = CombinatorialMap::new(1);
        let a = map.create_dart();
        let b = map.create_dart();
        let c = map.create_dart();
        map.link_beta(1, a, b).unwrap();
        map.link_beta(1, b, c).unwrap();
        assert_eq!(map.darts_of_orbit(c, &[1]).unwrap().count(), 3);
    }

    #[test]
    fn traversal_releases_its_mark_when_abandoned() {
        let mut map = CombinatorialMap::new(2);
        let [a, ..] = triangle(&mut map);
        {
            let mut it = map.darts_of_cell(a, 2).unwrap();
            it.next();
            assert_eq!(map.number_of_used_marks(), 1);
        }
        assert_eq!(map.number_of_used_marks(), 0);
    }

    #[test]
    fn invalid_orbit_is_rejected_before_reserving() {
        let mut map = CombinatorialMap::new(2);
        let [a, ..] = triangle(&mut map);
        assert!(map.darts_of_orbit(a, &[0, 1]).is_err());
        assert_eq!(map.number_of_used_marks(), 0);
    }

    #[test]
    fn one_dart_per_cell_counts() {
        let mut map = CombinatorialMap::new(2);
        triangle(&mut map);
        triangle(&mut map);
        assert_eq!(map.number_of_cells(2).unwrap(), 2);
        assert_eq!(map.number_of_cells(3).unwrap(), 2);
        // free triangles: every dart is its own edge
        assert_eq!(map.number_of_cells(1).unwrap(), 6);
        assert_eq!(map.number_of_used_marks(), 0);
    }

    #[test]
    fn mark_cell_marks_the_whole_face() {
        let mut map = CombinatorialMap::new(2);
        let [a, b, c] = triangle(&mut map);
        let other = map.create_dart();
        let m = map.reserve_mark().unwrap();
        map.mark_cell(b, 2, m).unwrap();
        assert!([a, b, c].iter().all(|&d| map.is_marked(d, m)));
        assert!(!map.is_marked(other, m));
        map.unmark_cell(a, 2, m).unwrap();
        assert_eq!(map.number_of_marked_darts(m), 0);
        map.free_mark(m).unwrap();
        assert_eq!(map.mark_cell(a, 2, m), Err(MapError::MarkNotReserved(m)));
    }

    #[test]
    fn exhausted_pool_fails_traversal() {
        let mut map = CombinatorialMap::new(2);
        let [a, ..] = triangle(&mut map);
        let held: Vec<_> = std::iter::from_fn(|| map.reserve_mark().ok()).collect();
        assert!(matches!(
            map.darts_of_cell(a, 2),
            Err(MapError::MarkPoolExhausted { .. })
        ));
        map.free_mark(held[0]).unwrap();
        assert_eq!(map.darts_of_cell(a, 2).unwrap().count(), 3);
    }
}
