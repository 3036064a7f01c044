//! Cell insertion: splitting an edge, a face or a volume with a new cell.
//!
//! Each insertion first reads everything it needs from the current links,
//! checks its preconditions, and only then creates darts and relinks, so a
//! rejected call leaves the map untouched. Faces mirrored through levels
//! `3..=d` are split the same way and the new darts are linked across those
//! levels. Attribute updates run once at the end: the piece containing the
//! argument dart keeps the original attributes, the other pieces receive
//! copies (`on_split`).

use std::collections::VecDeque;

use hashbrown::{HashMap, HashSet};

use crate::map_error::MapError;
use crate::topology::dart::DartHandle;
use crate::topology::map::CombinatorialMap;

/// One copy of a face reached through levels `3..=d`.
struct FaceCopy {
    /// Images of the seed darts, in the order the seeds were given.
    images: Vec<DartHandle>,
    /// Reached through an odd number of involutions: orientation reversed.
    flipped: bool,
}

fn violation(operation: &'static str, reason: &'static str) -> MapError {
    MapError::PreconditionViolation { operation, reason }
}

impl CombinatorialMap {
    /// Copies of the face containing `seeds` through levels `3..=d`, with an
    /// index from the first image of each copy to its position.
    fn face_copies(&self, seeds: &[DartHandle]) -> (Vec<FaceCopy>, HashMap<DartHandle, usize>) {
        let mut copies = vec![FaceCopy {
            images: seeds.to_vec(),
            flipped: false,
        }];
        let mut index: HashMap<DartHandle, usize> = HashMap::from([(seeds[0], 0)]);
        let mut queue = VecDeque::from([0]);
        while let Some(c) = queue.pop_front() {
            for j in 3..=self.dimension() {
                let images: Option<Vec<DartHandle>> =
                    copies[c].images.iter().map(|&x| self.beta(x, j)).collect();
                let Some(images) = images else {
                    continue;
                };
                if index.contains_key(&images[0]) {
                    continue;
                }
                index.insert(images[0], copies.len());
                queue.push_back(copies.len());
                copies.push(FaceCopy {
                    images,
                    flipped: !copies[c].flipped,
                });
            }
        }
        (copies, index)
    }

    /// Dart of `copy` starting where the `k`-th seed starts.
    fn copy_start(&self, copy: &FaceCopy, k: usize) -> Option<DartHandle> {
        if copy.flipped {
            self.beta(copy.images[k], 1)
        } else {
            Some(copy.images[k])
        }
    }

    fn finish_insertion(
        &mut self,
        operation: &'static str,
        touched: &[DartHandle],
    ) -> Result<(), MapError> {
        let candidates = self.with_neighbors(touched);
        self.update_all_attributes(None, &candidates)?;
        self.debug_check(operation);
        Ok(())
    }

    /// Splits the edge of `d` with a new vertex. Returns the new dart
    /// following `d`, which starts at the new vertex.
    pub fn insert_cell_0_in_cell_1(&mut self, d: DartHandle) -> Result<DartHandle, MapError> {
        self.require_dimension("insert_cell_0_in_cell_1", 1)?;
        let edge = self.cell_darts(d, 1)?;
        let old: Vec<(Option<DartHandle>, Vec<Option<DartHandle>>)> = edge
            .iter()
            .map(|&x| {
                let involutions = (2..=self.dimension()).map(|j| self.beta(x, j)).collect();
                (self.beta(x, 1), involutions)
            })
            .collect();

        let fresh: HashMap<DartHandle, DartHandle> =
            edge.iter().map(|&x| (x, self.create_dart())).collect();
        for (&x, (next, involutions)) in edge.iter().zip(&old) {
            let n = fresh[&x];
            self.raw_link(1, x, n);
            if let Some(next) = *next {
                self.raw_link(1, n, next);
            }
            for (y, j) in involutions.iter().zip(2..) {
                if let Some(y) = *y {
                    // x keeps the half toward its origin, paired with the
                    // new half of its old partner
                    self.raw_link(j, x, fresh[&y]);
                    self.raw_link(j, n, y);
                }
            }
        }
        log::debug!("inserted a vertex in an edge of {} darts", edge.len());
        let mut touched = edge.clone();
        touched.extend(fresh.values());
        self.finish_insertion("insert_cell_0_in_cell_1", &touched)?;
        Ok(fresh[&d])
    }

    /// Triangulates the closed face of `d` from a new central vertex.
    /// Returns the new dart going from the center to the origin of `d`.
    pub fn insert_cell_0_in_cell_2(&mut self, d: DartHandle) -> Result<DartHandle, MapError> {
        const OP: &str = "insert_cell_0_in_cell_2";
        self.require_dimension(OP, 2)?;
        let face = self.cell_darts(d, 2)?;
        if face.iter().any(|&f| self.is_free(f, 1)) {
            return Err(violation(OP, "the face is not closed"));
        }
        let next: HashMap<DartHandle, DartHandle> = face
            .iter()
            .filter_map(|&f| self.beta(f, 1).map(|n| (f, n)))
            .collect();
        let mirrors: Vec<Vec<(usize, DartHandle)>> = face
            .iter()
            .map(|&f| {
                (3..=self.dimension())
                    .filter_map(|j| self.beta(f, j).map(|m| (j, m)))
                    .collect()
            })
            .collect();

        // a_f goes from the end of f to the center, b_f from the center to
        // the origin of f
        let fresh: HashMap<DartHandle, (DartHandle, DartHandle)> = face
            .iter()
            .map(|&f| (f, (self.create_dart(), self.create_dart())))
            .collect();
        for &f in &face {
            let (a, b) = fresh[&f];
            self.raw_link(1, f, a);
            self.raw_link(1, a, b);
            self.raw_link(1, b, f);
        }
        for (&f, f_mirrors) in face.iter().zip(&mirrors) {
            let (a, b) = fresh[&f];
            self.raw_link(2, a, fresh[&next[&f]].1);
            for &(j, m) in f_mirrors {
                let (ma, mb) = fresh[&m];
                self.raw_link(j, a, mb);
                self.raw_link(j, b, ma);
            }
        }
        log::debug!("inserted a vertex in a face of {} darts", face.len());
        let mut touched = face.clone();
        touched.extend(fresh.values().flat_map(|&(a, b)| [a, b]));
        self.finish_insertion(OP, &touched)?;
        Ok(fresh[&d].1)
    }

    /// Returns true iff an edge can split the face of `d1` and `d2` between
    /// their origins. The face may be open.
    pub fn is_insertable_cell_1_in_cell_2(
        &self,
        d1: DartHandle,
        d2: DartHandle,
    ) -> Result<bool, MapError> {
        self.require_dimension("insert_cell_1_in_cell_2", 2)?;
        self.check_dart(d1)?;
        self.check_dart(d2)?;
        if d1 == d2 {
            return Ok(false);
        }
        Ok(self.darts_of_orbit(d2, &[1])?.any(|x| x == d1))
    }

    /// Splits the face of `d1` and `d2` with an edge from the origin of `d2`
    /// to the origin of `d1`. Returns the new dart preceding `d1`.
    pub fn insert_cell_1_in_cell_2(
        &mut self,
        d1: DartHandle,
        d2: DartHandle,
    ) -> Result<DartHandle, MapError> {
        const OP: &str = "insert_cell_1_in_cell_2";
        if !self.is_insertable_cell_1_in_cell_2(d1, d2)? {
            return Err(violation(OP, "darts are not distinct darts of one face"));
        }
        let (copies, index) = self.face_copies(&[d1, d2]);
        // (s1, p1, s2, p2): darts starting and ending at both endpoints; p1
        // or p2 is missing where an open face starts
        let mut ends = Vec::with_capacity(copies.len());
        for copy in &copies {
            match (self.copy_start(copy, 0), self.copy_start(copy, 1)) {
                (Some(s1), Some(s2)) => {
                    ends.push((s1, self.beta(s1, 0), s2, self.beta(s2, 0)));
                }
                _ => return Err(violation(OP, "a mirrored face is not closed")),
            }
        }
        let neighbors = self.copy_neighbors(&copies, &index);

        let fresh: Vec<(DartHandle, DartHandle)> = copies
            .iter()
            .map(|_| (self.create_dart(), self.create_dart()))
            .collect();
        for (&(s1, p1, s2, p2), &(n1, n2)) in ends.iter().zip(&fresh) {
            self.raw_link(1, n1, s1);
            self.raw_link(1, n2, s2);
            if let Some(p2) = p2 {
                self.raw_link(1, p2, n1);
            }
            if let Some(p1) = p1 {
                self.raw_link(1, p1, n2);
            }
            self.raw_link(2, n1, n2);
        }
        self.link_copies(&fresh, &neighbors);
        log::debug!("inserted an edge in {} face copies", copies.len());
        let mut touched: Vec<DartHandle> = fresh.iter().flat_map(|&(a, b)| [a, b]).collect();
        touched.extend(
            ends.iter()
                .flat_map(|&(s1, p1, s2, p2)| [Some(s1), p1, Some(s2), p2])
                .flatten(),
        );
        self.finish_insertion(OP, &touched)?;
        Ok(fresh[0].0)
    }

    /// Adds an edge hanging into the face of `d` from the origin of `d`.
    /// Returns the new dart preceding `d`, which comes back from the free end.
    pub fn insert_dangling_cell_1_in_cell_2(
        &mut self,
        d: DartHandle,
    ) -> Result<DartHandle, MapError> {
        const OP: &str = "insert_dangling_cell_1_in_cell_2";
        self.require_dimension(OP, 2)?;
        self.check_dart(d)?;
        let (copies, index) = self.face_copies(&[d]);
        let mut ends = Vec::with_capacity(copies.len());
        for copy in &copies {
            let s = self
                .copy_start(copy, 0)
                .ok_or(violation(OP, "a mirrored face is not closed"))?;
            ends.push((s, self.beta(s, 0)));
        }
        let neighbors = self.copy_neighbors(&copies, &index);

        // n1 leaves the origin of d, n2 comes back
        let fresh: Vec<(DartHandle, DartHandle)> = copies
            .iter()
            .map(|_| (self.create_dart(), self.create_dart()))
            .collect();
        for (&(s, p), &(n1, n2)) in ends.iter().zip(&fresh) {
            if let Some(p) = p {
                self.raw_link(1, p, n1);
            }
            self.raw_link(1, n1, n2);
            self.raw_link(1, n2, s);
            self.raw_link(2, n1, n2);
        }
        self.link_copies(&fresh, &neighbors);
        let mut touched: Vec<DartHandle> = fresh.iter().flat_map(|&(a, b)| [a, b]).collect();
        touched.extend(ends.iter().map(|&(s, _)| s));
        self.finish_insertion(OP, &touched)?;
        Ok(fresh[0].1)
    }

    /// For each copy, its neighbour copy at each level `3..=d`.
    fn copy_neighbors(
        &self,
        copies: &[FaceCopy],
        index: &HashMap<DartHandle, usize>,
    ) -> Vec<Vec<(usize, usize)>> {
        copies
            .iter()
            .map(|copy| {
                (3..=self.dimension())
                    .filter_map(|j| {
                        self.beta(copy.images[0], j)
                            .and_then(|m| index.get(&m))
                            .map(|&c| (j, c))
                    })
                    .collect()
            })
            .collect()
    }

    /// Mirrored copies face each other: the new edge halves swap roles.
    fn link_copies(&mut self, fresh: &[(DartHandle, DartHandle)], neighbors: &[Vec<(usize, usize)>]) {
        for (&(n1, n2), copy_neighbors) in fresh.iter().zip(neighbors) {
            for &(j, c) in copy_neighbors {
                let (m1, m2) = fresh[c];
                self.raw_link(j, n1, m2);
                self.raw_link(j, n2, m1);
            }
        }
    }

    /// Returns true iff `path` is a closed path of darts around which a new
    /// face can split a volume.
    ///
    /// Consecutive darts must meet at a vertex of their volume, the path
    /// must be closed, darts must be free at levels above 3, and no dart of
    /// the path may be 2-linked to another dart of the path.
    pub fn is_insertable_cell_2_in_cell_3(&self, path: &[DartHandle]) -> Result<bool, MapError> {
        self.require_dimension("insert_cell_2_in_cell_3", 3)?;
        if path.is_empty() {
            return Ok(false);
        }
        for &l in path {
            self.check_dart(l)?;
        }
        let members: HashSet<DartHandle> = path.iter().copied().collect();
        if members.len() != path.len() {
            return Ok(false);
        }
        for &l in path {
            if (4..=self.dimension()).any(|j| !self.is_free(l, j)) {
                return Ok(false);
            }
            if self.beta(l, 2).is_some_and(|b| members.contains(&b)) {
                return Ok(false);
            }
        }
        for (k, &l) in path.iter().enumerate() {
            let following = path[(k + 1) % path.len()];
            let Some(end) = self.beta(l, 1) else {
                return Ok(false);
            };
            let same_vertex = self.darts_of_cell_in(end, 0, 2)?.any(|x| x == following);
            if !same_vertex || !self.belong_to_same_cell(l, following, 3)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Splits a volume with a new face bounded by `path`. Returns the new
    /// dart 2-linked to `path[0]`.
    pub fn insert_cell_2_in_cell_3(&mut self, path: &[DartHandle]) -> Result<DartHandle, MapError> {
        const OP: &str = "insert_cell_2_in_cell_3";
        if !self.is_insertable_cell_2_in_cell_3(path)? {
            return Err(violation(OP, "darts do not form a closed path in one volume"));
        }
        let old: Vec<Option<DartHandle>> = path.iter().map(|&l| self.beta(l, 2)).collect();
        // f1 faces the path's side of the volume, f2 the other side
        let fresh: Vec<(DartHandle, DartHandle)> = path
            .iter()
            .map(|_| (self.create_dart(), self.create_dart()))
            .collect();
        let k = path.len();
        for i in 0..k {
            let (f1, f2) = fresh[i];
            let (g1, g2) = fresh[(i + 1) % k];
            self.raw_link(2, path[i], f1);
            if let Some(b) = old[i] {
                self.raw_link(2, f2, b);
            }
            self.raw_link(3, f1, f2);
            self.raw_link(1, f2, g2);
            self.raw_link(1, g1, f1);
        }
        log::debug!("inserted a face of {} edges in a volume", k);
        let mut touched: Vec<DartHandle> = fresh.iter().flat_map(|&(a, b)| [a, b]).collect();
        touched.extend(path);
        touched.extend(old.iter().flatten());
        self.finish_insertion(OP, &touched)?;
        Ok(fresh[0].0)
    }
}
