//! Cell removal.
//!
//! Removing an `i`-cell (`i < d`) merges the (`i+1`)-cells around it, so the
//! darts of the cell are erased and their neighbours relinked across the
//! gap:
//! - `i == 0`: the edges through the vertex are joined, each dart ending at
//!   the vertex takes over the links of the dart that followed it;
//! - `i == 1`: the faces on both sides of the edge are joined along β1;
//! - `i >= 2`: the βi neighbours on both sides are paired through βi+1.
//!
//! Removing a `d`-cell only detaches it from its neighbours.

use hashbrown::HashSet;

use crate::map_error::MapError;
use crate::topology::dart::DartHandle;
use crate::topology::map::CombinatorialMap;

impl CombinatorialMap {
    /// Returns true iff the `i`-cell of `d` can be removed: `i` is the
    /// dimension or one less, or the cell touches at most two (`i+1`)-cells.
    pub fn is_removable(&self, i: usize, d: DartHandle) -> Result<bool, MapError> {
        self.check_dart(d)?;
        let dimension = self.dimension();
        if i > dimension {
            return Err(MapError::InvalidCellDimension {
                cell: i,
                dim: dimension,
                dimension,
            });
        }
        if i + 1 >= dimension {
            return Ok(true);
        }
        Ok(self.one_dart_per_incident_cell(d, i + 1, i)?.len() <= 2)
    }

    /// First dart met by repeatedly applying `path` from `from` that does not
    /// belong to `removed`.
    fn first_kept(
        &self,
        from: DartHandle,
        path: &[usize],
        removed: &HashSet<DartHandle>,
    ) -> Option<DartHandle> {
        let mut current = self.beta_path(from, path)?;
        for _ in 0..removed.len() {
            if !removed.contains(&current) {
                return Some(current);
            }
            current = self.beta_path(current, path)?;
        }
        (!removed.contains(&current)).then_some(current)
    }

    /// Links `(level, a, b)` restoring connectivity once `cell` is erased.
    fn removal_links(&self, i: usize, cell: &[DartHandle]) -> Vec<(usize, DartHandle, DartHandle)> {
        let removed: HashSet<DartHandle> = cell.iter().copied().collect();
        let kept = |x: &DartHandle| !removed.contains(x);
        let mut links = Vec::new();
        for &x in cell {
            match i {
                0 => {
                    let Some(p) = self.beta(x, 0).filter(kept) else {
                        continue;
                    };
                    if let Some(n) = self.first_kept(x, &[1], &removed) {
                        links.push((1, p, n));
                    }
                    for j in 2..=self.dimension() {
                        if let Some(y) = self.beta(x, j).filter(kept) {
                            if y != p {
                                links.push((j, p, y));
                            }
                        }
                    }
                }
                1 => {
                    let Some(p) = self.beta(x, 0).filter(kept) else {
                        continue;
                    };
                    if let Some(n) = self.first_kept(x, &[2, 1], &removed) {
                        links.push((1, p, n));
                    }
                }
                _ => {
                    let Some(a) = self.beta(x, i).filter(kept) else {
                        continue;
                    };
                    if let Some(b) = self.first_kept(x, &[i + 1, i], &removed) {
                        if a != b {
                            links.push((i, a, b));
                        }
                    }
                }
            }
        }
        links
    }

    /// Removes the `i`-cell of `d` and returns the number of erased darts.
    ///
    /// With automatic attribute management, (`i+1`)-cells joined by the
    /// removal keep one attribute (`on_merge`), and cells disconnected by it
    /// are given copies (`on_split`).
    pub fn remove_cell(&mut self, i: usize, d: DartHandle) -> Result<usize, MapError> {
        if !self.is_removable(i, d)? {
            return Err(MapError::PreconditionViolation {
                operation: "remove_cell",
                reason: "the cell touches more than two higher cells",
            });
        }
        let cell = self.cell_darts(d, i)?;
        let links = if i < self.dimension() {
            self.removal_links(i, &cell)
        } else {
            Vec::new()
        };
        let removed: HashSet<DartHandle> = cell.iter().copied().collect();
        let candidates: Vec<DartHandle> = self
            .with_neighbors(&cell)
            .into_iter()
            .filter(|x| !removed.contains(x))
            .collect();

        for &x in &cell {
            self.erase_dart(x)?;
        }
        for &(level, a, b) in &links {
            self.raw_link(level, a, b);
        }
        log::debug!("removed a {}-cell of {} darts", i, cell.len());
        self.update_all_attributes(None, &candidates)?;
        self.debug_check("remove_cell");
        Ok(cell.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removing_an_inserted_vertex_restores_the_edge() {
        let mut map = CombinatorialMap::new(2);
        let d = map.make_combinatorial_tetrahedron().unwrap();
        let n = map.insert_cell_0_in_cell_1(d).unwrap();
        assert!(map.is_removable(0, n).unwrap());
        assert_eq!(map.remove_cell(0, n).unwrap(), 2);
        assert_eq!(map.number_of_darts(), 12);
        assert_eq!(map.count_all_cells().unwrap(), vec![4, 6, 4, 1]);
        assert!(map.is_valid());
    }

    #[test]
    fn removing_an_inserted_edge_merges_the_faces() {
        let mut map = CombinatorialMap::new(2);
        let d1 = map.make_combinatorial_polygon(4).unwrap();
        let d2 = map.beta_path(d1, &[1, 1]).unwrap();
        let n = map.insert_cell_1_in_cell_2(d1, d2).unwrap();
        assert_eq!(map.remove_cell(1, n).unwrap(), 2);
        assert_eq!(map.darts_of_orbit(d1, &[1]).unwrap().count(), 4);
        assert!(map.is_valid());
    }

    #[test]
    fn removing_a_dangling_edge() {
        let mut map = CombinatorialMap::new(2);
        let d = map.make_combinatorial_polygon(3).unwrap();
        let n2 = map.insert_dangling_cell_1_in_cell_2(d).unwrap();
        assert_eq!(map.remove_cell(1, n2).unwrap(), 2);
        assert_eq!(map.darts_of_orbit(d, &[1]).unwrap().count(), 3);
        assert!(map.is_valid());
    }

    #[test]
    fn removing_a_face_of_a_tetrahedron_opens_it() {
        let mut map = CombinatorialMap::new(2);
        let d = map.make_combinatorial_tetrahedron().unwrap();
        assert_eq!(map.remove_cell(2, d).unwrap(), 3);
        assert_eq!(map.number_of_darts(), 9);
        assert!(!map.is_without_boundary(2));
        assert!(map.is_valid());
    }

    #[test]
    fn removing_an_inserted_face_merges_the_volumes() {
        let mut map = CombinatorialMap::new(3);
        let d = map.make_combinatorial_hexahedron().unwrap();
        let path = [
            d,
            map.beta(d, 1).unwrap(),
            map.beta_path(d, &[1, 1]).unwrap(),
            map.beta(d, 0).unwrap(),
        ];
        let f = map.insert_cell_2_in_cell_3(&path).unwrap();
        assert_eq!(map.remove_cell(2, f).unwrap(), 8);
        assert_eq!(map.number_of_cells(3).unwrap(), 1);
        assert_eq!(map.count_all_cells().unwrap(), vec![8, 12, 6, 1, 1]);
        assert!(map.is_valid());
    }

    #[test]
    fn vertex_of_degree_three_is_not_removable() {
        let mut map = CombinatorialMap::new(2);
        let d = map.make_combinatorial_tetrahedron().unwrap();
        assert!(!map.is_removable(0, d).unwrap());
        assert!(matches!(
            map.remove_cell(0, d),
            Err(MapError::PreconditionViolation { .. })
        ));
        assert_eq!(map.number_of_darts(), 12);
    }
}
