//! Canonical primitives built from fresh darts.
//!
//! Primitives are linked directly (fresh darts are always sewable) and the
//! attribute update runs once at the end, so with `auto_create` every new
//! cell receives exactly one default attribute and no hook fires.

use hashbrown::HashMap;
use itertools::Itertools;

use crate::map_error::MapError;
use crate::topology::dart::DartHandle;
use crate::topology::map::CombinatorialMap;

/// Faces of a tetrahedron on vertices `0..4`, oriented outwards.
const TETRAHEDRON: [&[usize]; 4] = [&[0, 2, 1], &[0, 1, 3], &[1, 2, 3], &[0, 3, 2]];

/// Faces of a hexahedron: bottom `0..4`, top `4..8` with `4` above `0`.
const HEXAHEDRON: [&[usize]; 6] = [
    &[0, 3, 2, 1],
    &[4, 5, 6, 7],
    &[0, 1, 5, 4],
    &[1, 2, 6, 5],
    &[2, 3, 7, 6],
    &[3, 0, 4, 7],
];

impl CombinatorialMap {
    fn closed_cycle(&mut self, lg: usize) -> Vec<DartHandle> {
        let darts: Vec<DartHandle> = (0..lg).map(|_| self.create_dart()).collect();
        for (&a, &b) in darts.iter().circular_tuple_windows() {
            self.raw_link(1, a, b);
        }
        darts
    }

    fn finish_primitive(&mut self, darts: &[DartHandle]) -> Result<DartHandle, MapError> {
        self.update_all_attributes(None, darts)?;
        self.debug_check("make primitive");
        darts.first().copied().ok_or(MapError::PreconditionViolation {
            operation: "make primitive",
            reason: "primitive without darts",
        })
    }

    /// Two darts 2-linked: an isolated edge. Returns the first dart.
    pub fn make_edge(&mut self) -> Result<DartHandle, MapError> {
        self.require_dimension("make_edge", 2)?;
        let a = self.create_dart();
        let b = self.create_dart();
        self.raw_link(2, a, b);
        log::trace!("made edge {:?}", a);
        self.finish_primitive(&[a, b])
    }

    /// A closed face of `lg` darts linked by β1. `lg` must be positive.
    pub fn make_combinatorial_polygon(&mut self, lg: usize) -> Result<DartHandle, MapError> {
        self.require_dimension("make_combinatorial_polygon", 1)?;
        if lg == 0 {
            return Err(MapError::PreconditionViolation {
                operation: "make_combinatorial_polygon",
                reason: "a polygon needs at least one dart",
            });
        }
        let darts = self.closed_cycle(lg);
        log::trace!("made {}-gon {:?}", lg, darts[0]);
        self.finish_primitive(&darts)
    }

    /// A closed surface whose faces are given as cycles of vertex ids.
    ///
    /// Every directed edge `(u, v)` must occur in exactly one face and its
    /// reverse `(v, u)` in another one; faces are 2-linked along these
    /// pairs. Returns the first dart of the first face, which goes from
    /// `faces[0][0]` to `faces[0][1]`.
    pub fn make_combinatorial_polyhedron(
        &mut self,
        faces: &[&[usize]],
    ) -> Result<DartHandle, MapError> {
        const OP: &str = "make_combinatorial_polyhedron";
        self.require_dimension(OP, 2)?;
        let edges: Vec<(usize, usize)> = faces
            .iter()
            .flat_map(|face| face.iter().copied().circular_tuple_windows())
            .collect();
        let mut index: HashMap<(usize, usize), usize> = HashMap::with_capacity(edges.len());
        for (k, &edge) in edges.iter().enumerate() {
            if index.insert(edge, k).is_some() {
                return Err(MapError::PreconditionViolation {
                    operation: OP,
                    reason: "a directed edge occurs twice",
                });
            }
        }
        if faces.iter().any(|f| f.is_empty())
            || edges.iter().any(|&(u, v)| !index.contains_key(&(v, u)))
        {
            return Err(MapError::PreconditionViolation {
                operation: OP,
                reason: "faces do not form a closed surface",
            });
        }

        let darts: Vec<DartHandle> = faces
            .iter()
            .flat_map(|face| self.closed_cycle(face.len()))
            .collect();
        for (k, &(u, v)) in edges.iter().enumerate() {
            if u < v {
                if let Some(&m) = index.get(&(v, u)) {
                    self.raw_link(2, darts[k], darts[m]);
                }
            }
        }
        log::trace!("made polyhedron with {} faces", faces.len());
        self.finish_primitive(&darts)
    }

    /// Four triangles 2-linked into a tetrahedron (12 darts).
    pub fn make_combinatorial_tetrahedron(&mut self) -> Result<DartHandle, MapError> {
        self.require_dimension("make_combinatorial_tetrahedron", 2)?;
        self.make_combinatorial_polyhedron(&TETRAHEDRON)
    }

    /// Six quadrangles 2-linked into a hexahedron (24 darts).
    pub fn make_combinatorial_hexahedron(&mut self) -> Result<DartHandle, MapError> {
        self.require_dimension("make_combinatorial_hexahedron", 2)?;
        self.make_combinatorial_polyhedron(&HEXAHEDRON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::attribute::AttributeConfig;

    #[test]
    fn polygon_is_a_closed_face() {
        let mut map = CombinatorialMap::new(2);
        let d = map.make_combinatorial_polygon(5).unwrap();
        assert_eq!(map.number_of_darts(), 5);
        assert_eq!(map.beta_path(d, &[1, 1, 1, 1, 1]), Some(d));
        assert_eq!(map.number_of_cells(2).unwrap(), 1);
        assert!(map.is_valid());
    }

    #[test]
    fn empty_polygon_is_rejected() {
        let mut map = CombinatorialMap::new(2);
        assert!(matches!(
            map.make_combinatorial_polygon(0),
            Err(MapError::PreconditionViolation { .. })
        ));
        assert!(map.is_empty());
    }

    #[test]
    fn edge_needs_dimension_two() {
        let mut map = CombinatorialMap::new(1);
        assert!(matches!(map.make_edge(), Err(MapError::DimensionTooLow { .. })));
        let mut map = CombinatorialMap::new(2);
        let d = map.make_edge().unwrap();
        assert_eq!(map.darts_of_cell(d, 1).unwrap().count(), 2);
    }

    #[test]
    fn tetrahedron_counts() {
        let mut map = CombinatorialMap::new(2);
        map.make_combinatorial_tetrahedron().unwrap();
        assert_eq!(map.count_all_cells().unwrap(), vec![4, 6, 4, 1]);
        assert!(map.is_without_boundary_all());
        assert!(map.is_valid());
    }

    #[test]
    fn open_surface_is_rejected_untouched() {
        let mut map = CombinatorialMap::new(2);
        let err = map
            .make_combinatorial_polyhedron(&[&[0, 1, 2], &[0, 2, 3]])
            .unwrap_err();
        assert!(matches!(err, MapError::PreconditionViolation { .. }));
        assert!(map.is_empty());
    }

    #[test]
    fn auto_create_gives_one_attribute_per_new_cell() {
        let mut map = CombinatorialMap::new(3);
        map.enable_attributes_with::<u32>(0, AttributeConfig::auto_create())
            .unwrap();
        map.enable_attributes_with::<u32>(2, AttributeConfig::auto_create())
            .unwrap();
        map.make_combinatorial_hexahedron().unwrap();
        assert_eq!(map.number_of_attributes(0).unwrap(), 8);
        assert_eq!(map.number_of_attributes(2).unwrap(), 6);
        assert!(map.is_valid());
    }
}
