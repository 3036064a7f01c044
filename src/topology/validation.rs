//! Map validation and attribute repair.

use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};

use crate::algs::attribute_update::UpdateStats;
use crate::debug_invariants::DebugInvariants;
use crate::map_error::MapError;
use crate::topology::attribute::AttributeHandle;
use crate::topology::dart::DartHandle;
use crate::topology::map::CombinatorialMap;

/// Optional validation toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapValidationOptions {
    /// β0/β1 inverse, involutions without fixed points, no dangling links.
    pub check_links: bool,
    /// β1∘βi (i >= 3) and βi∘βj (j >= i + 2) are involutions where defined.
    pub check_compositions: bool,
    /// One attribute per cell, one cell per attribute, reference counts and
    /// representative darts.
    pub check_attributes: bool,
}

impl MapValidationOptions {
    /// Enable all checks.
    pub fn all() -> Self {
        Self {
            check_links: true,
            check_compositions: true,
            check_attributes: true,
        }
    }

    /// Links and compositions only.
    pub fn topology_only() -> Self {
        Self {
            check_attributes: false,
            ..Self::all()
        }
    }
}

impl Default for MapValidationOptions {
    fn default() -> Self {
        Self::all()
    }
}

/// Outcome of [`CombinatorialMap::correct_invalid_attributes`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairReport {
    /// Darts whose attribute reference changed.
    pub reassigned: usize,
    /// Attributes copied because they were shared by several cells.
    pub duplicated: usize,
    /// Default attributes created for attribute-free cells.
    pub created: usize,
    /// Attributes erased, absorbed or left without any dart.
    pub erased: usize,
}

impl RepairReport {
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

fn invalid(msg: String) -> MapError {
    MapError::InvalidMap(msg)
}

impl CombinatorialMap {
    /// Returns true iff every structural invariant holds.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// First violated invariant, if any.
    pub fn validate(&self) -> Result<(), MapError> {
        self.validate_with(MapValidationOptions::all())
    }

    pub fn validate_with(&self, options: MapValidationOptions) -> Result<(), MapError> {
        if options.check_links {
            self.validate_links()?;
        }
        if options.check_compositions {
            self.validate_compositions()?;
        }
        if options.check_attributes {
            for dim in self.enabled_attribute_dimensions() {
                self.validate_attributes(dim)?;
            }
        }
        Ok(())
    }

    fn validate_links(&self) -> Result<(), MapError> {
        for (d, dart) in self.darts.iter() {
            for level in 0..=self.dimension() {
                let Some(e) = dart.beta(level) else {
                    continue;
                };
                if !self.is_dart_used(e) {
                    return Err(invalid(format!("β{level}({d:?}) is not a live dart")));
                }
                let back = match level {
                    0 => 1,
                    1 => 0,
                    _ => level,
                };
                if self.beta(e, back) != Some(d) {
                    return Err(invalid(format!(
                        "β{back}(β{level}({d:?})) does not return to the dart"
                    )));
                }
                if level >= 2 && e == d {
                    return Err(invalid(format!("β{level} has a fixed point at {d:?}")));
                }
            }
        }
        Ok(())
    }

    /// `path` applied from `d` must come back to `d` whenever its first half
    /// is defined.
    fn check_composition(&self, d: DartHandle, path: [usize; 4]) -> Result<(), MapError> {
        if self.beta_path(d, &path[..2]).is_none() {
            return Ok(());
        }
        if self.beta_path(d, &path) != Some(d) {
            return Err(invalid(format!(
                "β{}∘β{} is not an involution at {d:?}",
                path[1], path[0]
            )));
        }
        Ok(())
    }

    fn validate_compositions(&self) -> Result<(), MapError> {
        let dimension = self.dimension();
        for d in self.darts() {
            for i in 3..=dimension {
                self.check_composition(d, [i, 1, i, 1])?;
            }
            for i in 2..=dimension {
                for j in i + 2..=dimension {
                    self.check_composition(d, [j, i, j, i])?;
                }
            }
        }
        Ok(())
    }

    fn validate_attributes(&self, dim: usize) -> Result<(), MapError> {
        let store = self.store(dim)?;
        let mut counts: HashMap<AttributeHandle, usize> = HashMap::new();
        for (d, dart) in self.darts.iter() {
            if let Some(h) = dart.attribute(dim) {
                if !store.contains(h) {
                    return Err(invalid(format!("{d:?} references an erased {dim}-attribute")));
                }
                *counts.entry(h).or_default() += 1;
            }
        }
        for h in store.handles() {
            let expected = counts.get(&h).copied().unwrap_or(0);
            if store.ref_count(h) != expected {
                return Err(invalid(format!(
                    "{dim}-attribute {h:?} counts {} darts, {expected} reference it",
                    store.ref_count(h)
                )));
            }
        }

        let mut owners: HashSet<AttributeHandle> = HashSet::new();
        let representatives: Vec<DartHandle> = self.one_dart_per_cell(dim)?.collect();
        for rep in representatives {
            let cell = self.cell_darts(rep, dim)?;
            let attribute = self.darts[rep].attribute(dim);
            if cell.iter().any(|&d| self.darts[d].attribute(dim) != attribute) {
                return Err(invalid(format!(
                    "the {dim}-cell of {rep:?} mixes several attributes"
                )));
            }
            let Some(h) = attribute else {
                continue;
            };
            if !owners.insert(h) {
                return Err(invalid(format!(
                    "{dim}-attribute {h:?} is shared by several cells"
                )));
            }
            if let Some(rep_dart) = store.dart_of(h) {
                if !cell.contains(&rep_dart) {
                    return Err(invalid(format!(
                        "representative of {dim}-attribute {h:?} lies outside its cell"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Runs the full validation after an edit operation when invariant
    /// checking is compiled in.
    pub(crate) fn debug_check(&self, _operation: &'static str) {
        if self.are_attributes_automatically_managed() {
            crate::debug_invariants!(
                self.validate().map_err(|e| format!("after {_operation}: {e}")),
                "CombinatorialMap"
            );
        }
    }

    /// Recomputes reference counts of `dim`-attributes from the darts and
    /// drops references to erased attributes.
    fn recount_references(&mut self, dim: usize) -> usize {
        let Some(store) = self.attributes.get_mut(dim).and_then(|s| s.as_deref_mut()) else {
            return 0;
        };
        let mut counts: HashMap<AttributeHandle, usize> = HashMap::new();
        let mut dropped = 0;
        for dart in self.darts.values_mut() {
            if let Some(h) = dart.attributes[dim] {
                if store.contains(h) {
                    *counts.entry(h).or_default() += 1;
                } else {
                    dart.attributes[dim] = None;
                    dropped += 1;
                }
            }
        }
        for h in store.handles() {
            store.set_ref_count(h, counts.get(&h).copied().unwrap_or(0));
        }
        dropped
    }

    /// Makes every enabled attribute dimension valid again.
    ///
    /// Darts are scanned in store order and each cell keeps the attribute of
    /// its first dart (in traversal order from the first dart of the cell met
    /// in store order). Attributes shared by several cells are duplicated,
    /// attribute-free cells get a default attribute when `auto_create` is set,
    /// and attributes no dart references are erased. No hook fires.
    pub fn correct_invalid_attributes(&mut self) -> Result<RepairReport, MapError> {
        let darts: Vec<DartHandle> = self.darts().collect();
        let mut report = RepairReport::default();
        for dim in self.enabled_attribute_dimensions() {
            report.reassigned += self.recount_references(dim);
            let before = self.store(dim)?.len();
            let stats: UpdateStats = self.update_attributes(dim, &darts, false)?;
            report.reassigned += stats.reassigned;
            report.duplicated += stats.duplicated;
            report.created += stats.created;

            let store = self.store_mut(dim)?;
            for h in store.handles() {
                if store.ref_count(h) == 0 {
                    store.erase(h);
                }
            }
            let after = store.len();
            report.erased += (before + stats.duplicated + stats.created).saturating_sub(after);
        }
        if !report.is_clean() {
            log::warn!("repaired invalid attributes: {:?}", report);
        }
        Ok(report)
    }
}

impl DebugInvariants for CombinatorialMap {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "CombinatorialMap");
    }

    fn validate_invariants(&self) -> Result<(), MapError> {
        self.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loop_face(map: &mut CombinatorialMap, len: usize) -> Vec<DartHandle> {
        let darts: Vec<_> = (0..len).map(|_| map.create_dart()).collect();
        for k in 0..len {
            map.link_beta(1, darts[k], darts[(k + 1) % len]).unwrap();
        }
        darts
    }

    #[test]
    fn empty_map_is_valid() {
        assert!(CombinatorialMap::new(3).is_valid());
    }

    #[test]
    fn half_link_is_reported() {
        let mut map = CombinatorialMap::new(2);
        let f = loop_face(&mut map, 2);
        map.darts[f[0]].beta[2] = Some(f[1]);
        assert!(matches!(map.validate(), Err(MapError::InvalidMap(_))));
    }

    #[test]
    fn involution_fixed_point_is_reported() {
        let mut map = CombinatorialMap::new(2);
        let a = map.create_dart();
        map.darts[a].beta[2] = Some(a);
        assert!(!map.is_valid());
        assert!(map.validate_with(MapValidationOptions { check_links: false, ..MapValidationOptions::all() }).is_ok());
    }

    #[test]
    fn mixed_cell_attributes_are_invalid_then_repaired() {
        let mut map = CombinatorialMap::new(2);
        map.set_automatic_attributes_management(false);
        map.enable_attributes::<u32>(2).unwrap();
        let f = loop_face(&mut map, 3);
        let h0 = map.create_attribute(2, 10u32).unwrap();
        let h1 = map.create_attribute(2, 20u32).unwrap();
        map.set_attribute(2, f[0], Some(h0)).unwrap();
        map.set_attribute(2, f[1], Some(h1)).unwrap();
        assert!(!map.is_valid());

        let report = map.correct_invalid_attributes().unwrap();
        assert!(map.is_valid());
        assert_eq!(report.reassigned, 2);
        assert_eq!(report.erased, 1);
        let kept = map.attribute(2, f[2]).unwrap().unwrap();
        assert_eq!(kept, map.attribute(2, f[0]).unwrap().unwrap());
        assert_eq!(map.number_of_attributes(2).unwrap(), 1);
    }

    #[test]
    fn repair_of_a_valid_map_is_clean() {
        let mut map = CombinatorialMap::new(2);
        map.enable_attributes::<u32>(2).unwrap();
        let f = loop_face(&mut map, 3);
        let h = map.create_attribute(2, 1u32).unwrap();
        map.set_cell_attribute(2, f[0], h).unwrap();
        assert!(map.is_valid());
        assert!(map.correct_invalid_attributes().unwrap().is_clean());
    }
}
