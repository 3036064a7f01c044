//! Attribute maintenance after a topological change.
//!
//! Edit operations change links first and then call
//! [`CombinatorialMap::update_attributes`] once per enabled dimension with
//! the darts they touched. Every cell containing one of those darts is
//! visited once:
//! - distinct attributes found inside one cell are merged into the first
//!   one met (`on_merge`), the others lose their darts;
//! - an attribute already given to another visited cell is duplicated and
//!   the copy goes to this cell (`on_split`);
//! - a cell without attribute gets a default one when the dimension was
//!   enabled with `auto_create`.
//!
//! The repair pass of `correct_invalid_attributes` runs the same routine
//! over every dart with hooks disabled.

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use crate::map_error::MapError;
use crate::topology::attribute::AttributeHandle;
use crate::topology::dart::DartHandle;
use crate::topology::map::CombinatorialMap;
use crate::topology::mark::ScopedMark;

/// What one attribute update changed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStats {
    /// Darts whose attribute reference changed.
    pub reassigned: usize,
    /// Attributes absorbed by another one of the same cell.
    pub merged: usize,
    /// Attributes copied because their cell fell apart.
    pub duplicated: usize,
    /// Default attributes attached to attribute-free cells.
    pub created: usize,
}

impl UpdateStats {
    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }

    pub(crate) fn absorb(&mut self, other: UpdateStats) {
        self.reassigned += other.reassigned;
        self.merged += other.merged;
        self.duplicated += other.duplicated;
        self.created += other.created;
    }
}

struct CellGroup {
    darts: Vec<DartHandle>,
    attributes: Vec<AttributeHandle>,
}

impl CombinatorialMap {
    /// Gather the `dim`-cells of `candidates`, each with its distinct
    /// attributes in discovery order.
    fn collect_groups(
        &self,
        dim: usize,
        candidates: &[DartHandle],
    ) -> Result<Vec<CellGroup>, MapError> {
        let covered = ScopedMark::new(self)?;
        let mut groups = Vec::new();
        for &seed in candidates {
            if !self.is_dart_used(seed) || self.is_marked(seed, *covered) {
                continue;
            }
            let darts = self.cell_darts(seed, dim)?;
            let mut attributes = Vec::new();
            for &d in &darts {
                self.mark(d, *covered);
                if let Some(h) = self.darts[d].attribute(dim) {
                    if !attributes.contains(&h) {
                        attributes.push(h);
                    }
                }
            }
            groups.push(CellGroup { darts, attributes });
        }
        Ok(groups)
    }

    /// Restore one attribute per `dim`-cell around `candidates`.
    ///
    /// Does nothing when `dim`-attributes are disabled.
    pub(crate) fn update_attributes(
        &mut self,
        dim: usize,
        candidates: &[DartHandle],
        fire_hooks: bool,
    ) -> Result<UpdateStats, MapError> {
        let mut stats = UpdateStats::default();
        if !self.are_attributes_enabled(dim) {
            return Ok(stats);
        }
        let groups = self.collect_groups(dim, candidates)?;
        let auto_create = self.store(dim)?.config().auto_create;
        let mut claimed: HashSet<AttributeHandle> = HashSet::new();

        for group in groups {
            let first_free = group.attributes.iter().copied().find(|h| !claimed.contains(h));
            let survivor = match (first_free, group.attributes.first()) {
                (Some(h), _) => h,
                (None, Some(&taken)) => {
                    let store = self.store_mut(dim)?;
                    let copy = store
                        .duplicate(taken)
                        .ok_or(MapError::UnknownAttribute { dim, handle: taken })?;
                    if fire_hooks {
                        store.fire_split(taken, copy);
                    }
                    stats.duplicated += 1;
                    copy
                }
                (None, None) if auto_create => {
                    stats.created += 1;
                    self.store_mut(dim)?.create_default()
                }
                (None, None) => continue,
            };

            for &other in &group.attributes {
                if other != survivor && !claimed.contains(&other) {
                    if fire_hooks {
                        self.store_mut(dim)?.fire_merge(survivor, other);
                    }
                    stats.merged += 1;
                }
            }

            for &d in &group.darts {
                if self.darts[d].attribute(dim) != Some(survivor) {
                    self.set_dart_attribute(d, dim, Some(survivor));
                    stats.reassigned += 1;
                }
            }
            self.store_mut(dim)?
                .set_dart_of(survivor, group.darts.first().copied());
            claimed.insert(survivor);
        }

        if !stats.is_noop() {
            log::trace!("{}-attributes updated: {:?}", dim, stats);
        }
        Ok(stats)
    }

    /// [`Self::update_attributes`] for every enabled dimension except `skip`.
    pub(crate) fn update_all_attributes(
        &mut self,
        skip: Option<usize>,
        candidates: &[DartHandle],
    ) -> Result<UpdateStats, MapError> {
        let mut stats = UpdateStats::default();
        if !self.are_attributes_automatically_managed() {
            return Ok(stats);
        }
        for dim in self.enabled_attribute_dimensions() {
            if Some(dim) != skip {
                stats.absorb(self.update_attributes(dim, candidates, true)?);
            }
        }
        Ok(stats)
    }

    /// `darts` together with their images under one and two β steps.
    ///
    /// Vertices are generated by compositions such as β1∘βj, so a piece of
    /// a split vertex may only be reachable from the modified darts in two
    /// steps.
    pub(crate) fn with_neighbors(&self, darts: &[DartHandle]) -> Vec<DartHandle> {
        let levels = self.dimension() + 1;
        let mut out = Vec::with_capacity(darts.len() * (1 + levels + levels * levels));
        for &d in darts {
            out.push(d);
            let first = out.len();
            out.extend((0..levels).filter_map(|l| self.beta(d, l)));
            for k in first..out.len() {
                let n = out[k];
                out.extend((0..levels).filter_map(|l| self.beta(n, l)));
            }
        }
        out
    }
}
