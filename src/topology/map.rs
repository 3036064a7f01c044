//! `CombinatorialMap`: owner of darts, links, attributes and marks.
//!
//! The map is the only owner of its darts and attributes. Darts are
//! addressed through [`DartHandle`]s and attributes through
//! [`AttributeHandle`]s; both are generation-checked so a stale handle is
//! reported as unknown rather than aliasing a recycled slot.
//!
//! # Model
//! For dimension `d` every dart stores `d + 1` links. β1 is a permutation
//! (next dart of the face) whose inverse is kept in the β0 slot; β2 … βd are
//! involutions. A free slot models boundary.
//!
//! # Attribute management
//! With automatic attribute management on (the default), edit operations
//! keep one attribute per cell, fire split/merge hooks and erase attributes
//! no dart references any more. Turning it off lets bulk construction skip
//! all of this; [`CombinatorialMap::correct_invalid_attributes`] repairs the
//! map afterwards.

use std::any::type_name;
use std::cell::RefCell;
use std::rc::Rc;

use slotmap::SlotMap;

use crate::map_error::MapError;
use crate::topology::attribute::{
    AttributeArena, AttributeConfig, AttributeHandle, AttributeStore, CellAttribute, CellInfo,
    HookFn,
};
use crate::topology::dart::{Dart, DartHandle};
use crate::topology::mark::{Mark, MarkPool};

/// Construction options of a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapConfig {
    /// Dimension `d` of the map: darts carry links β0 … βd.
    pub dimension: usize,
    /// Whether edit operations keep attributes valid.
    pub automatic_attribute_management: bool,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            dimension: 3,
            automatic_attribute_management: true,
        }
    }
}

/// A combinatorial map of run-time dimension.
#[derive(Debug, Clone)]
pub struct CombinatorialMap {
    dimension: usize,
    pub(crate) darts: SlotMap<DartHandle, Dart>,
    pub(crate) attributes: Vec<Option<Box<dyn AttributeStore>>>,
    marks: RefCell<MarkPool>,
    automatic_attribute_management: bool,
}

impl Default for CombinatorialMap {
    fn default() -> Self {
        Self::with_config(MapConfig::default())
    }
}

impl CombinatorialMap {
    /// Creates an empty map of dimension `dimension` with automatic attribute management.
    pub fn new(dimension: usize) -> Self {
        Self::with_config(MapConfig {
            dimension,
            ..MapConfig::default()
        })
    }

    pub fn with_config(config: MapConfig) -> Self {
        Self {
            dimension: config.dimension,
            darts: SlotMap::with_key(),
            attributes: (0..=config.dimension).map(|_| None).collect(),
            marks: RefCell::new(MarkPool::default()),
            automatic_attribute_management: config.automatic_attribute_management,
        }
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn config(&self) -> MapConfig {
        MapConfig {
            dimension: self.dimension,
            automatic_attribute_management: self.automatic_attribute_management,
        }
    }

    // -------------------------------------------------------------------------
    // Dart store
    // -------------------------------------------------------------------------

    /// Returns true iff the map contains no dart.
    pub fn is_empty(&self) -> bool {
        self.darts.is_empty()
    }

    pub fn number_of_darts(&self) -> usize {
        self.darts.len()
    }

    /// All live darts, in store order.
    pub fn darts(&self) -> impl Iterator<Item = DartHandle> + '_ {
        self.darts.keys()
    }

    /// Returns true iff `dart` refers to a live dart of this map.
    #[inline]
    pub fn is_dart_used(&self, dart: DartHandle) -> bool {
        self.darts.contains_key(dart)
    }

    pub(crate) fn check_dart(&self, dart: DartHandle) -> Result<&Dart, MapError> {
        self.darts.get(dart).ok_or(MapError::UnknownDart(dart))
    }

    pub(crate) fn check_level(&self, level: usize) -> Result<(), MapError> {
        if level > self.dimension {
            return Err(MapError::InvalidLevel {
                level,
                dimension: self.dimension,
            });
        }
        Ok(())
    }

    pub(crate) fn require_dimension(
        &self,
        operation: &'static str,
        required: usize,
    ) -> Result<(), MapError> {
        if self.dimension < required {
            return Err(MapError::DimensionTooLow {
                operation,
                required,
                dimension: self.dimension,
            });
        }
        Ok(())
    }

    /// Creates a dart free for every level and without attributes.
    pub fn create_dart(&mut self) -> DartHandle {
        let mask = self.marks.borrow().mask();
        self.darts.insert(Dart::new(self.dimension, mask))
    }

    /// Creates a dart and attaches the given `(dimension, attribute)` pairs to it.
    pub fn create_dart_with_attributes(
        &mut self,
        attributes: &[(usize, AttributeHandle)],
    ) -> Result<DartHandle, MapError> {
        for &(dim, handle) in attributes {
            let store = self.store(dim)?;
            if !store.contains(handle) {
                return Err(MapError::UnknownAttribute { dim, handle });
            }
        }
        let dart = self.create_dart();
        for &(dim, handle) in attributes {
            self.set_dart_attribute(dart, dim, Some(handle));
        }
        Ok(dart)
    }

    /// Removes `dart` from the map.
    ///
    /// Neighbours linked to `dart` become free at the corresponding level and
    /// the attribute references of `dart` are released. An attribute
    /// represented by `dart` is handed to another dart of the cell that
    /// still references it, or left without representative.
    pub fn erase_dart(&mut self, dart: DartHandle) -> Result<(), MapError> {
        self.check_dart(dart)?;
        for dim in self.enabled_attribute_dimensions() {
            self.release_representative(dart, dim)?;
        }
        for level in 0..=self.dimension {
            self.detach(dart, level);
        }
        for dim in 0..=self.dimension {
            if self.attributes[dim].is_some() {
                self.set_dart_attribute(dart, dim, None);
            }
        }
        if let Some(removed) = self.darts.remove(dart) {
            self.marks.borrow_mut().forget_dart(removed.marks.get());
        }
        Ok(())
    }

    /// β`level`(`dart`), `None` when `dart` is `level`-free or unknown.
    #[inline]
    pub fn beta(&self, dart: DartHandle, level: usize) -> Option<DartHandle> {
        self.darts.get(dart).and_then(|d| d.beta.get(level).copied().flatten())
    }

    /// Applies β`levels[0]`, then β`levels[1]`, … stopping at the first free link.
    pub fn beta_path(&self, dart: DartHandle, levels: &[usize]) -> Option<DartHandle> {
        levels
            .iter()
            .try_fold(dart, |current, &level| self.beta(current, level))
    }

    /// Returns true iff `dart` is `level`-free.
    pub fn is_free(&self, dart: DartHandle, level: usize) -> bool {
        self.beta(dart, level).is_none()
    }

    /// Highest level at which `dart` is linked, `None` if free everywhere.
    pub fn highest_nonfree_dimension(&self, dart: DartHandle) -> Option<usize> {
        (0..=self.dimension).rev().find(|&level| !self.is_free(dart, level))
    }

    /// A dart starting at the other vertex of the edge of `dart`, if any.
    pub fn other_extremity(&self, dart: DartHandle) -> Option<DartHandle> {
        if let Some(next) = self.beta(dart, 1) {
            return Some(next);
        }
        (2..=self.dimension).find_map(|level| self.beta(dart, level))
    }

    /// Returns true iff no dart is `level`-free (`1 <= level <= dimension`).
    pub fn is_without_boundary(&self, level: usize) -> bool {
        self.darts.values().all(|d| {
            d.beta.get(level).is_some_and(|b| b.is_some())
                && (level != 1 || d.beta(0).is_some())
        })
    }

    /// Returns true iff the map has no boundary at any level.
    pub fn is_without_boundary_all(&self) -> bool {
        (1..=self.dimension).all(|level| self.is_without_boundary(level))
    }

    /// Links `d1` to `d2` at `level` without touching orbits or attributes.
    ///
    /// Level 0 sets β0(`d1`) = `d2` (and β1(`d2`) = `d1`), level 1 sets
    /// β1(`d1`) = `d2` (and β0(`d2`) = `d1`), higher levels set both
    /// directions of the involution. Previous partners at that level are
    /// detached first.
    pub fn link_beta(
        &mut self,
        level: usize,
        d1: DartHandle,
        d2: DartHandle,
    ) -> Result<(), MapError> {
        self.check_level(level)?;
        self.check_dart(d1)?;
        self.check_dart(d2)?;
        self.raw_link(level, d1, d2);
        Ok(())
    }

    /// Detaches `dart` from its `level` neighbour without touching attributes.
    pub fn unlink_beta(&mut self, level: usize, dart: DartHandle) -> Result<(), MapError> {
        self.check_level(level)?;
        self.check_dart(dart)?;
        self.detach(dart, level);
        Ok(())
    }

    pub(crate) fn raw_link(&mut self, level: usize, d1: DartHandle, d2: DartHandle) {
        self.detach(d1, level);
        match level {
            0 => {
                self.detach(d2, 1);
                self.set_beta(d1, 0, Some(d2));
                self.set_beta(d2, 1, Some(d1));
            }
            1 => {
                self.detach(d2, 0);
                self.set_beta(d1, 1, Some(d2));
                self.set_beta(d2, 0, Some(d1));
            }
            _ => {
                self.detach(d2, level);
                self.set_beta(d1, level, Some(d2));
                self.set_beta(d2, level, Some(d1));
            }
        }
    }

    /// Clears β`level`(`dart`) and the matching back link of its partner.
    pub(crate) fn detach(&mut self, dart: DartHandle, level: usize) {
        let Some(partner) = self.beta(dart, level) else {
            return;
        };
        self.set_beta(dart, level, None);
        let back = match level {
            0 => 1,
            1 => 0,
            _ => level,
        };
        if self.beta(partner, back) == Some(dart) {
            self.set_beta(partner, back, None);
        }
    }

    #[inline]
    fn set_beta(&mut self, dart: DartHandle, level: usize, value: Option<DartHandle>) {
        if let Some(d) = self.darts.get_mut(dart) {
            d.beta[level] = value;
        }
    }

    /// Deletes all darts and all attributes. Marks stay reserved.
    pub fn clear(&mut self) {
        self.darts.clear();
        for store in self.attributes.iter_mut().flatten() {
            store.clear();
        }
        self.marks.borrow_mut().reset_counts();
    }

    /// Exchanges the content of two maps in constant time.
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(self, other);
    }

    // -------------------------------------------------------------------------
    // Marks
    // -------------------------------------------------------------------------

    /// Reserves a free mark; every dart is unmarked for it.
    pub fn reserve_mark(&self) -> Result<Mark, MapError> {
        self.marks.borrow_mut().reserve()
    }

    /// Alias of [`CombinatorialMap::reserve_mark`].
    pub fn get_new_mark(&self) -> Result<Mark, MapError> {
        self.reserve_mark()
    }

    /// Unmarks every dart for `mark` and returns the slot to the pool.
    pub fn free_mark(&self, mark: Mark) -> Result<(), MapError> {
        self.marks_check(mark)?;
        self.unmark_all(mark);
        self.marks.borrow_mut().release(mark)
    }

    pub(crate) fn marks_check(&self, mark: Mark) -> Result<(), MapError> {
        self.marks.borrow().check(mark)
    }

    pub fn is_reserved(&self, mark: Mark) -> bool {
        self.marks.borrow().is_reserved(mark)
    }

    /// Number of reserved marks.
    pub fn number_of_used_marks(&self) -> usize {
        self.marks.borrow().number_reserved()
    }

    /// Returns true iff `dart` is marked for the reserved `mark`.
    pub fn is_marked(&self, dart: DartHandle, mark: Mark) -> bool {
        debug_assert!(self.is_reserved(mark), "querying an unreserved mark");
        let mask = self.marks.borrow().mask_bit(mark);
        self.darts
            .get(dart)
            .is_some_and(|d| d.raw_mark(mark.index()) != mask)
    }

    pub fn mark(&self, dart: DartHandle, mark: Mark) {
        if self.is_dart_used(dart) && !self.is_marked(dart, mark) {
            self.darts[dart].flip_raw_mark(mark.index());
            let mut pool = self.marks.borrow_mut();
            let count = pool.marked(mark) + 1;
            pool.set_marked(mark, count);
        }
    }

    pub fn unmark(&self, dart: DartHandle, mark: Mark) {
        if self.is_dart_used(dart) && self.is_marked(dart, mark) {
            self.darts[dart].flip_raw_mark(mark.index());
            let mut pool = self.marks.borrow_mut();
            let count = pool.marked(mark) - 1;
            pool.set_marked(mark, count);
        }
    }

    /// Flips `mark` on every dart, in constant time.
    pub fn negate_mark(&self, mark: Mark) {
        debug_assert!(self.is_reserved(mark), "negating an unreserved mark");
        self.marks.borrow_mut().negate(mark, self.darts.len());
    }

    /// Unmarks every dart for `mark`.
    pub fn unmark_all(&self, mark: Mark) {
        let marked = self.number_of_marked_darts(mark);
        if marked == 0 {
            return;
        }
        if marked == self.darts.len() {
            self.negate_mark(mark);
            return;
        }
        let mask = self.marks.borrow().mask_bit(mark);
        for dart in self.darts.values() {
            if dart.raw_mark(mark.index()) != mask {
                dart.flip_raw_mark(mark.index());
            }
        }
        self.marks.borrow_mut().set_marked(mark, 0);
    }

    pub fn number_of_marked_darts(&self, mark: Mark) -> usize {
        self.marks.borrow().marked(mark)
    }

    pub fn number_of_unmarked_darts(&self, mark: Mark) -> usize {
        self.darts.len() - self.number_of_marked_darts(mark)
    }

    // -------------------------------------------------------------------------
    // Attribute store
    // -------------------------------------------------------------------------

    /// Enables `dim`-attributes with payload `T`.
    pub fn enable_attributes<T: CellInfo>(&mut self, dim: usize) -> Result<(), MapError> {
        self.enable_attributes_with::<T>(dim, AttributeConfig::default())
    }

    pub fn enable_attributes_with<T: CellInfo>(
        &mut self,
        dim: usize,
        config: AttributeConfig,
    ) -> Result<(), MapError> {
        let slot = self
            .attributes
            .get_mut(dim)
            .ok_or(MapError::AttributesDisabled(dim))?;
        if slot.is_some() {
            return Err(MapError::AttributesAlreadyEnabled(dim));
        }
        *slot = Some(Box::new(AttributeArena::<T>::new(config)));
        Ok(())
    }

    /// Disables `dim`-attributes, dropping all of them.
    pub fn disable_attributes(&mut self, dim: usize) -> Result<(), MapError> {
        self.store(dim)?;
        for dart in self.darts.values_mut() {
            dart.attributes[dim] = None;
        }
        self.attributes[dim] = None;
        Ok(())
    }

    pub fn are_attributes_enabled(&self, dim: usize) -> bool {
        self.attributes.get(dim).is_some_and(|s| s.is_some())
    }

    /// Dimensions with enabled attributes.
    pub fn enabled_attribute_dimensions(&self) -> Vec<usize> {
        (0..=self.dimension)
            .filter(|&dim| self.are_attributes_enabled(dim))
            .collect()
    }

    pub fn are_attributes_automatically_managed(&self) -> bool {
        self.automatic_attribute_management
    }

    pub fn set_automatic_attributes_management(&mut self, automatic: bool) {
        self.automatic_attribute_management = automatic;
    }

    pub(crate) fn store(&self, dim: usize) -> Result<&dyn AttributeStore, MapError> {
        self.attributes
            .get(dim)
            .and_then(|s| s.as_deref())
            .ok_or(MapError::AttributesDisabled(dim))
    }

    pub(crate) fn store_mut(
        &mut self,
        dim: usize,
    ) -> Result<&mut (dyn AttributeStore + 'static), MapError> {
        self.attributes
            .get_mut(dim)
            .and_then(|s| s.as_deref_mut())
            .ok_or(MapError::AttributesDisabled(dim))
    }

    /// Typed view of the `dim`-attribute arena.
    pub fn attribute_arena<T: CellInfo>(&self, dim: usize) -> Result<&AttributeArena<T>, MapError> {
        let store = self.store(dim)?;
        let stored = store.info_type_name();
        store
            .as_any()
            .downcast_ref::<AttributeArena<T>>()
            .ok_or(MapError::AttributeTypeMismatch {
                dim,
                stored,
                requested: type_name::<T>(),
            })
    }

    pub fn attribute_arena_mut<T: CellInfo>(
        &mut self,
        dim: usize,
    ) -> Result<&mut AttributeArena<T>, MapError> {
        let store = self.store_mut(dim)?;
        let stored = store.info_type_name();
        store
            .as_any_mut()
            .downcast_mut::<AttributeArena<T>>()
            .ok_or(MapError::AttributeTypeMismatch {
                dim,
                stored,
                requested: type_name::<T>(),
            })
    }

    /// Creates an unreferenced `dim`-attribute carrying `info`.
    pub fn create_attribute<T: CellInfo>(
        &mut self,
        dim: usize,
        info: T,
    ) -> Result<AttributeHandle, MapError> {
        Ok(self.attribute_arena_mut::<T>(dim)?.insert(info))
    }

    /// Erases a `dim`-attribute. It must not be referenced by any dart.
    pub fn erase_attribute(&mut self, dim: usize, handle: AttributeHandle) -> Result<(), MapError> {
        let store = self.store_mut(dim)?;
        if !store.contains(handle) {
            return Err(MapError::UnknownAttribute { dim, handle });
        }
        if store.ref_count(handle) != 0 {
            return Err(MapError::PreconditionViolation {
                operation: "erase_attribute",
                reason: "attribute still referenced by darts",
            });
        }
        store.erase(handle);
        Ok(())
    }

    pub fn is_attribute_used(&self, dim: usize, handle: AttributeHandle) -> bool {
        self.store(dim).is_ok_and(|s| s.contains(handle))
    }

    pub fn number_of_attributes(&self, dim: usize) -> Result<usize, MapError> {
        Ok(self.store(dim)?.len())
    }

    /// Handles of all `dim`-attributes.
    pub fn attributes(&self, dim: usize) -> Result<Vec<AttributeHandle>, MapError> {
        Ok(self.store(dim)?.handles())
    }

    /// Typed iteration over all `dim`-attributes.
    pub fn attributes_of<T: CellInfo>(
        &self,
        dim: usize,
    ) -> Result<impl Iterator<Item = (AttributeHandle, &CellAttribute<T>)>, MapError> {
        Ok(self.attribute_arena::<T>(dim)?.iter())
    }

    /// The `dim`-attribute of `dart`, if any.
    pub fn attribute(
        &self,
        dim: usize,
        dart: DartHandle,
    ) -> Result<Option<AttributeHandle>, MapError> {
        self.store(dim)?;
        Ok(self.check_dart(dart)?.attribute(dim))
    }

    /// Associates `handle` with the single dart `dart` (not its whole cell).
    ///
    /// With automatic management on, a previous attribute left without any
    /// referencing dart is erased.
    pub fn set_attribute(
        &mut self,
        dim: usize,
        dart: DartHandle,
        handle: Option<AttributeHandle>,
    ) -> Result<(), MapError> {
        let store = self.store(dim)?;
        if let Some(h) = handle {
            if !store.contains(h) {
                return Err(MapError::UnknownAttribute { dim, handle: h });
            }
        }
        self.check_dart(dart)?;
        self.release_representative(dart, dim)?;
        self.set_dart_attribute(dart, dim, handle);
        Ok(())
    }

    /// Associates `handle` with every dart of the `dim`-cell containing `dart`.
    pub fn set_cell_attribute(
        &mut self,
        dim: usize,
        dart: DartHandle,
        handle: AttributeHandle,
    ) -> Result<(), MapError> {
        if !self.store(dim)?.contains(handle) {
            return Err(MapError::UnknownAttribute { dim, handle });
        }
        let cell: Vec<DartHandle> = self.darts_of_cell(dart, dim)?.collect();
        for &d in &cell {
            self.set_dart_attribute(d, dim, Some(handle));
        }
        self.store_mut(dim)?.set_dart_of(handle, Some(dart));
        Ok(())
    }

    /// The representative dart stored by a `dim`-attribute.
    pub fn dart_of_attribute(
        &self,
        dim: usize,
        handle: AttributeHandle,
    ) -> Result<Option<DartHandle>, MapError> {
        let store = self.store(dim)?;
        if !store.contains(handle) {
            return Err(MapError::UnknownAttribute { dim, handle });
        }
        Ok(store.dart_of(handle))
    }

    /// Payload of the `dim`-attribute of `dart`.
    pub fn info<T: CellInfo>(&self, dim: usize, dart: DartHandle) -> Result<&T, MapError> {
        let handle = self
            .attribute(dim, dart)?
            .ok_or(MapError::MissingAttribute { dim, dart })?;
        self.info_of_attribute(dim, handle)
    }

    pub fn info_mut<T: CellInfo>(
        &mut self,
        dim: usize,
        dart: DartHandle,
    ) -> Result<&mut T, MapError> {
        let handle = self
            .attribute(dim, dart)?
            .ok_or(MapError::MissingAttribute { dim, dart })?;
        self.info_of_attribute_mut(dim, handle)
    }

    pub fn info_of_attribute<T: CellInfo>(
        &self,
        dim: usize,
        handle: AttributeHandle,
    ) -> Result<&T, MapError> {
        self.attribute_arena::<T>(dim)?
            .get(handle)
            .map(CellAttribute::info)
            .ok_or(MapError::UnknownAttribute { dim, handle })
    }

    pub fn info_of_attribute_mut<T: CellInfo>(
        &mut self,
        dim: usize,
        handle: AttributeHandle,
    ) -> Result<&mut T, MapError> {
        self.attribute_arena_mut::<T>(dim)?
            .get_mut(handle)
            .map(CellAttribute::info_mut)
            .ok_or(MapError::UnknownAttribute { dim, handle })
    }

    /// Registers a dynamic merge hook for `dim`-attributes, replacing the static one.
    pub fn set_onmerge_function<T, F>(&mut self, dim: usize, hook: F) -> Result<(), MapError>
    where
        T: CellInfo,
        F: Fn(&mut T, &mut T) + 'static,
    {
        let hook: HookFn<T> = Rc::new(hook);
        self.attribute_arena_mut::<T>(dim)?.set_on_merge(Some(hook));
        Ok(())
    }

    /// Registers a dynamic split hook for `dim`-attributes, replacing the static one.
    pub fn set_onsplit_function<T, F>(&mut self, dim: usize, hook: F) -> Result<(), MapError>
    where
        T: CellInfo,
        F: Fn(&mut T, &mut T) + 'static,
    {
        let hook: HookFn<T> = Rc::new(hook);
        self.attribute_arena_mut::<T>(dim)?.set_on_split(Some(hook));
        Ok(())
    }

    /// Falls back to the static merge hook of `T`.
    pub fn clear_onmerge_function<T: CellInfo>(&mut self, dim: usize) -> Result<(), MapError> {
        self.attribute_arena_mut::<T>(dim)?.set_on_merge(None);
        Ok(())
    }

    /// Falls back to the static split hook of `T`.
    pub fn clear_onsplit_function<T: CellInfo>(&mut self, dim: usize) -> Result<(), MapError> {
        self.attribute_arena_mut::<T>(dim)?.set_on_split(None);
        Ok(())
    }

    /// If `dart` represents its `dim`-attribute, hands that role to another
    /// dart of its cell still referencing the attribute.
    fn release_representative(&mut self, dart: DartHandle, dim: usize) -> Result<(), MapError> {
        let Some(handle) = self.check_dart(dart)?.attribute(dim) else {
            return Ok(());
        };
        let store = self.store(dim)?;
        if store.dart_of(handle) != Some(dart) || store.ref_count(handle) < 2 {
            return Ok(());
        }
        let successor = self
            .darts_of_cell(dart, dim)?
            .find(|&x| x != dart && self.darts[x].attribute(dim) == Some(handle));
        self.store_mut(dim)?.set_dart_of(handle, successor);
        Ok(())
    }

    /// Reassigns the `dim`-attribute reference of one dart, keeping
    /// reference counts and representatives in sync. `dim` must be enabled.
    pub(crate) fn set_dart_attribute(
        &mut self,
        dart: DartHandle,
        dim: usize,
        handle: Option<AttributeHandle>,
    ) {
        let Some(old) = self.darts.get(dart).map(|d| d.attribute(dim)) else {
            return;
        };
        if old == handle {
            return;
        }
        let automatic = self.automatic_attribute_management;
        let Some(store) = self.attributes.get_mut(dim).and_then(|s| s.as_deref_mut()) else {
            return;
        };
        if let Some(old) = old {
            let left = store.decrement(old);
            if store.dart_of(old) == Some(dart) {
                store.set_dart_of(old, None);
            }
            if left == 0 && automatic {
                store.erase(old);
            }
        }
        if let Some(new) = handle {
            store.increment(new);
            if store.dart_of(new).is_none() {
                store.set_dart_of(new, Some(dart));
            }
        }
        self.darts[dart].attributes[dim] = handle;
    }
}
