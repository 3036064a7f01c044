//! `DartHandle` and the per-dart record stored by a combinatorial map.
//!
//! A dart is the atomic oriented element of the map. For a map of dimension
//! `d` it holds `d + 1` link slots (β0 … βd), one optional attribute handle
//! per dimension, and the bit set backing the map's boolean marks.
//!
//! Handles are generation-checked `slotmap` keys: a handle stays valid while
//! other darts are erased, and a stale handle to an erased slot is detected
//! instead of silently aliasing the dart that reuses the slot.

use std::cell::Cell;

use crate::topology::attribute::AttributeHandle;

slotmap::new_key_type! {
    /// Stable, generation-checked reference to a dart of a map.
    pub struct DartHandle;
}

/// Storage record of one dart. Only reachable through the owning map.
#[derive(Clone, Debug)]
pub struct Dart {
    pub(crate) beta: Vec<Option<DartHandle>>,
    pub(crate) attributes: Vec<Option<AttributeHandle>>,
    pub(crate) marks: Cell<u32>,
}

impl Dart {
    /// A dart free for every level, without attributes, whose mark bits
    /// equal the pool mask (i.e. unmarked for every mark).
    pub(crate) fn new(dimension: usize, mask: u32) -> Self {
        Self {
            beta: vec![None; dimension + 1],
            attributes: vec![None; dimension + 1],
            marks: Cell::new(mask),
        }
    }

    #[inline]
    pub(crate) fn beta(&self, level: usize) -> Option<DartHandle> {
        self.beta[level]
    }

    #[inline]
    pub(crate) fn attribute(&self, dim: usize) -> Option<AttributeHandle> {
        self.attributes[dim]
    }

    /// Raw mark bit for slot `bit` (before applying the pool mask).
    #[inline]
    pub(crate) fn raw_mark(&self, bit: usize) -> bool {
        self.marks.get() & (1u32 << bit) != 0
    }

    #[inline]
    pub(crate) fn flip_raw_mark(&self, bit: usize) {
        self.marks.set(self.marks.get() ^ (1u32 << bit));
    }
}

#[cfg(test)]
mod layout_tests {
    use super::*;
    use static_assertions::assert_eq_size;

    // slotmap keys are a (index, version) pair of u32.
    assert_eq_size!(DartHandle, u64);
    assert_eq_size!(Option<DartHandle>, u64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_dart_is_free_everywhere() {
        let d = Dart::new(3, 0);
        assert_eq!(d.beta.len(), 4);
        assert!((0..=3).all(|i| d.beta(i).is_none()));
        assert!((0..=3).all(|i| d.attribute(i).is_none()));
    }

    #[test]
    fn raw_marks_start_at_mask() {
        let d = Dart::new(2, 0b101);
        assert!(d.raw_mark(0));
        assert!(!d.raw_mark(1));
        d.flip_raw_mark(1);
        assert!(d.raw_mark(1));
    }
}
