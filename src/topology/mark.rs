//! Boolean marks: a fixed pool of per-dart scratch flags.
//!
//! Each map owns `NB_MARKS` mark slots. A slot is reserved with
//! [`CombinatorialMap::reserve_mark`], used through the marking methods of the
//! map, and released with [`CombinatorialMap::free_mark`]. Every dart carries
//! one bit per slot; the pool keeps a *mask* so that negating a mark over the
//! whole map is a constant-time bit flip instead of a pass over the darts:
//! a dart is marked for slot `m` iff `bit(m) ^ mask(m)` is set.
//!
//! [`ScopedMark`] ties a reservation to a scope and releases it on drop.

use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::map_error::MapError;
use crate::topology::map::CombinatorialMap;

/// Number of boolean marks available per map.
pub const NB_MARKS: usize = 32;

// Mark bits of one dart are packed in a u32.
static_assertions::const_assert!(NB_MARKS <= u32::BITS as usize);

/// Index of a reserved mark slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Mark(usize);

impl Mark {
    /// Slot index in `0..NB_MARKS`.
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Reservation bookkeeping for the marks of one map.
#[derive(Clone, Debug, Default)]
pub(crate) struct MarkPool {
    reserved: u32,
    mask: u32,
    marked: [usize; NB_MARKS],
}

impl MarkPool {
    pub(crate) fn reserve(&mut self) -> Result<Mark, MapError> {
        let free = !self.reserved;
        if free == 0 {
            return Err(MapError::MarkPoolExhausted {
                capacity: NB_MARKS,
            });
        }
        let index = free.trailing_zeros() as usize;
        self.reserved |= 1 << index;
        self.marked[index] = 0;
        Ok(Mark(index))
    }

    pub(crate) fn release(&mut self, mark: Mark) -> Result<(), MapError> {
        self.check(mark)?;
        debug_assert_eq!(self.marked[mark.0], 0, "mark released while darts are marked");
        self.reserved &= !(1 << mark.0);
        Ok(())
    }

    #[inline]
    pub(crate) fn is_reserved(&self, mark: Mark) -> bool {
        mark.0 < NB_MARKS && self.reserved & (1 << mark.0) != 0
    }

    #[inline]
    pub(crate) fn check(&self, mark: Mark) -> Result<(), MapError> {
        if self.is_reserved(mark) {
            Ok(())
        } else {
            Err(MapError::MarkNotReserved(mark))
        }
    }

    #[inline]
    pub(crate) fn mask(&self) -> u32 {
        self.mask
    }

    #[inline]
    pub(crate) fn mask_bit(&self, mark: Mark) -> bool {
        self.mask & (1 << mark.0) != 0
    }

    /// Flip the meaning of slot `mark` for every dart at once.
    pub(crate) fn negate(&mut self, mark: Mark, number_of_darts: usize) {
        self.mask ^= 1 << mark.0;
        self.marked[mark.0] = number_of_darts - self.marked[mark.0];
    }

    #[inline]
    pub(crate) fn marked(&self, mark: Mark) -> usize {
        self.marked[mark.0]
    }

    #[inline]
    pub(crate) fn set_marked(&mut self, mark: Mark, count: usize) {
        self.marked[mark.0] = count;
    }

    /// Called when a dart carrying raw bits `bits` leaves the map.
    pub(crate) fn forget_dart(&mut self, bits: u32) {
        let marked_bits = (bits ^ self.mask) & self.reserved;
        for index in 0..NB_MARKS {
            if marked_bits & (1 << index) != 0 {
                self.marked[index] -= 1;
            }
        }
    }

    /// Every dart left the map: no reserved mark has marked darts.
    pub(crate) fn reset_counts(&mut self) {
        self.marked = [0; NB_MARKS];
    }

    pub(crate) fn number_reserved(&self) -> usize {
        self.reserved.count_ones() as usize
    }
}

/// A mark reserved for the lifetime of the guard.
///
/// On drop every dart still marked is unmarked and the slot returns to the
/// pool, so early returns and `?` never leak pool capacity.
pub struct ScopedMark<'a> {
    map: &'a CombinatorialMap,
    mark: Mark,
}

impl<'a> ScopedMark<'a> {
    pub fn new(map: &'a CombinatorialMap) -> Result<Self, MapError> {
        let mark = map.reserve_mark()?;
        Ok(Self { map, mark })
    }

    #[inline]
    pub fn mark(&self) -> Mark {
        self.mark
    }
}

impl Deref for ScopedMark<'_> {
    type Target = Mark;

    fn deref(&self) -> &Mark {
        &self.mark
    }
}

impl Drop for ScopedMark<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.map.free_mark(self.mark) {
            log::error!("failed to release scoped mark {:?}: {}", self.mark, e);
        }
    }
}
