//! Slot array - circular storage for one resolution level
//!
//! The atomic unit of storage in a ring. Each level is a fixed, power-of-two
//! array of samples plus the value most recently overwritten, so reads can
//! interpolate across the eviction boundary.

use crate::numeric::{mean, Sample};

/// Fixed-size circular slot array for one resolution level.
#[derive(Clone, Debug)]
pub struct SlotArray<T> {
    values: Vec<T>,
    evicted: T,
    mask: usize,
}

impl<T: Sample> SlotArray<T> {
    /// Create a zero-initialized array. `slot_size` must be a power of two.
    pub(crate) fn new(slot_size: usize) -> Self {
        debug_assert!(slot_size.is_power_of_two());
        Self {
            values: vec![T::zero(); slot_size],
            evicted: T::zero(),
            mask: slot_size - 1,
        }
    }

    #[inline]
    pub fn slot_size(&self) -> usize {
        self.values.len()
    }

    /// Value at a physical index.
    #[inline]
    pub fn get(&self, physical: usize) -> T {
        self.values[physical & self.mask]
    }

    /// Value `back` positions behind the write cursor (0 is the newest).
    #[inline]
    pub fn back(&self, cursor: usize, back: usize) -> T {
        self.values[cursor.wrapping_sub(back).wrapping_sub(1) & self.mask]
    }

    /// Last value overwritten by [`SlotArray::write`].
    #[inline]
    pub fn evicted(&self) -> T {
        self.evicted
    }

    /// Overwrite a physical slot, remembering the previous value.
    #[inline]
    pub fn write(&mut self, physical: usize, value: T) {
        let idx = physical & self.mask;
        self.evicted = self.values[idx];
        self.values[idx] = value;
    }

    /// Mean of the `count` newest values behind `cursor`.
    pub fn mean_back(&self, cursor: usize, count: usize) -> T {
        mean((0..count).map(|i| self.back(cursor, i)))
    }

    /// Subtract `delta` from every slot and the evicted value.
    pub fn rebase(&mut self, delta: T) {
        for v in &mut self.values {
            *v = *v - delta;
        }
        self.evicted = self.evicted - delta;
    }

    /// Overwrite a physical slot without touching the evicted value.
    #[inline]
    pub(crate) fn set_raw(&mut self, physical: usize, value: T) {
        self.values[physical & self.mask] = value;
    }

    #[inline]
    pub(crate) fn set_evicted(&mut self, value: T) {
        self.evicted = value;
    }

    /// Largest absolute stored value.
    pub fn max_abs(&self) -> T {
        self.values
            .iter()
            .map(|v| v.abs())
            .fold(self.evicted.abs(), T::max)
    }
}
