//! Bucket addresses and the logical-index mapping
//!
//! A logical index counts pushes backwards from the most recent one (0 is the
//! newest sample). Level 0 holds `slot_size` indices one-to-one; every higher
//! level holds `slot_size` buckets of `period = magnitude_increase^level`
//! indices each, so coverage grows geometrically with the level.

use crate::config::RingConfig;
use crate::error::{Result, RingError};
use crate::intmath::log2_pow2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A reconstructable logical position: `(level, slot, offset, period)`.
///
/// `slot` counts back from the newest bucket of `level`, `offset` is the
/// position within the `period` logical indices that slot represents.
/// `slot == slot_size` names the bucket most recently evicted from the level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BucketAddress {
    pub level: usize,
    pub slot: usize,
    pub offset: usize,
    pub period: usize,
}

impl BucketAddress {
    pub fn new(level: usize, slot: usize, offset: usize, period: usize) -> Self {
        Self {
            level,
            slot,
            offset,
            period,
        }
    }

    /// Logical index this address was derived from.
    pub fn logical_index(&self) -> usize {
        self.slot * self.period + self.offset
    }

    /// Move the address by `delta` logical positions within its level.
    ///
    /// Carries into or out of `slot` using the power-of-two period, so
    /// negative deltas borrow from the slot. Fails if the result would land
    /// before the newest position, or if the address itself is malformed.
    pub fn add_offset(self, delta: isize) -> Result<Self> {
        if !self.period.is_power_of_two() || self.offset >= self.period {
            return Err(self.out_of_range());
        }
        let total = isize::try_from(self.slot)
            .ok()
            .zip(isize::try_from(self.period).ok())
            .and_then(|(slot, period)| slot.checked_mul(period))
            .and_then(|base| base.checked_add(self.offset as isize))
            .and_then(|base| base.checked_add(delta))
            .ok_or_else(|| self.out_of_range())?;
        if total < 0 {
            return Err(RingError::AddressUnderflow);
        }
        let total = total as usize;
        Ok(Self {
            slot: total >> log2_pow2(self.period),
            offset: total & (self.period - 1),
            ..self
        })
    }

    fn out_of_range(&self) -> RingError {
        RingError::AddressOutOfRange {
            level: self.level,
            slot: self.slot,
            offset: self.offset,
            period: self.period,
        }
    }
}

/// Precomputed geometry shared by every ring of one configuration.
#[derive(Clone, Debug)]
pub struct Layout {
    level_count: usize,
    slot_size: usize,
    slot_mask: usize,
    magnitude_increase: usize,
    magnitude_log: u32,
    slot_log: u32,
    max_size: usize,
    periods: Vec<usize>,
}

impl Layout {
    /// Validate `config` and derive the geometry.
    pub fn new(config: &RingConfig) -> Result<Self> {
        config.validate()?;
        let periods = (0..config.level_count)
            .map(|i| config.period(i))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            level_count: config.level_count,
            slot_size: config.slot_size,
            slot_mask: config.slot_size - 1,
            magnitude_increase: config.magnitude_increase,
            magnitude_log: log2_pow2(config.magnitude_increase),
            slot_log: log2_pow2(config.slot_size),
            max_size: config.max_size()?,
            periods,
        })
    }

    #[inline]
    pub fn level_count(&self) -> usize {
        self.level_count
    }

    #[inline]
    pub fn slot_size(&self) -> usize {
        self.slot_size
    }

    #[inline]
    pub fn magnitude_increase(&self) -> usize {
        self.magnitude_increase
    }

    #[inline]
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Period of `level`, `None` past the coarsest level.
    #[inline]
    pub fn period(&self, level: usize) -> Option<usize> {
        self.periods.get(level).copied()
    }

    /// Period of a level known to exist.
    #[inline]
    pub(crate) fn period_at(&self, level: usize) -> usize {
        self.periods[level]
    }

    /// Period of the coarsest level; the push counter wraps at this value.
    #[inline]
    pub fn top_period(&self) -> usize {
        self.periods[self.level_count - 1]
    }

    /// Physical index of the slot `back` positions behind `cursor`.
    #[inline]
    pub fn wrap_back(&self, cursor: usize, back: usize) -> usize {
        cursor.wrapping_sub(back).wrapping_sub(1) & self.slot_mask
    }

    /// Physical index after `cursor`.
    #[inline]
    pub fn wrap_next(&self, cursor: usize) -> usize {
        (cursor + 1) & self.slot_mask
    }

    /// Map a logical index to its bucket address.
    pub fn address_of(&self, index: usize) -> Result<BucketAddress> {
        if index > self.max_size {
            return Err(RingError::IndexOutOfRange {
                index,
                max: self.max_size,
            });
        }
        let quotient = index >> self.slot_log;
        if quotient == 0 {
            return Ok(BucketAddress::new(0, index, 0, 1));
        }
        let level = (quotient.ilog2() / self.magnitude_log) as usize + 1;
        // index == max_size resolves one level past the top; it names the
        // coarsest level's evicted bucket instead.
        let level = level.min(self.level_count - 1);
        let period = self.periods[level];
        let shift = log2_pow2(period);
        Ok(BucketAddress::new(level, index >> shift, index & (period - 1), period))
    }

    /// Check that `address` names a readable bucket of this layout.
    pub fn check(&self, address: &BucketAddress) -> Result<()> {
        let in_range = address.level < self.level_count
            && address.period == self.periods[address.level]
            && address.slot <= self.slot_size
            && address.offset < address.period;
        if in_range {
            Ok(())
        } else {
            Err(address.out_of_range())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn layout(levels: usize, slots: usize, magnitude: usize) -> Layout {
        Layout::new(&RingConfig::new(levels, slots, magnitude)).unwrap()
    }

    #[test]
    fn test_add_offset_zero() {
        let index = BucketAddress::new(0, 2, 0, 4);
        assert_eq!(index.add_offset(0).unwrap(), index);
    }

    #[test]
    fn test_add_offset_forward() {
        let index = BucketAddress::new(0, 2, 0, 4);
        assert_eq!(index.add_offset(1).unwrap(), BucketAddress::new(0, 2, 1, 4));
    }

    #[test]
    fn test_add_offset_carries_into_slot() {
        let index = BucketAddress::new(0, 2, 3, 4);
        assert_eq!(index.add_offset(1).unwrap(), BucketAddress::new(0, 3, 0, 4));

        let index = BucketAddress::new(0, 2, 13, 16);
        assert_eq!(index.add_offset(3).unwrap(), BucketAddress::new(0, 3, 0, 16));
    }

    #[test]
    fn test_add_offset_backward() {
        let index = BucketAddress::new(0, 2, 1, 4);
        assert_eq!(index.add_offset(-1).unwrap(), BucketAddress::new(0, 2, 0, 4));
    }

    #[test]
    fn test_add_offset_borrows_from_slot() {
        let index = BucketAddress::new(0, 2, 0, 4);
        assert_eq!(index.add_offset(-1).unwrap(), BucketAddress::new(0, 1, 3, 4));

        let index = BucketAddress::new(0, 2, 4, 16);
        assert_eq!(index.add_offset(-5).unwrap(), BucketAddress::new(0, 1, 15, 16));
    }

    #[test]
    fn test_add_offset_underflow() {
        let index = BucketAddress::new(1, 0, 1, 2);
        assert_eq!(index.add_offset(-2), Err(RingError::AddressUnderflow));
    }

    #[test]
    fn test_add_offset_rejects_malformed_period() {
        let index = BucketAddress::new(0, 1, 0, 3);
        assert_eq!(
            index.add_offset(1),
            Err(RingError::AddressOutOfRange {
                level: 0,
                slot: 1,
                offset: 0,
                period: 3
            })
        );
        assert!(BucketAddress::new(0, 1, 0, 0).add_offset(1).is_err());
        assert!(BucketAddress::new(0, 1, 4, 4).add_offset(0).is_err());
    }

    #[test]
    fn test_add_offset_overflow_is_an_error() {
        let index = BucketAddress::new(0, usize::MAX, 0, 2);
        assert!(matches!(index.add_offset(1), Err(RingError::AddressOutOfRange { .. })));

        let index = BucketAddress::new(0, 1, 0, 1);
        assert!(matches!(index.add_offset(isize::MAX), Err(RingError::AddressOutOfRange { .. })));
    }

    #[test]
    fn test_layout_period_bounds() {
        let layout = layout(2, 4, 2);
        assert_eq!(layout.period(1), Some(2));
        assert_eq!(layout.period(2), None);
    }

    #[test]
    fn test_address_of_level_zero() {
        let layout = layout(3, 8, 2);
        for i in 0..8 {
            assert_eq!(layout.address_of(i).unwrap(), BucketAddress::new(0, i, 0, 1));
        }
    }

    #[test]
    fn test_address_of_higher_levels() {
        let layout = layout(3, 8, 2);
        // level 1 covers [8, 16), level 2 covers [16, 32)
        assert_eq!(layout.address_of(8).unwrap(), BucketAddress::new(1, 4, 0, 2));
        assert_eq!(layout.address_of(15).unwrap(), BucketAddress::new(1, 7, 1, 2));
        assert_eq!(layout.address_of(16).unwrap(), BucketAddress::new(2, 4, 0, 4));
        assert_eq!(layout.address_of(31).unwrap(), BucketAddress::new(2, 7, 3, 4));
    }

    #[test]
    fn test_address_of_max_size_names_evicted_bucket() {
        let layout = layout(3, 8, 2);
        assert_eq!(layout.address_of(32).unwrap(), BucketAddress::new(2, 8, 0, 4));
        assert!(layout.check(&layout.address_of(32).unwrap()).is_ok());

        let flat = layout_flat();
        assert_eq!(flat.address_of(4).unwrap(), BucketAddress::new(0, 4, 0, 1));
    }

    fn layout_flat() -> Layout {
        layout(1, 4, 2)
    }

    #[test]
    fn test_address_of_out_of_range() {
        let layout = layout(2, 4, 2);
        assert_eq!(
            layout.address_of(9),
            Err(RingError::IndexOutOfRange { index: 9, max: 8 })
        );
    }

    #[test]
    fn test_check_rejects_bad_addresses() {
        let layout = layout(2, 4, 2);
        assert!(layout.check(&BucketAddress::new(2, 0, 0, 4)).is_err());
        assert!(layout.check(&BucketAddress::new(1, 5, 0, 2)).is_err());
        assert!(layout.check(&BucketAddress::new(1, 1, 2, 2)).is_err());
        assert!(layout.check(&BucketAddress::new(1, 1, 0, 4)).is_err());
        assert!(layout.check(&BucketAddress::new(1, 4, 1, 2)).is_ok());
    }

    #[test]
    fn test_wrap_back() {
        let layout = layout(1, 4, 2);
        assert_eq!(layout.wrap_back(0, 0), 3);
        assert_eq!(layout.wrap_back(2, 0), 1);
        assert_eq!(layout.wrap_back(2, 3), 2);
        assert_eq!(layout.wrap_next(3), 0);
    }

    proptest! {
        #[test]
        fn address_round_trips_logical_index(levels in 1usize..5, slot_log in 2u32..6, index_seed in 0usize..10_000) {
            let slots = 1usize << slot_log;
            let layout = layout(levels, slots, 2);
            let index = index_seed % (layout.max_size() + 1);
            let address = layout.address_of(index).unwrap();
            prop_assert_eq!(address.logical_index(), index);
            prop_assert!(layout.check(&address).is_ok());
        }

        #[test]
        fn add_offset_matches_logical_shift(slot in 0usize..64, offset in 0usize..16, delta in -512isize..512) {
            let address = BucketAddress::new(2, slot, offset, 16);
            let target = address.logical_index() as isize + delta;
            match address.add_offset(delta) {
                Ok(moved) => {
                    prop_assert_eq!(moved.logical_index() as isize, target);
                    prop_assert!(moved.offset < moved.period);
                }
                Err(err) => {
                    prop_assert!(target < 0);
                    prop_assert_eq!(err, RingError::AddressUnderflow);
                }
            }
        }
    }
}
