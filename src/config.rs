//! Ring configuration

use crate::error::{Result, RingError};
use crate::intmath::{is_power_of_two, pow};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default overflow threshold seed for accumulator rings.
pub const DEFAULT_ANTICIPATED_MAX_ITEM_VALUE: f64 = 5000.0;

/// Geometry of a multi-resolution ring.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RingConfig {
    /// Number of resolution levels (level 0 is full resolution).
    pub level_count: usize,

    /// Slots per level. Power of two.
    pub slot_size: usize,

    /// Items at level `i` folded into one item at level `i + 1`.
    /// Power of two in `(1, slot_size)`.
    pub magnitude_increase: usize,

    /// Rough upper bound of a single pushed value. Accumulator rings derive
    /// their rebase threshold from it.
    pub anticipated_max_item_value: f64,
}

impl RingConfig {
    /// Create a configuration with the default anticipated max item value.
    pub fn new(level_count: usize, slot_size: usize, magnitude_increase: usize) -> Self {
        Self {
            level_count,
            slot_size,
            magnitude_increase,
            anticipated_max_item_value: DEFAULT_ANTICIPATED_MAX_ITEM_VALUE,
        }
    }

    pub fn with_anticipated_max_item_value(mut self, value: f64) -> Self {
        self.anticipated_max_item_value = value;
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if self.level_count == 0 {
            return Err(RingError::ZeroLevels);
        }
        if !is_power_of_two(self.slot_size as isize) {
            return Err(RingError::SlotSizeNotPowerOfTwo {
                slot_size: self.slot_size,
            });
        }
        if !is_power_of_two(self.magnitude_increase as isize) || self.magnitude_increase <= 1 {
            return Err(RingError::MagnitudeNotPowerOfTwo {
                magnitude: self.magnitude_increase,
            });
        }
        if self.magnitude_increase >= self.slot_size {
            return Err(RingError::MagnitudeOutOfRange {
                magnitude: self.magnitude_increase,
                slot_size: self.slot_size,
            });
        }
        if !self.anticipated_max_item_value.is_finite() || self.anticipated_max_item_value <= 0.0 {
            return Err(RingError::InvalidAnticipatedMax);
        }
        self.max_size()?;
        Ok(())
    }

    /// Logical positions spanned by one slot at `level`.
    pub fn period(&self, level: usize) -> Result<usize> {
        pow(self.magnitude_increase, level).ok_or(RingError::CapacityOverflow {
            level_count: level + 1,
        })
    }

    /// Logical positions the ring can address:
    /// `slot_size * magnitude_increase^(level_count - 1)`.
    pub fn max_size(&self) -> Result<usize> {
        self.window_span(self.level_count.saturating_sub(1))
    }

    /// Logical positions covered by all slots of `level`.
    pub fn window_span(&self, level: usize) -> Result<usize> {
        self.period(level)?
            .checked_mul(self.slot_size)
            .ok_or(RingError::CapacityOverflow {
                level_count: level + 1,
            })
    }
}

impl Default for RingConfig {
    fn default() -> Self {
        Self::new(3, 8, 4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = RingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_size(), Ok(8 * 4 * 4));
        assert_eq!(config.anticipated_max_item_value, 5000.0);
    }

    #[test]
    fn test_max_size() {
        assert_eq!(RingConfig::new(1, 4, 2).max_size(), Ok(4));
        assert_eq!(RingConfig::new(2, 4, 2).max_size(), Ok(8));
        assert_eq!(RingConfig::new(3, 8, 2).max_size(), Ok(32));
    }

    #[test]
    fn test_periods() {
        let config = RingConfig::new(3, 8, 4);
        assert_eq!(config.period(0), Ok(1));
        assert_eq!(config.period(1), Ok(4));
        assert_eq!(config.period(2), Ok(16));
        assert_eq!(config.window_span(2), Ok(128));
    }

    #[test]
    fn test_rejects_non_power_of_two_slot_size() {
        let err = RingConfig::new(2, 3, 2).validate().unwrap_err();
        assert_eq!(err, RingError::SlotSizeNotPowerOfTwo { slot_size: 3 });
    }

    #[test]
    fn test_rejects_bad_magnitude() {
        assert!(matches!(
            RingConfig::new(2, 4, 3).validate(),
            Err(RingError::MagnitudeNotPowerOfTwo { magnitude: 3 })
        ));
        assert!(matches!(
            RingConfig::new(2, 4, 1).validate(),
            Err(RingError::MagnitudeNotPowerOfTwo { magnitude: 1 })
        ));
        assert!(matches!(
            RingConfig::new(2, 4, 8).validate(),
            Err(RingError::MagnitudeOutOfRange { .. })
        ));
        assert!(matches!(
            RingConfig::new(2, 4, 4).validate(),
            Err(RingError::MagnitudeOutOfRange { .. })
        ));
    }

    #[test]
    fn test_rejects_zero_levels_and_bad_threshold() {
        assert_eq!(RingConfig::new(0, 4, 2).validate(), Err(RingError::ZeroLevels));
        let config = RingConfig::new(1, 4, 2).with_anticipated_max_item_value(-1.0);
        assert_eq!(config.validate(), Err(RingError::InvalidAnticipatedMax));
    }

    #[test]
    fn test_rejects_capacity_overflow() {
        let config = RingConfig::new(200, 4, 2);
        assert!(matches!(config.validate(), Err(RingError::CapacityOverflow { .. })));
        assert!(config.max_size().is_err());
        assert!(config.period(199).is_err());
        assert!(RingConfig::new(3, 8, 2).window_span(usize::BITS as usize).is_err());
    }
}
