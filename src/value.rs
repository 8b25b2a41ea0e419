//! Value ring - raw samples at level 0, window averages above

use crate::address::Layout;
use crate::config::RingConfig;
use crate::error::Result;
use crate::level::SlotArray;
use crate::numeric::Sample;
use crate::ring::{LevelStore, MultiResolutionRing};

/// Ring of sample values with resolution decay.
pub type ValueRing<T> = MultiResolutionRing<T, ValueStore<T>>;

/// Level 0 keeps raw samples; level `i` keeps the mean of the
/// `magnitude_increase` newest entries of level `i - 1` at the time it fires.
#[derive(Clone, Debug)]
pub struct ValueStore<T> {
    levels: Vec<SlotArray<T>>,
}

impl<T: Sample> ValueStore<T> {
    fn new(layout: &Layout) -> Self {
        Self {
            levels: (0..layout.level_count())
                .map(|_| SlotArray::new(layout.slot_size()))
                .collect(),
        }
    }
}

impl<T: Sample> LevelStore<T> for ValueStore<T> {
    fn assign_first(&mut self, cursor: usize, value: T) {
        self.levels[0].write(cursor, value);
    }

    fn assign(&mut self, layout: &Layout, level: usize, cursors: &[usize]) {
        let average = self.levels[level - 1].mean_back(cursors[level - 1], layout.magnitude_increase());
        self.levels[level].write(cursors[level], average);
    }

    fn levels(&self) -> &[SlotArray<T>] {
        &self.levels
    }

    /// Buckets above level 0 are averages, so they are anchored at the centre
    /// of their window. Offsets are doubled to keep the half-step centre on
    /// the integer grid.
    fn compute_offset(&self, layout: &Layout, level: usize, offset: usize, age: usize) -> (isize, isize) {
        if level == 0 {
            return (offset as isize - age as isize, 1);
        }
        let period = layout.period_at(level) as isize;
        let centred = 2 * offset as isize - (period - 1);
        (centred - 2 * age as isize, 2 * period)
    }
}

impl<T: Sample> ValueRing<T> {
    /// Create a value ring. Fails if `config` is invalid.
    pub fn new(config: RingConfig) -> Result<Self> {
        let layout = Layout::new(&config)?;
        let store = ValueStore::new(&layout);
        Ok(Self::from_parts(config, layout, store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RingError;

    fn ring(levels: usize, slots: usize, magnitude: usize) -> ValueRing<f64> {
        ValueRing::new(RingConfig::new(levels, slots, magnitude)).unwrap()
    }

    #[test]
    fn test_single_level_reads_back_in_order() {
        let mut ring = ring(1, 4, 2);
        for v in [1.0, 2.0, 3.0, 4.0] {
            ring.push(v);
        }
        assert_eq!(ring.get(0).unwrap(), 4.0);
        assert_eq!(ring.get(1).unwrap(), 3.0);
        assert_eq!(ring.get(2).unwrap(), 2.0);
        assert_eq!(ring.get(3).unwrap(), 1.0);
        assert_eq!(ring.first(), 4.0);
    }

    #[test]
    fn test_second_level_averages_pairs() {
        let mut ring = ring(2, 4, 2);
        ring.push(1.0);
        ring.push(3.0);
        assert_eq!(ring.slot_value(1, 0).unwrap(), 2.0);

        ring.push(5.0);
        ring.push(7.0);
        assert_eq!(ring.slot_value(1, 0).unwrap(), 6.0);
        assert_eq!(ring.slot_value(1, 1).unwrap(), 2.0);
    }

    #[test]
    fn test_cascade_averages_of_averages() {
        let mut ring = ring(3, 4, 2);
        for v in [1.0, 2.0, 3.0, 4.0] {
            ring.push(v);
        }
        assert_eq!(ring.slot_value(1, 0).unwrap(), 3.5);
        assert_eq!(ring.slot_value(1, 1).unwrap(), 1.5);
        assert_eq!(ring.slot_value(2, 0).unwrap(), 2.5);

        // level 2 does not move again until the 8th push
        for v in [5.0, 6.0, 7.0] {
            ring.push(v);
            assert_eq!(ring.slot_value(2, 0).unwrap(), 2.5);
        }
        ring.push(8.0);
        assert_eq!(ring.slot_value(2, 0).unwrap(), 6.5);
        assert_eq!(ring.slot_value(2, 1).unwrap(), 2.5);
    }

    #[test]
    fn test_first_is_exact() {
        let mut ring = ring(3, 8, 4);
        for i in 0..500 {
            let v = ((i * 37) % 11) as f64 - 5.0;
            ring.push(v);
            assert_eq!(ring.first(), v);
            assert_eq!(ring.get(0).unwrap(), v);
        }
    }

    #[test]
    fn test_linear_ramp_reconstructs_across_levels() {
        let mut ring = ring(2, 4, 2);
        for n in 1..=30usize {
            ring.push(n as f64);
            if n < 12 {
                continue;
            }
            for k in 0..=ring.max_size() {
                let expected = (n - k) as f64;
                let actual = ring.get(k).unwrap();
                assert!((actual - expected).abs() < 1e-9, "n={n} k={k} got {actual}");
            }
        }
    }

    #[test]
    fn test_constant_stream_reads_constant() {
        let mut ring = ring(3, 8, 2);
        for _ in 0..200 {
            ring.push(42.0);
        }
        for k in 0..=ring.max_size() {
            assert!((ring.get(k).unwrap() - 42.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_interpolated_reads_stay_within_neighbours() {
        let mut ring = ring(3, 8, 4);
        for i in 0..1000 {
            ring.push(((i % 17) as f64).sin() * 10.0);
        }
        for k in 0..ring.max_size() {
            let v = ring.get(k).unwrap();
            assert!(v.abs() <= 10.0 + 1e-9);
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        assert!(matches!(
            ValueRing::<f64>::new(RingConfig::new(2, 3, 2)),
            Err(RingError::SlotSizeNotPowerOfTwo { .. })
        ));
        assert!(matches!(
            ValueRing::<f64>::new(RingConfig::new(2, 4, 3)),
            Err(RingError::MagnitudeNotPowerOfTwo { .. })
        ));
        assert!(matches!(
            ValueRing::<f64>::new(RingConfig::new(2, 4, 8)),
            Err(RingError::MagnitudeOutOfRange { .. })
        ));
    }

    #[test]
    fn test_f32_samples() {
        let mut ring = ValueRing::<f32>::new(RingConfig::new(1, 4, 2)).unwrap();
        ring.push(1.5);
        ring.push(2.5);
        assert_eq!(ring.get(1).unwrap(), 1.5f32);
        assert_eq!(ring.to_string(), "[2.5, 1.5]");
    }
}
