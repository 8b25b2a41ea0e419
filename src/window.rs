//! Windowed average over a sum ring

use crate::address::BucketAddress;
use crate::aggregate::{Accumulation, AggregateRing};
use crate::error::{Result, RingError};
use crate::numeric::{from_count, Sample};

/// Mean of the samples at logical indices `[from, to)`.
///
/// Addresses are resolved once at construction; every evaluation is two
/// reads and a division.
#[derive(Clone, Debug)]
pub struct WindowAverage<T> {
    from: BucketAddress,
    to: BucketAddress,
    item_count: usize,
    max_size: usize,
    value: T,
}

impl<T: Sample> WindowAverage<T> {
    /// Bind a window to the geometry of `sums`, which must be a running sum.
    pub fn new(sums: &AggregateRing<T>, from: usize, to: usize) -> Result<Self> {
        check_sum(sums)?;
        if to <= from {
            return Err(RingError::InvalidWindow { from, to });
        }
        Ok(Self {
            from: sums.address_of(from)?,
            to: sums.address_of(to)?,
            item_count: to - from,
            max_size: sums.max_size(),
            value: T::zero(),
        })
    }

    /// `(sums[from] - sums[to]) / item_count`
    pub fn evaluate(&self, sums: &AggregateRing<T>) -> Result<T> {
        check_sum(sums)?;
        if sums.max_size() != self.max_size {
            return Err(RingError::ConfigMismatch {
                expected: self.max_size,
                actual: sums.max_size(),
            });
        }
        let total = sums.read(&self.from)? - sums.read(&self.to)?;
        Ok(total / from_count(self.item_count))
    }

    /// Evaluate and keep the result as [`Self::value`].
    pub fn recalculate(&mut self, sums: &AggregateRing<T>) -> Result<T> {
        self.value = self.evaluate(sums)?;
        Ok(self.value)
    }

    /// Last recalculated average; zero before the first recalculation.
    pub fn value(&self) -> T {
        self.value
    }

    pub fn item_count(&self) -> usize {
        self.item_count
    }
}

fn check_sum<T: Sample>(ring: &AggregateRing<T>) -> Result<()> {
    match ring.kind() {
        Accumulation::Sum => Ok(()),
        kind => Err(RingError::NotASumRing { kind }),
    }
}
