//! Accumulator rings - running sum, weighted sum and weighted power sum
//!
//! An accumulator ring stores running totals instead of values: every bucket
//! at every level is "total as of that push". The total over a window of
//! logical indices `[from, to)` is therefore `ring[from] - ring[to]`; the
//! ring never materializes a window itself.
//!
//! Weighted variants weight each sample by its sample counter `x` (0 for the
//! first sample) raised to a fixed power. Internally every moment
//! `Σ x^j·value` for `j = 0..=power` is kept per bucket, which lets the
//! counter be rebased without breaking stored totals.
//!
//! ## Bounding the accumulators
//!
//! Totals grow without bound. Two corrections keep them finite, both
//! invisible to readers:
//!
//! - **Overflow correction**: once a total crosses a threshold derived from
//!   `anticipated_max_item_value`, the total most recently evicted from the
//!   coarsest level is subtracted from every bucket and accumulator. Reads are
//!   relative to that same value, so no readout changes.
//! - **Counter rebase**: once `x` reaches max size it is shifted back by max
//!   size and every stored moment is re-expanded binomially around the new
//!   origin.

use crate::address::Layout;
use crate::config::RingConfig;
use crate::error::{Result, RingError};
use crate::level::SlotArray;
use crate::numeric::{from_count, Sample};
use crate::ring::{LevelStore, MultiResolutionRing};

/// What an accumulator ring sums.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Accumulation {
    /// `Σ value`
    Sum,
    /// `Σ x·value`
    WeightedSum,
    /// `Σ x^power·value`
    WeightedPowerSum { power: u32 },
}

impl Accumulation {
    /// Exponent applied to the sample counter.
    pub fn power(&self) -> u32 {
        match *self {
            Accumulation::Sum => 0,
            Accumulation::WeightedSum => 1,
            Accumulation::WeightedPowerSum { power } => power,
        }
    }
}

/// Ring of running totals.
pub type AggregateRing<T> = MultiResolutionRing<T, AggregateStore<T>>;

/// Running-total storage for every moment up to the ring's power.
#[derive(Clone, Debug)]
pub struct AggregateStore<T> {
    kind: Accumulation,

    /// `moments[j][level]` holds running `Σ x^j·value` snapshots.
    moments: Vec<Vec<SlotArray<T>>>,

    /// Current running `Σ x^j·value`.
    running: Vec<T>,

    /// Weight of the next sample.
    sample_counter: usize,

    /// Counter value that triggers a rebase.
    counter_limit: usize,

    /// Overflow threshold per moment.
    thresholds: Vec<T>,

    /// Pascal's triangle up to the ring's power.
    binomials: Vec<Vec<T>>,

    top_level: usize,
    warned: bool,
}

impl<T: Sample> AggregateStore<T> {
    fn new(layout: &Layout, config: &RingConfig, kind: Accumulation) -> Self {
        let order = kind.power() as usize;
        let max_size = from_count::<T>(layout.max_size());
        let anticipated = T::from_f64(config.anticipated_max_item_value).unwrap_or_else(T::max_value);
        let two = T::one() + T::one();
        let thresholds = (0..=order)
            .map(|j| anticipated * two * max_size.powi(j as i32 + 1))
            .collect();
        Self {
            kind,
            moments: (0..=order)
                .map(|_| {
                    (0..layout.level_count())
                        .map(|_| SlotArray::new(layout.slot_size()))
                        .collect()
                })
                .collect(),
            running: vec![T::zero(); order + 1],
            sample_counter: 0,
            counter_limit: layout.max_size(),
            thresholds,
            binomials: pascal(order),
            top_level: layout.level_count() - 1,
            warned: false,
        }
    }

    #[inline]
    fn order(&self) -> usize {
        self.running.len() - 1
    }

    pub fn kind(&self) -> Accumulation {
        self.kind
    }

    pub fn sample_counter(&self) -> usize {
        self.sample_counter
    }

    fn exceeds_threshold(&self) -> bool {
        let order = self.order();
        self.running[0].abs() >= self.thresholds[0] || self.running[order].abs() >= self.thresholds[order]
    }

    /// Subtract the coarsest level's evicted totals from everything.
    pub(crate) fn apply_removed(&mut self) {
        let top = self.top_level;
        let bases: Vec<T> = self.moments.iter().map(|m| m[top].evicted()).collect();
        if bases.iter().all(|b| b.is_zero()) {
            return;
        }
        for ((levels, running), base) in self.moments.iter_mut().zip(self.running.iter_mut()).zip(&bases) {
            for slots in levels.iter_mut() {
                slots.rebase(*base);
            }
            *running = *running - *base;
        }
        log::debug!(
            "{:?} ring rebased by {} at sample counter {}",
            self.kind,
            bases[self.order()],
            self.sample_counter
        );
    }

    /// Shift the sample counter origin back by `shift`.
    pub(crate) fn rebase_counter(&mut self, shift: usize) {
        let order = self.order();
        let neg_shift = -from_count::<T>(shift);
        let mut neg_powers = Vec::with_capacity(order + 1);
        let mut p = T::one();
        for _ in 0..=order {
            neg_powers.push(p);
            p = p * neg_shift;
        }

        let mut old = vec![T::zero(); order + 1];
        let mut new = vec![T::zero(); order + 1];
        let levels = self.moments[0].len();
        let slot_size = self.moments[0][0].slot_size();

        for level in 0..levels {
            for physical in 0..slot_size {
                for (j, o) in old.iter_mut().enumerate() {
                    *o = self.moments[j][level].get(physical);
                }
                self.expand(&old, &neg_powers, &mut new);
                for (j, n) in new.iter().enumerate() {
                    self.moments[j][level].set_raw(physical, *n);
                }
            }
            for (j, o) in old.iter_mut().enumerate() {
                *o = self.moments[j][level].evicted();
            }
            self.expand(&old, &neg_powers, &mut new);
            for (j, n) in new.iter().enumerate() {
                self.moments[j][level].set_evicted(*n);
            }
        }

        old.copy_from_slice(&self.running);
        self.expand(&old, &neg_powers, &mut new);
        self.running.copy_from_slice(&new);

        self.sample_counter -= shift;
        log::debug!("{:?} ring sample counter rebased by {}", self.kind, shift);
    }

    /// `new[k] = Σ_j C(k, j)·(-c)^(k-j)·old[j]`
    fn expand(&self, old: &[T], neg_powers: &[T], new: &mut [T]) {
        for (k, out) in new.iter_mut().enumerate() {
            let mut acc = T::zero();
            for j in 0..=k {
                acc = acc + self.binomials[k][j] * neg_powers[k - j] * old[j];
            }
            *out = acc;
        }
    }
}

impl<T: Sample> LevelStore<T> for AggregateStore<T> {
    fn assign_first(&mut self, cursor: usize, value: T) {
        let x = from_count::<T>(self.sample_counter);
        let mut weight = T::one();
        for (running, levels) in self.running.iter_mut().zip(self.moments.iter_mut()) {
            *running = *running + weight * value;
            levels[0].write(cursor, *running);
            weight = weight * x;
        }
        self.sample_counter += 1;
    }

    fn assign(&mut self, _layout: &Layout, level: usize, cursors: &[usize]) {
        for (running, levels) in self.running.iter().zip(self.moments.iter_mut()) {
            levels[level].write(cursors[level], *running);
        }
    }

    fn after_push(&mut self, _layout: &Layout) {
        if self.order() > 0 && self.sample_counter >= self.counter_limit {
            self.rebase_counter(self.counter_limit);
        }
        if self.exceeds_threshold() {
            self.apply_removed();
            if !self.warned && self.exceeds_threshold() {
                self.warned = true;
                log::warn!(
                    "{:?} ring total still above threshold after rebase; anticipated max item value is too small",
                    self.kind
                );
            }
        }
    }

    fn levels(&self) -> &[SlotArray<T>] {
        &self.moments[self.order()]
    }

    fn readout(&self, value: T) -> T {
        value - self.moments[self.order()][self.top_level].evicted()
    }
}

impl<T: Sample> AggregateRing<T> {
    /// Accumulator ring of the given kind.
    pub fn with_kind(config: RingConfig, kind: Accumulation) -> Result<Self> {
        if let Accumulation::WeightedPowerSum { power } = kind {
            if power == 0 {
                return Err(RingError::InvalidPower { power });
            }
        }
        let layout = Layout::new(&config)?;
        let store = AggregateStore::new(&layout, &config, kind);
        Ok(Self::from_parts(config, layout, store))
    }

    /// Running `Σ value`.
    pub fn sum(config: RingConfig) -> Result<Self> {
        Self::with_kind(config, Accumulation::Sum)
    }

    /// Running `Σ x·value`.
    pub fn weighted_sum(config: RingConfig) -> Result<Self> {
        Self::with_kind(config, Accumulation::WeightedSum)
    }

    /// Running `Σ x^power·value`.
    pub fn weighted_power_sum(config: RingConfig, power: u32) -> Result<Self> {
        Self::with_kind(config, Accumulation::WeightedPowerSum { power })
    }

    pub fn kind(&self) -> Accumulation {
        self.store().kind()
    }

    /// Weight `x` the next pushed sample will receive. The newest sample
    /// was weighted by `sample_counter() - 1`.
    pub fn sample_counter(&self) -> usize {
        self.store().sample_counter()
    }

    /// Total over logical indices `[from, to)`.
    pub fn window(&self, from: usize, to: usize) -> Result<T> {
        if to <= from {
            return Err(RingError::InvalidWindow { from, to });
        }
        Ok(self.get(from)? - self.get(to)?)
    }
}

fn pascal<T: Sample>(order: usize) -> Vec<Vec<T>> {
    let mut rows: Vec<Vec<T>> = Vec::with_capacity(order + 1);
    for k in 0..=order {
        let mut row = vec![T::one(); k + 1];
        for j in 1..k {
            row[j] = rows[k - 1][j - 1] + rows[k - 1][j];
        }
        rows.push(row);
    }
    rows
}
