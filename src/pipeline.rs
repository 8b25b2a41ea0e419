//! Stream history - one value ring feeding its derived rings
//!
//! Derived rings are pushed directly, in registration order, after the value
//! ring has absorbed the sample. Window reducers are refreshed last, so every
//! reader sees a consistent state once [`StreamHistory::push`] returns.

use crate::aggregate::{Accumulation, AggregateRing};
use crate::config::RingConfig;
use crate::error::{Result, RingError};
use crate::numeric::Sample;
use crate::value::ValueRing;
use crate::window::WindowAverage;

/// Handle to an aggregate ring owned by a [`StreamHistory`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AggregateId(usize);

/// Handle to a window reducer owned by a [`StreamHistory`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WindowId(usize);

/// A value ring plus the accumulator rings and reducers derived from it.
#[derive(Clone, Debug)]
pub struct StreamHistory<T: Sample> {
    values: ValueRing<T>,
    aggregates: Vec<AggregateRing<T>>,
    windows: Vec<(AggregateId, WindowAverage<T>)>,
}

impl<T: Sample> StreamHistory<T> {
    /// Create a history whose rings all share `config`.
    pub fn new(config: RingConfig) -> Result<Self> {
        Ok(Self {
            values: ValueRing::new(config)?,
            aggregates: Vec::new(),
            windows: Vec::new(),
        })
    }

    // =========================================================================
    // BUILDING
    // =========================================================================

    /// Attach a running-sum ring.
    pub fn add_sum(&mut self) -> Result<AggregateId> {
        self.add(Accumulation::Sum)
    }

    /// Attach a weighted-sum ring.
    pub fn add_weighted_sum(&mut self) -> Result<AggregateId> {
        self.add(Accumulation::WeightedSum)
    }

    /// Attach a weighted power sum ring of `power >= 1`.
    pub fn add_weighted_power_sum(&mut self, power: u32) -> Result<AggregateId> {
        self.add(Accumulation::WeightedPowerSum { power })
    }

    fn add(&mut self, kind: Accumulation) -> Result<AggregateId> {
        let ring = AggregateRing::with_kind(self.values.config().clone(), kind)?;
        self.aggregates.push(ring);
        Ok(AggregateId(self.aggregates.len() - 1))
    }

    /// Attach an average over `[from, to)` of the ring behind `id`.
    pub fn add_window_average(&mut self, id: AggregateId, from: usize, to: usize) -> Result<WindowId> {
        let ring = self
            .aggregates
            .get(id.0)
            .ok_or(RingError::UnknownAggregate { id: id.0 })?;
        let mut window = WindowAverage::new(ring, from, to)?;
        window.recalculate(ring)?;
        self.windows.push((id, window));
        Ok(WindowId(self.windows.len() - 1))
    }

    // =========================================================================
    // WRITING
    // =========================================================================

    /// Push a sample through the value ring, every aggregate, then every window.
    pub fn push(&mut self, value: T) {
        self.values.push(value);
        let latest = self.values.first();
        for ring in &mut self.aggregates {
            ring.push(latest);
        }
        for (id, window) in &mut self.windows {
            if let Err(err) = window.recalculate(&self.aggregates[id.0]) {
                log::warn!("window average over aggregate {} not refreshed: {}", id.0, err);
            }
        }
    }

    // =========================================================================
    // READING
    // =========================================================================

    pub fn values(&self) -> &ValueRing<T> {
        &self.values
    }

    /// Mutable access to the value ring, for observer registration.
    pub fn values_mut(&mut self) -> &mut ValueRing<T> {
        &mut self.values
    }

    pub fn aggregate(&self, id: AggregateId) -> Option<&AggregateRing<T>> {
        self.aggregates.get(id.0)
    }

    /// Mutable access to an aggregate ring, for observer registration.
    pub fn aggregate_mut(&mut self, id: AggregateId) -> Option<&mut AggregateRing<T>> {
        self.aggregates.get_mut(id.0)
    }

    /// The ring behind `id` if it is a running sum.
    pub fn sum(&self, id: AggregateId) -> Option<&AggregateRing<T>> {
        self.aggregate(id).filter(|r| r.kind() == Accumulation::Sum)
    }

    /// The ring behind `id` if it is a weighted sum.
    pub fn weighted_sum(&self, id: AggregateId) -> Option<&AggregateRing<T>> {
        self.aggregate(id).filter(|r| r.kind() == Accumulation::WeightedSum)
    }

    /// The ring behind `id` if it is a weighted power sum.
    pub fn weighted_power_sum(&self, id: AggregateId) -> Option<&AggregateRing<T>> {
        self.aggregate(id)
            .filter(|r| matches!(r.kind(), Accumulation::WeightedPowerSum { .. }))
    }

    pub fn window_average(&self, id: WindowId) -> Option<&WindowAverage<T>> {
        self.windows.get(id.0).map(|(_, window)| window)
    }

    pub fn aggregate_count(&self) -> usize {
        self.aggregates.len()
    }
}
