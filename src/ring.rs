//! Multi-resolution ring - the cascading push and interpolated read engine

use crate::address::{BucketAddress, Layout};
use crate::config::RingConfig;
use crate::error::{Result, RingError};
use crate::intmath::{fast_max, fast_min};
use crate::level::SlotArray;
use crate::numeric::{interpolate, Sample};
use crate::observer::{PushEvent, PushObserver};
use std::fmt;
use std::sync::Arc;

/// Per-ring storage strategy plugged into [`MultiResolutionRing`].
///
/// The engine owns cursors and the cascade; the store decides what a level
/// holds and how a stored bucket maps back onto logical positions.
pub trait LevelStore<T: Sample> {
    /// Store a freshly pushed value at level 0, physical slot `cursor`.
    fn assign_first(&mut self, cursor: usize, value: T);

    /// Derive the newest entry of `level` (> 0) at physical slot
    /// `cursors[level]`. Cursors of finer levels are already advanced.
    fn assign(&mut self, layout: &Layout, level: usize, cursors: &[usize]);

    /// Runs after every cascade, before observers are notified.
    fn after_push(&mut self, _layout: &Layout) {}

    /// The arrays the read path interpolates over, one per level.
    fn levels(&self) -> &[SlotArray<T>];

    /// Signed distance from the stored bucket to the addressed position and
    /// the distance at which the neighbouring bucket is reached.
    ///
    /// `age` is how many pushes ago the newest bucket of `level` was written.
    /// Positive results move toward the older neighbour.
    fn compute_offset(&self, layout: &Layout, level: usize, offset: usize, age: usize) -> (isize, isize) {
        (offset as isize - age as isize, layout.period_at(level) as isize)
    }

    /// Final transform applied to every read.
    fn readout(&self, value: T) -> T {
        value
    }
}

/// Fixed-memory ring of `level_count` resolution levels.
///
/// Level 0 keeps every sample; level `i` receives one entry every
/// `magnitude_increase^i` pushes. All levels are addressed through one
/// logical index (0 = newest) and read back by triangle interpolation.
#[derive(Clone)]
pub struct MultiResolutionRing<T: Sample, S: LevelStore<T>> {
    /// Storage strategy.
    store: S,

    /// Geometry derived from the configuration.
    layout: Layout,

    /// Configuration.
    config: RingConfig,

    /// Next physical slot to overwrite, per level.
    cursors: Vec<usize>,

    /// Pushes since the newest entry of each level was written.
    ages: Vec<usize>,

    /// Push count modulo the coarsest period.
    counter: usize,

    /// Filled logical positions, capped at max size.
    count: usize,

    /// Total pushes since construction.
    pushes: u64,

    /// Notified after every push, in subscription order.
    observers: Vec<Arc<dyn PushObserver<T>>>,
}

impl<T: Sample, S: LevelStore<T>> MultiResolutionRing<T, S> {
    /// Build a ring around `store`. `layout` must come from `config`.
    pub(crate) fn from_parts(config: RingConfig, layout: Layout, store: S) -> Self {
        let levels = layout.level_count();
        log::debug!(
            "ring created: {} levels x {} slots, magnitude {}, max size {}",
            levels,
            layout.slot_size(),
            layout.magnitude_increase(),
            layout.max_size()
        );
        Self {
            store,
            layout,
            config,
            cursors: vec![0; levels],
            ages: vec![0; levels],
            counter: 0,
            count: 0,
            pushes: 0,
            observers: Vec::new(),
        }
    }

    // =========================================================================
    // WRITING
    // =========================================================================

    /// Push a sample and cascade it into coarser levels.
    ///
    /// Level `i` fires when the push count is a multiple of its period; the
    /// cascade stops at the first level that does not fire. Observers run
    /// after the ring is fully updated.
    pub fn push(&mut self, value: T) {
        self.store.assign_first(self.cursors[0], value);
        self.cursors[0] = self.layout.wrap_next(self.cursors[0]);

        self.counter = (self.counter + 1) % self.layout.top_period();
        for level in 1..self.layout.level_count() {
            if self.counter & (self.layout.period_at(level) - 1) != 0 {
                break;
            }
            self.store.assign(&self.layout, level, &self.cursors);
            self.cursors[level] = self.layout.wrap_next(self.cursors[level]);
        }

        self.advance_counters();
        self.store.after_push(&self.layout);
        self.notify();
    }

    fn advance_counters(&mut self) {
        self.count = (self.count + 1).min(self.layout.max_size());
        self.pushes += 1;
        for (level, age) in self.ages.iter_mut().enumerate() {
            *age = self.counter & (self.layout.period_at(level) - 1);
        }
    }

    fn notify(&self) {
        if self.observers.is_empty() {
            return;
        }
        let event = PushEvent {
            latest: self.first(),
            count: self.count,
            pushes: self.pushes,
        };
        for observer in &self.observers {
            observer.on_push(&event);
        }
    }

    // =========================================================================
    // READING
    // =========================================================================

    /// Exact newest readout, bypassing interpolation.
    pub fn first(&self) -> T {
        let newest = self.store.levels()[0].back(self.cursors[0], 0);
        self.store.readout(newest)
    }

    /// Map a logical index (0 = newest) to its bucket address.
    pub fn address_of(&self, index: usize) -> Result<BucketAddress> {
        self.layout.address_of(index)
    }

    /// Interpolated value at `address`.
    pub fn read(&self, address: &BucketAddress) -> Result<T> {
        self.layout.check(address)?;
        let level = address.level;
        let slot = address.slot as isize;
        let last = self.layout.slot_size() as isize;

        let current = self.bucket(level, address.slot);
        let newer = self.bucket(level, fast_max(slot - 1, 0) as usize);
        let older = self.bucket(level, fast_min(slot + 1, last) as usize);

        let (offset, max_offset) =
            self.store
                .compute_offset(&self.layout, level, address.offset, self.ages[level]);
        Ok(self
            .store
            .readout(interpolate(current, newer, older, offset, max_offset)))
    }

    /// Interpolated value `index` pushes ago.
    pub fn get(&self, index: usize) -> Result<T> {
        self.read(&self.address_of(index)?)
    }

    /// Stored bucket at `(level, slot)` without interpolation.
    ///
    /// `slot` counts back from the newest bucket; `slot == slot_size` is the
    /// bucket most recently evicted from the level.
    pub fn slot_value(&self, level: usize, slot: usize) -> Result<T> {
        let period = self.layout.period(level).ok_or(RingError::AddressOutOfRange {
            level,
            slot,
            offset: 0,
            period: 0,
        })?;
        self.layout
            .check(&BucketAddress::new(level, slot, 0, period))?;
        Ok(self.store.readout(self.bucket(level, slot)))
    }

    /// Stored value behind the level cursor; the evicted value at `slot_size`.
    #[inline]
    fn bucket(&self, level: usize, slot: usize) -> T {
        let slots = &self.store.levels()[level];
        if slot >= self.layout.slot_size() {
            slots.evicted()
        } else {
            slots.back(self.cursors[level], slot)
        }
    }

    // =========================================================================
    // OBSERVERS
    // =========================================================================

    /// Register an observer. The same observer may be registered twice.
    pub fn subscribe(&mut self, observer: Arc<dyn PushObserver<T>>) {
        self.observers.push(observer);
    }

    /// Remove one registration of `observer`. Returns whether one was found.
    pub fn unsubscribe(&mut self, observer: &Arc<dyn PushObserver<T>>) -> bool {
        match self.observers.iter().position(|o| Arc::ptr_eq(o, observer)) {
            Some(idx) => {
                self.observers.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    // =========================================================================
    // METRICS
    // =========================================================================

    /// Get configuration.
    pub fn config(&self) -> &RingConfig {
        &self.config
    }

    /// Get the derived geometry.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Filled logical positions, never above [`Self::max_size`].
    pub fn count(&self) -> usize {
        self.count
    }

    /// Addressable logical positions.
    pub fn max_size(&self) -> usize {
        self.layout.max_size()
    }

    /// Total pushes since construction.
    pub fn pushes(&self) -> u64 {
        self.pushes
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    #[cfg(test)]
    pub(crate) fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
}

impl<T: Sample, S: LevelStore<T>> fmt::Display for MultiResolutionRing<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for i in 0..self.count {
            if i > 0 {
                write!(f, ", ")?;
            }
            let value = self.get(i).map_err(|_| fmt::Error)?;
            write!(f, "{}", value)?;
        }
        write!(f, "]")
    }
}

impl<T: Sample, S: LevelStore<T>> fmt::Debug for MultiResolutionRing<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiResolutionRing")
            .field("config", &self.config)
            .field("count", &self.count)
            .field("pushes", &self.pushes)
            .field("cursors", &self.cursors)
            .field("observers", &self.observers.len())
            .finish()
    }
}
