//! Resolution Ring - fixed-memory streaming history with resolution decay
//!
//! Recent samples at full resolution, older ones progressively averaged.
//!
//! # Core Types
//!
//! - **ValueRing**: raw samples at level 0, window averages above
//! - **AggregateRing**: running sum, weighted sum, or weighted power sum
//! - **StreamHistory**: one value ring feeding its derived rings and reducers
//!
//! # Layout
//!
//! A ring has `level_count` levels of `slot_size` slots each. Level 0 takes
//! every pushed sample. Level `i` takes one entry every
//! `magnitude_increase^i` pushes, so it covers `magnitude_increase` times the
//! history of level `i - 1` in the same memory. Total coverage is
//! `slot_size * magnitude_increase^(level_count - 1)` logical positions.
//!
//! # Core Concepts
//!
//! - **Logical index**: pushes ago, 0 is the newest sample
//! - **Bucket address**: `(level, slot, offset, period)` for a logical index
//! - **Triangle interpolation**: reads blend a bucket with its nearest
//!   neighbour, so coarse history still reads as a continuous curve
//! - **Running totals**: accumulator rings store totals as of each bucket;
//!   a window sum is the difference of two reads
//!
//! # Example
//!
//! ```rust
//! use resolution_ring::{RingConfig, StreamHistory};
//!
//! # fn main() -> Result<(), resolution_ring::RingError> {
//! // 3 levels x 8 slots, doubling per level: 32 positions of history
//! let mut history = StreamHistory::<f64>::new(RingConfig::new(3, 8, 2))?;
//! let sums = history.add_sum()?;
//! let recent = history.add_window_average(sums, 0, 4)?;
//!
//! for i in 1..=100 {
//!     history.push(i as f64);
//! }
//!
//! // the newest sample is exact
//! assert_eq!(history.values().first(), 100.0);
//!
//! // older positions are reconstructed from coarser levels
//! let older = history.values().get(20)?;
//! assert!((older - 80.0).abs() < 1e-9);
//!
//! // average of the 4 newest samples
//! let average = history.window_average(recent).map(|w| w.value());
//! assert_eq!(average, Some(98.5));
//! # Ok(())
//! # }
//! ```

mod address;
mod aggregate;
mod config;
mod error;
mod level;
mod observer;
mod pipeline;
mod ring;
mod value;
mod window;

pub mod intmath;
pub mod numeric;

pub use address::{BucketAddress, Layout};
pub use aggregate::{Accumulation, AggregateRing, AggregateStore};
pub use config::{RingConfig, DEFAULT_ANTICIPATED_MAX_ITEM_VALUE};
pub use error::{Result, RingError};
pub use level::SlotArray;
pub use numeric::Sample;
pub use observer::{ChannelObserver, FnObserver, PushEvent, PushObserver};
pub use pipeline::{AggregateId, StreamHistory, WindowId};
pub use ring::{LevelStore, MultiResolutionRing};
pub use value::{ValueRing, ValueStore};
pub use window::WindowAverage;
