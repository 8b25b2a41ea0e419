//! Errors raised at construction and at the addressing boundary

use crate::aggregate::Accumulation;

/// Errors produced by ring construction and addressing.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingError {
    /// A ring needs at least one resolution level.
    #[error("level count must be > 0")]
    ZeroLevels,
    /// Slot size must be a power of two so slot lookup can use a mask.
    #[error("slot size must be a power of 2, got {slot_size}")]
    SlotSizeNotPowerOfTwo { slot_size: usize },
    /// Magnitude increase must be a power of two greater than one.
    #[error("magnitude increase must be a power of 2 greater than 1, got {magnitude}")]
    MagnitudeNotPowerOfTwo { magnitude: usize },
    /// Magnitude increase must be strictly smaller than the slot size.
    #[error("magnitude increase {magnitude} must be smaller than slot size {slot_size}")]
    MagnitudeOutOfRange { magnitude: usize, slot_size: usize },
    /// Overflow threshold seed must be finite and positive.
    #[error("anticipated max item value must be finite and > 0")]
    InvalidAnticipatedMax,
    /// Weighted power sums need a power of at least one.
    #[error("power must be >= 1, got {power}")]
    InvalidPower { power: u32 },
    /// The addressable range does not fit in `usize`.
    #[error("capacity of {level_count} levels overflows usize")]
    CapacityOverflow { level_count: usize },
    /// Logical index beyond the addressable range.
    #[error("index must be in range 0 to {max}, got {index}")]
    IndexOutOfRange { index: usize, max: usize },
    /// Bucket address that does not name a stored bucket.
    #[error("address (level {level}, slot {slot}, offset {offset}, period {period}) is out of range")]
    AddressOutOfRange {
        level: usize,
        slot: usize,
        offset: usize,
        period: usize,
    },
    /// Walking an address backwards past the most recent position.
    #[error("address moved before the most recent position")]
    AddressUnderflow,
    /// Window bounds with `to <= from`.
    #[error("window end {to} must be greater than start {from}")]
    InvalidWindow { from: usize, to: usize },
    /// Window averages are only defined over running sums.
    #[error("window average needs a sum ring, got {kind:?}")]
    NotASumRing { kind: Accumulation },
    /// Handle that does not name a ring of this pipeline.
    #[error("no aggregate ring with id {id}")]
    UnknownAggregate { id: usize },
    /// Two structures that must share a geometry do not.
    #[error("ring geometry mismatch: max size {expected} vs {actual}")]
    ConfigMismatch { expected: usize, actual: usize },
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, RingError>;
