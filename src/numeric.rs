//! Sample algebra and triangle interpolation

use crate::intmath::fast_abs;
use num_traits::{Float, FromPrimitive};
use std::fmt::{Debug, Display};

/// Numeric type a ring can store.
///
/// Blanket-implemented for every float with the usual conversions, so
/// `f32` and `f64` both qualify.
pub trait Sample: Float + FromPrimitive + Debug + Display + Default + Send + Sync + 'static {}

impl<T> Sample for T where T: Float + FromPrimitive + Debug + Display + Default + Send + Sync + 'static {}

/// Converts a count into the sample type.
#[inline]
pub fn from_count<T: Sample>(n: usize) -> T {
    T::from_usize(n).unwrap_or_else(T::infinity)
}

/// Converts a signed offset into the sample type.
#[inline]
pub fn from_offset<T: Sample>(n: isize) -> T {
    T::from_isize(n).unwrap_or_else(T::nan)
}

/// Returns `on_greater` when `comparator >= 0`, otherwise `on_lower`.
///
/// The choice is folded into arithmetic so the read path does not branch on
/// the interpolation direction.
#[inline]
pub fn select_on_sign<T: Sample>(comparator: isize, on_lower: T, on_greater: T) -> T {
    let is_ge = !(comparator >> (isize::BITS - 1)) & 1;
    let flag = from_offset::<T>(is_ge);
    on_lower + (on_greater - on_lower) * flag
}

/// Triangle interpolation around `current`.
///
/// At `offset == 0` the result is `current`, at `offset == max_offset` it is
/// `older`, and at `offset == -max_offset` it is `newer`. Values in between
/// move linearly toward the neighbour on the side of the offset's sign.
#[inline]
pub fn interpolate<T: Sample>(current: T, newer: T, older: T, offset: isize, max_offset: isize) -> T {
    let inv_max = T::one() / from_offset::<T>(max_offset);
    let frac = from_offset::<T>(fast_abs(offset)) * inv_max;
    let current_frac = T::one() - frac;
    current * current_frac + select_on_sign(offset, frac * newer, frac * older)
}

/// Arithmetic mean of the yielded values, zero when there are none.
pub fn mean<T: Sample>(values: impl IntoIterator<Item = T>) -> T {
    let mut sum = T::zero();
    let mut n = 0usize;
    for v in values {
        sum = sum + v;
        n += 1;
    }
    if n == 0 {
        T::zero()
    } else {
        sum / from_count::<T>(n)
    }
}
