//! Branchless integer helpers for the push and read hot paths
//!
//! All signed helpers assume operands whose difference fits in `isize`,
//! which holds for every slot, offset and period a ring can produce.

const SIGN_SHIFT: u32 = isize::BITS - 1;

/// True when `n` is a positive power of two.
#[inline]
pub fn is_power_of_two(n: isize) -> bool {
    n > 0 && (n & (n - 1)) == 0
}

/// Larger of `a` and `b` without a branch.
#[inline]
pub fn fast_max(a: isize, b: isize) -> isize {
    let diff = a.wrapping_sub(b);
    let sign = diff >> SIGN_SHIFT;
    a.wrapping_sub(diff & sign)
}

/// Smaller of `a` and `b` without a branch.
#[inline]
pub fn fast_min(a: isize, b: isize) -> isize {
    let diff = a.wrapping_sub(b);
    let sign = diff >> SIGN_SHIFT;
    b.wrapping_add(diff & sign)
}

/// Absolute value without a branch.
#[inline]
pub fn fast_abs(x: isize) -> isize {
    // -1 if x < 0, 0 otherwise
    let mask = x >> SIGN_SHIFT;
    x.wrapping_add(mask) ^ mask
}

/// Returns `on_greater` when `comparator >= 0`, otherwise `on_lower`.
#[inline]
pub fn select_on_sign(comparator: isize, on_lower: isize, on_greater: isize) -> isize {
    let flag = !(comparator >> SIGN_SHIFT) & 1;
    on_lower.wrapping_add(on_greater.wrapping_sub(on_lower).wrapping_mul(flag))
}

/// `item^exp`, or `None` on overflow.
pub fn pow(item: usize, exp: usize) -> Option<usize> {
    let mut magnitude: usize = 1;
    for _ in 0..exp {
        magnitude = magnitude.checked_mul(item)?;
    }
    Some(magnitude)
}

/// Base-2 logarithm of a power of two.
#[inline]
pub fn log2_pow2(n: usize) -> u32 {
    debug_assert!(n.is_power_of_two());
    n.trailing_zeros()
}
