//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float
{
    target_range.0
        + ((value - source_range.0)
        * (target_range.1 - target_range.0)
        / (source_range.1 - source_range.0))
}

/// Return the euclidian norm (distance between) of two points.
///
/// If the points do not have the same number of dimentions then `None` is
/// returned.
pub fn norm<T>(point_0: &[T], point_1: &[T]) -> Option<T>
where
    T: Float
{
    if point_0.len() != point_1.len() {
        return None;
    }

    let sum = point_0
        .iter()
        .zip(point_1.iter())
        .fold(T::zero(), |acc, (&a, &b)| acc + (a - b).powi(2));

    Some(sum.sqrt())
}

/// Limit `value` to the range `[min, max]`, returning the limited value and whether limiting
/// took place.
pub fn clamp<T>(value: T, min: T, max: T) -> (T, bool)
where
    T: Float
{
    if value > max {
        (max, true)
    }
    else if value < min {
        (min, true)
    }
    else {
        (value, false)
    }
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()` if `lhs` is much smaller than `rhs.abs()` in
/// magnitude and `lhs < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}
