//! Maps values to bucket indices and back.
//!
//! Small values get exact resolution: everything up to `MAX_LINEAR_VALUE`
//! lands in a bucket whose index equals the value itself. Above that point
//! buckets widen geometrically, each spanning `GROWTH_RATE` of its lower
//! bound, which caps the relative error of an estimate at half the bucket
//! width. The logarithmic indices are shifted down by `INDEX_OFFSET` so that
//! they continue immediately after the linear region with no gap and no
//! overlap.
//!
//! These constants define the bucket layout and therefore the wire format.
//! Histograms built from different constants are not comparable or mergeable,
//! so they are fixed at compile time rather than configurable per instance.

/// Relative width of each bucket in the logarithmic region.
pub(crate) const GROWTH_RATE: f64 = 0.02;

/// Values at or below this map to the bucket index equal to the value.
pub(crate) const MAX_LINEAR_VALUE: u64 = 57;

/// Reciprocal of `log2(1 + GROWTH_RATE)`.
pub(crate) const INDEX_SCALE: f64 = 35.00278878;

/// Shift that makes the first logarithmic index continue from the linear
/// region: `floor(log2(58) * INDEX_SCALE) - 58`.
pub(crate) const INDEX_OFFSET: usize = 147;

/// Index of the bucket containing `u64::MAX`. No valid value maps higher, so
/// snapshot headers declaring a larger index are malformed.
pub(crate) const MAX_INDEX: usize = 2093;

/// Map a value to its bucket index.
pub(crate) fn value_to_index(value: u64) -> usize {
    if value <= MAX_LINEAR_VALUE {
        return value as usize;
    }

    ((value as f64).log2() * INDEX_SCALE) as usize - INDEX_OFFSET
}

/// Smallest value that maps to the bucket at `index`.
pub(crate) fn index_to_lower_bound(index: usize) -> u64 {
    if index <= MAX_LINEAR_VALUE as usize {
        return index as u64;
    }

    (1.0 + GROWTH_RATE).powi((index + INDEX_OFFSET) as i32).ceil() as u64
}

/// Largest value covered by the bucket at `index`.
pub(crate) fn index_to_upper_bound(index: usize) -> u64 {
    let lower = index_to_lower_bound(index);

    if index <= MAX_LINEAR_VALUE as usize {
        return lower;
    }

    lower.saturating_add((lower as f64 * GROWTH_RATE) as u64)
}
