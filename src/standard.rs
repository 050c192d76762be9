use crate::config;
use crate::{Bucket, Error, Snapshot};

// new histograms start with this many buckets, covering the whole linear
// region would take 58
const DEFAULT_CAPACITY: usize = 16;

// extra buckets allocated past the highest requested index, amortizes
// repeated growth from inserts that climb the value range
const GROWTH_HEADROOM: usize = 16;

/// A histogram that tracks the distribution of `u64` values with bounded
/// relative error and merges cheaply with other histograms or their
/// serialized [`Snapshot`]s.
///
/// Counters are indexed by bucket and grow on demand as larger values are
/// observed, so memory scales with the span of bucket indices used rather
/// than with the number of observations.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Histogram {
    pub(crate) buckets: Vec<u64>,
    pub(crate) total_count: u64,
    pub(crate) min: u64,
    pub(crate) max: u64,
    pub(crate) min_bucket_index: usize,
}

impl Histogram {
    /// Construct a new empty histogram.
    pub fn new() -> Self {
        Self {
            buckets: vec![0; DEFAULT_CAPACITY],
            total_count: 0,
            min: 0,
            max: 0,
            min_bucket_index: 0,
        }
    }

    /// Record a single occurrence of `value`.
    pub fn increment(&mut self, value: u64) -> Result<(), Error> {
        self.add(value, 1)
    }

    /// Record `count` occurrences of `value`.
    ///
    /// Fails only if the bucket storage needed to cover `value` cannot be
    /// allocated, in which case nothing is recorded.
    pub fn add(&mut self, value: u64, count: u64) -> Result<(), Error> {
        if count == 0 {
            return Ok(());
        }

        let index = config::value_to_index(value);
        self.reserve_index(index)?;

        if self.total_count == 0 {
            self.min = value;
            self.max = value;
            self.min_bucket_index = index;
        } else {
            if value < self.min {
                self.min = value;
            }
            if value > self.max {
                self.max = value;
            }
            if index < self.min_bucket_index {
                self.min_bucket_index = index;
            }
        }

        self.buckets[index] = self.buckets[index].wrapping_add(count);
        self.total_count = self.total_count.wrapping_add(count);

        Ok(())
    }

    /// The number of values recorded.
    pub fn count(&self) -> u64 {
        self.total_count
    }

    /// Whether any values have been recorded.
    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }

    /// The smallest value recorded, zero if the histogram is empty.
    pub fn min(&self) -> u64 {
        self.min
    }

    /// The largest value recorded, zero if the histogram is empty.
    pub fn max(&self) -> u64 {
        self.max
    }

    /// Bytes of memory held, including counter storage.
    pub fn memory_footprint(&self) -> usize {
        core::mem::size_of::<Self>()
            + self.buckets.capacity() * core::mem::size_of::<u64>()
    }

    /// Iterate over the populated buckets in ascending index order.
    pub fn buckets(&self) -> impl Iterator<Item = Bucket> + '_ {
        self.buckets
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > 0)
            .map(|(index, count)| Bucket::at(index, *count))
    }

    /// Estimate the value at `percentile`, which must be within
    /// `0.0..=100.0`.
    ///
    /// The estimate interpolates within the answering bucket and is clamped
    /// to the observed min and max, so its relative error is bounded by half
    /// the bucket growth rate. An empty histogram reports zero.
    pub fn percentile(&self, percentile: f64) -> Result<f64, Error> {
        self.percentiles(&[percentile]).map(|values| values[0])
    }

    /// Estimate several percentiles in a single pass over the buckets.
    ///
    /// Results are returned in the order requested.
    pub fn percentiles(&self, percentiles: &[f64]) -> Result<Vec<f64>, Error> {
        crate::scan_percentiles(
            self.total_count,
            self.min,
            self.max,
            self.buckets.iter().copied().enumerate().rev().map(Ok),
            percentiles,
        )
    }

    /// Estimate the percentage of recorded values at or below `value`.
    ///
    /// Values at or above the observed max report 100. An empty histogram
    /// reports zero.
    pub fn rank(&self, value: u64) -> f64 {
        if self.total_count == 0 {
            return 0.0;
        }

        if value >= self.max {
            return 100.0;
        }

        let index = config::value_to_index(value);
        let below = self.buckets[..index.min(self.buckets.len())]
            .iter()
            .fold(0u64, |sum, count| sum.saturating_add(*count));

        let bucket = Bucket::at(index, self.buckets.get(index).copied().unwrap_or(0));
        let pos = if bucket.upper == bucket.lower {
            0.5
        } else {
            value.saturating_sub(bucket.lower) as f64
                / (bucket.upper - bucket.lower) as f64
        };

        100.0 * (below as f64 + pos * bucket.count as f64) / self.total_count as f64
    }

    /// Combine this histogram with another into a new histogram.
    pub fn merge(&self, other: &Histogram) -> Result<Histogram, Error> {
        let mut merged = self.clone();
        merged.merge_from(other)?;
        Ok(merged)
    }

    /// Fold another histogram into this one.
    ///
    /// On failure this histogram is left unchanged.
    pub fn merge_from(&mut self, other: &Histogram) -> Result<(), Error> {
        self.absorb(
            other.buckets.len().saturating_sub(1),
            other
                .buckets
                .iter()
                .copied()
                .enumerate()
                .filter(|(_, count)| *count > 0),
            other.total_count,
            other.min,
            other.max,
            other.min_bucket_index,
        )
    }

    /// Combine this histogram with a serialized snapshot into a new
    /// histogram.
    pub fn merge_snapshot(&self, snapshot: &Snapshot) -> Result<Histogram, Error> {
        let mut merged = self.clone();
        merged.merge_from_snapshot(snapshot)?;
        Ok(merged)
    }

    /// Fold a serialized snapshot into this histogram.
    ///
    /// The snapshot is fully validated before any counter is touched, so a
    /// malformed buffer or a failed allocation leaves this histogram
    /// unchanged.
    pub fn merge_from_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), Error> {
        let decoded = snapshot.decode()?;
        self.absorb(
            decoded.highest_index(),
            decoded.counts,
            decoded.total_count,
            decoded.min,
            decoded.max,
            decoded.min_bucket_index,
        )
    }

    /// Reconstruct a live histogram from a serialized snapshot.
    pub fn from_snapshot(snapshot: &Snapshot) -> Result<Histogram, Error> {
        let mut histogram = Histogram::new();
        histogram.merge_from_snapshot(snapshot)?;
        Ok(histogram)
    }

    // Elementwise merge shared by every merge entry point. Missing buckets
    // on either side act as zero. An empty source contributes nothing; an
    // empty destination adopts the source summary wholesale, mirroring how
    // the first insert seeds it.
    fn absorb(
        &mut self,
        highest_index: usize,
        counts: impl IntoIterator<Item = (usize, u64)>,
        total_count: u64,
        min: u64,
        max: u64,
        min_bucket_index: usize,
    ) -> Result<(), Error> {
        if total_count == 0 {
            return Ok(());
        }

        self.reserve_index(highest_index)?;

        for (index, count) in counts {
            self.buckets[index] = self.buckets[index].wrapping_add(count);
        }

        if self.total_count == 0 {
            self.min = min;
            self.max = max;
            self.min_bucket_index = min_bucket_index;
        } else {
            if min < self.min {
                self.min = min;
            }
            if max > self.max {
                self.max = max;
            }
            if min_bucket_index < self.min_bucket_index {
                self.min_bucket_index = min_bucket_index;
            }
        }

        self.total_count = self.total_count.wrapping_add(total_count);

        Ok(())
    }

    // Grow the counter array to cover `index`, zero-filling the new region.
    // Growth is fallible and must happen before any other mutation.
    fn reserve_index(&mut self, index: usize) -> Result<(), Error> {
        if index < self.buckets.len() {
            return Ok(());
        }

        let target = index + GROWTH_HEADROOM;
        self.buckets.try_reserve(target - self.buckets.len())?;
        self.buckets.resize(target, 0);

        Ok(())
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}
