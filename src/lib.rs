//! A mergeable histogram datastructure for tracking how often values occur
//! and reporting on their distribution.
//!
//! Values across the full `u64` range are stored with minimal loss of
//! precision by using exact buckets for small values and transitioning to
//! logarithmic buckets, each two percent wider than the last, for larger
//! ones. A few hundred counters cover the whole range, so recording is a
//! bucket lookup and an increment no matter how many values have been seen.
//!
//! Histograms serialize into compact [`Snapshot`]s that can be shipped
//! between processes. Percentile queries and merges operate on the
//! serialized bytes directly, producing the same results as their live
//! counterparts without deserializing first:
//!
//! * [`Histogram`] - record values, query percentiles and ranks, merge
//! * [`Snapshot`] - the wire form; query and merge without deserializing
//!
//! ```
//! use mergehist::Histogram;
//!
//! let mut latencies = Histogram::new();
//! for value in [450, 470, 480, 520, 560, 9000] {
//!     latencies.increment(value)?;
//! }
//!
//! let p99 = latencies.percentile(99.0)?;
//! assert!(p99 > 560.0);
//!
//! // ship the snapshot elsewhere and query it there
//! let snapshot = latencies.snapshot();
//! assert_eq!(snapshot.percentile(99.0)?, p99);
//! # Ok::<(), mergehist::Error>(())
//! ```

mod bucket;
mod config;
mod errors;
mod snapshot;
mod standard;
mod varint;

pub use bucket::Bucket;
pub use errors::{DecodeError, Error};
pub use snapshot::Snapshot;
pub use standard::Histogram;

/// The percentile scan shared by the live and serialized representations.
///
/// Walks buckets from the highest index down, accumulating counts toward
/// each requested percentile's target rank, counted from the top. The
/// source only has to supply `(index, count)` pairs in descending index
/// order, which is how a live histogram iterates and how the wire format
/// lays out its bucket run, so both representations produce identical
/// estimates.
pub(crate) fn scan_percentiles<I>(
    total_count: u64,
    min: u64,
    max: u64,
    buckets: I,
    percentiles: &[f64],
) -> Result<Vec<f64>, Error>
where
    I: IntoIterator<Item = Result<(usize, u64), Error>>,
{
    for percentile in percentiles {
        if !(0.0..=100.0).contains(percentile) {
            return Err(Error::InvalidPercentile);
        }
    }

    // walk the requested percentiles highest first, the same direction as
    // the bucket scan, so each is satisfied in turn in a single pass
    let mut order: Vec<usize> = (0..percentiles.len()).collect();
    order.sort_by(|a, b| percentiles[*b].partial_cmp(&percentiles[*a]).unwrap());

    // anything not reached by the scan reports the observed minimum
    let mut results = vec![min as f64; percentiles.len()];

    if total_count == 0 {
        return Ok(results);
    }

    let mut cumulative = 0u64;
    let mut satisfied = 0usize;

    for entry in buckets {
        let (index, count) = entry?;

        if count == 0 {
            continue;
        }

        while satisfied < order.len() {
            let percentile = percentiles[order[satisfied]];
            let target = (100.0 - percentile) / 100.0 * total_count as f64;

            if cumulative.saturating_add(count) as f64 >= target {
                // fractional position inside the bucket, zero at the top
                let pos = (target - cumulative as f64) / count as f64;

                // interpolate between the bucket bounds, clamped so the
                // estimate never escapes the observed range
                let bucket = Bucket::at(index, count);
                let upper = bucket.upper.min(max) as f64;
                let lower = bucket.lower.max(min) as f64;

                results[order[satisfied]] = upper - pos * (upper - lower);
                satisfied += 1;
            } else {
                break;
            }
        }

        if satisfied == order.len() {
            break;
        }

        cumulative = cumulative.saturating_add(count);
    }

    Ok(results)
}
