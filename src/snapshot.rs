//! The serialized snapshot format and the operations that work directly on
//! serialized bytes.
//!
//! A snapshot is a header of five varints - bucket span, total count, min,
//! max minus min, lowest bucket index - followed by one varint count per
//! bucket from the highest populated index down to the lowest, with zeros
//! inside that span encoded explicitly. Percentile queries and merges decode
//! the run as they walk it; nothing is ever fully deserialized unless a live
//! histogram is asked for.

use crate::config::MAX_INDEX;
use crate::varint::{self, Reader};
use crate::{DecodeError, Error, Histogram};

/// An immutable serialized histogram.
///
/// A snapshot captures the state of a [`Histogram`] at one point in time and
/// never changes afterwards; mutating the source histogram does not affect
/// snapshots already produced. The bytes are self-contained and can be
/// stored or shipped between processes, then queried or merged on the
/// receiving side without rebuilding a live histogram.
///
/// `from_bytes` does not validate: a malformed buffer surfaces as an
/// [`Error::Decode`] from whichever operation first reads the broken region.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot {
    bytes: Vec<u8>,
}

impl Snapshot {
    /// Wrap received bytes as a snapshot.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// The serialized representation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the snapshot, returning the serialized representation.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// The serialized size in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// The number of values recorded, read from the header.
    pub fn count(&self) -> Result<u64, Error> {
        Ok(self.header()?.0.total_count)
    }

    /// The smallest value recorded, read from the header.
    pub fn min(&self) -> Result<u64, Error> {
        Ok(self.header()?.0.min)
    }

    /// The largest value recorded, read from the header.
    pub fn max(&self) -> Result<u64, Error> {
        Ok(self.header()?.0.max)
    }

    /// Estimate the value at `percentile` directly from the serialized
    /// bytes.
    ///
    /// Produces the same estimate as [`Histogram::percentile`] on the
    /// histogram the snapshot was taken from.
    pub fn percentile(&self, percentile: f64) -> Result<f64, Error> {
        self.percentiles(&[percentile]).map(|values| values[0])
    }

    /// Estimate several percentiles in one decoding pass over the bucket
    /// run. Results are returned in the order requested.
    pub fn percentiles(&self, percentiles: &[f64]) -> Result<Vec<f64>, Error> {
        let (header, reader) = self.header()?;
        crate::scan_percentiles(
            header.total_count,
            header.min,
            header.max,
            BucketRun::new(&header, reader),
            percentiles,
        )
    }

    /// Combine two snapshots into a new live histogram.
    pub fn merge(&self, other: &Snapshot) -> Result<Histogram, Error> {
        let mut merged = Histogram::from_snapshot(self)?;
        merged.merge_from_snapshot(other)?;
        Ok(merged)
    }

    fn header(&self) -> Result<(Header, Reader<'_>), DecodeError> {
        let mut reader = Reader::new(&self.bytes);

        let span = header_field(&mut reader)?;
        let total_count = header_field(&mut reader)?;
        let min = header_field(&mut reader)?;
        let max_delta = header_field(&mut reader)?;
        let min_bucket_index = header_field(&mut reader)?;

        let highest = min_bucket_index.saturating_add(span.saturating_sub(1));
        if highest > MAX_INDEX as u64 {
            return Err(DecodeError::IndexOutOfRange { index: highest });
        }

        Ok((
            Header {
                span: span as usize,
                total_count,
                min,
                max: min.saturating_add(max_delta),
                min_bucket_index: min_bucket_index as usize,
            },
            reader,
        ))
    }

    // Validate the whole buffer and collect the populated buckets, for the
    // merge paths that must not touch their destination until the input is
    // known to be good.
    pub(crate) fn decode(&self) -> Result<Decoded, Error> {
        let (header, reader) = self.header()?;

        let mut counts = Vec::new();
        counts.try_reserve(header.span)?;

        for entry in BucketRun::new(&header, reader) {
            let (index, count) = entry?;
            if count > 0 {
                counts.push((index, count));
            }
        }

        Ok(Decoded {
            total_count: header.total_count,
            min: header.min,
            max: header.max,
            min_bucket_index: header.min_bucket_index,
            highest: header.highest_index(),
            counts,
        })
    }
}

struct Header {
    span: usize,
    total_count: u64,
    min: u64,
    max: u64,
    min_bucket_index: usize,
}

impl Header {
    fn highest_index(&self) -> usize {
        if self.span == 0 {
            self.min_bucket_index
        } else {
            self.min_bucket_index + self.span - 1
        }
    }
}

fn header_field(reader: &mut Reader<'_>) -> Result<u64, DecodeError> {
    reader.read_varint().ok_or(DecodeError::TruncatedHeader {
        offset: reader.position(),
    })
}

pub(crate) struct Decoded {
    pub(crate) total_count: u64,
    pub(crate) min: u64,
    pub(crate) max: u64,
    pub(crate) min_bucket_index: usize,
    pub(crate) counts: Vec<(usize, u64)>,
    highest: usize,
}

impl Decoded {
    pub(crate) fn highest_index(&self) -> usize {
        self.highest
    }
}

// Walks the dense bucket run, decoding one count per step. The wire order is
// highest index first, which is exactly the order the percentile scan wants.
struct BucketRun<'a> {
    reader: Reader<'a>,
    next_index: usize,
    remaining: usize,
}

impl<'a> BucketRun<'a> {
    fn new(header: &Header, reader: Reader<'a>) -> Self {
        Self {
            reader,
            next_index: header.highest_index(),
            remaining: header.span,
        }
    }
}

impl Iterator for BucketRun<'_> {
    type Item = Result<(usize, u64), Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let count = match self.reader.read_varint() {
            Some(count) => count,
            None => {
                self.remaining = 0;
                return Some(Err(DecodeError::TruncatedRun {
                    offset: self.reader.position(),
                }
                .into()));
            }
        };

        let index = self.next_index;
        self.remaining -= 1;
        if self.remaining > 0 {
            self.next_index -= 1;
        }

        Some(Ok((index, count)))
    }
}

impl Histogram {
    /// Serialize this histogram into a compact snapshot.
    ///
    /// The encoding covers only the span of bucket indices between the
    /// lowest and highest ever populated, so its size tracks the spread of
    /// observed values, not how many there were.
    pub fn snapshot(&self) -> Snapshot {
        let mut bytes = Vec::new();

        match self.buckets.iter().rposition(|count| *count > 0) {
            Some(highest) => {
                let lowest = self.min_bucket_index.min(highest);
                varint::encode((highest - lowest + 1) as u64, &mut bytes);
                varint::encode(self.total_count, &mut bytes);
                varint::encode(self.min, &mut bytes);
                varint::encode(self.max - self.min, &mut bytes);
                varint::encode(lowest as u64, &mut bytes);

                for index in (lowest..=highest).rev() {
                    varint::encode(self.buckets[index], &mut bytes);
                }
            }
            None => {
                varint::encode(0, &mut bytes);
                varint::encode(self.total_count, &mut bytes);
                varint::encode(self.min, &mut bytes);
                varint::encode(self.max - self.min, &mut bytes);
                varint::encode(self.min_bucket_index as u64, &mut bytes);
            }
        }

        Snapshot { bytes }
    }
}
