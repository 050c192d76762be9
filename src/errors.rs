use thiserror::Error;

/// Errors for histogram operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The requested percentile was outside of the range 0.0 - 100.0
    /// (inclusive)
    #[error("percentile must be within 0.0..=100.0")]
    InvalidPercentile,
    /// Growing the bucket storage failed. The histogram is unchanged.
    #[error("failed to allocate bucket storage")]
    Allocation(#[from] std::collections::TryReserveError),
    /// A serialized snapshot could not be parsed.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Errors for parsing a serialized snapshot. The variants identify whether
/// the header or the bucket run failed, and where.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The buffer ended inside the five varint header fields.
    #[error("snapshot truncated in header at byte {offset}")]
    TruncatedHeader { offset: usize },
    /// The buffer ended before every bucket count declared by the header was
    /// read.
    #[error("snapshot truncated in bucket run at byte {offset}")]
    TruncatedRun { offset: usize },
    /// The header declares a bucket index no value can map to.
    #[error("snapshot declares bucket index {index}, above the supported maximum")]
    IndexOutOfRange { index: u64 },
}
