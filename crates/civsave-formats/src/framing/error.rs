//! Compression framing error types

use thiserror::Error;

/// Errors raised while unframing, inflating or deflating the compressed section
#[derive(Debug, Error)]
pub enum FramingError {
    /// A block separator was expected but other bytes were found
    #[error("missing block separator at offset {offset}: expected [00 00 01 00], got {found:02X?}")]
    MissingSeparator {
        /// Offset where the separator should start
        offset: usize,
        /// Bytes found instead
        found: Vec<u8>,
    },

    /// The sync-flush end marker never appeared in the logical stream
    #[error("compressed section starting at offset {offset} has no [00 00 FF FF] end marker")]
    MissingEndMarker {
        /// Offset of the section's first separator
        offset: usize,
    },

    /// Deflate failed
    #[error("compression failed: {0}")]
    CompressionFailed(String),

    /// Inflate failed
    #[error("decompression failed: {0}")]
    DecompressionFailed(String),

    /// Decompressed output grew past the configured limit
    #[error("decompressed size exceeds limit of {limit} bytes")]
    SizeLimitExceeded {
        /// Limit in bytes
        limit: usize,
    },
}

/// Result type for framing operations
pub type FramingResult<T> = Result<T, FramingError>;
