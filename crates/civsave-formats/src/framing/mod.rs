//! Chunked-DEFLATE framing of the compressed section
//!
//! The bulk of a save is a zlib stream flushed with `Z_SYNC_FLUSH` and cut
//! into 64 KiB blocks, each preceded by the separator `00 00 01 00`. The
//! logical stream (separators removed) ends with the sync-flush marker
//! `00 00 FF FF`; everything after the framed section is the file footer.
//!
//! # Example
//!
//! ```
//! use civsave_formats::framing::{compress, decompress};
//!
//! let payload = b"player data".repeat(1000);
//! let framed = compress(&payload)?;
//! let section = decompress(&framed)?;
//! assert_eq!(section.payload, payload);
//! # Ok::<(), civsave_formats::framing::FramingError>(())
//! ```

mod blocks;
mod deflate;
mod error;

pub use blocks::{BLOCK_SEPARATOR, BLOCK_SIZE, frame, framed_span, unframe_with};
pub use deflate::{deflate_sync, inflate_flushed, inflate_sync};
pub use error::{FramingError, FramingResult};

use std::ops::Range;

use tracing::debug;

/// Maximum allowed decompression size (1 GiB)
///
/// Limits decompression output to refuse compression bombs.
pub const MAX_DECOMPRESSION_SIZE: usize = 1024 * 1024 * 1024;

/// Decompressed section and where its pieces sit in the input buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecompressedSection {
    /// Inflated payload
    pub payload: Vec<u8>,
    /// Bytes in front of the framed section
    pub header: Range<usize>,
    /// Framed section, from its first separator to the end marker
    pub section: Range<usize>,
    /// Bytes after the framed section
    pub footer: Range<usize>,
}

/// Deflate `payload` and frame it into 64 KiB blocks
pub fn compress(payload: &[u8]) -> FramingResult<Vec<u8>> {
    let stream = deflate_sync(payload)?;
    let framed = frame(&stream);
    debug!(
        "Compressed {} payload bytes into {} framed bytes ({} blocks)",
        payload.len(),
        framed.len(),
        stream.len().div_ceil(BLOCK_SIZE)
    );
    Ok(framed)
}

/// Decompress a framed section that starts at the beginning of `framed`
pub fn decompress(framed: &[u8]) -> FramingResult<DecompressedSection> {
    decompress_at(framed, 0, MAX_DECOMPRESSION_SIZE)
}

/// Decompress the framed section whose first separator is at `start`.
///
/// The section ends at the first `00 00 FF FF` where the zlib stream sits on
/// a block boundary; the same bytes inside stored data are skipped.
pub fn decompress_at(data: &[u8], start: usize, limit: usize) -> FramingResult<DecompressedSection> {
    let (stream, payload) = unframe_with(data, start, |stream| inflate_flushed(stream, limit))?;
    let section = framed_span(start, stream.len());

    debug!(
        "Decompressed section {:?}: {} logical bytes, {} payload bytes",
        section,
        stream.len(),
        payload.len()
    );

    Ok(DecompressedSection {
        payload,
        header: 0..start,
        footer: section.end..data.len(),
        section,
    })
}
