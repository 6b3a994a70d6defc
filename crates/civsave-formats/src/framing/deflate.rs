//! Sync-flush zlib streams
//!
//! The game never finishes its zlib stream: the body is flushed with
//! `Z_SYNC_FLUSH`, so there is no final block and no Adler-32 trailer.

use adler::adler32_slice;
use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};

use crate::marker::COMPRESSED_DATA_END;

use super::error::{FramingError, FramingResult};

/// Output growth step for both directions
const CHUNK: usize = 64 * 1024;

/// Empty final fixed-Huffman block, what `Z_FINISH` writes after a flush
const FINAL_EMPTY_BLOCK: [u8; 2] = [0x03, 0x00];

/// Deflate `data` into a zlib stream ending in a single sync flush
pub fn deflate_sync(data: &[u8]) -> FramingResult<Vec<u8>> {
    let mut compressor = Compress::new(Compression::default(), true);
    // Room for incompressible input plus stored-block overhead, so the
    // flush normally completes in one call and emits one end marker.
    let mut output = Vec::with_capacity(data.len() + data.len() / 8 + CHUNK);

    loop {
        let consumed = compressor.total_in() as usize;
        let before = compressor.total_out();
        compressor
            .compress_vec(&data[consumed..], &mut output, FlushCompress::Sync)
            .map_err(|e| FramingError::CompressionFailed(e.to_string()))?;

        let has_room = output.len() < output.capacity();
        if compressor.total_in() as usize == data.len() && has_room {
            return Ok(output);
        }
        if has_room && compressor.total_out() == before && compressor.total_in() as usize == consumed
        {
            return Err(FramingError::CompressionFailed(
                "compressor made no progress".to_string(),
            ));
        }
        output.reserve(CHUNK);
    }
}

/// Inflate a sync-flushed zlib stream, refusing output larger than `limit`.
///
/// The stream must stop on a deflate block boundary. A stream cut inside a
/// block fails with [`FramingError::DecompressionFailed`].
pub fn inflate_sync(stream: &[u8], limit: usize) -> FramingResult<Vec<u8>> {
    inflate_flushed(stream, limit)?.ok_or_else(|| {
        FramingError::DecompressionFailed(format!(
            "stream of {} bytes ends inside a deflate block",
            stream.len()
        ))
    })
}

/// Inflate `stream` if it ends exactly where a sync flush left it.
///
/// Returns `Ok(None)` when the stream does not end in `00 00 FF FF` or stops
/// inside a deflate block, which is what a `00 00 FF FF` run inside block
/// data looks like. Errors are reserved for input no prefix of a valid
/// stream could produce, and for the size limit.
pub fn inflate_flushed(stream: &[u8], limit: usize) -> FramingResult<Option<Vec<u8>>> {
    if !stream.ends_with(&COMPRESSED_DATA_END) {
        return Ok(None);
    }

    let mut decompressor = Decompress::new(true);
    let mut output = Vec::with_capacity(stream.len().saturating_mul(4).min(limit).max(CHUNK));

    loop {
        let consumed = decompressor.total_in() as usize;
        let produced = decompressor.total_out();
        let status = decompressor
            .decompress_vec(&stream[consumed..], &mut output, FlushDecompress::Sync)
            .map_err(|e| FramingError::DecompressionFailed(e.to_string()))?;

        if output.len() > limit {
            return Err(FramingError::SizeLimitExceeded { limit });
        }

        let input_done = decompressor.total_in() as usize == stream.len();
        let has_room = output.len() < output.capacity();
        match status {
            Status::StreamEnd => return Ok(input_done.then_some(output)),
            _ if input_done && has_room => break,
            _ if has_room
                && decompressor.total_in() as usize == consumed
                && decompressor.total_out() == produced =>
            {
                return Err(FramingError::DecompressionFailed(format!(
                    "inflate stalled at input offset {consumed}"
                )));
            }
            _ => {}
        }

        if output.len() == limit {
            return Err(FramingError::SizeLimitExceeded { limit });
        }
        output.reserve(CHUNK.min(limit - output.len()).max(1));
    }

    Ok(seal(&mut decompressor, stream.len(), &mut output).then_some(output))
}

/// Finish the stream with an empty final block and its checksum.
///
/// Only an inflater resting on a block boundary reaches a clean end of
/// stream here; one inside a stored or Huffman block reads the seal as data.
fn seal(decompressor: &mut Decompress, stream_len: usize, output: &mut Vec<u8>) -> bool {
    let mut trailer = FINAL_EMPTY_BLOCK.to_vec();
    trailer.extend_from_slice(&adler32_slice(output).to_be_bytes());

    let before = output.len();
    output.reserve(trailer.len());
    let status = decompressor.decompress_vec(&trailer, output, FlushDecompress::Finish);
    let sealed = matches!(status, Ok(Status::StreamEnd))
        && decompressor.total_in() as usize == stream_len + trailer.len()
        && output.len() == before;
    output.truncate(before);
    sealed
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cursor::find_from;
    use crate::marker::{COMPRESSED_DATA_END, ZLIB_HEADER};

    #[test]
    fn test_stream_shape() {
        let stream = deflate_sync(b"hello hello hello").unwrap();
        assert_eq!(&stream[..2], &ZLIB_HEADER);
        assert!(stream.ends_with(&COMPRESSED_DATA_END));
        assert_eq!(
            find_from(&stream, &COMPRESSED_DATA_END, 0),
            Some(stream.len() - 4)
        );
    }

    #[test]
    fn test_inflate_roundtrip() {
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let stream = deflate_sync(&data).unwrap();
        assert_eq!(inflate_sync(&stream, usize::MAX).unwrap(), data);
    }

    #[test]
    fn test_empty_input() {
        let stream = deflate_sync(&[]).unwrap();
        assert!(stream.ends_with(&COMPRESSED_DATA_END));
        assert!(inflate_sync(&stream, 1024).unwrap().is_empty());
    }

    #[test]
    fn test_inflate_limit() {
        let stream = deflate_sync(&vec![0u8; 100_000]).unwrap();
        assert!(matches!(
            inflate_sync(&stream, 1000),
            Err(FramingError::SizeLimitExceeded { limit: 1000 })
        ));
    }

    /// Xorshift bytes that deflate stores verbatim
    fn incompressible(len: usize) -> Vec<u8> {
        let mut state: u32 = 0x2545_F491;
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state >> 8) as u8
            })
            .collect()
    }

    #[test]
    fn test_truncated_stream_is_rejected() {
        let stream = deflate_sync(&incompressible(20_000)).unwrap();
        for cut in [100, 5_000, 15_000, stream.len() - 1] {
            assert!(
                matches!(
                    inflate_sync(&stream[..cut], usize::MAX),
                    Err(FramingError::DecompressionFailed(_))
                ),
                "cut {cut}"
            );
        }
        assert_eq!(inflate_sync(&stream, usize::MAX).unwrap().len(), 20_000);
    }

    #[test]
    fn test_marker_inside_stored_block_is_not_an_end() {
        let mut data = incompressible(20_000);
        data[10_000..10_004].copy_from_slice(&COMPRESSED_DATA_END);
        let stream = deflate_sync(&data).unwrap();

        let inner = find_from(&stream, &COMPRESSED_DATA_END, 0).unwrap();
        assert!(inner + 4 < stream.len());
        assert_eq!(inflate_flushed(&stream[..inner + 4], usize::MAX).unwrap(), None);
        assert_eq!(inflate_flushed(&stream, usize::MAX).unwrap(), Some(data));
    }

    #[test]
    fn test_inflate_garbage() {
        assert!(inflate_sync(&[0x78, 0x9C, 0xFF, 0xFF, 0xFF, 0xFF], 1024).is_err());
    }
}
