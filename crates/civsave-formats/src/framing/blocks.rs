//! 64 KiB block framing
//!
//! ```text
//! Framed section:
//! ├── Separator [00 00 01 00]
//! ├── Block 0 (64 KiB)
//! ├── Separator [00 00 01 00]
//! ├── ...
//! └── Last block (1..=64 KiB, never followed by a separator)
//! ```

use std::ops::Range;

use crate::cursor::find_from;
use crate::marker::{COMPRESSED_DATA_END, END_UNCOMPRESSED};

use super::error::{FramingError, FramingResult};

/// Size of one framed block
pub const BLOCK_SIZE: usize = 64 * 1024;

/// Bytes written in front of every block
pub const BLOCK_SEPARATOR: [u8; 4] = END_UNCOMPRESSED.0;

/// Split a logical stream into separator-prefixed blocks
pub fn frame(stream: &[u8]) -> Vec<u8> {
    let separators = stream.len().div_ceil(BLOCK_SIZE).max(1);
    let mut framed = Vec::with_capacity(stream.len() + separators * BLOCK_SEPARATOR.len());

    framed.extend_from_slice(&BLOCK_SEPARATOR);
    let mut blocks = stream.chunks(BLOCK_SIZE).peekable();
    while let Some(block) = blocks.next() {
        framed.extend_from_slice(block);
        if blocks.peek().is_some() {
            framed.extend_from_slice(&BLOCK_SEPARATOR);
        }
    }
    framed
}

/// Physical span of a framed section whose logical stream is `logical_len` bytes
pub fn framed_span(start: usize, logical_len: usize) -> Range<usize> {
    let inner_separators = logical_len.saturating_sub(1) / BLOCK_SIZE;
    let end = start + BLOCK_SEPARATOR.len() + logical_len + inner_separators * BLOCK_SEPARATOR.len();
    start..end
}

/// Strip separators from the framed section starting at `start`.
///
/// Blocks are joined until `accept` takes the joined stream up to one of its
/// `00 00 FF FF` runs as complete. A run that `accept` turns down is block
/// data, and the search moves on to the next one. Returns the stream, ending
/// with the accepted marker, and whatever `accept` produced for it.
pub fn unframe_with<T, F>(data: &[u8], start: usize, mut accept: F) -> FramingResult<(Vec<u8>, T)>
where
    F: FnMut(&[u8]) -> FramingResult<Option<T>>,
{
    expect_separator(data, start)?;

    let mut stream = Vec::new();
    let mut search_from = 0;
    let mut pos = start + BLOCK_SEPARATOR.len();
    loop {
        let block_end = (pos + BLOCK_SIZE).min(data.len());
        stream.extend_from_slice(&data[pos..block_end]);

        while let Some(found) = find_from(&stream, &COMPRESSED_DATA_END, search_from) {
            let end = found + COMPRESSED_DATA_END.len();
            if let Some(value) = accept(&stream[..end])? {
                stream.truncate(end);
                return Ok((stream, value));
            }
            search_from = found + 1;
        }
        search_from = search_from.max(stream.len().saturating_sub(COMPRESSED_DATA_END.len() - 1));

        if block_end == data.len() {
            return Err(FramingError::MissingEndMarker { offset: start });
        }
        pos = block_end;
        expect_separator(data, pos)?;
        pos += BLOCK_SEPARATOR.len();
    }
}

fn expect_separator(data: &[u8], offset: usize) -> FramingResult<()> {
    let found = data
        .get(offset..)
        .map(|tail| &tail[..tail.len().min(BLOCK_SEPARATOR.len())])
        .unwrap_or_default();
    if found == BLOCK_SEPARATOR {
        Ok(())
    } else {
        Err(FramingError::MissingSeparator {
            offset,
            found: found.to_vec(),
        })
    }
}
