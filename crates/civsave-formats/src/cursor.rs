//! Byte cursor over an immutable buffer

use std::io::Cursor;

use binrw::BinRead;
use binrw::meta::ReadEndian;

use crate::error::{SaveError, SaveResult};
use crate::marker::Marker;

/// Read position into a byte buffer plus the marker candidate at that position
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
    marker: Option<Marker>,
}

impl<'a> ByteCursor<'a> {
    /// Create a cursor at the start of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self::at(data, 0)
    }

    /// Create a cursor at an absolute position
    pub fn at(data: &'a [u8], pos: usize) -> Self {
        Self {
            data,
            pos,
            marker: None,
        }
    }

    /// Underlying buffer
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Current absolute position
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Move to an absolute position
    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Bytes left after the current position
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Marker candidate read by the last `advance`
    pub fn marker(&self) -> Option<Marker> {
        self.marker
    }

    /// Re-read the 4 bytes at the current position as the marker candidate.
    ///
    /// Returns `None` at end of stream (fewer than 4 bytes left).
    pub fn advance(&mut self) -> Option<Marker> {
        self.marker = self
            .data
            .get(self.pos..)
            .and_then(<[u8]>::first_chunk::<4>)
            .map(|bytes| Marker::new(*bytes));
        self.marker
    }

    /// Step one byte at a time until `marker` is under the cursor.
    ///
    /// Returns the position of the match, leaving the cursor on it.
    pub fn scan_to(&mut self, marker: Marker) -> Option<usize> {
        while let Some(candidate) = self.advance() {
            if candidate == marker {
                return Some(self.pos);
            }
            self.pos += 1;
        }
        None
    }

    /// Position of the next occurrence of `pattern` at or after the cursor
    pub fn find(&self, pattern: &[u8]) -> Option<usize> {
        find_from(self.data, pattern, self.pos)
    }

    /// Byte at the current position
    pub fn peek_u8(&self) -> SaveResult<u8> {
        self.data.get(self.pos).copied().ok_or(SaveError::Truncated {
            offset: self.pos,
            needed: 1,
        })
    }

    /// Borrow `len` bytes at the current position without advancing
    pub fn peek_bytes(&self, len: usize) -> SaveResult<&'a [u8]> {
        self.pos
            .checked_add(len)
            .and_then(|end| self.data.get(self.pos..end))
            .ok_or(SaveError::Truncated {
                offset: self.pos,
                needed: len,
            })
    }

    /// Borrow `len` bytes and advance past them
    pub fn read_bytes(&mut self, len: usize) -> SaveResult<&'a [u8]> {
        let bytes = self.peek_bytes(len)?;
        self.pos += len;
        Ok(bytes)
    }

    /// Advance by `len` bytes, failing if that runs past the end
    pub fn skip(&mut self, len: usize) -> SaveResult<()> {
        self.read_bytes(len).map(|_| ())
    }

    /// Little-endian u16 at the current position
    pub fn read_u16_le(&mut self) -> SaveResult<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    /// Little-endian u32 at the current position
    pub fn read_u32_le(&mut self) -> SaveResult<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read a fixed-layout structure with binrw and advance past it
    pub fn read_struct<T>(&mut self) -> SaveResult<T>
    where
        T: BinRead + ReadEndian,
        for<'b> T::Args<'b>: Default,
    {
        let start = self.pos;
        let tail = self.data.get(start..).unwrap_or_default();
        let mut reader = Cursor::new(tail);
        let value = T::read_args(&mut reader, T::Args::default()).map_err(|err| {
            if err.is_eof() {
                SaveError::Truncated {
                    offset: start,
                    needed: std::mem::size_of::<T>(),
                }
            } else {
                SaveError::BinRw(err)
            }
        })?;
        self.pos = start + reader.position() as usize;
        Ok(value)
    }
}

/// Position of the first occurrence of `pattern` in `data` at or after `from`
pub fn find_from(data: &[u8], pattern: &[u8], from: usize) -> Option<usize> {
    if pattern.is_empty() {
        return None;
    }
    data.get(from..)?
        .windows(pattern.len())
        .position(|window| window == pattern)
        .map(|offset| from + offset)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_reports_end_of_stream() {
        let data = [1, 2, 3, 4, 5];
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.advance(), Some(Marker::new([1, 2, 3, 4])));
        cursor.set_position(1);
        assert_eq!(cursor.advance(), Some(Marker::new([2, 3, 4, 5])));
        cursor.set_position(2);
        assert_eq!(cursor.advance(), None);
        assert_eq!(cursor.marker(), None);
    }

    #[test]
    fn test_scan_to_marker() {
        let data = [9, 9, 9, 0xAA, 0xBB, 0xCC, 0xDD, 1];
        let mut cursor = ByteCursor::new(&data);
        let target = Marker::new([0xAA, 0xBB, 0xCC, 0xDD]);
        assert_eq!(cursor.scan_to(target), Some(3));
        assert_eq!(cursor.position(), 3);

        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.scan_to(Marker::new([1, 1, 1, 1])), None);
    }

    #[test]
    fn test_bounded_reads() {
        let data = [0x10, 0x00, 0x20, 0x00, 0x00, 0x00];
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.read_u16_le().unwrap(), 0x10);
        assert_eq!(cursor.read_u32_le().unwrap(), 0x20);
        assert!(matches!(
            cursor.read_u32_le(),
            Err(SaveError::Truncated { offset: 6, needed: 4 })
        ));
    }

    #[test]
    fn test_find_from() {
        let data = b"abcabc";
        assert_eq!(find_from(data, b"bc", 0), Some(1));
        assert_eq!(find_from(data, b"bc", 2), Some(4));
        assert_eq!(find_from(data, b"bc", 5), None);
        assert_eq!(find_from(data, b"bc", 50), None);
    }
}
