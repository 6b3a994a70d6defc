//! Primitive payload decoders
//!
//! Every decoder expects the cursor just past the 8-byte record header and
//! leaves it on the first byte of the next record.

use binrw::{BinRead, BinWrite};

use crate::cursor::ByteCursor;
use crate::error::{SaveError, SaveResult};
use crate::marker::{COMPRESSED_DATA_END, Marker};

use super::Value;

/// Sub-format byte of a decodable narrow string
pub const STRING_KIND_UTF8: u8 = 0x21;

/// Narrow-string sub-format bytes that are skipped undecoded
const STRING_KIND_SKIPPED: [u8; 2] = [0x00, 0x20];

/// Fixed sub-header following a wide string's length
pub const WIDE_STRING_SUBHEADER: [u8; 6] = [0x00, 0x21, 0x02, 0x00, 0x00, 0x00];

/// Sentinel that widens a type 0x15 payload from 12 to 20 bytes
const OPAQUE_15_WIDE: [u8; 4] = [0x00, 0x00, 0x00, 0x80];

/// Marker and type tag at the start of every record
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct RecordHeader {
    /// Field identifier
    pub marker: Marker,
    /// Raw type tag
    pub tag: u32,
}

impl RecordHeader {
    /// Encoded size in bytes
    pub const SIZE: usize = 8;
}

/// Payload shared by booleans, integers and array lengths
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct IntegerPayload {
    /// Not interpreted; the array-length writer sets byte 3 to 5
    pub reserved: [u8; 8],
    /// Value (booleans only look at the low byte)
    pub value: u32,
}

impl IntegerPayload {
    /// Encoded size in bytes
    pub const SIZE: usize = 12;
}

/// Header the writer emits in front of narrow-string text
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct NarrowStringHeader {
    /// Text length including the null terminator
    pub length: u16,
    /// Third byte of the length field
    pub length_high: u8,
    /// Sub-format selector
    pub kind: u8,
    /// Trailing sub-header bytes
    pub flags: [u8; 4],
}

impl NarrowStringHeader {
    /// Header for text of `length` bytes including the terminator
    pub fn utf8(length: u16) -> Self {
        Self {
            length,
            length_high: 0,
            kind: STRING_KIND_UTF8,
            flags: [0x01, 0x00, 0x00, 0x00],
        }
    }
}

pub(super) fn decode_bool(cursor: &mut ByteCursor<'_>) -> SaveResult<bool> {
    let payload: IntegerPayload = cursor.read_struct()?;
    Ok(payload.value & 0xFF != 0)
}

pub(super) fn decode_integer(cursor: &mut ByteCursor<'_>) -> SaveResult<u32> {
    let payload: IntegerPayload = cursor.read_struct()?;
    Ok(payload.value)
}

/// Narrow strings trust the null terminator for the text and the declared
/// length only for how far to advance.
pub(super) fn decode_narrow_string(cursor: &mut ByteCursor<'_>) -> SaveResult<Value> {
    let start = cursor.position();
    let head = cursor.peek_bytes(8)?;
    let declared = u32::from_le_bytes([head[0], head[1], head[2], 0]) as usize;
    let kind = head[3];

    if STRING_KIND_SKIPPED.contains(&kind) {
        cursor.skip(12)?;
        return Ok(Value::UnsupportedString);
    }

    if kind != STRING_KIND_UTF8 {
        return Err(SaveError::MalformedString {
            offset: start,
            reason: format!("unknown narrow string kind 0x{kind:02X}"),
        });
    }

    cursor.skip(8)?;
    let text_start = cursor.position();
    let terminator = cursor.find(&[0]).ok_or(SaveError::MissingSentinel {
        offset: text_start,
        what: "string terminator",
    })?;
    let text = String::from_utf8_lossy(&cursor.data()[text_start..terminator]).into_owned();
    cursor.skip(declared)?;

    Ok(Value::Text(text))
}

pub(super) fn decode_wide_string(cursor: &mut ByteCursor<'_>) -> SaveResult<String> {
    let start = cursor.position();
    let byte_len = usize::from(cursor.read_u16_le()?) * 2;

    let subheader = cursor.read_bytes(WIDE_STRING_SUBHEADER.len())?;
    if subheader != WIDE_STRING_SUBHEADER {
        return Err(SaveError::MalformedString {
            offset: start,
            reason: format!("unexpected wide string sub-header {subheader:02X?}"),
        });
    }

    let payload = cursor.read_bytes(byte_len)?;
    let units = payload[..byte_len.saturating_sub(2)]
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
    Ok(char::decode_utf16(units)
        .map(|unit| unit.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect())
}

pub(super) fn skip_opaque_15(cursor: &mut ByteCursor<'_>) -> SaveResult<()> {
    let wide = cursor
        .peek_bytes(OPAQUE_15_WIDE.len())
        .is_ok_and(|bytes| bytes == OPAQUE_15_WIDE);
    cursor.skip(if wide { 20 } else { 12 })
}

/// Embedded blobs are not inflated; the cursor jumps past their end sentinel.
pub(super) fn skip_compressed(cursor: &mut ByteCursor<'_>) -> SaveResult<()> {
    let start = cursor.position();
    let end = cursor
        .find(&COMPRESSED_DATA_END)
        .ok_or(SaveError::MissingSentinel {
            offset: start,
            what: "end of compressed data",
        })?;
    cursor.set_position(end + COMPRESSED_DATA_END.len());
    Ok(())
}
