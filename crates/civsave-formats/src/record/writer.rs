//! Record serialization
//!
//! Only the types that editing actually touches can be written: integers,
//! array lengths and narrow strings. Everything else is read-only.

use std::io::Cursor;

use binrw::BinWrite;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::error::{SaveError, SaveResult};
use crate::marker::Marker;

use super::codec::{IntegerPayload, NarrowStringHeader, RecordHeader};
use super::{TypeTag, Value};

/// Reserved bytes the game writes in front of array lengths
const ARRAY_START_RESERVED: [u8; 8] = [0x00, 0x00, 0x00, 0x05, 0x00, 0x00, 0x00, 0x00];

/// Serialize a record back into its on-disk encoding
pub fn encode_record(marker: Marker, tag: TypeTag, value: &Value) -> SaveResult<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());

    match tag {
        TypeTag::INTEGER | TypeTag::ARRAY_START => {
            let value = value.as_integer().ok_or(SaveError::ValueMismatch {
                tag: tag.value(),
                expected: "integer",
            })?;
            let reserved = if tag == TypeTag::ARRAY_START {
                ARRAY_START_RESERVED
            } else {
                [0; 8]
            };
            RecordHeader {
                marker,
                tag: tag.value(),
            }
            .write_le(&mut out)?;
            IntegerPayload { reserved, value }.write_le(&mut out)?;
        }
        TypeTag::NARROW_STRING => {
            let text = value.as_text().ok_or(SaveError::ValueMismatch {
                tag: tag.value(),
                expected: "text",
            })?;
            let bytes = to_single_byte(text);
            let length = u16::try_from(bytes.len() + 1)
                .map_err(|_| SaveError::StringTooLong { len: bytes.len() })?;
            RecordHeader {
                marker,
                tag: tag.value(),
            }
            .write_le(&mut out)?;
            NarrowStringHeader::utf8(length).write_le(&mut out)?;
            out.get_mut().extend_from_slice(&bytes);
            out.get_mut().push(0);
        }
        _ => return Err(SaveError::UnsupportedWrite { tag: tag.value() }),
    }

    Ok(out.into_inner())
}

/// Strip diacritics and squeeze text into single-byte ASCII.
///
/// Characters with no ASCII form become `?`, as do embedded nulls.
pub fn to_single_byte(text: &str) -> Vec<u8> {
    text.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| match c {
            '\0' => b'?',
            c if c.is_ascii() => c as u8,
            _ => b'?',
        })
        .collect()
}
