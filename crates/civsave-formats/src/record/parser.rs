//! Cursor-driven record parser

use tracing::trace;

use crate::cursor::ByteCursor;
use crate::error::{SaveError, SaveResult};
use crate::marker::{END_OF_DATA, GameDataField, Marker, ZLIB_HEADER};

use super::codec::{self, RecordHeader};
use super::{ArrayElement, Record, TypeTag, Value};

/// Default limit for arrays nested inside array elements
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Each array element ends with a string record holding this text
const ELEMENT_TERMINATOR: &str = "1";

/// Leading byte of every array element
const ARRAY_ELEMENT_MARKER: u8 = 0x0A;

/// Width of the header in front of each array element
const ARRAY_ELEMENT_HEADER: usize = 16;

/// Produces one typed record per step from a byte buffer
#[derive(Debug, Clone)]
pub struct RecordParser<'a> {
    cursor: ByteCursor<'a>,
    max_depth: usize,
}

impl<'a> RecordParser<'a> {
    /// Parser positioned at `start` within `data`
    pub fn new(data: &'a [u8], start: usize) -> Self {
        Self {
            cursor: ByteCursor::at(data, start),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Limit how deeply arrays may nest
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Current position in the buffer
    pub fn position(&self) -> usize {
        self.cursor.position()
    }

    /// Bytes left to parse
    pub fn remaining(&self) -> usize {
        self.cursor.remaining()
    }

    /// Marker under the cursor, or `None` at end of stream
    pub fn peek_marker(&mut self) -> Option<Marker> {
        self.cursor.advance()
    }

    /// Decode the record under the cursor and step past it
    pub fn next_record(&mut self) -> SaveResult<Record> {
        self.parse_entry(0)
    }

    fn parse_entry(&mut self, depth: usize) -> SaveResult<Record> {
        let start = self.cursor.position();
        let header: RecordHeader = self.cursor.read_struct()?;
        let marker = header.marker;
        let tag = TypeTag(header.tag);

        let value = if marker.is_filler() || tag.value() == 0 {
            Value::Skip
        } else if marker == END_OF_DATA {
            Value::EndOfData
        } else if tag == TypeTag::COMPRESSED || header.tag.to_le_bytes()[..2] == ZLIB_HEADER {
            codec::skip_compressed(&mut self.cursor)?;
            Value::CompressedBlob
        } else {
            match tag {
                TypeTag::BOOLEAN => Value::Bool(codec::decode_bool(&mut self.cursor)?),
                TypeTag::INTEGER | TypeTag::ARRAY_START => {
                    Value::Integer(codec::decode_integer(&mut self.cursor)?)
                }
                TypeTag::OPAQUE_3 => {
                    self.cursor.skip(12)?;
                    Value::Unknown
                }
                TypeTag::OPAQUE_15 => {
                    codec::skip_opaque_15(&mut self.cursor)?;
                    Value::Unknown
                }
                TypeTag::NARROW_STRING | TypeTag::NARROW_STRING_ALT => {
                    codec::decode_narrow_string(&mut self.cursor)?
                }
                TypeTag::WIDE_STRING => Value::Text(codec::decode_wide_string(&mut self.cursor)?),
                TypeTag::OPAQUE_0D | TypeTag::OPAQUE_14 => {
                    self.cursor.skip(16)?;
                    Value::Unknown
                }
                TypeTag::ARRAY => Value::Array(self.decode_array(start, depth + 1)?),
                _ => {
                    return Err(SaveError::UnknownType {
                        tag: tag.value(),
                        marker,
                        offset: start,
                    });
                }
            }
        };

        let record = Record {
            marker,
            tag,
            value,
            range: start..self.cursor.position(),
        };
        trace!(
            "record {} tag {} at {:?}: {}",
            record.marker,
            record.tag,
            record.range,
            record.value.kind_name()
        );
        Ok(record)
    }

    fn decode_array(&mut self, start: usize, depth: usize) -> SaveResult<Vec<ArrayElement>> {
        if depth > self.max_depth {
            return Err(SaveError::NestingTooDeep {
                offset: start,
                limit: self.max_depth,
            });
        }

        self.cursor.skip(8)?;
        let count = self.cursor.read_u32_le()?;
        let mut elements = Vec::with_capacity(count.min(1024) as usize);

        for _ in 0..count {
            let offset = self.cursor.position();
            let lead = self.cursor.peek_u8()?;
            if lead != ARRAY_ELEMENT_MARKER {
                return Err(SaveError::MalformedArray { offset, found: lead });
            }
            self.cursor.skip(ARRAY_ELEMENT_HEADER)?;
            elements.push(self.decode_element(offset, depth)?);
        }

        Ok(elements)
    }

    /// Parse records until the terminator, keeping only game-data fields
    fn decode_element(&mut self, offset: usize, depth: usize) -> SaveResult<ArrayElement> {
        let mut element = ArrayElement::default();
        loop {
            if self.cursor.advance().is_none() {
                return Err(SaveError::MissingSentinel {
                    offset,
                    what: "array element terminator",
                });
            }

            let record = self.parse_entry(depth)?;
            if record.value == Value::EndOfData {
                return Err(SaveError::MissingSentinel {
                    offset,
                    what: "array element terminator",
                });
            }

            let done = record.value.as_text() == Some(ELEMENT_TERMINATOR);
            if let Some(field) = GameDataField::from_marker(record.marker) {
                element.fields.insert(field, record);
            }
            if done {
                return Ok(element);
            }
        }
    }
}
