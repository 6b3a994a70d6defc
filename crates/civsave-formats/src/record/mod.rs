//! Typed records
//!
//! A record is one `(marker, type tag, value)` unit decoded from the stream
//! together with the byte range it occupied. Records are produced by
//! [`RecordParser`] and serialized back by [`encode_record`].
//!
//! # Record layout
//!
//! ```text
//! Record:
//! ├── Marker (4 bytes, opaque key)
//! ├── Type tag (4 bytes, little-endian)
//! └── Payload (width depends on the type tag)
//! ```

mod codec;
mod parser;
mod writer;

pub use codec::{IntegerPayload, RecordHeader, STRING_KIND_UTF8, WIDE_STRING_SUBHEADER};
pub use parser::{DEFAULT_MAX_DEPTH, RecordParser};
pub use writer::{encode_record, to_single_byte};

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

use crate::marker::{GameDataField, Marker};

/// Type tag selecting how a record payload is decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeTag(pub u32);

impl TypeTag {
    /// Boolean in a 12-byte payload
    pub const BOOLEAN: Self = Self(1);
    /// Unsigned 32-bit integer in a 12-byte payload
    pub const INTEGER: Self = Self(2);
    /// Opaque, 12 bytes
    pub const OPAQUE_3: Self = Self(3);
    /// Narrow string, decoded like [`TypeTag::NARROW_STRING`]
    pub const NARROW_STRING_ALT: Self = Self(4);
    /// Narrow (single-byte) string
    pub const NARROW_STRING: Self = Self(5);
    /// UTF-16LE string
    pub const WIDE_STRING: Self = Self(6);
    /// Array length, laid out like an integer
    pub const ARRAY_START: Self = Self(0x0A);
    /// Array of nested record streams
    pub const ARRAY: Self = Self(0x0B);
    /// Opaque, 16 bytes
    pub const OPAQUE_0D: Self = Self(0x0D);
    /// Opaque, 16 bytes
    pub const OPAQUE_14: Self = Self(0x14);
    /// Opaque, 12 or 20 bytes depending on a sentinel
    pub const OPAQUE_15: Self = Self(0x15);
    /// Embedded zlib blob
    pub const COMPRESSED: Self = Self(0x18);

    /// Raw tag value
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

/// Decoded record payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Boolean flag
    Bool(bool),
    /// Integer or array length
    Integer(u32),
    /// Narrow or wide string text
    Text(String),
    /// Array elements, each holding the game-data fields found in it
    Array(Vec<ArrayElement>),
    /// Filler record with no payload
    Skip,
    /// Opaque payload skipped by a fixed width
    Unknown,
    /// Narrow string in a sub-format that is not decoded
    UnsupportedString,
    /// Embedded compressed blob skipped up to its end sentinel
    CompressedBlob,
    /// End-of-data sentinel; everything after it is an opaque tail
    EndOfData,
}

impl Value {
    /// Text of a string value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Integer value
    pub fn as_integer(&self) -> Option<u32> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Boolean value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Array elements
    pub fn as_array(&self) -> Option<&[ArrayElement]> {
        match self {
            Self::Array(elements) => Some(elements),
            _ => None,
        }
    }

    /// Variant name used in error messages and dumps
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Text(_) => "text",
            Self::Array(_) => "array",
            Self::Skip => "skip",
            Self::Unknown => "unknown",
            Self::UnsupportedString => "unsupported string",
            Self::CompressedBlob => "compressed blob",
            Self::EndOfData => "end of data",
        }
    }
}

/// Game-data fields retained from one array element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArrayElement {
    /// Fields by name, last occurrence wins
    pub fields: BTreeMap<GameDataField, Record>,
}

impl ArrayElement {
    /// Field value by name
    pub fn get(&self, field: GameDataField) -> Option<&Record> {
        self.fields.get(&field)
    }
}

/// One decoded record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Field identifier
    pub marker: Marker,
    /// Payload type
    pub tag: TypeTag,
    /// Decoded payload
    pub value: Value,
    /// Bytes consumed in the parsed buffer
    pub range: Range<usize>,
}

/// Index of a top-level record in a parse result's record arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(pub usize);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
