//! Save file error types

use thiserror::Error;

use crate::framing::FramingError;
use crate::marker::Marker;
use crate::record::RecordId;

/// Errors raised while parsing or editing a save file
#[derive(Debug, Error)]
pub enum SaveError {
    /// The file does not start with the expected product signature
    #[error("not a Civilization VI save: expected signature {expected:02X?}, got {actual:02X?}")]
    InvalidSignature {
        /// Signature the format requires
        expected: [u8; 4],
        /// Leading bytes actually found
        actual: Vec<u8>,
    },

    /// No game-data marker was found to start the record walk
    #[error("no game data marker {marker} found in input")]
    MissingGameData {
        /// Marker that was searched for
        marker: Marker,
    },

    /// A type tag outside the known set was encountered
    #[error("unknown record type 0x{tag:02X} for marker {marker} at offset {offset}")]
    UnknownType {
        /// Offending type tag
        tag: u32,
        /// Marker of the record
        marker: Marker,
        /// Offset of the record header
        offset: usize,
    },

    /// A string sub-header matched neither known layout
    #[error("malformed string at offset {offset}: {reason}")]
    MalformedString {
        /// Offset of the string payload
        offset: usize,
        /// What did not match
        reason: String,
    },

    /// An array element did not begin with the element marker byte
    #[error("malformed array at offset {offset}: expected element marker 0x0A, got 0x{found:02X}")]
    MalformedArray {
        /// Offset of the element
        offset: usize,
        /// Byte found instead of the element marker
        found: u8,
    },

    /// The writer has no encoder for this type tag
    #[error("unsupported write type 0x{tag:02X}")]
    UnsupportedWrite {
        /// Type tag the caller asked to write
        tag: u32,
    },

    /// The value variant does not fit the type tag being written
    #[error("value does not match write type 0x{tag:02X}: expected {expected}")]
    ValueMismatch {
        /// Type tag being written
        tag: u32,
        /// Value variant the tag requires
        expected: &'static str,
    },

    /// Text does not fit the 16-bit narrow-string length field
    #[error("string of {len} bytes is too long to write")]
    StringTooLong {
        /// Encoded text length
        len: usize,
    },

    /// Input ended before a fixed-size field could be read
    #[error("unexpected end of data at offset {offset}: need {needed} bytes")]
    Truncated {
        /// Offset of the read
        offset: usize,
        /// Number of bytes required
        needed: usize,
    },

    /// A terminating byte sequence was never found
    #[error("missing {what} after offset {offset}")]
    MissingSentinel {
        /// Offset the search started from
        offset: usize,
        /// Name of the sentinel
        what: &'static str,
    },

    /// Arrays nested deeper than the configured limit
    #[error("array nesting exceeds depth {limit} at offset {offset}")]
    NestingTooDeep {
        /// Offset of the array that crossed the limit
        offset: usize,
        /// Configured limit
        limit: usize,
    },

    /// A record id that no longer owns a ledger span
    #[error("record {0} has no span in the chunk ledger")]
    DetachedRecord(RecordId),

    /// The save has no compressed section to operate on
    #[error("save has no compressed section")]
    MissingCompressedSection,

    /// Scaled currency value does not fit the 32-bit field
    #[error("money amount {amount} overflows the stored field")]
    MoneyOverflow {
        /// Requested logical amount
        amount: u32,
    },

    /// Compression framing error
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    /// Binary parsing error
    #[error("binary parsing error: {0}")]
    BinRw(#[from] binrw::Error),
}

/// Result type for save file operations
pub type SaveResult<T> = Result<T, SaveError>;
