//! Reader and editor for Civilization VI save files
//!
#![allow(clippy::cast_possible_truncation)] // Intentional for binary format parsing
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::doc_markdown)] // Field names like GAME_SPEED don't need backticks
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::similar_names)] // Domain-specific naming patterns
#![allow(clippy::redundant_closure_for_method_calls)] // Iterator chains
#![allow(clippy::return_self_not_must_use)] // Builder patterns
//! A save is a header, a stream of marker-tagged typed records, a large
//! zlib-compressed section framed into 64 KiB blocks, and a footer. This
//! crate parses the record stream into typed records, groups them into
//! player and civilization aggregates, inflates the compressed section, and
//! writes edits back without disturbing any byte it does not understand.
//!
//! # Modules
//!
//! - **cursor**: byte cursor with bounded little-endian reads
//! - **record**: type codec, record parser and record writer
//! - **ledger**: chunk ledger of immutable byte spans for targeted edits
//! - **actor**: actor assembly and civilization classification
//! - **framing**: chunked-DEFLATE framing of the compressed section
//! - **money**: treasury locator inside the inflated payload
//! - **save**: parse session tying all of the above together
//!
//! # Design Principles
//!
//! - **Lossless**: unedited reassembly reproduces the input exactly
//! - **Zero-Copy Spans**: ledger spans are slices of the source buffer
//! - **No Re-Parse**: edits rewire the span list and never walk the stream again
//!
//! # Example
//!
//! ```no_run
//! use civsave_formats::{ActorField, Value, parse};
//!
//! let data = std::fs::read("game.Civ6Save")?;
//! let mut save = parse(data)?;
//! if let Some(id) = save.civs()[0].field(ActorField::PlayerName) {
//!     save.modify_chunk(id, Value::Text("Mike".to_string()))?;
//! }
//! save.write_money(0, 5000)?;
//! std::fs::write("game.Civ6Save", save.to_bytes()?)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]

pub mod actor;
pub mod cursor;
pub mod error;
pub mod framing;
pub mod ledger;
/// Marker dictionary: game-data, actor and control markers
pub mod marker;
pub mod money;
pub mod options;
pub mod record;
pub mod save;
pub mod summary;

// Synthetic stream builders for tests
#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
pub(crate) mod test_utils;

pub use actor::{Actor, ActorOpener, Assembly};
pub use error::{SaveError, SaveResult};
pub use framing::{FramingError, FramingResult};
pub use ledger::{ChunkLedger, SpanId};
pub use marker::{ActorField, GameDataField, Marker};
pub use options::ParseOptions;
pub use record::{Record, RecordId, TypeTag, Value};
pub use save::{SaveFile, parse};
pub use summary::{CivInfo, Summary, SummaryValue, civ_info};
