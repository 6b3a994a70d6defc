//! Save session
//!
//! [`SaveFile`] owns one parsed save for its whole lifetime: the source
//! buffer, the record arena, the actor aggregates, the chunk ledger and the
//! decompressed payload of the compressed section. Edits go through the
//! ledger and never re-parse; [`SaveFile::to_bytes`] rebuilds the file.
//!
//! # File layout
//!
//! ```text
//! Save file:
//! ├── Signature "CIV6" and header bytes (raw)
//! ├── Record stream, from the first GAME_SPEED record
//! ├── Compressed section (framed zlib, see [`crate::framing`])
//! └── Footer (raw)
//! ```

use std::collections::BTreeMap;
use std::ops::Range;

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::actor::{Actor, assemble};
use crate::cursor::ByteCursor;
use crate::error::{SaveError, SaveResult};
use crate::framing::{self, DecompressedSection};
use crate::ledger::{ChunkLedger, SpanId};
use crate::marker::{
    ActorField, END_UNCOMPRESSED, FILE_SIGNATURE, FIRST_GAME_DATA, GameDataField, Marker,
};
use crate::money;
use crate::options::ParseOptions;
use crate::record::{
    Record, RecordHeader, RecordId, RecordParser, TypeTag, Value, encode_record,
};

/// Decompressed section of a parsed file
#[derive(Debug, Clone)]
pub struct CompressedSection {
    /// Ledger span holding the framed bytes
    span: SpanId,
    /// Inflated payload
    payload: Vec<u8>,
    /// Bytes before the framed section in the source buffer
    header: Range<usize>,
    /// Bytes after the framed section in the source buffer
    footer: Range<usize>,
    /// Payload changed since the span was last framed
    dirty: bool,
}

impl CompressedSection {
    /// Inflated payload
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Source range in front of the framed section
    pub fn header(&self) -> Range<usize> {
        self.header.clone()
    }

    /// Source range after the framed section
    pub fn footer(&self) -> Range<usize> {
        self.footer.clone()
    }

    /// Whether the payload was edited and not re-framed yet
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

/// A parsed save file and its edit state
#[derive(Debug, Clone)]
pub struct SaveFile {
    source: Bytes,
    records: Vec<Record>,
    actors: Vec<Actor>,
    civs: Vec<Actor>,
    game_data: BTreeMap<GameDataField, RecordId>,
    ledger: ChunkLedger,
    compressed: Option<CompressedSection>,
}

/// Parse a complete save file with default options
pub fn parse(data: impl Into<Bytes>) -> SaveResult<SaveFile> {
    SaveFile::parse(data, &ParseOptions::default())
}

impl SaveFile {
    /// Parse a complete save file.
    ///
    /// The record walk starts at the first GAME_SPEED marker and stops at
    /// the compressed-section boundary, an end-of-data record, or when fewer
    /// than 8 bytes remain. The compressed section is inflated and kept for
    /// the payload operations.
    pub fn parse(data: impl Into<Bytes>, options: &ParseOptions) -> SaveResult<Self> {
        let source = data.into();

        if options.require_signature && !source.starts_with(&FILE_SIGNATURE) {
            return Err(SaveError::InvalidSignature {
                expected: FILE_SIGNATURE,
                actual: source[..source.len().min(FILE_SIGNATURE.len())].to_vec(),
            });
        }

        let first = FIRST_GAME_DATA.marker();
        let start = ByteCursor::new(&source)
            .scan_to(first)
            .ok_or(SaveError::MissingGameData { marker: first })?;
        debug!("Record stream starts at offset {start}");

        Self::walk(source, start, options, true)
    }

    /// Walk an arbitrary region, such as an inflated payload.
    ///
    /// Bytes before `start` are kept as one raw span. The boundary marker has
    /// no special meaning here, so the walk runs to the end of the region.
    pub fn parse_region(
        data: impl Into<Bytes>,
        start: usize,
        options: &ParseOptions,
    ) -> SaveResult<Self> {
        Self::walk(data.into(), start, options, false)
    }

    fn walk(source: Bytes, start: usize, options: &ParseOptions, file: bool) -> SaveResult<Self> {
        let mut parser = RecordParser::new(&source, start).with_max_depth(options.max_depth);
        let mut records = Vec::new();
        let mut section = None;

        while let Some(marker) = parser.peek_marker() {
            if file && marker == END_UNCOMPRESSED {
                section = Some(framing::decompress_at(
                    &source,
                    parser.position(),
                    options.max_decompressed_size,
                )?);
                break;
            }
            if parser.remaining() < RecordHeader::SIZE {
                break;
            }

            let record = parser.next_record()?;
            let end_of_data = record.value == Value::EndOfData;
            records.push(record);
            if end_of_data {
                debug!(
                    "End of data marker at offset {}",
                    parser.position() - RecordHeader::SIZE
                );
                break;
            }
        }

        let walk_end = section.as_ref().map_or_else(
            || parser.position(),
            |section: &DecompressedSection| section.section.start,
        );
        let mut ledger = ChunkLedger::partition(
            &source.slice(..walk_end),
            records
                .iter()
                .enumerate()
                .map(|(index, record)| (RecordId(index), record.range.clone())),
        );

        let compressed = match section {
            Some(section) => {
                let span = ledger.push_raw(source.slice(section.section.clone()));
                if !section.footer.is_empty() {
                    ledger.push_raw(source.slice(section.footer.clone()));
                }
                Some(CompressedSection {
                    span,
                    payload: section.payload,
                    header: section.header,
                    footer: section.footer,
                    dirty: false,
                })
            }
            None => {
                if walk_end < source.len() {
                    ledger.push_raw(source.slice(walk_end..));
                }
                if file {
                    warn!("No compressed section found; payload operations are unavailable");
                }
                None
            }
        };

        let assembly = assemble(&records, (0..records.len()).map(RecordId));
        info!(
            "Parsed {} records: {} civs, {} other actors, {} game fields",
            records.len(),
            assembly.civs.len(),
            assembly.actors.len(),
            assembly.game_data.len()
        );

        Ok(Self {
            source,
            records,
            actors: assembly.actors,
            civs: assembly.civs,
            game_data: assembly.game_data,
            ledger,
            compressed,
        })
    }

    /// Buffer the save was parsed from
    pub fn source(&self) -> &Bytes {
        &self.source
    }

    /// Record by id
    pub fn record(&self, id: RecordId) -> Option<&Record> {
        self.records.get(id.0)
    }

    /// Every record ever created in this session, indexed by [`RecordId`]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Records currently in the ledger, in output order
    pub fn stream(&self) -> impl Iterator<Item = (RecordId, &Record)> + '_ {
        self.ledger
            .spans()
            .filter_map(|span| span.owner)
            .filter_map(|id| self.records.get(id.0).map(|record| (id, record)))
    }

    /// Actors that are not full civilizations
    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    /// Full civilizations in slot order
    pub fn civs(&self) -> &[Actor] {
        &self.civs
    }

    /// Top-level game fields
    pub fn game_data(&self) -> &BTreeMap<GameDataField, RecordId> {
        &self.game_data
    }

    /// Record of a top-level game field
    pub fn game_field(&self, field: GameDataField) -> Option<&Record> {
        self.game_data.get(&field).and_then(|id| self.record(*id))
    }

    /// Record of a field on civilization `civ` (slot order)
    pub fn civ_field(&self, civ: usize, field: ActorField) -> Option<&Record> {
        self.civs
            .get(civ)
            .and_then(|actor| actor.field(field))
            .and_then(|id| self.record(id))
    }

    /// Chunk ledger backing the edits
    pub fn ledger(&self) -> &ChunkLedger {
        &self.ledger
    }

    /// Compressed section, if the file had one
    pub fn compressed(&self) -> Option<&CompressedSection> {
        self.compressed.as_ref()
    }

    /// Inflated payload of the compressed section
    pub fn payload(&self) -> Option<&[u8]> {
        self.compressed.as_ref().map(CompressedSection::payload)
    }

    /// Source bytes in front of the compressed section
    pub fn header(&self) -> Option<Bytes> {
        self.compressed
            .as_ref()
            .map(|section| self.source.slice(section.header()))
    }

    /// Source bytes after the compressed section
    pub fn footer(&self) -> Option<Bytes> {
        self.compressed
            .as_ref()
            .map(|section| self.source.slice(section.footer()))
    }

    /// Rewrite a record with a new value.
    ///
    /// The record keeps its marker and type tag. The new bytes are encoded
    /// before the ledger is touched, so a failed encode leaves the session
    /// unchanged.
    pub fn modify_chunk(&mut self, id: RecordId, value: Value) -> SaveResult<()> {
        let record = self.records.get(id.0).ok_or(SaveError::DetachedRecord(id))?;
        let bytes = encode_record(record.marker, record.tag, &value)?;
        self.ledger.replace_record(id, Bytes::from(bytes))?;

        debug!("Modified record {id} ({}) to {:?}", record.marker, value);
        self.records[id.0].value = value;
        Ok(())
    }

    /// Insert a new record directly after `after` and return its id.
    ///
    /// Aggregates are not updated; re-parse the rebuilt file to see the new
    /// record classified.
    pub fn add_chunk(
        &mut self,
        after: RecordId,
        marker: Marker,
        tag: TypeTag,
        value: Value,
    ) -> SaveResult<RecordId> {
        let bytes = encode_record(marker, tag, &value)?;
        let at = self
            .records
            .get(after.0)
            .filter(|_| self.ledger.contains(after))
            .map(|record| record.range.end)
            .ok_or(SaveError::DetachedRecord(after))?;

        let id = RecordId(self.records.len());
        self.ledger.insert_after(after, id, Bytes::from(bytes))?;
        self.records.push(Record {
            marker,
            tag,
            value,
            range: at..at,
        });
        debug!("Inserted record {id} ({marker}) after {after}");
        Ok(id)
    }

    /// Remove a record from the output and from every aggregate
    pub fn delete_chunk(&mut self, id: RecordId) -> SaveResult<()> {
        self.ledger.remove_record(id)?;
        for actor in self.actors.iter_mut().chain(self.civs.iter_mut()) {
            actor.fields.retain(|_, field| *field != id);
        }
        self.game_data.retain(|_, field| *field != id);
        debug!("Deleted record {id}");
        Ok(())
    }

    /// Concatenate the ledger as it stands.
    ///
    /// Payload edits are not included until [`SaveFile::to_bytes`] re-frames
    /// them.
    pub fn reassemble(&self) -> Vec<u8> {
        self.ledger.reassemble()
    }

    /// Rebuild the whole file, re-framing the payload if it changed
    pub fn to_bytes(&mut self) -> SaveResult<Vec<u8>> {
        if let Some(section) = self.compressed.as_mut().filter(|section| section.dirty) {
            let framed = framing::compress(&section.payload)?;
            section.span = self
                .ledger
                .replace_span(section.span, Bytes::from(framed))
                .ok_or(SaveError::MissingCompressedSection)?;
            section.dirty = false;
        }
        Ok(self.ledger.reassemble())
    }

    /// Money of player `index` (0-based), `None` if the payload has no entry
    pub fn read_money(&self, index: usize) -> SaveResult<Option<u32>> {
        let payload = self.payload().ok_or(SaveError::MissingCompressedSection)?;
        Ok(money::read_money(payload, index))
    }

    /// Set the money of player `index` (0-based).
    ///
    /// Returns `false` when the payload has no entry for that player.
    pub fn write_money(&mut self, index: usize, amount: u32) -> SaveResult<bool> {
        let section = self
            .compressed
            .as_mut()
            .ok_or(SaveError::MissingCompressedSection)?;
        let written = money::write_money(&mut section.payload, index, amount)?;
        if written {
            section.dirty = true;
            debug!("Set money of player {index} to {amount}");
        } else {
            warn!("No money entry for player {index}");
        }
        Ok(written)
    }
}
