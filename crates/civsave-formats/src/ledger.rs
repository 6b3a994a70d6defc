//! Chunk ledger
//!
//! The ledger partitions a buffer into an ordered list of byte spans. Every
//! parsed record owns exactly one span; the bytes between records are kept
//! in raw spans. Spans live in an append-only arena and are never mutated:
//! an edit pushes a new span and rewires the order list, so no other span's
//! bytes are touched.
//!
//! ```text
//! arena:  [raw 0][rec #0][rec #1][raw 1][rec #1']
//! order:  0, 1, 4, 3          <- #1 replaced by #1'
//! ```

use std::fmt;
use std::ops::Range;

use bytes::Bytes;

use crate::error::{SaveError, SaveResult};
use crate::record::RecordId;

/// Index of a span in the ledger's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpanId(pub usize);

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "span {}", self.0)
    }
}

/// Immutable byte span, optionally owned by a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// Span contents
    pub bytes: Bytes,
    /// Record that produced the bytes, `None` for raw bytes
    pub owner: Option<RecordId>,
}

/// Ordered span list whose concatenation reproduces the edited buffer
#[derive(Debug, Clone, Default)]
pub struct ChunkLedger {
    arena: Vec<Span>,
    order: Vec<SpanId>,
}

impl ChunkLedger {
    /// Empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Partition `source` into record spans and the raw gaps around them.
    ///
    /// `records` must be sorted by start offset and must not overlap. Bytes
    /// not covered by any record become raw spans, so the ledger always
    /// covers the whole buffer.
    pub fn partition<I>(source: &Bytes, records: I) -> Self
    where
        I: IntoIterator<Item = (RecordId, Range<usize>)>,
    {
        let mut ledger = Self::new();
        let mut cursor = 0;
        for (id, range) in records {
            if range.start > cursor {
                ledger.push_raw(source.slice(cursor..range.start));
            }
            ledger.push(Span {
                bytes: source.slice(range.clone()),
                owner: Some(id),
            });
            cursor = range.end;
        }
        if cursor < source.len() {
            ledger.push_raw(source.slice(cursor..));
        }
        ledger
    }

    /// Append a raw span at the end of the order
    pub fn push_raw(&mut self, bytes: Bytes) -> SpanId {
        self.push(Span { bytes, owner: None })
    }

    fn push(&mut self, span: Span) -> SpanId {
        let id = self.alloc(span);
        self.order.push(id);
        id
    }

    fn alloc(&mut self, span: Span) -> SpanId {
        let id = SpanId(self.arena.len());
        self.arena.push(span);
        id
    }

    fn position_of(&self, record: RecordId) -> SaveResult<usize> {
        self.order
            .iter()
            .position(|id| self.arena[id.0].owner == Some(record))
            .ok_or(SaveError::DetachedRecord(record))
    }

    /// Replace the bytes owned by `record`
    pub fn replace_record(&mut self, record: RecordId, bytes: Bytes) -> SaveResult<SpanId> {
        let pos = self.position_of(record)?;
        let id = self.alloc(Span {
            bytes,
            owner: Some(record),
        });
        self.order[pos] = id;
        Ok(id)
    }

    /// Insert a new record span directly after the span owned by `after`
    pub fn insert_after(
        &mut self,
        after: RecordId,
        record: RecordId,
        bytes: Bytes,
    ) -> SaveResult<SpanId> {
        let pos = self.position_of(after)?;
        let id = self.alloc(Span {
            bytes,
            owner: Some(record),
        });
        self.order.insert(pos + 1, id);
        Ok(id)
    }

    /// Drop the span owned by `record` from the order
    pub fn remove_record(&mut self, record: RecordId) -> SaveResult<()> {
        let pos = self.position_of(record)?;
        self.order.remove(pos);
        Ok(())
    }

    /// Swap the contents of a span that is currently in the order.
    ///
    /// Returns the id of the replacement, which takes over the old span's
    /// position and owner.
    pub fn replace_span(&mut self, span: SpanId, bytes: Bytes) -> Option<SpanId> {
        let pos = self.order.iter().position(|id| *id == span)?;
        let owner = self.arena[span.0].owner;
        let id = self.alloc(Span { bytes, owner });
        self.order[pos] = id;
        Some(id)
    }

    /// Whether `record` currently owns a span
    pub fn contains(&self, record: RecordId) -> bool {
        self.position_of(record).is_ok()
    }

    /// Span by id, whether or not it is still in the order
    pub fn span(&self, span: SpanId) -> Option<&Span> {
        self.arena.get(span.0)
    }

    /// Spans in output order
    pub fn spans(&self) -> impl Iterator<Item = &Span> + '_ {
        self.order.iter().map(|id| &self.arena[id.0])
    }

    /// Total length of the reassembled buffer
    pub fn len(&self) -> usize {
        self.spans().map(|span| span.bytes.len()).sum()
    }

    /// Whether the reassembled buffer would be empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Concatenate all spans in order
    pub fn reassemble(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        for span in self.spans() {
            out.extend_from_slice(&span.bytes);
        }
        out
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> (Bytes, ChunkLedger) {
        let source = Bytes::from_static(b"..AAAA.BBBB..CCCC");
        let ledger = ChunkLedger::partition(
            &source,
            [
                (RecordId(0), 2..6),
                (RecordId(1), 7..11),
                (RecordId(2), 13..17),
            ],
        );
        (source, ledger)
    }

    #[test]
    fn test_partition_covers_buffer() {
        let (source, ledger) = sample();
        assert_eq!(ledger.spans().count(), 6);
        assert_eq!(ledger.reassemble(), source.to_vec());
        let owned = ledger
            .spans()
            .find(|span| span.owner == Some(RecordId(1)))
            .unwrap();
        assert_eq!(owned.bytes.as_ref(), b"BBBB");
    }

    #[test]
    fn test_replace_record_leaves_neighbors() {
        let (_, mut ledger) = sample();
        ledger
            .replace_record(RecordId(1), Bytes::from_static(b"bb"))
            .unwrap();
        assert_eq!(ledger.reassemble(), b"..AAAA.bb..CCCC");

        ledger
            .replace_record(RecordId(1), Bytes::from_static(b"bbbbbb"))
            .unwrap();
        assert_eq!(ledger.reassemble(), b"..AAAA.bbbbbb..CCCC");
    }

    #[test]
    fn test_insert_and_remove() {
        let (_, mut ledger) = sample();
        ledger
            .insert_after(RecordId(0), RecordId(9), Bytes::from_static(b"NN"))
            .unwrap();
        assert_eq!(ledger.reassemble(), b"..AAAANN.BBBB..CCCC");

        ledger.remove_record(RecordId(1)).unwrap();
        assert_eq!(ledger.reassemble(), b"..AAAANN...CCCC");
        assert!(!ledger.contains(RecordId(1)));
        assert!(matches!(
            ledger.replace_record(RecordId(1), Bytes::new()),
            Err(SaveError::DetachedRecord(RecordId(1)))
        ));
    }

    #[test]
    fn test_replace_raw_span() {
        let mut ledger = ChunkLedger::new();
        ledger.push_raw(Bytes::from_static(b"head"));
        let body = ledger.push_raw(Bytes::from_static(b"body"));
        ledger.push_raw(Bytes::from_static(b"foot"));

        let replaced = ledger
            .replace_span(body, Bytes::from_static(b"BODY!"))
            .unwrap();
        assert_eq!(ledger.reassemble(), b"headBODY!foot");
        assert_eq!(ledger.replace_span(body, Bytes::new()), None);
        assert_eq!(ledger.span(body).unwrap().bytes.as_ref(), b"body");
        assert!(ledger.replace_span(replaced, Bytes::from_static(b"b")).is_some());
        assert_eq!(ledger.reassemble(), b"headbfoot");
    }

    #[test]
    fn test_edit_order_independence() {
        let (_, mut forward) = sample();
        let (_, mut backward) = sample();
        for id in [0, 1, 2] {
            forward
                .replace_record(RecordId(id), Bytes::from(format!("<{id}>")))
                .unwrap();
        }
        for id in [2, 0, 1] {
            backward
                .replace_record(RecordId(id), Bytes::from(format!("<{id}>")))
                .unwrap();
        }
        assert_eq!(forward.reassemble(), backward.reassemble());
        assert_eq!(forward.reassemble(), b"..<0>.<1>..<2>");
    }
}
