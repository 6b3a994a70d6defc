//! Actor assembly
//!
//! Groups the flat record stream into player/civilization aggregates. The
//! assembler only looks at markers; it stores record ids into the session's
//! record arena and never copies records.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::marker::{
    ActorField, FULL_CIV, GameDataField, HUMAN_PLAYER, SLOT_HEADERS, START_ACTOR, slot_index,
};
use crate::record::{Record, RecordId};

/// Marker that opened an actor block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActorOpener {
    /// Per-slot header, by slot index
    Slot(usize),
    /// Generic start-of-actor marker
    Start,
}

/// One player or civilization aggregate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// How the actor block was opened
    pub opener: ActorOpener,
    /// Record holding the opening marker
    pub opener_record: RecordId,
    /// Field records, last occurrence wins
    pub fields: BTreeMap<ActorField, RecordId>,
}

impl Actor {
    fn new(opener: ActorOpener, opener_record: RecordId) -> Self {
        Self {
            opener,
            opener_record,
            fields: BTreeMap::new(),
        }
    }

    /// Slot index when the actor was opened by a slot header
    pub fn slot(&self) -> Option<usize> {
        match self.opener {
            ActorOpener::Slot(slot) => Some(slot),
            ActorOpener::Start => None,
        }
    }

    /// Record id of a field
    pub fn field(&self, field: ActorField) -> Option<RecordId> {
        self.fields.get(&field).copied()
    }

    /// Field text, resolved against the record arena
    pub fn text<'r>(&self, records: &'r [Record], field: ActorField) -> Option<&'r str> {
        self.field(field)
            .and_then(|id| records.get(id.0))
            .and_then(|record| record.value.as_text())
    }

    /// Field integer, resolved against the record arena
    pub fn integer(&self, records: &[Record], field: ActorField) -> Option<u32> {
        self.field(field)
            .and_then(|id| records.get(id.0))
            .and_then(|record| record.value.as_integer())
    }

    /// Whether ACTOR_AI_HUMAN marks a human player
    pub fn is_human(&self, records: &[Record]) -> bool {
        self.integer(records, ActorField::ActorAiHuman) == Some(HUMAN_PLAYER)
    }

    fn is_full_civ(&self, records: &[Record]) -> bool {
        self.text(records, ActorField::ActorType) == Some(FULL_CIV)
            && self
                .text(records, ActorField::ActorName)
                .is_some_and(|name| !name.is_empty())
    }

    fn is_noise(&self) -> bool {
        !self.fields.contains_key(&ActorField::ActorType)
            || !self.fields.contains_key(&ActorField::ActorName)
    }
}

/// Output of an assembly pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assembly {
    /// Actors that are not full civilizations
    pub actors: Vec<Actor>,
    /// Full civilizations in slot order
    pub civs: Vec<Actor>,
    /// Top-level game fields, last occurrence wins
    pub game_data: BTreeMap<GameDataField, RecordId>,
}

/// Single-pass classifier over the record stream
#[derive(Debug, Default)]
pub struct ActorAssembler {
    actors: Vec<Actor>,
    open: Option<usize>,
    game_data: BTreeMap<GameDataField, RecordId>,
}

impl ActorAssembler {
    /// Fresh assembler with no open actor
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify one record
    pub fn feed(&mut self, id: RecordId, record: &Record) {
        let marker = record.marker;

        if self.open.is_none() {
            let opener = match slot_index(marker) {
                Some(slot) => Some(ActorOpener::Slot(slot)),
                None if marker == START_ACTOR => Some(ActorOpener::Start),
                None => None,
            };
            if let Some(opener) = opener {
                self.open = Some(self.actors.len());
                self.actors.push(Actor::new(opener, id));
                return;
            }
        }

        if marker == ActorField::ActorDescription.marker() {
            if let Some(actor) = self.open.take().map(|index| &mut self.actors[index]) {
                actor.fields.insert(ActorField::ActorDescription, id);
            }
            return;
        }

        if let Some(field) = GameDataField::from_marker(marker) {
            self.game_data.insert(field, id);
            return;
        }

        if let (Some(index), Some(field)) = (self.open, ActorField::from_marker(marker)) {
            self.actors[index].fields.insert(field, id);
        }
    }

    /// Promote civilizations and drop incomplete actors
    pub fn finish(self, records: &[Record]) -> Assembly {
        let mut actors = self.actors;
        let mut civs = Vec::new();

        for slot in 0..SLOT_HEADERS.len() {
            if let Some(index) = actors
                .iter()
                .position(|actor| actor.slot() == Some(slot) && actor.is_full_civ(records))
            {
                civs.push(actors.remove(index));
            }
        }

        let before = actors.len();
        actors.retain(|actor| !actor.is_noise());
        debug!(
            "Assembled {} civs and {} actors ({} incomplete actors dropped)",
            civs.len(),
            actors.len(),
            before - actors.len()
        );

        Assembly {
            actors,
            civs,
            game_data: self.game_data,
        }
    }
}

/// Run the assembler over records in stream order
pub fn assemble<I>(records: &[Record], order: I) -> Assembly
where
    I: IntoIterator<Item = RecordId>,
{
    let mut assembler = ActorAssembler::new();
    for id in order {
        if let Some(record) = records.get(id.0) {
            assembler.feed(id, record);
        }
    }
    assembler.finish(records)
}
