//! Plain-value view of a parsed save
//!
//! Resolves record ids to their values and flattens the result into
//! serde-serializable maps keyed by field name.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::actor::Actor;
use crate::marker::ActorField;
use crate::record::{ArrayElement, Record, Value};
use crate::save::SaveFile;

/// Prefix stripped from civilization names for display
const CIV_NAME_PREFIX: &str = "CIVILIZATION_";

/// Prefix stripped from leader names for display
const LEADER_NAME_PREFIX: &str = "LEADER_";

/// Record value without its byte span
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SummaryValue {
    /// Boolean flag
    Bool(bool),
    /// Integer
    Integer(u32),
    /// Text, or a placeholder for payloads that are not decoded
    Text(String),
    /// Array elements
    Array(Vec<BTreeMap<String, SummaryValue>>),
}

impl SummaryValue {
    fn from_elements(elements: &[ArrayElement]) -> Self {
        Self::Array(
            elements
                .iter()
                .map(|element| {
                    element
                        .fields
                        .iter()
                        .map(|(field, record)| (field.name().to_string(), Self::from(record)))
                        .collect()
                })
                .collect(),
        )
    }
}

impl From<&Record> for SummaryValue {
    fn from(record: &Record) -> Self {
        match &record.value {
            Value::Bool(value) => Self::Bool(*value),
            Value::Integer(value) => Self::Integer(*value),
            Value::Text(text) => Self::Text(text.clone()),
            Value::Array(elements) => Self::from_elements(elements),
            Value::Skip => Self::Text("SKIP".to_string()),
            Value::Unknown => Self::Text("UNKNOWN".to_string()),
            Value::UnsupportedString => Self::Text("UNSUPPORTED STRING".to_string()),
            Value::CompressedBlob => Self::Text("UNKNOWN COMPRESSED DATA".to_string()),
            Value::EndOfData => Self::Text("END OF DATA".to_string()),
        }
    }
}

/// One actor's fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActorSummary {
    /// Slot index for actors opened by a slot header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot: Option<usize>,
    /// Field values by name
    pub fields: BTreeMap<String, SummaryValue>,
}

/// Whole-save summary, the shape written by `civsave dump`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Top-level game fields
    pub game_data: BTreeMap<String, SummaryValue>,
    /// Full civilizations in slot order
    pub civs: Vec<ActorSummary>,
    /// Other actors
    pub actors: Vec<ActorSummary>,
}

/// Display row for one civilization
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CivInfo {
    /// 1-based player number
    pub player: usize,
    /// Civilization name without its prefix
    pub civilization: String,
    /// Leader name without its prefix
    pub leader: Option<String>,
    /// Player name
    pub player_name: Option<String>,
    /// Human (true) or AI (false)
    pub human: bool,
    /// Treasury, when the payload has an entry for this player
    pub money: Option<u32>,
}

fn summarize_actor(save: &SaveFile, actor: &Actor) -> ActorSummary {
    ActorSummary {
        slot: actor.slot(),
        fields: actor
            .fields
            .iter()
            .filter_map(|(field, id)| {
                save.record(*id)
                    .map(|record| (field.name().to_string(), SummaryValue::from(record)))
            })
            .collect(),
    }
}

impl Summary {
    /// Summarize a parsed save
    pub fn of(save: &SaveFile) -> Self {
        Self {
            game_data: save
                .game_data()
                .iter()
                .filter_map(|(field, id)| {
                    save.record(*id)
                        .map(|record| (field.name().to_string(), SummaryValue::from(record)))
                })
                .collect(),
            civs: save
                .civs()
                .iter()
                .map(|actor| summarize_actor(save, actor))
                .collect(),
            actors: save
                .actors()
                .iter()
                .map(|actor| summarize_actor(save, actor))
                .collect(),
        }
    }
}

/// Display rows for every civilization in slot order
pub fn civ_info(save: &SaveFile) -> Vec<CivInfo> {
    let records = save.records();
    save.civs()
        .iter()
        .enumerate()
        .map(|(index, civ)| {
            let name = civ.text(records, ActorField::ActorName).unwrap_or_default();
            CivInfo {
                player: index + 1,
                civilization: name.strip_prefix(CIV_NAME_PREFIX).unwrap_or(name).to_string(),
                leader: civ.text(records, ActorField::LeaderName).map(|leader| {
                    leader
                        .strip_prefix(LEADER_NAME_PREFIX)
                        .unwrap_or(leader)
                        .to_string()
                }),
                player_name: civ
                    .text(records, ActorField::PlayerName)
                    .map(str::to_string),
                human: civ.is_human(records),
                money: save.read_money(index).ok().flatten(),
            }
        })
        .collect()
}
