//! Integration tests running civsave subcommands against files on disk.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::fs;
use std::path::Path;

use civsave_cli::{CliConfig, run};
use civsave_formats::framing;
use civsave_formats::marker::{FULL_CIV, SLOT_HEADERS};
use civsave_formats::record::encode_record;
use civsave_formats::{ActorField, GameDataField, Marker, TypeTag, Value, parse};
use clap::Parser;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn text(data: &mut Vec<u8>, marker: Marker, value: &str) {
    let bytes = encode_record(marker, TypeTag::NARROW_STRING, &Value::Text(value.to_string()))
        .expect("Failed to encode text record");
    data.extend_from_slice(&bytes);
}

fn integer(data: &mut Vec<u8>, marker: Marker, value: u32) {
    let bytes = encode_record(marker, TypeTag::INTEGER, &Value::Integer(value))
        .expect("Failed to encode integer record");
    data.extend_from_slice(&bytes);
}

fn treasury(stored: u32) -> Vec<u8> {
    let mut entry = vec![0x11; 64];
    entry[0..4].copy_from_slice(&[0x21, 0xC9, 0xAF, 0x2F]);
    entry[8..12].copy_from_slice(&[0x57, 0x73, 0x4A, 0x5A]);
    entry[16..20].copy_from_slice(&[0xB7, 0xEA, 0xA0, 0xF1]);
    entry[44..48].copy_from_slice(&stored.to_le_bytes());
    entry
}

/// Two civilizations, Egypt (human) and Greece (AI), with 50 and 75 gold.
fn write_test_save(dir: &TempDir) -> std::path::PathBuf {
    let mut data = b"CIV6".to_vec();
    data.extend_from_slice(&[0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
    text(&mut data, GameDataField::GameSpeed.marker(), "GAMESPEED_STANDARD");
    integer(&mut data, GameDataField::GameTurn.marker(), 120);

    let civs = [
        ("CIVILIZATION_EGYPT", "LEADER_CLEOPATRA", "Alice", 3),
        ("CIVILIZATION_GREECE", "LEADER_PERICLES", "Bob", 1),
    ];
    for (slot, (name, leader, player, ai_human)) in civs.into_iter().enumerate() {
        data.extend_from_slice(SLOT_HEADERS[slot].as_bytes());
        data.extend_from_slice(&[0, 0, 0, 0]);
        text(&mut data, ActorField::ActorName.marker(), name);
        text(&mut data, ActorField::LeaderName.marker(), leader);
        text(&mut data, ActorField::ActorType.marker(), FULL_CIV);
        text(&mut data, ActorField::PlayerName.marker(), player);
        integer(&mut data, ActorField::ActorAiHuman.marker(), ai_human);
        text(&mut data, ActorField::ActorDescription.marker(), "");
    }

    let mut payload = vec![0x5A; 4096];
    payload.extend(treasury(50 * 256));
    payload.extend(treasury(75 * 256));
    payload.extend_from_slice(&[0x5A; 512]);
    data.extend_from_slice(&framing::compress(&payload).expect("Failed to compress payload"));
    data.extend_from_slice(b"\x00\x00\x00\x00END");

    let path = dir.path().join("test.Civ6Save");
    fs::write(&path, data).expect("Failed to write test save");
    path
}

fn civsave(save: &Path, args: &[&str]) -> String {
    let mut argv = vec!["civsave", save.to_str().unwrap()];
    argv.extend_from_slice(args);
    let config = CliConfig::try_parse_from(argv).expect("Failed to parse arguments");
    let mut out = Vec::new();
    run(&config, &mut out).expect("Command failed");
    String::from_utf8(out).unwrap()
}

#[test]
fn test_info_lists_civs() {
    let dir = TempDir::new().unwrap();
    let save = write_test_save(&dir);

    let output = civsave(&save, &["info"]);
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("EGYPT"));
    assert!(lines[0].contains("CLEOPATRA"));
    assert!(lines[0].contains("human"));
    assert!(lines[0].ends_with("50"));
    assert!(lines[1].contains("GREECE"));
    assert!(lines[1].contains("AI"));
    assert!(lines[1].ends_with("75"));
}

#[test]
fn test_dump_is_json() {
    let dir = TempDir::new().unwrap();
    let save = write_test_save(&dir);

    let output = civsave(&save, &["dump", "--pretty"]);
    let json: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(json["game_data"]["GAME_TURN"], 120);
    assert_eq!(json["civs"][1]["fields"]["PLAYER_NAME"], "Bob");
    assert_eq!(json["civs"][1]["slot"], 1);
}

#[test]
fn test_money_set_writes_output_file() {
    let dir = TempDir::new().unwrap();
    let save = write_test_save(&dir);
    let original = fs::read(&save).unwrap();
    let edited = dir.path().join("edited.Civ6Save");

    civsave(
        &save,
        &["money", "set", "--player", "2", "--amount", "1234", "-o", edited.to_str().unwrap()],
    );

    assert_eq!(fs::read(&save).unwrap(), original);
    assert_eq!(civsave(&edited, &["money", "get", "--player", "2"]), "1234\n");
    assert_eq!(civsave(&edited, &["money", "get", "--player", "1"]), "50\n");
}

#[test]
fn test_set_name_overwrites_in_place() {
    let dir = TempDir::new().unwrap();
    let save = write_test_save(&dir);

    civsave(&save, &["set-name", "--player", "1", "--name", "Mike Rosack"]);

    let reparsed = parse(fs::read(&save).unwrap()).unwrap();
    assert_eq!(
        reparsed
            .civ_field(0, ActorField::PlayerName)
            .and_then(|record| record.value.as_text()),
        Some("Mike Rosack")
    );
    assert_eq!(
        reparsed
            .civ_field(1, ActorField::PlayerName)
            .and_then(|record| record.value.as_text()),
        Some("Bob")
    );
    assert_eq!(reparsed.read_money(1).unwrap(), Some(75));
}

#[test]
fn test_set_control_hands_player_to_human() {
    let dir = TempDir::new().unwrap();
    let save = write_test_save(&dir);

    civsave(&save, &["set-control", "--player", "2", "human"]);

    let reparsed = parse(fs::read(&save).unwrap()).unwrap();
    assert!(reparsed.civs()[1].is_human(reparsed.records()));
    assert!(reparsed.civs()[0].is_human(reparsed.records()));
}

#[test]
fn test_extract_payload() {
    let dir = TempDir::new().unwrap();
    let save = write_test_save(&dir);
    let out = dir.path().join("payload.bin");

    civsave(&save, &["extract-payload", "--output", out.to_str().unwrap()]);

    let payload = fs::read(&out).unwrap();
    assert_eq!(payload.len(), 4096 + 2 * 64 + 512);
    assert_eq!(&payload[4096..4100], &[0x21, 0xC9, 0xAF, 0x2F]);
}

#[test]
fn test_errors_carry_context() {
    let dir = TempDir::new().unwrap();
    let save = write_test_save(&dir);

    let config =
        CliConfig::try_parse_from(["civsave", save.to_str().unwrap(), "set-name", "--player", "7", "--name", "x"])
            .unwrap();
    let err = run(&config, &mut Vec::new()).unwrap_err();
    assert!(err.to_string().contains("no player 7"));

    let config =
        CliConfig::try_parse_from(["civsave", save.to_str().unwrap(), "extract-payload"]).unwrap();
    assert!(run(&config, &mut Vec::new()).is_err());

    let missing = dir.path().join("missing.Civ6Save");
    let config = CliConfig::try_parse_from(["civsave", missing.to_str().unwrap(), "info"]).unwrap();
    let err = run(&config, &mut Vec::new()).unwrap_err();
    assert!(err.to_string().contains("failed to read"));
}

#[test]
fn test_signature_check_can_be_disabled() {
    let dir = TempDir::new().unwrap();
    let save = write_test_save(&dir);
    let mut data = fs::read(&save).unwrap();
    data[..4].copy_from_slice(b"XXXX");
    fs::write(&save, data).unwrap();

    let config = CliConfig::try_parse_from(["civsave", save.to_str().unwrap(), "info"]).unwrap();
    assert!(run(&config, &mut Vec::new()).is_err());

    assert_eq!(civsave(&save, &["--no-signature-check", "info"]).lines().count(), 2);
}
