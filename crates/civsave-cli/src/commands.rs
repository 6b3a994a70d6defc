//! Subcommand execution

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail, ensure};
use civsave_formats::{ActorField, ParseOptions, SaveFile, Summary, Value, civ_info};
use tracing::{debug, info};

use crate::config::{CliConfig, Command, Control, MoneyCommand};

/// Run the configured subcommand, writing any report to `out`
pub fn run<W: Write>(config: &CliConfig, out: &mut W) -> Result<()> {
    let mut save = load(&config.save, !config.no_signature_check)?;

    match &config.command {
        Command::Info => print_info(&save, out)?,
        Command::Dump { pretty } => {
            let summary = Summary::of(&save);
            if *pretty {
                serde_json::to_writer_pretty(&mut *out, &summary)?;
            } else {
                serde_json::to_writer(&mut *out, &summary)?;
            }
            writeln!(out)?;
        }
        Command::Money(MoneyCommand::Get { player }) => {
            let index = player_index(*player)?;
            match save.read_money(index)? {
                Some(money) => writeln!(out, "{money}")?,
                None => bail!("no money entry for player {player}"),
            }
        }
        Command::Money(MoneyCommand::Set { player, amount }) => {
            let index = player_index(*player)?;
            ensure!(
                save.write_money(index, *amount)?,
                "no money entry for player {player}"
            );
            store(&mut save, config.destination())?;
            info!("Player {player} now has {amount} gold");
        }
        Command::SetName { player, name } => {
            edit_civ_field(
                &mut save,
                *player,
                ActorField::PlayerName,
                Value::Text(name.clone()),
            )?;
            store(&mut save, config.destination())?;
            info!("Player {player} renamed to {name:?}");
        }
        Command::SetControl { player, control } => {
            edit_civ_field(
                &mut save,
                *player,
                ActorField::ActorAiHuman,
                Value::Integer(control.actor_value()),
            )?;
            store(&mut save, config.destination())?;
            let who = match control {
                Control::Human => "a human",
                Control::Ai => "the AI",
            };
            info!("Player {player} is now controlled by {who}");
        }
        Command::ExtractPayload => {
            let output = config
                .output
                .as_deref()
                .context("extract-payload needs --output")?;
            let payload = save
                .payload()
                .context("save has no compressed section")?;
            fs::write(output, payload)
                .with_context(|| format!("failed to write {}", output.display()))?;
            info!("Wrote {} payload bytes to {}", payload.len(), output.display());
        }
    }

    Ok(())
}

fn load(path: &Path, require_signature: bool) -> Result<SaveFile> {
    let data = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let options = ParseOptions::default().with_signature_check(require_signature);
    let save = SaveFile::parse(data, &options)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    debug!(
        "Loaded {} records, {} civs, {} other actors",
        save.records().len(),
        save.civs().len(),
        save.actors().len()
    );
    Ok(save)
}

fn store(save: &mut SaveFile, path: &Path) -> Result<()> {
    let bytes = save.to_bytes().context("failed to rebuild save")?;
    fs::write(path, &bytes).with_context(|| format!("failed to write {}", path.display()))?;
    info!("Saved {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

fn player_index(player: usize) -> Result<usize> {
    player
        .checked_sub(1)
        .ok_or_else(|| anyhow!("players are numbered from 1"))
}

fn edit_civ_field(save: &mut SaveFile, player: usize, field: ActorField, value: Value) -> Result<()> {
    let index = player_index(player)?;
    let civ = save
        .civs()
        .get(index)
        .with_context(|| format!("no player {player}, the save has {}", save.civs().len()))?;
    let id = civ
        .field(field)
        .with_context(|| format!("player {player} has no {} record", field.name()))?;
    save.modify_chunk(id, value)
        .with_context(|| format!("failed to rewrite {} of player {player}", field.name()))
}

fn print_info<W: Write>(save: &SaveFile, out: &mut W) -> Result<()> {
    for row in civ_info(save) {
        writeln!(
            out,
            "{:>2}  {:<16} {:<16} {:<20} {:<5} {}",
            row.player,
            row.civilization,
            row.leader.as_deref().unwrap_or("-"),
            row.player_name.as_deref().unwrap_or("-"),
            if row.human { "human" } else { "AI" },
            row.money
                .map_or_else(|| "-".to_string(), |money| money.to_string()),
        )?;
    }
    Ok(())
}
