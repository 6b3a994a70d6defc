//! Command line configuration.
//!
//! Arguments are parsed with clap; the log filter can also come from the
//! `CIVSAVE_LOG` environment variable.
//!
//! # Example
//!
//! ```no_run
//! use civsave_cli::CliConfig;
//!
//! let config = CliConfig::from_args();
//! println!("Editing {}", config.save.display());
//! ```

use std::path::{Path, PathBuf};

use civsave_formats::marker::{AI_PLAYER, HUMAN_PLAYER};
use clap::{Parser, Subcommand, ValueEnum};

/// Configuration loaded from CLI args and environment variables.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "civsave",
    about = "Inspect and edit Civilization VI save files",
    version
)]
pub struct CliConfig {
    /// Save file to read
    pub save: PathBuf,

    /// Where to write the result (edits default to overwriting the save)
    #[arg(long, short, global = true)]
    pub output: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `civsave_formats=trace`
    #[arg(long, env = "CIVSAVE_LOG", default_value = "info", global = true)]
    pub log_level: String,

    /// Accept files that do not start with the CIV6 signature
    #[arg(long, global = true)]
    pub no_signature_check: bool,

    /// Operation to run
    #[command(subcommand)]
    pub command: Command,
}

/// Operations on one save file
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List full civilizations in slot order
    Info,

    /// Print game data, civilizations and actors as JSON
    Dump {
        /// Indent the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Read or change a player's treasury
    #[command(subcommand)]
    Money(MoneyCommand),

    /// Rename a player
    SetName {
        /// Player number, starting at 1
        #[arg(long)]
        player: usize,

        /// New player name
        #[arg(long)]
        name: String,
    },

    /// Hand a player to a human or to the AI
    SetControl {
        /// Player number, starting at 1
        #[arg(long)]
        player: usize,

        /// Who controls the player
        #[arg(value_enum)]
        control: Control,
    },

    /// Write the decompressed payload to `--output`
    ExtractPayload,
}

/// Treasury operations
#[derive(Debug, Clone, Subcommand)]
pub enum MoneyCommand {
    /// Print a player's money
    Get {
        /// Player number, starting at 1
        #[arg(long)]
        player: usize,
    },

    /// Set a player's money
    Set {
        /// Player number, starting at 1
        #[arg(long)]
        player: usize,

        /// New amount
        #[arg(long)]
        amount: u32,
    },
}

/// Player controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Control {
    /// Human player
    Human,
    /// AI player
    Ai,
}

impl Control {
    /// ACTOR_AI_HUMAN value for this controller
    #[must_use]
    pub const fn actor_value(self) -> u32 {
        match self {
            Self::Human => HUMAN_PLAYER,
            Self::Ai => AI_PLAYER,
        }
    }
}

impl CliConfig {
    /// Parse configuration from command-line arguments.
    #[must_use]
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// File that edits are written to
    #[must_use]
    pub fn destination(&self) -> &Path {
        self.output.as_deref().unwrap_or(&self.save)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        CliConfig::command().debug_assert();
    }

    #[test]
    fn test_money_set_arguments() {
        let config = CliConfig::try_parse_from([
            "civsave", "game.Civ6Save", "money", "set", "--player", "2", "--amount", "500",
        ])
        .unwrap();
        assert!(matches!(
            config.command,
            Command::Money(MoneyCommand::Set {
                player: 2,
                amount: 500
            })
        ));
        assert_eq!(config.destination(), Path::new("game.Civ6Save"));
    }

    #[test]
    fn test_output_overrides_destination() {
        let config = CliConfig::try_parse_from([
            "civsave", "in.Civ6Save", "set-control", "--player", "1", "ai", "-o", "out.Civ6Save",
        ])
        .unwrap();
        assert_eq!(config.destination(), Path::new("out.Civ6Save"));
        assert!(matches!(
            config.command,
            Command::SetControl {
                control: Control::Ai,
                ..
            }
        ));
    }
}
