//! civsave binary entry point.
//!
//! Parses arguments, initializes logging on stderr, and runs one
//! subcommand against a save file.

use anyhow::Result;
use civsave_cli::CliConfig;

fn main() -> Result<()> {
    let config = CliConfig::from_args();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Running {:?} on {}", config.command, config.save.display());

    let stdout = std::io::stdout();
    civsave_cli::run(&config, &mut stdout.lock())
}
