//! Command line front-end for civsave-formats
//!
//! The `civsave` binary is a thin wrapper around this library: it parses
//! [`CliConfig`], installs logging, and hands over to [`run`].

pub mod commands;
pub mod config;

pub use commands::run;
pub use config::{CliConfig, Command, Control, MoneyCommand};
