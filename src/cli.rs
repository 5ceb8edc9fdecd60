//! Command line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Daily Skland check-in for Arknights accounts.
#[derive(Debug, Parser)]
#[command(name = "skland-attendance", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to a TOML config file (defaults to ./skland.toml when present).
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Failed attempts allowed per character before skipping it.
    #[arg(long, global = true)]
    pub max_retries: Option<u32>,

    /// Enable debug logging.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Check in every configured account and push the reports (default).
    Run,

    /// Send a sample message through every configured channel.
    TestNotifications,
}
