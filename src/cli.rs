use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Prompt manager backed by a local SQLite table.
/// Storage defaults to ~/.prompts/prompts.db, or --db / PROMPTS_DB.
#[derive(Parser)]
#[command(name = "prompts", version, about = "Record, search, favorite and edit prompts")]
pub struct Cli {
    /// Path to the SQLite database file.
    #[arg(long, global = true, env = "PROMPTS_DB")]
    pub db: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to run; launches the UI when omitted.
    #[command(subcommand)]
    pub command: Option<Commands>,
}
