//! # prompts - Prompt Manager
//!
//! A small command-line and terminal UI tool for keeping a list of reusable
//! prompts (tasks) in a local SQLite table.
//!
//! ## Key Features
//!
//! - **Record and edit**: each task has a title, a free-text description and a favorite flag
//! - **Search and filter**: case-insensitive title search combined with a favorite filter
//! - **Inline edit mode**: rows being edited refuse deletion and favorite toggles until saved
//! - **Guarded clear-all**: deleting every task always asks for confirmation first
//!
//! ## Quick Start
//!
//! ```bash
//! # Launch the TUI (the default)
//! prompts
//!
//! # Add a task via CLI
//! prompts add "Summarize" --desc "Summarize the following text" --favorite
//!
//! # List favorites whose title mentions "sum"
//! prompts list --search sum --filter favorite
//! ```
//!
//! Data is stored in `~/.prompts/prompts.db` unless `--db` or `PROMPTS_DB` points elsewhere.

use clap::Parser;

pub mod cli;
pub mod cmd;
pub mod config;
pub mod controller;
pub mod db;
pub mod fields;
pub mod task;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod enums;
    pub mod input;
    pub mod run;
    pub mod task_form;
    pub mod utils;
}

use cli::Cli;
use cmd::*;
use config::{init_stderr_logging, Config};
use controller::Controller;
use db::TaskStore;

/// Create the data directory and table, exiting on failure.
fn open_controller(config: &Config) -> Controller<TaskStore> {
    if let Err(e) = config.ensure_data_dir() {
        eprintln!("Failed to create data directory {}: {}", config.data_dir().display(), e);
        std::process::exit(1);
    }
    let store = TaskStore::new(&config.db_path);
    if let Err(e) = store.ensure_schema() {
        eprintln!("Failed to open database {}: {}", config.db_path.display(), e);
        std::process::exit(1);
    }
    Controller::new(store)
}

/// One-shot commands log to stderr; the TUI sets up its own file logger.
fn open_for_cli(config: &Config) -> Controller<TaskStore> {
    init_stderr_logging(config);
    open_controller(config)
}

fn main() {
    let cli = Cli::parse();
    let config = Config::from_env(cli.db, cli.verbose);

    match cli.command.unwrap_or(Commands::Ui) {
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Ui => cmd_ui(open_controller(&config), &config),
        Commands::Init => cmd_init(&open_for_cli(&config)),
        Commands::Add { title, desc, favorite } => cmd_add(&mut open_for_cli(&config), title, desc, favorite),
        Commands::List { search, filter, json } => cmd_list(&mut open_for_cli(&config), search, filter, json),
        Commands::View { id } => cmd_view(&open_for_cli(&config), id),
        Commands::Update { id, title, desc } => cmd_update(&mut open_for_cli(&config), id, title, desc),
        Commands::Fav { id, off } => cmd_fav(&mut open_for_cli(&config), id, off),
        Commands::Delete { id } => cmd_delete(&mut open_for_cli(&config), id),
        Commands::Clear { yes } => cmd_clear(&mut open_for_cli(&config), yes),
    }
}
