//! Command implementations for the CLI interface.
//!
//! This module contains the command handlers behind each subcommand. They
//! drive the same `Controller` the TUI uses, so validation and the clear-all
//! confirmation behave identically on both surfaces.

use std::fmt::Display;
use std::io::{self, BufRead, Write};

use clap::Subcommand;
use clap_complete::{generate, Shell};
use tracing::debug;

use crate::config::{init_file_logging, Config};
use crate::controller::Controller;
use crate::db::{print_table, TaskRepository, TaskStore};
use crate::fields::FavoriteFilter;
use crate::task::TaskId;
use crate::tui::run::run_tui;

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive UI (the default).
    Ui,

    /// Create the task table if it does not exist.
    Init,

    /// Add a new task.
    Add {
        /// Short title for the task.
        title: String,
        /// Optional longer description.
        #[arg(long)]
        desc: Option<String>,
        /// Mark the task as a favorite.
        #[arg(long)]
        favorite: bool,
    },

    /// List tasks with optional filters.
    List {
        /// Only tasks whose title contains this text (case-insensitive).
        #[arg(long, short)]
        search: Option<String>,
        /// Favorite filter: all | favorite | not-favorite.
        #[arg(long, value_enum, default_value_t = FavoriteFilter::All)]
        filter: FavoriteFilter,
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Show a single task.
    View {
        /// Task ID.
        id: TaskId,
    },

    /// Update the title and/or description of a task.
    Update {
        /// Task ID.
        id: TaskId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        desc: Option<String>,
    },

    /// Set or clear the favorite flag of a task.
    Fav {
        /// Task ID.
        id: TaskId,
        /// Clear the flag instead of setting it.
        #[arg(long)]
        off: bool,
    },

    /// Delete a task by ID.
    Delete {
        /// Task ID.
        id: TaskId,
    },

    /// Delete every task. Asks for confirmation unless --yes is given.
    Clear {
        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Print an error and terminate with a failure status.
fn exit_with(context: &str, err: impl Display) -> ! {
    eprintln!("{context}: {err}");
    std::process::exit(1);
}

/// Launch the terminal user interface.
pub fn cmd_ui(ctl: Controller<TaskStore>, config: &Config) {
    if let Err(e) = init_file_logging(config) {
        eprintln!("Logging disabled, cannot open {}: {e}", config.log_path().display());
    }
    if let Err(e) = run_tui(ctl) {
        exit_with("UI error", e);
    }
}

/// Create the task table.
pub fn cmd_init(ctl: &Controller<TaskStore>) {
    if let Err(e) = ctl.repo().ensure_schema() {
        exit_with("Failed to initialise database", e);
    }
    println!("Database ready at {}", ctl.repo().path().display());
}

/// Add a new task.
pub fn cmd_add(ctl: &mut Controller<TaskStore>, title: String, desc: Option<String>, favorite: bool) {
    let description = desc.unwrap_or_default();
    match ctl.create_task(&title, &description, favorite) {
        Ok((id, _)) => println!("Added task {}", id),
        Err(e) => exit_with("Failed to add task", e),
    }
}

/// List tasks with optional search and favorite filters.
pub fn cmd_list(ctl: &mut Controller<TaskStore>, search: Option<String>, filter: FavoriteFilter, json: bool) {
    let view = ctl
        .set_search(search.unwrap_or_default())
        .and_then(|_| ctl.set_favorite_filter(filter));
    let tasks = match view {
        Ok(v) => v.tasks,
        Err(e) => exit_with("Failed to list tasks", e),
    };

    if json {
        match serde_json::to_string_pretty(&tasks) {
            Ok(out) => println!("{out}"),
            Err(e) => exit_with("Failed to encode tasks", e),
        }
    } else if tasks.is_empty() {
        println!("No tasks found.");
    } else {
        print_table(&tasks);
    }
}

/// Show a single task.
pub fn cmd_view(ctl: &Controller<TaskStore>, id: TaskId) {
    let task = match ctl.repo().get_task(id) {
        Ok(Some(t)) => t,
        Ok(None) => exit_with("Not found", format!("task {id} does not exist")),
        Err(e) => exit_with("Failed to load task", e),
    };
    println!("ID:          {}", task.id);
    println!("Title:       {}", task.title);
    println!("Favorite:    {}", if task.is_favorite { "yes" } else { "no" });
    println!("Description:");
    if task.description.is_empty() {
        println!("  -");
    } else {
        for line in task.description.lines() {
            println!("  {line}");
        }
    }
}

/// Update the title and/or description of a task through an edit cycle.
pub fn cmd_update(ctl: &mut Controller<TaskStore>, id: TaskId, title: Option<String>, desc: Option<String>) {
    if title.is_none() && desc.is_none() {
        exit_with("Nothing to update", "pass --title and/or --desc");
    }
    let task = match ctl.repo().get_task(id) {
        Ok(Some(t)) => t,
        Ok(None) => exit_with("Not found", format!("task {id} does not exist")),
        Err(e) => exit_with("Failed to load task", e),
    };

    let title = title.unwrap_or(task.title);
    let description = desc.unwrap_or(task.description);
    let saved = ctl
        .begin_edit(id)
        .and_then(|_| ctl.save_edit(id, &title, &description));
    if let Err(e) = saved {
        exit_with("Failed to update task", e);
    }
    println!("Updated {}", id);
}

/// Set or clear the favorite flag of a task.
pub fn cmd_fav(ctl: &mut Controller<TaskStore>, id: TaskId, off: bool) {
    let task = match ctl.repo().get_task(id) {
        Ok(Some(t)) => t,
        Ok(None) => exit_with("Not found", format!("task {id} does not exist")),
        Err(e) => exit_with("Failed to load task", e),
    };
    if let Err(e) = ctl.reconcile_favorite(id, task.is_favorite, !off) {
        exit_with("Failed to update favorite", e);
    }
    println!("{} {}", if off { "Unfavorited" } else { "Favorited" }, id);
}

/// Delete a task. Deleting an unknown id is not an error.
pub fn cmd_delete(ctl: &mut Controller<TaskStore>, id: TaskId) {
    let existed = match ctl.repo().get_task(id) {
        Ok(t) => t.is_some(),
        Err(e) => exit_with("Failed to load task", e),
    };
    if let Err(e) = ctl.delete_task(id) {
        exit_with("Failed to delete task", e);
    }
    if existed {
        println!("Deleted.");
    } else {
        println!("Task {} not found, nothing deleted.", id);
    }
}

/// Delete every task after an explicit confirmation.
pub fn cmd_clear(ctl: &mut Controller<TaskStore>, yes: bool) {
    let count = match ctl.request_clear() {
        Ok(view) => view.tasks.len(),
        Err(e) => exit_with("Failed to list tasks", e),
    };

    let confirmed = yes || {
        let stdin = io::stdin();
        prompt_yes_no(&mut stdin.lock(), &mut io::stdout(), count)
    };

    if confirmed {
        if let Err(e) = ctl.confirm_clear() {
            exit_with("Failed to delete tasks", e);
        }
        println!("All tasks have been deleted.");
    } else {
        if let Err(e) = ctl.cancel_clear() {
            exit_with("Failed to cancel", e);
        }
        println!("Cancelled.");
    }
}

/// Ask whether to delete `count` tasks; anything but y/yes means no.
fn prompt_yes_no<R: BufRead, W: Write>(input: &mut R, out: &mut W, count: usize) -> bool {
    let _ = write!(out, "Are you sure you want to delete all {count} task(s)? [y/N] ");
    let _ = out.flush();
    let mut answer = String::new();
    if input.read_line(&mut answer).is_err() {
        return false;
    }
    let answer = answer.trim().to_lowercase();
    debug!(answer = %answer, "clear-all confirmation answered");
    answer == "y" || answer == "yes"
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use clap::CommandFactory;
    use crate::cli::Cli;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ask(input: &str) -> (bool, String) {
        let mut out = Vec::new();
        let answer = prompt_yes_no(&mut input.as_bytes(), &mut out, 3);
        (answer, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_prompt_accepts_only_yes() {
        assert!(ask("y\n").0);
        assert!(ask("YES\n").0);
        assert!(!ask("n\n").0);
        assert!(!ask("\n").0);
        assert!(!ask("").0);
        assert!(!ask("yep\n").0);
    }

    #[test]
    fn test_prompt_mentions_count() {
        let (_, shown) = ask("n\n");
        assert!(shown.contains("delete all 3 task(s)"));
    }
}
