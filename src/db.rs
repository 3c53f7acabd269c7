//! Task persistence and display helpers.
//!
//! This module provides the `TaskStore`, the SQLite-backed single source of
//! truth for tasks, the `TaskRepository` seam the controller is written
//! against, and the table formatting used by the CLI.
//!
//! The store holds no connection between calls. Each operation opens its own
//! connection, runs inside one transaction and releases both on every exit
//! path: a transaction dropped without `commit` rolls back.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row, Transaction};
use tracing::{debug, warn};

use crate::fields::ListQuery;
use crate::task::{Task, TaskId};

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Error type for store operations.
///
/// A missing row is never an error: updates and deletes of unknown ids
/// succeed without touching anything.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("cannot open task database {}: {source}", path.display())]
    Connectivity {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("constraint error: {0}")]
    Constraint(#[source] rusqlite::Error),

    #[error("database error: {0}")]
    Backend(#[source] rusqlite::Error),
}

impl StoreError {
    /// Sort a raw SQLite failure into the store's error taxonomy.
    fn classify(path: &Path, err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(ErrorCode::CannotOpen | ErrorCode::NotADatabase | ErrorCode::PermissionDenied) => {
                StoreError::Connectivity {
                    path: path.to_path_buf(),
                    source: err,
                }
            }
            Some(ErrorCode::ConstraintViolation) => StoreError::Constraint(err),
            _ => match err {
                rusqlite::Error::InvalidParameterCount(..)
                | rusqlite::Error::InvalidParameterName(_)
                | rusqlite::Error::ToSqlConversionFailure(_) => StoreError::Constraint(err),
                other => StoreError::Backend(other),
            },
        }
    }

    /// True when the backend could not be reached at all.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, StoreError::Connectivity { .. })
    }
}

const CREATE_TASKS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS tasks (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        title       TEXT NOT NULL,
        description TEXT,
        is_favorite BOOLEAN DEFAULT 0
    )
"#;

const SELECT_TASKS: &str =
    "SELECT id, title, COALESCE(description, ''), COALESCE(is_favorite, 0) FROM tasks";

/// Persistence operations the interaction controller relies on.
pub trait TaskRepository {
    /// Insert a task and return its store-assigned id. Titles are not validated here.
    fn create_task(&self, title: &str, description: &str, is_favorite: bool) -> Result<TaskId>;
    /// Tasks matching `query`, ordered by id. Never fails for "no matches".
    fn list_tasks(&self, query: &ListQuery) -> Result<Vec<Task>>;
    fn get_task(&self, id: TaskId) -> Result<Option<Task>>;
    fn update_favorite_status(&self, id: TaskId, is_favorite: bool) -> Result<()>;
    /// Replace title and description only; the favorite flag is untouched.
    fn update_task(&self, id: TaskId, title: &str, description: &str) -> Result<()>;
    fn delete_task(&self, id: TaskId) -> Result<()>;
    /// Remove every row. Irreversible.
    fn delete_all_tasks(&self) -> Result<()>;
}

/// SQLite-backed task table.
#[derive(Debug, Clone)]
pub struct TaskStore {
    path: PathBuf,
}

impl TaskStore {
    /// Create a store for the database at `path`. No connection is opened yet.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the backing database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the task table if it does not exist. Safe to call on every startup.
    pub fn ensure_schema(&self) -> Result<()> {
        self.with_tx("ensure_schema", |tx| tx.execute_batch(CREATE_TASKS_TABLE))
    }

    /// Run `f` inside a fresh connection and transaction, committing on success.
    fn with_tx<T, F>(&self, op: &'static str, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> rusqlite::Result<T>,
    {
        let classify = |e: rusqlite::Error| {
            let err = StoreError::classify(&self.path, e);
            warn!(op, error = %err, "task store operation failed");
            err
        };

        let mut conn = Connection::open(&self.path).map_err(classify)?;
        let tx = conn.transaction().map_err(classify)?;
        let value = f(&tx).map_err(classify)?;
        tx.commit().map_err(classify)?;
        debug!(op, db = %self.path.display(), "task store operation committed");
        Ok(value)
    }
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        is_favorite: row.get(3)?,
    })
}

/// Case-insensitive substring match using full Unicode lowercasing.
fn title_matches(title: &str, needle: &str) -> bool {
    title.to_lowercase().contains(needle)
}

impl TaskRepository for TaskStore {
    fn create_task(&self, title: &str, description: &str, is_favorite: bool) -> Result<TaskId> {
        self.with_tx("create_task", |tx| {
            tx.execute(
                "INSERT INTO tasks (title, description, is_favorite) VALUES (?1, ?2, ?3)",
                params![title, description, is_favorite],
            )?;
            Ok(tx.last_insert_rowid())
        })
    }

    fn list_tasks(&self, query: &ListQuery) -> Result<Vec<Task>> {
        let favorite = query.favorite.as_option();
        let mut sql = SELECT_TASKS.to_string();
        if favorite.is_some() {
            sql.push_str(" WHERE COALESCE(is_favorite, 0) = ?1");
        }
        sql.push_str(" ORDER BY id");

        let mut tasks = self.with_tx("list_tasks", |tx| {
            let mut stmt = tx.prepare(&sql)?;
            let rows = match favorite {
                Some(fav) => stmt.query_map(params![fav], task_from_row)?,
                None => stmt.query_map([], task_from_row)?,
            };
            let tasks = rows.collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tasks)
        })?;

        // SQLite's LIKE folds ASCII only, so the title match runs here.
        if let Some(search) = query.search_text() {
            let needle = search.to_lowercase();
            tasks.retain(|t| title_matches(&t.title, &needle));
        }
        Ok(tasks)
    }

    fn get_task(&self, id: TaskId) -> Result<Option<Task>> {
        self.with_tx("get_task", |tx| {
            tx.query_row(&format!("{SELECT_TASKS} WHERE id = ?1"), params![id], task_from_row)
                .optional()
        })
    }

    fn update_favorite_status(&self, id: TaskId, is_favorite: bool) -> Result<()> {
        self.with_tx("update_favorite_status", |tx| {
            tx.execute(
                "UPDATE tasks SET is_favorite = ?1 WHERE id = ?2",
                params![is_favorite, id],
            )
            .map(|_| ())
        })
    }

    fn update_task(&self, id: TaskId, title: &str, description: &str) -> Result<()> {
        self.with_tx("update_task", |tx| {
            tx.execute(
                "UPDATE tasks SET title = ?1, description = ?2 WHERE id = ?3",
                params![title, description, id],
            )
            .map(|_| ())
        })
    }

    fn delete_task(&self, id: TaskId) -> Result<()> {
        self.with_tx("delete_task", |tx| {
            tx.execute("DELETE FROM tasks WHERE id = ?1", params![id]).map(|_| ())
        })
    }

    fn delete_all_tasks(&self) -> Result<()> {
        self.with_tx("delete_all_tasks", |tx| {
            let removed = tx.execute("DELETE FROM tasks", [])?;
            debug!(removed, "deleted all tasks");
            Ok(())
        })
    }
}

/// Format a favorite flag as a single-column marker.
pub fn format_favorite(is_favorite: bool) -> &'static str {
    if is_favorite {
        "★"
    } else {
        " "
    }
}

/// Print tasks in a formatted table.
pub fn print_table(tasks: &[Task]) {
    println!("{:<5} {:<3} {:<32} {}", "ID", "Fav", "Title", "Description");
    for t in tasks {
        println!(
            "{:<5} {:<3} {:<32} {}",
            t.id,
            format_favorite(t.is_favorite),
            truncate(&t.title, 32),
            truncate(first_line(&t.description), 48)
        );
    }
}

/// First line of a possibly multi-line text.
pub fn first_line(s: &str) -> &str {
    s.lines().next().unwrap_or("")
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FavoriteFilter;
    use tempfile::TempDir;

    fn scratch_store() -> (TempDir, TaskStore) {
        let dir = TempDir::new().unwrap();
        let store = TaskStore::new(dir.path().join("prompts.db"));
        store.ensure_schema().unwrap();
        (dir, store)
    }

    fn titles(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.title.as_str()).collect()
    }

    #[test]
    fn test_create_then_list_round_trip() {
        let (_dir, store) = scratch_store();
        let id = store.create_task("Summarize", "Summarize the text below", true).unwrap();

        let query = ListQuery::all()
            .with_search("Summarize")
            .with_favorite(FavoriteFilter::Favorite);
        let tasks = store.list_tasks(&query).unwrap();
        assert_eq!(
            tasks,
            vec![Task {
                id,
                title: "Summarize".into(),
                description: "Summarize the text below".into(),
                is_favorite: true,
            }]
        );
    }

    #[test]
    fn test_list_without_filters_returns_all_in_id_order() {
        let (_dir, store) = scratch_store();
        let a = store.create_task("alpha", "", false).unwrap();
        let b = store.create_task("beta", "", true).unwrap();
        let c = store.create_task("gamma", "", false).unwrap();

        let ids: Vec<TaskId> = store.list_tasks(&ListQuery::all()).unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![a, b, c]);
        assert!(a < b && b < c);
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let (_dir, store) = scratch_store();
        store.create_task("Write SQL query", "", false).unwrap();
        store.create_task("Translate to French", "", false).unwrap();
        store.create_task("explain sql plan", "", false).unwrap();

        let tasks = store.list_tasks(&ListQuery::all().with_search("sQl")).unwrap();
        assert_eq!(titles(&tasks), vec!["Write SQL query", "explain sql plan"]);

        let none = store.list_tasks(&ListQuery::all().with_search("haiku")).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_search_folds_non_ascii_case() {
        let (_dir, store) = scratch_store();
        store.create_task("Éclair recipe", "", false).unwrap();
        store.create_task("ÜBERSICHT", "", true).unwrap();
        store.create_task("plain", "", false).unwrap();

        let eclair = store.list_tasks(&ListQuery::all().with_search("éclair")).unwrap();
        assert_eq!(titles(&eclair), vec!["Éclair recipe"]);

        let query = ListQuery::all().with_search("übersicht");
        assert_eq!(titles(&store.list_tasks(&query).unwrap()), vec!["ÜBERSICHT"]);
        let fav = query.with_favorite(FavoriteFilter::Favorite);
        assert_eq!(titles(&store.list_tasks(&fav).unwrap()), vec!["ÜBERSICHT"]);
    }

    #[test]
    fn test_search_matches_wildcards_literally() {
        let (_dir, store) = scratch_store();
        store.create_task("100% accurate", "", false).unwrap();
        store.create_task("1000 words", "", false).unwrap();
        store.create_task("snake_case names", "", false).unwrap();
        store.create_task("snakeXcase names", "", false).unwrap();

        let pct = store.list_tasks(&ListQuery::all().with_search("0%")).unwrap();
        assert_eq!(titles(&pct), vec!["100% accurate"]);

        let underscore = store.list_tasks(&ListQuery::all().with_search("e_c")).unwrap();
        assert_eq!(titles(&underscore), vec!["snake_case names"]);
    }

    #[test]
    fn test_favorite_filter_subset_complement_union() {
        let (_dir, store) = scratch_store();
        store.create_task("one", "", true).unwrap();
        store.create_task("two", "", false).unwrap();
        store.create_task("three", "", true).unwrap();

        let fav = store.list_tasks(&ListQuery::all().with_favorite(FavoriteFilter::Favorite)).unwrap();
        let not_fav = store.list_tasks(&ListQuery::all().with_favorite(FavoriteFilter::NotFavorite)).unwrap();
        let all = store.list_tasks(&ListQuery::all()).unwrap();

        assert!(fav.iter().all(|t| t.is_favorite));
        assert!(not_fav.iter().all(|t| !t.is_favorite));
        assert_eq!(titles(&fav), vec!["one", "three"]);
        assert_eq!(titles(&not_fav), vec!["two"]);
        assert_eq!(fav.len() + not_fav.len(), all.len());
    }

    #[test]
    fn test_filters_compose_with_and() {
        let (_dir, store) = scratch_store();
        store.create_task("Code review", "", true).unwrap();
        store.create_task("Code golf", "", false).unwrap();
        store.create_task("Poem", "", true).unwrap();

        let query = ListQuery::all().with_search("code").with_favorite(FavoriteFilter::Favorite);
        assert_eq!(titles(&store.list_tasks(&query).unwrap()), vec!["Code review"]);
    }

    #[test]
    fn test_update_task_leaves_favorite_untouched() {
        let (_dir, store) = scratch_store();
        let id = store.create_task("old", "old desc", true).unwrap();
        store.update_task(id, "new", "new desc").unwrap();

        let task = store.get_task(id).unwrap().unwrap();
        assert_eq!(task.title, "new");
        assert_eq!(task.description, "new desc");
        assert!(task.is_favorite);
    }

    #[test]
    fn test_update_favorite_status() {
        let (_dir, store) = scratch_store();
        let id = store.create_task("t", "", false).unwrap();
        store.update_favorite_status(id, true).unwrap();
        assert!(store.get_task(id).unwrap().unwrap().is_favorite);
        store.update_favorite_status(id, false).unwrap();
        assert!(!store.get_task(id).unwrap().unwrap().is_favorite);
    }

    #[test]
    fn test_missing_ids_are_silent_noops() {
        let (_dir, store) = scratch_store();
        let id = store.create_task("keep", "", false).unwrap();

        store.update_task(999, "x", "y").unwrap();
        store.update_favorite_status(999, true).unwrap();
        store.delete_task(999).unwrap();
        assert_eq!(store.get_task(999).unwrap(), None);

        let tasks = store.list_tasks(&ListQuery::all()).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, id);
        assert!(!tasks[0].is_favorite);
    }

    #[test]
    fn test_delete_task_is_idempotent() {
        let (_dir, store) = scratch_store();
        let a = store.create_task("a", "", false).unwrap();
        store.create_task("b", "", false).unwrap();

        store.delete_task(a).unwrap();
        let once = store.list_tasks(&ListQuery::all()).unwrap();
        store.delete_task(a).unwrap();
        let twice = store.list_tasks(&ListQuery::all()).unwrap();
        assert_eq!(once, twice);
        assert_eq!(titles(&twice), vec!["b"]);
    }

    #[test]
    fn test_delete_all_empties_every_listing() {
        let (_dir, store) = scratch_store();
        store.create_task("a", "", true).unwrap();
        store.create_task("b", "", false).unwrap();
        store.delete_all_tasks().unwrap();

        for favorite in [FavoriteFilter::All, FavoriteFilter::Favorite, FavoriteFilter::NotFavorite] {
            let query = ListQuery::all().with_favorite(favorite);
            assert!(store.list_tasks(&query).unwrap().is_empty());
            assert!(store.list_tasks(&query.with_search("a")).unwrap().is_empty());
        }
    }

    #[test]
    fn test_ids_are_never_reused() {
        let (_dir, store) = scratch_store();
        let first = store.create_task("first", "", false).unwrap();
        let second = store.create_task("second", "", false).unwrap();
        store.delete_task(second).unwrap();
        let third = store.create_task("third", "", false).unwrap();
        assert!(third > second);

        store.delete_all_tasks().unwrap();
        let fourth = store.create_task("fourth", "", false).unwrap();
        assert!(fourth > third);
        assert!(first < second);
    }

    #[test]
    fn test_empty_title_is_accepted_by_store() {
        let (_dir, store) = scratch_store();
        let id = store.create_task("", "", false).unwrap();
        assert_eq!(store.get_task(id).unwrap().unwrap().title, "");
    }

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let (_dir, store) = scratch_store();
        store.create_task("survives", "", false).unwrap();
        store.ensure_schema().unwrap();
        store.ensure_schema().unwrap();
        assert_eq!(store.list_tasks(&ListQuery::all()).unwrap().len(), 1);
    }

    #[test]
    fn test_null_columns_read_back_as_defaults() {
        let (dir, store) = scratch_store();
        let conn = Connection::open(dir.path().join("prompts.db")).unwrap();
        conn.execute("INSERT INTO tasks (title) VALUES ('bare')", []).unwrap();
        conn.execute("INSERT INTO tasks (title, description, is_favorite) VALUES ('nulls', NULL, NULL)", [])
            .unwrap();
        drop(conn);

        let tasks = store.list_tasks(&ListQuery::all()).unwrap();
        assert_eq!(tasks.len(), 2);
        assert!(tasks.iter().all(|t| t.description.is_empty() && !t.is_favorite));

        let not_fav = store.list_tasks(&ListQuery::all().with_favorite(FavoriteFilter::NotFavorite)).unwrap();
        assert_eq!(not_fav.len(), 2);
    }

    #[test]
    fn test_unopenable_path_is_connectivity_error() {
        let dir = TempDir::new().unwrap();
        let store = TaskStore::new(dir.path().join("missing").join("prompts.db"));
        let err = store.ensure_schema().unwrap_err();
        assert!(err.is_connectivity(), "unexpected error: {err}");
        assert!(store.list_tasks(&ListQuery::all()).unwrap_err().is_connectivity());
    }

    #[test]
    fn test_garbage_file_is_connectivity_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prompts.db");
        std::fs::write(&path, "this is plainly not a sqlite database file ".repeat(64)).unwrap();
        let err = TaskStore::new(&path).ensure_schema().unwrap_err();
        assert!(err.is_connectivity(), "unexpected error: {err}");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
        assert_eq!(first_line("one\ntwo"), "one");
        assert_eq!(first_line(""), "");
    }
}
