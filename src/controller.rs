//! Interaction controller and per-session transient state.
//!
//! The controller sits between a presentation layer (TUI or CLI) and a
//! [`TaskRepository`]. It owns the session's transient state: which rows are
//! in inline edit mode, whether a delete-all is waiting for confirmation, and
//! the active list filters. Every mutating operation returns a fresh [`View`]
//! for the caller to redraw.
//!
//! Two independent state machines live here:
//!
//! - **Clear**: `Idle -> PendingConfirm` on a clear request; `PendingConfirm ->
//!   Idle` on confirm (deleting every task exactly once) or cancel.
//! - **Edit**, per task id: `Viewing -> Editing` on edit; `Editing -> Viewing`
//!   on save (persisting title and description) or cancel. A row that is
//!   being edited refuses favorite toggles and deletion.

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::db::{StoreError, TaskRepository};
use crate::fields::{FavoriteFilter, ListQuery};
use crate::task::{Task, TaskId};

/// Result type for controller operations.
pub type Result<T> = std::result::Result<T, ControlError>;

/// Error type for controller operations.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Title is required")]
    EmptyTitle,

    #[error("Task #{0} is being edited; save or cancel first")]
    RowInEdit(TaskId),

    #[error("Task #{0} is not in edit mode")]
    NotEditing(TaskId),

    #[error("No clear-all request is pending")]
    NothingToConfirm,
}

/// State of the delete-all confirmation guard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClearState {
    #[default]
    Idle,
    PendingConfirm,
}

/// Per-task inline editing state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EditState {
    #[default]
    Viewing,
    Editing,
}

/// Transient state for one interactive session. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct Session {
    confirm_clear: bool,
    edit_mode: BTreeSet<TaskId>,
    query: ListQuery,
}

impl Session {
    pub fn clear_state(&self) -> ClearState {
        if self.confirm_clear {
            ClearState::PendingConfirm
        } else {
            ClearState::Idle
        }
    }

    pub fn edit_state(&self, id: TaskId) -> EditState {
        if self.edit_mode.contains(&id) {
            EditState::Editing
        } else {
            EditState::Viewing
        }
    }

    pub fn query(&self) -> &ListQuery {
        &self.query
    }
}

/// Everything a caller needs to redraw after an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub tasks: Vec<Task>,
    pub confirm_clear: bool,
    pub editing: BTreeSet<TaskId>,
}

impl View {
    pub fn clear_state(&self) -> ClearState {
        if self.confirm_clear {
            ClearState::PendingConfirm
        } else {
            ClearState::Idle
        }
    }

    pub fn is_editing(&self, id: TaskId) -> bool {
        self.editing.contains(&id)
    }
}

/// Mediates UI events against a task repository for a single session.
pub struct Controller<R: TaskRepository> {
    repo: R,
    session: Session,
}

impl<R: TaskRepository> Controller<R> {
    /// Start a session in `Idle` with every task `Viewing` and no filters.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            session: Session::default(),
        }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn clear_state(&self) -> ClearState {
        self.session.clear_state()
    }

    pub fn edit_state(&self, id: TaskId) -> EditState {
        self.session.edit_state(id)
    }

    /// Re-read the task list under the current filters.
    pub fn refresh(&self) -> Result<View> {
        let tasks = self.repo.list_tasks(&self.session.query)?;
        Ok(View {
            tasks,
            confirm_clear: self.session.confirm_clear,
            editing: self.session.edit_mode.clone(),
        })
    }

    pub fn set_search(&mut self, search: impl Into<String>) -> Result<View> {
        let search = search.into();
        self.session.query.search = if search.is_empty() { None } else { Some(search) };
        self.refresh()
    }

    pub fn set_favorite_filter(&mut self, filter: FavoriteFilter) -> Result<View> {
        self.session.query.favorite = filter;
        self.refresh()
    }

    /// Create a task from submitted form values. Blank titles are rejected.
    ///
    /// Returns the id the store assigned alongside the fresh view.
    pub fn create_task(&mut self, title: &str, description: &str, is_favorite: bool) -> Result<(TaskId, View)> {
        if title.trim().is_empty() {
            return Err(ControlError::EmptyTitle);
        }
        let id = self.repo.create_task(title, description, is_favorite)?;
        info!(id, "task created");
        Ok((id, self.refresh()?))
    }

    /// Delete one task and forget any edit state held for it.
    pub fn delete_task(&mut self, id: TaskId) -> Result<View> {
        self.ensure_viewing(id)?;
        self.repo.delete_task(id)?;
        self.session.edit_mode.remove(&id);
        info!(id, "task deleted");
        self.refresh()
    }

    /// Reconcile a displayed favorite checkbox with the persisted flag.
    ///
    /// The store is only called when the two differ.
    pub fn reconcile_favorite(&mut self, id: TaskId, persisted: bool, displayed: bool) -> Result<View> {
        self.ensure_viewing(id)?;
        if displayed != persisted {
            self.repo.update_favorite_status(id, displayed)?;
            debug!(id, is_favorite = displayed, "favorite status updated");
        }
        self.refresh()
    }

    /// `Idle -> PendingConfirm`. Repeating the request while pending changes nothing.
    pub fn request_clear(&mut self) -> Result<View> {
        if !self.session.confirm_clear {
            self.session.confirm_clear = true;
            debug!("clear-all confirmation requested");
        }
        self.refresh()
    }

    /// `PendingConfirm -> Idle`, deleting every task.
    ///
    /// The pending flag is consumed before the store is called, so the
    /// deletion runs at most once per request even when it fails.
    pub fn confirm_clear(&mut self) -> Result<View> {
        if !std::mem::take(&mut self.session.confirm_clear) {
            return Err(ControlError::NothingToConfirm);
        }
        self.repo.delete_all_tasks()?;
        self.session.edit_mode.clear();
        info!("all tasks deleted");
        self.refresh()
    }

    /// `PendingConfirm -> Idle` without side effects.
    pub fn cancel_clear(&mut self) -> Result<View> {
        if std::mem::take(&mut self.session.confirm_clear) {
            debug!("clear-all cancelled");
        }
        self.refresh()
    }

    /// `Viewing -> Editing` for one task. Unknown ids stay `Viewing`.
    pub fn begin_edit(&mut self, id: TaskId) -> Result<View> {
        if self.repo.get_task(id)?.is_none() {
            debug!(id, "edit requested for missing task");
        } else if self.session.edit_mode.insert(id) {
            debug!(id, "edit mode entered");
        }
        self.refresh()
    }

    /// `Editing -> Viewing`, persisting the new title and description.
    ///
    /// The row stays in edit mode if validation or the store call fails.
    pub fn save_edit(&mut self, id: TaskId, title: &str, description: &str) -> Result<View> {
        if !self.session.edit_mode.contains(&id) {
            return Err(ControlError::NotEditing(id));
        }
        if title.trim().is_empty() {
            return Err(ControlError::EmptyTitle);
        }
        self.repo.update_task(id, title, description)?;
        self.session.edit_mode.remove(&id);
        info!(id, "task updated");
        self.refresh()
    }

    /// `Editing -> Viewing`, discarding the edit.
    pub fn cancel_edit(&mut self, id: TaskId) -> Result<View> {
        if self.session.edit_mode.remove(&id) {
            debug!(id, "edit cancelled");
        }
        self.refresh()
    }

    fn ensure_viewing(&self, id: TaskId) -> Result<()> {
        match self.session.edit_state(id) {
            EditState::Viewing => Ok(()),
            EditState::Editing => Err(ControlError::RowInEdit(id)),
        }
    }
}
