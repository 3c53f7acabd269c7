//! Task form handling for the terminal user interface.
//!
//! This module provides the `TaskForm` used both for creating tasks and for
//! inline editing. Creation exposes title, description and the favorite
//! checkbox; editing exposes only title and description, since the favorite
//! flag is not part of an edit.

use crate::task::{Task, TaskId};
use crate::tui::input::InputField;

/// Field order for task forms.
pub const TITLE_FIELD: usize = 0;
pub const DESCRIPTION_FIELD: usize = 1;
pub const FAVORITE_FIELD: usize = 2;

/// Form state for creating or editing a task.
#[derive(Clone, Debug)]
pub struct TaskForm {
    pub title: InputField,
    pub description: InputField,
    pub favorite: bool,
    pub current_field: usize,
    /// Set when the form edits an existing task.
    pub task_id: Option<TaskId>,
}

impl TaskForm {
    /// Create an empty form for a new task.
    pub fn new() -> Self {
        let mut form = Self {
            title: InputField::new(),
            description: InputField::new(),
            favorite: false,
            current_field: TITLE_FIELD,
            task_id: None,
        };
        form.update_active_field();
        form
    }

    /// Create an edit form populated from an existing task.
    pub fn from_task(task: &Task) -> Self {
        let mut form = Self {
            title: InputField::with_value(&task.title),
            description: InputField::with_value(&task.description),
            favorite: task.is_favorite,
            current_field: TITLE_FIELD,
            task_id: Some(task.id),
        };
        form.update_active_field();
        form
    }

    pub fn is_edit(&self) -> bool {
        self.task_id.is_some()
    }

    /// Number of focusable fields.
    pub fn field_count(&self) -> usize {
        if self.is_edit() {
            2
        } else {
            3
        }
    }

    pub fn next_field(&mut self) {
        self.current_field = (self.current_field + 1) % self.field_count();
        self.update_active_field();
    }

    pub fn prev_field(&mut self) {
        self.current_field = if self.current_field == 0 {
            self.field_count() - 1
        } else {
            self.current_field - 1
        };
        self.update_active_field();
    }

    /// Update which text field is currently active.
    pub fn update_active_field(&mut self) {
        self.title.active = self.current_field == TITLE_FIELD;
        self.description.active = self.current_field == DESCRIPTION_FIELD;
    }

    fn current_input(&mut self) -> Option<&mut InputField> {
        match self.current_field {
            TITLE_FIELD => Some(&mut self.title),
            DESCRIPTION_FIELD => Some(&mut self.description),
            _ => None,
        }
    }

    /// Type a character; on the favorite checkbox a space toggles it instead.
    pub fn handle_char(&mut self, c: char) {
        if self.current_field == FAVORITE_FIELD {
            if c == ' ' {
                self.favorite = !self.favorite;
            }
            return;
        }
        if let Some(field) = self.current_input() {
            field.handle_char(c);
        }
    }

    pub fn handle_backspace(&mut self) {
        if let Some(field) = self.current_input() {
            field.handle_backspace();
        }
    }

    pub fn handle_delete(&mut self) {
        if let Some(field) = self.current_input() {
            field.handle_delete();
        }
    }

    /// Left/right moves the cursor, or flips the checkbox when it has focus.
    pub fn handle_left_right(&mut self, right: bool) {
        if self.current_field == FAVORITE_FIELD {
            self.favorite = !self.favorite;
            return;
        }
        if let Some(field) = self.current_input() {
            if right {
                field.move_cursor_right()
            } else {
                field.move_cursor_left()
            }
        }
    }

    pub fn handle_home_end(&mut self, end: bool) {
        if let Some(field) = self.current_input() {
            if end {
                field.move_end()
            } else {
                field.move_home()
            }
        }
    }
}

impl Default for TaskForm {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_form_cycles_three_fields() {
        let mut form = TaskForm::new();
        assert!(form.title.active);
        form.next_field();
        assert!(form.description.active && !form.title.active);
        form.next_field();
        assert_eq!(form.current_field, FAVORITE_FIELD);
        assert!(!form.description.active);
        form.handle_char(' ');
        assert!(form.favorite);
        form.handle_char('x');
        assert!(form.favorite);
        form.next_field();
        assert_eq!(form.current_field, TITLE_FIELD);
    }

    #[test]
    fn test_edit_form_skips_favorite() {
        let task = Task {
            id: 7,
            title: "t".into(),
            description: "d".into(),
            is_favorite: true,
        };
        let mut form = TaskForm::from_task(&task);
        assert_eq!(form.task_id, Some(7));
        form.prev_field();
        assert_eq!(form.current_field, DESCRIPTION_FIELD);
        form.next_field();
        form.next_field();
        assert_eq!(form.current_field, DESCRIPTION_FIELD);
        form.handle_char('!');
        assert_eq!(form.description.value, "d!");
    }
}
