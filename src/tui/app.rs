//! Main application logic for the terminal user interface.
//!
//! This module contains the `App` struct which owns the session controller,
//! handles user input, renders the interface, and coordinates between the
//! different screens (task list, detail, forms, confirmation).
//!
//! The app never touches the store directly: every action goes through the
//! `Controller`, and the `View` it returns is what gets drawn next.

use std::collections::BTreeMap;
use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use tracing::debug;

use crate::controller::{self, Controller, View};
use crate::db::{first_line, format_favorite, TaskRepository};
use crate::task::{Task, TaskId};
use crate::tui::{
    colors::{DARK_RED, EDIT_BLUE, GOLD, SLATE},
    enums::AppState,
    task_form::{TaskForm, DESCRIPTION_FIELD, FAVORITE_FIELD, TITLE_FIELD},
    utils::centered_rect,
};

/// Main application state for the terminal user interface.
pub struct App<R: TaskRepository> {
    state: AppState,
    ctl: Controller<R>,
    view: View,
    task_list_state: TableState,
    selected_task: Option<TaskId>,
    task_form: TaskForm,
    /// Unsaved edit buffers for rows in edit mode, keyed by task id.
    edit_forms: BTreeMap<TaskId, TaskForm>,
    status_message: String,
    filter_text: String,
    filter_active: bool,
}

impl<R: TaskRepository> App<R> {
    /// Create the app and load the initial task list.
    pub fn new(ctl: Controller<R>) -> controller::Result<Self> {
        let view = ctl.refresh()?;
        let mut app = App {
            state: AppState::TaskList,
            ctl,
            view,
            task_list_state: TableState::default(),
            selected_task: None,
            task_form: TaskForm::new(),
            edit_forms: BTreeMap::new(),
            status_message: String::new(),
            filter_text: String::new(),
            filter_active: false,
        };
        app.sync_selection(None);
        Ok(app)
    }

    /// Adopt a fresh view and keep the selection on the same task when possible.
    fn set_view(&mut self, view: View) {
        let old_selected = self.selected_id();
        self.view = view;
        // Buffers for rows that left edit mode elsewhere (save, delete, clear) are stale.
        let editing = &self.view.editing;
        self.edit_forms.retain(|id, _| editing.contains(id));
        self.sync_selection(old_selected);
    }

    fn sync_selection(&mut self, keep: Option<TaskId>) {
        let idx = keep
            .and_then(|id| self.view.tasks.iter().position(|t| t.id == id))
            .or_else(|| {
                let prev = self.task_list_state.selected().unwrap_or(0);
                if self.view.tasks.is_empty() {
                    None
                } else {
                    Some(prev.min(self.view.tasks.len() - 1))
                }
            });
        self.task_list_state.select(idx);
    }

    /// Apply a controller result: adopt the view on success, report the error otherwise.
    fn apply(&mut self, result: controller::Result<View>, ok_message: &str) -> bool {
        match result {
            Ok(view) => {
                self.set_view(view);
                if !ok_message.is_empty() {
                    self.set_status_message(ok_message.to_string());
                }
                true
            }
            Err(e) => {
                debug!(error = %e, "action rejected");
                self.set_status_message(e.to_string());
                false
            }
        }
    }

    fn selected_id(&self) -> Option<TaskId> {
        self.task_list_state
            .selected()
            .and_then(|idx| self.view.tasks.get(idx))
            .map(|t| t.id)
    }

    fn find_task(&self, id: TaskId) -> Option<&Task> {
        self.view.tasks.iter().find(|t| t.id == id)
    }

    fn set_status_message(&mut self, msg: String) {
        self.status_message = msg;
    }

    fn clear_status_message(&mut self) {
        self.status_message.clear();
    }

    fn refresh_tasks(&mut self) {
        let result = self.ctl.refresh();
        self.apply(result, "Tasks refreshed");
    }

    /// Open the edit form for a task, entering edit mode or resuming a kept buffer.
    fn open_edit(&mut self, id: TaskId) {
        if let Some(form) = self.edit_forms.remove(&id) {
            self.task_form = form;
        } else {
            let Some(task) = self.find_task(id).cloned() else {
                return;
            };
            let result = self.ctl.begin_edit(id);
            if !self.apply(result, "") {
                return;
            }
            self.task_form = TaskForm::from_task(&task);
        }
        self.selected_task = Some(id);
        self.state = AppState::EditTask;
    }

    fn toggle_favorite(&mut self, id: TaskId) {
        let Some(persisted) = self.find_task(id).map(|t| t.is_favorite) else {
            return;
        };
        let result = self.ctl.reconcile_favorite(id, persisted, !persisted);
        self.apply(
            result,
            if persisted { "Removed from favorites" } else { "Added to favorites" },
        );
    }

    fn delete_task(&mut self, id: TaskId) -> bool {
        let result = self.ctl.delete_task(id);
        self.apply(result, &format!("Deleted task #{}", id))
    }

    /// Handle keyboard input when in the task list view.
    ///
    /// Returns true if the application should quit.
    fn handle_task_list_input(&mut self, key: KeyCode, modifiers: KeyModifiers) -> bool {
        if self.filter_active {
            match key {
                KeyCode::Esc => {
                    self.filter_active = false;
                    self.filter_text.clear();
                    let result = self.ctl.set_search("");
                    self.apply(result, "");
                }
                KeyCode::Enter => {
                    self.filter_active = false;
                    if self.filter_text.is_empty() {
                        self.set_status_message("Search cleared".to_string());
                    } else {
                        self.set_status_message(format!(
                            "Search applied: '{}' ({} tasks)",
                            self.filter_text,
                            self.view.tasks.len()
                        ));
                    }
                }
                KeyCode::Backspace => {
                    if self.filter_text.pop().is_some() {
                        let result = self.ctl.set_search(self.filter_text.clone());
                        self.apply(result, "");
                    }
                }
                KeyCode::Char(c) => {
                    self.filter_text.push(c);
                    let result = self.ctl.set_search(self.filter_text.clone());
                    self.apply(result, "");
                }
                _ => {}
            }
            return false;
        }

        match key {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::Char('q') => return true,
            KeyCode::Esc => {
                if !self.filter_text.is_empty() {
                    self.filter_text.clear();
                    let result = self.ctl.set_search("");
                    self.apply(result, "Search cleared");
                } else {
                    return true;
                }
            }
            KeyCode::Up => {
                if let Some(selected) = self.task_list_state.selected() {
                    if selected > 0 {
                        self.task_list_state.select(Some(selected - 1));
                    }
                } else if !self.view.tasks.is_empty() {
                    self.task_list_state.select(Some(0));
                }
            }
            KeyCode::Down => {
                if let Some(selected) = self.task_list_state.selected() {
                    if selected + 1 < self.view.tasks.len() {
                        self.task_list_state.select(Some(selected + 1));
                    }
                } else if !self.view.tasks.is_empty() {
                    self.task_list_state.select(Some(0));
                }
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                if let Some(id) = self.selected_id() {
                    if self.view.is_editing(id) {
                        self.open_edit(id);
                    } else {
                        self.selected_task = Some(id);
                        self.state = AppState::TaskDetail;
                    }
                }
            }
            KeyCode::Char('a') => {
                self.task_form = TaskForm::new();
                self.state = AppState::AddTask;
            }
            KeyCode::Char('e') => {
                if let Some(id) = self.selected_id() {
                    self.open_edit(id);
                }
            }
            KeyCode::Char('f') => {
                if let Some(id) = self.selected_id() {
                    self.toggle_favorite(id);
                }
            }
            KeyCode::Char('d') => {
                if let Some(id) = self.selected_id() {
                    self.delete_task(id);
                }
            }
            KeyCode::Char('X') => {
                let result = self.ctl.request_clear();
                if self.apply(result, "") {
                    self.state = AppState::Confirm;
                }
            }
            KeyCode::Char('v') => {
                let next = self.ctl.session().query().favorite.cycle();
                let result = self.ctl.set_favorite_filter(next);
                self.apply(result, &format!("Filter: {}", next.label()));
            }
            KeyCode::Char('/') => {
                self.filter_active = true;
                self.set_status_message(
                    "Search mode: type to filter titles, Enter to apply, Esc to cancel".to_string(),
                );
            }
            KeyCode::Char('h') | KeyCode::Char('?') => {
                self.state = AppState::Help;
            }
            KeyCode::Char('r') => {
                self.refresh_tasks();
            }
            _ => {}
        }
        false
    }

    /// Handle keyboard input when viewing task details.
    fn handle_detail_input(&mut self, key: KeyCode) -> bool {
        let Some(id) = self.selected_task else {
            self.state = AppState::TaskList;
            return false;
        };
        match key {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter => {
                self.state = AppState::TaskList;
            }
            KeyCode::Char('e') => self.open_edit(id),
            KeyCode::Char('f') => self.toggle_favorite(id),
            KeyCode::Char('d') => {
                if self.delete_task(id) {
                    self.selected_task = None;
                    self.state = AppState::TaskList;
                }
            }
            _ => {}
        }
        false
    }

    /// Handle keyboard input in the create and edit forms.
    fn handle_form_input(&mut self, key: KeyCode, modifiers: KeyModifiers) -> bool {
        let editing = self.task_form.task_id;
        match key {
            KeyCode::Char('b') if modifiers.contains(KeyModifiers::CONTROL) => {
                // Leave the form but keep the row in edit mode with its buffer.
                if let Some(id) = editing {
                    self.edit_forms.insert(id, self.task_form.clone());
                    self.set_status_message(format!("Task #{} still in edit mode", id));
                }
                self.state = AppState::TaskList;
            }
            KeyCode::Esc => {
                if let Some(id) = editing {
                    let result = self.ctl.cancel_edit(id);
                    self.apply(result, "Edit cancelled");
                }
                self.state = AppState::TaskList;
            }
            KeyCode::Tab | KeyCode::Down => self.task_form.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.task_form.prev_field(),
            KeyCode::Left => self.task_form.handle_left_right(false),
            KeyCode::Right => self.task_form.handle_left_right(true),
            KeyCode::Home => self.task_form.handle_home_end(false),
            KeyCode::End => self.task_form.handle_home_end(true),
            KeyCode::Backspace => self.task_form.handle_backspace(),
            KeyCode::Delete => self.task_form.handle_delete(),
            KeyCode::Enter => {
                // Stored as typed; the controller rejects blank titles.
                let title = self.task_form.title.value.clone();
                let description = self.task_form.description.value.clone();
                let saved = match editing {
                    Some(id) => {
                        let result = self.ctl.save_edit(id, &title, &description);
                        self.apply(result, "Task updated")
                    }
                    None => match self.ctl.create_task(&title, &description, self.task_form.favorite) {
                        Ok((id, view)) => self.apply(Ok(view), &format!("Created task #{}", id)),
                        Err(e) => self.apply(Err(e), ""),
                    },
                };
                if saved {
                    self.state = AppState::TaskList;
                }
            }
            KeyCode::Char(c) => self.task_form.handle_char(c),
            _ => {}
        }
        false
    }

    /// Handle keyboard input in the clear-all confirmation overlay.
    fn handle_confirm_input(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                let result = self.ctl.confirm_clear();
                self.apply(result, "All tasks have been deleted.");
                self.state = AppState::TaskList;
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                let result = self.ctl.cancel_clear();
                self.apply(result, "Cancelled");
                self.state = AppState::TaskList;
            }
            _ => {}
        }
        false
    }

    fn handle_help_input(&mut self, key: KeyCode) -> bool {
        if matches!(key, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('h') | KeyCode::Char('?')) {
            self.state = AppState::TaskList;
        }
        false
    }

    /// Dispatch one key press to the handler for the current screen.
    ///
    /// Returns true if the application should quit.
    pub fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> bool {
        self.clear_status_message();
        match self.state {
            AppState::TaskList => self.handle_task_list_input(key, modifiers),
            AppState::TaskDetail => self.handle_detail_input(key),
            AppState::AddTask | AppState::EditTask => self.handle_form_input(key, modifiers),
            AppState::Help => self.handle_help_input(key),
            AppState::Confirm => self.handle_confirm_input(key),
        }
    }

    /// Poll for and handle keyboard events.
    ///
    /// Returns true if the application should quit.
    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(self.handle_key(key.code, key.modifiers));
                }
            }
        }
        Ok(false)
    }

    /// Render the header with the active search and favorite filter.
    fn render_header(&mut self, f: &mut Frame, area: Rect) {
        let query = self.ctl.session().query();
        let search = query.search_text().unwrap_or("-");
        let header = Paragraph::new(Line::from(vec![
            Span::styled("PROMPT MANAGER", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(
                format!("Search: {}  Filter: {}", search, query.favorite.label()),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
            ),
        ]))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);
        f.render_widget(header, area);
    }

    /// Render the main task table.
    fn render_task_list(&mut self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);
        self.render_header(f, chunks[0]);

        let header = Row::new(["ID", "Fav", "Title", "Description"].map(|h| {
            Cell::from(h).style(Style::default().add_modifier(Modifier::BOLD))
        }))
        .style(Style::default().bg(SLATE).fg(Color::White))
        .height(1);

        let rows: Vec<Row> = self
            .view
            .tasks
            .iter()
            .map(|task| {
                let editing = self.view.is_editing(task.id);
                let marker = if editing { "✎" } else { format_favorite(task.is_favorite) };
                let style = if editing {
                    Style::default().fg(EDIT_BLUE).add_modifier(Modifier::ITALIC)
                } else {
                    Style::default().fg(Color::White)
                };
                Row::new(vec![
                    Cell::from(task.id.to_string()),
                    Cell::from(marker).style(Style::default().fg(GOLD)),
                    Cell::from(task.title.clone()),
                    Cell::from(first_line(&task.description).to_string()),
                ])
                .style(style)
            })
            .collect();

        let widths = [
            Constraint::Length(5),
            Constraint::Length(3),
            Constraint::Percentage(40),
            Constraint::Min(20),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Tasks ({}) - Press 'h' for help", self.view.tasks.len())),
            )
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");

        f.render_stateful_widget(table, chunks[1], &mut self.task_list_state);
    }

    /// Render the expanded view of a single task.
    fn render_task_detail(&mut self, f: &mut Frame, area: Rect) {
        let task = match self.selected_task.and_then(|id| self.find_task(id)) {
            Some(task) => task.clone(),
            None => {
                self.render_task_list(f, area);
                return;
            }
        };

        let mut text = vec![
            Line::from(vec![
                Span::styled("Favorite: ", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(if task.is_favorite { "yes" } else { "no" }),
            ]),
            Line::from(""),
            Line::from(Span::styled("Description:", Style::default().add_modifier(Modifier::BOLD))),
        ];
        if task.description.is_empty() {
            text.push(Line::from("-"));
        } else {
            text.extend(task.description.lines().map(|l| Line::from(l.to_string())));
        }
        text.push(Line::from(""));
        text.push(Line::from(Span::styled(
            "e edit   f favorite   d delete   Esc back",
            Style::default().fg(Color::DarkGray),
        )));

        let paragraph = Paragraph::new(text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("#{} {}", task.id, task.title)),
            )
            .wrap(Wrap { trim: false });
        f.render_widget(paragraph, area);
    }

    /// Render the create or edit form.
    fn render_task_form(&mut self, f: &mut Frame, area: Rect) {
        let form = &self.task_form;
        let title = match form.task_id {
            Some(id) => format!("Edit Task #{} (Enter save, Esc cancel, Ctrl+B keep editing later)", id),
            None => "Create Task (Enter create, Esc cancel)".to_string(),
        };
        let block = Block::default().borders(Borders::ALL).title(title);
        let inner = block.inner(area);
        f.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(5),
                Constraint::Length(3),
                Constraint::Min(0),
            ])
            .split(inner);

        let field_style = |focused: bool| {
            if focused {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            }
        };

        let title_text = if form.title.active {
            form.title.display_with_cursor()
        } else {
            form.title.value.clone()
        };
        f.render_widget(
            Paragraph::new(title_text).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Title")
                    .border_style(field_style(form.current_field == TITLE_FIELD)),
            ),
            chunks[0],
        );

        let desc_text = if form.description.active {
            form.description.display_with_cursor()
        } else {
            form.description.value.clone()
        };
        f.render_widget(
            Paragraph::new(desc_text)
                .wrap(Wrap { trim: false })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title("Description")
                        .border_style(field_style(form.current_field == DESCRIPTION_FIELD)),
                ),
            chunks[1],
        );

        if !form.is_edit() {
            let checkbox = format!("[{}] Favorite", if form.favorite { "x" } else { " " });
            f.render_widget(
                Paragraph::new(checkbox).block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(field_style(form.current_field == FAVORITE_FIELD)),
                ),
                chunks[2],
            );
        }
    }

    fn render_help(&mut self, f: &mut Frame, area: Rect) {
        let lines = [
            ("Up/Down", "Move selection"),
            ("Enter", "Show description (or resume edit)"),
            ("a", "Create a task"),
            ("e", "Edit selected task"),
            ("f", "Toggle favorite"),
            ("d", "Delete selected task"),
            ("X", "Delete all tasks (asks first)"),
            ("/", "Search titles"),
            ("v", "Cycle favorite filter"),
            ("r", "Refresh"),
            ("q / Esc", "Quit"),
        ];
        let text: Vec<Line> = lines
            .iter()
            .map(|(k, d)| {
                Line::from(vec![
                    Span::styled(format!("{:<10}", k), Style::default().add_modifier(Modifier::BOLD)),
                    Span::raw(*d),
                ])
            })
            .collect();
        let area = centered_rect(60, 60, area);
        f.render_widget(Clear, area);
        f.render_widget(
            Paragraph::new(text).block(Block::default().borders(Borders::ALL).title("Help")),
            area,
        );
    }

    /// Render the clear-all confirmation overlay.
    fn render_confirm(&mut self, f: &mut Frame, area: Rect) {
        let block = Block::default()
            .title("Confirm Action")
            .borders(Borders::ALL)
            .style(Style::default().bg(DARK_RED));

        let area = centered_rect(50, 30, area);
        f.render_widget(Clear, area);

        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                "Are you sure you want to delete all tasks?",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("This action cannot be undone."),
            Line::from(""),
            Line::from("Press 'y' to confirm, 'n' to cancel"),
        ];

        let paragraph = Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    /// Render the status bar at the bottom of the screen.
    fn render_status_bar(&mut self, f: &mut Frame, area: Rect) {
        let status_text = if !self.status_message.is_empty() {
            self.status_message.clone()
        } else if self.filter_active {
            format!("Search: {} (Esc to clear, Enter to confirm)", self.filter_text)
        } else {
            match self.state {
                AppState::TaskList => {
                    let editing = self.view.editing.len();
                    if editing > 0 {
                        format!("Tasks: {} | {} in edit mode | Press 'h' for help", self.view.tasks.len(), editing)
                    } else {
                        format!("Tasks: {} | Press 'h' for help", self.view.tasks.len())
                    }
                }
                AppState::TaskDetail => "Task Details".to_string(),
                AppState::AddTask => "Add New Task".to_string(),
                AppState::EditTask => "Edit Task".to_string(),
                AppState::Help => "Help".to_string(),
                AppState::Confirm => "Confirm Action".to_string(),
            }
        };

        let status = Paragraph::new(status_text)
            .style(Style::default().bg(SLATE).fg(Color::White))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    /// Main render function that dispatches to the view renderers.
    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(f.area());

        match self.state {
            AppState::TaskList => self.render_task_list(f, chunks[0]),
            AppState::TaskDetail => self.render_task_detail(f, chunks[0]),
            AppState::AddTask | AppState::EditTask => self.render_task_form(f, chunks[0]),
            AppState::Help => {
                self.render_task_list(f, chunks[0]);
                self.render_help(f, chunks[0]);
            }
            AppState::Confirm => {
                self.render_task_list(f, chunks[0]);
                self.render_confirm(f, chunks[0]);
            }
        }

        self.render_status_bar(f, chunks[1]);
    }

    /// Main event loop: render, then handle input, until the user quits.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }
}
