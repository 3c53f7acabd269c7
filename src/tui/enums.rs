//! Enumerations for TUI state management.

/// Screen the terminal user interface is currently showing.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AppState {
    TaskList,
    TaskDetail,
    AddTask,
    EditTask,
    Help,
    /// Clear-all confirmation overlay.
    Confirm,
}
