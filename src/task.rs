//! Task data structure.
//!
//! This module defines the `Task` struct that represents a single stored
//! prompt: a title, a free-form description and a favorite flag.

use serde::{Deserialize, Serialize};

/// Store-assigned task identifier. Never reused once a task is deleted.
pub type TaskId = i64;

/// A stored prompt as read back from the `tasks` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_favorite: bool,
}
