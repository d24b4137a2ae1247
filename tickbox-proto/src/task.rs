//! Task model and persisted layout for `Tickbox`.
//!
//! A [`Task`] is stored as a flat JSON object `{id, text, completed}` inside
//! a JSON array under [`TODOS_KEY`]. The filter preference is a bare JSON
//! boolean under [`SHOW_COMPLETED_KEY`]. There is no versioning scheme.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Storage key holding the JSON array of tasks.
pub const TODOS_KEY: &str = "todos";

/// Storage key holding the `show completed` filter preference.
pub const SHOW_COMPLETED_KEY: &str = "showCompleted";

/// Filter preference used when nothing has been stored yet.
pub const DEFAULT_SHOW_COMPLETED: bool = true;

/// Unique identifier for a task.
///
/// New identifiers are UUID v7 strings, so they sort in creation order.
/// Identifiers loaded from storage are kept verbatim, whatever their shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Creates a new time-ordered task identifier (UUID v7).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Wraps an existing identifier string.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single todo item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Stable identifier assigned at creation.
    pub id: TaskId,
    /// Task text, already validated and trimmed by the input layer.
    pub text: String,
    /// Whether the task has been completed.
    pub completed: bool,
}

impl Task {
    /// Creates a new, not yet completed task with a fresh identifier.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: TaskId::new(),
            text: text.into(),
            completed: false,
        }
    }
}

/// Returns a copy of `tasks` with `completed` flipped on the task matching `id`.
///
/// An unknown `id` yields an identical copy.
#[must_use]
pub fn with_toggled(tasks: &[Task], id: &TaskId) -> Vec<Task> {
    tasks
        .iter()
        .map(|t| {
            if t.id == *id {
                Task {
                    completed: !t.completed,
                    ..t.clone()
                }
            } else {
                t.clone()
            }
        })
        .collect()
}

/// Returns a copy of `tasks` with the task matching `id` removed.
#[must_use]
pub fn without(tasks: &[Task], id: &TaskId) -> Vec<Task> {
    tasks.iter().filter(|t| t.id != *id).cloned().collect()
}

/// Returns a copy of `tasks` with the text of the task matching `id` replaced.
///
/// `completed` is left untouched.
#[must_use]
pub fn with_text(tasks: &[Task], id: &TaskId, text: &str) -> Vec<Task> {
    tasks
        .iter()
        .map(|t| {
            if t.id == *id {
                Task {
                    text: text.to_string(),
                    ..t.clone()
                }
            } else {
                t.clone()
            }
        })
        .collect()
}
