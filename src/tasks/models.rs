//! Task model types.

use serde::{Deserialize, Serialize};

/// A to-do item.
///
/// Serialized as `{ "id": ..., "title": ..., "completed": ... }`. Older records
/// without a `completed` field load as not completed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier, assigned at creation and never changed.
    pub id: String,
    /// Display title. Never empty after trimming.
    pub title: String,
    /// Whether the task has been completed.
    #[serde(default)]
    pub completed: bool,
}

impl Task {
    /// Create a new, not-yet-completed task.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self { id: id.into(), title: title.into(), completed: false }
    }
}

/// Result of an edit that targets an existing task by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// The edit was applied; holds the task as it is now.
    Applied(Task),
    /// The input failed validation (empty title); nothing changed.
    Ignored,
    /// No task with the given id exists; nothing changed.
    NotFound,
}

impl EditOutcome {
    /// The updated task, if the edit was applied.
    #[must_use]
    pub fn task(&self) -> Option<&Task> {
        match self {
            Self::Applied(task) => Some(task),
            Self::Ignored | Self::NotFound => None,
        }
    }

    /// Consume the outcome, returning the updated task if any.
    #[must_use]
    pub fn into_task(self) -> Option<Task> {
        match self {
            Self::Applied(task) => Some(task),
            Self::Ignored | Self::NotFound => None,
        }
    }
}

/// Normalize a user-supplied title, returning `None` if it is blank.
#[must_use]
pub fn normalize_title(title: &str) -> Option<&str> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
