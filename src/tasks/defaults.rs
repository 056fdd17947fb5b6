//! Named datasets a store can be reset to.

use crate::tasks::models::Task;

/// A named set of tasks injected by the caller for "reset to defaults".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultDataset {
    /// Name shown to the user and written to the log.
    pub name: String,
    /// Tasks in display order.
    pub tasks: Vec<Task>,
}

impl DefaultDataset {
    /// Create a dataset from explicit tasks.
    #[must_use]
    pub fn new(name: impl Into<String>, tasks: Vec<Task>) -> Self {
        Self { name: name.into(), tasks }
    }

    /// Create a dataset from titles, numbering ids from 1.
    ///
    /// Blank titles are skipped. The ids only order the entries;
    /// [`TaskStore::reset_to`](crate::tasks::TaskStore::reset_to) issues fresh ones.
    #[must_use]
    pub fn from_titles<'a>(
        name: impl Into<String>,
        titles: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let tasks = titles
            .into_iter()
            .filter_map(crate::tasks::models::normalize_title)
            .enumerate()
            .map(|(i, title)| Task::new((i + 1).to_string(), title))
            .collect();
        Self::new(name, tasks)
    }

    /// An empty dataset.
    #[must_use]
    pub fn empty() -> Self {
        Self::new("empty", Vec::new())
    }

    /// The sample dataset shipped with the app.
    #[must_use]
    pub fn sample() -> Self {
        Self::from_titles(
            "sample",
            ["Buy groceries", "Walk the dog", "Pay rent", "Call mom", "Read a book"],
        )
    }
}
