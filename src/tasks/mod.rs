//! Task management.
//!
//! This module provides the to-do list core:
//! - Tasks with a title and a completion flag
//! - A store that persists the whole collection under one key
//! - Case-insensitive title search, optionally debounced through [`SearchView`]
//! - Named default datasets for "reset to defaults"
//!
//! # Example
//!
//! ```no_run
//! use todo_reminders::storage::SqliteKeyValueStore;
//! use todo_reminders::tasks::{search, TaskStore};
//!
//! # async fn demo() -> todo_reminders::Result<()> {
//! let store = TaskStore::new(SqliteKeyValueStore::with_path("/tmp/todo.sqlite3".into())?);
//! store.load().await?;
//!
//! let task = store.add("Pay rent").await?.expect("title is not blank");
//! store.toggle_completed(&task.id).await?;
//!
//! let matches = search("rent", &store.tasks().await);
//! assert_eq!(matches.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod defaults;
pub mod id;
pub mod models;
pub mod search;
pub mod store;

pub use defaults::DefaultDataset;
pub use id::IdGenerator;
pub use models::{EditOutcome, Task};
pub use search::{search, SearchView, DEFAULT_SEARCH_DEBOUNCE};
pub use store::{StoreKeys, TaskStore, DEFAULT_STORAGE_KEY, DEFAULT_TASK_KEY_PREFIX};
