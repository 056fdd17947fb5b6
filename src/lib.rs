//! # `todo_reminders`
//!
//! A local to-do list with persistence, debounced search and one-shot task
//! reminders.
//!
//! - [`tasks::TaskStore`] owns the task collection and writes it through a
//!   [`traits::KeyValueStore`] after every change.
//! - [`tasks::SearchView`] filters a task snapshot by a debounced query.
//! - [`reminders::ReminderScheduler`] schedules notifications through a
//!   [`traits::NotificationBackend`] and hands fired task ids back.

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod debounce;
pub mod error;
pub mod logging;
pub mod paths;
pub mod reminders;
pub mod storage;
pub mod tasks;
pub mod testing;
pub mod traits;

pub use error::{Error, Result, SchedulingError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
