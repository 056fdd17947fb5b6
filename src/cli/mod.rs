//! Command-line interface for todo-reminders.
//!
//! Every command prints JSON to stdout on success and a message to stderr on
//! failure.

mod run;


pub use run::{run, CliOutput, Context};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Local to-do list with reminders.
///
/// Tasks are stored in a `SQLite` database in the data directory. Reminders
/// are delivered while the `remind` command is running.
#[derive(Parser, Debug)]
#[command(name = "todo-reminders")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory (defaults to the platform data directory)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Commands that work on the stored tasks.
    #[command(flatten)]
    Task(TaskCommand),

    /// Show version information.
    Version,
}

/// Task commands. Each one opens the task store first.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum TaskCommand {
    /// List all tasks in insertion order.
    List,

    /// Add a task. Blank titles are ignored (reported with `"changed": false`).
    Add {
        /// Task title
        title: String,
    },

    /// Change a task's title. Blank titles and unknown ids change nothing.
    Edit {
        /// Task ID
        id: String,

        /// New title
        title: String,
    },

    /// Flip a task's completed flag. Unknown ids change nothing.
    Toggle {
        /// Task ID
        id: String,
    },

    /// Remove a task.
    #[command(alias = "remove")]
    Rm {
        /// Task ID
        id: String,
    },

    /// Show one task, or `null` if there is none with that id.
    Show {
        /// Task ID
        id: String,
    },

    /// Search task titles, ignoring case.
    Search {
        /// Text to look for; empty matches everything
        #[arg(default_value = "")]
        query: String,
    },

    /// Replace all tasks with a default dataset.
    ///
    /// Also recovers from a task collection that can no longer be read.
    Reset {
        /// Start from an empty list instead of the sample tasks
        #[arg(long)]
        empty: bool,
    },

    /// Schedule a reminder for a task and wait for it to fire.
    Remind {
        /// Task ID
        id: String,

        /// Seconds from now
        #[arg(long = "in", default_value = "60")]
        in_secs: u64,
    },
}

impl TaskCommand {
    /// Returns true if this command can run when the stored tasks are unreadable.
    #[must_use]
    pub const fn tolerates_corrupt_data(&self) -> bool {
        matches!(self, Self::Reset { .. })
    }
}
