//! Command execution for the CLI.
//!
//! This module handles running CLI commands and producing output.

use crate::cli::{Command, TaskCommand};
use crate::config::AppConfig;
use crate::paths;
use crate::reminders::{LocalNotificationCenter, ReminderHandle, ReminderScheduler};
use crate::storage::SqliteKeyValueStore;
use crate::tasks::{search, DefaultDataset, EditOutcome, Task, TaskStore};
use chrono::Utc;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

type Store = TaskStore<SqliteKeyValueStore>;

/// Output from running the CLI, with separate stdout and stderr messages.
#[derive(Debug)]
pub struct CliOutput {
    /// Exit code for the process.
    pub exit_code: ExitCode,
    /// Messages to print to stdout.
    pub stdout: Vec<String>,
    /// Messages to print to stderr.
    pub stderr: Vec<String>,
}

/// Where the CLI keeps its data, and the configuration found there.
#[derive(Debug, Clone)]
pub struct Context {
    /// The data directory.
    pub data_dir: PathBuf,
    /// Configuration loaded from the data directory.
    pub config: AppConfig,
}

impl Context {
    /// Resolve the data directory and load its configuration.
    ///
    /// # Errors
    ///
    /// Returns a message if no data directory can be determined or the
    /// config file cannot be parsed.
    pub fn resolve(data_dir: Option<PathBuf>) -> Result<Self, String> {
        let data_dir = data_dir
            .or_else(paths::data_dir)
            .ok_or_else(|| "Could not determine a data directory; pass --data-dir".to_string())?;
        let config = AppConfig::load_or_default(&data_dir)
            .map_err(|e| format!("Error loading config: {e}"))?;
        Ok(Self { data_dir, config })
    }
}

/// Run a CLI command against the data in `ctx`.
pub async fn run(command: Command, ctx: &Context) -> CliOutput {
    match command {
        Command::Version => run_version(),
        Command::Task(cmd) => run_task_cmd(cmd, ctx).await,
    }
}

async fn run_task_cmd(cmd: TaskCommand, ctx: &Context) -> CliOutput {
    let store = match open_store(ctx, cmd.tolerates_corrupt_data()).await {
        Ok(s) => s,
        Err(e) => return error_output(e),
    };

    match cmd {
        TaskCommand::List => json_output(&store.tasks().await),
        TaskCommand::Add { title } => task_add(&store, &title).await,
        TaskCommand::Edit { id, title } => {
            edit_output(&id, store.update_title(&id, &title).await)
        }
        TaskCommand::Toggle { id } => edit_output(&id, store.toggle_completed(&id).await),
        TaskCommand::Rm { id } => task_remove(&store, &id).await,
        TaskCommand::Show { id } => json_output(&store.get(&id).await),
        TaskCommand::Search { query } => json_output(&search(&query, &store.tasks().await)),
        TaskCommand::Reset { empty } => task_reset(&store, empty).await,
        TaskCommand::Remind { id, in_secs } => task_remind(&store, ctx, &id, in_secs).await,
    }
}

fn run_version() -> CliOutput {
    CliOutput {
        exit_code: ExitCode::SUCCESS,
        stdout: vec![],
        stderr: vec![format!("todo-reminders v{}", crate::VERSION)],
    }
}

async fn open_store(ctx: &Context, tolerate_corrupt: bool) -> Result<Store, String> {
    let db_path = ctx.config.database_path(&ctx.data_dir);
    let backend = SqliteKeyValueStore::with_path(db_path)
        .map_err(|e| format!("Error opening database: {e}"))?;
    let store = TaskStore::with_keys(backend, ctx.config.store_keys());

    match store.load().await {
        Ok(_) => Ok(store),
        Err(e) if tolerate_corrupt && e.is_corrupt_data() => {
            warn!(error = %e, "starting from an empty list");
            Ok(store)
        }
        Err(e) if e.is_corrupt_data() => {
            Err(format!("Error loading tasks: {e}\nRun `todo-reminders reset` to start over."))
        }
        Err(e) => Err(format!("Error loading tasks: {e}")),
    }
}

async fn task_add(store: &Store, title: &str) -> CliOutput {
    match store.add(title).await {
        Ok(Some(task)) => json_output(&task),
        Ok(None) => json_output(&Unchanged { id: None, changed: false, reason: "blank_title" }),
        Err(e) => error_output(format!("Error saving tasks: {e}")),
    }
}

fn edit_output(id: &str, outcome: crate::Result<EditOutcome>) -> CliOutput {
    match outcome {
        Ok(EditOutcome::Applied(task)) => json_output(&task),
        Ok(EditOutcome::Ignored) => unchanged(id, "blank_title"),
        Ok(EditOutcome::NotFound) => unchanged(id, "not_found"),
        Err(e) => error_output(format!("Error saving tasks: {e}")),
    }
}

async fn task_remove(store: &Store, id: &str) -> CliOutput {
    match store.remove(id).await {
        Ok(removed) => json_output(&Removed { id: id.to_string(), removed }),
        Err(e) => error_output(format!("Error saving tasks: {e}")),
    }
}

async fn task_reset(store: &Store, empty: bool) -> CliOutput {
    let dataset = if empty { DefaultDataset::empty() } else { DefaultDataset::sample() };
    match store.reset_to(&dataset).await {
        Ok(tasks) => json_output(&tasks),
        Err(e) => error_output(format!("Error saving tasks: {e}")),
    }
}

async fn task_remind(store: &Store, ctx: &Context, id: &str, in_secs: u64) -> CliOutput {
    let Some(task) = store.get(id).await else {
        return error_output(format!("Task not found: {id}"));
    };
    let Some(fire_at) = i64::try_from(in_secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .and_then(|delay| Utc::now().checked_add_signed(delay))
    else {
        return error_output(format!("Delay of {in_secs}s is out of range"));
    };

    let center = Arc::new(LocalNotificationCenter::new());
    let scheduler = ReminderScheduler::new(center, ctx.config.reminder_config());
    scheduler.request_permission().await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscription = scheduler.on_fired(move |task_id| {
        let _ = tx.send(task_id);
    });

    let reminder = match scheduler.schedule(&task, fire_at).await {
        Ok(handle) => handle,
        Err(e) => return error_output(format!("Error scheduling reminder: {e}")),
    };

    let fired = rx.recv().await;
    subscription.unsubscribe().await;
    match fired {
        Some(task_id) => {
            let task = store.get(&task_id).await;
            json_output(&Fired { reminder, task })
        }
        None => error_output("Reminder listener stopped before the reminder fired".to_string()),
    }
}

fn unchanged(id: &str, reason: &'static str) -> CliOutput {
    json_output(&Unchanged { id: Some(id.to_string()), changed: false, reason })
}

fn json_output<T: Serialize>(value: &T) -> CliOutput {
    match serde_json::to_string_pretty(value) {
        Ok(json) => CliOutput { exit_code: ExitCode::SUCCESS, stdout: vec![json], stderr: vec![] },
        Err(e) => error_output(e.to_string()),
    }
}

fn error_output(message: String) -> CliOutput {
    CliOutput { exit_code: ExitCode::from(1), stdout: vec![], stderr: vec![message] }
}

// === Output Types ===

#[derive(Debug, Serialize)]
struct Removed {
    id: String,
    removed: bool,
}

#[derive(Debug, Serialize)]
struct Unchanged {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    changed: bool,
    reason: &'static str,
}

#[derive(Debug, Serialize)]
struct Fired {
    reminder: ReminderHandle,
    #[serde(skip_serializing_if = "Option::is_none")]
    task: Option<Task>,
}
