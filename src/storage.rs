//! `SQLite`-backed key-value storage.
//!
//! All values live in one table of a single database file, by default at
//! `<data dir>/todo-reminders/todo-reminders.sqlite3`.

use crate::error::{Error, Result};
use crate::paths;
use crate::traits::KeyValueStore;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

/// SQLite-based key-value store.
///
/// Each operation opens a new connection to the database file on the
/// blocking thread pool. Operations are infrequent, so there is no pool.
#[derive(Debug, Clone)]
pub struct SqliteKeyValueStore {
    /// Path to the database file.
    db_path: PathBuf,
}

impl SqliteKeyValueStore {
    /// Create a store in `data_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new(data_dir: &Path) -> Result<Self> {
        Self::with_path(data_dir.join(paths::DATABASE_FILENAME))
    }

    /// Create a store with a specific database path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn with_path(db_path: PathBuf) -> Result<Self> {
        let store = Self { db_path };
        store.init_schema()?;
        Ok(store)
    }

    /// Get the database path.
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn open(&self) -> Result<Connection> {
        if let Some(parent) = self.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&self.db_path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        Ok(conn)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.open()?;
        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    fn get_sync(&self, key: &str) -> Result<Option<String>> {
        let conn = self.open()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set_sync(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove_sync(&self, key: &str) -> Result<()> {
        let conn = self.open()?;
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(Self) -> Result<T> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || op(store))
            .await
            .map_err(|e| Error::Storage(format!("storage task failed: {e}")))?
    }
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        self.blocking(move |store| store.get_sync(&key)).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let key = key.to_string();
        let value = value.to_string();
        self.blocking(move |store| store.set_sync(&key, &value)).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let key = key.to_string();
        self.blocking(move |store| store.remove_sync(&key)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::TaskStore;
    use tempfile::TempDir;

    fn create_test_store() -> (TempDir, SqliteKeyValueStore) {
        let dir = TempDir::new().unwrap();
        let store = SqliteKeyValueStore::new(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_new_store_creates_database() {
        let (_dir, store) = create_test_store();
        assert!(store.db_path().exists());
        assert!(store.db_path().to_string_lossy().ends_with(paths::DATABASE_FILENAME));
    }

    #[test]
    fn test_with_path_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("db.sqlite3");
        let store = SqliteKeyValueStore::with_path(path.clone()).unwrap();
        assert_eq!(store.db_path(), path);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let (_dir, store) = create_test_store();
        assert_eq!(store.get("@tasks").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_get_overwrite() {
        let (_dir, store) = create_test_store();
        store.set("k", "one").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("one"));
        store.set("k", "two").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn test_remove() {
        let (_dir, store) = create_test_store();
        store.set("k", "v").await.unwrap();
        store.remove("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
        // Removing again is fine.
        store.remove("k").await.unwrap();
    }

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        SqliteKeyValueStore::new(dir.path()).unwrap().set("k", "v").await.unwrap();
        let reopened = SqliteKeyValueStore::new(dir.path()).unwrap();
        assert_eq!(reopened.get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_task_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = TaskStore::new(SqliteKeyValueStore::new(dir.path()).unwrap());
        store.load().await.unwrap();
        let task = store.add("Walk the dog").await.unwrap().unwrap();
        store.toggle_completed(&task.id).await.unwrap();

        let reopened = TaskStore::new(SqliteKeyValueStore::new(dir.path()).unwrap());
        reopened.load().await.unwrap();
        let tasks = reopened.tasks().await;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Walk the dog");
        assert!(tasks[0].completed);
    }
}
