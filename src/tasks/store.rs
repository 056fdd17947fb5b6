//! The task store: the authoritative, persisted task collection.

use crate::error::{Error, Result};
use crate::tasks::defaults::DefaultDataset;
use crate::tasks::id::IdGenerator;
use crate::tasks::models::{normalize_title, EditOutcome, Task};
use crate::traits::KeyValueStore;
use std::collections::HashSet;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Default key holding the serialized collection.
pub const DEFAULT_STORAGE_KEY: &str = "@tasks";

/// Default prefix for per-task keys (`@task_<id>`).
pub const DEFAULT_TASK_KEY_PREFIX: &str = "@task_";

/// Keys used by a [`TaskStore`] in its backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreKeys {
    /// Key holding the whole serialized collection.
    pub collection: String,
    /// Prefix of the per-task keys cleared on removal.
    pub task_prefix: String,
}

impl Default for StoreKeys {
    fn default() -> Self {
        Self {
            collection: DEFAULT_STORAGE_KEY.to_string(),
            task_prefix: DEFAULT_TASK_KEY_PREFIX.to_string(),
        }
    }
}

impl StoreKeys {
    /// The per-task key for `id`.
    #[must_use]
    pub fn task_key(&self, id: &str) -> String {
        format!("{}{id}", self.task_prefix)
    }

    /// The key recording the highest id ever issued.
    #[must_use]
    pub fn last_id_key(&self) -> String {
        format!("{}:last_id", self.collection)
    }
}

/// Task collection persisted as one JSON array under a single key.
///
/// Every mutation holds the collection lock while it computes the next state
/// and writes it, so concurrent callers are applied one after another and
/// none of their changes is lost.
#[derive(Debug)]
pub struct TaskStore<S> {
    backend: S,
    keys: StoreKeys,
    ids: IdGenerator,
    tasks: Mutex<Vec<Task>>,
}

impl<S: KeyValueStore> TaskStore<S> {
    /// Create an empty store over `backend` using the default keys.
    ///
    /// Call [`load`](Self::load) to pick up previously persisted tasks.
    pub fn new(backend: S) -> Self {
        Self::with_keys(backend, StoreKeys::default())
    }

    /// Create an empty store with custom keys.
    pub fn with_keys(backend: S, keys: StoreKeys) -> Self {
        Self { backend, keys, ids: IdGenerator::new(), tasks: Mutex::new(Vec::new()) }
    }

    /// Replace the id generator (tests use a sequential one).
    #[must_use]
    pub fn with_id_generator(mut self, ids: IdGenerator) -> Self {
        self.ids = ids;
        self
    }

    /// The persistence backend.
    pub const fn backend(&self) -> &S {
        &self.backend
    }

    /// The keys this store writes under.
    pub const fn keys(&self) -> &StoreKeys {
        &self.keys
    }

    /// Read the persisted collection and make it the in-memory state.
    ///
    /// A missing blob is an empty collection. If two records share an id only
    /// the first is kept.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Persistence`] if the backend cannot be read and
    /// [`Error::CorruptData`] if the blob does not parse. In both cases the
    /// in-memory collection is left as it was.
    pub async fn load(&self) -> Result<Vec<Task>> {
        let key = &self.keys.collection;
        let mut tasks = self.tasks.lock().await;

        let blob = self.backend.get(key).await.map_err(|e| persistence(key, e))?;
        let loaded = match blob {
            None => {
                debug!(key = %key, "no stored tasks");
                Vec::new()
            }
            Some(blob) => {
                let parsed: Vec<Task> = serde_json::from_str(&blob).map_err(|source| {
                    warn!(key = %key, error = %source, "stored tasks are corrupt");
                    Error::CorruptData { key: key.clone(), source }
                })?;
                self.dedupe(parsed)
            }
        };

        for task in &loaded {
            self.ids.observe(&task.id);
        }
        self.observe_last_id().await;
        info!(count = loaded.len(), "loaded tasks");
        tasks.clone_from(&loaded);
        Ok(loaded)
    }

    async fn observe_last_id(&self) {
        let key = self.keys.last_id_key();
        match self.backend.get(&key).await {
            Ok(Some(last)) => self.ids.observe(last.trim()),
            Ok(None) => {}
            Err(e) => warn!(key = %key, error = %e, "could not read last issued id"),
        }
    }

    /// Record `id` as issued before it is persisted anywhere else.
    async fn reserve_id(&self, id: &str) {
        let key = self.keys.last_id_key();
        if let Err(e) = self.backend.set(&key, id).await {
            warn!(key = %key, error = %e, "could not record last issued id");
        }
    }

    fn dedupe(&self, parsed: Vec<Task>) -> Vec<Task> {
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(parsed.len());
        for task in parsed {
            if seen.insert(task.id.clone()) {
                kept.push(task);
            } else {
                warn!(key = %self.keys.collection, id = %task.id, "dropping duplicate task id");
            }
        }
        kept
    }

    /// Snapshot of the collection in insertion order.
    pub async fn tasks(&self) -> Vec<Task> {
        self.tasks.lock().await.clone()
    }

    /// Look up a task by id.
    pub async fn get(&self, id: &str) -> Option<Task> {
        self.tasks.lock().await.iter().find(|t| t.id == id).cloned()
    }

    /// Append a new task.
    ///
    /// Returns `Ok(None)` without touching anything if `title` is blank.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Persistence`] if the write fails. The task stays in
    /// the in-memory collection.
    pub async fn add(&self, title: &str) -> Result<Option<Task>> {
        let Some(title) = normalize_title(title) else {
            debug!("ignoring add with blank title");
            return Ok(None);
        };

        let mut tasks = self.tasks.lock().await;
        let mut id = self.ids.next_id();
        while tasks.iter().any(|t| t.id == id) {
            id = self.ids.next_id();
        }
        self.reserve_id(&id).await;
        let task = Task::new(id, title);
        tasks.push(task.clone());
        info!(id = %task.id, "added task");

        self.persist(&tasks).await?;
        Ok(Some(task))
    }

    /// Replace the title of an existing task.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Persistence`] if the write fails. The new title stays
    /// in the in-memory collection.
    pub async fn update_title(&self, id: &str, title: &str) -> Result<EditOutcome> {
        let Some(title) = normalize_title(title) else {
            debug!(id = %id, "ignoring title update with blank title");
            return Ok(EditOutcome::Ignored);
        };

        self.edit(id, |task| task.title = title.to_string()).await
    }

    /// Flip the completion flag of an existing task.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Persistence`] if the write fails. The flipped flag
    /// stays in the in-memory collection.
    pub async fn toggle_completed(&self, id: &str) -> Result<EditOutcome> {
        self.edit(id, |task| task.completed = !task.completed).await
    }

    async fn edit(&self, id: &str, apply: impl FnOnce(&mut Task)) -> Result<EditOutcome> {
        let mut tasks = self.tasks.lock().await;
        let Some(task) = tasks.iter_mut().find(|t| t.id == id) else {
            debug!(id = %id, "edit target not found");
            return Ok(EditOutcome::NotFound);
        };
        apply(task);
        let updated = task.clone();
        info!(id = %id, completed = updated.completed, "updated task");

        self.persist(&tasks).await?;
        Ok(EditOutcome::Applied(updated))
    }

    /// Remove a task. Returns whether a task was removed.
    ///
    /// Removing an unknown id is a no-op. The per-task key is cleared on a
    /// best-effort basis; failure there is only logged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Persistence`] if writing the remaining collection
    /// fails. The task stays removed from the in-memory collection.
    pub async fn remove(&self, id: &str) -> Result<bool> {
        let mut tasks = self.tasks.lock().await;
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        if tasks.len() == before {
            debug!(id = %id, "remove target not found");
            return Ok(false);
        }
        info!(id = %id, "removed task");

        let written = self.persist(&tasks).await;

        let task_key = self.keys.task_key(id);
        if let Err(e) = self.backend.remove(&task_key).await {
            warn!(key = %task_key, error = %e, "could not clear per-task key");
        }

        written.map(|()| true)
    }

    /// Replace the whole collection with a named dataset and persist it.
    ///
    /// Each dataset entry gets a fresh id, keeping its title and completed
    /// flag, so ids of deleted tasks never come back.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Persistence`] if the write fails.
    pub async fn reset_to(&self, dataset: &DefaultDataset) -> Result<Vec<Task>> {
        let mut tasks = self.tasks.lock().await;
        let replacement: Vec<Task> = dataset
            .tasks
            .iter()
            .map(|t| Task { id: self.ids.next_id(), ..t.clone() })
            .collect();
        if let Some(last) = replacement.last() {
            self.reserve_id(&last.id).await;
        }
        info!(dataset = %dataset.name, count = replacement.len(), "resetting tasks");
        tasks.clone_from(&replacement);

        self.persist(&tasks).await?;
        Ok(replacement)
    }

    async fn persist(&self, tasks: &[Task]) -> Result<()> {
        let key = &self.keys.collection;
        let blob = serde_json::to_string(tasks)?;
        self.backend.set(key, &blob).await.map_err(|e| {
            warn!(key = %key, error = %e, "failed to persist tasks");
            persistence(key, e)
        })?;
        debug!(key = %key, count = tasks.len(), "persisted tasks");
        Ok(())
    }
}

fn persistence(key: &str, source: Error) -> Error {
    Error::Persistence { key: key.to_string(), source: Box::new(source) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryKeyValueStore;

    fn create_test_store() -> TaskStore<MemoryKeyValueStore> {
        TaskStore::new(MemoryKeyValueStore::new()).with_id_generator(IdGenerator::sequential(1))
    }

    #[tokio::test]
    async fn test_load_absent_is_empty() {
        let store = create_test_store();
        let tasks = store.load().await.unwrap();
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn test_load_corrupt_is_error_and_keeps_state() {
        let store = create_test_store();
        store.add("Keep me").await.unwrap();
        store.backend().insert(DEFAULT_STORAGE_KEY, "{not json");

        let err = store.load().await.unwrap_err();
        assert!(err.is_corrupt_data());
        assert_eq!(store.tasks().await.len(), 1);
    }

    #[tokio::test]
    async fn test_load_read_failure_is_persistence_error() {
        let store = create_test_store();
        store.backend().fail_reads(true);
        let err = store.load().await.unwrap_err();
        assert!(matches!(err, Error::Persistence { .. }));
    }

    #[tokio::test]
    async fn test_load_drops_duplicate_ids() {
        let store = create_test_store();
        store.backend().insert(
            DEFAULT_STORAGE_KEY,
            r#"[{"id":"1","title":"first"},{"id":"1","title":"again"},{"id":"2","title":"third"}]"#,
        );
        let tasks = store.load().await.unwrap();
        let titles: Vec<&str> = tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "third"]);
    }

    #[tokio::test]
    async fn test_add_blank_titles_are_ignored() {
        let store = create_test_store();
        assert!(store.add("").await.unwrap().is_none());
        assert!(store.add("   ").await.unwrap().is_none());
        assert!(store.tasks().await.is_empty());
        assert_eq!(store.backend().write_count(), 0);
    }

    #[tokio::test]
    async fn test_add_appends_and_persists() {
        let store = create_test_store();
        let task = store.add("Buy milk").await.unwrap().unwrap();
        assert_eq!(task.title, "Buy milk");
        assert!(!task.completed);

        let tasks = store.tasks().await;
        assert_eq!(tasks, vec![task.clone()]);

        let blob = store.backend().value(DEFAULT_STORAGE_KEY).unwrap();
        let stored: Vec<Task> = serde_json::from_str(&blob).unwrap();
        assert_eq!(stored, vec![task]);
    }

    #[tokio::test]
    async fn test_add_trims_title() {
        let store = create_test_store();
        let task = store.add("  Walk dog  ").await.unwrap().unwrap();
        assert_eq!(task.title, "Walk dog");
    }

    #[tokio::test]
    async fn test_add_assigns_fresh_ids_in_insertion_order() {
        let store = create_test_store();
        let a = store.add("a").await.unwrap().unwrap();
        let b = store.add("b").await.unwrap().unwrap();
        let c = store.add("c").await.unwrap().unwrap();
        assert_ne!(a.id, b.id);
        assert_ne!(b.id, c.id);
        let order: Vec<String> = store.tasks().await.into_iter().map(|t| t.title).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_ids_not_reused_after_delete() {
        let store = create_test_store();
        store.add("a").await.unwrap();
        let b = store.add("b").await.unwrap().unwrap();
        store.remove(&b.id).await.unwrap();

        let c = store.add("c").await.unwrap().unwrap();
        assert_ne!(c.id, b.id);
    }

    #[tokio::test]
    async fn test_reload_moves_ids_past_stored_ones() {
        let store = create_test_store();
        store.backend().insert(DEFAULT_STORAGE_KEY, r#"[{"id":"40","title":"old"}]"#);
        store.load().await.unwrap();

        let task = store.add("new").await.unwrap().unwrap();
        assert_eq!(task.id, "41");
    }

    #[tokio::test]
    async fn test_update_title() {
        let store = create_test_store();
        let task = store.add("Old").await.unwrap().unwrap();

        let outcome = store.update_title(&task.id, "New").await.unwrap();
        let updated = outcome.into_task().unwrap();
        assert_eq!(updated.id, task.id);
        assert_eq!(updated.title, "New");
        assert_eq!(store.get(&task.id).await.unwrap().title, "New");
    }

    #[tokio::test]
    async fn test_update_title_blank_is_ignored() {
        let store = create_test_store();
        let task = store.add("Keep").await.unwrap().unwrap();
        let writes = store.backend().write_count();

        let outcome = store.update_title(&task.id, "  ").await.unwrap();
        assert_eq!(outcome, EditOutcome::Ignored);
        assert_eq!(store.get(&task.id).await.unwrap().title, "Keep");
        assert_eq!(store.backend().write_count(), writes);
    }

    #[tokio::test]
    async fn test_update_title_not_found() {
        let store = create_test_store();
        let outcome = store.update_title("missing", "Title").await.unwrap();
        assert_eq!(outcome, EditOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_toggle_twice_restores() {
        let store = create_test_store();
        let task = store.add("Flip").await.unwrap().unwrap();

        let once = store.toggle_completed(&task.id).await.unwrap().into_task().unwrap();
        assert!(once.completed);
        let twice = store.toggle_completed(&task.id).await.unwrap().into_task().unwrap();
        assert_eq!(twice.completed, task.completed);
    }

    #[tokio::test]
    async fn test_toggle_not_found() {
        let store = create_test_store();
        assert_eq!(store.toggle_completed("nope").await.unwrap(), EditOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let store = create_test_store();
        let task = store.add("Gone").await.unwrap().unwrap();

        assert!(store.remove(&task.id).await.unwrap());
        assert!(!store.remove(&task.id).await.unwrap());
        assert!(store.tasks().await.is_empty());
    }

    #[tokio::test]
    async fn test_remove_clears_per_task_key() {
        let store = create_test_store();
        let task = store.add("Gone").await.unwrap().unwrap();
        let task_key = store.keys().task_key(&task.id);
        store.backend().insert(&task_key, "extra");

        store.remove(&task.id).await.unwrap();
        assert!(store.backend().value(&task_key).is_none());
    }

    #[tokio::test]
    async fn test_remove_unknown_does_not_write() {
        let store = create_test_store();
        store.remove("unknown").await.unwrap();
        assert_eq!(store.backend().write_count(), 0);
    }

    #[tokio::test]
    async fn test_write_failure_reported_but_memory_keeps_change() {
        let store = create_test_store();
        store.backend().fail_writes(true);

        let err = store.add("Unsaved").await.unwrap_err();
        assert!(matches!(err, Error::Persistence { ref key, .. } if key == DEFAULT_STORAGE_KEY));
        assert_eq!(store.tasks().await.len(), 1);

        // Reloading brings back the persisted view.
        store.backend().fail_writes(false);
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_round_trip_across_restart() {
        let store = create_test_store();
        store.add("Buy milk").await.unwrap();
        let task = store.add("Pay rent").await.unwrap().unwrap();
        store.toggle_completed(&task.id).await.unwrap();

        let restarted = TaskStore::new(store.backend().clone());
        let tasks = restarted.load().await.unwrap();
        assert_eq!(tasks, store.tasks().await);
        assert!(tasks.iter().any(|t| t.title == "Pay rent" && t.completed));
    }

    #[tokio::test]
    async fn test_concurrent_adds_are_all_kept() {
        let store = std::sync::Arc::new(create_test_store());
        let mut handles = Vec::new();
        for i in 0..20 {
            let store = std::sync::Arc::clone(&store);
            handles.push(tokio::spawn(async move { store.add(&format!("task {i}")).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let restarted = TaskStore::new(store.backend().clone());
        assert_eq!(restarted.load().await.unwrap().len(), 20);
    }

    fn titles(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_reset_to_dataset() {
        let store = create_test_store();
        let old = store.add("old").await.unwrap().unwrap();

        let dataset = DefaultDataset::sample();
        let tasks = store.reset_to(&dataset).await.unwrap();
        assert_eq!(titles(&tasks), titles(&dataset.tasks));
        assert_eq!(store.tasks().await, tasks);
        assert!(tasks.iter().all(|t| t.id != old.id));

        let fresh = store.add("after reset").await.unwrap().unwrap();
        assert!(tasks.iter().all(|t| t.id != fresh.id));
    }

    #[tokio::test]
    async fn test_reset_keeps_completed_flag() {
        let store = create_test_store();
        let mut done = Task::new("1", "Done already");
        done.completed = true;
        let dataset = DefaultDataset::new("mixed", vec![done, Task::new("1", "Open")]);

        let tasks = store.reset_to(&dataset).await.unwrap();
        assert_eq!(tasks.len(), 2);
        assert!(tasks[0].completed);
        assert!(!tasks[1].completed);
        assert_ne!(tasks[0].id, tasks[1].id);
    }

    #[tokio::test]
    async fn test_reset_never_reuses_deleted_ids() {
        let store = create_test_store();
        let first = store.reset_to(&DefaultDataset::sample()).await.unwrap();
        let deleted = first[2].id.clone();
        store.remove(&deleted).await.unwrap();

        let second = store.reset_to(&DefaultDataset::sample()).await.unwrap();
        assert!(store.get(&deleted).await.is_none());
        assert!(second.iter().all(|t| first.iter().all(|f| f.id != t.id)));
    }

    #[tokio::test]
    async fn test_ids_not_reused_across_restart() {
        let device = MemoryKeyValueStore::new();
        let store = TaskStore::new(device.clone()).with_id_generator(IdGenerator::sequential(1));
        store.add("a").await.unwrap();
        let b = store.add("b").await.unwrap().unwrap();
        let c = store.add("c").await.unwrap().unwrap();
        store.remove(&c.id).await.unwrap();
        store.remove(&b.id).await.unwrap();
        drop(store);

        // A restarted process whose own counter starts low again.
        let restarted = TaskStore::new(device).with_id_generator(IdGenerator::sequential(1));
        restarted.load().await.unwrap();
        let d = restarted.add("d").await.unwrap().unwrap();
        assert_ne!(d.id, b.id);
        assert_ne!(d.id, c.id);
    }

    #[tokio::test]
    async fn test_custom_keys() {
        let keys = StoreKeys { collection: "todos".to_string(), task_prefix: "todo:".to_string() };
        let store = TaskStore::with_keys(MemoryKeyValueStore::new(), keys);
        store.add("x").await.unwrap();
        assert!(store.backend().value("todos").is_some());
        assert!(store.backend().value(DEFAULT_STORAGE_KEY).is_none());
        assert_eq!(store.keys().task_key("9"), "todo:9");
    }
}
