//! Title search and the debounced search view.

use crate::debounce::Debouncer;
use crate::tasks::models::Task;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

/// Default quiet period before a typed query is applied.
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Filter tasks whose title contains `query`, ignoring case.
///
/// An empty query returns every task unchanged, in order.
#[must_use]
pub fn search(query: &str, tasks: &[Task]) -> Vec<Task> {
    if query.is_empty() {
        return tasks.to_vec();
    }
    let needle = query.to_lowercase();
    tasks.iter().filter(|t| t.title.to_lowercase().contains(&needle)).cloned().collect()
}

#[derive(Debug, Default)]
struct ViewState {
    tasks: Vec<Task>,
    settled_query: String,
    recomputations: usize,
}

impl ViewState {
    fn filtered(&self) -> Vec<Task> {
        search(&self.settled_query, &self.tasks)
    }
}

fn lock(state: &Mutex<ViewState>) -> MutexGuard<'_, ViewState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A filtered view over a task snapshot, driven by a debounced query.
///
/// The visible query ([`query`](Self::query)) changes on every keystroke; the
/// results only change once the query has settled. Dropping the view (or
/// calling [`shutdown`](Self::shutdown)) cancels any pending recomputation.
#[derive(Debug)]
pub struct SearchView {
    state: Arc<Mutex<ViewState>>,
    results: Arc<watch::Sender<Vec<Task>>>,
    debouncer: Debouncer,
}

impl SearchView {
    /// Create a view over `tasks` with the default quiet period.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(tasks: Vec<Task>) -> Self {
        Self::with_quiet_period(tasks, DEFAULT_SEARCH_DEBOUNCE)
    }

    /// Create a view with a custom quiet period.
    pub fn with_quiet_period(tasks: Vec<Task>, quiet: Duration) -> Self {
        let (results, _) = watch::channel(tasks.clone());
        let results = Arc::new(results);
        let state = Arc::new(Mutex::new(ViewState { tasks, ..ViewState::default() }));

        let settle_state = Arc::clone(&state);
        let settle_results = Arc::clone(&results);
        let debouncer = Debouncer::spawn(quiet, move |query| {
            let mut state = lock(&settle_state);
            state.settled_query = query;
            state.recomputations += 1;
            let filtered = state.filtered();
            debug!(query = %state.settled_query, matches = filtered.len(), "search settled");
            settle_results.send_replace(filtered);
        });

        Self { state, results, debouncer }
    }

    /// Update the visible query. The results follow after the quiet period.
    pub fn set_query(&self, query: impl Into<String>) {
        self.debouncer.input(query);
    }

    /// The query as typed so far.
    pub fn query(&self) -> String {
        self.debouncer.current()
    }

    /// The query the current results were computed from.
    pub fn settled_query(&self) -> String {
        lock(&self.state).settled_query.clone()
    }

    /// The current filtered results.
    pub fn results(&self) -> Vec<Task> {
        self.results.borrow().clone()
    }

    /// Replace the underlying tasks and refilter with the settled query.
    pub fn set_tasks(&self, tasks: Vec<Task>) {
        let mut state = lock(&self.state);
        state.tasks = tasks;
        self.results.send_replace(state.filtered());
    }

    /// How many times a settled query has recomputed the results.
    pub fn recomputations(&self) -> usize {
        lock(&self.state).recomputations
    }

    /// Watch the results for changes.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Task>> {
        self.results.subscribe()
    }

    /// Cancel pending recomputation and stop the debounce task.
    pub async fn shutdown(&mut self) {
        self.debouncer.shutdown().await;
    }
}
