//! Trailing-edge debouncing of a string input.
//!
//! A [`Debouncer`] owns a background tokio task. Each call to
//! [`Debouncer::input`] replaces the visible value immediately and restarts
//! the quiet period; once the value has been left alone for the whole quiet
//! period the settle callback runs once with the latest value. Values that
//! were overwritten during the quiet period are never delivered.
//!
//! The background task is cancelled when the debouncer is shut down or
//! dropped, after which the callback never runs again.

use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Debounces string input and reports each settled value once.
#[derive(Debug)]
pub struct Debouncer {
    input: watch::Sender<String>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
    quiet: Duration,
}

impl Debouncer {
    /// Start a debouncer that calls `on_settled` after `quiet` of inactivity.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<F>(quiet: Duration, on_settled: F) -> Self
    where
        F: FnMut(String) + Send + 'static,
    {
        let (input, rx) = watch::channel(String::new());
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(rx, quiet, cancel.clone(), on_settled));
        Self { input, cancel, handle: Some(handle), quiet }
    }

    /// Replace the current value and restart the quiet period.
    pub fn input(&self, value: impl Into<String>) {
        self.input.send_replace(value.into());
    }

    /// The value most recently passed to [`input`](Self::input).
    pub fn current(&self) -> String {
        self.input.borrow().clone()
    }

    /// The configured quiet period.
    pub const fn quiet_period(&self) -> Duration {
        self.quiet
    }

    /// Whether the background task has been cancelled.
    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cancel any pending settle and wait for the background task to exit.
    pub async fn shutdown(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run<F>(
    mut rx: watch::Receiver<String>,
    quiet: Duration,
    cancel: CancellationToken,
    mut on_settled: F,
) where
    F: FnMut(String),
{
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            changed = rx.changed() => {
                if changed.is_err() {
                    return;
                }
            }
        }

        // Wait out the quiet period, starting over on every new value.
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                changed = rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    trace!("debounce restarted");
                }
                () = tokio::time::sleep(quiet) => break,
            }
        }

        if cancel.is_cancelled() {
            return;
        }
        let settled = rx.borrow_and_update().clone();
        on_settled(settled);
    }
}
