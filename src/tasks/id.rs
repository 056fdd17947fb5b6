//! Task ID generation.
//!
//! Task IDs are decimal millisecond timestamps. The generator never hands out
//! the same value twice: if the clock has not moved past the last issued id,
//! the next id is the last one plus one. IDs seen while loading a stored
//! collection are fed back through [`IdGenerator::observe`] so a new id is
//! always greater than any id that has existed in the store.

use std::sync::atomic::{AtomicU64, Ordering};

/// Source of fresh, strictly increasing task IDs.
#[derive(Debug)]
pub struct IdGenerator {
    last: AtomicU64,
    use_clock: bool,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator {
    /// Create a generator driven by the system clock.
    #[must_use]
    pub const fn new() -> Self {
        Self { last: AtomicU64::new(0), use_clock: true }
    }

    /// Create a generator that ignores the clock and counts up from `start`.
    ///
    /// Used in tests for predictable IDs.
    #[must_use]
    pub const fn sequential(start: u64) -> Self {
        Self { last: AtomicU64::new(start.saturating_sub(1)), use_clock: false }
    }

    /// Issue the next id.
    pub fn next_id(&self) -> String {
        let now = if self.use_clock { now_millis() } else { 0 };
        let previous = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last.saturating_add(1)))
            })
            .unwrap_or_else(|last| last);
        now.max(previous.saturating_add(1)).to_string()
    }

    /// Record an existing id so future ids sort after it.
    ///
    /// Non-numeric ids are ignored.
    pub fn observe(&self, id: &str) {
        if let Ok(value) = id.parse::<u64>() {
            self.last.fetch_max(value, Ordering::SeqCst);
        }
    }
}

#[allow(clippy::cast_sign_loss)]
fn now_millis() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}
