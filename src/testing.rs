//! Testing utilities and mock implementations.
//!
//! These types are provided for use in tests. They may appear unused in
//! the library itself but are consumed by unit and integration tests.

#![allow(dead_code)]

use crate::error::{Error, Result, SchedulingError};
use crate::reminders::models::{DeliveredNotification, NotificationRequest, PermissionStatus};
use crate::traits::{KeyValueStore, Navigator, NotificationBackend};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{broadcast, Notify};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
struct MemoryInner {
    values: Mutex<HashMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

/// An in-memory key-value store with failure injection.
///
/// Clones share the same underlying map, so a clone can stand in for the
/// same device storage after a simulated restart.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    inner: Arc<MemoryInner>,
}

impl MemoryKeyValueStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value directly, bypassing failure injection and the write count.
    pub fn insert(&self, key: &str, value: &str) {
        lock(&self.inner.values).insert(key.to_string(), value.to_string());
    }

    /// Read a value directly.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<String> {
        lock(&self.inner.values).get(key).cloned()
    }

    /// Make every `get` fail.
    pub fn fail_reads(&self, fail: bool) {
        self.inner.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every `set` and `remove` fail.
    pub fn fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful `set` calls.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        if self.inner.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::Storage(format!("injected read failure for '{key}'")));
        }
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Storage(format!("injected write failure for '{key}'")));
        }
        self.insert(key, value);
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Storage(format!("injected write failure for '{key}'")));
        }
        lock(&self.inner.values).remove(key);
        Ok(())
    }
}

/// A notification backend that records requests and fires on demand.
#[derive(Debug)]
pub struct MockNotificationBackend {
    permission: Mutex<PermissionStatus>,
    fail_permission: AtomicBool,
    permission_requests: AtomicUsize,
    rejection: Mutex<Option<SchedulingError>>,
    attempts: AtomicUsize,
    scheduled: Mutex<Vec<(String, NotificationRequest)>>,
    cancelled: Mutex<Vec<String>>,
    events: broadcast::Sender<DeliveredNotification>,
    next_id: AtomicUsize,
}

impl Default for MockNotificationBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockNotificationBackend {
    /// Create a backend that grants permission.
    #[must_use]
    pub fn new() -> Self {
        Self::with_permission(PermissionStatus::Granted)
    }

    /// Create a backend that answers permission requests with `permission`.
    #[must_use]
    pub fn with_permission(permission: PermissionStatus) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            permission: Mutex::new(permission),
            fail_permission: AtomicBool::new(false),
            permission_requests: AtomicUsize::new(0),
            rejection: Mutex::new(None),
            attempts: AtomicUsize::new(0),
            scheduled: Mutex::new(Vec::new()),
            cancelled: Mutex::new(Vec::new()),
            events,
            next_id: AtomicUsize::new(1),
        }
    }

    /// Change the permission answer.
    pub fn set_permission(&self, permission: PermissionStatus) {
        *lock(&self.permission) = permission;
    }

    /// Make permission requests fail.
    pub fn fail_permission_requests(&self, fail: bool) {
        self.fail_permission.store(fail, Ordering::SeqCst);
    }

    /// Number of permission requests received.
    #[must_use]
    pub fn permission_requests(&self) -> usize {
        self.permission_requests.load(Ordering::SeqCst)
    }

    /// Reject every following `schedule` call with `error`.
    pub fn reject_with(&self, error: SchedulingError) {
        *lock(&self.rejection) = Some(error);
    }

    /// Number of `schedule` calls, accepted or not.
    #[must_use]
    pub fn schedule_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Accepted requests, in order.
    #[must_use]
    pub fn scheduled(&self) -> Vec<NotificationRequest> {
        lock(&self.scheduled).iter().map(|(_, r)| r.clone()).collect()
    }

    /// Notification ids cancelled so far.
    #[must_use]
    pub fn cancelled(&self) -> Vec<String> {
        lock(&self.cancelled).clone()
    }

    /// Deliver a notification carrying `data`.
    pub fn fire(&self, data: serde_json::Value) {
        let _ = self.events.send(DeliveredNotification {
            notification_id: format!("mock-fired-{}", self.next_id.fetch_add(1, Ordering::SeqCst)),
            title: String::new(),
            body: String::new(),
            data,
        });
    }

    /// Deliver a notification for `task_id`.
    pub fn fire_for_task(&self, task_id: &str) {
        self.fire(serde_json::json!({ "id": task_id }));
    }
}

#[async_trait]
impl NotificationBackend for MockNotificationBackend {
    async fn request_permission(&self) -> Result<PermissionStatus> {
        self.permission_requests.fetch_add(1, Ordering::SeqCst);
        if self.fail_permission.load(Ordering::SeqCst) {
            return Err(Error::Storage("injected permission failure".to_string()));
        }
        Ok(*lock(&self.permission))
    }

    async fn schedule(
        &self,
        request: NotificationRequest,
    ) -> std::result::Result<String, SchedulingError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = lock(&self.rejection).clone() {
            return Err(error);
        }
        if !lock(&self.permission).is_granted() {
            return Err(SchedulingError::PermissionDenied);
        }
        let id = format!("mock-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        lock(&self.scheduled).push((id.clone(), request));
        Ok(id)
    }

    async fn cancel(&self, notification_id: &str) -> std::result::Result<bool, SchedulingError> {
        let mut scheduled = lock(&self.scheduled);
        let before = scheduled.len();
        scheduled.retain(|(id, _)| id != notification_id);
        let removed = scheduled.len() != before;
        if removed {
            lock(&self.cancelled).push(notification_id.to_string());
        }
        Ok(removed)
    }

    fn subscribe(&self) -> broadcast::Receiver<DeliveredNotification> {
        self.events.subscribe()
    }
}

/// A navigator that records every task it was asked to open.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    opened: Mutex<Vec<String>>,
    notify: Notify,
}

impl RecordingNavigator {
    /// Create a navigator with no history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Task ids opened so far.
    #[must_use]
    pub fn opened(&self) -> Vec<String> {
        lock(&self.opened).clone()
    }

    /// Wait up to two seconds for the first opened task id.
    pub async fn wait_for_open(&self) -> Option<String> {
        let wait = async {
            loop {
                let notified = self.notify.notified();
                if let Some(first) = lock(&self.opened).first().cloned() {
                    return first;
                }
                notified.await;
            }
        };
        tokio::time::timeout(Duration::from_secs(2), wait).await.ok()
    }
}

impl Navigator for RecordingNavigator {
    fn open_task(&self, task_id: &str) {
        lock(&self.opened).push(task_id.to_string());
        self.notify.notify_waiters();
    }
}
