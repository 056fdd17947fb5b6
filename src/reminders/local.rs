//! In-process notification backend driven by tokio timers.
//!
//! Each scheduled notification gets its own timer task. When the timer
//! expires the notification is broadcast to subscribers; cancelling removes
//! it before it fires. Nothing survives a restart.

use crate::error::{Result, SchedulingError};
use crate::reminders::models::{DeliveredNotification, NotificationRequest, PermissionStatus};
use crate::traits::NotificationBackend;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const EVENT_CAPACITY: usize = 64;

type Pending = Arc<Mutex<HashMap<String, CancellationToken>>>;

fn lock(pending: &Pending) -> MutexGuard<'_, HashMap<String, CancellationToken>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A notification backend that fires within the current process.
#[derive(Debug)]
pub struct LocalNotificationCenter {
    permission: PermissionStatus,
    events: broadcast::Sender<DeliveredNotification>,
    pending: Pending,
    next_id: AtomicU64,
    root: CancellationToken,
}

impl Default for LocalNotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalNotificationCenter {
    /// Create a center that grants permission.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            permission: PermissionStatus::Granted,
            events,
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
            root: CancellationToken::new(),
        }
    }

    /// Answer permission requests with `permission`.
    #[must_use]
    pub const fn with_permission(mut self, permission: PermissionStatus) -> Self {
        self.permission = permission;
        self
    }

    /// Number of notifications waiting to fire.
    pub fn pending_count(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Drop every pending notification and refuse new ones.
    pub fn shutdown(&self) {
        self.root.cancel();
        lock(&self.pending).clear();
    }
}

impl Drop for LocalNotificationCenter {
    fn drop(&mut self) {
        self.root.cancel();
    }
}

#[async_trait]
impl NotificationBackend for LocalNotificationCenter {
    async fn request_permission(&self) -> Result<PermissionStatus> {
        Ok(self.permission)
    }

    async fn schedule(
        &self,
        request: NotificationRequest,
    ) -> std::result::Result<String, SchedulingError> {
        if !self.permission.is_granted() {
            return Err(SchedulingError::PermissionDenied);
        }
        if self.root.is_cancelled() {
            return Err(SchedulingError::Unavailable("notification center shut down".to_string()));
        }
        let now = Utc::now();
        let delay = match (request.fire_at - now).to_std() {
            Ok(delay) if !delay.is_zero() => delay,
            _ => return Err(SchedulingError::PastTrigger { fire_at: request.fire_at, now }),
        };

        let notification_id = format!("local-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        let token = self.root.child_token();
        lock(&self.pending).insert(notification_id.clone(), token.clone());

        let pending = Arc::clone(&self.pending);
        let events = self.events.clone();
        let id = notification_id.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = token.cancelled() => {}
                () = tokio::time::sleep(delay) => {
                    if lock(&pending).remove(&id).is_none() {
                        return;
                    }
                    let delivered = DeliveredNotification {
                        notification_id: id,
                        title: request.title,
                        body: request.body,
                        data: request.data,
                    };
                    info!(notification_id = %delivered.notification_id, "notification fired");
                    if events.send(delivered).is_err() {
                        debug!("notification fired with no listeners");
                    }
                }
            }
        });

        debug!(%notification_id, ?delay, "notification pending");
        Ok(notification_id)
    }

    async fn cancel(&self, notification_id: &str) -> std::result::Result<bool, SchedulingError> {
        match lock(&self.pending).remove(notification_id) {
            Some(token) => {
                token.cancel();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<DeliveredNotification> {
        self.events.subscribe()
    }
}
