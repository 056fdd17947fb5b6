//! The reminder scheduler.

use crate::error::SchedulingError;
use crate::reminders::models::{
    DeliveredNotification, NotificationPresentation, NotificationRequest, PermissionStatus,
    ReminderHandle, DEFAULT_REMINDER_TITLE,
};
use crate::tasks::Task;
use crate::traits::{Navigator, NotificationBackend};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Settings the scheduler is built with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderConfig {
    /// Notification title; the body is the task title.
    pub title: String,
    /// How notifications are presented.
    pub presentation: NotificationPresentation,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_REMINDER_TITLE.to_string(),
            presentation: NotificationPresentation::default(),
        }
    }
}

/// Turns tasks into platform notifications and routes fired ones back.
///
/// The scheduler keeps no durable state. It caches the permission answer for
/// the life of the process and owns at most one fired-notification listener.
pub struct ReminderScheduler<B> {
    backend: Arc<B>,
    config: ReminderConfig,
    permission: tokio::sync::Mutex<Option<PermissionStatus>>,
    listener: Mutex<Option<CancellationToken>>,
}

impl<B> std::fmt::Debug for ReminderScheduler<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReminderScheduler").field("config", &self.config).finish_non_exhaustive()
    }
}

impl<B: NotificationBackend + 'static> ReminderScheduler<B> {
    /// Create a scheduler over `backend`.
    pub fn new(backend: Arc<B>, config: ReminderConfig) -> Self {
        Self {
            backend,
            config,
            permission: tokio::sync::Mutex::new(None),
            listener: Mutex::new(None),
        }
    }

    /// The notification backend.
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// The configuration the scheduler was built with.
    pub const fn config(&self) -> &ReminderConfig {
        &self.config
    }

    /// Ask for notification permission, once per scheduler.
    ///
    /// Later calls return the first answer. A backend failure counts as
    /// [`PermissionStatus::Denied`]. Denial does not block scheduling.
    pub async fn request_permission(&self) -> PermissionStatus {
        let mut cached = self.permission.lock().await;
        if let Some(status) = *cached {
            return status;
        }
        let status = self.ask_backend().await;
        *cached = Some(status);
        status
    }

    /// Ask for permission again, replacing the cached answer.
    pub async fn refresh_permission(&self) -> PermissionStatus {
        let mut cached = self.permission.lock().await;
        let status = self.ask_backend().await;
        *cached = Some(status);
        status
    }

    /// The cached permission answer, if permission has been requested.
    pub async fn permission(&self) -> Option<PermissionStatus> {
        *self.permission.lock().await
    }

    async fn ask_backend(&self) -> PermissionStatus {
        match self.backend.request_permission().await {
            Ok(status) => {
                if status.is_granted() {
                    info!("notification permission granted");
                } else {
                    warn!("notification permission denied; reminders may not be delivered");
                }
                status
            }
            Err(e) => {
                warn!(error = %e, "notification permission request failed");
                PermissionStatus::Denied
            }
        }
    }

    /// Schedule a one-shot reminder for `task` at `fire_at`.
    ///
    /// Scheduling the same task twice produces two independent reminders.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError::PastTrigger`] if `fire_at` is not in the
    /// future, or whatever error the backend reports.
    pub async fn schedule(
        &self,
        task: &Task,
        fire_at: DateTime<Utc>,
    ) -> Result<ReminderHandle, SchedulingError> {
        let now = Utc::now();
        if fire_at <= now {
            warn!(task_id = %task.id, %fire_at, "refusing to schedule reminder in the past");
            return Err(SchedulingError::PastTrigger { fire_at, now });
        }

        let request = NotificationRequest::for_task(
            &self.config.title,
            &task.id,
            &task.title,
            fire_at,
            self.config.presentation,
        );
        let notification_id = self.backend.schedule(request).await.map_err(|e| {
            warn!(task_id = %task.id, error = %e, "could not schedule reminder");
            e
        })?;
        info!(task_id = %task.id, %notification_id, %fire_at, "scheduled reminder");

        Ok(ReminderHandle { notification_id, task_id: task.id.clone(), fire_at })
    }

    /// Cancel a reminder. Returns `false` if it had already fired or was
    /// cancelled before.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached.
    pub async fn cancel(&self, handle: &ReminderHandle) -> Result<bool, SchedulingError> {
        let cancelled = self.backend.cancel(&handle.notification_id).await?;
        debug!(notification_id = %handle.notification_id, cancelled, "cancel reminder");
        Ok(cancelled)
    }

    /// Register the handler for fired notifications.
    ///
    /// The handler receives the task id carried by each delivered
    /// notification. Only one listener is active per scheduler: registering
    /// a new one releases the previous one. The listener stops when the
    /// returned subscription is dropped or unsubscribed.
    ///
    /// Must be called from within a tokio runtime.
    pub fn on_fired<F>(&self, handler: F) -> FiredSubscription
    where
        F: FnMut(String) + Send + 'static,
    {
        let events = self.backend.subscribe();
        let token = CancellationToken::new();

        let previous = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(token.clone());
        if let Some(previous) = previous {
            if !previous.is_cancelled() {
                warn!("replacing an active fired-notification listener");
                previous.cancel();
            }
        }

        let handle = tokio::spawn(listen(events, token.clone(), handler));
        debug!("fired-notification listener registered");
        FiredSubscription { token, handle: Some(handle) }
    }

    /// Send the task id of every fired notification to `navigator`.
    pub fn route_to(&self, navigator: Arc<dyn Navigator>) -> FiredSubscription {
        self.on_fired(move |task_id| navigator.open_task(&task_id))
    }

    /// Whether a fired-notification listener is currently registered.
    pub fn has_listener(&self) -> bool {
        self.listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|token| !token.is_cancelled())
    }
}

async fn listen<F>(
    mut events: broadcast::Receiver<DeliveredNotification>,
    token: CancellationToken,
    mut handler: F,
) where
    F: FnMut(String),
{
    loop {
        tokio::select! {
            biased;
            () = token.cancelled() => break,
            event = events.recv() => match event {
                Ok(notification) => match notification.task_id() {
                    Some(task_id) => {
                        debug!(%task_id, "reminder fired");
                        handler(task_id.to_string());
                    }
                    None => warn!(
                        notification_id = %notification.notification_id,
                        "fired notification carries no task id"
                    ),
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "fired-notification listener fell behind");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }
    debug!("fired-notification listener stopped");
}

/// An active fired-notification listener.
///
/// Dropping it stops the listener.
#[derive(Debug)]
pub struct FiredSubscription {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl FiredSubscription {
    /// Whether the listener is still running.
    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled() && self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the listener and wait for it to exit.
    pub async fn unsubscribe(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for FiredSubscription {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
