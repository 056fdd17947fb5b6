//! Core traits for the external collaborators.
//!
//! The task store and reminder scheduler only talk to the outside world
//! through these traits. Production implementations live in
//! [`crate::storage`] and [`crate::reminders::local`]; tests use the mocks in
//! [`crate::testing`].

use crate::error::{Result, SchedulingError};
use crate::reminders::models::{DeliveredNotification, NotificationRequest, PermissionStatus};
use async_trait::async_trait;
use tokio::sync::broadcast;

/// Trait for an asynchronous string key-value store.
///
/// This is the persistence backend for the task store. Values are opaque
/// strings; the store decides how to serialize into them.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails (for example, storage is full).
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Trait for a platform notification service.
#[async_trait]
pub trait NotificationBackend: Send + Sync {
    /// Ask the user for permission to show notifications.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform could not be asked at all.
    async fn request_permission(&self) -> Result<PermissionStatus>;

    /// Submit a one-shot notification. Returns the platform's identifier for it.
    ///
    /// # Errors
    ///
    /// Returns a [`SchedulingError`] if the platform refuses the request.
    async fn schedule(
        &self,
        request: NotificationRequest,
    ) -> std::result::Result<String, SchedulingError>;

    /// Cancel a pending notification. Returns `false` if it was not pending.
    ///
    /// # Errors
    ///
    /// Returns a [`SchedulingError`] if the platform cannot be reached.
    async fn cancel(&self, notification_id: &str) -> std::result::Result<bool, SchedulingError>;

    /// Subscribe to delivered or tapped notifications.
    fn subscribe(&self) -> broadcast::Receiver<DeliveredNotification>;
}

/// Trait for the navigation collaborator.
pub trait Navigator: Send + Sync {
    /// Present the detail view for the task with the given id.
    fn open_task(&self, task_id: &str);
}
