//! Task reminders.
//!
//! A [`ReminderScheduler`] turns a task into a one-shot notification that
//! carries the task id, and hands the id back when the notification fires.
//! Delivery goes through a [`NotificationBackend`](crate::traits::NotificationBackend);
//! [`LocalNotificationCenter`] is the in-process implementation.

pub mod local;
pub mod models;
pub mod scheduler;

pub use local::LocalNotificationCenter;
pub use models::{
    DeliveredNotification, NotificationPresentation, NotificationRequest, PermissionStatus,
    ReminderHandle, DEFAULT_REMINDER_TITLE, TASK_ID_FIELD,
};
pub use scheduler::{FiredSubscription, ReminderConfig, ReminderScheduler};
