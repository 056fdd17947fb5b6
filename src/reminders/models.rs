//! Reminder and notification types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Payload field carrying the task id.
pub const TASK_ID_FIELD: &str = "id";

/// Default notification title for task reminders.
pub const DEFAULT_REMINDER_TITLE: &str = "Task Reminder";

/// Outcome of a notification permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    /// Notifications may be shown.
    Granted,
    /// The user declined, or the platform refused.
    Denied,
}

impl PermissionStatus {
    /// Whether permission was granted.
    #[must_use]
    pub const fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// How a delivered notification is presented while the app is running.
///
/// Passed explicitly when the scheduler is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPresentation {
    /// Show a banner/alert.
    #[serde(default = "default_true")]
    pub show_alert: bool,
    /// Play a sound.
    #[serde(default = "default_true")]
    pub play_sound: bool,
    /// Update the app badge.
    #[serde(default = "default_true")]
    pub set_badge: bool,
}

const fn default_true() -> bool {
    true
}

impl Default for NotificationPresentation {
    fn default() -> Self {
        Self { show_alert: true, play_sound: true, set_badge: true }
    }
}

/// A one-shot notification submitted to the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRequest {
    /// Notification title.
    pub title: String,
    /// Notification body.
    pub body: String,
    /// Opaque correlation data returned with the delivered notification.
    pub data: serde_json::Value,
    /// When to fire.
    pub fire_at: DateTime<Utc>,
    /// How to present it.
    pub presentation: NotificationPresentation,
}

impl NotificationRequest {
    /// Build the reminder request for a task.
    #[must_use]
    pub fn for_task(
        title: &str,
        task_id: &str,
        task_title: &str,
        fire_at: DateTime<Utc>,
        presentation: NotificationPresentation,
    ) -> Self {
        let mut data = serde_json::Map::new();
        data.insert(TASK_ID_FIELD.to_string(), serde_json::Value::from(task_id));
        Self {
            title: title.to_string(),
            body: task_title.to_string(),
            data: serde_json::Value::Object(data),
            fire_at,
            presentation,
        }
    }
}

/// A notification the platform delivered, or the user tapped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveredNotification {
    /// Platform identifier of the notification.
    pub notification_id: String,
    /// Notification title.
    pub title: String,
    /// Notification body.
    pub body: String,
    /// The correlation data from the request.
    pub data: serde_json::Value,
}

impl DeliveredNotification {
    /// Extract the task id from the correlation data.
    #[must_use]
    pub fn task_id(&self) -> Option<&str> {
        self.data.get(TASK_ID_FIELD).and_then(serde_json::Value::as_str)
    }
}

/// Handle to a scheduled reminder, used to cancel it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReminderHandle {
    /// Platform identifier of the notification.
    pub notification_id: String,
    /// The task the reminder is for.
    pub task_id: String,
    /// When it fires.
    pub fire_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_for_task_embeds_id() {
        let fire_at = Utc::now();
        let request = NotificationRequest::for_task(
            DEFAULT_REMINDER_TITLE,
            "123",
            "Pay rent",
            fire_at,
            NotificationPresentation::default(),
        );
        assert_eq!(request.title, "Task Reminder");
        assert_eq!(request.body, "Pay rent");
        assert_eq!(request.data, serde_json::json!({"id": "123"}));
    }

    #[test]
    fn test_delivered_task_id() {
        let delivered = DeliveredNotification {
            notification_id: "n1".to_string(),
            title: String::new(),
            body: String::new(),
            data: serde_json::json!({"id": "42"}),
        };
        assert_eq!(delivered.task_id(), Some("42"));
    }

    #[test]
    fn test_delivered_without_task_id() {
        let delivered = DeliveredNotification {
            notification_id: "n1".to_string(),
            title: String::new(),
            body: String::new(),
            data: serde_json::json!({"id": 42}),
        };
        assert_eq!(delivered.task_id(), None);
    }

    #[test]
    fn test_presentation_defaults_missing_fields() {
        let parsed: NotificationPresentation =
            serde_json::from_str(r#"{"play_sound": false}"#).unwrap();
        assert!(parsed.show_alert);
        assert!(!parsed.play_sound);
        assert!(parsed.set_badge);
    }

    #[test]
    fn test_permission_status() {
        assert!(PermissionStatus::Granted.is_granted());
        assert!(!PermissionStatus::Denied.is_granted());
    }
}
