//! Error types for `todo_reminders`.

use chrono::{DateTime, Utc};

/// Errors that can occur in the task store, its backends, or configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON serialization error occurred.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A YAML parsing error occurred.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A `SQLite` database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The key-value backend failed in a way that has no more specific variant.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Writing or reading the persisted collection failed.
    ///
    /// The in-memory collection is not rolled back; callers that need the
    /// persisted view should `load()` again.
    #[error("Persistence failure for key '{key}': {source}")]
    Persistence {
        /// The storage key involved.
        key: String,
        /// The underlying backend error.
        #[source]
        source: Box<Error>,
    },

    /// A stored blob exists but cannot be parsed.
    #[error("Corrupt data under key '{key}': {source}")]
    CorruptData {
        /// The storage key holding the blob.
        key: String,
        /// The parse error.
        #[source]
        source: serde_json::Error,
    },

    /// Scheduling a reminder failed.
    #[error(transparent)]
    Scheduling(#[from] SchedulingError),
}

impl Error {
    /// Whether this error means stored data exists but could not be parsed.
    #[must_use]
    pub const fn is_corrupt_data(&self) -> bool {
        matches!(self, Self::CorruptData { .. })
    }
}

/// Reasons a reminder could not be scheduled or cancelled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulingError {
    /// The requested fire time is not in the future.
    #[error("Cannot schedule a reminder for {fire_at} (now is {now})")]
    PastTrigger {
        /// The requested fire time.
        fire_at: DateTime<Utc>,
        /// The time the request was checked.
        now: DateTime<Utc>,
    },

    /// Notification permission has not been granted.
    #[error("Notification permission denied")]
    PermissionDenied,

    /// The notification backend rejected the request.
    #[error("Notification backend rejected the reminder: {0}")]
    Rejected(String),

    /// The notification backend is shut down or otherwise unreachable.
    #[error("Notification backend unavailable: {0}")]
    Unavailable(String),
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persistence_error_keeps_key_and_source() {
        let err = Error::Persistence {
            key: "@tasks".to_string(),
            source: Box::new(Error::Storage("disk full".to_string())),
        };
        let msg = err.to_string();
        assert!(msg.contains("@tasks"));
        assert!(msg.contains("disk full"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_corrupt_data_is_distinguished() {
        let parse_err = serde_json::from_str::<Vec<u8>>("not json").unwrap_err();
        let err = Error::CorruptData { key: "@tasks".to_string(), source: parse_err };
        assert!(err.is_corrupt_data());
        assert!(!Error::Storage("x".to_string()).is_corrupt_data());
    }

    #[test]
    fn test_scheduling_error_converts() {
        let err: Error = SchedulingError::PermissionDenied.into();
        assert_eq!(err.to_string(), "Notification permission denied");
    }
}
