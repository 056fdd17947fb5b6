//! Configuration management for todo-reminders.
//!
//! This module handles the `config.yaml` file in the data directory. Every
//! field is optional in the file; missing fields take their defaults.

use crate::error::Result;
use crate::paths;
use crate::reminders::{NotificationPresentation, ReminderConfig, DEFAULT_REMINDER_TITLE};
use crate::tasks::{StoreKeys, DEFAULT_STORAGE_KEY, DEFAULT_TASK_KEY_PREFIX};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Key the task collection is stored under.
    pub storage_key: String,

    /// Prefix for per-task keys.
    pub task_key_prefix: String,

    /// Search debounce quiet period in milliseconds.
    pub search_debounce_ms: u64,

    /// Title shown on reminder notifications.
    pub reminder_title: String,

    /// How reminder notifications are presented.
    pub notifications: NotificationPresentation,

    /// Database file override. None means `<data dir>/todo-reminders.sqlite3`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,

    /// Default log filter directive, e.g. `info` or `todo_reminders=debug`.
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            task_key_prefix: DEFAULT_TASK_KEY_PREFIX.to_string(),
            search_debounce_ms: 500,
            reminder_title: DEFAULT_REMINDER_TITLE.to_string(),
            notifications: NotificationPresentation::default(),
            database_path: None,
            log_filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load config from `data_dir`, returning None if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load_from(data_dir: &Path) -> Result<Option<Self>> {
        let config_path = paths::config_path(data_dir);
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(Some(config))
    }

    /// Load config from `data_dir`, falling back to defaults if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load_or_default(data_dir: &Path) -> Result<Self> {
        Ok(Self::load_from(data_dir)?.unwrap_or_default())
    }

    /// Save config to `data_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_to(&self, data_dir: &Path) -> Result<()> {
        let config_path = paths::config_path(data_dir);
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    /// Storage keys for the task store.
    #[must_use]
    pub fn store_keys(&self) -> StoreKeys {
        StoreKeys {
            collection: self.storage_key.clone(),
            task_prefix: self.task_key_prefix.clone(),
        }
    }

    /// Search debounce quiet period.
    #[must_use]
    pub const fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    /// Settings for the reminder scheduler.
    #[must_use]
    pub fn reminder_config(&self) -> ReminderConfig {
        ReminderConfig { title: self.reminder_title.clone(), presentation: self.notifications }
    }

    /// The database file, honoring the override.
    #[must_use]
    pub fn database_path(&self, data_dir: &Path) -> PathBuf {
        self.database_path.clone().unwrap_or_else(|| paths::db_path(data_dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.storage_key, "@tasks");
        assert_eq!(config.task_key_prefix, "@task_");
        assert_eq!(config.search_debounce(), Duration::from_millis(500));
        assert_eq!(config.reminder_title, "Task Reminder");
        assert!(config.notifications.show_alert);
        assert!(config.database_path.is_none());
    }

    #[test]
    fn test_app_config_load_not_found() {
        let dir = TempDir::new().unwrap();
        assert!(AppConfig::load_from(dir.path()).unwrap().is_none());
        assert_eq!(AppConfig::load_or_default(dir.path()).unwrap(), AppConfig::default());
    }

    #[test]
    fn test_app_config_save_and_load() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig {
            storage_key: "todos".to_string(),
            search_debounce_ms: 250,
            database_path: Some(dir.path().join("custom.sqlite3")),
            ..AppConfig::default()
        };

        config.save_to(dir.path()).unwrap();
        let loaded = AppConfig::load_from(dir.path()).unwrap().unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_app_config_partial_yaml() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            paths::config_path(dir.path()),
            "reminder_title: Heads up\nnotifications:\n  play_sound: false\n",
        )
        .unwrap();

        let loaded = AppConfig::load_from(dir.path()).unwrap().unwrap();
        assert_eq!(loaded.reminder_title, "Heads up");
        assert!(!loaded.notifications.play_sound);
        assert!(loaded.notifications.set_badge);
        assert_eq!(loaded.storage_key, "@tasks");
    }

    #[test]
    fn test_app_config_invalid_yaml() {
        let dir = TempDir::new().unwrap();
        std::fs::write(paths::config_path(dir.path()), "search_debounce_ms: [oops").unwrap();
        assert!(AppConfig::load_from(dir.path()).is_err());
    }

    #[test]
    fn test_derived_settings() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig { task_key_prefix: "t:".to_string(), ..AppConfig::default() };
        assert_eq!(config.store_keys().task_key("7"), "t:7");
        assert_eq!(config.reminder_config().title, "Task Reminder");
        assert_eq!(config.database_path(dir.path()), paths::db_path(dir.path()));
    }
}
