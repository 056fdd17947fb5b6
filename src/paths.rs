//! Path utilities for determining data storage locations.
//!
//! Data lives in the platform data directory, under `todo-reminders/`
//! (for example `~/.local/share/todo-reminders/` on Linux).

use std::path::{Path, PathBuf};

/// The directory name under the platform data directory.
const DATA_DIR_NAME: &str = "todo-reminders";

/// The database filename.
pub const DATABASE_FILENAME: &str = "todo-reminders.sqlite3";

/// The config filename.
pub const CONFIG_FILENAME: &str = "config.yaml";

/// Get the application data directory.
///
/// Returns `None` if the platform data directory cannot be determined.
#[must_use]
pub fn data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join(DATA_DIR_NAME))
}

/// Get the default database path inside `data_dir`.
#[must_use]
pub fn db_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DATABASE_FILENAME)
}

/// Get the config file path inside `data_dir`.
#[must_use]
pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILENAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_dir_name() {
        if let Some(dir) = data_dir() {
            assert!(dir.ends_with(DATA_DIR_NAME));
        }
    }

    #[test]
    fn test_file_paths() {
        let base = Path::new("/data");
        assert_eq!(db_path(base), Path::new("/data/todo-reminders.sqlite3"));
        assert_eq!(config_path(base), Path::new("/data/config.yaml"));
    }
}
