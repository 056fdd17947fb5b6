//! Log output setup.
//!
//! Library code only emits `tracing` events. Binaries call [`init`] once to
//! print them to stderr.

use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the configured log filter.
pub const LOG_ENV_VAR: &str = "TODO_REMINDERS_LOG";

/// Build the filter: `TODO_REMINDERS_LOG` if set and valid, else `default_filter`,
/// else `info`.
#[must_use]
pub fn filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install a stderr subscriber. Returns `false` if one was already installed.
pub fn init(default_filter: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(filter(default_filter))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_filter_uses_default() {
        std::env::remove_var(LOG_ENV_VAR);
        assert_eq!(filter("debug").to_string(), "debug");
    }

    #[test]
    #[serial]
    fn test_filter_env_override() {
        std::env::set_var(LOG_ENV_VAR, "warn");
        let built = filter("debug").to_string();
        std::env::remove_var(LOG_ENV_VAR);
        assert_eq!(built, "warn");
    }

    #[test]
    #[serial]
    fn test_invalid_default_falls_back_to_info() {
        std::env::remove_var(LOG_ENV_VAR);
        assert_eq!(filter("[[[").to_string(), "info");
    }

    #[test]
    #[serial]
    fn test_init_twice_is_noop() {
        init("info");
        assert!(!init("info"));
    }
}
