//! Path constants for configuration and preference files.

use std::path::PathBuf;

/// The name of the configuration directory under ~/.config/
pub const CONFIG_DIR_NAME: &str = "seedwave";

/// The name of the main configuration file
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// The name of the persisted preferences file (prefixed with . for hidden)
pub const PREFERENCES_FILE_NAME: &str = ".preferences.json";

/// The name of the log file written when file logging is enabled
pub const LOG_FILE_NAME: &str = "seedwave.log";

/// Environment variable that overrides the config file location
pub const CONFIG_PATH_ENV: &str = "SEEDWAVE_CONFIG_PATH";

/// Get the configuration directory path (~/.config/seedwave/)
#[must_use]
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join(CONFIG_DIR_NAME)
}

/// Get the config file path (~/.config/seedwave/config.toml), honouring
/// `SEEDWAVE_CONFIG_PATH` when set.
#[must_use]
pub fn config_path() -> PathBuf {
    match std::env::var_os(CONFIG_PATH_ENV) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => config_dir().join(CONFIG_FILE_NAME),
    }
}

/// Get the preferences file path (`~/.config/seedwave/.preferences.json`)
#[must_use]
pub fn preferences_path() -> PathBuf {
    config_dir().join(PREFERENCES_FILE_NAME)
}

/// Get the log file path (`~/.config/seedwave/seedwave.log`)
#[must_use]
pub fn log_file_path() -> PathBuf {
    config_dir().join(LOG_FILE_NAME)
}
