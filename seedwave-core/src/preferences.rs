//! Persisted user preferences (currently just the list view mode).

use crate::catalogue::ViewMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const LOG_TARGET: &str = "seedwave::preferences";

/// Preferences saved between sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub view_mode: ViewMode,
}

/// File-backed preference store. Every change is written straight away.
#[derive(Debug)]
pub struct PreferenceStore {
    path: PathBuf,
    current: Preferences,
}

impl PreferenceStore {
    /// Open the store at the default location (`~/.config/seedwave/.preferences.json`).
    #[must_use]
    pub fn open_default() -> Self {
        Self::open(crate::paths::preferences_path())
    }

    /// Open the store at `path`. A missing or unreadable file yields defaults.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = load(&path).unwrap_or_default();
        Self { path, current }
    }

    #[must_use]
    pub const fn preferences(&self) -> Preferences {
        self.current
    }

    #[must_use]
    pub const fn view_mode(&self) -> ViewMode {
        self.current.view_mode
    }

    pub fn set_view_mode(&mut self, view_mode: ViewMode) {
        self.current.view_mode = view_mode;
        save(&self.path, &self.current);
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn load(path: &Path) -> Option<Preferences> {
    if !path.exists() {
        return None;
    }

    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(prefs) => {
                info!(target: LOG_TARGET, "Loaded preferences from {:?}", path);
                Some(prefs)
            }
            Err(e) => {
                warn!(target: LOG_TARGET, "Failed to parse preferences: {}", e);
                None
            }
        },
        Err(e) => {
            warn!(target: LOG_TARGET, "Failed to read preferences file: {}", e);
            None
        }
    }
}

fn save(path: &Path, prefs: &Preferences) {
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!(target: LOG_TARGET, "Failed to create preferences directory: {}", e);
            return;
        }
    }

    match serde_json::to_string_pretty(prefs) {
        Ok(content) => {
            if let Err(e) = fs::write(path, content) {
                warn!(target: LOG_TARGET, "Failed to write preferences: {}", e);
            }
        }
        Err(e) => {
            warn!(target: LOG_TARGET, "Failed to serialize preferences: {}", e);
        }
    }
}
