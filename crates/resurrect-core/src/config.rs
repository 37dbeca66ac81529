//! Configuration for capture, persistence, and periodic save.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Core configuration threaded through the state manager.
///
/// ```toml
/// [resurrect]
/// state_dir = "~/.local/share/resurrect/state"
/// max_nlines = 2000
/// interval_seconds = 900
/// save_workspaces = true
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResurrectConfig {
    /// Base directory for JSON artifacts; type subdirectories are created
    /// lazily underneath it.
    pub state_dir: PathBuf,
    /// Upper bound on scrollback rows captured per pane.
    pub max_nlines: usize,
    /// Periodic save cadence in seconds.
    pub interval_seconds: u64,
    /// Persist the active workspace on each periodic save.
    pub save_workspaces: bool,
    /// Persist every window with a non-empty title on each periodic save.
    pub save_windows: bool,
    /// Persist every tab with a non-empty title on each periodic save.
    pub save_tabs: bool,
}

impl Default for ResurrectConfig {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from("state"),
            max_nlines: 2000,
            interval_seconds: 15 * 60,
            save_workspaces: true,
            save_windows: false,
            save_tabs: false,
        }
    }
}

impl ResurrectConfig {
    /// Periodic save cadence as a [`Duration`].
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}
