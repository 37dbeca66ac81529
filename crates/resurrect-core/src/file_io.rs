//! Persistence: directory layout, filename sanitization, JSON artifacts,
//! and the `current_state` pointer file.
//!
//! Layout under the configured base directory:
//!
//! ```text
//! <base>/workspace/<name>.json
//! <base>/window/<name>.json
//! <base>/tab/<name>.json
//! <base>/current_state
//! ```
//!
//! Writes go through a temporary file in the target directory and a
//! rename, so a crashed save never leaves a truncated artifact behind.
//! Expected failures (missing file, bad JSON) are reported through the
//! event bus and an absent return value — they do not unwind.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::events::{topics, EventBus};
use crate::fsutil::ensure_dir;
use crate::state::{SavedState, StateType};

// =============================================================================
// Filename sanitization
// =============================================================================

/// Map an arbitrary workspace/window/tab name to a safe file stem.
///
/// Deterministic and total: every input (including empty and
/// all-whitespace) yields a non-empty stem with no path separators,
/// no `..`, no characters invalid on common filesystems, no control
/// bytes, and no trailing dot or space. Consecutive underscores are
/// intentionally not collapsed — existing artifact names depend on the
/// exact mapping.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    // Path separators become '+' so hierarchical names stay legible.
    let mut sanitized = name.replace(['/', '\\'], "+");
    // Then traversal dots, then characters Windows filesystems reject.
    sanitized = sanitized.replace("..", "_");
    sanitized = sanitized.replace(['<', '>', ':', '"', '|', '?', '*'], "_");
    sanitized = sanitized
        .chars()
        .map(|c| {
            let code = c as u32;
            if code < 0x20 || code == 0x7f {
                '_'
            } else {
                c
            }
        })
        .collect();
    let sanitized = sanitized.trim_end_matches(['.', ' ']);

    if sanitized.is_empty() {
        "_unnamed_".to_string()
    } else {
        sanitized.to_string()
    }
}

// =============================================================================
// Optional encryption boundary
// =============================================================================

/// Cipher applied to serialized state when configured. Implementations
/// live outside the core; the store only pipes text through.
pub trait StateCipher: Send + Sync {
    fn encrypt(&self, plaintext: &str) -> Result<String>;
    fn decrypt(&self, ciphertext: &str) -> Result<String>;
}

// =============================================================================
// Store
// =============================================================================

/// Reads and writes saved-state artifacts under a base directory.
pub struct StateStore {
    base_dir: PathBuf,
    cipher: Option<Arc<dyn StateCipher>>,
    events: Arc<EventBus>,
}

impl StateStore {
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>, events: Arc<EventBus>) -> Self {
        Self {
            base_dir: base_dir.into(),
            cipher: None,
            events,
        }
    }

    /// Route serialized state through a cipher on write and read.
    #[must_use]
    pub fn with_cipher(mut self, cipher: Arc<dyn StateCipher>) -> Self {
        self.cipher = Some(cipher);
        self
    }

    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Path of the artifact for a state name and type.
    #[must_use]
    pub fn state_path(&self, name: &str, state_type: StateType) -> PathBuf {
        self.base_dir
            .join(state_type.as_str())
            .join(format!("{}.json", sanitize_filename(name)))
    }

    fn current_state_path(&self) -> PathBuf {
        self.base_dir.join("current_state")
    }

    // -------------------------------------------------------------------------
    // Write
    // -------------------------------------------------------------------------

    /// Serialize and persist a state, deriving the file name from the
    /// workspace name or title.
    ///
    /// Emits `file_io.write_state.start`/`finished` regardless of outcome
    /// and `error` (with the path) on failure.
    pub fn write_state(&self, state: &SavedState) -> Result<PathBuf> {
        self.events.emit(topics::WRITE_STATE_START);
        let result = self.write_state_inner(state);
        self.events.emit(topics::WRITE_STATE_FINISHED);

        if let Err(e) = &result {
            self.events
                .emit_error(format!("failed to write state: {e}"));
        }
        result
    }

    fn write_state_inner(&self, state: &SavedState) -> Result<PathBuf> {
        let name = state.name().ok_or_else(|| {
            Error::NameUnresolved(format!(
                "{} state has no name to save under",
                state.state_type()
            ))
        })?;
        let path = self.state_path(name, state.state_type());

        let mut payload = state.to_json()?;
        if let Some(cipher) = &self.cipher {
            payload = cipher.encrypt(&payload)?;
        }

        write_replace(&path, &payload).map_err(|e| {
            warn!(path = %path.display(), error = %e, "state write failed");
            e
        })?;

        debug!(path = %path.display(), bytes = payload.len(), "state written");
        Ok(path)
    }

    // -------------------------------------------------------------------------
    // Read
    // -------------------------------------------------------------------------

    /// Load a state by name and type.
    ///
    /// Returns `None` (after emitting `error`) when the file is missing,
    /// unreadable, or fails to parse; callers see absence, not an
    /// exception.
    #[must_use]
    pub fn read_state(&self, name: &str, state_type: StateType) -> Option<SavedState> {
        let path = self.state_path(name, state_type);
        match self.read_state_inner(&path, state_type) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "state read failed");
                self.events
                    .emit_error(format!("failed to read {}: {e}", path.display()));
                None
            }
        }
    }

    fn read_state_inner(&self, path: &Path, state_type: StateType) -> Result<SavedState> {
        let mut payload = std::fs::read_to_string(path)?;
        if let Some(cipher) = &self.cipher {
            payload = cipher.decrypt(&payload)?;
        }
        SavedState::from_json_typed(&payload, state_type)
    }

    // -------------------------------------------------------------------------
    // Delete
    // -------------------------------------------------------------------------

    /// Remove the artifact for a state name and type.
    pub fn delete_file(&self, name: &str, state_type: StateType) -> Result<()> {
        let path = self.state_path(name, state_type);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "state deleted");
                Ok(())
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "state delete failed");
                self.events
                    .emit_error(format!("failed to delete {}: {e}", path.display()));
                Err(e.into())
            }
        }
    }

    // -------------------------------------------------------------------------
    // current_state
    // -------------------------------------------------------------------------

    /// Record the most recently saved state so startup can restore it.
    pub fn write_current_state(&self, name: &str, state_type: StateType) -> Result<()> {
        let path = self.current_state_path();
        write_replace(&path, &format!("{name}\n{state_type}"))
    }

    /// Read the `current_state` pointer.
    ///
    /// Returns `None` when the file is missing or its type line is not
    /// one of the known state types.
    #[must_use]
    pub fn read_current_state(&self) -> Option<(String, StateType)> {
        let path = self.current_state_path();
        let content = std::fs::read_to_string(&path).ok()?;
        let mut lines = content.lines();
        let name = lines.next()?.to_string();
        let type_line = lines.next().unwrap_or_default();
        match StateType::parse(type_line) {
            Some(state_type) => Some((name, state_type)),
            None => {
                let e = Error::CorruptCurrentState(format!("unknown state type {type_line:?}"));
                warn!(path = %path.display(), error = %e, "current_state unusable");
                self.events.emit_error(e.to_string());
                None
            }
        }
    }
}

/// Write a file atomically: temp file in the same directory, then rename.
fn write_replace(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
