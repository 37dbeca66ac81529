//! Workspace / window / tab state records and the saved-state union.
//!
//! These are the durable shapes: produced by capture, serialized once,
//! read back verbatim on load, and consumed without mutation by restore.
//! A workspace exclusively owns its windows, a window its tabs, a tab its
//! pane tree — no cross-references, no cycles.
//!
//! Decoding is lenient: unknown fields are ignored and missing fields
//! default to zero/empty/false. The one exception is the field that
//! identifies a record's shape (`window_states`, `tabs`, `pane_tree`),
//! which is required.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::mux::ScreenSize;
use crate::pane_tree::PaneNode;

// =============================================================================
// Records
// =============================================================================

/// State of a single tab: title, flags, and its pane tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabState {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_zoomed: bool,
    pub pane_tree: PaneNode,
}

/// State of a window: title, screen size, and its ordered tabs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowState {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub size: ScreenSize,
    pub tabs: Vec<TabState>,
}

/// State of a workspace: its name and ordered windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceState {
    #[serde(default)]
    pub workspace: String,
    pub window_states: Vec<WindowState>,
}

// =============================================================================
// State type and union
// =============================================================================

/// The three kinds of saved state, doubling as the on-disk subdirectory
/// names and the type line of the `current_state` file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateType {
    Workspace,
    Window,
    Tab,
}

impl StateType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Workspace => "workspace",
            Self::Window => "window",
            Self::Tab => "tab",
        }
    }

    /// Parse the `current_state` type line.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "workspace" => Some(Self::Workspace),
            "window" => Some(Self::Window),
            "tab" => Some(Self::Tab),
            _ => None,
        }
    }
}

impl std::fmt::Display for StateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A saved state of any level.
#[derive(Debug, Clone, PartialEq)]
pub enum SavedState {
    Workspace(WorkspaceState),
    Window(WindowState),
    Tab(TabState),
}

/// Determine which state shape a decoded JSON value carries.
///
/// The shapes are distinguished by which collection field is present:
/// `window_states` → workspace, `tabs` → window, `pane_tree` → tab.
///
/// # Errors
/// [`Error::UnknownStateType`] when none of the discriminators is present.
pub fn detect_state_type(value: &serde_json::Value) -> Result<StateType> {
    let Some(object) = value.as_object() else {
        return Err(Error::UnknownStateType);
    };
    if object.contains_key("window_states") {
        Ok(StateType::Workspace)
    } else if object.contains_key("tabs") {
        Ok(StateType::Window)
    } else if object.contains_key("pane_tree") {
        Ok(StateType::Tab)
    } else {
        Err(Error::UnknownStateType)
    }
}

impl SavedState {
    #[must_use]
    pub fn state_type(&self) -> StateType {
        match self {
            Self::Workspace(_) => StateType::Workspace,
            Self::Window(_) => StateType::Window,
            Self::Tab(_) => StateType::Tab,
        }
    }

    /// The name this state would be saved under: the workspace name or
    /// the window/tab title. `None` when empty.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        let name = match self {
            Self::Workspace(state) => state.workspace.as_str(),
            Self::Window(state) => state.title.as_str(),
            Self::Tab(state) => state.title.as_str(),
        };
        (!name.is_empty()).then_some(name)
    }

    /// Serialize to the on-disk JSON shape (the bare record, no wrapper).
    pub fn to_json(&self) -> Result<String> {
        let json = match self {
            Self::Workspace(state) => serde_json::to_string(state)?,
            Self::Window(state) => serde_json::to_string(state)?,
            Self::Tab(state) => serde_json::to_string(state)?,
        };
        Ok(json)
    }

    /// Decode a state of a known type.
    pub fn from_json_typed(json: &str, state_type: StateType) -> Result<Self> {
        let state = match state_type {
            StateType::Workspace => Self::Workspace(serde_json::from_str(json)?),
            StateType::Window => Self::Window(serde_json::from_str(json)?),
            StateType::Tab => Self::Tab(serde_json::from_str(json)?),
        };
        Ok(state)
    }

    /// Decode a state of unknown type by detecting its shape first.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let state_type = detect_state_type(&value)?;
        let state = match state_type {
            StateType::Workspace => Self::Workspace(serde_json::from_value(value)?),
            StateType::Window => Self::Window(serde_json::from_value(value)?),
            StateType::Tab => Self::Tab(serde_json::from_value(value)?),
        };
        Ok(state)
    }
}

// =============================================================================
// Tests
// =============================================================================
