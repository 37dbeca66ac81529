//! Host multiplexer capability contract.
//!
//! The core never talks to a concrete terminal multiplexer directly; it
//! depends on the trait surface below. A production embedder implements
//! these traits over the host's API; tests use the in-memory
//! [`mock::MockMux`] which satisfies the full operation set.
//!
//! Traits are object-safe: host-mutating operations return a boxed future
//! ([`MuxFuture`]) and handles are `Arc<dyn …>`. Attribute reads are
//! synchronous — they reflect mux-cached state and never block.

pub mod mock;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Boxed future returned by host operations.
pub type MuxFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

pub type DomainHandle = Arc<dyn MuxDomain>;
pub type PaneHandle = Arc<dyn MuxPane>;
pub type TabHandle = Arc<dyn MuxTab>;
pub type WindowHandle = Arc<dyn MuxWindow>;
pub type MuxHandle = Arc<dyn MuxRoot>;

/// Name of the host's local (in-process) domain. Scrollback can only be
/// reinjected into panes of this domain.
pub const LOCAL_DOMAIN: &str = "local";

// =============================================================================
// Wire types
// =============================================================================

/// Direction of a pane split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitDirection {
    /// The new pane appears to the right of the split pane.
    Right,
    /// The new pane appears below the split pane.
    Bottom,
}

/// Requested size for the new pane created by a split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitSize {
    /// Absolute size in cells (width for right splits, height for bottom).
    Cells(u16),
    /// Fraction of the splittable area given to the new pane, in (0, 1).
    Proportion(f64),
}

/// Parameters for [`MuxPane::split`].
#[derive(Debug, Clone, Default)]
pub struct SplitRequest {
    pub direction: Option<SplitDirection>,
    pub cwd: Option<String>,
    pub domain: Option<String>,
    pub size: Option<SplitSize>,
}

impl SplitRequest {
    #[must_use]
    pub fn new(direction: SplitDirection) -> Self {
        Self {
            direction: Some(direction),
            ..Self::default()
        }
    }
}

/// Screen dimensions of a tab or window, in cells and pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenSize {
    pub cols: u16,
    pub rows: u16,
    pub pixel_width: u32,
    pub pixel_height: u32,
}

/// Dimensions of a single pane, including retained scrollback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaneDimensions {
    /// Total rows retained, viewport included.
    pub scrollback_rows: usize,
    pub cols: u16,
    pub rows: u16,
}

/// Foreground process descriptor reported by the host.
///
/// The `pid`/`ppid`/`children` fields are volatile: they describe a live
/// process and are cleared by [`ProcessInfo::without_volatile`] before a
/// snapshot is assembled, so they never reach disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub argv: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ppid: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ProcessInfo>,
}

impl ProcessInfo {
    /// Drop the fields that only make sense for a live process.
    #[must_use]
    pub fn without_volatile(mut self) -> Self {
        self.pid = None;
        self.ppid = None;
        self.children.clear();
        self
    }
}

/// A pane plus its placement inside the tab, from [`MuxTab::panes_with_info`].
#[derive(Clone)]
pub struct PaneEntry {
    pub pane: PaneHandle,
    pub is_active: bool,
    pub is_zoomed: bool,
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
}

/// A tab plus its activation flag, from [`MuxWindow::tabs_with_info`].
#[derive(Clone)]
pub struct TabEntry {
    pub tab: TabHandle,
    pub is_active: bool,
}

/// Parameters for [`MuxWindow::spawn_tab`].
#[derive(Debug, Clone, Default)]
pub struct SpawnTabRequest {
    pub cwd: Option<String>,
    pub domain: Option<String>,
}

/// Parameters for [`MuxRoot::spawn_window`].
#[derive(Debug, Clone, Default)]
pub struct SpawnWindowRequest {
    pub workspace: Option<String>,
    pub cwd: Option<String>,
    pub width: Option<u16>,
    pub height: Option<u16>,
}

// =============================================================================
// Capability traits
// =============================================================================

/// A routing namespace for panes (local process vs. remote session).
pub trait MuxDomain: Send + Sync {
    fn name(&self) -> String;
    /// Whether the host can create new panes in this domain on demand.
    fn is_spawnable(&self) -> bool;
}

/// A rectangular terminal inside a tab.
pub trait MuxPane: Send + Sync {
    fn id(&self) -> u64;
    fn domain_name(&self) -> String;
    fn cwd(&self) -> Option<String>;
    fn is_alt_screen_active(&self) -> bool;
    fn foreground_process(&self) -> Option<ProcessInfo>;
    fn dimensions(&self) -> PaneDimensions;

    /// Scrollback content as escape-encoded lines, at most `max_rows` rows.
    fn scrollback_as_escapes(&self, max_rows: usize) -> MuxFuture<'_, String>;

    /// Split this pane, returning the newly created pane.
    fn split(&self, request: SplitRequest) -> MuxFuture<'_, PaneHandle>;

    /// Send text as if typed (reaches the foreground process).
    fn send_text(&self, text: &str) -> MuxFuture<'_, ()>;

    /// Write text directly to the pane's output stream (nothing executes).
    fn inject_output(&self, text: &str) -> MuxFuture<'_, ()>;

    /// Focus this pane (and thereby its tab).
    fn activate(&self) -> MuxFuture<'_, ()>;

    /// Close this pane.
    fn close(&self) -> MuxFuture<'_, ()>;
}

/// A container holding a tree of panes sharing one screen region.
pub trait MuxTab: Send + Sync {
    fn id(&self) -> u64;
    fn title(&self) -> String;
    fn set_title(&self, title: &str);
    fn panes_with_info(&self) -> Vec<PaneEntry>;
    fn size(&self) -> ScreenSize;
    fn set_zoomed(&self, zoomed: bool) -> MuxFuture<'_, ()>;
}

/// A top-level container holding an ordered sequence of tabs.
pub trait MuxWindow: Send + Sync {
    fn title(&self) -> String;
    fn workspace(&self) -> String;
    fn tabs_with_info(&self) -> Vec<TabEntry>;
    fn active_tab(&self) -> Option<TabHandle>;

    /// Spawn a new tab in this window, returning it and its initial pane.
    fn spawn_tab(&self, request: SpawnTabRequest) -> MuxFuture<'_, (TabHandle, PaneHandle)>;
}

/// The multiplexer root.
pub trait MuxRoot: Send + Sync {
    fn active_workspace(&self) -> String;
    fn all_windows(&self) -> Vec<WindowHandle>;
    fn get_domain(&self, name: &str) -> Option<DomainHandle>;

    /// Spawn a new window, returning its initial tab, pane, and the window.
    fn spawn_window(
        &self,
        request: SpawnWindowRequest,
    ) -> MuxFuture<'_, (TabHandle, PaneHandle, WindowHandle)>;

    fn set_active_workspace(&self, name: &str) -> MuxFuture<'_, ()>;
}
