//! Orchestration: capture host state, persist it, and replay it.
//!
//! # Data flow
//!
//! ```text
//! capture:  MuxRoot → extract → pane_tree::build → WorkspaceState → StateStore
//! restore:  StateStore → WorkspaceState → spawn windows/tabs → split panes
//!                                              ↓
//!                                     on_pane_restore hook
//!                                (scrollback injection / process relaunch)
//! ```
//!
//! Restore threads live pane handles down the tree: each split returns
//! the new pane, which anchors the corresponding child subtree. The order
//! of the two splits at a node follows the captured geometry
//! ([`crate::pane_tree::right_splits_first`]); replaying them the other
//! way around produces a visibly different layout.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::ResurrectConfig;
use crate::error::{Error, Result};
use crate::events::{topics, EventBus};
use crate::extract::extract_tab_panes;
use crate::file_io::StateStore;
use crate::mux::{
    MuxFuture, MuxHandle, PaneHandle, SpawnTabRequest, SpawnWindowRequest, SplitRequest,
    TabHandle, WindowHandle,
};
use crate::pane_tree::{self, ordered_children, split_size, PaneNode, SizingMode};
use crate::state::{SavedState, StateType, TabState, WindowState, WorkspaceState};

// =============================================================================
// Restore options
// =============================================================================

/// Per-pane callback invoked after each pane of a restored tab exists.
///
/// Receives a copy of the node's record and a handle to its live pane.
/// The default implementation replays scrollback or relaunches the
/// foreground process; embedders can substitute their own.
pub type PaneRestoreHook =
    Arc<dyn Fn(PaneNode, PaneHandle) -> MuxFuture<'static, ()> + Send + Sync>;

/// Options recognized by the restore entry points.
#[derive(Clone)]
pub struct RestoreOptions {
    /// How split sizes are computed from the captured geometry.
    pub sizing: SizingMode,
    /// Spawn restored windows into the saved workspace name.
    pub spawn_in_workspace: bool,
    /// Size spawned windows from the saved dimensions.
    pub resize_window: bool,
    /// Run the default text/process restoration per pane.
    pub restore_text: bool,
    /// Close tabs that existed in the target window before restore.
    pub close_open_tabs: bool,
    /// Close panes other than the anchor in the target tab.
    pub close_open_panes: bool,
    /// Replacement for the default per-pane restoration.
    pub on_pane_restore: Option<PaneRestoreHook>,
    /// Anchor the first restored pane tree to this pane instead of the
    /// tab's initial pane.
    pub pane: Option<PaneHandle>,
}

impl Default for RestoreOptions {
    fn default() -> Self {
        Self {
            sizing: SizingMode::default(),
            spawn_in_workspace: false,
            resize_window: false,
            restore_text: true,
            close_open_tabs: false,
            close_open_panes: false,
            on_pane_restore: None,
            pane: None,
        }
    }
}

impl std::fmt::Debug for RestoreOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestoreOptions")
            .field("sizing", &self.sizing)
            .field("spawn_in_workspace", &self.spawn_in_workspace)
            .field("resize_window", &self.resize_window)
            .field("restore_text", &self.restore_text)
            .field("close_open_tabs", &self.close_open_tabs)
            .field("close_open_panes", &self.close_open_panes)
            .field("on_pane_restore", &self.on_pane_restore.is_some())
            .field("pane", &self.pane.is_some())
            .finish()
    }
}

/// Default per-pane restoration.
///
/// An alt-screen pane with a captured process gets its command line
/// re-sent (the program relaunches); a pane with scrollback gets the text
/// written straight to its output stream (nothing executes); anything
/// else is left alone.
pub async fn default_on_pane_restore(node: &PaneNode, pane: &PaneHandle) -> Result<()> {
    if node.alt_screen_active {
        if let Some(process) = &node.process {
            let command = if process.argv.is_empty() {
                process.name.clone()
            } else {
                process.argv.join(" ")
            };
            if !command.is_empty() {
                pane.send_text(&format!("{command}\r")).await?;
            }
        }
    } else if !node.text.is_empty() {
        pane.inject_output(node.text.trim_end()).await?;
    }
    Ok(())
}

// =============================================================================
// State manager
// =============================================================================

/// Coordinates capture, persistence, and restore against one host.
pub struct StateManager {
    mux: MuxHandle,
    store: StateStore,
    events: Arc<EventBus>,
    config: ResurrectConfig,
    save_in_progress: AtomicBool,
}

impl StateManager {
    #[must_use]
    pub fn new(mux: MuxHandle, config: ResurrectConfig, events: Arc<EventBus>) -> Self {
        let store = StateStore::new(config.state_dir.clone(), events.clone());
        Self {
            mux,
            store,
            events,
            config,
            save_in_progress: AtomicBool::new(false),
        }
    }

    /// Replace the default store (e.g. to attach a cipher).
    #[must_use]
    pub fn with_store(mut self, store: StateStore) -> Self {
        self.store = store;
        self
    }

    #[must_use]
    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    #[must_use]
    pub fn store(&self) -> &StateStore {
        &self.store
    }

    #[must_use]
    pub fn config(&self) -> &ResurrectConfig {
        &self.config
    }

    // -------------------------------------------------------------------------
    // Capture
    // -------------------------------------------------------------------------

    /// Capture the active workspace: every window assigned to it, each
    /// window's tabs, each tab's pane tree.
    pub async fn capture_workspace(&self) -> Result<WorkspaceState> {
        let workspace = self.mux.active_workspace();
        let mut window_states = Vec::new();

        for window in self.mux.all_windows() {
            if window.workspace() != workspace {
                continue;
            }
            let state = self.capture_window(&window).await?;
            if !state.tabs.is_empty() {
                window_states.push(state);
            }
        }

        info!(
            workspace = %workspace,
            windows = window_states.len(),
            "workspace captured"
        );

        Ok(WorkspaceState {
            workspace,
            window_states,
        })
    }

    /// Capture a single window and all its tabs.
    pub async fn capture_window(&self, window: &WindowHandle) -> Result<WindowState> {
        let size = window.active_tab().map(|t| t.size()).unwrap_or_default();
        let mut tabs = Vec::new();

        for entry in window.tabs_with_info() {
            if let Some(tab_state) = self.capture_tab(&entry.tab, entry.is_active).await? {
                tabs.push(tab_state);
            }
        }

        Ok(WindowState {
            title: window.title(),
            size,
            tabs,
        })
    }

    /// Capture a single tab. Returns `None` for a tab with no panes.
    pub async fn capture_tab(&self, tab: &TabHandle, is_active: bool) -> Result<Option<TabState>> {
        let raw = extract_tab_panes(tab.as_ref(), self.mux.as_ref(), self.config.max_nlines).await?;
        let (tree, warnings) = pane_tree::build(&raw);

        for warning in warnings {
            warn!(tab_id = tab.id(), "{warning}");
            self.events.emit_error(warning);
        }

        let Some(pane_tree) = tree else {
            return Ok(None);
        };
        let is_zoomed = raw.iter().any(|p| p.is_zoomed);

        Ok(Some(TabState {
            title: tab.title(),
            is_active,
            is_zoomed,
            pane_tree,
        }))
    }

    // -------------------------------------------------------------------------
    // Save / load / delete
    // -------------------------------------------------------------------------

    /// Capture the active workspace and persist it, updating the
    /// `current_state` pointer.
    pub async fn save_workspace(&self) -> Result<PathBuf> {
        let state = self.capture_workspace().await?;
        let name = state.workspace.clone();
        let path = self.store.write_state(&SavedState::Workspace(state))?;
        self.store
            .write_current_state(&name, StateType::Workspace)?;
        Ok(path)
    }

    /// Persist an already-captured state.
    pub fn save_state(&self, state: &SavedState) -> Result<PathBuf> {
        self.store.write_state(state)
    }

    /// Load a state by name and type. Missing or corrupt artifacts yield
    /// `None` (the failure is reported through the event bus).
    #[must_use]
    pub fn load_state(&self, name: &str, state_type: StateType) -> Option<SavedState> {
        self.events.emit(topics::LOAD_STATE_START);
        let state = self.store.read_state(name, state_type);
        self.events.emit(topics::LOAD_STATE_FINISHED);
        state
    }

    /// Delete a saved state artifact.
    pub fn delete_state(&self, name: &str, state_type: StateType) -> Result<()> {
        self.events.emit(topics::DELETE_STATE_START);
        let result = self.store.delete_file(name, state_type);
        self.events.emit(topics::DELETE_STATE_FINISHED);
        result
    }

    // -------------------------------------------------------------------------
    // Periodic save
    // -------------------------------------------------------------------------

    /// Run one periodic save iteration.
    ///
    /// Single-flight: when a previous iteration is still running the call
    /// returns `false` without saving anything, and the caller simply
    /// reschedules. Otherwise saves the configured levels: the active
    /// workspace, windows with non-empty titles, tabs with non-empty
    /// titles.
    pub async fn periodic_save(&self) -> bool {
        if self
            .save_in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("periodic save already in flight, skipping this round");
            return false;
        }

        self.events.emit(topics::PERIODIC_SAVE_START);

        if self.config.save_workspaces {
            if let Err(e) = self.save_workspace().await {
                warn!(error = %e, "periodic workspace save failed");
            }
        }

        if self.config.save_windows {
            for window in self.mux.all_windows() {
                if window.title().is_empty() {
                    continue;
                }
                match self.capture_window(&window).await {
                    Ok(state) => {
                        if let Err(e) = self.store.write_state(&SavedState::Window(state)) {
                            warn!(error = %e, "periodic window save failed");
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "window capture failed");
                        self.events.emit_error(format!("window capture failed: {e}"));
                    }
                }
            }
        }

        if self.config.save_tabs {
            for window in self.mux.all_windows() {
                for entry in window.tabs_with_info() {
                    if entry.tab.title().is_empty() {
                        continue;
                    }
                    match self.capture_tab(&entry.tab, entry.is_active).await {
                        Ok(Some(state)) => {
                            if let Err(e) = self.store.write_state(&SavedState::Tab(state)) {
                                warn!(error = %e, "periodic tab save failed");
                            }
                        }
                        Ok(None) => {}
                        Err(e) => {
                            warn!(error = %e, "tab capture failed");
                            self.events.emit_error(format!("tab capture failed: {e}"));
                        }
                    }
                }
            }
        }

        self.events.emit(topics::PERIODIC_SAVE_FINISHED);
        self.save_in_progress.store(false, Ordering::SeqCst);
        true
    }

    /// Spawn the periodic save loop on the current runtime.
    pub fn spawn_periodic_save(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(manager.config.interval()).await;
                manager.periodic_save().await;
            }
        })
    }

    // -------------------------------------------------------------------------
    // Restore
    // -------------------------------------------------------------------------

    /// Recreate a saved workspace: spawn a window per saved window, rebuild
    /// each window's tabs, then optionally focus the workspace.
    ///
    /// A structurally empty state aborts with an error; failures inside a
    /// single window are reported and restoration continues with the next.
    pub async fn restore_workspace(
        &self,
        state: &WorkspaceState,
        opts: &RestoreOptions,
    ) -> Result<()> {
        self.events.emit(topics::RESTORE_WORKSPACE_START);

        if state.window_states.is_empty() {
            let e = Error::InvalidState("workspace state has no windows".to_string());
            self.events.emit_error(e.to_string());
            return Err(e);
        }

        for window_state in &state.window_states {
            let request = SpawnWindowRequest {
                workspace: opts
                    .spawn_in_workspace
                    .then(|| state.workspace.clone()),
                cwd: window_state
                    .tabs
                    .first()
                    .map(|t| t.pane_tree.cwd.clone())
                    .filter(|c| !c.is_empty()),
                width: opts.resize_window.then_some(window_state.size.cols),
                height: opts.resize_window.then_some(window_state.size.rows),
            };

            let (tab, pane, window) = match self.mux.spawn_window(request).await {
                Ok(spawned) => spawned,
                Err(e) => {
                    warn!(error = %e, "window spawn failed");
                    self.events.emit_error(format!("window spawn failed: {e}"));
                    continue;
                }
            };

            if let Err(e) = self
                .restore_window_inner(&window, tab, pane, window_state, opts)
                .await
            {
                warn!(error = %e, "window restore failed");
                self.events.emit_error(format!("window restore failed: {e}"));
            }
        }

        if opts.spawn_in_workspace {
            self.mux.set_active_workspace(&state.workspace).await?;
        }

        self.events.emit(topics::RESTORE_WORKSPACE_FINISHED);
        Ok(())
    }

    /// Restore a window state into an existing window, reusing its active
    /// tab as the first restored tab.
    pub async fn restore_window(
        &self,
        window: &WindowHandle,
        state: &WindowState,
        opts: &RestoreOptions,
    ) -> Result<()> {
        let first_tab = window
            .active_tab()
            .ok_or_else(|| Error::InvalidState("target window has no tabs".to_string()))?;
        let first_pane = first_tab
            .panes_with_info()
            .first()
            .map(|entry| entry.pane.clone())
            .ok_or_else(|| Error::InvalidState("target tab has no panes".to_string()))?;
        self.restore_window_inner(window, first_tab, first_pane, state, opts)
            .await
    }

    async fn restore_window_inner(
        &self,
        window: &WindowHandle,
        first_tab: TabHandle,
        first_pane: PaneHandle,
        state: &WindowState,
        opts: &RestoreOptions,
    ) -> Result<()> {
        self.events.emit(topics::RESTORE_WINDOW_START);

        if state.tabs.is_empty() {
            let e = Error::InvalidState("window state has no tabs".to_string());
            self.events.emit_error(e.to_string());
            return Err(e);
        }

        // Remember what was here before we add anything, so
        // close_open_tabs can clean up afterwards.
        let pre_existing: Vec<u64> = window.tabs_with_info().iter().map(|t| t.tab.id()).collect();
        let first_tab_id = first_tab.id();

        let mut active_target: Option<PaneHandle> = None;
        for (index, tab_state) in state.tabs.iter().enumerate() {
            let (tab, anchor, tab_opts) = if index == 0 {
                (first_tab.clone(), Some(first_pane.clone()), opts.clone())
            } else {
                let request = SpawnTabRequest {
                    cwd: Some(tab_state.pane_tree.cwd.clone()).filter(|c| !c.is_empty()),
                    domain: None,
                };
                let (tab, pane) = window.spawn_tab(request).await?;
                // A caller-supplied anchor pane only applies to the first tab.
                let tab_opts = RestoreOptions {
                    pane: None,
                    ..opts.clone()
                };
                (tab, Some(pane), tab_opts)
            };

            let restored = self.restore_tab(&tab, anchor, tab_state, &tab_opts).await?;
            if tab_state.is_active {
                active_target = Some(restored);
            }
        }

        if opts.close_open_tabs {
            for entry in window.tabs_with_info() {
                let id = entry.tab.id();
                if id != first_tab_id && pre_existing.contains(&id) {
                    for pane_entry in entry.tab.panes_with_info() {
                        if let Err(e) = pane_entry.pane.close().await {
                            warn!(error = %e, "failed to close pre-existing pane");
                        }
                    }
                }
            }
        }

        if let Some(pane) = active_target {
            if let Err(e) = pane.activate().await {
                debug!(error = %e, "failed to activate saved-active tab");
            }
        }

        self.events.emit(topics::RESTORE_WINDOW_FINISHED);
        Ok(())
    }

    /// Rebuild a tab's pane tree inside `tab`.
    ///
    /// The tree root is anchored to `opts.pane`, then `anchor`, then the
    /// tab's first pane. Returns the pane that ended up focused (the
    /// captured-active pane, or the root when none was flagged).
    pub async fn restore_tab(
        &self,
        tab: &TabHandle,
        anchor: Option<PaneHandle>,
        state: &TabState,
        opts: &RestoreOptions,
    ) -> Result<PaneHandle> {
        self.events.emit(topics::RESTORE_TAB_START);

        let root_pane = opts
            .pane
            .clone()
            .or(anchor)
            .or_else(|| tab.panes_with_info().first().map(|e| e.pane.clone()))
            .ok_or_else(|| Error::InvalidState("tab has no pane to anchor to".to_string()))?;

        if opts.close_open_panes {
            for entry in tab.panes_with_info() {
                if entry.pane.id() != root_pane.id() {
                    if let Err(e) = entry.pane.close().await {
                        warn!(error = %e, "failed to close pre-existing pane");
                    }
                }
            }
        }

        let mut outcome = TabOutcome::default();
        self.restore_node(&state.pane_tree, root_pane.clone(), opts, &mut outcome)
            .await?;

        let focused = outcome.active_pane.unwrap_or(root_pane);
        if let Err(e) = focused.activate().await {
            debug!(error = %e, "failed to activate restored pane");
        }

        if outcome.zoomed {
            tab.set_zoomed(true).await?;
        }
        if !state.title.is_empty() {
            tab.set_title(&state.title);
        }

        self.events.emit(topics::RESTORE_TAB_FINISHED);
        Ok(focused)
    }

    /// Recreate the subtree rooted at `node`, whose pane already exists.
    ///
    /// Boxed future because async recursion requires it.
    fn restore_node<'a>(
        &'a self,
        node: &'a PaneNode,
        pane: PaneHandle,
        opts: &'a RestoreOptions,
        outcome: &'a mut TabOutcome,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            if node.is_active {
                outcome.active_pane = Some(pane.clone());
            }
            if node.is_zoomed {
                outcome.zoomed = true;
            }

            self.run_pane_hook(node, &pane, opts).await;

            for (direction, child) in ordered_children(node) {
                let request = SplitRequest {
                    direction: Some(direction),
                    cwd: Some(child.cwd.clone()).filter(|c| !c.is_empty()),
                    domain: child.domain.clone(),
                    size: split_size(node, child, direction, opts.sizing),
                };
                let child_pane = pane.split(request).await?;
                self.restore_node(child, child_pane, opts, outcome).await?;
            }

            Ok(())
        })
    }

    /// Run the per-pane hook; failures are reported, never fatal.
    async fn run_pane_hook(&self, node: &PaneNode, pane: &PaneHandle, opts: &RestoreOptions) {
        let result = match &opts.on_pane_restore {
            Some(hook) => hook(node.clone(), pane.clone()).await,
            None if opts.restore_text => default_on_pane_restore(node, pane).await,
            None => Ok(()),
        };
        if let Err(e) = result {
            warn!(pane_id = pane.id(), error = %e, "pane restore hook failed");
            self.events
                .emit_error(format!("pane restore hook failed: {e}"));
        }
    }
}

#[derive(Default)]
struct TabOutcome {
    active_pane: Option<PaneHandle>,
    zoomed: bool,
}

// =============================================================================
// Tests
// =============================================================================
