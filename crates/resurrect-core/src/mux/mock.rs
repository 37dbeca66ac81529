//! In-memory mock multiplexer implementing the full capability contract.
//!
//! Backs the crate's tests the way a real embedder backs production use:
//! every operation the core can invoke is implemented over a central
//! state table, with divider-aware geometry bookkeeping for splits and
//! call recording (sent text, injected output, activations) so tests can
//! assert on what the core actually did to the host.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{
    DomainHandle, MuxDomain, MuxFuture, MuxPane, MuxRoot, MuxTab, MuxWindow, PaneDimensions,
    PaneEntry, PaneHandle, ProcessInfo, ScreenSize, SpawnTabRequest, SpawnWindowRequest,
    SplitDirection, SplitRequest, SplitSize, TabEntry, TabHandle, WindowHandle, LOCAL_DOMAIN,
};
use crate::error::{Error, Result};

// =============================================================================
// State tables
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
}

#[derive(Debug, Clone)]
struct PaneRec {
    tab_id: u64,
    rect: Rect,
    cwd: String,
    domain: String,
    scrollback: String,
    process: Option<ProcessInfo>,
    alt_screen_active: bool,
    active: bool,
    zoomed: bool,
    sent: Vec<String>,
    injected: Vec<String>,
}

#[derive(Debug, Clone)]
struct TabRec {
    window_id: u64,
    title: String,
    size: ScreenSize,
    pane_ids: Vec<u64>,
    zoomed: bool,
}

#[derive(Debug, Clone)]
struct WindowRec {
    title: String,
    workspace: String,
    tab_ids: Vec<u64>,
    active_tab: Option<u64>,
}

#[derive(Default)]
struct Inner {
    next_pane: u64,
    next_tab: u64,
    next_window: u64,
    active_workspace: String,
    domains: HashMap<String, bool>,
    windows: BTreeMap<u64, WindowRec>,
    tabs: BTreeMap<u64, TabRec>,
    panes: BTreeMap<u64, PaneRec>,
    activations: Vec<u64>,
}

type Shared = Arc<Mutex<Inner>>;

fn screen_size(cols: u16, rows: u16) -> ScreenSize {
    ScreenSize {
        cols,
        rows,
        pixel_width: u32::from(cols) * 8,
        pixel_height: u32::from(rows) * 16,
    }
}

// =============================================================================
// Seeding
// =============================================================================

/// Everything needed to place one pane in a mock tab.
#[derive(Debug, Clone)]
pub struct PaneSeed {
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
    pub cwd: String,
    pub domain: String,
    pub text: String,
    pub process: Option<ProcessInfo>,
    pub is_active: bool,
    pub is_zoomed: bool,
    pub alt_screen_active: bool,
}

impl Default for PaneSeed {
    fn default() -> Self {
        Self {
            left: 0,
            top: 0,
            width: 80,
            height: 24,
            cwd: String::new(),
            domain: LOCAL_DOMAIN.to_string(),
            text: String::new(),
            process: None,
            is_active: false,
            is_zoomed: false,
            alt_screen_active: false,
        }
    }
}

impl PaneSeed {
    #[must_use]
    pub fn at(left: u16, top: u16, width: u16, height: u16) -> Self {
        Self {
            left,
            top,
            width,
            height,
            ..Self::default()
        }
    }
}

// =============================================================================
// MockMux
// =============================================================================

/// The mock multiplexer root. Clone-cheap; all handles share its state.
#[derive(Clone)]
pub struct MockMux {
    inner: Shared,
}

impl Default for MockMux {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMux {
    #[must_use]
    pub fn new() -> Self {
        let mut inner = Inner {
            active_workspace: "default".to_string(),
            ..Inner::default()
        };
        inner.domains.insert(LOCAL_DOMAIN.to_string(), true);
        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    #[must_use]
    pub fn handle(&self) -> super::MuxHandle {
        Arc::new(MockRoot {
            inner: self.inner.clone(),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("mock mux lock")
    }

    // -------------------------------------------------------------------------
    // Seeding
    // -------------------------------------------------------------------------

    pub fn add_domain(&self, name: &str, spawnable: bool) {
        self.lock().domains.insert(name.to_string(), spawnable);
    }

    pub fn set_active_workspace_name(&self, name: &str) {
        self.lock().active_workspace = name.to_string();
    }

    pub fn add_window(&self, workspace: &str, title: &str) -> u64 {
        let mut inner = self.lock();
        let id = inner.next_window;
        inner.next_window += 1;
        inner.windows.insert(
            id,
            WindowRec {
                title: title.to_string(),
                workspace: workspace.to_string(),
                tab_ids: Vec::new(),
                active_tab: None,
            },
        );
        id
    }

    pub fn add_tab(&self, window_id: u64, title: &str, cols: u16, rows: u16) -> u64 {
        let mut inner = self.lock();
        let id = inner.next_tab;
        inner.next_tab += 1;
        inner.tabs.insert(
            id,
            TabRec {
                window_id,
                title: title.to_string(),
                size: screen_size(cols, rows),
                pane_ids: Vec::new(),
                zoomed: false,
            },
        );
        let window = inner.windows.get_mut(&window_id).expect("window exists");
        window.tab_ids.push(id);
        if window.active_tab.is_none() {
            window.active_tab = Some(id);
        }
        id
    }

    pub fn add_pane(&self, tab_id: u64, seed: PaneSeed) -> u64 {
        let mut inner = self.lock();
        let id = inner.next_pane;
        inner.next_pane += 1;
        inner.domains.entry(seed.domain.clone()).or_insert(true);
        inner.panes.insert(
            id,
            PaneRec {
                tab_id,
                rect: Rect {
                    left: seed.left,
                    top: seed.top,
                    width: seed.width,
                    height: seed.height,
                },
                cwd: seed.cwd,
                domain: seed.domain,
                scrollback: seed.text,
                process: seed.process,
                alt_screen_active: seed.alt_screen_active,
                active: seed.is_active,
                zoomed: seed.is_zoomed,
                sent: Vec::new(),
                injected: Vec::new(),
            },
        );
        inner
            .tabs
            .get_mut(&tab_id)
            .expect("tab exists")
            .pane_ids
            .push(id);
        id
    }

    pub fn set_active_tab(&self, window_id: u64, tab_id: u64) {
        let mut inner = self.lock();
        if let Some(window) = inner.windows.get_mut(&window_id) {
            window.active_tab = Some(tab_id);
        }
    }

    // -------------------------------------------------------------------------
    // Handles
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn pane_handle(&self, pane_id: u64) -> PaneHandle {
        Arc::new(MockPane {
            id: pane_id,
            inner: self.inner.clone(),
        })
    }

    #[must_use]
    pub fn tab_handle(&self, tab_id: u64) -> TabHandle {
        Arc::new(MockTab {
            id: tab_id,
            inner: self.inner.clone(),
        })
    }

    #[must_use]
    pub fn window_handle(&self, window_id: u64) -> WindowHandle {
        Arc::new(MockWindow {
            id: window_id,
            inner: self.inner.clone(),
        })
    }

    // -------------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn sent_text(&self, pane_id: u64) -> Vec<String> {
        self.lock()
            .panes
            .get(&pane_id)
            .map(|p| p.sent.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn injected_output(&self, pane_id: u64) -> Vec<String> {
        self.lock()
            .panes
            .get(&pane_id)
            .map(|p| p.injected.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn activations(&self) -> Vec<u64> {
        self.lock().activations.clone()
    }

    #[must_use]
    pub fn pane_rect(&self, pane_id: u64) -> Option<Rect> {
        self.lock().panes.get(&pane_id).map(|p| p.rect)
    }

    #[must_use]
    pub fn pane_cwd(&self, pane_id: u64) -> Option<String> {
        self.lock().panes.get(&pane_id).map(|p| p.cwd.clone())
    }

    /// All pane rectangles in a tab, in pane-id order.
    #[must_use]
    pub fn tab_pane_rects(&self, tab_id: u64) -> Vec<Rect> {
        let inner = self.lock();
        let Some(tab) = inner.tabs.get(&tab_id) else {
            return Vec::new();
        };
        let mut ids = tab.pane_ids.clone();
        ids.sort_unstable();
        ids.iter()
            .filter_map(|id| inner.panes.get(id).map(|p| p.rect))
            .collect()
    }

    #[must_use]
    pub fn tab_title(&self, tab_id: u64) -> Option<String> {
        self.lock().tabs.get(&tab_id).map(|t| t.title.clone())
    }

    #[must_use]
    pub fn tab_is_zoomed(&self, tab_id: u64) -> bool {
        self.lock().tabs.get(&tab_id).is_some_and(|t| t.zoomed)
    }

    #[must_use]
    pub fn pane_exists(&self, pane_id: u64) -> bool {
        self.lock().panes.contains_key(&pane_id)
    }

    /// Window ids currently assigned to a workspace, in creation order.
    #[must_use]
    pub fn windows_in_workspace(&self, workspace: &str) -> Vec<u64> {
        self.lock()
            .windows
            .iter()
            .filter(|(_, w)| w.workspace == workspace)
            .map(|(id, _)| *id)
            .collect()
    }

    #[must_use]
    pub fn tab_ids(&self, window_id: u64) -> Vec<u64> {
        self.lock()
            .windows
            .get(&window_id)
            .map(|w| w.tab_ids.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn pane_ids(&self, tab_id: u64) -> Vec<u64> {
        self.lock()
            .tabs
            .get(&tab_id)
            .map(|t| t.pane_ids.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn active_workspace_name(&self) -> String {
        self.lock().active_workspace.clone()
    }
}

// =============================================================================
// Shared split geometry
// =============================================================================

/// Carve a child rectangle out of `parent`, leaving one divider cell
/// between them. Mutates `parent` to its post-split shape.
fn carve(parent: &mut Rect, direction: SplitDirection, size: Option<SplitSize>) -> Result<Rect> {
    match direction {
        SplitDirection::Right => {
            let splittable = parent.width.saturating_sub(1);
            if splittable < 2 {
                return Err(Error::mux("pane too narrow to split"));
            }
            // Oversized requests are clamped, not rejected; both halves
            // must keep at least one column.
            let child_width = requested_cells(size, splittable)?.clamp(1, splittable - 1);
            let parent_width = splittable - child_width;
            let child = Rect {
                left: parent.left + parent_width + 1,
                top: parent.top,
                width: child_width,
                height: parent.height,
            };
            parent.width = parent_width;
            Ok(child)
        }
        SplitDirection::Bottom => {
            let splittable = parent.height.saturating_sub(1);
            if splittable < 2 {
                return Err(Error::mux("pane too short to split"));
            }
            let child_height = requested_cells(size, splittable)?.clamp(1, splittable - 1);
            let parent_height = splittable - child_height;
            let child = Rect {
                left: parent.left,
                top: parent.top + parent_height + 1,
                width: parent.width,
                height: child_height,
            };
            parent.height = parent_height;
            Ok(child)
        }
    }
}

fn requested_cells(size: Option<SplitSize>, splittable: u16) -> Result<u16> {
    match size {
        Some(SplitSize::Cells(n)) => Ok(n),
        Some(SplitSize::Proportion(p)) => {
            if !(0.0..=1.0).contains(&p) {
                return Err(Error::mux(format!("split proportion out of range: {p}")));
            }
            Ok((f64::from(splittable) * p).round() as u16)
        }
        None => Ok(splittable / 2),
    }
}

// =============================================================================
// Handle types
// =============================================================================

struct MockDomain {
    name: String,
    spawnable: bool,
}

impl MuxDomain for MockDomain {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn is_spawnable(&self) -> bool {
        self.spawnable
    }
}

struct MockPane {
    id: u64,
    inner: Shared,
}

impl MockPane {
    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("mock mux lock")
    }

    fn with_rec<T>(&self, f: impl FnOnce(&PaneRec) -> T) -> Result<T> {
        let inner = self.lock();
        inner
            .panes
            .get(&self.id)
            .map(f)
            .ok_or_else(|| Error::mux(format!("pane {} not found", self.id)))
    }
}

impl MuxPane for MockPane {
    fn id(&self) -> u64 {
        self.id
    }

    fn domain_name(&self) -> String {
        self.with_rec(|p| p.domain.clone()).unwrap_or_default()
    }

    fn cwd(&self) -> Option<String> {
        self.with_rec(|p| p.cwd.clone())
            .ok()
            .filter(|c| !c.is_empty())
    }

    fn is_alt_screen_active(&self) -> bool {
        self.with_rec(|p| p.alt_screen_active).unwrap_or(false)
    }

    fn foreground_process(&self) -> Option<ProcessInfo> {
        self.with_rec(|p| p.process.clone()).ok().flatten()
    }

    fn dimensions(&self) -> PaneDimensions {
        self.with_rec(|p| PaneDimensions {
            scrollback_rows: p.scrollback.lines().count(),
            cols: p.rect.width,
            rows: p.rect.height,
        })
        .unwrap_or_default()
    }

    fn scrollback_as_escapes(&self, max_rows: usize) -> MuxFuture<'_, String> {
        let inner = self.inner.clone();
        let id = self.id;
        Box::pin(async move {
            let guard = inner.lock().expect("mock mux lock");
            let pane = guard
                .panes
                .get(&id)
                .ok_or_else(|| Error::mux(format!("pane {id} not found")))?;
            let lines: Vec<&str> = pane.scrollback.lines().collect();
            let skip = lines.len().saturating_sub(max_rows);
            Ok(lines[skip..].join("\n"))
        })
    }

    fn split(&self, request: SplitRequest) -> MuxFuture<'_, PaneHandle> {
        let inner = self.inner.clone();
        let id = self.id;
        Box::pin(async move {
            let mut guard = inner.lock().expect("mock mux lock");
            let direction = request.direction.unwrap_or(SplitDirection::Right);
            let (tab_id, mut rect, parent_cwd, parent_domain) = {
                let pane = guard
                    .panes
                    .get(&id)
                    .ok_or_else(|| Error::mux(format!("pane {id} not found")))?;
                (pane.tab_id, pane.rect, pane.cwd.clone(), pane.domain.clone())
            };

            let child_rect = carve(&mut rect, direction, request.size)?;
            let domain = request.domain.unwrap_or(parent_domain);
            if !guard.domains.get(&domain).copied().unwrap_or(false) {
                return Err(Error::mux(format!("domain {domain} is not spawnable")));
            }

            let child_id = guard.next_pane;
            guard.next_pane += 1;
            guard.panes.get_mut(&id).expect("parent pane").rect = rect;
            guard.panes.insert(
                child_id,
                PaneRec {
                    tab_id,
                    rect: child_rect,
                    cwd: request.cwd.unwrap_or(parent_cwd),
                    domain,
                    scrollback: String::new(),
                    process: None,
                    alt_screen_active: false,
                    active: false,
                    zoomed: false,
                    sent: Vec::new(),
                    injected: Vec::new(),
                },
            );
            guard
                .tabs
                .get_mut(&tab_id)
                .expect("tab exists")
                .pane_ids
                .push(child_id);

            Ok(Arc::new(MockPane {
                id: child_id,
                inner: inner.clone(),
            }) as PaneHandle)
        })
    }

    fn send_text(&self, text: &str) -> MuxFuture<'_, ()> {
        let inner = self.inner.clone();
        let id = self.id;
        let text = text.to_string();
        Box::pin(async move {
            let mut guard = inner.lock().expect("mock mux lock");
            let pane = guard
                .panes
                .get_mut(&id)
                .ok_or_else(|| Error::mux(format!("pane {id} not found")))?;
            pane.sent.push(text);
            Ok(())
        })
    }

    fn inject_output(&self, text: &str) -> MuxFuture<'_, ()> {
        let inner = self.inner.clone();
        let id = self.id;
        let text = text.to_string();
        Box::pin(async move {
            let mut guard = inner.lock().expect("mock mux lock");
            let pane = guard
                .panes
                .get_mut(&id)
                .ok_or_else(|| Error::mux(format!("pane {id} not found")))?;
            pane.injected.push(text);
            Ok(())
        })
    }

    fn activate(&self) -> MuxFuture<'_, ()> {
        let inner = self.inner.clone();
        let id = self.id;
        Box::pin(async move {
            let mut guard = inner.lock().expect("mock mux lock");
            let tab_id = guard
                .panes
                .get(&id)
                .map(|p| p.tab_id)
                .ok_or_else(|| Error::mux(format!("pane {id} not found")))?;
            let siblings = guard
                .tabs
                .get(&tab_id)
                .map(|t| t.pane_ids.clone())
                .unwrap_or_default();
            for sibling in siblings {
                if let Some(pane) = guard.panes.get_mut(&sibling) {
                    pane.active = sibling == id;
                }
            }
            let window_id = guard.tabs.get(&tab_id).map(|t| t.window_id);
            if let Some(window_id) = window_id {
                if let Some(window) = guard.windows.get_mut(&window_id) {
                    window.active_tab = Some(tab_id);
                }
            }
            guard.activations.push(id);
            Ok(())
        })
    }

    fn close(&self) -> MuxFuture<'_, ()> {
        let inner = self.inner.clone();
        let id = self.id;
        Box::pin(async move {
            let mut guard = inner.lock().expect("mock mux lock");
            let Some(pane) = guard.panes.remove(&id) else {
                return Err(Error::mux(format!("pane {id} not found")));
            };
            let tab_empty = {
                let tab = guard.tabs.get_mut(&pane.tab_id).expect("tab exists");
                tab.pane_ids.retain(|p| *p != id);
                tab.pane_ids.is_empty()
            };
            if tab_empty {
                let tab = guard.tabs.remove(&pane.tab_id).expect("tab exists");
                if let Some(window) = guard.windows.get_mut(&tab.window_id) {
                    window.tab_ids.retain(|t| *t != pane.tab_id);
                    if window.active_tab == Some(pane.tab_id) {
                        window.active_tab = window.tab_ids.first().copied();
                    }
                }
            }
            Ok(())
        })
    }
}

struct MockTab {
    id: u64,
    inner: Shared,
}

impl MuxTab for MockTab {
    fn id(&self) -> u64 {
        self.id
    }

    fn title(&self) -> String {
        self.inner
            .lock()
            .expect("mock mux lock")
            .tabs
            .get(&self.id)
            .map(|t| t.title.clone())
            .unwrap_or_default()
    }

    fn set_title(&self, title: &str) {
        let mut guard = self.inner.lock().expect("mock mux lock");
        if let Some(tab) = guard.tabs.get_mut(&self.id) {
            tab.title = title.to_string();
        }
    }

    fn panes_with_info(&self) -> Vec<PaneEntry> {
        let guard = self.inner.lock().expect("mock mux lock");
        let Some(tab) = guard.tabs.get(&self.id) else {
            return Vec::new();
        };
        tab.pane_ids
            .iter()
            .filter_map(|pane_id| {
                guard.panes.get(pane_id).map(|pane| PaneEntry {
                    pane: Arc::new(MockPane {
                        id: *pane_id,
                        inner: self.inner.clone(),
                    }) as PaneHandle,
                    is_active: pane.active,
                    is_zoomed: pane.zoomed,
                    left: pane.rect.left,
                    top: pane.rect.top,
                    width: pane.rect.width,
                    height: pane.rect.height,
                })
            })
            .collect()
    }

    fn size(&self) -> ScreenSize {
        self.inner
            .lock()
            .expect("mock mux lock")
            .tabs
            .get(&self.id)
            .map(|t| t.size)
            .unwrap_or_default()
    }

    fn set_zoomed(&self, zoomed: bool) -> MuxFuture<'_, ()> {
        let inner = self.inner.clone();
        let id = self.id;
        Box::pin(async move {
            let mut guard = inner.lock().expect("mock mux lock");
            let tab = guard
                .tabs
                .get_mut(&id)
                .ok_or_else(|| Error::mux(format!("tab {id} not found")))?;
            tab.zoomed = zoomed;
            Ok(())
        })
    }
}

struct MockWindow {
    id: u64,
    inner: Shared,
}

impl MuxWindow for MockWindow {
    fn title(&self) -> String {
        self.inner
            .lock()
            .expect("mock mux lock")
            .windows
            .get(&self.id)
            .map(|w| w.title.clone())
            .unwrap_or_default()
    }

    fn workspace(&self) -> String {
        self.inner
            .lock()
            .expect("mock mux lock")
            .windows
            .get(&self.id)
            .map(|w| w.workspace.clone())
            .unwrap_or_default()
    }

    fn tabs_with_info(&self) -> Vec<TabEntry> {
        let guard = self.inner.lock().expect("mock mux lock");
        let Some(window) = guard.windows.get(&self.id) else {
            return Vec::new();
        };
        window
            .tab_ids
            .iter()
            .map(|tab_id| TabEntry {
                tab: Arc::new(MockTab {
                    id: *tab_id,
                    inner: self.inner.clone(),
                }) as TabHandle,
                is_active: window.active_tab == Some(*tab_id),
            })
            .collect()
    }

    fn active_tab(&self) -> Option<TabHandle> {
        let guard = self.inner.lock().expect("mock mux lock");
        let window = guard.windows.get(&self.id)?;
        let tab_id = window.active_tab.or_else(|| window.tab_ids.first().copied())?;
        Some(Arc::new(MockTab {
            id: tab_id,
            inner: self.inner.clone(),
        }) as TabHandle)
    }

    fn spawn_tab(&self, request: SpawnTabRequest) -> MuxFuture<'_, (TabHandle, PaneHandle)> {
        let inner = self.inner.clone();
        let window_id = self.id;
        Box::pin(async move {
            let mut guard = inner.lock().expect("mock mux lock");
            if !guard.windows.contains_key(&window_id) {
                return Err(Error::mux(format!("window {window_id} not found")));
            }
            let size = guard
                .windows
                .get(&window_id)
                .and_then(|w| w.tab_ids.first())
                .and_then(|t| guard.tabs.get(t))
                .map_or_else(|| screen_size(160, 48), |t| t.size);

            let tab_id = guard.next_tab;
            guard.next_tab += 1;
            guard.tabs.insert(
                tab_id,
                TabRec {
                    window_id,
                    title: String::new(),
                    size,
                    pane_ids: Vec::new(),
                    zoomed: false,
                },
            );
            guard
                .windows
                .get_mut(&window_id)
                .expect("window exists")
                .tab_ids
                .push(tab_id);

            let pane_id = guard.next_pane;
            guard.next_pane += 1;
            guard.panes.insert(
                pane_id,
                PaneRec {
                    tab_id,
                    rect: Rect {
                        left: 0,
                        top: 0,
                        width: size.cols,
                        height: size.rows,
                    },
                    cwd: request.cwd.unwrap_or_default(),
                    domain: request.domain.unwrap_or_else(|| LOCAL_DOMAIN.to_string()),
                    scrollback: String::new(),
                    process: None,
                    alt_screen_active: false,
                    active: false,
                    zoomed: false,
                    sent: Vec::new(),
                    injected: Vec::new(),
                },
            );
            guard
                .tabs
                .get_mut(&tab_id)
                .expect("tab exists")
                .pane_ids
                .push(pane_id);

            let tab = Arc::new(MockTab {
                id: tab_id,
                inner: inner.clone(),
            }) as TabHandle;
            let pane = Arc::new(MockPane {
                id: pane_id,
                inner: inner.clone(),
            }) as PaneHandle;
            Ok((tab, pane))
        })
    }
}

struct MockRoot {
    inner: Shared,
}

impl MuxRoot for MockRoot {
    fn active_workspace(&self) -> String {
        self.inner
            .lock()
            .expect("mock mux lock")
            .active_workspace
            .clone()
    }

    fn all_windows(&self) -> Vec<WindowHandle> {
        let guard = self.inner.lock().expect("mock mux lock");
        guard
            .windows
            .keys()
            .map(|id| {
                Arc::new(MockWindow {
                    id: *id,
                    inner: self.inner.clone(),
                }) as WindowHandle
            })
            .collect()
    }

    fn get_domain(&self, name: &str) -> Option<DomainHandle> {
        let guard = self.inner.lock().expect("mock mux lock");
        guard.domains.get(name).map(|spawnable| {
            Arc::new(MockDomain {
                name: name.to_string(),
                spawnable: *spawnable,
            }) as DomainHandle
        })
    }

    fn spawn_window(
        &self,
        request: SpawnWindowRequest,
    ) -> MuxFuture<'_, (TabHandle, PaneHandle, WindowHandle)> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut guard = inner.lock().expect("mock mux lock");
            let workspace = request
                .workspace
                .unwrap_or_else(|| guard.active_workspace.clone());
            let size = screen_size(request.width.unwrap_or(160), request.height.unwrap_or(48));

            let window_id = guard.next_window;
            guard.next_window += 1;
            let tab_id = guard.next_tab;
            guard.next_tab += 1;
            let pane_id = guard.next_pane;
            guard.next_pane += 1;

            guard.windows.insert(
                window_id,
                WindowRec {
                    title: String::new(),
                    workspace,
                    tab_ids: vec![tab_id],
                    active_tab: Some(tab_id),
                },
            );
            guard.tabs.insert(
                tab_id,
                TabRec {
                    window_id,
                    title: String::new(),
                    size,
                    pane_ids: vec![pane_id],
                    zoomed: false,
                },
            );
            guard.panes.insert(
                pane_id,
                PaneRec {
                    tab_id,
                    rect: Rect {
                        left: 0,
                        top: 0,
                        width: size.cols,
                        height: size.rows,
                    },
                    cwd: request.cwd.unwrap_or_default(),
                    domain: LOCAL_DOMAIN.to_string(),
                    scrollback: String::new(),
                    process: None,
                    alt_screen_active: false,
                    active: false,
                    zoomed: false,
                    sent: Vec::new(),
                    injected: Vec::new(),
                },
            );

            let tab = Arc::new(MockTab {
                id: tab_id,
                inner: inner.clone(),
            }) as TabHandle;
            let pane = Arc::new(MockPane {
                id: pane_id,
                inner: inner.clone(),
            }) as PaneHandle;
            let window = Arc::new(MockWindow {
                id: window_id,
                inner: inner.clone(),
            }) as WindowHandle;
            Ok((tab, pane, window))
        })
    }

    fn set_active_workspace(&self, name: &str) -> MuxFuture<'_, ()> {
        let inner = self.inner.clone();
        let name = name.to_string();
        Box::pin(async move {
            inner.lock().expect("mock mux lock").active_workspace = name;
            Ok(())
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
