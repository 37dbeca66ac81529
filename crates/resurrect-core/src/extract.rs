//! Extraction of raw pane records from the host multiplexer.
//!
//! This is the only place that reads live host state during capture.
//! Everything downstream ([`crate::pane_tree::build`], state assembly,
//! persistence) is pure.
//!
//! Capture rules per pane:
//! - Remote or non-spawnable domain: no scrollback, no process — text
//!   cannot be reinjected into a domain we cannot spawn panes in.
//! - Alt-screen active: capture the foreground process (volatile fields
//!   cleared) and leave the text empty; a full-screen program's buffer
//!   cannot be replayed as scrollback.
//! - Otherwise: capture up to `max_nlines` rows of escape-encoded
//!   scrollback and leave the process empty.

use crate::error::Result;
use crate::fsutil::normalize_cwd;
use crate::mux::{MuxRoot, MuxTab, ProcessInfo, LOCAL_DOMAIN};
use crate::pane_tree::RawPane;

/// Extract the raw pane records for a single tab.
pub async fn extract_tab_panes(
    tab: &dyn MuxTab,
    mux: &dyn MuxRoot,
    max_nlines: usize,
) -> Result<Vec<RawPane>> {
    let entries = tab.panes_with_info();
    let mut panes = Vec::with_capacity(entries.len());

    for entry in entries {
        let pane = &entry.pane;
        let domain = pane.domain_name();
        let is_spawnable = mux
            .get_domain(&domain)
            .is_some_and(|d| d.is_spawnable());
        let cwd = pane.cwd().map(|c| normalize_cwd(&c)).unwrap_or_default();
        let alt_screen_active = pane.is_alt_screen_active();

        let (text, process) = if domain != LOCAL_DOMAIN || !is_spawnable {
            (String::new(), None)
        } else if alt_screen_active {
            let process = pane
                .foreground_process()
                .map(ProcessInfo::without_volatile);
            (String::new(), process)
        } else {
            let rows = max_nlines.min(pane.dimensions().scrollback_rows);
            let text = if rows == 0 {
                String::new()
            } else {
                pane.scrollback_as_escapes(rows).await?
            };
            (text, None)
        };

        panes.push(RawPane {
            left: entry.left,
            top: entry.top,
            width: entry.width,
            height: entry.height,
            cwd,
            domain,
            is_spawnable,
            text,
            process,
            is_active: entry.is_active,
            is_zoomed: entry.is_zoomed,
            alt_screen_active,
        });
    }

    Ok(panes)
}
