//! Pane-tree engine: infer split structure from geometry, plan splits to
//! recreate it.
//!
//! The host exposes the panes of a tab as a flat list of rectangles; the
//! binary tree of split operations that produced them has to be inferred
//! from coordinates alone. The inverse direction is just as delicate:
//! replaying splits in the wrong order produces a visibly different
//! layout, so planning consults the post-split geometry to decide which
//! child was split off first.
//!
//! # Data flow
//!
//! ```text
//! Vec<RawPane> → build → PaneNode tree → plan_splits → Vec<SplitCommand>
//! ```
//!
//! Everything in this module is pure: no host calls, no I/O, no clocks.
//! Identical inputs yield identical trees.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::mux::{ProcessInfo, SplitDirection, SplitSize};

// =============================================================================
// Input record
// =============================================================================

/// A pane as extracted from the host, before any structure is known.
///
/// Geometry is in integer cells, absolute within the tab.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPane {
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
    /// Working directory; empty when the host could not report one.
    pub cwd: String,
    /// The host's routing namespace for this pane.
    pub domain: String,
    /// Whether new panes can be created in `domain`.
    pub is_spawnable: bool,
    /// Escape-encoded scrollback lines; empty for alt-screen and remote panes.
    pub text: String,
    /// Foreground process descriptor, captured only for alt-screen panes.
    pub process: Option<ProcessInfo>,
    pub is_active: bool,
    pub is_zoomed: bool,
    pub alt_screen_active: bool,
}

// =============================================================================
// Tree node
// =============================================================================

/// A node of the binary pane tree.
///
/// `right` is the pane reached by a rightward split from this one,
/// `bottom` the pane reached by a downward split. A leaf has neither.
/// The geometry describes this node's own rectangle after all descendant
/// splits have taken place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaneNode {
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
    #[serde(default)]
    pub cwd: String,
    /// None when the pane's domain is not spawnable; restore then spawns
    /// in the host's default domain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process: Option<ProcessInfo>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_zoomed: bool,
    #[serde(default)]
    pub alt_screen_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<Box<PaneNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom: Option<Box<PaneNode>>,
}

impl PaneNode {
    fn from_raw(pane: &RawPane) -> Self {
        Self {
            left: pane.left,
            top: pane.top,
            width: pane.width,
            height: pane.height,
            cwd: pane.cwd.clone(),
            domain: pane.is_spawnable.then(|| pane.domain.clone()),
            text: pane.text.clone(),
            process: pane.process.clone(),
            is_active: pane.is_active,
            is_zoomed: pane.is_zoomed,
            alt_screen_active: pane.alt_screen_active,
            right: None,
            bottom: None,
        }
    }

    /// Number of panes in this subtree.
    #[must_use]
    pub fn pane_count(&self) -> usize {
        fold(Some(self), 0, &mut |count, _| count + 1)
    }
}

// =============================================================================
// Capture: build a tree from unordered rectangles
// =============================================================================

/// Infer the split tree for a single tab from its panes.
///
/// Panes are sorted by `(left, top)`, which makes the top-left pane the
/// root. Each node then claims the unique pane directly across its right
/// divider and the unique pane directly below its bottom divider,
/// recursing into the remaining candidates on each side. A pane that is
/// both right of and below a node is claimed by the right recursion
/// first.
///
/// Returns the tree (or `None` for an empty input) and one warning per
/// distinct non-spawnable domain encountered. Panes in those domains stay
/// in the tree but carry `domain = None`.
#[must_use]
pub fn build(panes: &[RawPane]) -> (Option<PaneNode>, Vec<String>) {
    let mut warnings = Vec::new();
    let mut warned: BTreeSet<&str> = BTreeSet::new();
    for pane in panes {
        if !pane.is_spawnable && warned.insert(pane.domain.as_str()) {
            warnings.push(format!("Domain {} is not spawnable", pane.domain));
        }
    }

    if panes.is_empty() {
        return (None, warnings);
    }

    let mut sorted: Vec<&RawPane> = panes.iter().collect();
    sorted.sort_by_key(|p| (p.left, p.top));

    let mut used = vec![false; sorted.len()];
    used[0] = true;
    let mut root = PaneNode::from_raw(sorted[0]);
    let candidates: Vec<usize> = (1..sorted.len()).collect();
    attach_children(&mut root, &candidates, &sorted, &mut used);

    let attached = root.pane_count();
    if attached != sorted.len() {
        trace!(
            panes = sorted.len(),
            attached,
            "some panes were not reachable from the tree root"
        );
    }

    (Some(root), warnings)
}

/// Attach the connected right and bottom panes of `node`, recursing.
fn attach_children(
    node: &mut PaneNode,
    candidates: &[usize],
    panes: &[&RawPane],
    used: &mut [bool],
) {
    let right_candidates: Vec<usize> = candidates
        .iter()
        .copied()
        .filter(|&i| !used[i] && panes[i].left > node.left + node.width)
        .collect();
    let bottom_candidates: Vec<usize> = candidates
        .iter()
        .copied()
        .filter(|&i| !used[i] && panes[i].top > node.top + node.height)
        .collect();

    // The connected right pane starts one divider cell past our right edge,
    // at our own top row.
    let connected_right = right_candidates.iter().copied().find(|&i| {
        panes[i].top == node.top && panes[i].left == node.left + node.width + 1
    });
    if let Some(i) = connected_right {
        used[i] = true;
        let mut child = PaneNode::from_raw(panes[i]);
        attach_children(&mut child, &right_candidates, panes, used);
        node.right = Some(Box::new(child));
    }

    let connected_bottom = bottom_candidates.iter().copied().find(|&i| {
        !used[i] && panes[i].left == node.left && panes[i].top == node.top + node.height + 1
    });
    if let Some(i) = connected_bottom {
        used[i] = true;
        let mut child = PaneNode::from_raw(panes[i]);
        attach_children(&mut child, &bottom_candidates, panes, used);
        node.bottom = Some(Box::new(child));
    }
}

// =============================================================================
// Restore: plan splits that recreate the tree
// =============================================================================

/// How planned splits should be sized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizingMode {
    /// Let the host pick (usually an even split).
    #[default]
    Auto,
    /// Sizes as proportions of the splittable area.
    Relative,
    /// Sizes as absolute cell counts.
    Absolute,
}

/// One split to execute against the host; describes the pane it creates.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitCommand {
    pub direction: SplitDirection,
    pub cwd: String,
    pub text: String,
    pub domain: Option<String>,
    pub size: Option<SplitSize>,
}

/// Whether `node`'s right child must be split off before its bottom child.
///
/// When the right child spans the full parent height it was created while
/// the parent still had that height, i.e. before the bottom split. The
/// `+ 1` accounts for the divider cell between the vertically stacked
/// panes; dropping it flips the decision in near-square layouts.
#[must_use]
pub fn right_splits_first(node: &PaneNode) -> bool {
    match (&node.right, &node.bottom) {
        (Some(right), Some(bottom)) => {
            u32::from(right.height) + 1 >= u32::from(node.height) + u32::from(bottom.height)
        }
        _ => true,
    }
}

/// The children of `node` in the order their splits must be executed.
#[must_use]
pub fn ordered_children(node: &PaneNode) -> Vec<(SplitDirection, &PaneNode)> {
    match (node.right.as_deref(), node.bottom.as_deref()) {
        (Some(right), Some(bottom)) => {
            if right_splits_first(node) {
                vec![(SplitDirection::Right, right), (SplitDirection::Bottom, bottom)]
            } else {
                vec![(SplitDirection::Bottom, bottom), (SplitDirection::Right, right)]
            }
        }
        (Some(right), None) => vec![(SplitDirection::Right, right)],
        (None, Some(bottom)) => vec![(SplitDirection::Bottom, bottom)],
        (None, None) => Vec::new(),
    }
}

/// Size for the split that carves `child` out of `parent`.
#[must_use]
pub fn split_size(
    parent: &PaneNode,
    child: &PaneNode,
    direction: SplitDirection,
    sizing: SizingMode,
) -> Option<SplitSize> {
    match sizing {
        SizingMode::Auto => None,
        SizingMode::Absolute => Some(SplitSize::Cells(match direction {
            SplitDirection::Right => child.width,
            SplitDirection::Bottom => child.height,
        })),
        SizingMode::Relative => Some(SplitSize::Proportion(match direction {
            SplitDirection::Right => {
                f64::from(child.width) / (f64::from(parent.width) + f64::from(child.width))
            }
            SplitDirection::Bottom => {
                f64::from(child.height) / (f64::from(parent.height) + f64::from(child.height))
            }
        })),
    }
}

/// Plan the ordered sequence of splits that recreates `tree`.
///
/// Commands are emitted depth-first: each child's split, then the splits
/// of its subtree, with siblings ordered by [`right_splits_first`].
#[must_use]
pub fn plan_splits(tree: Option<&PaneNode>, sizing: SizingMode) -> Vec<SplitCommand> {
    let mut commands = Vec::new();
    if let Some(node) = tree {
        plan_node(node, sizing, &mut commands);
    }
    commands
}

fn plan_node(node: &PaneNode, sizing: SizingMode, out: &mut Vec<SplitCommand>) {
    for (direction, child) in ordered_children(node) {
        out.push(SplitCommand {
            direction,
            cwd: child.cwd.clone(),
            text: child.text.clone(),
            domain: child.domain.clone(),
            size: split_size(node, child, direction, sizing),
        });
        plan_node(child, sizing, out);
    }
}

// =============================================================================
// Traversals
// =============================================================================

/// Rebuild a tree by applying `f` to every node, pre-order.
///
/// `f` receives each original node and returns its replacement payload;
/// children are re-attached from the mapped subtrees. A `None` tree maps
/// to `None`.
pub fn map<F>(tree: Option<&PaneNode>, f: &mut F) -> Option<PaneNode>
where
    F: FnMut(&PaneNode) -> PaneNode,
{
    tree.map(|node| {
        let mut mapped = f(node);
        mapped.right = map(node.right.as_deref(), f).map(Box::new);
        mapped.bottom = map(node.bottom.as_deref(), f).map(Box::new);
        mapped
    })
}

/// Accumulate over a tree in pre-order (node, right subtree, bottom
/// subtree). A `None` tree returns the accumulator unchanged.
pub fn fold<A, F>(tree: Option<&PaneNode>, init: A, f: &mut F) -> A
where
    F: FnMut(A, &PaneNode) -> A,
{
    match tree {
        None => init,
        Some(node) => {
            let acc = f(init, node);
            let acc = fold(node.right.as_deref(), acc, f);
            fold(node.bottom.as_deref(), acc, f)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
