//! Property-based tests for the pane-tree engine.
//!
//! Validates:
//! 1. `build` is deterministic and attaches children at exact divider
//!    offsets (the geometric invariants) for arbitrary rectangle soups.
//! 2. `build` inverts generation: a tree generated from a consistent
//!    split history is reconstructed exactly from its flattened panes.
//! 3. Planning + executing the splits against a fresh single-pane tab
//!    reproduces the generated rectangles exactly.
//! 4. Exactly one warning per distinct non-spawnable domain.
//! 5. `fold`/`map` traversal identities.

use proptest::prelude::*;

use resurrect_core::config::ResurrectConfig;
use resurrect_core::events::EventBus;
use resurrect_core::mux::mock::{MockMux, PaneSeed};
use resurrect_core::pane_tree::{build, fold, map, PaneNode, RawPane, SizingMode};
use resurrect_core::state::TabState;
use resurrect_core::state_manager::{RestoreOptions, StateManager};
use std::sync::Arc;

// =============================================================================
// Strategies and generators
// =============================================================================

/// Minimum cell span kept on each side of a generated split.
const MIN_SPAN: u16 = 6;

/// A cursor over proptest-provided choice values.
struct Choices<'a> {
    values: &'a [u32],
    cursor: usize,
}

impl<'a> Choices<'a> {
    fn new(values: &'a [u32]) -> Self {
        Self { values, cursor: 0 }
    }

    fn next(&mut self) -> u32 {
        let value = self.values.get(self.cursor).copied().unwrap_or(0);
        self.cursor += 1;
        value
    }
}

fn leaf(left: u16, top: u16, width: u16, height: u16, n: &mut u32) -> PaneNode {
    let node = PaneNode {
        left,
        top,
        width,
        height,
        cwd: format!("/pane-{n}"),
        domain: Some("local".to_string()),
        ..PaneNode::default()
    };
    *n += 1;
    node
}

/// Generate a pane tree whose geometry is consistent with an actual split
/// history, i.e. a tree that planning can reproduce exactly: no node
/// extends a split chain in its own split direction, and when a node has
/// both children the child that was split first still spans its full
/// extent.
fn gen_tree(
    left: u16,
    top: u16,
    width: u16,
    height: u16,
    choices: &mut Choices<'_>,
    depth: u8,
    allow_right: bool,
    allow_bottom: bool,
    n: &mut u32,
) -> PaneNode {
    let can_right = allow_right && width >= 2 * MIN_SPAN + 1;
    let can_bottom = allow_bottom && height >= 2 * MIN_SPAN + 1;
    if depth == 0 || (!can_right && !can_bottom) {
        return leaf(left, top, width, height, n);
    }

    let pick = |choices: &mut Choices<'_>, span: u16| -> u16 {
        MIN_SPAN + (choices.next() % u32::from(span - 2 * MIN_SPAN)) as u16
    };

    let variant = choices.next() % 5;
    match variant {
        // Leaf
        0 => leaf(left, top, width, height, n),

        // Right-only: the child may stack downward but never extends the
        // horizontal chain.
        1 if can_right => {
            let child_width = pick(choices, width);
            let node_width = width - 1 - child_width;
            let mut node = leaf(left, top, node_width, height, n);
            node.right = Some(Box::new(gen_tree(
                left + node_width + 1,
                top,
                child_width,
                height,
                choices,
                depth - 1,
                false,
                true,
                n,
            )));
            node
        }

        // Bottom-only.
        2 if can_bottom => {
            let child_height = pick(choices, height);
            let node_height = height - 1 - child_height;
            let mut node = leaf(left, top, width, node_height, n);
            node.bottom = Some(Box::new(gen_tree(
                left,
                top + node_height + 1,
                width,
                child_height,
                choices,
                depth - 1,
                true,
                false,
                n,
            )));
            node
        }

        // Both, right split first: the right pane keeps the full height.
        3 if can_right && can_bottom => {
            let child_width = pick(choices, width);
            let node_width = width - 1 - child_width;
            let child_height = pick(choices, height);
            let node_height = height - 1 - child_height;
            let mut node = leaf(left, top, node_width, node_height, n);
            node.right = Some(Box::new(leaf(
                left + node_width + 1,
                top,
                child_width,
                height,
                n,
            )));
            node.bottom = Some(Box::new(gen_tree(
                left,
                top + node_height + 1,
                node_width,
                child_height,
                choices,
                depth - 1,
                true,
                false,
                n,
            )));
            node
        }

        // Both, bottom split first: the bottom pane keeps the full width.
        4 if can_right && can_bottom => {
            let child_width = pick(choices, width);
            let node_width = width - 1 - child_width;
            let child_height = pick(choices, height);
            let node_height = height - 1 - child_height;
            let mut node = leaf(left, top, node_width, node_height, n);
            node.bottom = Some(Box::new(leaf(
                left,
                top + node_height + 1,
                width,
                child_height,
                n,
            )));
            node.right = Some(Box::new(gen_tree(
                left + node_width + 1,
                top,
                child_width,
                node_height,
                choices,
                depth - 1,
                false,
                true,
                n,
            )));
            node
        }

        _ => leaf(left, top, width, height, n),
    }
}

fn flatten(tree: &PaneNode) -> Vec<RawPane> {
    fold(Some(tree), Vec::new(), &mut |mut acc, node| {
        acc.push(RawPane {
            left: node.left,
            top: node.top,
            width: node.width,
            height: node.height,
            cwd: node.cwd.clone(),
            domain: "local".to_string(),
            is_spawnable: true,
            ..RawPane::default()
        });
        acc
    })
}

fn arb_choices() -> impl Strategy<Value = Vec<u32>> {
    proptest::collection::vec(any::<u32>(), 1..48)
}

fn arb_tab_size() -> impl Strategy<Value = (u16, u16)> {
    (40u16..200, 30u16..120)
}

// =============================================================================
// build: geometric invariants on arbitrary inputs
// =============================================================================

fn arb_raw_pane() -> impl Strategy<Value = RawPane> {
    (0u16..200, 0u16..100, 1u16..120, 1u16..60).prop_map(|(left, top, width, height)| RawPane {
        left,
        top,
        width,
        height,
        domain: "local".to_string(),
        is_spawnable: true,
        ..RawPane::default()
    })
}

proptest! {
    #[test]
    fn build_children_sit_at_divider_offsets(panes in proptest::collection::vec(arb_raw_pane(), 0..12)) {
        let (tree, _) = build(&panes);
        // Plain asserts inside the closure: proptest treats the panic as
        // a test-case failure.
        fold(tree.as_ref(), (), &mut |(), node| {
            if let Some(right) = node.right.as_deref() {
                assert_eq!(right.left, node.left + node.width + 1);
                assert_eq!(right.top, node.top);
            }
            if let Some(bottom) = node.bottom.as_deref() {
                assert_eq!(bottom.top, node.top + node.height + 1);
                assert_eq!(bottom.left, node.left);
            }
        });
    }

    #[test]
    fn build_is_deterministic(panes in proptest::collection::vec(arb_raw_pane(), 0..12)) {
        let (first, first_warnings) = build(&panes);
        let (second, second_warnings) = build(&panes);
        prop_assert_eq!(first, second);
        prop_assert_eq!(first_warnings, second_warnings);
    }

    #[test]
    fn build_never_duplicates_panes(panes in proptest::collection::vec(arb_raw_pane(), 0..12)) {
        let (tree, _) = build(&panes);
        let count = fold(tree.as_ref(), 0usize, &mut |acc, _| acc + 1);
        prop_assert!(count <= panes.len().max(1));
        if !panes.is_empty() {
            prop_assert!(count >= 1);
        }
    }
}

// =============================================================================
// build inverts generation; replay reproduces rectangles
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn build_reconstructs_generated_tree(
        choices in arb_choices(),
        (cols, rows) in arb_tab_size(),
    ) {
        let mut n = 0;
        let tree = gen_tree(0, 0, cols, rows, &mut Choices::new(&choices), 4, true, true, &mut n);
        let panes = flatten(&tree);

        let (rebuilt, warnings) = build(&panes);
        prop_assert!(warnings.is_empty());
        prop_assert_eq!(rebuilt.as_ref(), Some(&tree));
    }

    #[test]
    fn replay_reproduces_generated_rectangles(
        choices in arb_choices(),
        (cols, rows) in arb_tab_size(),
    ) {
        let mut n = 0;
        let tree = gen_tree(0, 0, cols, rows, &mut Choices::new(&choices), 4, true, true, &mut n);
        let expected: Vec<(u16, u16, u16, u16)> = {
            let mut rects: Vec<_> = flatten(&tree)
                .iter()
                .map(|p| (p.left, p.top, p.width, p.height))
                .collect();
            rects.sort_unstable();
            rects
        };

        let state = TabState {
            title: String::new(),
            is_active: false,
            is_zoomed: false,
            pane_tree: tree,
        };

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let replayed = runtime.block_on(async {
            let mock = MockMux::new();
            let window = mock.add_window("default", "");
            let tab = mock.add_tab(window, "", cols, rows);
            let root = mock.add_pane(
                tab,
                PaneSeed {
                    cwd: state.pane_tree.cwd.clone(),
                    ..PaneSeed::at(0, 0, cols, rows)
                },
            );

            let dir = tempfile::tempdir().unwrap();
            let config = ResurrectConfig {
                state_dir: dir.path().to_path_buf(),
                ..ResurrectConfig::default()
            };
            let manager = StateManager::new(mock.handle(), config, Arc::new(EventBus::new()));
            let opts = RestoreOptions {
                sizing: SizingMode::Absolute,
                restore_text: false,
                ..RestoreOptions::default()
            };
            manager
                .restore_tab(&mock.tab_handle(tab), Some(mock.pane_handle(root)), &state, &opts)
                .await
                .unwrap();

            let mut rects: Vec<_> = mock
                .tab_pane_rects(tab)
                .iter()
                .map(|r| (r.left, r.top, r.width, r.height))
                .collect();
            rects.sort_unstable();
            rects
        });

        prop_assert_eq!(replayed, expected);
    }
}

// =============================================================================
// Warnings
// =============================================================================

proptest! {
    #[test]
    fn one_warning_per_distinct_non_spawnable_domain(
        domains in proptest::collection::vec("[a-z]{1,6}", 1..8),
        spawnable_mask in proptest::collection::vec(any::<bool>(), 8),
    ) {
        let panes: Vec<RawPane> = domains
            .iter()
            .enumerate()
            .map(|(i, domain)| RawPane {
                left: (i as u16) * 30,
                top: 0,
                width: 29,
                height: 40,
                domain: domain.clone(),
                is_spawnable: spawnable_mask[i % spawnable_mask.len()],
                ..RawPane::default()
            })
            .collect();

        let (_, warnings) = build(&panes);

        let mut expected: Vec<&String> = panes
            .iter()
            .filter(|p| !p.is_spawnable)
            .map(|p| &p.domain)
            .collect();
        expected.sort();
        expected.dedup();

        prop_assert_eq!(warnings.len(), expected.len());
        for domain in expected {
            prop_assert!(warnings.iter().any(|w| w.contains(domain.as_str())));
        }
    }
}

// =============================================================================
// Traversals
// =============================================================================

proptest! {
    #[test]
    fn fold_counts_match_pane_count(
        choices in arb_choices(),
        (cols, rows) in arb_tab_size(),
    ) {
        let mut n = 0;
        let tree = gen_tree(0, 0, cols, rows, &mut Choices::new(&choices), 4, true, true, &mut n);
        let folded = fold(Some(&tree), 0usize, &mut |acc, _| acc + 1);
        prop_assert_eq!(folded, tree.pane_count());
        prop_assert_eq!(folded, flatten(&tree).len());
    }

    #[test]
    fn map_identity_preserves_tree(
        choices in arb_choices(),
        (cols, rows) in arb_tab_size(),
    ) {
        let mut n = 0;
        let tree = gen_tree(0, 0, cols, rows, &mut Choices::new(&choices), 4, true, true, &mut n);
        let mapped = map(Some(&tree), &mut |node| node.clone());
        prop_assert_eq!(mapped.as_ref(), Some(&tree));
    }
}
