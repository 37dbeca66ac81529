//! Property-based tests for persistence: filename sanitization and the
//! state round trip.
//!
//! Validates:
//! 1. `sanitize_filename` is total: every input yields a non-empty stem
//!    free of separators, reserved characters, control bytes, `..`, and
//!    trailing dot/space.
//! 2. `sanitize_filename` is idempotent.
//! 3. `parse(encode(state)) == state` for arbitrary state trees.
//! 4. Write/read through the store preserves states for arbitrary names.

use std::sync::Arc;

use proptest::prelude::*;

use resurrect_core::events::EventBus;
use resurrect_core::file_io::{sanitize_filename, StateStore};
use resurrect_core::mux::ScreenSize;
use resurrect_core::pane_tree::PaneNode;
use resurrect_core::state::{SavedState, StateType, TabState, WindowState, WorkspaceState};

// =============================================================================
// Strategies
// =============================================================================

/// Arbitrary strings including separators, reserved and control characters.
fn arb_name() -> impl Strategy<Value = String> {
    proptest::collection::vec(
        prop_oneof![
            // Printable ASCII including all the characters the sanitizer
            // has opinions about.
            proptest::char::range(' ', '~'),
            Just('/'),
            Just('\\'),
            Just('.'),
            Just('\u{0}'),
            Just('\u{1f}'),
            Just('\u{7f}'),
            // Some non-ASCII.
            Just('ä'),
            Just('日'),
        ],
        0..24,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

fn arb_leaf() -> impl Strategy<Value = PaneNode> {
    (
        0u16..200,
        0u16..100,
        1u16..160,
        1u16..60,
        "[ -~]{0,20}",
        proptest::option::of("[a-z:]{1,12}"),
        "[ -~]{0,40}",
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(
            |(left, top, width, height, cwd, domain, text, is_active, is_zoomed, alt)| PaneNode {
                left,
                top,
                width,
                height,
                cwd,
                domain,
                text,
                process: None,
                is_active,
                is_zoomed,
                alt_screen_active: alt,
                right: None,
                bottom: None,
            },
        )
}

fn arb_tree() -> impl Strategy<Value = PaneNode> {
    arb_leaf().prop_recursive(3, 16, 2, |inner| {
        (
            arb_leaf(),
            proptest::option::of(inner.clone()),
            proptest::option::of(inner),
        )
            .prop_map(|(mut node, right, bottom)| {
                node.right = right.map(Box::new);
                node.bottom = bottom.map(Box::new);
                node
            })
    })
}

fn arb_workspace_state() -> impl Strategy<Value = WorkspaceState> {
    (
        "[a-zA-Z0-9 _.-]{1,16}",
        proptest::collection::vec(
            (
                "[ -~]{0,16}",
                proptest::collection::vec(
                    ("[ -~]{0,16}", any::<bool>(), any::<bool>(), arb_tree()),
                    1..3,
                ),
            ),
            1..3,
        ),
    )
        .prop_map(|(workspace, windows)| WorkspaceState {
            workspace,
            window_states: windows
                .into_iter()
                .map(|(title, tabs)| WindowState {
                    title,
                    size: ScreenSize {
                        cols: 160,
                        rows: 48,
                        pixel_width: 1280,
                        pixel_height: 768,
                    },
                    tabs: tabs
                        .into_iter()
                        .map(|(title, is_active, is_zoomed, pane_tree)| TabState {
                            title,
                            is_active,
                            is_zoomed,
                            pane_tree,
                        })
                        .collect(),
                })
                .collect(),
        })
}

// =============================================================================
// Sanitizer
// =============================================================================

fn is_forbidden(c: char) -> bool {
    matches!(c, '/' | '\\' | '<' | '>' | ':' | '"' | '|' | '?' | '*')
        || (c as u32) < 0x20
        || c as u32 == 0x7f
}

proptest! {
    #[test]
    fn sanitize_is_total(name in arb_name()) {
        let out = sanitize_filename(&name);
        prop_assert!(!out.is_empty());
        prop_assert!(!out.chars().any(is_forbidden), "forbidden char in {out:?}");
        prop_assert!(!out.contains(".."), "traversal survived in {out:?}");
        prop_assert!(!out.ends_with('.') && !out.ends_with(' '), "bad tail in {out:?}");
    }

    #[test]
    fn sanitize_is_idempotent(name in arb_name()) {
        let once = sanitize_filename(&name);
        let twice = sanitize_filename(&once);
        prop_assert_eq!(once, twice);
    }
}

// =============================================================================
// State round trips
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn encode_decode_roundtrip(state in arb_workspace_state()) {
        let saved = SavedState::Workspace(state);
        let json = saved.to_json().unwrap();
        let back = SavedState::from_json(&json).unwrap();
        prop_assert_eq!(back, saved);
    }

    #[test]
    fn store_roundtrip_arbitrary_names(
        name in "[ -~]{1,24}",
        state in arb_workspace_state(),
    ) {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path(), Arc::new(EventBus::new()));

        let mut state = state;
        state.workspace = name.clone();
        let saved = SavedState::Workspace(state);

        match store.write_state(&saved) {
            Ok(path) => {
                prop_assert!(path.is_file());
                let back = store.read_state(&name, StateType::Workspace);
                prop_assert_eq!(back, Some(saved));
            }
            // Names that sanitize to nothing usable still must not panic;
            // the only acceptable failure is an unresolvable name.
            Err(e) => prop_assert!(
                matches!(e, resurrect_core::Error::NameUnresolved(_)),
                "unexpected error: {e}"
            ),
        }
    }
}
