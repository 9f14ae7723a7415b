//! # Property-Based Tests
//!
//! Verification tests using proptest.
//!
//! These tests ensure determinism and allocation invariants.

use insepa_core::{
    BlockLifecycle, CbConfig, CbStatus, Namespace, NamespaceCursor, NamespaceRegistry, Passage,
    TextPool, TriggerSetMatcher, checksum, pool_from_json,
};
use proptest::collection::{btree_set, vec};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Reindex yields exactly 0..N-1, keeps relative order, never empties.
    #[test]
    fn reindex_dense_and_order_preserving(ids in btree_set(0u64..1000, 0..20)) {
        let namespaces: BTreeMap<u64, Namespace> = ids
            .iter()
            .map(|&id| (id, Namespace::new(id, format!("ns{id}"))))
            .collect();

        let registry = NamespaceRegistry::reindex(namespaces);
        let expected_len = ids.len().max(1);

        prop_assert_eq!(
            registry.ids().collect::<Vec<_>>(),
            (0..expected_len as u64).collect::<Vec<_>>()
        );

        if !ids.is_empty() {
            let names: Vec<String> = registry.iter().map(|(_, ns)| ns.name.clone()).collect();
            let expected: Vec<String> = ids.iter().map(|id| format!("ns{id}")).collect();
            prop_assert_eq!(names, expected);
        }
    }

    /// Same text always produces the same checksum.
    #[test]
    fn checksum_deterministic(text in "[A-Za-z0-9 .,;:!?-]{0,60}") {
        prop_assert_eq!(checksum(&text), checksum(&text));
        prop_assert_eq!(checksum(&text), checksum(&text.to_lowercase()));
    }

    /// Accented vowels weigh the same as their base letters.
    #[test]
    fn checksum_accent_insensitive(text in "[aeiouAEIOU ]{0,40}") {
        let accented: String = text
            .chars()
            .map(|c| match c {
                'a' => 'á',
                'e' => 'ê',
                'i' => 'í',
                'o' => 'õ',
                'u' => 'ü',
                'A' => 'Ã',
                'E' => 'É',
                'I' => 'Î',
                'O' => 'Ó',
                'U' => 'Ú',
                other => other,
            })
            .collect();

        prop_assert_eq!(checksum(&accented), checksum(&text));
    }

    /// The checksum of a concatenation is the sum of the parts.
    #[test]
    fn checksum_additive(a in "[A-Za-z0-9 .!?]{0,30}", b in "[A-Za-z0-9 .!?]{0,30}") {
        prop_assert_eq!(checksum(&format!("{a}{b}")), checksum(&a) + checksum(&b));
    }

    /// Each new block allocates strictly above every index already used,
    /// and the cursor lands on the block's last token.
    #[test]
    fn cursor_monotonic_without_overlap(
        texts in vec("[a-z]{1,8}( [a-z]{1,8}){0,4}[.?!]?", 1..12),
        context in "[a-z]{0,6}"
    ) {
        let mut namespace = Namespace::new(0, "Interações");
        let mut used = BTreeSet::new();

        for text in &texts {
            let before = NamespaceCursor::last_index(&namespace);
            let (block, last) =
                BlockLifecycle::open_block(0, &namespace, &Passage::new(text.as_str(), "", context.as_str()));

            for token in block.tokens() {
                prop_assert!(token.sequence > before);
                prop_assert!(used.insert(token.sequence), "index reused");
            }
            prop_assert_eq!(block.entrada.end.map(|t| t.sequence), Some(last));

            namespace.blocks.push(block);
            prop_assert_eq!(NamespaceCursor::last_index(&namespace), last);
        }
    }

    /// A legacy bare-string entry loads to the same tokens as a fresh ingest.
    #[test]
    fn legacy_pool_entry_matches_ingest(texts in vec("[A-Za-zÀ-ú ,.!?]{1,40}", 1..6)) {
        let json = serde_json::to_vec(&texts).expect("json");
        let (pool, _) = pool_from_json(&json).expect("load");

        for (index, text) in texts.iter().enumerate() {
            let fresh = TextPool::ingest(index + 1, text);
            prop_assert_eq!(pool.get(index + 1).expect("entry"), &fresh);
        }
    }

    /// The trigger window never exceeds the target size, only holds targets,
    /// and fires exactly when it covers the target set.
    #[test]
    fn trigger_window_invariants(
        bids in btree_set(1u64..10, 1..5),
        observations in vec(1u64..15, 0..40)
    ) {
        let target: Vec<u64> = bids.iter().copied().collect();
        let config = CbConfig::new(CbStatus::Enabled, target.clone());
        let mut matcher = TriggerSetMatcher::new();

        for block in observations {
            let before = matcher.sequence(0).to_vec();
            let fired = matcher.register(0, block, Some(&config));
            let window = matcher.sequence(0);

            if !bids.contains(&block) {
                prop_assert!(!fired);
                prop_assert_eq!(window, before.as_slice());
                continue;
            }

            prop_assert!(window.len() <= target.len());
            prop_assert!(window.iter().all(|id| bids.contains(id)));
            let seen: BTreeSet<u64> = window.iter().copied().collect();
            prop_assert_eq!(fired, seen == bids);
        }
    }
}
