//! Property tests for the connection index: balance bound, ordering, and key
//! membership must hold after every operation in any insert/delete sequence.

use chrono::{NaiveDate, NaiveDateTime};
use proptest::prelude::*;
use std::collections::BTreeSet;

use connwatch::index::{self, Link};

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 8, 23)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

fn ip(octet: u8) -> String {
    format!("10.0.0.{octet}")
}

fn assert_ordered(root: &Link) {
    let keys: Vec<String> = index::inorder(root).into_iter().map(|e| e.ip).collect();
    for pair in keys.windows(2) {
        assert!(pair[0] < pair[1], "keys out of order: {pair:?}");
    }
}

proptest! {
    /// Arbitrary insert/delete sequences keep the tree balanced, ordered, and
    /// in agreement with a reference set of live keys.
    #[test]
    fn operations_preserve_balance_and_order(
        ops in prop::collection::vec((0u8..32, any::<bool>()), 1..120)
    ) {
        let mut root: Link = None;
        let mut live = BTreeSet::new();

        for (octet, is_insert) in ops {
            let key = ip(octet);
            if is_insert {
                root = index::insert(root, &key, now());
                live.insert(key);
            } else {
                root = index::delete(root, &key);
                live.remove(&key);
            }

            prop_assert!(index::is_balanced(&root));
            assert_ordered(&root);
            prop_assert_eq!(index::size(&root), live.len());
        }

        let keys: Vec<String> = index::inorder(&root).into_iter().map(|e| e.ip).collect();
        let expected: Vec<String> = live.into_iter().collect();
        prop_assert_eq!(keys, expected);
    }

    /// In-order traversal equals the lexicographically sorted key set for any
    /// insertion order of unique keys.
    #[test]
    fn inorder_matches_sorted_keys(octets in prop::collection::vec(0u8..=255, 1..80)) {
        let mut root: Link = None;
        for &octet in &octets {
            root = index::insert(root, &ip(octet), now());
        }

        let keys: Vec<String> = index::inorder(&root).into_iter().map(|e| e.ip).collect();
        let expected: Vec<String> = octets
            .iter()
            .map(|&octet| ip(octet))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        prop_assert_eq!(keys, expected);
    }

    /// Deleting one key never disturbs the others.
    #[test]
    fn delete_is_complete_and_isolated(
        octets in prop::collection::hash_set(0u8..64, 2..40),
        pick in any::<prop::sample::Index>(),
    ) {
        let keys: Vec<String> = octets.iter().map(|&octet| ip(octet)).collect();
        let victim = keys[pick.index(keys.len())].clone();

        let mut root: Link = None;
        for key in &keys {
            root = index::insert(root, key, now());
        }

        root = index::delete(root, &victim);

        prop_assert!(index::search(&root, &victim).is_none());
        prop_assert!(index::is_balanced(&root));
        for key in &keys {
            if *key != victim {
                prop_assert!(index::search(&root, key).is_some(), "lost key {}", key);
            }
        }
    }
}
