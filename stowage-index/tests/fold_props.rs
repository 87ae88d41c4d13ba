//! Property tests for the pure fold and routing logic.

use proptest::prelude::*;
use std::collections::BTreeMap;
use stowage_index::{IndexEntry, Namespace, Patch, PatchAction, fold_patches};

fn entry(id: &str, splay: u8) -> IndexEntry {
    IndexEntry {
        prefix: "corpus".to_string(),
        item_type: "item".to_string(),
        id: id.to_string(),
        splay,
    }
}

fn to_patches(ops: &[(bool, String, u8)]) -> Vec<Patch> {
    ops.iter()
        .map(|(put, id, splay)| Patch {
            action: if *put {
                PatchAction::Put
            } else {
                PatchAction::Delete
            },
            data: entry(id, *splay),
        })
        .collect()
}

fn ops_strategy() -> impl Strategy<Value = Vec<(bool, String, u8)>> {
    prop::collection::vec((any::<bool>(), "[a-e]", 1u8..5), 0..40)
}

proptest! {
    #[test]
    fn folded_shard_never_duplicates_ids(ops in ops_strategy()) {
        let folded = fold_patches(Vec::new(), &to_patches(&ops));
        let mut ids: Vec<&str> = folded.iter().map(|e| e.id.as_str()).collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        prop_assert_eq!(total, ids.len());
    }

    // First-wins dedup makes the fold equivalent to replaying against a
    // map where PUT inserts only when the id is absent.
    #[test]
    fn fold_matches_an_insert_if_absent_replay(ops in ops_strategy()) {
        let folded = fold_patches(Vec::new(), &to_patches(&ops));

        let mut model: BTreeMap<String, u8> = BTreeMap::new();
        for (put, id, splay) in &ops {
            if *put {
                model.entry(id.clone()).or_insert(*splay);
            } else {
                model.remove(id);
            }
        }

        let mut got: Vec<(String, u8)> = folded
            .into_iter()
            .map(|e| (e.id, e.splay))
            .collect();
        got.sort();
        let want: Vec<(String, u8)> = model.into_iter().collect();
        prop_assert_eq!(got, want);
    }

    #[test]
    fn existing_entries_survive_unrelated_patches(ops in ops_strategy()) {
        let existing = vec![entry("z-resident", 7)];
        let folded = fold_patches(existing, &to_patches(&ops));
        // No generated id starts with 'z', so the resident entry stays.
        prop_assert!(folded.iter().any(|e| e.id == "z-resident" && e.splay == 7));
    }

    #[test]
    fn routing_ignores_id_case(id in "[a-zA-Z][a-zA-Z0-9_-]{0,12}") {
        let ns = Namespace::new("corpus", "item").unwrap();
        prop_assert_eq!(
            ns.shard_key(&id).unwrap(),
            ns.shard_key(&id.to_lowercase()).unwrap()
        );
    }

    #[test]
    fn namespace_normalization_is_idempotent(
        prefix in "[A-Za-z]{1,8}",
        item_type in "[A-Za-z]{1,8}",
    ) {
        let once = Namespace::new(&prefix, &item_type).unwrap();
        let twice = Namespace::new(once.prefix(), once.item_type()).unwrap();
        prop_assert_eq!(once, twice);
    }
}
