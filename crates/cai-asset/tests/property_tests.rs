use std::collections::{BTreeMap, BTreeSet};

use cai_asset::{IamBinding, merge_additive_bindings, merge_delete_additive_bindings};
use proptest::prelude::*;

/// Well-formed binding lists: distinct roles, distinct non-empty members.
fn binding_list() -> impl Strategy<Value = Vec<IamBinding>> {
    prop::collection::btree_map(
        "role-[a-e]",
        prop::collection::btree_set("member-[a-h]", 1..4),
        0..4,
    )
    .prop_map(|roles| {
        roles
            .into_iter()
            .map(|(role, members)| IamBinding::new(role, members))
            .collect()
    })
}

fn as_sets(bindings: &[IamBinding]) -> BTreeMap<String, BTreeSet<String>> {
    bindings
        .iter()
        .map(|b| (b.role.clone(), b.members.iter().cloned().collect()))
        .collect()
}

proptest! {
    #[test]
    fn test_additive_merge_is_idempotent(existing in binding_list(), incoming in binding_list()) {
        let once = merge_additive_bindings(&existing, &incoming);
        let twice = merge_additive_bindings(&once, &incoming);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn test_delete_additive_undoes_additive(existing in binding_list(), incoming in binding_list()) {
        // Members already granted by `existing` are also removed by the delete,
        // so only pairs unique to `incoming` are reverted exactly.
        let incoming: Vec<IamBinding> = incoming
            .into_iter()
            .filter_map(|b| {
                let granted = as_sets(&existing).remove(&b.role).unwrap_or_default();
                let members: Vec<String> =
                    b.members.into_iter().filter(|m| !granted.contains(m)).collect();
                (!members.is_empty()).then(|| IamBinding { role: b.role, members })
            })
            .collect();

        let added = merge_additive_bindings(&existing, &incoming);
        let restored = merge_delete_additive_bindings(&added, &incoming);
        prop_assert_eq!(as_sets(&restored), as_sets(&existing));
    }

    #[test]
    fn test_additive_result_contains_both_sides(existing in binding_list(), incoming in binding_list()) {
        let merged = as_sets(&merge_additive_bindings(&existing, &incoming));
        for binding in existing.iter().chain(&incoming) {
            let members = &merged[&binding.role];
            prop_assert!(binding.members.iter().all(|m| members.contains(m)));
        }
    }

    #[test]
    fn test_delete_additive_never_leaves_empty_roles(existing in binding_list(), incoming in binding_list()) {
        let merged = merge_delete_additive_bindings(&existing, &incoming);
        prop_assert!(merged.iter().all(|b| !b.members.is_empty()));
    }
}
