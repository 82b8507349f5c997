use proptest::prelude::*;
use pressroom_core::{GroupAllowList, KeyBuilder};

// Components never contain the separator; keys built from them are unambiguous.
fn component() -> impl Strategy<Value = String> {
    "[a-z0-9_-]{0,16}"
}

proptest! {
    #[test]
    fn build_is_deterministic(prefix in component(), group in component(), item in component()) {
        let keys = KeyBuilder::new(prefix);
        prop_assert_eq!(keys.build(&group, &item), keys.build(&group, &item));
    }

    #[test]
    fn build_is_injective_per_pair(
        group_a in component(),
        item_a in component(),
        group_b in component(),
        item_b in component(),
    ) {
        prop_assume!((&group_a, &item_a) != (&group_b, &item_b));

        let keys = KeyBuilder::new("site");
        prop_assert_ne!(keys.build(&group_a, &item_a), keys.build(&group_b, &item_b));
    }

    #[test]
    fn build_preserves_prefix(prefix in component(), group in component(), item in component()) {
        let keys = KeyBuilder::new(prefix.clone());
        let key = keys.build(&group, &item);

        let expected_start = format!("{}:", prefix);
        prop_assert!(key.as_str().starts_with(&expected_start));
    }

    #[test]
    fn group_pattern_matches_all_items(group in component(), item in component()) {
        let keys = KeyBuilder::new("site");
        let pattern = glob_pattern(&keys.group_pattern(&group));

        prop_assert!(pattern.matches(keys.build(&group, &item).as_str()));
    }
}

fn glob_pattern(raw: &str) -> glob::Pattern {
    glob::Pattern::new(raw).expect("group pattern should always be a valid glob")
}

#[test]
fn lowercasing_at_call_site_gives_lookup_delete_symmetry() {
    let keys = KeyBuilder::new("www");
    let groups = GroupAllowList::default();

    // Read path and invalidation path both normalize before building.
    let group = groups.resolve("Publications").unwrap();
    let read_key = keys.build(group.as_str(), &"Annual-Report".to_lowercase());
    let delete_key = keys.build("publications", "annual-report");

    assert_eq!(read_key, delete_key);
}
