//! Recursive mapping merge.

use serde_json::{Map, Value};

/// Merge `right` into `left`. Where both sides hold an object under the same
/// key the objects are merged recursively; otherwise the value from `right`
/// replaces the one in `left`.
pub fn deep_merge(left: &mut Map<String, Value>, right: Map<String, Value>) {
    for (key, incoming) in right {
        match (left.get_mut(&key), incoming) {
            (Some(Value::Object(existing)), Value::Object(nested)) => {
                deep_merge(existing, nested);
            }
            (_, incoming) => {
                left.insert(key, incoming);
            }
        }
    }
}

/// Owned variant of [`deep_merge`].
pub fn deep_merged(mut left: Map<String, Value>, right: Map<String, Value>) -> Map<String, Value> {
    deep_merge(&mut left, right);
    left
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_flat_map() -> impl Strategy<Value = Map<String, Value>> {
        prop::collection::btree_map("[a-d]", any::<i64>(), 0..5)
            .prop_map(|m| m.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Every key of the right side ends up with the right side's value.
        #[test]
        fn prop_right_side_always_wins(left in arb_flat_map(), right in arb_flat_map()) {
            let merged = deep_merged(left.clone(), right.clone());
            for (key, value) in &right {
                prop_assert_eq!(merged.get(key), Some(value));
            }
            for (key, value) in &left {
                if !right.contains_key(key) {
                    prop_assert_eq!(merged.get(key), Some(value));
                }
            }
        }
    }
}
