//! Merging caller input with the enforced scope.
//!
//! Reads merge the scope under the options' `conditions`; bulk calls merge
//! it straight into the caller's conditions. Both let the scope win.

use tether_core::{deep_merge, Conditions, FindOptions};

/// Options for `find`/`all`/`first`/`last`/`paginate`: caller options with
/// `{conditions: scope}` deep-merged over them.
pub fn scoped_options(options: FindOptions, scope: &Conditions) -> FindOptions {
    options.merge(FindOptions::with_conditions(scope.clone()))
}

/// Conditions for `count`/`delete_all`: the caller's conditions with the
/// scope deep-merged over them.
pub fn scoped_bulk_conditions(mut conditions: Conditions, scope: &Conditions) -> Conditions {
    deep_merge(&mut conditions, scope.clone());
    conditions
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn map(value: Value) -> Conditions {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_scoped_options_scope_wins_others_pass_through() {
        let scope = map(json!({"room_id": "mine"}));
        let options = FindOptions::with_conditions(map(json!({"room_id": "theirs", "body": "hi"})))
            .order("body desc")
            .limit(4);

        let scoped = scoped_options(options, &scope);
        assert_eq!(
            Value::Object(scoped.conditions),
            json!({"room_id": "mine", "body": "hi"})
        );
        assert_eq!(scoped.order.as_deref(), Some("body desc"));
        assert_eq!(scoped.limit, Some(4));
    }

    #[test]
    fn test_scoped_options_is_idempotent() {
        let scope = map(json!({"room_id": "mine"}));
        let once = scoped_options(FindOptions::new(), &scope);
        let twice = scoped_options(once.clone(), &scope);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_bulk_conditions_scope_wins() {
        let scope = map(json!({"room_id": "mine"}));
        let merged = scoped_bulk_conditions(map(json!({"room_id": {"$ne": null}, "x": 1})), &scope);
        assert_eq!(Value::Object(merged), json!({"room_id": "mine", "x": 1}));
    }
}
