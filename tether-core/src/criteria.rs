//! Translation of caller conditions into the store's native criteria.
//!
//! Conditions are what callers write (`{"id": x, "tag": ["a", "b"]}`);
//! criteria are what a store evaluates (`{"_id": x, "tag": {"$in": [...]}}`).
//! Translating criteria again is a no-op, so criteria may be fed back in
//! wherever conditions are accepted.

use crate::Conditions;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Key under which stores keep the document id.
pub const ID_KEY: &str = "_id";

/// Store-native query criteria.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Criteria(Map<String, Value>);

impl Criteria {
    /// Criteria matching every document.
    pub fn any() -> Self {
        Self::default()
    }

    /// Translate a conditions mapping into criteria.
    pub fn from_conditions(conditions: &Conditions) -> Self {
        let translated = conditions
            .iter()
            .map(|(key, value)| (normalize_key(key), normalize_value(value)))
            .collect();
        Self(translated)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Hand the translated mapping back as conditions.
    pub fn into_conditions(self) -> Conditions {
        self.0
    }
}

fn normalize_key(key: &str) -> String {
    if key == "id" {
        ID_KEY.to_string()
    } else {
        key.to_string()
    }
}

fn normalize_value(value: &Value) -> Value {
    match value {
        Value::Array(items) => json!({ "$in": items }),
        other => other.clone(),
    }
}

/// True when `value` is an operator mapping such as `{"$gt": 3}`.
pub fn is_operator_map(value: &Value) -> bool {
    match value {
        Value::Object(map) => !map.is_empty() && map.keys().all(|k| k.starts_with('$')),
        _ => false,
    }
}
