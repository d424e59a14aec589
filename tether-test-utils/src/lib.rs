//! TETHER Test Utilities
//!
//! Centralized test infrastructure for the TETHER workspace:
//! - Fixtures wiring owner/child models onto a shared mock store
//! - Recording lifecycle hooks for observing saves and destroys
//! - Proptest generators for attributes and finder names

// Re-export mock store from its source crate
pub use tether_storage::{DocumentStore, LifecycleHooks, MockStore, MockStoreStats, Model};

// Re-export core types for convenience
pub use tether_core::{
    id_value, Attributes, Conditions, Document, DocumentId, FindOptions, Finder, Found,
    PageRequest, TetherError, TetherResult,
};

use serde_json::Value;
use std::sync::{Arc, Mutex};

/// Turn a JSON object literal into an attribute map. Non-objects give an
/// empty map.
pub fn attrs(value: Value) -> Attributes {
    match value {
        Value::Object(map) => map,
        _ => Attributes::new(),
    }
}

// ============================================================================
// RECORDING HOOKS
// ============================================================================

/// Lifecycle step observed by [`RecordingHooks`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    Saved,
    Destroyed,
}

/// One observed lifecycle step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookEvent {
    pub model: String,
    pub kind: HookKind,
    pub id: Option<DocumentId>,
}

/// Ordered log shared by several models' hooks.
#[derive(Debug, Default)]
pub struct HookLog {
    events: Mutex<Vec<HookEvent>>,
}

impl HookLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<HookEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Events of one kind, in order.
    pub fn of_kind(&self, kind: HookKind) -> Vec<HookEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.kind == kind)
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }

    fn push(&self, event: HookEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Hooks that append every save and destroy to a [`HookLog`].
#[derive(Debug, Clone)]
pub struct RecordingHooks {
    model: String,
    log: Arc<HookLog>,
}

impl RecordingHooks {
    pub fn new(model: impl Into<String>, log: Arc<HookLog>) -> Self {
        Self {
            model: model.into(),
            log,
        }
    }
}

impl LifecycleHooks for RecordingHooks {
    fn after_save(&self, doc: &Document) {
        self.log.push(HookEvent {
            model: self.model.clone(),
            kind: HookKind::Saved,
            id: doc.id(),
        });
    }

    fn after_destroy(&self, doc: &Document) {
        self.log.push(HookEvent {
            model: self.model.clone(),
            kind: HookKind::Destroyed,
            id: doc.id(),
        });
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

/// A `Room` owner model and a `Message` child model sharing one mock store
/// and one hook log.
#[derive(Debug, Clone)]
pub struct RoomFixture {
    pub store: Arc<MockStore>,
    pub log: Arc<HookLog>,
    pub rooms: Model,
    pub messages: Model,
}

impl RoomFixture {
    pub fn new() -> Self {
        let store = Arc::new(MockStore::new());
        let log = HookLog::new();
        let rooms = Model::new("Room", "rooms", store.clone())
            .with_hooks(Arc::new(RecordingHooks::new("Room", log.clone())));
        let messages = Model::new("Message", "messages", store.clone())
            .with_hooks(Arc::new(RecordingHooks::new("Message", log.clone())));
        Self {
            store,
            log,
            rooms,
            messages,
        }
    }

    /// A saved room.
    pub fn saved_room(&self, name: &str) -> TetherResult<Document> {
        self.rooms.create(attrs(serde_json::json!({ "name": name })))
    }

    /// An unsaved room.
    pub fn new_room(&self, name: &str) -> Document {
        self.rooms.build(attrs(serde_json::json!({ "name": name })))
    }

    /// Messages stored for `room`, straight from the store.
    pub fn stored_messages(&self, room: &Document, foreign_key: &str) -> TetherResult<Vec<Document>> {
        let Some(id) = room.id() else {
            return Ok(Vec::new());
        };
        let options = FindOptions::new().where_eq(foreign_key, id_value(id));
        Ok(self.messages.find(&Finder::All, &options)?.into_many())
    }
}

impl Default for RoomFixture {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for documents and finder names.

    use super::*;
    use proptest::prelude::*;

    /// Attribute names without underscores or the `and` conjunction. `id`
    /// is excluded since it aliases the document id.
    pub fn arb_attribute_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9]{0,7}"
            .prop_filter("must not contain conjunction", |s| !s.contains("and"))
            .prop_filter("must not alias the id", |s| s != "id")
    }

    /// Scalar JSON values usable in equality conditions.
    pub fn arb_scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<i32>().prop_map(Value::from),
            "[a-zA-Z ]{0,12}".prop_map(Value::from),
            any::<bool>().prop_map(Value::from),
        ]
    }

    /// Attribute maps of up to `max` entries.
    pub fn arb_attributes(max: usize) -> impl Strategy<Value = Attributes> {
        prop::collection::btree_map(arb_attribute_name(), arb_scalar(), 0..=max)
            .prop_map(|map| map.into_iter().collect())
    }

    /// A dynamic finder name with its attribute list.
    pub fn arb_finder_name() -> impl Strategy<Value = (String, Vec<String>)> {
        (
            prop::sample::select(vec![
                "find_by_",
                "find_first_by_",
                "find_last_by_",
                "find_all_by_",
                "find_or_initialize_by_",
                "find_or_create_by_",
            ]),
            prop::collection::vec(arb_attribute_name(), 1..4),
        )
            .prop_map(|(prefix, names)| (format!("{}{}", prefix, names.join("_and_")), names))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attrs_from_non_object_is_empty() {
        assert!(attrs(json!([1, 2])).is_empty());
        assert_eq!(attrs(json!({"a": 1})).len(), 1);
    }

    #[test]
    fn test_fixture_records_saves_in_order() {
        let fixture = RoomFixture::new();
        let room = fixture.saved_room("lobby").unwrap();
        let message = fixture.messages.create(attrs(json!({"body": "hi"}))).unwrap();

        let saved = fixture.log.of_kind(HookKind::Saved);
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[0].model, "Room");
        assert_eq!(saved[0].id, room.id());
        assert_eq!(saved[1].model, "Message");
        assert_eq!(saved[1].id, message.id());
    }
}
