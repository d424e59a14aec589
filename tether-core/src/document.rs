//! Document and identity types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Document identifier using UUIDv7 for timestamp-sortable IDs.
pub type DocumentId = Uuid;

/// Attribute mapping of a document. Keys are attribute names.
pub type Attributes = serde_json::Map<String, Value>;

/// Caller-facing query conditions: attribute name to expected value.
pub type Conditions = serde_json::Map<String, Value>;

/// Generate a new UUIDv7 DocumentId (timestamp-sortable).
pub fn new_document_id() -> DocumentId {
    Uuid::now_v7()
}

/// JSON form of a document id, as stored in foreign-key attributes.
pub fn id_value(id: DocumentId) -> Value {
    Value::String(id.to_string())
}

/// A schemaless document held by a store collection.
///
/// Freshly built documents already carry an id (ids are generated client
/// side) but report `is_new()` until a store accepts them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_id")]
    id: Option<DocumentId>,
    #[serde(flatten)]
    attributes: Attributes,
    #[serde(skip)]
    new_record: bool,
}

impl Document {
    /// Build an unsaved document with a generated id.
    pub fn new(attributes: Attributes) -> Self {
        Self {
            id: Some(new_document_id()),
            attributes,
            new_record: true,
        }
    }

    /// Build an unsaved document that has no identity yet.
    pub fn unidentified(attributes: Attributes) -> Self {
        Self {
            id: None,
            attributes,
            new_record: true,
        }
    }

    /// Rehydrate a document read back from a store.
    pub fn persisted(id: DocumentId, attributes: Attributes) -> Self {
        Self {
            id: Some(id),
            attributes,
            new_record: false,
        }
    }

    pub fn id(&self) -> Option<DocumentId> {
        self.id
    }

    /// True until the document has been saved.
    pub fn is_new(&self) -> bool {
        self.new_record
    }

    /// Assign an id if the document has none, returning the id in use.
    pub fn ensure_id(&mut self) -> DocumentId {
        *self.id.get_or_insert_with(new_document_id)
    }

    pub fn mark_persisted(&mut self) {
        self.new_record = false;
    }

    /// Flag the document as unsaved again, e.g. after its stored copy was
    /// removed. The id is kept, so the next save re-inserts it.
    pub fn mark_new(&mut self) {
        self.new_record = true;
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Read an attribute. `_id` and `id` resolve to the document id.
    pub fn get(&self, name: &str) -> Option<Value> {
        match name {
            "_id" | "id" => self.id.map(id_value),
            _ => self.attributes.get(name).cloned(),
        }
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.attributes.insert(name.into(), value);
    }

    /// Overwrite each given attribute, leaving the rest untouched.
    pub fn assign(&mut self, attributes: Attributes) {
        for (name, value) in attributes {
            self.attributes.insert(name, value);
        }
    }
}
