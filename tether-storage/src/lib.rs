//! TETHER Storage - Store Trait and Mock Implementation
//!
//! Defines the document store abstraction that models persist through,
//! plus an in-memory implementation used by tests and examples.

pub mod matcher;
pub mod model;

pub use model::{LifecycleHooks, Model, NoHooks};

use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tether_core::{
    Attributes, Criteria, Document, DocumentId, SortKey, StorageError, TetherResult,
};

// ============================================================================
// QUERY TYPES
// ============================================================================

/// A fully translated query against one collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreQuery {
    pub criteria: Criteria,
    pub sort: Vec<SortKey>,
    pub skip: Option<usize>,
    pub limit: Option<usize>,
    /// Attribute projection; the id is always returned.
    pub fields: Option<Vec<String>>,
}

impl StoreQuery {
    pub fn new(criteria: Criteria) -> Self {
        Self {
            criteria,
            ..Self::default()
        }
    }
}

// ============================================================================
// STORE TRAIT
// ============================================================================

/// Store trait for schemaless documents grouped in named collections.
/// Every call is one synchronous round-trip.
pub trait DocumentStore: Send + Sync {
    /// Insert a new document. Fails if the id is already taken.
    fn insert(&self, collection: &str, doc: &Document) -> TetherResult<()>;

    /// Replace a stored document by id.
    fn update(&self, collection: &str, doc: &Document) -> TetherResult<()>;

    /// Remove one document by id.
    fn remove(&self, collection: &str, id: DocumentId) -> TetherResult<()>;

    /// Run a query. Results follow `query.sort`, then insertion order.
    fn find(&self, collection: &str, query: &StoreQuery) -> TetherResult<Vec<Document>>;

    /// Count documents matching the criteria.
    fn count(&self, collection: &str, criteria: &Criteria) -> TetherResult<u64>;

    /// Remove every matching document in one call, returning how many.
    fn delete_all(&self, collection: &str, criteria: &Criteria) -> TetherResult<u64>;
}

// ============================================================================
// MOCK STORE
// ============================================================================

/// Round-trip counters of a [`MockStore`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MockStoreStats {
    pub inserts: u64,
    pub updates: u64,
    pub removes: u64,
    pub finds: u64,
    pub counts: u64,
    pub bulk_deletes: u64,
}

#[derive(Debug, Default)]
struct Counters {
    inserts: AtomicU64,
    updates: AtomicU64,
    removes: AtomicU64,
    finds: AtomicU64,
    counts: AtomicU64,
    bulk_deletes: AtomicU64,
}

type Collection = IndexMap<DocumentId, Attributes>;

/// In-memory store for testing. Collections keep insertion order.
#[derive(Debug, Default)]
pub struct MockStore {
    collections: Arc<RwLock<HashMap<String, Collection>>>,
    counters: Counters,
}

impl MockStore {
    /// Create a new mock store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all stored data.
    pub fn clear(&self) -> TetherResult<()> {
        self.collections
            .write()
            .map_err(|_| StorageError::LockPoisoned)?
            .clear();
        Ok(())
    }

    /// Number of documents in a collection.
    pub fn len(&self, collection: &str) -> TetherResult<usize> {
        let collections = self
            .collections
            .read()
            .map_err(|_| StorageError::LockPoisoned)?;
        Ok(collections.get(collection).map_or(0, IndexMap::len))
    }

    /// Raw lookup by id, bypassing criteria.
    pub fn get(&self, collection: &str, id: DocumentId) -> TetherResult<Option<Document>> {
        let collections = self
            .collections
            .read()
            .map_err(|_| StorageError::LockPoisoned)?;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(&id))
            .map(|attrs| Document::persisted(id, attrs.clone())))
    }

    /// Snapshot of the round-trip counters.
    pub fn stats(&self) -> MockStoreStats {
        MockStoreStats {
            inserts: self.counters.inserts.load(Ordering::Relaxed),
            updates: self.counters.updates.load(Ordering::Relaxed),
            removes: self.counters.removes.load(Ordering::Relaxed),
            finds: self.counters.finds.load(Ordering::Relaxed),
            counts: self.counters.counts.load(Ordering::Relaxed),
            bulk_deletes: self.counters.bulk_deletes.load(Ordering::Relaxed),
        }
    }

    fn matching(docs: &Collection, criteria: &Criteria) -> Vec<Document> {
        docs.iter()
            .map(|(id, attrs)| Document::persisted(*id, attrs.clone()))
            .filter(|doc| matcher::matches(doc, criteria))
            .collect()
    }
}

fn project(doc: Document, fields: &Option<Vec<String>>) -> Document {
    let Some(fields) = fields else {
        return doc;
    };
    let attributes = doc
        .attributes()
        .iter()
        .filter(|(name, _)| fields.iter().any(|f| f == *name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    match doc.id() {
        Some(id) => Document::persisted(id, attributes),
        None => doc,
    }
}

impl DocumentStore for MockStore {
    fn insert(&self, collection: &str, doc: &Document) -> TetherResult<()> {
        self.counters.inserts.fetch_add(1, Ordering::Relaxed);
        let id = doc.id().ok_or_else(|| StorageError::InsertFailed {
            collection: collection.to_string(),
            reason: "document has no id".to_string(),
        })?;
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.contains_key(&id) {
            return Err(StorageError::InsertFailed {
                collection: collection.to_string(),
                reason: format!("duplicate _id: {}", id),
            }
            .into());
        }
        docs.insert(id, doc.attributes().clone());
        Ok(())
    }

    fn update(&self, collection: &str, doc: &Document) -> TetherResult<()> {
        self.counters.updates.fetch_add(1, Ordering::Relaxed);
        let id = doc.id().ok_or_else(|| StorageError::UpdateFailed {
            collection: collection.to_string(),
            reason: "document has no id".to_string(),
        })?;
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        let stored = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(&id))
            .ok_or_else(|| StorageError::NotFound {
                collection: collection.to_string(),
                id,
            })?;
        *stored = doc.attributes().clone();
        Ok(())
    }

    fn remove(&self, collection: &str, id: DocumentId) -> TetherResult<()> {
        self.counters.removes.fetch_add(1, Ordering::Relaxed);
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        let removed = collections
            .get_mut(collection)
            .and_then(|docs| docs.shift_remove(&id));
        match removed {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound {
                collection: collection.to_string(),
                id,
            }
            .into()),
        }
    }

    fn find(&self, collection: &str, query: &StoreQuery) -> TetherResult<Vec<Document>> {
        self.counters.finds.fetch_add(1, Ordering::Relaxed);
        let collections = self
            .collections
            .read()
            .map_err(|_| StorageError::LockPoisoned)?;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut results = Self::matching(docs, &query.criteria);
        if !query.sort.is_empty() {
            // stable sort keeps insertion order among equal keys
            results.sort_by(|a, b| matcher::compare_documents(a, b, &query.sort));
        }

        Ok(results
            .into_iter()
            .skip(query.skip.unwrap_or(0))
            .take(query.limit.unwrap_or(usize::MAX))
            .map(|doc| project(doc, &query.fields))
            .collect())
    }

    fn count(&self, collection: &str, criteria: &Criteria) -> TetherResult<u64> {
        self.counters.counts.fetch_add(1, Ordering::Relaxed);
        let collections = self
            .collections
            .read()
            .map_err(|_| StorageError::LockPoisoned)?;
        Ok(collections
            .get(collection)
            .map_or(0, |docs| Self::matching(docs, criteria).len() as u64))
    }

    fn delete_all(&self, collection: &str, criteria: &Criteria) -> TetherResult<u64> {
        self.counters.bulk_deletes.fetch_add(1, Ordering::Relaxed);
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|id, attrs| {
            let doc = Document::persisted(*id, attrs.clone());
            !matcher::matches(&doc, criteria)
        });
        Ok((before - docs.len()) as u64)
    }
}

// ============================================================================
// TESTS
// ============================================================================


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
