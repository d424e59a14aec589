//! Model handles: the query surface and persistence lifecycle of one
//! document type.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tether_core::{
    id_value, Attributes, Conditions, Criteria, Document, FindOptions, Finder, Found, Page,
    PageRequest, QueryError, TetherResult, ID_KEY,
};

use crate::{DocumentStore, StoreQuery};

/// Per-model lifecycle callbacks. `destroy` runs them; bulk deletes do not.
pub trait LifecycleHooks: Send + Sync {
    /// Runs before a document is written. An error aborts the save.
    fn before_save(&self, _doc: &Document) -> TetherResult<()> {
        Ok(())
    }

    fn after_save(&self, _doc: &Document) {}

    /// Runs before a document is removed. An error aborts the destroy.
    fn before_destroy(&self, _doc: &Document) -> TetherResult<()> {
        Ok(())
    }

    fn after_destroy(&self, _doc: &Document) {}
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl LifecycleHooks for NoHooks {}

/// A document type bound to a store collection.
#[derive(Clone)]
pub struct Model {
    name: String,
    collection: String,
    store: Arc<dyn DocumentStore>,
    hooks: Arc<dyn LifecycleHooks>,
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name)
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

impl Model {
    /// `name` is the type name (`Blog::Post`); `collection` the store
    /// collection holding its documents.
    pub fn new(
        name: impl Into<String>,
        collection: impl Into<String>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            name: name.into(),
            collection: collection.into(),
            store,
            hooks: Arc::new(NoHooks),
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn LifecycleHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn collection_name(&self) -> &str {
        &self.collection
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    // === Construction ===

    /// Build an unsaved document.
    pub fn build(&self, attributes: Attributes) -> Document {
        Document::new(attributes)
    }

    /// Build and save a document.
    pub fn create(&self, attributes: Attributes) -> TetherResult<Document> {
        let mut doc = self.build(attributes);
        self.save(&mut doc)?;
        Ok(doc)
    }

    // === Queries ===

    /// Generic finder. `Id`/`Ids` are strict and fail with
    /// [`QueryError::DocumentNotFound`] when any id is missing.
    pub fn find(&self, finder: &Finder, options: &FindOptions) -> TetherResult<Found> {
        let mut query = self.store_query(options)?;
        match finder {
            Finder::First => {
                query.limit = Some(query.limit.map_or(1, |limit| limit.min(1)));
                let docs = self.run(&query)?;
                Ok(Found::One(docs.into_iter().next()))
            }
            Finder::Last => {
                let docs = self.run(&query)?;
                Ok(Found::One(docs.into_iter().last()))
            }
            Finder::All => Ok(Found::Many(self.run(&query)?)),
            Finder::Id(id) => {
                let mut conditions = without_id_conditions(&options.conditions);
                conditions.insert(ID_KEY.to_string(), id_value(*id));
                query.criteria = Criteria::from_conditions(&conditions);
                match self.run(&query)?.into_iter().next() {
                    Some(doc) => Ok(Found::One(Some(doc))),
                    None => Err(self.not_found(conditions).into()),
                }
            }
            Finder::Ids(ids) => {
                let mut conditions = without_id_conditions(&options.conditions);
                let wanted: Vec<Value> = ids.iter().copied().map(id_value).collect();
                conditions.insert(ID_KEY.to_string(), Value::Array(wanted));
                query.criteria = Criteria::from_conditions(&conditions);
                let docs = self.run(&query)?;
                let all_found = ids
                    .iter()
                    .all(|id| docs.iter().any(|doc| doc.id() == Some(*id)));
                if all_found {
                    Ok(Found::Many(docs))
                } else {
                    Err(self.not_found(conditions).into())
                }
            }
        }
    }

    pub fn count(&self, conditions: &Conditions) -> TetherResult<u64> {
        let criteria = Criteria::from_conditions(conditions);
        tracing::trace!(model = %self.name, ?criteria, "count");
        self.store.count(&self.collection, &criteria)
    }

    /// Bulk delete. Lifecycle hooks are not run.
    pub fn delete_all(&self, conditions: &Conditions) -> TetherResult<u64> {
        let criteria = Criteria::from_conditions(conditions);
        tracing::trace!(model = %self.name, ?criteria, "delete_all");
        self.store.delete_all(&self.collection, &criteria)
    }

    /// One page of the documents matching `options`. The page request
    /// overrides any skip/limit in `options`.
    pub fn paginate(&self, options: &FindOptions, request: PageRequest) -> TetherResult<Page> {
        request.validate()?;
        let total_entries = self.count(&options.conditions)?;
        let mut query = self.store_query(options)?;
        query.skip = Some(usize::try_from(request.offset()).unwrap_or(usize::MAX));
        query.limit = Some(usize::try_from(request.per_page).unwrap_or(usize::MAX));
        let items = self.run(&query)?;
        Ok(Page {
            items,
            page: request.page,
            per_page: request.per_page,
            total_entries,
        })
    }

    // === Lifecycle ===

    /// Insert a new document or replace a persisted one.
    pub fn save(&self, doc: &mut Document) -> TetherResult<()> {
        self.hooks.before_save(doc)?;
        let id = doc.ensure_id();
        if doc.is_new() {
            tracing::trace!(model = %self.name, %id, "insert");
            self.store.insert(&self.collection, doc)?;
            doc.mark_persisted();
        } else {
            tracing::trace!(model = %self.name, %id, "update");
            self.store.update(&self.collection, doc)?;
        }
        self.hooks.after_save(doc);
        Ok(())
    }

    /// Remove a document, running the destroy hooks. Unsaved documents are
    /// not sent to the store.
    pub fn destroy(&self, doc: &Document) -> TetherResult<()> {
        self.hooks.before_destroy(doc)?;
        if let (Some(id), false) = (doc.id(), doc.is_new()) {
            tracing::trace!(model = %self.name, %id, "remove");
            self.store.remove(&self.collection, id)?;
        }
        self.hooks.after_destroy(doc);
        Ok(())
    }

    /// Assign the given attributes and save.
    pub fn update_attributes(&self, doc: &mut Document, attributes: Attributes) -> TetherResult<()> {
        doc.assign(attributes);
        self.save(doc)
    }

    fn store_query(&self, options: &FindOptions) -> TetherResult<StoreQuery> {
        Ok(StoreQuery {
            criteria: Criteria::from_conditions(&options.conditions),
            sort: options.sort_keys()?,
            skip: options.skip,
            limit: options.limit,
            fields: options.fields.clone(),
        })
    }

    fn run(&self, query: &StoreQuery) -> TetherResult<Vec<Document>> {
        tracing::trace!(model = %self.name, criteria = ?query.criteria, "find");
        self.store.find(&self.collection, query)
    }

    fn not_found(&self, conditions: Conditions) -> QueryError {
        QueryError::DocumentNotFound {
            collection: self.collection.clone(),
            conditions: Value::Object(conditions),
        }
    }
}

/// Caller conditions minus any id constraint; id lookups own that key.
fn without_id_conditions(conditions: &Conditions) -> Conditions {
    conditions
        .iter()
        .filter(|(key, _)| key.as_str() != "id" && key.as_str() != ID_KEY)
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
