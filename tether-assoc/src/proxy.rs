//! Collection proxy over the children of one owner.
//!
//! Every read is pinned to `{foreign_key: owner.id}`, every write stamps
//! that key onto the child, and every mutation drops the loaded target so
//! the next read goes back to the store.

use std::collections::HashSet;

use serde_json::Value;
use tether_core::{
    id_value, AssociationError, Attributes, Conditions, Criteria, Document, DocumentId,
    FindOptions, Finder, Found, Page, PageRequest, QueryError, TetherResult,
};
use tether_storage::Model;

use crate::association::ManyAssociation;
use crate::cache::TargetCache;
use crate::finder::{DynamicFinder, Instantiator};
use crate::merge::{scoped_bulk_conditions, scoped_options};
use crate::scope::scoped_conditions;

/// One or more documents, possibly nested, accepted by [`ManyDocumentsProxy::push`].
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentBatch {
    One(Document),
    Many(Vec<DocumentBatch>),
}

impl DocumentBatch {
    /// Flatten to documents in depth-first order.
    pub fn flatten(self) -> Vec<Document> {
        let mut out = Vec::new();
        self.flatten_into(&mut out);
        out
    }

    fn flatten_into(self, out: &mut Vec<Document>) {
        match self {
            DocumentBatch::One(doc) => out.push(doc),
            DocumentBatch::Many(batches) => {
                for batch in batches {
                    batch.flatten_into(out);
                }
            }
        }
    }
}

impl From<Document> for DocumentBatch {
    fn from(doc: Document) -> Self {
        DocumentBatch::One(doc)
    }
}

impl<T: Into<DocumentBatch>> From<Vec<T>> for DocumentBatch {
    fn from(items: Vec<T>) -> Self {
        DocumentBatch::Many(items.into_iter().map(Into::into).collect())
    }
}

/// Reads routed by name through [`ManyDocumentsProxy::call`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyCall {
    All,
    First,
    Last,
    Dynamic(DynamicFinder),
}

impl ProxyCall {
    /// Fixed names first, then the dynamic finder grammar.
    pub fn resolve(method: &str) -> Option<Self> {
        match method {
            "all" => Some(ProxyCall::All),
            "first" => Some(ProxyCall::First),
            "last" => Some(ProxyCall::Last),
            other => DynamicFinder::parse(other).map(ProxyCall::Dynamic),
        }
    }
}

/// Proxy over the documents that belong to one owner.
#[derive(Debug)]
pub struct ManyDocumentsProxy {
    association: ManyAssociation,
    owner: Document,
    target: TargetCache,
}

impl ManyDocumentsProxy {
    /// Take ownership of `owner`. Writes save a new owner in place, so
    /// copies held elsewhere go stale; read it back through
    /// [`Self::owner`] or [`Self::into_owner`].
    pub fn new(association: ManyAssociation, owner: Document) -> Self {
        Self {
            association,
            owner,
            target: TargetCache::new(),
        }
    }

    pub fn association(&self) -> &ManyAssociation {
        &self.association
    }

    pub fn owner(&self) -> &Document {
        &self.owner
    }

    /// The owner as last saved through this proxy.
    pub fn into_owner(self) -> Document {
        self.owner
    }

    /// Model of the children.
    pub fn klass(&self) -> &Model {
        self.association.target_model()
    }

    pub fn foreign_key(&self) -> &str {
        self.association.foreign_key()
    }

    // ========================================================================
    // READS
    // ========================================================================

    /// Generic finder, scoped to the owner.
    pub fn find(&self, finder: Finder, options: FindOptions) -> TetherResult<Found> {
        let options = scoped_options(options, &self.scoped_conditions()?);
        tracing::debug!(
            association = self.association.name(),
            ?finder,
            conditions = ?options.conditions,
            "find"
        );
        self.klass().find(&finder, &options)
    }

    pub fn all(&self, options: FindOptions) -> TetherResult<Vec<Document>> {
        let options = scoped_options(options, &self.scoped_conditions()?);
        Ok(self.find(Finder::All, options)?.into_many())
    }

    pub fn first(&self, options: FindOptions) -> TetherResult<Option<Document>> {
        let options = scoped_options(options, &self.scoped_conditions()?);
        Ok(self.find(Finder::First, options)?.into_one())
    }

    pub fn last(&self, options: FindOptions) -> TetherResult<Option<Document>> {
        let options = scoped_options(options, &self.scoped_conditions()?);
        Ok(self.find(Finder::Last, options)?.into_one())
    }

    /// Strict lookup of one child by id.
    pub fn find_by_id(&self, id: DocumentId) -> TetherResult<Document> {
        let found = self.find(Finder::Id(id), FindOptions::new())?.into_one();
        found.ok_or_else(|| {
            QueryError::DocumentNotFound {
                collection: self.klass().collection_name().to_string(),
                conditions: serde_json::json!({ "_id": id_value(id) }),
            }
            .into()
        })
    }

    pub fn paginate(&self, options: FindOptions, request: PageRequest) -> TetherResult<Page> {
        let options = scoped_options(options, &self.scoped_conditions()?);
        self.klass().paginate(&options, request)
    }

    pub fn count(&self, conditions: Conditions) -> TetherResult<u64> {
        let conditions = scoped_bulk_conditions(conditions, &self.scoped_conditions()?);
        self.klass().count(&conditions)
    }

    // ========================================================================
    // TARGET CACHE
    // ========================================================================

    /// Load every in-scope child unless already loaded.
    pub fn load_target(&mut self) -> TetherResult<&[Document]> {
        if !self.target.is_loaded() {
            let docs = self.find_target()?;
            tracing::debug!(
                association = self.association.name(),
                loaded = docs.len(),
                "Loaded association target"
            );
            self.target.fill(docs);
        }
        Ok(self.target.documents())
    }

    /// Alias of [`Self::load_target`].
    pub fn target(&mut self) -> TetherResult<&[Document]> {
        self.load_target()
    }

    pub fn is_loaded(&self) -> bool {
        self.target.is_loaded()
    }

    /// Drop the loaded children; the next read queries the store again.
    pub fn reset(&mut self) {
        if self.target.reset() {
            tracing::trace!(association = self.association.name(), "Association target reset");
        }
    }

    pub fn reload(&mut self) -> TetherResult<&[Document]> {
        self.reset();
        self.load_target()
    }

    pub fn len(&mut self) -> TetherResult<usize> {
        Ok(self.load_target()?.len())
    }

    pub fn is_empty(&mut self) -> TetherResult<bool> {
        Ok(self.load_target()?.is_empty())
    }

    pub fn contains(&mut self, id: DocumentId) -> TetherResult<bool> {
        self.load_target()?;
        Ok(self.target.contains(id))
    }

    fn find_target(&self) -> TetherResult<Vec<Document>> {
        self.all(FindOptions::new())
    }

    // ========================================================================
    // WRITES
    // ========================================================================

    /// New unsaved child carrying the foreign key. Saves the owner first if
    /// it is new.
    pub fn build(&mut self, attributes: Attributes) -> TetherResult<Document> {
        let mut doc = self.klass().build(attributes);
        self.apply_scope(&mut doc)?;
        Ok(doc)
    }

    /// Like [`Self::build`] but saves the child.
    pub fn create(&mut self, attributes: Attributes) -> TetherResult<Document> {
        let mut doc = self.klass().build(attributes);
        self.apply_scope(&mut doc)?;
        self.klass().save(&mut doc)?;
        self.reset();
        Ok(doc)
    }

    /// Destroy every current child, then link and save `docs` in order.
    /// A current child passed back in is destroyed and then inserted again
    /// under its id.
    pub fn replace(&mut self, docs: Vec<Document>) -> TetherResult<Vec<Document>> {
        let existing = self.load_target()?.to_vec();
        let destroyed: HashSet<DocumentId> = existing.iter().filter_map(Document::id).collect();
        tracing::debug!(
            association = self.association.name(),
            destroying = existing.len(),
            linking = docs.len(),
            "replace"
        );
        for doc in &existing {
            self.klass().destroy(doc)?;
        }
        self.reset();

        let mut saved = Vec::with_capacity(docs.len());
        for mut doc in docs {
            if doc.id().is_some_and(|id| destroyed.contains(&id)) {
                doc.mark_new();
            }
            self.apply_scope(&mut doc)?;
            self.klass().save(&mut doc)?;
            saved.push(doc);
        }
        self.reset();
        Ok(saved)
    }

    /// Link and save one or more documents in order. Stops at the first
    /// failure; documents saved before it stay saved.
    pub fn push(&mut self, docs: impl Into<DocumentBatch>) -> TetherResult<Vec<Document>> {
        self.ensure_owner_saved()?;
        let docs = docs.into().flatten();
        tracing::debug!(
            association = self.association.name(),
            count = docs.len(),
            "push"
        );

        let mut saved = Vec::with_capacity(docs.len());
        let result = docs.into_iter().try_for_each(|mut doc| {
            self.apply_scope(&mut doc)?;
            self.klass().save(&mut doc)?;
            saved.push(doc);
            Ok::<(), tether_core::TetherError>(())
        });
        self.reset();
        result.map(|()| saved)
    }

    /// Alias of [`Self::push`].
    pub fn concat(&mut self, docs: impl Into<DocumentBatch>) -> TetherResult<Vec<Document>> {
        self.push(docs)
    }

    /// Load the matching children and destroy each, running its hooks.
    pub fn destroy_all(&mut self, conditions: Conditions) -> TetherResult<u64> {
        let docs = self.all(FindOptions::with_conditions(conditions))?;
        let mut destroyed = 0;
        for doc in &docs {
            self.klass().destroy(doc)?;
            destroyed += 1;
        }
        tracing::debug!(association = self.association.name(), destroyed, "destroy_all");
        self.reset();
        Ok(destroyed)
    }

    /// Remove the matching children in one store call. No hooks run.
    pub fn delete_all(&mut self, conditions: Conditions) -> TetherResult<u64> {
        let conditions = scoped_bulk_conditions(conditions, &self.scoped_conditions()?);
        let deleted = self.klass().delete_all(&conditions)?;
        tracing::debug!(association = self.association.name(), deleted, "delete_all");
        self.reset();
        Ok(deleted)
    }

    /// Clear the foreign key of the matching children without deleting them.
    pub fn nullify(&mut self, conditions: Conditions) -> TetherResult<u64> {
        let conditions = scoped_bulk_conditions(conditions, &self.scoped_conditions()?);
        let criteria = Criteria::from_conditions(&conditions);
        let docs = self.all(FindOptions::with_conditions(criteria.into_conditions()))?;

        let mut nullified = 0;
        for mut doc in docs {
            let mut unset = Attributes::new();
            unset.insert(self.foreign_key().to_string(), Value::Null);
            self.klass().update_attributes(&mut doc, unset)?;
            nullified += 1;
        }
        tracing::debug!(association = self.association.name(), nullified, "nullify");
        self.reset();
        Ok(nullified)
    }

    // ========================================================================
    // DYNAMIC DISPATCH
    // ========================================================================

    /// Invoke a read by name. `args` are the positional values of a dynamic
    /// finder; `options` is its trailing options mapping. Names that are
    /// neither fixed reads nor finders fail with
    /// [`AssociationError::UndefinedMethod`].
    pub fn call(&mut self, method: &str, args: Vec<Value>, options: FindOptions) -> TetherResult<Found> {
        let Some(call) = ProxyCall::resolve(method) else {
            return Err(AssociationError::UndefinedMethod {
                name: method.to_string(),
            }
            .into());
        };
        match call {
            ProxyCall::All => Ok(Found::Many(self.all(options)?)),
            ProxyCall::First => Ok(Found::One(self.first(options)?)),
            ProxyCall::Last => Ok(Found::One(self.last(options)?)),
            ProxyCall::Dynamic(finder) => self.dynamic_find(&finder, args, options),
        }
    }

    fn dynamic_find(
        &mut self,
        finder: &DynamicFinder,
        args: Vec<Value>,
        options: FindOptions,
    ) -> TetherResult<Found> {
        let mut attributes = Conditions::new();
        for (index, name) in finder.attributes.iter().enumerate() {
            let value = args.get(index).cloned().unwrap_or(Value::Null);
            attributes.insert(name.clone(), value);
        }
        let options = options.merge(FindOptions::with_conditions(attributes.clone()));

        let result = self.find(finder.finder.clone(), options)?;
        if !result.is_absent() {
            return Ok(result);
        }

        if finder.bang {
            return Err(QueryError::DocumentNotFound {
                collection: self.klass().collection_name().to_string(),
                conditions: Value::Object(attributes),
            }
            .into());
        }

        match finder.instantiator {
            Some(Instantiator::Initialize) => Ok(Found::One(Some(self.build(attributes)?))),
            Some(Instantiator::Create) => Ok(Found::One(Some(self.create(attributes)?))),
            None => Ok(result),
        }
    }

    // ========================================================================
    // SCOPE
    // ========================================================================

    fn scoped_conditions(&self) -> TetherResult<Conditions> {
        scoped_conditions(
            self.foreign_key(),
            self.association.owner_model().name(),
            &self.owner,
        )
    }

    fn ensure_owner_saved(&mut self) -> TetherResult<()> {
        if self.owner.is_new() {
            tracing::debug!(
                owner = self.association.owner_model().name(),
                "Saving new owner before linking children"
            );
            self.association.owner_model().save(&mut self.owner)?;
        }
        Ok(())
    }

    fn apply_scope(&mut self, doc: &mut Document) -> TetherResult<()> {
        self.ensure_owner_saved()?;
        let id = self.owner.id().ok_or_else(|| AssociationError::OwnerNotIdentified {
            owner_model: self.association.owner_model().name().to_string(),
        })?;
        doc.set(self.foreign_key().to_string(), id_value(id));
        Ok(())
    }
}
