//! Association metadata and its resolution from configuration.

use std::collections::HashMap;

use tether_core::{
    AssociationConfig, AssociationOptions, ConfigError, Document, TetherResult,
};
use tether_storage::Model;

use crate::proxy::ManyDocumentsProxy;

/// A declared one-to-many association. Immutable once defined; the
/// foreign key is resolved at definition time.
#[derive(Debug, Clone)]
pub struct ManyAssociation {
    name: String,
    owner: Model,
    target: Model,
    options: AssociationOptions,
    foreign_key: String,
}

impl ManyAssociation {
    /// Declare `owner has many <name>` holding `target` documents.
    pub fn define(
        owner: Model,
        name: impl Into<String>,
        target: Model,
        options: AssociationOptions,
    ) -> TetherResult<Self> {
        options.validate()?;
        let foreign_key = options.resolve_foreign_key(owner.name());
        Ok(Self {
            name: name.into(),
            owner,
            target,
            options,
            foreign_key,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner_model(&self) -> &Model {
        &self.owner
    }

    pub fn target_model(&self) -> &Model {
        &self.target
    }

    pub fn options(&self) -> &AssociationOptions {
        &self.options
    }

    /// Attribute on each child holding the owner's id.
    pub fn foreign_key(&self) -> &str {
        &self.foreign_key
    }

    /// A proxy over the children of `owner`. The proxy owns the document;
    /// get it back with [`ManyDocumentsProxy::into_owner`] once writes may
    /// have saved it.
    pub fn proxy(&self, owner: Document) -> ManyDocumentsProxy {
        ManyDocumentsProxy::new(self.clone(), owner)
    }
}

/// Models by type name, used to resolve configured associations.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: HashMap<String, Model>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, model: Model) -> &mut Self {
        self.models.insert(model.name().to_string(), model);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Model> {
        self.models.get(name)
    }

    /// Define every association declared in `config`.
    pub fn associations(&self, config: &AssociationConfig) -> TetherResult<Vec<ManyAssociation>> {
        config
            .many
            .iter()
            .enumerate()
            .map(|(index, decl)| {
                let owner = self.resolve(index, "owner", &decl.owner)?;
                let target = self.resolve(index, "target", &decl.target)?;
                ManyAssociation::define(owner, decl.name.clone(), target, decl.options())
            })
            .collect()
    }

    fn resolve(&self, index: usize, field: &str, name: &str) -> TetherResult<Model> {
        self.get(name).cloned().ok_or_else(|| {
            ConfigError::InvalidValue {
                field: format!("many[{}].{}", index, field),
                value: name.to_string(),
                reason: "no model registered under this name".to_string(),
            }
            .into()
        })
    }
}
