//! TETHER Core - Document and Query Types
//!
//! Pure data structures shared by every other crate: documents, find
//! options, store criteria, association configuration and errors.
//! This crate performs no I/O beyond reading configuration files.

pub mod config;
pub mod criteria;
pub mod document;
pub mod error;
pub mod merge;
pub mod naming;
pub mod query;

pub use config::{AssociationConfig, AssociationOptions, ManyDeclaration};
pub use criteria::{is_operator_map, Criteria, ID_KEY};
pub use document::{id_value, new_document_id, Attributes, Conditions, Document, DocumentId};
pub use error::{
    AssociationError, ConfigError, QueryError, StorageError, TetherError, TetherResult,
};
pub use merge::{deep_merge, deep_merged};
pub use naming::{default_foreign_key, is_attribute_name, underscore};
pub use query::{
    parse_order, Direction, FindOptions, Finder, Found, Page, PageRequest, SortKey,
};
