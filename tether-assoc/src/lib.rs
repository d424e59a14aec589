//! TETHER Associations - One-to-Many Document Proxies
//!
//! A [`ManyDocumentsProxy`] presents the children of one owner document as a
//! lazily loaded collection. Reads are scoped to `{foreign_key: owner.id}`,
//! writes stamp the foreign key (saving a new owner first), and unknown
//! method names are parsed as dynamic finders such as
//! `find_or_create_by_name`.
//!
//! ```ignore
//! let messages = ManyAssociation::define(rooms, "messages", messages, AssociationOptions::default())?;
//! let mut proxy = messages.proxy(room);
//! proxy.create(attrs)?;
//! let unread = proxy.call("find_all_by_read", vec![json!(false)], FindOptions::new())?;
//! ```

pub mod association;
pub mod cache;
pub mod finder;
pub mod merge;
pub mod proxy;
pub mod scope;

pub use association::{ManyAssociation, ModelRegistry};
pub use cache::TargetCache;
pub use finder::{DynamicFinder, Instantiator, CONJUNCTION};
pub use merge::{scoped_bulk_conditions, scoped_options};
pub use proxy::{DocumentBatch, ManyDocumentsProxy, ProxyCall};
pub use scope::scoped_conditions;
